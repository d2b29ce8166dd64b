// Copyright 2024 RisingWave Labs
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use crate::expr::ExprImpl;
use crate::plan_node::{JoinType, PlanBase, PlanRef};
use crate::symbol::Symbol;

/// Expands one or more array/map-valued input symbols into rows, joined back against the
/// untouched `replicate_symbols` (§3.2).
#[derive(Clone, Debug, PartialEq)]
pub struct Unnest {
    pub base: PlanBase,
    pub input: PlanRef,
    /// Input symbols carried through unchanged, replicated once per unnested element.
    pub replicate_symbols: Vec<Symbol>,
    /// Input array-valued symbol → output symbols it's unnested into (one for a plain array, more
    /// for `UNNEST(a, b)` zipped together, a struct's fields, etc).
    pub unnest_symbols: Vec<(Symbol, Vec<Symbol>)>,
    pub ordinality_symbol: Option<Symbol>,
    pub join_type: JoinType,
    pub filter: ExprImpl,
}

impl Unnest {
    pub fn new(
        base: PlanBase,
        input: PlanRef,
        replicate_symbols: Vec<Symbol>,
        unnest_symbols: Vec<(Symbol, Vec<Symbol>)>,
        ordinality_symbol: Option<Symbol>,
        join_type: JoinType,
        filter: ExprImpl,
    ) -> Self {
        Self {
            base,
            input,
            replicate_symbols,
            unnest_symbols,
            ordinality_symbol,
            join_type,
            filter,
        }
    }
}
