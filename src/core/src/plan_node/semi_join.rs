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
use crate::plan_node::{PlanBase, PlanRef};
use crate::symbol::Symbol;

/// `source` with a boolean `output_marker` appended recording whether each row has a match in
/// `filtering_source` (§3.2). Whether a given inherited predicate is "filtering" (references the
/// marker) or "non-filtering" is a property of *that predicate*, decided at pushdown time
/// (§4.4) — not stored on the node.
#[derive(Clone, Debug, PartialEq)]
pub struct SemiJoin {
    pub base: PlanBase,
    pub source: PlanRef,
    pub filtering_source: PlanRef,
    pub join_symbols: Vec<(Symbol, Symbol)>,
    pub filter: ExprImpl,
    pub output_marker: Symbol,
    /// `true` for NOT IN / anti-join semantics; `false` for plain semi-join (IN/EXISTS).
    pub is_anti: bool,
}

impl SemiJoin {
    pub fn new(
        base: PlanBase,
        source: PlanRef,
        filtering_source: PlanRef,
        join_symbols: Vec<(Symbol, Symbol)>,
        filter: ExprImpl,
        output_marker: Symbol,
        is_anti: bool,
    ) -> Self {
        Self {
            base,
            source,
            filtering_source,
            join_symbols,
            filter,
            output_marker,
            is_anti,
        }
    }
}
