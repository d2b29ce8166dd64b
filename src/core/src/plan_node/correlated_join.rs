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

//! `Apply`/`CorrelatedJoin` (§3.2): a correlated subquery not yet decorrelated into a plain join.
//!
//! §6.3 requires these gone before predicate pushdown runs; they're modeled here purely so the
//! external decorrelation step has something typed to consume and so prune (§4.6) can recognize
//! the "subquery outputs unused and at-most-scalar ⇒ drop the subquery entirely" shape.

use crate::expr::ExprImpl;
use crate::plan_node::{JoinType, PlanBase, PlanRef};
use crate::symbol::Symbol;

#[derive(Clone, Debug, PartialEq)]
pub struct CorrelatedJoin {
    pub base: PlanBase,
    pub input: PlanRef,
    pub subquery: PlanRef,
    /// Input symbols the subquery references freely (the correlation).
    pub correlation_symbols: Vec<Symbol>,
    pub join_type: JoinType,
    pub filter: ExprImpl,
}

impl CorrelatedJoin {
    pub fn new(
        base: PlanBase,
        input: PlanRef,
        subquery: PlanRef,
        correlation_symbols: Vec<Symbol>,
        join_type: JoinType,
        filter: ExprImpl,
    ) -> Self {
        Self {
            base,
            input,
            subquery,
            correlation_symbols,
            join_type,
            filter,
        }
    }

    /// Whether the subquery side produces at most one output symbol — the shape prune (§4.6) may
    /// collapse entirely into `input` when that symbol goes unused.
    pub fn subquery_is_at_most_scalar(&self) -> bool {
        self.subquery.outputs().len() <= 1
    }
}
