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
use crate::plan_node::exchange::JoinDistributionType;
use crate::plan_node::{PlanBase, PlanRef};
use crate::symbol::Symbol;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum JoinType {
    Inner,
    Left,
    Right,
    Full,
}

impl JoinType {
    pub fn is_outer(self) -> bool {
        !matches!(self, JoinType::Inner)
    }

    /// The side that still produces a row (possibly null-padded) for every row of the *other*
    /// side even when no match exists — "the outer side" in §4.4's left/right-outer pushdown
    /// rules. `None` for `INNER`/`FULL` (inner has no such side; full has both).
    pub fn flip(self) -> JoinType {
        match self {
            JoinType::Inner => JoinType::Inner,
            JoinType::Left => JoinType::Right,
            JoinType::Right => JoinType::Left,
            JoinType::Full => JoinType::Full,
        }
    }
}

/// Dynamic-filter id → build-side symbol (§4.4 "Dynamic filter synthesis"). The executor
/// observes the build side's runtime value set and ships it to the probe-side scan named by the
/// same id embedded in a `DynamicFilter` expression wrapped around `probe`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DynamicFilterId(pub u64);

#[derive(Clone, Debug, PartialEq)]
pub struct Join {
    pub base: PlanBase,
    pub left: PlanRef,
    pub right: PlanRef,
    pub join_type: JoinType,
    pub equi_clauses: Vec<(Symbol, Symbol)>,
    /// Additional non-equi condition; `TRUE` if there is none.
    pub filter: ExprImpl,
    /// Set by exchange insertion (§4.5); `None` before that pass runs.
    pub distribution_type: Option<JoinDistributionType>,
    /// `(id, build_side_symbol)` per dynamic filter synthesized at this join (§4.4). Always empty
    /// before predicate pushdown runs, and only ever populated for `INNER` joins.
    pub dynamic_filters: Vec<(DynamicFilterId, Symbol)>,
}

impl Join {
    pub fn new(
        base: PlanBase,
        left: PlanRef,
        right: PlanRef,
        join_type: JoinType,
        equi_clauses: Vec<(Symbol, Symbol)>,
        filter: ExprImpl,
    ) -> Self {
        Self {
            base,
            left,
            right,
            join_type,
            equi_clauses,
            filter,
            distribution_type: None,
            dynamic_filters: vec![],
        }
    }

    /// `equi_clauses` folded into a conjunction of `l = r`, the "joinPredicate" fragment of §4.4.
    pub fn equi_clauses_as_predicate(&self, types: &dyn crate::symbol::TypeProvider) -> ExprImpl {
        let conjuncts = self.equi_clauses.iter().map(|(l, r)| {
            let l_ref: ExprImpl = crate::expr::SymbolReference::new(*l, types.type_of(*l)).into();
            let r_ref: ExprImpl = crate::expr::SymbolReference::new(*r, types.type_of(*r)).into();
            l_ref.eq(r_ref)
        });
        crate::expr::conjunction(conjuncts)
    }

    /// `joinPredicate` (§4.4): equi-clauses AND the non-equi filter.
    pub fn join_predicate(&self, types: &dyn crate::symbol::TypeProvider) -> ExprImpl {
        self.equi_clauses_as_predicate(types).and(self.filter.clone())
    }
}
