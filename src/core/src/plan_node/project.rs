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

/// `symbol := expression` assignments (§3.2). Keys are exactly this node's outputs, in order.
#[derive(Clone, Debug, PartialEq)]
pub struct Project {
    pub base: PlanBase,
    pub input: PlanRef,
    pub assignments: Vec<(Symbol, ExprImpl)>,
}

impl Project {
    pub fn new(base: PlanBase, input: PlanRef, assignments: Vec<(Symbol, ExprImpl)>) -> Self {
        debug_assert_eq!(
            base.outputs().len(),
            assignments.len(),
            "every output must have exactly one assignment"
        );
        Self {
            base,
            input,
            assignments,
        }
    }

    /// `symbol := expr` is an identity projection iff `expr` is a bare reference to `symbol`
    /// itself (§3.2 invariant).
    pub fn is_identity(&self, symbol: Symbol, expr: &ExprImpl) -> bool {
        matches!(expr.as_symbol_reference(), Some(r) if r.symbol() == symbol)
    }

    pub fn assignment(&self, symbol: Symbol) -> Option<&ExprImpl> {
        self.assignments
            .iter()
            .find(|(s, _)| *s == symbol)
            .map(|(_, e)| e)
    }
}
