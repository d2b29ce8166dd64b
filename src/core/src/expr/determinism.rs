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

//! Determinism tracking (§3.3): built-in operators are always deterministic, `Named` functions
//! carry whatever the metadata resolver decided when the call was built. Passes that need to
//! reorder, duplicate, or drop conjuncts (equality inference, effective predicates, dynamic
//! filters) must only ever do so for deterministic ones.

use super::visitor::ExprVisitor;
use super::{ExprImpl, FunctionCall};

/// Whether every function call reachable from `expr` is deterministic.
///
/// A literal or bare symbol reference is trivially deterministic. A pre-planning expression
/// (`Subquery`/`Exists`/quantified comparison) is conservatively treated as non-deterministic: it
/// shouldn't exist by the time this is called (§6.3), but wishful thinking is not a safety
/// argument.
pub fn is_deterministic(expr: &ExprImpl) -> bool {
    struct Checker {
        deterministic: bool,
    }

    impl ExprVisitor for Checker {
        fn visit_function_call(&mut self, func_call: &FunctionCall) {
            if !func_call.is_deterministic() {
                self.deterministic = false;
                return;
            }
            for input in func_call.inputs() {
                if !self.deterministic {
                    return;
                }
                self.visit_expr(input);
            }
        }
    }

    match expr {
        ExprImpl::Preplanning(_) => false,
        _ => {
            let mut checker = Checker { deterministic: true };
            checker.visit_expr(expr);
            checker.deterministic
        }
    }
}

/// Splits `conjuncts` into `(deterministic, non_deterministic)`, preserving relative order within
/// each half. Used wherever a pass is only allowed to reorder or fold the deterministic part of a
/// predicate (§4.1, §4.2).
pub fn filter_deterministic_conjuncts(conjuncts: Vec<ExprImpl>) -> (Vec<ExprImpl>, Vec<ExprImpl>) {
    conjuncts.into_iter().partition(is_deterministic)
}

#[cfg(test)]
mod tests {
    use relplan_common::types::DataType;

    use super::*;
    use crate::expr::{FunctionType, SymbolReference};
    use crate::symbol::SymbolAllocator;

    #[test]
    fn builtin_comparison_is_deterministic() {
        let alloc = SymbolAllocator::new();
        let sym = alloc.fresh("x", DataType::Int32);
        let expr: ExprImpl = FunctionCall::new(
            FunctionType::Equal,
            vec![
                SymbolReference::new(sym, DataType::Int32).into(),
                ExprImpl::literal_bool(true),
            ],
        )
        .into();
        assert!(is_deterministic(&expr));
    }

    #[test]
    fn named_function_inherits_resolved_flag() {
        let call = FunctionCall::new_named("random", vec![], DataType::Float64, false);
        let expr: ExprImpl = call.into();
        assert!(!is_deterministic(&expr));
    }

    #[test]
    fn non_deterministic_child_poisons_parent() {
        let call = FunctionCall::new_named("random", vec![], DataType::Float64, false);
        let wrapped: ExprImpl = FunctionCall::new(FunctionType::IsNull, vec![call.into()]).into();
        assert!(!is_deterministic(&wrapped));
    }

    #[test]
    fn filter_splits_by_determinism() {
        let non_det: ExprImpl =
            FunctionCall::new_named("random", vec![], DataType::Boolean, false).into();
        let det = ExprImpl::literal_bool(true);
        let (deterministic, non_deterministic) =
            filter_deterministic_conjuncts(vec![det.clone(), non_det.clone()]);
        assert_eq!(deterministic, vec![det]);
        assert_eq!(non_deterministic, vec![non_det]);
    }
}
