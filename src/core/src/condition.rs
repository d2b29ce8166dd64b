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

//! An ordered list of AND-conjuncts (§10.5), carried as its own small value type since almost
//! every pass in this crate needs both directions: "the predicate as conjuncts" (§4.4 partitioning)
//! and "conjuncts as one expression" (§4.3 composition).

use rustc_hash::FxHashSet;

use crate::expr::ExprImpl;
use crate::symbol::Symbol;

/// A predicate represented as its top-level conjuncts, in the order they were encountered.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Condition {
    conjuncts: Vec<ExprImpl>,
}

impl Condition {
    pub fn true_condition() -> Self {
        Self { conjuncts: vec![] }
    }

    pub fn of(conjuncts: Vec<ExprImpl>) -> Self {
        Self { conjuncts }
    }

    /// Flattens `expr`'s top-level `AND` structure into conjuncts (§3.3 `conjuncts`).
    pub fn from_expr(expr: &ExprImpl) -> Self {
        Self {
            conjuncts: expr.conjuncts(),
        }
    }

    pub fn conjuncts(&self) -> &[ExprImpl] {
        &self.conjuncts
    }

    pub fn into_conjuncts(self) -> Vec<ExprImpl> {
        self.conjuncts
    }

    pub fn is_true(&self) -> bool {
        self.conjuncts.is_empty() || self.conjuncts.iter().all(ExprImpl::is_true_literal)
    }

    pub fn is_false(&self) -> bool {
        self.conjuncts.iter().any(ExprImpl::is_false_literal)
    }

    /// Folds back into a single expression (§4.3 "conjuncts as one expression"). `TRUE` for an
    /// empty condition.
    pub fn to_expr(&self) -> ExprImpl {
        crate::expr::conjunction(self.conjuncts.iter().cloned())
    }

    pub fn and(mut self, other: Condition) -> Self {
        self.conjuncts.extend(other.conjuncts);
        self
    }

    pub fn push(&mut self, conjunct: ExprImpl) {
        if !conjunct.is_true_literal() {
            self.conjuncts.push(conjunct);
        }
    }

    pub fn free_symbols(&self) -> FxHashSet<Symbol> {
        let mut out = FxHashSet::default();
        for c in &self.conjuncts {
            out.extend(c.free_symbols());
        }
        out
    }

    pub fn len(&self) -> usize {
        self.conjuncts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.conjuncts.is_empty()
    }
}

impl From<ExprImpl> for Condition {
    fn from(expr: ExprImpl) -> Self {
        Self::from_expr(&expr)
    }
}

impl FromIterator<ExprImpl> for Condition {
    fn from_iter<I: IntoIterator<Item = ExprImpl>>(iter: I) -> Self {
        Self::of(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_expr_flattens_nested_and() {
        let e = ExprImpl::literal_bool(true)
            .and(ExprImpl::literal_bool(false))
            .and(ExprImpl::literal_bool(true));
        let cond = Condition::from_expr(&e);
        assert_eq!(cond.len(), 3);
    }

    #[test]
    fn to_expr_round_trips_through_and() {
        let cond = Condition::of(vec![ExprImpl::literal_bool(true), ExprImpl::literal_bool(false)]);
        let expr = cond.to_expr();
        assert_eq!(Condition::from_expr(&expr).len(), 2);
    }

    #[test]
    fn empty_condition_is_true() {
        assert!(Condition::true_condition().is_true());
    }
}
