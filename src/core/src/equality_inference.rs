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

//! Equivalence classes over the equalities a predicate asserts (§4.2), used to move predicates
//! across a symbol boundary without re-deriving transitive equality reasoning at every call site.

use crate::expr::ExprImpl;
use crate::symbol::Symbol;

fn in_slice(scope: &[Symbol]) -> impl Fn(Symbol) -> bool + '_ {
    move |s| scope.contains(&s)
}

/// Equivalence classes over the deterministic `=`-subexpressions a predicate asserts equal,
/// built once per predicate and reused by every rewrite/partition query against it.
#[derive(Clone, Debug, Default)]
pub struct EqualityInference {
    /// Each class is a set of expressions known equal to one another, stored as a plain vector
    /// since classes are small and membership is by structural equality.
    classes: Vec<Vec<ExprImpl>>,
    /// Conjuncts of the original predicate that were not a pure equality between two
    /// deterministic subexpressions (§4.2 `nonInferrableConjuncts`).
    non_inferrable: Vec<ExprImpl>,
}

impl EqualityInference {
    /// Builds the equivalence classes (transitive closure over `=`) from a predicate's conjuncts.
    pub fn new(predicate: &ExprImpl) -> Self {
        let mut union_find: Vec<Vec<ExprImpl>> = Vec::new();
        let mut non_inferrable = Vec::new();

        for conjunct in predicate.conjuncts() {
            let equality = conjunct
                .as_equality()
                .filter(|_| is_pure_equality(&conjunct))
                .map(|(l, r)| (l.clone(), r.clone()));
            match equality {
                Some((lhs, rhs)) => merge_into(&mut union_find, lhs, rhs),
                None => non_inferrable.push(conjunct),
            }
        }

        Self {
            classes: union_find,
            non_inferrable,
        }
    }

    /// Rewrites `e` into an equivalent expression whose free symbols are all in `scope`, or
    /// `None` if no member of `e`'s equivalence class (if any) qualifies. `e` itself qualifies
    /// trivially when its own free symbols are already within scope.
    pub fn rewrite(&self, e: &ExprImpl, scope: &[Symbol]) -> Option<ExprImpl> {
        let in_scope = in_slice(scope);
        if e.free_symbols().iter().all(|s| in_scope(*s)) {
            return Some(e.clone());
        }
        let class = self.class_of(e)?;
        best_representative(class, &in_scope).cloned()
    }

    /// Partitions this predicate's equalities by how their two sides relate to `scope` (§4.2
    /// `generateEqualitiesPartitionedBy`): both sides in scope, both sides disjoint from scope, or
    /// straddling the boundary.
    pub fn generate_equalities_partitioned_by(&self, scope: &[Symbol]) -> PartitionedEqualities {
        let in_scope = in_slice(scope);
        let mut result = PartitionedEqualities::default();
        for class in &self.classes {
            for i in 0..class.len() {
                for j in (i + 1)..class.len() {
                    let (a, b) = (&class[i], &class[j]);
                    let a_in = a.free_symbols().iter().all(|s| in_scope(*s));
                    let b_in = b.free_symbols().iter().all(|s| in_scope(*s));
                    let equality = a.clone().eq(b.clone());
                    match (a_in, b_in) {
                        (true, true) => result.scope_equalities.push(equality),
                        (false, false) => result.scope_complement_equalities.push(equality),
                        _ => result.scope_straddling.push(equality),
                    }
                }
            }
        }
        result
    }

    /// Conjuncts of the source predicate that are not pure equalities over deterministic
    /// subexpressions, and so cannot participate in equality-based rewriting at all.
    pub fn non_inferrable_conjuncts(&self) -> &[ExprImpl] {
        &self.non_inferrable
    }

    fn class_of(&self, e: &ExprImpl) -> Option<&[ExprImpl]> {
        self.classes
            .iter()
            .find(|class| class.iter().any(|member| member == e))
            .map(Vec::as_slice)
    }
}

/// Preference order for a class representative (§4.2 `rewrite`): a bare symbol reference already
/// in scope first, then whichever candidate has the fewest free symbols outside scope.
fn best_representative<'a>(
    class: &'a [ExprImpl],
    in_scope: &impl Fn(Symbol) -> bool,
) -> Option<&'a ExprImpl> {
    class
        .iter()
        .filter(|candidate| candidate.free_symbols().iter().all(|s| in_scope(*s)))
        .min_by_key(|candidate| {
            let is_bare_symbol = candidate.as_symbol_reference().is_none();
            let non_scope_free = candidate.free_symbols().iter().filter(|s| !in_scope(**s)).count();
            (is_bare_symbol, non_scope_free)
        })
}

fn is_pure_equality(conjunct: &ExprImpl) -> bool {
    let Some(call) = conjunct.as_function_call() else {
        return false;
    };
    call.is_deterministic() && call.inputs().iter().all(crate::expr::is_deterministic)
}

fn merge_into(classes: &mut Vec<Vec<ExprImpl>>, lhs: ExprImpl, rhs: ExprImpl) {
    let lhs_idx = classes.iter().position(|c| c.iter().any(|m| *m == lhs));
    let rhs_idx = classes.iter().position(|c| c.iter().any(|m| *m == rhs));
    match (lhs_idx, rhs_idx) {
        (Some(a), Some(b)) if a == b => {}
        (Some(a), Some(b)) => {
            let merged = classes.remove(a.max(b));
            classes[a.min(b)].extend(merged);
        }
        (Some(a), None) => classes[a].push(rhs),
        (None, Some(b)) => classes[b].push(lhs),
        (None, None) => classes.push(vec![lhs, rhs]),
    }
}

/// The three disjoint sets returned by [`EqualityInference::generate_equalities_partitioned_by`].
#[derive(Clone, Debug, Default)]
pub struct PartitionedEqualities {
    pub scope_equalities: Vec<ExprImpl>,
    pub scope_complement_equalities: Vec<ExprImpl>,
    pub scope_straddling: Vec<ExprImpl>,
}

#[cfg(test)]
mod tests {
    use relplan_common::types::DataType;

    use super::*;
    use crate::expr::SymbolReference;
    use crate::symbol::SymbolAllocator;

    fn sym_ref(allocator: &SymbolAllocator, name: &str) -> (Symbol, ExprImpl) {
        let sym = allocator.fresh(name, DataType::Int32);
        (sym, SymbolReference::new(sym, DataType::Int32).into())
    }

    #[test]
    fn rewrite_substitutes_through_asserted_equality() {
        let alloc = SymbolAllocator::new();
        let (a, a_ref) = sym_ref(&alloc, "a");
        let (b, b_ref) = sym_ref(&alloc, "b");
        let predicate = a_ref.clone().eq(b_ref.clone());
        let inference = EqualityInference::new(&predicate);

        let rewritten = inference.rewrite(&a_ref, &[b]).expect("a is in b's class");
        assert_eq!(rewritten, b_ref);
        assert!(inference.rewrite(&a_ref, &[]).is_none());
        let _ = a;
    }

    #[test]
    fn generate_equalities_partitions_by_scope() {
        let alloc = SymbolAllocator::new();
        let (a, a_ref) = sym_ref(&alloc, "a");
        let (b, _b_ref) = sym_ref(&alloc, "b");
        let (_c, c_ref) = sym_ref(&alloc, "c");
        let predicate = a_ref.clone().eq(c_ref.clone());
        let inference = EqualityInference::new(&predicate);

        let partitioned = inference.generate_equalities_partitioned_by(&[a]);
        assert!(partitioned.scope_equalities.is_empty());
        assert!(partitioned.scope_complement_equalities.is_empty());
        assert_eq!(partitioned.scope_straddling.len(), 1);
        let _ = b;
    }

    #[test]
    fn non_equality_conjuncts_are_non_inferrable() {
        let alloc = SymbolAllocator::new();
        let (_a, a_ref) = sym_ref(&alloc, "a");
        let predicate = a_ref.clone().is_null();
        let inference = EqualityInference::new(&predicate);
        assert_eq!(inference.non_inferrable_conjuncts().len(), 1);
        assert!(inference.rewrite(&a_ref, &[]).is_none());
    }
}
