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

//! For any subplan, a deterministic predicate guaranteed true of every output row (§4.3). Bottom-
//! up: each node kind's rule only ever looks at its own children's already-computed predicates.

use std::collections::HashMap;

use crate::equality_inference::EqualityInference;
use crate::expr::{conjunction, is_deterministic, Expr, ExprImpl, SymbolReference};
use crate::interpreter::{self, Outcome, Resolver};
use crate::plan_node::{JoinType, PlanNode, PlanRef, SetOperationKind};
use crate::symbol::{Symbol, TypeProvider};
use crate::tuple_domain::{Domain, TupleDomain};

struct NoFreeSymbols;
impl Resolver for NoFreeSymbols {
    fn resolve(&self, _symbol: Symbol) -> Option<relplan_common::scalar::Datum> {
        None
    }
}

/// `pull(e, scope)` (§4.3): the portion of `e` that can be re-expressed purely in terms of `scope`,
/// via equality inference.
pub fn pull(e: &ExprImpl, scope: &[Symbol]) -> ExprImpl {
    let inference = EqualityInference::new(e);
    let mut conjuncts = Vec::new();
    for c in inference.non_inferrable_conjuncts() {
        if is_deterministic(c) {
            if let Some(rewritten) = inference.rewrite(c, scope) {
                conjuncts.push(rewritten);
            }
        }
    }
    conjuncts.extend(inference.generate_equalities_partitioned_by(scope).scope_equalities);
    conjunction(conjuncts)
}

/// `pullNullable(conjs, outputs, nullScopes)` (§4.3): like [`pull`], but every surviving conjunct
/// is additionally OR'd with "one of its free symbols coming from `null_scopes` is NULL", to
/// account for outer-join null padding. A conjunct with no free symbols at all cannot be pulled
/// safely and is dropped in favor of `TRUE`.
pub fn pull_nullable(
    e: &ExprImpl,
    scope: &[Symbol],
    null_scopes: &[Symbol],
    types: &dyn TypeProvider,
) -> ExprImpl {
    let pulled = pull(e, scope);
    let wrapped = pulled.conjuncts().into_iter().map(|c| {
        let free = c.free_symbols();
        if free.is_empty() {
            return ExprImpl::true_expr();
        }
        let relevant: Vec<Symbol> = null_scopes.iter().copied().filter(|s| free.contains(s)).collect();
        if relevant.is_empty() {
            return c;
        }
        let null_checks = relevant
            .into_iter()
            .map(|s| {
                let sym_ref: ExprImpl = SymbolReference::new(s, types.type_of(s)).into();
                sym_ref.is_null()
            })
            .reduce(ExprImpl::or)
            .unwrap();
        c.or(null_checks)
    });
    conjunction(wrapped)
}

/// The node-kind dispatch table of §4.3.
pub fn effective_predicate(node: &PlanRef, types: &dyn TypeProvider) -> ExprImpl {
    match &**node {
        PlanNode::TableScan(n) => n.constraint_by_symbol().to_predicate(|s| types.try_type_of(s)),

        PlanNode::Values(n) => {
            let mut domains: HashMap<Symbol, Domain> = HashMap::new();
            for (i, &sym) in node.outputs().iter().enumerate() {
                if let Some(domain) = column_domain(n.column(i).collect()) {
                    domains.insert(sym, domain);
                }
            }
            TupleDomain::from_domains(domains).to_predicate(|s| types.try_type_of(s))
        }

        PlanNode::Filter(n) => {
            let source = effective_predicate(&n.input, types);
            let (deterministic, _) = crate::expr::filter_deterministic_conjuncts(n.predicate.conjuncts());
            pull(&source.and(conjunction(deterministic)), node.outputs())
        }

        PlanNode::Project(n) => {
            let source = effective_predicate(&n.input, types);
            let mut conjuncts = vec![source];
            for (sym, expr) in &n.assignments {
                if !n.is_identity(*sym, expr) && is_deterministic(expr) {
                    let sym_ref: ExprImpl = SymbolReference::new(*sym, types.type_of(*sym)).into();
                    conjuncts.push(sym_ref.eq(expr.clone()));
                }
            }
            pull(&conjunction(conjuncts), node.outputs())
        }

        PlanNode::Aggregation(n) => {
            if n.grouping_keys.is_empty() {
                ExprImpl::true_expr()
            } else {
                let source = effective_predicate(&n.input, types);
                pull(&source, &n.grouping_keys)
            }
        }

        PlanNode::Join(n) => {
            let left_pred = effective_predicate(&n.left, types);
            let right_pred = effective_predicate(&n.right, types);
            let equi = n.join_predicate(types);
            match n.join_type {
                JoinType::Inner => {
                    let combined = left_pred.and(right_pred).and(equi);
                    pull(&combined, node.outputs())
                }
                JoinType::Left => {
                    let left_part = pull(&left_pred, node.outputs());
                    let right_part =
                        pull_nullable(&right_pred.and(equi), node.outputs(), n.right.outputs(), types);
                    left_part.and(right_part)
                }
                JoinType::Right => {
                    let right_part = pull(&right_pred, node.outputs());
                    let left_part =
                        pull_nullable(&left_pred.and(equi), node.outputs(), n.left.outputs(), types);
                    right_part.and(left_part)
                }
                JoinType::Full => {
                    let left_part = pull_nullable(&left_pred, node.outputs(), n.left.outputs(), types);
                    let right_part = pull_nullable(&right_pred, node.outputs(), n.right.outputs(), types);
                    let mut both = n.left.outputs().to_vec();
                    both.extend(n.right.outputs().iter().copied());
                    let equi_part = pull_nullable(&equi, node.outputs(), &both, types);
                    left_part.and(right_part).and(equi_part)
                }
            }
        }

        PlanNode::SemiJoin(n) => effective_predicate(&n.source, types),

        PlanNode::Unnest(n) => match n.join_type {
            JoinType::Inner | JoinType::Left => {
                let source = effective_predicate(&n.input, types);
                pull(&source.and(n.filter.clone()), node.outputs())
            }
            JoinType::Right | JoinType::Full => ExprImpl::true_expr(),
        },

        // `Intersect`/`Except` have no documented rule in the table, so (consistent with
        // `GroupId`/`CorrelatedJoin` below) they fall back to ⊤.
        PlanNode::SetOperation(n) if n.kind != SetOperationKind::Union => ExprImpl::true_expr(),

        PlanNode::SetOperation(n) => {
            let per_source: Vec<Vec<ExprImpl>> = n
                .sources
                .iter()
                .enumerate()
                .map(|(i, source)| {
                    let source_pred = effective_predicate(source, types);
                    let pulled = pull(&source_pred, source.outputs());
                    pulled
                        .conjuncts()
                        .into_iter()
                        .map(|c| {
                            rename_via(&c, |sym| {
                                node.outputs()
                                    .iter()
                                    .find(|&&out| n.input_symbol(out, i) == Some(sym))
                                    .copied()
                            })
                        })
                        .filter(|c| !c.is_true_literal())
                        .collect()
                })
                .collect();
            match per_source.split_first() {
                Some((first, rest)) => {
                    let mut common = first.clone();
                    for other in rest {
                        common.retain(|c| other.contains(c));
                    }
                    conjunction(common)
                }
                None => ExprImpl::true_expr(),
            }
        }

        PlanNode::Exchange(n) => pull(&effective_predicate(&n.input, types), node.outputs()),

        PlanNode::Limit(_)
        | PlanNode::Offset(_)
        | PlanNode::Sort(_)
        | PlanNode::TopN(_)
        | PlanNode::Window(_)
        | PlanNode::RowNumber(_)
        | PlanNode::TopNRowNumber(_)
        | PlanNode::DistinctLimit(_)
        | PlanNode::AssignUniqueId(_) => effective_predicate(&node.children()[0], types),

        // Not covered by the documented table: `GroupId` duplicates rows with columns nulled out
        // per grouping set, and `CorrelatedJoin` shouldn't survive to this pass (§6.3) — both are
        // conservatively opaque rather than guessed at.
        PlanNode::GroupId(_) | PlanNode::CorrelatedJoin(_) => ExprImpl::true_expr(),
    }
}

fn column_domain(exprs: Vec<&ExprImpl>) -> Option<Domain> {
    if exprs.is_empty() || !exprs.iter().all(|&e| is_deterministic(e)) {
        return None;
    }
    let mut acc: Option<Domain> = None;
    for e in exprs {
        let outcome = interpreter::optimize(e, &NoFreeSymbols);
        let d = match outcome {
            Outcome::Value(Some(v), _) => Domain::single_value(v),
            Outcome::Value(None, ty) => Domain::only_null(ty),
            Outcome::Expression(_) => return None,
        };
        acc = Some(match acc {
            Some(existing) => existing.union(&d),
            None => d,
        });
    }
    acc
}

/// Substitutes every free symbol of `e` via `map`, dropping the conjunct entirely (replacing it
/// with `TRUE`) if any symbol it depends on has no image — used to move a `SetOperation` source's
/// already-pulled predicate from its own input symbol space into the node's output symbol space.
fn rename_via(e: &ExprImpl, map: impl Fn(Symbol) -> Option<Symbol>) -> ExprImpl {
    struct Renamer<F: Fn(Symbol) -> Option<Symbol>> {
        map: F,
        ok: bool,
    }
    impl<F: Fn(Symbol) -> Option<Symbol>> crate::expr::ExprRewriter for Renamer<F> {
        fn rewrite_symbol_reference(&mut self, symbol_reference: SymbolReference) -> ExprImpl {
            match (self.map)(symbol_reference.symbol()) {
                Some(mapped) => SymbolReference::new(mapped, symbol_reference.return_type()).into(),
                None => {
                    self.ok = false;
                    symbol_reference.into()
                }
            }
        }
    }
    let mut renamer = Renamer { map, ok: true };
    let rewritten = renamer.rewrite_expr(e.clone());
    if renamer.ok {
        rewritten
    } else {
        ExprImpl::true_expr()
    }
}

#[cfg(test)]
mod tests {
    use relplan_common::scalar::ScalarImpl;
    use relplan_common::types::DataType;
    use std::rc::Rc;

    use super::*;
    use crate::plan_node::{Filter, NodeIdAllocator, PlanBase, SetOperation, TableScan};

    fn scan(
        ids: &NodeIdAllocator,
        symbols: &crate::symbol::SymbolAllocator,
        sym: Symbol,
    ) -> PlanRef {
        let base = PlanBase::new(ids.fresh(), vec![sym], symbols);
        Rc::new(PlanNode::TableScan(Rc::new(TableScan::new(
            base,
            "t",
            vec![],
            TupleDomain::all(),
        ))))
    }

    #[test]
    fn aggregation_without_grouping_keys_is_true() {
        let ids = NodeIdAllocator::new();
        let symbols = crate::symbol::SymbolAllocator::new();
        let x = symbols.fresh("x", DataType::Int32);
        let input = scan(&ids, &symbols, x);
        let base = PlanBase::new(ids.fresh(), vec![], &symbols);
        let agg = Rc::new(PlanNode::Aggregation(Rc::new(crate::plan_node::Aggregation::new(
            base,
            input,
            vec![],
            vec![],
            vec![],
            None,
            crate::plan_node::AggregationStep::Single,
        ))));
        assert!(effective_predicate(&agg, &symbols).is_true_literal());
    }

    #[test]
    fn filter_predicate_survives_as_effective_predicate() {
        let ids = NodeIdAllocator::new();
        let symbols = crate::symbol::SymbolAllocator::new();
        let x = symbols.fresh("x", DataType::Int32);
        let input = scan(&ids, &symbols, x);
        let x_ref: ExprImpl = SymbolReference::new(x, DataType::Int32).into();
        let lit: ExprImpl = crate::expr::Literal::new(Some(ScalarImpl::Int32(5)), DataType::Int32).into();
        let predicate = x_ref.eq(lit);
        let base = PlanBase::new(ids.fresh(), vec![x], &symbols);
        let filter = Rc::new(PlanNode::Filter(Rc::new(Filter::new(base, input, predicate.clone()))));
        let effective = effective_predicate(&filter, &symbols);
        assert!(effective.conjuncts().contains(&predicate));
    }

    fn eq_lit(sym: Symbol, v: i32) -> ExprImpl {
        let sym_ref: ExprImpl = SymbolReference::new(sym, DataType::Int32).into();
        let lit: ExprImpl = crate::expr::Literal::new(Some(ScalarImpl::Int32(v)), DataType::Int32).into();
        sym_ref.eq(lit)
    }

    #[test]
    fn union_effective_predicate_is_the_intersection_of_each_sources_conjuncts() {
        let ids = NodeIdAllocator::new();
        let symbols = crate::symbol::SymbolAllocator::new();
        let x1 = symbols.fresh("x1", DataType::Int32);
        let x2 = symbols.fresh("x2", DataType::Int32);
        let out = symbols.fresh("out", DataType::Int32);

        let shared1 = eq_lit(x1, 5);
        let unique1 = eq_lit(x1, 9);
        let scan1 = scan(&ids, &symbols, x1);
        let base1 = PlanBase::new(ids.fresh(), vec![x1], &symbols);
        let source1 = Rc::new(PlanNode::Filter(Rc::new(Filter::new(
            base1,
            scan1,
            shared1.clone().and(unique1),
        ))));

        let shared2 = eq_lit(x2, 5);
        let scan2 = scan(&ids, &symbols, x2);
        let base2 = PlanBase::new(ids.fresh(), vec![x2], &symbols);
        let source2 =
            Rc::new(PlanNode::Filter(Rc::new(Filter::new(base2, scan2, shared2))));

        let base = PlanBase::new(ids.fresh(), vec![out], &symbols);
        let union = Rc::new(PlanNode::SetOperation(Rc::new(SetOperation::new(
            base,
            vec![source1, source2],
            SetOperationKind::Union,
            vec![(out, vec![x1, x2])],
        ))));

        let effective = effective_predicate(&union, &symbols);
        let out_eq_5 = eq_lit(out, 5);
        assert!(effective.conjuncts().contains(&out_eq_5));
        assert_eq!(effective.conjuncts().len(), 1);
    }

    #[test]
    fn intersect_and_except_have_no_documented_effective_predicate_rule() {
        let ids = NodeIdAllocator::new();
        let symbols = crate::symbol::SymbolAllocator::new();
        let x1 = symbols.fresh("x1", DataType::Int32);
        let x2 = symbols.fresh("x2", DataType::Int32);
        let out = symbols.fresh("out", DataType::Int32);

        let scan1 = scan(&ids, &symbols, x1);
        let base1 = PlanBase::new(ids.fresh(), vec![x1], &symbols);
        let source1 =
            Rc::new(PlanNode::Filter(Rc::new(Filter::new(base1, scan1, eq_lit(x1, 5)))));
        let source2 = scan(&ids, &symbols, x2);

        let base = PlanBase::new(ids.fresh(), vec![out], &symbols);
        let intersect = Rc::new(PlanNode::SetOperation(Rc::new(SetOperation::new(
            base,
            vec![source1, source2],
            SetOperationKind::Intersect,
            vec![(out, vec![x1, x2])],
        ))));

        assert!(effective_predicate(&intersect, &symbols).is_true_literal());
    }
}
