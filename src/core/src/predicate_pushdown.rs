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

//! Predicate pushdown (§4.4): a top-down pass threading an *inherited* predicate down through the
//! tree, absorbing `Filter` nodes on the way and moving each conjunct as close to its source data
//! as the node kind allows. Every node above the inherited predicate's target keeps whatever
//! fragment it cannot safely delegate further in its own `filter`/`predicate` field, so the result
//! is sound even where it isn't maximally minimal (§4.4 "a correlated subquery's filter may end up
//! duplicated between the inner scan and the join filter — accepted imprecision, not a bug").

use std::cell::Cell;
use std::rc::Rc;

use relplan_common::scalar::ScalarImpl;
use relplan_common::types::DataType;
use relplan_error::Result;
use rustc_hash::FxHashSet;

use crate::expr::{
    conjunction, filter_deterministic_conjuncts, is_deterministic, Expr, ExprImpl, ExprRewriter,
    FunctionCall, FunctionType, SymbolReference,
};
use crate::effective_predicate::{effective_predicate, pull};
use crate::equality_inference::EqualityInference;
use crate::interpreter::{self, NullFor};
use crate::plan_node::*;
use crate::session::SessionConfig;
use crate::symbol::{Symbol, TypeProvider};

/// Mints the ids dynamic filters are addressed by (§4.4), separate from [`NodeIdAllocator`] since
/// the two numberings are never compared against each other.
#[derive(Clone, Default)]
pub struct DynamicFilterIdAllocator {
    next: Rc<Cell<u64>>,
}

impl DynamicFilterIdAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fresh(&self) -> DynamicFilterId {
        let id = self.next.get();
        self.next.set(id + 1);
        DynamicFilterId(id)
    }
}

/// Pushes `plan`'s predicates as far down the tree as each node kind allows, synthesizing dynamic
/// filters at equi-joins along the way when `session` permits it.
pub fn push_down_predicates(
    plan: &PlanRef,
    ids: &NodeIdAllocator,
    types: &dyn TypeProvider,
    session: &SessionConfig,
) -> Result<PlanRef> {
    let span = tracing::debug_span!("predicate_pushdown");
    let _enter = span.enter();
    let filter_ids = DynamicFilterIdAllocator::new();
    push_down(plan, &ExprImpl::true_expr(), ids, types, session, &filter_ids)
}

fn base(ids: &NodeIdAllocator, outputs: Vec<Symbol>, types: &dyn TypeProvider) -> PlanBase {
    PlanBase::new(ids.fresh(), outputs, types)
}

/// Wraps `input` in a `Filter` over `predicate`, unless `predicate` is trivially `TRUE`.
fn with_filter(
    input: PlanRef,
    predicate: ExprImpl,
    ids: &NodeIdAllocator,
    types: &dyn TypeProvider,
) -> PlanRef {
    if predicate.is_true_literal() {
        return input;
    }
    let b = base(ids, input.outputs().to_vec(), types);
    Rc::new(PlanNode::Filter(Rc::new(Filter::new(b, input, predicate))))
}

/// `DynamicFilter(id, probe)` (§4.4): represented as a `Named` function call with the id riding
/// along as an `Int64` literal, since [`FunctionType::Named`] only carries a `&'static str` and
/// can't embed a per-call numeric id itself.
fn dynamic_filter_expr(id: &DynamicFilterId, probe: Symbol, types: &dyn TypeProvider) -> ExprImpl {
    let id_literal: ExprImpl =
        crate::expr::Literal::new(Some(ScalarImpl::Int64(id.0 as i64)), DataType::Int64).into();
    let probe_ref: ExprImpl = SymbolReference::new(probe, types.type_of(probe)).into();
    FunctionCall::new_named("$dynamic_filter", vec![id_literal, probe_ref], DataType::Boolean, true)
        .into()
}

/// `true` iff `predicate` is guaranteed not to hold (false or null) when every symbol in
/// `null_side_outputs` is null — the test behind outer-to-inner join demotion (§4.4).
fn nulls_reject(predicate: &ExprImpl, null_side_outputs: &[Symbol]) -> bool {
    let outcome = interpreter::optimize(predicate, &NullFor(null_side_outputs));
    outcome.as_bool() == Some(false) || outcome.is_null()
}

/// The demoted join type once we know which sides' null-padded rows the filter rejects, derived
/// by case analysis of `FULL OUTER`'s three row categories (matched, left-unmatched, right-
/// unmatched): rejecting the right side's null padding removes exactly the left-unmatched rows,
/// turning `FULL` into `LEFT`, and symmetrically for the right.
fn demote(join_type: JoinType, reject_left_null: bool, reject_right_null: bool) -> JoinType {
    match join_type {
        JoinType::Inner => JoinType::Inner,
        JoinType::Left => {
            if reject_right_null {
                JoinType::Inner
            } else {
                JoinType::Left
            }
        }
        JoinType::Right => {
            if reject_left_null {
                JoinType::Inner
            } else {
                JoinType::Right
            }
        }
        JoinType::Full => match (reject_left_null, reject_right_null) {
            (true, true) => JoinType::Inner,
            (true, false) => JoinType::Right,
            (false, true) => JoinType::Left,
            (false, false) => JoinType::Full,
        },
    }
}

/// Rewrites every symbol reference through a `Project`'s assignments, so a conjunct expressed in
/// terms of the project's outputs can be re-expressed in terms of its input instead.
struct SubstituteAssignments<'a> {
    project: &'a Project,
}

impl ExprRewriter for SubstituteAssignments<'_> {
    fn rewrite_symbol_reference(&mut self, symbol_reference: SymbolReference) -> ExprImpl {
        match self.project.assignment(symbol_reference.symbol()) {
            Some(expr) => expr.clone(),
            None => symbol_reference.into(),
        }
    }
}

fn substitute_assignments(e: &ExprImpl, project: &Project) -> ExprImpl {
    let mut rewriter = SubstituteAssignments { project };
    rewriter.rewrite_expr(e.clone())
}

/// Splits `conjuncts` into those whose free symbols lie entirely within `scope` and everything
/// else.
fn partition_by_scope(conjuncts: Vec<ExprImpl>, scope: &FxHashSet<Symbol>) -> (Vec<ExprImpl>, Vec<ExprImpl>) {
    let mut inside = Vec::new();
    let mut outside = Vec::new();
    for c in conjuncts {
        if c.free_symbols().iter().all(|s| scope.contains(s)) {
            inside.push(c);
        } else {
            outside.push(c);
        }
    }
    (inside, outside)
}

fn symbol_set(outputs: &[Symbol]) -> FxHashSet<Symbol> {
    outputs.iter().copied().collect()
}

/// The node-kind dispatch table of §4.4. `inherited` is a predicate already known to hold of every
/// row `node` would otherwise produce; returns a (possibly rebuilt) equivalent plan that enforces
/// it as far down as it safely can.
fn push_down(
    node: &PlanRef,
    inherited: &ExprImpl,
    ids: &NodeIdAllocator,
    types: &dyn TypeProvider,
    session: &SessionConfig,
    filter_ids: &DynamicFilterIdAllocator,
) -> Result<PlanRef> {
    tracing::debug!(kind = node.kind_name(), id = ?node.id(), "visiting node");
    match &**node {
        PlanNode::TableScan(_) | PlanNode::Values(_) => {
            Ok(with_filter(node.clone(), inherited.clone(), ids, types))
        }

        PlanNode::Filter(n) => {
            let combined = conjunction(inherited.conjuncts().into_iter().chain(n.predicate.conjuncts()));
            push_down(&n.input, &combined, ids, types, session, filter_ids)
        }

        PlanNode::Project(n) => {
            let mut pushable = Vec::new();
            let mut residual = Vec::new();
            for c in inherited.conjuncts() {
                let deterministic_inputs =
                    c.free_symbols().iter().all(|s| match n.assignment(*s) {
                        Some(expr) => is_deterministic(expr),
                        None => true,
                    });
                if deterministic_inputs {
                    pushable.push(substitute_assignments(&c, n));
                } else {
                    residual.push(c);
                }
            }
            let pushed = conjunction(pushable);
            let new_input = push_down(&n.input, &pushed, ids, types, session, filter_ids)?;
            let rebuilt = if Rc::ptr_eq(&new_input, &n.input) {
                node.clone()
            } else {
                Rc::new(PlanNode::Project(Rc::new(Project {
                    input: new_input,
                    ..(**n).clone()
                })))
            };
            Ok(with_filter(rebuilt, conjunction(residual), ids, types))
        }

        PlanNode::Aggregation(n) => {
            let scope = symbol_set(&n.grouping_keys);
            let (pushable, residual) = partition_by_scope(inherited.conjuncts(), &scope);
            let new_input =
                push_down(&n.input, &conjunction(pushable), ids, types, session, filter_ids)?;
            let rebuilt = if Rc::ptr_eq(&new_input, &n.input) {
                node.clone()
            } else {
                Rc::new(PlanNode::Aggregation(Rc::new(Aggregation {
                    input: new_input,
                    ..(**n).clone()
                })))
            };
            Ok(with_filter(rebuilt, conjunction(residual), ids, types))
        }

        PlanNode::GroupId(n) => {
            let scope = symbol_set(&n.common_grouping_columns());
            let (pushable, residual) = partition_by_scope(inherited.conjuncts(), &scope);
            let new_input =
                push_down(&n.input, &conjunction(pushable), ids, types, session, filter_ids)?;
            let rebuilt = if Rc::ptr_eq(&new_input, &n.input) {
                node.clone()
            } else {
                Rc::new(PlanNode::GroupId(Rc::new(GroupId {
                    input: new_input,
                    ..(**n).clone()
                })))
            };
            Ok(with_filter(rebuilt, conjunction(residual), ids, types))
        }

        PlanNode::Window(n) => {
            let scope = symbol_set(&n.partition_by);
            let (pushable, residual) = partition_by_scope(inherited.conjuncts(), &scope);
            let new_input =
                push_down(&n.input, &conjunction(pushable), ids, types, session, filter_ids)?;
            let rebuilt = if Rc::ptr_eq(&new_input, &n.input) {
                node.clone()
            } else {
                Rc::new(PlanNode::Window(Rc::new(Window {
                    input: new_input,
                    ..(**n).clone()
                })))
            };
            Ok(with_filter(rebuilt, conjunction(residual), ids, types))
        }

        PlanNode::RowNumber(n) => {
            let scope = symbol_set(&n.partition_by);
            let (pushable, residual) = partition_by_scope(inherited.conjuncts(), &scope);
            let new_input =
                push_down(&n.input, &conjunction(pushable), ids, types, session, filter_ids)?;
            let rebuilt = if Rc::ptr_eq(&new_input, &n.input) {
                node.clone()
            } else {
                Rc::new(PlanNode::RowNumber(Rc::new(RowNumber {
                    input: new_input,
                    ..(**n).clone()
                })))
            };
            Ok(with_filter(rebuilt, conjunction(residual), ids, types))
        }

        PlanNode::TopNRowNumber(n) => {
            let scope = symbol_set(&n.partition_by);
            let (pushable, residual) = partition_by_scope(inherited.conjuncts(), &scope);
            let new_input =
                push_down(&n.input, &conjunction(pushable), ids, types, session, filter_ids)?;
            let rebuilt = if Rc::ptr_eq(&new_input, &n.input) {
                node.clone()
            } else {
                Rc::new(PlanNode::TopNRowNumber(Rc::new(TopNRowNumber {
                    input: new_input,
                    ..(**n).clone()
                })))
            };
            Ok(with_filter(rebuilt, conjunction(residual), ids, types))
        }

        // Opaque w.r.t. pushdown: each of these can reorder, truncate or otherwise change *which*
        // rows survive, so nothing can be pushed below them without changing the result. The
        // inherited predicate is still enforced, just above rather than below.
        PlanNode::Sort(n) => {
            let new_input =
                push_down(&n.input, &ExprImpl::true_expr(), ids, types, session, filter_ids)?;
            let rebuilt = if Rc::ptr_eq(&new_input, &n.input) {
                node.clone()
            } else {
                Rc::new(PlanNode::Sort(Rc::new(Sort {
                    input: new_input,
                    ..(**n).clone()
                })))
            };
            Ok(with_filter(rebuilt, inherited.clone(), ids, types))
        }

        PlanNode::TopN(n) => {
            let new_input =
                push_down(&n.input, &ExprImpl::true_expr(), ids, types, session, filter_ids)?;
            let rebuilt = if Rc::ptr_eq(&new_input, &n.input) {
                node.clone()
            } else {
                Rc::new(PlanNode::TopN(Rc::new(TopN {
                    input: new_input,
                    ..(**n).clone()
                })))
            };
            Ok(with_filter(rebuilt, inherited.clone(), ids, types))
        }

        PlanNode::Limit(n) => {
            let new_input =
                push_down(&n.input, &ExprImpl::true_expr(), ids, types, session, filter_ids)?;
            let rebuilt = if Rc::ptr_eq(&new_input, &n.input) {
                node.clone()
            } else {
                Rc::new(PlanNode::Limit(Rc::new(Limit {
                    input: new_input,
                    ..(**n).clone()
                })))
            };
            Ok(with_filter(rebuilt, inherited.clone(), ids, types))
        }

        PlanNode::Offset(n) => {
            let new_input =
                push_down(&n.input, &ExprImpl::true_expr(), ids, types, session, filter_ids)?;
            let rebuilt = if Rc::ptr_eq(&new_input, &n.input) {
                node.clone()
            } else {
                Rc::new(PlanNode::Offset(Rc::new(Offset {
                    input: new_input,
                    ..(**n).clone()
                })))
            };
            Ok(with_filter(rebuilt, inherited.clone(), ids, types))
        }

        PlanNode::DistinctLimit(n) => {
            let new_input =
                push_down(&n.input, &ExprImpl::true_expr(), ids, types, session, filter_ids)?;
            let rebuilt = if Rc::ptr_eq(&new_input, &n.input) {
                node.clone()
            } else {
                Rc::new(PlanNode::DistinctLimit(Rc::new(DistinctLimit {
                    input: new_input,
                    ..(**n).clone()
                })))
            };
            Ok(with_filter(rebuilt, inherited.clone(), ids, types))
        }

        PlanNode::AssignUniqueId(n) => {
            let new_input =
                push_down(&n.input, &ExprImpl::true_expr(), ids, types, session, filter_ids)?;
            let rebuilt = if Rc::ptr_eq(&new_input, &n.input) {
                node.clone()
            } else {
                Rc::new(PlanNode::AssignUniqueId(Rc::new(AssignUniqueId {
                    input: new_input,
                    ..(**n).clone()
                })))
            };
            Ok(with_filter(rebuilt, inherited.clone(), ids, types))
        }

        // A correlated subquery's own join semantics need to survive pushdown intact (§6.3 already
        // expects these gone by the time this pass runs in practice; kept opaque as a fallback).
        PlanNode::CorrelatedJoin(n) => {
            let new_input =
                push_down(&n.input, &ExprImpl::true_expr(), ids, types, session, filter_ids)?;
            let new_subquery =
                push_down(&n.subquery, &ExprImpl::true_expr(), ids, types, session, filter_ids)?;
            let rebuilt = if Rc::ptr_eq(&new_input, &n.input) && Rc::ptr_eq(&new_subquery, &n.subquery) {
                node.clone()
            } else {
                Rc::new(PlanNode::CorrelatedJoin(Rc::new(CorrelatedJoin {
                    input: new_input,
                    subquery: new_subquery,
                    ..(**n).clone()
                })))
            };
            Ok(with_filter(rebuilt, inherited.clone(), ids, types))
        }

        PlanNode::SemiJoin(n) => {
            let (marker_conjuncts, source_conjuncts) = {
                let mut marker = Vec::new();
                let mut source = Vec::new();
                for c in inherited.conjuncts() {
                    if c.free_symbols().contains(&n.output_marker) {
                        marker.push(c);
                    } else {
                        source.push(c);
                    }
                }
                (marker, source)
            };

            // Filtering case (π references the marker): also attempt pushing conjuncts (and
            // effective predicates) symmetrically between source and filtering-source via the
            // join-symbol equality, the same equality-inference technique the inner-join arm
            // uses for its two sides.
            let (source_push, filtering_push) = if marker_conjuncts.is_empty() {
                (conjunction(source_conjuncts), ExprImpl::true_expr())
            } else {
                let join_symbols_pred = conjunction(n.join_symbols.iter().map(|(s, f)| {
                    let s_ref: ExprImpl = SymbolReference::new(*s, types.type_of(*s)).into();
                    let f_ref: ExprImpl = SymbolReference::new(*f, types.type_of(*f)).into();
                    s_ref.eq(f_ref)
                }));
                let (det_source, _nondet_source) =
                    filter_deterministic_conjuncts(source_conjuncts.clone());
                let combined = conjunction(
                    det_source
                        .into_iter()
                        .chain(effective_predicate(&n.source, types).conjuncts())
                        .chain(effective_predicate(&n.filtering_source, types).conjuncts())
                        .chain(join_symbols_pred.conjuncts()),
                );
                let eq_inf = EqualityInference::new(&combined);
                let extra_source =
                    eq_inf.generate_equalities_partitioned_by(n.source.outputs()).scope_equalities;
                let extra_filtering = eq_inf
                    .generate_equalities_partitioned_by(n.filtering_source.outputs())
                    .scope_equalities;
                (
                    conjunction(source_conjuncts.into_iter().chain(extra_source)),
                    conjunction(extra_filtering),
                )
            };

            let new_source = push_down(&n.source, &source_push, ids, types, session, filter_ids)?;
            let new_filtering_source =
                push_down(&n.filtering_source, &filtering_push, ids, types, session, filter_ids)?;
            let rebuilt = if Rc::ptr_eq(&new_source, &n.source)
                && Rc::ptr_eq(&new_filtering_source, &n.filtering_source)
            {
                node.clone()
            } else {
                Rc::new(PlanNode::SemiJoin(Rc::new(SemiJoin {
                    source: new_source,
                    filtering_source: new_filtering_source,
                    ..(**n).clone()
                })))
            };
            Ok(with_filter(rebuilt, conjunction(marker_conjuncts), ids, types))
        }

        PlanNode::Unnest(n) => {
            let scope = symbol_set(&n.replicate_symbols);
            let (pushable, residual) = match n.join_type {
                JoinType::Inner | JoinType::Left => partition_by_scope(inherited.conjuncts(), &scope),
                JoinType::Right | JoinType::Full => (Vec::new(), inherited.conjuncts()),
            };
            let new_input =
                push_down(&n.input, &conjunction(pushable), ids, types, session, filter_ids)?;
            let rebuilt = if Rc::ptr_eq(&new_input, &n.input) {
                node.clone()
            } else {
                Rc::new(PlanNode::Unnest(Rc::new(Unnest {
                    input: new_input,
                    ..(**n).clone()
                })))
            };
            Ok(with_filter(rebuilt, conjunction(residual), ids, types))
        }

        PlanNode::SetOperation(n) => {
            // A set operation preserves row values exactly, so a row-wise predicate commutes with
            // it regardless of kind: `filter(A) op filter(B) == filter(A op B)` for union,
            // intersect and except alike.
            let mut new_sources = Vec::with_capacity(n.sources.len());
            let mut any_changed = false;
            for (i, source) in n.sources.iter().enumerate() {
                let translated = translate_set_operation_predicate(inherited, n, i);
                let new_source =
                    push_down(source, &translated, ids, types, session, filter_ids)?;
                any_changed |= !Rc::ptr_eq(&new_source, source);
                new_sources.push(new_source);
            }
            if !any_changed {
                return Ok(node.clone());
            }
            Ok(Rc::new(PlanNode::SetOperation(Rc::new(SetOperation {
                sources: new_sources,
                ..(**n).clone()
            }))))
        }

        PlanNode::Exchange(n) => {
            let new_input = push_down(&n.input, inherited, ids, types, session, filter_ids)?;
            if Rc::ptr_eq(&new_input, &n.input) {
                Ok(node.clone())
            } else {
                Ok(Rc::new(PlanNode::Exchange(Rc::new(Exchange {
                    input: new_input,
                    ..(**n).clone()
                }))))
            }
        }

        PlanNode::Join(n) if n.join_type == JoinType::Inner => {
            let left_set = symbol_set(n.left.outputs());
            let right_set = symbol_set(n.right.outputs());

            let (det_inherited, nondet_inherited) =
                filter_deterministic_conjuncts(inherited.conjuncts());
            let mut cross_det = Vec::new();
            for c in &det_inherited {
                let free = c.free_symbols();
                let single_sided =
                    free.iter().all(|s| left_set.contains(s)) || free.iter().all(|s| right_set.contains(s));
                if !single_sided {
                    cross_det.push(c.clone());
                }
            }

            let equi_pred = n.equi_clauses_as_predicate(types);
            let combined_det =
                conjunction(n.filter.conjuncts().into_iter().chain(equi_pred.conjuncts()).chain(det_inherited));

            let right_pred = effective_predicate(&n.right, types);
            let left_pred = effective_predicate(&n.left, types);
            let mut left_push = pull(&combined_det.clone().and(right_pred), n.left.outputs());
            let mut right_push = pull(&combined_det.and(left_pred), n.right.outputs());

            let mut residual_nondet = Vec::new();
            for c in nondet_inherited {
                let free = c.free_symbols();
                if free.iter().all(|s| left_set.contains(s)) {
                    left_push = left_push.and(c);
                } else if free.iter().all(|s| right_set.contains(s)) {
                    right_push = right_push.and(c);
                } else {
                    residual_nondet.push(c);
                }
            }

            let mut dynamic_filters = n.dynamic_filters.clone();
            if session.enable_dynamic_filtering && dynamic_filters.is_empty() {
                for (l, r) in &n.equi_clauses {
                    let id = filter_ids.fresh();
                    tracing::trace!(probe = ?l, build = ?r, filter_id = id.0, "synthesizing dynamic filter");
                    left_push = left_push.and(dynamic_filter_expr(&id, *l, types));
                    dynamic_filters.push((id, *r));
                }
            }

            let new_left = push_down(&n.left, &left_push, ids, types, session, filter_ids)?;
            let new_right = push_down(&n.right, &right_push, ids, types, session, filter_ids)?;
            let new_filter =
                conjunction(n.filter.conjuncts().into_iter().chain(cross_det).chain(residual_nondet));

            let changed = !Rc::ptr_eq(&new_left, &n.left)
                || !Rc::ptr_eq(&new_right, &n.right)
                || new_filter != n.filter
                || dynamic_filters != n.dynamic_filters;
            if !changed {
                return Ok(node.clone());
            }
            Ok(Rc::new(PlanNode::Join(Rc::new(Join {
                left: new_left,
                right: new_right,
                filter: new_filter,
                dynamic_filters,
                ..(**n).clone()
            }))))
        }

        PlanNode::Join(n) => {
            let combined = inherited.clone().and(n.filter.clone());
            let reject_left_null = nulls_reject(&combined, n.left.outputs());
            let reject_right_null = nulls_reject(&combined, n.right.outputs());
            let demoted = demote(n.join_type, reject_left_null, reject_right_null);
            if demoted != n.join_type && tracing::enabled!(tracing::Level::TRACE) {
                tracing::trace!(
                    before = ?n.join_type,
                    after = ?demoted,
                    predicate = ?combined,
                    "demoting outer join"
                );
            }

            if demoted == JoinType::Inner {
                let inner = Rc::new(PlanNode::Join(Rc::new(Join {
                    join_type: JoinType::Inner,
                    ..(**n).clone()
                })));
                return push_down(&inner, inherited, ids, types, session, filter_ids);
            }

            let left_set = symbol_set(n.left.outputs());
            let right_set = symbol_set(n.right.outputs());
            let (det_inherited, nondet_inherited) =
                filter_deterministic_conjuncts(inherited.conjuncts());
            let join_pred = conjunction(
                n.equi_clauses_as_predicate(types).conjuncts().into_iter().chain(n.filter.conjuncts()),
            );

            // `outerOnlyInheritedEqualities`: π's deterministic conjuncts that already lie
            // entirely within the outer side's scope. These push straight to the outer side, and
            // (combined with both children's effective predicates and the join predicate itself)
            // feed an equality inference whose scope-equalities into the *inner* side are also
            // safe to push — they implicitly assume the outer row exists, which holds for every
            // matched row and is harmless for unmatched (null-padded) ones since the post-join
            // filter below still enforces π on the final output.
            let (left_push, right_push, kept) = match demoted {
                JoinType::Left => {
                    let (outer_only, outer_kept) = partition_by_scope(det_inherited, &left_set);
                    let outer_only = conjunction(outer_only);
                    let inner_inference_input = conjunction(
                        outer_only
                            .conjuncts()
                            .into_iter()
                            .chain(effective_predicate(&n.left, types).conjuncts())
                            .chain(effective_predicate(&n.right, types).conjuncts())
                            .chain(join_pred.conjuncts()),
                    );
                    let eq_inf = EqualityInference::new(&inner_inference_input);
                    let inner_push = conjunction(
                        eq_inf.generate_equalities_partitioned_by(n.right.outputs()).scope_equalities,
                    );
                    let kept = outer_kept.into_iter().chain(nondet_inherited).collect();
                    (outer_only, inner_push, kept)
                }
                JoinType::Right => {
                    let (outer_only, outer_kept) = partition_by_scope(det_inherited, &right_set);
                    let outer_only = conjunction(outer_only);
                    let inner_inference_input = conjunction(
                        outer_only
                            .conjuncts()
                            .into_iter()
                            .chain(effective_predicate(&n.left, types).conjuncts())
                            .chain(effective_predicate(&n.right, types).conjuncts())
                            .chain(join_pred.conjuncts()),
                    );
                    let eq_inf = EqualityInference::new(&inner_inference_input);
                    let inner_push = conjunction(
                        eq_inf.generate_equalities_partitioned_by(n.left.outputs()).scope_equalities,
                    );
                    let kept = outer_kept.into_iter().chain(nondet_inherited).collect();
                    (inner_push, outer_only, kept)
                }
                JoinType::Full => (ExprImpl::true_expr(), ExprImpl::true_expr(), inherited.conjuncts()),
                JoinType::Inner => unreachable!("handled above"),
            };

            let new_left = push_down(&n.left, &left_push, ids, types, session, filter_ids)?;
            let new_right = push_down(&n.right, &right_push, ids, types, session, filter_ids)?;
            let new_filter = conjunction(n.filter.conjuncts().into_iter().chain(kept));

            let changed = !Rc::ptr_eq(&new_left, &n.left)
                || !Rc::ptr_eq(&new_right, &n.right)
                || new_filter != n.filter
                || demoted != n.join_type;
            if !changed {
                return Ok(node.clone());
            }
            Ok(Rc::new(PlanNode::Join(Rc::new(Join {
                left: new_left,
                right: new_right,
                join_type: demoted,
                filter: new_filter,
                ..(**n).clone()
            }))))
        }
    }
}

/// Translates `inherited` from a `SetOperation`'s output symbol space into source `i`'s own
/// symbol space, dropping any conjunct that depends on an output the set operation's kind doesn't
/// actually derive from that source (there is none for `Union`/`Intersect`/`Except` as modeled
/// here, since every output has an image in every source, but the guard keeps this safe if that
/// ever changes).
fn translate_set_operation_predicate(inherited: &ExprImpl, n: &SetOperation, i: usize) -> ExprImpl {
    struct Renamer<'a> {
        n: &'a SetOperation,
        i: usize,
        ok: bool,
    }
    impl ExprRewriter for Renamer<'_> {
        fn rewrite_symbol_reference(&mut self, symbol_reference: SymbolReference) -> ExprImpl {
            match self.n.input_symbol(symbol_reference.symbol(), self.i) {
                Some(mapped) => SymbolReference::new(mapped, symbol_reference.return_type()).into(),
                None => {
                    self.ok = false;
                    symbol_reference.into()
                }
            }
        }
    }
    let mut out = Vec::new();
    for c in inherited.conjuncts() {
        let mut renamer = Renamer { n, i, ok: true };
        let rewritten = renamer.rewrite_expr(c);
        if renamer.ok {
            out.push(rewritten);
        }
    }
    conjunction(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::TestCtx;

    fn run(ctx: &TestCtx, plan: &PlanRef, session: &SessionConfig) -> PlanRef {
        push_down_predicates(plan, &ctx.ids, &ctx.symbols, session).unwrap()
    }

    #[test]
    fn nested_filters_absorb_into_single_filter_over_scan() {
        let ctx = TestCtx::new();
        let a = ctx.int_sym("a");
        let scan = ctx.scan("t", &[a]);
        let inner = ctx.filter(scan, ctx.sym_ref(a).eq(ctx.lit_i32(1)));
        let outer = ctx.filter(inner, ctx.sym_ref(a).eq(ctx.lit_i32(1)));

        let result = run(&ctx, &outer, &SessionConfig::default());
        let PlanNode::Filter(f) = &*result else {
            panic!("expected a single filter over the scan, got {result:?}");
        };
        assert!(matches!(&*f.input, PlanNode::TableScan(_)));
        assert_eq!(f.predicate.conjuncts().len(), 1);
    }

    #[test]
    fn deterministic_project_assignment_is_inlined_and_pushed_below() {
        let ctx = TestCtx::new();
        let a = ctx.int_sym("a");
        let scan = ctx.scan("t", &[a]);
        let b = ctx.int_sym("b");
        // b := a + 1, deterministic.
        let plus_one = FunctionCall::new(FunctionType::Add, vec![ctx.sym_ref(a), ctx.lit_i32(1)]).into();
        let project = ctx.project(scan, vec![(b, plus_one)]);
        let filtered = ctx.filter(project, ctx.sym_ref(b).eq(ctx.lit_i32(5)));

        let result = run(&ctx, &filtered, &SessionConfig::default());
        let PlanNode::Project(p) = &*result else {
            panic!("expected project at the top, got {result:?}");
        };
        let PlanNode::Filter(f) = &*p.input else {
            panic!("expected the predicate pushed below the project, got {:?}", p.input);
        };
        assert!(matches!(&*f.input, PlanNode::TableScan(_)));
    }

    #[test]
    fn nondeterministic_project_assignment_keeps_filter_above() {
        let ctx = TestCtx::new();
        let a = ctx.int_sym("a");
        let scan = ctx.scan("t", &[a]);
        let b = ctx.int_sym("b");
        let random_call = FunctionCall::new_named("random", vec![], DataType::Int32, false).into();
        let project = ctx.project(scan, vec![(b, random_call)]);
        let filtered = ctx.filter(project, ctx.sym_ref(b).eq(ctx.lit_i32(5)));

        let result = run(&ctx, &filtered, &SessionConfig::default());
        let PlanNode::Filter(f) = &*result else {
            panic!("expected the filter to stay above the project, got {result:?}");
        };
        assert!(matches!(&*f.input, PlanNode::Project(_)));
    }

    #[test]
    fn aggregation_pushes_grouping_key_predicate_below() {
        let ctx = TestCtx::new();
        let k = ctx.int_sym("k");
        let v = ctx.int_sym("v");
        let scan = ctx.scan("t", &[k, v]);
        let count = ctx.count_call(v);
        let total = ctx.int_sym("total");
        let agg = ctx.aggregation(scan, vec![k], vec![(total, count)]);
        let filtered = ctx.filter(agg, ctx.sym_ref(k).eq(ctx.lit_i32(1)));

        let result = run(&ctx, &filtered, &SessionConfig::default());
        let PlanNode::Aggregation(a) = &*result else {
            panic!("expected aggregation at the top, got {result:?}");
        };
        let PlanNode::Filter(_) = &*a.input else {
            panic!("expected the grouping-key predicate pushed below the aggregation, got {:?}", a.input);
        };
    }

    #[test]
    fn aggregation_keeps_predicate_on_aggregate_output_above() {
        let ctx = TestCtx::new();
        let k = ctx.int_sym("k");
        let v = ctx.int_sym("v");
        let scan = ctx.scan("t", &[k, v]);
        let count = ctx.count_call(v);
        let total = ctx.int_sym("total");
        let agg = ctx.aggregation(scan, vec![k], vec![(total, count)]);
        let filtered = ctx.filter(agg, ctx.sym_ref(total).eq(ctx.lit_i32(1)));

        let result = run(&ctx, &filtered, &SessionConfig::default());
        let PlanNode::Filter(f) = &*result else {
            panic!("expected the filter to stay above the aggregation, got {result:?}");
        };
        assert!(matches!(&*f.input, PlanNode::Aggregation(_)));
    }

    #[test]
    fn inner_join_equality_inference_derives_predicate_on_other_side() {
        let ctx = TestCtx::new();
        let l = ctx.int_sym("l");
        let r = ctx.int_sym("r");
        let left = ctx.scan("left_t", &[l]);
        let right = ctx.scan("right_t", &[r]);
        let join = ctx.inner_join(left, right, vec![(l, r)]);
        let filtered = ctx.filter(join, ctx.sym_ref(l).eq(ctx.lit_i32(10)));

        let mut session = SessionConfig::default();
        session.enable_dynamic_filtering = false;
        let result = run(&ctx, &filtered, &session);
        let PlanNode::Join(j) = &*result else {
            panic!("expected join at the top, got {result:?}");
        };
        let PlanNode::Filter(left_filter) = &*j.left else {
            panic!("expected the original predicate pushed to the left scan, got {:?}", j.left);
        };
        assert!(left_filter.predicate.conjuncts().iter().any(|c| *c == ctx.sym_ref(l).eq(ctx.lit_i32(10))));

        let PlanNode::Filter(right_filter) = &*j.right else {
            panic!("expected a derived predicate pushed to the right scan, got {:?}", j.right);
        };
        let has_derived = right_filter.predicate.conjuncts().iter().any(|c| {
            c.as_equality().is_some_and(|(a, b)| {
                (*a == ctx.sym_ref(r) || *b == ctx.sym_ref(r))
                    && (a.as_literal().is_some() || b.as_literal().is_some())
            })
        });
        assert!(has_derived, "expected r = 10 derived via equality inference, got {:?}", right_filter.predicate);
    }

    #[test]
    fn inner_join_synthesizes_dynamic_filter_when_enabled() {
        let ctx = TestCtx::new();
        let l = ctx.int_sym("l");
        let r = ctx.int_sym("r");
        let left = ctx.scan("left_t", &[l]);
        let right = ctx.scan("right_t", &[r]);
        let join = ctx.inner_join(left, right, vec![(l, r)]);

        let result = run(&ctx, &join, &SessionConfig::default());
        let PlanNode::Join(j) = &*result else {
            panic!("expected join at the top, got {result:?}");
        };
        assert_eq!(j.dynamic_filters.len(), 1);
        assert_eq!(j.dynamic_filters[0].1, r);
    }

    #[test]
    fn inner_join_skips_dynamic_filter_when_disabled() {
        let ctx = TestCtx::new();
        let l = ctx.int_sym("l");
        let r = ctx.int_sym("r");
        let left = ctx.scan("left_t", &[l]);
        let right = ctx.scan("right_t", &[r]);
        let join = ctx.inner_join(left, right, vec![(l, r)]);

        let mut session = SessionConfig::default();
        session.enable_dynamic_filtering = false;
        let result = run(&ctx, &join, &session);
        let PlanNode::Join(j) = &*result else {
            panic!("expected join at the top, got {result:?}");
        };
        assert!(j.dynamic_filters.is_empty());
    }

    #[test]
    fn left_join_demotes_to_inner_when_predicate_rejects_right_null() {
        let ctx = TestCtx::new();
        let l = ctx.int_sym("l");
        let r = ctx.int_sym("r");
        let left = ctx.scan("left_t", &[l]);
        let right = ctx.scan("right_t", &[r]);
        let join = ctx.left_join(left, right, vec![(l, r)]);
        let filtered = ctx.filter(join, ctx.sym_ref(r).eq(ctx.lit_i32(5)));

        let result = run(&ctx, &filtered, &SessionConfig::default());
        let PlanNode::Join(j) = &*result else {
            panic!("expected join at the top, got {result:?}");
        };
        assert_eq!(j.join_type, JoinType::Inner);
    }

    #[test]
    fn left_join_stays_outer_when_predicate_tolerates_right_null() {
        let ctx = TestCtx::new();
        let l = ctx.int_sym("l");
        let r = ctx.int_sym("r");
        let left = ctx.scan("left_t", &[l]);
        let right = ctx.scan("right_t", &[r]);
        let join = ctx.left_join(left, right, vec![(l, r)]);
        let predicate = ctx.sym_ref(r).eq(ctx.lit_i32(5)).or(ctx.sym_ref(r).is_null());
        let filtered = ctx.filter(join, predicate);

        let result = run(&ctx, &filtered, &SessionConfig::default());
        let PlanNode::Join(j) = &*result else {
            panic!("expected join at the top, got {result:?}");
        };
        assert_eq!(j.join_type, JoinType::Left);
    }

    #[test]
    fn left_join_pushes_an_equality_derived_fact_onto_the_inner_side() {
        let ctx = TestCtx::new();
        let l = ctx.int_sym("l");
        let r = ctx.int_sym("r");
        let left = ctx.scan("left_t", &[l]);
        let right = ctx.scan("right_t", &[r]);
        let join = ctx.left_join(left, right, vec![(l, r)]);
        // Only mentions `l` (the outer side), so the right-null-rejection test is indifferent —
        // the join stays `LEFT` rather than demoting to `INNER`.
        let filtered = ctx.filter(join, ctx.sym_ref(l).eq(ctx.lit_i32(5)));

        let result = run(&ctx, &filtered, &SessionConfig::default());
        let PlanNode::Join(j) = &*result else {
            panic!("expected join at the top, got {result:?}");
        };
        assert_eq!(j.join_type, JoinType::Left);

        let PlanNode::Filter(left_filter) = &*j.left else {
            panic!("expected the outer-only predicate pushed to the left scan, got {:?}", j.left);
        };
        assert!(left_filter.predicate.conjuncts().iter().any(|c| *c == ctx.sym_ref(l).eq(ctx.lit_i32(5))));

        let PlanNode::Filter(right_filter) = &*j.right else {
            panic!("expected a predicate derived via the outer-side equality on the inner scan, got {:?}", j.right);
        };
        let has_derived = right_filter.predicate.conjuncts().iter().any(|c| {
            c.as_equality().is_some_and(|(a, b)| {
                (*a == ctx.sym_ref(r) || *b == ctx.sym_ref(r))
                    && (a.as_literal().is_some() || b.as_literal().is_some())
            })
        });
        assert!(
            has_derived,
            "expected r = 5 derived onto the inner side via l = 5 and the l = r equi-clause, got {:?}",
            right_filter.predicate
        );
    }

    #[test]
    fn full_join_demotes_to_left_when_predicate_rejects_only_right_null() {
        let ctx = TestCtx::new();
        let l = ctx.int_sym("l");
        let r = ctx.int_sym("r");
        let left = ctx.scan("left_t", &[l]);
        let right = ctx.scan("right_t", &[r]);
        let join = ctx.full_join(left, right, vec![(l, r)]);
        let filtered = ctx.filter(join, ctx.sym_ref(r).eq(ctx.lit_i32(5)));

        let result = run(&ctx, &filtered, &SessionConfig::default());
        let PlanNode::Join(j) = &*result else {
            panic!("expected join at the top, got {result:?}");
        };
        assert_eq!(j.join_type, JoinType::Left);
    }

    #[test]
    fn semi_join_splits_marker_conjuncts_from_source_conjuncts() {
        let ctx = TestCtx::new();
        let a = ctx.int_sym("a");
        let marker = ctx.sym("marker", DataType::Boolean);
        let scan = ctx.scan("t", &[a]);
        let filtering = ctx.scan("f", &[a]);
        let semi = ctx.semi_join(scan, filtering, vec![(a, a)], marker, false);
        let predicate = ctx.sym_ref(a).eq(ctx.lit_i32(1)).and(ctx.sym_ref(marker));
        let filtered = ctx.filter(semi, predicate);

        let result = run(&ctx, &filtered, &SessionConfig::default());
        let PlanNode::Filter(top) = &*result else {
            panic!("expected the marker conjunct retained above the semi-join, got {result:?}");
        };
        assert!(top.predicate.conjuncts().iter().any(|c| *c == ctx.sym_ref(marker)));
        let PlanNode::SemiJoin(s) = &*top.input else {
            panic!("expected semi-join below, got {:?}", top.input);
        };
        let PlanNode::Filter(source_filter) = &*s.source else {
            panic!("expected the source-only conjunct pushed into the source, got {:?}", s.source);
        };
        assert!(source_filter.predicate.conjuncts().iter().any(|c| *c == ctx.sym_ref(a).eq(ctx.lit_i32(1))));
    }

    #[test]
    fn filtering_semi_join_pushes_a_derived_fact_onto_the_filtering_source() {
        let ctx = TestCtx::new();
        let s = ctx.int_sym("s");
        let f = ctx.int_sym("f");
        let marker = ctx.sym("marker", DataType::Boolean);
        let scan = ctx.scan("t", &[s]);
        let filtering = ctx.scan("f_t", &[f]);
        let semi = ctx.semi_join(scan, filtering, vec![(s, f)], marker, false);
        // References the marker, so this is the "filtering" case: the symmetric push via the
        // join-symbol equality (s = f) should additionally derive `f = 5` onto `filtering_source`.
        let predicate = ctx.sym_ref(marker).and(ctx.sym_ref(s).eq(ctx.lit_i32(5)));
        let filtered = ctx.filter(semi, predicate);

        let result = run(&ctx, &filtered, &SessionConfig::default());
        let PlanNode::Filter(top) = &*result else {
            panic!("expected the marker conjunct retained above the semi-join, got {result:?}");
        };
        assert!(top.predicate.conjuncts().iter().any(|c| *c == ctx.sym_ref(marker)));
        let PlanNode::SemiJoin(semi) = &*top.input else {
            panic!("expected semi-join below, got {:?}", top.input);
        };
        let PlanNode::Filter(source_filter) = &*semi.source else {
            panic!("expected the source-only conjunct pushed into the source, got {:?}", semi.source);
        };
        assert!(source_filter.predicate.conjuncts().iter().any(|c| *c == ctx.sym_ref(s).eq(ctx.lit_i32(5))));

        let PlanNode::Filter(filtering_filter) = &*semi.filtering_source else {
            panic!(
                "expected a fact derived via the join-symbol equality pushed onto the filtering source, got {:?}",
                semi.filtering_source
            );
        };
        let has_derived = filtering_filter.predicate.conjuncts().iter().any(|c| {
            c.as_equality().is_some_and(|(a, b)| {
                (*a == ctx.sym_ref(f) || *b == ctx.sym_ref(f))
                    && (a.as_literal().is_some() || b.as_literal().is_some())
            })
        });
        assert!(
            has_derived,
            "expected f = 5 derived onto the filtering source via s = 5 and the s = f join-symbol equality, got {:?}",
            filtering_filter.predicate
        );
    }
}
