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

//! Exchange insertion (§4.5): a top-down pass that threads a *preferred* partitioning from parent
//! to child, and returns each subplan paired with the *actual* partitioning it now has. A node
//! whose own semantics demand a particular child partitioning (an aggregation's grouping keys, a
//! join's equi-clauses, a window's partition-by) asks for that directly; everything else passes
//! its parent's preference straight through. [`require`] is the single place that reconciles a
//! mismatch by inserting a `Gather` or `Repartition` exchange.

use std::collections::HashSet;
use std::rc::Rc;

use relplan_error::Result;

use crate::expr::ExprImpl;
use crate::plan_node::*;
use crate::session::SessionConfig;
use crate::symbol::{Symbol, TypeProvider};

/// The node-partitioning half of §4.5's "actual properties" (stream orderings are the other
/// half, carried alongside in [`ActualProperties`]).
#[derive(Clone, Debug, PartialEq)]
enum Partitioning {
    /// Every row on one node.
    Single,
    /// Spread across nodes with no particular column grouping rows together.
    Arbitrary,
    /// Spread across nodes such that every row sharing these column values is on the same node.
    Hashed(Vec<Symbol>),
}

impl Partitioning {
    /// Whether data already in `self` distribution satisfies a `want` requirement without
    /// further movement. `Single` trivially satisfies any requirement (everything is already
    /// colocated); `Arbitrary` satisfies nothing but its own absence of a requirement.
    fn satisfies(&self, want: &Partitioning) -> bool {
        match want {
            Partitioning::Arbitrary => true,
            Partitioning::Single => matches!(self, Partitioning::Single),
            Partitioning::Hashed(cols) => match self {
                Partitioning::Single => true,
                Partitioning::Hashed(have) => same_set(have, cols),
                Partitioning::Arbitrary => false,
            },
        }
    }
}

fn same_set(a: &[Symbol], b: &[Symbol]) -> bool {
    let a: HashSet<_> = a.iter().collect();
    let b: HashSet<_> = b.iter().collect();
    a == b
}

#[derive(Clone, Debug, PartialEq)]
struct ActualProperties {
    partitioning: Partitioning,
    orderings: Vec<(Symbol, SortOrder)>,
}

impl ActualProperties {
    fn arbitrary() -> Self {
        Self {
            partitioning: Partitioning::Arbitrary,
            orderings: vec![],
        }
    }

    fn single() -> Self {
        Self {
            partitioning: Partitioning::Single,
            orderings: vec![],
        }
    }
}

/// Inserts every exchange the plan needs (§4.5), finishing by gathering the whole result to the
/// coordinator — the "Output... gather to coordinator if not already there" rule.
pub fn insert_exchanges(
    plan: &PlanRef,
    ids: &NodeIdAllocator,
    types: &dyn TypeProvider,
    session: &SessionConfig,
) -> Result<PlanRef> {
    let span = tracing::debug_span!("exchange_insertion");
    let _enter = span.enter();
    let (plan, actual) = plan_with_properties(plan, &Partitioning::Arbitrary, ids, types, session)?;
    let (plan, _) = require(plan, actual, &Partitioning::Single, ids, types);
    Ok(plan)
}

fn base(ids: &NodeIdAllocator, outputs: Vec<Symbol>, types: &dyn TypeProvider) -> PlanBase {
    PlanBase::new(ids.fresh(), outputs, types)
}

/// Wraps `plan` in an exchange if its `actual` properties don't already satisfy `want`.
fn require(
    plan: PlanRef,
    actual: ActualProperties,
    want: &Partitioning,
    ids: &NodeIdAllocator,
    types: &dyn TypeProvider,
) -> (PlanRef, ActualProperties) {
    if actual.partitioning.satisfies(want) {
        return (plan, actual);
    }
    match want {
        Partitioning::Single => {
            let b = base(ids, plan.outputs().to_vec(), types);
            let exchange = Rc::new(PlanNode::Exchange(Rc::new(Exchange::gather(
                b,
                plan,
                ExchangeScope::Remote,
            ))));
            (exchange, ActualProperties::single())
        }
        Partitioning::Hashed(cols) => {
            let b = base(ids, plan.outputs().to_vec(), types);
            let scheme = PartitioningScheme::hash(cols.clone());
            let exchange = Rc::new(PlanNode::Exchange(Rc::new(Exchange::repartition(b, plan, scheme))));
            (
                exchange,
                ActualProperties {
                    partitioning: Partitioning::Hashed(cols.clone()),
                    orderings: vec![],
                },
            )
        }
        Partitioning::Arbitrary => (plan, actual),
    }
}

fn gather_to_single(
    plan: PlanRef,
    actual: ActualProperties,
    ids: &NodeIdAllocator,
    types: &dyn TypeProvider,
) -> (PlanRef, ActualProperties) {
    require(plan, actual, &Partitioning::Single, ids, types)
}

/// The node-kind dispatch table of §4.5.
fn plan_with_properties(
    node: &PlanRef,
    preferred: &Partitioning,
    ids: &NodeIdAllocator,
    types: &dyn TypeProvider,
    session: &SessionConfig,
) -> Result<(PlanRef, ActualProperties)> {
    tracing::debug!(kind = node.kind_name(), id = ?node.id(), "visiting node");
    match &**node {
        PlanNode::TableScan(_) | PlanNode::Values(_) => Ok((node.clone(), ActualProperties::arbitrary())),

        PlanNode::Filter(n) => {
            let (new_input, actual) = plan_with_properties(&n.input, preferred, ids, types, session)?;
            let rebuilt = rebuild_input(node, &n.input, new_input, |input| {
                PlanNode::Filter(Rc::new(Filter {
                    input,
                    ..(**n).clone()
                }))
            });
            Ok((rebuilt, actual))
        }

        PlanNode::Project(n) => {
            let child_preferred = match preferred {
                Partitioning::Hashed(cols) => translate_cols_to_input(cols, n)
                    .map(Partitioning::Hashed)
                    .unwrap_or(Partitioning::Arbitrary),
                other => other.clone(),
            };
            let (new_input, actual) = plan_with_properties(&n.input, &child_preferred, ids, types, session)?;
            let rebuilt = rebuild_input(node, &n.input, new_input, |input| {
                PlanNode::Project(Rc::new(Project {
                    input,
                    ..(**n).clone()
                }))
            });
            let partitioning = match &actual.partitioning {
                Partitioning::Hashed(cols) => translate_cols_to_output(cols, n)
                    .map(Partitioning::Hashed)
                    .unwrap_or(Partitioning::Arbitrary),
                other => other.clone(),
            };
            Ok((rebuilt, ActualProperties { partitioning, orderings: vec![] }))
        }

        PlanNode::Aggregation(n) => {
            let want = if n.grouping_keys.is_empty() {
                Partitioning::Single
            } else {
                Partitioning::Hashed(n.grouping_keys.clone())
            };
            let (child, child_actual) = plan_with_properties(&n.input, &want, ids, types, session)?;
            let (child, _) = require(child, child_actual, &want, ids, types);
            let rebuilt = rebuild_input(node, &n.input, child, |input| {
                PlanNode::Aggregation(Rc::new(Aggregation {
                    input,
                    ..(**n).clone()
                }))
            });
            Ok((rebuilt, ActualProperties { partitioning: want, orderings: vec![] }))
        }

        PlanNode::GroupId(n) => {
            let (new_input, _) =
                plan_with_properties(&n.input, &Partitioning::Arbitrary, ids, types, session)?;
            let rebuilt = rebuild_input(node, &n.input, new_input, |input| {
                PlanNode::GroupId(Rc::new(GroupId {
                    input,
                    ..(**n).clone()
                }))
            });
            // GroupId nulls out columns per grouping set, which can break whatever partitioning
            // or ordering the input had; conservatively claim nothing about the result.
            Ok((rebuilt, ActualProperties::arbitrary()))
        }

        PlanNode::Window(n) => {
            let want = if n.partition_by.is_empty() {
                Partitioning::Single
            } else {
                Partitioning::Hashed(n.partition_by.clone())
            };
            let (child, child_actual) = plan_with_properties(&n.input, &want, ids, types, session)?;
            let (child, _) = require(child, child_actual, &want, ids, types);
            let rebuilt = rebuild_input(node, &n.input, child, |input| {
                PlanNode::Window(Rc::new(Window {
                    input,
                    ..(**n).clone()
                }))
            });
            Ok((rebuilt, ActualProperties { partitioning: want, orderings: vec![] }))
        }

        PlanNode::RowNumber(n) => {
            let want = if n.partition_by.is_empty() {
                Partitioning::Single
            } else {
                Partitioning::Hashed(n.partition_by.clone())
            };
            let (child, child_actual) = plan_with_properties(&n.input, &want, ids, types, session)?;
            let (child, _) = require(child, child_actual, &want, ids, types);
            let rebuilt = rebuild_input(node, &n.input, child, |input| {
                PlanNode::RowNumber(Rc::new(RowNumber {
                    input,
                    ..(**n).clone()
                }))
            });
            Ok((rebuilt, ActualProperties { partitioning: want, orderings: vec![] }))
        }

        PlanNode::TopNRowNumber(n) => {
            let want = if n.partition_by.is_empty() {
                Partitioning::Single
            } else {
                Partitioning::Hashed(n.partition_by.clone())
            };
            let (child, child_actual) = plan_with_properties(&n.input, &want, ids, types, session)?;
            let (child, _) = require(child, child_actual, &want, ids, types);
            let rebuilt = rebuild_input(node, &n.input, child, |input| {
                PlanNode::TopNRowNumber(Rc::new(TopNRowNumber {
                    input,
                    ..(**n).clone()
                }))
            });
            Ok((rebuilt, ActualProperties { partitioning: want, orderings: vec![] }))
        }

        PlanNode::Sort(n) => {
            if session.distributed_sort_enabled {
                let (child, _) =
                    plan_with_properties(&n.input, &Partitioning::Arbitrary, ids, types, session)?;
                let round_robin = PartitioningScheme::round_robin();
                let b = base(ids, child.outputs().to_vec(), types);
                let repartitioned = Rc::new(PlanNode::Exchange(Rc::new(Exchange::repartition(
                    b,
                    child,
                    round_robin,
                ))));
                let local_sort_base = base(ids, repartitioned.outputs().to_vec(), types);
                let local_sort = Rc::new(PlanNode::Sort(Rc::new(Sort::new(
                    local_sort_base,
                    repartitioned,
                    n.order_by.clone(),
                ))));
                let merge_base = base(ids, local_sort.outputs().to_vec(), types);
                let merging = Rc::new(PlanNode::Exchange(Rc::new(Exchange::new(
                    merge_base,
                    local_sort,
                    ExchangeKind::Gather,
                    ExchangeScope::Remote,
                    None,
                    n.order_by.clone(),
                ))));
                Ok((
                    merging,
                    ActualProperties {
                        partitioning: Partitioning::Single,
                        orderings: n.order_by.clone(),
                    },
                ))
            } else {
                let (child, child_actual) =
                    plan_with_properties(&n.input, &Partitioning::Single, ids, types, session)?;
                let (child, _) = gather_to_single(child, child_actual, ids, types);
                let rebuilt = rebuild_input(node, &n.input, child, |input| {
                    PlanNode::Sort(Rc::new(Sort {
                        input,
                        ..(**n).clone()
                    }))
                });
                Ok((
                    rebuilt,
                    ActualProperties {
                        partitioning: Partitioning::Single,
                        orderings: n.order_by.clone(),
                    },
                ))
            }
        }

        PlanNode::TopN(n) => {
            let (child, child_actual) =
                plan_with_properties(&n.input, &Partitioning::Single, ids, types, session)?;
            let (child, _) = gather_to_single(child, child_actual, ids, types);
            let rebuilt = rebuild_input(node, &n.input, child, |input| {
                PlanNode::TopN(Rc::new(TopN {
                    input,
                    ..(**n).clone()
                }))
            });
            Ok((
                rebuilt,
                ActualProperties {
                    partitioning: Partitioning::Single,
                    orderings: n.order_by.clone(),
                },
            ))
        }

        PlanNode::Limit(n) => {
            let (child, child_actual) =
                plan_with_properties(&n.input, &Partitioning::Arbitrary, ids, types, session)?;
            if child_actual.partitioning == Partitioning::Single {
                let rebuilt = rebuild_input(node, &n.input, child, |input| {
                    PlanNode::Limit(Rc::new(Limit {
                        input,
                        ..(**n).clone()
                    }))
                });
                return Ok((rebuilt, ActualProperties::single()));
            }
            // A partial limit per partition, then a gather, then the real limit on top: no
            // partition can ever contribute more rows than the whole result needs.
            let partial_base = base(ids, child.outputs().to_vec(), types);
            let partial = Rc::new(PlanNode::Limit(Rc::new(Limit::new(partial_base, child, n.count))));
            let (gathered, _) = gather_to_single(partial, child_actual, ids, types);
            let final_base = base(ids, gathered.outputs().to_vec(), types);
            let final_limit =
                Rc::new(PlanNode::Limit(Rc::new(Limit::new(final_base, gathered, n.count))));
            Ok((final_limit, ActualProperties::single()))
        }

        PlanNode::Offset(n) => {
            let (child, child_actual) =
                plan_with_properties(&n.input, &Partitioning::Single, ids, types, session)?;
            let (child, _) = gather_to_single(child, child_actual, ids, types);
            let rebuilt = rebuild_input(node, &n.input, child, |input| {
                PlanNode::Offset(Rc::new(Offset {
                    input,
                    ..(**n).clone()
                }))
            });
            Ok((rebuilt, ActualProperties::single()))
        }

        PlanNode::DistinctLimit(n) => {
            let (child, child_actual) =
                plan_with_properties(&n.input, &Partitioning::Single, ids, types, session)?;
            let (child, _) = gather_to_single(child, child_actual, ids, types);
            let rebuilt = rebuild_input(node, &n.input, child, |input| {
                PlanNode::DistinctLimit(Rc::new(DistinctLimit {
                    input,
                    ..(**n).clone()
                }))
            });
            Ok((rebuilt, ActualProperties::single()))
        }

        PlanNode::AssignUniqueId(n) => {
            let (new_input, actual) = plan_with_properties(&n.input, preferred, ids, types, session)?;
            let rebuilt = rebuild_input(node, &n.input, new_input, |input| {
                PlanNode::AssignUniqueId(Rc::new(AssignUniqueId {
                    input,
                    ..(**n).clone()
                }))
            });
            Ok((rebuilt, actual))
        }

        // A correlated subquery shouldn't survive to this pass (§6.3); kept opaque as a fallback,
        // same as predicate pushdown.
        PlanNode::CorrelatedJoin(n) => {
            let (new_input, _) =
                plan_with_properties(&n.input, &Partitioning::Arbitrary, ids, types, session)?;
            let (new_subquery, _) =
                plan_with_properties(&n.subquery, &Partitioning::Arbitrary, ids, types, session)?;
            let rebuilt = if Rc::ptr_eq(&new_input, &n.input) && Rc::ptr_eq(&new_subquery, &n.subquery) {
                node.clone()
            } else {
                Rc::new(PlanNode::CorrelatedJoin(Rc::new(CorrelatedJoin {
                    input: new_input,
                    subquery: new_subquery,
                    ..(**n).clone()
                })))
            };
            Ok((rebuilt, ActualProperties::arbitrary()))
        }

        PlanNode::SemiJoin(n) => {
            let (new_source, source_actual) =
                plan_with_properties(&n.source, preferred, ids, types, session)?;
            let (new_filtering, filtering_actual) =
                plan_with_properties(&n.filtering_source, &Partitioning::Arbitrary, ids, types, session)?;
            // The filtering side must be visible in full wherever the source rows are compared
            // against it; simplified here to a single-node gather rather than a true broadcast.
            let (new_filtering, _) = gather_to_single(new_filtering, filtering_actual, ids, types);
            let rebuilt = if Rc::ptr_eq(&new_source, &n.source) && Rc::ptr_eq(&new_filtering, &n.filtering_source)
            {
                node.clone()
            } else {
                Rc::new(PlanNode::SemiJoin(Rc::new(SemiJoin {
                    source: new_source,
                    filtering_source: new_filtering,
                    ..(**n).clone()
                })))
            };
            Ok((rebuilt, source_actual))
        }

        PlanNode::Unnest(n) => {
            let (new_input, _) =
                plan_with_properties(&n.input, &Partitioning::Arbitrary, ids, types, session)?;
            let rebuilt = rebuild_input(node, &n.input, new_input, |input| {
                PlanNode::Unnest(Rc::new(Unnest {
                    input,
                    ..(**n).clone()
                }))
            });
            // Replicating rows per unnested element can multiply a partition's row count in
            // ways that no longer line up with any column-value partitioning it had.
            Ok((rebuilt, ActualProperties::arbitrary()))
        }

        PlanNode::SetOperation(n) if n.kind == SetOperationKind::Union => {
            if let Partitioning::Hashed(cols) = preferred {
                let mut new_sources = Vec::with_capacity(n.sources.len());
                let mut any_changed = false;
                for (i, source) in n.sources.iter().enumerate() {
                    let source_cols: Vec<Symbol> = cols
                        .iter()
                        .map(|&out| n.input_symbol(out, i).expect("union output maps from every source"))
                        .collect();
                    let want = Partitioning::Hashed(source_cols);
                    let (new_source, actual) = plan_with_properties(source, &want, ids, types, session)?;
                    let (new_source, _) = require(new_source, actual, &want, ids, types);
                    any_changed |= !Rc::ptr_eq(&new_source, source);
                    new_sources.push(new_source);
                }
                let rebuilt = if any_changed {
                    Rc::new(PlanNode::SetOperation(Rc::new(SetOperation {
                        sources: new_sources,
                        ..(**n).clone()
                    })))
                } else {
                    node.clone()
                };
                return Ok((rebuilt, ActualProperties { partitioning: Partitioning::Hashed(cols.clone()), orderings: vec![] }));
            }

            let mut planned = Vec::with_capacity(n.sources.len());
            for source in &n.sources {
                planned.push(plan_with_properties(source, &Partitioning::Arbitrary, ids, types, session)?);
            }
            let all_single = planned.iter().all(|(_, a)| a.partitioning == Partitioning::Single);
            let any_single = planned.iter().any(|(_, a)| a.partitioning == Partitioning::Single);
            let mut new_sources = Vec::with_capacity(planned.len());
            let mut any_changed = false;
            if any_single && !all_single {
                for (i, (source, actual)) in planned.into_iter().enumerate() {
                    let (source, _) = gather_to_single(source, actual, ids, types);
                    any_changed |= !Rc::ptr_eq(&source, &n.sources[i]);
                    new_sources.push(source);
                }
            } else {
                for (i, (source, _)) in planned.into_iter().enumerate() {
                    any_changed |= !Rc::ptr_eq(&source, &n.sources[i]);
                    new_sources.push(source);
                }
            }
            let rebuilt = if any_changed {
                Rc::new(PlanNode::SetOperation(Rc::new(SetOperation {
                    sources: new_sources,
                    ..(**n).clone()
                })))
            } else {
                node.clone()
            };
            let partitioning = if any_single { Partitioning::Single } else { Partitioning::Arbitrary };
            Ok((rebuilt, ActualProperties { partitioning, orderings: vec![] }))
        }

        // Intersect/Except: simplified to a single-node evaluation rather than a distributed
        // hash-based set reconciliation.
        PlanNode::SetOperation(n) => {
            let mut new_sources = Vec::with_capacity(n.sources.len());
            let mut any_changed = false;
            for source in &n.sources {
                let (new_source, actual) =
                    plan_with_properties(source, &Partitioning::Single, ids, types, session)?;
                let (new_source, _) = gather_to_single(new_source, actual, ids, types);
                any_changed |= !Rc::ptr_eq(&new_source, source);
                new_sources.push(new_source);
            }
            let rebuilt = if any_changed {
                Rc::new(PlanNode::SetOperation(Rc::new(SetOperation {
                    sources: new_sources,
                    ..(**n).clone()
                })))
            } else {
                node.clone()
            };
            Ok((rebuilt, ActualProperties::single()))
        }

        // Rare: a plan that already carries an exchange (e.g. produced by an earlier partial run
        // of this same pass). Treated as a fixed boundary; only its input is processed further.
        PlanNode::Exchange(n) => {
            let (new_input, _) =
                plan_with_properties(&n.input, &Partitioning::Arbitrary, ids, types, session)?;
            let rebuilt = rebuild_input(node, &n.input, new_input, |input| {
                PlanNode::Exchange(Rc::new(Exchange {
                    input,
                    ..(**n).clone()
                }))
            });
            let partitioning = match n.kind {
                ExchangeKind::Gather => Partitioning::Single,
                ExchangeKind::Repartition => {
                    Partitioning::Hashed(n.partitioning.as_ref().map(|p| p.columns.clone()).unwrap_or_default())
                }
                ExchangeKind::Replicate => Partitioning::Single,
            };
            Ok((rebuilt, ActualProperties { partitioning, orderings: n.ordering.clone() }))
        }

        PlanNode::Join(n) => {
            let replicated = n.equi_clauses.is_empty() || !session.colocated_join_enabled;
            if replicated {
                let (new_left, left_actual) =
                    plan_with_properties(&n.left, &Partitioning::Arbitrary, ids, types, session)?;
                let (new_right, right_actual) =
                    plan_with_properties(&n.right, &Partitioning::Arbitrary, ids, types, session)?;
                let (new_right, _) = if left_actual.partitioning == Partitioning::Single {
                    gather_to_single(new_right, right_actual, ids, types)
                } else {
                    let b = base(ids, new_right.outputs().to_vec(), types);
                    let replicate =
                        Rc::new(PlanNode::Exchange(Rc::new(Exchange::replicate(b, new_right))));
                    (replicate, ActualProperties::single())
                };
                let rebuilt = Rc::new(PlanNode::Join(Rc::new(Join {
                    left: new_left,
                    right: new_right,
                    distribution_type: Some(JoinDistributionType::Replicated),
                    ..(**n).clone()
                })));
                return Ok((rebuilt, left_actual));
            }

            let left_keys: Vec<Symbol> = n.equi_clauses.iter().map(|(l, _)| *l).collect();
            let right_keys: Vec<Symbol> = n.equi_clauses.iter().map(|(_, r)| *r).collect();
            let left_want = Partitioning::Hashed(left_keys.clone());
            let right_want = Partitioning::Hashed(right_keys.clone());

            let (new_left, left_actual) = plan_with_properties(&n.left, &left_want, ids, types, session)?;
            let (new_left, _) = require(new_left, left_actual, &left_want, ids, types);
            let (new_right, right_actual) = plan_with_properties(&n.right, &right_want, ids, types, session)?;
            let (new_right, _) = require(new_right, right_actual, &right_want, ids, types);

            let rebuilt = Rc::new(PlanNode::Join(Rc::new(Join {
                left: new_left,
                right: new_right,
                distribution_type: Some(JoinDistributionType::Partitioned),
                ..(**n).clone()
            })));
            Ok((rebuilt, ActualProperties { partitioning: left_want, orderings: vec![] }))
        }
    }
}

/// Rebuilds a single-child node via `f` only if `new_input` actually differs from `old_input`,
/// otherwise returns `node` unchanged (same `Rc`, same id).
fn rebuild_input(
    node: &PlanRef,
    old_input: &PlanRef,
    new_input: PlanRef,
    f: impl FnOnce(PlanRef) -> PlanNode,
) -> PlanRef {
    if Rc::ptr_eq(&new_input, old_input) {
        node.clone()
    } else {
        Rc::new(f(new_input))
    }
}

fn translate_cols_to_input(cols: &[Symbol], project: &Project) -> Option<Vec<Symbol>> {
    cols.iter()
        .map(|s| project.assignment(*s)?.as_symbol_reference().map(|r| r.symbol()))
        .collect()
}

fn translate_cols_to_output(input_cols: &[Symbol], project: &Project) -> Option<Vec<Symbol>> {
    input_cols
        .iter()
        .map(|&input_sym| {
            project.assignments.iter().find_map(|(out, expr)| {
                expr.as_symbol_reference()
                    .filter(|r| r.symbol() == input_sym)
                    .map(|_| *out)
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::TestCtx;

    fn run(ctx: &TestCtx, plan: &PlanRef, session: &SessionConfig) -> PlanRef {
        insert_exchanges(plan, &ctx.ids, &ctx.symbols, session).unwrap()
    }

    #[test]
    fn root_is_gathered_to_a_single_node() {
        let ctx = TestCtx::new();
        let a = ctx.int_sym("a");
        let scan = ctx.scan("t", &[a]);

        let result = run(&ctx, &scan, &SessionConfig::default());
        let PlanNode::Exchange(e) = &*result else {
            panic!("expected a gathering exchange at the root, got {result:?}");
        };
        assert_eq!(e.kind, ExchangeKind::Gather);
        assert!(matches!(&*e.input, PlanNode::TableScan(_)));
    }

    #[test]
    fn aggregation_with_grouping_keys_gets_hash_partitioned_child() {
        let ctx = TestCtx::new();
        let k = ctx.int_sym("k");
        let v = ctx.int_sym("v");
        let scan = ctx.scan("t", &[k, v]);
        let count = ctx.count_call(v);
        let total = ctx.int_sym("total");
        let agg = ctx.aggregation(scan, vec![k], vec![(total, count)]);

        let result = run(&ctx, &agg, &SessionConfig::default());
        // root gather wraps the aggregation; look one level down.
        let PlanNode::Exchange(gather) = &*result else {
            panic!("expected root gather, got {result:?}");
        };
        let PlanNode::Aggregation(a) = &*gather.input else {
            panic!("expected aggregation below the root gather, got {:?}", gather.input);
        };
        let PlanNode::Exchange(repartition) = &*a.input else {
            panic!("expected a repartitioning exchange below the aggregation, got {:?}", a.input);
        };
        assert_eq!(repartition.kind, ExchangeKind::Repartition);
        let scheme = repartition.partitioning.as_ref().expect("repartition carries a scheme");
        assert_eq!(scheme.columns, vec![k]);
    }

    #[test]
    fn aggregation_without_grouping_keys_gathers_child() {
        let ctx = TestCtx::new();
        let v = ctx.int_sym("v");
        let scan = ctx.scan("t", &[v]);
        let count = ctx.count_call(v);
        let total = ctx.int_sym("total");
        let agg = ctx.aggregation(scan, vec![], vec![(total, count)]);

        let result = run(&ctx, &agg, &SessionConfig::default());
        let PlanNode::Exchange(gather) = &*result else {
            panic!("expected root gather, got {result:?}");
        };
        let PlanNode::Aggregation(a) = &*gather.input else {
            panic!("expected aggregation below the root gather, got {:?}", gather.input);
        };
        let PlanNode::Exchange(inner_gather) = &*a.input else {
            panic!("expected a gathering exchange below the global aggregation, got {:?}", a.input);
        };
        assert_eq!(inner_gather.kind, ExchangeKind::Gather);
    }

    #[test]
    fn partitioned_join_hash_partitions_both_sides_on_their_own_keys() {
        let ctx = TestCtx::new();
        let l = ctx.int_sym("l");
        let r = ctx.int_sym("r");
        let left = ctx.scan("left_t", &[l]);
        let right = ctx.scan("right_t", &[r]);
        let join = ctx.inner_join(left, right, vec![(l, r)]);

        let result = run(&ctx, &join, &SessionConfig::default());
        let PlanNode::Exchange(gather) = &*result else {
            panic!("expected root gather, got {result:?}");
        };
        let PlanNode::Join(j) = &*gather.input else {
            panic!("expected join below the root gather, got {:?}", gather.input);
        };
        assert_eq!(j.distribution_type, Some(JoinDistributionType::Partitioned));
        let PlanNode::Exchange(left_exch) = &*j.left else {
            panic!("expected left side repartitioned, got {:?}", j.left);
        };
        assert_eq!(left_exch.partitioning.as_ref().unwrap().columns, vec![l]);
        let PlanNode::Exchange(right_exch) = &*j.right else {
            panic!("expected right side repartitioned, got {:?}", j.right);
        };
        assert_eq!(right_exch.partitioning.as_ref().unwrap().columns, vec![r]);
    }

    #[test]
    fn join_without_equi_clauses_replicates_right_side() {
        let ctx = TestCtx::new();
        let l = ctx.int_sym("l");
        let r = ctx.int_sym("r");
        let left = ctx.scan("left_t", &[l]);
        let right = ctx.scan("right_t", &[r]);
        let join = ctx.join(JoinType::Inner, left, right, vec![], ExprImpl::true_expr());

        let result = run(&ctx, &join, &SessionConfig::default());
        let PlanNode::Exchange(gather) = &*result else {
            panic!("expected root gather, got {result:?}");
        };
        let PlanNode::Join(j) = &*gather.input else {
            panic!("expected join below the root gather, got {:?}", gather.input);
        };
        assert_eq!(j.distribution_type, Some(JoinDistributionType::Replicated));
        let PlanNode::Exchange(right_exch) = &*j.right else {
            panic!("expected right side replicated, got {:?}", j.right);
        };
        assert_eq!(right_exch.kind, ExchangeKind::Replicate);
    }

    #[test]
    fn limit_is_split_into_partial_and_final_around_a_gather() {
        let ctx = TestCtx::new();
        let a = ctx.int_sym("a");
        let scan = ctx.scan("t", &[a]);
        let limited = ctx.limit(scan, 10);

        let result = run(&ctx, &limited, &SessionConfig::default());
        let PlanNode::Limit(final_limit) = &*result else {
            panic!("expected the final limit at the top, got {result:?}");
        };
        let PlanNode::Exchange(gather) = &*final_limit.input else {
            panic!("expected a gather between the two limits, got {:?}", final_limit.input);
        };
        assert_eq!(gather.kind, ExchangeKind::Gather);
        assert!(matches!(&*gather.input, PlanNode::Limit(_)), "expected a partial limit below the gather");
    }

    #[test]
    fn window_with_partition_by_gets_hash_partitioned_child() {
        let ctx = TestCtx::new();
        let p = ctx.int_sym("p");
        let v = ctx.int_sym("v");
        let scan = ctx.scan("t", &[p, v]);
        let rn = WindowFunctionCall {
            name: "row_number",
            arguments: vec![],
            return_type: relplan_common::types::DataType::Int64,
            deterministic: true,
        };
        let out = ctx.int_sym("rn");
        let window = ctx.window(scan, vec![p], vec![], vec![(out, rn)]);

        let result = run(&ctx, &window, &SessionConfig::default());
        let PlanNode::Exchange(gather) = &*result else {
            panic!("expected root gather, got {result:?}");
        };
        let PlanNode::Window(w) = &*gather.input else {
            panic!("expected window below the root gather, got {:?}", gather.input);
        };
        let PlanNode::Exchange(repartition) = &*w.input else {
            panic!("expected a repartitioning exchange below the window, got {:?}", w.input);
        };
        assert_eq!(repartition.partitioning.as_ref().unwrap().columns, vec![p]);
    }
}
