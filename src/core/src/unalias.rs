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

//! Symbol unaliasing (§4.7): collapse chains of symbols known to carry the same value — a
//! `Project` that just renames (`b := a`), the two sides of an inner-join equi-clause, an
//! `Exchange`'s passthrough columns — down to one canonical symbol, and rewrite every *reference*
//! to an aliased symbol to use its canonical form instead. The symbol a node itself introduces
//! (a `Project` assignment's key, `GroupId::group_id_symbol`, `RowNumber::row_number_symbol`, and
//! so on) is a defining occurrence and is never touched; only the reference-position fields that
//! [`crate::plan_node::PlanNode::own_free_symbols`] already enumerates are rewritten here.

use std::rc::Rc;

use relplan_error::Result;
use rustc_hash::FxHashMap;

use crate::expr::{ExprImpl, ExprRewriter, SymbolReference};
use crate::plan_node::*;
use crate::symbol::{Symbol, TypeProvider};

/// Rewrites every reference to an aliased symbol in `plan` to its canonical form.
pub fn unalias(plan: &PlanRef, types: &dyn TypeProvider) -> Result<PlanRef> {
    let span = tracing::debug_span!("unalias_symbol_references");
    let _enter = span.enter();
    let mut edges = FxHashMap::default();
    collect_aliases(plan, types, &mut edges);
    let canon = Canonicalizer::build(edges)?;
    rewrite(plan, &canon, types)
}

/// Records `from -> to` only when it can't introduce a cycle with edges already collected; a plan
/// built of independent passes should never actually produce one, but collection walks the whole
/// tree in one pass so a defensive check here is cheap insurance against visit order surprises.
fn add_edge(edges: &mut FxHashMap<Symbol, Symbol>, from: Symbol, to: Symbol) {
    if from == to || edges.contains_key(&from) {
        return;
    }
    let mut cursor = to;
    let mut steps = 0usize;
    while let Some(&next) = edges.get(&cursor) {
        if next == from {
            return;
        }
        cursor = next;
        steps += 1;
        if steps > edges.len() + 1 {
            return;
        }
    }
    edges.insert(from, to);
}

fn collect_aliases(node: &PlanRef, types: &dyn TypeProvider, edges: &mut FxHashMap<Symbol, Symbol>) {
    for child in node.children() {
        collect_aliases(&child, types, edges);
    }
    match &**node {
        PlanNode::Project(n) => {
            for (sym, expr) in &n.assignments {
                if let Some(source) = expr.as_symbol_reference() {
                    add_edge(edges, *sym, source.symbol());
                }
            }
        }
        // An equi-clause only aliases its two symbols when they share a type — a clause over
        // differently-typed (but comparably-joinable) columns would otherwise have every
        // reference to the right symbol silently rewritten to the left one's type.
        PlanNode::Join(n) if n.join_type == JoinType::Inner => {
            for (left, right) in &n.equi_clauses {
                if types.type_of(*left) == types.type_of(*right) {
                    add_edge(edges, *right, *left);
                }
            }
        }
        PlanNode::Exchange(n) => {
            for (&out, &input) in node.outputs().iter().zip(n.input.outputs().iter()) {
                add_edge(edges, out, input);
            }
        }
        _ => {}
    }
}

/// Resolves each symbol to the canonical root of its alias chain. Built once up front rather than
/// chasing links lazily, so every lookup afterward is O(1) and a genuine cycle (a bug in
/// [`collect_aliases`], since [`add_edge`] already refuses to create one) is caught in one place.
struct Canonicalizer {
    resolved: FxHashMap<Symbol, Symbol>,
}

impl Canonicalizer {
    fn build(edges: FxHashMap<Symbol, Symbol>) -> Result<Self> {
        let mut resolved = FxHashMap::default();
        for &start in edges.keys() {
            if resolved.contains_key(&start) {
                continue;
            }
            let mut path = vec![start];
            let mut current = start;
            let root = loop {
                match edges.get(&current) {
                    Some(&next) => {
                        if let Some(&already) = resolved.get(&next) {
                            break already;
                        }
                        if path.contains(&next) {
                            relplan_error::bail_internal!(
                                "alias cycle detected while canonicalizing {current:?} -> {next:?}"
                            );
                        }
                        path.push(next);
                        current = next;
                    }
                    None => break current,
                }
            };
            for sym in path {
                resolved.insert(sym, root);
            }
        }
        Ok(Self { resolved })
    }

    fn canon(&self, sym: Symbol) -> Symbol {
        self.resolved.get(&sym).copied().unwrap_or(sym)
    }

    fn canon_vec(&self, syms: &[Symbol]) -> Vec<Symbol> {
        syms.iter().map(|&s| self.canon(s)).collect()
    }
}

struct SymbolCanonRewriter<'a> {
    canon: &'a Canonicalizer,
    types: &'a dyn TypeProvider,
}

impl ExprRewriter for SymbolCanonRewriter<'_> {
    fn rewrite_symbol_reference(&mut self, symbol_reference: SymbolReference) -> ExprImpl {
        let canonical = self.canon.canon(symbol_reference.symbol());
        if canonical == symbol_reference.symbol() {
            symbol_reference.into()
        } else {
            SymbolReference::new(canonical, self.types.type_of(canonical)).into()
        }
    }
}

fn rewrite_expr(e: &ExprImpl, canon: &Canonicalizer, types: &dyn TypeProvider) -> ExprImpl {
    let mut rewriter = SymbolCanonRewriter { canon, types };
    rewriter.rewrite_expr(e.clone())
}

fn rewrite(node: &PlanRef, canon: &Canonicalizer, types: &dyn TypeProvider) -> Result<PlanRef> {
    tracing::debug!(kind = node.kind_name(), id = ?node.id(), "visiting node");
    let children = node
        .children()
        .iter()
        .map(|c| rewrite(c, canon, types))
        .collect::<Result<Vec<_>>>()?;
    let with_new_children = node.with_children(children);
    Ok(Rc::new(rewrite_own(&with_new_children, canon, types)))
}

/// Rewrites the reference-position symbol fields of a single node, now that its children already
/// carry canonicalized outputs of their own. Mirrors the dispatch shape of `own_free_symbols`
/// exactly: every field enumerated there gets canonicalized here, and nothing else does.
fn rewrite_own(node: &PlanNode, canon: &Canonicalizer, types: &dyn TypeProvider) -> PlanNode {
    match node {
        PlanNode::TableScan(_) | PlanNode::Values(_) => node.clone(),

        PlanNode::Project(n) => {
            let assignments = n
                .assignments
                .iter()
                .map(|(sym, e)| (*sym, rewrite_expr(e, canon, types)))
                .collect();
            PlanNode::Project(Rc::new(Project {
                assignments,
                ..(**n).clone()
            }))
        }

        PlanNode::Filter(n) => PlanNode::Filter(Rc::new(Filter {
            predicate: rewrite_expr(&n.predicate, canon, types),
            ..(**n).clone()
        })),

        PlanNode::Aggregation(n) => {
            let aggregations = n
                .aggregations
                .iter()
                .map(|(out, call)| {
                    let call = AggregateFunctionCall {
                        arguments: canon.canon_vec(&call.arguments),
                        filter: call.filter.as_ref().map(|e| rewrite_expr(e, canon, types)),
                        order_by: call
                            .order_by
                            .iter()
                            .map(|(s, o)| (canon.canon(*s), *o))
                            .collect(),
                        ..call.clone()
                    };
                    (*out, call)
                })
                .collect();
            PlanNode::Aggregation(Rc::new(crate::plan_node::aggregation::Aggregation {
                grouping_keys: canon.canon_vec(&n.grouping_keys),
                grouping_sets: n.grouping_sets.iter().map(|set| canon.canon_vec(set)).collect(),
                aggregations,
                ..(**n).clone()
            }))
        }

        PlanNode::GroupId(n) => {
            let argument_symbols = n
                .argument_symbols
                .iter()
                .map(|(input, output)| (canon.canon(*input), *output))
                .collect();
            PlanNode::GroupId(Rc::new(GroupId {
                grouping_sets: n.grouping_sets.iter().map(|set| canon.canon_vec(set)).collect(),
                argument_symbols,
                ..(**n).clone()
            }))
        }

        PlanNode::Join(n) => {
            let equi_clauses = n
                .equi_clauses
                .iter()
                .map(|(l, r)| (canon.canon(*l), canon.canon(*r)))
                .collect();
            let dynamic_filters = n
                .dynamic_filters
                .iter()
                .map(|(id, probe)| (*id, canon.canon(*probe)))
                .collect();
            PlanNode::Join(Rc::new(Join {
                equi_clauses,
                filter: rewrite_expr(&n.filter, canon, types),
                dynamic_filters,
                ..(**n).clone()
            }))
        }

        PlanNode::SemiJoin(n) => {
            let join_symbols = n
                .join_symbols
                .iter()
                .map(|(l, r)| (canon.canon(*l), canon.canon(*r)))
                .collect();
            PlanNode::SemiJoin(Rc::new(SemiJoin {
                join_symbols,
                filter: rewrite_expr(&n.filter, canon, types),
                ..(**n).clone()
            }))
        }

        PlanNode::Window(n) => {
            let functions = n
                .functions
                .iter()
                .map(|(out, f)| {
                    let f = WindowFunctionCall {
                        arguments: canon.canon_vec(&f.arguments),
                        ..f.clone()
                    };
                    (*out, f)
                })
                .collect();
            PlanNode::Window(Rc::new(Window {
                partition_by: canon.canon_vec(&n.partition_by),
                order_by: n.order_by.iter().map(|(s, o)| (canon.canon(*s), *o)).collect(),
                functions,
                ..(**n).clone()
            }))
        }

        PlanNode::RowNumber(n) => PlanNode::RowNumber(Rc::new(RowNumber {
            partition_by: canon.canon_vec(&n.partition_by),
            order_by: n.order_by.iter().map(|(s, o)| (canon.canon(*s), *o)).collect(),
            ..(**n).clone()
        })),

        PlanNode::TopNRowNumber(n) => PlanNode::TopNRowNumber(Rc::new(TopNRowNumber {
            partition_by: canon.canon_vec(&n.partition_by),
            order_by: n.order_by.iter().map(|(s, o)| (canon.canon(*s), *o)).collect(),
            ..(**n).clone()
        })),

        PlanNode::Sort(n) => PlanNode::Sort(Rc::new(Sort {
            order_by: n.order_by.iter().map(|(s, o)| (canon.canon(*s), *o)).collect(),
            ..(**n).clone()
        })),

        PlanNode::TopN(n) => PlanNode::TopN(Rc::new(TopN {
            order_by: n.order_by.iter().map(|(s, o)| (canon.canon(*s), *o)).collect(),
            ..(**n).clone()
        })),

        PlanNode::Limit(_) | PlanNode::Offset(_) | PlanNode::AssignUniqueId(_) => node.clone(),

        PlanNode::DistinctLimit(n) => PlanNode::DistinctLimit(Rc::new(DistinctLimit {
            distinct_symbols: canon.canon_vec(&n.distinct_symbols),
            ..(**n).clone()
        })),

        PlanNode::SetOperation(n) => {
            let symbol_mapping = n
                .symbol_mapping
                .iter()
                .map(|(out, inputs)| (*out, canon.canon_vec(inputs)))
                .collect();
            PlanNode::SetOperation(Rc::new(SetOperation {
                symbol_mapping,
                ..(**n).clone()
            }))
        }

        PlanNode::Unnest(n) => {
            let unnest_symbols = n
                .unnest_symbols
                .iter()
                .map(|(input, outputs)| (canon.canon(*input), outputs.clone()))
                .collect();
            PlanNode::Unnest(Rc::new(Unnest {
                replicate_symbols: canon.canon_vec(&n.replicate_symbols),
                unnest_symbols,
                filter: rewrite_expr(&n.filter, canon, types),
                ..(**n).clone()
            }))
        }

        PlanNode::CorrelatedJoin(n) => PlanNode::CorrelatedJoin(Rc::new(CorrelatedJoin {
            correlation_symbols: canon.canon_vec(&n.correlation_symbols),
            filter: rewrite_expr(&n.filter, canon, types),
            ..(**n).clone()
        })),

        PlanNode::Exchange(n) => {
            let partitioning = n.partitioning.as_ref().map(|scheme| PartitioningScheme {
                columns: canon.canon_vec(&scheme.columns),
                ..scheme.clone()
            });
            PlanNode::Exchange(Rc::new(Exchange {
                partitioning,
                ordering: n.ordering.iter().map(|(s, o)| (canon.canon(*s), *o)).collect(),
                ..(**n).clone()
            }))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::TestCtx;

    #[test]
    fn project_identity_rename_collapses_to_canonical_symbol() {
        let ctx = TestCtx::new();
        let a = ctx.int_sym("a");
        let scan = ctx.scan("t", &[a]);
        let b = ctx.int_sym("b");
        let renamed = ctx.project(scan, vec![(b, ctx.sym_ref(a))]);
        let predicate = ctx.sym_ref(b).eq(ctx.lit_i32(1));
        let filter = ctx.filter(renamed, predicate);

        let rewritten = unalias(&filter, &ctx.symbols).unwrap();
        let PlanNode::Filter(f) = &*rewritten else {
            panic!("expected filter")
        };
        assert_eq!(f.predicate, ctx.sym_ref(a).eq(ctx.lit_i32(1)));
    }

    #[test]
    fn inner_join_equi_clause_aliases_right_to_left() {
        let ctx = TestCtx::new();
        let l = ctx.int_sym("l");
        let r = ctx.int_sym("r");
        let left = ctx.scan("left_t", &[l]);
        let right = ctx.scan("right_t", &[r]);
        let join = ctx.inner_join(left, right, vec![(l, r)]);
        let project = ctx.project(join, vec![(ctx.int_sym("out"), ctx.sym_ref(r))]);

        let rewritten = unalias(&project, &ctx.symbols).unwrap();
        let PlanNode::Project(p) = &*rewritten else {
            panic!("expected project")
        };
        assert_eq!(p.assignments[0].1, ctx.sym_ref(l));
    }

    #[test]
    fn inner_join_equi_clause_with_mismatched_types_is_not_aliased() {
        let ctx = TestCtx::new();
        let l = ctx.int_sym("l");
        let r = ctx.sym("r", relplan_common::types::DataType::Int64);
        let left = ctx.scan("left_t", &[l]);
        let right = ctx.scan("right_t", &[r]);
        let join = ctx.inner_join(left, right, vec![(l, r)]);
        let project = ctx.project(join, vec![(ctx.int_sym("out"), ctx.sym_ref(r))]);

        let rewritten = unalias(&project, &ctx.symbols).unwrap();
        let PlanNode::Project(p) = &*rewritten else {
            panic!("expected project")
        };
        assert_eq!(p.assignments[0].1, ctx.sym_ref(r));
    }

    #[test]
    fn exchange_passthrough_is_not_an_alias_when_symbols_match() {
        let ctx = TestCtx::new();
        let a = ctx.int_sym("a");
        let scan = ctx.scan("t", &[a]);
        let exchange = ctx.exchange_gather(scan);
        let rewritten = unalias(&exchange, &ctx.symbols).unwrap();
        assert_eq!(rewritten.outputs(), exchange.outputs());
    }

    #[test]
    fn defining_occurrences_are_left_untouched() {
        let ctx = TestCtx::new();
        let a = ctx.int_sym("a");
        let scan = ctx.scan("t", &[a]);
        let b = ctx.int_sym("b");
        let renamed = ctx.project(scan, vec![(b, ctx.sym_ref(a))]);

        let rewritten = unalias(&renamed, &ctx.symbols).unwrap();
        let PlanNode::Project(p) = &*rewritten else {
            panic!("expected project")
        };
        // `b` is the assignment's own key, a defining occurrence; it must survive unchanged even
        // though every *reference* to `b` elsewhere would have been rewritten to `a`.
        assert_eq!(p.assignments[0].0, b);
        assert_eq!(p.assignments[0].1, ctx.sym_ref(a));
    }
}
