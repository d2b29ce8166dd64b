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

//! Prune unreferenced outputs (§4.6): a top-down rewrite carrying the set of symbols the parent
//! actually needs. Each node kind figures out what it needs from its own children to still
//! satisfy that set plus its own internal requirements (a join's equi-clause columns, an
//! aggregation's grouping keys, ...), recurses, and rebuilds itself with a narrower output list.
//! A node that turns out to contribute nothing observable (an unused `SemiJoin` marker, an unused
//! `AssignUniqueId`, a `CorrelatedJoin` whose at-most-scalar subquery nobody reads) collapses away
//! entirely rather than being rebuilt empty-handed.
//!
//! Idempotent by construction: a node whose children came back unchanged (same `Rc`) and whose own
//! output list didn't shrink is returned as the very same `Rc` it started as, rather than a fresh
//! clone with a new id — running this pass again over its own output finds nothing left to trim.

use std::rc::Rc;

use relplan_error::Result;
use rustc_hash::FxHashSet;

use crate::expr::ExprImpl;
use crate::plan_node::*;
use crate::symbol::{Symbol, TypeProvider};

/// Prunes `plan` down to exactly the columns it advertises today, discarding everything
/// unreachable from that requirement.
pub fn prune(plan: &PlanRef, ids: &NodeIdAllocator, types: &dyn TypeProvider) -> Result<PlanRef> {
    let span = tracing::debug_span!("prune_unreferenced_outputs");
    let _enter = span.enter();
    let required: FxHashSet<Symbol> = plan.outputs().iter().copied().collect();
    prune_required(plan, &required, ids, types)
}

fn base(ids: &NodeIdAllocator, outputs: Vec<Symbol>, types: &dyn TypeProvider) -> PlanBase {
    PlanBase::new(ids.fresh(), outputs, types)
}

fn restrict(outputs: &[Symbol], required: &FxHashSet<Symbol>) -> FxHashSet<Symbol> {
    outputs.iter().copied().filter(|s| required.contains(s)).collect()
}

fn prune_required(
    node: &PlanRef,
    required: &FxHashSet<Symbol>,
    ids: &NodeIdAllocator,
    types: &dyn TypeProvider,
) -> Result<PlanRef> {
    tracing::debug!(kind = node.kind_name(), id = ?node.id(), "visiting node");
    match &**node {
        PlanNode::TableScan(n) => {
            let new_assignments: Vec<_> =
                n.assignments.iter().filter(|(_, s)| required.contains(s)).cloned().collect();
            if new_assignments.len() == n.assignments.len() {
                return Ok(node.clone());
            }
            let new_outputs = new_assignments.iter().map(|(_, s)| *s).collect();
            Ok(Rc::new(PlanNode::TableScan(Rc::new(TableScan::new(
                base(ids, new_outputs, types),
                &n.table_name,
                new_assignments,
                n.enforced_constraint.clone(),
            )))))
        }

        PlanNode::Values(n) => {
            let kept_idx: Vec<usize> = node
                .outputs()
                .iter()
                .enumerate()
                .filter(|(_, s)| required.contains(s))
                .map(|(i, _)| i)
                .collect();
            if kept_idx.len() == node.outputs().len() {
                return Ok(node.clone());
            }
            let new_rows = n
                .rows
                .iter()
                .map(|row| kept_idx.iter().map(|&i| row[i].clone()).collect())
                .collect();
            let new_outputs = kept_idx.iter().map(|&i| node.outputs()[i]).collect();
            Ok(Rc::new(PlanNode::Values(Rc::new(Values::new(
                base(ids, new_outputs, types),
                new_rows,
            )))))
        }

        PlanNode::Project(n) => {
            let new_assignments: Vec<_> =
                n.assignments.iter().filter(|(s, _)| required.contains(s)).cloned().collect();
            let mut child_required = FxHashSet::default();
            for (_, e) in &new_assignments {
                child_required.extend(e.free_symbols());
            }
            let new_input = prune_required(&n.input, &child_required, ids, types)?;
            if Rc::ptr_eq(&new_input, &n.input) && new_assignments.len() == n.assignments.len() {
                return Ok(node.clone());
            }
            let new_outputs = new_assignments.iter().map(|(s, _)| *s).collect();
            Ok(Rc::new(PlanNode::Project(Rc::new(Project::new(
                base(ids, new_outputs, types),
                new_input,
                new_assignments,
            )))))
        }

        PlanNode::Filter(n) => {
            let mut child_required = required.clone();
            child_required.extend(n.predicate.free_symbols());
            let new_input = prune_required(&n.input, &child_required, ids, types)?;
            if Rc::ptr_eq(&new_input, &n.input) {
                return Ok(node.clone());
            }
            let new_outputs = new_input.outputs().to_vec();
            Ok(Rc::new(PlanNode::Filter(Rc::new(Filter::new(
                base(ids, new_outputs, types),
                new_input,
                n.predicate.clone(),
            )))))
        }

        PlanNode::Aggregation(n) => {
            let new_aggregations: Vec<_> =
                n.aggregations.iter().filter(|(s, _)| required.contains(s)).cloned().collect();
            let mut child_required: FxHashSet<Symbol> = n.grouping_keys.iter().copied().collect();
            for set in &n.grouping_sets {
                child_required.extend(set.iter().copied());
            }
            for (_, call) in &new_aggregations {
                child_required.extend(call.arguments.iter().copied());
                if let Some(f) = &call.filter {
                    child_required.extend(f.free_symbols());
                }
                child_required.extend(call.order_by.iter().map(|(s, _)| *s));
            }
            if let Some(g) = n.group_id_symbol {
                child_required.insert(g);
            }
            let new_input = prune_required(&n.input, &child_required, ids, types)?;
            if Rc::ptr_eq(&new_input, &n.input) && new_aggregations.len() == n.aggregations.len() {
                return Ok(node.clone());
            }
            let mut new_outputs = n.grouping_keys.clone();
            new_outputs.extend(new_aggregations.iter().map(|(s, _)| *s));
            Ok(Rc::new(PlanNode::Aggregation(Rc::new(Aggregation::new(
                base(ids, new_outputs, types),
                new_input,
                n.grouping_keys.clone(),
                new_aggregations,
                n.grouping_sets.clone(),
                n.group_id_symbol,
                n.step,
            )))))
        }

        PlanNode::GroupId(n) => {
            let new_argument_symbols: Vec<_> = n
                .argument_symbols
                .iter()
                .filter(|(_, out)| required.contains(out))
                .cloned()
                .collect();
            let substituted: FxHashSet<Symbol> = n.argument_symbols.iter().map(|(i, _)| *i).collect();
            let mut child_required = restrict(n.input.outputs(), required);
            for set in &n.grouping_sets {
                child_required.extend(set.iter().copied());
            }
            child_required.extend(new_argument_symbols.iter().map(|(i, _)| *i));
            let new_input = prune_required(&n.input, &child_required, ids, types)?;
            let keep_group_id = required.contains(&n.group_id_symbol);
            if Rc::ptr_eq(&new_input, &n.input)
                && new_argument_symbols.len() == n.argument_symbols.len()
                && keep_group_id
            {
                return Ok(node.clone());
            }
            let mut new_outputs: Vec<Symbol> = new_input
                .outputs()
                .iter()
                .copied()
                .filter(|s| !substituted.contains(s))
                .collect();
            new_outputs.extend(new_argument_symbols.iter().map(|(_, out)| *out));
            if keep_group_id {
                new_outputs.push(n.group_id_symbol);
            }
            Ok(Rc::new(PlanNode::GroupId(Rc::new(GroupId::new(
                base(ids, new_outputs, types),
                new_input,
                n.grouping_sets.clone(),
                new_argument_symbols,
                n.group_id_symbol,
            )))))
        }

        PlanNode::Join(n) => {
            let left_set: FxHashSet<Symbol> = n.left.outputs().iter().copied().collect();
            let right_set: FxHashSet<Symbol> = n.right.outputs().iter().copied().collect();
            let mut left_required = restrict(n.left.outputs(), required);
            let mut right_required = restrict(n.right.outputs(), required);
            for (l, r) in &n.equi_clauses {
                if left_set.contains(l) {
                    left_required.insert(*l);
                } else if right_set.contains(l) {
                    right_required.insert(*l);
                }
                if right_set.contains(r) {
                    right_required.insert(*r);
                } else if left_set.contains(r) {
                    left_required.insert(*r);
                }
            }
            for s in n.filter.free_symbols() {
                if left_set.contains(&s) {
                    left_required.insert(s);
                }
                if right_set.contains(&s) {
                    right_required.insert(s);
                }
            }
            for (_, probe) in &n.dynamic_filters {
                if right_set.contains(probe) {
                    right_required.insert(*probe);
                } else if left_set.contains(probe) {
                    left_required.insert(*probe);
                }
            }
            let new_left = prune_required(&n.left, &left_required, ids, types)?;
            let new_right = prune_required(&n.right, &right_required, ids, types)?;
            if Rc::ptr_eq(&new_left, &n.left) && Rc::ptr_eq(&new_right, &n.right) {
                return Ok(node.clone());
            }
            let mut new_outputs = new_left.outputs().to_vec();
            new_outputs.extend(new_right.outputs().iter().copied());
            Ok(Rc::new(PlanNode::Join(Rc::new(Join {
                base: base(ids, new_outputs, types),
                left: new_left,
                right: new_right,
                ..(**n).clone()
            }))))
        }

        PlanNode::SemiJoin(n) => {
            if !required.contains(&n.output_marker) {
                return prune_required(&n.source, required, ids, types);
            }
            let mut source_required = restrict(n.source.outputs(), required);
            let mut filtering_required = FxHashSet::default();
            for (l, r) in &n.join_symbols {
                source_required.insert(*l);
                filtering_required.insert(*r);
            }
            filtering_required.extend(n.filter.free_symbols());
            let new_source = prune_required(&n.source, &source_required, ids, types)?;
            let new_filtering = prune_required(&n.filtering_source, &filtering_required, ids, types)?;
            if Rc::ptr_eq(&new_source, &n.source) && Rc::ptr_eq(&new_filtering, &n.filtering_source) {
                return Ok(node.clone());
            }
            let mut new_outputs = new_source.outputs().to_vec();
            new_outputs.push(n.output_marker);
            Ok(Rc::new(PlanNode::SemiJoin(Rc::new(SemiJoin {
                base: base(ids, new_outputs, types),
                source: new_source,
                filtering_source: new_filtering,
                ..(**n).clone()
            }))))
        }

        PlanNode::Window(n) => {
            let new_functions: Vec<_> =
                n.functions.iter().filter(|(s, _)| required.contains(s)).cloned().collect();
            let mut child_required = restrict(n.input.outputs(), required);
            child_required.extend(n.partition_by.iter().copied());
            child_required.extend(n.order_by.iter().map(|(s, _)| *s));
            for (_, f) in &new_functions {
                child_required.extend(f.arguments.iter().copied());
            }
            let new_input = prune_required(&n.input, &child_required, ids, types)?;
            if Rc::ptr_eq(&new_input, &n.input) && new_functions.len() == n.functions.len() {
                return Ok(node.clone());
            }
            let mut new_outputs = new_input.outputs().to_vec();
            new_outputs.extend(new_functions.iter().map(|(s, _)| *s));
            Ok(Rc::new(PlanNode::Window(Rc::new(Window::new(
                base(ids, new_outputs, types),
                new_input,
                n.partition_by.clone(),
                n.order_by.clone(),
                new_functions,
                n.frame.clone(),
            )))))
        }

        PlanNode::RowNumber(n) => {
            let mut child_required = restrict(n.input.outputs(), required);
            child_required.extend(n.partition_by.iter().copied());
            child_required.extend(n.order_by.iter().map(|(s, _)| *s));
            let new_input = prune_required(&n.input, &child_required, ids, types)?;
            let keep_rn = required.contains(&n.row_number_symbol);
            if Rc::ptr_eq(&new_input, &n.input) && keep_rn {
                return Ok(node.clone());
            }
            let mut new_outputs = new_input.outputs().to_vec();
            if keep_rn {
                new_outputs.push(n.row_number_symbol);
            }
            Ok(Rc::new(PlanNode::RowNumber(Rc::new(RowNumber {
                base: base(ids, new_outputs, types),
                input: new_input,
                ..(**n).clone()
            }))))
        }

        PlanNode::TopNRowNumber(n) => {
            let mut child_required = restrict(n.input.outputs(), required);
            child_required.extend(n.partition_by.iter().copied());
            child_required.extend(n.order_by.iter().map(|(s, _)| *s));
            let new_input = prune_required(&n.input, &child_required, ids, types)?;
            let keep_rn = required.contains(&n.row_number_symbol);
            if Rc::ptr_eq(&new_input, &n.input) && keep_rn == n.produce_row_number {
                return Ok(node.clone());
            }
            let mut new_outputs = new_input.outputs().to_vec();
            if keep_rn {
                new_outputs.push(n.row_number_symbol);
            }
            Ok(Rc::new(PlanNode::TopNRowNumber(Rc::new(TopNRowNumber {
                base: base(ids, new_outputs, types),
                input: new_input,
                produce_row_number: keep_rn,
                ..(**n).clone()
            }))))
        }

        PlanNode::Sort(n) => {
            let mut child_required = required.clone();
            child_required.extend(n.order_by.iter().map(|(s, _)| *s));
            let new_input = prune_required(&n.input, &child_required, ids, types)?;
            if Rc::ptr_eq(&new_input, &n.input) {
                return Ok(node.clone());
            }
            let new_outputs = new_input.outputs().to_vec();
            Ok(Rc::new(PlanNode::Sort(Rc::new(Sort {
                base: base(ids, new_outputs, types),
                input: new_input,
                ..(**n).clone()
            }))))
        }

        PlanNode::TopN(n) => {
            let mut child_required = required.clone();
            child_required.extend(n.order_by.iter().map(|(s, _)| *s));
            let new_input = prune_required(&n.input, &child_required, ids, types)?;
            if Rc::ptr_eq(&new_input, &n.input) {
                return Ok(node.clone());
            }
            let new_outputs = new_input.outputs().to_vec();
            Ok(Rc::new(PlanNode::TopN(Rc::new(TopN {
                base: base(ids, new_outputs, types),
                input: new_input,
                ..(**n).clone()
            }))))
        }

        PlanNode::Limit(n) => {
            let new_input = prune_required(&n.input, required, ids, types)?;
            if Rc::ptr_eq(&new_input, &n.input) {
                return Ok(node.clone());
            }
            let new_outputs = new_input.outputs().to_vec();
            Ok(Rc::new(PlanNode::Limit(Rc::new(Limit {
                base: base(ids, new_outputs, types),
                input: new_input,
                ..(**n).clone()
            }))))
        }

        PlanNode::Offset(n) => {
            let new_input = prune_required(&n.input, required, ids, types)?;
            if Rc::ptr_eq(&new_input, &n.input) {
                return Ok(node.clone());
            }
            let new_outputs = new_input.outputs().to_vec();
            Ok(Rc::new(PlanNode::Offset(Rc::new(Offset {
                base: base(ids, new_outputs, types),
                input: new_input,
                ..(**n).clone()
            }))))
        }

        PlanNode::DistinctLimit(n) => {
            let mut child_required = required.clone();
            child_required.extend(n.distinct_symbols.iter().copied());
            let new_input = prune_required(&n.input, &child_required, ids, types)?;
            if Rc::ptr_eq(&new_input, &n.input) {
                return Ok(node.clone());
            }
            let new_outputs = new_input.outputs().to_vec();
            Ok(Rc::new(PlanNode::DistinctLimit(Rc::new(DistinctLimit {
                base: base(ids, new_outputs, types),
                input: new_input,
                ..(**n).clone()
            }))))
        }

        PlanNode::SetOperation(n) => {
            let new_mapping: Vec<_> =
                n.symbol_mapping.iter().filter(|(out, _)| required.contains(out)).cloned().collect();
            let mut new_sources = Vec::with_capacity(n.sources.len());
            let mut any_changed = new_mapping.len() != n.symbol_mapping.len();
            for (i, source) in n.sources.iter().enumerate() {
                let source_required: FxHashSet<Symbol> =
                    new_mapping.iter().map(|(_, ins)| ins[i]).collect();
                let pruned = prune_required(source, &source_required, ids, types)?;
                any_changed |= !Rc::ptr_eq(&pruned, source);
                new_sources.push(pruned);
            }
            if !any_changed {
                return Ok(node.clone());
            }
            let new_outputs = new_mapping.iter().map(|(out, _)| *out).collect();
            Ok(Rc::new(PlanNode::SetOperation(Rc::new(SetOperation::new(
                base(ids, new_outputs, types),
                new_sources,
                n.kind,
                new_mapping,
            )))))
        }

        PlanNode::Unnest(n) => {
            let new_replicate: Vec<Symbol> =
                n.replicate_symbols.iter().copied().filter(|s| required.contains(s)).collect();
            let new_unnest_symbols: Vec<_> = n
                .unnest_symbols
                .iter()
                .filter(|(_, outs)| outs.iter().any(|o| required.contains(o)))
                .cloned()
                .collect();
            let new_ordinality = n.ordinality_symbol.filter(|s| required.contains(s));

            let input_set: FxHashSet<Symbol> = n.input.outputs().iter().copied().collect();
            let mut child_required = restrict(n.input.outputs(), required);
            child_required.extend(new_replicate.iter().copied());
            child_required.extend(new_unnest_symbols.iter().map(|(i, _)| *i));
            child_required.extend(n.filter.free_symbols().into_iter().filter(|s| input_set.contains(s)));
            let new_input = prune_required(&n.input, &child_required, ids, types)?;

            if Rc::ptr_eq(&new_input, &n.input)
                && new_replicate.len() == n.replicate_symbols.len()
                && new_unnest_symbols.len() == n.unnest_symbols.len()
                && new_ordinality == n.ordinality_symbol
            {
                return Ok(node.clone());
            }
            let mut new_outputs = new_replicate.clone();
            for (_, outs) in &new_unnest_symbols {
                new_outputs.extend(outs.iter().copied());
            }
            new_outputs.extend(new_ordinality);
            Ok(Rc::new(PlanNode::Unnest(Rc::new(Unnest::new(
                base(ids, new_outputs, types),
                new_input,
                new_replicate,
                new_unnest_symbols,
                new_ordinality,
                n.join_type,
                n.filter.clone(),
            )))))
        }

        PlanNode::CorrelatedJoin(n) => {
            let subquery_set: FxHashSet<Symbol> = n.subquery.outputs().iter().copied().collect();
            if !subquery_set.iter().any(|s| required.contains(s)) && n.subquery_is_at_most_scalar() {
                return prune_required(&n.input, required, ids, types);
            }
            let input_set: FxHashSet<Symbol> = n.input.outputs().iter().copied().collect();
            let mut input_required = restrict(n.input.outputs(), required);
            input_required.extend(n.correlation_symbols.iter().copied());
            input_required.extend(n.filter.free_symbols().into_iter().filter(|s| input_set.contains(s)));
            let new_input = prune_required(&n.input, &input_required, ids, types)?;

            let subquery_required: FxHashSet<Symbol> = n.subquery.outputs().iter().copied().collect();
            let new_subquery = prune_required(&n.subquery, &subquery_required, ids, types)?;

            if Rc::ptr_eq(&new_input, &n.input) && Rc::ptr_eq(&new_subquery, &n.subquery) {
                return Ok(node.clone());
            }
            let mut new_outputs = new_input.outputs().to_vec();
            new_outputs.extend(new_subquery.outputs().iter().copied());
            Ok(Rc::new(PlanNode::CorrelatedJoin(Rc::new(CorrelatedJoin {
                base: base(ids, new_outputs, types),
                input: new_input,
                subquery: new_subquery,
                ..(**n).clone()
            }))))
        }

        PlanNode::AssignUniqueId(n) => {
            if !required.contains(&n.unique_id_symbol) {
                return prune_required(&n.input, required, ids, types);
            }
            let child_required = restrict(n.input.outputs(), required);
            let new_input = prune_required(&n.input, &child_required, ids, types)?;
            if Rc::ptr_eq(&new_input, &n.input) {
                return Ok(node.clone());
            }
            let mut new_outputs = new_input.outputs().to_vec();
            new_outputs.push(n.unique_id_symbol);
            Ok(Rc::new(PlanNode::AssignUniqueId(Rc::new(AssignUniqueId {
                base: base(ids, new_outputs, types),
                input: new_input,
                ..(**n).clone()
            }))))
        }

        PlanNode::Exchange(n) => {
            let mut child_required = required.clone();
            if let Some(scheme) = &n.partitioning {
                child_required.extend(scheme.columns.iter().copied());
            }
            child_required.extend(n.ordering.iter().map(|(s, _)| *s));
            let new_input = prune_required(&n.input, &child_required, ids, types)?;
            if Rc::ptr_eq(&new_input, &n.input) {
                return Ok(node.clone());
            }
            let new_outputs = new_input.outputs().to_vec();
            Ok(Rc::new(PlanNode::Exchange(Rc::new(Exchange {
                base: base(ids, new_outputs, types),
                input: new_input,
                ..(**n).clone()
            }))))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::TestCtx;

    #[test]
    fn project_prunes_unreferenced_source_columns() {
        let ctx = TestCtx::new();
        let (u, v, w) = (ctx.int_sym("u"), ctx.int_sym("v"), ctx.int_sym("w"));
        let scan = ctx.scan("t", &[u, v, w]);
        let (x, y, z) = (ctx.int_sym("x"), ctx.int_sym("y"), ctx.int_sym("z"));
        let inner = ctx.project(
            scan,
            vec![(x, ctx.sym_ref(u)), (y, ctx.sym_ref(v)), (z, ctx.sym_ref(w))],
        );
        let (a, b) = (ctx.int_sym("a"), ctx.int_sym("b"));
        let plus = crate::expr::FunctionCall::new(
            crate::expr::FunctionType::Add,
            vec![ctx.sym_ref(x), ctx.sym_ref(y)],
        )
        .into();
        let outer = ctx.project(inner, vec![(a, plus), (b, ctx.sym_ref(z))]);

        let ids = NodeIdAllocator::new();
        let required: FxHashSet<Symbol> = std::iter::once(a).collect();
        let pruned = prune_required(&outer, &required, &ids, &ctx.symbols).unwrap();

        let PlanNode::Project(p) = &*pruned else {
            panic!("expected project")
        };
        assert_eq!(p.assignments.len(), 1);
        assert_eq!(p.assignments[0].0, a);

        let PlanNode::Project(inner_p) = &*p.input else {
            panic!("expected inner project")
        };
        assert_eq!(inner_p.assignments.len(), 2, "z/b must be pruned away");
        assert!(inner_p.assignments.iter().any(|(s, _)| *s == x));
        assert!(inner_p.assignments.iter().any(|(s, _)| *s == y));

        let PlanNode::TableScan(scan) = &*inner_p.input else {
            panic!("expected scan")
        };
        assert_eq!(scan.assignments.len(), 2, "w must be pruned away");
    }

    #[test]
    fn prune_is_idempotent() {
        let ctx = TestCtx::new();
        let a = ctx.int_sym("a");
        let scan = ctx.scan("t", &[a]);
        let ids = NodeIdAllocator::new();
        let once = prune(&scan, &ids, &ctx.symbols).unwrap();
        let twice = prune(&once, &ids, &ctx.symbols).unwrap();
        assert!(Rc::ptr_eq(&once, &twice));
    }

    #[test]
    fn unused_semi_join_marker_collapses_to_source() {
        let ctx = TestCtx::new();
        let l = ctx.int_sym("l");
        let r = ctx.int_sym("r");
        let source = ctx.scan("left_t", &[l]);
        let filtering = ctx.scan("right_t", &[r]);
        let marker = ctx.sym("marker", relplan_common::types::DataType::Boolean);
        let semi = ctx.semi_join(source, filtering, vec![(l, r)], marker, false);

        let ids = NodeIdAllocator::new();
        let required: FxHashSet<Symbol> = std::iter::once(l).collect();
        let pruned = prune_required(&semi, &required, &ids, &ctx.symbols).unwrap();
        assert!(matches!(&*pruned, PlanNode::TableScan(_)));
    }

    #[test]
    fn unused_assign_unique_id_collapses_to_input() {
        let ctx = TestCtx::new();
        let a = ctx.int_sym("a");
        let scan = ctx.scan("t", &[a]);
        let id_sym = ctx.sym("id", relplan_common::types::DataType::Int64);
        let base_ = PlanBase::new(NodeIdAllocator::new().fresh(), vec![a, id_sym], &ctx.symbols);
        let assign =
            Rc::new(PlanNode::AssignUniqueId(Rc::new(AssignUniqueId::new(base_, scan, id_sym))));

        let ids = NodeIdAllocator::new();
        let required: FxHashSet<Symbol> = std::iter::once(a).collect();
        let pruned = prune_required(&assign, &required, &ids, &ctx.symbols).unwrap();
        assert!(matches!(&*pruned, PlanNode::TableScan(_)));
    }
}
