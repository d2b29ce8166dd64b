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

//! Read-only `EXPLAIN`-style pretty-printing (§10.5), grounded in the teacher's `Distill` +
//! `pretty_xmlish` convention: every node kind renders as a labelled tree of (field, value) pairs
//! with children recursed into, used both by `Display`/logging and by tests asserting plan shape.

use pretty_xmlish::{Pretty, XmlNode};

use crate::plan_node::PlanNode;
use crate::symbol::Symbol;

/// Matches the teacher's `childless_record` helper: a record field list with no children, for
/// leaf-like rendering that still wants its own node name.
fn childless_record<'a>(name: &'a str, fields: Vec<(&'a str, Pretty<'a>)>) -> XmlNode<'a> {
    XmlNode::simple_record(name, fields, vec![])
}

fn symbols_text(symbols: &[Symbol]) -> String {
    symbols.iter().map(|s| format!("{s:?}")).collect::<Vec<_>>().join(", ")
}

/// Every node kind implements this to render itself (not its children) as one `XmlNode`, in the
/// teacher's `pretty_xmlish` idiom — the canonical shape other tooling (e.g. a future `EXPLAIN`
/// front-end) would consume. [`distill`] below additionally recurses for this crate's own
/// plain-text logging/test needs, without depending on `XmlNode`'s internal layout.
pub trait Distill {
    fn distill(&self) -> XmlNode<'_>;
}

impl Distill for PlanNode {
    fn distill(&self) -> XmlNode<'_> {
        match self {
            PlanNode::TableScan(n) => childless_record(
                "TableScan",
                vec![("table", Pretty::from(n.table_name.clone()))],
            ),
            PlanNode::Values(n) => childless_record("Values", vec![("rows", Pretty::display(&n.rows.len()))]),
            PlanNode::Project(n) => {
                let assigns = n
                    .assignments
                    .iter()
                    .map(|(s, e)| format!("{s:?} := {e:?}"))
                    .collect::<Vec<_>>()
                    .join(", ");
                childless_record("Project", vec![("exprs", Pretty::from(assigns))])
            }
            PlanNode::Filter(n) => {
                childless_record("Filter", vec![("predicate", Pretty::from(format!("{:?}", n.predicate)))])
            }
            PlanNode::Aggregation(n) => childless_record(
                "Aggregation",
                vec![
                    ("group_by", Pretty::from(symbols_text(&n.grouping_keys))),
                    ("step", Pretty::debug(&n.step)),
                ],
            ),
            PlanNode::GroupId(n) => childless_record(
                "GroupId",
                vec![("sets", Pretty::display(&n.grouping_sets.len()))],
            ),
            PlanNode::Join(n) => childless_record(
                "Join",
                vec![
                    ("type", Pretty::debug(&n.join_type)),
                    (
                        "on",
                        Pretty::from(
                            n.equi_clauses
                                .iter()
                                .map(|(l, r)| format!("{l:?} = {r:?}"))
                                .collect::<Vec<_>>()
                                .join(" AND "),
                        ),
                    ),
                    ("filter", Pretty::from(format!("{:?}", n.filter))),
                ],
            ),
            PlanNode::SemiJoin(n) => childless_record(
                "SemiJoin",
                vec![("marker", Pretty::debug(&n.output_marker)), ("anti", Pretty::display(&n.is_anti))],
            ),
            PlanNode::Window(n) => childless_record(
                "Window",
                vec![("partition_by", Pretty::from(symbols_text(&n.partition_by)))],
            ),
            PlanNode::RowNumber(n) => {
                childless_record("RowNumber", vec![("symbol", Pretty::debug(&n.row_number_symbol))])
            }
            PlanNode::TopNRowNumber(n) => {
                childless_record("TopNRowNumber", vec![("limit", Pretty::display(&n.limit))])
            }
            PlanNode::Sort(n) => childless_record(
                "Sort",
                vec![("order_by", Pretty::from(symbols_text(&n.order_by.iter().map(|(s, _)| *s).collect::<Vec<_>>())))],
            ),
            PlanNode::TopN(n) => childless_record("TopN", vec![("count", Pretty::display(&n.count))]),
            PlanNode::Limit(n) => childless_record("Limit", vec![("count", Pretty::display(&n.count))]),
            PlanNode::Offset(n) => childless_record("Offset", vec![("count", Pretty::display(&n.count))]),
            PlanNode::DistinctLimit(n) => {
                childless_record("DistinctLimit", vec![("count", Pretty::display(&n.count))])
            }
            PlanNode::SetOperation(n) => childless_record("SetOperation", vec![("kind", Pretty::debug(&n.kind))]),
            PlanNode::Unnest(n) => childless_record("Unnest", vec![("join_type", Pretty::debug(&n.join_type))]),
            PlanNode::CorrelatedJoin(n) => {
                childless_record("CorrelatedJoin", vec![("join_type", Pretty::debug(&n.join_type))])
            }
            PlanNode::AssignUniqueId(n) => {
                childless_record("AssignUniqueId", vec![("symbol", Pretty::debug(&n.unique_id_symbol))])
            }
            PlanNode::Exchange(n) => childless_record(
                "Exchange",
                vec![("kind", Pretty::debug(&n.kind)), ("scope", Pretty::debug(&n.scope))],
            ),
        }
    }
}

/// A short, node-kind-specific label plus its own fields as plain text — the same information
/// `Distill::distill` carries, rendered without touching `XmlNode`'s internals, since this crate's
/// own `Display`/`tracing` output only needs text, not the `pretty_xmlish` tree shape itself.
fn own_summary(node: &PlanNode) -> (&'static str, String) {
    match node {
        PlanNode::TableScan(n) => ("TableScan", format!("table={}", n.table_name)),
        PlanNode::Values(n) => ("Values", format!("rows={}", n.rows.len())),
        PlanNode::Project(n) => (
            "Project",
            n.assignments
                .iter()
                .map(|(s, e)| format!("{s:?} := {e:?}"))
                .collect::<Vec<_>>()
                .join(", "),
        ),
        PlanNode::Filter(n) => ("Filter", format!("predicate={:?}", n.predicate)),
        PlanNode::Aggregation(n) => (
            "Aggregation",
            format!("group_by=[{}] step={:?}", symbols_text(&n.grouping_keys), n.step),
        ),
        PlanNode::GroupId(n) => ("GroupId", format!("sets={}", n.grouping_sets.len())),
        PlanNode::Join(n) => (
            "Join",
            format!(
                "type={:?} on=[{}] filter={:?}",
                n.join_type,
                n.equi_clauses
                    .iter()
                    .map(|(l, r)| format!("{l:?}={r:?}"))
                    .collect::<Vec<_>>()
                    .join(" AND "),
                n.filter
            ),
        ),
        PlanNode::SemiJoin(n) => ("SemiJoin", format!("marker={:?} anti={}", n.output_marker, n.is_anti)),
        PlanNode::Window(n) => ("Window", format!("partition_by=[{}]", symbols_text(&n.partition_by))),
        PlanNode::RowNumber(n) => ("RowNumber", format!("symbol={:?}", n.row_number_symbol)),
        PlanNode::TopNRowNumber(n) => ("TopNRowNumber", format!("limit={}", n.limit)),
        PlanNode::Sort(n) => (
            "Sort",
            format!("order_by=[{}]", symbols_text(&n.order_by.iter().map(|(s, _)| *s).collect::<Vec<_>>())),
        ),
        PlanNode::TopN(n) => ("TopN", format!("count={}", n.count)),
        PlanNode::Limit(n) => ("Limit", format!("count={}", n.count)),
        PlanNode::Offset(n) => ("Offset", format!("count={}", n.count)),
        PlanNode::DistinctLimit(n) => ("DistinctLimit", format!("count={}", n.count)),
        PlanNode::SetOperation(n) => ("SetOperation", format!("kind={:?}", n.kind)),
        PlanNode::Unnest(n) => ("Unnest", format!("join_type={:?}", n.join_type)),
        PlanNode::CorrelatedJoin(n) => ("CorrelatedJoin", format!("join_type={:?}", n.join_type)),
        PlanNode::AssignUniqueId(n) => ("AssignUniqueId", format!("symbol={:?}", n.unique_id_symbol)),
        PlanNode::Exchange(n) => ("Exchange", format!("kind={:?} scope={:?}", n.kind, n.scope)),
    }
}

/// Indented multi-line `EXPLAIN`-style text for `node` and its whole subtree — what `Display for
/// PlanNode` and `tracing` trace events print (§10.1, §10.5).
pub fn distill(node: &PlanNode) -> String {
    let mut out = String::new();
    write_indented(&mut out, node, 0);
    out
}

fn write_indented(out: &mut String, node: &PlanNode, depth: usize) {
    use std::fmt::Write as _;
    let (label, fields) = own_summary(node);
    let indent = "  ".repeat(depth);
    let _ = writeln!(
        out,
        "{indent}{label} [{}] {{ {fields} }} -> [{}]",
        node.id(),
        symbols_text(node.outputs())
    );
    for child in node.children() {
        write_indented(out, &child, depth + 1);
    }
}

#[cfg(test)]
mod tests {
    use relplan_common::types::DataType;

    use super::*;
    use crate::plan_node::{NodeIdAllocator, PlanBase, PlanNode, TableScan};
    use crate::symbol::SymbolAllocator;
    use crate::tuple_domain::TupleDomain;

    #[test]
    fn distill_renders_node_label_and_outputs() {
        let symbols = SymbolAllocator::new();
        let ids = NodeIdAllocator::new();
        let a = symbols.fresh("a", DataType::Int32);
        let base = PlanBase::new(ids.fresh(), vec![a], &symbols);
        let scan = PlanNode::TableScan(std::rc::Rc::new(TableScan::new(
            base,
            "t",
            vec![],
            TupleDomain::all(),
        )));
        let text = distill(&scan);
        assert!(text.contains("TableScan"));
        assert!(text.contains("table=t"));
    }
}
