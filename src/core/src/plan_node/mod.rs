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

//! The logical plan IR (§3.2): an immutable tree of tagged [`PlanNode`] variants.
//!
//! The source this core is modeled on represents plan nodes as a class hierarchy, one concrete
//! type per node kind, dispatched through macro-generated trait delegation (`for_all_plan_nodes!`
//! and friends) because the set of node kinds is meant to stay open across many crates. Our node
//! set is closed and lives in one crate, so each node kind still gets its own file and struct (the
//! shape callers interact with), but the cross-cutting passes (predicate pushdown, effective
//! predicate, pruning, unaliasing, exchange insertion) are written as single `match`-based
//! traversals in `pass/`, rather than reconstructing the macro machinery to fan a trait out across
//! sixteen `impl` blocks. That machinery pays for itself when node kinds are added by crates that
//! can't see each other; we don't have that constraint.

mod assign_unique_id;
mod correlated_join;
mod exchange;
mod filter;
mod group_id;
mod join;
mod project;
mod row_number;
mod semi_join;
mod set_operation;
mod table_scan;
mod topn;
mod unnest;
mod values;
mod window;

pub use assign_unique_id::AssignUniqueId;
pub use correlated_join::CorrelatedJoin;
pub use exchange::{
    Exchange, ExchangeKind, ExchangeScope, JoinDistributionType, PartitioningFunction,
    PartitioningScheme,
};
pub use filter::Filter;
pub use group_id::GroupId;
pub use join::{DynamicFilterId, Join, JoinType};
pub use project::Project;
pub use row_number::{RowNumber, TopNRowNumber};
pub use semi_join::SemiJoin;
pub use set_operation::{SetOperation, SetOperationKind};
pub use table_scan::{ColumnHandle, TableScan};
pub use topn::{DistinctLimit, Limit, Offset, Sort, TopN};
pub use unnest::Unnest;
pub use values::Values;
pub use window::{FrameBoundType, FrameMode, Window, WindowFrame, WindowFunctionCall};

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

use relplan_common::catalog::{Field, Schema};
use rustc_hash::FxHashSet;

use crate::expr::ExprImpl;
use crate::symbol::{Symbol, SymbolAllocator, TypeProvider};

pub use relplan_error::PlanNodeId;

/// Mints [`PlanNodeId`]s. Mirrors [`SymbolAllocator`]: one per compilation, monotonic, never
/// reused (§9). A rewrite that leaves a subtree untouched keeps its id (§6.2); only genuinely new
/// nodes draw from this.
#[derive(Clone, Default)]
pub struct NodeIdAllocator {
    next: Rc<Cell<u64>>,
}

impl NodeIdAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fresh(&self) -> PlanNodeId {
        let id = self.next.get();
        self.next.set(id + 1);
        PlanNodeId(id)
    }
}

/// Fields every node kind carries (§3.2): a stable id and its ordered output symbols. `schema` is
/// redundant with `outputs` plus a [`TypeProvider`] lookup, but every node kind needs to print
/// itself for `EXPLAIN`, and threading an allocator through every `Debug` impl is worse than
/// caching the field names/types at construction time.
#[derive(Clone, Debug, PartialEq)]
pub struct PlanBase {
    pub id: PlanNodeId,
    outputs: Vec<Symbol>,
    schema: Schema,
}

impl PlanBase {
    pub fn new(id: PlanNodeId, outputs: Vec<Symbol>, types: &dyn TypeProvider) -> Self {
        let fields = outputs
            .iter()
            .map(|s| Field {
                name: s.to_string(),
                data_type: types.type_of(*s),
            })
            .collect();
        Self {
            id,
            outputs,
            schema: Schema::new(fields),
        }
    }

    pub fn id(&self) -> PlanNodeId {
        self.id
    }

    pub fn outputs(&self) -> &[Symbol] {
        &self.outputs
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }
}

/// A node in the logical plan tree (§3.2, §9 "tagged variants"). Structural sharing: two plans may
/// reference the same [`PlanRef`] subtree, but a single plan's own shape is a tree, not a DAG
/// (§3.2) — nothing here supports cycles.
#[derive(Clone, Debug, PartialEq)]
pub enum PlanNode {
    TableScan(Rc<TableScan>),
    Values(Rc<Values>),
    Project(Rc<Project>),
    Filter(Rc<Filter>),
    Aggregation(Rc<crate::plan_node::aggregation::Aggregation>),
    GroupId(Rc<GroupId>),
    Join(Rc<Join>),
    SemiJoin(Rc<SemiJoin>),
    Window(Rc<Window>),
    RowNumber(Rc<RowNumber>),
    TopNRowNumber(Rc<TopNRowNumber>),
    Sort(Rc<Sort>),
    TopN(Rc<TopN>),
    Limit(Rc<Limit>),
    Offset(Rc<Offset>),
    DistinctLimit(Rc<DistinctLimit>),
    SetOperation(Rc<SetOperation>),
    Unnest(Rc<Unnest>),
    CorrelatedJoin(Rc<CorrelatedJoin>),
    AssignUniqueId(Rc<AssignUniqueId>),
    Exchange(Rc<Exchange>),
}

/// The only way callers hold a plan: reference-counted so optimizers can share unchanged subtrees
/// (§3.5) without cloning them.
pub type PlanRef = Rc<PlanNode>;

pub mod aggregation;
pub use aggregation::{AggregateFunctionCall, Aggregation, AggregationStep};

impl PlanNode {
    pub fn base(&self) -> &PlanBase {
        match self {
            PlanNode::TableScan(n) => &n.base,
            PlanNode::Values(n) => &n.base,
            PlanNode::Project(n) => &n.base,
            PlanNode::Filter(n) => &n.base,
            PlanNode::Aggregation(n) => &n.base,
            PlanNode::GroupId(n) => &n.base,
            PlanNode::Join(n) => &n.base,
            PlanNode::SemiJoin(n) => &n.base,
            PlanNode::Window(n) => &n.base,
            PlanNode::RowNumber(n) => &n.base,
            PlanNode::TopNRowNumber(n) => &n.base,
            PlanNode::Sort(n) => &n.base,
            PlanNode::TopN(n) => &n.base,
            PlanNode::Limit(n) => &n.base,
            PlanNode::Offset(n) => &n.base,
            PlanNode::DistinctLimit(n) => &n.base,
            PlanNode::SetOperation(n) => &n.base,
            PlanNode::Unnest(n) => &n.base,
            PlanNode::CorrelatedJoin(n) => &n.base,
            PlanNode::AssignUniqueId(n) => &n.base,
            PlanNode::Exchange(n) => &n.base,
        }
    }

    pub fn id(&self) -> PlanNodeId {
        self.base().id()
    }

    /// The variant name, for log/trace events that want to name a node kind without formatting
    /// its whole subtree.
    pub fn kind_name(&self) -> &'static str {
        match self {
            PlanNode::TableScan(_) => "TableScan",
            PlanNode::Values(_) => "Values",
            PlanNode::Project(_) => "Project",
            PlanNode::Filter(_) => "Filter",
            PlanNode::Aggregation(_) => "Aggregation",
            PlanNode::GroupId(_) => "GroupId",
            PlanNode::Join(_) => "Join",
            PlanNode::SemiJoin(_) => "SemiJoin",
            PlanNode::Window(_) => "Window",
            PlanNode::RowNumber(_) => "RowNumber",
            PlanNode::TopNRowNumber(_) => "TopNRowNumber",
            PlanNode::Sort(_) => "Sort",
            PlanNode::TopN(_) => "TopN",
            PlanNode::Limit(_) => "Limit",
            PlanNode::Offset(_) => "Offset",
            PlanNode::DistinctLimit(_) => "DistinctLimit",
            PlanNode::SetOperation(_) => "SetOperation",
            PlanNode::Unnest(_) => "Unnest",
            PlanNode::CorrelatedJoin(_) => "CorrelatedJoin",
            PlanNode::AssignUniqueId(_) => "AssignUniqueId",
            PlanNode::Exchange(_) => "Exchange",
        }
    }

    pub fn outputs(&self) -> &[Symbol] {
        self.base().outputs()
    }

    pub fn schema(&self) -> &Schema {
        self.base().schema()
    }

    /// This node's immediate children, in the order a visitor should recurse. Leaves (`TableScan`,
    /// `Values`) return an empty slice.
    pub fn children(&self) -> Vec<PlanRef> {
        match self {
            PlanNode::TableScan(_) | PlanNode::Values(_) => vec![],
            PlanNode::Project(n) => vec![n.input.clone()],
            PlanNode::Filter(n) => vec![n.input.clone()],
            PlanNode::Aggregation(n) => vec![n.input.clone()],
            PlanNode::GroupId(n) => vec![n.input.clone()],
            PlanNode::Join(n) => vec![n.left.clone(), n.right.clone()],
            PlanNode::SemiJoin(n) => vec![n.source.clone(), n.filtering_source.clone()],
            PlanNode::Window(n) => vec![n.input.clone()],
            PlanNode::RowNumber(n) => vec![n.input.clone()],
            PlanNode::TopNRowNumber(n) => vec![n.input.clone()],
            PlanNode::Sort(n) => vec![n.input.clone()],
            PlanNode::TopN(n) => vec![n.input.clone()],
            PlanNode::Limit(n) => vec![n.input.clone()],
            PlanNode::Offset(n) => vec![n.input.clone()],
            PlanNode::DistinctLimit(n) => vec![n.input.clone()],
            PlanNode::SetOperation(n) => n.sources.clone(),
            PlanNode::Unnest(n) => vec![n.input.clone()],
            PlanNode::CorrelatedJoin(n) => vec![n.input.clone(), n.subquery.clone()],
            PlanNode::AssignUniqueId(n) => vec![n.input.clone()],
            PlanNode::Exchange(n) => vec![n.input.clone()],
        }
    }

    /// Rebuilds this node with `children` standing in for the current ones, preserving every
    /// other field (and therefore the node id, per §6.2 "ids of unchanged subtrees preserved" —
    /// callers that actually changed something allocate a fresh id themselves before calling
    /// this). Panics if the arity doesn't match; every pass in this crate recurses structurally
    /// and never changes a node's arity without rebuilding it directly.
    pub fn with_children(&self, mut children: Vec<PlanRef>) -> PlanNode {
        macro_rules! one {
            () => {{
                assert_eq!(children.len(), 1, "expected exactly one child");
                children.pop().unwrap()
            }};
        }
        match self {
            PlanNode::TableScan(n) => PlanNode::TableScan(n.clone()),
            PlanNode::Values(n) => PlanNode::Values(n.clone()),
            PlanNode::Project(n) => PlanNode::Project(Rc::new(Project {
                input: one!(),
                ..(**n).clone()
            })),
            PlanNode::Filter(n) => PlanNode::Filter(Rc::new(Filter {
                input: one!(),
                ..(**n).clone()
            })),
            PlanNode::Aggregation(n) => PlanNode::Aggregation(Rc::new(
                crate::plan_node::aggregation::Aggregation {
                    input: one!(),
                    ..(**n).clone()
                },
            )),
            PlanNode::GroupId(n) => PlanNode::GroupId(Rc::new(GroupId {
                input: one!(),
                ..(**n).clone()
            })),
            PlanNode::Join(n) => {
                assert_eq!(children.len(), 2, "join takes exactly two children");
                let right = children.pop().unwrap();
                let left = children.pop().unwrap();
                PlanNode::Join(Rc::new(Join {
                    left,
                    right,
                    ..(**n).clone()
                }))
            }
            PlanNode::SemiJoin(n) => {
                assert_eq!(children.len(), 2, "semi-join takes exactly two children");
                let filtering_source = children.pop().unwrap();
                let source = children.pop().unwrap();
                PlanNode::SemiJoin(Rc::new(SemiJoin {
                    source,
                    filtering_source,
                    ..(**n).clone()
                }))
            }
            PlanNode::Window(n) => PlanNode::Window(Rc::new(Window {
                input: one!(),
                ..(**n).clone()
            })),
            PlanNode::RowNumber(n) => PlanNode::RowNumber(Rc::new(RowNumber {
                input: one!(),
                ..(**n).clone()
            })),
            PlanNode::TopNRowNumber(n) => PlanNode::TopNRowNumber(Rc::new(TopNRowNumber {
                input: one!(),
                ..(**n).clone()
            })),
            PlanNode::Sort(n) => PlanNode::Sort(Rc::new(Sort {
                input: one!(),
                ..(**n).clone()
            })),
            PlanNode::TopN(n) => PlanNode::TopN(Rc::new(TopN {
                input: one!(),
                ..(**n).clone()
            })),
            PlanNode::Limit(n) => PlanNode::Limit(Rc::new(Limit {
                input: one!(),
                ..(**n).clone()
            })),
            PlanNode::Offset(n) => PlanNode::Offset(Rc::new(Offset {
                input: one!(),
                ..(**n).clone()
            })),
            PlanNode::DistinctLimit(n) => PlanNode::DistinctLimit(Rc::new(DistinctLimit {
                input: one!(),
                ..(**n).clone()
            })),
            PlanNode::SetOperation(n) => PlanNode::SetOperation(Rc::new(SetOperation {
                sources: children,
                ..(**n).clone()
            })),
            PlanNode::Unnest(n) => PlanNode::Unnest(Rc::new(Unnest {
                input: one!(),
                ..(**n).clone()
            })),
            PlanNode::CorrelatedJoin(n) => {
                assert_eq!(children.len(), 2, "correlated join takes exactly two children");
                let subquery = children.pop().unwrap();
                let input = children.pop().unwrap();
                PlanNode::CorrelatedJoin(Rc::new(CorrelatedJoin {
                    input,
                    subquery,
                    ..(**n).clone()
                }))
            }
            PlanNode::AssignUniqueId(n) => PlanNode::AssignUniqueId(Rc::new(AssignUniqueId {
                input: one!(),
                ..(**n).clone()
            })),
            PlanNode::Exchange(n) => PlanNode::Exchange(Rc::new(Exchange {
                input: one!(),
                ..(**n).clone()
            })),
        }
    }

    /// Free symbols referenced by this node's own payload (filter/assignments/join keys/etc.),
    /// *not* including anything only reachable through a child. Used by prune (§4.6) to compute
    /// what a node needs from its children, and by unalias (§4.7) to find substitution sites.
    pub fn own_free_symbols(&self) -> FxHashSet<Symbol> {
        let mut out = FxHashSet::default();
        match self {
            PlanNode::TableScan(_) | PlanNode::Values(_) => {}
            PlanNode::Project(n) => {
                for (_, e) in &n.assignments {
                    out.extend(e.free_symbols());
                }
            }
            PlanNode::Filter(n) => out.extend(n.predicate.free_symbols()),
            PlanNode::Aggregation(n) => {
                out.extend(n.grouping_keys.iter().copied());
                for set in &n.grouping_sets {
                    out.extend(set.iter().copied());
                }
                for (_, agg) in &n.aggregations {
                    out.extend(agg.arguments.iter().copied());
                    out.extend(agg.filter.as_ref().map(|e| e.free_symbols()).unwrap_or_default());
                    out.extend(agg.order_by.iter().map(|(s, _)| *s));
                }
            }
            PlanNode::GroupId(n) => {
                for set in &n.grouping_sets {
                    out.extend(set.iter().copied());
                }
                for (input_sym, _) in &n.argument_symbols {
                    out.insert(*input_sym);
                }
            }
            PlanNode::Join(n) => {
                for (l, r) in &n.equi_clauses {
                    out.insert(*l);
                    out.insert(*r);
                }
                out.extend(n.filter.free_symbols());
            }
            PlanNode::SemiJoin(n) => {
                for (l, r) in &n.join_symbols {
                    out.insert(*l);
                    out.insert(*r);
                }
                out.extend(n.filter.free_symbols());
            }
            PlanNode::Window(n) => {
                out.extend(n.partition_by.iter().copied());
                out.extend(n.order_by.iter().map(|(s, _)| *s));
                for (_, f) in &n.functions {
                    out.extend(f.arguments.iter().copied());
                }
            }
            PlanNode::RowNumber(n) => {
                out.extend(n.partition_by.iter().copied());
                out.extend(n.order_by.iter().map(|(s, _)| *s));
            }
            PlanNode::TopNRowNumber(n) => {
                out.extend(n.partition_by.iter().copied());
                out.extend(n.order_by.iter().map(|(s, _)| *s));
            }
            PlanNode::Sort(n) => out.extend(n.order_by.iter().map(|(s, _)| *s)),
            PlanNode::TopN(n) => out.extend(n.order_by.iter().map(|(s, _)| *s)),
            PlanNode::Limit(_) | PlanNode::Offset(_) => {}
            PlanNode::DistinctLimit(n) => out.extend(n.distinct_symbols.iter().copied()),
            PlanNode::SetOperation(n) => {
                for (_, inputs) in &n.symbol_mapping {
                    out.extend(inputs.iter().copied());
                }
            }
            PlanNode::Unnest(n) => {
                out.extend(n.replicate_symbols.iter().copied());
                for (s, _) in &n.unnest_symbols {
                    out.insert(*s);
                }
                out.extend(n.filter.free_symbols());
            }
            PlanNode::CorrelatedJoin(n) => {
                out.extend(n.correlation_symbols.iter().copied());
                out.extend(n.filter.free_symbols());
            }
            PlanNode::AssignUniqueId(_) => {}
            PlanNode::Exchange(n) => {
                if let Some(scheme) = &n.partitioning {
                    out.extend(scheme.columns.iter().copied());
                }
                out.extend(n.ordering.iter().map(|(s, _)| *s));
            }
        }
        out
    }
}

impl fmt::Display for PlanNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", crate::distill::distill(self))
    }
}

/// Ascending / descending, nulls-first / nulls-last, per sort key (§3.2 ordering scheme).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SortOrder {
    pub descending: bool,
    pub nulls_first: bool,
}

impl SortOrder {
    pub fn asc() -> Self {
        Self {
            descending: false,
            nulls_first: false,
        }
    }

    pub fn desc() -> Self {
        Self {
            descending: true,
            nulls_first: true,
        }
    }
}
