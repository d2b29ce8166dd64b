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

//! Shared test fixtures (§10.4): thin builders over the plan IR so the pass test modules
//! (effective predicate, equality inference, predicate pushdown, prune, unalias, exchange
//! insertion) can write scenarios as a couple of method calls instead of each re-deriving the same
//! `PlanBase`/allocator scaffolding.

use std::rc::Rc;

use relplan_common::scalar::ScalarImpl;
use relplan_common::types::DataType;

use crate::expr::{ExprImpl, Literal, SymbolReference};
use crate::plan_node::*;
use crate::symbol::{Symbol, SymbolAllocator, TypeProvider};
use crate::tuple_domain::TupleDomain;

/// Bundles the symbol and node-id allocators every constructed plan needs (§3.1, §3.2, §5 "one
/// per compilation").
#[derive(Clone, Default)]
pub struct TestCtx {
    pub symbols: SymbolAllocator,
    pub ids: NodeIdAllocator,
}

impl TestCtx {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sym(&self, name: &str, ty: DataType) -> Symbol {
        self.symbols.fresh(name, ty)
    }

    pub fn int_sym(&self, name: &str) -> Symbol {
        self.sym(name, DataType::Int32)
    }

    pub fn sym_ref(&self, s: Symbol) -> ExprImpl {
        SymbolReference::new(s, self.symbols.type_of(s)).into()
    }

    pub fn lit_i32(&self, v: i32) -> ExprImpl {
        Literal::new(Some(ScalarImpl::Int32(v)), DataType::Int32).into()
    }

    pub fn null_i32(&self) -> ExprImpl {
        Literal::new(None, DataType::Int32).into()
    }

    fn base(&self, outputs: Vec<Symbol>) -> PlanBase {
        PlanBase::new(self.ids.fresh(), outputs, &self.symbols)
    }

    pub fn scan(&self, table: &str, syms: &[Symbol]) -> PlanRef {
        let assignments = syms
            .iter()
            .map(|s| (ColumnHandle(format!("{table}.{s:?}")), *s))
            .collect();
        let base = self.base(syms.to_vec());
        Rc::new(PlanNode::TableScan(Rc::new(TableScan::new(
            base,
            table,
            assignments,
            TupleDomain::all(),
        ))))
    }

    pub fn scan_with_constraint(
        &self,
        table: &str,
        syms: &[Symbol],
        enforced: TupleDomain<ColumnHandle>,
    ) -> PlanRef {
        let assignments: Vec<_> = syms
            .iter()
            .map(|s| (ColumnHandle(format!("{table}.{s:?}")), *s))
            .collect();
        let base = self.base(syms.to_vec());
        Rc::new(PlanNode::TableScan(Rc::new(TableScan::new(
            base,
            table,
            assignments,
            enforced,
        ))))
    }

    pub fn values(&self, syms: &[Symbol], rows: Vec<Vec<ExprImpl>>) -> PlanRef {
        let base = self.base(syms.to_vec());
        Rc::new(PlanNode::Values(Rc::new(Values::new(base, rows))))
    }

    pub fn filter(&self, input: PlanRef, predicate: ExprImpl) -> PlanRef {
        let base = self.base(input.outputs().to_vec());
        Rc::new(PlanNode::Filter(Rc::new(Filter::new(base, input, predicate))))
    }

    pub fn project(&self, input: PlanRef, assignments: Vec<(Symbol, ExprImpl)>) -> PlanRef {
        let outputs = assignments.iter().map(|(s, _)| *s).collect();
        let base = self.base(outputs);
        Rc::new(PlanNode::Project(Rc::new(Project::new(base, input, assignments))))
    }

    pub fn join(
        &self,
        join_type: JoinType,
        left: PlanRef,
        right: PlanRef,
        equi_clauses: Vec<(Symbol, Symbol)>,
        filter: ExprImpl,
    ) -> PlanRef {
        let mut outputs = left.outputs().to_vec();
        outputs.extend(right.outputs().iter().copied());
        let base = self.base(outputs);
        Rc::new(PlanNode::Join(Rc::new(Join::new(
            base, left, right, join_type, equi_clauses, filter,
        ))))
    }

    pub fn inner_join(&self, left: PlanRef, right: PlanRef, equi: Vec<(Symbol, Symbol)>) -> PlanRef {
        self.join(JoinType::Inner, left, right, equi, ExprImpl::true_expr())
    }

    pub fn left_join(&self, left: PlanRef, right: PlanRef, equi: Vec<(Symbol, Symbol)>) -> PlanRef {
        self.join(JoinType::Left, left, right, equi, ExprImpl::true_expr())
    }

    pub fn full_join(&self, left: PlanRef, right: PlanRef, equi: Vec<(Symbol, Symbol)>) -> PlanRef {
        self.join(JoinType::Full, left, right, equi, ExprImpl::true_expr())
    }

    pub fn semi_join(
        &self,
        source: PlanRef,
        filtering_source: PlanRef,
        join_symbols: Vec<(Symbol, Symbol)>,
        marker: Symbol,
        is_anti: bool,
    ) -> PlanRef {
        let mut outputs = source.outputs().to_vec();
        outputs.push(marker);
        let base = self.base(outputs);
        Rc::new(PlanNode::SemiJoin(Rc::new(SemiJoin::new(
            base,
            source,
            filtering_source,
            join_symbols,
            ExprImpl::true_expr(),
            marker,
            is_anti,
        ))))
    }

    pub fn count_call(&self, arg: Symbol) -> AggregateFunctionCall {
        AggregateFunctionCall {
            name: "count",
            arguments: vec![arg],
            filter: None,
            distinct: false,
            order_by: vec![],
            return_type: DataType::Int64,
        }
    }

    pub fn aggregation(
        &self,
        input: PlanRef,
        grouping_keys: Vec<Symbol>,
        aggregations: Vec<(Symbol, AggregateFunctionCall)>,
    ) -> PlanRef {
        let mut outputs = grouping_keys.clone();
        outputs.extend(aggregations.iter().map(|(s, _)| *s));
        let grouping_sets = if grouping_keys.is_empty() {
            vec![]
        } else {
            vec![grouping_keys.clone()]
        };
        let base = self.base(outputs);
        Rc::new(PlanNode::Aggregation(Rc::new(Aggregation::new(
            base,
            input,
            grouping_keys,
            aggregations,
            grouping_sets,
            None,
            AggregationStep::Single,
        ))))
    }

    pub fn sort(&self, input: PlanRef, order_by: Vec<(Symbol, SortOrder)>) -> PlanRef {
        let base = self.base(input.outputs().to_vec());
        Rc::new(PlanNode::Sort(Rc::new(Sort::new(base, input, order_by))))
    }

    pub fn limit(&self, input: PlanRef, count: u64) -> PlanRef {
        let base = self.base(input.outputs().to_vec());
        Rc::new(PlanNode::Limit(Rc::new(Limit::new(base, input, count))))
    }

    pub fn window(
        &self,
        input: PlanRef,
        partition_by: Vec<Symbol>,
        order_by: Vec<(Symbol, SortOrder)>,
        functions: Vec<(Symbol, WindowFunctionCall)>,
    ) -> PlanRef {
        let mut outputs = input.outputs().to_vec();
        outputs.extend(functions.iter().map(|(s, _)| *s));
        let base = self.base(outputs);
        let frame = WindowFrame {
            mode: FrameMode::Rows,
            start: FrameBoundType::UnboundedPreceding,
            end: FrameBoundType::CurrentRow,
        };
        Rc::new(PlanNode::Window(Rc::new(Window::new(
            base,
            input,
            partition_by,
            order_by,
            functions,
            frame,
        ))))
    }

    pub fn union(&self, sources: Vec<PlanRef>, symbol_mapping: Vec<(Symbol, Vec<Symbol>)>) -> PlanRef {
        let outputs = symbol_mapping.iter().map(|(out, _)| *out).collect();
        let base = self.base(outputs);
        Rc::new(PlanNode::SetOperation(Rc::new(SetOperation::new(
            base,
            sources,
            SetOperationKind::Union,
            symbol_mapping,
        ))))
    }

    pub fn exchange_gather(&self, input: PlanRef) -> PlanRef {
        let base = self.base(input.outputs().to_vec());
        Rc::new(PlanNode::Exchange(Rc::new(Exchange::gather(
            base,
            input,
            ExchangeScope::Remote,
        ))))
    }

    pub fn exchange_repartition(&self, input: PlanRef, partitioning: PartitioningScheme) -> PlanRef {
        let base = self.base(input.outputs().to_vec());
        Rc::new(PlanNode::Exchange(Rc::new(Exchange::repartition(
            base,
            input,
            partitioning,
        ))))
    }
}
