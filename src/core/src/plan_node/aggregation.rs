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

use relplan_common::types::DataType;

use crate::expr::ExprImpl;
use crate::plan_node::{PlanBase, PlanRef};
use crate::symbol::Symbol;

/// Which phase of a (possibly distributed) aggregation this node represents (§3.2).
///
/// `SINGLE` aggregations never get split; `PARTIAL`/`INTERMEDIATE`/`FINAL` appear after the
/// exchange planner (§4.5) has decided to distribute the grouping.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AggregationStep {
    Single,
    Partial,
    Intermediate,
    Final,
}

#[derive(Clone, Debug, PartialEq)]
pub struct AggregateFunctionCall {
    pub name: &'static str,
    pub arguments: Vec<Symbol>,
    pub filter: Option<ExprImpl>,
    pub distinct: bool,
    pub order_by: Vec<(Symbol, crate::plan_node::SortOrder)>,
    pub return_type: DataType,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Aggregation {
    pub base: PlanBase,
    pub input: PlanRef,
    pub grouping_keys: Vec<Symbol>,
    pub aggregations: Vec<(Symbol, AggregateFunctionCall)>,
    /// Present when the aggregation materializes more than one grouping set (paired with a
    /// `GroupId` node below it); a single set makes this `vec![grouping_keys.clone()]`.
    pub grouping_sets: Vec<Vec<Symbol>>,
    pub group_id_symbol: Option<Symbol>,
    pub step: AggregationStep,
}

impl Aggregation {
    pub fn new(
        base: PlanBase,
        input: PlanRef,
        grouping_keys: Vec<Symbol>,
        aggregations: Vec<(Symbol, AggregateFunctionCall)>,
        grouping_sets: Vec<Vec<Symbol>>,
        group_id_symbol: Option<Symbol>,
        step: AggregationStep,
    ) -> Self {
        Self {
            base,
            input,
            grouping_keys,
            aggregations,
            grouping_sets,
            group_id_symbol,
            step,
        }
    }

    pub fn is_simple_grouping(&self) -> bool {
        self.grouping_sets.len() <= 1
    }
}
