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

//! Materializes multiple grouping sets by duplicating rows (§3.2), feeding a grouping-sets
//! `Aggregation` above it.

use crate::plan_node::{PlanBase, PlanRef};
use crate::symbol::Symbol;

#[derive(Clone, Debug, PartialEq)]
pub struct GroupId {
    pub base: PlanBase,
    pub input: PlanRef,
    pub grouping_sets: Vec<Vec<Symbol>>,
    /// Per grouping-set-column, the input symbol substituted with NULL when that column is
    /// excluded from the current row's grouping set.
    pub argument_symbols: Vec<(Symbol, Symbol)>,
    pub group_id_symbol: Symbol,
}

impl GroupId {
    pub fn new(
        base: PlanBase,
        input: PlanRef,
        grouping_sets: Vec<Vec<Symbol>>,
        argument_symbols: Vec<(Symbol, Symbol)>,
        group_id_symbol: Symbol,
    ) -> Self {
        Self {
            base,
            input,
            grouping_sets,
            argument_symbols,
            group_id_symbol,
        }
    }

    /// The symbols common to every grouping set — the only ones safe for a predicate to be
    /// pushed through this node on (§4.4 "Window / MarkDistinct / GroupId").
    pub fn common_grouping_columns(&self) -> Vec<Symbol> {
        let Some(first) = self.grouping_sets.first() else {
            return vec![];
        };
        first
            .iter()
            .copied()
            .filter(|s| self.grouping_sets.iter().all(|set| set.contains(s)))
            .collect()
    }
}
