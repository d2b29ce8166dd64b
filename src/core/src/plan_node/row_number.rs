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

//! `row_number() OVER (...)` materialized as its own node kind (rather than a general `Window`
//! function) so the optimizer can special-case its well-known monotonic-counter semantics (§3.2).

use crate::plan_node::{PlanBase, PlanRef, SortOrder};
use crate::symbol::Symbol;

#[derive(Clone, Debug, PartialEq)]
pub struct RowNumber {
    pub base: PlanBase,
    pub input: PlanRef,
    pub partition_by: Vec<Symbol>,
    pub order_by: Vec<(Symbol, SortOrder)>,
    pub row_number_symbol: Symbol,
    /// Set only when a `WHERE row_number <= N` filter has already been folded into this node by
    /// an external rule; this core only reasons about its presence for pruning purposes.
    pub max_row_count_per_partition: Option<u64>,
}

impl RowNumber {
    pub fn new(
        base: PlanBase,
        input: PlanRef,
        partition_by: Vec<Symbol>,
        order_by: Vec<(Symbol, SortOrder)>,
        row_number_symbol: Symbol,
    ) -> Self {
        Self {
            base,
            input,
            partition_by,
            order_by,
            row_number_symbol,
            max_row_count_per_partition: None,
        }
    }
}

/// `row_number` fused with a `LIMIT` per partition — the shape `optimizeTopNRowNumber` (§6.1
/// session property) folds a `RowNumber` + `Filter(rn <= N)` into, so the executor can evaluate it
/// with a bounded per-partition heap instead of materializing every row.
#[derive(Clone, Debug, PartialEq)]
pub struct TopNRowNumber {
    pub base: PlanBase,
    pub input: PlanRef,
    pub partition_by: Vec<Symbol>,
    pub order_by: Vec<(Symbol, SortOrder)>,
    pub row_number_symbol: Symbol,
    pub limit: u64,
    /// Whether `row_number_symbol` survives into this node's outputs, or was only needed to
    /// express the limit and is dropped (the common case once pruning removes it).
    pub produce_row_number: bool,
}

impl TopNRowNumber {
    pub fn new(
        base: PlanBase,
        input: PlanRef,
        partition_by: Vec<Symbol>,
        order_by: Vec<(Symbol, SortOrder)>,
        row_number_symbol: Symbol,
        limit: u64,
        produce_row_number: bool,
    ) -> Self {
        Self {
            base,
            input,
            partition_by,
            order_by,
            row_number_symbol,
            limit,
            produce_row_number,
        }
    }
}
