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

use crate::plan_node::{PlanBase, PlanRef, SortOrder};
use crate::symbol::Symbol;

/// A pure ordering with no row limit (§3.2).
#[derive(Clone, Debug, PartialEq)]
pub struct Sort {
    pub base: PlanBase,
    pub input: PlanRef,
    pub order_by: Vec<(Symbol, SortOrder)>,
}

impl Sort {
    pub fn new(base: PlanBase, input: PlanRef, order_by: Vec<(Symbol, SortOrder)>) -> Self {
        Self {
            base,
            input,
            order_by,
        }
    }
}

/// Sort + row cap fused into one node, so the executor can use a bounded heap (§3.2 `TopN`).
#[derive(Clone, Debug, PartialEq)]
pub struct TopN {
    pub base: PlanBase,
    pub input: PlanRef,
    pub order_by: Vec<(Symbol, SortOrder)>,
    pub count: u64,
    pub with_ties: bool,
}

impl TopN {
    pub fn new(
        base: PlanBase,
        input: PlanRef,
        order_by: Vec<(Symbol, SortOrder)>,
        count: u64,
        with_ties: bool,
    ) -> Self {
        Self {
            base,
            input,
            order_by,
            count,
            with_ties,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Limit {
    pub base: PlanBase,
    pub input: PlanRef,
    pub count: u64,
}

impl Limit {
    pub fn new(base: PlanBase, input: PlanRef, count: u64) -> Self {
        Self { base, input, count }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Offset {
    pub base: PlanBase,
    pub input: PlanRef,
    pub count: u64,
}

impl Offset {
    pub fn new(base: PlanBase, input: PlanRef, count: u64) -> Self {
        Self { base, input, count }
    }
}

/// `SELECT DISTINCT ... LIMIT n`: dedup on `distinct_symbols` then cap, without a full sort
/// (§3.2).
#[derive(Clone, Debug, PartialEq)]
pub struct DistinctLimit {
    pub base: PlanBase,
    pub input: PlanRef,
    pub distinct_symbols: Vec<Symbol>,
    pub count: u64,
}

impl DistinctLimit {
    pub fn new(base: PlanBase, input: PlanRef, distinct_symbols: Vec<Symbol>, count: u64) -> Self {
        Self {
            base,
            input,
            distinct_symbols,
            count,
        }
    }
}
