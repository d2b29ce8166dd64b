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

//! Leaf node of literal rows (§3.2).

use crate::expr::ExprImpl;
use crate::plan_node::PlanBase;

#[derive(Clone, Debug, PartialEq)]
pub struct Values {
    pub base: PlanBase,
    /// Row-major; each inner vec has length `base.outputs().len()`.
    pub rows: Vec<Vec<ExprImpl>>,
}

impl Values {
    pub fn new(base: PlanBase, rows: Vec<Vec<ExprImpl>>) -> Self {
        debug_assert!(
            rows.iter().all(|r| r.len() == base.outputs().len()),
            "every row must supply exactly one value per output symbol"
        );
        Self { base, rows }
    }

    /// Column `i` across every row, for effective-predicate extraction (§4.3 "Values": per-column
    /// union of row domains).
    pub fn column(&self, i: usize) -> impl Iterator<Item = &ExprImpl> {
        self.rows.iter().map(move |r| &r[i])
    }
}
