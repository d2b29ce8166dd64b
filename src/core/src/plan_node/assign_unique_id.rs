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

//! Appends a globally-unique row id symbol (§3.2) — used ahead of a decorrelated join so rows can
//! be matched back up after a one-to-many expansion.

use crate::plan_node::{PlanBase, PlanRef};
use crate::symbol::Symbol;

#[derive(Clone, Debug, PartialEq)]
pub struct AssignUniqueId {
    pub base: PlanBase,
    pub input: PlanRef,
    pub unique_id_symbol: Symbol,
}

impl AssignUniqueId {
    pub fn new(base: PlanBase, input: PlanRef, unique_id_symbol: Symbol) -> Self {
        Self {
            base,
            input,
            unique_id_symbol,
        }
    }
}
