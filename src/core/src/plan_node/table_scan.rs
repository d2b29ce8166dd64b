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

//! Leaf node reading from a connector-resolved table (§3.2).

use crate::plan_node::PlanBase;
use crate::symbol::Symbol;
use crate::tuple_domain::TupleDomain;

/// A connector-supplied column handle. Opaque to this core beyond equality/hashing; the
/// connector's own identity scheme lives entirely on the other side of §6.1's boundary.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ColumnHandle(pub String);

#[derive(Clone, Debug, PartialEq)]
pub struct TableScan {
    pub base: PlanBase,
    pub table_name: String,
    /// connector column → output symbol, in output order (§3.2).
    pub assignments: Vec<(ColumnHandle, Symbol)>,
    /// The constraint the connector guarantees is already satisfied for every row it emits
    /// (§3.2, §4.3 "enforced-constraint tuple-domain"). `TupleDomain::all()` when the connector
    /// makes no such guarantee.
    pub enforced_constraint: TupleDomain<ColumnHandle>,
}

impl TableScan {
    pub fn new(
        base: PlanBase,
        table_name: impl Into<String>,
        assignments: Vec<(ColumnHandle, Symbol)>,
        enforced_constraint: TupleDomain<ColumnHandle>,
    ) -> Self {
        Self {
            base,
            table_name: table_name.into(),
            assignments,
            enforced_constraint,
        }
    }

    /// Rekeys [`Self::enforced_constraint`] from column handles to output symbols, used by
    /// effective-predicate extraction (§4.3 table).
    pub fn constraint_by_symbol(&self) -> TupleDomain<Symbol> {
        let map: std::collections::HashMap<&ColumnHandle, Symbol> = self
            .assignments
            .iter()
            .map(|(col, sym)| (col, *sym))
            .collect();
        self.enforced_constraint
            .transform(|col| map.get(col).copied())
    }
}
