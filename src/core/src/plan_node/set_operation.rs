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

use crate::plan_node::{PlanBase, PlanRef};
use crate::symbol::Symbol;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SetOperationKind {
    Union,
    Intersect,
    Except,
}

/// `UNION`/`INTERSECT`/`EXCEPT` over N sources (§3.2). `symbol_mapping[i] = (out, [in_0, ..,
/// in_{n-1}])`: every source contributes exactly one input symbol per output symbol, in source
/// order — this is what lets passes (e.g. prune, §4.6; effective predicate, §4.3) translate a
/// requirement on `out` into a requirement on each source's own symbol space.
#[derive(Clone, Debug, PartialEq)]
pub struct SetOperation {
    pub base: PlanBase,
    pub sources: Vec<PlanRef>,
    pub kind: SetOperationKind,
    pub symbol_mapping: Vec<(Symbol, Vec<Symbol>)>,
}

impl SetOperation {
    pub fn new(
        base: PlanBase,
        sources: Vec<PlanRef>,
        kind: SetOperationKind,
        symbol_mapping: Vec<(Symbol, Vec<Symbol>)>,
    ) -> Self {
        debug_assert!(
            symbol_mapping.iter().all(|(_, ins)| ins.len() == sources.len()),
            "every output must map to exactly one input symbol per source"
        );
        Self {
            base,
            sources,
            kind,
            symbol_mapping,
        }
    }

    /// The input symbol contributed by source `i` for output `out`.
    pub fn input_symbol(&self, out: Symbol, source_index: usize) -> Option<Symbol> {
        self.symbol_mapping
            .iter()
            .find(|(o, _)| *o == out)
            .map(|(_, ins)| ins[source_index])
    }
}
