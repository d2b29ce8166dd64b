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

//! Stage-boundary node inserted by the exchange planner (§4.5) to reconcile a child's *actual*
//! data distribution with a parent's *preferred* one.

use crate::plan_node::{PlanBase, PlanRef, SortOrder};
use crate::symbol::Symbol;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ExchangeKind {
    /// Collapse every source into a single stream on one node.
    Gather,
    /// Redistribute rows across many nodes by a partitioning scheme (typically hash of some
    /// columns).
    Repartition,
    /// Broadcast every row of (typically the build side of a replicated join) to every node.
    Replicate,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ExchangeScope {
    /// Within one node's worker threads.
    Local,
    /// Across the distributed execution topology — a real network shuffle.
    Remote,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum PartitioningFunction {
    Hash,
    RoundRobin,
    Single,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct PartitioningScheme {
    pub function: PartitioningFunction,
    pub columns: Vec<Symbol>,
}

impl PartitioningScheme {
    pub fn hash(columns: Vec<Symbol>) -> Self {
        Self {
            function: PartitioningFunction::Hash,
            columns,
        }
    }

    pub fn single() -> Self {
        Self {
            function: PartitioningFunction::Single,
            columns: vec![],
        }
    }

    pub fn round_robin() -> Self {
        Self {
            function: PartitioningFunction::RoundRobin,
            columns: vec![],
        }
    }

    /// Whether two schemes describe the same partitioning up to column order — used by the
    /// exchange planner (§4.5) to decide if a child is "already partitioned" the way a parent
    /// needs, without re-shuffling for a merely differently-ordered key list.
    pub fn is_compatible_with(&self, required: &PartitioningScheme) -> bool {
        self.function == required.function
            && self.columns.len() == required.columns.len()
            && self
                .columns
                .iter()
                .collect::<std::collections::HashSet<_>>()
                == required.columns.iter().collect::<std::collections::HashSet<_>>()
    }
}

/// How the exchange planner decided to realize a `Join` (§4.5). Distinct from [`ExchangeKind`]: a
/// join's distribution type is a *property of the join node itself*, recorded once exchange
/// insertion has reconciled both sides; the exchanges it inserted to get there are separate nodes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum JoinDistributionType {
    Partitioned,
    Replicated,
    SingleNode,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Exchange {
    pub base: PlanBase,
    pub input: PlanRef,
    pub kind: ExchangeKind,
    pub scope: ExchangeScope,
    /// `Some` for `Repartition`; `None` for `Gather`/`Replicate`.
    pub partitioning: Option<PartitioningScheme>,
    /// Merge ordering applied while gathering, if the child streams are individually sorted and
    /// the parent wants that order preserved (§4.5 "Sort... merging exchange").
    pub ordering: Vec<(Symbol, SortOrder)>,
}

impl Exchange {
    pub fn new(
        base: PlanBase,
        input: PlanRef,
        kind: ExchangeKind,
        scope: ExchangeScope,
        partitioning: Option<PartitioningScheme>,
        ordering: Vec<(Symbol, SortOrder)>,
    ) -> Self {
        Self {
            base,
            input,
            kind,
            scope,
            partitioning,
            ordering,
        }
    }

    pub fn gather(base: PlanBase, input: PlanRef, scope: ExchangeScope) -> Self {
        Self::new(base, input, ExchangeKind::Gather, scope, None, vec![])
    }

    pub fn repartition(base: PlanBase, input: PlanRef, partitioning: PartitioningScheme) -> Self {
        Self::new(
            base,
            input,
            ExchangeKind::Repartition,
            ExchangeScope::Remote,
            Some(partitioning),
            vec![],
        )
    }

    pub fn replicate(base: PlanBase, input: PlanRef) -> Self {
        Self::new(
            base,
            input,
            ExchangeKind::Replicate,
            ExchangeScope::Remote,
            None,
            vec![],
        )
    }
}
