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

//! The planner core: a logical plan IR plus the optimizer passes that turn an analyzer-produced
//! plan into one with predicates pushed to their sources and data movement made explicit.
//!
//! Passes are organized as single `match`-based traversals over [`plan_node::PlanNode`] rather
//! than a visitor trait per pass — see `plan_node`'s module doc for why.

pub mod condition;
pub mod distill;
pub mod effective_predicate;
pub mod equality_inference;
pub mod exchange_insertion;
pub mod expr;
pub mod interpreter;
pub mod plan_node;
pub mod predicate_pushdown;
pub mod prune;
pub mod session;
pub mod symbol;
#[cfg(any(test, feature = "testing"))]
pub mod testing;
pub mod tuple_domain;
pub mod unalias;
