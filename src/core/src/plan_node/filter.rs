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

use crate::expr::ExprImpl;
use crate::plan_node::{PlanBase, PlanRef};

/// A retained predicate over the child's outputs (§3.2). `base.outputs()` always equals
/// `input.outputs()` — a filter never changes the shape of the stream, only which rows survive.
#[derive(Clone, Debug, PartialEq)]
pub struct Filter {
    pub base: PlanBase,
    pub input: PlanRef,
    pub predicate: ExprImpl,
}

impl Filter {
    pub fn new(base: PlanBase, input: PlanRef, predicate: ExprImpl) -> Self {
        Self {
            base,
            input,
            predicate,
        }
    }
}
