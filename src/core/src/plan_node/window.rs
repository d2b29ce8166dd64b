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

use relplan_common::types::DataType;

use crate::plan_node::{PlanBase, PlanRef, SortOrder};
use crate::symbol::Symbol;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FrameBoundType {
    UnboundedPreceding,
    Preceding(u64),
    CurrentRow,
    Following(u64),
    UnboundedFollowing,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FrameMode {
    Rows,
    Range,
    Groups,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct WindowFrame {
    pub mode: FrameMode,
    pub start: FrameBoundType,
    pub end: FrameBoundType,
}

#[derive(Clone, Debug, PartialEq)]
pub struct WindowFunctionCall {
    pub name: &'static str,
    pub arguments: Vec<Symbol>,
    pub return_type: DataType,
    /// `false` for built-ins like `row_number`/`rank` that ignore the deterministic flag
    /// entirely; carried for parity with [`crate::plan_node::aggregation::AggregateFunctionCall`]
    /// so pushdown's non-determinism check (§4.4 "Window... never pushed") has one shape to ask.
    pub deterministic: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Window {
    pub base: PlanBase,
    pub input: PlanRef,
    pub partition_by: Vec<Symbol>,
    pub order_by: Vec<(Symbol, SortOrder)>,
    pub functions: Vec<(Symbol, WindowFunctionCall)>,
    pub frame: WindowFrame,
}

impl Window {
    pub fn new(
        base: PlanBase,
        input: PlanRef,
        partition_by: Vec<Symbol>,
        order_by: Vec<(Symbol, SortOrder)>,
        functions: Vec<(Symbol, WindowFunctionCall)>,
        frame: WindowFrame,
    ) -> Self {
        Self {
            base,
            input,
            partition_by,
            order_by,
            functions,
            frame,
        }
    }
}
