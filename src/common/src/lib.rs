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

//! Types shared between the planner core and anything that embeds it: the SQL type system,
//! scalar value representation, and the `Field`/`Schema` pair used to describe a stream of rows.
//!
//! This crate intentionally knows nothing about plans or expressions; it is the vocabulary the
//! rest of the workspace is written in.

pub mod catalog;
pub mod scalar;
pub mod types;

pub use catalog::{Field, Schema};
pub use scalar::{Datum, ScalarImpl};
pub use types::DataType;
