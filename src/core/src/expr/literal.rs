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

use std::fmt;

use relplan_common::scalar::Datum;
use relplan_common::types::DataType;

use super::Expr;

/// A typed constant, including SQL NULL (`value = None`).
#[derive(Clone, PartialEq)]
pub struct Literal {
    value: Datum,
    data_type: DataType,
}

impl Literal {
    pub fn new(value: Datum, data_type: DataType) -> Self {
        Self { value, data_type }
    }

    pub fn value(&self) -> &Datum {
        &self.value
    }

    pub fn is_null(&self) -> bool {
        self.value.is_none()
    }

    pub fn as_bool(&self) -> Option<bool> {
        self.value.as_ref().and_then(|v| v.as_bool())
    }
}

impl Expr for Literal {
    fn return_type(&self) -> DataType {
        self.data_type.clone()
    }
}

impl fmt::Debug for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.value {
            Some(v) => write!(f, "{v}"),
            None => write!(f, "NULL"),
        }
    }
}
