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

use relplan_common::types::DataType;

use super::{Expr, ExprImpl};

/// `ROW(e1, e2, ...)`, producing a struct-typed value.
#[derive(Clone, PartialEq)]
pub struct Row {
    fields: Vec<ExprImpl>,
    return_type: DataType,
}

impl Row {
    pub fn new(fields: Vec<ExprImpl>, return_type: DataType) -> Self {
        Self {
            fields,
            return_type,
        }
    }

    pub fn fields(&self) -> &[ExprImpl] {
        &self.fields
    }
}

impl Expr for Row {
    fn return_type(&self) -> DataType {
        self.return_type.clone()
    }
}

impl fmt::Debug for Row {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ROW(")?;
        for (i, field) in self.fields.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{field:?}")?;
        }
        write!(f, ")")
    }
}
