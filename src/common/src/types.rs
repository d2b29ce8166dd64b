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

/// The SQL type of a value flowing through the plan.
///
/// Resolved exclusively by the analyzer (an external collaborator); the core never infers a type
/// on its own, it only propagates types it is handed.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum DataType {
    Boolean,
    Int16,
    Int32,
    Int64,
    Float32,
    Float64,
    Decimal,
    Varchar,
    Bytea,
    Date,
    Time,
    Timestamp,
    Timestamptz,
    Interval,
    Jsonb,
    /// A struct type, e.g. the result of `ROW(...)`.
    Struct(Vec<(String, DataType)>),
    /// An array/list type.
    List(Box<DataType>),
}

impl DataType {
    /// Whether two types are identical for the purposes of equi-join key matching and unalias
    /// symbol merging (§4.7 requires "matching types").
    pub fn matches(&self, other: &DataType) -> bool {
        self == other
    }

    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            DataType::Int16
                | DataType::Int32
                | DataType::Int64
                | DataType::Float32
                | DataType::Float64
                | DataType::Decimal
        )
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataType::Boolean => write!(f, "boolean"),
            DataType::Int16 => write!(f, "smallint"),
            DataType::Int32 => write!(f, "integer"),
            DataType::Int64 => write!(f, "bigint"),
            DataType::Float32 => write!(f, "real"),
            DataType::Float64 => write!(f, "double precision"),
            DataType::Decimal => write!(f, "numeric"),
            DataType::Varchar => write!(f, "varchar"),
            DataType::Bytea => write!(f, "bytea"),
            DataType::Date => write!(f, "date"),
            DataType::Time => write!(f, "time"),
            DataType::Timestamp => write!(f, "timestamp"),
            DataType::Timestamptz => write!(f, "timestamptz"),
            DataType::Interval => write!(f, "interval"),
            DataType::Jsonb => write!(f, "jsonb"),
            DataType::Struct(fields) => {
                write!(f, "struct<")?;
                for (i, (name, ty)) in fields.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{name}:{ty}")?;
                }
                write!(f, ">")
            }
            DataType::List(inner) => write!(f, "{inner}[]"),
        }
    }
}
