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

use std::cmp::Ordering;
use std::fmt;

use ordered_float::OrderedFloat;
use rust_decimal::Decimal;

use crate::types::DataType;

/// A concrete, non-null value. `Datum = Option<ScalarImpl>` models SQL NULL as `None`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum ScalarImpl {
    Bool(bool),
    Int16(i16),
    Int32(i32),
    Int64(i64),
    Float32(OrderedFloat<f32>),
    Float64(OrderedFloat<f64>),
    Decimal(Decimal),
    Utf8(Box<str>),
    Bytea(Box<[u8]>),
    Struct(Vec<Datum>),
    List(Vec<Datum>),
}

/// `None` represents SQL NULL.
pub type Datum = Option<ScalarImpl>;

impl ScalarImpl {
    pub fn data_type(&self) -> DataType {
        match self {
            ScalarImpl::Bool(_) => DataType::Boolean,
            ScalarImpl::Int16(_) => DataType::Int16,
            ScalarImpl::Int32(_) => DataType::Int32,
            ScalarImpl::Int64(_) => DataType::Int64,
            ScalarImpl::Float32(_) => DataType::Float32,
            ScalarImpl::Float64(_) => DataType::Float64,
            ScalarImpl::Decimal(_) => DataType::Decimal,
            ScalarImpl::Utf8(_) => DataType::Varchar,
            ScalarImpl::Bytea(_) => DataType::Bytea,
            // Struct/List element types are not tracked on the scalar itself; callers that need
            // the full type carry it alongside (e.g. via the expression's annotated return type).
            ScalarImpl::Struct(_) => DataType::Struct(vec![]),
            ScalarImpl::List(_) => DataType::List(Box::new(DataType::Boolean)),
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ScalarImpl::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// A total order used by [`crate::types::DataType`]-homogeneous [`ScalarImpl`] values, needed
    /// to keep tuple-domain ranges sorted and coalesced. Returns `None` when the two scalars are
    /// not of directly comparable variants (e.g. comparing a struct to an int).
    pub fn partial_cmp_scalar(&self, other: &ScalarImpl) -> Option<Ordering> {
        use ScalarImpl::*;
        match (self, other) {
            (Bool(a), Bool(b)) => a.partial_cmp(b),
            (Int16(a), Int16(b)) => a.partial_cmp(b),
            (Int32(a), Int32(b)) => a.partial_cmp(b),
            (Int64(a), Int64(b)) => a.partial_cmp(b),
            (Float32(a), Float32(b)) => a.partial_cmp(b),
            (Float64(a), Float64(b)) => a.partial_cmp(b),
            (Decimal(a), Decimal(b)) => a.partial_cmp(b),
            (Utf8(a), Utf8(b)) => a.partial_cmp(b),
            (Bytea(a), Bytea(b)) => a.partial_cmp(b),
            _ => None,
        }
    }
}

impl fmt::Display for ScalarImpl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScalarImpl::Bool(v) => write!(f, "{v}"),
            ScalarImpl::Int16(v) => write!(f, "{v}"),
            ScalarImpl::Int32(v) => write!(f, "{v}"),
            ScalarImpl::Int64(v) => write!(f, "{v}"),
            ScalarImpl::Float32(v) => write!(f, "{v}"),
            ScalarImpl::Float64(v) => write!(f, "{v}"),
            ScalarImpl::Decimal(v) => write!(f, "{v}"),
            ScalarImpl::Utf8(v) => write!(f, "'{v}'"),
            ScalarImpl::Bytea(v) => write!(f, "\\x{}", hex_encode(v)),
            ScalarImpl::Struct(fields) => {
                write!(f, "(")?;
                for (i, d) in fields.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    match d {
                        Some(s) => write!(f, "{s}")?,
                        None => write!(f, "NULL")?,
                    }
                }
                write!(f, ")")
            }
            ScalarImpl::List(items) => {
                write!(f, "[")?;
                for (i, d) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    match d {
                        Some(s) => write!(f, "{s}")?,
                        None => write!(f, "NULL")?,
                    }
                }
                write!(f, "]")
            }
        }
    }
}

fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}
