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

use super::Expr;
use crate::symbol::Symbol;

/// A reference to a [`Symbol`] produced by some ancestor plan node's child. The leaf of most
/// expression trees; the sole thing [`crate::equality_inference::EqualityInference::rewrite`]
/// (§4.2) is ultimately trying to produce more of.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct SymbolReference {
    symbol: Symbol,
    data_type: DataType,
}

impl SymbolReference {
    pub fn new(symbol: Symbol, data_type: DataType) -> Self {
        Self { symbol, data_type }
    }

    pub fn symbol(&self) -> Symbol {
        self.symbol
    }
}

impl Expr for SymbolReference {
    fn return_type(&self) -> DataType {
        self.data_type.clone()
    }
}

impl fmt::Debug for SymbolReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.symbol)
    }
}
