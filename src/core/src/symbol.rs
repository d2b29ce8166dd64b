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

//! Symbols: the only way a plan node may refer to a value (§3.1).

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

use relplan_common::types::DataType;
use rustc_hash::FxHashMap;

/// An opaque, globally-unique identifier for a column-valued stream position.
///
/// Equality and hashing are by `id` alone: two symbols with the same display name are distinct
/// unless they're the same allocation, which is what makes "name collisions are impossible" (§3.1)
/// true by construction rather than by convention.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Symbol {
    id: u64,
}

impl Symbol {
    /// Only `SymbolAllocator` mints these; tests that need a symbol without an allocator can use
    /// this escape hatch, which is why it's `pub(crate)` rather than private.
    pub(crate) fn from_raw(id: u64) -> Self {
        Self { id }
    }

    pub fn id(self) -> u64 {
        self.id
    }
}

impl fmt::Debug for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "${}", self.id)
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Monotonic per-query counter minting fresh [`Symbol`]s. Never reused within a query (§9); two
/// different queries must use two different allocators (§5).
#[derive(Clone)]
pub struct SymbolAllocator {
    next: Rc<Cell<u64>>,
    names: Rc<std::cell::RefCell<FxHashMap<Symbol, (String, DataType)>>>,
}

impl Default for SymbolAllocator {
    fn default() -> Self {
        Self::new()
    }
}

impl SymbolAllocator {
    pub fn new() -> Self {
        Self {
            next: Rc::new(Cell::new(0)),
            names: Rc::new(std::cell::RefCell::new(FxHashMap::default())),
        }
    }

    /// Allocate a fresh symbol of the given type. `display_name` is carried only for
    /// `EXPLAIN`-style rendering (§3.1) and plays no role in equality.
    pub fn fresh(&self, display_name: impl Into<String>, data_type: DataType) -> Symbol {
        let id = self.next.get();
        self.next.set(id + 1);
        let symbol = Symbol::from_raw(id);
        self.names
            .borrow_mut()
            .insert(symbol, (display_name.into(), data_type));
        symbol
    }

    /// Mint a fresh symbol that stands in for an existing one, e.g. when a pass needs to
    /// duplicate a column (`GroupId`, dynamic-filter synthesis). Carries over the display name
    /// and type from the provider.
    pub fn fresh_like(&self, provider: &dyn TypeProvider, original: Symbol) -> Symbol {
        let ty = provider.type_of(original);
        let name = self.display_name(original).unwrap_or_default();
        self.fresh(name, ty)
    }

    pub fn display_name(&self, symbol: Symbol) -> Option<String> {
        self.names.borrow().get(&symbol).map(|(n, _)| n.clone())
    }
}

impl TypeProvider for SymbolAllocator {
    fn type_of(&self, symbol: Symbol) -> DataType {
        self.names
            .borrow()
            .get(&symbol)
            .map(|(_, ty)| ty.clone())
            .unwrap_or_else(|| panic!("{symbol:?} was never allocated by this SymbolAllocator"))
    }

    fn try_type_of(&self, symbol: Symbol) -> Option<DataType> {
        self.names.borrow().get(&symbol).map(|(_, ty)| ty.clone())
    }
}

/// A total mapping from every live symbol to its SQL type (§3.1). The allocator used to mint a
/// symbol is always a valid `TypeProvider` for it; composite providers (e.g. "this plan's
/// allocator plus types inherited from an outer query") can implement the trait directly.
pub trait TypeProvider {
    fn type_of(&self, symbol: Symbol) -> DataType;

    /// Non-panicking variant, useful while validating external input.
    fn try_type_of(&self, symbol: Symbol) -> Option<DataType>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_symbols_are_monotonic_and_distinct() {
        let alloc = SymbolAllocator::new();
        let a = alloc.fresh("a", DataType::Int32);
        let b = alloc.fresh("a", DataType::Int32);
        assert_ne!(a, b, "same display name must not imply same identity");
        assert_eq!(alloc.type_of(a), DataType::Int32);
    }

    #[test]
    fn fresh_like_copies_type_and_name() {
        let alloc = SymbolAllocator::new();
        let a = alloc.fresh("k", DataType::Varchar);
        let b = alloc.fresh_like(&alloc, a);
        assert_eq!(alloc.type_of(b), DataType::Varchar);
        assert_eq!(alloc.display_name(b).as_deref(), Some("k"));
    }
}
