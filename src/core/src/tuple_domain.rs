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

//! Tuple domains (§3.4): a bounded, per-column description of a row set used to describe a
//! connector's enforced constraint and to round-trip comparison/IS NULL/IN predicates.

use std::collections::HashMap;
use std::hash::Hash;

use relplan_common::scalar::ScalarImpl;
use relplan_common::types::DataType;

use crate::expr::{ExprImpl, FunctionType, Literal, SymbolReference};
use crate::symbol::Symbol;

/// Above this many discrete values, [`Domain::simplify`] collapses an in-list into a single
/// min..max range rather than keeping every value (§3.4 "bound the in-list size").
pub const MAX_DISCRETE_VALUES: usize = 32;

/// An inclusive/exclusive endpoint of a [`Range`].
#[derive(Clone, Debug, PartialEq)]
pub enum Bound {
    Unbounded,
    Inclusive(ScalarImpl),
    Exclusive(ScalarImpl),
}

#[derive(Clone, Debug, PartialEq)]
pub struct Range {
    pub low: Bound,
    pub high: Bound,
}

impl Range {
    pub fn all() -> Self {
        Self {
            low: Bound::Unbounded,
            high: Bound::Unbounded,
        }
    }

    pub fn single(value: ScalarImpl) -> Self {
        Self {
            low: Bound::Inclusive(value.clone()),
            high: Bound::Inclusive(value),
        }
    }

    pub fn is_single_value(&self) -> bool {
        matches!((&self.low, &self.high), (Bound::Inclusive(a), Bound::Inclusive(b)) if a == b)
    }

    fn low_value(&self) -> Option<&ScalarImpl> {
        match &self.low {
            Bound::Inclusive(v) | Bound::Exclusive(v) => Some(v),
            Bound::Unbounded => None,
        }
    }

    fn high_value(&self) -> Option<&ScalarImpl> {
        match &self.high {
            Bound::Inclusive(v) | Bound::Exclusive(v) => Some(v),
            Bound::Unbounded => None,
        }
    }

    /// Two ranges over the same type overlap or touch (so their union is itself a single range).
    fn mergeable_with(&self, other: &Range) -> bool {
        let a_before_b = match (self.high_value(), other.low_value()) {
            (Some(a), Some(b)) => {
                matches!(
                    a.partial_cmp_scalar(b),
                    Some(std::cmp::Ordering::Less) if !matches!(self.high, Bound::Unbounded) && !matches!(other.low, Bound::Unbounded)
                )
            }
            _ => false,
        };
        !a_before_b
            && {
                let b_before_a = match (other.high_value(), self.low_value()) {
                    (Some(a), Some(b)) => {
                        matches!(a.partial_cmp_scalar(b), Some(std::cmp::Ordering::Less))
                    }
                    _ => false,
                };
                !b_before_a
            }
    }
}

/// A union of [`Range`]s plus whether NULL is allowed — a per-column description of an allowed
/// value set (§3.4).
#[derive(Clone, Debug, PartialEq)]
pub struct Domain {
    pub data_type: DataType,
    pub ranges: Vec<Range>,
    pub null_allowed: bool,
}

impl Domain {
    pub fn all(data_type: DataType) -> Self {
        Self {
            data_type,
            ranges: vec![Range::all()],
            null_allowed: true,
        }
    }

    pub fn none(data_type: DataType) -> Self {
        Self {
            data_type,
            ranges: vec![],
            null_allowed: false,
        }
    }

    pub fn only_null(data_type: DataType) -> Self {
        Self {
            data_type,
            ranges: vec![],
            null_allowed: true,
        }
    }

    pub fn single_value(value: ScalarImpl) -> Self {
        let data_type = value.data_type();
        Self {
            data_type,
            ranges: vec![Range::single(value)],
            null_allowed: false,
        }
    }

    pub fn is_none(&self) -> bool {
        self.ranges.is_empty() && !self.null_allowed
    }

    pub fn is_all(&self) -> bool {
        self.null_allowed && self.ranges.len() == 1 && self.ranges[0] == Range::all()
    }

    pub fn intersect(&self, other: &Domain) -> Domain {
        debug_assert_eq!(self.data_type, other.data_type);
        // Conservative: only handle the common discrete-value-set case exactly; anything
        // involving genuine open ranges just keeps both range lists (sound, if not minimal).
        let mut ranges = Vec::new();
        for a in &self.ranges {
            for b in &other.ranges {
                if a == b {
                    ranges.push(a.clone());
                }
            }
        }
        Domain {
            data_type: self.data_type.clone(),
            ranges,
            null_allowed: self.null_allowed && other.null_allowed,
        }
        .simplify()
    }

    pub fn union(&self, other: &Domain) -> Domain {
        debug_assert_eq!(self.data_type, other.data_type);
        let mut ranges = self.ranges.clone();
        ranges.extend(other.ranges.iter().cloned());
        Domain {
            data_type: self.data_type.clone(),
            ranges,
            null_allowed: self.null_allowed || other.null_allowed,
        }
        .simplify()
    }

    /// Coalesces adjacent/overlapping ranges and, once the discrete-value count exceeds
    /// [`MAX_DISCRETE_VALUES`], collapses everything into a single enclosing range (§3.4).
    pub fn simplify(mut self) -> Self {
        self.ranges.sort_by(|a, b| {
            match (a.low_value(), b.low_value()) {
                (Some(x), Some(y)) => x.partial_cmp_scalar(y).unwrap_or(std::cmp::Ordering::Equal),
                (None, Some(_)) => std::cmp::Ordering::Less,
                (Some(_), None) => std::cmp::Ordering::Greater,
                (None, None) => std::cmp::Ordering::Equal,
            }
        });
        let mut merged: Vec<Range> = Vec::new();
        for r in self.ranges {
            if let Some(last) = merged.last_mut() {
                if last.mergeable_with(&r) {
                    *last = merge_two(last, &r);
                    continue;
                }
            }
            merged.push(r);
        }
        if merged.len() > MAX_DISCRETE_VALUES && merged.iter().all(|r| r.is_single_value()) {
            let low = merged.first().unwrap().low.clone();
            let high = merged.last().unwrap().high.clone();
            merged = vec![Range { low, high }];
        }
        self.ranges = merged;
        self
    }

    /// Round-trips to an expression: `IS NULL`, `col = v`, or `col >= lo AND col <= hi` per
    /// range, OR'd together (§3.4 `toPredicate`).
    pub fn to_predicate(&self, symbol: Symbol, data_type: DataType) -> ExprImpl {
        let sym_ref = || -> ExprImpl { SymbolReference::new(symbol, data_type.clone()).into() };
        let mut disjuncts: Vec<ExprImpl> = Vec::new();
        if self.null_allowed {
            disjuncts.push(is_null(sym_ref()));
        }
        if self.ranges.len() <= MAX_DISCRETE_VALUES && self.ranges.iter().all(|r| r.is_single_value())
        {
            if !self.ranges.is_empty() {
                let values: Vec<ExprImpl> = self
                    .ranges
                    .iter()
                    .map(|r| Literal::new(r.low_value().cloned(), data_type.clone()).into())
                    .collect();
                if values.len() == 1 {
                    disjuncts.push(
                        binary(FunctionType::Equal, sym_ref(), values.into_iter().next().unwrap()),
                    );
                } else {
                    disjuncts.push(crate::expr::FunctionCall::new_with_type(
                        FunctionType::In,
                        std::iter::once(sym_ref()).chain(values).collect(),
                        DataType::Boolean,
                    ).into());
                }
            }
        } else {
            for range in &self.ranges {
                disjuncts.push(range_to_predicate(range, sym_ref(), data_type.clone()));
            }
        }
        if disjuncts.is_empty() {
            return ExprImpl::false_expr();
        }
        disjuncts.into_iter().reduce(|a, b| a.or(b)).unwrap()
    }
}

fn merge_two(a: &Range, b: &Range) -> Range {
    let low = match (&a.low, &b.low) {
        (Bound::Unbounded, _) | (_, Bound::Unbounded) => Bound::Unbounded,
        (Bound::Inclusive(x), Bound::Inclusive(y))
        | (Bound::Inclusive(x), Bound::Exclusive(y))
        | (Bound::Exclusive(x), Bound::Inclusive(y)) => {
            if x.partial_cmp_scalar(y) == Some(std::cmp::Ordering::Less) {
                a.low.clone()
            } else {
                b.low.clone()
            }
        }
        (Bound::Exclusive(_), Bound::Exclusive(_)) => a.low.clone(),
    };
    let high = match (&a.high, &b.high) {
        (Bound::Unbounded, _) | (_, Bound::Unbounded) => Bound::Unbounded,
        _ => {
            let av = a.high_value();
            let bv = b.high_value();
            match (av, bv) {
                (Some(x), Some(y)) if y.partial_cmp_scalar(x) == Some(std::cmp::Ordering::Greater) => b.high.clone(),
                _ => a.high.clone(),
            }
        }
    };
    Range { low, high }
}

fn range_to_predicate(range: &Range, sym: ExprImpl, data_type: DataType) -> ExprImpl {
    let mut conjuncts = Vec::new();
    match &range.low {
        Bound::Inclusive(v) => conjuncts.push(binary(
            FunctionType::GreaterThanOrEqual,
            sym.clone(),
            Literal::new(Some(v.clone()), data_type.clone()).into(),
        )),
        Bound::Exclusive(v) => conjuncts.push(binary(
            FunctionType::GreaterThan,
            sym.clone(),
            Literal::new(Some(v.clone()), data_type.clone()).into(),
        )),
        Bound::Unbounded => {}
    }
    match &range.high {
        Bound::Inclusive(v) => conjuncts.push(binary(
            FunctionType::LessThanOrEqual,
            sym.clone(),
            Literal::new(Some(v.clone()), data_type.clone()).into(),
        )),
        Bound::Exclusive(v) => conjuncts.push(binary(
            FunctionType::LessThan,
            sym.clone(),
            Literal::new(Some(v.clone()), data_type).into(),
        )),
        Bound::Unbounded => {}
    }
    if conjuncts.is_empty() {
        ExprImpl::true_expr()
    } else {
        conjuncts.into_iter().reduce(|a, b| a.and(b)).unwrap()
    }
}

fn binary(op: FunctionType, a: ExprImpl, b: ExprImpl) -> ExprImpl {
    crate::expr::FunctionCall::new(op, vec![a, b]).into()
}

fn is_null(a: ExprImpl) -> ExprImpl {
    crate::expr::FunctionCall::new(FunctionType::IsNull, vec![a]).into()
}

/// A finite mapping from column/symbol to [`Domain`], plus a bottom "none" value meaning the
/// empty row set (§3.4).
#[derive(Clone, Debug, PartialEq)]
pub enum TupleDomain<K: Eq + Hash + Clone> {
    /// The empty set of rows: no row satisfies this domain.
    None,
    /// Columns absent from the map are unconstrained (implicitly `Domain::all`).
    Some(HashMap<K, Domain>),
}

impl<K: Eq + Hash + Clone> TupleDomain<K> {
    pub fn all() -> Self {
        TupleDomain::Some(HashMap::new())
    }

    pub fn none() -> Self {
        TupleDomain::None
    }

    pub fn from_domains(domains: HashMap<K, Domain>) -> Self {
        if domains.values().any(Domain::is_none) {
            TupleDomain::None
        } else {
            TupleDomain::Some(domains)
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, TupleDomain::None)
    }

    pub fn domain(&self, key: &K) -> Option<&Domain> {
        match self {
            TupleDomain::None => None,
            TupleDomain::Some(m) => m.get(key),
        }
    }

    pub fn intersect(&self, other: &TupleDomain<K>) -> TupleDomain<K> {
        match (self, other) {
            (TupleDomain::None, _) | (_, TupleDomain::None) => TupleDomain::None,
            (TupleDomain::Some(a), TupleDomain::Some(b)) => {
                let mut out = a.clone();
                for (k, bd) in b {
                    out.entry(k.clone())
                        .and_modify(|ad| *ad = ad.intersect(bd))
                        .or_insert_with(|| bd.clone());
                }
                TupleDomain::from_domains(out)
            }
        }
    }

    pub fn union(&self, other: &TupleDomain<K>) -> TupleDomain<K> {
        match (self, other) {
            (TupleDomain::None, x) | (x, TupleDomain::None) => x.clone(),
            (TupleDomain::Some(a), TupleDomain::Some(b)) => {
                // A column only constrained on one side is unconstrained in the union.
                let mut out = HashMap::new();
                for (k, ad) in a {
                    if let Some(bd) = b.get(k) {
                        out.insert(k.clone(), ad.union(bd));
                    }
                }
                TupleDomain::Some(out)
            }
        }
    }

    /// Rekeys every column via `f`; columns mapping to `None` are dropped (their constraint is
    /// forgotten, not falsified) — used to move a scan's column-handle-keyed constraint into
    /// symbol space (§4.3).
    pub fn transform<K2: Eq + Hash + Clone>(&self, f: impl Fn(&K) -> Option<K2>) -> TupleDomain<K2> {
        match self {
            TupleDomain::None => TupleDomain::None,
            TupleDomain::Some(m) => {
                let mut out = HashMap::new();
                for (k, d) in m {
                    if let Some(k2) = f(k) {
                        out.insert(k2, d.clone());
                    }
                }
                TupleDomain::Some(out)
            }
        }
    }
}

impl TupleDomain<Symbol> {
    /// `toPredicate` (§3.4): conjunction of each column's predicate, restricted to the supplied
    /// type lookup (columns this core has no type for are skipped rather than panicking, since a
    /// constraint may outlive the scan's own symbol set after pruning).
    pub fn to_predicate(&self, types: impl Fn(Symbol) -> Option<DataType>) -> ExprImpl {
        match self {
            TupleDomain::None => ExprImpl::false_expr(),
            TupleDomain::Some(m) => {
                let mut conjuncts: Vec<ExprImpl> = m
                    .iter()
                    .filter_map(|(sym, domain)| {
                        let ty = types(*sym)?;
                        Some(domain.to_predicate(*sym, ty))
                    })
                    .collect();
                conjuncts.sort_by_key(|_| 0); // stable order not semantically required
                conjuncts
                    .into_iter()
                    .reduce(|a, b| a.and(b))
                    .unwrap_or_else(ExprImpl::true_expr)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use relplan_common::scalar::ScalarImpl;

    #[test]
    fn intersect_with_none_is_none() {
        let a: TupleDomain<String> = TupleDomain::all();
        let b: TupleDomain<String> = TupleDomain::none();
        assert!(a.intersect(&b).is_none());
    }

    #[test]
    fn simplify_collapses_past_the_discrete_limit() {
        let ranges = (0..(MAX_DISCRETE_VALUES as i32 + 1))
            .map(|i| Range::single(ScalarImpl::Int32(i)))
            .collect();
        let domain = Domain {
            data_type: DataType::Int32,
            ranges,
            null_allowed: false,
        }
        .simplify();
        assert_eq!(domain.ranges.len(), 1);
        assert!(!domain.ranges[0].is_single_value());
    }

    #[test]
    fn single_value_round_trips_through_predicate() {
        let domain = Domain::single_value(ScalarImpl::Int32(5));
        let sym = Symbol::from_raw(0);
        let pred = domain.to_predicate(sym, DataType::Int32);
        assert!(pred.as_equality().is_some());
    }
}
