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

//! The expression tree (§3.3): an independent algebra from the plan IR, referenced from `Filter`,
//! `Project`, `Join`, and every other node that carries scalar computation.

mod case;
mod determinism;
mod function_call;
mod literal;
mod rewriter;
mod row;
mod subquery;
mod symbol_reference;
mod visitor;

pub use case::{Case, CaseWhenClause};
pub use determinism::{filter_deterministic_conjuncts, is_deterministic};
pub use function_call::{BinaryOp, FunctionCall, FunctionType};
pub use literal::Literal;
pub use rewriter::ExprRewriter;
pub use row::Row;
pub use subquery::{PreplanningExpr, QuantifiedComparisonType};
pub use symbol_reference::SymbolReference;
pub use visitor::ExprVisitor;

use relplan_common::types::DataType;
use rustc_hash::FxHashSet;

use crate::symbol::Symbol;

/// The shared trait every expression variant implements: its own SQL type and whether every
/// function call reachable from it is marked deterministic (§3.3).
pub trait Expr {
    fn return_type(&self) -> DataType;
}

/// A node in the expression tree. Closed set of tagged variants (§9: "visitor pattern... →
/// tagged variants"); adding a new expression kind means adding a variant here and a match arm
/// everywhere a `match` is currently exhaustive (the compiler enforces this).
#[derive(Clone, PartialEq)]
pub enum ExprImpl {
    Literal(Box<Literal>),
    SymbolReference(Box<SymbolReference>),
    FunctionCall(Box<FunctionCall>),
    Case(Box<Case>),
    Row(Box<Row>),
    /// `Subquery`/`Exists`/`QuantifiedComparison`: present only pre-planning. §6.3 requires these
    /// to be gone by the time predicate pushdown runs; retained here only so the desugaring step
    /// (an external collaborator boundary) has something to desugar *from*.
    Preplanning(Box<PreplanningExpr>),
}

impl Expr for ExprImpl {
    fn return_type(&self) -> DataType {
        match self {
            ExprImpl::Literal(e) => e.return_type(),
            ExprImpl::SymbolReference(e) => e.return_type(),
            ExprImpl::FunctionCall(e) => e.return_type(),
            ExprImpl::Case(e) => e.return_type(),
            ExprImpl::Row(e) => e.return_type(),
            ExprImpl::Preplanning(e) => e.return_type(),
        }
    }
}

impl std::fmt::Debug for ExprImpl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExprImpl::Literal(e) => write!(f, "{e:?}"),
            ExprImpl::SymbolReference(e) => write!(f, "{e:?}"),
            ExprImpl::FunctionCall(e) => write!(f, "{e:?}"),
            ExprImpl::Case(e) => write!(f, "{e:?}"),
            ExprImpl::Row(e) => write!(f, "{e:?}"),
            ExprImpl::Preplanning(e) => write!(f, "{e:?}"),
        }
    }
}

impl From<Literal> for ExprImpl {
    fn from(v: Literal) -> Self {
        ExprImpl::Literal(Box::new(v))
    }
}
impl From<SymbolReference> for ExprImpl {
    fn from(v: SymbolReference) -> Self {
        ExprImpl::SymbolReference(Box::new(v))
    }
}
impl From<FunctionCall> for ExprImpl {
    fn from(v: FunctionCall) -> Self {
        ExprImpl::FunctionCall(Box::new(v))
    }
}
impl From<Case> for ExprImpl {
    fn from(v: Case) -> Self {
        ExprImpl::Case(Box::new(v))
    }
}
impl From<Row> for ExprImpl {
    fn from(v: Row) -> Self {
        ExprImpl::Row(Box::new(v))
    }
}
impl From<PreplanningExpr> for ExprImpl {
    fn from(v: PreplanningExpr) -> Self {
        ExprImpl::Preplanning(Box::new(v))
    }
}

impl ExprImpl {
    pub fn literal_bool(v: bool) -> Self {
        Literal::new(Some(relplan_common::scalar::ScalarImpl::Bool(v)), DataType::Boolean).into()
    }

    pub fn true_expr() -> Self {
        Self::literal_bool(true)
    }

    pub fn false_expr() -> Self {
        Self::literal_bool(false)
    }

    pub fn null(data_type: DataType) -> Self {
        Literal::new(None, data_type).into()
    }

    pub fn as_literal(&self) -> Option<&Literal> {
        match self {
            ExprImpl::Literal(l) => Some(l),
            _ => None,
        }
    }

    pub fn as_symbol_reference(&self) -> Option<&SymbolReference> {
        match self {
            ExprImpl::SymbolReference(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_function_call(&self) -> Option<&FunctionCall> {
        match self {
            ExprImpl::FunctionCall(f) => Some(f),
            _ => None,
        }
    }

    /// `true` for the literal `TRUE`.
    pub fn is_true_literal(&self) -> bool {
        matches!(self.as_literal(), Some(l) if l.as_bool() == Some(true))
    }

    /// `true` for the literal `FALSE`.
    pub fn is_false_literal(&self) -> bool {
        matches!(self.as_literal(), Some(l) if l.as_bool() == Some(false))
    }

    /// `true` for the literal `NULL`.
    pub fn is_null_literal(&self) -> bool {
        matches!(self.as_literal(), Some(l) if l.is_null())
    }

    pub fn and(self, other: ExprImpl) -> ExprImpl {
        FunctionCall::new(FunctionType::And, vec![self, other]).into()
    }

    pub fn or(self, other: ExprImpl) -> ExprImpl {
        FunctionCall::new(FunctionType::Or, vec![self, other]).into()
    }

    pub fn not(self) -> ExprImpl {
        FunctionCall::new(FunctionType::Not, vec![self]).into()
    }

    pub fn eq(self, other: ExprImpl) -> ExprImpl {
        FunctionCall::new(FunctionType::Equal, vec![self, other]).into()
    }

    pub fn is_null(self) -> ExprImpl {
        FunctionCall::new(FunctionType::IsNull, vec![self]).into()
    }

    /// `true` iff this is a comparison `a = b` between two deterministic subexpressions — the
    /// only shape [`crate::equality_inference::EqualityInference`] (§4.2) consumes.
    pub fn as_equality(&self) -> Option<(&ExprImpl, &ExprImpl)> {
        let call = self.as_function_call()?;
        if call.func_type() == FunctionType::Equal {
            Some((&call.inputs()[0], &call.inputs()[1]))
        } else {
            None
        }
    }

    /// Splits a conjunction (`a AND b AND c`) into its top-level conjuncts. Non-`AND` expressions
    /// are a one-element list of themselves.
    pub fn conjuncts(&self) -> Vec<ExprImpl> {
        let mut out = Vec::new();
        collect_conjuncts(self, &mut out);
        out
    }

    /// Free symbols referenced anywhere in this expression tree.
    pub fn free_symbols(&self) -> FxHashSet<Symbol> {
        struct Collector(FxHashSet<Symbol>);
        impl ExprVisitor for Collector {
            fn visit_symbol_reference(&mut self, expr: &SymbolReference) {
                self.0.insert(expr.symbol());
            }
        }
        let mut c = Collector(FxHashSet::default());
        c.visit_expr(self);
        c.0
    }
}

fn collect_conjuncts(expr: &ExprImpl, out: &mut Vec<ExprImpl>) {
    if let Some(call) = expr.as_function_call() {
        if call.func_type() == FunctionType::And {
            for input in call.inputs() {
                collect_conjuncts(input, out);
            }
            return;
        }
    }
    out.push(expr.clone());
}

/// Build the conjunction (`AND`) of a (possibly empty) list of conjuncts. Empty ⇒ `TRUE`.
pub fn conjunction(conjuncts: impl IntoIterator<Item = ExprImpl>) -> ExprImpl {
    let mut iter = conjuncts.into_iter();
    let Some(first) = iter.next() else {
        return ExprImpl::true_expr();
    };
    iter.fold(first, |acc, next| acc.and(next))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conjuncts_flatten_nested_and() {
        let a = ExprImpl::literal_bool(true);
        let b = ExprImpl::literal_bool(false);
        let c = ExprImpl::literal_bool(true);
        let expr = a.and(b).and(c);
        assert_eq!(expr.conjuncts().len(), 3);
    }

    #[test]
    fn conjunction_of_empty_is_true() {
        assert!(conjunction(std::iter::empty()).is_true_literal());
    }
}
