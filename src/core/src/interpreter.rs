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

//! Expression interpreter / constant folder (§4.1). Given a bound expression and a resolver from
//! symbol to concrete value, either fully evaluates it or returns a smaller residual expression.
//! Every optimizer pass that needs to decide "is this predicate always true/false" or "can this
//! branch be dropped" goes through here rather than re-deriving SQL's three-valued logic itself.

use std::cell::RefCell;
use std::collections::HashMap;

use relplan_common::scalar::ScalarImpl;
use relplan_common::types::DataType;

use crate::expr::{
    Case, CaseWhenClause, Expr, ExprImpl, FunctionCall, FunctionType, Literal, Row,
};
use crate::symbol::Symbol;

/// Supplies concrete values for symbols during evaluation. `None` means "not bound" — the
/// expression stays symbolic rather than being evaluated to NULL.
pub trait Resolver {
    fn resolve(&self, symbol: Symbol) -> Option<relplan_common::scalar::Datum>;
}

/// A resolver that answers NULL for a fixed set of symbols and leaves everything else unbound —
/// exactly what predicate pushdown's outer-to-inner conversion (§4.4) needs to test "does this
/// predicate survive when the inner side is null-padded".
pub struct NullFor<'a>(pub &'a [Symbol]);

impl Resolver for NullFor<'_> {
    fn resolve(&self, symbol: Symbol) -> Option<relplan_common::scalar::Datum> {
        if self.0.contains(&symbol) {
            Some(None)
        } else {
            None
        }
    }
}

/// The result of [`optimize`]: either the expression collapsed to a concrete (possibly NULL)
/// value, or it's still a (possibly smaller) residual expression.
#[derive(Clone, Debug, PartialEq)]
pub enum Outcome {
    Value(relplan_common::scalar::Datum, DataType),
    Expression(ExprImpl),
}

impl Outcome {
    pub fn as_expr(&self) -> ExprImpl {
        match self {
            Outcome::Value(v, ty) => Literal::new(v.clone(), ty.clone()).into(),
            Outcome::Expression(e) => e.clone(),
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Outcome::Value(Some(ScalarImpl::Bool(b)), _) => Some(*b),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Outcome::Value(None, _))
    }

    fn value(v: relplan_common::scalar::Datum, ty: DataType) -> Self {
        Outcome::Value(v, ty)
    }

    fn bool_value(b: Option<bool>) -> Self {
        Outcome::Value(b.map(ScalarImpl::Bool), DataType::Boolean)
    }
}

/// Entry point (§4.1 `optimize(expr, resolver)`). Free of any per-call allocation beyond the
/// residual expression itself; [`Interpreter`] additionally caches compiled `LIKE` patterns across
/// many calls within one pass.
pub fn optimize(expr: &ExprImpl, resolver: &dyn Resolver) -> Outcome {
    Interpreter::default().optimize(expr, resolver)
}

/// Stateful wrapper around [`optimize`] that caches compiled `LIKE` patterns for the lifetime of
/// one optimizer pass (§9 "global interpreter caches → per-query identity-keyed caches"; here keyed
/// by pattern text rather than node address, which is sound since patterns are immutable literals
/// and avoids depending on expression node identity surviving cloning).
#[derive(Default)]
pub struct Interpreter {
    like_cache: RefCell<HashMap<String, fancy_regex::Regex>>,
}

impl Interpreter {
    pub fn optimize(&self, expr: &ExprImpl, resolver: &dyn Resolver) -> Outcome {
        match expr {
            ExprImpl::Literal(l) => Outcome::value(l.value().clone(), l.return_type()),
            ExprImpl::SymbolReference(r) => match resolver.resolve(r.symbol()) {
                Some(v) => Outcome::value(v, r.return_type()),
                None => Outcome::Expression(expr.clone()),
            },
            ExprImpl::FunctionCall(call) => self.optimize_call(call, resolver),
            ExprImpl::Case(case) => self.optimize_case(case, resolver),
            ExprImpl::Row(row) => self.optimize_row(row, resolver),
            ExprImpl::Preplanning(_) => Outcome::Expression(expr.clone()),
        }
    }

    fn optimize_case(&self, case: &Case, resolver: &dyn Resolver) -> Outcome {
        let mut residual_clauses = Vec::new();
        for clause in case.when_clauses() {
            let cond = self.optimize(clause.condition(), resolver);
            match cond.as_bool() {
                Some(true) => {
                    let result = self.optimize(clause.result(), resolver);
                    if residual_clauses.is_empty() {
                        return result;
                    }
                    // An earlier clause was unresolved; this TRUE clause becomes the residual's
                    // ELSE since every later one is now unreachable.
                    return Outcome::Expression(
                        Case::new(residual_clauses, Some(result.as_expr()), case.return_type())
                            .into(),
                    );
                }
                Some(false) => continue,
                None if cond.is_null() => continue,
                None => {
                    let result = self.optimize(clause.result(), resolver);
                    residual_clauses.push(CaseWhenClause::new(cond.as_expr(), result.as_expr()));
                }
            }
        }
        if residual_clauses.is_empty() {
            return match case.else_clause() {
                Some(e) => self.optimize(e, resolver),
                None => Outcome::value(None, case.return_type()),
            };
        }
        let else_clause = case.else_clause().map(|e| self.optimize(e, resolver).as_expr());
        Outcome::Expression(Case::new(residual_clauses, else_clause, case.return_type()).into())
    }

    fn optimize_row(&self, row: &Row, resolver: &dyn Resolver) -> Outcome {
        let outcomes: Vec<Outcome> = row.fields().iter().map(|f| self.optimize(f, resolver)).collect();
        if outcomes.iter().all(|o| matches!(o, Outcome::Value(..))) {
            let values = outcomes
                .into_iter()
                .map(|o| match o {
                    Outcome::Value(v, _) => v,
                    Outcome::Expression(_) => unreachable!(),
                })
                .collect();
            Outcome::value(Some(ScalarImpl::Struct(values)), row.return_type())
        } else {
            let fields = outcomes.into_iter().map(|o| o.as_expr()).collect();
            Outcome::Expression(Row::new(fields, row.return_type()).into())
        }
    }

    fn optimize_call(&self, call: &FunctionCall, resolver: &dyn Resolver) -> Outcome {
        match call.func_type() {
            FunctionType::And => self.optimize_and(call, resolver),
            FunctionType::Or => self.optimize_or(call, resolver),
            FunctionType::Not => self.optimize_not(call, resolver),
            FunctionType::IsNull => self.optimize_is_null(call, resolver, true),
            FunctionType::IsNotNull => self.optimize_is_null(call, resolver, false),
            FunctionType::Like => self.optimize_like(call, resolver),
            FunctionType::Coalesce => self.optimize_coalesce(call, resolver),
            FunctionType::Cast => self.optimize_cast(call, resolver),
            FunctionType::In => self.optimize_in(call, resolver),
            FunctionType::Between => self.optimize_between(call, resolver),
            FunctionType::Named(_) | FunctionType::Row | FunctionType::Subscript => {
                self.optimize_opaque(call, resolver)
            }
            _ => self.optimize_scalar(call, resolver),
        }
    }

    fn optimize_and(&self, call: &FunctionCall, resolver: &dyn Resolver) -> Outcome {
        let outcomes: Vec<Outcome> = call.inputs().iter().map(|i| self.optimize(i, resolver)).collect();
        if outcomes.iter().any(|o| o.as_bool() == Some(false)) {
            return Outcome::bool_value(Some(false));
        }
        let mut saw_null = false;
        let mut residual = Vec::new();
        for o in outcomes {
            match o.as_bool() {
                Some(true) => {}
                None if o.is_null() => saw_null = true,
                _ => residual.push(o.as_expr()),
            }
        }
        if residual.is_empty() {
            return Outcome::bool_value(if saw_null { None } else { Some(true) });
        }
        if saw_null {
            residual.push(Literal::new(None, DataType::Boolean).into());
        }
        Outcome::Expression(crate::expr::conjunction(residual))
    }

    fn optimize_or(&self, call: &FunctionCall, resolver: &dyn Resolver) -> Outcome {
        let outcomes: Vec<Outcome> = call.inputs().iter().map(|i| self.optimize(i, resolver)).collect();
        if outcomes.iter().any(|o| o.as_bool() == Some(true)) {
            return Outcome::bool_value(Some(true));
        }
        let mut saw_null = false;
        let mut residual = Vec::new();
        for o in outcomes {
            match o.as_bool() {
                Some(false) => {}
                None if o.is_null() => saw_null = true,
                _ => residual.push(o.as_expr()),
            }
        }
        if residual.is_empty() {
            return Outcome::bool_value(if saw_null { None } else { Some(false) });
        }
        let mut iter = residual.into_iter();
        let first = iter.next().unwrap();
        let folded = iter.fold(first, |a, b| a.or(b));
        if saw_null {
            return Outcome::Expression(folded.or(Literal::new(None, DataType::Boolean).into()));
        }
        Outcome::Expression(folded)
    }

    fn optimize_not(&self, call: &FunctionCall, resolver: &dyn Resolver) -> Outcome {
        let inner = self.optimize(&call.inputs()[0], resolver);
        match inner.as_bool() {
            Some(b) => Outcome::bool_value(Some(!b)),
            None if inner.is_null() => Outcome::bool_value(None),
            None => Outcome::Expression(inner.as_expr().not()),
        }
    }

    fn optimize_is_null(&self, call: &FunctionCall, resolver: &dyn Resolver, want_null: bool) -> Outcome {
        let inner = self.optimize(&call.inputs()[0], resolver);
        match &inner {
            Outcome::Value(v, _) => Outcome::bool_value(Some(v.is_none() == want_null)),
            Outcome::Expression(e) => Outcome::Expression(if want_null {
                e.clone().is_null()
            } else {
                FunctionCall::new(FunctionType::IsNotNull, vec![e.clone()]).into()
            }),
        }
    }

    fn optimize_coalesce(&self, call: &FunctionCall, resolver: &dyn Resolver) -> Outcome {
        let mut residual = Vec::new();
        for input in call.inputs() {
            let o = self.optimize(input, resolver);
            match &o {
                Outcome::Value(Some(_), _) => return o,
                Outcome::Value(None, _) => continue,
                Outcome::Expression(e) => residual.push(e.clone()),
            }
        }
        if residual.is_empty() {
            return Outcome::value(None, call.return_type());
        }
        Outcome::Expression(
            FunctionCall::new_with_type(FunctionType::Coalesce, residual, call.return_type()).into(),
        )
    }

    /// `CAST` requires the metadata-resolved scalar implementation (§6.1) to actually convert
    /// between representations, which this core does not execute. NULL still folds through; a
    /// concrete non-null value keeps the cast expression wrapped around its now-literal input
    /// rather than guessing at the target representation.
    fn optimize_cast(&self, call: &FunctionCall, resolver: &dyn Resolver) -> Outcome {
        let inner = self.optimize(&call.inputs()[0], resolver);
        match &inner {
            Outcome::Value(None, _) => Outcome::value(None, call.return_type()),
            Outcome::Value(_, ty) if ty.matches(&call.return_type()) => inner,
            _ => Outcome::Expression(
                FunctionCall::new_with_type(FunctionType::Cast, vec![inner.as_expr()], call.return_type())
                    .into(),
            ),
        }
    }

    fn optimize_between(&self, call: &FunctionCall, resolver: &dyn Resolver) -> Outcome {
        let [value, low, high] = match call.inputs() {
            [a, b, c] => [a, b, c],
            _ => return self.optimize_opaque(call, resolver),
        };
        let ge = FunctionCall::new(FunctionType::GreaterThanOrEqual, vec![value.clone(), low.clone()]);
        let le = FunctionCall::new(FunctionType::LessThanOrEqual, vec![value.clone(), high.clone()]);
        self.optimize_and(
            &FunctionCall::new(FunctionType::And, vec![ge.into(), le.into()]),
            resolver,
        )
    }

    fn optimize_in(&self, call: &FunctionCall, resolver: &dyn Resolver) -> Outcome {
        let Some((probe, candidates)) = call.inputs().split_first() else {
            return self.optimize_opaque(call, resolver);
        };
        let probe_outcome = self.optimize(probe, resolver);
        let Outcome::Value(probe_value, _) = &probe_outcome else {
            return self.optimize_opaque(call, resolver);
        };
        if probe_value.is_none() {
            return Outcome::bool_value(None);
        }
        let probe_value = probe_value.as_ref().unwrap();
        let mut saw_unknown = false;
        for candidate in candidates {
            let c = self.optimize(candidate, resolver);
            match &c {
                Outcome::Value(Some(v), _) => {
                    if probe_value.partial_cmp_scalar(v) == Some(std::cmp::Ordering::Equal) {
                        return Outcome::bool_value(Some(true));
                    }
                }
                Outcome::Value(None, _) => saw_unknown = true,
                Outcome::Expression(_) => saw_unknown = true,
            }
        }
        Outcome::bool_value(if saw_unknown { None } else { Some(false) })
    }

    /// `x LIKE 'literal'` with no wildcard rewrites to `x = 'literal'` (§4.1). Otherwise, once
    /// both the pattern and the probe value are known, compile (or reuse a cached compilation of)
    /// the pattern and test it directly; if either side is still symbolic, only the folded
    /// sub-inputs are substituted back in.
    fn optimize_like(&self, call: &FunctionCall, resolver: &dyn Resolver) -> Outcome {
        let [value, pattern] = match call.inputs() {
            [a, b] => [a, b],
            _ => return self.optimize_opaque(call, resolver),
        };
        let value_outcome = self.optimize(value, resolver);
        let pattern_outcome = self.optimize(pattern, resolver);
        let pattern_text = match &pattern_outcome {
            Outcome::Value(Some(ScalarImpl::Utf8(s)), _) => Some(s.to_string()),
            _ => None,
        };
        if let Some(pattern_text) = &pattern_text {
            if !pattern_text.contains('%') && !pattern_text.contains('_') {
                let lit: ExprImpl =
                    Literal::new(Some(ScalarImpl::Utf8(pattern_text.as_str().into())), DataType::Varchar)
                        .into();
                return self.optimize_scalar(
                    &FunctionCall::new(FunctionType::Equal, vec![value_outcome.as_expr(), lit]),
                    resolver,
                );
            }
        }
        match (&value_outcome, pattern_text) {
            (Outcome::Value(Some(ScalarImpl::Utf8(s)), _), Some(pattern_text)) => {
                let matched = self.match_like(s, &pattern_text);
                Outcome::bool_value(Some(matched))
            }
            (Outcome::Value(None, _), _) => Outcome::bool_value(None),
            _ => Outcome::Expression(
                FunctionCall::new(FunctionType::Like, vec![value_outcome.as_expr(), pattern_outcome.as_expr()])
                    .into(),
            ),
        }
    }

    fn match_like(&self, value: &str, pattern: &str) -> bool {
        let mut cache = self.like_cache.borrow_mut();
        let regex = cache.entry(pattern.to_string()).or_insert_with(|| {
            fancy_regex::Regex::new(&like_pattern_to_regex(pattern)).expect("SQL LIKE pattern always compiles")
        });
        regex.is_match(value).unwrap_or(false)
    }

    /// Opaque/metadata-resolved functions (`Named`) and structural ones this interpreter has no
    /// implementation for: never folds to a value, only recurses into its inputs so nested
    /// constant subexpressions still collapse.
    fn optimize_opaque(&self, call: &FunctionCall, resolver: &dyn Resolver) -> Outcome {
        let inputs = call.inputs().iter().map(|i| self.optimize(i, resolver).as_expr()).collect();
        let rebuilt = match call.func_type() {
            FunctionType::Named(name) => {
                FunctionCall::new_named(name, inputs, call.return_type(), call.is_deterministic())
            }
            other => FunctionCall::new_with_type(other, inputs, call.return_type()),
        };
        Outcome::Expression(rebuilt.into())
    }

    /// Comparisons and arithmetic (§4.1): NULL propagates unless the operator is
    /// `IS DISTINCT FROM`; evaluation failures (division/modulus by zero) defer to a wrapped
    /// `fail(json_parse(...))` call rather than raising here (§4.1 "Failure handling").
    fn optimize_scalar(&self, call: &FunctionCall, resolver: &dyn Resolver) -> Outcome {
        let outcomes: Vec<Outcome> = call.inputs().iter().map(|i| self.optimize(i, resolver)).collect();
        if !outcomes.iter().all(|o| matches!(o, Outcome::Value(..))) {
            let inputs = outcomes.into_iter().map(|o| o.as_expr()).collect();
            return Outcome::Expression(
                FunctionCall::new_with_type(call.func_type(), inputs, call.return_type()).into(),
            );
        }
        let values: Vec<relplan_common::scalar::Datum> = outcomes
            .into_iter()
            .map(|o| match o {
                Outcome::Value(v, _) => v,
                Outcome::Expression(_) => unreachable!(),
            })
            .collect();

        if call.func_type() != FunctionType::IsDistinctFrom && values.iter().any(Option::is_none) {
            return Outcome::value(None, call.return_type());
        }

        match eval_scalar(call.func_type(), &values, &call.return_type()) {
            Ok(v) => Outcome::value(v, call.return_type()),
            Err(failure) => Outcome::Expression(deferred_failure(failure, call.return_type())),
        }
    }
}

/// Evaluates a built-in scalar operator over fully-resolved (non-`IsDistinctFrom`-null-short-
/// circuited) operands.
fn eval_scalar(
    func: FunctionType,
    values: &[relplan_common::scalar::Datum],
    return_type: &DataType,
) -> std::result::Result<relplan_common::scalar::Datum, String> {
    use FunctionType::*;
    match func {
        IsDistinctFrom => {
            let (a, b) = (&values[0], &values[1]);
            let distinct = match (a, b) {
                (None, None) => false,
                (None, Some(_)) | (Some(_), None) => true,
                (Some(a), Some(b)) => a.partial_cmp_scalar(b) != Some(std::cmp::Ordering::Equal),
            };
            Ok(Some(ScalarImpl::Bool(distinct)))
        }
        Equal | NotEqual | LessThan | LessThanOrEqual | GreaterThan | GreaterThanOrEqual => {
            let a = values[0].as_ref().expect("NULL already short-circuited");
            let b = values[1].as_ref().expect("NULL already short-circuited");
            let ord = a
                .partial_cmp_scalar(b)
                .ok_or_else(|| format!("{a:?} and {b:?} are not comparable"))?;
            let result = match func {
                Equal => ord == std::cmp::Ordering::Equal,
                NotEqual => ord != std::cmp::Ordering::Equal,
                LessThan => ord == std::cmp::Ordering::Less,
                LessThanOrEqual => ord != std::cmp::Ordering::Greater,
                GreaterThan => ord == std::cmp::Ordering::Greater,
                GreaterThanOrEqual => ord != std::cmp::Ordering::Less,
                _ => unreachable!(),
            };
            Ok(Some(ScalarImpl::Bool(result)))
        }
        Add | Subtract | Multiply | Divide | Modulus => {
            let a = values[0].as_ref().expect("NULL already short-circuited");
            let b = values[1].as_ref().expect("NULL already short-circuited");
            eval_arith(func, a, b)
        }
        Negate => {
            let a = values[0].as_ref().expect("NULL already short-circuited");
            eval_negate(a)
        }
        Subscript | Row => Err(format!("{func:?} has no constant-folding implementation")),
        _ => {
            let _ = return_type;
            Err(format!("{func:?} has no constant-folding implementation"))
        }
    }
}

macro_rules! arith_numeric {
    ($a:expr, $b:expr, $op:tt, $checked:ident, $variant:ident) => {
        match $a.$checked(*$b) {
            Some(v) => Ok(Some(ScalarImpl::$variant(v))),
            None => Err(format!("arithmetic overflow evaluating {} {} {}", $a, stringify!($op), $b)),
        }
    };
}

fn eval_arith(
    func: FunctionType,
    a: &ScalarImpl,
    b: &ScalarImpl,
) -> std::result::Result<relplan_common::scalar::Datum, String> {
    use FunctionType::*;
    match (a, b) {
        (ScalarImpl::Int32(a), ScalarImpl::Int32(b)) => match func {
            Add => arith_numeric!(a, b, +, checked_add, Int32),
            Subtract => arith_numeric!(a, b, -, checked_sub, Int32),
            Multiply => arith_numeric!(a, b, *, checked_mul, Int32),
            Divide if *b == 0 => Err("division by zero".to_string()),
            Divide => Ok(Some(ScalarImpl::Int32(a / b))),
            Modulus if *b == 0 => Err("division by zero".to_string()),
            Modulus => Ok(Some(ScalarImpl::Int32(a % b))),
            _ => unreachable!(),
        },
        (ScalarImpl::Int64(a), ScalarImpl::Int64(b)) => match func {
            Add => arith_numeric!(a, b, +, checked_add, Int64),
            Subtract => arith_numeric!(a, b, -, checked_sub, Int64),
            Multiply => arith_numeric!(a, b, *, checked_mul, Int64),
            Divide if *b == 0 => Err("division by zero".to_string()),
            Divide => Ok(Some(ScalarImpl::Int64(a / b))),
            Modulus if *b == 0 => Err("division by zero".to_string()),
            Modulus => Ok(Some(ScalarImpl::Int64(a % b))),
            _ => unreachable!(),
        },
        (ScalarImpl::Float64(a), ScalarImpl::Float64(b)) => {
            let (a, b) = (a.into_inner(), b.into_inner());
            let v = match func {
                Add => a + b,
                Subtract => a - b,
                Multiply => a * b,
                Divide => a / b,
                Modulus => a % b,
                _ => unreachable!(),
            };
            Ok(Some(ScalarImpl::Float64(ordered_float::OrderedFloat(v))))
        }
        (ScalarImpl::Decimal(a), ScalarImpl::Decimal(b)) => {
            let v = match func {
                Add => *a + *b,
                Subtract => *a - *b,
                Multiply => *a * *b,
                Divide if b.is_zero() => return Err("division by zero".to_string()),
                Divide => *a / *b,
                Modulus if b.is_zero() => return Err("division by zero".to_string()),
                Modulus => *a % *b,
                _ => unreachable!(),
            };
            Ok(Some(ScalarImpl::Decimal(v)))
        }
        _ => Err(format!("{func:?} has no implementation for {a:?}, {b:?}")),
    }
}

fn eval_negate(a: &ScalarImpl) -> std::result::Result<relplan_common::scalar::Datum, String> {
    match a {
        ScalarImpl::Int16(v) => Ok(Some(ScalarImpl::Int16(-v))),
        ScalarImpl::Int32(v) => Ok(Some(ScalarImpl::Int32(-v))),
        ScalarImpl::Int64(v) => Ok(Some(ScalarImpl::Int64(-v))),
        ScalarImpl::Float32(v) => Ok(Some(ScalarImpl::Float32(-*v))),
        ScalarImpl::Float64(v) => Ok(Some(ScalarImpl::Float64(-*v))),
        ScalarImpl::Decimal(v) => Ok(Some(ScalarImpl::Decimal(-*v))),
        other => Err(format!("NEGATE has no implementation for {other:?}")),
    }
}

/// Wraps an evaluation failure into a deferred `fail(json_parse(<message>))` call (§4.1, §7) so
/// short-circuit semantics are preserved: the error only actually raises when the executor reaches
/// that branch at runtime, not when this pass happens to fold the branch containing it.
fn deferred_failure(message: String, return_type: DataType) -> ExprImpl {
    let payload: ExprImpl =
        Literal::new(Some(ScalarImpl::Utf8(message.into_boxed_str())), DataType::Varchar).into();
    let json = FunctionCall::new_named("json_parse", vec![payload], DataType::Jsonb, true);
    FunctionCall::new_named("fail", vec![json.into()], return_type, true).into()
}

/// Translates a SQL `LIKE` pattern (`%` = any run, `_` = any one character, `\` escapes the next
/// character) into an anchored regex.
fn like_pattern_to_regex(pattern: &str) -> String {
    let mut out = String::with_capacity(pattern.len() * 2 + 2);
    out.push('^');
    let mut chars = pattern.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '%' => out.push_str(".*"),
            '_' => out.push('.'),
            '\\' => {
                if let Some(next) = chars.next() {
                    escape_regex_char(next, &mut out);
                }
            }
            other => escape_regex_char(other, &mut out),
        }
    }
    out.push('$');
    out
}

/// Escapes a literal character for inclusion in a regex, since `fancy_regex` exposes no
/// string-escaping helper of its own.
fn escape_regex_char(c: char, out: &mut String) {
    if "\\.+*?()|[]{}^$".contains(c) {
        out.push('\\');
    }
    out.push(c);
}

#[cfg(test)]
mod tests {
    use relplan_common::types::DataType;

    use super::*;
    use crate::expr::SymbolReference;
    use crate::symbol::SymbolAllocator;

    struct Empty;
    impl Resolver for Empty {
        fn resolve(&self, _symbol: Symbol) -> Option<relplan_common::scalar::Datum> {
            None
        }
    }

    #[test]
    fn and_with_false_short_circuits_regardless_of_other_operand() {
        let sym = SymbolAllocator::new().fresh("x", DataType::Boolean);
        let unresolved: ExprImpl = SymbolReference::new(sym, DataType::Boolean).into();
        let expr = ExprImpl::false_expr().and(unresolved);
        assert_eq!(optimize(&expr, &Empty).as_bool(), Some(false));
    }

    #[test]
    fn or_with_true_short_circuits() {
        let sym = SymbolAllocator::new().fresh("x", DataType::Boolean);
        let unresolved: ExprImpl = SymbolReference::new(sym, DataType::Boolean).into();
        let expr = ExprImpl::true_expr().or(unresolved);
        assert_eq!(optimize(&expr, &Empty).as_bool(), Some(true));
    }

    #[test]
    fn null_and_false_is_false() {
        let expr = ExprImpl::null(DataType::Boolean).and(ExprImpl::false_expr());
        assert_eq!(optimize(&expr, &Empty).as_bool(), Some(false));
    }

    #[test]
    fn null_and_true_is_null() {
        let expr = ExprImpl::null(DataType::Boolean).and(ExprImpl::true_expr());
        assert!(optimize(&expr, &Empty).is_null());
    }

    #[test]
    fn arithmetic_division_by_zero_defers_to_fail() {
        let a: ExprImpl = Literal::new(Some(ScalarImpl::Int32(1)), DataType::Int32).into();
        let b: ExprImpl = Literal::new(Some(ScalarImpl::Int32(0)), DataType::Int32).into();
        let expr: ExprImpl = FunctionCall::new(FunctionType::Divide, vec![a, b]).into();
        let outcome = optimize(&expr, &Empty);
        match outcome {
            Outcome::Expression(e) => {
                let call = e.as_function_call().unwrap();
                assert_eq!(call.func_type(), FunctionType::Named("fail"));
            }
            Outcome::Value(..) => panic!("expected a deferred failure expression"),
        }
    }

    #[test]
    fn like_without_wildcards_rewrites_to_equality() {
        let sym = SymbolAllocator::new().fresh("x", DataType::Varchar);
        let value: ExprImpl = SymbolReference::new(sym, DataType::Varchar).into();
        let pattern: ExprImpl =
            Literal::new(Some(ScalarImpl::Utf8("abc".into())), DataType::Varchar).into();
        let expr: ExprImpl = FunctionCall::new(FunctionType::Like, vec![value, pattern]).into();
        let outcome = optimize(&expr, &Empty);
        match outcome {
            Outcome::Expression(e) => assert_eq!(e.as_function_call().unwrap().func_type(), FunctionType::Equal),
            Outcome::Value(..) => panic!("expected a residual equality expression"),
        }
    }

    #[test]
    fn like_with_wildcard_matches_concrete_value() {
        let value: ExprImpl =
            Literal::new(Some(ScalarImpl::Utf8("hello world".into())), DataType::Varchar).into();
        let pattern: ExprImpl =
            Literal::new(Some(ScalarImpl::Utf8("hello%".into())), DataType::Varchar).into();
        let expr: ExprImpl = FunctionCall::new(FunctionType::Like, vec![value, pattern]).into();
        assert_eq!(optimize(&expr, &Empty).as_bool(), Some(true));
    }

    #[test]
    fn case_picks_first_true_branch() {
        let when_true = CaseWhenClause::new(
            ExprImpl::true_expr(),
            Literal::new(Some(ScalarImpl::Int32(1)), DataType::Int32).into(),
        );
        let when_unreached = CaseWhenClause::new(
            ExprImpl::true_expr(),
            Literal::new(Some(ScalarImpl::Int32(2)), DataType::Int32).into(),
        );
        let case = Case::new(vec![when_true, when_unreached], None, DataType::Int32);
        let outcome = optimize(&case.into(), &Empty);
        assert_eq!(outcome, Outcome::Value(Some(ScalarImpl::Int32(1)), DataType::Int32));
    }
}
