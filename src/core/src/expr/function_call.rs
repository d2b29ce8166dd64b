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

/// The closed set of built-in operators plus the escape hatch (`Scalar`) for anything resolved by
/// the metadata collaborator's function signature (§6.1 `resolveFunction`/`resolveOperator`).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FunctionType {
    And,
    Or,
    Not,
    Equal,
    NotEqual,
    LessThan,
    LessThanOrEqual,
    GreaterThan,
    GreaterThanOrEqual,
    IsDistinctFrom,
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulus,
    Negate,
    IsNull,
    IsNotNull,
    Coalesce,
    Cast,
    Between,
    Like,
    In,
    Subscript,
    Row,
    /// An opaque, metadata-resolved scalar/table/aggregate function referenced by name; whether
    /// it's deterministic is a property of the resolved signature, carried on the `FunctionCall`
    /// itself rather than recomputed from the name every time.
    Named(&'static str),
}

impl FunctionType {
    pub fn is_comparison(self) -> bool {
        matches!(
            self,
            FunctionType::Equal
                | FunctionType::NotEqual
                | FunctionType::LessThan
                | FunctionType::LessThanOrEqual
                | FunctionType::GreaterThan
                | FunctionType::GreaterThanOrEqual
                | FunctionType::IsDistinctFrom
        )
    }

    /// The small set of built-in operators that are *always* deterministic regardless of their
    /// arguments. `Named` functions carry their own flag because only the metadata collaborator
    /// knows (e.g. `now()` vs `abs()`).
    fn builtin_is_deterministic(self) -> bool {
        !matches!(self, FunctionType::Named(_))
    }
}

/// A convenience alias used by callers that only care about binary comparisons/arithmetic.
pub type BinaryOp = FunctionType;

/// A function application: built-in operator or metadata-resolved named function (§3.3).
#[derive(Clone, PartialEq)]
pub struct FunctionCall {
    func_type: FunctionType,
    inputs: Vec<super::ExprImpl>,
    return_type: DataType,
    deterministic: bool,
    /// Set only for `Named` lambda-accepting higher-order functions: the bound parameter symbols
    /// of the lambda passed as (by convention) the last input.
    lambda_params: Option<Vec<Symbol>>,
}

impl FunctionCall {
    /// Construct a built-in operator call. The return type for comparisons/logical ops is
    /// `Boolean`; callers building arithmetic must supply the metadata-resolved common type via
    /// [`FunctionCall::new_with_type`].
    pub fn new(func_type: FunctionType, inputs: Vec<super::ExprImpl>) -> Self {
        let return_type = if func_type.is_comparison()
            || matches!(
                func_type,
                FunctionType::And
                    | FunctionType::Or
                    | FunctionType::Not
                    | FunctionType::IsNull
                    | FunctionType::IsNotNull
                    | FunctionType::Between
                    | FunctionType::Like
                    | FunctionType::In
            ) {
            DataType::Boolean
        } else {
            inputs
                .first()
                .map(|e| e.return_type())
                .unwrap_or(DataType::Boolean)
        };
        Self {
            func_type,
            inputs,
            return_type,
            deterministic: func_type.builtin_is_deterministic(),
            lambda_params: None,
        }
    }

    pub fn new_with_type(
        func_type: FunctionType,
        inputs: Vec<super::ExprImpl>,
        return_type: DataType,
    ) -> Self {
        Self {
            deterministic: func_type.builtin_is_deterministic(),
            func_type,
            inputs,
            return_type,
            lambda_params: None,
        }
    }

    /// Construct a metadata-resolved named function call. `deterministic` must come from the
    /// resolved `Signature` (§6.1); the core has no independent way to know.
    pub fn new_named(
        name: &'static str,
        inputs: Vec<super::ExprImpl>,
        return_type: DataType,
        deterministic: bool,
    ) -> Self {
        Self {
            func_type: FunctionType::Named(name),
            inputs,
            return_type,
            deterministic,
            lambda_params: None,
        }
    }

    pub fn with_lambda_params(mut self, params: Vec<Symbol>) -> Self {
        self.lambda_params = Some(params);
        self
    }

    pub fn func_type(&self) -> FunctionType {
        self.func_type
    }

    pub fn inputs(&self) -> &[super::ExprImpl] {
        &self.inputs
    }

    pub fn into_inputs(self) -> Vec<super::ExprImpl> {
        self.inputs
    }

    pub fn decompose(self) -> (FunctionType, Vec<super::ExprImpl>, DataType) {
        (self.func_type, self.inputs, self.return_type)
    }

    pub fn lambda_params(&self) -> Option<&[Symbol]> {
        self.lambda_params.as_deref()
    }

    /// Whether this call alone is deterministic (§3.3); a full-expression check additionally
    /// requires every descendant call to be deterministic too, which
    /// [`super::determinism::is_deterministic`] handles by recursing.
    pub fn is_deterministic(&self) -> bool {
        self.deterministic
    }
}

impl Expr for FunctionCall {
    fn return_type(&self) -> DataType {
        self.return_type.clone()
    }
}

impl fmt::Debug for FunctionCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}(", self.func_type)?;
        for (i, input) in self.inputs.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{input:?}")?;
        }
        write!(f, ")")
    }
}
