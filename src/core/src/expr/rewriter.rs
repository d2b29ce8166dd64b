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

use super::{Case, CaseWhenClause, Expr, ExprImpl, FunctionCall, Literal, Row, SymbolReference};

/// By default, `ExprRewriter` simply traverses the expression tree and leaves nodes unchanged.
/// Implementations override a subset of the `rewrite_*` methods to perform a transformation on
/// some particular kind of expression; `rewrite_expr` handles the structural recursion for
/// everything else. Every rewriter in this crate (constant folding, symbol substitution, unalias)
/// is built this way rather than hand-rolling its own traversal.
pub trait ExprRewriter {
    fn rewrite_expr(&mut self, expr: ExprImpl) -> ExprImpl {
        match expr {
            ExprImpl::Literal(inner) => self.rewrite_literal(*inner),
            ExprImpl::SymbolReference(inner) => self.rewrite_symbol_reference(*inner),
            ExprImpl::FunctionCall(inner) => self.rewrite_function_call(*inner),
            ExprImpl::Case(inner) => self.rewrite_case(*inner),
            ExprImpl::Row(inner) => self.rewrite_row(*inner),
            ExprImpl::Preplanning(inner) => (*inner).into(),
        }
    }

    fn rewrite_literal(&mut self, literal: Literal) -> ExprImpl {
        literal.into()
    }

    fn rewrite_symbol_reference(&mut self, symbol_reference: SymbolReference) -> ExprImpl {
        symbol_reference.into()
    }

    fn rewrite_function_call(&mut self, func_call: FunctionCall) -> ExprImpl {
        let lambda_params = func_call.lambda_params().map(<[_]>::to_vec);
        let (func_type, inputs, ret) = func_call.decompose();
        let inputs = inputs
            .into_iter()
            .map(|e| self.rewrite_expr(e))
            .collect();
        let mut rewritten = FunctionCall::new_with_type(func_type, inputs, ret);
        if let Some(params) = lambda_params {
            rewritten = rewritten.with_lambda_params(params);
        }
        rewritten.into()
    }

    fn rewrite_case(&mut self, case: Case) -> ExprImpl {
        let return_type = case.return_type();
        let when_clauses = case
            .when_clauses()
            .iter()
            .map(|clause| {
                CaseWhenClause::new(
                    self.rewrite_expr(clause.condition().clone()),
                    self.rewrite_expr(clause.result().clone()),
                )
            })
            .collect();
        let else_clause = case.else_clause().map(|e| self.rewrite_expr(e.clone()));
        Case::new(when_clauses, else_clause, return_type).into()
    }

    fn rewrite_row(&mut self, row: Row) -> ExprImpl {
        let return_type = row.return_type();
        let fields = row
            .fields()
            .iter()
            .map(|e| self.rewrite_expr(e.clone()))
            .collect();
        Row::new(fields, return_type).into()
    }
}
