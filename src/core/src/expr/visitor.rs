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

use super::{Case, ExprImpl, FunctionCall, Literal, Row, SymbolReference};

/// A read-only counterpart to [`super::ExprRewriter`]: traverses the tree without producing a new
/// one, used wherever a pass only needs to *observe* (collecting free symbols, checking
/// determinism) rather than transform.
pub trait ExprVisitor {
    fn visit_expr(&mut self, expr: &ExprImpl) {
        match expr {
            ExprImpl::Literal(inner) => self.visit_literal(inner),
            ExprImpl::SymbolReference(inner) => self.visit_symbol_reference(inner),
            ExprImpl::FunctionCall(inner) => self.visit_function_call(inner),
            ExprImpl::Case(inner) => self.visit_case(inner),
            ExprImpl::Row(inner) => self.visit_row(inner),
            ExprImpl::Preplanning(_) => {}
        }
    }

    fn visit_literal(&mut self, _literal: &Literal) {}

    fn visit_symbol_reference(&mut self, _symbol_reference: &SymbolReference) {}

    fn visit_function_call(&mut self, func_call: &FunctionCall) {
        for input in func_call.inputs() {
            self.visit_expr(input);
        }
    }

    fn visit_case(&mut self, case: &Case) {
        for clause in case.when_clauses() {
            self.visit_expr(clause.condition());
            self.visit_expr(clause.result());
        }
        if let Some(e) = case.else_clause() {
            self.visit_expr(e);
        }
    }

    fn visit_row(&mut self, row: &Row) {
        for field in row.fields() {
            self.visit_expr(field);
        }
    }
}
