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

//! Pre-planning-only expression shapes (§3.3, §6.3).
//!
//! `Subquery`/`Exists`/quantified comparisons never survive past the unnesting step that precedes
//! predicate pushdown: by the time any pass in this core's main pipeline runs, every plan is free
//! of them (§6.3 boundary invariant). They're modeled here only so that desugaring — which is an
//! external collaborator's job, not this core's — has a well-typed thing to consume.

use std::fmt;

use relplan_common::types::DataType;

use super::{Expr, FunctionType};
use crate::plan_node::PlanRef;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum QuantifiedComparisonType {
    All,
    Any,
}

#[derive(Clone, PartialEq)]
pub enum PreplanningExpr {
    /// A scalar subquery: `(SELECT ...)` used as a value.
    Subquery(PlanRef),
    /// `EXISTS (SELECT ...)`.
    Exists(PlanRef),
    /// `lhs op {ALL|ANY} (SELECT ...)`.
    QuantifiedComparison {
        op: FunctionType,
        quantifier: QuantifiedComparisonType,
        lhs: Box<super::ExprImpl>,
        subquery: PlanRef,
    },
}

impl Expr for PreplanningExpr {
    fn return_type(&self) -> DataType {
        match self {
            PreplanningExpr::Subquery(plan) => plan
                .schema()
                .fields()
                .first()
                .map(|f| f.data_type.clone())
                .unwrap_or(DataType::Boolean),
            PreplanningExpr::Exists(_) | PreplanningExpr::QuantifiedComparison { .. } => {
                DataType::Boolean
            }
        }
    }
}

impl fmt::Debug for PreplanningExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PreplanningExpr::Subquery(_) => write!(f, "(SUBQUERY)"),
            PreplanningExpr::Exists(_) => write!(f, "EXISTS(SUBQUERY)"),
            PreplanningExpr::QuantifiedComparison {
                op, quantifier, lhs, ..
            } => write!(f, "{lhs:?} {op:?} {quantifier:?}(SUBQUERY)"),
        }
    }
}
