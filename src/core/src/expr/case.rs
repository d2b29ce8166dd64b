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

use super::{Expr, ExprImpl};

/// One `WHEN condition THEN result` arm of a searched `CASE`.
///
/// The analyzer desugars simple `CASE x WHEN v THEN r` into searched form (`CASE WHEN x = v THEN
/// r`) before handing the plan to this core, so only one shape needs to be represented here.
#[derive(Clone, PartialEq)]
pub struct CaseWhenClause {
    condition: ExprImpl,
    result: ExprImpl,
}

impl CaseWhenClause {
    pub fn new(condition: ExprImpl, result: ExprImpl) -> Self {
        Self { condition, result }
    }

    pub fn condition(&self) -> &ExprImpl {
        &self.condition
    }

    pub fn result(&self) -> &ExprImpl {
        &self.result
    }
}

#[derive(Clone, PartialEq)]
pub struct Case {
    when_clauses: Vec<CaseWhenClause>,
    else_clause: Option<Box<ExprImpl>>,
    return_type: DataType,
}

impl Case {
    pub fn new(
        when_clauses: Vec<CaseWhenClause>,
        else_clause: Option<ExprImpl>,
        return_type: DataType,
    ) -> Self {
        Self {
            when_clauses,
            else_clause: else_clause.map(Box::new),
            return_type,
        }
    }

    pub fn when_clauses(&self) -> &[CaseWhenClause] {
        &self.when_clauses
    }

    pub fn else_clause(&self) -> Option<&ExprImpl> {
        self.else_clause.as_deref()
    }
}

impl Expr for Case {
    fn return_type(&self) -> DataType {
        self.return_type.clone()
    }
}

impl fmt::Debug for Case {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CASE")?;
        for clause in &self.when_clauses {
            write!(f, " WHEN {:?} THEN {:?}", clause.condition, clause.result)?;
        }
        if let Some(e) = &self.else_clause {
            write!(f, " ELSE {e:?}")?;
        }
        write!(f, " END")
    }
}
