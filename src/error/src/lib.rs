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

//! The error hierarchy shared by every pass in the planner core (§7 of the design).
//!
//! There are exactly four kinds a caller needs to branch on: a plan shape we don't (yet) rewrite,
//! a coercion failure reported by the metadata collaborator, an internal invariant violation (a
//! bug, never user-visible), and cancellation. Everything else arriving from a collaborator is
//! carried as an opaque [`anyhow::Error`] source so this crate never depends on collaborator error
//! types.

use std::fmt;

/// Stable identifier for a plan node, reused across passes; kept here (rather than in the core
/// crate) so error variants can name the offending node without a dependency cycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PlanNodeId(pub u64);

impl fmt::Display for PlanNodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// The four error kinds named in §7. Non-exhaustive: new kinds may be added without breaking
/// downstream `match`es that end in a wildcard arm.
#[derive(thiserror::Error, Debug)]
#[non_exhaustive]
pub enum PlannerErrorCode {
    #[error("not supported at {node}: {message}")]
    NotSupported { node: PlanNodeId, message: String },

    #[error("type mismatch: {message}")]
    TypeMismatch { message: String },

    #[error("internal error: {message}")]
    Internal { message: String },

    #[error("cancelled")]
    Cancelled,
}

/// The error type every planner pass returns. Transactional by convention: a pass either returns
/// `Ok(new_plan)` or leaves the caller free to keep using the original plan alongside this error.
#[derive(thiserror::Error, Debug)]
#[error("{code}")]
pub struct PlannerError {
    code: PlannerErrorCode,
    #[source]
    source: Option<anyhow::Error>,
}

impl PlannerError {
    pub fn new(code: PlannerErrorCode) -> Self {
        Self { code, source: None }
    }

    pub fn with_source(code: PlannerErrorCode, source: anyhow::Error) -> Self {
        Self {
            code,
            source: Some(source),
        }
    }

    pub fn code(&self) -> &PlannerErrorCode {
        &self.code
    }

    pub fn not_supported(node: PlanNodeId, message: impl Into<String>) -> Self {
        Self::new(PlannerErrorCode::NotSupported {
            node,
            message: message.into(),
        })
    }

    pub fn type_mismatch(message: impl Into<String>) -> Self {
        Self::new(PlannerErrorCode::TypeMismatch {
            message: message.into(),
        })
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(PlannerErrorCode::Internal {
            message: message.into(),
        })
    }

    pub fn cancelled() -> Self {
        Self::new(PlannerErrorCode::Cancelled)
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self.code, PlannerErrorCode::Cancelled)
    }
}

impl From<anyhow::Error> for PlannerError {
    fn from(source: anyhow::Error) -> Self {
        Self::with_source(
            PlannerErrorCode::Internal {
                message: source.to_string(),
            },
            source,
        )
    }
}

pub type Result<T> = std::result::Result<T, PlannerError>;

/// Bail with [`PlannerErrorCode::Internal`]. Reserved for post-condition assertions (a pass
/// discovering its own output violates an invariant) — these must never be reachable from valid
/// input, so hitting one in production is always a bug in this crate.
#[macro_export]
macro_rules! bail_internal {
    ($($arg:tt)*) => {
        return Err($crate::PlannerError::internal(format!($($arg)*)))
    };
}

/// Bail with [`PlannerErrorCode::NotSupported`] for the given node id.
#[macro_export]
macro_rules! bail_not_supported {
    ($node:expr, $($arg:tt)*) => {
        return Err($crate::PlannerError::not_supported($node, format!($($arg)*)))
    };
}
