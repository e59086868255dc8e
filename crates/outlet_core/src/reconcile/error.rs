//! Reconciliation errors.

use crate::component::factory::CreateError;
use crate::model::tree::OutletPath;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Errors that abort a reconciliation pass before the store is mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileError {
    /// The strategy broke the `should_attach`/`retrieve` contract.
    ContractViolation { path: OutletPath, reason: String },
    /// A component could not be created.
    Creation {
        path: OutletPath,
        source: CreateError,
    },
    /// Two sibling routes target the same outlet.
    DuplicateOutlet { path: OutletPath, outlet: String },
    /// A route that must be created has no config or no component factory.
    MissingComponent { path: OutletPath },
    /// The future tree root carries a route config.
    InvalidRoot,
}

impl Display for ReconcileError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ContractViolation { path, reason } => {
                write!(f, "reuse strategy contract violated at `{path}`: {reason}")
            }
            Self::Creation { path, source } => {
                write!(f, "failed to create component at `{path}`: {source}")
            }
            Self::DuplicateOutlet { path, outlet } => {
                write!(f, "outlet `{outlet}` is targeted twice below `{path}`")
            }
            Self::MissingComponent { path } => {
                write!(f, "route at `{path}` has no component to create")
            }
            Self::InvalidRoot => write!(f, "future tree root must not carry a route config"),
        }
    }
}

impl Error for ReconcileError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Creation { source, .. } => Some(source),
            _ => None,
        }
    }
}
