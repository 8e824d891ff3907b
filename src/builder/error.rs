//! Build errors for the engine builder.

use crate::validation::DefinitionError;
use thiserror::Error;

/// Errors that can occur when building an engine.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("Machine library rejected: {0}")]
    Definition(#[from] DefinitionError),

    #[error("max_follow_on must be at least 1. Call .max_follow_on(n) with n > 0")]
    ZeroFollowOn,
}
