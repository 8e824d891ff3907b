//! Errors raised while loading machine definitions.

use super::violations::DefinitionViolation;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DefinitionError {
    #[error("Failed to decode machine definitions: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Machine definitions have {} violation(s), first: {}", .0.len(), first(.0))]
    Invalid(Vec<DefinitionViolation>),
}

fn first(violations: &[DefinitionViolation]) -> String {
    violations
        .first()
        .map_or_else(String::new, ToString::to_string)
}
