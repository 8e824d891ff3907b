//! Timer error types.

use thiserror::Error;

/// Errors that can occur while scheduling timers
#[derive(Debug, Error)]
pub enum TimerError {
    /// The background worker thread could not be started
    #[error("Failed to spawn timer worker: {0}")]
    SpawnFailed(#[from] std::io::Error),
}
