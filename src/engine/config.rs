//! Engine tuning knobs.

use crate::core::DEFAULT_HISTORY_LIMIT;
use serde::{Deserialize, Serialize};

/// Default ceiling on moves within one transition walk.
pub const DEFAULT_MAX_FOLLOW_ON: usize = 256;

/// Default name of the timer worker thread.
pub const DEFAULT_TIMER_THREAD: &str = "fsmstack-timer";

/// Runtime configuration for an [`Engine`](super::Engine).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Moves a single walk may make before it is cut off
    pub max_follow_on: usize,
    /// Transitions retained per layer
    pub history_limit: usize,
    pub timer_thread_name: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_follow_on: DEFAULT_MAX_FOLLOW_ON,
            history_limit: DEFAULT_HISTORY_LIMIT,
            timer_thread_name: DEFAULT_TIMER_THREAD.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_config_fills_defaults() {
        let config: EngineConfig = serde_json::from_str(r#"{ "max_follow_on": 8 }"#).unwrap();

        assert_eq!(config.max_follow_on, 8);
        assert_eq!(config.history_limit, DEFAULT_HISTORY_LIMIT);
        assert_eq!(config.timer_thread_name, DEFAULT_TIMER_THREAD);
    }
}
