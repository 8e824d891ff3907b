//! Bounded per-layer transition history.
//!
//! Every move a layer makes is recorded with the event that caused it.
//! Only the most recent `limit` records are kept so long-lived layers do
//! not grow without bound.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::time::Duration;

/// Record of a single state move.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateTransition {
    /// Label of the state being left
    pub from: String,
    /// Label of the state being entered
    pub to: String,
    /// Event the walk was following when the move happened
    pub event: String,
    pub timestamp: DateTime<Utc>,
}

/// Most recent transitions of a layer, oldest first.
///
/// # Example
///
/// ```rust
/// use fsmstack::core::{StateHistory, StateTransition};
/// use chrono::Utc;
///
/// let mut history = StateHistory::with_limit(2);
/// for (from, to) in [("start", "a"), ("a", "b"), ("b", "final")] {
///     history.record(StateTransition {
///         from: from.to_string(),
///         to: to.to_string(),
///         event: "go".to_string(),
///         timestamp: Utc::now(),
///     });
/// }
///
/// assert_eq!(history.get_path(), vec!["a", "b", "final"]);
/// assert_eq!(history.len(), 2);
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateHistory {
    transitions: VecDeque<StateTransition>,
    limit: usize,
}

/// Default number of transitions retained per layer.
pub const DEFAULT_HISTORY_LIMIT: usize = 32;

impl Default for StateHistory {
    fn default() -> Self {
        Self::with_limit(DEFAULT_HISTORY_LIMIT)
    }
}

impl StateHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// History retaining at most `limit` records; zero disables recording.
    pub fn with_limit(limit: usize) -> Self {
        Self {
            transitions: VecDeque::with_capacity(limit.min(DEFAULT_HISTORY_LIMIT)),
            limit,
        }
    }

    /// Append a transition, evicting the oldest when full.
    pub fn record(&mut self, transition: StateTransition) {
        if self.limit == 0 {
            return;
        }

        if self.transitions.len() == self.limit {
            self.transitions.pop_front();
        }
        self.transitions.push_back(transition);
    }

    /// Labels visited, starting with the `from` of the oldest retained record.
    pub fn get_path(&self) -> Vec<&str> {
        let Some(first) = self.transitions.front() else {
            return Vec::new();
        };

        std::iter::once(first.from.as_str())
            .chain(self.transitions.iter().map(|t| t.to.as_str()))
            .collect()
    }

    /// Time between the oldest and newest retained record.
    pub fn duration(&self) -> Option<Duration> {
        let first = self.transitions.front()?;
        let last = self.transitions.back()?;

        last.timestamp
            .signed_duration_since(first.timestamp)
            .to_std()
            .ok()
    }

    pub fn transitions(&self) -> impl Iterator<Item = &StateTransition> {
        self.transitions.iter()
    }

    pub fn last(&self) -> Option<&StateTransition> {
        self.transitions.back()
    }

    pub fn len(&self) -> usize {
        self.transitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transitions.is_empty()
    }

    pub fn limit(&self) -> usize {
        self.limit
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn step(from: &str, to: &str) -> StateTransition {
        StateTransition {
            from: from.to_string(),
            to: to.to_string(),
            event: "go".to_string(),
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn new_history_is_empty() {
        let history = StateHistory::new();

        assert!(history.is_empty());
        assert!(history.get_path().is_empty());
        assert!(history.duration().is_none());
        assert_eq!(history.limit(), DEFAULT_HISTORY_LIMIT);
    }

    #[test]
    fn get_path_returns_state_sequence() {
        let mut history = StateHistory::new();
        history.record(step("start", "middle"));
        history.record(step("middle", "final"));

        assert_eq!(history.get_path(), vec!["start", "middle", "final"]);
        assert_eq!(history.last().map(|t| t.to.as_str()), Some("final"));
    }

    #[test]
    fn record_evicts_oldest_when_full() {
        let mut history = StateHistory::with_limit(2);
        history.record(step("a", "b"));
        history.record(step("b", "c"));
        history.record(step("c", "d"));

        assert_eq!(history.len(), 2);
        assert_eq!(history.get_path(), vec!["b", "c", "d"]);
    }

    #[test]
    fn zero_limit_disables_recording() {
        let mut history = StateHistory::with_limit(0);
        history.record(step("a", "b"));

        assert!(history.is_empty());
    }

    #[test]
    fn duration_calculates_elapsed_time() {
        let mut history = StateHistory::new();
        let base = Utc::now();

        let mut first = step("a", "b");
        first.timestamp = base;
        let mut second = step("b", "c");
        second.timestamp = base + chrono::Duration::milliseconds(250);

        history.record(first);
        history.record(second);

        assert_eq!(history.duration(), Some(Duration::from_millis(250)));
    }

    #[test]
    fn history_serializes_correctly() {
        let mut history = StateHistory::with_limit(4);
        history.record(step("start", "final"));

        let json = serde_json::to_string(&history).unwrap();
        let restored: StateHistory = serde_json::from_str(&json).unwrap();

        assert_eq!(history, restored);
    }
}
