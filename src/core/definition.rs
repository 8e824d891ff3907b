//! Transition tables: immutable descriptions of one machine type.
//!
//! A [`MachineDef`] is an ordered list of states. Each state carries the
//! axion run on entry, the axion run on leave, and an ordered list of
//! transitions keyed by event. A transition with an empty event is the
//! wildcard, taken only when no exact event matches.

use super::eq_ignore_case;
use serde::{Deserialize, Serialize};

/// Label of the state a new layer starts in.
pub const START_LABEL: &str = "start";

/// Label of the terminal state; layers resting here are detached.
pub const FINAL_LABEL: &str = "final";

/// Name of the machine instantiated as the hierarchy root.
pub const ROOT_MACHINE: &str = "default";

/// One `(event, target)` edge out of a state.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransitionDef {
    /// Event that triggers the edge; empty for the wildcard.
    pub event: String,
    /// Label of the target state.
    #[serde(rename = "state")]
    pub target: String,
}

impl TransitionDef {
    pub fn new(event: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            event: event.into(),
            target: target.into(),
        }
    }

    /// Whether this edge is the fallback taken when no event matches.
    pub fn is_wildcard(&self) -> bool {
        self.event.is_empty()
    }
}

/// A single state of a machine definition.
///
/// # Example
///
/// ```rust
/// use fsmstack::core::StateDef;
///
/// let state = StateDef::new("idle")
///     .on_entry("set:label=ready,value=yes")
///     .on("go", "busy")
///     .otherwise("idle");
///
/// assert_eq!(state.follow_on("GO"), Some("busy"));
/// assert_eq!(state.follow_on("other"), Some("idle"));
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StateDef {
    pub label: String,
    /// Axion executed when the state is entered.
    pub entry: String,
    /// Axion executed when the state is left.
    pub leave: String,
    #[serde(rename = "trans")]
    pub transitions: Vec<TransitionDef>,
}

impl StateDef {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            ..Self::default()
        }
    }

    pub fn on_entry(mut self, axion: impl Into<String>) -> Self {
        self.entry = axion.into();
        self
    }

    pub fn on_leave(mut self, axion: impl Into<String>) -> Self {
        self.leave = axion.into();
        self
    }

    /// Add a transition taken on `event`.
    pub fn on(mut self, event: impl Into<String>, target: impl Into<String>) -> Self {
        self.transitions.push(TransitionDef::new(event, target));
        self
    }

    /// Add the wildcard transition.
    pub fn otherwise(self, target: impl Into<String>) -> Self {
        self.on("", target)
    }

    /// Resolve the target label for `event`.
    ///
    /// Exact (case-insensitive) event matches win; otherwise the first
    /// wildcard transition applies. An empty event only ever matches the
    /// wildcard.
    pub fn follow_on(&self, event: &str) -> Option<&str> {
        let exact = if event.is_empty() {
            None
        } else {
            self.transitions
                .iter()
                .find(|t| !t.is_wildcard() && eq_ignore_case(&t.event, event))
        };

        exact
            .or_else(|| self.transitions.iter().find(|t| t.is_wildcard()))
            .map(|t| t.target.as_str())
            .filter(|target| !target.is_empty())
    }

    /// States without transitions never move on their own.
    pub fn is_sink(&self) -> bool {
        self.transitions.is_empty()
    }

    pub fn is_labeled(&self, label: &str) -> bool {
        eq_ignore_case(&self.label, label)
    }

    pub fn is_start(&self) -> bool {
        self.is_labeled(START_LABEL)
    }

    pub fn is_final(&self) -> bool {
        self.is_labeled(FINAL_LABEL)
    }
}

/// Immutable description of one machine type.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MachineDef {
    pub name: String,
    pub states: Vec<StateDef>,
}

impl MachineDef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            states: Vec::new(),
        }
    }

    /// Append a state.
    pub fn state(mut self, state: StateDef) -> Self {
        self.states.push(state);
        self
    }

    pub fn is_named(&self, name: &str) -> bool {
        eq_ignore_case(&self.name, name)
    }

    /// Index a new layer starts at: the `start` state, or the first state.
    pub fn start_index(&self) -> usize {
        self.states.iter().position(StateDef::is_start).unwrap_or(0)
    }

    /// Scan the states circularly from `from` (inclusive) for `label`.
    ///
    /// Returns `None` when the scan wraps back to `from` without a match.
    pub fn locate(&self, from: usize, label: &str) -> Option<usize> {
        let count = self.states.len();
        if count == 0 {
            return None;
        }

        (0..count)
            .map(|offset| (from + offset) % count)
            .find(|&index| self.states[index].is_labeled(label))
    }
}

/// The set of machine definitions an engine can instantiate.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MachineLibrary {
    pub machines: Vec<MachineDef>,
}

impl MachineLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a machine definition.
    pub fn machine(mut self, machine: MachineDef) -> Self {
        self.machines.push(machine);
        self
    }

    /// Find a machine by case-insensitive name.
    pub fn find(&self, name: &str) -> Option<&MachineDef> {
        self.machines.iter().find(|m| m.is_named(name))
    }

    pub fn len(&self) -> usize {
        self.machines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.machines.is_empty()
    }
}

impl FromIterator<MachineDef> for MachineLibrary {
    fn from_iter<I: IntoIterator<Item = MachineDef>>(iter: I) -> Self {
        Self {
            machines: iter.into_iter().collect(),
        }
    }
}
