//! A running instance of a machine definition.

use super::capabilities::Capabilities;
use super::interpreter::{self, Mode, WalkContext};
use crate::core::{FrameStack, MachineDef, StateDef, StateHistory, StateTransition};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};
use uuid::Uuid;

/// Opaque, practically unique layer identifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LayerId(Uuid);

impl LayerId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for LayerId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for LayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.simple())
    }
}

/// One live instance of a [`MachineDef`]: a current state, scoped frames
/// and a bounded record of recent moves.
///
/// A layer can be driven on its own by supplying any [`Capabilities`]
/// implementation; the engine supplies one bound to its hierarchy.
#[derive(Clone, Debug)]
pub struct Layer {
    id: LayerId,
    machine: Arc<MachineDef>,
    current: usize,
    frames: FrameStack,
    history: StateHistory,
}

impl Layer {
    /// Create a layer resting in the machine's `start` state (or its first state).
    pub fn new(machine: Arc<MachineDef>) -> Self {
        Self::with_history(machine, StateHistory::new())
    }

    pub fn with_history(machine: Arc<MachineDef>, history: StateHistory) -> Self {
        Self {
            id: LayerId::new(),
            current: machine.start_index(),
            machine,
            frames: FrameStack::new(),
            history,
        }
    }

    pub fn id(&self) -> LayerId {
        self.id
    }

    pub fn machine(&self) -> &MachineDef {
        &self.machine
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    /// `None` only for a machine without states.
    pub fn current_state(&self) -> Option<&StateDef> {
        self.machine.states.get(self.current)
    }

    pub fn state_label(&self) -> &str {
        self.current_state().map_or("", |state| state.label.as_str())
    }

    pub fn is_final(&self) -> bool {
        self.current_state().is_some_and(StateDef::is_final)
    }

    pub fn frames(&self) -> &FrameStack {
        &self.frames
    }

    pub fn frames_mut(&mut self) -> &mut FrameStack {
        &mut self.frames
    }

    pub fn history(&self) -> &StateHistory {
        &self.history
    }

    /// Walk transitions starting from `external` until no follow-on remains.
    ///
    /// Each move runs the source state's leave axion, then the target's entry
    /// axion, whose result selects the next move. A target missing from the
    /// machine, a return to the state the scan started from, or more than
    /// `max_steps` moves ends the walk with a diagnostic. A layer resting in
    /// `final` afterwards runs its leave effects and asks to be detached.
    pub fn follow_on(&mut self, external: &str, caps: &mut dyn Capabilities, max_steps: usize) {
        let machine = Arc::clone(&self.machine);
        let Some(mut state) = machine.states.get(self.current) else {
            return;
        };

        if !state.is_sink() {
            let mut previous = String::new();
            let mut follow_to = state.follow_on(external).map(str::to_string);
            let mut steps = 0;

            while let Some(target) = follow_to.take() {
                if steps == max_steps {
                    let message = format!(
                        "({}) state '{}' on '{}' -> '{}' stopped after {} follow-on steps",
                        self.id, state.label, external, target, max_steps
                    );
                    warn!(layer = %self.id, state = %state.label, event = external, "follow-on limit reached");
                    caps.log(&message);
                    break;
                }
                steps += 1;

                debug!(layer = %self.id, from = %state.label, event = external, to = %target, "transition");
                caps.log(&format!(
                    "({}) state '{}' on '{}' -> '{}'",
                    self.id, state.label, external, target
                ));

                let Some(found) = machine.locate(self.current, &target) else {
                    self.invalid(state, external, &target, caps);
                    break;
                };

                if !state.leave.is_empty() {
                    let context = WalkContext {
                        external,
                        previous: &previous,
                    };
                    interpreter::run(&state.leave, Mode::Leave, &context, self, caps);
                }

                let reentered = found == self.current;
                let next = &machine.states[found];
                self.history.record(StateTransition {
                    from: state.label.clone(),
                    to: next.label.clone(),
                    event: external.to_string(),
                    timestamp: Utc::now(),
                });
                state = next;
                self.current = found;

                follow_to = if state.entry.is_empty() {
                    state.follow_on("").map(str::to_string)
                } else {
                    let context = WalkContext {
                        external,
                        previous: &previous,
                    };
                    let result = interpreter::run(&state.entry, Mode::Entry, &context, self, caps);
                    let next = state.follow_on(&result).map(str::to_string);
                    previous = result;
                    next
                };

                // The circular scan came straight back to where it began.
                if reentered {
                    self.invalid(state, external, &target, caps);
                    break;
                }
            }
        }

        if state.is_final() {
            if !state.leave.is_empty() {
                let context = WalkContext {
                    external,
                    previous: "",
                };
                interpreter::run(&state.leave, Mode::Final, &context, self, caps);
            }
            caps.pop();
        }
    }

    fn invalid(&self, state: &StateDef, external: &str, target: &str, caps: &mut dyn Capabilities) {
        warn!(layer = %self.id, state = %state.label, event = external, to = target, "invalid transition");
        caps.log(&format!(
            "({}) state '{}' on '{}' -> '{}' is invalid transition (not found)",
            self.id, state.label, external, target
        ));
    }
}
