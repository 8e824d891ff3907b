//! Core data types of the runtime.
//!
//! This module contains the passive side of the engine:
//! - Transition tables via [`MachineDef`] and [`StateDef`]
//! - Scoped variable frames via [`FrameStack`]
//! - Axion parsing and expansion via [`Axion`] and [`Verb`]
//! - Bounded transition history
//!
//! Nothing here performs side effects; executing axions against a live
//! hierarchy lives in [`crate::effects`] and [`crate::engine`].

mod axion;
mod definition;
mod frame;
mod history;

pub use axion::{Axion, Outcome, Parameter, Verb, BUILTIN_VERBS};
pub use definition::{
    MachineDef, MachineLibrary, StateDef, TransitionDef, FINAL_LABEL, ROOT_MACHINE, START_LABEL,
};
pub use frame::{Frame, FrameStack};
pub use history::{StateHistory, StateTransition, DEFAULT_HISTORY_LIMIT};

/// Unicode-aware case-insensitive equality used for labels, events and names.
pub fn eq_ignore_case(a: &str, b: &str) -> bool {
    a.eq_ignore_ascii_case(b)
        || a.chars()
            .flat_map(char::to_lowercase)
            .eq(b.chars().flat_map(char::to_lowercase))
}
