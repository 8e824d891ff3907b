//! Problems found in machine definitions.

use thiserror::Error;

/// A single defect in a [`MachineLibrary`](crate::core::MachineLibrary).
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DefinitionViolation {
    #[error("Machine at position {index} has an empty name")]
    EmptyMachineName { index: usize },

    #[error("Machine '{name}' is defined more than once")]
    DuplicateMachine { name: String },

    #[error("Machine '{machine}' has no states")]
    NoStates { machine: String },

    #[error("State at position {index} of machine '{machine}' has an empty label")]
    EmptyStateLabel { machine: String, index: usize },

    #[error("State '{label}' is defined more than once in machine '{machine}'")]
    DuplicateState { machine: String, label: String },

    #[error("State '{state}' of machine '{machine}' on '{event}' targets unknown state '{target}'")]
    UnknownTarget {
        machine: String,
        state: String,
        event: String,
        target: String,
    },
}
