//! Structural checks over a machine library using Validation.

use super::violations::DefinitionViolation;
use crate::core::{eq_ignore_case, MachineDef, MachineLibrary};
use stillwater::validation::Validation;
use stillwater::NonEmptyVec;

/// Result of a single check; failures accumulate across checks.
pub type Check = Validation<(), NonEmptyVec<DefinitionViolation>>;

fn check(ok: bool, violation: impl FnOnce() -> DefinitionViolation) -> Check {
    if ok {
        Validation::success(())
    } else {
        Validation::fail(violation())
    }
}

/// Check every machine of `library`, accumulating ALL violations.
pub fn validate_library(library: &MachineLibrary) -> Check {
    let mut checks: Vec<Check> = Vec::new();

    for (index, machine) in library.machines.iter().enumerate() {
        checks.push(check(!machine.name.is_empty(), || {
            DefinitionViolation::EmptyMachineName { index }
        }));

        let earlier = &library.machines[..index];
        checks.push(check(
            machine.name.is_empty() || !earlier.iter().any(|m| m.is_named(&machine.name)),
            || DefinitionViolation::DuplicateMachine {
                name: machine.name.clone(),
            },
        ));

        checks.extend(validate_machine(machine));
    }

    if checks.is_empty() {
        return Validation::success(());
    }

    Validation::all_vec(checks).map(|_| ())
}

fn validate_machine(machine: &MachineDef) -> Vec<Check> {
    let mut checks = vec![check(!machine.states.is_empty(), || {
        DefinitionViolation::NoStates {
            machine: machine.name.clone(),
        }
    })];

    for (index, state) in machine.states.iter().enumerate() {
        checks.push(check(!state.label.is_empty(), || {
            DefinitionViolation::EmptyStateLabel {
                machine: machine.name.clone(),
                index,
            }
        }));

        let earlier = &machine.states[..index];
        checks.push(check(
            state.label.is_empty() || !earlier.iter().any(|s| eq_ignore_case(&s.label, &state.label)),
            || DefinitionViolation::DuplicateState {
                machine: machine.name.clone(),
                label: state.label.clone(),
            },
        ));

        for transition in &state.transitions {
            let known = transition.target.is_empty()
                || machine.states.iter().any(|s| s.is_labeled(&transition.target));
            checks.push(check(known, || DefinitionViolation::UnknownTarget {
                machine: machine.name.clone(),
                state: state.label.clone(),
                event: transition.event.clone(),
                target: transition.target.clone(),
            }));
        }
    }

    checks
}
