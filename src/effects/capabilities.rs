//! Engine operations available to a layer while it walks transitions.

use crate::core::{Outcome, Parameter};

/// Hierarchy operations an axion may call, bound to the layer being walked.
///
/// The engine implements this over its live hierarchy and the work list of
/// the current pass. Events queued through it are delivered later in the
/// same pass, never re-entrantly.
pub trait Capabilities {
    /// Spawn a child layer of `machine`, seeded with `seed`, and queue
    /// `started` for it.
    fn start(&mut self, machine: &str, seed: &[Parameter]) -> Outcome;

    /// Queue `event` for the parent layer.
    fn raise(&mut self, event: &str) -> Outcome;

    /// Queue `event` for every transitive descendant.
    fn blast(&mut self, event: &str) -> Outcome;

    /// Forward an application command notification.
    fn patch(&mut self, command: &str, status: &str) -> Outcome;

    /// Bind `label` in the parent layer's innermost frame.
    fn write(&mut self, label: &str, value: &str) -> Outcome;

    /// Number of transitive descendants whose bindings match `tuple`.
    fn count(&mut self, tuple: &[Parameter]) -> usize;

    /// Schedule `event` for this layer `expires_ms` from now.
    fn timer(&mut self, expires_ms: i64, event: &str) -> Outcome;

    /// Emit a diagnostic tagged with this layer.
    fn trace(&mut self, debug: &str) -> Outcome;

    /// Detach this layer from the hierarchy. The root is never detached.
    fn pop(&mut self) -> Outcome;

    /// Run an application-defined verb.
    fn execute(&mut self, verb: &str, parameters: &[Parameter]) -> String;

    /// Emit an engine diagnostic line.
    fn log(&mut self, message: &str);
}
