//! The application hook for verbs the engine does not understand.

use crate::core::Parameter;

/// Application-side collaborator of the engine.
///
/// All methods have no-op defaults so an application only overrides the
/// hooks it cares about. They are called while the engine holds its
/// hierarchy lock and must not call back into the same engine.
///
/// # Example
///
/// ```rust
/// use fsmstack::core::Parameter;
/// use fsmstack::engine::Resolver;
///
/// struct Deployer;
///
/// impl Resolver for Deployer {
///     fn execute(&self, verb: &str, parameters: &[Parameter]) -> String {
///         match verb {
///             "deploy" if !parameters.is_empty() => "success".to_string(),
///             _ => "failure".to_string(),
///         }
///     }
/// }
/// ```
pub trait Resolver: Send + Sync {
    /// Run an application verb and return the event to follow on with.
    fn execute(&self, verb: &str, parameters: &[Parameter]) -> String {
        let _ = (verb, parameters);
        String::new()
    }

    /// Notification raised by the `patch` verb.
    fn command(&self, command: &str, status: &str) {
        let _ = (command, status);
    }

    /// Diagnostic line emitted by the engine.
    fn log(&self, message: &str) {
        let _ = message;
    }
}

/// Resolver that ignores everything; installed until one is set.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopResolver;

impl Resolver for NoopResolver {}
