//! Fsmstack: a hierarchical state machine runtime
//!
//! Fsmstack runs a tree of state machine instances ("layers") driven by
//! string events. Machine definitions are plain data: ordered states with
//! event-keyed transitions and small inline commands ("axions") executed on
//! entry and leave. Axions bind variables, spawn child layers, send events up
//! and down the hierarchy, schedule timers, or call back into the embedding
//! application.
//!
//! The crate follows a "pure core, imperative shell" split:
//!
//! - **core**: definitions, frames, axion parsing, history. No side effects
//! - **effects**: a [`Layer`] walking its transitions and executing axions
//!   through the [`effects::Capabilities`] seam
//! - **engine**: the [`Engine`] owning the hierarchy and running
//!   run-to-completion propagation passes
//! - **timer**: deadline-ordered timers re-injecting events
//!
//! # Example
//!
//! ```rust
//! use fsmstack::{machine, Engine, MachineLibrary};
//!
//! let library = MachineLibrary::new()
//!     .machine(machine! {
//!         "default" {
//!             "start" { "go" => "spawn" }
//!             "spawn" entry "start:machine=worker,job=42" { "success" => "waiting" }
//!             "waiting" { "done" => "final" }
//!             "final" {}
//!         }
//!     })
//!     .machine(machine! {
//!         "worker" {
//!             "start" { "started" => "final" }
//!             "final" leave "raise:event=done" {}
//!         }
//!     });
//!
//! let engine = Engine::builder().library(library).build().unwrap();
//! engine.handle_event("go");
//!
//! let layers = engine.layers();
//! assert_eq!(layers.len(), 1);
//! assert_eq!(layers[0].state, "final");
//! ```

pub mod builder;
pub mod core;
pub mod effects;
pub mod engine;
pub mod timer;
pub mod validation;

// Re-export commonly used types
pub use builder::{BuildError, EngineBuilder};
pub use core::{MachineDef, MachineLibrary, Outcome, Parameter, StateDef, StateHistory, StateTransition};
pub use effects::{Layer, LayerId};
pub use engine::{Engine, EngineConfig, LayerSnapshot, Resolver};
pub use validation::{DefinitionError, DefinitionViolation};
