//! Builder API for ergonomic engine construction.
//!
//! This module provides a fluent builder for [`Engine`](crate::engine::Engine)
//! and the [`machine!`](crate::machine) macro for writing definitions inline.

pub mod engine;
pub mod error;
pub mod macros;

pub use engine::EngineBuilder;
pub use error::BuildError;
