//! Layers and axion execution.
//!
//! This module is the imperative shell around [`crate::core`]: a [`Layer`]
//! walks its transition table and executes axions, reaching out to the
//! hierarchy only through the [`Capabilities`] trait.
//!
//! # Key Concepts
//!
//! - **Transition walk**: one event may move a layer through several states,
//!   each entry axion's result picking the next transition
//! - **Modes**: entry axions produce results, leave axions only side effects
//! - **Capabilities**: hierarchy operations bound to the walking layer

mod capabilities;
mod interpreter;
mod layer;

pub use capabilities::Capabilities;
pub use layer::{Layer, LayerId};
