//! Loading and checking machine definitions.
//!
//! The engine assumes its definitions are well formed: labels non-empty and
//! unique per machine, every transition pointing at a state that exists.
//! This module checks those assumptions up front, reporting every problem at
//! once rather than stopping at the first.
//!
//! # Example
//!
//! ```rust
//! use fsmstack::core::MachineLibrary;
//!
//! let json = r#"{
//!     "machines": [{
//!         "name": "default",
//!         "states": [
//!             { "label": "start", "trans": [{ "event": "go", "state": "final" }] },
//!             { "label": "final" }
//!         ]
//!     }]
//! }"#;
//!
//! let library = MachineLibrary::from_json(json).unwrap();
//! assert_eq!(library.len(), 1);
//! ```

pub mod error;
pub mod rules;
pub mod violations;

pub use error::DefinitionError;
pub use rules::{validate_library, Check};
pub use violations::DefinitionViolation;

use crate::core::MachineLibrary;
use stillwater::validation::Validation;

impl MachineLibrary {
    /// Decode a library from JSON and reject it unless it validates.
    pub fn from_json(json: &str) -> Result<Self, DefinitionError> {
        let library: Self = serde_json::from_str(json)?;
        library.check()?;
        Ok(library)
    }

    /// Accumulate every structural violation in the library.
    pub fn validate(&self) -> Check {
        validate_library(self)
    }

    /// [`validate`](Self::validate) as a `Result`.
    pub fn check(&self) -> Result<(), DefinitionError> {
        match self.validate() {
            Validation::Success(()) => Ok(()),
            Validation::Failure(errors) => {
                Err(DefinitionError::Invalid(errors.iter().cloned().collect()))
            }
        }
    }
}
