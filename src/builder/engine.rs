//! Builder for constructing engines.

use crate::builder::error::BuildError;
use crate::core::MachineLibrary;
use crate::engine::{Engine, EngineConfig, Resolver};
use std::sync::Arc;

/// Builder for an [`Engine`] with a fluent API.
pub struct EngineBuilder {
    library: Option<MachineLibrary>,
    resolver: Option<Arc<dyn Resolver>>,
    config: EngineConfig,
    validate: bool,
}

impl EngineBuilder {
    /// Create a new builder. Validation is on by default.
    pub fn new() -> Self {
        Self {
            library: None,
            resolver: None,
            config: EngineConfig::default(),
            validate: true,
        }
    }

    /// Library to initialize the engine with.
    pub fn library(mut self, library: MachineLibrary) -> Self {
        self.library = Some(library);
        self
    }

    pub fn resolver(mut self, resolver: Arc<dyn Resolver>) -> Self {
        self.resolver = Some(resolver);
        self
    }

    /// Replace the whole configuration.
    pub fn config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn max_follow_on(mut self, steps: usize) -> Self {
        self.config.max_follow_on = steps;
        self
    }

    pub fn history_limit(mut self, limit: usize) -> Self {
        self.config.history_limit = limit;
        self
    }

    pub fn timer_thread_name(mut self, name: impl Into<String>) -> Self {
        self.config.timer_thread_name = name.into();
        self
    }

    /// Whether `build` rejects a library that fails validation.
    pub fn validate(mut self, validate: bool) -> Self {
        self.validate = validate;
        self
    }

    /// Build the engine, install the resolver and initialize the library.
    pub fn build(self) -> Result<Engine, BuildError> {
        if self.config.max_follow_on == 0 {
            return Err(BuildError::ZeroFollowOn);
        }

        if self.validate {
            if let Some(library) = &self.library {
                library.check()?;
            }
        }

        let engine = Engine::with_config(self.config);
        if let Some(resolver) = self.resolver {
            engine.set_resolver(resolver);
        }
        if let Some(library) = self.library {
            engine.initialize(library);
        }

        Ok(engine)
    }
}

impl Default for EngineBuilder {
    fn default() -> Self {
        Self::new()
    }
}
