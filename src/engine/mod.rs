//! The engine: a hierarchy of layers driven by events.
//!
//! An [`Engine`] owns the arena of layers, the machine catalog, the
//! application [`Resolver`] and a [`TimerSet`]. Each call to
//! [`Engine::handle_event`] runs one propagation pass to completion while
//! holding the engine lock, so passes triggered by callers and by expiring
//! timers never interleave.
//!
//! # Example
//!
//! ```rust
//! use fsmstack::core::{MachineDef, MachineLibrary, StateDef};
//! use fsmstack::engine::Engine;
//!
//! let library = MachineLibrary::new().machine(
//!     MachineDef::new("default")
//!         .state(StateDef::new("start").on("go", "middle"))
//!         .state(StateDef::new("middle").on("go", "final"))
//!         .state(StateDef::new("final")),
//! );
//!
//! let engine = Engine::new();
//! engine.initialize(library);
//! engine.handle_event("go");
//!
//! assert_eq!(engine.layers()[0].state, "middle");
//! ```

use crate::builder::EngineBuilder;
use crate::core::{MachineDef, MachineLibrary, Parameter, StateHistory, StateTransition};
use crate::effects::{Layer, LayerId};
use crate::timer::TimerSet;
use graph::Hierarchy;
use parking_lot::Mutex;
use pass::Pass;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Weak};
use std::time::Duration;
use tracing::{debug, info};

mod config;
mod graph;
mod pass;
mod resolver;

pub use config::{EngineConfig, DEFAULT_MAX_FOLLOW_ON, DEFAULT_TIMER_THREAD};
pub use resolver::{NoopResolver, Resolver};

/// Event delivered to a freshly started child layer.
pub const STARTED_EVENT: &str = "started";

/// Point-in-time view of one layer in the hierarchy.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LayerSnapshot {
    pub id: LayerId,
    pub machine: String,
    pub state: String,
    pub parent: Option<LayerId>,
    /// Every binding, innermost frame first
    pub bindings: Vec<Parameter>,
    pub history: Vec<StateTransition>,
}

impl LayerSnapshot {
    /// Innermost binding of `label`, compared case-insensitively.
    pub fn binding(&self, label: &str) -> Option<&str> {
        self.bindings
            .iter()
            .find(|p| crate::core::eq_ignore_case(&p.label, label))
            .map(|p| p.value.as_str())
    }
}

struct EngineState {
    hierarchy: Hierarchy,
    catalog: Vec<Arc<MachineDef>>,
    resolver: Arc<dyn Resolver>,
}

struct Shared {
    state: Mutex<EngineState>,
    timers: TimerSet,
    config: EngineConfig,
}

impl Shared {
    fn dispatch(&self, event: &str, target: Option<&LayerId>) {
        let mut guard = self.state.lock();
        let state = &mut *guard;
        let resolver = Arc::clone(&state.resolver);

        Pass::new(
            &mut state.hierarchy,
            &state.catalog,
            resolver.as_ref(),
            &self.timers,
            &self.config,
        )
        .run(event, target);

        state.hierarchy.compact();
    }
}

/// Handle to a running hierarchy. Clones share the same engine.
#[derive(Clone)]
pub struct Engine {
    inner: Arc<Shared>,
}

impl Engine {
    /// Create an inert engine with default configuration.
    pub fn new() -> Self {
        Self::with_config(EngineConfig::default())
    }

    pub fn with_config(config: EngineConfig) -> Self {
        let inner = Arc::new_cyclic(|weak: &Weak<Shared>| {
            let weak = weak.clone();
            let timers = TimerSet::new(
                config.timer_thread_name.clone(),
                move |target: &LayerId, event: &str| {
                    // The engine may already be gone when a timer fires.
                    if let Some(shared) = weak.upgrade() {
                        shared.dispatch(event, Some(target));
                    }
                },
            );

            Shared {
                state: Mutex::new(EngineState {
                    hierarchy: Hierarchy::default(),
                    catalog: Vec::new(),
                    resolver: Arc::new(NoopResolver),
                }),
                timers,
                config,
            }
        });

        Self { inner }
    }

    pub fn builder() -> EngineBuilder {
        EngineBuilder::new()
    }

    pub fn config(&self) -> &EngineConfig {
        &self.inner.config
    }

    /// Replace the machine catalog and restart the hierarchy.
    ///
    /// The hierarchy and pending timers are cleared. When the library holds
    /// a machine named `default` it becomes the root layer; otherwise the
    /// engine stays inert until the next initialization.
    pub fn initialize(&self, library: MachineLibrary) {
        let mut state = self.inner.state.lock();

        state.hierarchy.clear();
        self.inner.timers.clear();
        state.catalog = library.machines.into_iter().map(Arc::new).collect();

        let root = state
            .catalog
            .iter()
            .find(|m| m.is_named(crate::core::ROOT_MACHINE))
            .cloned();

        match root {
            Some(machine) => {
                let history = StateHistory::with_limit(self.inner.config.history_limit);
                let layer = Layer::with_history(machine, history);
                info!(root = %layer.id(), machines = state.catalog.len(), "engine initialized");
                state.hierarchy.attach_root(layer);
            }
            None => {
                info!(machines = state.catalog.len(), "no default machine, engine inert");
            }
        }
    }

    /// Swap the application resolver.
    pub fn set_resolver(&self, resolver: Arc<dyn Resolver>) {
        self.inner.state.lock().resolver = resolver;
        debug!("resolver replaced");
    }

    /// Deliver `event` to every attached layer and run the pass to completion.
    pub fn handle_event(&self, event: &str) {
        self.inner.dispatch(event, None);
    }

    /// Deliver `event` to the layer `target` only.
    pub fn handle_event_for(&self, event: &str, target: &LayerId) {
        self.inner.dispatch(event, Some(target));
    }

    /// Snapshot of every attached layer in hierarchy order.
    pub fn layers(&self) -> Vec<LayerSnapshot> {
        let state = self.inner.state.lock();
        let hierarchy = &state.hierarchy;

        hierarchy
            .attached()
            .filter_map(|slot| {
                let layer = hierarchy.layer(slot)?;
                let parent = hierarchy
                    .parent_of(slot)
                    .and_then(|p| hierarchy.layer(p))
                    .map(Layer::id);

                Some(LayerSnapshot {
                    id: layer.id(),
                    machine: layer.machine().name.clone(),
                    state: layer.state_label().to_string(),
                    parent,
                    bindings: layer
                        .frames()
                        .frames()
                        .flat_map(|frame| frame.iter().map(|(l, v)| Parameter::new(l, v)))
                        .collect(),
                    history: layer.history().transitions().cloned().collect(),
                })
            })
            .collect()
    }

    /// Number of attached layers.
    pub fn len(&self) -> usize {
        self.inner.state.lock().hierarchy.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn pending_timers(&self) -> usize {
        self.inner.timers.len()
    }

    /// Block until every pending timer has fired, or `timeout` elapses.
    pub fn wait_for_timers(&self, timeout: Duration) -> bool {
        self.inner.timers.wait_idle(timeout)
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}
