//! One propagation pass: an event and everything it transitively triggers.
//!
//! The work list is a plain vector walked by index. Capabilities append to
//! it while earlier items are being processed, so every queued effect is
//! handled before the pass returns and no other event can interleave.

use super::graph::Hierarchy;
use super::resolver::Resolver;
use super::{EngineConfig, STARTED_EVENT};
use crate::core::{MachineDef, Outcome, Parameter, StateHistory};
use crate::effects::{Capabilities, Layer, LayerId};
use crate::timer::{now_millis, TimerSet};
use std::sync::Arc;
use tracing::{debug, warn};

#[derive(Clone, Debug)]
struct WorkItem {
    event: String,
    slot: usize,
}

pub(crate) struct Pass<'a> {
    hierarchy: &'a mut Hierarchy,
    catalog: &'a [Arc<MachineDef>],
    resolver: &'a dyn Resolver,
    timers: &'a TimerSet,
    config: &'a EngineConfig,
    queue: Vec<WorkItem>,
}

impl<'a> Pass<'a> {
    pub fn new(
        hierarchy: &'a mut Hierarchy,
        catalog: &'a [Arc<MachineDef>],
        resolver: &'a dyn Resolver,
        timers: &'a TimerSet,
        config: &'a EngineConfig,
    ) -> Self {
        Self {
            hierarchy,
            catalog,
            resolver,
            timers,
            config,
            queue: Vec::new(),
        }
    }

    /// Deliver `event` to every attached layer, or only to `target`, and
    /// drain the work list. Returns the number of work items processed.
    pub fn run(mut self, event: &str, target: Option<&LayerId>) -> usize {
        if event.is_empty() {
            return 0;
        }

        self.log(&format!("Handling {event}"));

        let targets: Vec<usize> = match target {
            Some(id) => self.hierarchy.find(id).into_iter().collect(),
            None => self.hierarchy.attached().collect(),
        };
        self.queue.extend(targets.into_iter().map(|slot| WorkItem {
            event: event.to_string(),
            slot,
        }));

        let max_steps = self.config.max_follow_on;
        let mut index = 0;
        while index < self.queue.len() {
            let WorkItem { event, slot } = self.queue[index].clone();
            index += 1;

            let Some(mut layer) = self.hierarchy.take(slot) else {
                continue;
            };

            self.log(&format!(
                "Layer ({}) of {} following on {}",
                layer.id(),
                layer.machine().name,
                event
            ));

            let mut bound = Bound {
                id: layer.id(),
                pass: &mut self,
                slot,
            };
            layer.follow_on(&event, &mut bound, max_steps);
            self.hierarchy.restore(slot, layer);
        }

        debug!(event, items = index, "propagation pass complete");
        index
    }

    fn log(&self, message: &str) {
        debug!(target: "fsmstack::diagnostic", "{message}");
        self.resolver.log(message);
    }

    fn enqueue(&mut self, event: &str, slot: usize) {
        self.queue.push(WorkItem {
            event: event.to_string(),
            slot,
        });
    }
}

/// Capabilities of the pass, bound to the layer currently walking.
struct Bound<'p, 'a> {
    pass: &'p mut Pass<'a>,
    slot: usize,
    id: LayerId,
}

impl Bound<'_, '_> {
    fn registered(&self) -> bool {
        self.pass.hierarchy.is_attached(self.slot)
    }
}

impl Capabilities for Bound<'_, '_> {
    fn start(&mut self, machine: &str, seed: &[Parameter]) -> Outcome {
        if !self.registered() {
            return Outcome::Failure;
        }

        let Some(definition) = self.pass.catalog.iter().find(|m| m.is_named(machine)) else {
            debug!(layer = %self.id, machine, "start of unknown machine");
            return Outcome::Invalid;
        };

        let history = StateHistory::with_limit(self.pass.config.history_limit);
        let mut child = Layer::with_history(Arc::clone(definition), history);
        for parameter in seed {
            child.frames_mut().apply(&parameter.label, &parameter.value);
        }

        debug!(parent = %self.id, child = %child.id(), machine, "layer started");
        let slot = self.pass.hierarchy.attach_child(self.slot, child);
        self.pass.enqueue(STARTED_EVENT, slot);
        Outcome::Success
    }

    fn raise(&mut self, event: &str) -> Outcome {
        if !self.registered() {
            return Outcome::Failure;
        }

        if let Some(parent) = self.pass.hierarchy.parent_of(self.slot) {
            if !event.is_empty() {
                self.pass.enqueue(event, parent);
            }
        }
        Outcome::Success
    }

    fn blast(&mut self, event: &str) -> Outcome {
        if !event.is_empty() {
            for slot in self.pass.hierarchy.descendants(self.slot) {
                self.pass.enqueue(event, slot);
            }
        }
        Outcome::Success
    }

    fn patch(&mut self, command: &str, status: &str) -> Outcome {
        if !self.registered() {
            return Outcome::Failure;
        }

        self.pass.resolver.command(command, status);
        Outcome::Success
    }

    fn write(&mut self, label: &str, value: &str) -> Outcome {
        if !self.registered() {
            return Outcome::Failure;
        }

        if label.is_empty() {
            return Outcome::Success;
        }

        let parent = self.pass.hierarchy.parent_of(self.slot);
        if let Some(layer) = parent.and_then(|p| self.pass.hierarchy.layer_mut(p)) {
            layer.frames_mut().write(label, value);
        }
        Outcome::Success
    }

    fn count(&mut self, tuple: &[Parameter]) -> usize {
        let hierarchy = &*self.pass.hierarchy;
        hierarchy
            .descendants(self.slot)
            .into_iter()
            .filter(|&slot| {
                hierarchy
                    .layer(slot)
                    .is_some_and(|layer| layer.frames().matches_all(tuple))
            })
            .count()
    }

    fn timer(&mut self, expires_ms: i64, event: &str) -> Outcome {
        if !self.registered() {
            return Outcome::Failure;
        }

        let deadline = now_millis().saturating_add(expires_ms);
        match self.pass.timers.register(self.id, event, deadline) {
            Ok(()) => Outcome::Success,
            Err(e) => {
                warn!(layer = %self.id, event, error = %e, "timer registration failed");
                Outcome::Failure
            }
        }
    }

    fn trace(&mut self, debug: &str) -> Outcome {
        if !self.registered() {
            return Outcome::Failure;
        }

        self.pass.log(&format!("({}) {}", self.id, debug));
        Outcome::Success
    }

    fn pop(&mut self) -> Outcome {
        if !self.registered() {
            return Outcome::Failure;
        }

        if self.pass.hierarchy.parent_of(self.slot).is_some() {
            debug!(layer = %self.id, "layer detached");
            self.pass.hierarchy.detach(self.slot);
        }
        Outcome::Success
    }

    fn execute(&mut self, verb: &str, parameters: &[Parameter]) -> String {
        self.pass.resolver.execute(verb, parameters)
    }

    fn log(&mut self, message: &str) {
        self.pass.log(message);
    }
}
