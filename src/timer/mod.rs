//! Deadline-ordered timers that re-inject events into the engine.
//!
//! Pending timers are kept sorted by deadline. A single background worker is
//! started lazily on the first registration; it sleeps on a condition
//! variable until the earliest deadline, fires it through the timeout
//! callback, and exits once nothing is pending. Registering an earlier
//! deadline wakes the sleeping worker instead of starting another one.

use crate::core::eq_ignore_case;
use crate::effects::LayerId;
use chrono::Utc;
use parking_lot::{Condvar, Mutex, MutexGuard};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tracing::{error, trace};

pub mod error;

pub use error::TimerError;

/// Callback invoked on the worker thread when a timer expires.
pub type TimeoutHandler = Arc<dyn Fn(&LayerId, &str) + Send + Sync>;

/// A scheduled event for one layer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PendingTimer {
    pub target: LayerId,
    pub event: String,
    /// Epoch milliseconds
    pub deadline: i64,
}

#[derive(Default)]
struct Queue {
    pending: Vec<PendingTimer>,
    worker_running: bool,
}

impl Queue {
    /// Insert `timer` in deadline order, replacing the timer with the same
    /// target and event. Returns the insert position and the replaced timer.
    fn schedule(&mut self, timer: PendingTimer) -> (usize, Option<PendingTimer>) {
        let replaced = self
            .pending
            .iter()
            .position(|t| t.target == timer.target && eq_ignore_case(&t.event, &timer.event))
            .map(|index| self.pending.remove(index));

        let position = self.pending.partition_point(|t| t.deadline <= timer.deadline);
        self.pending.insert(position, timer);
        (position, replaced)
    }

    /// Undo a [`schedule`](Self::schedule), putting back the replaced timer.
    fn unschedule(&mut self, position: usize, replaced: Option<PendingTimer>) {
        self.pending.remove(position);
        if let Some(timer) = replaced {
            let position = self.pending.partition_point(|t| t.deadline <= timer.deadline);
            self.pending.insert(position, timer);
        }
    }
}

struct Shared {
    queue: Mutex<Queue>,
    wake: Condvar,
    idle: Condvar,
    on_timeout: TimeoutHandler,
    thread_name: String,
}

/// Current time in epoch milliseconds.
pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// The pending-timer set and its worker.
pub struct TimerSet {
    shared: Arc<Shared>,
}

impl TimerSet {
    pub fn new<F>(thread_name: impl Into<String>, on_timeout: F) -> Self
    where
        F: Fn(&LayerId, &str) + Send + Sync + 'static,
    {
        Self {
            shared: Arc::new(Shared {
                queue: Mutex::new(Queue::default()),
                wake: Condvar::new(),
                idle: Condvar::new(),
                on_timeout: Arc::new(on_timeout),
                thread_name: thread_name.into(),
            }),
        }
    }

    /// Schedule `event` for `target` at `deadline` (epoch ms).
    ///
    /// Any timer already pending for the same target and event is replaced.
    pub fn register(&self, target: LayerId, event: &str, deadline: i64) -> Result<(), TimerError> {
        let mut queue = self.shared.queue.lock();

        let (position, replaced) = queue.schedule(PendingTimer {
            target,
            event: event.to_string(),
            deadline,
        });
        trace!(layer = %target, event, deadline, position, "timer registered");

        if queue.worker_running {
            if position == 0 {
                self.shared.wake.notify_one();
            }
            return Ok(());
        }

        let shared = Arc::clone(&self.shared);
        let spawned = thread::Builder::new()
            .name(self.shared.thread_name.clone())
            .spawn(move || run_worker(shared));

        match spawned {
            Ok(_) => {
                queue.worker_running = true;
                Ok(())
            }
            Err(e) => {
                error!(error = %e, "Failed to spawn timer worker");
                queue.unschedule(position, replaced);
                Err(TimerError::SpawnFailed(e))
            }
        }
    }

    /// Snapshot of pending timers, earliest first.
    pub fn pending(&self) -> Vec<PendingTimer> {
        self.shared.queue.lock().pending.clone()
    }

    pub fn len(&self) -> usize {
        self.shared.queue.lock().pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_running(&self) -> bool {
        self.shared.queue.lock().worker_running
    }

    /// Drop every pending timer; a sleeping worker wakes and exits.
    pub fn clear(&self) {
        let mut queue = self.shared.queue.lock();
        queue.pending.clear();
        self.shared.wake.notify_all();
    }

    /// Block until the worker has drained the set and exited, or `timeout`
    /// elapses. Returns whether the worker is idle.
    pub fn wait_idle(&self, timeout: Duration) -> bool {
        // Too far out to represent: wait without a deadline.
        let deadline = Instant::now().checked_add(timeout);
        let mut queue = self.shared.queue.lock();

        while queue.worker_running {
            match deadline {
                Some(deadline) => {
                    if self.shared.idle.wait_until(&mut queue, deadline).timed_out() {
                        return !queue.worker_running;
                    }
                }
                None => self.shared.idle.wait(&mut queue),
            }
        }
        true
    }
}

impl Drop for TimerSet {
    fn drop(&mut self) {
        self.clear();
    }
}

/// Clears the running flag if the worker unwinds out of a timeout callback,
/// so the next registration spawns a fresh worker.
struct UnwindGuard<'a>(&'a Shared);

impl Drop for UnwindGuard<'_> {
    fn drop(&mut self) {
        if thread::panicking() {
            let mut queue = self.0.queue.lock();
            queue.worker_running = false;
            self.0.idle.notify_all();
            error!(pending = queue.pending.len(), "timer worker panicked in timeout callback");
        }
    }
}

fn run_worker(shared: Arc<Shared>) {
    let _unwind = UnwindGuard(&shared);
    let mut queue = shared.queue.lock();

    loop {
        let Some(next) = queue.pending.first() else {
            break;
        };

        let now = now_millis();
        if next.deadline > now {
            let wait = Duration::from_millis((next.deadline - now).unsigned_abs());
            // Re-check from the top: an earlier timer may have arrived.
            shared.wake.wait_for(&mut queue, wait);
            continue;
        }

        let expired = queue.pending.remove(0);
        trace!(layer = %expired.target, event = %expired.event, "timer expired");
        MutexGuard::unlocked(&mut queue, || {
            (shared.on_timeout)(&expired.target, &expired.event);
        });
    }

    queue.worker_running = false;
    shared.idle.notify_all();
}
