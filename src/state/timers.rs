//! Registry of named, cancellable timers backed by tokio tasks.
//!
//! Every role owns at most one live timer. Scheduling a role that is already armed cancels
//! the previous instance first, and a cancelled timer never invokes its callback afterwards:
//! the firing task checks a gate under lock before calling back, and [`TimerService::cancel`]
//! closes that gate under the same lock before returning.

use std::{
    collections::HashMap,
    fmt,
    sync::{Arc, Mutex},
    time::Duration,
};

use serde::Serialize;
use tokio::{
    task::JoinHandle,
    time::{self, Instant, MissedTickBehavior},
};
use tracing::trace;

/// Closed set of timer roles used by a round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TimerRole {
    /// Delay between the question cue and the start of the excerpt.
    CueLead,
    /// Stops the excerpt once its fixed duration elapsed.
    ExcerptStop,
    /// One-second countdown ticks while players may buzz.
    Countdown,
    /// Keeps the wrong-answer message on screen before play resumes.
    TransientMessage,
}

impl fmt::Display for TimerRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TimerRole::CueLead => "cueLead",
            TimerRole::ExcerptStop => "excerptStop",
            TimerRole::Countdown => "countdown",
            TimerRole::TransientMessage => "transientMessage",
        };
        f.write_str(name)
    }
}

/// Whether a timer fires once or on a fixed interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerMode {
    /// Fire a single time after the delay.
    Once,
    /// Fire every `delay` until cancelled.
    Periodic,
}

/// Identifies one scheduled instance of a role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerHandle {
    /// Role this instance belongs to.
    pub role: TimerRole,
    /// Monotonic instance number, unique per service.
    pub generation: u64,
}

struct TimerEntry {
    generation: u64,
    mode: TimerMode,
    armed: Arc<Mutex<bool>>,
    task: JoinHandle<()>,
}

impl TimerEntry {
    fn disarm(self) {
        // Once the gate is closed under lock no callback can start; one already running
        // has returned by the time we acquire it.
        match self.armed.lock() {
            Ok(mut armed) => *armed = false,
            Err(poisoned) => *poisoned.into_inner() = false,
        }
        self.task.abort();
    }
}

/// Owner of all live timers of a round controller.
///
/// Callbacks run on a tokio worker while the cancellation gate is held, so they must be
/// short and must not call back into the service.
#[derive(Default)]
pub struct TimerService {
    entries: HashMap<TimerRole, TimerEntry>,
    next_generation: u64,
}

impl TimerService {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm `role`, replacing any live instance of it.
    ///
    /// Must be called from within a tokio runtime.
    pub fn schedule<F>(
        &mut self,
        role: TimerRole,
        delay: Duration,
        mode: TimerMode,
        mut callback: F,
    ) -> TimerHandle
    where
        F: FnMut(TimerHandle) + Send + 'static,
    {
        self.cancel(role);

        self.next_generation += 1;
        let handle = TimerHandle {
            role,
            generation: self.next_generation,
        };
        let armed = Arc::new(Mutex::new(true));
        let gate = armed.clone();

        let task = tokio::spawn(async move {
            match mode {
                TimerMode::Once => {
                    time::sleep(delay).await;
                    fire(&gate, handle, &mut callback);
                }
                TimerMode::Periodic => {
                    let mut interval = time::interval_at(Instant::now() + delay, delay);
                    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
                    loop {
                        interval.tick().await;
                        if !fire(&gate, handle, &mut callback) {
                            break;
                        }
                    }
                }
            }
        });

        trace!(timer = %role, generation = handle.generation, ?delay, ?mode, "timer scheduled");
        self.entries.insert(
            role,
            TimerEntry {
                generation: handle.generation,
                mode,
                armed,
                task,
            },
        );
        handle
    }

    /// Cancel `role` if it is live; a no-op otherwise.
    pub fn cancel(&mut self, role: TimerRole) {
        if let Some(entry) = self.entries.remove(&role) {
            trace!(timer = %role, generation = entry.generation, "timer cancelled");
            entry.disarm();
        }
    }

    /// Cancel every live timer.
    pub fn cancel_all(&mut self) {
        for (_, entry) in self.entries.drain() {
            entry.disarm();
        }
    }

    /// True when `handle` is still the live instance of its role.
    pub fn is_current(&self, handle: TimerHandle) -> bool {
        self.entries
            .get(&handle.role)
            .is_some_and(|entry| entry.generation == handle.generation)
    }

    /// Retire a one-shot timer after its expiration has been handled.
    ///
    /// Periodic timers stay registered until cancelled.
    pub fn complete(&mut self, handle: TimerHandle) {
        let retire = self.entries.get(&handle.role).is_some_and(|entry| {
            entry.generation == handle.generation && entry.mode == TimerMode::Once
        });
        if retire {
            self.entries.remove(&handle.role);
        }
    }

    /// Whether a live timer exists for `role`.
    pub fn is_scheduled(&self, role: TimerRole) -> bool {
        self.entries.contains_key(&role)
    }

    /// Number of live timers.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no timer is live.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Drop for TimerService {
    fn drop(&mut self) {
        self.cancel_all();
    }
}

fn fire<F>(gate: &Mutex<bool>, handle: TimerHandle, callback: &mut F) -> bool
where
    F: FnMut(TimerHandle),
{
    let armed = match gate.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    };
    if !*armed {
        return false;
    }
    callback(handle);
    true
}
