//! Thread-safe registry of outstanding timers.
//!
//! # Responsibility
//! - Append timers in insertion order.
//! - Provide consistent snapshots for display.
//! - Partition due timers out of the live set atomically.
//!
//! # Invariants
//! - The internal list is only touched while holding `state`.
//! - `evaluate_and_prune` returns exactly the timers it removes.
//! - A poisoned lock is recovered; every mutation leaves the list valid.

use crate::model::timer::{Timer, TimerId, TimerView};
use log::{debug, info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

/// Registry mutation errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// `now + duration` does not fit the monotonic clock.
    DeadlineOutOfRange { duration_secs: u64 },
}

impl Display for RegistryError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DeadlineOutOfRange { duration_secs } => {
                write!(f, "timer deadline out of range for {duration_secs}s")
            }
        }
    }
}

impl Error for RegistryError {}

#[derive(Debug, Default)]
struct RegistryState {
    timers: Vec<Timer>,
    expiry_generation: u64,
}

/// Exclusive-access store of the current timer set.
///
/// Share it between the input path and the scheduler through `Arc`.
#[derive(Debug, Default)]
pub struct TimerRegistry {
    state: Mutex<RegistryState>,
}

impl TimerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a timer expiring `duration` from now.
    pub fn add(&self, duration: Duration, label: impl Into<String>) -> Result<TimerId, RegistryError> {
        self.add_at(Instant::now(), duration, label)
    }

    /// Appends a timer expiring `duration` after `now`.
    ///
    /// Duplicate labels and durations are allowed; there is no size cap.
    pub fn add_at(
        &self,
        now: Instant,
        duration: Duration,
        label: impl Into<String>,
    ) -> Result<TimerId, RegistryError> {
        let Some(timer) = Timer::starting_at(now, duration, label) else {
            warn!(
                "event=timer_add module=registry status=error error_code=deadline_out_of_range duration_secs={}",
                duration.as_secs()
            );
            return Err(RegistryError::DeadlineOutOfRange {
                duration_secs: duration.as_secs(),
            });
        };

        let id = timer.id;
        let duration_secs = timer.duration_secs;
        let label_chars = timer.label.chars().count();
        let count = {
            let mut state = self.lock();
            state.timers.push(timer);
            state.timers.len()
        };

        info!(
            "event=timer_add module=registry status=ok id={} duration_secs={} label_chars={} count={}",
            id, duration_secs, label_chars, count
        );
        Ok(id)
    }

    /// Returns a copy of the current timers in insertion order.
    pub fn snapshot(&self) -> Vec<Timer> {
        self.lock().timers.clone()
    }

    /// Returns display rows for the current timers at `now`.
    pub fn views(&self, now: Instant) -> Vec<TimerView> {
        let timers = self.snapshot();
        timers.iter().map(|timer| timer.view(now)).collect()
    }

    /// Removes and returns every timer due at `now`.
    ///
    /// # Contract
    /// - Runs under a single lock acquisition.
    /// - Returned timers keep insertion order and are gone from the registry.
    /// - Calling again with the same `now` and no adds returns an empty set.
    pub fn evaluate_and_prune(&self, now: Instant) -> Vec<Timer> {
        let mut state = self.lock();
        let (due, pending): (Vec<Timer>, Vec<Timer>) =
            std::mem::take(&mut state.timers)
                .into_iter()
                .partition(|timer| timer.is_due(now));
        state.timers = pending;
        if !due.is_empty() {
            state.expiry_generation += 1;
        }
        let remaining = state.timers.len();
        drop(state);

        if !due.is_empty() {
            debug!(
                "event=timer_prune module=registry status=ok due={} remaining={}",
                due.len(),
                remaining
            );
        }
        due
    }

    /// Counter bumped by every prune that removed at least one timer.
    ///
    /// UI layers compare it across ticks to refresh only after an expiry.
    pub fn expiry_generation(&self) -> u64 {
        self.lock().expiry_generation
    }

    pub fn len(&self) -> usize {
        self.lock().timers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().timers.is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, RegistryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
