//! Timer domain model.
//!
//! # Responsibility
//! - Define the `Timer` record stored by the registry.
//! - Project timers into display rows (`TimerView`).
//!
//! # Invariants
//! - `deadline` is an absolute monotonic instant; remaining time is always
//!   recomputed against a caller-supplied `now`.
//! - `label` is never empty; empty labels fall back to `DEFAULT_TIMER_LABEL`.

use serde::Serialize;
use std::time::{Duration, Instant};
use uuid::Uuid;

/// Placeholder label used when the user supplies none.
pub const DEFAULT_TIMER_LABEL: &str = "Timer";

/// Correlation identifier for one timer.
///
/// Timers are addressed by list position; the ID only ties log lines and
/// notifications back to the timer that produced them.
pub type TimerId = Uuid;

/// One outstanding countdown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Timer {
    pub id: TimerId,
    pub label: String,
    /// Requested duration as parsed from input.
    pub duration_secs: u64,
    pub deadline: Instant,
}

impl Timer {
    /// Creates a timer expiring `duration` after `now`.
    ///
    /// Returns `None` when the deadline is not representable on this
    /// platform's monotonic clock.
    pub fn starting_at(now: Instant, duration: Duration, label: impl Into<String>) -> Option<Self> {
        let deadline = now.checked_add(duration)?;
        let label = label.into();
        let label = if label.trim().is_empty() {
            DEFAULT_TIMER_LABEL.to_string()
        } else {
            label
        };
        Some(Self {
            id: Uuid::new_v4(),
            label,
            duration_secs: duration.as_secs(),
            deadline,
        })
    }

    /// Returns whether the timer has reached zero or below at `now`.
    pub fn is_due(&self, now: Instant) -> bool {
        self.deadline <= now
    }

    /// Remaining time at `now`, saturating at zero.
    pub fn remaining(&self, now: Instant) -> Duration {
        self.deadline.saturating_duration_since(now)
    }

    /// Remaining whole seconds, rounded up so a running timer never shows 0.
    pub fn remaining_secs(&self, now: Instant) -> u64 {
        let remaining = self.remaining(now);
        let secs = remaining.as_secs();
        if remaining.subsec_nanos() > 0 {
            secs + 1
        } else {
            secs
        }
    }

    /// Builds a display row for this timer.
    pub fn view(&self, now: Instant) -> TimerView {
        let remaining_secs = self.remaining_secs(now);
        TimerView {
            id: self.id,
            label: self.label.clone(),
            remaining_secs,
            formatted: format!("{} {}", format_hms(remaining_secs), self.label),
        }
    }
}

/// Display projection of one timer at a given instant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimerView {
    pub id: TimerId,
    pub label: String,
    pub remaining_secs: u64,
    /// `HH:MM:SS label`; hours are not wrapped at 24.
    pub formatted: String,
}

/// Formats seconds as `HH:MM:SS`.
pub fn format_hms(total_secs: u64) -> String {
    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;
    let seconds = total_secs % 60;
    format!("{hours:02}:{minutes:02}:{seconds:02}")
}
