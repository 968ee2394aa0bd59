//! Background expiry evaluation.
//!
//! # Responsibility
//! - Poll the timer registry on a fixed cadence and notify due timers.
//! - Keep the notification backend behind the `Notifier` seam.
//!
//! # Invariants
//! - The registry lock is never held while a notification is shown.
//! - A due timer is pruned before it is notified, so it fires at most once.

pub mod expiry;
