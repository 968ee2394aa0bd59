//! Domain model for countdown timers.
//!
//! # Responsibility
//! - Define the canonical timer record shared by registry, scheduler and UI.
//! - Provide display projections that never borrow live registry state.
//!
//! # Invariants
//! - A timer's deadline is fixed at creation and never decremented.
//! - List identity is insertion position; `TimerId` exists for correlation.

pub mod timer;
