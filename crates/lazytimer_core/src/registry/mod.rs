//! Shared timer storage.
//!
//! # Responsibility
//! - Own the live set of outstanding timers behind one exclusive lock.
//! - Hand out copies only, so callers never need external synchronization.
//!
//! # Invariants
//! - Every read and write acquires the registry lock for one call only.
//! - A timer reported as due is removed in the same lock acquisition.

pub mod timer_registry;
