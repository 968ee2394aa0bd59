//! Single-instance activation over a loopback control socket.
//!
//! # Responsibility
//! - Decide whether this process is the primary instance or a client.
//! - Let client launches ask the primary to surface its window.
//!
//! # Invariants
//! - Primary and client paths use the same configured address.
//! - The channel is best-effort and unauthenticated; it never replies.

pub mod channel;
