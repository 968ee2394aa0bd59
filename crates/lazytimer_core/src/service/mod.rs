//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate parser and registry calls into use-case level APIs.
//! - Keep presentation layers decoupled from locking and parsing details.

pub mod timer_service;
