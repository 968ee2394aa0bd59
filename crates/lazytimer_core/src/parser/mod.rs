//! Input parsers.
//!
//! # Responsibility
//! - Convert raw single-line user input into typed timer requests.
//! - Stay pure and stateless; callers decide how to surface failures.

pub mod duration;
