//! Timer use-case service.
//!
//! # Responsibility
//! - Turn one raw input line into a registered timer.
//! - Provide display rows for the presentation layer.
//!
//! # Invariants
//! - Rejected input never mutates the registry.
//! - User-entered label text is not written to logs.

use crate::model::timer::{TimerId, TimerView};
use crate::parser::duration::{parse_timer_input, ParseError};
use crate::registry::timer_registry::{RegistryError, TimerRegistry};
use log::warn;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;
use std::time::Instant;

/// Failure to create a timer from input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitError {
    Parse(ParseError),
    Registry(RegistryError),
}

impl Display for SubmitError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Parse(err) => write!(f, "{err}"),
            Self::Registry(err) => write!(f, "{err}"),
        }
    }
}

impl Error for SubmitError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Parse(err) => Some(err),
            Self::Registry(err) => Some(err),
        }
    }
}

impl From<ParseError> for SubmitError {
    fn from(value: ParseError) -> Self {
        Self::Parse(value)
    }
}

impl From<RegistryError> for SubmitError {
    fn from(value: RegistryError) -> Self {
        Self::Registry(value)
    }
}

/// Use-case wrapper over a shared timer registry.
#[derive(Debug, Clone)]
pub struct TimerService {
    registry: Arc<TimerRegistry>,
}

impl TimerService {
    pub fn new(registry: Arc<TimerRegistry>) -> Self {
        Self { registry }
    }

    /// Parses `input` and registers the resulting timer.
    ///
    /// # Contract
    /// - On error the line is discarded and the failure is logged.
    /// - Callers must not treat an error as fatal.
    pub fn submit(&self, input: &str) -> Result<TimerId, SubmitError> {
        let result = parse_timer_input(input)
            .map_err(SubmitError::from)
            .and_then(|spec| {
                self.registry
                    .add(spec.duration(), spec.label)
                    .map_err(SubmitError::from)
            });

        if let Err(err) = &result {
            warn!(
                "event=timer_submit module=service status=rejected input_chars={} error={}",
                input.chars().count(),
                error_code(err)
            );
        }
        result
    }

    /// Display rows for the current timers at `now`.
    pub fn list(&self, now: Instant) -> Vec<TimerView> {
        self.registry.views(now)
    }

    /// Shared registry handle for the scheduler.
    pub fn registry(&self) -> Arc<TimerRegistry> {
        Arc::clone(&self.registry)
    }
}

fn error_code(err: &SubmitError) -> &'static str {
    match err {
        SubmitError::Parse(ParseError::EmptyInput) => "empty_input",
        SubmitError::Parse(ParseError::InvalidSpec(_)) => "invalid_spec",
        SubmitError::Parse(ParseError::Overflow(_)) => "duration_overflow",
        SubmitError::Registry(RegistryError::DeadlineOutOfRange { .. }) => {
            "deadline_out_of_range"
        }
    }
}
