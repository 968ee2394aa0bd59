//! Core timer engine for LazyTimer.
//! This crate is the single source of truth for timer and activation invariants.

pub mod activation;
pub mod config;
pub mod logging;
pub mod model;
pub mod parser;
pub mod registry;
pub mod scheduler;
pub mod service;

pub use activation::channel::{
    acquire_role, send_activation, ActivationConfig, ActivationError, ActivationEvent,
    ActivationListener, InstanceRole, ACTIVATION_TOKEN, DEFAULT_ACTIVATION_ADDR,
};
pub use config::{default_log_dir, AppConfig};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::timer::{format_hms, Timer, TimerId, TimerView, DEFAULT_TIMER_LABEL};
pub use parser::duration::{parse_timer_input, ParseError, TimerSpec, TRAILING_MARKER};
pub use registry::timer_registry::{RegistryError, TimerRegistry};
pub use scheduler::expiry::{
    run_tick, ExpiryScheduler, NotificationError, NotificationMode, Notifier, SchedulerConfig,
    SchedulerError, SchedulerHandle, TickReport,
};
pub use service::timer_service::{SubmitError, TimerService};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
