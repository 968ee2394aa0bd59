//! Typed application configuration.
//!
//! # Responsibility
//! - Group activation, scheduler and logging settings with defaults.
//! - Validate settings before any thread or socket is created.

use crate::activation::channel::ActivationConfig;
use crate::logging::default_log_level;
use crate::scheduler::expiry::{SchedulerConfig, MIN_PRODUCTION_TICK};
use std::path::PathBuf;

const LOG_DIR_APP_SEGMENT: &str = "lazytimer";

/// Complete runtime configuration for one process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub activation: ActivationConfig,
    pub scheduler: SchedulerConfig,
    pub log_level: String,
    /// Absolute directory for rolling log files.
    pub log_dir: PathBuf,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            activation: ActivationConfig::default(),
            scheduler: SchedulerConfig::default(),
            log_level: default_log_level().to_string(),
            log_dir: default_log_dir(),
        }
    }
}

impl AppConfig {
    /// Validates every section; returns the first problem found.
    pub fn validate(&self) -> Result<(), String> {
        self.activation
            .validate()
            .map_err(|err| format!("activation: {err}"))?;
        self.scheduler
            .validate()
            .map_err(|err| format!("scheduler: {err}"))?;
        if self.scheduler.tick < MIN_PRODUCTION_TICK {
            return Err(format!(
                "scheduler: tick {}ms is below {}ms",
                self.scheduler.tick.as_millis(),
                MIN_PRODUCTION_TICK.as_millis()
            ));
        }
        if !self.log_dir.is_absolute() {
            return Err(format!(
                "log_dir must be an absolute path, got `{}`",
                self.log_dir.display()
            ));
        }
        Ok(())
    }
}

/// `<temp>/lazytimer/logs`.
pub fn default_log_dir() -> PathBuf {
    std::env::temp_dir().join(LOG_DIR_APP_SEGMENT).join("logs")
}
