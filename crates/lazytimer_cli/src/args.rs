//! Command-line and environment configuration.
//!
//! # Responsibility
//! - Parse flags (with environment fallbacks) into the core `AppConfig`.

use clap::{Parser, ValueEnum};
use lazytimer_core::{
    default_log_dir, default_log_level, ActivationConfig, AppConfig, NotificationMode,
    SchedulerConfig, DEFAULT_ACTIVATION_ADDR,
};
use std::path::PathBuf;

/// Backend used to surface expired timers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum NotifierKind {
    /// Blocking platform message box.
    Dialog,
    /// Bell plus a line on stderr.
    Terminal,
}

#[derive(Debug, Parser)]
#[command(
    name = "lazytimer",
    version,
    about = "Named countdown timers from a single line of input"
)]
pub struct Args {
    /// Loopback port shared by every instance for single-instance activation.
    #[arg(long, env = "LAZYTIMER_PORT", default_value_t = DEFAULT_ACTIVATION_ADDR.port())]
    pub port: u16,

    /// trace|debug|info|warn|error; defaults by build mode.
    #[arg(long, env = "LAZYTIMER_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Absolute directory for rolling log files.
    #[arg(long, env = "LAZYTIMER_LOG_DIR")]
    pub log_dir: Option<PathBuf>,

    #[arg(long, env = "LAZYTIMER_NOTIFIER", value_enum, default_value_t = NotifierKind::Dialog)]
    pub notifier: NotifierKind,

    /// Show alerts on a separate thread so expiry checks never wait on them.
    #[arg(long, env = "LAZYTIMER_QUEUED_NOTIFICATIONS")]
    pub queued_notifications: bool,
}

impl Args {
    pub fn to_config(&self) -> AppConfig {
        let mode = if self.queued_notifications {
            NotificationMode::Queued
        } else {
            NotificationMode::Inline
        };
        AppConfig {
            activation: ActivationConfig::with_port(self.port),
            scheduler: SchedulerConfig {
                mode,
                ..SchedulerConfig::default()
            },
            log_level: self
                .log_level
                .clone()
                .unwrap_or_else(|| default_log_level().to_string()),
            log_dir: self.log_dir.clone().unwrap_or_else(default_log_dir),
        }
    }
}
