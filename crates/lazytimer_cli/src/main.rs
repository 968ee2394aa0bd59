//! LazyTimer entry point.
//!
//! # Responsibility
//! - Resolve configuration and start logging.
//! - Become the primary instance, or wake the running one and exit.

mod app;
mod args;
mod entry;
mod notifier;

use anyhow::{anyhow, Context, Result};
use args::Args;
use clap::Parser;
use lazytimer_core::{acquire_role, init_logging, InstanceRole};
use log::error;

fn main() -> Result<()> {
    let args = Args::parse();
    let config = args.to_config();
    config
        .validate()
        .map_err(|err| anyhow!(err))
        .context("invalid configuration")?;
    init_logging(&config.log_level, &config.log_dir)
        .map_err(|err| anyhow!(err))
        .context("failed to initialize logging")?;

    let role = match acquire_role(&config.activation) {
        Ok(role) => role,
        Err(err) => {
            error!("event=app_start module=cli status=error error={}", err);
            return Err(err).context("could not start or reach a running lazytimer");
        }
    };

    match role {
        InstanceRole::Client => {
            println!("lazytimer is already running; asked it to show its window.");
            Ok(())
        }
        InstanceRole::Primary(listener) => app::run_primary(
            listener,
            notifier::build(args.notifier),
            config.scheduler,
        ),
    }
}
