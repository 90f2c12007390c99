use clap::Parser;

use crate::domain::error::Result;
use crate::infrastructure::config::AppConfig;
use crate::infrastructure::logging;
use crate::interfaces::cli::{self, Cli};

/// Parses arguments, loads configuration, installs logging and dispatches.
/// Returns the process exit code.
pub fn run() -> i32 {
    let cli = Cli::parse();
    match dispatch(cli) {
        Ok(()) => 0,
        Err(err) => {
            tracing::error!(error = %err, "Command failed");
            eprintln!("Error: {}", err);
            1
        }
    }
}

fn dispatch(cli: Cli) -> Result<()> {
    let config = AppConfig::load(cli.config.as_deref())?;
    logging::init(&config.log_filter);
    tracing::debug!(command = ?cli.command, "Starting");
    cli::run(cli, &config)
}
