//! vfctl - SR-IOV VF attachment netconf tool
//!
//! Resolves a VF netconf against host sysfs, caches the result keyed by
//! container ID and interface name, and reads it back at teardown.

use std::process::ExitCode;

use clap::Parser;
use tracing::debug;

mod commands;
mod config;
mod error;
mod logging;
mod output;

use commands::Cli;

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = logging::init(cli.log_json()) {
        eprintln!("Failed to initialize logging: {}", e);
        return ExitCode::from(1);
    }

    match cli.run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            debug!(
                error = %e,
                reason = error::reason_code(&e).unwrap_or("internal"),
                "Command failed"
            );
            error::print_error(&e);
            ExitCode::from(1)
        }
    }
}
