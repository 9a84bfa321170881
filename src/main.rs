//! cloud CLI - sync a local folder with cloud object storage.
//!
//! Credentials live in `~/.cloudcore`, the container list in `./.cloud`
//! and ignore patterns in `./.cloudignore`. Any failure terminates the
//! run with a structured exit code: 2 for config problems, 3 for
//! storage/auth problems, 4 when only some files failed to sync.

mod cli;
mod config;
mod ignore;
mod storage;
mod sync;

use clap::Parser;
use cli::{Cli, Commands};
use colored::Colorize;
use config::ConfigError;
use std::process::ExitCode;
use storage::StorageError;
use sync::PartialSync;

fn main() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Init => cli::commands::init(),
        Commands::Sync { container } => cli::commands::sync(container),
        Commands::Url { container } => cli::commands::url(container),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{} {err:#}", "error:".red().bold());
            exit_code_for(&err)
        }
    }
}

/// Single decision point mapping error kinds to process exit codes
fn exit_code_for(err: &anyhow::Error) -> ExitCode {
    if err.downcast_ref::<ConfigError>().is_some() {
        ExitCode::from(2)
    } else if err.downcast_ref::<StorageError>().is_some() {
        ExitCode::from(3)
    } else if err.downcast_ref::<PartialSync>().is_some() {
        ExitCode::from(4)
    } else {
        ExitCode::FAILURE
    }
}
