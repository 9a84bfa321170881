//! CLI definitions and command implementations.

pub mod commands;

use clap::{Parser, Subcommand};

/// Sync your data with cloud storages (like Rackspace CloudFiles)
#[derive(Parser)]
#[command(name = "cloud")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize .cloudcore, .cloud and .cloudignore files
    Init,

    /// Synchronize the current folder with the cloud
    Sync {
        /// Container to sync with (default: first in .cloud)
        container: Option<String>,
    },

    /// Print the public URL of a container
    Url {
        /// Container to resolve (default: first in .cloud)
        container: Option<String>,
    },
}
