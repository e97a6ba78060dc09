//! CLI argument parsing for the nearest-centers-worker binary.

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "nearest-centers-worker", about = "Nearest service center lookup worker")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Start the worker server (default if no subcommand given)
    Serve,
    /// Run database migrations and exit
    Migrate,
    /// Rank centers for one address and print the JSON answer
    Lookup {
        /// Free-text address to resolve
        #[arg(long)]
        address: String,
    },
}
