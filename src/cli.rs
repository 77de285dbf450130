use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Extract, analyse and catalogue uploaded books
#[derive(Parser, Debug)]
#[command(name = "booklens", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Process an invocation event and print the outcome as JSON
    Process {
        /// Path to the event JSON, or `-` to read stdin
        event: PathBuf,

        /// Print the full per-item report instead of the invocation response
        #[arg(long, default_value_t = false)]
        report: bool,
    },

    /// Print the stored metadata row for an item as JSON
    Status {
        /// Item identifier (source file name without extension)
        item_id: String,
    },

    /// Print the effective configuration as JSON
    Config,
}

