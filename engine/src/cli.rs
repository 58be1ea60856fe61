//! CLI interface
//!
//! Command-line argument definitions for the `wayfarer` binary.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Wayfarer travel assistant
#[derive(Debug, Parser)]
#[command(name = "wayfarer", version, about = "Travel-planning assistant service")]
pub struct Cli {
    /// Path to a config file (defaults to ~/.wayfarer/config.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the HTTP server
    Serve {
        /// Bind host (overrides config)
        #[arg(long)]
        host: Option<String>,

        /// Bind port (overrides config)
        #[arg(long)]
        port: Option<u16>,
    },

    /// Run a single turn from the terminal and print the reply
    Ask {
        /// Session to converse in
        #[arg(long, default_value = "local")]
        session: String,

        /// The message to send
        message: String,
    },
}
