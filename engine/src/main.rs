// Wayfarer travel assistant
// Main entry point for the wayfarer binary

use clap::Parser;
use wayfarer_engine::cli::{Cli, Command};
use wayfarer_engine::config::Config;
use wayfarer_engine::handlers::{handle_ask, handle_serve};
use wayfarer_engine::telemetry::{init_telemetry, init_telemetry_with_level};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Initialize basic telemetry first (before config is loaded)
    init_telemetry();

    tracing::info!("Wayfarer v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration (or use custom path if provided)
    let config = if let Some(config_path) = &cli.config {
        Config::load_from_path(config_path)?
    } else {
        Config::load_or_create()?
    };

    // Re-initialize telemetry with config-driven log level
    // (only takes effect if RUST_LOG env var is not set)
    init_telemetry_with_level(&config.core.log_level);

    match cli.command {
        Command::Serve { host, port } => handle_serve(host, port, &config).await,
        Command::Ask { session, message } => handle_ask(session, message, &config).await,
    }
}
