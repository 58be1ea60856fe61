//! Command handlers
//!
//! Implementations of the CLI commands: build the dependency graph
//! (database → session store, provider, weather lookup → agent core) and
//! run either the HTTP server or a single terminal turn.

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;

use crate::agent::AgentCore;
use crate::config::Config;
use crate::db::Database;
use crate::llm;
use crate::server;
use crate::tools::WeatherLookup;

/// Wire up an agent core from config
pub async fn build_agent(config: &Config) -> Result<Arc<AgentCore>> {
    let db = Database::new(&config.db_path()).await?;
    let store = Arc::new(db.sessions());
    let provider = llm::build_provider(&config.llm)?;
    let lookup = Arc::new(WeatherLookup::new(&config.weather));

    tracing::info!(
        provider = provider.name(),
        context_window = config.llm.context_window,
        "Agent ready"
    );

    Ok(Arc::new(AgentCore::new(
        provider,
        store,
        lookup,
        config.llm.context_window,
    )))
}

/// Run the HTTP server until shutdown
pub async fn handle_serve(host: Option<String>, port: Option<u16>, config: &Config) -> Result<()> {
    let agent = build_agent(config).await?;

    let host = host.unwrap_or_else(|| config.server.host.clone());
    let port = port.unwrap_or(config.server.port);
    let addr: SocketAddr = format!("{}:{}", host, port)
        .parse()
        .map_err(|e| anyhow::anyhow!("Invalid bind address {}:{}: {}", host, port, e))?;

    server::serve(addr, agent).await
}

/// Run exactly one turn and print the reply
pub async fn handle_ask(session: String, message: String, config: &Config) -> Result<()> {
    let agent = build_agent(config).await?;

    let outcome = agent.process_turn(&session, &message).await?;
    println!("{}", outcome.reply);

    Ok(())
}
