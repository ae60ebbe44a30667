//! `teammate serve`: start the gateway.

use anyhow::{Context, anyhow};
use teammate_config::AppConfig;
use tracing::info;

pub async fn run(port: Option<u16>, host: Option<String>) -> anyhow::Result<()> {
    let mut config = AppConfig::load().context("Failed to load config")?;
    apply_overrides(&mut config, port, host);

    info!(
        addr = %format!("{}:{}", config.gateway.host, config.gateway.port),
        model = %config.generation.model,
        vector_store = %config.vector_store.url,
        retrieval = config.retrieval.class_name.as_deref().unwrap_or("off"),
        "TeamMate gateway starting"
    );

    teammate_gateway::start(config)
        .await
        .map_err(|e| anyhow!("Gateway failed: {e}"))
}

/// Command-line flags win over the file and environment.
fn apply_overrides(config: &mut AppConfig, port: Option<u16>, host: Option<String>) {
    if let Some(port) = port {
        config.gateway.port = port;
    }
    if let Some(host) = host {
        config.gateway.host = host;
    }
}
