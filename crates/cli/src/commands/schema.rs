//! `teammate schema`: schema operations without the server.

use anyhow::Context;
use teammate_config::AppConfig;
use teammate_gateway::SchemaManager;

fn manager() -> anyhow::Result<SchemaManager> {
    let config = AppConfig::load().context("Failed to load config")?;
    let store = teammate_providers::build_vector_store(&config)
        .context("Failed to build vector store client")?;
    Ok(SchemaManager::new(store, &config.data.schema_path))
}

pub async fn create() -> anyhow::Result<()> {
    let manager = manager()?;
    let created = manager.create().await?;
    println!("Created {created} class(es) from {}", manager.path().display());
    Ok(())
}

pub async fn reset() -> anyhow::Result<()> {
    let manager = manager()?;
    let created = manager.reset().await?;
    println!("Schema reset; {created} class(es) recreated from {}", manager.path().display());
    Ok(())
}

pub async fn status() -> anyhow::Result<()> {
    let manager = manager()?;
    if manager.in_sync().await {
        println!("In sync with {}", manager.path().display());
    } else {
        println!("Out of sync with {}", manager.path().display());
    }
    Ok(())
}
