use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use rmcp::ServiceExt;
use rmcp::transport::stdio;
use tracing_subscriber::EnvFilter;

use mcp_hotel::adapters::dataset::Dataset;
use mcp_hotel::adapters::memory_store::InMemoryStore;
use mcp_hotel::config::load_config;
use mcp_hotel::config::types::{Config, StoreConfig};
use mcp_hotel::engine::ReservationEngine;
use mcp_hotel::mcp::server::HotelMcpServer;

fn find_config_path() -> PathBuf {
    let candidates = [
        PathBuf::from("config.yaml"),
        dirs_next().join("config.yaml"),
    ];

    for path in &candidates {
        if path.exists() {
            return path.clone();
        }
    }

    candidates[0].clone()
}

fn dirs_next() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|p| p.parent().map(Path::to_path_buf))
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Existing data file wins; otherwise seed the demo property (or start
/// empty). Snapshots are JSON, which YAML loaders also accept.
fn open_store(store: &StoreConfig, owner_id: &str) -> Result<InMemoryStore> {
    match &store.data_path {
        Some(path) if path.exists() => {
            if store.persist {
                InMemoryStore::open(path)
                    .with_context(|| format!("loading dataset {}", path.display()))
            } else {
                let dataset = Dataset::from_path(path)
                    .with_context(|| format!("loading dataset {}", path.display()))?;
                Ok(InMemoryStore::new(dataset))
            }
        }
        data_path => {
            let dataset = if store.seed_demo {
                tracing::info!(owner = owner_id, "Seeding demo property");
                Dataset::demo(owner_id)
            } else {
                Dataset::default()
            };
            match data_path {
                Some(path) if store.persist => {
                    tracing::info!(path = %path.display(), "Dataset file will be created on first change");
                    Ok(InMemoryStore::with_snapshot(dataset, path.clone()))
                }
                _ => Ok(InMemoryStore::new(dataset)),
            }
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logging goes to stderr; stdout carries MCP JSON-RPC
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    tracing::info!("Starting mcp-hotel server");

    let config_path = find_config_path();
    let Config {
        tenant,
        store,
        reports,
    } = load_config(&config_path)?;

    let store = Arc::new(open_store(&store, &tenant.owner_id)?);
    let engine = Arc::new(ReservationEngine::new(store, reports));
    let server = HotelMcpServer::new(engine, tenant.owner_id);

    let service = server.serve(stdio()).await?;
    service.waiting().await?;

    Ok(())
}
