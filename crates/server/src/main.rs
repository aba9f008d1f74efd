//! sw-cache server entry point.
//!
//! Loads configuration, brings the service worker up (install, then
//! activate when skip-waiting is set), starts the periodic sweep and serves
//! the worker's events as MCP tools on stdio.
//! Logging goes to stderr to avoid interfering with the JSON-RPC protocol on stdout.

use std::sync::Arc;

use anyhow::Result;
use rmcp::service::serve_server;
use rmcp::transport::io::stdio;
use swcache_core::{AppConfig, CacheDb};
use swcache_worker::{FetchConfig, HttpNetwork, ServiceWorker, WorkerState};
use tracing_subscriber::EnvFilter;

mod error;
mod handler;
mod tools;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .json()
        .init();

    let config = AppConfig::load()?;
    tracing::info!(
        origin = %config.origin,
        version = %config.version,
        db_path = %config.db_path.display(),
        "Starting sw-cache server on stdio transport"
    );

    let db = CacheDb::open(&config.db_path).await?;
    let network = HttpNetwork::new(FetchConfig::from(&config))?;
    let worker = Arc::new(ServiceWorker::new(config, Arc::new(db), Arc::new(network))?);

    match worker.install().await {
        Ok(report) => {
            tracing::info!(stored = report.precache.stored, total = report.precache.total, "worker installed");
            if report.skip_waiting && worker.state() == WorkerState::Waiting {
                let report = worker.activate().await?;
                tracing::info!(deleted = ?report.deleted, "worker activated");
            }
        }
        Err(e) => tracing::error!(error = %e, "install failed; serving with worker redundant"),
    }

    let sweep = worker.spawn_sweep();

    let handler = handler::SwCacheServer::new(Arc::clone(&worker));
    let transport = stdio();
    let server = serve_server(handler, transport).await?;

    server.waiting().await?;

    sweep.abort();
    let settled = worker.settle().await;
    tracing::info!(settled, "sw-cache server stopped");

    Ok(())
}
