//! # agora-server
//!
//! Channel membership server for Agora.
//!
//! This binary provides:
//! - **Batch membership changes**: add one user to, or remove one user from,
//!   many channels in a single call, with one client event per batch
//! - **Membership caches** per user and per channel, invalidated on change
//! - **Event hub** that client transports subscribe to
//! - **REST API** (axum) exposing the plugin operations and cached reads

mod api;
mod cache;
mod config;
mod error;
mod hub;
mod membership;
mod plugin_api;
mod ports;
mod sqlite;

#[cfg(test)]
mod test_support;

use std::sync::Arc;

use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use agora_store::Database;

use crate::api::AppState;
use crate::cache::MembershipCache;
use crate::config::ServerConfig;
use crate::hub::EventHub;
use crate::membership::BatchMembershipService;
use crate::plugin_api::PluginApi;
use crate::sqlite::SqliteBackend;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // -----------------------------------------------------------------------
    // 1. Initialize tracing (respects RUST_LOG env var)
    // -----------------------------------------------------------------------
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,agora_server=debug")),
        )
        .init();

    info!("Starting Agora server v{}", env!("CARGO_PKG_VERSION"));

    // -----------------------------------------------------------------------
    // 2. Load configuration
    // -----------------------------------------------------------------------
    let config = ServerConfig::from_env();
    info!(?config, "Loaded configuration");

    // -----------------------------------------------------------------------
    // 3. Open the store and wire the membership service
    // -----------------------------------------------------------------------
    let database = match &config.database_path {
        Some(path) => {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            Database::open_at(path)?
        }
        None => Database::new()?,
    };
    let backend = Arc::new(SqliteBackend::new(database));
    let cache = Arc::new(MembershipCache::new(backend.clone()));
    let hub = EventHub::new(config.event_buffer);

    let service = BatchMembershipService::new(
        backend.clone(),
        backend.clone(),
        backend,
        cache.clone(),
        Arc::new(hub.clone()),
    );

    let app_state = AppState {
        plugin: PluginApi::new(Arc::new(service)),
        cache,
        hub,
        config: Arc::new(config.clone()),
    };

    // -----------------------------------------------------------------------
    // 4. Log published client events until a transport subscribes
    // -----------------------------------------------------------------------
    let mut events = app_state.hub.subscribe();
    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) => debug!(
                    event = %event.event,
                    team_id = %event.team_id,
                    user_id = %event.user_id,
                    "client event"
                ),
                Err(RecvError::Lagged(skipped)) => warn!(skipped, "event log lagging"),
                Err(RecvError::Closed) => break,
            }
        }
    });

    // -----------------------------------------------------------------------
    // 5. Run the HTTP API server (blocks until shutdown)
    // -----------------------------------------------------------------------
    tokio::select! {
        result = api::serve(app_state, config.http_addr) => {
            if let Err(e) = result {
                tracing::error!(error = %e, "HTTP server failed");
                return Err(e);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down");
        }
    }

    Ok(())
}
