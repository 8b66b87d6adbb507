//! RaidPlan persistence server
//!
//! Stores plans and resolves their share and edit tokens.
//!
//! ## Endpoints
//!
//! - `POST /raidplans` creates a plan and returns it with both tokens.
//! - `GET /raidplans/{token}` resolves a share (read-only) or edit token.
//! - `PUT /raidplans/{token}` replaces name, boss and content; needs the edit token.
//!   Overlapping updates from different clients resolve as last write wins.
//! - `GET /health`

mod config;
mod error;
mod routes;

use config::{ServerConfig, StorageConfig};
use raidplan_core::{FileStorage, MemoryStorage, PlanStore};
use std::sync::Arc;
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "raidplan_server=info,raidplan_core=info,tower_http=info".into()),
        )
        .init();

    let config = ServerConfig::from_env()?;
    let store: Arc<dyn PlanStore> = match &config.storage {
        StorageConfig::Memory => {
            info!("Keeping plans in memory");
            Arc::new(MemoryStorage::new())
        }
        StorageConfig::Files(path) => {
            info!("Storing plans under {}", path.display());
            Arc::new(FileStorage::new(path.clone())?)
        }
    };

    let app = routes::router(Arc::new(routes::AppState::new(store)));

    info!("RaidPlan server listening on {}", config.addr);
    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
