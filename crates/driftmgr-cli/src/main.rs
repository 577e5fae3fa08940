//! Thin binary exercising the composition root end to end. Argument
//! parsing, a real terminal UI, and output formatting are out of scope
//! here (the dashboard/CLI surface is an external collaborator); this only
//! proves the nine crates wire together into one working `DriftManager`.

use std::path::PathBuf;

use driftmgr_core::config::DriftManagerConfig;
use driftmgr_engine::{init_logging, DriftManager, LoggingConfig};
use tokio_util::sync::CancellationToken;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging(&LoggingConfig::default())?;

    let config = DriftManagerConfig::from_env(Some("driftmgr"))?;
    let manager = DriftManager::new(config);

    info!("driftmgr engine initialized");

    let state_root = std::env::args().nth(1).map(PathBuf::from).unwrap_or_else(|| PathBuf::from("."));
    match manager.load_declared_state(&state_root) {
        Ok(declared) => info!(resources = declared.resources.len(), path = %state_root.display(), "loaded declared state"),
        Err(err) => info!(%err, path = %state_root.display(), "no declared state found"),
    }

    let cancel = CancellationToken::new();
    match manager.run_discovery(&[], &[], &[], cancel).await {
        Ok((job_id, outcome)) => {
            info!(job_id, resources = outcome.inventory.resources.len(), "discovery completed with no providers registered");
        }
        Err(err) => info!(%err, "discovery run failed"),
    }

    Ok(())
}
