//! tandem relay - fan-out message broadcaster
//!
//! Accepts connections from session members and re-broadcasts every
//! inbound frame to all other members, verbatim. Payloads are never
//! interpreted.

use std::sync::Arc;

use tokio::sync::broadcast;
use tracing::{error, info};

use tandem_utils::{init_logging_with_config, LogConfig, Result};

mod config;
mod listener;
mod registry;

use config::RelayConfig;
use listener::RelayListener;
use registry::PeerRegistry;

#[tokio::main]
async fn main() -> Result<()> {
    init_logging_with_config(LogConfig::relay())?;

    let config = RelayConfig::load()?;
    info!("tandem relay starting");

    let registry = Arc::new(PeerRegistry::new());
    let listener =
        RelayListener::bind(&config.listen_addr, Arc::clone(&registry), config.peer_buffer).await?;

    let (shutdown_tx, _) = broadcast::channel(1);

    let ctrlc_shutdown = shutdown_tx.clone();
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for ctrl-c: {}", e);
            return;
        }
        info!("Interrupt received, shutting down");
        let _ = ctrlc_shutdown.send(());
    });

    listener.run(shutdown_tx).await;

    info!("tandem relay stopped");
    Ok(())
}
