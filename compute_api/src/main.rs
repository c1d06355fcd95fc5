use anyhow::Context;
use log::info;
use tokio::sync::oneshot;

use compute_api::{load_compute_config, start_server, NodeManager, NotificationHub};
use instance_api::GLOBAL_INSTANCE_REGISTRY;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    env_logger::init();

    let config = load_compute_config(None).context("Failed to load compute configuration")?;
    let manager = NodeManager::new(
        &config.projects_directory,
        GLOBAL_INSTANCE_REGISTRY.clone(),
        NotificationHub::new(),
    );

    let (shutdown_tx, shutdown_rx) = oneshot::channel();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Received Ctrl-C, shutting down compute API server.");
            let _ = shutdown_tx.send(());
        }
    });

    start_server(&config, manager, shutdown_rx).await
}
