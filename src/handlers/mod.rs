//! NATS message handlers

pub mod nearest;
pub mod ping;
pub mod wait;

use std::sync::Arc;
use anyhow::Result;
use async_nats::Client;
use tracing::{info, error};
use tokio::select;

use crate::services::nearest::NearestCentersService;

pub const SUBJECT_PING: &str = "centers.ping";
pub const SUBJECT_NEAREST: &str = "centers.nearest";
pub const SUBJECT_WAIT: &str = "centers.wait";

/// Start all message handlers
pub async fn start_handlers(client: Client, service: Arc<NearestCentersService>) -> Result<()> {
    info!("Starting message handlers...");

    // Subscribe to all subjects
    let ping_sub = client.subscribe(SUBJECT_PING).await?;
    let nearest_sub = client.subscribe(SUBJECT_NEAREST).await?;
    let wait_sub = client.subscribe(SUBJECT_WAIT).await?;

    info!("Subscribed to NATS subjects: {}, {}, {}", SUBJECT_PING, SUBJECT_NEAREST, SUBJECT_WAIT);

    let client_ping = client.clone();
    let client_nearest = client.clone();
    let client_wait = client.clone();

    // Spawn handlers
    let ping_handle = tokio::spawn(async move {
        ping::handle_ping(client_ping, ping_sub).await
    });

    let nearest_handle = tokio::spawn(async move {
        nearest::handle_nearest(client_nearest, nearest_sub, service).await
    });

    let wait_handle = tokio::spawn(async move {
        wait::handle_wait(client_wait, wait_sub).await
    });

    info!("All handlers started, waiting for messages...");

    // Wait for any handler to finish (which would indicate an error)
    select! {
        result = ping_handle => {
            error!("Ping handler finished: {:?}", result);
        }
        result = nearest_handle => {
            error!("Nearest-centers handler finished: {:?}", result);
        }
        result = wait_handle => {
            error!("Waiting-time handler finished: {:?}", result);
        }
    }

    Ok(())
}
