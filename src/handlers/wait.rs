//! Simulated waiting-time endpoint
//!
//! Answers `centers.wait` with the body a queue service would send, so the
//! worker can run end to end without one.

use anyhow::Result;
use async_nats::{Client, Subscriber};
use futures::StreamExt;
use tracing::{debug, error};

use crate::services::waiting_time::RandomWaitingTimeSource;
use crate::types::WaitingTimeRequest;

/// Handle centers.wait messages
pub async fn handle_wait(client: Client, mut subscriber: Subscriber) -> Result<()> {
    let source = RandomWaitingTimeSource;

    while let Some(msg) = subscriber.next().await {
        let reply = match msg.reply {
            Some(ref reply) => reply.clone(),
            None => {
                error!("Waiting-time message without reply subject");
                continue;
            }
        };

        match serde_json::from_slice::<WaitingTimeRequest>(&msg.payload) {
            Ok(request) => debug!("Simulating queue for site {}", request.site_id),
            Err(e) => debug!("Waiting-time request without site id: {}", e),
        }

        let response = source.simulate();
        client.publish(reply, serde_json::to_vec(&response)?.into()).await?;
    }

    Ok(())
}
