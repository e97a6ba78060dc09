//! Nearest-centers handler

use std::sync::Arc;

use anyhow::Result;
use async_nats::{Client, Subscriber};
use futures::StreamExt;
use tracing::{debug, error, warn};
use uuid::Uuid;

use crate::services::nearest::NearestCentersService;
use crate::types::{ErrorResponse, NearestCentersRequest, Request, SuccessResponse};

/// Request id and address of a well-formed lookup
#[derive(Debug, PartialEq)]
pub struct AddressLookup {
    pub request_id: Uuid,
    pub address: String,
}

/// Validate a raw `centers.nearest` payload
pub fn parse_lookup(payload: &[u8]) -> Result<AddressLookup, ErrorResponse> {
    let request: Request<NearestCentersRequest> = serde_json::from_slice(payload)
        .map_err(|e| ErrorResponse::new(Uuid::nil(), "INVALID_REQUEST", e.to_string()))?;

    match request.payload.address() {
        Some(address) => Ok(AddressLookup {
            request_id: request.id,
            address: address.to_string(),
        }),
        None => Err(ErrorResponse::new(request.id, "INVALID_REQUEST", "Address is required")),
    }
}

/// Answer one lookup; the serialized reply body
pub async fn build_reply(payload: &[u8], service: &NearestCentersService) -> Result<Vec<u8>> {
    let lookup = match parse_lookup(payload) {
        Ok(lookup) => lookup,
        Err(error) => {
            warn!("Rejected nearest-centers request: {}", error.error.message);
            return Ok(serde_json::to_vec(&error)?);
        }
    };

    debug!("Looking up nearest centers for '{}'", lookup.address);
    let response = service.respond(&lookup.address).await;
    Ok(serde_json::to_vec(&SuccessResponse::new(lookup.request_id, response))?)
}

/// Handle centers.nearest messages, one task per request
pub async fn handle_nearest(
    client: Client,
    mut subscriber: Subscriber,
    service: Arc<NearestCentersService>,
) -> Result<()> {
    while let Some(msg) = subscriber.next().await {
        let reply = match msg.reply {
            Some(ref reply) => reply.clone(),
            None => {
                error!("Nearest-centers message without reply subject");
                continue;
            }
        };

        let client = client.clone();
        let service = Arc::clone(&service);
        tokio::spawn(async move {
            let body = match build_reply(&msg.payload, &service).await {
                Ok(body) => body,
                Err(e) => {
                    error!("Failed to encode nearest-centers reply: {}", e);
                    return;
                }
            };
            if let Err(e) = client.publish(reply, body.into()).await {
                error!("Failed to publish nearest-centers reply: {}", e);
            }
        });
    }

    Ok(())
}
