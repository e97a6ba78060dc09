//! Nearest-centers request and response payloads

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Request payload for `centers.nearest`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NearestCentersRequest {
    #[serde(default)]
    pub address: Option<String>,
}

impl NearestCentersRequest {
    /// Address if present and non-blank
    pub fn address(&self) -> Option<&str> {
        self.address
            .as_deref()
            .filter(|address| !address.trim().is_empty())
    }
}

/// Entry of the distance ranking
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CenterByDistance {
    pub name: String,
    pub address: String,
    pub distance_km: f64,
}

/// Entry of the total-time ranking
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CenterByTime {
    pub name: String,
    pub address: String,
    pub distance_km: f64,
    pub travel_time_hrs: f64,
    pub waiting_time_hrs: f64,
    pub total_time_hrs: f64,
}

/// Both rankings returned for a resolved address
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NearestCenters {
    pub centers_distance: Vec<CenterByDistance>,
    pub centers_time: Vec<CenterByTime>,
}

/// Reasons a lookup produces no ranking
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LookupFailure {
    #[error("Address is required")]
    MissingAddress,
    #[error("Could not geocode the provided address")]
    Unresolved,
    #[error("No valid centers available")]
    NoCenters,
    #[error("No centers found within {0} km")]
    NoneInRange(f64),
    #[error("An error occurred: {0}")]
    Internal(String),
}

/// Wire shape of a nearest-centers answer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NearestCentersResponse {
    Found(NearestCenters),
    Error { error: String },
    Message { message: String },
}

impl From<LookupFailure> for NearestCentersResponse {
    fn from(failure: LookupFailure) -> Self {
        match failure {
            LookupFailure::NoneInRange(_) => NearestCentersResponse::Message {
                message: failure.to_string(),
            },
            other => NearestCentersResponse::Error {
                error: other.to_string(),
            },
        }
    }
}

impl From<Result<NearestCenters, LookupFailure>> for NearestCentersResponse {
    fn from(result: Result<NearestCenters, LookupFailure>) -> Self {
        match result {
            Ok(found) => NearestCentersResponse::Found(found),
            Err(failure) => failure.into(),
        }
    }
}
