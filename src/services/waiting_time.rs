//! Waiting-time sources
//!
//! The waiting-time service reports how many patients are queued at a site.
//! `HttpWaitingTimeClient` talks to the real endpoint; `RandomWaitingTimeSource`
//! simulates it for development.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use rand::Rng;
use thiserror::Error;

use crate::config::{Config, WaitingTimeBackend};
use crate::types::{WaitingTimeData, WaitingTimeRequest, WaitingTimeResponse};

#[derive(Debug, Error)]
pub enum WaitingTimeError {
    #[error("waiting-time request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("waiting-time service returned {0}")]
    Status(reqwest::StatusCode),
    #[error("waiting-time response could not be decoded: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("waiting-time response had no entries")]
    Empty,
}

/// Source of current queue lengths per site
#[async_trait]
pub trait WaitingTimeSource: Send + Sync {
    /// Patients currently waiting at `site_id`
    async fn patient_count(&self, site_id: i32) -> Result<u32, WaitingTimeError>;

    fn name(&self) -> &'static str;
}

// ==========================================================================
// HTTP client
// ==========================================================================

pub struct HttpWaitingTimeClient {
    url: String,
    client: reqwest::Client,
}

impl HttpWaitingTimeClient {
    pub fn new(url: &str, user_agent: &str, timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            url: url.to_string(),
            client,
        })
    }
}

#[async_trait]
impl WaitingTimeSource for HttpWaitingTimeClient {
    async fn patient_count(&self, site_id: i32) -> Result<u32, WaitingTimeError> {
        let response = self.client
            .post(&self.url)
            .json(&WaitingTimeRequest { site_id })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(WaitingTimeError::Status(status));
        }

        let body = response.bytes().await?;
        let parsed: WaitingTimeResponse = serde_json::from_slice(&body)?;

        parsed.patient_count().ok_or(WaitingTimeError::Empty)
    }

    fn name(&self) -> &'static str {
        "http"
    }
}

// ==========================================================================
// Simulated source
// ==========================================================================

/// Uniformly random queue of 1 to 10 patients
pub struct RandomWaitingTimeSource;

impl RandomWaitingTimeSource {
    pub const MIN_PATIENTS: u32 = 1;
    pub const MAX_PATIENTS: u32 = 10;
    pub const UPDATED_TIME: &'static str = "12:35 PM";

    /// Full response body, as the real service would send it
    pub fn simulate(&self) -> WaitingTimeResponse {
        let total_op = rand::thread_rng().gen_range(Self::MIN_PATIENTS..=Self::MAX_PATIENTS);

        WaitingTimeResponse {
            data_values: vec![WaitingTimeData {
                total_op,
                updated_time: Some(Self::UPDATED_TIME.to_string()),
            }],
        }
    }
}

#[async_trait]
impl WaitingTimeSource for RandomWaitingTimeSource {
    async fn patient_count(&self, _site_id: i32) -> Result<u32, WaitingTimeError> {
        self.simulate().patient_count().ok_or(WaitingTimeError::Empty)
    }

    fn name(&self) -> &'static str {
        "random"
    }
}

/// Create the source selected by WAITING_TIME_BACKEND
pub fn create_waiting_time_source(config: &Config) -> anyhow::Result<Arc<dyn WaitingTimeSource>> {
    match config.waiting_time_backend {
        WaitingTimeBackend::Random => {
            tracing::info!("Using simulated waiting times");
            Ok(Arc::new(RandomWaitingTimeSource))
        }
        WaitingTimeBackend::Http => {
            tracing::info!("Using waiting-time service at {}", config.waiting_time_url);
            let client = HttpWaitingTimeClient::new(
                &config.waiting_time_url,
                &config.user_agent,
                config.http_timeout,
            )?;
            Ok(Arc::new(client))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> HttpWaitingTimeClient {
        HttpWaitingTimeClient::new(
            &format!("{}/api/centers/wait", server.uri()),
            "nearest-centers-test/0.1",
            Duration::from_secs(5),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn http_client_posts_site_id_and_reads_first_count() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/centers/wait"))
            .and(body_json(serde_json::json!({ "siteId": 42 })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "dataValues": [
                    { "totalOP": 2, "UpdatedTime": "12:35 PM" },
                    { "totalOP": 9, "UpdatedTime": "12:36 PM" }
                ]
            })))
            .mount(&server)
            .await;

        let count = client_for(&server).patient_count(42).await.unwrap();
        assert_eq!(count, 2);
    }

    #[tokio::test]
    async fn http_client_error_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let err = client_for(&server).patient_count(1).await.unwrap_err();
        assert!(matches!(err, WaitingTimeError::Status(status) if status.as_u16() == 500));
    }

    #[tokio::test]
    async fn http_client_malformed_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let err = client_for(&server).patient_count(1).await.unwrap_err();
        assert!(matches!(err, WaitingTimeError::Decode(_)));
    }

    #[tokio::test]
    async fn http_client_empty_data_values() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "dataValues": [] })))
            .mount(&server)
            .await;

        let err = client_for(&server).patient_count(1).await.unwrap_err();
        assert!(matches!(err, WaitingTimeError::Empty));
    }

    #[tokio::test]
    async fn http_client_unreachable_is_transport_error() {
        let client = HttpWaitingTimeClient::new("http://127.0.0.1:9/wait", "test", Duration::from_secs(2)).unwrap();

        let err = client.patient_count(1).await.unwrap_err();
        assert!(matches!(err, WaitingTimeError::Transport(_)));
    }

    #[tokio::test]
    async fn default_backend_answers_without_external_service() {
        let config = Config::from_lookup(|key| match key {
            "CATALOG_BACKEND" => Some("static".to_string()),
            _ => None,
        })
        .unwrap();

        let source = create_waiting_time_source(&config).unwrap();

        assert_eq!(source.name(), "random");
        let count = source.patient_count(1).await.unwrap();
        assert!((1..=10).contains(&count));
    }

    #[tokio::test]
    async fn http_backend_is_opt_in() {
        let config = Config::from_lookup(|key| match key {
            "CATALOG_BACKEND" => Some("static".to_string()),
            "WAITING_TIME_BACKEND" => Some("http".to_string()),
            _ => None,
        })
        .unwrap();

        let source = create_waiting_time_source(&config).unwrap();
        assert_eq!(source.name(), "http");
    }

    #[tokio::test]
    async fn random_source_stays_in_range() {
        let source = RandomWaitingTimeSource;
        for site_id in 0..50 {
            let count = source.patient_count(site_id).await.unwrap();
            assert!((1..=10).contains(&count), "count {} out of range", count);
        }
    }
}
