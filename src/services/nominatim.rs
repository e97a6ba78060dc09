//! Nominatim search client

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;

use crate::defaults::{DEFAULT_HTTP_TIMEOUT_SECS, DEFAULT_NOMINATIM_COUNTRY_CODES, DEFAULT_USER_AGENT};
use crate::types::Coordinates;

/// Nominatim API response entry
#[derive(Debug, Deserialize)]
pub struct NominatimResult {
    pub lat: Option<String>,
    pub lon: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
}

impl NominatimResult {
    /// Parse the string-typed coordinates
    pub fn coordinates(&self) -> Result<Coordinates> {
        let lat: f64 = self
            .lat
            .as_deref()
            .context("Missing latitude")?
            .trim()
            .parse()
            .context("Invalid latitude")?;
        let lng: f64 = self
            .lon
            .as_deref()
            .context("Missing longitude")?
            .trim()
            .parse()
            .context("Invalid longitude")?;

        if !lat.is_finite() || !lng.is_finite() {
            anyhow::bail!("Non-finite coordinates: {}, {}", lat, lng);
        }

        Ok(Coordinates { lat, lng })
    }
}

/// One free-text lookup against an external search endpoint
#[async_trait]
pub trait AddressSearch: Send + Sync {
    /// Coordinates of the first match, `Ok(None)` if there is none
    async fn search(&self, query: &str) -> Result<Option<Coordinates>>;

    fn name(&self) -> &'static str;
}

/// Nominatim HTTP configuration
#[derive(Debug, Clone)]
pub struct NominatimConfig {
    pub base_url: String,
    pub country_codes: String,
    pub user_agent: String,
    pub timeout: Duration,
}

impl Default for NominatimConfig {
    fn default() -> Self {
        Self {
            base_url: crate::defaults::DEFAULT_NOMINATIM_URL.to_string(),
            country_codes: DEFAULT_NOMINATIM_COUNTRY_CODES.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout: Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
        }
    }
}

/// Nominatim geocoding client
pub struct NominatimClient {
    base_url: String,
    country_codes: String,
    client: reqwest::Client,
}

impl NominatimClient {
    /// Create a new client
    pub fn new(config: &NominatimConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(&config.user_agent)
            .timeout(config.timeout)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            country_codes: config.country_codes.clone(),
            client,
        })
    }

    /// Build the search URL for a free-text query
    pub fn search_url(&self, query: &str) -> String {
        let cleaned: String = query.chars().filter(|c| *c != '#' && *c != '&').collect();

        let mut url = format!(
            "{}/search?q={}&format=json&limit=1",
            self.base_url,
            urlencoding::encode(&cleaned)
        );
        if !self.country_codes.is_empty() {
            url.push_str("&countrycodes=");
            url.push_str(&urlencoding::encode(&self.country_codes));
        }
        url
    }
}

#[async_trait]
impl AddressSearch for NominatimClient {
    async fn search(&self, query: &str) -> Result<Option<Coordinates>> {
        let response = self.client
            .get(self.search_url(query))
            .send()
            .await
            .context("Failed to send geocoding request")?;

        if !response.status().is_success() {
            tracing::warn!("Nominatim returned {} for '{}'", response.status(), query);
            return Ok(None);
        }

        let results: Vec<NominatimResult> = response
            .json()
            .await
            .context("Failed to parse geocoding response")?;

        match results.first() {
            Some(result) => {
                let coordinates = result.coordinates()?;
                tracing::debug!(
                    "Nominatim matched '{}' to '{}'",
                    query,
                    result.display_name.as_deref().unwrap_or("?")
                );
                Ok(Some(coordinates))
            }
            None => Ok(None),
        }
    }

    fn name(&self) -> &'static str {
        "nominatim"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> NominatimClient {
        NominatimClient::new(&NominatimConfig {
            base_url: server.uri(),
            timeout: Duration::from_secs(5),
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn test_search_url_strips_reserved_characters() {
        let client = NominatimClient::new(&NominatimConfig {
            base_url: "http://nominatim.local/".to_string(),
            ..Default::default()
        })
        .unwrap();

        let url = client.search_url("#12 A&B Road 560001");
        assert_eq!(
            url,
            "http://nominatim.local/search?q=12%20AB%20Road%20560001&format=json&limit=1&countrycodes=in"
        );
    }

    #[test]
    fn test_result_with_malformed_latitude_is_error() {
        let result = NominatimResult {
            lat: Some("north".to_string()),
            lon: Some("77.59".to_string()),
            display_name: None,
        };
        assert!(result.coordinates().is_err());
    }

    #[test]
    fn test_result_without_longitude_is_error() {
        let result = NominatimResult { lat: Some("12.9".to_string()), lon: None, display_name: None };
        assert!(result.coordinates().is_err());
    }

    #[tokio::test]
    async fn test_search_returns_first_match() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search"))
            .and(query_param("q", "MG Road 560001"))
            .and(query_param("format", "json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                { "lat": "12.9756", "lon": "77.6066", "display_name": "MG Road" },
                { "lat": "1.0", "lon": "2.0", "display_name": "elsewhere" }
            ])))
            .mount(&server)
            .await;

        let coords = client_for(&server).search("MG Road 560001").await.unwrap().unwrap();
        assert_eq!(coords, Coordinates { lat: 12.9756, lng: 77.6066 });
    }

    #[tokio::test]
    async fn test_search_empty_array_is_no_match() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
            .mount(&server)
            .await;

        assert!(client_for(&server).search("nowhere").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_search_server_error_is_no_match() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        assert!(client_for(&server).search("MG Road").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_search_malformed_json_is_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>busy</html>"))
            .mount(&server)
            .await;

        assert!(client_for(&server).search("MG Road").await.is_err());
    }

    // Note: hits the public Nominatim API, ignored by default
    #[tokio::test]
    #[ignore]
    async fn test_search_bengaluru_live() {
        let client = NominatimClient::new(&NominatimConfig::default()).unwrap();

        let coords = client.search("Bengaluru 560001").await.unwrap().unwrap();
        assert!((coords.lat - 12.97).abs() < 0.2);
        assert!((coords.lng - 77.59).abs() < 0.2);
    }
}
