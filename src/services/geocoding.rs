//! Address resolution by progressive query narrowing
//!
//! Free-text addresses are rarely matched verbatim by Nominatim. Instead of a
//! single lookup, the address is expanded into an ordered list of candidate
//! queries, each less specific than the last, and the first candidate that
//! resolves wins:
//! - short addresses with a postal code try the postal code alone first
//! - then the full word list (plus postal code), dropping the leading word
//!   after every miss
//! - finally the postal code alone, for longer addresses
//!
//! Every lookup is wrapped by the shared `RateLimiter`.
//!
//! Backend selection via GEOCODER_BACKEND:
//! - "nominatim" → NarrowingGeocoder over NominatimClient (production)
//! - "mock" → MockGeocoder (tests, development)

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::config::{Config, GeocoderBackend};
use crate::services::nominatim::{AddressSearch, NominatimClient};
use crate::services::rate_limiter::RateLimiter;
use crate::types::Coordinates;

/// Six-digit postal index number
static POSTAL_CODE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b[0-9]{6}\b").expect("valid postal code pattern"));

/// Geocoder trait - abstraction for all geocoding implementations
#[async_trait]
pub trait Geocoder: Send + Sync {
    /// Geocode a free-text address to coordinates
    /// Returns None if the address cannot be resolved
    async fn geocode(&self, address: &str) -> Result<Option<GeocodingResult>>;

    /// Get the name of this geocoder implementation
    fn name(&self) -> &'static str;
}

/// Result of geocoding operation
#[derive(Debug, Clone, PartialEq)]
pub struct GeocodingResult {
    pub coordinates: Coordinates,
    /// Candidate query that produced the match
    pub matched_query: String,
}

// ==========================================================================
// Query candidates
// ==========================================================================

/// Address split into words plus an optional postal code
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeocodeQuery {
    pub words: Vec<String>,
    pub postal_code: Option<String>,
}

impl GeocodeQuery {
    /// Tokenize an address. Returns None for blank input.
    pub fn parse(address: &str) -> Option<Self> {
        let address = address.trim();
        if address.is_empty() {
            return None;
        }

        let postal_code = POSTAL_CODE.find(address).map(|m| m.as_str().to_string());

        let words = address
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|word| !word.is_empty())
            .filter(|word| postal_code.as_deref() != Some(*word))
            .map(str::to_string)
            .collect();

        Some(Self { words, postal_code })
    }

    /// Candidate queries, most specific first
    pub fn candidates(self) -> QueryCandidates {
        QueryCandidates {
            query: self,
            start: 0,
            stage: Stage::PostalFirst,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    PostalFirst,
    Narrowing,
    PostalLast,
    Done,
}

/// Lazy iterator over candidate query strings
#[derive(Debug, Clone)]
pub struct QueryCandidates {
    query: GeocodeQuery,
    start: usize,
    stage: Stage,
}

impl Iterator for QueryCandidates {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        let words = &self.query.words;
        let postal_code = self.query.postal_code.as_deref();

        loop {
            match self.stage {
                Stage::PostalFirst => {
                    self.stage = Stage::Narrowing;
                    if let (true, Some(code)) = (words.len() < 3, postal_code) {
                        return Some(code.to_string());
                    }
                }
                Stage::Narrowing => {
                    if self.start < words.len() {
                        let mut candidate = words[self.start..].join(" ");
                        if let Some(code) = postal_code {
                            candidate.push(' ');
                            candidate.push_str(code);
                        }
                        self.start += 1;
                        return Some(candidate);
                    }
                    self.stage = Stage::PostalLast;
                }
                Stage::PostalLast => {
                    self.stage = Stage::Done;
                    if let (true, Some(code)) = (words.len() >= 3, postal_code) {
                        return Some(code.to_string());
                    }
                }
                Stage::Done => return None,
            }
        }
    }
}

// ==========================================================================
// NarrowingGeocoder
// ==========================================================================

/// Production geocoder: walks the candidate list against an `AddressSearch`
pub struct NarrowingGeocoder {
    search: Arc<dyn AddressSearch>,
    rate_limiter: Arc<RateLimiter>,
}

impl NarrowingGeocoder {
    pub fn new(search: Arc<dyn AddressSearch>, rate_limiter: Arc<RateLimiter>) -> Self {
        Self { search, rate_limiter }
    }
}

#[async_trait]
impl Geocoder for NarrowingGeocoder {
    async fn geocode(&self, address: &str) -> Result<Option<GeocodingResult>> {
        let Some(query) = GeocodeQuery::parse(address) else {
            tracing::debug!("Empty address, skipping geocoding");
            return Ok(None);
        };

        for (attempt, candidate) in query.candidates().enumerate() {
            let outcome = self
                .rate_limiter
                .run(|| self.search.search(&candidate))
                .await;

            match outcome {
                Ok(Some(coordinates)) => {
                    tracing::info!(
                        "Geocoded '{}' via '{}' (attempt {}) -> ({}, {})",
                        address, candidate, attempt + 1, coordinates.lat, coordinates.lng
                    );
                    return Ok(Some(GeocodingResult {
                        coordinates,
                        matched_query: candidate,
                    }));
                }
                Ok(None) => {
                    tracing::debug!("No {} match for '{}'", self.search.name(), candidate);
                }
                Err(e) => {
                    tracing::warn!("Geocoding query '{}' failed: {:#}", candidate, e);
                }
            }
        }

        tracing::info!("Could not geocode '{}'", address);
        Ok(None)
    }

    fn name(&self) -> &'static str {
        "nominatim"
    }
}

// ==========================================================================
// MockGeocoder
// ==========================================================================

/// Mock geocoder for testing - returns deterministic fake coordinates
pub struct MockGeocoder;

impl MockGeocoder {
    pub fn new() -> Self {
        Self
    }

    /// Coordinates derived from the address hash, inside central Bengaluru
    fn hash_to_coordinates(address: &str) -> Coordinates {
        use std::collections::hash_map::DefaultHasher;
        use std::hash::{Hash, Hasher};

        let mut hasher = DefaultHasher::new();
        address.trim().to_lowercase().hash(&mut hasher);
        let hash = hasher.finish();

        const LAT_MIN: f64 = 12.85;
        const LAT_MAX: f64 = 13.10;
        const LNG_MIN: f64 = 77.45;
        const LNG_MAX: f64 = 77.75;

        let lat_normalized = ((hash >> 32) as f64) / (u32::MAX as f64);
        let lng_normalized = ((hash & 0xFFFF_FFFF) as f64) / (u32::MAX as f64);

        Coordinates {
            lat: LAT_MIN + lat_normalized * (LAT_MAX - LAT_MIN),
            lng: LNG_MIN + lng_normalized * (LNG_MAX - LNG_MIN),
        }
    }
}

impl Default for MockGeocoder {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Geocoder for MockGeocoder {
    async fn geocode(&self, address: &str) -> Result<Option<GeocodingResult>> {
        if address.trim().is_empty() {
            return Ok(None);
        }

        Ok(Some(GeocodingResult {
            coordinates: Self::hash_to_coordinates(address),
            matched_query: address.trim().to_string(),
        }))
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}

// ==========================================================================
// Factory function
// ==========================================================================

/// Create the geocoder selected by GEOCODER_BACKEND
pub fn create_geocoder(config: &Config, rate_limiter: Arc<RateLimiter>) -> Result<Box<dyn Geocoder>> {
    match config.geocoder_backend {
        GeocoderBackend::Mock => {
            tracing::info!("Using MockGeocoder");
            Ok(Box::new(MockGeocoder::new()))
        }
        GeocoderBackend::Nominatim => {
            tracing::info!("Using NarrowingGeocoder against {}", config.nominatim.base_url);
            let client = NominatimClient::new(&config.nominatim)?;
            Ok(Box::new(NarrowingGeocoder::new(Arc::new(client), rate_limiter)))
        }
    }
}
