//! Nearest-centers lookup pipeline
//!
//! geocode address → read catalog → measure every center → select views

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use anyhow::Result;
use futures::FutureExt;
use sqlx::PgPool;

use crate::config::Config;
use crate::services::catalog::{create_catalog, CenterCatalog};
use crate::services::estimator::TimeEstimator;
use crate::services::geocoding::{create_geocoder, Geocoder};
use crate::services::rate_limiter::RateLimiter;
use crate::services::waiting_time::create_waiting_time_source;
use crate::services::ranking::{self, RankingConfig};
use crate::types::{LookupFailure, NearestCenters, NearestCentersResponse};

pub struct NearestCentersService {
    geocoder: Arc<dyn Geocoder>,
    catalog: Arc<dyn CenterCatalog>,
    estimator: TimeEstimator,
    config: RankingConfig,
}

impl NearestCentersService {
    pub fn new(
        geocoder: Arc<dyn Geocoder>,
        catalog: Arc<dyn CenterCatalog>,
        estimator: TimeEstimator,
        config: RankingConfig,
    ) -> Self {
        Self {
            geocoder,
            catalog,
            estimator,
            config,
        }
    }

    /// Wire up backends from configuration around one shared rate limiter
    pub fn from_config(config: &Config, pool: Option<PgPool>) -> Result<Self> {
        let rate_limiter = Arc::new(RateLimiter::from_config(config.rate_limit));

        let geocoder: Arc<dyn Geocoder> = Arc::from(create_geocoder(config, Arc::clone(&rate_limiter))?);
        let catalog = create_catalog(config, pool)?;
        let source = create_waiting_time_source(config)?;

        tracing::info!(
            "Nearest-centers service: geocoder={}, catalog={}, waiting time={}",
            geocoder.name(),
            catalog.name(),
            source.name()
        );

        Ok(Self::new(
            geocoder,
            catalog,
            TimeEstimator::new(source, rate_limiter),
            config.ranking,
        ))
    }

    /// Run the whole lookup; every outcome, including internal faults, becomes a response
    pub async fn respond(&self, address: &str) -> NearestCentersResponse {
        let outcome = AssertUnwindSafe(self.find_nearest(address))
            .catch_unwind()
            .await;

        match outcome {
            Ok(result) => result.into(),
            Err(panic) => {
                let reason = panic
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| panic.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "unknown panic".to_string());
                tracing::error!("Nearest-centers lookup panicked: {}", reason);
                LookupFailure::Internal(reason).into()
            }
        }
    }

    pub async fn find_nearest(&self, address: &str) -> Result<NearestCenters, LookupFailure> {
        if address.trim().is_empty() {
            return Err(LookupFailure::MissingAddress);
        }

        let origin = match self.geocoder.geocode(address).await {
            Ok(Some(result)) => {
                tracing::debug!("Resolved '{}' using query '{}'", address, result.matched_query);
                result.coordinates
            }
            Ok(None) => return Err(LookupFailure::Unresolved),
            Err(e) => {
                tracing::error!("Geocoder {} failed: {:#}", self.geocoder.name(), e);
                return Err(LookupFailure::Internal(e.to_string()));
            }
        };

        let centers = self.catalog.list_centers().await;
        if centers.is_empty() {
            tracing::warn!("Catalog {} returned no centers", self.catalog.name());
            return Err(LookupFailure::NoCenters);
        }
        tracing::debug!("Ranking {} centers around ({}, {})", centers.len(), origin.lat, origin.lng);

        let measured = ranking::measure(&origin, centers, &self.estimator).await;
        ranking::select(measured, &self.config)
    }
}
