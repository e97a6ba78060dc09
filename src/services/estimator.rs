//! Travel and waiting time estimation per center

use std::sync::Arc;

use crate::defaults::{FALLBACK_PATIENT_COUNT, FLAGSHIP_WAIT_MINUTES, MINUTES_PER_PATIENT};
use crate::services::geo::travel_minutes;
use crate::services::rate_limiter::RateLimiter;
use crate::services::waiting_time::WaitingTimeSource;

/// Estimated minutes to reach a center and to be seen there
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeEstimate {
    pub travel_minutes: f64,
    pub wait_minutes: f64,
}

impl TimeEstimate {
    pub fn total_minutes(&self) -> f64 {
        self.travel_minutes + self.wait_minutes
    }
}

/// Combines the fixed travel model with live queue lengths.
///
/// Non-flagship centers cost one waiting-time call each, made through the
/// shared rate limiter. A failed call never fails the estimate; the queue is
/// assumed to hold a single patient instead.
pub struct TimeEstimator {
    source: Arc<dyn WaitingTimeSource>,
    rate_limiter: Arc<RateLimiter>,
}

impl TimeEstimator {
    pub fn new(source: Arc<dyn WaitingTimeSource>, rate_limiter: Arc<RateLimiter>) -> Self {
        Self { source, rate_limiter }
    }

    pub async fn estimate(&self, distance_km: f64, is_flagship: bool, site_id: i32) -> TimeEstimate {
        let travel_minutes = travel_minutes(distance_km);

        let wait_minutes = if is_flagship {
            FLAGSHIP_WAIT_MINUTES
        } else {
            f64::from(self.patient_count(site_id).await) * MINUTES_PER_PATIENT
        };

        TimeEstimate { travel_minutes, wait_minutes }
    }

    async fn patient_count(&self, site_id: i32) -> u32 {
        let result = self
            .rate_limiter
            .run(|| self.source.patient_count(site_id))
            .await;

        match result {
            Ok(count) => {
                tracing::debug!("Site {} has {} patients waiting", site_id, count);
                count
            }
            Err(e) => {
                tracing::warn!(
                    "No waiting time for site {} from {}: {}; assuming {} patient",
                    site_id, self.source.name(), e, FALLBACK_PATIENT_COUNT
                );
                FALLBACK_PATIENT_COUNT
            }
        }
    }
}
