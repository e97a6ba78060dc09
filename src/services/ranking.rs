//! Ranking of centers by distance and by total time
//!
//! Ranking runs as two stages:
//! 1. `measure` walks the catalog in order, computes each distance once and
//!    estimates travel and wait times sequentially (one task, no fan-out)
//! 2. `select` filters by radius and cuts two independently sorted views
//!
//! Sorting is stable, so ties keep catalog order.

use crate::defaults::{DEFAULT_MAX_DISTANCE_KM, DEFAULT_TOP_N};
use crate::services::estimator::TimeEstimator;
use crate::services::geo::haversine_distance;
use crate::types::{Center, CenterByDistance, CenterByTime, Coordinates, LookupFailure, NearestCenters};

/// Radius filter and list length
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RankingConfig {
    pub max_distance_km: f64,
    pub top_n: usize,
}

impl Default for RankingConfig {
    fn default() -> Self {
        Self {
            max_distance_km: DEFAULT_MAX_DISTANCE_KM,
            top_n: DEFAULT_TOP_N,
        }
    }
}

/// Center with its metrics for one ranking pass
#[derive(Debug, Clone, PartialEq)]
pub struct RankedCenter {
    pub center: Center,
    pub distance_km: f64,
    pub travel_minutes: f64,
    pub wait_minutes: f64,
}

impl RankedCenter {
    pub fn total_minutes(&self) -> f64 {
        self.travel_minutes + self.wait_minutes
    }
}

/// Distance and time estimate for every center that has coordinates
pub async fn measure(
    origin: &Coordinates,
    centers: Vec<Center>,
    estimator: &TimeEstimator,
) -> Vec<RankedCenter> {
    let mut ranked = Vec::with_capacity(centers.len());

    for center in centers {
        let Some(coordinates) = center.coordinates else {
            tracing::debug!("Skipping center {} without coordinates", center.site_id);
            continue;
        };

        let distance_km = haversine_distance(origin, &coordinates);
        let estimate = estimator
            .estimate(distance_km, center.is_flagship, center.site_id)
            .await;

        ranked.push(RankedCenter {
            center,
            distance_km,
            travel_minutes: estimate.travel_minutes,
            wait_minutes: estimate.wait_minutes,
        });
    }

    ranked
}

/// Filter by radius and build both top-N views
pub fn select(ranked: Vec<RankedCenter>, config: &RankingConfig) -> Result<NearestCenters, LookupFailure> {
    let nearby: Vec<RankedCenter> = ranked
        .into_iter()
        .filter(|c| c.distance_km <= config.max_distance_km)
        .collect();

    if nearby.is_empty() {
        return Err(LookupFailure::NoneInRange(config.max_distance_km));
    }

    let mut by_distance: Vec<&RankedCenter> = nearby.iter().collect();
    by_distance.sort_by(|a, b| a.distance_km.total_cmp(&b.distance_km));

    let mut by_time: Vec<&RankedCenter> = nearby.iter().collect();
    by_time.sort_by(|a, b| a.total_minutes().total_cmp(&b.total_minutes()));

    Ok(NearestCenters {
        centers_distance: by_distance
            .into_iter()
            .take(config.top_n)
            .map(|c| CenterByDistance {
                name: c.center.name.clone(),
                address: c.center.address.clone(),
                distance_km: round2(c.distance_km),
            })
            .collect(),
        centers_time: by_time
            .into_iter()
            .take(config.top_n)
            .map(|c| CenterByTime {
                name: c.center.name.clone(),
                address: c.center.address.clone(),
                distance_km: round2(c.distance_km),
                travel_time_hrs: round2(c.travel_minutes / 60.0),
                waiting_time_hrs: round2(c.wait_minutes / 60.0),
                total_time_hrs: round2(c.total_minutes() / 60.0),
            })
            .collect(),
    })
}

/// Round to two decimals, ties to even
fn round2(value: f64) -> f64 {
    (value * 100.0).round_ties_even() / 100.0
}
