//! Business logic services

pub mod catalog;
pub mod estimator;
pub mod geo;
pub mod geocoding;
pub mod nearest;
pub mod nominatim;
pub mod ranking;
pub mod rate_limiter;
pub mod waiting_time;
