//! Configuration management

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{self, Context, Result};

use crate::defaults;
use crate::services::nominatim::NominatimConfig;
use crate::services::rate_limiter::RateLimiterConfig;
use crate::services::ranking::RankingConfig;

/// Which geocoder answers address lookups
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeocoderBackend {
    Nominatim,
    Mock,
}

/// Which source reports queue lengths
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitingTimeBackend {
    Http,
    Random,
}

/// Where the center list comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogBackend {
    Postgres,
    Static,
}

impl FromStr for GeocoderBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "nominatim" => Ok(Self::Nominatim),
            "mock" => Ok(Self::Mock),
            other => anyhow::bail!("unknown geocoder backend '{}'", other),
        }
    }
}

impl FromStr for WaitingTimeBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "http" => Ok(Self::Http),
            "random" => Ok(Self::Random),
            other => anyhow::bail!("unknown waiting-time backend '{}'", other),
        }
    }
}

impl FromStr for CatalogBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "postgres" => Ok(Self::Postgres),
            "static" => Ok(Self::Static),
            other => anyhow::bail!("unknown catalog backend '{}'", other),
        }
    }
}

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// NATS server URL
    pub nats_url: String,

    /// PostgreSQL connection string (required for the postgres catalog)
    pub database_url: Option<String>,

    pub geocoder_backend: GeocoderBackend,
    pub waiting_time_backend: WaitingTimeBackend,
    pub catalog_backend: CatalogBackend,

    /// JSON file with centers for the static catalog
    pub catalog_file: Option<PathBuf>,

    /// Nominatim API URL and query options
    pub nominatim: NominatimConfig,

    /// Waiting-time service endpoint
    pub waiting_time_url: String,

    pub http_timeout: Duration,
    pub user_agent: String,

    pub rate_limit: RateLimiterConfig,
    pub ranking: RankingConfig,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from any key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let nats_url = lookup("NATS_URL")
            .unwrap_or_else(|| "nats://localhost:4222".to_string());

        let database_url = lookup("DATABASE_URL").filter(|url| !url.is_empty());

        let geocoder_backend = parse_or(&lookup, "GEOCODER_BACKEND", GeocoderBackend::Nominatim)?;
        let waiting_time_backend = parse_or(&lookup, "WAITING_TIME_BACKEND", WaitingTimeBackend::Random)?;
        let catalog_backend = parse_or(&lookup, "CATALOG_BACKEND", CatalogBackend::Postgres)?;

        let catalog_file = lookup("CATALOG_FILE").map(PathBuf::from);

        if catalog_backend == CatalogBackend::Postgres && database_url.is_none() {
            anyhow::bail!("DATABASE_URL must be set when CATALOG_BACKEND=postgres");
        }

        let http_timeout = Duration::from_secs(parse_or(
            &lookup,
            "HTTP_TIMEOUT_SECS",
            defaults::DEFAULT_HTTP_TIMEOUT_SECS,
        )?);

        let user_agent = lookup("HTTP_USER_AGENT")
            .unwrap_or_else(|| defaults::DEFAULT_USER_AGENT.to_string());

        let nominatim = NominatimConfig {
            base_url: lookup("NOMINATIM_URL")
                .unwrap_or_else(|| defaults::DEFAULT_NOMINATIM_URL.to_string()),
            country_codes: lookup("NOMINATIM_COUNTRY_CODES")
                .unwrap_or_else(|| defaults::DEFAULT_NOMINATIM_COUNTRY_CODES.to_string()),
            user_agent: user_agent.clone(),
            timeout: http_timeout,
        };

        let waiting_time_url = lookup("WAITING_TIME_URL")
            .unwrap_or_else(|| defaults::DEFAULT_WAITING_TIME_URL.to_string());

        let rate_limit = RateLimiterConfig {
            max_in_flight: parse_or(&lookup, "RATE_LIMIT_MAX_IN_FLIGHT", defaults::RATE_LIMIT_MAX_IN_FLIGHT)?,
            cooldown: Duration::from_millis(parse_or(
                &lookup,
                "RATE_LIMIT_COOLDOWN_MS",
                defaults::RATE_LIMIT_COOLDOWN_MS,
            )?),
        };
        if rate_limit.max_in_flight == 0 {
            anyhow::bail!("RATE_LIMIT_MAX_IN_FLIGHT must be at least 1");
        }

        let ranking = RankingConfig {
            max_distance_km: parse_or(&lookup, "MAX_DISTANCE_KM", defaults::DEFAULT_MAX_DISTANCE_KM)?,
            top_n: parse_or(&lookup, "TOP_N", defaults::DEFAULT_TOP_N)?,
        };
        if !(ranking.max_distance_km >= 0.0) {
            anyhow::bail!("MAX_DISTANCE_KM must be a non-negative number");
        }

        Ok(Self {
            nats_url,
            database_url,
            geocoder_backend,
            waiting_time_backend,
            catalog_backend,
            catalog_file,
            nominatim,
            waiting_time_url,
            http_timeout,
            user_agent,
            rate_limit,
            ranking,
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| anyhow::anyhow!("{}", e))
            .with_context(|| format!("Invalid value for {}: '{}'", key, raw)),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<Config> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_config_defaults() {
        let config = config(&[("DATABASE_URL", "postgres://test")]).unwrap();

        assert_eq!(config.nats_url, "nats://localhost:4222");
        assert_eq!(config.geocoder_backend, GeocoderBackend::Nominatim);
        assert_eq!(config.waiting_time_backend, WaitingTimeBackend::Random);
        assert_eq!(config.nominatim.base_url, "https://nominatim.openstreetmap.org");
        assert_eq!(config.nominatim.country_codes, "in");
        assert_eq!(config.waiting_time_url, "http://localhost:5190/api/centers/wait");
        assert_eq!(config.http_timeout, Duration::from_secs(30));
        assert_eq!(config.rate_limit, RateLimiterConfig::default());
        assert_eq!(config.ranking, RankingConfig::default());
    }

    #[test]
    fn test_config_postgres_catalog_requires_database_url() {
        let err = config(&[]).unwrap_err();
        assert!(err.to_string().contains("DATABASE_URL"));
    }

    #[test]
    fn test_config_static_catalog_needs_no_database() {
        let config = config(&[("CATALOG_BACKEND", "static"), ("CATALOG_FILE", "centers.json")]).unwrap();

        assert_eq!(config.catalog_backend, CatalogBackend::Static);
        assert_eq!(config.catalog_file, Some(PathBuf::from("centers.json")));
        assert!(config.database_url.is_none());
    }

    #[test]
    fn test_config_overrides() {
        let config = config(&[
            ("DATABASE_URL", "postgres://test"),
            ("GEOCODER_BACKEND", "Mock"),
            ("WAITING_TIME_BACKEND", "http"),
            ("NOMINATIM_URL", "http://localhost:8080"),
            ("RATE_LIMIT_COOLDOWN_MS", "250"),
            ("RATE_LIMIT_MAX_IN_FLIGHT", "2"),
            ("MAX_DISTANCE_KM", "25.5"),
            ("TOP_N", "3"),
        ])
        .unwrap();

        assert_eq!(config.geocoder_backend, GeocoderBackend::Mock);
        assert_eq!(config.waiting_time_backend, WaitingTimeBackend::Http);
        assert_eq!(config.nominatim.base_url, "http://localhost:8080");
        assert_eq!(config.rate_limit.cooldown, Duration::from_millis(250));
        assert_eq!(config.rate_limit.max_in_flight, 2);
        assert_eq!(config.ranking.max_distance_km, 25.5);
        assert_eq!(config.ranking.top_n, 3);
    }

    #[test]
    fn test_config_rejects_bad_numbers() {
        let err = config(&[("DATABASE_URL", "postgres://test"), ("TOP_N", "two")]).unwrap_err();
        assert!(err.to_string().contains("TOP_N"));

        tokio_test::assert_err!(config(&[("DATABASE_URL", "postgres://test"), ("RATE_LIMIT_MAX_IN_FLIGHT", "0")]));
        tokio_test::assert_err!(config(&[("DATABASE_URL", "postgres://test"), ("MAX_DISTANCE_KM", "-1")]));
    }

    #[test]
    fn test_config_rejects_unknown_backend() {
        let err = config(&[("DATABASE_URL", "postgres://test"), ("GEOCODER_BACKEND", "google")]).unwrap_err();
        assert!(format!("{:#}", err).contains("google"));
    }
}
