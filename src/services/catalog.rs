//! Center catalog readers
//!
//! The catalog is read once per request. Read failures are logged and
//! reported as an empty catalog so a lookup can still answer
//! "No valid centers available".

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::PgPool;

use crate::config::{CatalogBackend, Config};
use crate::db::queries;
use crate::types::Center;

#[async_trait]
pub trait CenterCatalog: Send + Sync {
    /// All centers in catalog order; empty on any read failure
    async fn list_centers(&self) -> Vec<Center>;

    fn name(&self) -> &'static str;
}

/// Catalog backed by the `centers` table
pub struct PgCenterCatalog {
    pool: PgPool,
}

impl PgCenterCatalog {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CenterCatalog for PgCenterCatalog {
    async fn list_centers(&self) -> Vec<Center> {
        match queries::center::list_centers(&self.pool).await {
            Ok(centers) => centers,
            Err(e) => {
                tracing::error!("Error retrieving centers from database: {}", e);
                Vec::new()
            }
        }
    }

    fn name(&self) -> &'static str {
        "postgres"
    }
}

/// Fixed in-memory catalog
#[derive(Debug, Clone, Default)]
pub struct StaticCenterCatalog {
    centers: Vec<Center>,
}

impl StaticCenterCatalog {
    pub fn new(centers: Vec<Center>) -> Self {
        Self { centers }
    }

    /// Load a JSON array of centers
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read catalog file {}", path.display()))?;
        let centers: Vec<Center> = serde_json::from_str(&raw)
            .with_context(|| format!("Invalid catalog file {}", path.display()))?;
        Ok(Self::new(centers))
    }
}

#[async_trait]
impl CenterCatalog for StaticCenterCatalog {
    async fn list_centers(&self) -> Vec<Center> {
        self.centers.clone()
    }

    fn name(&self) -> &'static str {
        "static"
    }
}

/// Create the catalog selected by CATALOG_BACKEND
pub fn create_catalog(config: &Config, pool: Option<PgPool>) -> Result<Arc<dyn CenterCatalog>> {
    match config.catalog_backend {
        CatalogBackend::Postgres => {
            let pool = pool.context("CATALOG_BACKEND=postgres needs a database pool")?;
            Ok(Arc::new(PgCenterCatalog::new(pool)))
        }
        CatalogBackend::Static => {
            let catalog = match &config.catalog_file {
                Some(path) => StaticCenterCatalog::from_json_file(path)?,
                None => {
                    tracing::warn!("CATALOG_BACKEND=static without CATALOG_FILE, catalog is empty");
                    StaticCenterCatalog::default()
                }
            };
            Ok(Arc::new(catalog))
        }
    }
}
