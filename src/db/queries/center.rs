//! Database queries for the `centers` table.

use anyhow::Result;
use sqlx::PgPool;

use crate::types::{Center, CenterRow};

/// List every center in catalog order.
pub async fn list_centers(pool: &PgPool) -> Result<Vec<Center>> {
    let rows = sqlx::query_as::<_, CenterRow>(
        r#"
        SELECT id, site_name, site_location, latitude, longitude, is_center
        FROM centers
        ORDER BY id
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(Center::from).collect())
}
