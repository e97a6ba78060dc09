//! Center catalog types

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

/// Service center as consumed by the ranking pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Center {
    pub site_id: i32,
    pub name: String,
    pub address: String,
    /// Missing coordinates exclude the center from ranking
    pub coordinates: Option<Coordinates>,
    /// Flagship centers have a fixed, short wait and skip the waiting-time lookup
    pub is_flagship: bool,
}

/// Raw row of the `centers` table
#[derive(Debug, Clone, FromRow)]
pub struct CenterRow {
    pub id: i32,
    pub site_name: Option<String>,
    pub site_location: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub is_center: Option<i32>,
}

impl From<CenterRow> for Center {
    fn from(row: CenterRow) -> Self {
        let coordinates = match (row.latitude, row.longitude) {
            (Some(lat), Some(lng)) => Some(Coordinates { lat, lng }),
            _ => None,
        };

        Self {
            site_id: row.id,
            name: row.site_name.unwrap_or_default(),
            address: row.site_location.unwrap_or_default(),
            coordinates,
            is_flagship: row.is_center == Some(1),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row() -> CenterRow {
        CenterRow {
            id: 7,
            site_name: Some("Jayanagar Clinic".to_string()),
            site_location: Some("4th Block, Jayanagar".to_string()),
            latitude: Some(12.925),
            longitude: Some(77.5938),
            is_center: Some(1),
        }
    }

    #[test]
    fn test_center_from_complete_row() {
        let center = Center::from(row());

        assert_eq!(center.site_id, 7);
        assert_eq!(center.name, "Jayanagar Clinic");
        assert!(center.is_flagship);
        assert_eq!(center.coordinates, Some(Coordinates { lat: 12.925, lng: 77.5938 }));
    }

    #[test]
    fn test_center_without_longitude_has_no_coordinates() {
        let center = Center::from(CenterRow { longitude: None, ..row() });
        assert!(center.coordinates.is_none());
    }

    #[test]
    fn test_center_flag_only_set_for_one() {
        assert!(!Center::from(CenterRow { is_center: None, ..row() }).is_flagship);
        assert!(!Center::from(CenterRow { is_center: Some(0), ..row() }).is_flagship);
        assert!(!Center::from(CenterRow { is_center: Some(2), ..row() }).is_flagship);
    }

    #[test]
    fn test_center_null_strings_become_empty() {
        let center = Center::from(CenterRow { site_name: None, site_location: None, ..row() });
        assert_eq!(center.name, "");
        assert_eq!(center.address, "");
    }
}
