//! Waiting-time service wire types

use serde::{Deserialize, Serialize};

/// Body sent to the waiting-time endpoint
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WaitingTimeRequest {
    #[serde(alias = "SiteId")]
    pub site_id: i32,
}

/// Waiting-time endpoint response
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WaitingTimeResponse {
    #[serde(rename = "dataValues", alias = "DataValues", default)]
    pub data_values: Vec<WaitingTimeData>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WaitingTimeData {
    /// Patients currently waiting
    #[serde(rename = "totalOP", alias = "TotalOP", alias = "totalOp")]
    pub total_op: u32,
    #[serde(rename = "updatedTime", alias = "UpdatedTime", default)]
    pub updated_time: Option<String>,
}

impl WaitingTimeResponse {
    /// Patient count of the first entry, if any
    pub fn patient_count(&self) -> Option<u32> {
        self.data_values.first().map(|d| d.total_op)
    }
}
