use serde::{Deserialize, Serialize};

/// Hourly price for one activity on one project.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct Rate {
    #[serde(default)]
    pub project_id: u64,
    pub activity_id: u64,
    pub price: f32,
}
