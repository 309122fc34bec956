use serde::{Deserialize, Serialize};

/// A single recorded unit of work on one invoice, project and activity.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    #[serde(default)]
    pub id: u64,
    /// Day of month the work was done.
    #[serde(default)]
    pub day: u32,
    pub hours: f32,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub invoice_id: u64,
    pub project_id: u64,
    pub activity_id: u64,
}

impl Booking {
    #[must_use]
    pub fn new(project_id: u64, activity_id: u64, hours: f32) -> Self {
        Self {
            project_id,
            activity_id,
            hours,
            ..Self::default()
        }
    }
}
