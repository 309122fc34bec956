use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A kind of work a user books time against, e.g. "Programming".
///
/// Activities belong to a single user. Their name is the key under which
/// booked hours are aggregated on an invoice.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    #[serde(default)]
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub user_id: String,
    /// Last modification time, used for conditional GETs on the activity list.
    #[serde(skip)]
    pub updated: DateTime<Utc>,
}

impl Activity {
    #[must_use]
    pub fn new(name: impl Into<String>, user_id: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            user_id: user_id.into(),
            ..Self::default()
        }
    }
}
