use serde::{Deserialize, Serialize};

/// A project run for a customer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct Project {
    #[serde(default)]
    pub id: u64,
    #[serde(default)]
    pub customer_id: u64,
    pub name: String,
}
