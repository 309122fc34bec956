use serde::{Deserialize, Serialize};

/// A customer that invoices are issued to.
///
/// `user_id` is the subject of the identity-provider account that owns the
/// customer; ownership checks on invoices compare against it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    #[serde(default)]
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub user_id: String,
}
