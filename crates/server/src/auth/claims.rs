use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Roles a token may carry in its `roles` claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    Admin,
    User,
}

impl Role {
    /// Parse a role claim value. Matching is exact: `"admin"` is not a role.
    pub fn from_claim(s: &str) -> Option<Self> {
        match s {
            "ADMIN" => Some(Self::Admin),
            "USER" => Some(Self::User),
            _ => None,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Admin => write!(f, "ADMIN"),
            Self::User => write!(f, "USER"),
        }
    }
}

/// Verified identity of the caller, rebuilt from the bearer token on every
/// request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Claims {
    /// User id of the caller (`sub`).
    pub subject: String,
    pub roles: Vec<Role>,
    pub issuer: String,
    pub audience: Vec<String>,
    pub expiry: DateTime<Utc>,
}

impl Claims {
    /// Identity used when authentication is disabled: holds every role.
    pub fn anonymous() -> Self {
        Self {
            subject: "anonymous".to_owned(),
            roles: vec![Role::Admin, Role::User],
            issuer: String::new(),
            audience: Vec::new(),
            expiry: DateTime::<Utc>::MAX_UTC,
        }
    }

    pub fn has_role(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }
}
