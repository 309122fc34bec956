//! Bearer token authentication and request authorization.
//!
//! Requests pass through up to three gates, outermost first:
//!
//! 1. [`gate::AuthLayer`] verifies the bearer token with a
//!    [`verifier::TokenVerifier`] and stores the resulting
//!    [`claims::Claims`] in the request extensions.
//! 2. [`gate::RoleLayer`] requires a role in those claims.
//! 3. [`gate::require_ownership`] requires the caller to own the invoice
//!    named in the path.
//!
//! In RS256 mode the verifier resolves signing keys through a
//! [`keystore::KeyStore`] that lazily mirrors the identity provider's
//! published key set.

pub mod claims;
pub mod gate;
pub mod keystore;
pub mod oauth;
pub mod verifier;

pub use claims::{Claims, Role};
pub use gate::{AuthLayer, Challenge, RoleLayer};
pub use keystore::{KeyStore, KeyStoreError, SigningKey};
pub use oauth::{AuthInfo, OAuthError, OAuthExchange};
pub use verifier::{TokenVerifier, VerificationError};
