use std::sync::Arc;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::DateTime;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, Validation};
use serde::Deserialize;
use thiserror::Error;

use super::claims::{Claims, Role};
use super::keystore::{KeyStore, KeyStoreError};

/// Claims every accepted token must carry.
const REQUIRED_CLAIMS: [&str; 4] = ["exp", "iss", "aud", "sub"];

/// Reasons a bearer token is rejected.
#[derive(Debug, Error)]
pub enum VerificationError {
    #[error("malformed token")]
    MalformedToken,

    #[error("token header is missing {0:?}")]
    MissingHeaderField(&'static str),

    #[error("unsupported signing algorithm {0:?}")]
    UnsupportedAlgorithm(String),

    #[error("unknown signing key {0:?}")]
    UnknownKey(String),

    #[error("signing keys unavailable: {0}")]
    KeyStoreUnavailable(String),

    #[error("invalid token signature")]
    InvalidSignature,

    #[error("claim validation failed: {0}")]
    ClaimValidationFailed(String),

    #[error("invalid role {0:?}")]
    InvalidRole(String),
}

impl From<KeyStoreError> for VerificationError {
    fn from(err: KeyStoreError) -> Self {
        match err {
            KeyStoreError::UnknownKey(kid) => Self::UnknownKey(kid),
            KeyStoreError::Unavailable(msg) => Self::KeyStoreUnavailable(msg),
        }
    }
}

enum KeySource {
    /// Asymmetric tokens; keys are looked up by `kid`.
    Rs256(Arc<KeyStore>),
    /// Symmetric tokens signed with a shared secret.
    Hs256(DecodingKey),
}

#[derive(Deserialize)]
struct RawHeader {
    alg: Option<String>,
    kid: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawAudience {
    One(String),
    Many(Vec<String>),
}

/// Payload as decoded. `sub` and `exp` are checked by hand after
/// validation and reported as claim failures.
#[derive(Deserialize)]
struct RawClaims {
    #[serde(default)]
    sub: Option<String>,
    iss: String,
    #[serde(default)]
    aud: Option<RawAudience>,
    #[serde(default)]
    exp: Option<serde_json::Value>,
    #[serde(default)]
    roles: Vec<String>,
}

/// Verifies bearer tokens and turns them into [`Claims`].
pub struct TokenVerifier {
    source: KeySource,
    issuer: String,
    audience: String,
    leeway: u64,
}

impl TokenVerifier {
    /// Verifier for RS256 tokens whose keys come from `keys`.
    pub fn rs256(
        keys: Arc<KeyStore>,
        issuer: impl Into<String>,
        audience: impl Into<String>,
    ) -> Self {
        Self {
            source: KeySource::Rs256(keys),
            issuer: issuer.into(),
            audience: audience.into(),
            leeway: 0,
        }
    }

    /// Verifier for HS256 tokens signed with `secret`.
    pub fn hs256(secret: &[u8], issuer: impl Into<String>, audience: impl Into<String>) -> Self {
        Self {
            source: KeySource::Hs256(DecodingKey::from_secret(secret)),
            issuer: issuer.into(),
            audience: audience.into(),
            leeway: 0,
        }
    }

    /// Allowed clock skew for the expiry check, in seconds.
    #[must_use]
    pub fn with_leeway(mut self, seconds: u64) -> Self {
        self.leeway = seconds;
        self
    }

    /// Verify `token` and return its claims.
    ///
    /// The header is inspected before any key is touched so that a token
    /// cannot choose a weaker algorithm than the key it names.
    pub async fn verify(&self, token: &str) -> Result<Claims, VerificationError> {
        let header = decode_header(token)?;
        let alg = header
            .alg
            .filter(|a| !a.is_empty())
            .ok_or(VerificationError::MissingHeaderField("alg"))?;

        let claims = match &self.source {
            KeySource::Rs256(keys) => {
                if alg != "RS256" {
                    return Err(VerificationError::UnsupportedAlgorithm(alg));
                }
                let kid = header
                    .kid
                    .filter(|k| !k.is_empty())
                    .ok_or(VerificationError::MissingHeaderField("kid"))?;
                let key = keys.resolve(&kid).await?;
                if key.algorithm != alg {
                    return Err(VerificationError::UnsupportedAlgorithm(alg));
                }
                self.decode(token, key.decoding_key(), Algorithm::RS256)?
            }
            KeySource::Hs256(secret) => {
                if alg != "HS256" {
                    return Err(VerificationError::UnsupportedAlgorithm(alg));
                }
                self.decode(token, secret, Algorithm::HS256)?
            }
        };

        let roles = claims
            .roles
            .iter()
            .map(|r| Role::from_claim(r).ok_or_else(|| VerificationError::InvalidRole(r.clone())))
            .collect::<Result<Vec<_>, _>>()?;
        let subject = claims.sub.filter(|s| !s.is_empty()).ok_or_else(|| {
            VerificationError::ClaimValidationFailed("missing claim sub".to_owned())
        })?;
        let exp = claims.exp.as_ref().and_then(serde_json::Value::as_i64).ok_or_else(|| {
            VerificationError::ClaimValidationFailed("exp is not an integer timestamp".to_owned())
        })?;
        let expiry = DateTime::from_timestamp(exp, 0).ok_or_else(|| {
            VerificationError::ClaimValidationFailed(format!("exp out of range: {exp}"))
        })?;
        let audience = match claims.aud {
            Some(RawAudience::One(aud)) => vec![aud],
            Some(RawAudience::Many(aud)) => aud,
            None => Vec::new(),
        };

        Ok(Claims {
            subject,
            roles,
            issuer: claims.iss,
            audience,
            expiry,
        })
    }

    fn decode(
        &self,
        token: &str,
        key: &DecodingKey,
        algorithm: Algorithm,
    ) -> Result<RawClaims, VerificationError> {
        let mut validation = Validation::new(algorithm);
        validation.set_issuer(&[&self.issuer]);
        validation.set_audience(&[&self.audience]);
        validation.set_required_spec_claims(&REQUIRED_CLAIMS);
        validation.leeway = self.leeway;

        jsonwebtoken::decode::<RawClaims>(token, key, &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::InvalidSignature => VerificationError::InvalidSignature,
                ErrorKind::ExpiredSignature => {
                    VerificationError::ClaimValidationFailed("token expired".to_owned())
                }
                ErrorKind::InvalidIssuer => {
                    VerificationError::ClaimValidationFailed("issuer mismatch".to_owned())
                }
                ErrorKind::InvalidAudience => {
                    VerificationError::ClaimValidationFailed("audience mismatch".to_owned())
                }
                ErrorKind::ImmatureSignature => {
                    VerificationError::ClaimValidationFailed("token not yet valid".to_owned())
                }
                ErrorKind::MissingRequiredClaim(claim) => {
                    VerificationError::ClaimValidationFailed(format!("missing claim {claim}"))
                }
                ErrorKind::InvalidAlgorithm => {
                    VerificationError::UnsupportedAlgorithm(format!("{algorithm:?}"))
                }
                ErrorKind::InvalidToken
                | ErrorKind::Base64(_)
                | ErrorKind::Json(_)
                | ErrorKind::Utf8(_) => VerificationError::MalformedToken,
                _ => VerificationError::InvalidSignature,
            })
    }
}

impl std::fmt::Debug for TokenVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mode = match self.source {
            KeySource::Rs256(_) => "RS256",
            KeySource::Hs256(_) => "HS256",
        };
        f.debug_struct("TokenVerifier")
            .field("mode", &mode)
            .field("issuer", &self.issuer)
            .field("audience", &self.audience)
            .field("leeway", &self.leeway)
            .finish()
    }
}

/// Split a compact JWS and decode its header without trusting it.
fn decode_header(token: &str) -> Result<RawHeader, VerificationError> {
    let segments: Vec<&str> = token.split('.').collect();
    if segments.len() != 3 || segments.iter().any(|s| s.is_empty()) {
        return Err(VerificationError::MalformedToken);
    }
    let bytes = URL_SAFE_NO_PAD
        .decode(segments[0])
        .map_err(|_| VerificationError::MalformedToken)?;
    serde_json::from_slice(&bytes).map_err(|_| VerificationError::MalformedToken)
}
