//! Cache of the identity provider's public signing keys.
//!
//! The cache is an immutable `Arc<HashMap>` snapshot. A refresh fetches the
//! whole published key set, keeps only signature keys, and swaps the
//! snapshot under the write lock, so readers see either the old or the new
//! set and never a partial one. Refreshes are lazy: they only happen when a
//! token names a key id that is not cached.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use jsonwebtoken::DecodingKey;
use serde::Deserialize;
use thiserror::Error;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

/// `use` value of keys meant for signature verification.
const SIGNATURE_USE: &str = "sig";

/// Errors raised while resolving a signing key.
#[derive(Debug, Error)]
pub enum KeyStoreError {
    /// The key set could not be fetched or parsed.
    #[error("key store unavailable: {0}")]
    Unavailable(String),

    /// The key id is not in the published key set, even after a refresh.
    #[error("unknown signing key {0:?}")]
    UnknownKey(String),
}

/// A published public key, ready for signature verification.
#[derive(Clone)]
pub struct SigningKey {
    /// Key id (`kid`).
    pub id: String,
    /// Declared algorithm (`alg`), e.g. `RS256`.
    pub algorithm: String,
    /// Declared use (`use`), always `sig` for cached keys.
    pub usage: String,
    key: DecodingKey,
}

impl SigningKey {
    /// Build a key from an RSA public key in PEM form.
    pub fn from_rsa_pem(
        id: impl Into<String>,
        algorithm: impl Into<String>,
        usage: impl Into<String>,
        pem: &[u8],
    ) -> Result<Self, KeyStoreError> {
        let id = id.into();
        let key = DecodingKey::from_rsa_pem(pem)
            .map_err(|e| KeyStoreError::Unavailable(format!("key {id}: {e}")))?;
        Ok(Self {
            id,
            algorithm: algorithm.into(),
            usage: usage.into(),
            key,
        })
    }

    pub fn decoding_key(&self) -> &DecodingKey {
        &self.key
    }
}

impl fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SigningKey")
            .field("id", &self.id)
            .field("algorithm", &self.algorithm)
            .field("usage", &self.usage)
            .finish_non_exhaustive()
    }
}

type KeyMap = HashMap<String, Arc<SigningKey>>;

/// Key set document served by the identity provider.
#[derive(Debug, Deserialize)]
struct KeySetDocument {
    #[serde(default)]
    keys: Vec<PublishedKey>,
}

#[derive(Debug, Deserialize)]
struct PublishedKey {
    alg: Option<String>,
    kid: Option<String>,
    #[serde(rename = "use")]
    usage: Option<String>,
    #[serde(rename = "publicKey")]
    public_key: Option<String>,
    /// RSA modulus, base64url.
    n: Option<String>,
    /// RSA exponent, base64url.
    e: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PublicKeyResponse {
    #[serde(rename = "publicKey")]
    public_key: String,
}

/// Lazily refreshed cache of signing keys keyed by `kid`.
pub struct KeyStore {
    client: reqwest::Client,
    jwks_url: String,
    public_key_url: Option<String>,
    keys: RwLock<Arc<KeyMap>>,
    /// Serializes refreshes so concurrent misses trigger a single fetch.
    refresh_lock: Mutex<()>,
    refreshes: AtomicU64,
}

impl KeyStore {
    /// Create an empty key store.
    ///
    /// `timeout` bounds every request to the identity provider.
    pub fn new(
        jwks_url: impl Into<String>,
        public_key_url: Option<String>,
        timeout: Duration,
    ) -> Result<Self, KeyStoreError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout)
            .build()
            .map_err(|e| KeyStoreError::Unavailable(format!("http client: {e}")))?;
        Ok(Self {
            client,
            jwks_url: jwks_url.into(),
            public_key_url,
            keys: RwLock::new(Arc::new(HashMap::new())),
            refresh_lock: Mutex::new(()),
            refreshes: AtomicU64::new(0),
        })
    }

    /// Seed the cache with known keys.
    #[must_use]
    pub fn with_keys(self, keys: impl IntoIterator<Item = SigningKey>) -> Self {
        let map: KeyMap = keys
            .into_iter()
            .map(|k| (k.id.clone(), Arc::new(k)))
            .collect();
        Self {
            keys: RwLock::new(Arc::new(map)),
            ..self
        }
    }

    /// Resolve the key for `kid`, refreshing the key set once on a miss.
    pub async fn resolve(&self, kid: &str) -> Result<Arc<SigningKey>, KeyStoreError> {
        if let Some(key) = self.get(kid).await {
            return Ok(key);
        }

        let _guard = self.refresh_lock.lock().await;
        // Another request may have refreshed while we waited.
        if let Some(key) = self.get(kid).await {
            return Ok(key);
        }

        debug!(kid, "signing key not cached, refreshing key set");
        self.refresh_locked().await?;
        self.get(kid)
            .await
            .ok_or_else(|| KeyStoreError::UnknownKey(kid.to_owned()))
    }

    /// Look up a cached key without refreshing.
    pub async fn get(&self, kid: &str) -> Option<Arc<SigningKey>> {
        self.keys.read().await.get(kid).cloned()
    }

    /// The current cache snapshot.
    pub async fn snapshot(&self) -> Arc<HashMap<String, Arc<SigningKey>>> {
        Arc::clone(&*self.keys.read().await)
    }

    /// Fetch the published key set and replace the cache. Returns the number
    /// of cached keys.
    pub async fn refresh(&self) -> Result<usize, KeyStoreError> {
        let _guard = self.refresh_lock.lock().await;
        self.refresh_locked().await
    }

    /// Number of key set fetches attempted so far.
    pub fn refresh_count(&self) -> u64 {
        self.refreshes.load(Ordering::Relaxed)
    }

    async fn refresh_locked(&self) -> Result<usize, KeyStoreError> {
        self.refreshes.fetch_add(1, Ordering::Relaxed);
        let map = self.fetch_key_set().await.inspect_err(|e| {
            warn!(url = %self.jwks_url, error = %e, "key set refresh failed");
        })?;
        let count = map.len();
        *self.keys.write().await = Arc::new(map);
        info!(url = %self.jwks_url, keys = count, "signing key set refreshed");
        Ok(count)
    }

    async fn fetch_key_set(&self) -> Result<KeyMap, KeyStoreError> {
        let document: KeySetDocument = self.get_json(&self.jwks_url, &[]).await?;

        let mut map = KeyMap::new();
        for published in document.keys {
            if published.usage.as_deref() != Some(SIGNATURE_USE) {
                continue;
            }
            let Some(kid) = published.kid.clone().filter(|k| !k.is_empty()) else {
                warn!("published signing key without kid, skipping");
                continue;
            };
            let key = self.instantiate(&kid, published).await?;
            map.insert(kid, Arc::new(key));
        }
        Ok(map)
    }

    /// Turn a published key into a usable [`SigningKey`], preferring the
    /// inline PEM, then RSA components, then the public key endpoint.
    async fn instantiate(
        &self,
        kid: &str,
        published: PublishedKey,
    ) -> Result<SigningKey, KeyStoreError> {
        let algorithm = published.alg.unwrap_or_default();
        if let Some(pem) = published.public_key {
            return SigningKey::from_rsa_pem(kid, algorithm, SIGNATURE_USE, pem.as_bytes());
        }
        if let (Some(n), Some(e)) = (published.n.as_deref(), published.e.as_deref()) {
            let key = DecodingKey::from_rsa_components(n, e)
                .map_err(|err| KeyStoreError::Unavailable(format!("key {kid}: {err}")))?;
            return Ok(SigningKey {
                id: kid.to_owned(),
                algorithm,
                usage: SIGNATURE_USE.to_owned(),
                key,
            });
        }
        let Some(url) = self.public_key_url.as_deref() else {
            return Err(KeyStoreError::Unavailable(format!(
                "key {kid} has no key material and no public key endpoint is configured"
            )));
        };
        let response: PublicKeyResponse = self.get_json(url, &[("kid", kid)]).await?;
        SigningKey::from_rsa_pem(kid, algorithm, SIGNATURE_USE, response.public_key.as_bytes())
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, &str)],
    ) -> Result<T, KeyStoreError> {
        let unavailable = |e: reqwest::Error| KeyStoreError::Unavailable(format!("{url}: {e}"));
        self.client
            .get(url)
            .query(query)
            .send()
            .await
            .map_err(unavailable)?
            .error_for_status()
            .map_err(unavailable)?
            .json()
            .await
            .map_err(unavailable)
    }
}

impl fmt::Debug for KeyStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyStore")
            .field("jwks_url", &self.jwks_url)
            .field("public_key_url", &self.public_key_url)
            .field("refreshes", &self.refresh_count())
            .finish_non_exhaustive()
    }
}
