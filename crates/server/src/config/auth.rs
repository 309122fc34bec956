use serde::Deserialize;

/// How bearer tokens are signed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenMode {
    /// RS256 tokens issued by the identity provider, keys from its JWKS.
    #[default]
    Rs256,
    /// HS256 tokens signed with a shared secret (legacy/local setups).
    Hs256,
}

/// Identity provider and token verification configuration.
#[derive(Debug, Deserialize)]
pub struct AuthConfig {
    /// Whether authentication is enforced. When disabled every request runs
    /// as an anonymous principal holding all roles.
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Realm announced in `WWW-Authenticate` challenges.
    #[serde(default = "default_realm")]
    pub realm: String,
    #[serde(default)]
    pub mode: TokenMode,
    /// Expected `iss` claim.
    #[serde(default = "default_issuer")]
    pub issuer: String,
    /// OAuth client id; also the expected `aud` claim.
    #[serde(default)]
    pub client_id: String,
    /// Client secret for the code exchange. Prefer the
    /// `RESTVOICE_CLIENT_SECRET` environment variable.
    pub client_secret: Option<String>,
    /// Published key set of the identity provider.
    #[serde(default = "default_jwks_url")]
    pub jwks_url: String,
    /// Endpoint returning the PEM of a key by id, used for published keys
    /// that carry no inline `publicKey`.
    pub public_key_url: Option<String>,
    /// OAuth token endpoint for the access code exchange.
    #[serde(default = "default_token_url")]
    pub token_url: String,
    #[serde(default = "default_grant_type")]
    pub grant_type: String,
    #[serde(default = "default_redirect_uri")]
    pub redirect_uri: String,
    /// Shared secret for [`TokenMode::Hs256`]. Prefer the
    /// `RESTVOICE_SHARED_SECRET` environment variable.
    pub shared_secret: Option<String>,
    /// Timeout for every call to the identity provider, in seconds.
    #[serde(default = "default_http_timeout")]
    pub http_timeout_seconds: u64,
    /// Allowed clock skew when checking `exp`, in seconds.
    #[serde(default)]
    pub leeway_seconds: u64,
    /// Answer 403 instead of 401 when an authenticated caller lacks a
    /// required role.
    #[serde(default)]
    pub forbid_insufficient_role: bool,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            realm: default_realm(),
            mode: TokenMode::default(),
            issuer: default_issuer(),
            client_id: String::new(),
            client_secret: None,
            jwks_url: default_jwks_url(),
            public_key_url: None,
            token_url: default_token_url(),
            grant_type: default_grant_type(),
            redirect_uri: default_redirect_uri(),
            shared_secret: None,
            http_timeout_seconds: default_http_timeout(),
            leeway_seconds: 0,
            forbid_insufficient_role: false,
        }
    }
}

fn default_enabled() -> bool {
    true
}

fn default_realm() -> String {
    "restvoice.org".to_owned()
}

fn default_issuer() -> String {
    "http://localhost:9011".to_owned()
}

fn default_jwks_url() -> String {
    "http://localhost:9011/.well-known/jwks.json".to_owned()
}

fn default_token_url() -> String {
    "http://localhost:9011/oauth2/token".to_owned()
}

fn default_grant_type() -> String {
    "authorization_code".to_owned()
}

fn default_redirect_uri() -> String {
    "http://localhost:8080/auth/token".to_owned()
}

fn default_http_timeout() -> u64 {
    5
}
