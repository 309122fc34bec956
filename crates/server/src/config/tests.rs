use std::collections::HashMap;
use std::sync::Arc;

use restvoice_state_memory::MemoryRepository;

use super::*;
use crate::api::{AppState, UseCases};

#[test]
fn empty_config_uses_defaults() {
    let config: RestvoiceConfig = toml::from_str("").unwrap();
    assert_eq!(config.server.host, "127.0.0.1");
    assert_eq!(config.server.port, 8080);
    assert!(config.auth.enabled);
    assert_eq!(config.auth.mode, TokenMode::Rs256);
    assert_eq!(config.auth.grant_type, "authorization_code");
    assert_eq!(config.auth.http_timeout_seconds, 5);
    assert!(!config.auth.forbid_insufficient_role);
    assert!(config.auth.public_key_url.is_none());
}

#[test]
fn auth_section_overrides() {
    let toml = r#"
        [server]
        port = 9090

        [auth]
        mode = "hs256"
        realm = "invoices"
        issuer = "acme.com"
        client_id = "e9fdb985-9173-4e01-9d73-ac2d60d1dc8e"
        public_key_url = "http://idp:9011/api/jwt/public-key"
        leeway_seconds = 30
        forbid_insufficient_role = true
    "#;

    let config: RestvoiceConfig = toml::from_str(toml).unwrap();
    assert_eq!(config.server.port, 9090);
    assert_eq!(config.auth.mode, TokenMode::Hs256);
    assert_eq!(config.auth.realm, "invoices");
    assert_eq!(config.auth.issuer, "acme.com");
    assert_eq!(
        config.auth.public_key_url.as_deref(),
        Some("http://idp:9011/api/jwt/public-key")
    );
    assert_eq!(config.auth.leeway_seconds, 30);
    assert!(config.auth.forbid_insufficient_role);
}

#[test]
fn unknown_mode_is_rejected() {
    let result: Result<RestvoiceConfig, _> = toml::from_str("[auth]\nmode = \"none\"");
    assert!(result.is_err());
}

#[test]
fn secrets_come_from_environment() {
    let mut config: RestvoiceConfig = toml::from_str("[auth]\nclient_secret = \"from-file\"").unwrap();
    let env: HashMap<&str, &str> = HashMap::from([(SHARED_SECRET_ENV, "shh")]);

    config.apply_env_overrides(|k| env.get(k).map(|v| (*v).to_owned()));
    assert_eq!(config.auth.client_secret.as_deref(), Some("from-file"));
    assert_eq!(config.auth.shared_secret.as_deref(), Some("shh"));

    let env: HashMap<&str, &str> = HashMap::from([(CLIENT_SECRET_ENV, "from-env")]);
    config.apply_env_overrides(|k| env.get(k).map(|v| (*v).to_owned()));
    assert_eq!(config.auth.client_secret.as_deref(), Some("from-env"));
}

#[test]
fn missing_file_falls_back_to_defaults() {
    let config = RestvoiceConfig::load(Path::new("/nonexistent/restvoice.toml")).unwrap();
    assert_eq!(config.server.port, 8080);
}

#[test]
fn enabled_auth_requires_client_id() {
    let usecases = UseCases::new(&Arc::new(MemoryRepository::new()));
    let mut config: RestvoiceConfig = toml::from_str("").unwrap();

    assert!(matches!(
        AppState::from_config(&config.auth, usecases.clone()),
        Err(ServerError::Config(msg)) if msg.contains("client_id")
    ));

    config.auth.client_id = "restvoice".to_owned();
    assert!(AppState::from_config(&config.auth, usecases.clone()).is_ok());

    config.auth.client_id.clear();
    config.auth.enabled = false;
    assert!(AppState::from_config(&config.auth, usecases).is_ok());
}
