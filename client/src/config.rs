//! Client configuration with TOML file support.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use bitwallet_crypto::ApiKeyPair;
use bitwallet_types::Network;

use crate::error::ClientError;

/// Configuration for a [`WalletClient`](crate::WalletClient).
///
/// Can be loaded from a TOML file via [`ClientConfig::from_toml_file`] or
/// built programmatically (e.g. for tests).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Base URL of the wallet service, e.g. `https://localhost:3002`.
    pub url: String,

    /// Network the service is expected to serve.
    #[serde(default)]
    pub network: Network,

    /// Hex secp256k1 private key used to sign requests.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_private_key: Option<String>,

    /// Hex compressed public key sent as `x-identity`. Derived from the
    /// private key when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_public_key: Option<String>,

    /// PEM bundle of pinned certificates. When absent, peer certificates
    /// are not verified.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub known_hosts: Option<PathBuf>,

    /// Whole-request timeout. Absent means the transport default (none).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connect_timeout_secs: Option<u64>,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_user_agent() -> String {
    format!("bitwallet-{}", env!("CARGO_PKG_VERSION"))
}

impl ClientConfig {
    pub fn new(url: impl Into<String>, network: Network) -> Self {
        Self {
            url: url.into(),
            network,
            api_private_key: None,
            api_public_key: None,
            known_hosts: None,
            timeout_secs: None,
            connect_timeout_secs: None,
            user_agent: default_user_agent(),
        }
    }

    /// Attach an API key pair (hex private key; public key derived).
    pub fn with_api_key(mut self, keys: &ApiKeyPair) -> Self {
        self.api_private_key = Some(keys.private_hex());
        self.api_public_key = Some(keys.public_hex());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_secs = Some(timeout.as_secs());
        self
    }

    /// Load configuration from a TOML file.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ClientError> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ClientError::Config(format!("{}: {e}", path.as_ref().display())))?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, ClientError> {
        toml::from_str(s).map_err(|e| ClientError::Config(e.to_string()))
    }

    pub fn to_toml_string(&self) -> Result<String, ClientError> {
        toml::to_string_pretty(self).map_err(|e| ClientError::Config(e.to_string()))
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }

    pub fn connect_timeout(&self) -> Option<Duration> {
        self.connect_timeout_secs.map(Duration::from_secs)
    }

    /// Parsed base URL; only http and https are accepted.
    pub fn base_url(&self) -> Result<reqwest::Url, ClientError> {
        if self.url.is_empty() {
            return Err(ClientError::Config("url is expected".into()));
        }
        let url = reqwest::Url::parse(&self.url)
            .map_err(|e| ClientError::Config(format!("invalid url {}: {e}", self.url)))?;
        match url.scheme() {
            "http" | "https" => Ok(url),
            other => Err(ClientError::Config(format!("unsupported url scheme: {other}"))),
        }
    }

    /// The configured signing key pair, or `None` for anonymous operation.
    ///
    /// A public key without a private key is an inconsistent configuration.
    pub fn api_key_pair(&self) -> Result<Option<ApiKeyPair>, ClientError> {
        match (&self.api_private_key, &self.api_public_key) {
            (None, None) => Ok(None),
            (None, Some(_)) => Err(ClientError::Config(
                "api public key is configured without a private key".into(),
            )),
            (Some(private), None) => Ok(Some(ApiKeyPair::from_private_hex(private)?)),
            (Some(private), Some(public)) => Ok(Some(ApiKeyPair::from_hex_pair(private, public)?)),
        }
    }

    /// Check every field that can be checked without touching the network.
    pub fn validate(&self) -> Result<(), ClientError> {
        self.base_url()?;
        self.api_key_pair()?;
        if self.timeout_secs == Some(0) {
            return Err(ClientError::Config("timeout_secs must be positive".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bitwallet_crypto::generate_keypair;

    #[test]
    fn minimal_toml_uses_defaults() {
        let cfg = ClientConfig::from_toml_str(r#"url = "https://localhost:3002""#).unwrap();
        assert_eq!(cfg.network, Network::Livenet);
        assert!(cfg.api_private_key.is_none());
        assert!(cfg.timeout().is_none());
        assert!(cfg.user_agent.starts_with("bitwallet-"));
        cfg.validate().unwrap();
    }

    #[test]
    fn full_toml() {
        let cfg = ClientConfig::from_toml_str(
            r#"
            url = "http://127.0.0.1:3002"
            network = "testnet"
            known_hosts = "/tmp/known_hosts.pem"
            timeout_secs = 30
            "#,
        )
        .unwrap();
        assert_eq!(cfg.network, Network::Testnet);
        assert_eq!(cfg.timeout(), Some(Duration::from_secs(30)));
        assert_eq!(cfg.known_hosts, Some(PathBuf::from("/tmp/known_hosts.pem")));
    }

    #[test]
    fn toml_roundtrip() {
        let keys = generate_keypair();
        let cfg = ClientConfig::new("https://example.com", Network::Regtest).with_api_key(&keys);
        let text = cfg.to_toml_string().unwrap();
        let back = ClientConfig::from_toml_str(&text).unwrap();
        assert_eq!(back.network, Network::Regtest);
        assert_eq!(back.api_public_key, Some(keys.public_hex()));
    }

    #[test]
    fn rejects_bad_urls() {
        assert!(ClientConfig::new("", Network::Livenet).validate().is_err());
        assert!(ClientConfig::new("somenet", Network::Livenet).validate().is_err());
        assert!(ClientConfig::new("ftp://host", Network::Livenet)
            .validate()
            .is_err());
    }

    #[test]
    fn public_key_without_private_key_is_inconsistent() {
        let mut cfg = ClientConfig::new("http://localhost", Network::Livenet);
        cfg.api_public_key = Some(generate_keypair().public_hex());
        assert!(matches!(cfg.validate(), Err(ClientError::Config(_))));
    }

    #[test]
    fn malformed_private_key_is_a_signing_error() {
        let mut cfg = ClientConfig::new("http://localhost", Network::Livenet);
        cfg.api_private_key = Some("zz".into());
        assert!(matches!(cfg.validate(), Err(ClientError::Signing(_))));
    }

    #[test]
    fn private_key_alone_derives_identity() {
        let keys = generate_keypair();
        let mut cfg = ClientConfig::new("http://localhost", Network::Livenet);
        cfg.api_private_key = Some(keys.private_hex());
        let pair = cfg.api_key_pair().unwrap().unwrap();
        assert_eq!(pair.public_hex(), keys.public_hex());
    }

    #[test]
    fn missing_file_is_config_error() {
        assert!(matches!(
            ClientConfig::from_toml_file("/nonexistent/bitwallet.toml"),
            Err(ClientError::Config(_))
        ));
    }
}
