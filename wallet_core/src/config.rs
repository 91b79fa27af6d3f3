//! Wallet configuration with TOML file support.

use std::time::Duration;

use kura_provider::Endpoint;
use kura_types::{NetworkId, ProviderId};
use kura_utils::LogFormat;
use serde::{Deserialize, Serialize};

use crate::retry::RetryPolicy;
use crate::WalletError;

/// Configuration for the wallet core.
///
/// Can be loaded from a TOML file via [`WalletConfig::from_toml_file`] or
/// built programmatically (e.g. for tests).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WalletConfig {
    /// Network selected for a freshly created wallet.
    #[serde(default = "default_network")]
    pub network: NetworkId,

    /// Provider selected for a freshly created wallet.
    #[serde(default)]
    pub provider: ProviderId,

    #[serde(default)]
    pub nodes: NodeUrls,

    #[serde(default)]
    pub credentials: Credentials,

    /// Lifetime of an unlocked session.
    #[serde(default = "default_session_ttl_secs")]
    pub session_ttl_secs: u64,

    /// Bounded polling used when refreshing balances.
    #[serde(default)]
    pub balance_retry: RetryPolicy,

    #[serde(default = "default_currency")]
    pub default_currency: String,

    #[serde(default)]
    pub log_format: LogFormat,

    #[serde(default = "default_log_level")]
    pub log_level: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkUrls {
    pub mainnet: String,
    pub testnet: String,
}

impl NetworkUrls {
    pub fn get(&self, network: NetworkId) -> &str {
        match network {
            NetworkId::Mainnet => &self.mainnet,
            NetworkId::Testnet => &self.testnet,
        }
    }
}

/// Base URLs per provider and network.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeUrls {
    #[serde(default = "default_blockfrost_urls")]
    pub blockfrost: NetworkUrls,
    #[serde(default = "default_tangocrypto_urls")]
    pub tangocrypto: NetworkUrls,
}

impl Default for NodeUrls {
    fn default() -> Self {
        Self {
            blockfrost: default_blockfrost_urls(),
            tangocrypto: default_tangocrypto_urls(),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderCredentials {
    #[serde(default)]
    pub auth_header: Option<String>,
    #[serde(default)]
    pub mainnet_project_id: Option<String>,
    #[serde(default)]
    pub testnet_project_id: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    #[serde(default = "default_blockfrost_credentials")]
    pub blockfrost: ProviderCredentials,
    #[serde(default = "default_tangocrypto_credentials")]
    pub tangocrypto: ProviderCredentials,
}

impl Default for Credentials {
    fn default() -> Self {
        Self {
            blockfrost: default_blockfrost_credentials(),
            tangocrypto: default_tangocrypto_credentials(),
        }
    }
}

// ── Serde default helpers ──────────────────────────────────────────────

fn default_network() -> NetworkId {
    NetworkId::Mainnet
}

fn default_session_ttl_secs() -> u64 {
    600
}

fn default_currency() -> String {
    "usd".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_blockfrost_urls() -> NetworkUrls {
    NetworkUrls {
        mainnet: "https://cardano-mainnet.blockfrost.io/api/v0".to_string(),
        testnet: "https://cardano-testnet.blockfrost.io/api/v0".to_string(),
    }
}

fn default_tangocrypto_urls() -> NetworkUrls {
    NetworkUrls {
        mainnet: "https://cardano-mainnet.tangocrypto.com/app/v1".to_string(),
        testnet: "https://cardano-testnet.tangocrypto.com/app/v1".to_string(),
    }
}

fn default_blockfrost_credentials() -> ProviderCredentials {
    ProviderCredentials {
        auth_header: Some("project_id".to_string()),
        ..ProviderCredentials::default()
    }
}

fn default_tangocrypto_credentials() -> ProviderCredentials {
    ProviderCredentials {
        auth_header: Some("x-api-key".to_string()),
        ..ProviderCredentials::default()
    }
}

// ── Impl ───────────────────────────────────────────────────────────────

impl WalletConfig {
    /// Load configuration from a TOML file.
    pub fn from_toml_file(path: &str) -> Result<Self, WalletError> {
        let content =
            std::fs::read_to_string(path).map_err(|e| WalletError::Config(e.to_string()))?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, WalletError> {
        toml::from_str(s).map_err(|e| WalletError::Config(e.to_string()))
    }

    /// Serialize the configuration to a TOML string.
    pub fn to_toml_string(&self) -> Result<String, WalletError> {
        toml::to_string_pretty(self).map_err(|e| WalletError::Config(e.to_string()))
    }

    /// Install the global tracing subscriber from `log_format` and `log_level`.
    pub fn init_logging(&self) -> Result<(), WalletError> {
        kura_utils::init_logging(self.log_format, &self.log_level)
            .map_err(|e| WalletError::Config(e.to_string()))
    }

    pub fn session_ttl(&self) -> Duration {
        Duration::from_secs(self.session_ttl_secs)
    }

    /// Default node URL for a provider on a network.
    pub fn node_url(&self, provider: ProviderId, network: NetworkId) -> &str {
        match provider {
            ProviderId::Blockfrost => self.nodes.blockfrost.get(network),
            ProviderId::Tangocrypto => self.nodes.tangocrypto.get(network),
        }
    }

    /// Endpoint for `node`, authenticated with the project id for `network`.
    pub fn endpoint(&self, provider: ProviderId, network: NetworkId, node: &str) -> Endpoint {
        let credentials = match provider {
            ProviderId::Blockfrost => &self.credentials.blockfrost,
            ProviderId::Tangocrypto => &self.credentials.tangocrypto,
        };
        let project_id = match network {
            NetworkId::Mainnet => &credentials.mainnet_project_id,
            NetworkId::Testnet => &credentials.testnet_project_id,
        };
        let endpoint = Endpoint::new(node);
        match (&credentials.auth_header, project_id) {
            (Some(header), Some(id)) => endpoint.with_auth(header.as_str(), id.as_str()),
            _ => endpoint,
        }
    }
}

impl Default for WalletConfig {
    fn default() -> Self {
        Self {
            network: default_network(),
            provider: ProviderId::default(),
            nodes: NodeUrls::default(),
            credentials: Credentials::default(),
            session_ttl_secs: default_session_ttl_secs(),
            balance_retry: RetryPolicy::default(),
            default_currency: default_currency(),
            log_format: LogFormat::default(),
            log_level: default_log_level(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_round_trips_through_toml() {
        let config = WalletConfig::default();
        let toml_str = config.to_toml_string().unwrap();
        let parsed = WalletConfig::from_toml_str(&toml_str).expect("should parse");
        assert_eq!(parsed, config);
    }

    #[test]
    fn minimal_toml_uses_defaults() {
        let config = WalletConfig::from_toml_str("").unwrap();
        assert_eq!(config.network, NetworkId::Mainnet);
        assert_eq!(config.provider, ProviderId::Blockfrost);
        assert_eq!(config.session_ttl(), Duration::from_secs(600));
        assert_eq!(config.balance_retry.max_attempts, 50);
        assert_eq!(config.default_currency, "usd");
    }

    #[test]
    fn partial_toml_overrides() {
        let config = WalletConfig::from_toml_str(
            r#"
            network = "testnet"
            provider = "tangocrypto"
            session_ttl_secs = 60
            log_format = "json"

            [balance_retry]
            interval_ms = 5
            max_attempts = 3

            [credentials.blockfrost]
            auth_header = "project_id"
            testnet_project_id = "testnetABC"
            "#,
        )
        .unwrap();
        assert_eq!(config.network, NetworkId::Testnet);
        assert_eq!(config.provider, ProviderId::Tangocrypto);
        assert_eq!(config.balance_retry.max_attempts, 3);
        assert_eq!(config.log_format, LogFormat::Json);

        let endpoint = config.endpoint(
            ProviderId::Blockfrost,
            NetworkId::Testnet,
            config.node_url(ProviderId::Blockfrost, NetworkId::Testnet),
        );
        assert_eq!(endpoint.project_id.as_deref(), Some("testnetABC"));
        assert!(endpoint.base_url.contains("testnet"));

        let mainnet = config.endpoint(ProviderId::Blockfrost, NetworkId::Mainnet, "https://x");
        assert_eq!(mainnet.project_id, None);
    }

    #[test]
    fn missing_file_returns_config_error() {
        let err = WalletConfig::from_toml_file("/nonexistent/kura.toml").unwrap_err();
        assert!(matches!(err, WalletError::Config(_)));
    }
}
