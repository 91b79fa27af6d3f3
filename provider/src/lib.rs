//! Blockchain data providers.
//!
//! [`DataProvider`] is the capability the wallet core consumes. The concrete
//! backends form a closed set, [`Provider`], chosen from the persisted
//! [`ProviderId`] and dispatched with a plain `match`.

pub mod blockfrost;
pub mod error;
pub mod http;
pub mod tangocrypto;
pub mod types;

pub use blockfrost::Blockfrost;
pub use error::ProviderError;
pub use http::{Endpoint, HttpClient};
pub use tangocrypto::Tangocrypto;
pub use types::{Delegation, TxRef, Utxo};

use async_trait::async_trait;
use kura_types::{AssetAmount, ProviderId};
use serde_json::Value;

/// Read/submit access to chain data.
///
/// Security- and money-relevant calls (`get_address_balance`,
/// `get_address_utxos`, `submit_tx`) return typed errors. Enrichment lookups
/// soft-fail to an empty value.
#[async_trait]
pub trait DataProvider: Send + Sync {
    /// Total value held by an address, lovelace first.
    async fn get_address_balance(&self, address: &str) -> Result<Vec<AssetAmount>, ProviderError>;

    /// Controlled stake minus withdrawable rewards. Zero when unknown.
    async fn get_stake_balance(&self, stake_address: &str) -> u64;

    async fn get_address_utxos(
        &self,
        address: &str,
        page: u32,
        limit: u32,
    ) -> Result<Vec<Utxo>, ProviderError>;

    /// Newest first. Empty on any failure.
    async fn get_address_transactions(&self, address: &str, count: u32, page: u32) -> Vec<TxRef>;

    async fn get_transaction(&self, tx_hash: &str) -> Option<Value>;

    async fn get_transaction_utxos(&self, tx_hash: &str) -> Option<Value>;

    async fn get_transaction_metadata(&self, tx_hash: &str) -> Option<Value>;

    async fn get_block(&self, hash_or_number: &str) -> Option<Value>;

    /// Submit a hex-encoded signed transaction; returns its id.
    async fn submit_tx(&self, tx_hex: &str) -> Result<String, ProviderError>;

    async fn get_pool_delegation(&self, stake_address: &str) -> Option<Delegation>;

    /// Payment addresses associated with a stake address.
    async fn get_addresses(&self, stake_address: &str, limit: u32) -> Result<Vec<String>, ProviderError>;

    /// Asset metadata. `None` when the lookup fails.
    async fn get_asset(&self, unit: &str) -> Option<Value>;

    async fn get_latest_block(&self) -> Result<Value, ProviderError>;

    async fn get_epoch_parameters(&self, epoch: u64) -> Result<Value, ProviderError>;
}

/// The configured provider backend.
pub enum Provider {
    Blockfrost(Blockfrost),
    Tangocrypto(Tangocrypto),
}

impl Provider {
    pub fn new(id: ProviderId, endpoint: Endpoint) -> Result<Self, ProviderError> {
        tracing::debug!(provider = %id, base_url = %endpoint.base_url, "selecting data provider");
        Ok(match id {
            ProviderId::Blockfrost => Self::Blockfrost(Blockfrost::new(endpoint)?),
            ProviderId::Tangocrypto => Self::Tangocrypto(Tangocrypto::new(endpoint)?),
        })
    }

    pub fn id(&self) -> ProviderId {
        match self {
            Self::Blockfrost(_) => ProviderId::Blockfrost,
            Self::Tangocrypto(_) => ProviderId::Tangocrypto,
        }
    }

    pub fn endpoint(&self) -> &Endpoint {
        match self {
            Self::Blockfrost(p) => p.endpoint(),
            Self::Tangocrypto(p) => p.endpoint(),
        }
    }
}

macro_rules! dispatch {
    ($self:ident, $p:ident => $call:expr) => {
        match $self {
            Provider::Blockfrost($p) => $call,
            Provider::Tangocrypto($p) => $call,
        }
    };
}

#[async_trait]
impl DataProvider for Provider {
    async fn get_address_balance(&self, address: &str) -> Result<Vec<AssetAmount>, ProviderError> {
        dispatch!(self, p => p.get_address_balance(address).await)
    }

    async fn get_stake_balance(&self, stake_address: &str) -> u64 {
        dispatch!(self, p => p.get_stake_balance(stake_address).await)
    }

    async fn get_address_utxos(
        &self,
        address: &str,
        page: u32,
        limit: u32,
    ) -> Result<Vec<Utxo>, ProviderError> {
        dispatch!(self, p => p.get_address_utxos(address, page, limit).await)
    }

    async fn get_address_transactions(&self, address: &str, count: u32, page: u32) -> Vec<TxRef> {
        dispatch!(self, p => p.get_address_transactions(address, count, page).await)
    }

    async fn get_transaction(&self, tx_hash: &str) -> Option<Value> {
        dispatch!(self, p => p.get_transaction(tx_hash).await)
    }

    async fn get_transaction_utxos(&self, tx_hash: &str) -> Option<Value> {
        dispatch!(self, p => p.get_transaction_utxos(tx_hash).await)
    }

    async fn get_transaction_metadata(&self, tx_hash: &str) -> Option<Value> {
        dispatch!(self, p => p.get_transaction_metadata(tx_hash).await)
    }

    async fn get_block(&self, hash_or_number: &str) -> Option<Value> {
        dispatch!(self, p => p.get_block(hash_or_number).await)
    }

    async fn submit_tx(&self, tx_hex: &str) -> Result<String, ProviderError> {
        dispatch!(self, p => p.submit_tx(tx_hex).await)
    }

    async fn get_pool_delegation(&self, stake_address: &str) -> Option<Delegation> {
        dispatch!(self, p => p.get_pool_delegation(stake_address).await)
    }

    async fn get_addresses(&self, stake_address: &str, limit: u32) -> Result<Vec<String>, ProviderError> {
        dispatch!(self, p => p.get_addresses(stake_address, limit).await)
    }

    async fn get_asset(&self, unit: &str) -> Option<Value> {
        dispatch!(self, p => p.get_asset(unit).await)
    }

    async fn get_latest_block(&self) -> Result<Value, ProviderError> {
        dispatch!(self, p => p.get_latest_block().await)
    }

    async fn get_epoch_parameters(&self, epoch: u64) -> Result<Value, ProviderError> {
        dispatch!(self, p => p.get_epoch_parameters(epoch).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selects_variant_by_id() {
        let provider = Provider::new(ProviderId::Tangocrypto, Endpoint::new("https://t.example")).unwrap();
        assert_eq!(provider.id(), ProviderId::Tangocrypto);
        assert_eq!(provider.endpoint().base_url, "https://t.example");

        let provider = Provider::new(
            ProviderId::Blockfrost,
            Endpoint::new("https://b.example").with_auth("project_id", "mainnetXYZ"),
        )
        .unwrap();
        assert_eq!(provider.id(), ProviderId::Blockfrost);
        assert_eq!(provider.endpoint().project_id.as_deref(), Some("mainnetXYZ"));
    }

    #[tokio::test]
    async fn unreachable_host_soft_fails_optional_lookups() {
        // Port 9 (discard) on localhost is closed in test environments.
        let provider = Provider::new(ProviderId::Blockfrost, Endpoint::new("http://127.0.0.1:9")).unwrap();
        assert!(provider.get_transaction("aa").await.is_none());
        assert!(provider.get_address_transactions("addr1", 10, 1).await.is_empty());
        assert_eq!(provider.get_stake_balance("stake1").await, 0);
        assert!(provider.get_asset("policy.token").await.is_none());
        assert!(matches!(
            provider.get_address_balance("addr1").await,
            Err(ProviderError::Transport(_))
        ));
    }

    #[tokio::test]
    async fn unreachable_tangocrypto_asset_lookup_is_none() {
        let provider = Provider::new(ProviderId::Tangocrypto, Endpoint::new("http://127.0.0.1:9")).unwrap();
        assert!(provider.get_asset("policy.token").await.is_none());
    }
}
