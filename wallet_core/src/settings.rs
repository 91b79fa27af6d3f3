//! Network, provider, currency and dapp whitelist settings.

use kura_crypto::{Address, ByronAddress};
use kura_store::{keys, load, save};
use kura_types::{NetworkConfig, NetworkId, ProviderId};

use crate::state::WalletState;
use crate::WalletError;

impl WalletState {
    /// Select `id`, using `node` or the active provider's default node.
    /// Returns whether the network id changed.
    pub async fn set_network(&self, id: NetworkId, node: Option<&str>) -> Result<bool, WalletError> {
        let provider = self.provider().await?;
        let previous: Option<NetworkConfig> = load(self.storage(), keys::NETWORK).await?;
        let node = match node {
            Some(node) => node.to_string(),
            None => self.config().node_url(provider, id).to_string(),
        };
        save(self.storage(), keys::NETWORK, &NetworkConfig { id, node }).await?;

        let changed = previous.is_some_and(|p| p.id != id);
        if changed {
            tracing::info!(network = %id, "network changed");
        }
        Ok(changed)
    }

    pub async fn set_provider(&self, provider: ProviderId) -> Result<(), WalletError> {
        save(self.storage(), keys::PROVIDER, &provider).await?;
        tracing::info!(%provider, "provider changed");
        Ok(())
    }

    pub async fn currency(&self) -> Result<String, WalletError> {
        Ok(load(self.storage(), keys::CURRENCY)
            .await?
            .unwrap_or_else(|| self.config().default_currency.clone()))
    }

    pub async fn set_currency(&self, currency: &str) -> Result<(), WalletError> {
        Ok(save(self.storage(), keys::CURRENCY, currency).await?)
    }

    pub async fn whitelisted(&self) -> Result<Vec<String>, WalletError> {
        Ok(load(self.storage(), keys::WHITELISTED).await?.unwrap_or_default())
    }

    pub async fn is_whitelisted(&self, origin: &str) -> Result<bool, WalletError> {
        Ok(self.whitelisted().await?.iter().any(|o| o == origin))
    }

    pub async fn set_whitelisted(&self, origin: &str) -> Result<(), WalletError> {
        let _guard = self.write_lock().await;
        let mut origins = self.whitelisted().await?;
        if origins.iter().any(|o| o == origin) {
            return Ok(());
        }
        origins.push(origin.to_string());
        Ok(save(self.storage(), keys::WHITELISTED, &origins).await?)
    }

    pub async fn remove_whitelisted(&self, origin: &str) -> Result<(), WalletError> {
        let _guard = self.write_lock().await;
        let mut origins = self.whitelisted().await?;
        let before = origins.len();
        origins.retain(|o| o != origin);
        if origins.len() == before {
            return Ok(());
        }
        Ok(save(self.storage(), keys::WHITELISTED, &origins).await?)
    }

    /// Raw bytes of a bech32 Shelley or base58 Byron address on the active
    /// network.
    pub async fn is_valid_address(&self, address: &str) -> Result<Option<Vec<u8>>, WalletError> {
        let network = self.network().await?.id;
        if let Ok(shelley) = Address::from_bech32(address) {
            return Ok((shelley.network() == Some(network)).then(|| shelley.to_bytes()));
        }
        Ok(ByronAddress::from_base58(address)
            .ok()
            .filter(|byron| byron.network() == network)
            .map(|byron| byron.to_bytes()))
    }
}
