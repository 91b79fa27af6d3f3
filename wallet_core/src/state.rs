//! Shared handle over persisted wallet state.

use std::collections::BTreeMap;
use std::sync::Arc;

use kura_provider::Provider;
use kura_store::{keys, load, save, Storage};
use kura_types::{Account, NetworkConfig, ProviderId};
use tokio::sync::{Mutex, MutexGuard};

use crate::{WalletConfig, WalletError};

/// Cheaply cloneable handle: storage, configuration and the write lock that
/// serialises every read-modify-write of persisted records.
#[derive(Clone)]
pub struct WalletState {
    storage: Arc<dyn Storage>,
    write_lock: Arc<Mutex<()>>,
    config: Arc<WalletConfig>,
    app_version: String,
}

impl WalletState {
    pub fn new(storage: Arc<dyn Storage>, config: WalletConfig) -> Self {
        Self {
            storage,
            write_lock: Arc::new(Mutex::new(())),
            config: Arc::new(config),
            app_version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    /// Override the running application version used by migrations.
    pub fn with_app_version(mut self, version: impl Into<String>) -> Self {
        self.app_version = version.into();
        self
    }

    pub fn storage(&self) -> &dyn Storage {
        self.storage.as_ref()
    }

    pub fn config(&self) -> &WalletConfig {
        &self.config
    }

    pub fn app_version(&self) -> &str {
        &self.app_version
    }

    /// Held across every read-modify-write. Not reentrant.
    pub(crate) async fn write_lock(&self) -> MutexGuard<'_, ()> {
        self.write_lock.lock().await
    }

    pub async fn is_initialized(&self) -> Result<bool, WalletError> {
        Ok(self.storage.get(keys::ENCRYPTED_KEY).await?.is_some())
    }

    /// The encrypted root key blob.
    pub async fn encrypted_key(&self) -> Result<String, WalletError> {
        load::<String>(self.storage(), keys::ENCRYPTED_KEY)
            .await?
            .ok_or(WalletError::NotInitialized)
    }

    pub(crate) async fn load_accounts(&self) -> Result<BTreeMap<u32, Account>, WalletError> {
        Ok(load(self.storage(), keys::ACCOUNTS).await?.unwrap_or_default())
    }

    pub(crate) async fn save_accounts(
        &self,
        accounts: &BTreeMap<u32, Account>,
    ) -> Result<(), WalletError> {
        Ok(save(self.storage(), keys::ACCOUNTS, accounts).await?)
    }

    pub async fn current_account_index(&self) -> Result<u32, WalletError> {
        load(self.storage(), keys::CURRENT_ACCOUNT)
            .await?
            .ok_or(WalletError::NotInitialized)
    }

    /// The stored account record at `current_account_index`.
    pub(crate) async fn current_account_record(&self) -> Result<Account, WalletError> {
        let index = self.current_account_index().await?;
        self.load_accounts()
            .await?
            .remove(&index)
            .ok_or(WalletError::AccountNotFound(index))
    }

    /// Active network; falls back to the configured default before the
    /// wallet has persisted one.
    pub async fn network(&self) -> Result<NetworkConfig, WalletError> {
        match load(self.storage(), keys::NETWORK).await? {
            Some(network) => Ok(network),
            None => {
                let id = self.config.network;
                let provider = self.provider().await?;
                Ok(NetworkConfig {
                    id,
                    node: self.config.node_url(provider, id).to_string(),
                })
            }
        }
    }

    pub async fn provider(&self) -> Result<ProviderId, WalletError> {
        Ok(load(self.storage(), keys::PROVIDER)
            .await?
            .unwrap_or(self.config.provider))
    }

    /// Provider client for the persisted provider id and network node.
    pub async fn data_provider(&self) -> Result<Provider, WalletError> {
        let id = self.provider().await?;
        let network = self.network().await?;
        let endpoint = self.config.endpoint(id, network.id, &network.node);
        Ok(Provider::new(id, endpoint)?)
    }
}
