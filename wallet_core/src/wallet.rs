//! Wallet lifecycle: creation from a mnemonic and full reset.

use std::collections::BTreeMap;

use kura_crypto::{mnemonic_to_entropy, validate_mnemonic, XPrv};
use kura_store::keys;
use kura_types::NetworkConfig;
use serde_json::{Map, Value};
use zeroize::Zeroizing;

use crate::accounts::insert_account;
use crate::derivation::{request_account_key, AccountKeys};
use crate::state::WalletState;
use crate::vault;
use crate::WalletError;

/// A fresh 24-word English mnemonic.
pub fn generate_mnemonic() -> Result<Zeroizing<String>, WalletError> {
    Ok(kura_crypto::generate_mnemonic()?)
}

/// Create the wallet from `mnemonic` and derive account 0 as `name`.
///
/// Fails with [`WalletError::StoreNotEmpty`] before touching the mnemonic
/// when a root key is already stored. The root key, settings and first
/// account are persisted in a single write.
pub async fn create_wallet(
    state: &WalletState,
    name: &str,
    mnemonic: &str,
    password: &str,
) -> Result<u32, WalletError> {
    let _guard = state.write_lock().await;
    if state.is_initialized().await? {
        return Err(WalletError::StoreNotEmpty);
    }
    if !validate_mnemonic(mnemonic) {
        return Err(WalletError::InvalidMnemonic);
    }

    let (blob, derived) = {
        let entropy = mnemonic_to_entropy(mnemonic)?;
        let root = XPrv::from_bip39_entropy(&entropy, b"");
        (
            vault::encrypt_root_key(password, &root)?,
            AccountKeys::derive(&root, 0),
        )
    };

    let config = state.config();
    let network = NetworkConfig {
        id: config.network,
        node: config.node_url(config.provider, config.network).to_string(),
    };
    let mut entries = Map::new();
    entries.insert(keys::ENCRYPTED_KEY.into(), Value::String(blob));
    entries.insert(keys::PROVIDER.into(), to_value(&config.provider)?);
    entries.insert(keys::NETWORK.into(), to_value(&network)?);
    entries.insert(
        keys::CURRENCY.into(),
        Value::String(config.default_currency.clone()),
    );
    let mut accounts = BTreeMap::new();
    let index = insert_account(&mut entries, &mut accounts, name, &derived)?;
    state.storage().set(entries).await?;

    tracing::info!(network = %network.id, provider = %config.provider, "wallet created");
    Ok(index)
}

/// Verify `password` and wipe every persisted entry.
pub async fn reset_storage(state: &WalletState, password: &str) -> Result<(), WalletError> {
    let _guard = state.write_lock().await;
    drop(request_account_key(state, password, 0).await?);
    state.storage().clear().await?;
    tracing::warn!("wallet storage reset");
    Ok(())
}

fn to_value<T: serde::Serialize>(value: &T) -> Result<Value, WalletError> {
    serde_json::to_value(value)
        .map_err(|e| WalletError::Store(kura_store::StoreError::Serialization(e.to_string())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::WalletConfig;
    use kura_store::MemoryStorage;
    use kura_types::{NetworkId, ProviderId};
    use std::sync::Arc;

    const MNEMONIC: &str = "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about";

    fn state() -> WalletState {
        WalletState::new(Arc::new(MemoryStorage::new()), WalletConfig::default())
    }

    #[tokio::test]
    async fn create_wallet_persists_defaults_and_first_account() {
        let state = state();
        assert_eq!(create_wallet(&state, "main", MNEMONIC, "pw").await.unwrap(), 0);

        assert!(state.is_initialized().await.unwrap());
        assert_eq!(state.provider().await.unwrap(), ProviderId::Blockfrost);
        assert_eq!(state.network().await.unwrap().id, NetworkId::Mainnet);
        assert_eq!(state.currency().await.unwrap(), "usd");
        assert_eq!(state.current_account_index().await.unwrap(), 0);
        assert_eq!(state.account().await.unwrap().name, "main");
    }

    #[tokio::test]
    async fn second_create_is_rejected() {
        let state = state();
        create_wallet(&state, "main", MNEMONIC, "pw").await.unwrap();
        let blob = state.encrypted_key().await.unwrap();

        assert!(matches!(
            create_wallet(&state, "again", MNEMONIC, "other").await,
            Err(WalletError::StoreNotEmpty)
        ));
        assert_eq!(state.encrypted_key().await.unwrap(), blob);
    }

    #[tokio::test]
    async fn invalid_mnemonic_leaves_store_empty() {
        let state = state();
        assert!(matches!(
            create_wallet(&state, "main", "abandon abandon", "pw").await,
            Err(WalletError::InvalidMnemonic)
        ));
        assert!(!state.is_initialized().await.unwrap());
    }

    #[tokio::test]
    async fn reset_requires_the_password() {
        let state = state();
        create_wallet(&state, "main", MNEMONIC, "pw").await.unwrap();

        assert!(matches!(
            reset_storage(&state, "bad").await,
            Err(WalletError::WrongPassword)
        ));
        assert!(state.is_initialized().await.unwrap());

        reset_storage(&state, "pw").await.unwrap();
        assert!(!state.is_initialized().await.unwrap());
    }

    #[test]
    fn generated_mnemonics_are_valid() {
        let phrase = generate_mnemonic().unwrap();
        assert_eq!(phrase.split_whitespace().count(), 24);
        assert!(validate_mnemonic(&phrase));
    }
}
