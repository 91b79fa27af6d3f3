//! Storage migration scripts and their registry.

use std::collections::BTreeMap;

use async_trait::async_trait;
use kura_store::{keys, load, save, Storage};
use kura_types::Account;
use serde_json::{Map, Value};

use super::version::Version;
use crate::derivation::AccountKeys;
use crate::vault;
use crate::WalletError;

/// What a script gets to work with. Scripts run while the wallet write lock
/// is held and must go through `storage` directly.
pub struct MigrationContext<'a> {
    pub storage: &'a dyn Storage,
    pub password: Option<&'a str>,
}

#[async_trait]
pub trait MigrationScript: Send + Sync {
    fn version(&self) -> Version;

    fn info(&self) -> &str;

    fn password_required(&self) -> bool {
        false
    }

    async fn up(&self, ctx: &MigrationContext<'_>) -> Result<(), WalletError>;

    async fn down(&self, ctx: &MigrationContext<'_>) -> Result<(), WalletError>;
}

/// Immutable set of scripts, ordered by version.
pub struct Registry {
    scripts: Vec<Box<dyn MigrationScript>>,
}

impl Registry {
    pub fn new(mut scripts: Vec<Box<dyn MigrationScript>>) -> Self {
        scripts.sort_by_key(|s| s.version());
        Self { scripts }
    }

    pub fn builtin() -> Self {
        Self::new(vec![
            Box::new(Baseline),
            Box::new(RecentRecipients),
            Box::new(KeyHashRepair),
        ])
    }

    /// Script versions, ascending.
    pub fn versions(&self) -> Vec<Version> {
        self.scripts.iter().map(|s| s.version()).collect()
    }

    pub fn get(&self, version: &Version) -> Option<&dyn MigrationScript> {
        self.scripts
            .iter()
            .find(|s| &s.version() == version)
            .map(|s| s.as_ref())
    }

    pub fn len(&self) -> usize {
        self.scripts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scripts.is_empty()
    }
}

struct Baseline;

#[async_trait]
impl MigrationScript for Baseline {
    fn version(&self) -> Version {
        Version::new(&[1, 0, 0])
    }

    fn info(&self) -> &str {
        "Baseline storage layout"
    }

    async fn up(&self, _ctx: &MigrationContext<'_>) -> Result<(), WalletError> {
        Ok(())
    }

    async fn down(&self, _ctx: &MigrationContext<'_>) -> Result<(), WalletError> {
        Ok(())
    }
}

const RECENT_RECIPIENTS: &str = "recentSendToAddresses";
const NETWORKS: [&str; 2] = ["mainnet", "testnet"];

/// Adds an empty recent-recipient list to every account on both networks.
struct RecentRecipients;

impl RecentRecipients {
    async fn rewrite(
        storage: &dyn Storage,
        f: impl Fn(&mut Map<String, Value>),
    ) -> Result<(), WalletError> {
        let Some(mut accounts) = storage.get(keys::ACCOUNTS).await? else {
            return Ok(());
        };
        let Some(by_index) = accounts.as_object_mut() else {
            return Err(WalletError::InternalError("accounts record is not an object".into()));
        };
        for account in by_index.values_mut() {
            for network in NETWORKS {
                if let Some(state) = account.get_mut(network).and_then(Value::as_object_mut) {
                    f(state);
                }
            }
        }
        Ok(save(storage, keys::ACCOUNTS, &accounts).await?)
    }
}

#[async_trait]
impl MigrationScript for RecentRecipients {
    fn version(&self) -> Version {
        Version::new(&[1, 1, 0])
    }

    fn info(&self) -> &str {
        "Track recently used recipient addresses per network"
    }

    async fn up(&self, ctx: &MigrationContext<'_>) -> Result<(), WalletError> {
        Self::rewrite(ctx.storage, |state| {
            state
                .entry(RECENT_RECIPIENTS)
                .or_insert_with(|| Value::Array(Vec::new()));
        })
        .await
    }

    async fn down(&self, ctx: &MigrationContext<'_>) -> Result<(), WalletError> {
        Self::rewrite(ctx.storage, |state| {
            state.remove(RECENT_RECIPIENTS);
        })
        .await
    }
}

/// Re-derives both key hashes of every account from the root key.
struct KeyHashRepair;

#[async_trait]
impl MigrationScript for KeyHashRepair {
    fn version(&self) -> Version {
        Version::new(&[1, 2, 0])
    }

    fn info(&self) -> &str {
        "Re-derive account key hashes from the root key"
    }

    fn password_required(&self) -> bool {
        true
    }

    async fn up(&self, ctx: &MigrationContext<'_>) -> Result<(), WalletError> {
        let Some(blob) = load::<String>(ctx.storage, keys::ENCRYPTED_KEY).await? else {
            return Ok(());
        };
        let Some(mut accounts) = load::<BTreeMap<u32, Account>>(ctx.storage, keys::ACCOUNTS).await?
        else {
            return Ok(());
        };
        let password = ctx.password.ok_or_else(|| WalletError::PasswordRequired {
            version: self.version().to_string(),
        })?;

        let root = vault::decrypt_root_key(password, &blob)?;
        let mut repaired = 0usize;
        for (index, account) in accounts.iter_mut() {
            let derived = AccountKeys::derive(&root, *index);
            let payment = derived.payment.key_hash();
            let stake = derived.stake.key_hash();
            if account.payment_key_hash != payment || account.stake_key_hash != stake {
                account.payment_key_hash = payment;
                account.stake_key_hash = stake;
                repaired += 1;
            }
        }
        drop(root);

        if repaired > 0 {
            save(ctx.storage, keys::ACCOUNTS, &accounts).await?;
            tracing::warn!(repaired, "repaired account key hashes");
        }
        Ok(())
    }

    async fn down(&self, _ctx: &MigrationContext<'_>) -> Result<(), WalletError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kura_store::MemoryStorage;
    use serde_json::json;

    #[test]
    fn builtin_registry_is_ordered() {
        let registry = Registry::builtin();
        assert_eq!(registry.len(), 3);
        let versions: Vec<String> = registry.versions().iter().map(ToString::to_string).collect();
        assert_eq!(versions, vec!["1.0.0", "1.1.0", "1.2.0"]);
        assert!(registry
            .get(&Version::new(&[1, 2, 0]))
            .is_some_and(|s| s.password_required()));
        assert!(registry.get(&Version::new(&[9])).is_none());
    }

    #[tokio::test]
    async fn recent_recipients_backfill_and_removal() {
        let storage = MemoryStorage::new();
        let mut entries = Map::new();
        entries.insert(
            keys::ACCOUNTS.into(),
            json!({
                "0": { "mainnet": {"lovelace": "0"}, "testnet": {"recentSendToAddresses": ["addr_test1x"]} }
            }),
        );
        storage.set(entries).await.unwrap();
        let ctx = MigrationContext {
            storage: &storage,
            password: None,
        };

        RecentRecipients.up(&ctx).await.unwrap();
        let accounts = storage.get(keys::ACCOUNTS).await.unwrap().unwrap();
        assert_eq!(accounts["0"]["mainnet"][RECENT_RECIPIENTS], json!([]));
        assert_eq!(accounts["0"]["testnet"][RECENT_RECIPIENTS], json!(["addr_test1x"]));

        RecentRecipients.down(&ctx).await.unwrap();
        let accounts = storage.get(keys::ACCOUNTS).await.unwrap().unwrap();
        assert!(accounts["0"]["mainnet"].get(RECENT_RECIPIENTS).is_none());
        assert!(accounts["0"]["testnet"].get(RECENT_RECIPIENTS).is_none());
    }

    #[tokio::test]
    async fn scripts_are_noops_on_empty_storage() {
        let storage = MemoryStorage::new();
        let ctx = MigrationContext {
            storage: &storage,
            password: None,
        };
        RecentRecipients.up(&ctx).await.unwrap();
        KeyHashRepair.up(&ctx).await.unwrap();
        assert!(storage.is_empty());
    }
}
