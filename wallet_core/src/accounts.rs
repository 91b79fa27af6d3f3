//! Persisted account collection and its per-network projection.
//!
//! Account indices are assigned as `count(accounts)` on creation and only the
//! highest index can be deleted, so indices stay contiguous from zero.

use std::collections::{BTreeMap, HashMap};

use kura_crypto::decode_value_hex;
use kura_provider::{DataProvider, Delegation, TxRef, Utxo};
use kura_store::keys;
use kura_types::{Account, AssetAmount, KeyHash, NetworkId, NetworkState, TxDetail};
use serde::Serialize;
use serde_json::{Map, Value};
use tokio_util::sync::CancellationToken;

use crate::derivation::{base_address, request_account_key, reward_address, AccountKeys};
use crate::state::WalletState;
use crate::WalletError;

/// Number of transactions fetched when refreshing an account.
const REFRESH_TX_COUNT: u32 = 10;

/// An account as seen on the active network.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountView {
    pub index: u32,
    pub name: String,
    pub avatar: String,
    pub payment_key_hash: KeyHash,
    pub stake_key_hash: KeyHash,
    pub network: NetworkId,
    /// Bech32 base address.
    pub payment_addr: String,
    /// Bech32 reward address.
    pub reward_addr: String,
    #[serde(flatten)]
    pub state: NetworkState,
}

impl AccountView {
    pub fn project(account: &Account, network: NetworkId) -> Result<Self, WalletError> {
        Ok(Self {
            index: account.index,
            name: account.name.clone(),
            avatar: account.avatar_seed.clone(),
            payment_key_hash: account.payment_key_hash,
            stake_key_hash: account.stake_key_hash,
            network,
            payment_addr: base_address(account, network).to_bech32()?,
            reward_addr: reward_address(account, network).to_bech32()?,
            state: account.network(network).clone(),
        })
    }
}

/// Result of comparing the stake-controlled balance with the stored one.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BalanceWarning {
    pub active: bool,
    pub full_balance: u64,
}

/// Add the account for `derived` at index `count(accounts)` and stage the
/// `accounts` and `currentAccount` entries. Does not take the write lock.
pub(crate) fn insert_account(
    entries: &mut Map<String, Value>,
    accounts: &mut BTreeMap<u32, Account>,
    name: &str,
    derived: &AccountKeys,
) -> Result<u32, WalletError> {
    let index = accounts.len() as u32;
    if accounts.contains_key(&index) {
        return Err(WalletError::InternalError(format!(
            "account index {index} already in use"
        )));
    }
    let account = Account::new(
        index,
        name,
        derived.payment.key_hash(),
        derived.stake.key_hash(),
        avatar_seed()?,
    );
    accounts.insert(index, account);
    entries.insert(keys::ACCOUNTS.into(), to_value(accounts)?);
    entries.insert(keys::CURRENT_ACCOUNT.into(), Value::from(index));
    Ok(index)
}

/// Zero-based page request for [`WalletState::utxos`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Paginate {
    pub page: u32,
    /// Zero means the default of 100.
    pub limit: u32,
}

impl Paginate {
    pub const DEFAULT_LIMIT: u32 = 100;

    /// Providers count pages from one.
    fn provider_page(&self) -> u32 {
        self.page.saturating_add(1)
    }

    fn limit(&self) -> u32 {
        if self.limit == 0 {
            Self::DEFAULT_LIMIT
        } else {
            self.limit
        }
    }
}

fn avatar_seed() -> Result<String, WalletError> {
    let mut bytes = [0u8; 8];
    getrandom::getrandom(&mut bytes).map_err(|e| WalletError::InternalError(e.to_string()))?;
    Ok(u64::from_le_bytes(bytes).to_string())
}

impl WalletState {
    /// Derive account `count(accounts)`, persist its key hashes and make it
    /// the current account. Returns the new index.
    pub async fn create_account(&self, name: &str, password: &str) -> Result<u32, WalletError> {
        let _guard = self.write_lock().await;
        let mut accounts = self.load_accounts().await?;
        let derived = request_account_key(self, password, accounts.len() as u32).await?;
        let mut entries = Map::new();
        let index = insert_account(&mut entries, &mut accounts, name, &derived)?;
        self.storage().set(entries).await?;

        tracing::info!(index, "account created");
        Ok(index)
    }

    /// Remove the account with the highest index.
    pub async fn delete_account(&self) -> Result<u32, WalletError> {
        let _guard = self.write_lock().await;
        let mut accounts = self.load_accounts().await?;
        if accounts.len() <= 1 {
            return Err(WalletError::OnlyOneAccount);
        }
        let Some((index, _)) = accounts.pop_last() else {
            return Err(WalletError::OnlyOneAccount);
        };

        let mut entries = Map::new();
        entries.insert(keys::ACCOUNTS.into(), to_value(&accounts)?);
        if self.current_account_index().await? == index {
            let tail = accounts.keys().next_back().copied().unwrap_or_default();
            entries.insert(keys::CURRENT_ACCOUNT.into(), Value::from(tail));
        }
        self.storage().set(entries).await?;

        tracing::info!(index, "account deleted");
        Ok(index)
    }

    pub async fn switch_account(&self, index: u32) -> Result<(), WalletError> {
        let _guard = self.write_lock().await;
        if !self.load_accounts().await?.contains_key(&index) {
            return Err(WalletError::AccountNotFound(index));
        }
        kura_store::save(self.storage(), keys::CURRENT_ACCOUNT, &index).await?;
        tracing::debug!(index, "switched account");
        Ok(())
    }

    /// The current account projected onto the active network.
    pub async fn account(&self) -> Result<AccountView, WalletError> {
        let network = self.network().await?.id;
        AccountView::project(&self.current_account_record().await?, network)
    }

    /// Every account projected onto the active network, by index.
    pub async fn accounts(&self) -> Result<Vec<AccountView>, WalletError> {
        let network = self.network().await?.id;
        self.load_accounts()
            .await?
            .values()
            .map(|account| AccountView::project(account, network))
            .collect()
    }

    /// Refresh history and balance of the current account.
    ///
    /// Returns `false` without touching the balance when the newest fetched
    /// transaction is already known. The balance is polled with the
    /// configured retry policy; nothing is persisted if it is exhausted or
    /// cancelled. Provider calls run outside the write lock; the result is
    /// merged into a fresh read of the account afterwards.
    pub async fn update_account(
        &self,
        provider: &dyn DataProvider,
        cancel: &CancellationToken,
    ) -> Result<bool, WalletError> {
        let account = self.current_account_record().await?;
        let index = account.index;
        let network = self.network().await?.id;
        let payment_addr = base_address(&account, network).to_bech32()?;

        let fetched = provider
            .get_address_transactions(&payment_addr, REFRESH_TX_COUNT, 1)
            .await;
        let Some(newest) = fetched.first() else {
            return Ok(false);
        };
        if account.network(network).history.confirmed.contains(&newest.tx_hash) {
            tracing::debug!(index, %network, "account history up to date");
            return Ok(false);
        }

        let amounts = self
            .config()
            .balance_retry
            .run(cancel, || provider.get_address_balance(&payment_addr))
            .await?;

        let _guard = self.write_lock().await;
        let mut accounts = self.load_accounts().await?;
        let state = accounts
            .get_mut(&index)
            .ok_or(WalletError::AccountNotFound(index))?
            .network_mut(network);
        merge_confirmed(&mut state.history.confirmed, &fetched);
        apply_balance(state, amounts);
        self.save_accounts(&accounts).await?;

        tracing::info!(index, %network, "account refreshed");
        Ok(true)
    }

    /// Total value at the current payment address.
    pub async fn balance(&self, provider: &dyn DataProvider) -> Result<Vec<AssetAmount>, WalletError> {
        let account = self.account().await?;
        Ok(provider.get_address_balance(&account.payment_addr).await?)
    }

    pub async fn transactions(
        &self,
        provider: &dyn DataProvider,
        page: u32,
        count: u32,
    ) -> Result<Vec<TxRef>, WalletError> {
        let account = self.account().await?;
        Ok(provider
            .get_address_transactions(&account.payment_addr, count, page)
            .await)
    }

    /// UTxOs of the current payment address.
    ///
    /// `amount` is a hex CBOR value; when given, outputs worth strictly less
    /// than it are dropped. Malformed amounts are `InvalidRequest`.
    pub async fn utxos(
        &self,
        provider: &dyn DataProvider,
        amount: Option<&str>,
        paginate: Option<Paginate>,
    ) -> Result<Vec<Utxo>, WalletError> {
        let target = amount.map(decode_value_hex).transpose().map_err(|e| {
            WalletError::InvalidRequest(format!("malformed amount: {e}"))
        })?;
        let paginate = paginate.unwrap_or_default();
        let account = self.account().await?;
        let utxos = provider
            .get_address_utxos(&account.payment_addr, paginate.provider_page(), paginate.limit())
            .await?;
        Ok(match target {
            Some(target) => utxos
                .into_iter()
                .filter(|utxo| !is_less_than(&utxo.amount, &target))
                .collect(),
            None => utxos,
        })
    }

    pub async fn delegation(
        &self,
        provider: &dyn DataProvider,
    ) -> Result<Option<Delegation>, WalletError> {
        let account = self.account().await?;
        Ok(provider.get_pool_delegation(&account.reward_addr).await)
    }

    /// Raw reward address bytes of the current account, hex encoded.
    pub async fn reward_address_hex(&self) -> Result<String, WalletError> {
        let network = self.network().await?.id;
        let account = self.current_account_record().await?;
        Ok(hex::encode(reward_address(&account, network).to_bytes()))
    }

    /// Flags a mismatch between the stake-controlled balance and the stored
    /// lovelace when the stake key controls more than one address.
    pub async fn balance_warning(
        &self,
        provider: &dyn DataProvider,
    ) -> Result<BalanceWarning, WalletError> {
        let account = self.account().await?;
        let addresses = match provider.get_addresses(&account.reward_addr, 2).await {
            Ok(addresses) => addresses,
            Err(e) => {
                tracing::debug!(error = %e, "stake address lookup failed");
                return Ok(BalanceWarning::default());
            }
        };
        if addresses.len() <= 1 {
            return Ok(BalanceWarning::default());
        }
        let full_balance = provider.get_stake_balance(&account.reward_addr).await;
        Ok(BalanceWarning {
            active: full_balance != account.state.lovelace,
            full_balance,
        })
    }

    /// Cached detail when complete, otherwise fetched from the provider.
    pub async fn tx_detail(
        &self,
        provider: &dyn DataProvider,
        tx_hash: &str,
    ) -> Result<TxDetail, WalletError> {
        let account = self.account().await?;
        if let Some(detail) = account.state.history.details.get(tx_hash) {
            if detail.is_complete() {
                return Ok(detail.clone());
            }
        }

        let (info, utxos, metadata) = tokio::join!(
            provider.get_transaction(tx_hash),
            provider.get_transaction_utxos(tx_hash),
            provider.get_transaction_metadata(tx_hash),
        );
        let block = match info.as_ref().and_then(|i| i.get("block_height")) {
            Some(height) => provider.get_block(&block_ref(height)).await,
            None => None,
        };
        Ok(TxDetail {
            info,
            block,
            utxos,
            metadata,
        })
    }

    /// Cache transaction details on the current account.
    pub async fn set_tx_details(
        &self,
        details: HashMap<String, TxDetail>,
    ) -> Result<(), WalletError> {
        self.modify_current(|state| state.history.details.extend(details))
            .await
    }

    /// Replace the confirmed history of the current account.
    pub async fn set_transactions(&self, hashes: Vec<String>) -> Result<(), WalletError> {
        self.modify_current(|state| state.history.confirmed = hashes)
            .await
    }

    /// Remember `address` as the only recent recipient.
    pub async fn update_recent_send_to_address(&self, address: &str) -> Result<(), WalletError> {
        self.modify_current(|state| state.recent_send_to_addresses = vec![address.to_string()])
            .await
    }

    pub async fn submit_tx(
        &self,
        provider: &dyn DataProvider,
        tx_hex: &str,
    ) -> Result<String, WalletError> {
        let tx_hash = provider.submit_tx(tx_hex).await?;
        tracing::info!(%tx_hash, "transaction submitted");
        Ok(tx_hash)
    }

    async fn modify_current<F>(&self, f: F) -> Result<(), WalletError>
    where
        F: FnOnce(&mut NetworkState),
    {
        let _guard = self.write_lock().await;
        let index = self.current_account_index().await?;
        let network = self.network().await?.id;
        let mut accounts = self.load_accounts().await?;
        let account = accounts
            .get_mut(&index)
            .ok_or(WalletError::AccountNotFound(index))?;
        f(account.network_mut(network));
        self.save_accounts(&accounts).await
    }
}

/// Fetched hashes first, then the known ones, without duplicates.
fn merge_confirmed(confirmed: &mut Vec<String>, fetched: &[TxRef]) {
    let mut merged: Vec<String> = Vec::with_capacity(fetched.len() + confirmed.len());
    for hash in fetched
        .iter()
        .map(|tx| &tx.tx_hash)
        .chain(confirmed.iter())
    {
        if !merged.contains(hash) {
            merged.push(hash.clone());
        }
    }
    *confirmed = merged;
}

fn apply_balance(state: &mut NetworkState, amounts: Vec<AssetAmount>) {
    let (lovelace, assets): (Vec<_>, Vec<_>) =
        amounts.into_iter().partition(AssetAmount::is_lovelace);
    state.lovelace = lovelace.first().map(|a| a.quantity).unwrap_or(0);
    state.assets = assets;
}

fn totals(amounts: &[AssetAmount]) -> BTreeMap<&str, u64> {
    let mut totals = BTreeMap::new();
    for amount in amounts.iter().filter(|a| a.quantity > 0) {
        *totals.entry(amount.unit.as_str()).or_default() += amount.quantity;
    }
    totals
}

/// Multi-asset partial order: `a < b` when every unit of `a` is covered by
/// `b` and the two differ. Incomparable values are not less.
fn is_less_than(a: &[AssetAmount], b: &[AssetAmount]) -> bool {
    let (a, b) = (totals(a), totals(b));
    a != b
        && a
            .iter()
            .all(|(unit, qty)| b.get(unit).is_some_and(|have| qty <= have))
}

fn block_ref(height: &Value) -> String {
    match height {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn to_value(accounts: &BTreeMap<u32, Account>) -> Result<Value, WalletError> {
    serde_json::to_value(accounts)
        .map_err(|e| WalletError::Store(kura_store::StoreError::Serialization(e.to_string())))
}
