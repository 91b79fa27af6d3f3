//! Nullable data provider: scripted responses plus call counters.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;
use kura_provider::{DataProvider, Delegation, ProviderError, TxRef, Utxo};
use kura_types::AssetAmount;
use serde_json::{json, Value};

#[derive(Clone, Debug, Default)]
pub struct ScriptedTx {
    pub info: Option<Value>,
    pub block: Option<Value>,
    pub utxos: Option<Value>,
    pub metadata: Option<Value>,
}

#[derive(Default)]
struct Script {
    transactions: Vec<TxRef>,
    balance: Vec<AssetAmount>,
    balance_failures: VecDeque<ProviderError>,
    stake_balance: u64,
    addresses: Vec<String>,
    addresses_failure: Option<ProviderError>,
    assets: HashMap<String, Value>,
    utxos: Vec<Utxo>,
    details: HashMap<String, ScriptedTx>,
    delegation: Option<Delegation>,
    submit: Option<Result<String, ProviderError>>,
}

/// A data provider that answers from an in-memory script.
#[derive(Default)]
pub struct NullProvider {
    script: Mutex<Script>,
    calls: Mutex<HashMap<&'static str, usize>>,
}

impl NullProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Transactions returned (newest first) for any address.
    pub fn set_transactions(&self, hashes: &[&str]) {
        self.script.lock().unwrap().transactions = hashes
            .iter()
            .enumerate()
            .map(|(i, hash)| TxRef {
                tx_hash: hash.to_string(),
                tx_index: 0,
                block_height: (hashes.len() - i) as u64,
            })
            .collect();
    }

    pub fn set_balance(&self, balance: Vec<AssetAmount>) {
        self.script.lock().unwrap().balance = balance;
    }

    /// The next `times` balance calls fail with `error`.
    pub fn fail_balance(&self, times: usize, error: ProviderError) {
        let mut script = self.script.lock().unwrap();
        script.balance_failures.extend(std::iter::repeat(error).take(times));
    }

    pub fn set_stake_balance(&self, lovelace: u64) {
        self.script.lock().unwrap().stake_balance = lovelace;
    }

    pub fn set_addresses(&self, addresses: &[&str]) {
        self.script.lock().unwrap().addresses =
            addresses.iter().map(|a| a.to_string()).collect();
    }

    /// Every `get_addresses` call fails with `error`.
    pub fn fail_addresses(&self, error: ProviderError) {
        self.script.lock().unwrap().addresses_failure = Some(error);
    }

    /// Metadata returned for `unit`; unknown units soft-fail to `None`.
    pub fn set_asset(&self, unit: &str, metadata: Value) {
        self.script
            .lock()
            .unwrap()
            .assets
            .insert(unit.to_string(), metadata);
    }

    pub fn set_utxos(&self, utxos: Vec<Utxo>) {
        self.script.lock().unwrap().utxos = utxos;
    }

    pub fn set_transaction_detail(&self, hash: &str, detail: ScriptedTx) {
        self.script
            .lock()
            .unwrap()
            .details
            .insert(hash.to_string(), detail);
    }

    pub fn set_delegation(&self, delegation: Option<Delegation>) {
        self.script.lock().unwrap().delegation = delegation;
    }

    pub fn set_submit_result(&self, result: Result<String, ProviderError>) {
        self.script.lock().unwrap().submit = Some(result);
    }

    /// How many times the named trait method was called.
    pub fn calls(&self, method: &str) -> usize {
        self.calls.lock().unwrap().get(method).copied().unwrap_or(0)
    }

    fn record(&self, method: &'static str) {
        *self.calls.lock().unwrap().entry(method).or_default() += 1;
    }

    fn detail(&self, hash: &str) -> ScriptedTx {
        self.script
            .lock()
            .unwrap()
            .details
            .get(hash)
            .cloned()
            .unwrap_or_default()
    }
}

#[async_trait]
impl DataProvider for NullProvider {
    async fn get_address_balance(&self, _address: &str) -> Result<Vec<AssetAmount>, ProviderError> {
        self.record("get_address_balance");
        let mut script = self.script.lock().unwrap();
        match script.balance_failures.pop_front() {
            Some(error) => Err(error),
            None => Ok(script.balance.clone()),
        }
    }

    async fn get_stake_balance(&self, _stake_address: &str) -> u64 {
        self.record("get_stake_balance");
        self.script.lock().unwrap().stake_balance
    }

    async fn get_address_utxos(
        &self,
        _address: &str,
        page: u32,
        limit: u32,
    ) -> Result<Vec<Utxo>, ProviderError> {
        self.record("get_address_utxos");
        let script = self.script.lock().unwrap();
        let start = (page.saturating_sub(1) as usize) * limit as usize;
        Ok(script.utxos.iter().skip(start).take(limit as usize).cloned().collect())
    }

    async fn get_address_transactions(&self, _address: &str, count: u32, page: u32) -> Vec<TxRef> {
        self.record("get_address_transactions");
        let script = self.script.lock().unwrap();
        let start = (page.saturating_sub(1) as usize) * count as usize;
        script.transactions.iter().skip(start).take(count as usize).cloned().collect()
    }

    async fn get_transaction(&self, tx_hash: &str) -> Option<Value> {
        self.record("get_transaction");
        self.detail(tx_hash).info
    }

    async fn get_transaction_utxos(&self, tx_hash: &str) -> Option<Value> {
        self.record("get_transaction_utxos");
        self.detail(tx_hash).utxos
    }

    async fn get_transaction_metadata(&self, tx_hash: &str) -> Option<Value> {
        self.record("get_transaction_metadata");
        self.detail(tx_hash).metadata
    }

    async fn get_block(&self, hash_or_number: &str) -> Option<Value> {
        self.record("get_block");
        let script = self.script.lock().unwrap();
        script
            .details
            .values()
            .filter_map(|d| d.block.as_ref())
            .find(|block| {
                block.get("height").map(|h| h.to_string()).as_deref() == Some(hash_or_number)
                    || block.get("hash").and_then(Value::as_str) == Some(hash_or_number)
            })
            .cloned()
    }

    async fn submit_tx(&self, _tx_hex: &str) -> Result<String, ProviderError> {
        self.record("submit_tx");
        self.script
            .lock()
            .unwrap()
            .submit
            .clone()
            .unwrap_or_else(|| Ok("00".repeat(32)))
    }

    async fn get_pool_delegation(&self, _stake_address: &str) -> Option<Delegation> {
        self.record("get_pool_delegation");
        self.script.lock().unwrap().delegation.clone()
    }

    async fn get_addresses(&self, _stake_address: &str, limit: u32) -> Result<Vec<String>, ProviderError> {
        self.record("get_addresses");
        let script = self.script.lock().unwrap();
        if let Some(error) = &script.addresses_failure {
            return Err(error.clone());
        }
        Ok(script.addresses.iter().take(limit as usize).cloned().collect())
    }

    async fn get_asset(&self, unit: &str) -> Option<Value> {
        self.record("get_asset");
        self.script.lock().unwrap().assets.get(unit).cloned()
    }

    async fn get_latest_block(&self) -> Result<Value, ProviderError> {
        self.record("get_latest_block");
        Ok(json!({ "height": 1 }))
    }

    async fn get_epoch_parameters(&self, epoch: u64) -> Result<Value, ProviderError> {
        self.record("get_epoch_parameters");
        Ok(json!({ "epoch": epoch }))
    }
}
