//! Blockfrost REST API client.

use async_trait::async_trait;
use kura_types::amount::quantity;
use kura_types::AssetAmount;
use serde::Deserialize;
use serde_json::Value;

use crate::error::{optional, strict_or, submit_failure, ProviderError};
use crate::http::{Endpoint, HttpClient};
use crate::types::{Delegation, TxRef, Utxo};
use crate::DataProvider;

#[derive(Deserialize)]
struct RawTxRef {
    tx_hash: String,
    #[serde(default)]
    tx_index: u64,
    #[serde(default)]
    block_height: u64,
}

#[derive(Deserialize)]
struct RawAddress {
    #[serde(default)]
    amount: Vec<AssetAmount>,
}

#[derive(Deserialize)]
struct RawUtxo {
    tx_hash: String,
    output_index: u32,
    amount: Vec<AssetAmount>,
}

#[derive(Deserialize)]
struct RawAccount {
    #[serde(default)]
    active: bool,
    #[serde(default)]
    pool_id: Option<String>,
    #[serde(default, with = "quantity")]
    controlled_amount: u64,
    #[serde(default, with = "quantity")]
    withdrawable_amount: u64,
}

#[derive(Deserialize)]
pub(crate) struct RawPoolMetadata {
    #[serde(default)]
    pub homepage: Option<String>,
    #[serde(default)]
    pub ticker: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

pub(crate) fn parse_tx_refs(value: Value) -> Vec<TxRef> {
    serde_json::from_value::<Vec<RawTxRef>>(value)
        .map(|refs| {
            refs.into_iter()
                .map(|r| TxRef {
                    tx_hash: r.tx_hash,
                    tx_index: r.tx_index,
                    block_height: r.block_height,
                })
                .collect()
        })
        .unwrap_or_default()
}

pub(crate) fn parse_balance(value: Value) -> Result<Vec<AssetAmount>, ProviderError> {
    let raw: RawAddress =
        serde_json::from_value(value).map_err(|e| ProviderError::decode("address", e))?;
    Ok(raw.amount)
}

pub(crate) fn parse_utxo_page(value: Value, address: &str) -> Result<Vec<Utxo>, ProviderError> {
    let raw: Vec<RawUtxo> =
        serde_json::from_value(value).map_err(|e| ProviderError::decode("utxos", e))?;
    Ok(raw
        .into_iter()
        .map(|u| Utxo {
            tx_hash: u.tx_hash,
            output_index: u.output_index,
            address: address.to_string(),
            amount: u.amount,
        })
        .collect())
}

pub(crate) fn parse_stake_balance(value: Value) -> u64 {
    serde_json::from_value::<RawAccount>(value)
        .map(|a| a.controlled_amount.saturating_sub(a.withdrawable_amount))
        .unwrap_or(0)
}

pub(crate) fn parse_addresses(value: Value) -> Result<Vec<String>, ProviderError> {
    #[derive(Deserialize)]
    struct Entry {
        address: String,
    }
    let entries: Vec<Entry> =
        serde_json::from_value(value).map_err(|e| ProviderError::decode("addresses", e))?;
    Ok(entries.into_iter().map(|e| e.address).collect())
}

pub struct Blockfrost {
    client: HttpClient,
}

impl Blockfrost {
    pub fn new(endpoint: Endpoint) -> Result<Self, ProviderError> {
        Ok(Self {
            client: HttpClient::new(endpoint)?,
        })
    }

    pub fn endpoint(&self) -> &Endpoint {
        self.client.endpoint()
    }

    async fn optional_json(&self, what: &str, path: &str) -> Option<Value> {
        optional(what, self.client.get_json(path).await).filter(|v| !v.is_null())
    }
}

#[async_trait]
impl DataProvider for Blockfrost {
    async fn get_address_balance(&self, address: &str) -> Result<Vec<AssetAmount>, ProviderError> {
        let result = self.client.get_json(&format!("/addresses/{address}")).await;
        match strict_or(result.map(Some), || None)? {
            Some(value) => parse_balance(value),
            None => Ok(vec![AssetAmount::lovelace(0)]),
        }
    }

    async fn get_stake_balance(&self, stake_address: &str) -> u64 {
        optional(
            "stake balance",
            self.client.get_json(&format!("/accounts/{stake_address}")).await,
        )
        .map(parse_stake_balance)
        .unwrap_or(0)
    }

    /// Follows pages from `page` until the provider returns an empty one.
    async fn get_address_utxos(
        &self,
        address: &str,
        mut page: u32,
        limit: u32,
    ) -> Result<Vec<Utxo>, ProviderError> {
        let mut utxos = Vec::new();
        loop {
            let path = format!("/addresses/{address}/utxos?page={page}&count={limit}");
            let batch = strict_or(self.client.get_json(&path).await, || Value::Array(vec![]))?;
            let batch = parse_utxo_page(batch, address)?;
            if batch.is_empty() {
                break;
            }
            utxos.extend(batch);
            page += 1;
        }
        tracing::debug!(address, count = utxos.len(), "fetched utxos");
        Ok(utxos)
    }

    async fn get_address_transactions(&self, address: &str, count: u32, page: u32) -> Vec<TxRef> {
        let path = format!("/addresses/{address}/transactions?page={page}&order=desc&count={count}");
        optional("address transactions", self.client.get_json(&path).await)
            .map(parse_tx_refs)
            .unwrap_or_default()
    }

    async fn get_transaction(&self, tx_hash: &str) -> Option<Value> {
        self.optional_json("transaction", &format!("/txs/{tx_hash}")).await
    }

    async fn get_transaction_utxos(&self, tx_hash: &str) -> Option<Value> {
        self.optional_json("transaction utxos", &format!("/txs/{tx_hash}/utxos"))
            .await
    }

    async fn get_transaction_metadata(&self, tx_hash: &str) -> Option<Value> {
        self.optional_json("transaction metadata", &format!("/txs/{tx_hash}/metadata"))
            .await
    }

    async fn get_block(&self, hash_or_number: &str) -> Option<Value> {
        self.optional_json("block", &format!("/blocks/{hash_or_number}")).await
    }

    async fn submit_tx(&self, tx_hex: &str) -> Result<String, ProviderError> {
        let body = hex::decode(tx_hex).map_err(|_| ProviderError::InvalidRequest)?;
        let value = self
            .client
            .post_bytes("/tx/submit", "application/cbor", body)
            .await
            .map_err(submit_failure)?;
        value
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| ProviderError::decode("submit", "expected a transaction hash"))
    }

    async fn get_pool_delegation(&self, stake_address: &str) -> Option<Delegation> {
        let account: RawAccount = serde_json::from_value(
            self.optional_json("account", &format!("/accounts/{stake_address}"))
                .await?,
        )
        .ok()?;
        let pool_id = account.pool_id?;
        let metadata: RawPoolMetadata = serde_json::from_value(
            self.optional_json("pool metadata", &format!("/pools/{pool_id}/metadata"))
                .await?,
        )
        .ok()?;
        Some(Delegation {
            active: account.active,
            rewards: account.withdrawable_amount,
            pool_id,
            homepage: metadata.homepage,
            ticker: metadata.ticker,
            description: metadata.description,
            name: metadata.name,
        })
    }

    async fn get_addresses(&self, stake_address: &str, limit: u32) -> Result<Vec<String>, ProviderError> {
        let value = self
            .client
            .get_json(&format!("/accounts/{stake_address}/addresses?count={limit}"))
            .await?;
        parse_addresses(value)
    }

    async fn get_asset(&self, unit: &str) -> Option<Value> {
        self.optional_json("asset", &format!("/assets/{unit}")).await
    }

    async fn get_latest_block(&self) -> Result<Value, ProviderError> {
        self.client.get_json("/blocks/latest").await
    }

    async fn get_epoch_parameters(&self, epoch: u64) -> Result<Value, ProviderError> {
        self.client
            .get_json(&format!("/epochs/{epoch}/parameters"))
            .await
    }
}
