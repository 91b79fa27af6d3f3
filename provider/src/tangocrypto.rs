//! Tangocrypto REST API client.
//!
//! Responses are reshaped into the Blockfrost field names so that callers and
//! the persisted transaction details see a single schema.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime};
use kura_types::amount::quantity;
use kura_types::{AssetAmount, LOVELACE};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::{optional, strict_or, submit_failure, ProviderError};
use crate::http::{Endpoint, HttpClient};
use crate::types::{Delegation, TxRef, Utxo};
use crate::DataProvider;

#[derive(Deserialize)]
struct RawTxRef {
    hash: String,
    #[serde(default)]
    block_index: u64,
    #[serde(default)]
    block_no: u64,
}

#[derive(Deserialize)]
struct RawAsset {
    policy_id: String,
    asset_name: String,
    #[serde(with = "quantity")]
    quantity: u64,
}

impl RawAsset {
    fn into_amount(self) -> AssetAmount {
        AssetAmount::new(format!("{}{}", self.policy_id, self.asset_name), self.quantity)
    }
}

#[derive(Deserialize)]
struct RawAddress {
    #[serde(default, with = "quantity")]
    ada: u64,
    #[serde(default)]
    assets: Vec<RawAsset>,
}

#[derive(Deserialize)]
struct RawUtxo {
    hash: String,
    index: u32,
    #[serde(with = "quantity")]
    value: u64,
    #[serde(default)]
    assets: Vec<RawAsset>,
}

#[derive(Deserialize)]
struct RawWallet {
    #[serde(default)]
    active: bool,
    #[serde(default)]
    pool_id: Option<String>,
    #[serde(default, with = "quantity")]
    controlled_total_stake: u64,
    #[serde(default, with = "quantity")]
    withdraw_available: u64,
}

fn field(value: &Value, key: &str) -> Value {
    value.get(key).cloned().unwrap_or(Value::Null)
}

fn amounts(lovelace: u64, assets: Vec<RawAsset>) -> Vec<AssetAmount> {
    std::iter::once(AssetAmount::lovelace(lovelace))
        .chain(assets.into_iter().map(RawAsset::into_amount))
        .collect()
}

/// Block timestamps arrive as date strings; Blockfrost reports milliseconds.
fn to_millis(value: &Value) -> Value {
    let Some(text) = value.as_str() else {
        return value.clone();
    };
    DateTime::parse_from_rfc3339(text)
        .map(|t| t.timestamp_millis())
        .or_else(|_| {
            NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S")
                .map(|t| t.and_utc().timestamp_millis())
        })
        .map(Value::from)
        .unwrap_or(Value::Null)
}

pub(crate) fn parse_tx_refs(value: Value) -> Vec<TxRef> {
    serde_json::from_value::<Vec<RawTxRef>>(value)
        .map(|refs| {
            refs.into_iter()
                .map(|r| TxRef {
                    tx_hash: r.hash,
                    tx_index: r.block_index,
                    block_height: r.block_no,
                })
                .collect()
        })
        .unwrap_or_default()
}

pub(crate) fn parse_balance(value: Value) -> Result<Vec<AssetAmount>, ProviderError> {
    let raw: RawAddress =
        serde_json::from_value(value).map_err(|e| ProviderError::decode("address", e))?;
    Ok(amounts(raw.ada, raw.assets))
}

pub(crate) fn parse_utxos(value: Value, address: &str) -> Result<Vec<Utxo>, ProviderError> {
    // Listings may be bare arrays or wrapped in `data`.
    let value = match value {
        Value::Object(mut map) => map.remove("data").unwrap_or(Value::Array(vec![])),
        other => other,
    };
    let raw: Vec<RawUtxo> =
        serde_json::from_value(value).map_err(|e| ProviderError::decode("utxos", e))?;
    Ok(raw
        .into_iter()
        .map(|u| Utxo {
            tx_hash: u.hash,
            output_index: u.index,
            address: address.to_string(),
            amount: amounts(u.value, u.assets),
        })
        .collect())
}

pub(crate) fn parse_stake_balance(value: Value) -> u64 {
    serde_json::from_value::<RawWallet>(value)
        .map(|w| w.controlled_total_stake.saturating_sub(w.withdraw_available))
        .unwrap_or(0)
}

pub(crate) fn normalize_transaction(raw: &Value) -> Value {
    let block = field(raw, "block");
    let mut output_amount = vec![json!({ "unit": LOVELACE, "quantity": field(raw, "out_sum") })];
    if let Some(assets) = raw.get("assets").and_then(Value::as_array) {
        output_amount.extend(assets.iter().cloned());
    }
    json!({
        "hash": field(raw, "hash"),
        "block": field(&block, "hash"),
        "block_height": field(&block, "block_no"),
        "slot": field(&block, "slot_no"),
        "index": field(raw, "block_index"),
        "output_amount": output_amount,
        "fees": field(raw, "fees"),
        "deposit": field(raw, "deposit"),
        "size": field(raw, "size"),
        "invalid_before": field(raw, "invalid_before"),
        "invalid_hereafter": field(raw, "invalid_hereafter"),
        "utxo_count": field(raw, "utxo_count"),
        "withdrawal_count": field(raw, "withdrawal_count"),
        "mir_cert_count": field(raw, "mir_cert_count"),
        "delegation_count": field(raw, "delegation_count"),
        "stake_cert_count": field(raw, "stake_cert_count"),
        "pool_update_count": field(raw, "pool_update_count"),
        "pool_retire_count": field(raw, "pool_retire_count"),
        "asset_mint_or_burn_count": field(raw, "asset_mint_or_burn_count"),
    })
}

pub(crate) fn normalize_block(raw: &Value) -> Value {
    json!({
        "time": to_millis(&field(raw, "time")),
        "height": field(raw, "block_no"),
        "hash": field(raw, "hash"),
        "slot": field(raw, "slot_no"),
        "epoch": field(raw, "epoch_no"),
        "epoch_slot": field(raw, "epoch_slot_no"),
        "slot_leader": field(raw, "slot_leader"),
        "size": field(raw, "size"),
        "tx_count": field(raw, "tx_count"),
        "output": field(raw, "out_sum"),
        "fees": field(raw, "fees"),
        "block_vrf": field(raw, "vrf_key"),
        "previous_block": field(raw, "previous_block"),
        "next_block": field(raw, "next_block"),
        "confirmations": field(raw, "confirmations"),
    })
}

/// Asset names in UTxO listings are plain text; units use their hex form.
fn io_amount(entry: &Value) -> Value {
    let mut amount = vec![json!({ "unit": LOVELACE, "quantity": field(entry, "value") })];
    if let Some(assets) = entry.get("assets").and_then(Value::as_array) {
        amount.extend(assets.iter().map(|a| {
            let policy = a.get("policy_id").and_then(Value::as_str).unwrap_or_default();
            let name = a.get("asset_name").and_then(Value::as_str).unwrap_or_default();
            json!({
                "unit": format!("{policy}{}", hex::encode(name)),
                "quantity": field(a, "quantity"),
            })
        }));
    }
    Value::Array(amount)
}

pub(crate) fn normalize_transaction_utxos(raw: &Value) -> Value {
    let list = |key: &str| -> Vec<Value> {
        raw.get(key)
            .and_then(Value::as_array)
            .into_iter()
            .flatten()
            .map(|entry| {
                let mut item = json!({
                    "address": field(entry, "address"),
                    "amount": io_amount(entry),
                });
                if key == "inputs" {
                    item["tx_hash"] = field(entry, "hash");
                    item["output_index"] = field(entry, "index");
                }
                item
            })
            .collect()
    };
    json!({
        "hash": field(raw, "hash"),
        "inputs": list("inputs"),
        "outputs": list("outputs"),
    })
}

pub(crate) fn normalize_metadata(raw: &Value) -> Value {
    let entries = raw.as_array().cloned().unwrap_or_default();
    Value::Array(
        entries
            .iter()
            .map(|item| json!({ "label": field(item, "key"), "json_metadata": field(item, "json") }))
            .collect(),
    )
}

pub(crate) fn normalize_asset(raw: &Value) -> Value {
    let policy = raw.get("policy_id").and_then(Value::as_str).unwrap_or_default();
    let name_hex = raw.get("asset_name").and_then(Value::as_str).unwrap_or_default();
    let name_text = hex::decode(name_hex)
        .ok()
        .and_then(|bytes| String::from_utf8(bytes).ok())
        .unwrap_or_default();
    let onchain = raw
        .pointer("/metadata/json")
        .and_then(|json| json.get(policy))
        .and_then(|by_policy| by_policy.get(&name_text))
        .cloned()
        .unwrap_or_else(|| json!({}));
    json!({
        "asset": format!("{policy}{name_hex}"),
        "policy_id": policy,
        "asset_name": name_hex,
        "fingerprint": field(raw, "fingerprint"),
        "quantity": field(raw, "quantity"),
        "initial_mint_tx_hash": field(raw, "initial_mint_tx_hash"),
        "mint_or_burn_count": field(raw, "mint_or_burn_count"),
        "onchain_metadata": onchain,
    })
}

pub(crate) fn normalize_epoch_parameters(epoch: u64, raw: &Value) -> Value {
    json!({
        "epoch": epoch,
        "min_fee_a": field(raw, "min_fee_a"),
        "min_fee_b": field(raw, "min_fee_b"),
        "max_block_size": field(raw, "max_block_size"),
        "max_tx_size": field(raw, "max_tx_size"),
        "max_block_header_size": field(raw, "max_block_header_size"),
        "key_deposit": field(raw, "key_deposit"),
        "pool_deposit": field(raw, "pool_deposit"),
        "e_max": field(raw, "max_epoch"),
        "n_opt": field(raw, "optimal_pool_count"),
        "a0": field(raw, "influence_a0"),
        "rho": field(raw, "monetary_expand_rate_rho"),
        "tau": field(raw, "treasury_growth_rate_tau"),
        "decentralisation_param": field(raw, "decentralisation"),
        "extra_entropy": field(raw, "entropy"),
        "protocol_major_ver": field(raw, "protocol_major"),
        "protocol_minor_ver": field(raw, "protocol_minor"),
        "min_utxo": field(raw, "min_utxo"),
        "min_pool_cost": field(raw, "min_pool_cost"),
        "nonce": field(raw, "nonce"),
    })
}

pub(crate) fn parse_addresses(value: Value) -> Result<Vec<String>, ProviderError> {
    let value = match value {
        Value::Object(mut map) => map.remove("data").unwrap_or(Value::Array(vec![])),
        other => other,
    };
    let entries = value
        .as_array()
        .ok_or_else(|| ProviderError::decode("addresses", "expected a list"))?;
    Ok(entries
        .iter()
        .filter_map(|e| e.get("address").and_then(Value::as_str))
        .map(str::to_string)
        .collect())
}

pub struct Tangocrypto {
    client: HttpClient,
}

impl Tangocrypto {
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
impl DataProvider for Tangocrypto {
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
            self.client.get_json(&format!("/wallets/{stake_address}")).await,
        )
        .map(parse_stake_balance)
        .unwrap_or(0)
    }

    /// Single page only; any failure other than 400 is an internal error.
    async fn get_address_utxos(
        &self,
        address: &str,
        page: u32,
        limit: u32,
    ) -> Result<Vec<Utxo>, ProviderError> {
        let path = format!("/addresses/{address}/utxos?page={page}&count={limit}");
        let value = self.client.get_json(&path).await.map_err(|e| match e {
            ProviderError::Status { status: 400, .. } => ProviderError::InvalidRequest,
            _ => ProviderError::InternalError,
        })?;
        parse_utxos(value, address)
    }

    async fn get_address_transactions(&self, address: &str, count: u32, page: u32) -> Vec<TxRef> {
        let path = format!("/addresses/{address}/transactions?page={page}&order=desc&count={count}");
        optional("address transactions", self.client.get_json(&path).await)
            .map(parse_tx_refs)
            .unwrap_or_default()
    }

    async fn get_transaction(&self, tx_hash: &str) -> Option<Value> {
        self.optional_json("transaction", &format!("/transactions/{tx_hash}"))
            .await
            .map(|raw| normalize_transaction(&raw))
    }

    async fn get_transaction_utxos(&self, tx_hash: &str) -> Option<Value> {
        self.optional_json("transaction utxos", &format!("/transactions/{tx_hash}/utxos"))
            .await
            .map(|raw| normalize_transaction_utxos(&raw))
    }

    async fn get_transaction_metadata(&self, tx_hash: &str) -> Option<Value> {
        self.optional_json(
            "transaction metadata",
            &format!("/transactions/{tx_hash}/metadata"),
        )
        .await
        .map(|raw| normalize_metadata(&raw))
    }

    async fn get_block(&self, hash_or_number: &str) -> Option<Value> {
        self.optional_json("block", &format!("/blocks/{hash_or_number}"))
            .await
            .map(|raw| normalize_block(&raw))
    }

    async fn submit_tx(&self, tx_hex: &str) -> Result<String, ProviderError> {
        let value = self
            .client
            .post_json("/transactions/submit", &json!({ "tx": tx_hex }))
            .await
            .map_err(submit_failure)?;
        value
            .get("txId")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| ProviderError::decode("submit", "missing txId"))
    }

    async fn get_pool_delegation(&self, stake_address: &str) -> Option<Delegation> {
        let wallet: RawWallet = serde_json::from_value(
            self.optional_json("wallet", &format!("/wallets/{stake_address}"))
                .await?,
        )
        .ok()?;
        let pool_id = wallet.pool_id?;
        let metadata: crate::blockfrost::RawPoolMetadata = serde_json::from_value(
            self.optional_json("pool metadata", &format!("/pools/{pool_id}/metadata"))
                .await?,
        )
        .ok()?;
        Some(Delegation {
            active: wallet.active,
            rewards: wallet.withdraw_available,
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
            .get_json(&format!("/wallets/{stake_address}/addresses?count={limit}"))
            .await?;
        parse_addresses(value)
    }

    async fn get_asset(&self, unit: &str) -> Option<Value> {
        let raw = self.optional_json("asset", &format!("/assets/{unit}")).await?;
        Some(normalize_asset(&raw))
    }

    async fn get_latest_block(&self) -> Result<Value, ProviderError> {
        let raw = self.client.get_json("/blocks/latest").await?;
        Ok(normalize_block(&raw))
    }

    async fn get_epoch_parameters(&self, epoch: u64) -> Result<Value, ProviderError> {
        let raw = self
            .client
            .get_json(&format!("/epochs/{epoch}/parameters"))
            .await?;
        Ok(normalize_epoch_parameters(epoch, &raw))
    }
}
