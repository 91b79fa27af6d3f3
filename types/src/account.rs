//! Persisted account records.
//!
//! Addresses are never stored: only the two key hashes are kept, and the
//! network-specific view is recomputed on demand by the wallet core.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::amount::quantity;
use crate::{AssetAmount, KeyHash, NetworkId};

/// One derived account, keyed by `index` in the persisted `accounts` map.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub index: u32,
    pub payment_key_hash: KeyHash,
    pub stake_key_hash: KeyHash,
    pub name: String,
    #[serde(rename = "avatar")]
    pub avatar_seed: String,
    pub mainnet: NetworkState,
    pub testnet: NetworkState,
}

impl Account {
    /// A fresh account with zero balance and empty history on both networks.
    pub fn new(
        index: u32,
        name: impl Into<String>,
        payment_key_hash: KeyHash,
        stake_key_hash: KeyHash,
        avatar_seed: impl Into<String>,
    ) -> Self {
        Self {
            index,
            payment_key_hash,
            stake_key_hash,
            name: name.into(),
            avatar_seed: avatar_seed.into(),
            mainnet: NetworkState::default(),
            testnet: NetworkState::default(),
        }
    }

    pub fn network(&self, id: NetworkId) -> &NetworkState {
        match id {
            NetworkId::Mainnet => &self.mainnet,
            NetworkId::Testnet => &self.testnet,
        }
    }

    pub fn network_mut(&mut self, id: NetworkId) -> &mut NetworkState {
        match id {
            NetworkId::Mainnet => &mut self.mainnet,
            NetworkId::Testnet => &mut self.testnet,
        }
    }
}

/// Balance and history of an account on one network.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkState {
    #[serde(with = "quantity", default)]
    pub lovelace: u64,
    #[serde(default)]
    pub assets: Vec<AssetAmount>,
    #[serde(default)]
    pub history: History,
    #[serde(default)]
    pub recent_send_to_addresses: Vec<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct History {
    /// Confirmed transaction hashes, newest first.
    #[serde(default)]
    pub confirmed: Vec<String>,
    #[serde(default)]
    pub details: BTreeMap<String, TxDetail>,
}

/// Cached provider data for one transaction.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TxDetail {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub info: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub utxos: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
}

impl TxDetail {
    /// A detail is complete once all four parts have been fetched.
    pub fn is_complete(&self) -> bool {
        self.info.is_some() && self.block.is_some() && self.utxos.is_some() && self.metadata.is_some()
    }
}
