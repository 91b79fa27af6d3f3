//! Provider-neutral response shapes.

use kura_types::AssetAmount;
use serde::{Deserialize, Serialize};

/// One entry of an address's transaction list.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxRef {
    pub tx_hash: String,
    pub tx_index: u64,
    pub block_height: u64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Utxo {
    pub tx_hash: String,
    pub output_index: u32,
    pub address: String,
    pub amount: Vec<AssetAmount>,
}

impl Utxo {
    pub fn lovelace(&self) -> u64 {
        self.amount
            .iter()
            .filter(|a| a.is_lovelace())
            .map(|a| a.quantity)
            .sum()
    }
}

/// Stake pool delegation summary for a reward address.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Delegation {
    pub active: bool,
    pub rewards: u64,
    pub pool_id: String,
    pub homepage: Option<String>,
    pub ticker: Option<String>,
    pub description: Option<String>,
    pub name: Option<String>,
}
