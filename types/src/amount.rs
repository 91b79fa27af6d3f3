//! Asset quantities as reported by data providers and persisted per account.
//!
//! Quantities are written as decimal strings (the provider wire shape) but
//! older records may hold plain JSON numbers, so both are accepted on read.

use serde::{Deserialize, Serialize};

/// Unit name of the native currency.
pub const LOVELACE: &str = "lovelace";

/// A quantity of a single asset. `unit` is `lovelace` or `policy_id ++ asset_name` hex.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetAmount {
    pub unit: String,
    #[serde(with = "quantity")]
    pub quantity: u64,
}

impl AssetAmount {
    pub fn new(unit: impl Into<String>, quantity: u64) -> Self {
        Self {
            unit: unit.into(),
            quantity,
        }
    }

    pub fn lovelace(quantity: u64) -> Self {
        Self::new(LOVELACE, quantity)
    }

    pub fn is_lovelace(&self) -> bool {
        self.unit == LOVELACE
    }
}

/// Serde adapter: writes `u64` as a decimal string, reads either form.
pub mod quantity {
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &u64, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Number(u64),
            Text(String),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Number(n) => Ok(n),
            Raw::Text(s) => s.parse().map_err(de::Error::custom),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_string_and_number_quantities() {
        let a: AssetAmount =
            serde_json::from_str(r#"{"unit":"lovelace","quantity":"1500000"}"#).unwrap();
        let b: AssetAmount = serde_json::from_str(r#"{"unit":"lovelace","quantity":42}"#).unwrap();
        assert_eq!(a.quantity, 1_500_000);
        assert_eq!(b.quantity, 42);
    }

    #[test]
    fn writes_quantity_as_string() {
        let json = serde_json::to_value(AssetAmount::lovelace(7)).unwrap();
        assert_eq!(json["quantity"], "7");
    }
}
