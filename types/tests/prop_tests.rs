use proptest::prelude::*;

use kura_types::{AssetAmount, KeyHash, NetworkId};

proptest! {
    /// KeyHash survives a hex string roundtrip.
    #[test]
    fn key_hash_hex_roundtrip(bytes in prop::array::uniform28(0u8..)) {
        let hash = KeyHash::new(bytes);
        let parsed: KeyHash = hash.to_hex().parse().unwrap();
        prop_assert_eq!(parsed, hash);
    }

    /// Quantities read back identically whether persisted as string or number.
    #[test]
    fn quantity_accepts_both_encodings(q in 0u64..u64::MAX) {
        let as_text = format!(r#"{{"unit":"lovelace","quantity":"{q}"}}"#);
        let as_number = format!(r#"{{"unit":"lovelace","quantity":{q}}}"#);
        let a: AssetAmount = serde_json::from_str(&as_text).unwrap();
        let b: AssetAmount = serde_json::from_str(&as_number).unwrap();
        prop_assert_eq!(a, b);
    }

    /// Only the two known discriminants map to a network.
    #[test]
    fn discriminant_mapping(tag in 0u8..16) {
        let network = NetworkId::from_discriminant(tag);
        prop_assert_eq!(network.is_some(), tag <= 1);
        if let Some(id) = network {
            prop_assert_eq!(id.discriminant(), tag);
        }
    }
}
