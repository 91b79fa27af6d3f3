//! CBOR multi-asset values: `coin / [coin, {policy_id => {asset_name => uint}}]`.

use kura_types::AssetAmount;
use minicbor::data::Type;
use minicbor::Decoder;

use crate::error::CryptoError;

const POLICY_ID_LEN: usize = 28;
const MAX_ASSET_NAME_LEN: usize = 32;

fn decode_err(e: minicbor::decode::Error) -> CryptoError {
    CryptoError::Cbor(e.to_string())
}

/// Decode a hex CBOR value into amounts, lovelace first. Asset units are
/// `policy_id ++ asset_name` in hex, matching provider responses.
pub fn decode_value_hex(value_hex: &str) -> Result<Vec<AssetAmount>, CryptoError> {
    let bytes = hex::decode(value_hex).map_err(|e| CryptoError::Cbor(e.to_string()))?;
    decode_value(&bytes)
}

pub fn decode_value(bytes: &[u8]) -> Result<Vec<AssetAmount>, CryptoError> {
    let mut d = Decoder::new(bytes);
    let amounts = match d.datatype().map_err(decode_err)? {
        Type::U8 | Type::U16 | Type::U32 | Type::U64 => {
            vec![AssetAmount::lovelace(d.u64().map_err(decode_err)?)]
        }
        Type::Array => {
            if d.array().map_err(decode_err)? != Some(2) {
                return Err(CryptoError::Cbor("value must be [coin, multiasset]".into()));
            }
            let mut amounts = vec![AssetAmount::lovelace(d.u64().map_err(decode_err)?)];
            read_multiasset(&mut d, &mut amounts)?;
            amounts
        }
        other => return Err(CryptoError::Cbor(format!("unexpected value type {other:?}"))),
    };
    if d.position() != bytes.len() {
        return Err(CryptoError::Cbor("trailing bytes after value".into()));
    }
    Ok(amounts)
}

fn read_multiasset(d: &mut Decoder<'_>, amounts: &mut Vec<AssetAmount>) -> Result<(), CryptoError> {
    let policies = definite_map(d)?;
    for _ in 0..policies {
        let policy = d.bytes().map_err(decode_err)?;
        if policy.len() != POLICY_ID_LEN {
            return Err(CryptoError::Cbor(format!(
                "policy id must be {POLICY_ID_LEN} bytes, got {}",
                policy.len()
            )));
        }
        let policy = hex::encode(policy);
        for _ in 0..definite_map(d)? {
            let name = d.bytes().map_err(decode_err)?;
            if name.len() > MAX_ASSET_NAME_LEN {
                return Err(CryptoError::Cbor("asset name longer than 32 bytes".into()));
            }
            let unit = format!("{policy}{}", hex::encode(name));
            amounts.push(AssetAmount::new(unit, d.u64().map_err(decode_err)?));
        }
    }
    Ok(())
}

fn definite_map(d: &mut Decoder<'_>) -> Result<u64, CryptoError> {
    d.map()
        .map_err(decode_err)?
        .ok_or_else(|| CryptoError::Cbor("indefinite maps are not supported in values".into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const POLICY: &str = "b0d07d45fe9514f80213f4020e5a61241458be626841cde717cb38a7";

    #[test]
    fn plain_coin() {
        // 1_000_000
        assert_eq!(
            decode_value_hex("1a000f4240").unwrap(),
            vec![AssetAmount::lovelace(1_000_000)]
        );
    }

    #[test]
    fn coin_with_assets() {
        // [2_000_000, {policy: {"tok": 5}}]
        let hex = format!("821a001e8480a1581c{POLICY}a143746f6b05");
        assert_eq!(
            decode_value_hex(&hex).unwrap(),
            vec![
                AssetAmount::lovelace(2_000_000),
                AssetAmount::new(format!("{POLICY}746f6b"), 5),
            ]
        );
    }

    #[test]
    fn malformed_values_are_rejected() {
        for bad in ["", "zz", "60", "8101", "1a000f424000", "821a001e8480a14101a0"] {
            assert!(decode_value_hex(bad).is_err(), "{bad} should not decode");
        }
    }
}
