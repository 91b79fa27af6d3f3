//! Minimal CBOR view of a serialized transaction.
//!
//! The body is never re-encoded: its hash must be computed over the exact bytes
//! the caller supplied, so the parser records byte ranges instead of building
//! a decoded tree.

use std::collections::BTreeMap;
use std::convert::Infallible;
use std::ops::Range;

use minicbor::data::Type;
use minicbor::{Decoder, Encoder};

use crate::bip32::SigningKey;
use crate::error::CryptoError;
use crate::hash::blake2b_256;

/// Witness set key holding the vkey witness array.
pub const VKEY_WITNESSES: u64 = 0;

fn decode_err(e: minicbor::decode::Error) -> CryptoError {
    CryptoError::Cbor(e.to_string())
}

fn encode_err(e: minicbor::encode::Error<Infallible>) -> CryptoError {
    CryptoError::Cbor(e.to_string())
}

#[derive(Clone, Debug)]
struct WitnessEntry {
    key: u64,
    value: Range<usize>,
}

/// A parsed `[body, witness_set, is_valid?, auxiliary_data]` transaction.
#[derive(Clone, Debug)]
pub struct Transaction {
    raw: Vec<u8>,
    body: Range<usize>,
    witness_set: Range<usize>,
    witnesses: Vec<WitnessEntry>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VkeyWitness {
    pub vkey: [u8; 32],
    pub signature: [u8; 64],
}

impl VkeyWitness {
    /// Sign a transaction hash.
    pub fn create(tx_hash: &[u8; 32], key: &SigningKey) -> Self {
        Self {
            vkey: key.public_key(),
            signature: key.sign(tx_hash),
        }
    }
}

impl Transaction {
    pub fn from_hex(tx_hex: &str) -> Result<Self, CryptoError> {
        let bytes = hex::decode(tx_hex).map_err(|e| CryptoError::Cbor(e.to_string()))?;
        Self::from_bytes(&bytes)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CryptoError> {
        let mut d = Decoder::new(bytes);
        let len = d.array().map_err(decode_err)?;
        let len = match len {
            Some(n @ 3..=4) => n,
            _ => {
                return Err(CryptoError::Cbor(
                    "transaction must be a definite array of 3 or 4 items".into(),
                ))
            }
        };

        let body_start = d.position();
        match d.datatype().map_err(decode_err)? {
            Type::Map | Type::MapIndef => {}
            other => {
                return Err(CryptoError::Cbor(format!(
                    "transaction body must be a map, found {other:?}"
                )))
            }
        }
        d.skip().map_err(decode_err)?;
        let body = body_start..d.position();

        let witness_start = d.position();
        let witnesses = match d.map().map_err(decode_err)? {
            Some(n) => (0..n)
                .map(|_| read_entry(&mut d))
                .collect::<Result<Vec<_>, _>>()?,
            None => {
                let mut entries = Vec::new();
                while d.datatype().map_err(decode_err)? != Type::Break {
                    entries.push(read_entry(&mut d)?);
                }
                d.set_position(d.position() + 1);
                entries
            }
        };
        let witness_set = witness_start..d.position();

        for _ in 2..len {
            d.skip().map_err(decode_err)?;
        }
        if d.position() != bytes.len() {
            return Err(CryptoError::Cbor("trailing bytes after transaction".into()));
        }

        Ok(Self {
            raw: bytes.to_vec(),
            body,
            witness_set,
            witnesses,
        })
    }

    pub fn body_bytes(&self) -> &[u8] {
        &self.raw[self.body.clone()]
    }

    pub fn witness_set_bytes(&self) -> &[u8] {
        &self.raw[self.witness_set.clone()]
    }

    /// Blake2b-256 of the body exactly as serialized.
    pub fn hash(&self) -> [u8; 32] {
        blake2b_256(self.body_bytes())
    }

    /// Encode a witness set equal to this transaction's, except that the vkey
    /// witness entry is replaced by `witnesses` (an empty array if none).
    ///
    /// All other entries are copied byte-for-byte; keys come out ascending.
    pub fn witness_set_with(&self, witnesses: &[VkeyWitness]) -> Result<Vec<u8>, CryptoError> {
        let mut entries: BTreeMap<u64, Vec<u8>> = self
            .witnesses
            .iter()
            .map(|entry| (entry.key, self.raw[entry.value.clone()].to_vec()))
            .collect();
        entries.insert(VKEY_WITNESSES, encode_vkey_witnesses(witnesses)?);

        let mut e = Encoder::new(Vec::new());
        e.map(entries.len() as u64).map_err(encode_err)?;
        let mut out = e.into_writer();
        for (key, value) in entries {
            let mut e = Encoder::new(Vec::new());
            e.u64(key).map_err(encode_err)?;
            out.extend_from_slice(&e.into_writer());
            out.extend_from_slice(&value);
        }
        Ok(out)
    }
}

fn read_entry(d: &mut Decoder<'_>) -> Result<WitnessEntry, CryptoError> {
    let key = d.u64().map_err(decode_err)?;
    let start = d.position();
    d.skip().map_err(decode_err)?;
    Ok(WitnessEntry {
        key,
        value: start..d.position(),
    })
}

fn encode_vkey_witnesses(witnesses: &[VkeyWitness]) -> Result<Vec<u8>, CryptoError> {
    let mut e = Encoder::new(Vec::new());
    e.array(witnesses.len() as u64).map_err(encode_err)?;
    for witness in witnesses {
        e.array(2)
            .and_then(|e| e.bytes(&witness.vkey))
            .and_then(|e| e.bytes(&witness.signature))
            .map_err(encode_err)?;
    }
    Ok(e.into_writer())
}
