//! COSE_Sign1 envelopes for message signing (CIP-8 / CIP-30 `signData`).

use std::convert::Infallible;

use minicbor::data::Type;
use minicbor::{Decoder, Encoder};

use crate::bip32::{verify, SigningKey};
use crate::error::CryptoError;

/// COSE algorithm identifier for EdDSA.
pub const ALGORITHM_EDDSA: i64 = -8;

const LABEL_ALGORITHM: u64 = 1;
const LABEL_KEY_ID: u64 = 4;
const LABEL_ADDRESS: &str = "address";
const LABEL_HASHED: &str = "hashed";
const SIGNATURE1_CONTEXT: &str = "Signature1";

fn encode_err(e: minicbor::encode::Error<Infallible>) -> CryptoError {
    CryptoError::Cbor(e.to_string())
}

fn decode_err(e: minicbor::decode::Error) -> CryptoError {
    CryptoError::Cbor(e.to_string())
}

/// Protected header bucket: algorithm, key id and the signing address.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProtectedHeaders {
    pub key_id: Vec<u8>,
    pub address: Vec<u8>,
}

impl ProtectedHeaders {
    pub fn new(key_id: &[u8], address: &[u8]) -> Self {
        Self {
            key_id: key_id.to_vec(),
            address: address.to_vec(),
        }
    }

    /// Serialized header map, i.e. the content of the protected bstr.
    pub fn to_bytes(&self) -> Result<Vec<u8>, CryptoError> {
        let mut e = Encoder::new(Vec::new());
        e.map(3)
            .and_then(|e| e.u64(LABEL_ALGORITHM))
            .and_then(|e| e.i64(ALGORITHM_EDDSA))
            .and_then(|e| e.u64(LABEL_KEY_ID))
            .and_then(|e| e.bytes(&self.key_id))
            .and_then(|e| e.str(LABEL_ADDRESS))
            .and_then(|e| e.bytes(&self.address))
            .map_err(encode_err)?;
        Ok(e.into_writer())
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CryptoError> {
        let mut d = Decoder::new(bytes);
        let len = d
            .map()
            .map_err(decode_err)?
            .ok_or_else(|| CryptoError::Cbor("indefinite header map".into()))?;
        let mut algorithm = None;
        let mut key_id = None;
        let mut address = None;
        for _ in 0..len {
            match d.datatype().map_err(decode_err)? {
                Type::String => {
                    let label = d.str().map_err(decode_err)?;
                    if label == LABEL_ADDRESS {
                        address = Some(d.bytes().map_err(decode_err)?.to_vec());
                        continue;
                    }
                }
                _ => match d.i64().map_err(decode_err)? {
                    1 => {
                        algorithm = Some(d.i64().map_err(decode_err)?);
                        continue;
                    }
                    4 => {
                        key_id = Some(d.bytes().map_err(decode_err)?.to_vec());
                        continue;
                    }
                    _ => {}
                },
            }
            d.skip().map_err(decode_err)?;
        }
        if algorithm != Some(ALGORITHM_EDDSA) {
            return Err(CryptoError::Cbor("protected headers must declare EdDSA".into()));
        }
        match (key_id, address) {
            (Some(key_id), Some(address)) => Ok(Self { key_id, address }),
            _ => Err(CryptoError::Cbor("protected headers missing key id or address".into())),
        }
    }
}

/// `Sig_structure = ["Signature1", protected, external_aad, payload]`
pub fn sig_structure(protected: &[u8], payload: &[u8]) -> Result<Vec<u8>, CryptoError> {
    let mut e = Encoder::new(Vec::new());
    e.array(4)
        .and_then(|e| e.str(SIGNATURE1_CONTEXT))
        .and_then(|e| e.bytes(protected))
        .and_then(|e| e.bytes(&[]))
        .and_then(|e| e.bytes(payload))
        .map_err(encode_err)?;
    Ok(e.into_writer())
}

pub struct CoseSign1Builder {
    protected: Vec<u8>,
    payload: Vec<u8>,
    hashed: bool,
}

impl CoseSign1Builder {
    pub fn new(headers: &ProtectedHeaders, payload: &[u8]) -> Result<Self, CryptoError> {
        Ok(Self {
            protected: headers.to_bytes()?,
            payload: payload.to_vec(),
            hashed: false,
        })
    }

    /// Bytes the signer must sign.
    pub fn signed_data(&self) -> Result<Vec<u8>, CryptoError> {
        sig_structure(&self.protected, &self.payload)
    }

    pub fn sign(self, key: &SigningKey) -> Result<CoseSign1, CryptoError> {
        let signature = key.sign(&self.signed_data()?);
        Ok(CoseSign1 {
            protected: self.protected,
            hashed: self.hashed,
            payload: self.payload,
            signature,
        })
    }
}

/// An untagged `COSE_Sign1` structure.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CoseSign1 {
    protected: Vec<u8>,
    hashed: bool,
    payload: Vec<u8>,
    signature: [u8; 64],
}

impl CoseSign1 {
    pub fn protected_bytes(&self) -> &[u8] {
        &self.protected
    }

    pub fn headers(&self) -> Result<ProtectedHeaders, CryptoError> {
        ProtectedHeaders::from_bytes(&self.protected)
    }

    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    pub fn signature(&self) -> &[u8; 64] {
        &self.signature
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, CryptoError> {
        let mut e = Encoder::new(Vec::new());
        e.array(4)
            .and_then(|e| e.bytes(&self.protected))
            .and_then(|e| e.map(1))
            .and_then(|e| e.str(LABEL_HASHED))
            .and_then(|e| e.bool(self.hashed))
            .and_then(|e| e.bytes(&self.payload))
            .and_then(|e| e.bytes(&self.signature))
            .map_err(encode_err)?;
        Ok(e.into_writer())
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CryptoError> {
        let mut d = Decoder::new(bytes);
        if d.array().map_err(decode_err)? != Some(4) {
            return Err(CryptoError::Cbor("COSE_Sign1 must be a 4 element array".into()));
        }
        let protected = d.bytes().map_err(decode_err)?.to_vec();

        let mut hashed = false;
        let entries = d
            .map()
            .map_err(decode_err)?
            .ok_or_else(|| CryptoError::Cbor("indefinite unprotected map".into()))?;
        for _ in 0..entries {
            let is_hashed = match d.datatype().map_err(decode_err)? {
                Type::String => d.str().map_err(decode_err)? == LABEL_HASHED,
                _ => {
                    d.skip().map_err(decode_err)?;
                    false
                }
            };
            if is_hashed {
                hashed = d.bool().map_err(decode_err)?;
            } else {
                d.skip().map_err(decode_err)?;
            }
        }

        let payload = d.bytes().map_err(decode_err)?.to_vec();
        let signature: [u8; 64] = d
            .bytes()
            .map_err(decode_err)?
            .try_into()
            .map_err(|_| CryptoError::Cbor("signature must be 64 bytes".into()))?;
        Ok(Self {
            protected,
            hashed,
            payload,
            signature,
        })
    }

    /// Check the signature against the key id carried in the protected headers.
    pub fn verify(&self) -> Result<bool, CryptoError> {
        let headers = self.headers()?;
        let Ok(public_key) = <[u8; 32]>::try_from(headers.key_id.as_slice()) else {
            return Ok(false);
        };
        let data = sig_structure(&self.protected, &self.payload)?;
        Ok(verify(&public_key, &data, &self.signature))
    }
}
