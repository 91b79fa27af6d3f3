//! Legacy Byron addresses: base58 text over
//! `[#6.24(bytes .cbor [root, attributes, type]), crc32]`.
//!
//! The network comes from the protocol-magic attribute (key 2); mainnet
//! addresses omit it.

use kura_types::NetworkId;
use minicbor::Decoder;

use crate::error::CryptoError;

const CBOR_IN_CBOR_TAG: u64 = 24;
const ATTR_PROTOCOL_MAGIC: u64 = 2;
const ROOT_LEN: usize = 28;

const MAINNET_MAGIC: u32 = 764_824_073;
/// Legacy testnet, preprod and preview.
const TESTNET_MAGICS: [u32; 3] = [1_097_911_063, 1, 2];

const CRC32: crc::Crc<u32> = crc::Crc::<u32>::new(&crc::CRC_32_ISO_HDLC);

fn invalid(e: impl std::fmt::Display) -> CryptoError {
    CryptoError::InvalidAddress(format!("byron: {e}"))
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ByronAddress {
    raw: Vec<u8>,
    network: NetworkId,
}

impl ByronAddress {
    pub fn from_base58(text: &str) -> Result<Self, CryptoError> {
        let raw = bs58::decode(text).into_vec().map_err(invalid)?;
        Self::from_bytes(&raw)
    }

    /// Parse and checksum-verify raw address bytes.
    pub fn from_bytes(raw: &[u8]) -> Result<Self, CryptoError> {
        let mut d = Decoder::new(raw);
        if d.array().map_err(invalid)? != Some(2) {
            return Err(invalid("expected [payload, crc]"));
        }
        if d.tag().map_err(invalid)?.as_u64() != CBOR_IN_CBOR_TAG {
            return Err(invalid("payload is not tagged cbor"));
        }
        let payload = d.bytes().map_err(invalid)?;
        let crc = d.u32().map_err(invalid)?;
        if d.position() != raw.len() {
            return Err(invalid("trailing bytes"));
        }
        if CRC32.checksum(payload) != crc {
            return Err(invalid("checksum mismatch"));
        }

        Ok(Self {
            raw: raw.to_vec(),
            network: payload_network(payload)?,
        })
    }

    pub fn network(&self) -> NetworkId {
        self.network
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        self.raw.clone()
    }

    pub fn to_base58(&self) -> String {
        bs58::encode(&self.raw).into_string()
    }
}

fn payload_network(payload: &[u8]) -> Result<NetworkId, CryptoError> {
    let mut d = Decoder::new(payload);
    if d.array().map_err(invalid)? != Some(3) {
        return Err(invalid("expected [root, attributes, type]"));
    }
    if d.bytes().map_err(invalid)?.len() != ROOT_LEN {
        return Err(invalid("address root must be 28 bytes"));
    }

    let mut magic = None;
    let attributes = d
        .map()
        .map_err(invalid)?
        .ok_or_else(|| invalid("indefinite attributes"))?;
    for _ in 0..attributes {
        if d.u64().map_err(invalid)? == ATTR_PROTOCOL_MAGIC {
            let inner = d.bytes().map_err(invalid)?;
            magic = Some(Decoder::new(inner).u32().map_err(invalid)?);
        } else {
            d.skip().map_err(invalid)?;
        }
    }
    d.u64().map_err(invalid)?;
    if d.position() != payload.len() {
        return Err(invalid("trailing payload bytes"));
    }

    match magic.unwrap_or(MAINNET_MAGIC) {
        MAINNET_MAGIC => Ok(NetworkId::Mainnet),
        m if TESTNET_MAGICS.contains(&m) => Ok(NetworkId::Testnet),
        m => Err(invalid(format!("unknown protocol magic {m}"))),
    }
}
