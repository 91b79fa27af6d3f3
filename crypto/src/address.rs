//! Shelley address binary layout and bech32 text encoding.
//!
//! The header byte is `type << 4 | network`. Only the header types the wallet
//! needs to reason about are modelled; Byron addresses are recognised but kept
//! opaque.

use bech32::{FromBase32, ToBase32, Variant};
use kura_types::{KeyHash, NetworkId, KEY_HASH_LEN};

use crate::error::CryptoError;

const CREDENTIAL_LEN: usize = KEY_HASH_LEN;
const BASE_LEN: usize = 1 + 2 * CREDENTIAL_LEN;
const SINGLE_LEN: usize = 1 + CREDENTIAL_LEN;

const TYPE_POINTER_KEY: u8 = 0b0100;
const TYPE_POINTER_SCRIPT: u8 = 0b0101;
const TYPE_ENTERPRISE_KEY: u8 = 0b0110;
const TYPE_ENTERPRISE_SCRIPT: u8 = 0b0111;
const TYPE_BYRON: u8 = 0b1000;
const TYPE_REWARD_KEY: u8 = 0b1110;
const TYPE_REWARD_SCRIPT: u8 = 0b1111;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Credential {
    Key(KeyHash),
    Script([u8; CREDENTIAL_LEN]),
}

impl Credential {
    fn from_slice(bytes: &[u8], script: bool) -> Result<Self, CryptoError> {
        if script {
            let mut hash = [0u8; CREDENTIAL_LEN];
            hash.copy_from_slice(bytes);
            Ok(Self::Script(hash))
        } else {
            KeyHash::from_slice(bytes)
                .map(Self::Key)
                .map_err(|e| CryptoError::InvalidAddress(e.to_string()))
        }
    }

    fn as_bytes(&self) -> &[u8; CREDENTIAL_LEN] {
        match self {
            Self::Key(hash) => hash.as_bytes(),
            Self::Script(hash) => hash,
        }
    }

    fn is_script(&self) -> bool {
        matches!(self, Self::Script(_))
    }

    pub fn key_hash(&self) -> Option<&KeyHash> {
        match self {
            Self::Key(hash) => Some(hash),
            Self::Script(_) => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Address {
    Base {
        network: NetworkId,
        payment: Credential,
        stake: Credential,
    },
    /// Payment credential plus a variable-length chain pointer, kept raw.
    Pointer {
        network: NetworkId,
        payment: Credential,
        pointer: Vec<u8>,
    },
    Enterprise {
        network: NetworkId,
        payment: Credential,
    },
    Reward {
        network: NetworkId,
        stake: Credential,
    },
    Byron(Vec<u8>),
}

impl Address {
    pub fn base(network: NetworkId, payment: KeyHash, stake: KeyHash) -> Self {
        Self::Base {
            network,
            payment: Credential::Key(payment),
            stake: Credential::Key(stake),
        }
    }

    pub fn reward(network: NetworkId, stake: KeyHash) -> Self {
        Self::Reward {
            network,
            stake: Credential::Key(stake),
        }
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CryptoError> {
        let header = *bytes
            .first()
            .ok_or_else(|| CryptoError::InvalidAddress("empty address".into()))?;
        let kind = header >> 4;
        if kind == TYPE_BYRON {
            return Ok(Self::Byron(bytes.to_vec()));
        }
        let network = NetworkId::from_discriminant(header & 0x0f).ok_or_else(|| {
            CryptoError::InvalidAddress(format!("unknown network tag {}", header & 0x0f))
        })?;
        let expect_len = |len: usize| {
            if bytes.len() == len {
                Ok(())
            } else {
                Err(CryptoError::InvalidAddress(format!(
                    "header type {kind} expects {len} bytes, got {}",
                    bytes.len()
                )))
            }
        };

        match kind {
            0..=3 => {
                expect_len(BASE_LEN)?;
                Ok(Self::Base {
                    network,
                    payment: Credential::from_slice(&bytes[1..SINGLE_LEN], kind & 0b01 != 0)?,
                    stake: Credential::from_slice(&bytes[SINGLE_LEN..], kind & 0b10 != 0)?,
                })
            }
            TYPE_POINTER_KEY | TYPE_POINTER_SCRIPT => {
                if bytes.len() <= SINGLE_LEN {
                    return Err(CryptoError::InvalidAddress("pointer address too short".into()));
                }
                Ok(Self::Pointer {
                    network,
                    payment: Credential::from_slice(
                        &bytes[1..SINGLE_LEN],
                        kind == TYPE_POINTER_SCRIPT,
                    )?,
                    pointer: bytes[SINGLE_LEN..].to_vec(),
                })
            }
            TYPE_ENTERPRISE_KEY | TYPE_ENTERPRISE_SCRIPT => {
                expect_len(SINGLE_LEN)?;
                Ok(Self::Enterprise {
                    network,
                    payment: Credential::from_slice(&bytes[1..], kind == TYPE_ENTERPRISE_SCRIPT)?,
                })
            }
            TYPE_REWARD_KEY | TYPE_REWARD_SCRIPT => {
                expect_len(SINGLE_LEN)?;
                Ok(Self::Reward {
                    network,
                    stake: Credential::from_slice(&bytes[1..], kind == TYPE_REWARD_SCRIPT)?,
                })
            }
            other => Err(CryptoError::InvalidAddress(format!(
                "unsupported header type {other}"
            ))),
        }
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let header = |kind: u8, network: &NetworkId| (kind << 4) | network.discriminant();
        match self {
            Self::Base {
                network,
                payment,
                stake,
            } => {
                let kind = (payment.is_script() as u8) | ((stake.is_script() as u8) << 1);
                let mut out = Vec::with_capacity(BASE_LEN);
                out.push(header(kind, network));
                out.extend_from_slice(payment.as_bytes());
                out.extend_from_slice(stake.as_bytes());
                out
            }
            Self::Pointer {
                network,
                payment,
                pointer,
            } => {
                let kind = TYPE_POINTER_KEY | payment.is_script() as u8;
                let mut out = vec![header(kind, network)];
                out.extend_from_slice(payment.as_bytes());
                out.extend_from_slice(pointer);
                out
            }
            Self::Enterprise { network, payment } => {
                let kind = TYPE_ENTERPRISE_KEY | payment.is_script() as u8;
                let mut out = vec![header(kind, network)];
                out.extend_from_slice(payment.as_bytes());
                out
            }
            Self::Reward { network, stake } => {
                let kind = TYPE_REWARD_KEY | stake.is_script() as u8;
                let mut out = vec![header(kind, network)];
                out.extend_from_slice(stake.as_bytes());
                out
            }
            Self::Byron(raw) => raw.clone(),
        }
    }

    /// Network tag, or `None` for Byron addresses.
    pub fn network(&self) -> Option<NetworkId> {
        match self {
            Self::Base { network, .. }
            | Self::Pointer { network, .. }
            | Self::Enterprise { network, .. }
            | Self::Reward { network, .. } => Some(*network),
            Self::Byron(_) => None,
        }
    }

    pub fn to_bech32(&self) -> Result<String, CryptoError> {
        let hrp = self.bech32_prefix().ok_or_else(|| {
            CryptoError::InvalidAddress("Byron addresses have no bech32 form".into())
        })?;
        bech32::encode(hrp, self.to_bytes().to_base32(), Variant::Bech32)
            .map_err(|e| CryptoError::InvalidAddress(e.to_string()))
    }

    /// Parse a bech32 address and check that its prefix agrees with its header.
    pub fn from_bech32(text: &str) -> Result<Self, CryptoError> {
        let (hrp, data, variant) =
            bech32::decode(text).map_err(|e| CryptoError::InvalidAddress(e.to_string()))?;
        if variant != Variant::Bech32 {
            return Err(CryptoError::InvalidAddress("expected bech32 variant".into()));
        }
        let bytes = Vec::<u8>::from_base32(&data)
            .map_err(|e| CryptoError::InvalidAddress(e.to_string()))?;
        let address = Self::from_bytes(&bytes)?;
        let expected = address.bech32_prefix();
        if expected != Some(hrp.as_str()) {
            return Err(CryptoError::InvalidAddress(format!(
                "prefix {hrp} does not match address header"
            )));
        }
        Ok(address)
    }

    fn bech32_prefix(&self) -> Option<&'static str> {
        match self {
            Self::Reward { network, .. } => Some(network.reward_prefix()),
            Self::Byron(_) => None,
            other => other.network().map(|n| n.address_prefix()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hash(byte: u8) -> KeyHash {
        KeyHash::new([byte; KEY_HASH_LEN])
    }

    #[test]
    fn base_address_layout() {
        let addr = Address::base(NetworkId::Mainnet, hash(1), hash(2));
        let bytes = addr.to_bytes();
        assert_eq!(bytes.len(), 57);
        assert_eq!(bytes[0], 0x01);
        assert_eq!(&bytes[1..29], &[1u8; 28]);
        assert_eq!(&bytes[29..], &[2u8; 28]);
        assert_eq!(Address::from_bytes(&bytes).unwrap(), addr);
    }

    #[test]
    fn reward_address_layout() {
        let addr = Address::reward(NetworkId::Testnet, hash(3));
        let bytes = addr.to_bytes();
        assert_eq!(bytes.len(), 29);
        assert_eq!(bytes[0], 0xe0);
        assert_eq!(Address::from_bytes(&bytes).unwrap(), addr);
    }

    #[test]
    fn bech32_prefixes() {
        let base = Address::base(NetworkId::Testnet, hash(1), hash(2));
        assert!(base.to_bech32().unwrap().starts_with("addr_test1"));
        let reward = Address::reward(NetworkId::Mainnet, hash(2));
        let text = reward.to_bech32().unwrap();
        assert!(text.starts_with("stake1"));
        assert_eq!(Address::from_bech32(&text).unwrap(), reward);
    }

    #[test]
    fn script_credentials_set_type_bits() {
        let addr = Address::Base {
            network: NetworkId::Mainnet,
            payment: Credential::Key(hash(1)),
            stake: Credential::Script([2u8; 28]),
        };
        let bytes = addr.to_bytes();
        assert_eq!(bytes[0] >> 4, 2);
        assert_eq!(Address::from_bytes(&bytes).unwrap(), addr);
    }

    #[test]
    fn enterprise_and_byron() {
        let mut bytes = vec![0x61];
        bytes.extend_from_slice(&[7u8; 28]);
        let addr = Address::from_bytes(&bytes).unwrap();
        assert!(matches!(addr, Address::Enterprise { network: NetworkId::Mainnet, .. }));

        let byron = Address::from_bytes(&[0x82, 0xd8, 0x18]).unwrap();
        assert!(matches!(byron, Address::Byron(_)));
        assert_eq!(byron.network(), None);
        assert!(byron.to_bech32().is_err());
    }

    #[test]
    fn malformed_bytes_rejected() {
        assert!(Address::from_bytes(&[]).is_err());
        assert!(Address::from_bytes(&[0x01, 0x02]).is_err());
        // Network tag 5 is not a known network.
        let mut bytes = vec![0x05];
        bytes.extend_from_slice(&[0u8; 56]);
        assert!(Address::from_bytes(&bytes).is_err());
        // Header type 9 is not assigned.
        let mut bytes = vec![0x91];
        bytes.extend_from_slice(&[0u8; 28]);
        assert!(Address::from_bytes(&bytes).is_err());
    }

    #[test]
    fn mismatched_prefix_rejected() {
        let reward = Address::reward(NetworkId::Mainnet, hash(2));
        let text = bech32::encode("addr", reward.to_bytes().to_base32(), Variant::Bech32).unwrap();
        assert!(Address::from_bech32(&text).is_err());
    }
}
