//! Cryptographic primitives for the Kura wallet core.
//!
//! - **BIP32-Ed25519** (Cardano V2 scheme) for hierarchical key derivation
//! - **Ed25519** extended-key signing and verification
//! - **Blake2b** for key hashes (224-bit) and transaction hashes (256-bit)
//! - **PBKDF2 + ChaCha20-Poly1305** password-based encryption of the root key
//! - Shelley address binary/bech32 codec, Byron base58 addresses
//! - CBOR transaction parsing, multi-asset values and COSE_Sign1 envelopes

pub mod address;
pub mod bip32;
pub mod byron;
pub mod cose;
pub mod encryption;
pub mod error;
pub mod hash;
pub mod mnemonic;
pub mod transaction;
pub mod value;

pub use address::{Address, Credential};
pub use byron::ByronAddress;
pub use bip32::{harden, verify, SigningKey, XPrv, HARDENED_OFFSET};
pub use cose::{sig_structure, CoseSign1, CoseSign1Builder, ProtectedHeaders};
pub use encryption::{decrypt_with_password, encrypt_with_password, encrypt_with_salt_nonce};
pub use error::CryptoError;
pub use hash::{blake2b_224, blake2b_256, key_hash};
pub use mnemonic::{generate_mnemonic, mnemonic_to_entropy, validate_mnemonic};
pub use transaction::{Transaction, VkeyWitness};
pub use value::{decode_value, decode_value_hex};
