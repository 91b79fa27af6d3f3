use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CryptoError {
    /// Key derivation or authenticated decryption failed. Deliberately carries
    /// no detail: a wrong password and a corrupted blob look the same.
    #[error("decryption failed")]
    Decryption,

    #[error("encryption failed")]
    Encryption,

    #[error("random source unavailable: {0}")]
    Random(String),

    #[error("invalid key material: {0}")]
    InvalidKey(String),

    #[error("invalid mnemonic: {0}")]
    InvalidMnemonic(String),

    #[error("invalid address: {0}")]
    InvalidAddress(String),

    #[error("invalid CBOR: {0}")]
    Cbor(String),
}
