use kura_crypto::CryptoError;
use kura_provider::ProviderError;
use kura_store::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WalletError {
    /// Key derivation or authenticated decryption failed. Never says which.
    #[error("wrong password")]
    WrongPassword,

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("internal error: {0}")]
    InternalError(String),

    #[error("proof generation failed: {0}")]
    ProofGeneration(String),

    #[error("invalid address format: {0}")]
    InvalidFormat(String),

    #[error("address is not a public-key address")]
    AddressNotPk,

    #[error("cannot delete the only account")]
    OnlyOneAccount,

    #[error("wallet storage already holds a key")]
    StoreNotEmpty,

    #[error("wallet has not been created")]
    NotInitialized,

    #[error("account {0} not found")]
    AccountNotFound(u32),

    #[error("session is locked")]
    SessionLocked,

    #[error("session expired")]
    SessionExpired,

    #[error("invalid mnemonic")]
    InvalidMnemonic,

    #[error("migration {version} requires the wallet password")]
    PasswordRequired { version: String },

    #[error("invalid version string: {0}")]
    InvalidVersion(String),

    #[error("migration {version} cannot be reverted: completed list ends with {tail:?}")]
    MigrationOrder {
        version: String,
        tail: Option<String>,
    },

    #[error("transaction rejected by the node")]
    TxSendFailure,

    #[error("transaction submission refused")]
    TxSendRefused,

    #[error("gave up after {attempts} attempts")]
    RetryExhausted { attempts: u32 },

    #[error("operation cancelled")]
    Cancelled,

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("configuration error: {0}")]
    Config(String),
}

impl From<ProviderError> for WalletError {
    fn from(e: ProviderError) -> Self {
        match e {
            ProviderError::InvalidRequest => Self::InvalidRequest("rejected by provider".into()),
            ProviderError::InternalError => Self::InternalError("provider failure".into()),
            ProviderError::TxSendFailure => Self::TxSendFailure,
            ProviderError::TxSendRefused => Self::TxSendRefused,
            other => Self::InternalError(other.to_string()),
        }
    }
}

impl From<CryptoError> for WalletError {
    fn from(e: CryptoError) -> Self {
        match e {
            CryptoError::Decryption => Self::WrongPassword,
            CryptoError::InvalidMnemonic(_) => Self::InvalidMnemonic,
            CryptoError::InvalidAddress(msg) => Self::InvalidFormat(msg),
            CryptoError::Cbor(msg) => Self::InvalidRequest(msg),
            other => Self::InternalError(other.to_string()),
        }
    }
}
