//! Fundamental types for the Kura wallet core.
//!
//! This crate defines the types shared across every other crate in the workspace:
//! network identifiers, key hashes, persisted account records, asset amounts and
//! the migration record.

pub mod account;
pub mod amount;
pub mod error;
pub mod hash;
pub mod migration;
pub mod network;
pub mod provider;

pub use account::{Account, History, NetworkState, TxDetail};
pub use amount::{AssetAmount, LOVELACE};
pub use error::TypesError;
pub use hash::{KeyHash, KEY_HASH_LEN};
pub use migration::MigrationRecord;
pub use network::{NetworkConfig, NetworkId};
pub use provider::ProviderId;
