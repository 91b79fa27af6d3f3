//! Wallet core for Kura.
//!
//! Provides the custody side of a light Cardano wallet:
//! - Key vault: the root key encrypted under the user's password
//! - Account derivation along `m/1852'/1815'/index'`
//! - Account store with per-network balance and history
//! - CIP-8 data signing and transaction witnessing
//! - Storage migrations between application versions

pub mod accounts;
pub mod config;
pub mod derivation;
pub mod error;
pub mod migration;
pub mod retry;
pub mod session;
pub mod settings;
pub mod signing;
pub mod state;
pub mod vault;
pub mod wallet;

pub use accounts::{AccountView, BalanceWarning, Paginate};
pub use config::WalletConfig;
pub use derivation::{request_account_key, AccountKeys};
pub use error::WalletError;
pub use migration::{compare_versions, AppliedMigration, Migrator, Registry, Version};
pub use retry::RetryPolicy;
pub use session::Session;
pub use signing::{extract_key_hash, verify_payload, verify_tx, KeyRole};
pub use state::WalletState;
pub use wallet::{create_wallet, generate_mnemonic, reset_storage};
