//! Fixed keys of the persisted wallet record.

pub const ENCRYPTED_KEY: &str = "encryptedKey";
pub const ACCOUNTS: &str = "accounts";
pub const CURRENT_ACCOUNT: &str = "currentAccount";
pub const NETWORK: &str = "network";
pub const PROVIDER: &str = "provider";
pub const CURRENCY: &str = "currency";
pub const WHITELISTED: &str = "whitelisted";
pub const MIGRATION: &str = "migration";
