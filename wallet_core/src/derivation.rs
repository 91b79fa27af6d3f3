//! Account key derivation along `m/1852'/1815'/account'/role/0`.

use kura_crypto::{harden, Address, SigningKey, XPrv};
use kura_types::{Account, NetworkId};

use crate::state::WalletState;
use crate::vault;
use crate::WalletError;

pub const PURPOSE: u32 = 1852;
pub const COIN_TYPE: u32 = 1815;
pub const ROLE_EXTERNAL: u32 = 0;
pub const ROLE_STAKING: u32 = 2;

/// The two leaf signing keys of one account.
pub struct AccountKeys {
    pub payment: SigningKey,
    pub stake: SigningKey,
}

impl AccountKeys {
    pub fn derive(root: &XPrv, index: u32) -> Self {
        let account = root.derive_path(&[harden(PURPOSE), harden(COIN_TYPE), harden(index)]);
        Self {
            payment: account.derive_path(&[ROLE_EXTERNAL, 0]).to_signing_key(),
            stake: account.derive_path(&[ROLE_STAKING, 0]).to_signing_key(),
        }
    }
}

/// Decrypt the root key and derive the keys of account `index`.
///
/// The root and intermediate keys are wiped before this returns.
pub async fn request_account_key(
    state: &WalletState,
    password: &str,
    index: u32,
) -> Result<AccountKeys, WalletError> {
    let blob = state.encrypted_key().await?;
    let root = vault::decrypt_root_key(password, &blob)?;
    Ok(AccountKeys::derive(&root, index))
}

pub fn base_address(account: &Account, network: NetworkId) -> Address {
    Address::base(network, account.payment_key_hash, account.stake_key_hash)
}

pub fn reward_address(account: &Account, network: NetworkId) -> Address {
    Address::reward(network, account.stake_key_hash)
}
