//! Message (COSE_Sign1) and transaction signing.
//!
//! Every call decrypts the root key, derives the two account keys and drops
//! them before returning.

use kura_crypto::{Address, CoseSign1Builder, Credential, ProtectedHeaders, Transaction, VkeyWitness};
use kura_types::{KeyHash, NetworkId};

use crate::derivation::request_account_key;
use crate::state::WalletState;
use crate::WalletError;

/// Which account key an address credential points at.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KeyRole {
    Payment,
    Stake,
}

/// Resolve raw address bytes to the key hash they commit to.
///
/// Base addresses resolve to their payment credential, reward addresses to
/// their stake credential. Script credentials, pointer, enterprise and Byron
/// addresses are [`WalletError::AddressNotPk`].
pub fn extract_key_hash(
    address: &[u8],
    network: NetworkId,
) -> Result<(KeyHash, KeyRole), WalletError> {
    let address = Address::from_bytes(address)
        .map_err(|e| WalletError::InvalidFormat(e.to_string()))?;
    match address.network() {
        Some(n) if n == network => {}
        Some(n) => {
            return Err(WalletError::InvalidFormat(format!(
                "address belongs to {n}, active network is {network}"
            )))
        }
        None => return Err(WalletError::AddressNotPk),
    }
    match address {
        Address::Base {
            payment: Credential::Key(hash),
            ..
        } => Ok((hash, KeyRole::Payment)),
        Address::Reward {
            stake: Credential::Key(hash),
            ..
        } => Ok((hash, KeyRole::Stake)),
        _ => Err(WalletError::AddressNotPk),
    }
}

/// Decode a hex payload; it must be non-empty.
pub fn verify_payload(payload_hex: &str) -> Result<Vec<u8>, WalletError> {
    match hex::decode(payload_hex) {
        Ok(bytes) if !bytes.is_empty() => Ok(bytes),
        _ => Err(WalletError::InvalidFormat("payload must be non-empty hex".into())),
    }
}

pub fn verify_tx(tx_hex: &str) -> Result<Transaction, WalletError> {
    Transaction::from_hex(tx_hex).map_err(|e| WalletError::InvalidRequest(e.to_string()))
}

fn decode_address(address_hex: &str) -> Result<Vec<u8>, WalletError> {
    hex::decode(address_hex).map_err(|_| WalletError::InvalidFormat("address is not hex".into()))
}

impl WalletState {
    /// Sign `payload_hex` with the key behind `address_hex` and return the
    /// hex encoded COSE_Sign1 envelope.
    pub async fn sign_data(
        &self,
        address_hex: &str,
        payload_hex: &str,
        password: &str,
        index: u32,
    ) -> Result<String, WalletError> {
        let address = decode_address(address_hex)?;
        let network = self.network().await?.id;
        let (hash, role) = extract_key_hash(&address, network)?;
        let payload = verify_payload(payload_hex)?;

        let keys = request_account_key(self, password, index).await?;
        let key = match role {
            KeyRole::Payment => &keys.payment,
            KeyRole::Stake => &keys.stake,
        };
        if key.key_hash() != hash {
            return Err(WalletError::ProofGeneration(
                "address does not belong to this account".into(),
            ));
        }

        let headers = ProtectedHeaders::new(&key.public_key(), &address);
        let envelope = CoseSign1Builder::new(&headers, &payload)?.sign(key)?;
        tracing::debug!(index, role = ?role, "data signed");
        Ok(hex::encode(envelope.to_bytes()?))
    }

    /// Witness `tx_hex` with the account keys matching `key_hashes`, in the
    /// order given, and return the hex encoded witness set.
    ///
    /// A hash owned by neither key fails with
    /// [`WalletError::ProofGeneration`] unless `partial_sign` is set, in
    /// which case it is skipped.
    pub async fn sign_tx(
        &self,
        tx_hex: &str,
        key_hashes: &[String],
        password: &str,
        index: u32,
        partial_sign: bool,
    ) -> Result<String, WalletError> {
        let tx = verify_tx(tx_hex)?;
        let keys = request_account_key(self, password, index).await?;
        let payment = keys.payment.key_hash().to_hex();
        let stake = keys.stake.key_hash().to_hex();
        let tx_hash = tx.hash();

        let mut witnesses = Vec::with_capacity(key_hashes.len());
        for requested in key_hashes {
            let requested = requested.to_ascii_lowercase();
            let key = if requested == payment {
                &keys.payment
            } else if requested == stake {
                &keys.stake
            } else if partial_sign {
                continue;
            } else {
                return Err(WalletError::ProofGeneration(format!(
                    "key hash {requested} is not owned by account {index}"
                )));
            };
            witnesses.push(VkeyWitness::create(&tx_hash, key));
        }

        let witness_set = tx.witness_set_with(&witnesses)?;
        tracing::debug!(index, witnesses = witnesses.len(), "transaction signed");
        Ok(hex::encode(witness_set))
    }
}
