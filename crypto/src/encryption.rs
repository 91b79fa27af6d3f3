//! Password-based encryption of the root key.
//!
//! Blob layout (hex-encoded): `salt (32) || nonce (12) || tag (16) || ciphertext`.
//! The symmetric key is PBKDF2-HMAC-SHA512 over the password with 19 162
//! iterations, and the cipher is ChaCha20-Poly1305. This is the layout used by
//! existing Cardano light wallets, so vaults written elsewhere decrypt here.

use chacha20poly1305::{
    aead::{Aead, KeyInit},
    ChaCha20Poly1305, Nonce,
};
use pbkdf2::pbkdf2_hmac;
use sha2::Sha512;
use zeroize::Zeroizing;

use crate::error::CryptoError;

pub const SALT_LEN: usize = 32;
pub const NONCE_LEN: usize = 12;
pub const TAG_LEN: usize = 16;
const KEY_LEN: usize = 32;
const PBKDF2_ROUNDS: u32 = 19_162;

const HEADER_LEN: usize = SALT_LEN + NONCE_LEN + TAG_LEN;

fn derive_key(password: &[u8], salt: &[u8]) -> Zeroizing<[u8; KEY_LEN]> {
    let mut key = Zeroizing::new([0u8; KEY_LEN]);
    pbkdf2_hmac::<Sha512>(password, salt, PBKDF2_ROUNDS, &mut key[..]);
    key
}

fn random_bytes<const N: usize>() -> Result<[u8; N], CryptoError> {
    let mut buf = [0u8; N];
    getrandom::getrandom(&mut buf).map_err(|e| CryptoError::Random(e.to_string()))?;
    Ok(buf)
}

/// Encrypt `plaintext` under `password` with a fresh random salt and nonce.
pub fn encrypt_with_password(password: &[u8], plaintext: &[u8]) -> Result<String, CryptoError> {
    let salt = random_bytes::<SALT_LEN>()?;
    let nonce = random_bytes::<NONCE_LEN>()?;
    encrypt_with_salt_nonce(password, &salt, &nonce, plaintext)
}

/// Deterministic variant of [`encrypt_with_password`] for known-answer tests.
pub fn encrypt_with_salt_nonce(
    password: &[u8],
    salt: &[u8; SALT_LEN],
    nonce: &[u8; NONCE_LEN],
    plaintext: &[u8],
) -> Result<String, CryptoError> {
    let key = derive_key(password, salt);
    let cipher =
        ChaCha20Poly1305::new_from_slice(&key[..]).map_err(|_| CryptoError::Encryption)?;
    let sealed = cipher
        .encrypt(&Nonce::from(*nonce), plaintext)
        .map_err(|_| CryptoError::Encryption)?;

    // AEAD output is ciphertext || tag; the blob stores the tag first.
    let (ciphertext, tag) = sealed.split_at(sealed.len() - TAG_LEN);
    let mut blob = Vec::with_capacity(HEADER_LEN + ciphertext.len());
    blob.extend_from_slice(salt);
    blob.extend_from_slice(nonce);
    blob.extend_from_slice(tag);
    blob.extend_from_slice(ciphertext);
    Ok(hex::encode(blob))
}

/// Decrypt a hex blob produced by [`encrypt_with_password`].
///
/// Every failure (bad hex, short blob, wrong password, tampering) maps to
/// [`CryptoError::Decryption`].
pub fn decrypt_with_password(
    password: &[u8],
    blob_hex: &str,
) -> Result<Zeroizing<Vec<u8>>, CryptoError> {
    let blob = hex::decode(blob_hex).map_err(|_| CryptoError::Decryption)?;
    if blob.len() < HEADER_LEN {
        return Err(CryptoError::Decryption);
    }
    let (salt, rest) = blob.split_at(SALT_LEN);
    let (nonce, rest) = rest.split_at(NONCE_LEN);
    let (tag, ciphertext) = rest.split_at(TAG_LEN);

    let mut sealed = Vec::with_capacity(ciphertext.len() + TAG_LEN);
    sealed.extend_from_slice(ciphertext);
    sealed.extend_from_slice(tag);

    let key = derive_key(password, salt);
    let cipher =
        ChaCha20Poly1305::new_from_slice(&key[..]).map_err(|_| CryptoError::Decryption)?;
    cipher
        .decrypt(Nonce::from_slice(nonce), sealed.as_slice())
        .map(Zeroizing::new)
        .map_err(|_| CryptoError::Decryption)
}
