//! Password-gated storage of the root key.
//!
//! Every decryption failure (wrong password, truncated or tampered blob,
//! malformed key bytes) surfaces as [`WalletError::WrongPassword`].

use kura_crypto::{decrypt_with_password, encrypt_with_password, XPrv};

use crate::WalletError;

/// Encrypt the root key under `password`. Fresh salt and nonce per call.
pub fn encrypt_root_key(password: &str, root: &XPrv) -> Result<String, WalletError> {
    Ok(encrypt_with_password(password.as_bytes(), root.as_bytes())?)
}

pub fn decrypt_root_key(password: &str, blob: &str) -> Result<XPrv, WalletError> {
    let plaintext = decrypt_with_password(password.as_bytes(), blob)?;
    XPrv::from_bytes(&plaintext).map_err(|_| WalletError::WrongPassword)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn root() -> XPrv {
        XPrv::from_bip39_entropy(&[7u8; 32], b"")
    }

    #[test]
    fn round_trip_restores_the_key() {
        let root = root();
        let blob = encrypt_root_key("correct horse", &root).unwrap();
        let restored = decrypt_root_key("correct horse", &blob).unwrap();
        assert_eq!(restored.as_bytes(), root.as_bytes());
    }

    #[test]
    fn encryption_is_randomised() {
        let root = root();
        let a = encrypt_root_key("pw", &root).unwrap();
        let b = encrypt_root_key("pw", &root).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn wrong_password_and_corruption_are_indistinguishable() {
        let blob = encrypt_root_key("pw", &root()).unwrap();
        assert!(matches!(
            decrypt_root_key("nope", &blob),
            Err(WalletError::WrongPassword)
        ));
        assert!(matches!(
            decrypt_root_key("pw", &blob[..40]),
            Err(WalletError::WrongPassword)
        ));
        assert!(matches!(
            decrypt_root_key("pw", "zz"),
            Err(WalletError::WrongPassword)
        ));
    }

    #[test]
    fn non_key_plaintext_is_rejected_as_wrong_password() {
        let blob = encrypt_with_password(b"pw", &[0u8; 10]).unwrap();
        assert!(matches!(
            decrypt_root_key("pw", &blob),
            Err(WalletError::WrongPassword)
        ));
    }
}
