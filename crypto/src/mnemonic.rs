//! BIP-39 mnemonic handling (English wordlist).

use bip39::Mnemonic;
use zeroize::Zeroizing;

use crate::error::CryptoError;

/// Entropy size for a 24-word phrase.
const ENTROPY_LEN: usize = 32;

/// Generate a new 24-word mnemonic from 256 bits of OS entropy.
pub fn generate_mnemonic() -> Result<Zeroizing<String>, CryptoError> {
    let mut entropy = Zeroizing::new([0u8; ENTROPY_LEN]);
    getrandom::getrandom(&mut entropy[..]).map_err(|e| CryptoError::Random(e.to_string()))?;
    let mnemonic = Mnemonic::from_entropy(&entropy[..])
        .map_err(|e| CryptoError::InvalidMnemonic(e.to_string()))?;
    Ok(Zeroizing::new(mnemonic.to_string()))
}

/// Validate a phrase's words and checksum.
pub fn validate_mnemonic(phrase: &str) -> bool {
    Mnemonic::parse_normalized(phrase).is_ok()
}

/// Recover the raw entropy encoded by a phrase.
pub fn mnemonic_to_entropy(phrase: &str) -> Result<Zeroizing<Vec<u8>>, CryptoError> {
    let mnemonic = Mnemonic::parse_normalized(phrase)
        .map_err(|e| CryptoError::InvalidMnemonic(e.to_string()))?;
    Ok(Zeroizing::new(mnemonic.to_entropy()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const ABANDON_12: &str =
        "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about";

    #[test]
    fn generate_produces_24_valid_words() {
        let phrase = generate_mnemonic().unwrap();
        assert_eq!(phrase.split_whitespace().count(), 24);
        assert!(validate_mnemonic(&phrase));
        assert_eq!(mnemonic_to_entropy(&phrase).unwrap().len(), ENTROPY_LEN);
    }

    #[test]
    fn generated_phrases_differ() {
        assert_ne!(*generate_mnemonic().unwrap(), *generate_mnemonic().unwrap());
    }

    #[test]
    fn known_phrase_entropy() {
        let entropy = mnemonic_to_entropy(ABANDON_12).unwrap();
        assert_eq!(entropy.as_slice(), &[0u8; 16]);
    }

    #[test]
    fn invalid_phrases_rejected() {
        assert!(!validate_mnemonic("not a real mnemonic phrase"));
        // Valid words, bad checksum.
        let bad = ABANDON_12.replace("about", "abandon");
        assert!(!validate_mnemonic(&bad));
        assert!(matches!(
            mnemonic_to_entropy(&bad),
            Err(CryptoError::InvalidMnemonic(_))
        ));
    }
}
