//! Blake2b hashing for key hashes and transaction hashes.

use blake2::digest::consts::{U28, U32};
use blake2::{Blake2b, Digest};
use kura_types::KeyHash;

type Blake2b224 = Blake2b<U28>;
type Blake2b256 = Blake2b<U32>;

/// Compute a 224-bit Blake2b hash (credential size).
pub fn blake2b_224(data: &[u8]) -> [u8; 28] {
    let mut hasher = Blake2b224::new();
    hasher.update(data);
    let result = hasher.finalize();
    let mut output = [0u8; 28];
    output.copy_from_slice(&result);
    output
}

/// Compute a 256-bit Blake2b hash (transaction id size).
pub fn blake2b_256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Blake2b256::new();
    hasher.update(data);
    let result = hasher.finalize();
    let mut output = [0u8; 32];
    output.copy_from_slice(&result);
    output
}

/// Hash an Ed25519 public key into its credential.
pub fn key_hash(public_key: &[u8; 32]) -> KeyHash {
    KeyHash::new(blake2b_224(public_key))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digest_sizes() {
        assert_eq!(blake2b_224(b"kura").len(), 28);
        assert_eq!(blake2b_256(b"kura").len(), 32);
    }

    #[test]
    fn blake2b_256_empty_vector() {
        // RFC 7693 / reference implementation output for the empty message.
        assert_eq!(
            hex::encode(blake2b_256(b"")),
            "0e5751c026e543b2e8ab2eb06099daa1d1e5df47778f7787faab45cdf12fe3a8"
        );
    }

    #[test]
    fn key_hash_is_blake2b_224_of_public_key() {
        let pk = [9u8; 32];
        assert_eq!(key_hash(&pk).as_bytes(), &blake2b_224(&pk));
    }

    #[test]
    fn different_inputs_differ() {
        assert_ne!(blake2b_224(b"payment"), blake2b_224(b"stake"));
    }
}
