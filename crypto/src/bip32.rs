//! BIP32-Ed25519 extended keys using the Cardano V2 derivation scheme.
//!
//! An extended private key is 96 bytes: `kL (32) || kR (32) || chain code (32)`.
//! `kL || kR` is an already-expanded Ed25519 secret, so signing goes through
//! the hazmat API rather than a seed-based `ed25519_dalek::SigningKey`.

use ed25519_dalek::hazmat::{raw_sign, ExpandedSecretKey};
use ed25519_dalek::{Signature, Verifier, VerifyingKey};
use hmac::{Hmac, Mac};
use kura_types::KeyHash;
use pbkdf2::pbkdf2_hmac;
use sha2::Sha512;
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use crate::error::CryptoError;
use crate::hash::key_hash;

type HmacSha512 = Hmac<Sha512>;

/// Indices at or above this offset use hardened derivation.
pub const HARDENED_OFFSET: u32 = 0x8000_0000;

/// Rounds used to stretch BIP-39 entropy into the root key (Icarus scheme).
const ICARUS_PBKDF2_ROUNDS: u32 = 4096;

pub fn harden(index: u32) -> u32 {
    index | HARDENED_OFFSET
}

/// A 96-byte extended private key. Zeroized on drop.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct XPrv([u8; 96]);

impl XPrv {
    pub const LEN: usize = 96;

    /// Derive the root key from BIP-39 entropy (Icarus master key generation).
    pub fn from_bip39_entropy(entropy: &[u8], passphrase: &[u8]) -> Self {
        let mut out = [0u8; Self::LEN];
        pbkdf2_hmac::<Sha512>(passphrase, entropy, ICARUS_PBKDF2_ROUNDS, &mut out);
        out[0] &= 0b1111_1000;
        out[31] &= 0b0001_1111;
        out[31] |= 0b0100_0000;
        let key = Self(out);
        out.zeroize();
        key
    }

    /// Load a serialized key, checking the scalar bit layout of `kL`.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CryptoError> {
        if bytes.len() != Self::LEN {
            return Err(CryptoError::InvalidKey(format!(
                "expected {} bytes, got {}",
                Self::LEN,
                bytes.len()
            )));
        }
        if bytes[0] & 0b0000_0111 != 0 {
            return Err(CryptoError::InvalidKey("lowest bits of kL are set".into()));
        }
        if bytes[31] & 0b1110_0000 != 0b0100_0000 {
            return Err(CryptoError::InvalidKey("highest bits of kL are invalid".into()));
        }
        let mut raw = [0u8; Self::LEN];
        raw.copy_from_slice(bytes);
        let key = Self(raw);
        raw.zeroize();
        Ok(key)
    }

    pub fn as_bytes(&self) -> &[u8; 96] {
        &self.0
    }

    pub fn chain_code(&self) -> &[u8] {
        &self.0[64..]
    }

    fn expanded(&self) -> ExpandedSecretKey {
        let mut kl_kr = Zeroizing::new([0u8; 64]);
        kl_kr.copy_from_slice(&self.0[..64]);
        ExpandedSecretKey::from_bytes(&kl_kr)
    }

    pub fn public_key(&self) -> [u8; 32] {
        VerifyingKey::from(&self.expanded()).to_bytes()
    }

    /// Derive a single child. Indices `>= HARDENED_OFFSET` are hardened.
    pub fn derive(&self, index: u32) -> XPrv {
        let kl = &self.0[..32];
        let kr = &self.0[32..64];
        let cc = &self.0[64..];
        let index_bytes = index.to_le_bytes();

        let mut z_mac = HmacSha512::new_from_slice(cc).expect("HMAC accepts any key length");
        let mut i_mac = HmacSha512::new_from_slice(cc).expect("HMAC accepts any key length");

        if index >= HARDENED_OFFSET {
            z_mac.update(&[0x00]);
            z_mac.update(kl);
            z_mac.update(kr);
            i_mac.update(&[0x01]);
            i_mac.update(kl);
            i_mac.update(kr);
        } else {
            let public = self.public_key();
            z_mac.update(&[0x02]);
            z_mac.update(&public);
            i_mac.update(&[0x03]);
            i_mac.update(&public);
        }
        z_mac.update(&index_bytes);
        i_mac.update(&index_bytes);

        let mut z = Zeroizing::new([0u8; 64]);
        z.copy_from_slice(&z_mac.finalize().into_bytes());
        let mut i = Zeroizing::new([0u8; 64]);
        i.copy_from_slice(&i_mac.finalize().into_bytes());

        let mut child = [0u8; Self::LEN];
        child[..32].copy_from_slice(&add_28_mul8(kl, &z[..28]));
        child[32..64].copy_from_slice(&add_256(kr, &z[32..]));
        child[64..].copy_from_slice(&i[32..]);
        let key = XPrv(child);
        child.zeroize();
        key
    }

    pub fn derive_path(&self, path: &[u32]) -> XPrv {
        path.iter()
            .fold(self.clone(), |key, &index| key.derive(index))
    }

    pub fn to_signing_key(&self) -> SigningKey {
        let expanded = self.expanded();
        let public = VerifyingKey::from(&expanded);
        SigningKey { expanded, public }
    }
}

impl std::fmt::Debug for XPrv {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "XPrv(<redacted>)")
    }
}

/// `x + 8 * y` where `y` is 28 bytes, little-endian, keeping 256 bits.
fn add_28_mul8(x: &[u8], y: &[u8]) -> [u8; 32] {
    let mut out = [0u8; 32];
    let mut carry: u16 = 0;
    for i in 0..28 {
        let r = x[i] as u16 + ((y[i] as u16) << 3) + carry;
        out[i] = (r & 0xff) as u8;
        carry = r >> 8;
    }
    for i in 28..32 {
        let r = x[i] as u16 + carry;
        out[i] = (r & 0xff) as u8;
        carry = r >> 8;
    }
    out
}

/// `x + y mod 2^256`, little-endian.
fn add_256(x: &[u8], y: &[u8]) -> [u8; 32] {
    let mut out = [0u8; 32];
    let mut carry: u16 = 0;
    for i in 0..32 {
        let r = x[i] as u16 + y[i] as u16 + carry;
        out[i] = r as u8;
        carry = r >> 8;
    }
    out
}

/// Raw (non-extended) signing key: `kL || kR` plus its public key.
///
/// The expanded secret zeroizes itself on drop.
pub struct SigningKey {
    expanded: ExpandedSecretKey,
    public: VerifyingKey,
}

impl SigningKey {
    pub fn public_key(&self) -> [u8; 32] {
        self.public.to_bytes()
    }

    pub fn key_hash(&self) -> KeyHash {
        key_hash(&self.public.to_bytes())
    }

    pub fn sign(&self, message: &[u8]) -> [u8; 64] {
        raw_sign::<Sha512>(&self.expanded, message, &self.public).to_bytes()
    }
}

impl std::fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SigningKey")
            .field("public", &hex::encode(self.public.to_bytes()))
            .finish_non_exhaustive()
    }
}

/// Verify an Ed25519 signature against a raw public key.
pub fn verify(public_key: &[u8; 32], message: &[u8], signature: &[u8; 64]) -> bool {
    let Ok(vk) = VerifyingKey::from_bytes(public_key) else {
        return false;
    };
    vk.verify(message, &Signature::from_bytes(signature)).is_ok()
}
