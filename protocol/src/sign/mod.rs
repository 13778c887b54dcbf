//! # Signatures
//!
//! Hashes, MACs and public-key signatures behind one set of traits.
//!
//! A key makes single-use workers. Data goes into a [`Signer`] or
//! [`Verifier`] in as many `update` calls as convenient; `finalize` and
//! `verify` consume the worker, so a signature can't be produced twice
//! from one state or checked against a half-hashed message.
//!
//! Plain hashes are "symmetric signatures" with an empty key. That sounds
//! odd, but it lets one code path checksum, MAC or sign depending on what
//! algorithm the caller picked.

pub mod digest;
pub mod ed25519;
pub mod mac;

use std::sync::Arc;

use rand_core::RngCore;

pub use digest::{DigestSignAlgo, HashFunction};
pub use ed25519::Ed25519SignAlgo;
pub use mac::Blake3MacAlgo;

use crate::error::{Error, Result};
use crate::info::SignAlgoInfo;
use crate::keys::MarshalKey;

// ---------------------------------------------------------------------------
// Workers
// ---------------------------------------------------------------------------

pub trait Signer: Send {
    fn update(&mut self, data: &[u8]);

    /// Produce the signature over everything passed to `update`.
    fn finalize(self: Box<Self>) -> Result<Vec<u8>>;
}

pub trait Verifier: Send {
    fn update(&mut self, data: &[u8]);

    /// Check `signature` against everything passed to `update`. Fails with
    /// [`Error::InvalidSignature`].
    fn verify(self: Box<Self>, signature: &[u8]) -> Result<()>;
}

// ---------------------------------------------------------------------------
// Keys
// ---------------------------------------------------------------------------

pub trait SigningKey: MarshalKey + Send + Sync {
    fn make_signer(&self) -> Result<Box<dyn Signer>>;
}

pub trait VerifyingKey: MarshalKey + Send + Sync {
    fn make_verifier(&self) -> Result<Box<dyn Verifier>>;
}

/// One key that both signs and verifies (hashes, MACs).
pub trait SymmSignKey: SigningKey + VerifyingKey {}

impl<T: SigningKey + VerifyingKey + ?Sized> SymmSignKey for T {}

// ---------------------------------------------------------------------------
// Algorithms
// ---------------------------------------------------------------------------

pub trait SignAlgo: Send + Sync {
    fn info(&self) -> SignAlgoInfo;
}

pub trait SymmSignAlgo: SignAlgo {
    fn generate_key(&self, rng: &mut dyn RngCore) -> Result<Box<dyn SymmSignKey>>;
    fn parse_key(&self, data: &[u8]) -> Result<Box<dyn SymmSignKey>>;
}

pub trait AsymSignAlgo: SignAlgo {
    fn generate_key_pair(
        &self,
        rng: &mut dyn RngCore,
    ) -> Result<(Box<dyn SigningKey>, Box<dyn VerifyingKey>)>;
    fn parse_signing_key(&self, data: &[u8]) -> Result<Box<dyn SigningKey>>;
    fn parse_verifying_key(&self, data: &[u8]) -> Result<Box<dyn VerifyingKey>>;
}

impl<T: SignAlgo + ?Sized> SignAlgo for Arc<T> {
    fn info(&self) -> SignAlgoInfo {
        (**self).info()
    }
}

impl<T: SymmSignAlgo + ?Sized> SymmSignAlgo for Arc<T> {
    fn generate_key(&self, rng: &mut dyn RngCore) -> Result<Box<dyn SymmSignKey>> {
        (**self).generate_key(rng)
    }

    fn parse_key(&self, data: &[u8]) -> Result<Box<dyn SymmSignKey>> {
        (**self).parse_key(data)
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Sign `message` in one go.
pub fn sign_all<K: SigningKey + ?Sized>(key: &K, message: &[u8]) -> Result<Vec<u8>> {
    let mut signer = key.make_signer()?;
    signer.update(message);
    signer.finalize()
}

/// Verify `signature` over `message` in one go.
pub fn verify_all<K: VerifyingKey + ?Sized>(key: &K, message: &[u8], signature: &[u8]) -> Result<()> {
    let mut verifier = key.make_verifier()?;
    verifier.update(message);
    verifier.verify(signature)
}

/// Compare two byte strings without an early exit on the first difference.
pub(crate) fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

/// Shared tail of every digest-comparing verifier.
pub(crate) fn check_tag(expected: &[u8], signature: &[u8]) -> Result<()> {
    if constant_time_eq(expected, signature) {
        Ok(())
    } else {
        Err(Error::InvalidSignature)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constant_time_eq() {
        assert!(constant_time_eq(b"abc", b"abc"));
        assert!(!constant_time_eq(b"abc", b"abd"));
        assert!(!constant_time_eq(b"abc", b"ab"));
        assert!(constant_time_eq(b"", b""));
    }

    #[test]
    fn test_check_tag_maps_to_invalid_signature() {
        assert_eq!(check_tag(&[1, 2], &[1, 2]), Ok(()));
        assert_eq!(check_tag(&[1, 2], &[1, 3]), Err(Error::InvalidSignature));
    }
}
