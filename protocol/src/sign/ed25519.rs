//! # Ed25519 Signatures
//!
//! Ed25519 over `ed25519-dalek`, with a twist: the message is first run
//! through a *compressor* (any [`SigningKey`], normally a plain hash) and
//! only the compressed output is signed. That lets signers and verifiers
//! stream arbitrarily large inputs through `update` without buffering them.
//!
//! The consequence is that signatures are over `compress(message)`, not
//! `message`. They only verify with the same compressor on the other side.
//!
//! Verification is strict (`verify_strict`): small-order public keys and
//! non-canonical encodings are rejected.
//!
//! Signing keys marshal to the 32-byte seed, verifying keys to the 32-byte
//! compressed point.

use std::io;
use std::sync::Arc;

use ed25519_dalek as dalek;
use ed25519_dalek::Signer as _;
use rand_core::RngCore;
use zeroize::Zeroizing;

use super::digest::{DigestKey, HashFunction};
use super::{AsymSignAlgo, SignAlgo, Signer, SigningKey, Verifier, VerifyingKey};
use crate::config::{ED25519_PUBLIC_KEY_LENGTH, ED25519_SECRET_KEY_LENGTH, ED25519_SIGNATURE_LENGTH};
use crate::error::{Error, Result};
use crate::info::{AlgorithmType, BaseAlgorithmInfo, SignAlgoInfo};
use crate::keys::MarshalKey;
use crate::rng;

/// Ed25519 signing of compressed messages.
///
/// ```
/// use sealkit_protocol::sign::{sign_all, verify_all, AsymSignAlgo, Ed25519SignAlgo, HashFunction};
///
/// let algo = Ed25519SignAlgo::with_hash(HashFunction::Sha512);
/// let (sk, vk) = algo.generate_key_pair(&mut rand::rngs::OsRng).unwrap();
///
/// let signature = sign_all(sk.as_ref(), b"release v1.2.0").unwrap();
/// assert_eq!(signature.len(), 64);
/// assert!(verify_all(vk.as_ref(), b"release v1.2.0", &signature).is_ok());
/// assert!(verify_all(vk.as_ref(), b"release v1.2.1", &signature).is_err());
/// ```
#[derive(Clone)]
pub struct Ed25519SignAlgo {
    compressor: Arc<dyn SigningKey>,
}

impl Ed25519SignAlgo {
    pub fn new(compressor: Arc<dyn SigningKey>) -> Self {
        Self { compressor }
    }

    /// Compress with a plain hash function.
    pub fn with_hash(hash: HashFunction) -> Self {
        Self::new(Arc::new(DigestKey::new(hash)))
    }

    fn signing_key(&self, key: dalek::SigningKey) -> Box<dyn SigningKey> {
        Box::new(Ed25519SigningKey {
            compressor: Arc::clone(&self.compressor),
            key: Arc::new(key),
        })
    }

    fn verifying_key(&self, key: dalek::VerifyingKey) -> Box<dyn VerifyingKey> {
        Box::new(Ed25519VerifyingKey {
            compressor: Arc::clone(&self.compressor),
            key,
        })
    }
}

impl SignAlgo for Ed25519SignAlgo {
    fn info(&self) -> SignAlgoInfo {
        SignAlgoInfo {
            base: BaseAlgorithmInfo {
                algorithm_type: AlgorithmType::AsymSign,
                is_secure: true,
            },
            signature_len: ED25519_SIGNATURE_LENGTH,
        }
    }
}

impl AsymSignAlgo for Ed25519SignAlgo {
    fn generate_key_pair(
        &self,
        rng: &mut dyn RngCore,
    ) -> Result<(Box<dyn SigningKey>, Box<dyn VerifyingKey>)> {
        let mut seed = Zeroizing::new([0u8; ED25519_SECRET_KEY_LENGTH]);
        rng::fill(rng, &mut seed[..])?;
        let key = dalek::SigningKey::from_bytes(&seed);
        let public = key.verifying_key();
        Ok((self.signing_key(key), self.verifying_key(public)))
    }

    fn parse_signing_key(&self, data: &[u8]) -> Result<Box<dyn SigningKey>> {
        let seed: [u8; ED25519_SECRET_KEY_LENGTH] = data.try_into().map_err(|_| Error::KeyParse)?;
        let seed = Zeroizing::new(seed);
        Ok(self.signing_key(dalek::SigningKey::from_bytes(&seed)))
    }

    fn parse_verifying_key(&self, data: &[u8]) -> Result<Box<dyn VerifyingKey>> {
        let bytes: [u8; ED25519_PUBLIC_KEY_LENGTH] = data.try_into().map_err(|_| Error::KeyParse)?;
        let key = dalek::VerifyingKey::from_bytes(&bytes).map_err(|_| Error::KeyParse)?;
        Ok(self.verifying_key(key))
    }
}

// ---------------------------------------------------------------------------
// Keys
// ---------------------------------------------------------------------------

struct Ed25519SigningKey {
    compressor: Arc<dyn SigningKey>,
    key: Arc<dalek::SigningKey>,
}

struct Ed25519VerifyingKey {
    compressor: Arc<dyn SigningKey>,
    key: dalek::VerifyingKey,
}

impl MarshalKey for Ed25519SigningKey {
    fn marshal_to_writer(&self, writer: &mut dyn io::Write) -> Result<()> {
        let seed = Zeroizing::new(self.key.to_bytes());
        writer.write_all(&seed[..])?;
        Ok(())
    }
}

impl MarshalKey for Ed25519VerifyingKey {
    fn marshal_to_writer(&self, writer: &mut dyn io::Write) -> Result<()> {
        writer.write_all(self.key.as_bytes())?;
        Ok(())
    }
}

impl SigningKey for Ed25519SigningKey {
    fn make_signer(&self) -> Result<Box<dyn Signer>> {
        Ok(Box::new(Ed25519Signer {
            compressor: self.compressor.make_signer()?,
            key: Arc::clone(&self.key),
        }))
    }
}

impl VerifyingKey for Ed25519VerifyingKey {
    fn make_verifier(&self) -> Result<Box<dyn Verifier>> {
        // The verifier recomputes the compressed message with a signer.
        Ok(Box::new(Ed25519Verifier {
            compressor: self.compressor.make_signer()?,
            key: self.key,
        }))
    }
}

// ---------------------------------------------------------------------------
// Workers
// ---------------------------------------------------------------------------

struct Ed25519Signer {
    compressor: Box<dyn Signer>,
    key: Arc<dalek::SigningKey>,
}

impl Signer for Ed25519Signer {
    fn update(&mut self, data: &[u8]) {
        self.compressor.update(data);
    }

    fn finalize(self: Box<Self>) -> Result<Vec<u8>> {
        let Self { compressor, key } = *self;
        let compressed = compressor.finalize()?;
        Ok(key.sign(&compressed).to_bytes().to_vec())
    }
}

struct Ed25519Verifier {
    compressor: Box<dyn Signer>,
    key: dalek::VerifyingKey,
}

impl Verifier for Ed25519Verifier {
    fn update(&mut self, data: &[u8]) {
        self.compressor.update(data);
    }

    fn verify(self: Box<Self>, signature: &[u8]) -> Result<()> {
        let signature = dalek::Signature::from_slice(signature).map_err(|_| Error::InvalidSignature)?;
        let Self { compressor, key } = *self;
        let compressed = compressor.finalize()?;
        key.verify_strict(&compressed, &signature)
            .map_err(|_| Error::InvalidSignature)
    }
}
