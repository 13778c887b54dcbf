//! Plain hash functions as keyless symmetric signatures.
//!
//! The "signature" is the digest itself. It proves nothing about who
//! produced the data, only that the data didn't change in transit, so these
//! algorithms report [`AlgorithmType::Hash`].

use std::fmt;
use std::io;

use rand_core::RngCore;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256, Sha512};

use super::{check_tag, SignAlgo, Signer, SigningKey, SymmSignAlgo, SymmSignKey, Verifier, VerifyingKey};
use crate::error::Result;
use crate::info::{AlgorithmType, BaseAlgorithmInfo, SignAlgoInfo};
use crate::keys::MarshalKey;

/// Hash functions available to digest signatures and Ed25519 pre-hashing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HashFunction {
    Sha256,
    Sha512,
    Blake3,
}

impl HashFunction {
    pub fn output_len(self) -> usize {
        match self {
            HashFunction::Sha256 => 32,
            HashFunction::Sha512 => 64,
            HashFunction::Blake3 => blake3::OUT_LEN,
        }
    }

    pub fn hasher(self) -> Hasher {
        match self {
            HashFunction::Sha256 => Hasher::Sha256(Sha256::new()),
            HashFunction::Sha512 => Hasher::Sha512(Sha512::new()),
            HashFunction::Blake3 => Hasher::Blake3(Box::new(blake3::Hasher::new())),
        }
    }

    /// One-shot digest of `data`.
    pub fn digest(self, data: &[u8]) -> Vec<u8> {
        let mut hasher = self.hasher();
        hasher.update(data);
        hasher.finalize()
    }
}

impl fmt::Display for HashFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            HashFunction::Sha256 => "sha-256",
            HashFunction::Sha512 => "sha-512",
            HashFunction::Blake3 => "blake3",
        })
    }
}

/// Running hash state for one of the [`HashFunction`]s.
#[derive(Clone)]
pub enum Hasher {
    Sha256(Sha256),
    Sha512(Sha512),
    // Boxed: the BLAKE3 state is much larger than the SHA-2 ones.
    Blake3(Box<blake3::Hasher>),
}

impl Hasher {
    pub fn update(&mut self, data: &[u8]) {
        match self {
            Hasher::Sha256(h) => h.update(data),
            Hasher::Sha512(h) => h.update(data),
            Hasher::Blake3(h) => {
                h.update(data);
            }
        }
    }

    pub fn finalize(self) -> Vec<u8> {
        match self {
            Hasher::Sha256(h) => h.finalize().to_vec(),
            Hasher::Sha512(h) => h.finalize().to_vec(),
            Hasher::Blake3(h) => h.finalize().as_bytes().to_vec(),
        }
    }
}

// ---------------------------------------------------------------------------
// Algorithm
// ---------------------------------------------------------------------------

/// A [`HashFunction`] exposed as a keyless [`SymmSignAlgo`].
///
/// ```
/// use sealkit_protocol::sign::{sign_all, verify_all, DigestSignAlgo, SymmSignAlgo};
///
/// let key = DigestSignAlgo::sha256().parse_key(&[]).unwrap();
/// let digest = sign_all(key.as_ref(), b"abc").unwrap();
/// assert_eq!(hex::encode(&digest[..4]), "ba7816bf");
/// assert!(verify_all(key.as_ref(), b"abc", &digest).is_ok());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DigestSignAlgo {
    hash: HashFunction,
}

impl DigestSignAlgo {
    pub fn new(hash: HashFunction) -> Self {
        Self { hash }
    }

    pub fn sha256() -> Self {
        Self::new(HashFunction::Sha256)
    }

    pub fn sha512() -> Self {
        Self::new(HashFunction::Sha512)
    }

    pub fn blake3() -> Self {
        Self::new(HashFunction::Blake3)
    }

    pub fn hash(&self) -> HashFunction {
        self.hash
    }
}

impl SignAlgo for DigestSignAlgo {
    fn info(&self) -> SignAlgoInfo {
        SignAlgoInfo {
            base: BaseAlgorithmInfo {
                algorithm_type: AlgorithmType::Hash,
                is_secure: true,
            },
            signature_len: self.hash.output_len(),
        }
    }
}

impl SymmSignAlgo for DigestSignAlgo {
    fn generate_key(&self, _rng: &mut dyn RngCore) -> Result<Box<dyn SymmSignKey>> {
        Ok(Box::new(DigestKey::new(self.hash)))
    }

    /// Hash keys carry no material; whatever is passed in is ignored.
    fn parse_key(&self, _data: &[u8]) -> Result<Box<dyn SymmSignKey>> {
        Ok(Box::new(DigestKey::new(self.hash)))
    }
}

pub(crate) struct DigestKey {
    hash: HashFunction,
}

impl DigestKey {
    pub(crate) fn new(hash: HashFunction) -> Self {
        Self { hash }
    }
}

impl MarshalKey for DigestKey {
    fn marshal_to_writer(&self, _writer: &mut dyn io::Write) -> Result<()> {
        Ok(())
    }
}

impl SigningKey for DigestKey {
    fn make_signer(&self) -> Result<Box<dyn Signer>> {
        Ok(Box::new(DigestWorker(self.hash.hasher())))
    }
}

impl VerifyingKey for DigestKey {
    fn make_verifier(&self) -> Result<Box<dyn Verifier>> {
        Ok(Box::new(DigestWorker(self.hash.hasher())))
    }
}

struct DigestWorker(Hasher);

impl Signer for DigestWorker {
    fn update(&mut self, data: &[u8]) {
        self.0.update(data);
    }

    fn finalize(self: Box<Self>) -> Result<Vec<u8>> {
        Ok(self.0.finalize())
    }
}

impl Verifier for DigestWorker {
    fn update(&mut self, data: &[u8]) {
        self.0.update(data);
    }

    fn verify(self: Box<Self>, signature: &[u8]) -> Result<()> {
        check_tag(&self.0.finalize(), signature)
    }
}

#[cfg(test)]
mod tests {
    use rand::rngs::OsRng;

    use super::*;
    use crate::error::Error;
    use crate::sign::{sign_all, verify_all};

    #[test]
    fn test_known_digests() {
        assert_eq!(
            hex::encode(HashFunction::Sha256.digest(b"abc")),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
        assert_eq!(
            hex::encode(HashFunction::Blake3.digest(b"")),
            "af1349b9f5f9a1a6a0404dea36dcc9499bcb25c9adc112b7cc9a93cae41f3262"
        );
        assert_eq!(HashFunction::Sha512.digest(b"abc").len(), 64);
    }

    #[test]
    fn test_incremental_matches_one_shot() {
        for hash in [HashFunction::Sha256, HashFunction::Sha512, HashFunction::Blake3] {
            let key = DigestSignAlgo::new(hash).generate_key(&mut OsRng).unwrap();
            let mut signer = key.make_signer().unwrap();
            signer.update(b"hello ");
            signer.update(b"world");
            let digest = signer.finalize().unwrap();

            assert_eq!(digest, hash.digest(b"hello world"));
            assert_eq!(digest.len(), DigestSignAlgo::new(hash).info().signature_len);
        }
    }

    #[test]
    fn test_verify_rejects_other_data() {
        let key = DigestSignAlgo::blake3().parse_key(&[]).unwrap();
        let digest = sign_all(key.as_ref(), b"original").unwrap();
        assert_eq!(verify_all(key.as_ref(), b"original", &digest), Ok(()));
        assert_eq!(
            verify_all(key.as_ref(), b"modified", &digest),
            Err(Error::InvalidSignature)
        );
        assert_eq!(
            verify_all(key.as_ref(), b"original", &digest[..31]),
            Err(Error::InvalidSignature)
        );
    }

    #[test]
    fn test_hash_keys_marshal_empty() {
        let key = DigestSignAlgo::sha512().parse_key(b"ignored").unwrap();
        assert!(key.marshal_to_vec().unwrap().is_empty());
        assert_eq!(DigestSignAlgo::sha512().info().base.algorithm_type, AlgorithmType::Hash);
    }

    #[test]
    fn test_display_names() {
        assert_eq!(HashFunction::Sha256.to_string(), "sha-256");
        assert_eq!(
            serde_json::to_string(&HashFunction::Sha512).unwrap(),
            "\"sha512\""
        );
    }
}
