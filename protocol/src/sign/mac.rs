//! Keyed BLAKE3 as a message authentication code.

use std::io;

use rand_core::RngCore;
use zeroize::Zeroizing;

use super::{check_tag, SignAlgo, Signer, SigningKey, SymmSignAlgo, SymmSignKey, Verifier, VerifyingKey};
use crate::config::BLAKE3_MAC_KEY_LENGTH;
use crate::error::{Error, Result};
use crate::info::{AlgorithmType, BaseAlgorithmInfo, SignAlgoInfo};
use crate::keys::MarshalKey;
use crate::rng;

/// BLAKE3 in keyed mode. Keys are 32 bytes, tags are 32 bytes.
#[derive(Debug, Clone, Copy, Default)]
pub struct Blake3MacAlgo;

impl SignAlgo for Blake3MacAlgo {
    fn info(&self) -> SignAlgoInfo {
        SignAlgoInfo {
            base: BaseAlgorithmInfo {
                algorithm_type: AlgorithmType::SymmSign,
                is_secure: true,
            },
            signature_len: blake3::OUT_LEN,
        }
    }
}

impl SymmSignAlgo for Blake3MacAlgo {
    fn generate_key(&self, rng: &mut dyn RngCore) -> Result<Box<dyn SymmSignKey>> {
        let mut key = Zeroizing::new([0u8; BLAKE3_MAC_KEY_LENGTH]);
        rng::fill(rng, &mut key[..])?;
        Ok(Box::new(MacKey::new(*key)))
    }

    fn parse_key(&self, data: &[u8]) -> Result<Box<dyn SymmSignKey>> {
        let key: [u8; BLAKE3_MAC_KEY_LENGTH] = data.try_into().map_err(|_| Error::KeyParse)?;
        Ok(Box::new(MacKey::new(key)))
    }
}

pub(crate) struct MacKey {
    key: Zeroizing<[u8; BLAKE3_MAC_KEY_LENGTH]>,
}

impl MacKey {
    pub(crate) fn new(key: [u8; BLAKE3_MAC_KEY_LENGTH]) -> Self {
        Self {
            key: Zeroizing::new(key),
        }
    }

    fn worker(&self) -> Box<MacWorker> {
        Box::new(MacWorker(blake3::Hasher::new_keyed(&self.key)))
    }
}

impl MarshalKey for MacKey {
    fn marshal_to_writer(&self, writer: &mut dyn io::Write) -> Result<()> {
        writer.write_all(&self.key[..])?;
        Ok(())
    }
}

impl SigningKey for MacKey {
    fn make_signer(&self) -> Result<Box<dyn Signer>> {
        Ok(self.worker())
    }
}

impl VerifyingKey for MacKey {
    fn make_verifier(&self) -> Result<Box<dyn Verifier>> {
        Ok(self.worker())
    }
}

struct MacWorker(blake3::Hasher);

impl Signer for MacWorker {
    fn update(&mut self, data: &[u8]) {
        self.0.update(data);
    }

    fn finalize(self: Box<Self>) -> Result<Vec<u8>> {
        Ok(self.0.finalize().as_bytes().to_vec())
    }
}

impl Verifier for MacWorker {
    fn update(&mut self, data: &[u8]) {
        self.0.update(data);
    }

    fn verify(self: Box<Self>, signature: &[u8]) -> Result<()> {
        check_tag(self.0.finalize().as_bytes(), signature)
    }
}

#[cfg(test)]
mod tests {
    use rand::rngs::OsRng;

    use super::*;
    use crate::sign::{sign_all, verify_all};

    #[test]
    fn test_tag_matches_blake3_keyed_hash() {
        let raw = [7u8; 32];
        let key = Blake3MacAlgo.parse_key(&raw).unwrap();
        let tag = sign_all(key.as_ref(), b"message").unwrap();
        assert_eq!(tag, blake3::keyed_hash(&raw, b"message").as_bytes().to_vec());
        assert_eq!(verify_all(key.as_ref(), b"message", &tag), Ok(()));
    }

    #[test]
    fn test_other_key_rejects_tag() {
        let a = Blake3MacAlgo.generate_key(&mut OsRng).unwrap();
        let b = Blake3MacAlgo.generate_key(&mut OsRng).unwrap();
        let tag = sign_all(a.as_ref(), b"message").unwrap();
        assert_eq!(
            verify_all(b.as_ref(), b"message", &tag),
            Err(Error::InvalidSignature)
        );
    }

    #[test]
    fn test_key_length_is_enforced() {
        assert!(matches!(Blake3MacAlgo.parse_key(&[0u8; 31]), Err(Error::KeyParse)));
        let key = Blake3MacAlgo.generate_key(&mut OsRng).unwrap();
        let raw = key.marshal_to_vec().unwrap();
        assert_eq!(raw.len(), BLAKE3_MAC_KEY_LENGTH);
        assert!(Blake3MacAlgo.parse_key(&raw).is_ok());
    }
}
