//! # AEAD Symmetric Encryption
//!
//! Turns any RustCrypto AEAD (AES-GCM, ChaCha20-Poly1305, ...) plus a nonce
//! strategy into an [`EncSymmAlgo`].
//!
//! The nonce strategy decides the encryption type:
//!
//! - **RNG nonces** give [`EncType::Block`]. Every ciphertext is
//!   `seal_output || nonce`, so the decryptor needs nothing but the bytes in
//!   front of it and blocks can be opened in any order.
//! - **Counter nonces** give [`EncType::Chain`]. Ciphertext is just the seal
//!   output; both sides count in lockstep. Drop or reorder a chunk and the
//!   next open fails.
//!
//! Either way the algorithm reports [`AuthMode::LateSoft`]: a wrong key or a
//! flipped bit is caught, but nothing here notices a message that simply
//! stops early. Wrap it in [`crate::enc::stream`] for that.
//!
//! No associated data is used. Each AEAD call authenticates exactly one
//! `encrypt` input.

use std::io;
use std::marker::PhantomData;

use aes_gcm::aead::generic_array::typenum::Unsigned;
use aes_gcm::aead::{Aead, AeadCore, KeyInit, Nonce};
use aes_gcm::{Aes128Gcm, Aes256Gcm};
use chacha20poly1305::{ChaCha20Poly1305, XChaCha20Poly1305};
use rand_core::RngCore;
use zeroize::Zeroizing;

use crate::error::{Error, Result};
use crate::info::{AlgorithmType, AuthMode, BaseAlgorithmInfo, EncAlgoInfo, EncInfo, EncType};
use crate::keys::{DecKey, Decryptor, EncAlgo, EncKey, EncSymmAlgo, EncSymmKey, Encryptor, MarshalKey};
use crate::lifecycle::Lifecycle;
use crate::nonce::{NonceConfig, NonceManager, NonceType};
use crate::rng;

/// Bounds every cipher plugged into [`AeadSymmAlgo`] must satisfy.
pub trait AeadCipher: Aead + KeyInit + Send + Sync + 'static {}

impl<C: Aead + KeyInit + Send + Sync + 'static> AeadCipher for C {}

pub type Aes128GcmAlgo = AeadSymmAlgo<Aes128Gcm>;
pub type Aes256GcmAlgo = AeadSymmAlgo<Aes256Gcm>;
pub type ChaCha20Poly1305Algo = AeadSymmAlgo<ChaCha20Poly1305>;
pub type XChaCha20Poly1305Algo = AeadSymmAlgo<XChaCha20Poly1305>;

fn enc_type_for(nonce_type: NonceType) -> EncType {
    match nonce_type {
        NonceType::Rng => EncType::Block,
        NonceType::Counter => EncType::Chain,
    }
}

// ---------------------------------------------------------------------------
// Algorithm
// ---------------------------------------------------------------------------

/// AEAD cipher `C` driven by a nonce strategy.
///
/// # Example
///
/// ```
/// use sealkit_protocol::enc::aead::Aes256GcmAlgo;
/// use sealkit_protocol::keys::{decrypt_all, encrypt_all, EncSymmAlgo};
///
/// let algo = Aes256GcmAlgo::rng();
/// let key = algo.generate_key(&mut rand::rngs::OsRng).unwrap();
///
/// let sealed = encrypt_all(key.as_ref(), b"attack at dawn").unwrap();
/// assert_eq!(decrypt_all(key.as_ref(), &sealed).unwrap(), b"attack at dawn");
/// ```
pub struct AeadSymmAlgo<C> {
    nonce_config: NonceConfig,
    _cipher: PhantomData<fn() -> C>,
}

impl<C> Clone for AeadSymmAlgo<C> {
    fn clone(&self) -> Self {
        Self::new(self.nonce_config)
    }
}

impl<C> AeadSymmAlgo<C> {
    pub fn new(nonce_config: NonceConfig) -> Self {
        Self {
            nonce_config,
            _cipher: PhantomData,
        }
    }

    /// Chain-type variant with counter nonces.
    pub fn counter() -> Self {
        Self::new(NonceConfig::counter())
    }

    /// Block-type variant with random nonces embedded in each ciphertext.
    pub fn rng() -> Self {
        Self::new(NonceConfig::rng())
    }

    pub fn nonce_config(&self) -> NonceConfig {
        self.nonce_config
    }
}

impl<C: AeadCipher> AeadSymmAlgo<C> {
    pub fn key_len(&self) -> usize {
        <C::KeySize as Unsigned>::USIZE
    }

    pub fn nonce_len(&self) -> usize {
        <<C as AeadCore>::NonceSize as Unsigned>::USIZE
    }

    fn make_key(&self, material: Zeroizing<Vec<u8>>) -> Box<dyn EncSymmKey> {
        Box::new(AeadSymmKey::<C> {
            key: material,
            nonce_config: self.nonce_config,
            _cipher: PhantomData,
        })
    }
}

impl<C: AeadCipher> EncAlgo for AeadSymmAlgo<C> {
    fn info(&self) -> EncAlgoInfo {
        EncAlgoInfo {
            base: BaseAlgorithmInfo {
                algorithm_type: AlgorithmType::SymmEnc,
                is_secure: true,
            },
            enc: EncInfo {
                enc_type: enc_type_for(self.nonce_config.nonce_type),
                requires_finalization: false,
            },
            auth_mode: AuthMode::LateSoft,
        }
    }
}

impl<C: AeadCipher> EncSymmAlgo for AeadSymmAlgo<C> {
    fn generate_key(&self, rng: &mut dyn RngCore) -> Result<Box<dyn EncSymmKey>> {
        let mut material = Zeroizing::new(vec![0u8; self.key_len()]);
        rng::fill(rng, &mut material)?;
        Ok(self.make_key(material))
    }

    fn parse_key(&self, data: &[u8]) -> Result<Box<dyn EncSymmKey>> {
        if data.len() != self.key_len() {
            return Err(Error::KeyParse);
        }
        Ok(self.make_key(Zeroizing::new(data.to_vec())))
    }
}

// ---------------------------------------------------------------------------
// Key
// ---------------------------------------------------------------------------

struct AeadSymmKey<C> {
    key: Zeroizing<Vec<u8>>,
    nonce_config: NonceConfig,
    _cipher: PhantomData<fn() -> C>,
}

impl<C: AeadCipher> AeadSymmKey<C> {
    fn cipher(&self) -> Result<C> {
        C::new_from_slice(&self.key).map_err(|_| Error::KeyParse)
    }

    fn nonce_len() -> usize {
        <<C as AeadCore>::NonceSize as Unsigned>::USIZE
    }
}

impl<C> MarshalKey for AeadSymmKey<C> {
    fn marshal_to_writer(&self, writer: &mut dyn io::Write) -> Result<()> {
        writer.write_all(&self.key)?;
        Ok(())
    }
}

impl<C: AeadCipher> EncKey for AeadSymmKey<C> {
    fn make_encryptor(&self) -> Result<Box<dyn Encryptor>> {
        let nonces = self.nonce_config.make_manager(Self::nonce_len())?;
        let embed_nonce = self.nonce_config.nonce_type == NonceType::Rng;
        Ok(Box::new(AeadEncryptor::new(self.cipher()?, nonces, embed_nonce)))
    }
}

impl<C: AeadCipher> DecKey for AeadSymmKey<C> {
    fn make_decryptor(&self) -> Result<Box<dyn Decryptor>> {
        let nonces = match self.nonce_config.nonce_type {
            // Nonces travel with the ciphertext; nothing to track.
            NonceType::Rng => None,
            NonceType::Counter => Some(self.nonce_config.make_manager(Self::nonce_len())?),
        };
        Ok(Box::new(AeadDecryptor::new(self.cipher()?, nonces)))
    }
}

// ---------------------------------------------------------------------------
// Encryptor / Decryptor
// ---------------------------------------------------------------------------

/// Seals one AEAD message per `encrypt` call.
pub struct AeadEncryptor<C> {
    cipher: C,
    nonces: Box<dyn NonceManager>,
    embed_nonce: bool,
    state: Lifecycle,
}

impl<C: AeadCipher> AeadEncryptor<C> {
    pub(crate) fn new(cipher: C, nonces: Box<dyn NonceManager>, embed_nonce: bool) -> Self {
        Self {
            cipher,
            nonces,
            embed_nonce,
            state: Lifecycle::Active,
        }
    }
}

impl<C: AeadCipher> Encryptor for AeadEncryptor<C> {
    fn enc_info(&self) -> EncInfo {
        EncInfo {
            enc_type: if self.embed_nonce { EncType::Block } else { EncType::Chain },
            requires_finalization: false,
        }
    }

    fn encrypt(&mut self, input: &[u8], out: &mut Vec<u8>) -> Result<usize> {
        self.state.check()?;

        let nonce = Nonce::<C>::from_slice(self.nonces.nonce());
        let sealed = self.cipher.encrypt(nonce, input).map_err(|_| Error::EncryptionFailed);
        let sealed = self.state.guard(sealed)?;

        let start = out.len();
        out.extend_from_slice(&sealed);
        if self.embed_nonce {
            out.extend_from_slice(self.nonces.nonce());
        }

        // This ciphertext is fine. Running out of nonces only affects the
        // next call.
        if let Err(err) = self.nonces.next_nonce() {
            self.state.poison(err);
        }
        Ok(out.len() - start)
    }

    fn finalize(&mut self, _out: &mut Vec<u8>) -> Result<usize> {
        self.state.check()?;
        self.state.finish();
        Ok(0)
    }
}

/// Opens one AEAD message per `decrypt` call.
pub struct AeadDecryptor<C> {
    cipher: C,
    /// `None` when nonces are embedded in the ciphertext.
    nonces: Option<Box<dyn NonceManager>>,
    state: Lifecycle,
}

impl<C: AeadCipher> AeadDecryptor<C> {
    pub(crate) fn new(cipher: C, nonces: Option<Box<dyn NonceManager>>) -> Self {
        Self {
            cipher,
            nonces,
            state: Lifecycle::Active,
        }
    }

    fn open(&mut self, input: &[u8]) -> Result<Zeroizing<Vec<u8>>> {
        let nonce_len = <<C as AeadCore>::NonceSize as Unsigned>::USIZE;
        match self.nonces.as_mut() {
            None => {
                if input.len() < nonce_len {
                    return Err(Error::DecryptionAuthFailed);
                }
                let (body, nonce) = input.split_at(input.len() - nonce_len);
                self.cipher
                    .decrypt(Nonce::<C>::from_slice(nonce), body)
                    .map(Zeroizing::new)
                    .map_err(|_| Error::DecryptionAuthFailed)
            }
            Some(nonces) => {
                let plain = self
                    .cipher
                    .decrypt(Nonce::<C>::from_slice(nonces.nonce()), input)
                    .map(Zeroizing::new)
                    .map_err(|_| Error::DecryptionAuthFailed)?;
                if let Err(err) = nonces.next_nonce() {
                    self.state.poison(err);
                }
                Ok(plain)
            }
        }
    }
}

impl<C: AeadCipher> Decryptor for AeadDecryptor<C> {
    fn enc_info(&self) -> EncInfo {
        EncInfo {
            enc_type: if self.nonces.is_none() { EncType::Block } else { EncType::Chain },
            requires_finalization: false,
        }
    }

    fn decrypt(&mut self, input: &[u8], out: &mut Vec<u8>) -> Result<usize> {
        self.state.check()?;
        let opened = self.open(input);
        let plain = self.state.guard(opened)?;
        out.extend_from_slice(&plain);
        Ok(plain.len())
    }

    fn finalize(&mut self) -> Result<()> {
        self.state.check()?;
        self.state.finish();
        Ok(())
    }
}
