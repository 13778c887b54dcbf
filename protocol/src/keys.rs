//! # Keys, Encryptors & Decryptors
//!
//! The capability traits every encryption algorithm plugs into.
//!
//! A key is an immutable, shareable object that owns its material and stamps
//! out fresh [`Encryptor`]s and [`Decryptor`]s on demand. Those are the
//! stateful, single-threaded workers: feed them data with `encrypt` /
//! `decrypt`, then call `finalize` exactly once. After the first error (or
//! after `finalize`) they refuse to do anything else.
//!
//! ## Buffer contract
//!
//! Output is appended to a caller-owned `Vec<u8>` and the number of bytes
//! appended is returned. Callers keep control over allocation and can reuse
//! one buffer for a whole stream. A call that fails appends nothing that
//! should be trusted; decryptors in this crate leave `out` exactly as it was.
//!
//! ## Algorithms
//!
//! [`EncSymmAlgo`] and [`EncAsymAlgo`] generate and parse keys. They report
//! an [`EncAlgoInfo`] so callers can check the guarantees they are getting.

use std::io;
use std::sync::Arc;

use rand_core::RngCore;

use crate::error::{Error, Result};
use crate::info::{EncAlgoInfo, EncInfo};

// ---------------------------------------------------------------------------
// Workers
// ---------------------------------------------------------------------------

/// Stateful encryption worker produced by an [`EncKey`].
pub trait Encryptor: Send {
    fn enc_info(&self) -> EncInfo;

    /// Encrypt `input`, appending ciphertext to `out`. Returns bytes appended.
    fn encrypt(&mut self, input: &[u8], out: &mut Vec<u8>) -> Result<usize>;

    /// Flush whatever is buffered and close the ciphertext. Must be called
    /// once for algorithms whose info says `requires_finalization`.
    fn finalize(&mut self, out: &mut Vec<u8>) -> Result<usize>;
}

/// Stateful decryption worker produced by a [`DecKey`].
pub trait Decryptor: Send {
    fn enc_info(&self) -> EncInfo;

    /// Decrypt `input`, appending plaintext to `out`. Returns bytes appended.
    fn decrypt(&mut self, input: &[u8], out: &mut Vec<u8>) -> Result<usize>;

    /// Confirm the ciphertext ended where it was supposed to.
    fn finalize(&mut self) -> Result<()>;
}

impl<T: Encryptor + ?Sized> Encryptor for Box<T> {
    fn enc_info(&self) -> EncInfo {
        (**self).enc_info()
    }

    fn encrypt(&mut self, input: &[u8], out: &mut Vec<u8>) -> Result<usize> {
        (**self).encrypt(input, out)
    }

    fn finalize(&mut self, out: &mut Vec<u8>) -> Result<usize> {
        (**self).finalize(out)
    }
}

impl<T: Decryptor + ?Sized> Decryptor for Box<T> {
    fn enc_info(&self) -> EncInfo {
        (**self).enc_info()
    }

    fn decrypt(&mut self, input: &[u8], out: &mut Vec<u8>) -> Result<usize> {
        (**self).decrypt(input, out)
    }

    fn finalize(&mut self) -> Result<()> {
        (**self).finalize()
    }
}

// ---------------------------------------------------------------------------
// Keys
// ---------------------------------------------------------------------------

/// Canonical serialization of key material.
///
/// Parsing the marshaled bytes with the owning algorithm yields an
/// equivalent key. Keys that can't be exported keep the default.
pub trait MarshalKey {
    fn marshal_to_writer(&self, _writer: &mut dyn io::Write) -> Result<()> {
        Err(Error::KeyNotMarshalable)
    }

    fn marshal_to_vec(&self) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        self.marshal_to_writer(&mut buf)?;
        Ok(buf)
    }
}

pub trait EncKey: MarshalKey + Send + Sync {
    fn make_encryptor(&self) -> Result<Box<dyn Encryptor>>;
}

pub trait DecKey: MarshalKey + Send + Sync {
    fn make_decryptor(&self) -> Result<Box<dyn Decryptor>>;
}

/// A symmetric key: one object that both encrypts and decrypts.
pub trait EncSymmKey: EncKey + DecKey {}

impl<T: EncKey + DecKey + ?Sized> EncSymmKey for T {}

// ---------------------------------------------------------------------------
// Algorithms
// ---------------------------------------------------------------------------

pub trait EncAlgo: Send + Sync {
    fn info(&self) -> EncAlgoInfo;
}

pub trait EncSymmAlgo: EncAlgo {
    fn generate_key(&self, rng: &mut dyn RngCore) -> Result<Box<dyn EncSymmKey>>;
    fn parse_key(&self, data: &[u8]) -> Result<Box<dyn EncSymmKey>>;
}

pub trait EncAsymAlgo: EncAlgo {
    fn generate_key_pair(&self, rng: &mut dyn RngCore)
        -> Result<(Box<dyn EncKey>, Box<dyn DecKey>)>;
    fn parse_enc_key(&self, data: &[u8]) -> Result<Box<dyn EncKey>>;
    fn parse_dec_key(&self, data: &[u8]) -> Result<Box<dyn DecKey>>;
}

// Shared algorithms (registry entries) can be wrapped by other algorithms.

impl<T: EncAlgo + ?Sized> EncAlgo for Arc<T> {
    fn info(&self) -> EncAlgoInfo {
        (**self).info()
    }
}

impl<T: EncSymmAlgo + ?Sized> EncSymmAlgo for Arc<T> {
    fn generate_key(&self, rng: &mut dyn RngCore) -> Result<Box<dyn EncSymmKey>> {
        (**self).generate_key(rng)
    }

    fn parse_key(&self, data: &[u8]) -> Result<Box<dyn EncSymmKey>> {
        (**self).parse_key(data)
    }
}

impl<T: EncAsymAlgo + ?Sized> EncAsymAlgo for Arc<T> {
    fn generate_key_pair(
        &self,
        rng: &mut dyn RngCore,
    ) -> Result<(Box<dyn EncKey>, Box<dyn DecKey>)> {
        (**self).generate_key_pair(rng)
    }

    fn parse_enc_key(&self, data: &[u8]) -> Result<Box<dyn EncKey>> {
        (**self).parse_enc_key(data)
    }

    fn parse_dec_key(&self, data: &[u8]) -> Result<Box<dyn DecKey>> {
        (**self).parse_dec_key(data)
    }
}

// ---------------------------------------------------------------------------
// One-shot helpers
// ---------------------------------------------------------------------------

/// Encrypt a whole message with a fresh encryptor and finalize it.
pub fn encrypt_all<K: EncKey + ?Sized>(key: &K, plaintext: &[u8]) -> Result<Vec<u8>> {
    let mut enc = key.make_encryptor()?;
    let mut out = Vec::with_capacity(plaintext.len());
    enc.encrypt(plaintext, &mut out)?;
    enc.finalize(&mut out)?;
    Ok(out)
}

/// Decrypt a whole message produced by [`encrypt_all`] and finalize.
///
/// Only for algorithms where one `encrypt` call maps to one `decrypt` call,
/// or for stream algorithms. Nothing is returned unless finalization passes.
pub fn decrypt_all<K: DecKey + ?Sized>(key: &K, ciphertext: &[u8]) -> Result<Vec<u8>> {
    let mut dec = key.make_decryptor()?;
    let mut out = Vec::with_capacity(ciphertext.len());
    dec.decrypt(ciphertext, &mut out)?;
    dec.finalize()?;
    Ok(out)
}
