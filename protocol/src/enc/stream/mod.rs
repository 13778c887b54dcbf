//! # Stream Framing
//!
//! Turns a Block- or Chain-type symmetric algorithm into a Stream-type one:
//! plaintext goes in as arbitrary byte ranges, ciphertext comes out as a
//! byte stream that can be sliced any way on the way to the decryptor, and
//! the decryptor notices reordering, corruption and truncation.
//!
//! ## Wire format
//!
//! ```text
//! stream         := chunk* terminal_chunk
//! chunk          := len(ciphertext) ciphertext
//! data preimage  := counter (>= 1) payload
//! terminal       := counter (= 0) STREAM_END last_counter
//! ```
//!
//! Lengths and counters use the configured [`IntEncoding`] (varint by
//! default). Each chunk's preimage is encrypted by a fresh call to the inner
//! encryptor, so the inner AEAD authenticates the counter together with the
//! payload.
//!
//! ## Why the counter lives inside the ciphertext
//!
//! The inner algorithm only vouches for one chunk at a time. Putting the
//! running counter *inside* the authenticated preimage turns that into an
//! ordering guarantee for the whole stream: swap, drop or replay a chunk and
//! the counter won't match. The terminal chunk repeats the last data counter,
//! so a stream cut off after any chunk boundary is caught by `finalize`.
//!
//! Data chunks hold [`StreamConfig::chunk_size`] bytes of plaintext, except
//! the last one, which holds whatever is left.

mod decryptor;
mod encryptor;

use std::io;

use rand_core::RngCore;
use serde::{Deserialize, Serialize};

pub use decryptor::StreamDecryptor;
pub use encryptor::StreamEncryptor;

use crate::codec::IntEncoding;
use crate::config::{DEFAULT_MAX_STREAM_CHUNK_SIZE, DEFAULT_STREAM_CHUNK_SIZE};
use crate::error::{Error, Result};
use crate::info::{AuthMode, EncAlgoInfo, EncInfo, EncType};
use crate::keys::{DecKey, Decryptor, EncAlgo, EncKey, EncSymmAlgo, EncSymmKey, Encryptor, MarshalKey};

/// Info reported by every stream encryptor and decryptor.
pub(crate) const STREAM_ENC_INFO: EncInfo = EncInfo {
    enc_type: EncType::Stream,
    requires_finalization: true,
};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Knobs for the stream framing. Both sides must agree on the encodings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamConfig {
    /// Plaintext bytes per data chunk.
    pub chunk_size: usize,
    /// Largest ciphertext chunk the decryptor buffers. `None` accepts
    /// anything the length encoding can express.
    pub max_chunk_size: Option<usize>,
    /// Encoding of each chunk's length prefix.
    pub size_encoding: IntEncoding,
    /// Encoding of the chunk counters inside each preimage.
    pub counter_encoding: IntEncoding,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_STREAM_CHUNK_SIZE,
            max_chunk_size: Some(DEFAULT_MAX_STREAM_CHUNK_SIZE),
            size_encoding: IntEncoding::Varint,
            counter_encoding: IntEncoding::Varint,
        }
    }
}

impl StreamConfig {
    pub fn with_chunk_size(chunk_size: usize) -> Self {
        Self {
            chunk_size,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(Error::InvalidConfig("stream chunk size must be positive"));
        }
        if self.max_chunk_size == Some(0) {
            return Err(Error::InvalidConfig("max stream chunk size must be positive"));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Algorithm
// ---------------------------------------------------------------------------

/// Stream framing over any symmetric algorithm `A`.
///
/// Keys are the inner algorithm's keys; marshaling one gives the inner key's
/// bytes.
///
/// # Example
///
/// ```
/// use sealkit_protocol::enc::aead::Aes256GcmAlgo;
/// use sealkit_protocol::enc::stream::{StreamConfig, StreamEncAlgo};
/// use sealkit_protocol::keys::{DecKey, Decryptor, EncKey, EncSymmAlgo, Encryptor};
///
/// let algo = StreamEncAlgo::with_config(Aes256GcmAlgo::counter(), StreamConfig::with_chunk_size(4)).unwrap();
/// let key = algo.generate_key(&mut rand::rngs::OsRng).unwrap();
///
/// let mut enc = key.make_encryptor().unwrap();
/// let mut wire = Vec::new();
/// enc.encrypt(b"hello ", &mut wire).unwrap();
/// enc.encrypt(b"world", &mut wire).unwrap();
/// enc.finalize(&mut wire).unwrap();
///
/// let mut dec = key.make_decryptor().unwrap();
/// let mut plain = Vec::new();
/// for byte in &wire {
///     dec.decrypt(std::slice::from_ref(byte), &mut plain).unwrap();
/// }
/// dec.finalize().unwrap();
/// assert_eq!(plain, b"hello world");
/// ```
#[derive(Debug, Clone)]
pub struct StreamEncAlgo<A> {
    inner: A,
    config: StreamConfig,
}

impl<A: EncSymmAlgo> StreamEncAlgo<A> {
    pub fn new(inner: A) -> Self {
        Self {
            inner,
            config: StreamConfig::default(),
        }
    }

    pub fn with_config(inner: A, config: StreamConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { inner, config })
    }

    pub fn config(&self) -> &StreamConfig {
        &self.config
    }

    pub fn inner(&self) -> &A {
        &self.inner
    }

    fn wrap(&self, inner: Box<dyn EncSymmKey>) -> Box<dyn EncSymmKey> {
        Box::new(StreamSymmKey {
            inner,
            config: self.config,
        })
    }
}

impl<A: EncSymmAlgo> EncAlgo for StreamEncAlgo<A> {
    fn info(&self) -> EncAlgoInfo {
        let inner = self.inner.info();
        // Counters and the terminal chunk add ordering and truncation
        // detection on top of whatever tamper detection the inner has.
        let auth_mode = if inner.auth_mode.detects_tampering() {
            AuthMode::LateAuthenticated
        } else {
            inner.auth_mode
        };
        EncAlgoInfo {
            base: inner.base,
            enc: STREAM_ENC_INFO,
            auth_mode,
        }
    }
}

impl<A: EncSymmAlgo> EncSymmAlgo for StreamEncAlgo<A> {
    fn generate_key(&self, rng: &mut dyn RngCore) -> Result<Box<dyn EncSymmKey>> {
        Ok(self.wrap(self.inner.generate_key(rng)?))
    }

    fn parse_key(&self, data: &[u8]) -> Result<Box<dyn EncSymmKey>> {
        Ok(self.wrap(self.inner.parse_key(data)?))
    }
}

struct StreamSymmKey {
    inner: Box<dyn EncSymmKey>,
    config: StreamConfig,
}

impl MarshalKey for StreamSymmKey {
    fn marshal_to_writer(&self, writer: &mut dyn io::Write) -> Result<()> {
        self.inner.marshal_to_writer(writer)
    }
}

impl EncKey for StreamSymmKey {
    fn make_encryptor(&self) -> Result<Box<dyn Encryptor>> {
        let inner = self.inner.make_encryptor()?;
        Ok(Box::new(StreamEncryptor::new(inner, self.config)?))
    }
}

impl DecKey for StreamSymmKey {
    fn make_decryptor(&self) -> Result<Box<dyn Decryptor>> {
        let inner = self.inner.make_decryptor()?;
        Ok(Box::new(StreamDecryptor::new(inner, self.config)?))
    }
}
