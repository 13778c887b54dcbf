//! # Nonce Management
//!
//! Every AEAD call needs a nonce that has never been used with the same key
//! before. Reuse one and GCM hands the attacker the XOR of two plaintexts plus
//! the ability to forge tags. This module makes reuse impossible as long as
//! each encryptor owns exactly one manager.
//!
//! Two strategies:
//!
//! - **Counter**: the nonce buffer is an integer incremented after every use.
//!   Sender and receiver walk the same deterministic sequence, so nothing
//!   needs to travel with the ciphertext, but chunks must arrive in order.
//!   When every byte is `0xff` the space is used up and we refuse to wrap.
//! - **RNG**: a fresh random nonce per use. The nonce has to ride along with
//!   the ciphertext, which makes each ciphertext self-contained. Short nonces
//!   hit the birthday bound quickly, so below [`RNG_NONCE_CHECKED_BELOW`]
//!   bytes we stop after `2^(bits/2)` nonces.
//!
//! `allow_unsafe` switches both checks off. Only tests should want that.

use rand::rngs::OsRng;
use rand_core::RngCore;
use serde::{Deserialize, Serialize};

use crate::config::RNG_NONCE_CHECKED_BELOW;
use crate::error::{Error, Result};

/// Source of per-call nonces for one encryptor or decryptor.
pub trait NonceManager: Send {
    /// The nonce to use for the next seal/open.
    fn nonce(&self) -> &[u8];

    /// Move on to a fresh nonce. Call after every use of [`Self::nonce`].
    fn next_nonce(&mut self) -> Result<()>;
}

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NonceType {
    #[default]
    Counter,
    Rng,
}

/// Byte order used when incrementing a counter nonce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CounterOrder {
    /// Byte 0 is least significant.
    #[default]
    LittleEndian,
    BigEndian,
}

/// How an algorithm obtains its nonces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NonceConfig {
    pub nonce_type: NonceType,
    pub counter_order: CounterOrder,
    /// Disable the exhaustion checks. Nonce reuse becomes possible.
    pub allow_unsafe: bool,
}

impl NonceConfig {
    pub fn counter() -> Self {
        Self {
            nonce_type: NonceType::Counter,
            ..Self::default()
        }
    }

    pub fn rng() -> Self {
        Self {
            nonce_type: NonceType::Rng,
            ..Self::default()
        }
    }

    /// Build a manager for nonces of `len` bytes. RNG managers draw from the
    /// operating system.
    pub fn make_manager(&self, len: usize) -> Result<Box<dyn NonceManager>> {
        self.make_manager_with_rng(len, Box::new(OsRng))
    }

    /// Like [`Self::make_manager`] with an explicit randomness source. The
    /// source is ignored for counter nonces.
    pub fn make_manager_with_rng(
        &self,
        len: usize,
        rng: Box<dyn RngCore + Send>,
    ) -> Result<Box<dyn NonceManager>> {
        Ok(match self.nonce_type {
            NonceType::Counter => Box::new(CounterNonceManager::with_order(
                len,
                self.counter_order,
                self.allow_unsafe,
            )),
            NonceType::Rng => Box::new(RngNonceManager::new(len, rng, self.allow_unsafe)?),
        })
    }
}

// ---------------------------------------------------------------------------
// Counter
// ---------------------------------------------------------------------------

/// Nonce buffer treated as an unsigned integer starting at zero.
///
/// Not constant time: the carry chain leaks how many nonces were used. The
/// chunk count is visible on the wire anyway.
#[derive(Debug, Clone)]
pub struct CounterNonceManager {
    nonce: Vec<u8>,
    order: CounterOrder,
    allow_unsafe: bool,
}

impl CounterNonceManager {
    pub fn new(len: usize, allow_unsafe: bool) -> Self {
        Self::with_order(len, CounterOrder::LittleEndian, allow_unsafe)
    }

    pub fn with_order(len: usize, order: CounterOrder, allow_unsafe: bool) -> Self {
        Self {
            nonce: vec![0u8; len],
            order,
            allow_unsafe,
        }
    }

    /// Start counting from `start` instead of zero.
    pub fn starting_at(start: &[u8], order: CounterOrder, allow_unsafe: bool) -> Self {
        Self {
            nonce: start.to_vec(),
            order,
            allow_unsafe,
        }
    }

    pub fn len(&self) -> usize {
        self.nonce.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nonce.is_empty()
    }
}

fn increment<'a>(bytes: impl Iterator<Item = &'a mut u8>) {
    for byte in bytes {
        let (value, carry) = byte.overflowing_add(1);
        *byte = value;
        if !carry {
            break;
        }
    }
}

impl NonceManager for CounterNonceManager {
    fn nonce(&self) -> &[u8] {
        &self.nonce
    }

    fn next_nonce(&mut self) -> Result<()> {
        if self.nonce.iter().all(|&b| b == u8::MAX) {
            if !self.allow_unsafe {
                return Err(Error::TooManyChunksEncrypted);
            }
            self.nonce.fill(0);
            return Ok(());
        }

        match self.order {
            CounterOrder::LittleEndian => increment(self.nonce.iter_mut()),
            CounterOrder::BigEndian => increment(self.nonce.iter_mut().rev()),
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// RNG
// ---------------------------------------------------------------------------

/// Fresh random nonce per use.
pub struct RngNonceManager {
    nonce: Vec<u8>,
    rng: Box<dyn RngCore + Send>,
    allow_unsafe: bool,
    emitted: u64,
}

impl RngNonceManager {
    /// Draw the first nonce right away. It counts towards the bound.
    pub fn new(len: usize, mut rng: Box<dyn RngCore + Send>, allow_unsafe: bool) -> Result<Self> {
        let mut nonce = vec![0u8; len];
        rng.try_fill_bytes(&mut nonce)
            .map_err(|_| Error::RngOutOfEntropy)?;
        Ok(Self {
            nonce,
            rng,
            allow_unsafe,
            emitted: 1,
        })
    }

    /// How many nonces may be produced in total, if limited at all.
    pub fn limit(&self) -> Option<u64> {
        let len = self.nonce.len();
        if self.allow_unsafe || len >= RNG_NONCE_CHECKED_BELOW {
            return None;
        }
        // Square root of the nonce space: 2^(len * 8 / 2).
        Some(1u64 << (len * 4))
    }
}

impl NonceManager for RngNonceManager {
    fn nonce(&self) -> &[u8] {
        &self.nonce
    }

    fn next_nonce(&mut self) -> Result<()> {
        if let Some(limit) = self.limit() {
            if self.emitted >= limit {
                return Err(Error::TooManyChunksEncrypted);
            }
        }
        self.rng
            .try_fill_bytes(&mut self.nonce)
            .map_err(|_| Error::RngOutOfEntropy)?;
        self.emitted = self.emitted.saturating_add(1);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;

    fn seeded() -> Box<dyn RngCore + Send> {
        Box::new(StdRng::seed_from_u64(7))
    }

    #[test]
    fn test_counter_two_bytes_exhausts_after_full_space() {
        let mut nm = CounterNonceManager::new(2, false);
        let mut seen = HashSet::new();
        let mut advanced = 0u32;

        loop {
            assert!(seen.insert(nm.nonce().to_vec()), "nonce repeated");
            if nm.next_nonce().is_err() {
                break;
            }
            advanced += 1;
        }

        assert_eq!(advanced, 0xffff);
        assert_eq!(seen.len(), 0x10000);
        // Still exhausted, no wraparound.
        assert_eq!(nm.next_nonce(), Err(Error::TooManyChunksEncrypted));
        assert_eq!(nm.nonce(), &[0xff, 0xff]);
    }

    #[test]
    fn test_counter_byte_order() {
        let mut le = CounterNonceManager::starting_at(&[0xff, 0x00], CounterOrder::LittleEndian, false);
        le.next_nonce().unwrap();
        assert_eq!(le.nonce(), &[0x00, 0x01]);

        let mut be = CounterNonceManager::starting_at(&[0x00, 0xff], CounterOrder::BigEndian, false);
        be.next_nonce().unwrap();
        assert_eq!(be.nonce(), &[0x01, 0x00]);
    }

    #[test]
    fn test_counter_unsafe_wraps_to_zero() {
        let mut nm = CounterNonceManager::starting_at(&[0xff, 0xff], CounterOrder::LittleEndian, true);
        nm.next_nonce().unwrap();
        assert_eq!(nm.nonce(), &[0, 0]);
        nm.next_nonce().unwrap();
        assert_eq!(nm.nonce(), &[1, 0]);
    }

    #[test]
    fn test_rng_short_nonce_hits_birthday_bound() {
        let mut nm = RngNonceManager::new(2, seeded(), false).unwrap();
        assert_eq!(nm.limit(), Some(256));

        let mut advanced = 0;
        while nm.next_nonce().is_ok() {
            advanced += 1;
        }
        // The initial nonce counts, so 255 more can be drawn.
        assert_eq!(advanced, 255);
        assert_eq!(nm.next_nonce(), Err(Error::TooManyChunksEncrypted));
    }

    #[test]
    fn test_rng_long_or_unsafe_nonce_is_unbounded() {
        let nm = RngNonceManager::new(12, seeded(), false).unwrap();
        assert_eq!(nm.limit(), None);

        let mut nm = RngNonceManager::new(1, seeded(), true).unwrap();
        for _ in 0..1000 {
            nm.next_nonce().unwrap();
        }
    }

    #[test]
    fn test_rng_nonces_change() {
        let mut nm = RngNonceManager::new(24, seeded(), false).unwrap();
        let first = nm.nonce().to_vec();
        nm.next_nonce().unwrap();
        assert_ne!(first, nm.nonce());
    }

    #[test]
    fn test_config_builds_requested_manager() {
        let counter = NonceConfig::counter().make_manager(12).unwrap();
        assert_eq!(counter.nonce(), &[0u8; 12]);

        let rng = NonceConfig::rng().make_manager_with_rng(12, seeded()).unwrap();
        assert_eq!(rng.nonce().len(), 12);
    }

    #[test]
    fn test_config_deserializes_with_defaults() {
        let config: NonceConfig = serde_json::from_str(r#"{"nonce_type":"rng"}"#).unwrap();
        assert_eq!(config.nonce_type, NonceType::Rng);
        assert_eq!(config.counter_order, CounterOrder::LittleEndian);
        assert!(!config.allow_unsafe);
    }
}
