//! # Random Generation
//!
//! Two kinds of randomness show up in sealkit:
//!
//! - **Environment randomness** ([`OsRngAlgo`]) for key generation and random
//!   nonces. Comes straight from the operating system, ignores seeds.
//! - **Seeded randomness** ([`Blake3XofRngAlgo`]) for turning a short shared
//!   secret into as many key bytes as a symmetric algorithm wants. Same seed,
//!   same bytes, on both sides of a key exchange.
//!
//! Everything speaks `rand_core::RngCore`. Inside the crate we only ever call
//! `try_fill_bytes`, so a finite generator like [`FixedBytesRng`] reports
//! exhaustion as [`Error::RngOutOfEntropy`] instead of panicking.

use rand::rngs::OsRng;
use rand_core::{impls, RngCore};
use tracing::trace;
use zeroize::Zeroizing;

use crate::config::{BLAKE3_RNG_CONTEXT, BLAKE3_RNG_MIN_SEED_LENGTH};
use crate::error::{Error, Result};
use crate::info::{AlgorithmType, BaseAlgorithmInfo, RngAlgoInfo};

/// A factory for random generators.
pub trait RngAlgo: Send + Sync {
    fn info(&self) -> RngAlgoInfo;

    /// Build a generator from `seed`. Environment generators ignore it.
    fn make_rng(&self, seed: &[u8]) -> Result<Box<dyn RngCore + Send>>;
}

/// Fill `buf` from `rng`, mapping failure into the crate error.
pub fn fill(rng: &mut dyn RngCore, buf: &mut [u8]) -> Result<()> {
    rng.try_fill_bytes(buf).map_err(|_| Error::RngOutOfEntropy)
}

// ---------------------------------------------------------------------------
// Operating system
// ---------------------------------------------------------------------------

/// The operating system's CSPRNG.
#[derive(Debug, Clone, Copy, Default)]
pub struct OsRngAlgo;

impl RngAlgo for OsRngAlgo {
    fn info(&self) -> RngAlgoInfo {
        RngAlgoInfo {
            base: BaseAlgorithmInfo {
                algorithm_type: AlgorithmType::Rng,
                is_secure: true,
            },
            is_deterministic: false,
            min_seed_len: 0,
            max_seed_len: Some(0),
        }
    }

    fn make_rng(&self, _seed: &[u8]) -> Result<Box<dyn RngCore + Send>> {
        Ok(Box::new(OsRng))
    }
}

// ---------------------------------------------------------------------------
// BLAKE3 XOF
// ---------------------------------------------------------------------------

/// Deterministic generator reading BLAKE3's extendable output.
///
/// The seed is absorbed in `derive_key` mode under a fixed context string, so
/// output from this generator can never collide with a plain BLAKE3 hash or
/// with another protocol's derived keys.
#[derive(Debug, Clone, Copy, Default)]
pub struct Blake3XofRngAlgo;

impl RngAlgo for Blake3XofRngAlgo {
    fn info(&self) -> RngAlgoInfo {
        RngAlgoInfo {
            base: BaseAlgorithmInfo {
                algorithm_type: AlgorithmType::Rng,
                is_secure: true,
            },
            is_deterministic: true,
            min_seed_len: BLAKE3_RNG_MIN_SEED_LENGTH,
            max_seed_len: None,
        }
    }

    fn make_rng(&self, seed: &[u8]) -> Result<Box<dyn RngCore + Send>> {
        if seed.len() < BLAKE3_RNG_MIN_SEED_LENGTH {
            return Err(Error::InvalidRngSeed);
        }
        let mut hasher = blake3::Hasher::new_derive_key(BLAKE3_RNG_CONTEXT);
        hasher.update(seed);
        trace!(seed_len = seed.len(), "seeded blake3 xof rng");
        Ok(Box::new(Blake3XofRng {
            reader: hasher.finalize_xof(),
        }))
    }
}

/// Generator produced by [`Blake3XofRngAlgo`].
pub struct Blake3XofRng {
    reader: blake3::OutputReader,
}

impl RngCore for Blake3XofRng {
    fn next_u32(&mut self) -> u32 {
        impls::next_u32_via_fill(self)
    }

    fn next_u64(&mut self) -> u64 {
        impls::next_u64_via_fill(self)
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        self.reader.fill(dest);
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> std::result::Result<(), rand_core::Error> {
        self.reader.fill(dest);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Fixed bytes
// ---------------------------------------------------------------------------

/// Hands out a fixed byte string once, then reports exhaustion.
///
/// Used to feed a raw key exchange result into key generation when no
/// expander is configured. Requests are all-or-nothing: a request larger
/// than what's left fails and consumes nothing.
pub struct FixedBytesRng {
    data: Zeroizing<Vec<u8>>,
    pos: usize,
}

impl FixedBytesRng {
    pub fn new(data: &[u8]) -> Self {
        Self {
            data: Zeroizing::new(data.to_vec()),
            pos: 0,
        }
    }

    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }
}

impl RngCore for FixedBytesRng {
    fn next_u32(&mut self) -> u32 {
        impls::next_u32_via_fill(self)
    }

    fn next_u64(&mut self) -> u64 {
        impls::next_u64_via_fill(self)
    }

    /// Infallible interface; panics once exhausted. Use `try_fill_bytes`.
    fn fill_bytes(&mut self, dest: &mut [u8]) {
        if let Err(err) = self.try_fill_bytes(dest) {
            panic!("FixedBytesRng: {err}");
        }
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> std::result::Result<(), rand_core::Error> {
        if dest.len() > self.remaining() {
            return Err(rand_core::Error::new("fixed byte source exhausted"));
        }
        let end = self.pos + dest.len();
        dest.copy_from_slice(&self.data[self.pos..end]);
        self.pos = end;
        Ok(())
    }
}
