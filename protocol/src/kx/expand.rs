//! Stretching a key exchange through a seeded generator.
//!
//! [`KxRngAlgo`] runs the inner exchange once to get a seed, feeds it to a
//! deterministic [`RngAlgo`] and reads as many bytes as the caller asked for.
//! The result has no length limit and, with a hashing generator, no
//! algebraic structure left over from the curve.

use std::sync::Arc;

use rand_core::RngCore;
use zeroize::Zeroizing;

use super::KxAlgo;
use crate::config::DEFAULT_KX_RESULT_LENGTH;
use crate::error::{Error, Result};
use crate::info::KxAlgoInfo;
use crate::rng::{self, RngAlgo};

/// Key exchange `K` whose output is expanded by a seeded generator.
pub struct KxRngAlgo<K> {
    kx: K,
    rng_algo: Arc<dyn RngAlgo>,
    seed_len: Option<usize>,
}

impl<K: KxAlgo> KxRngAlgo<K> {
    pub fn new(kx: K, rng_algo: Arc<dyn RngAlgo>) -> Self {
        Self {
            kx,
            rng_algo,
            seed_len: None,
        }
    }

    /// Pull exactly `seed_len` bytes from the exchange instead of as many as
    /// both algorithms allow.
    pub fn with_seed_len(mut self, seed_len: usize) -> Self {
        self.seed_len = Some(seed_len);
        self
    }

    /// Seed length used for each exchange: the explicit one if set,
    /// otherwise the exchange's maximum capped by the generator's maximum.
    pub fn seed_len(&self) -> usize {
        if let Some(len) = self.seed_len {
            return len;
        }
        let mut len = self
            .kx
            .info()
            .max_result_len
            .unwrap_or(DEFAULT_KX_RESULT_LENGTH);
        if let Some(max) = self.rng_algo.info().max_seed_len {
            len = len.min(max);
        }
        len
    }
}

impl<K: KxAlgo> KxAlgo for KxRngAlgo<K> {
    type Public = K::Public;
    type Secret = K::Secret;

    fn info(&self) -> KxAlgoInfo {
        let mut info = self.kx.info();
        info.base.is_secure = info.base.is_secure && self.rng_algo.info().base.is_secure;
        info.max_result_len = None;
        info
    }

    fn generate_pair(&self, rng: &mut dyn RngCore) -> Result<(Self::Public, Self::Secret)> {
        self.kx.generate_pair(rng)
    }

    fn parse_public(&self, data: &[u8]) -> Result<Self::Public> {
        self.kx.parse_public(data)
    }

    fn parse_secret(&self, data: &[u8]) -> Result<Self::Secret> {
        self.kx.parse_secret(data)
    }

    fn exchange(&self, public: &Self::Public, secret: &Self::Secret, out: &mut [u8]) -> Result<()> {
        let rng_info = self.rng_algo.info();
        if !rng_info.is_deterministic {
            // Both sides would read different bytes.
            return Err(Error::InvalidRngSeed);
        }
        let seed_len = self.seed_len();
        if seed_len < rng_info.min_seed_len {
            return Err(Error::InvalidRngSeed);
        }

        let mut seed = Zeroizing::new(vec![0u8; seed_len]);
        self.kx.exchange(public, secret, &mut seed)?;
        let mut expander = self.rng_algo.make_rng(&seed)?;
        rng::fill(expander.as_mut(), out)
    }
}
