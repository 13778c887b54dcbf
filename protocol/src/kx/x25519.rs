//! # X25519 Key Exchange
//!
//! Elliptic-curve Diffie-Hellman over Curve25519 via `x25519-dalek`. Both
//! halves are 32 bytes on the wire. Secrets are zeroized on drop.
//!
//! The raw shared point is handed out as-is (truncated to the requested
//! length). It is NOT uniformly random, so hybrid encryption should run it
//! through an expander such as [`crate::rng::Blake3XofRngAlgo`] before using
//! it as key material.

use std::io;

use rand_core::RngCore;
use x25519_dalek::{PublicKey, StaticSecret};
use zeroize::Zeroizing;

use super::KxAlgo;
use crate::config::{X25519_KEY_LENGTH, X25519_MAX_RESULT_LENGTH};
use crate::error::{Error, Result};
use crate::info::{AlgorithmType, BaseAlgorithmInfo, KxAlgoInfo};
use crate::keys::MarshalKey;
use crate::rng;

#[derive(Debug, Clone, Copy, Default)]
pub struct X25519KxAlgo;

/// Public half: a Montgomery point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct X25519Public(PublicKey);

/// Secret half: a clamped scalar.
pub struct X25519Secret(StaticSecret);

impl X25519Public {
    pub fn as_bytes(&self) -> &[u8; X25519_KEY_LENGTH] {
        self.0.as_bytes()
    }
}

impl X25519Secret {
    /// The public half matching this secret.
    pub fn public(&self) -> X25519Public {
        X25519Public(PublicKey::from(&self.0))
    }
}

impl MarshalKey for X25519Public {
    fn marshal_to_writer(&self, writer: &mut dyn io::Write) -> Result<()> {
        writer.write_all(self.0.as_bytes())?;
        Ok(())
    }
}

impl MarshalKey for X25519Secret {
    fn marshal_to_writer(&self, writer: &mut dyn io::Write) -> Result<()> {
        let bytes = Zeroizing::new(self.0.to_bytes());
        writer.write_all(&bytes[..])?;
        Ok(())
    }
}

fn key_bytes(data: &[u8]) -> Result<Zeroizing<[u8; X25519_KEY_LENGTH]>> {
    let bytes: [u8; X25519_KEY_LENGTH] = data.try_into().map_err(|_| Error::KeyParse)?;
    Ok(Zeroizing::new(bytes))
}

impl KxAlgo for X25519KxAlgo {
    type Public = X25519Public;
    type Secret = X25519Secret;

    fn info(&self) -> KxAlgoInfo {
        KxAlgoInfo {
            base: BaseAlgorithmInfo {
                algorithm_type: AlgorithmType::Kx,
                is_secure: true,
            },
            max_result_len: Some(X25519_MAX_RESULT_LENGTH),
        }
    }

    fn generate_pair(&self, rng: &mut dyn RngCore) -> Result<(X25519Public, X25519Secret)> {
        let mut scalar = Zeroizing::new([0u8; X25519_KEY_LENGTH]);
        rng::fill(rng, &mut scalar[..])?;
        let secret = X25519Secret(StaticSecret::from(*scalar));
        Ok((secret.public(), secret))
    }

    fn parse_public(&self, data: &[u8]) -> Result<X25519Public> {
        Ok(X25519Public(PublicKey::from(*key_bytes(data)?)))
    }

    fn parse_secret(&self, data: &[u8]) -> Result<X25519Secret> {
        Ok(X25519Secret(StaticSecret::from(*key_bytes(data)?)))
    }

    fn exchange(&self, public: &X25519Public, secret: &X25519Secret, out: &mut [u8]) -> Result<()> {
        if out.len() > X25519_MAX_RESULT_LENGTH {
            return Err(Error::InvalidKxDestination);
        }
        let shared = secret.0.diffie_hellman(&public.0);
        // Low-order points force an all-zero result. Nothing secret in that.
        if !shared.was_contributory() {
            return Err(Error::KeyExchangeFailed);
        }
        out.copy_from_slice(&shared.as_bytes()[..out.len()]);
        Ok(())
    }
}
