//! # Key Exchange
//!
//! The narrow contract a key exchange must satisfy to back hybrid
//! encryption ([`crate::enc::hybrid`]): generate a pair, parse both halves,
//! and fill a buffer with shared bytes from one side's public key and the
//! other side's secret.
//!
//! Public and secret halves are associated types, so a hybrid algorithm can
//! never be handed a key from the wrong exchange.

pub mod expand;
pub mod x25519;

use rand_core::RngCore;

pub use expand::KxRngAlgo;
pub use x25519::{X25519KxAlgo, X25519Public, X25519Secret};

use crate::error::Result;
use crate::info::KxAlgoInfo;
use crate::keys::MarshalKey;

pub trait KxAlgo: Send + Sync {
    type Public: MarshalKey + Send + Sync + 'static;
    type Secret: MarshalKey + Send + Sync + 'static;

    fn info(&self) -> KxAlgoInfo;

    fn generate_pair(&self, rng: &mut dyn RngCore) -> Result<(Self::Public, Self::Secret)>;

    fn parse_public(&self, data: &[u8]) -> Result<Self::Public>;

    fn parse_secret(&self, data: &[u8]) -> Result<Self::Secret>;

    /// Fill `out` with shared bytes. Both sides of an exchange get identical
    /// output for identical `out` lengths.
    fn exchange(&self, public: &Self::Public, secret: &Self::Secret, out: &mut [u8]) -> Result<()>;
}
