//! # Encryption Algorithms
//!
//! - [`aead`]: AEAD ciphers driven by a nonce strategy (Block or Chain).
//! - [`stream`]: framing that turns any symmetric algorithm into a Stream.
//! - [`hybrid`]: key exchange plus a symmetric algorithm.
//! - [`testing`]: insecure, deterministic algorithms for tests.

pub mod aead;
pub mod hybrid;
pub mod stream;
pub mod testing;
