// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # sealkit — Core Library
//!
//! Pluggable cryptographic algorithms behind small capability traits, plus
//! an authenticated stream framing format that turns per-message AEAD
//! guarantees into whole-stream guarantees.
//!
//! ## Architecture
//!
//! - **info** — What every algorithm reports about itself: encryption type,
//!   authentication strength, whether `finalize` is required.
//! - **keys** — Encryptor/decryptor traits and the keys that make them.
//! - **lifecycle** — The poison state every worker carries after a failure.
//! - **nonce** — Counter and random nonce managers with exhaustion checks.
//! - **enc** — AEAD ciphers, stream framing, hybrid (key exchange) encryption
//!   and insecure test ciphers.
//! - **kx** — X25519 and output expansion through a seeded generator.
//! - **sign** — Hashes, BLAKE3 MAC and Ed25519 behind one signing interface.
//! - **rng** — OS and BLAKE3-XOF generators.
//! - **codec** — Varint and fixed-width integer encodings used on the wire.
//! - **registry** — Name-to-algorithm lookup, built once and then frozen.
//! - **config** — Protocol constants.
//!
//! ## Ground rules
//!
//! 1. Workers are single-threaded and stateful. Make one per stream.
//! 2. The first error poisons a worker for good. No retries over moved nonces.
//! 3. Decryptors never hand out bytes that haven't been authenticated.
//! 4. Key material is zeroized on drop and never logged.

pub mod codec;
pub mod config;
pub mod enc;
pub mod error;
pub mod info;
pub mod keys;
pub mod kx;
pub mod lifecycle;
pub mod nonce;
pub mod registry;
pub mod rng;
pub mod sign;

pub use error::{Error, Result};
