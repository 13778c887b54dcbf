//! # Protocol Configuration & Constants
//!
//! Every magic number in sealkit lives here. If you're hardcoding a constant
//! somewhere else, you're doing it wrong.
//!
//! Some of these values are baked into the wire format (the stream control
//! byte, the varint limits). Changing those breaks every stream ever written,
//! so they are not knobs. The defaults further down are knobs, and the
//! runtime config structs ([`crate::nonce::NonceConfig`],
//! [`crate::enc::stream::StreamConfig`]) start from them.

/// Version of this library, as published.
pub const CRATE_VERSION: &str = env!("CARGO_PKG_VERSION");

// ---------------------------------------------------------------------------
// Integer Codec
// ---------------------------------------------------------------------------

/// Longest valid unsigned LEB128 encoding of a `u64`. Ten groups of seven
/// bits cover 70 bits, the tenth byte may only carry the single top bit.
pub const VARINT_MAX_LENGTH: usize = 10;

// ---------------------------------------------------------------------------
// Stream Framing
// ---------------------------------------------------------------------------

/// Plaintext bytes buffered per data chunk when nobody says otherwise.
pub const DEFAULT_STREAM_CHUNK_SIZE: usize = 256;

/// Largest ciphertext chunk the decoder accepts by default. A length prefix
/// above this is rejected before a single payload byte gets buffered, so a
/// hostile stream can't make us allocate gigabytes.
pub const DEFAULT_MAX_STREAM_CHUNK_SIZE: usize = 1 << 20;

/// Control value carried by the terminal chunk. The only one defined so far.
pub const STREAM_END: u8 = 0x00;

/// Chunk counter value reserved for control chunks. Data chunks start at 1.
pub const CONTROL_CHUNK_COUNTER: u64 = 0;

/// First counter value assigned to a data chunk.
pub const FIRST_DATA_CHUNK_COUNTER: u64 = 1;

// ---------------------------------------------------------------------------
// Hybrid (KX) Encryption
// ---------------------------------------------------------------------------

/// Upper bound on the marshaled ephemeral public key a hybrid decryptor will
/// buffer. X25519 keys are 32 bytes; anything near this limit is garbage.
pub const DEFAULT_MAX_EPHEMERAL_KEY_LENGTH: usize = 1 << 20;

/// Shared secret length requested from key exchanges that can produce any
/// amount of output.
pub const DEFAULT_KX_RESULT_LENGTH: usize = 64;

// ---------------------------------------------------------------------------
// Nonce Management
// ---------------------------------------------------------------------------

/// RNG nonces at least this long are never birthday-checked: 2^32 nonces
/// would take longer to emit than anyone keeps a key around.
pub const RNG_NONCE_CHECKED_BELOW: usize = 8;

// ---------------------------------------------------------------------------
// Primitive Parameters
// ---------------------------------------------------------------------------

/// AES-128-GCM key length in bytes.
pub const AES_128_KEY_LENGTH: usize = 16;

/// AES-256-GCM key length in bytes.
pub const AES_256_KEY_LENGTH: usize = 32;

/// AES-GCM nonce length in bytes. 96 bits, the only length worth using.
pub const AES_NONCE_LENGTH: usize = 12;

/// ChaCha20-Poly1305 nonce length in bytes.
pub const CHACHA_NONCE_LENGTH: usize = 12;

/// XChaCha20-Poly1305 nonce length in bytes. Big enough for random nonces
/// without any counting.
pub const XCHACHA_NONCE_LENGTH: usize = 24;

/// ChaCha20-Poly1305 / XChaCha20-Poly1305 key length in bytes.
pub const CHACHA_KEY_LENGTH: usize = 32;

/// Authentication tag appended by every AEAD we ship.
pub const AEAD_TAG_LENGTH: usize = 16;

/// X25519 scalar and point length.
pub const X25519_KEY_LENGTH: usize = 32;

/// Largest shared secret X25519 can produce.
pub const X25519_MAX_RESULT_LENGTH: usize = 32;

/// Ed25519 secret seed length.
pub const ED25519_SECRET_KEY_LENGTH: usize = 32;

/// Ed25519 public key length.
pub const ED25519_PUBLIC_KEY_LENGTH: usize = 32;

/// Ed25519 signature length. Always 64 bytes.
pub const ED25519_SIGNATURE_LENGTH: usize = 64;

/// Keyed BLAKE3 MAC key length.
pub const BLAKE3_MAC_KEY_LENGTH: usize = 32;

/// Minimum seed accepted by the BLAKE3 XOF RNG.
pub const BLAKE3_RNG_MIN_SEED_LENGTH: usize = 16;

/// Domain separation context for the BLAKE3 XOF RNG.
pub const BLAKE3_RNG_CONTEXT: &str = "sealkit v1 blake3 xof rng";
