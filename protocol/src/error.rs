//! # Errors
//!
//! One error type for the whole library. Encryptors and decryptors remember
//! the first error they hit and hand it back on every later call, so the type
//! has to be `Clone` and cheap to compare. That rules out wrapping
//! `std::io::Error` directly; I/O failures are flattened into strings.
//!
//! Messages are intentionally vague about *why* cryptographic checks failed.
//! "Wrong key" and "tampered ciphertext" look the same from the outside.

use thiserror::Error;

/// Everything that can go wrong inside sealkit.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    // -- parsing ----------------------------------------------------------
    #[error("failed to parse key: wrong length or invalid encoding")]
    KeyParse,

    #[error("key is not marshalable")]
    KeyNotMarshalable,

    #[error("failed to write marshaled key: {0}")]
    Marshal(String),

    #[error("failed to decode encoded integer")]
    IntEncoding,

    // -- authentication ---------------------------------------------------
    #[error("signature is invalid")]
    InvalidSignature,

    #[error("decryption failed -- wrong key or modified ciphertext")]
    DecryptionAuthFailed,

    #[error("encryption failed")]
    EncryptionFailed,

    // -- stream protocol --------------------------------------------------
    #[error("stream chunk is too big and won't be decrypted")]
    StreamChunkTooBig,

    #[error("stream corrupted, reordered, truncated or missing its terminal chunk")]
    StreamCorrupted,

    #[error("unknown stream control value {0:#04x}")]
    UnsupportedControlValue(u8),

    #[error("inner encryptor emits data on finalization, which stream framing can't carry")]
    InnerFinalizationUnsupported,

    // -- exhaustion -------------------------------------------------------
    #[error("encryptor can't securely encrypt any more chunks")]
    TooManyChunksEncrypted,

    #[error("random generator ran out of entropy")]
    RngOutOfEntropy,

    #[error("random generator seed is not valid")]
    InvalidRngSeed,

    // -- lifecycle --------------------------------------------------------
    #[error("already finalized")]
    AlreadyFinalized,

    // -- key exchange -----------------------------------------------------
    #[error("key exchange destination buffer is not valid")]
    InvalidKxDestination,

    #[error("key exchange failed")]
    KeyExchangeFailed,

    // -- configuration & registry -----------------------------------------
    #[error("invalid configuration: {0}")]
    InvalidConfig(&'static str),

    #[error("no such algorithm: {0}")]
    NoSuchAlgorithm(String),

    #[error("algorithm has a different type than requested")]
    InvalidAlgorithmType,

    #[error("algorithm {0} is already registered")]
    DuplicateAlgorithm(String),
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Marshal(err.to_string())
    }
}

/// Shorthand used across the crate.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_errors_are_comparable_after_clone() {
        let err = Error::StreamCorrupted;
        assert_eq!(err.clone(), Error::StreamCorrupted);
        assert_ne!(err, Error::StreamChunkTooBig);
    }

    #[test]
    fn test_control_value_is_rendered_in_hex() {
        let msg = Error::UnsupportedControlValue(0x2a).to_string();
        assert!(msg.contains("0x2a"), "got {msg}");
    }

    #[test]
    fn test_io_errors_flatten_into_marshal() {
        let io = std::io::Error::new(std::io::ErrorKind::WriteZero, "disk full");
        assert!(matches!(Error::from(io), Error::Marshal(m) if m.contains("disk full")));
    }
}
