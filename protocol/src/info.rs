//! # Algorithm Taxonomy
//!
//! Metadata every algorithm reports about itself. Callers use it to decide
//! whether an algorithm is good enough for a job *before* they feed data into
//! it: can I hand ciphertext chunks to the decryptor out of order? Will a
//! truncated message be noticed? Do I have to call `finalize`?
//!
//! ## Encryption types
//!
//! - [`EncType::Block`]: every `encrypt` call produces a self-contained
//!   ciphertext. Blocks can be decrypted independently and in any order.
//! - [`EncType::Chain`]: ciphertexts must reach the decryptor unmodified, one
//!   per `decrypt` call, in the order they were produced.
//! - [`EncType::Stream`]: like `Chain`, but the ciphertext is a plain byte
//!   stream. Slice it however you like on the way to `decrypt`.
//!
//! ## Authentication modes
//!
//! [`AuthMode`] is ordered from weakest to strongest, so "at least late
//! authenticated" is just `mode >= AuthMode::LateAuthenticated`.

use std::fmt;

use serde::{Deserialize, Serialize};

/// What kind of algorithm something is. Used by the registry to hand out
/// the right trait object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlgorithmType {
    SymmEnc,
    AsymEnc,
    Hash,
    SymmSign,
    AsymSign,
    Rng,
    Kx,
}

impl fmt::Display for AlgorithmType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AlgorithmType::SymmEnc => "symmetric encryption",
            AlgorithmType::AsymEnc => "asymmetric encryption",
            AlgorithmType::Hash => "hash",
            AlgorithmType::SymmSign => "symmetric signature",
            AlgorithmType::AsymSign => "asymmetric signature",
            AlgorithmType::Rng => "rng",
            AlgorithmType::Kx => "key exchange",
        };
        f.write_str(name)
    }
}

/// Information shared by every algorithm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BaseAlgorithmInfo {
    pub algorithm_type: AlgorithmType,
    /// `false` for the testing algorithms. Never ship those.
    pub is_secure: bool,
}

/// Relationship between consecutive encrypt/decrypt calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EncType {
    Block,
    Chain,
    Stream,
}

/// How strongly an algorithm detects tampering.
///
/// Variants are declared weakest first; the derived `Ord` relies on that.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthMode {
    /// No integrity at all. Flipped bits come out as flipped plaintext.
    NotAuthenticated,
    /// Tampering or a wrong key is detected eventually, possibly not at the
    /// call where it happened. Reordering and truncation are not.
    LateSoft,
    /// Like `LateSoft`, plus reordering and truncation are detected by
    /// `finalize` at the latest.
    LateAuthenticated,
    /// Every call verifies the data it was given before returning any of it.
    Eager,
}

impl AuthMode {
    /// Whether a message cut short is reported as an error.
    pub fn detects_truncation(self) -> bool {
        self >= AuthMode::LateAuthenticated
    }

    /// Whether modified ciphertext is reported at all.
    pub fn detects_tampering(self) -> bool {
        self >= AuthMode::LateSoft
    }
}

/// Per-instance information reported by encryptors and decryptors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncInfo {
    pub enc_type: EncType,
    pub requires_finalization: bool,
}

/// Full description of an encryption algorithm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncAlgoInfo {
    pub base: BaseAlgorithmInfo,
    pub enc: EncInfo,
    pub auth_mode: AuthMode,
}

impl EncAlgoInfo {
    /// Check the invariants that hold for every well-behaved algorithm:
    /// stream encryption always needs finalization, and block encryption
    /// never claims truncation detection (independent blocks can't know a
    /// sibling went missing).
    pub fn is_consistent(&self) -> bool {
        let stream_ok = self.enc.enc_type != EncType::Stream || self.enc.requires_finalization;
        let block_ok = self.enc.enc_type != EncType::Block || !self.auth_mode.detects_truncation();
        stream_ok && block_ok
    }
}

/// Description of a key exchange algorithm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KxAlgoInfo {
    pub base: BaseAlgorithmInfo,
    /// Largest number of shared bytes a single exchange can produce.
    /// `None` when the output can be stretched indefinitely.
    pub max_result_len: Option<usize>,
}

/// Description of a signing algorithm (symmetric or asymmetric).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignAlgoInfo {
    pub base: BaseAlgorithmInfo,
    pub signature_len: usize,
}

/// Description of a random generator algorithm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RngAlgoInfo {
    pub base: BaseAlgorithmInfo,
    /// `true` when the same seed always yields the same byte sequence.
    pub is_deterministic: bool,
    /// Shortest seed accepted. Zero for environment generators.
    pub min_seed_len: usize,
    /// Longest seed that still influences the output, if bounded.
    pub max_seed_len: Option<usize>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info(enc_type: EncType, requires_finalization: bool, auth_mode: AuthMode) -> EncAlgoInfo {
        EncAlgoInfo {
            base: BaseAlgorithmInfo {
                algorithm_type: AlgorithmType::SymmEnc,
                is_secure: true,
            },
            enc: EncInfo {
                enc_type,
                requires_finalization,
            },
            auth_mode,
        }
    }

    #[test]
    fn test_auth_modes_are_ordered_weakest_first() {
        assert!(AuthMode::NotAuthenticated < AuthMode::LateSoft);
        assert!(AuthMode::LateSoft < AuthMode::LateAuthenticated);
        assert!(AuthMode::LateAuthenticated < AuthMode::Eager);
    }

    #[test]
    fn test_truncation_detection_starts_at_late_authenticated() {
        assert!(!AuthMode::NotAuthenticated.detects_truncation());
        assert!(!AuthMode::LateSoft.detects_truncation());
        assert!(AuthMode::LateAuthenticated.detects_truncation());
        assert!(AuthMode::Eager.detects_truncation());
        assert!(AuthMode::LateSoft.detects_tampering());
    }

    #[test]
    fn test_consistency_rules() {
        assert!(info(EncType::Stream, true, AuthMode::LateAuthenticated).is_consistent());
        assert!(!info(EncType::Stream, false, AuthMode::LateAuthenticated).is_consistent());
        assert!(info(EncType::Block, false, AuthMode::LateSoft).is_consistent());
        assert!(!info(EncType::Block, false, AuthMode::Eager).is_consistent());
        assert!(info(EncType::Chain, false, AuthMode::NotAuthenticated).is_consistent());
    }

    #[test]
    fn test_info_serializes_in_snake_case() {
        let json = serde_json::to_string(&info(EncType::Chain, false, AuthMode::LateSoft)).unwrap();
        assert!(json.contains("\"chain\""), "{json}");
        assert!(json.contains("\"late_soft\""), "{json}");
        assert!(json.contains("\"symm_enc\""), "{json}");
    }
}
