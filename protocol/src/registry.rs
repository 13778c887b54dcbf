//! # Algorithm Registry
//!
//! Maps stable names (`"aes-256-gcm-counter"`, `"ed25519-sha-512"`, ...) to
//! algorithm instances, so configuration files and command lines can pick
//! algorithms without knowing their Rust types.
//!
//! Registration and lookup are two separate phases. A [`RegistryBuilder`] is
//! filled once at startup and turned into an immutable [`Registry`]; from
//! then on it's plain shared data (wrap it in an `Arc` if several owners
//! need it). No locks, no late registrations, no surprises.
//!
//! ```
//! use sealkit_protocol::keys::EncAlgo;
//! use sealkit_protocol::registry::Registry;
//!
//! let registry = Registry::with_defaults().unwrap();
//! let algo = registry.symm_enc("stream-chacha20-poly1305-counter").unwrap();
//! assert!(algo.info().enc.requires_finalization);
//! ```

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;
use tracing::debug;

use crate::enc::aead::{AeadCipher, AeadSymmAlgo};
use crate::enc::hybrid::KxEncAlgo;
use crate::enc::stream::StreamEncAlgo;
use crate::error::{Error, Result};
use crate::info::{AlgorithmType, AuthMode, EncInfo};
use crate::keys::{EncAlgo, EncAsymAlgo, EncSymmAlgo};
use crate::kx::X25519KxAlgo;
use crate::nonce::NonceConfig;
use crate::rng::{Blake3XofRngAlgo, OsRngAlgo, RngAlgo};
use crate::sign::{
    AsymSignAlgo, Blake3MacAlgo, DigestSignAlgo, Ed25519SignAlgo, HashFunction, SignAlgo, SymmSignAlgo,
};

/// A registered algorithm, tagged with the capability it provides.
#[derive(Clone)]
pub enum Algorithm {
    SymmEnc(Arc<dyn EncSymmAlgo>),
    AsymEnc(Arc<dyn EncAsymAlgo>),
    /// Hashes and MACs.
    SymmSign(Arc<dyn SymmSignAlgo>),
    AsymSign(Arc<dyn AsymSignAlgo>),
    Rng(Arc<dyn RngAlgo>),
}

impl Algorithm {
    pub fn algorithm_type(&self) -> AlgorithmType {
        match self {
            Algorithm::SymmEnc(algo) => algo.info().base.algorithm_type,
            Algorithm::AsymEnc(algo) => algo.info().base.algorithm_type,
            Algorithm::SymmSign(algo) => algo.info().base.algorithm_type,
            Algorithm::AsymSign(algo) => algo.info().base.algorithm_type,
            Algorithm::Rng(algo) => algo.info().base.algorithm_type,
        }
    }

    /// Summary of the algorithm's info, for listings.
    pub fn describe(&self, name: &str) -> AlgorithmSummary {
        let mut summary = AlgorithmSummary {
            name: name.to_string(),
            algorithm_type: self.algorithm_type(),
            is_secure: false,
            enc: None,
            auth_mode: None,
            signature_len: None,
            is_deterministic: None,
        };
        match self {
            Algorithm::SymmEnc(algo) => summary.fill_enc(algo.info()),
            Algorithm::AsymEnc(algo) => summary.fill_enc(algo.info()),
            Algorithm::SymmSign(algo) => {
                let info = algo.info();
                summary.is_secure = info.base.is_secure;
                summary.signature_len = Some(info.signature_len);
            }
            Algorithm::AsymSign(algo) => {
                let info = algo.info();
                summary.is_secure = info.base.is_secure;
                summary.signature_len = Some(info.signature_len);
            }
            Algorithm::Rng(algo) => {
                let info = algo.info();
                summary.is_secure = info.base.is_secure;
                summary.is_deterministic = Some(info.is_deterministic);
            }
        }
        summary
    }
}

/// Flat, serializable view of one registry entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AlgorithmSummary {
    pub name: String,
    pub algorithm_type: AlgorithmType,
    pub is_secure: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enc: Option<EncInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auth_mode: Option<AuthMode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signature_len: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_deterministic: Option<bool>,
}

impl AlgorithmSummary {
    fn fill_enc(&mut self, info: crate::info::EncAlgoInfo) {
        self.is_secure = info.base.is_secure;
        self.enc = Some(info.enc);
        self.auth_mode = Some(info.auth_mode);
    }
}

// ---------------------------------------------------------------------------
// Registration phase
// ---------------------------------------------------------------------------

/// Collects algorithms before the registry is frozen.
#[derive(Default)]
pub struct RegistryBuilder {
    algorithms: BTreeMap<String, Algorithm>,
}

impl RegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `algo` under `name`. Names are unique.
    pub fn register(&mut self, name: impl Into<String>, algo: Algorithm) -> Result<&mut Self> {
        let name = name.into();
        if self.algorithms.contains_key(&name) {
            return Err(Error::DuplicateAlgorithm(name));
        }
        self.algorithms.insert(name, algo);
        Ok(self)
    }

    /// Register every algorithm shipped with this crate.
    ///
    /// The insecure testing algorithms are never part of the defaults.
    pub fn register_defaults(&mut self) -> Result<&mut Self> {
        self.register_aead::<aes_gcm::Aes128Gcm>("aes-128-gcm")?
            .register_aead::<aes_gcm::Aes256Gcm>("aes-256-gcm")?
            .register_aead::<chacha20poly1305::ChaCha20Poly1305>("chacha20-poly1305")?
            .register_aead::<chacha20poly1305::XChaCha20Poly1305>("xchacha20-poly1305")?;

        let expander: Arc<dyn RngAlgo> = Arc::new(Blake3XofRngAlgo);
        self.register(
            "x25519-aes-256-gcm",
            Algorithm::AsymEnc(Arc::new(
                KxEncAlgo::new(
                    StreamEncAlgo::new(AeadSymmAlgo::<aes_gcm::Aes256Gcm>::counter()),
                    X25519KxAlgo,
                )
                .with_rng_algo(Arc::clone(&expander)),
            )),
        )?
        .register(
            "x25519-xchacha20-poly1305",
            Algorithm::AsymEnc(Arc::new(
                KxEncAlgo::new(
                    StreamEncAlgo::new(AeadSymmAlgo::<chacha20poly1305::XChaCha20Poly1305>::counter()),
                    X25519KxAlgo,
                )
                .with_rng_algo(expander),
            )),
        )?;

        for hash in [HashFunction::Sha256, HashFunction::Sha512, HashFunction::Blake3] {
            self.register(
                hash.to_string(),
                Algorithm::SymmSign(Arc::new(DigestSignAlgo::new(hash))),
            )?
            .register(
                format!("ed25519-{hash}"),
                Algorithm::AsymSign(Arc::new(Ed25519SignAlgo::with_hash(hash))),
            )?;
        }

        self.register("blake3-mac", Algorithm::SymmSign(Arc::new(Blake3MacAlgo)))?
            .register("os", Algorithm::Rng(Arc::new(OsRngAlgo)))?
            .register("blake3-xof", Algorithm::Rng(Arc::new(Blake3XofRngAlgo)))
    }

    /// `<name>-counter`, `<name>-rng` and their `stream-` wrapped versions.
    fn register_aead<C: AeadCipher>(&mut self, name: &str) -> Result<&mut Self> {
        for (suffix, nonces) in [("counter", NonceConfig::counter()), ("rng", NonceConfig::rng())] {
            self.register(
                format!("{name}-{suffix}"),
                Algorithm::SymmEnc(Arc::new(AeadSymmAlgo::<C>::new(nonces))),
            )?
            .register(
                format!("stream-{name}-{suffix}"),
                Algorithm::SymmEnc(Arc::new(StreamEncAlgo::new(AeadSymmAlgo::<C>::new(nonces)))),
            )?;
        }
        Ok(self)
    }

    pub fn build(self) -> Registry {
        debug!(algorithms = self.algorithms.len(), "registry built");
        Registry {
            algorithms: self.algorithms,
        }
    }
}

// ---------------------------------------------------------------------------
// Lookup phase
// ---------------------------------------------------------------------------

/// Immutable name-to-algorithm table.
#[derive(Clone, Default)]
pub struct Registry {
    algorithms: BTreeMap<String, Algorithm>,
}

impl Registry {
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::new()
    }

    /// Registry holding every algorithm from [`RegistryBuilder::register_defaults`].
    pub fn with_defaults() -> Result<Self> {
        let mut builder = RegistryBuilder::new();
        builder.register_defaults()?;
        Ok(builder.build())
    }

    pub fn get(&self, name: &str) -> Result<&Algorithm> {
        self.algorithms
            .get(name)
            .ok_or_else(|| Error::NoSuchAlgorithm(name.to_string()))
    }

    pub fn symm_enc(&self, name: &str) -> Result<Arc<dyn EncSymmAlgo>> {
        match self.get(name)? {
            Algorithm::SymmEnc(algo) => Ok(Arc::clone(algo)),
            _ => Err(Error::InvalidAlgorithmType),
        }
    }

    pub fn asym_enc(&self, name: &str) -> Result<Arc<dyn EncAsymAlgo>> {
        match self.get(name)? {
            Algorithm::AsymEnc(algo) => Ok(Arc::clone(algo)),
            _ => Err(Error::InvalidAlgorithmType),
        }
    }

    pub fn symm_sign(&self, name: &str) -> Result<Arc<dyn SymmSignAlgo>> {
        match self.get(name)? {
            Algorithm::SymmSign(algo) => Ok(Arc::clone(algo)),
            _ => Err(Error::InvalidAlgorithmType),
        }
    }

    pub fn asym_sign(&self, name: &str) -> Result<Arc<dyn AsymSignAlgo>> {
        match self.get(name)? {
            Algorithm::AsymSign(algo) => Ok(Arc::clone(algo)),
            _ => Err(Error::InvalidAlgorithmType),
        }
    }

    pub fn rng(&self, name: &str) -> Result<Arc<dyn RngAlgo>> {
        match self.get(name)? {
            Algorithm::Rng(algo) => Ok(Arc::clone(algo)),
            _ => Err(Error::InvalidAlgorithmType),
        }
    }

    /// Registered names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.algorithms.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Algorithm)> {
        self.algorithms.iter().map(|(name, algo)| (name.as_str(), algo))
    }

    /// Summaries of every entry, sorted by name.
    pub fn describe(&self) -> Vec<AlgorithmSummary> {
        self.iter().map(|(name, algo)| algo.describe(name)).collect()
    }

    pub fn len(&self) -> usize {
        self.algorithms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.algorithms.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enc::testing::XorSymmAlgo;
    use crate::info::EncType;

    #[test]
    fn test_duplicate_names_are_rejected() {
        let mut builder = Registry::builder();
        builder
            .register("xor", Algorithm::SymmEnc(Arc::new(XorSymmAlgo::default())))
            .unwrap();
        let err = builder
            .register("xor", Algorithm::Rng(Arc::new(OsRngAlgo)))
            .err();
        assert_eq!(err, Some(Error::DuplicateAlgorithm("xor".into())));

        let registry = builder.build();
        assert_eq!(registry.len(), 1);
        assert!(registry.symm_enc("xor").is_ok());
    }

    #[test]
    fn test_typed_lookup_errors() {
        let registry = Registry::with_defaults().unwrap();
        assert!(matches!(
            registry.symm_enc("rot13"),
            Err(Error::NoSuchAlgorithm(name)) if name == "rot13"
        ));
        assert!(matches!(registry.asym_enc("aes-256-gcm-rng"), Err(Error::InvalidAlgorithmType)));
        assert!(matches!(registry.rng("ed25519-sha-512"), Err(Error::InvalidAlgorithmType)));
    }

    #[test]
    fn test_defaults_cover_every_family() {
        let registry = Registry::with_defaults().unwrap();
        let names: Vec<&str> = registry.names().collect();
        for expected in [
            "aes-128-gcm-counter",
            "aes-256-gcm-rng",
            "chacha20-poly1305-counter",
            "stream-xchacha20-poly1305-rng",
            "x25519-aes-256-gcm",
            "x25519-xchacha20-poly1305",
            "sha-256",
            "sha-512",
            "blake3",
            "blake3-mac",
            "ed25519-sha-256",
            "ed25519-sha-512",
            "ed25519-blake3",
            "os",
            "blake3-xof",
        ] {
            assert!(names.contains(&expected), "missing {expected}");
        }
        assert_eq!(registry.len(), 16 + 2 + 6 + 1 + 2);

        // Names come back sorted.
        let mut sorted = names.clone();
        sorted.sort_unstable();
        assert_eq!(names, sorted);
    }

    #[test]
    fn test_default_infos_are_consistent() {
        let registry = Registry::with_defaults().unwrap();
        for (name, algo) in registry.iter() {
            let summary = algo.describe(name);
            assert!(summary.is_secure, "{name} should be secure");
            if let Some(enc) = summary.enc {
                assert!(enc.enc_type != EncType::Stream || enc.requires_finalization, "{name}");
            }
        }
        assert_eq!(
            registry.get("sha-256").unwrap().algorithm_type(),
            AlgorithmType::Hash
        );
        assert_eq!(
            registry.get("blake3-mac").unwrap().algorithm_type(),
            AlgorithmType::SymmSign
        );
    }

    #[test]
    fn test_summary_serializes_without_empty_fields() {
        let registry = Registry::with_defaults().unwrap();
        let json = serde_json::to_value(registry.get("os").unwrap().describe("os")).unwrap();
        assert_eq!(json["algorithm_type"], "rng");
        assert_eq!(json["is_deterministic"], false);
        assert!(json.get("enc").is_none());
    }
}
