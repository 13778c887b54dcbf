//! # Hybrid Encryption
//!
//! Public-key encryption built from a key exchange and a symmetric algorithm.
//!
//! Every encryptor generates a fresh ephemeral pair, runs the exchange
//! against the recipient's long-term public key and turns the shared bytes
//! into a one-time symmetric key. The ephemeral public key travels in front
//! of the ciphertext:
//!
//! ```text
//! message := varint(len(ephemeral_public)) ephemeral_public inner_ciphertext
//! ```
//!
//! The recipient runs the same exchange from the other side (ephemeral
//! public, long-term secret), derives the same key and decrypts the rest.
//!
//! ## Key derivation
//!
//! The shared bytes become the symmetric key by feeding them to the
//! symmetric algorithm's `generate_key` as its only randomness. With an
//! expander ([`KxEncAlgo::with_rng_algo`]) they seed a deterministic
//! generator first; without one they are used as-is and must be at least as
//! long as the symmetric key.
//!
//! ## Guarantees
//!
//! Anybody can encrypt to a public key, so the ephemeral header proves
//! nothing about the sender. A Block-type inner algorithm is reported as
//! `Chain` with [`AuthMode::NotAuthenticated`]: blocks share one per-message
//! key and the first one has to come first. Chain and Stream inner
//! algorithms keep their type and mode.

use std::io;
use std::sync::Arc;

use rand::rngs::OsRng;
use rand_core::RngCore;
use tracing::{debug, trace};
use zeroize::Zeroizing;

use crate::codec::IntEncoding;
use crate::config::{DEFAULT_KX_RESULT_LENGTH, DEFAULT_MAX_EPHEMERAL_KEY_LENGTH, VARINT_MAX_LENGTH};
use crate::error::{Error, Result};
use crate::info::{AlgorithmType, AuthMode, EncAlgoInfo, EncInfo, EncType};
use crate::keys::{
    DecKey, Decryptor, EncAlgo, EncAsymAlgo, EncKey, EncSymmAlgo, EncSymmKey, Encryptor, MarshalKey,
};
use crate::kx::KxAlgo;
use crate::lifecycle::Lifecycle;
use crate::rng::{FixedBytesRng, RngAlgo};

// ---------------------------------------------------------------------------
// Algorithm
// ---------------------------------------------------------------------------

/// Key exchange `K` feeding one-time keys to symmetric algorithm `S`.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
///
/// use sealkit_protocol::enc::aead::Aes256GcmAlgo;
/// use sealkit_protocol::enc::hybrid::KxEncAlgo;
/// use sealkit_protocol::keys::{decrypt_all, encrypt_all, EncAsymAlgo};
/// use sealkit_protocol::kx::X25519KxAlgo;
/// use sealkit_protocol::rng::Blake3XofRngAlgo;
///
/// let algo = KxEncAlgo::new(Aes256GcmAlgo::counter(), X25519KxAlgo)
///     .with_rng_algo(Arc::new(Blake3XofRngAlgo));
/// let (public, secret) = algo.generate_key_pair(&mut rand::rngs::OsRng).unwrap();
///
/// let sealed = encrypt_all(public.as_ref(), b"for your eyes only").unwrap();
/// assert_eq!(decrypt_all(secret.as_ref(), &sealed).unwrap(), b"for your eyes only");
/// ```
pub struct KxEncAlgo<S, K> {
    symm: Arc<S>,
    kx: Arc<K>,
    kx_result_len: usize,
    rng_algo: Option<Arc<dyn RngAlgo>>,
    max_ephemeral_len: usize,
}

impl<S, K> Clone for KxEncAlgo<S, K> {
    fn clone(&self) -> Self {
        Self {
            symm: Arc::clone(&self.symm),
            kx: Arc::clone(&self.kx),
            kx_result_len: self.kx_result_len,
            rng_algo: self.rng_algo.clone(),
            max_ephemeral_len: self.max_ephemeral_len,
        }
    }
}

impl<S: EncSymmAlgo + 'static, K: KxAlgo + 'static> KxEncAlgo<S, K> {
    /// Uses as many shared bytes as the exchange can produce and no expander.
    pub fn new(symm: S, kx: K) -> Self {
        let kx_result_len = kx.info().max_result_len.unwrap_or(DEFAULT_KX_RESULT_LENGTH);
        Self {
            symm: Arc::new(symm),
            kx: Arc::new(kx),
            kx_result_len,
            rng_algo: None,
            max_ephemeral_len: DEFAULT_MAX_EPHEMERAL_KEY_LENGTH,
        }
    }

    /// Seed `rng_algo` with the shared bytes and derive keys from its output.
    pub fn with_rng_algo(mut self, rng_algo: Arc<dyn RngAlgo>) -> Self {
        self.rng_algo = Some(rng_algo);
        self
    }

    pub fn with_kx_result_len(mut self, kx_result_len: usize) -> Self {
        self.kx_result_len = kx_result_len;
        self
    }

    /// Longest marshaled ephemeral public key the decryptor will buffer.
    pub fn with_max_ephemeral_len(mut self, max_ephemeral_len: usize) -> Self {
        self.max_ephemeral_len = max_ephemeral_len;
        self
    }

    pub fn kx_result_len(&self) -> usize {
        self.kx_result_len
    }

    pub fn symm(&self) -> &S {
        &self.symm
    }

    pub fn kx(&self) -> &K {
        &self.kx
    }

    /// Run the exchange and turn its output into a symmetric key.
    fn derive_key(&self, public: &K::Public, secret: &K::Secret) -> Result<Box<dyn EncSymmKey>> {
        let mut shared = Zeroizing::new(vec![0u8; self.kx_result_len]);
        self.kx.exchange(public, secret, &mut shared)?;
        match &self.rng_algo {
            Some(rng_algo) => {
                let mut expander = rng_algo.make_rng(&shared)?;
                self.symm.generate_key(expander.as_mut())
            }
            None => self.symm.generate_key(&mut FixedBytesRng::new(&shared)),
        }
    }

    fn worker_info(&self) -> EncInfo {
        self.info().enc
    }
}

impl<S: EncSymmAlgo + 'static, K: KxAlgo + 'static> EncAlgo for KxEncAlgo<S, K> {
    fn info(&self) -> EncAlgoInfo {
        let mut info = self.symm.info();
        let rng_secure = self
            .rng_algo
            .as_ref()
            .map_or(true, |rng_algo| rng_algo.info().base.is_secure);

        info.base.algorithm_type = AlgorithmType::AsymEnc;
        info.base.is_secure = info.base.is_secure && self.kx.info().base.is_secure && rng_secure;
        if info.enc.enc_type == EncType::Block {
            info.enc.enc_type = EncType::Chain;
            info.auth_mode = AuthMode::NotAuthenticated;
        }
        info
    }
}

impl<S: EncSymmAlgo + 'static, K: KxAlgo + 'static> EncAsymAlgo for KxEncAlgo<S, K> {
    fn generate_key_pair(
        &self,
        rng: &mut dyn RngCore,
    ) -> Result<(Box<dyn EncKey>, Box<dyn DecKey>)> {
        let (public, secret) = self.kx.generate_pair(rng)?;
        Ok((self.enc_key(public), self.dec_key(secret)))
    }

    fn parse_enc_key(&self, data: &[u8]) -> Result<Box<dyn EncKey>> {
        Ok(self.enc_key(self.kx.parse_public(data)?))
    }

    fn parse_dec_key(&self, data: &[u8]) -> Result<Box<dyn DecKey>> {
        Ok(self.dec_key(self.kx.parse_secret(data)?))
    }
}

impl<S: EncSymmAlgo + 'static, K: KxAlgo + 'static> KxEncAlgo<S, K> {
    fn enc_key(&self, public: K::Public) -> Box<dyn EncKey> {
        Box::new(KxEncKey {
            algo: self.clone(),
            public,
        })
    }

    fn dec_key(&self, secret: K::Secret) -> Box<dyn DecKey> {
        Box::new(KxDecKey {
            algo: self.clone(),
            secret: Arc::new(secret),
        })
    }
}

// ---------------------------------------------------------------------------
// Keys
// ---------------------------------------------------------------------------

/// Recipient's long-term public key.
struct KxEncKey<S, K: KxAlgo> {
    algo: KxEncAlgo<S, K>,
    public: K::Public,
}

/// Recipient's long-term secret. Shared with the decryptors it makes.
struct KxDecKey<S, K: KxAlgo> {
    algo: KxEncAlgo<S, K>,
    secret: Arc<K::Secret>,
}

impl<S, K: KxAlgo> MarshalKey for KxEncKey<S, K> {
    fn marshal_to_writer(&self, writer: &mut dyn io::Write) -> Result<()> {
        self.public.marshal_to_writer(writer)
    }
}

impl<S, K: KxAlgo> MarshalKey for KxDecKey<S, K> {
    fn marshal_to_writer(&self, writer: &mut dyn io::Write) -> Result<()> {
        self.secret.marshal_to_writer(writer)
    }
}

impl<S: EncSymmAlgo + 'static, K: KxAlgo + 'static> EncKey for KxEncKey<S, K> {
    fn make_encryptor(&self) -> Result<Box<dyn Encryptor>> {
        let (ephemeral_public, ephemeral_secret) = self.algo.kx.generate_pair(&mut OsRng)?;
        let key = self.algo.derive_key(&self.public, &ephemeral_secret)?;
        let inner = key.make_encryptor()?;

        let marshaled = ephemeral_public.marshal_to_vec()?;
        let mut header = Vec::with_capacity(VARINT_MAX_LENGTH + marshaled.len());
        IntEncoding::Varint.encode(marshaled.len() as u64, &mut header)?;
        header.extend_from_slice(&marshaled);

        Ok(Box::new(KxEncryptor {
            enc: self.algo.worker_info(),
            header: Some(header),
            inner,
            state: Lifecycle::Active,
        }))
    }
}

impl<S: EncSymmAlgo + 'static, K: KxAlgo + 'static> DecKey for KxDecKey<S, K> {
    fn make_decryptor(&self) -> Result<Box<dyn Decryptor>> {
        Ok(Box::new(KxDecryptor {
            enc: self.algo.worker_info(),
            algo: self.algo.clone(),
            secret: Arc::clone(&self.secret),
            header: Vec::new(),
            key_len: None,
            inner: None,
            state: Lifecycle::Active,
        }))
    }
}

// ---------------------------------------------------------------------------
// Workers
// ---------------------------------------------------------------------------

/// Writes the ephemeral header once, then hands everything to the inner
/// encryptor.
struct KxEncryptor {
    enc: EncInfo,
    /// Ephemeral header, until it has been written.
    header: Option<Vec<u8>>,
    inner: Box<dyn Encryptor>,
    state: Lifecycle,
}

impl KxEncryptor {
    fn write_header(&mut self, out: &mut Vec<u8>) {
        if let Some(header) = self.header.take() {
            out.extend_from_slice(&header);
        }
    }
}

impl Encryptor for KxEncryptor {
    fn enc_info(&self) -> EncInfo {
        self.enc
    }

    fn encrypt(&mut self, input: &[u8], out: &mut Vec<u8>) -> Result<usize> {
        self.state.check()?;
        let start = out.len();
        self.write_header(out);
        match self.inner.encrypt(input, out) {
            Ok(_) => Ok(out.len() - start),
            Err(err) => {
                out.truncate(start);
                Err(self.state.poison(err))
            }
        }
    }

    fn finalize(&mut self, out: &mut Vec<u8>) -> Result<usize> {
        self.state.check()?;
        let start = out.len();
        // A message that was never written to still needs its header.
        self.write_header(out);
        if let Err(err) = self.inner.finalize(out) {
            out.truncate(start);
            return Err(self.state.poison(err));
        }
        self.state.finish();
        debug!("hybrid encryptor finalized");
        Ok(out.len() - start)
    }
}

/// Parses the ephemeral header from arbitrarily sliced input, then opens the
/// inner decryptor.
struct KxDecryptor<S, K: KxAlgo> {
    enc: EncInfo,
    algo: KxEncAlgo<S, K>,
    secret: Arc<K::Secret>,
    /// Length prefix bytes, then ephemeral key bytes.
    header: Vec<u8>,
    key_len: Option<usize>,
    inner: Option<Box<dyn Decryptor>>,
    state: Lifecycle,
}

impl<S: EncSymmAlgo + 'static, K: KxAlgo + 'static> KxDecryptor<S, K> {
    fn absorb(&mut self, mut input: &[u8], out: &mut Vec<u8>) -> Result<()> {
        if self.inner.is_none() {
            input = self.read_header(input)?;
        }
        if let Some(inner) = self.inner.as_mut() {
            if !input.is_empty() {
                inner.decrypt(input, out)?;
            }
        }
        Ok(())
    }

    /// Consume header bytes from `input` and return what's left over.
    fn read_header<'a>(&mut self, mut input: &'a [u8]) -> Result<&'a [u8]> {
        let key_len = loop {
            if let Some(len) = self.key_len {
                break len;
            }
            let Some((&byte, rest)) = input.split_first() else {
                return Ok(input);
            };
            self.header.push(byte);
            input = rest;

            let decoded = IntEncoding::Varint
                .decode(&self.header)
                .map_err(|_| Error::StreamCorrupted)?;
            if let Some((len, _)) = decoded {
                let len = usize::try_from(len).map_err(|_| Error::StreamChunkTooBig)?;
                if len > self.algo.max_ephemeral_len {
                    return Err(Error::StreamChunkTooBig);
                }
                self.header.clear();
                self.key_len = Some(len);
            }
        };

        let take = (key_len - self.header.len()).min(input.len());
        self.header.extend_from_slice(&input[..take]);
        if self.header.len() == key_len {
            self.open_inner()?;
        }
        Ok(&input[take..])
    }

    fn open_inner(&mut self) -> Result<()> {
        let ephemeral_public = self.algo.kx.parse_public(&self.header)?;
        let key = self.algo.derive_key(&ephemeral_public, &self.secret)?;
        self.inner = Some(key.make_decryptor()?);
        self.header.clear();
        trace!("hybrid ephemeral header accepted");
        Ok(())
    }
}

impl<S: EncSymmAlgo + 'static, K: KxAlgo + 'static> Decryptor for KxDecryptor<S, K> {
    fn enc_info(&self) -> EncInfo {
        self.enc
    }

    fn decrypt(&mut self, input: &[u8], out: &mut Vec<u8>) -> Result<usize> {
        self.state.check()?;
        let start = out.len();
        match self.absorb(input, out) {
            Ok(()) => Ok(out.len() - start),
            Err(err) => {
                out.truncate(start);
                Err(self.state.poison(err))
            }
        }
    }

    fn finalize(&mut self) -> Result<()> {
        self.state.check()?;
        let result = match self.inner.as_mut() {
            Some(inner) => inner.finalize(),
            // Cut off inside the header.
            None if self.key_len.is_some() || !self.header.is_empty() => Err(Error::StreamCorrupted),
            None if self.enc.requires_finalization => Err(Error::StreamCorrupted),
            None => Ok(()),
        };
        self.state.guard(result)?;
        self.state.finish();
        debug!("hybrid decryptor finalized");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::X25519_KEY_LENGTH;
    use crate::enc::aead::{Aes256GcmAlgo, ChaCha20Poly1305Algo, XChaCha20Poly1305Algo};
    use crate::enc::stream::StreamEncAlgo;
    use crate::enc::testing::XorSymmAlgo;
    use crate::keys::{decrypt_all, encrypt_all};
    use crate::kx::X25519KxAlgo;
    use crate::rng::{Blake3XofRngAlgo, OsRngAlgo};

    fn stream_algo() -> KxEncAlgo<StreamEncAlgo<XChaCha20Poly1305Algo>, X25519KxAlgo> {
        KxEncAlgo::new(StreamEncAlgo::new(XChaCha20Poly1305Algo::counter()), X25519KxAlgo)
            .with_rng_algo(Arc::new(Blake3XofRngAlgo))
    }

    #[test]
    fn test_stream_inner_survives_bytewise_delivery() {
        let algo = stream_algo();
        let (public, secret) = algo.generate_key_pair(&mut OsRng).unwrap();

        let mut enc = public.make_encryptor().unwrap();
        let mut wire = Vec::new();
        enc.encrypt(b"split ", &mut wire).unwrap();
        enc.encrypt(b"any way you like", &mut wire).unwrap();
        enc.finalize(&mut wire).unwrap();

        let mut dec = secret.make_decryptor().unwrap();
        let mut plain = Vec::new();
        for byte in &wire {
            dec.decrypt(std::slice::from_ref(byte), &mut plain).unwrap();
        }
        dec.finalize().unwrap();
        assert_eq!(plain, b"split any way you like");
    }

    #[test]
    fn test_header_carries_ephemeral_public_key() {
        let algo = stream_algo();
        let (public, secret) = algo.generate_key_pair(&mut OsRng).unwrap();
        let wire = encrypt_all(public.as_ref(), b"").unwrap();

        assert_eq!(wire[0] as usize, X25519_KEY_LENGTH);
        let ephemeral = &wire[1..1 + X25519_KEY_LENGTH];
        assert_ne!(ephemeral, public.marshal_to_vec().unwrap().as_slice());

        // Header alone plus the empty stream's terminal chunk decodes.
        assert_eq!(decrypt_all(secret.as_ref(), &wire).unwrap(), b"");
    }

    #[test]
    fn test_fresh_ephemeral_key_per_message() {
        let algo = stream_algo();
        let (public, _) = algo.generate_key_pair(&mut OsRng).unwrap();
        let a = encrypt_all(public.as_ref(), b"same").unwrap();
        let b = encrypt_all(public.as_ref(), b"same").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_block_inner_is_reported_as_chain() {
        let algo = KxEncAlgo::new(Aes256GcmAlgo::rng(), X25519KxAlgo);
        let info = algo.info();
        assert_eq!(info.base.algorithm_type, AlgorithmType::AsymEnc);
        assert_eq!(info.enc.enc_type, EncType::Chain);
        assert_eq!(info.auth_mode, AuthMode::NotAuthenticated);
        assert!(info.is_consistent());

        let (public, secret) = algo.generate_key_pair(&mut OsRng).unwrap();
        let mut enc = public.make_encryptor().unwrap();
        assert_eq!(enc.enc_info().enc_type, EncType::Chain);
        let (mut first, mut second) = (Vec::new(), Vec::new());
        enc.encrypt(b"one", &mut first).unwrap();
        enc.encrypt(b"two", &mut second).unwrap();
        enc.finalize(&mut second).unwrap();

        let mut dec = secret.make_decryptor().unwrap();
        let mut plain = Vec::new();
        dec.decrypt(&first, &mut plain).unwrap();
        dec.decrypt(&second, &mut plain).unwrap();
        dec.finalize().unwrap();
        assert_eq!(plain, b"onetwo");
    }

    #[test]
    fn test_stream_and_chain_inner_keep_their_mode() {
        let stream = stream_algo().info();
        assert_eq!(stream.enc.enc_type, EncType::Stream);
        assert_eq!(stream.auth_mode, AuthMode::LateAuthenticated);

        let chain = KxEncAlgo::new(ChaCha20Poly1305Algo::counter(), X25519KxAlgo).info();
        assert_eq!(chain.enc.enc_type, EncType::Chain);
        assert_eq!(chain.auth_mode, AuthMode::LateSoft);
    }

    #[test]
    fn test_security_flag_is_the_weakest_part() {
        let weak = KxEncAlgo::new(XorSymmAlgo::default(), X25519KxAlgo).info();
        assert!(!weak.base.is_secure);
        assert!(stream_algo().info().base.is_secure);
    }

    #[test]
    fn test_raw_exchange_output_without_expander() {
        let algo = KxEncAlgo::new(Aes256GcmAlgo::counter(), X25519KxAlgo);
        assert_eq!(algo.kx_result_len(), 32);
        let (public, secret) = algo.generate_key_pair(&mut OsRng).unwrap();
        let sealed = encrypt_all(public.as_ref(), b"raw").unwrap();
        assert_eq!(decrypt_all(secret.as_ref(), &sealed).unwrap(), b"raw");
    }

    #[test]
    fn test_short_exchange_output_cannot_fill_key() {
        let algo = KxEncAlgo::new(Aes256GcmAlgo::counter(), X25519KxAlgo).with_kx_result_len(16);
        let (public, _) = algo.generate_key_pair(&mut OsRng).unwrap();
        assert!(matches!(public.make_encryptor(), Err(Error::RngOutOfEntropy)));
    }

    #[test]
    fn test_nondeterministic_expander_cannot_agree() {
        // Each side would draw unrelated keys from the OS.
        let algo = KxEncAlgo::new(Aes256GcmAlgo::counter(), X25519KxAlgo)
            .with_rng_algo(Arc::new(OsRngAlgo));
        let (public, secret) = algo.generate_key_pair(&mut OsRng).unwrap();
        let sealed = encrypt_all(public.as_ref(), b"lost").unwrap();
        assert_eq!(
            decrypt_all(secret.as_ref(), &sealed),
            Err(Error::DecryptionAuthFailed)
        );
    }

    #[test]
    fn test_wrong_recipient_fails() {
        let algo = stream_algo();
        let (public, _) = algo.generate_key_pair(&mut OsRng).unwrap();
        let (_, other_secret) = algo.generate_key_pair(&mut OsRng).unwrap();
        let sealed = encrypt_all(public.as_ref(), b"not for you").unwrap();
        assert_eq!(
            decrypt_all(other_secret.as_ref(), &sealed),
            Err(Error::DecryptionAuthFailed)
        );
    }

    #[test]
    fn test_oversized_ephemeral_header_is_refused() {
        let algo = stream_algo();
        let (_, secret) = algo.generate_key_pair(&mut OsRng).unwrap();
        let mut dec = secret.make_decryptor().unwrap();
        // Varint 2^21, above the 1 MiB default.
        assert_eq!(
            dec.decrypt(&[0x80, 0x80, 0x80, 0x01], &mut Vec::new()),
            Err(Error::StreamChunkTooBig)
        );

        let strict = stream_algo().with_max_ephemeral_len(16);
        let (_, secret) = strict.generate_key_pair(&mut OsRng).unwrap();
        let mut dec = secret.make_decryptor().unwrap();
        assert_eq!(dec.decrypt(&[32], &mut Vec::new()), Err(Error::StreamChunkTooBig));
    }

    #[test]
    fn test_empty_ephemeral_key_fails_to_parse() {
        let algo = stream_algo();
        let (_, secret) = algo.generate_key_pair(&mut OsRng).unwrap();
        let mut dec = secret.make_decryptor().unwrap();
        assert_eq!(dec.decrypt(&[0], &mut Vec::new()), Err(Error::KeyParse));
    }

    #[test]
    fn test_finalize_without_header() {
        let (_, secret) = stream_algo().generate_key_pair(&mut OsRng).unwrap();
        let mut dec = secret.make_decryptor().unwrap();
        assert_eq!(dec.finalize(), Err(Error::StreamCorrupted));

        let chain = KxEncAlgo::new(ChaCha20Poly1305Algo::counter(), X25519KxAlgo);
        let (_, secret) = chain.generate_key_pair(&mut OsRng).unwrap();
        let mut dec = secret.make_decryptor().unwrap();
        dec.finalize().unwrap();
        assert_eq!(dec.finalize(), Err(Error::AlreadyFinalized));
    }

    #[test]
    fn test_finalize_inside_header_is_corrupt() {
        let chain = KxEncAlgo::new(ChaCha20Poly1305Algo::counter(), X25519KxAlgo);
        let (public, secret) = chain.generate_key_pair(&mut OsRng).unwrap();
        let sealed = encrypt_all(public.as_ref(), b"x").unwrap();

        let mut dec = secret.make_decryptor().unwrap();
        dec.decrypt(&sealed[..10], &mut Vec::new()).unwrap();
        assert_eq!(dec.finalize(), Err(Error::StreamCorrupted));
    }

    #[test]
    fn test_keys_marshal_to_exchange_halves() {
        let algo = stream_algo();
        let (public, secret) = algo.generate_key_pair(&mut OsRng).unwrap();

        let public = algo.parse_enc_key(&public.marshal_to_vec().unwrap()).unwrap();
        let secret = algo.parse_dec_key(&secret.marshal_to_vec().unwrap()).unwrap();
        let sealed = encrypt_all(public.as_ref(), b"portable").unwrap();
        assert_eq!(decrypt_all(secret.as_ref(), &sealed).unwrap(), b"portable");

        assert!(matches!(algo.parse_enc_key(&[1, 2, 3]), Err(Error::KeyParse)));
    }

    #[test]
    fn test_decryptor_poisoned_after_tamper() {
        let algo = stream_algo();
        let (public, secret) = algo.generate_key_pair(&mut OsRng).unwrap();
        let mut sealed = encrypt_all(public.as_ref(), b"tamper with me").unwrap();
        let last = sealed.len() - 1;
        sealed[last] ^= 0x01;

        let mut dec = secret.make_decryptor().unwrap();
        let mut plain = vec![7];
        let err = dec.decrypt(&sealed, &mut plain).unwrap_err();
        assert_eq!(err, Error::DecryptionAuthFailed);
        assert_eq!(plain, vec![7]);
        assert_eq!(dec.finalize(), Err(err));
    }
}
