//! Insecure algorithms for tests and benchmarks.
//!
//! [`BlankSymmAlgo`] copies bytes through untouched. [`XorSymmAlgo`] XORs them
//! with a repeating key. Both are deterministic, which makes framing bugs easy
//! to see in a hex dump, and both report `is_secure: false`. Never register
//! them anywhere real data flows.

use std::io;

use rand_core::RngCore;
use zeroize::Zeroizing;

use crate::error::{Error, Result};
use crate::info::{AlgorithmType, AuthMode, BaseAlgorithmInfo, EncAlgoInfo, EncInfo, EncType};
use crate::keys::{DecKey, Decryptor, EncAlgo, EncKey, EncSymmAlgo, EncSymmKey, Encryptor, MarshalKey};
use crate::lifecycle::Lifecycle;
use crate::rng;

fn insecure_stream_info() -> EncAlgoInfo {
    EncAlgoInfo {
        base: BaseAlgorithmInfo {
            algorithm_type: AlgorithmType::SymmEnc,
            is_secure: false,
        },
        enc: STREAM_ENC_INFO,
        auth_mode: AuthMode::NotAuthenticated,
    }
}

const STREAM_ENC_INFO: EncInfo = EncInfo {
    enc_type: EncType::Stream,
    // Finalization is a no-op, but stream-type workers always expect it.
    requires_finalization: true,
};

// ---------------------------------------------------------------------------
// Blank
// ---------------------------------------------------------------------------

/// Identity "cipher". Keys are empty.
#[derive(Debug, Clone, Copy, Default)]
pub struct BlankSymmAlgo;

impl EncAlgo for BlankSymmAlgo {
    fn info(&self) -> EncAlgoInfo {
        insecure_stream_info()
    }
}

impl EncSymmAlgo for BlankSymmAlgo {
    fn generate_key(&self, _rng: &mut dyn RngCore) -> Result<Box<dyn EncSymmKey>> {
        Ok(Box::new(XorKey::blank()))
    }

    fn parse_key(&self, data: &[u8]) -> Result<Box<dyn EncSymmKey>> {
        if !data.is_empty() {
            return Err(Error::KeyParse);
        }
        Ok(Box::new(XorKey::blank()))
    }
}

// ---------------------------------------------------------------------------
// XOR
// ---------------------------------------------------------------------------

/// Repeating-key XOR. The key position carries over between calls, so the
/// encryptor and decryptor must see the same byte sequence.
#[derive(Debug, Clone, Copy)]
pub struct XorSymmAlgo {
    pub min_key_len: usize,
    pub max_key_len: Option<usize>,
    pub generate_key_len: usize,
}

impl Default for XorSymmAlgo {
    fn default() -> Self {
        Self {
            min_key_len: 1,
            max_key_len: None,
            generate_key_len: 32,
        }
    }
}

impl EncAlgo for XorSymmAlgo {
    fn info(&self) -> EncAlgoInfo {
        insecure_stream_info()
    }
}

impl EncSymmAlgo for XorSymmAlgo {
    fn generate_key(&self, rng: &mut dyn RngCore) -> Result<Box<dyn EncSymmKey>> {
        let mut key = Zeroizing::new(vec![0u8; self.generate_key_len]);
        rng::fill(rng, &mut key)?;
        Ok(Box::new(XorKey { key }))
    }

    fn parse_key(&self, data: &[u8]) -> Result<Box<dyn EncSymmKey>> {
        if data.len() < self.min_key_len || self.max_key_len.is_some_and(|max| data.len() > max) {
            return Err(Error::KeyParse);
        }
        Ok(Box::new(XorKey {
            key: Zeroizing::new(data.to_vec()),
        }))
    }
}

/// An empty key turns XOR into the blank cipher, so both share one key type.
struct XorKey {
    key: Zeroizing<Vec<u8>>,
}

impl XorKey {
    fn blank() -> Self {
        Self {
            key: Zeroizing::new(Vec::new()),
        }
    }

    fn worker(&self) -> XorWorker {
        XorWorker {
            key: self.key.clone(),
            pos: 0,
            state: Lifecycle::Active,
        }
    }
}

impl MarshalKey for XorKey {
    fn marshal_to_writer(&self, writer: &mut dyn io::Write) -> Result<()> {
        writer.write_all(&self.key)?;
        Ok(())
    }
}

impl EncKey for XorKey {
    fn make_encryptor(&self) -> Result<Box<dyn Encryptor>> {
        Ok(Box::new(self.worker()))
    }
}

impl DecKey for XorKey {
    fn make_decryptor(&self) -> Result<Box<dyn Decryptor>> {
        Ok(Box::new(self.worker()))
    }
}

/// XOR is its own inverse: one worker type serves both directions.
struct XorWorker {
    key: Zeroizing<Vec<u8>>,
    pos: usize,
    state: Lifecycle,
}

impl XorWorker {
    fn apply(&mut self, input: &[u8], out: &mut Vec<u8>) -> Result<usize> {
        self.state.check()?;
        if self.key.is_empty() {
            out.extend_from_slice(input);
            return Ok(input.len());
        }
        out.reserve(input.len());
        for &byte in input {
            out.push(byte ^ self.key[self.pos]);
            self.pos = (self.pos + 1) % self.key.len();
        }
        Ok(input.len())
    }

    fn finish(&mut self) -> Result<()> {
        self.state.check()?;
        self.state.finish();
        Ok(())
    }
}

impl Encryptor for XorWorker {
    fn enc_info(&self) -> EncInfo {
        STREAM_ENC_INFO
    }

    fn encrypt(&mut self, input: &[u8], out: &mut Vec<u8>) -> Result<usize> {
        self.apply(input, out)
    }

    fn finalize(&mut self, _out: &mut Vec<u8>) -> Result<usize> {
        self.finish()?;
        Ok(0)
    }
}

impl Decryptor for XorWorker {
    fn enc_info(&self) -> EncInfo {
        STREAM_ENC_INFO
    }

    fn decrypt(&mut self, input: &[u8], out: &mut Vec<u8>) -> Result<usize> {
        self.apply(input, out)
    }

    fn finalize(&mut self) -> Result<()> {
        self.finish()
    }
}
