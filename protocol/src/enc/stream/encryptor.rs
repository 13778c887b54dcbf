//! Stream framing encoder.

use tracing::{debug, trace};
use zeroize::Zeroizing;

use super::{StreamConfig, STREAM_ENC_INFO};
use crate::config::{CONTROL_CHUNK_COUNTER, FIRST_DATA_CHUNK_COUNTER, STREAM_END};
use crate::error::{Error, Result};
use crate::info::EncInfo;
use crate::keys::Encryptor;
use crate::lifecycle::Lifecycle;

/// Buffers plaintext into fixed-size chunks and emits them framed.
///
/// Nothing leaves the encryptor until a full chunk is buffered or
/// [`Encryptor::finalize`] is called. Small writes add latency, never loss.
pub struct StreamEncryptor<E> {
    inner: E,
    config: StreamConfig,
    /// Plaintext waiting for a full chunk.
    pending: Zeroizing<Vec<u8>>,
    /// Counter prefix plus payload handed to the inner encryptor.
    preimage: Zeroizing<Vec<u8>>,
    /// Inner ciphertext for the chunk being emitted.
    sealed: Vec<u8>,
    /// Counter for the next data chunk.
    counter: u64,
    state: Lifecycle,
}

impl<E: Encryptor> StreamEncryptor<E> {
    pub fn new(inner: E, config: StreamConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            inner,
            config,
            pending: Zeroizing::new(Vec::with_capacity(config.chunk_size)),
            preimage: Zeroizing::new(Vec::new()),
            sealed: Vec::new(),
            counter: FIRST_DATA_CHUNK_COUNTER,
            state: Lifecycle::Active,
        })
    }

    /// Number of data chunks emitted so far.
    pub fn chunks_emitted(&self) -> u64 {
        self.counter - FIRST_DATA_CHUNK_COUNTER
    }

    fn absorb(&mut self, mut input: &[u8], out: &mut Vec<u8>) -> Result<()> {
        while !input.is_empty() {
            let take = (self.config.chunk_size - self.pending.len()).min(input.len());
            self.pending.extend_from_slice(&input[..take]);
            input = &input[take..];

            if self.pending.len() == self.config.chunk_size {
                self.emit_data_chunk(out)?;
            }
        }
        Ok(())
    }

    fn emit_data_chunk(&mut self, out: &mut Vec<u8>) -> Result<()> {
        self.preimage.clear();
        self.config
            .counter_encoding
            .encode(self.counter, &mut self.preimage)
            .map_err(|_| Error::TooManyChunksEncrypted)?;
        self.preimage.extend_from_slice(&self.pending);
        self.seal_preimage(out)?;

        self.pending.clear();
        self.counter = self
            .counter
            .checked_add(1)
            .ok_or(Error::TooManyChunksEncrypted)?;
        Ok(())
    }

    fn emit_terminal_chunk(&mut self, out: &mut Vec<u8>) -> Result<()> {
        let last = self.counter - FIRST_DATA_CHUNK_COUNTER;

        self.preimage.clear();
        self.config
            .counter_encoding
            .encode(CONTROL_CHUNK_COUNTER, &mut self.preimage)?;
        self.preimage.push(STREAM_END);
        self.config
            .counter_encoding
            .encode(last, &mut self.preimage)
            .map_err(|_| Error::TooManyChunksEncrypted)?;
        self.seal_preimage(out)
    }

    fn seal_preimage(&mut self, out: &mut Vec<u8>) -> Result<()> {
        self.sealed.clear();
        let len = self.inner.encrypt(&self.preimage, &mut self.sealed)?;
        // A zero length prefix is reserved as invalid on the wire.
        if len == 0 {
            return Err(Error::EncryptionFailed);
        }
        self.config
            .size_encoding
            .encode(len as u64, out)
            .map_err(|_| Error::StreamChunkTooBig)?;
        out.extend_from_slice(&self.sealed);
        trace!(len, counter = self.counter, "stream chunk emitted");
        Ok(())
    }

    fn close(&mut self, out: &mut Vec<u8>) -> Result<()> {
        if !self.pending.is_empty() {
            self.emit_data_chunk(out)?;
        }
        self.emit_terminal_chunk(out)?;

        // Whatever the inner encryptor appends on finalization would land
        // outside any chunk, so only an empty tail is acceptable.
        let mut tail = Vec::new();
        if self.inner.finalize(&mut tail)? != 0 {
            return Err(Error::InnerFinalizationUnsupported);
        }
        Ok(())
    }
}

impl<E: Encryptor> Encryptor for StreamEncryptor<E> {
    fn enc_info(&self) -> EncInfo {
        STREAM_ENC_INFO
    }

    fn encrypt(&mut self, input: &[u8], out: &mut Vec<u8>) -> Result<usize> {
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

    fn finalize(&mut self, out: &mut Vec<u8>) -> Result<usize> {
        self.state.check()?;
        let start = out.len();
        match self.close(out) {
            Ok(()) => {
                self.state.finish();
                debug!(chunks = self.chunks_emitted(), "stream encryptor finalized");
                Ok(out.len() - start)
            }
            Err(err) => {
                out.truncate(start);
                Err(self.state.poison(err))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::IntEncoding;
    use crate::enc::testing::BlankSymmAlgo;
    use crate::info::EncType;
    use crate::keys::{EncKey, EncSymmAlgo};

    fn blank_encryptor(config: StreamConfig) -> StreamEncryptor<Box<dyn Encryptor>> {
        let key = BlankSymmAlgo.parse_key(&[]).unwrap();
        StreamEncryptor::new(key.make_encryptor().unwrap(), config).unwrap()
    }

    /// Encryptor that leaves bytes behind on finalization.
    struct TrailingEncryptor;

    impl Encryptor for TrailingEncryptor {
        fn enc_info(&self) -> EncInfo {
            EncInfo {
                enc_type: EncType::Chain,
                requires_finalization: true,
            }
        }

        fn encrypt(&mut self, input: &[u8], out: &mut Vec<u8>) -> Result<usize> {
            out.extend_from_slice(input);
            Ok(input.len())
        }

        fn finalize(&mut self, out: &mut Vec<u8>) -> Result<usize> {
            out.push(0xaa);
            Ok(1)
        }
    }

    #[test]
    fn test_hello_world_layout_over_blank_cipher() {
        let mut enc = blank_encryptor(StreamConfig::with_chunk_size(4));
        let mut wire = Vec::new();
        assert_eq!(enc.encrypt(b"hello world", &mut wire).unwrap(), 12);
        assert_eq!(enc.chunks_emitted(), 2);
        enc.finalize(&mut wire).unwrap();

        let mut expected = vec![5, 1];
        expected.extend_from_slice(b"hell");
        expected.extend_from_slice(&[5, 2]);
        expected.extend_from_slice(b"o wo");
        expected.extend_from_slice(&[4, 3]);
        expected.extend_from_slice(b"rld");
        expected.extend_from_slice(&[3, 0, STREAM_END, 3]);
        assert_eq!(wire, expected);
    }

    #[test]
    fn test_nothing_emitted_until_chunk_is_full() {
        let mut enc = blank_encryptor(StreamConfig::with_chunk_size(8));
        let mut wire = Vec::new();
        for byte in b"1234567" {
            assert_eq!(enc.encrypt(std::slice::from_ref(byte), &mut wire).unwrap(), 0);
        }
        assert!(wire.is_empty());
        assert_eq!(enc.encrypt(b"8", &mut wire).unwrap(), 10);
    }

    #[test]
    fn test_empty_stream_is_just_a_terminal_chunk() {
        let mut enc = blank_encryptor(StreamConfig::default());
        let mut wire = Vec::new();
        enc.finalize(&mut wire).unwrap();
        assert_eq!(wire, vec![3, 0, STREAM_END, 0]);
    }

    #[test]
    fn test_fixed_width_encodings() {
        let config = StreamConfig {
            chunk_size: 2,
            size_encoding: IntEncoding::Fixed2,
            counter_encoding: IntEncoding::Fixed1,
            ..StreamConfig::default()
        };
        let mut enc = blank_encryptor(config);
        let mut wire = Vec::new();
        enc.encrypt(b"ab", &mut wire).unwrap();
        enc.finalize(&mut wire).unwrap();
        assert_eq!(wire, vec![0, 3, 1, b'a', b'b', 0, 3, 0, STREAM_END, 1]);
    }

    #[test]
    fn test_counter_overflow_is_reported() {
        let config = StreamConfig {
            chunk_size: 1,
            counter_encoding: IntEncoding::Fixed1,
            ..StreamConfig::default()
        };
        let mut enc = blank_encryptor(config);
        let mut wire = Vec::new();
        enc.encrypt(&[0u8; 255], &mut wire).unwrap();

        let before = wire.len();
        assert_eq!(enc.encrypt(&[0], &mut wire), Err(Error::TooManyChunksEncrypted));
        assert_eq!(wire.len(), before);
        assert_eq!(enc.finalize(&mut wire), Err(Error::TooManyChunksEncrypted));
    }

    #[test]
    fn test_finalize_twice_fails() {
        let mut enc = blank_encryptor(StreamConfig::default());
        let mut wire = Vec::new();
        enc.finalize(&mut wire).unwrap();
        assert_eq!(enc.finalize(&mut wire), Err(Error::AlreadyFinalized));
        assert_eq!(enc.encrypt(b"x", &mut wire), Err(Error::AlreadyFinalized));
    }

    #[test]
    fn test_inner_finalization_output_is_refused() {
        let mut enc = StreamEncryptor::new(TrailingEncryptor, StreamConfig::default()).unwrap();
        let mut wire = vec![0x11];
        enc.encrypt(b"data", &mut wire).unwrap();
        assert_eq!(enc.finalize(&mut wire), Err(Error::InnerFinalizationUnsupported));
        assert_eq!(wire, vec![0x11]);
    }
}
