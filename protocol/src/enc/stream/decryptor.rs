//! Stream framing decoder.
//!
//! A small state machine fed with arbitrary slices of the wire stream:
//!
//! 1. **Length phase**: bytes go into `buffer` one at a time until they form
//!    a complete length prefix. Zero and oversized lengths are rejected
//!    before any payload is buffered.
//! 2. **Payload phase**: exactly `remaining` ciphertext bytes are collected,
//!    possibly across many calls.
//! 3. **Interpretation**: the inner decryptor opens the chunk, then the
//!    counter prefix decides whether the payload is released, the stream is
//!    closed, or everything stops with [`Error::StreamCorrupted`].
//!
//! Payload only reaches the caller after the chunk authenticated and its
//! counter matched. A failing call appends nothing at all.

use tracing::{debug, trace};
use zeroize::Zeroizing;

use super::{StreamConfig, STREAM_ENC_INFO};
use crate::config::{CONTROL_CHUNK_COUNTER, FIRST_DATA_CHUNK_COUNTER, STREAM_END};
use crate::error::{Error, Result};
use crate::info::EncInfo;
use crate::keys::Decryptor;
use crate::lifecycle::Lifecycle;

/// `expected` value once the terminal chunk has been accepted.
const CLOSED: u64 = 0;

/// Reassembles chunks from a sliced byte stream and checks their order.
pub struct StreamDecryptor<D> {
    inner: D,
    config: StreamConfig,
    /// Length prefix bytes during the length phase, ciphertext afterwards.
    buffer: Vec<u8>,
    /// Ciphertext bytes still missing; zero while reading a length prefix.
    remaining: usize,
    /// Counter the next data chunk must carry, or [`CLOSED`].
    expected: u64,
    /// Inner plaintext of the chunk being interpreted.
    plain: Zeroizing<Vec<u8>>,
    state: Lifecycle,
}

impl<D: Decryptor> StreamDecryptor<D> {
    pub fn new(inner: D, config: StreamConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            inner,
            config,
            buffer: Vec::new(),
            remaining: 0,
            expected: FIRST_DATA_CHUNK_COUNTER,
            plain: Zeroizing::new(Vec::new()),
            state: Lifecycle::Active,
        })
    }

    /// Whether the terminal chunk has been seen.
    pub fn is_closed(&self) -> bool {
        self.expected == CLOSED
    }

    fn absorb(&mut self, mut input: &[u8], out: &mut Vec<u8>) -> Result<()> {
        while !input.is_empty() {
            if self.is_closed() {
                // Bytes after the terminal chunk.
                return Err(Error::StreamCorrupted);
            }

            if self.remaining == 0 {
                self.buffer.push(input[0]);
                input = &input[1..];
                self.read_length()?;
                continue;
            }

            let take = self.remaining.min(input.len());
            self.buffer.extend_from_slice(&input[..take]);
            input = &input[take..];
            self.remaining -= take;

            if self.remaining == 0 {
                self.open_chunk(out)?;
            }
        }
        Ok(())
    }

    /// Try to finish the length prefix sitting in `buffer`.
    fn read_length(&mut self) -> Result<()> {
        let decoded = self
            .config
            .size_encoding
            .decode(&self.buffer)
            .map_err(|_| Error::StreamCorrupted)?;
        let Some((len, _)) = decoded else {
            return Ok(());
        };

        if len == 0 {
            return Err(Error::StreamCorrupted);
        }
        let len = usize::try_from(len).map_err(|_| Error::StreamChunkTooBig)?;
        if self.config.max_chunk_size.is_some_and(|max| len > max) {
            return Err(Error::StreamChunkTooBig);
        }

        self.remaining = len;
        self.buffer.clear();
        Ok(())
    }

    fn open_chunk(&mut self, out: &mut Vec<u8>) -> Result<()> {
        self.plain.clear();
        self.inner.decrypt(&self.buffer, &mut self.plain)?;
        self.buffer.clear();

        let counters = self.config.counter_encoding;
        let (counter, used) = counters
            .decode_complete(&self.plain)
            .map_err(|_| Error::StreamCorrupted)?;
        let body = &self.plain[used..];

        if counter == CONTROL_CHUNK_COUNTER {
            let (&control, rest) = body.split_first().ok_or(Error::StreamCorrupted)?;
            if control != STREAM_END {
                return Err(Error::UnsupportedControlValue(control));
            }
            let (last, used) = counters
                .decode_complete(rest)
                .map_err(|_| Error::StreamCorrupted)?;
            if used != rest.len() || last != self.expected - FIRST_DATA_CHUNK_COUNTER {
                return Err(Error::StreamCorrupted);
            }
            trace!(last, "terminal chunk accepted");
            self.expected = CLOSED;
        } else if counter == self.expected {
            out.extend_from_slice(body);
            trace!(counter, len = body.len(), "stream chunk accepted");
            self.expected = self.expected.checked_add(1).ok_or(Error::StreamCorrupted)?;
        } else {
            return Err(Error::StreamCorrupted);
        }
        Ok(())
    }
}

impl<D: Decryptor> Decryptor for StreamDecryptor<D> {
    fn enc_info(&self) -> EncInfo {
        STREAM_ENC_INFO
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
        if !self.is_closed() {
            return Err(self.state.poison(Error::StreamCorrupted));
        }
        let inner = self.inner.finalize();
        self.state.guard(inner)?;
        self.state.finish();
        debug!("stream decryptor finalized");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enc::stream::StreamEncryptor;
    use crate::enc::testing::BlankSymmAlgo;
    use crate::keys::{DecKey, EncKey, EncSymmAlgo, Encryptor};

    fn blank_decryptor(config: StreamConfig) -> StreamDecryptor<Box<dyn Decryptor>> {
        let key = BlankSymmAlgo.parse_key(&[]).unwrap();
        StreamDecryptor::new(key.make_decryptor().unwrap(), config).unwrap()
    }

    fn blank_wire(plain: &[u8], chunk_size: usize) -> Vec<u8> {
        let key = BlankSymmAlgo.parse_key(&[]).unwrap();
        let config = StreamConfig::with_chunk_size(chunk_size);
        let mut enc = StreamEncryptor::new(key.make_encryptor().unwrap(), config).unwrap();
        let mut wire = Vec::new();
        enc.encrypt(plain, &mut wire).unwrap();
        enc.finalize(&mut wire).unwrap();
        wire
    }

    #[test]
    fn test_decodes_blank_stream_in_one_call() {
        let wire = blank_wire(b"hello world", 4);
        let mut dec = blank_decryptor(StreamConfig::default());
        let mut out = Vec::new();
        assert_eq!(dec.decrypt(&wire, &mut out).unwrap(), 11);
        assert!(dec.is_closed());
        dec.finalize().unwrap();
        assert_eq!(out, b"hello world");
    }

    #[test]
    fn test_zero_length_chunk_is_corrupt() {
        let mut dec = blank_decryptor(StreamConfig::default());
        assert_eq!(dec.decrypt(&[0], &mut Vec::new()), Err(Error::StreamCorrupted));
    }

    #[test]
    fn test_oversized_chunk_is_refused_before_buffering() {
        let config = StreamConfig {
            max_chunk_size: Some(16),
            ..StreamConfig::default()
        };
        let mut dec = blank_decryptor(config);
        // Varint 17.
        assert_eq!(dec.decrypt(&[17], &mut Vec::new()), Err(Error::StreamChunkTooBig));
        assert_eq!(dec.decrypt(&[1], &mut Vec::new()), Err(Error::StreamChunkTooBig));
    }

    #[test]
    fn test_malformed_length_prefix_is_corrupt() {
        let mut dec = blank_decryptor(StreamConfig {
            max_chunk_size: None,
            ..StreamConfig::default()
        });
        let mut prefix = vec![0xff; 9];
        prefix.push(0x7f);
        assert_eq!(dec.decrypt(&prefix, &mut Vec::new()), Err(Error::StreamCorrupted));
    }

    #[test]
    fn test_unknown_control_value() {
        let mut dec = blank_decryptor(StreamConfig::default());
        // Counter 0, control 0x05, last 0.
        assert_eq!(
            dec.decrypt(&[3, 0, 0x05, 0], &mut Vec::new()),
            Err(Error::UnsupportedControlValue(0x05))
        );
    }

    #[test]
    fn test_terminal_chunk_must_name_the_last_counter() {
        let mut dec = blank_decryptor(StreamConfig::default());
        let mut out = Vec::new();
        dec.decrypt(&[3, 1, b'h', b'i'], &mut out).unwrap();
        // Claims zero data chunks after one was delivered.
        assert_eq!(dec.decrypt(&[3, 0, STREAM_END, 0], &mut out), Err(Error::StreamCorrupted));
    }

    #[test]
    fn test_terminal_chunk_with_trailing_bytes_is_corrupt() {
        let mut dec = blank_decryptor(StreamConfig::default());
        assert_eq!(
            dec.decrypt(&[4, 0, STREAM_END, 0, 9], &mut Vec::new()),
            Err(Error::StreamCorrupted)
        );
    }

    #[test]
    fn test_data_after_terminal_chunk_is_corrupt() {
        let mut wire = blank_wire(b"abc", 2);
        wire.push(1);
        let mut dec = blank_decryptor(StreamConfig::default());
        let mut out = vec![0xee];
        assert_eq!(dec.decrypt(&wire, &mut out), Err(Error::StreamCorrupted));
        // The failing call appended nothing, not even the good chunks.
        assert_eq!(out, vec![0xee]);
        assert_eq!(dec.finalize(), Err(Error::StreamCorrupted));
    }

    #[test]
    fn test_finalize_before_terminal_chunk_fails() {
        let wire = blank_wire(b"abcdef", 2);
        let mut dec = blank_decryptor(StreamConfig::default());
        let mut out = Vec::new();
        dec.decrypt(&wire[..wire.len() - 1], &mut out).unwrap();
        assert_eq!(out, b"abcdef");
        assert_eq!(dec.finalize(), Err(Error::StreamCorrupted));
        assert_eq!(dec.decrypt(&wire[wire.len() - 1..], &mut out), Err(Error::StreamCorrupted));
    }

    #[test]
    fn test_duplicated_chunk_is_corrupt() {
        let mut dec = blank_decryptor(StreamConfig::default());
        let mut out = Vec::new();
        dec.decrypt(&[3, 1, b'h', b'i'], &mut out).unwrap();
        assert_eq!(dec.decrypt(&[3, 1, b'h', b'i'], &mut out), Err(Error::StreamCorrupted));
        assert_eq!(out, b"hi");
    }

    #[test]
    fn test_info_and_double_finalize() {
        let wire = blank_wire(b"", 4);
        let mut dec = blank_decryptor(StreamConfig::default());
        assert!(dec.enc_info().requires_finalization);
        dec.decrypt(&wire, &mut Vec::new()).unwrap();
        dec.finalize().unwrap();
        assert_eq!(dec.finalize(), Err(Error::AlreadyFinalized));
    }
}
