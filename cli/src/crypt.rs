//! File encryption and decryption through the stream format.
//!
//! Input is read in fixed-size buffers and handed to the worker as it
//! arrives, so memory use doesn't depend on the file size. Output to a file
//! goes to a `.partial` sibling first and is renamed into place only after
//! the worker finalized successfully.

use std::fs::{self, File};
use std::io::{self, BufWriter, ErrorKind, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use tracing::{debug, info};

use sealkit_protocol::config::DEFAULT_STREAM_CHUNK_SIZE;
use sealkit_protocol::enc::stream::{StreamConfig, StreamEncAlgo};
use sealkit_protocol::info::EncType;
use sealkit_protocol::keys::{DecKey, Decryptor, EncAlgo, EncKey, EncSymmAlgo, EncSymmKey, Encryptor};
use sealkit_protocol::registry::{Algorithm, Registry};

/// Bytes read from the input per call.
pub const READ_BUFFER_SIZE: usize = 64 * 1024;

// ---------------------------------------------------------------------------
// Key resolution
// ---------------------------------------------------------------------------

/// Encryptor for `algo`, keyed with `key` (a public key for hybrids).
pub fn make_encryptor(
    registry: &Registry,
    algo: &str,
    key: &[u8],
    chunk_size: Option<usize>,
) -> Result<Box<dyn Encryptor>> {
    match registry.get(algo)? {
        Algorithm::SymmEnc(symm) => Ok(symm_key(Arc::clone(symm), key, chunk_size)?.make_encryptor()?),
        Algorithm::AsymEnc(asym) => {
            check_stream(asym.info().enc.enc_type, chunk_size)?;
            let key = asym.parse_enc_key(key).context("invalid public key")?;
            Ok(key.make_encryptor()?)
        }
        other => bail!("{algo} is a {} algorithm, not an encryption algorithm", other.algorithm_type()),
    }
}

/// Decryptor for `algo`, keyed with `key` (a secret key for hybrids).
pub fn make_decryptor(
    registry: &Registry,
    algo: &str,
    key: &[u8],
    chunk_size: Option<usize>,
) -> Result<Box<dyn Decryptor>> {
    match registry.get(algo)? {
        Algorithm::SymmEnc(symm) => Ok(symm_key(Arc::clone(symm), key, chunk_size)?.make_decryptor()?),
        Algorithm::AsymEnc(asym) => {
            check_stream(asym.info().enc.enc_type, chunk_size)?;
            let key = asym.parse_dec_key(key).context("invalid secret key")?;
            Ok(key.make_decryptor()?)
        }
        other => bail!("{algo} is a {} algorithm, not an encryption algorithm", other.algorithm_type()),
    }
}

/// Parse a symmetric key, wrapping non-stream algorithms in the stream format.
fn symm_key(
    symm: Arc<dyn EncSymmAlgo>,
    key: &[u8],
    chunk_size: Option<usize>,
) -> Result<Box<dyn EncSymmKey>> {
    if symm.info().enc.enc_type == EncType::Stream {
        check_stream(EncType::Stream, chunk_size)?;
        return symm.parse_key(key).context("invalid key");
    }

    let config = StreamConfig::with_chunk_size(chunk_size.unwrap_or(DEFAULT_STREAM_CHUNK_SIZE));
    let stream = StreamEncAlgo::with_config(symm, config)?;
    stream.parse_key(key).context("invalid key")
}

fn check_stream(enc_type: EncType, chunk_size: Option<usize>) -> Result<()> {
    if enc_type != EncType::Stream {
        bail!("algorithm is not a stream algorithm and can't encrypt files");
    }
    if chunk_size.is_some() {
        bail!("--chunk-size only applies to block and chain algorithms");
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Pumping
// ---------------------------------------------------------------------------

/// Read `input` to the end, encrypting into `output`. Returns bytes read.
pub fn encrypt_stream(enc: &mut dyn Encryptor, input: &mut dyn Read, output: &mut dyn Write) -> Result<u64> {
    let mut buf = vec![0u8; READ_BUFFER_SIZE];
    let mut out = Vec::with_capacity(READ_BUFFER_SIZE + READ_BUFFER_SIZE / 8);
    let mut total = 0u64;

    while let Some(n) = read_some(input, &mut buf)? {
        out.clear();
        enc.encrypt(&buf[..n], &mut out)?;
        output.write_all(&out).context("failed to write output")?;
        total += n as u64;
    }

    out.clear();
    enc.finalize(&mut out)?;
    output.write_all(&out).context("failed to write output")?;
    output.flush().context("failed to flush output")?;
    Ok(total)
}

/// Read `input` to the end, decrypting into `output`. Returns bytes written.
///
/// Bytes reach `output` chunk by chunk as they verify. Truncation is only
/// detected at the end, so callers must discard the output on error.
pub fn decrypt_stream(dec: &mut dyn Decryptor, input: &mut dyn Read, output: &mut dyn Write) -> Result<u64> {
    let mut buf = vec![0u8; READ_BUFFER_SIZE];
    let mut out = Vec::with_capacity(READ_BUFFER_SIZE);
    let mut total = 0u64;

    while let Some(n) = read_some(input, &mut buf)? {
        out.clear();
        dec.decrypt(&buf[..n], &mut out)?;
        output.write_all(&out).context("failed to write output")?;
        total += out.len() as u64;
    }

    dec.finalize()?;
    output.flush().context("failed to flush output")?;
    Ok(total)
}

/// `None` at end of input.
fn read_some(input: &mut dyn Read, buf: &mut [u8]) -> Result<Option<usize>> {
    loop {
        match input.read(buf) {
            Ok(0) => return Ok(None),
            Ok(n) => return Ok(Some(n)),
            Err(err) if err.kind() == ErrorKind::Interrupted => continue,
            Err(err) => return Err(err).context("failed to read input"),
        }
    }
}

// ---------------------------------------------------------------------------
// Files
// ---------------------------------------------------------------------------

/// Open `path`, or stdin when `None`.
pub fn open_input(path: Option<&Path>) -> Result<Box<dyn Read>> {
    match path {
        Some(path) => {
            let file = File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
            Ok(Box::new(file))
        }
        None => Ok(Box::new(io::stdin().lock())),
    }
}

/// Run `write` against `path` (or stdout), keeping a file output only if
/// `write` succeeds.
pub fn with_output<T>(path: Option<&Path>, write: impl FnOnce(&mut dyn Write) -> Result<T>) -> Result<T> {
    let Some(path) = path else {
        let stdout = io::stdout();
        let mut lock = stdout.lock();
        return write(&mut lock);
    };

    let partial = partial_path(path);
    let file = File::create(&partial).with_context(|| format!("failed to create {}", partial.display()))?;
    let mut writer = BufWriter::new(file);

    match write(&mut writer) {
        Ok(value) => {
            drop(writer);
            fs::rename(&partial, path)
                .with_context(|| format!("failed to move output into {}", path.display()))?;
            info!(path = %path.display(), "output written");
            Ok(value)
        }
        Err(err) => {
            drop(writer);
            if let Err(cleanup) = fs::remove_file(&partial) {
                debug!(error = %cleanup, path = %partial.display(), "failed to remove partial output");
            }
            Err(err)
        }
    }
}

fn partial_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".partial");
    path.with_file_name(name)
}
