// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # sealkit
//!
//! Entry point for the `sealkit` binary. Parses CLI arguments, initializes
//! logging and dispatches to one of:
//!
//! - `keygen`  : generate a key or key pair for a registered algorithm
//! - `encrypt` : stream a file through an encryptor
//! - `decrypt` : stream a file through a decryptor
//! - `algos`   : list registered algorithms
//! - `version` : print build version information

mod cli;
mod crypt;
mod logging;

use anyhow::{bail, Context, Result};
use clap::Parser;
use rand::rngs::OsRng;
use zeroize::Zeroizing;

use sealkit_protocol::keys::{EncAsymAlgo, EncSymmAlgo, MarshalKey};
use sealkit_protocol::registry::{Algorithm, Registry};
use sealkit_protocol::sign::{AsymSignAlgo, SymmSignAlgo};

use cli::{AlgosArgs, Commands, CryptArgs, KeygenArgs, SealkitCli};

fn main() -> Result<()> {
    let cli = SealkitCli::parse();
    logging::init_logging(logging::DEFAULT_FILTER, cli.log_format);

    let registry = Registry::with_defaults().context("failed to build algorithm registry")?;

    match cli.command {
        Commands::Keygen(args) => keygen(&registry, args),
        Commands::Encrypt(args) => encrypt(&registry, args),
        Commands::Decrypt(args) => decrypt(&registry, args),
        Commands::Algos(args) => list_algorithms(&registry, args),
        Commands::Version => {
            print_version(&registry);
            Ok(())
        }
    }
}

/// Generates a key (symmetric) or key pair (asymmetric) and prints it as hex.
fn keygen(registry: &Registry, args: KeygenArgs) -> Result<()> {
    let (public, secret) = match registry.get(&args.algo)? {
        Algorithm::SymmEnc(algo) => (None, algo.generate_key(&mut OsRng)?.marshal_to_vec()?),
        Algorithm::SymmSign(algo) => (None, algo.generate_key(&mut OsRng)?.marshal_to_vec()?),
        Algorithm::AsymEnc(algo) => {
            let (public, secret) = algo.generate_key_pair(&mut OsRng)?;
            (Some(public.marshal_to_vec()?), secret.marshal_to_vec()?)
        }
        Algorithm::AsymSign(algo) => {
            let (secret, public) = algo.generate_key_pair(&mut OsRng)?;
            (Some(public.marshal_to_vec()?), secret.marshal_to_vec()?)
        }
        Algorithm::Rng(_) => bail!("{} is a random generator and has no keys", args.algo),
    };
    let secret = Zeroizing::new(secret);

    tracing::info!(algo = %args.algo, "key generated");
    match public {
        Some(public) => {
            println!("public: {}", hex::encode(public));
            println!("secret: {}", Zeroizing::new(hex::encode(&secret[..])).as_str());
        }
        None => println!("{}", Zeroizing::new(hex::encode(&secret[..])).as_str()),
    }
    Ok(())
}

fn decode_key(hex_key: &str) -> Result<Zeroizing<Vec<u8>>> {
    let key = hex::decode(hex_key.trim()).context("key is not valid hex")?;
    Ok(Zeroizing::new(key))
}

fn encrypt(registry: &Registry, args: CryptArgs) -> Result<()> {
    let key = decode_key(&args.key)?;
    let mut enc = crypt::make_encryptor(registry, &args.algo, &key, args.chunk_size)?;
    let mut input = crypt::open_input(args.input.as_deref())?;

    let read = crypt::with_output(args.output.as_deref(), |out| {
        crypt::encrypt_stream(enc.as_mut(), &mut input, out)
    })
    .context("encryption failed")?;

    tracing::info!(algo = %args.algo, bytes = read, "encrypted");
    Ok(())
}

fn decrypt(registry: &Registry, args: CryptArgs) -> Result<()> {
    let key = decode_key(&args.key)?;
    let mut dec = crypt::make_decryptor(registry, &args.algo, &key, args.chunk_size)?;
    let mut input = crypt::open_input(args.input.as_deref())?;

    if args.output.is_none() {
        tracing::warn!("writing to stdout: output of a stream that fails late can't be withdrawn");
    }
    let written = crypt::with_output(args.output.as_deref(), |out| {
        crypt::decrypt_stream(dec.as_mut(), &mut input, out)
    })
    .context("decryption failed")?;

    tracing::info!(algo = %args.algo, bytes = written, "decrypted and verified");
    Ok(())
}

/// Prints every registered algorithm, as a table or as JSON.
fn list_algorithms(registry: &Registry, args: AlgosArgs) -> Result<()> {
    let summaries = registry.describe();
    if args.json {
        println!("{}", serde_json::to_string_pretty(&summaries)?);
        return Ok(());
    }

    println!("{:<32} {:<24} {:<7} DETAILS", "NAME", "TYPE", "SECURE");
    for summary in &summaries {
        let details = match (summary.enc, summary.auth_mode, summary.signature_len, summary.is_deterministic) {
            (Some(enc), Some(auth), _, _) => format!("{:?}, {:?}", enc.enc_type, auth),
            (_, _, Some(len), _) => format!("{len}-byte output"),
            (_, _, _, Some(true)) => "deterministic".to_string(),
            _ => String::new(),
        };
        println!(
            "{:<32} {:<24} {:<7} {}",
            summary.name,
            summary.algorithm_type.to_string(),
            if summary.is_secure { "yes" } else { "NO" },
            details
        );
    }
    Ok(())
}

/// Prints version information to stdout.
fn print_version(registry: &Registry) {
    println!("sealkit          {}", env!("CARGO_PKG_VERSION"));
    println!("sealkit-protocol {}", sealkit_protocol::config::CRATE_VERSION);
    println!("algorithms       {}", registry.len());
}
