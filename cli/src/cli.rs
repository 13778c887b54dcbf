//! # CLI Interface
//!
//! Command-line structure for `sealkit`, defined with `clap` derive.
//! Subcommands: `keygen`, `encrypt`, `decrypt`, `algos` and `version`.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::logging::LogFormat;

/// Encrypt, decrypt and generate keys with sealkit algorithms.
///
/// Algorithms are picked by registry name; `sealkit algos` lists them.
/// Files are encrypted with the authenticated stream format, so a damaged,
/// reordered or truncated file never decrypts.
#[derive(Parser, Debug)]
#[command(name = "sealkit", version, propagate_version = true)]
pub struct SealkitCli {
    /// Log output format. Logs always go to stderr.
    #[arg(long, global = true, env = "SEALKIT_LOG_FORMAT", value_enum, default_value_t = LogFormat::Pretty)]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Generate a key (or key pair) and print it hex-encoded.
    Keygen(KeygenArgs),
    /// Encrypt a file into the stream format.
    Encrypt(CryptArgs),
    /// Decrypt and verify a stream-format file.
    Decrypt(CryptArgs),
    /// List registered algorithms.
    Algos(AlgosArgs),
    /// Print version information and exit.
    Version,
}

#[derive(Args, Debug)]
pub struct KeygenArgs {
    /// Registry name of the algorithm.
    #[arg(long, short = 'a', env = "SEALKIT_ALGO")]
    pub algo: String,
}

/// Shared by `encrypt` and `decrypt`.
#[derive(Args, Debug)]
pub struct CryptArgs {
    /// Registry name of a symmetric or hybrid encryption algorithm.
    ///
    /// Block and chain algorithms are wrapped in the stream format; stream
    /// algorithms are used as they are.
    #[arg(long, short = 'a', env = "SEALKIT_ALGO")]
    pub algo: String,

    /// Hex-encoded key. For hybrid algorithms: the recipient's public key
    /// when encrypting, their secret key when decrypting.
    #[arg(long, short = 'k', env = "SEALKIT_KEY", hide_env_values = true)]
    pub key: String,

    /// Plaintext bytes per stream chunk. Only valid for algorithms that are
    /// not stream algorithms already.
    #[arg(long, env = "SEALKIT_CHUNK_SIZE")]
    pub chunk_size: Option<usize>,

    /// Input file. Reads stdin when omitted.
    #[arg(long, short = 'i')]
    pub input: Option<PathBuf>,

    /// Output file. Writes stdout when omitted.
    ///
    /// Decrypted output is written next to the target and only renamed into
    /// place once the whole stream verified.
    #[arg(long, short = 'o')]
    pub output: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct AlgosArgs {
    /// Print JSON instead of a table.
    #[arg(long)]
    pub json: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli_structure() {
        SealkitCli::command().debug_assert();
    }

    #[test]
    fn test_parse_encrypt() {
        let cli = SealkitCli::try_parse_from([
            "sealkit",
            "encrypt",
            "--algo",
            "aes-256-gcm-counter",
            "--key",
            "00ff",
            "--chunk-size",
            "4096",
            "-i",
            "in.txt",
        ])
        .unwrap();

        let Commands::Encrypt(args) = cli.command else {
            panic!("expected encrypt");
        };
        assert_eq!(args.algo, "aes-256-gcm-counter");
        assert_eq!(args.chunk_size, Some(4096));
        assert_eq!(args.input, Some(PathBuf::from("in.txt")));
        assert!(args.output.is_none());
        assert_eq!(cli.log_format, LogFormat::Pretty);
    }

    #[test]
    fn test_log_format_is_global() {
        let cli = SealkitCli::try_parse_from(["sealkit", "algos", "--json", "--log-format", "json"]).unwrap();
        assert_eq!(cli.log_format, LogFormat::Json);
        assert!(matches!(cli.command, Commands::Algos(AlgosArgs { json: true })));
    }
}
