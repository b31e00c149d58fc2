//! Mumblepad CLI
//!
//! Key generation and file encryption/decryption for the Mumblepad block
//! cipher. Encrypted files carry a `.mu1` .. `.mu6` extension identifying
//! the block size.

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{decrypt_files, encrypt_files, keygen, CipherOptions};
use std::path::PathBuf;

// =============================================================================
// CLI DEFINITION
// =============================================================================

#[derive(Parser)]
#[command(name = "mumblepad")]
#[command(about = "Block cipher with a 32768-bit key and six block sizes", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a random 4096-byte key file
    Keygen {
        /// Where to write the key
        #[arg(value_name = "FILE")]
        output: PathBuf,
    },
    /// Encrypt files (each FILE becomes FILE.muN)
    Encrypt {
        /// Files to encrypt
        #[arg(value_name = "FILE", required = true)]
        files: Vec<PathBuf>,

        /// Encrypted block size in bytes
        #[arg(short, long, default_value_t = 4096,
              value_parser = commands::parse_block_size_arg)]
        block_size: u32,

        #[command(flatten)]
        options: CipherOptions,
    },
    /// Decrypt .muN files (block size inferred from the extension)
    Decrypt {
        /// Files to decrypt
        #[arg(value_name = "FILE", required = true)]
        files: Vec<PathBuf>,

        #[command(flatten)]
        options: CipherOptions,
    },
}

// =============================================================================
// ENTRY POINT
// =============================================================================

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Keygen { output } => keygen(&output),
        Commands::Encrypt {
            files,
            block_size,
            options,
        } => encrypt_files(&files, block_size, &options),
        Commands::Decrypt { files, options } => decrypt_files(&files, &options),
    }
}
