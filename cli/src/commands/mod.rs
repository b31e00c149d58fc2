//! Command Implementations

mod decrypt;
mod encrypt;
mod keygen;

pub use decrypt::decrypt_files;
pub use encrypt::encrypt_files;
pub use keygen::keygen;

use anyhow::{anyhow, Context, Result};
use clap::Args;
use mumblepad::{Backend, BlockSize, EngineConfig, MumEngine, PaddingMode};
use std::path::{Path, PathBuf};

// =============================================================================
// SHARED OPTIONS
// =============================================================================

/// Flags shared by encrypt and decrypt.
#[derive(Args)]
pub struct CipherOptions {
    /// Key file (4096 raw bytes)
    #[arg(short, long, value_name = "FILE")]
    pub key: PathBuf,

    /// Worker threads per file (1 = single-threaded engine)
    #[arg(short, long, default_value_t = 1)]
    pub threads: usize,

    /// Disable block framing (raw transform, input must be block-aligned)
    #[arg(long)]
    pub no_padding: bool,
}

/// Validate a `--block-size` argument.
pub fn parse_block_size_arg(value: &str) -> Result<u32, String> {
    let bytes: u32 = value.parse().map_err(|_| "not a number".to_string())?;
    block_size_from_bytes(bytes)
        .map(|_| bytes)
        .map_err(|e| e.to_string())
}

pub(crate) fn block_size_from_bytes(bytes: u32) -> Result<BlockSize> {
    BlockSize::ALL
        .into_iter()
        .find(|b| b.bytes() == bytes as usize)
        .ok_or_else(|| anyhow!("block size must be one of 128/256/512/1024/2048/4096"))
}

/// Build and key an engine for one file task.
pub(crate) fn build_engine(
    block_size: BlockSize,
    options: &CipherOptions,
) -> Result<MumEngine> {
    let config = EngineConfig {
        backend: if options.threads > 1 {
            Backend::CpuMultiThread
        } else {
            Backend::Cpu
        },
        block_size,
        padding: if options.no_padding {
            PaddingMode::Off
        } else {
            PaddingMode::On
        },
        num_threads: options.threads,
    };

    let mut engine = MumEngine::new(config);
    engine
        .load_key(&options.key)
        .with_context(|| format!("failed to load key from {}", options.key.display()))?;
    Ok(engine)
}

/// Print per-file results in input order, returning an error if any failed.
pub(crate) fn report(results: Vec<(PathBuf, Result<String>)>) -> Result<()> {
    let mut failures = 0;
    for (path, result) in results {
        match result {
            Ok(line) => println!("{line}"),
            Err(error) => {
                eprintln!("Error: {}: {error:#}", path.display());
                failures += 1;
            }
        }
    }
    if failures > 0 {
        anyhow::bail!("failed to process {failures} file(s)");
    }
    Ok(())
}

/// `name.ext` -> `name.ext.muN` for the chosen block size.
pub(crate) fn encrypted_name(path: &Path, block_size: BlockSize) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".");
    name.push(block_size.extension());
    PathBuf::from(name)
}
