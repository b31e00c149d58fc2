//! Encrypt Command
//!
//! Each input file is encrypted as one stream and written next to the
//! original with the block-size extension appended. Multiple files run in
//! parallel via Rayon; each task owns its own engine.

use super::{block_size_from_bytes, build_engine, encrypted_name, report, CipherOptions};
use anyhow::{Context, Result};
use rayon::prelude::*;
use std::path::{Path, PathBuf};

pub fn encrypt_files(files: &[PathBuf], block_size: u32, options: &CipherOptions) -> Result<()> {
    let block_size = block_size_from_bytes(block_size)?;

    let results: Vec<(PathBuf, Result<String>)> = files
        .par_iter()
        .map(|path| (path.clone(), encrypt_one(path, block_size, options)))
        .collect();

    report(results)
}

fn encrypt_one(
    path: &Path,
    block_size: mumblepad::BlockSize,
    options: &CipherOptions,
) -> Result<String> {
    let plaintext =
        std::fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;

    let mut engine = build_engine(block_size, options)?;
    let ciphertext = engine
        .encrypt(&plaintext, 0)
        .with_context(|| format!("encryption failed for {}", path.display()))?;

    let output = encrypted_name(path, block_size);
    std::fs::write(&output, &ciphertext)
        .with_context(|| format!("failed to write {}", output.display()))?;

    Ok(format!(
        "{}  ->  {}  ({} -> {} bytes)",
        path.display(),
        output.display(),
        plaintext.len(),
        ciphertext.len()
    ))
}
