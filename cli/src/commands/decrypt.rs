//! Decrypt Command
//!
//! The block size comes from the `.muN` extension; the output file is the
//! input name with that extension stripped.

use super::{build_engine, report, CipherOptions};
use anyhow::{anyhow, Context, Result};
use mumblepad::BlockSize;
use rayon::prelude::*;
use std::path::{Path, PathBuf};

pub fn decrypt_files(files: &[PathBuf], options: &CipherOptions) -> Result<()> {
    let results: Vec<(PathBuf, Result<String>)> = files
        .par_iter()
        .map(|path| (path.clone(), decrypt_one(path, options)))
        .collect();

    report(results)
}

fn decrypt_one(path: &Path, options: &CipherOptions) -> Result<String> {
    let block_size = BlockSize::from_path(path)
        .map_err(|e| anyhow!("{e}: {}", path.display()))?;
    let output = path.with_extension("");

    let ciphertext =
        std::fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;

    let mut engine = build_engine(block_size, options)?;
    let plaintext = engine
        .decrypt(&ciphertext)
        .with_context(|| format!("decryption failed for {}", path.display()))?;

    std::fs::write(&output, &plaintext)
        .with_context(|| format!("failed to write {}", output.display()))?;

    Ok(format!(
        "{}  ->  {}  ({} -> {} bytes)",
        path.display(),
        output.display(),
        ciphertext.len(),
        plaintext.len()
    ))
}
