//! Keygen Command

use anyhow::{Context, Result};
use mumblepad::KEY_SIZE;
use rand::RngCore;
use std::path::Path;

/// Write a fresh random 4096-byte key.
pub fn keygen(output: &Path) -> Result<()> {
    let mut key = vec![0u8; KEY_SIZE];
    rand::thread_rng().fill_bytes(&mut key);

    std::fs::write(output, &key)
        .with_context(|| format!("failed to write key to {}", output.display()))?;

    println!(
        "{}  {} bytes, fingerprint {}",
        output.display(),
        KEY_SIZE,
        hex::encode(&key[..8])
    );
    Ok(())
}
