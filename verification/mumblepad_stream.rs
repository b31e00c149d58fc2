//! # `PractRand` Stream Generator
//!
//! Writes an endless stream of ciphertext blocks to stdout for external
//! statistical testing. Plaintext is an incrementing 64-bit counter repeated
//! across each block under a fixed patterned key, so every output bit's
//! entropy comes from the cipher itself (and its padding generator), not
//! from the input.

use anyhow::Result;
use clap::Parser;
use mumblepad::{BlockSize, EngineConfig, MumEngine, KEY_SIZE};
use std::io::{self, Write};

#[derive(Parser)]
#[command(name = "mumblepad_stream")]
#[command(about = "Ciphertext stream generator for randomness testing", long_about = None)]
struct Cli {
    /// Encrypted block size in bytes
    #[arg(short, long, default_value_t = 4096)]
    block_size: u32,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let block_size = BlockSize::ALL
        .into_iter()
        .find(|b| b.bytes() == cli.block_size as usize)
        .ok_or_else(|| anyhow::anyhow!("block size must be 128/256/512/1024/2048/4096"))?;

    let mut key = [0u8; KEY_SIZE];
    for (i, b) in key.iter_mut().enumerate() {
        *b = ((i * 167 + 59) % 256) as u8;
    }

    let mut engine = MumEngine::new(EngineConfig::new(block_size));
    engine.init_key(&key)?;

    let stdout = io::stdout();
    let mut handle = io::BufWriter::new(stdout.lock());

    let mut counter: u64 = 0;
    let mut plaintext = vec![0u8; block_size.payload_size()];
    loop {
        let counter_bytes = counter.to_le_bytes();
        for (i, byte) in plaintext.iter_mut().enumerate() {
            *byte = counter_bytes[i % 8];
        }

        let block = engine.encrypt_block(&plaintext, counter as u16)?;
        if handle.write_all(&block).is_err() {
            break;
        }

        counter = counter.wrapping_add(1);
    }
    Ok(())
}
