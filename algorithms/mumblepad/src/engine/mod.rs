//! Engine Façade
//!
//! Configuration and lifecycle around the cipher core: key initialization
//! builds the subkeys, round tables, and padding generators once; block and
//! stream operations then run against that immutable state. Re-initializing
//! the key drops and rebuilds everything, including the worker pool.

pub(crate) mod dispatcher;

use crate::kernels::constants::{KEY_SIZE, NUM_SUBKEYS, PRNG_SUBKEY_INDEX, PRNG_SUBKEYS_PER_SEED};
use crate::prng::Prng;
use crate::schedule::Tables;
use crate::streaming::{self, BlockProcessor};
use crate::types::{Backend, BlockSize, EngineConfig, MumError, PaddingMode};
use dispatcher::WorkerPool;
use std::io::Read;
use std::path::Path;
use std::sync::Arc;

/// Padding-generator slots; job `j` of any stream draws from slot `j mod 16`.
const PAD_SLOTS: usize = 16;

// =============================================================================
// ENGINE
// =============================================================================

/// A configured cipher engine.
///
/// ```
/// use mumblepad::{BlockSize, EngineConfig, MumEngine};
///
/// let mut engine = MumEngine::new(EngineConfig::new(BlockSize::B256));
/// engine.init_key(&[0x17; mumblepad::KEY_SIZE])?;
///
/// let ciphertext = engine.encrypt(b"attack at dawn", 0)?;
/// let plaintext = engine.decrypt(&ciphertext)?;
/// assert_eq!(plaintext, b"attack at dawn");
/// # Ok::<(), mumblepad::MumError>(())
/// ```
pub struct MumEngine {
    config: EngineConfig,
    state: Option<KeyState>,
}

/// Everything derived from one key.
struct KeyState {
    tables: Arc<Tables>,
    pads: Vec<Prng>,
    processor: BlockProcessor,
    pool: Option<WorkerPool>,
}

impl MumEngine {
    /// Create an engine with no key material.
    #[must_use]
    pub const fn new(config: EngineConfig) -> Self {
        Self {
            config,
            state: None,
        }
    }

    /// The engine's configuration.
    #[must_use]
    pub const fn config(&self) -> &EngineConfig {
        &self.config
    }

    // =========================================================================
    // KEY LIFECYCLE
    // =========================================================================

    /// Run the key schedule. Replaces any previously initialized key.
    ///
    /// # Errors
    /// Currently infallible for a correctly sized key; returns `Result` so
    /// the signature stays stable if accelerator backends add setup steps.
    pub fn init_key(&mut self, key: &[u8; KEY_SIZE]) -> Result<(), MumError> {
        // Drop the old state first so a re-key never holds two table sets.
        self.state = None;

        let tables = Arc::new(Tables::derive(key, self.config.block_size));
        let pads = (0..PAD_SLOTS)
            .map(|slot| {
                Prng::from_subkeys(
                    tables.subkeys(),
                    PRNG_SUBKEY_INDEX + slot * PRNG_SUBKEYS_PER_SEED,
                )
            })
            .collect();
        let processor = BlockProcessor::new(self.config.backend, &tables, self.config.padding);
        let pool = match self.config.backend {
            Backend::CpuMultiThread => Some(WorkerPool::new(
                &tables,
                self.config.padding,
                self.config.clamped_threads(),
            )),
            Backend::Cpu | Backend::GpuA | Backend::GpuB => None,
        };

        self.state = Some(KeyState {
            tables,
            pads,
            processor,
            pool,
        });
        Ok(())
    }

    /// Initialize from a byte buffer holding at least one full key.
    ///
    /// # Errors
    /// `LengthTooSmall` if fewer than 4096 bytes are supplied.
    pub fn load_key_from_buffer(&mut self, key: &[u8]) -> Result<(), MumError> {
        if key.len() < KEY_SIZE {
            return Err(MumError::LengthTooSmall);
        }
        let mut fixed = [0u8; KEY_SIZE];
        fixed.copy_from_slice(&key[..KEY_SIZE]);
        self.init_key(&fixed)
    }

    /// Initialize from a raw 4096-byte key file.
    ///
    /// # Errors
    /// `KeyFileRead` if the file cannot be opened or holds fewer than
    /// 4096 bytes.
    pub fn load_key(&mut self, path: &Path) -> Result<(), MumError> {
        let mut key = [0u8; KEY_SIZE];
        let mut file = std::fs::File::open(path).map_err(|_| MumError::KeyFileRead)?;
        file.read_exact(&mut key).map_err(|_| MumError::KeyFileRead)?;
        self.init_key(&key)
    }

    /// One derived subkey.
    ///
    /// # Errors
    /// `KeyNotInitialized` before key setup, `SubkeyIndexOutOfRange` for
    /// `index >= 560`.
    pub fn subkey(&self, index: usize) -> Result<&[u8; KEY_SIZE], MumError> {
        let state = self.state.as_ref().ok_or(MumError::KeyNotInitialized)?;
        if index >= NUM_SUBKEYS {
            return Err(MumError::SubkeyIndexOutOfRange);
        }
        Ok(state.tables.subkey(index))
    }

    // =========================================================================
    // SIZES
    // =========================================================================

    /// Plaintext bytes per block: the payload capacity with framing on, the
    /// whole block with framing off.
    #[must_use]
    pub const fn plaintext_block_size(&self) -> usize {
        match self.config.padding {
            PaddingMode::On => self.config.block_size.payload_size(),
            PaddingMode::Off => self.config.block_size.bytes(),
        }
    }

    /// Encrypted bytes per block.
    #[must_use]
    pub const fn encrypted_block_size(&self) -> usize {
        self.config.block_size.bytes()
    }

    /// Encrypted length of a `plaintext_len`-byte stream.
    #[must_use]
    pub fn encrypted_size(&self, plaintext_len: usize) -> usize {
        plaintext_len.div_ceil(self.plaintext_block_size()) * self.encrypted_block_size()
    }

    /// The configured block size.
    #[must_use]
    pub const fn block_size(&self) -> BlockSize {
        self.config.block_size
    }

    // =========================================================================
    // BLOCK OPERATIONS
    // =========================================================================

    /// Encrypt one block. `plaintext` may be any length up to the plaintext
    /// block size; shorter inputs are padded out of the engine's generator.
    ///
    /// # Errors
    /// `KeyNotInitialized`, or `InvalidEncryptSize` if `plaintext` exceeds
    /// one block.
    pub fn encrypt_block(&mut self, plaintext: &[u8], seqnum: u16) -> Result<Vec<u8>, MumError> {
        let state = self.state.as_mut().ok_or(MumError::KeyNotInitialized)?;
        let mut out = vec![0u8; self.config.block_size.bytes()];
        state
            .processor
            .encrypt_one(plaintext, seqnum, &mut state.pads[0], &mut out)?;
        Ok(out)
    }

    /// Decrypt one block, returning the payload and its sequence number.
    ///
    /// # Errors
    /// `KeyNotInitialized`, `InvalidDecryptSize` for a wrong-sized input, or
    /// `InvalidEncryptedBlock` if validation fails.
    pub fn decrypt_block(&mut self, block: &[u8]) -> Result<(Vec<u8>, u16), MumError> {
        let state = self.state.as_mut().ok_or(MumError::KeyNotInitialized)?;
        if block.len() != self.config.block_size.bytes() {
            return Err(MumError::InvalidDecryptSize);
        }
        let mut payload = vec![0u8; state.processor.plaintext_block()];
        let (len, seqnum) = state.processor.decrypt_one(block, &mut payload)?;
        payload.truncate(len);
        Ok((payload, seqnum))
    }

    // =========================================================================
    // STREAM OPERATIONS
    // =========================================================================

    /// Encrypt a byte stream of any length. Block `i` is assigned sequence
    /// number `seq_base + i` (wrapping).
    ///
    /// # Errors
    /// `KeyNotInitialized`.
    pub fn encrypt(&mut self, plaintext: &[u8], seq_base: u16) -> Result<Vec<u8>, MumError> {
        let config = self.config;
        let out_len = self.encrypted_size(plaintext.len());
        let state = self.state.as_mut().ok_or(MumError::KeyNotInitialized)?;

        let jobs = streaming::plan_encrypt(
            plaintext,
            config.block_size,
            config.padding,
            seq_base,
            &mut state.pads,
        );
        let mut out = vec![0u8; out_len];

        match state.pool.as_mut() {
            Some(pool) => {
                pool.run(jobs, &mut out)?;
            }
            None => {
                for job in &jobs {
                    let bytes = state.processor.run(job)?;
                    out[job.dst_offset..job.dst_offset + bytes.len()].copy_from_slice(&bytes);
                }
            }
        }
        Ok(out)
    }

    /// Decrypt a stream of whole encrypted blocks.
    ///
    /// # Errors
    /// `KeyNotInitialized`, `InvalidDecryptSize` if the input is not a
    /// multiple of the block size, or `InvalidEncryptedBlock` from any block
    /// that fails validation.
    pub fn decrypt(&mut self, ciphertext: &[u8]) -> Result<Vec<u8>, MumError> {
        let config = self.config;
        let state = self.state.as_mut().ok_or(MumError::KeyNotInitialized)?;
        if ciphertext.len() % config.block_size.bytes() != 0 {
            return Err(MumError::InvalidDecryptSize);
        }

        let jobs = streaming::plan_decrypt(ciphertext, config.block_size, config.padding);
        let blocks = ciphertext.len() / config.block_size.bytes();
        let mut out = vec![0u8; blocks * state.processor.plaintext_block()];

        let written = match state.pool.as_mut() {
            Some(pool) => pool.run(jobs, &mut out)?,
            None => {
                let mut written = 0;
                for job in &jobs {
                    let bytes = state.processor.run(job)?;
                    out[job.dst_offset..job.dst_offset + bytes.len()].copy_from_slice(&bytes);
                    written += bytes.len();
                }
                written
            }
        };
        out.truncate(written);
        Ok(out)
    }
}
