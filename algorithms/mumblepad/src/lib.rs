//! # Mumblepad
//!
//! Symmetric block cipher with a 4096-byte (32768-bit) key and six block
//! sizes from 128 to 4096 bytes. Each block passes through eight rounds of
//! key-derived diffusion and confusion; a per-block random padding field
//! makes repeated encryptions of the same plaintext differ, and an embedded
//! checksum, length, and sequence number validate every block on decrypt, so
//! no chaining mode is needed.

//! # Usage
//! ```rust
//! use mumblepad::{BlockSize, EngineConfig, MumEngine};
//!
//! let mut engine = MumEngine::new(EngineConfig::new(BlockSize::B128));
//! engine.init_key(&[0x42; mumblepad::KEY_SIZE])?;
//!
//! let ciphertext = engine.encrypt(b"the quick brown fox", 0)?;
//! assert_eq!(engine.decrypt(&ciphertext)?, b"the quick brown fox");
//! # Ok::<(), mumblepad::MumError>(())
//! ```

// =============================================================================
// MODULES
// =============================================================================

mod engine;
mod ffi;
mod framing;
mod kernels;
mod prng;
mod schedule;
mod streaming;
mod types;

// =============================================================================
// EXPORTS
// =============================================================================

pub use engine::MumEngine;
pub use ffi::{
    MUM_ERROR_INVALID_DECRYPT_SIZE, MUM_ERROR_INVALID_ENCRYPTED_BLOCK,
    MUM_ERROR_INVALID_ENCRYPT_SIZE, MUM_ERROR_INVALID_FILE_EXTENSION, MUM_ERROR_KEYFILE_READ,
    MUM_ERROR_KEY_NOT_INITIALIZED, MUM_ERROR_LENGTH_TOO_SMALL, MUM_ERROR_NULL_POINTER,
    MUM_ERROR_PANIC, MUM_ERROR_SUBKEY_INDEX_OUTOFRANGE, MUM_OK,
};
pub use kernels::constants::{KEY_SIZE, MAX_THREADS, NUM_ROUNDS, NUM_SUBKEYS};
pub use types::{Backend, BlockSize, EngineConfig, MumError, PaddingMode};
