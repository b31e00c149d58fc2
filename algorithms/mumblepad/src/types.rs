//! Shared types used across the Mumblepad library.

use crate::kernels::constants::{BLOCKTYPE_SHIFT, MAX_THREADS};
use core::fmt;
use std::error;
use std::path::Path;

// =============================================================================
// BLOCK SIZE
// =============================================================================

/// The six supported encrypted-block sizes.
///
/// The discriminant is the 3-bit block-type tag carried in bits 13..15 of
/// every block's length field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum BlockSize {
    /// 128-byte block, 112-byte payload.
    B128 = 1,
    /// 256-byte block, 240-byte payload.
    B256 = 2,
    /// 512-byte block, 492-byte payload.
    B512 = 3,
    /// 1024-byte block, 1000-byte payload.
    B1024 = 4,
    /// 2048-byte block, 2000-byte payload.
    B2048 = 5,
    /// 4096-byte block, 4000-byte payload.
    B4096 = 6,
}

impl BlockSize {
    /// All block sizes, smallest first.
    pub const ALL: [Self; 6] = [
        Self::B128,
        Self::B256,
        Self::B512,
        Self::B1024,
        Self::B2048,
        Self::B4096,
    ];

    /// Encrypted block size in bytes.
    #[must_use]
    pub const fn bytes(self) -> usize {
        match self {
            Self::B128 => 128,
            Self::B256 => 256,
            Self::B512 => 512,
            Self::B1024 => 1024,
            Self::B2048 => 2048,
            Self::B4096 => 4096,
        }
    }

    /// Payload capacity in bytes (dataA + dataB regions).
    #[must_use]
    pub const fn payload_size(self) -> usize {
        match self {
            Self::B128 => 112,
            Self::B256 => 240,
            Self::B512 => 492,
            Self::B1024 => 1000,
            Self::B2048 => 2000,
            Self::B4096 => 4000,
        }
    }

    /// Total random padding bytes per block.
    #[must_use]
    pub const fn padding_size(self) -> usize {
        match self {
            Self::B128 | Self::B256 => 8,
            Self::B512 => 12,
            Self::B1024 => 16,
            Self::B2048 => 40,
            Self::B4096 => 88,
        }
    }

    /// Grid rows: the block is viewed as `rows x 32` cells of 4 bytes.
    #[must_use]
    pub const fn rows(self) -> usize {
        self.bytes() / 128
    }

    /// The 3-bit tag stored in length-field bits 13..15.
    #[must_use]
    pub const fn tag(self) -> u16 {
        self as u16
    }

    /// High bits of the length field for this block size.
    #[must_use]
    pub const fn tag_bits(self) -> u16 {
        (self as u16) << BLOCKTYPE_SHIFT
    }

    /// Encrypted-file extension for this block size (`mu1` .. `mu6`).
    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::B128 => "mu1",
            Self::B256 => "mu2",
            Self::B512 => "mu3",
            Self::B1024 => "mu4",
            Self::B2048 => "mu5",
            Self::B4096 => "mu6",
        }
    }

    /// Map an encrypted-file path back to its block size.
    ///
    /// # Errors
    /// `InvalidFileExtension` if the path does not end in `.mu1` .. `.mu6`.
    pub fn from_path(path: &Path) -> Result<Self, MumError> {
        match path.extension().and_then(|e| e.to_str()) {
            Some("mu1") => Ok(Self::B128),
            Some("mu2") => Ok(Self::B256),
            Some("mu3") => Ok(Self::B512),
            Some("mu4") => Ok(Self::B1024),
            Some("mu5") => Ok(Self::B2048),
            Some("mu6") => Ok(Self::B4096),
            _ => Err(MumError::InvalidFileExtension),
        }
    }
}

// =============================================================================
// ENGINE CONFIGURATION
// =============================================================================

/// Whether blocks carry the random-padding frame.
///
/// With padding off the plaintext block is the encrypted block's payload
/// directly: no checksum, length, sequence number, or per-block randomness.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PaddingMode {
    /// Frame every block (default).
    #[default]
    On,
    /// Raw block transform, same size in and out.
    Off,
}

/// Which execution backend drives the per-block transform.
///
/// `GpuA` and `GpuB` are accepted for configuration compatibility; builds
/// without an accelerator serve them with the CPU reference kernel, whose
/// output any accelerator must reproduce byte-for-byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Backend {
    /// Single-threaded CPU reference.
    #[default]
    Cpu,
    /// Multi-threaded CPU with a worker pool.
    CpuMultiThread,
    /// Accelerator variant A.
    GpuA,
    /// Accelerator variant B.
    GpuB,
}

/// Engine construction parameters.
#[derive(Debug, Clone, Copy)]
pub struct EngineConfig {
    /// Execution backend.
    pub backend: Backend,
    /// Encrypted block size.
    pub block_size: BlockSize,
    /// Framing mode.
    pub padding: PaddingMode,
    /// Worker threads, used only by [`Backend::CpuMultiThread`].
    /// Clamped to 1..=16.
    pub num_threads: usize,
}

impl EngineConfig {
    /// Configuration with the given block size and all other fields default.
    #[must_use]
    pub const fn new(block_size: BlockSize) -> Self {
        Self {
            backend: Backend::Cpu,
            block_size,
            padding: PaddingMode::On,
            num_threads: 1,
        }
    }

    pub(crate) fn clamped_threads(&self) -> usize {
        self.num_threads.clamp(1, MAX_THREADS)
    }
}

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Errors surfaced by the engine. The set and meaning of these variants is
/// stable; FFI callers receive them as fixed negative codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MumError {
    /// Encrypt or decrypt was called before a successful key initialization.
    KeyNotInitialized,
    /// Plaintext longer than the block's payload capacity.
    InvalidEncryptSize,
    /// Ciphertext length is not a multiple of the encrypted block size.
    InvalidDecryptSize,
    /// Block-type tag mismatch, oversized length field, or checksum mismatch.
    InvalidEncryptedBlock,
    /// Subkey index >= 560.
    SubkeyIndexOutOfRange,
    /// Key file missing, unreadable, or shorter than 4096 bytes.
    KeyFileRead,
    /// A caller-supplied buffer cannot hold the result.
    LengthTooSmall,
    /// File name does not carry a recognized `.mu1` .. `.mu6` extension.
    InvalidFileExtension,
}

impl fmt::Display for MumError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            Self::KeyNotInitialized => "key not initialized",
            Self::InvalidEncryptSize => "plaintext exceeds block payload capacity",
            Self::InvalidDecryptSize => "ciphertext length is not a multiple of the block size",
            Self::InvalidEncryptedBlock => "block failed tag, length, or checksum validation",
            Self::SubkeyIndexOutOfRange => "subkey index out of range",
            Self::KeyFileRead => "key file could not be read",
            Self::LengthTooSmall => "destination buffer too small",
            Self::InvalidFileExtension => "unrecognized encrypted-file extension",
        };
        f.write_str(msg)
    }
}

impl error::Error for MumError {}

// =============================================================================
// TESTS
// =============================================================================
