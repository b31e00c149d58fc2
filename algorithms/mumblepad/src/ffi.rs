//! C-API Bindings
//!
//! Exposes the engine to C/C++ with the original integer error codes,
//! pointer checks, and panic boundaries. The handle returned by
//! [`mum_engine_create`] is opaque and must be released with
//! [`mum_engine_destroy`].

#![allow(unsafe_code)]
#![allow(clippy::not_unsafe_ptr_arg_deref)]

use crate::engine::MumEngine;
use crate::kernels::constants::KEY_SIZE;
use crate::types::{Backend, BlockSize, EngineConfig, MumError, PaddingMode};
use std::slice;

// =============================================================================
// ERROR CODES
// =============================================================================

/// Success.
pub const MUM_OK: i32 = 0;
/// Plaintext exceeds the block payload capacity.
pub const MUM_ERROR_INVALID_ENCRYPT_SIZE: i32 = -1003;
/// Ciphertext length is not a whole number of blocks.
pub const MUM_ERROR_INVALID_DECRYPT_SIZE: i32 = -1004;
/// Tag, length, or checksum validation failed.
pub const MUM_ERROR_INVALID_ENCRYPTED_BLOCK: i32 = -1005;
/// Key file unreadable or short.
pub const MUM_ERROR_KEYFILE_READ: i32 = -1012;
/// Unrecognized encrypted-file extension.
pub const MUM_ERROR_INVALID_FILE_EXTENSION: i32 = -1014;
/// Subkey index out of range.
pub const MUM_ERROR_SUBKEY_INDEX_OUTOFRANGE: i32 = -1015;
/// Operation before key initialization.
pub const MUM_ERROR_KEY_NOT_INITIALIZED: i32 = -1016;
/// Caller buffer too small for the result.
pub const MUM_ERROR_LENGTH_TOO_SMALL: i32 = -1017;
/// A required pointer argument was null.
pub const MUM_ERROR_NULL_POINTER: i32 = -1;
/// The library panicked behind the FFI boundary.
pub const MUM_ERROR_PANIC: i32 = -2;

const fn code(error: MumError) -> i32 {
    match error {
        MumError::KeyNotInitialized => MUM_ERROR_KEY_NOT_INITIALIZED,
        MumError::InvalidEncryptSize => MUM_ERROR_INVALID_ENCRYPT_SIZE,
        MumError::InvalidDecryptSize => MUM_ERROR_INVALID_DECRYPT_SIZE,
        MumError::InvalidEncryptedBlock => MUM_ERROR_INVALID_ENCRYPTED_BLOCK,
        MumError::SubkeyIndexOutOfRange => MUM_ERROR_SUBKEY_INDEX_OUTOFRANGE,
        MumError::KeyFileRead => MUM_ERROR_KEYFILE_READ,
        MumError::LengthTooSmall => MUM_ERROR_LENGTH_TOO_SMALL,
        MumError::InvalidFileExtension => MUM_ERROR_INVALID_FILE_EXTENSION,
    }
}

fn result_code(result: Result<(), MumError>) -> i32 {
    match result {
        Ok(()) => MUM_OK,
        Err(error) => code(error),
    }
}

// =============================================================================
// LIFECYCLE
// =============================================================================

/// Create an engine. `engine_type` uses the original values (100 = CPU,
/// 101 = CPU multi-threaded, 102/103 = accelerator A/B), `block_type` is the
/// tag 1..=6, `padding_on` is 0 or 1.
///
/// Returns null for unrecognized parameters.
#[no_mangle]
pub extern "C" fn mum_engine_create(
    engine_type: i32,
    block_type: i32,
    padding_on: i32,
    num_threads: u32,
) -> *mut MumEngine {
    let backend = match engine_type {
        100 => Backend::Cpu,
        101 => Backend::CpuMultiThread,
        102 => Backend::GpuA,
        103 => Backend::GpuB,
        _ => return std::ptr::null_mut(),
    };
    let block_size = match block_type {
        1 => BlockSize::B128,
        2 => BlockSize::B256,
        3 => BlockSize::B512,
        4 => BlockSize::B1024,
        5 => BlockSize::B2048,
        6 => BlockSize::B4096,
        _ => return std::ptr::null_mut(),
    };
    let padding = match padding_on {
        0 => PaddingMode::Off,
        1 => PaddingMode::On,
        _ => return std::ptr::null_mut(),
    };

    let config = EngineConfig {
        backend,
        block_size,
        padding,
        num_threads: num_threads as usize,
    };
    Box::into_raw(Box::new(MumEngine::new(config)))
}

/// Destroy an engine created by [`mum_engine_create`].
///
/// # Safety
/// `engine` must be a pointer previously returned by [`mum_engine_create`]
/// that has not already been destroyed; null is ignored.
#[no_mangle]
pub unsafe extern "C" fn mum_engine_destroy(engine: *mut MumEngine) {
    if !engine.is_null() {
        drop(Box::from_raw(engine));
    }
}

/// Initialize the key from a 4096-byte buffer.
///
/// # Safety
/// `engine` must be a live engine handle; `key` must be valid for 4096 bytes.
#[no_mangle]
pub unsafe extern "C" fn mum_init_key(engine: *mut MumEngine, key: *const u8) -> i32 {
    if engine.is_null() || key.is_null() {
        return MUM_ERROR_NULL_POINTER;
    }
    let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
        let engine = &mut *engine;
        let key = slice::from_raw_parts(key, KEY_SIZE);
        result_code(engine.load_key_from_buffer(key))
    }));
    outcome.unwrap_or(MUM_ERROR_PANIC)
}

/// Copy subkey `index` into `out` (4096 bytes).
///
/// # Safety
/// `engine` must be a live engine handle; `out` must be valid for 4096
/// writable bytes.
#[no_mangle]
pub unsafe extern "C" fn mum_get_subkey(
    engine: *const MumEngine,
    index: u32,
    out: *mut u8,
) -> i32 {
    if engine.is_null() || out.is_null() {
        return MUM_ERROR_NULL_POINTER;
    }
    let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
        let engine = &*engine;
        match engine.subkey(index as usize) {
            Ok(subkey) => {
                slice::from_raw_parts_mut(out, KEY_SIZE).copy_from_slice(subkey);
                MUM_OK
            }
            Err(error) => code(error),
        }
    }));
    outcome.unwrap_or(MUM_ERROR_PANIC)
}

// =============================================================================
// SIZES
// =============================================================================

/// Plaintext bytes per block for this configuration.
///
/// # Safety
/// `engine` must be a live engine handle.
#[no_mangle]
pub unsafe extern "C" fn mum_plaintext_block_size(engine: *const MumEngine) -> u32 {
    if engine.is_null() {
        return 0;
    }
    (*engine).plaintext_block_size() as u32
}

/// Encrypted bytes per block for this configuration.
///
/// # Safety
/// `engine` must be a live engine handle.
#[no_mangle]
pub unsafe extern "C" fn mum_encrypted_block_size(engine: *const MumEngine) -> u32 {
    if engine.is_null() {
        return 0;
    }
    (*engine).encrypted_block_size() as u32
}

/// Encrypted length of a `plaintext_len`-byte stream.
///
/// # Safety
/// `engine` must be a live engine handle.
#[no_mangle]
pub unsafe extern "C" fn mum_encrypted_size(engine: *const MumEngine, plaintext_len: u32) -> u32 {
    if engine.is_null() {
        return 0;
    }
    (*engine).encrypted_size(plaintext_len as usize) as u32
}

// =============================================================================
// STREAM OPERATIONS
// =============================================================================

/// Encrypt `src[..src_len]` into `dst`, writing the output length to
/// `out_len`.
///
/// # Safety
/// `engine` must be a live engine handle; `src` must be valid for `src_len`
/// bytes; `dst` must be valid for `dst_capacity` writable bytes; `out_len`
/// must be a valid writable u32.
#[no_mangle]
pub unsafe extern "C" fn mum_encrypt(
    engine: *mut MumEngine,
    src: *const u8,
    src_len: u32,
    dst: *mut u8,
    dst_capacity: u32,
    out_len: *mut u32,
    seq_base: u16,
) -> i32 {
    if engine.is_null() || src.is_null() || dst.is_null() || out_len.is_null() {
        return MUM_ERROR_NULL_POINTER;
    }
    let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
        let engine = &mut *engine;
        let src = slice::from_raw_parts(src, src_len as usize);
        if engine.encrypted_size(src.len()) > dst_capacity as usize {
            return MUM_ERROR_LENGTH_TOO_SMALL;
        }
        match engine.encrypt(src, seq_base) {
            Ok(bytes) => {
                slice::from_raw_parts_mut(dst, bytes.len()).copy_from_slice(&bytes);
                *out_len = bytes.len() as u32;
                MUM_OK
            }
            Err(error) => code(error),
        }
    }));
    outcome.unwrap_or(MUM_ERROR_PANIC)
}

/// Decrypt `src[..src_len]` into `dst`, writing the output length to
/// `out_len`.
///
/// # Safety
/// Same contracts as [`mum_encrypt`].
#[no_mangle]
pub unsafe extern "C" fn mum_decrypt(
    engine: *mut MumEngine,
    src: *const u8,
    src_len: u32,
    dst: *mut u8,
    dst_capacity: u32,
    out_len: *mut u32,
) -> i32 {
    if engine.is_null() || src.is_null() || dst.is_null() || out_len.is_null() {
        return MUM_ERROR_NULL_POINTER;
    }
    let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
        let engine = &mut *engine;
        let src = slice::from_raw_parts(src, src_len as usize);
        match engine.decrypt(src) {
            Ok(bytes) => {
                if bytes.len() > dst_capacity as usize {
                    return MUM_ERROR_LENGTH_TOO_SMALL;
                }
                slice::from_raw_parts_mut(dst, bytes.len()).copy_from_slice(&bytes);
                *out_len = bytes.len() as u32;
                MUM_OK
            }
            Err(error) => code(error),
        }
    }));
    outcome.unwrap_or(MUM_ERROR_PANIC)
}

// =============================================================================
// BLOCK OPERATIONS
// =============================================================================

/// Encrypt one block of up to `src_len` plaintext bytes into `dst`
/// (one encrypted block).
///
/// # Safety
/// `engine` must be a live engine handle; `src` valid for `src_len` bytes;
/// `dst` valid for one encrypted block of writable bytes.
#[no_mangle]
pub unsafe extern "C" fn mum_encrypt_block(
    engine: *mut MumEngine,
    src: *const u8,
    src_len: u32,
    dst: *mut u8,
    seqnum: u16,
) -> i32 {
    if engine.is_null() || src.is_null() || dst.is_null() {
        return MUM_ERROR_NULL_POINTER;
    }
    let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
        let engine = &mut *engine;
        let src = slice::from_raw_parts(src, src_len as usize);
        match engine.encrypt_block(src, seqnum) {
            Ok(block) => {
                slice::from_raw_parts_mut(dst, block.len()).copy_from_slice(&block);
                MUM_OK
            }
            Err(error) => code(error),
        }
    }));
    outcome.unwrap_or(MUM_ERROR_PANIC)
}

/// Decrypt one encrypted block into `dst`, writing the payload length and
/// sequence number out.
///
/// # Safety
/// `engine` must be a live engine handle; `src` valid for one encrypted
/// block; `dst` valid for one plaintext block of writable bytes; `out_len`
/// and `out_seqnum` valid writable integers.
#[no_mangle]
pub unsafe extern "C" fn mum_decrypt_block(
    engine: *mut MumEngine,
    src: *const u8,
    dst: *mut u8,
    out_len: *mut u32,
    out_seqnum: *mut u32,
) -> i32 {
    if engine.is_null() || src.is_null() || dst.is_null() || out_len.is_null() || out_seqnum.is_null()
    {
        return MUM_ERROR_NULL_POINTER;
    }
    let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
        let engine = &mut *engine;
        let src = slice::from_raw_parts(src, engine.encrypted_block_size());
        match engine.decrypt_block(src) {
            Ok((payload, seqnum)) => {
                slice::from_raw_parts_mut(dst, payload.len()).copy_from_slice(&payload);
                *out_len = payload.len() as u32;
                *out_seqnum = u32::from(seqnum);
                MUM_OK
            }
            Err(error) => {
                *out_len = 0;
                code(error)
            }
        }
    }));
    outcome.unwrap_or(MUM_ERROR_PANIC)
}
