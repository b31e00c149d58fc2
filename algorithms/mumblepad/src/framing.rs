//! Block Framing
//!
//! Packs a payload plus metadata into the fixed encrypted-block layout and
//! unpacks/validates it again. Every block interleaves payload halves with
//! random padding runs so that plaintext never sits at a fixed offset
//! bracketed by predictable bytes:
//!
//! ```text
//! paddingA | dataA | paddingB | checksum[4] length[2] seqnum[2] | paddingC | dataB | paddingD
//! ```
//!
//! Region widths differ per block size; the length field carries the payload
//! length in its low 13 bits and the block-type tag in bits 13..15.

use crate::kernels::constants::{BLOCKTYPE_MASK, BLOCKTYPE_SHIFT, BLOCK_INFO_SIZE, LENGTH_MASK};
use crate::prng::PadSource;
use crate::types::{BlockSize, MumError};
use subtle::ConstantTimeEq;

/// Largest total padding across the six layouts.
const MAX_PADDING: usize = 88;

// =============================================================================
// LAYOUT
// =============================================================================

/// Region widths for one block size, in block order.
#[derive(Debug, Clone, Copy)]
struct Layout {
    padding_a: usize,
    data_a: usize,
    padding_b: usize,
    padding_c: usize,
    data_b: usize,
    padding_d: usize,
}

const fn layout(block_size: BlockSize) -> Layout {
    match block_size {
        BlockSize::B128 => Layout {
            padding_a: 2,
            data_a: 72,
            padding_b: 2,
            padding_c: 2,
            data_b: 40,
            padding_d: 2,
        },
        BlockSize::B256 => Layout {
            padding_a: 2,
            data_a: 148,
            padding_b: 2,
            padding_c: 2,
            data_b: 92,
            padding_d: 2,
        },
        BlockSize::B512 => Layout {
            padding_a: 2,
            data_a: 304,
            padding_b: 4,
            padding_c: 4,
            data_b: 188,
            padding_d: 2,
        },
        BlockSize::B1024 => Layout {
            padding_a: 4,
            data_a: 618,
            padding_b: 4,
            padding_c: 4,
            data_b: 382,
            padding_d: 4,
        },
        BlockSize::B2048 => Layout {
            padding_a: 16,
            data_a: 1236,
            padding_b: 4,
            padding_c: 4,
            data_b: 764,
            padding_d: 16,
        },
        BlockSize::B4096 => Layout {
            padding_a: 32,
            data_a: 2472,
            padding_b: 12,
            padding_c: 12,
            data_b: 1528,
            padding_d: 32,
        },
    }
}

// =============================================================================
// FRAMER
// =============================================================================

/// Pack/unpack machinery for one block size.
pub(crate) struct Framer {
    block_size: BlockSize,
    layout: Layout,
}

impl Framer {
    pub(crate) const fn new(block_size: BlockSize) -> Self {
        Self {
            block_size,
            layout: layout(block_size),
        }
    }

    /// Pack `payload[..len]` into `out`.
    ///
    /// `payload` must span the full payload capacity: when `len` is short,
    /// the tail is filled from `pads` before the checksum is computed, so
    /// short plaintexts still produce full-entropy blocks. Padding bytes are
    /// drawn first, then the tail fill; callers replaying pre-fetched padding
    /// rely on that order.
    pub(crate) fn pack(
        &self,
        payload: &mut [u8],
        len: usize,
        seqnum: u16,
        pads: &mut dyn PadSource,
        out: &mut [u8],
    ) -> Result<(), MumError> {
        let capacity = self.block_size.payload_size();
        if len > capacity {
            return Err(MumError::InvalidEncryptSize);
        }

        let mut padding = [0u8; MAX_PADDING];
        let padding = &mut padding[..self.block_size.padding_size()];
        pads.fetch(padding);
        if len < capacity {
            pads.fetch(&mut payload[len..capacity]);
        }

        let checksum = checksum(&payload[..capacity]);
        let length_field = (len as u16) | self.block_size.tag_bits();

        let l = self.layout;
        let mut out_pos = 0;
        let mut pad_pos = 0;
        let mut put = |src: &[u8], out: &mut [u8]| {
            out[out_pos..out_pos + src.len()].copy_from_slice(src);
            out_pos += src.len();
        };

        put(&padding[pad_pos..pad_pos + l.padding_a], out);
        pad_pos += l.padding_a;
        put(&payload[..l.data_a], out);
        put(&padding[pad_pos..pad_pos + l.padding_b], out);
        pad_pos += l.padding_b;
        put(&checksum.to_le_bytes(), out);
        put(&length_field.to_le_bytes(), out);
        put(&seqnum.to_le_bytes(), out);
        put(&padding[pad_pos..pad_pos + l.padding_c], out);
        pad_pos += l.padding_c;
        put(&payload[l.data_a..capacity], out);
        put(&padding[pad_pos..pad_pos + l.padding_d], out);
        Ok(())
    }

    /// Unpack `block` into `payload`, returning `(len, seqnum)`.
    ///
    /// # Errors
    /// `InvalidEncryptedBlock` on a tag mismatch, an oversized length field,
    /// or a checksum mismatch.
    pub(crate) fn unpack(
        &self,
        block: &[u8],
        payload: &mut [u8],
    ) -> Result<(usize, u16), MumError> {
        let l = self.layout;
        let capacity = self.block_size.payload_size();

        let data_a_at = l.padding_a;
        let header_at = data_a_at + l.data_a + l.padding_b;
        let data_b_at = header_at + BLOCK_INFO_SIZE + l.padding_c;

        payload[..l.data_a].copy_from_slice(&block[data_a_at..data_a_at + l.data_a]);
        payload[l.data_a..capacity].copy_from_slice(&block[data_b_at..data_b_at + l.data_b]);

        let length_field = u16::from_le_bytes([block[header_at + 4], block[header_at + 5]]);
        if (length_field & BLOCKTYPE_MASK) >> BLOCKTYPE_SHIFT != self.block_size.tag() {
            return Err(MumError::InvalidEncryptedBlock);
        }
        let len = usize::from(length_field & LENGTH_MASK);
        if len > capacity {
            return Err(MumError::InvalidEncryptedBlock);
        }

        let stored = u32::from_le_bytes([
            block[header_at],
            block[header_at + 1],
            block[header_at + 2],
            block[header_at + 3],
        ]);
        let computed = checksum(&payload[..capacity]);
        if !bool::from(stored.ct_eq(&computed)) {
            return Err(MumError::InvalidEncryptedBlock);
        }

        let seqnum = u16::from_le_bytes([block[header_at + 6], block[header_at + 7]]);
        Ok((len, seqnum))
    }
}

/// Wrapping sum of the payload read as little-endian u32 lanes.
fn checksum(payload: &[u8]) -> u32 {
    payload
        .chunks_exact(4)
        .fold(0u32, |acc, lane| {
            acc.wrapping_add(u32::from_le_bytes([lane[0], lane[1], lane[2], lane[3]]))
        })
}

// =============================================================================
// TESTS
// =============================================================================
