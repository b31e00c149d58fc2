//! CPU Reference Kernel
//!
//! Straightforward table-driven implementation of the diffuse/confuse passes
//! over two ping-pong scratch buffers. Diffusion reads four source cells per
//! destination cell and recombines their byte lanes under the round's four
//! bitmasks; confusion XORs the round subkey and substitutes bytes through
//! the per-row permutation.

use super::Kernel;
use crate::kernels::constants::{CELL_SIZE, CELLS_X};
use crate::schedule::Tables;
use std::sync::Arc;

/// Bytes per grid row.
const ROW_BYTES: usize = CELLS_X * CELL_SIZE;

// =============================================================================
// KERNEL STATE
// =============================================================================

/// Reference kernel: shared round tables plus two block-sized scratch
/// buffers. Passes alternate direction, so a finished block always sits in
/// `ping`.
pub(crate) struct CpuKernel {
    tables: Arc<Tables>,
    ping: Box<[u8]>,
    pong: Box<[u8]>,
}

impl CpuKernel {
    pub(crate) fn new(tables: Arc<Tables>) -> Self {
        let block_bytes = tables.block_size.bytes();
        Self {
            tables,
            ping: vec![0u8; block_bytes].into_boxed_slice(),
            pong: vec![0u8; block_bytes].into_boxed_slice(),
        }
    }
}

impl Kernel for CpuKernel {
    fn upload(&mut self, src: &[u8]) {
        self.ping.copy_from_slice(src);
    }

    fn download(&self, dst: &mut [u8]) {
        dst.copy_from_slice(&self.ping);
    }

    fn encrypt_diffuse(&mut self, round: usize) {
        let [a, b, c, d] = self.tables.bitmasks[round];
        let positions = &self.tables.positions[round];
        let src = &self.ping;
        let dst = &mut self.pong;

        for (cell, sources) in positions.iter().enumerate() {
            let out = cell * CELL_SIZE;
            let s1 = cell_at(src, sources[0]);
            let s2 = cell_at(src, sources[1]);
            let s3 = cell_at(src, sources[2]);
            let s4 = cell_at(src, sources[3]);
            // The masks partition the 8 bits, so OR here equals the masked
            // byte addition of the reference layout.
            dst[out] = (s1[0] & a) | (s2[2] & b) | (s3[3] & c) | (s4[1] & d);
            dst[out + 1] = (s1[2] & a) | (s2[3] & b) | (s3[1] & c) | (s4[0] & d);
            dst[out + 2] = (s1[3] & a) | (s2[1] & b) | (s3[0] & c) | (s4[2] & d);
            dst[out + 3] = (s1[1] & a) | (s2[0] & b) | (s3[2] & c) | (s4[3] & d);
        }
    }

    fn encrypt_confuse(&mut self, round: usize) {
        let subkey = self.tables.subkey(round);
        let src = &self.pong;
        let dst = &mut self.ping;

        for (row, permute) in self.tables.permute8[round].iter().enumerate() {
            let base = row * ROW_BYTES;
            for i in base..base + ROW_BYTES {
                dst[i] = permute[usize::from(src[i] ^ subkey[i])];
            }
        }
    }

    fn decrypt_confuse(&mut self, round: usize) {
        let subkey = self.tables.subkey(round);
        let src = &self.ping;
        let dst = &mut self.pong;

        for (row, permute) in self.tables.permute8_inv[round].iter().enumerate() {
            let base = row * ROW_BYTES;
            for i in base..base + ROW_BYTES {
                dst[i] = permute[usize::from(src[i])] ^ subkey[i];
            }
        }
    }

    fn decrypt_diffuse(&mut self, round: usize) {
        let [a, b, c, d] = self.tables.bitmasks[round];
        let positions = &self.tables.positions_inv[round];
        let src = &self.pong;
        let dst = &mut self.ping;

        for (cell, sources) in positions.iter().enumerate() {
            let out = cell * CELL_SIZE;
            let s1 = cell_at(src, sources[0]);
            let s2 = cell_at(src, sources[1]);
            let s3 = cell_at(src, sources[2]);
            let s4 = cell_at(src, sources[3]);
            dst[out] = (s1[0] & a) | (s2[3] & b) | (s3[2] & c) | (s4[1] & d);
            dst[out + 1] = (s1[3] & a) | (s2[2] & b) | (s3[1] & c) | (s4[0] & d);
            dst[out + 2] = (s1[1] & a) | (s2[0] & b) | (s3[3] & c) | (s4[2] & d);
            dst[out + 3] = (s1[2] & a) | (s2[1] & b) | (s3[0] & c) | (s4[3] & d);
        }
    }
}

#[inline]
fn cell_at(buffer: &[u8], cell: u16) -> &[u8] {
    &buffer[usize::from(cell) * CELL_SIZE..usize::from(cell) * CELL_SIZE + CELL_SIZE]
}

// =============================================================================
// TESTS
// =============================================================================
