//! Key Schedule
//!
//! Expands the 4096-byte primary key into 560 subkeys and precomputes every
//! table the round passes consume: per-round bitmasks, per-row byte
//! permutations, and cell position permutations, each paired with its
//! inverse. All of it is immutable after derivation and shared by reference
//! across workers.

use crate::kernels::constants::{
    CELLS_X, CYCLE_INDEX_INCREMENT, CYCLE_OFFSET_INCREMENT, KEY_MASK, KEY_SIZE, NUM_CYCLES,
    NUM_POSITIONS, NUM_ROUNDS, NUM_SUBKEYS, PRIME_TABLE,
};
use crate::types::BlockSize;

// =============================================================================
// TABLES
// =============================================================================

/// Read-only state derived from one primary key for one block size.
pub(crate) struct Tables {
    pub(crate) block_size: BlockSize,
    subkeys: Vec<[u8; KEY_SIZE]>,
    /// Four masks per round; together they partition the 8 bit positions.
    pub(crate) bitmasks: [[u8; NUM_POSITIONS]; NUM_ROUNDS],
    /// Byte substitution per round and grid row.
    pub(crate) permute8: [Vec<[u8; 256]>; NUM_ROUNDS],
    /// Inverse byte substitution per round and grid row.
    pub(crate) permute8_inv: [Vec<[u8; 256]>; NUM_ROUNDS],
    /// For each round and destination cell, the four source cell indices.
    pub(crate) positions: [Vec<[u16; NUM_POSITIONS]>; NUM_ROUNDS],
    /// Inverse of [`Tables::positions`] per position lane.
    pub(crate) positions_inv: [Vec<[u16; NUM_POSITIONS]>; NUM_ROUNDS],
}

impl Tables {
    /// Run the full schedule for `key`.
    pub(crate) fn derive(key: &[u8; KEY_SIZE], block_size: BlockSize) -> Self {
        let rows = block_size.rows();
        let subkeys = expand_subkeys(key);

        // Subkeys 0..8 are the confusion XOR keys, consumed directly by the
        // kernel. Table-driving subkeys start at 8.
        let mut subkey_index = 8;

        let mut three_bit: [Vec<u16>; NUM_ROUNDS] = core::array::from_fn(|_| Vec::new());
        for table in &mut three_bit {
            *table = permutation(&subkeys[subkey_index], 8);
            subkey_index += 1;
        }

        let mut permute8: [Vec<[u8; 256]>; NUM_ROUNDS] = core::array::from_fn(|_| Vec::new());
        let mut permute8_inv: [Vec<[u8; 256]>; NUM_ROUNDS] = core::array::from_fn(|_| Vec::new());
        for round in 0..NUM_ROUNDS {
            for _ in 0..rows {
                let table = permutation(&subkeys[subkey_index], 256);
                subkey_index += 1;

                let mut forward = [0u8; 256];
                let mut inverse = [0u8; 256];
                for (n, v) in table.iter().enumerate() {
                    forward[n] = *v as u8;
                    inverse[*v as usize] = n as u8;
                }
                permute8[round].push(forward);
                permute8_inv[round].push(inverse);
            }
        }

        let cells = rows * CELLS_X;
        let mut positions: [Vec<[u16; NUM_POSITIONS]>; NUM_ROUNDS] =
            core::array::from_fn(|_| vec![[0u16; NUM_POSITIONS]; cells]);
        let mut positions_inv: [Vec<[u16; NUM_POSITIONS]>; NUM_ROUNDS] =
            core::array::from_fn(|_| vec![[0u16; NUM_POSITIONS]; cells]);
        for round in 0..NUM_ROUNDS {
            for position in 0..NUM_POSITIONS {
                let table = permutation(&subkeys[subkey_index], cells);
                subkey_index += 1;
                for (n, v) in table.iter().enumerate() {
                    positions[round][n][position] = *v;
                    positions_inv[round][*v as usize][position] = n as u16;
                }
            }
        }

        let mut bitmasks = [[0u8; NUM_POSITIONS]; NUM_ROUNDS];
        for (round, q) in three_bit.iter().enumerate() {
            for pair in 0..NUM_POSITIONS {
                bitmasks[round][pair] =
                    (1u8 << q[pair * 2]) | (1u8 << q[pair * 2 + 1]);
            }
        }

        Self {
            block_size,
            subkeys,
            bitmasks,
            permute8,
            permute8_inv,
            positions,
            positions_inv,
        }
    }

    /// One derived subkey.
    pub(crate) fn subkey(&self, index: usize) -> &[u8; KEY_SIZE] {
        &self.subkeys[index]
    }

    /// All derived subkeys.
    pub(crate) fn subkeys(&self) -> &[[u8; KEY_SIZE]] {
        &self.subkeys
    }
}

// =============================================================================
// SUBKEY EXPANSION
// =============================================================================

/// Derive all 560 subkeys. Each is the XOR of seven prime-stride cycles
/// through the primary key; the prime-index and offset counters advance
/// across cycles and subkeys without ever resetting.
fn expand_subkeys(key: &[u8; KEY_SIZE]) -> Vec<[u8; KEY_SIZE]> {
    let mut subkeys = Vec::with_capacity(NUM_SUBKEYS);
    let mut cycle = [0u8; KEY_SIZE];
    let mut index = 0usize;
    let mut offset = 0usize;

    for _ in 0..NUM_SUBKEYS {
        let mut subkey = [0u8; KEY_SIZE];
        for _ in 0..NUM_CYCLES {
            prime_cycle(key, index, offset, &mut cycle);
            index += CYCLE_INDEX_INCREMENT;
            offset += CYCLE_OFFSET_INCREMENT;
            for (s, c) in subkey.iter_mut().zip(cycle.iter()) {
                *s ^= c;
            }
        }
        subkeys.push(subkey);
    }
    subkeys
}

/// Walk the key with a prime stride, starting at `offset`.
fn prime_cycle(key: &[u8; KEY_SIZE], prime_index: usize, mut offset: usize, out: &mut [u8; KEY_SIZE]) {
    let prime = PRIME_TABLE[prime_index & 255] as usize;
    for byte in out.iter_mut() {
        *byte = key[offset & KEY_MASK];
        offset += prime;
    }
}

/// Little-endian u32 read from a subkey; each byte index wraps independently.
fn subkey_u32(subkey: &[u8; KEY_SIZE], offset: usize) -> u32 {
    u32::from_le_bytes([
        subkey[offset & KEY_MASK],
        subkey[(offset + 1) & KEY_MASK],
        subkey[(offset + 2) & KEY_MASK],
        subkey[(offset + 3) & KEY_MASK],
    ])
}

// =============================================================================
// PERMUTATION GENERATION
// =============================================================================

/// Build a permutation of `0..entries` from subkey material: each draw picks
/// the v-th still-unused value, where v comes from the next key word reduced
/// modulo the number of values left.
fn permutation(subkey: &[u8; KEY_SIZE], entries: usize) -> Vec<u16> {
    let mut used = vec![false; entries];
    let mut table = vec![0u16; entries];
    let mut offset = 0usize;

    for n in 0..entries - 1 {
        let word = subkey_u32(subkey, offset);
        offset += 4;
        let index = (word as usize) % (entries - n);

        let mut seen = 0;
        for (value, flag) in used.iter_mut().enumerate() {
            if *flag {
                continue;
            }
            if seen == index {
                *flag = true;
                table[n] = value as u16;
                break;
            }
            seen += 1;
        }
    }

    // The single remaining value fills the last slot.
    if let Some(last) = used.iter().position(|flag| !flag) {
        table[entries - 1] = last as u16;
    }

    debug_assert_eq!(
        table.iter().map(|v| usize::from(*v)).sum::<usize>(),
        entries * (entries - 1) / 2
    );
    table
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
#[allow(clippy::pedantic, clippy::unwrap_used)]
mod tests {
    use super::*;

    fn patterned_key() -> [u8; KEY_SIZE] {
        let mut key = [0u8; KEY_SIZE];
        for (i, b) in key.iter_mut().enumerate() {
            *b = ((i * 31 + 7) % 251) as u8;
        }
        key
    }

    #[test]
    fn byte_permutations_are_bijections() {
        let tables = Tables::derive(&patterned_key(), BlockSize::B512);
        for round in 0..NUM_ROUNDS {
            for (row, forward) in tables.permute8[round].iter().enumerate() {
                let sum: u32 = forward.iter().map(|v| u32::from(*v)).sum();
                assert_eq!(sum, 32640, "round {round} row {row} is not a permutation");

                let inverse = &tables.permute8_inv[round][row];
                for n in 0..=255u8 {
                    assert_eq!(inverse[forward[n as usize] as usize], n);
                }
            }
        }
    }

    #[test]
    fn bitmasks_partition_the_byte() {
        let tables = Tables::derive(&patterned_key(), BlockSize::B1024);
        for masks in &tables.bitmasks {
            let union = masks.iter().fold(0u8, |acc, m| acc | m);
            assert_eq!(union, 0xff);
            for i in 0..NUM_POSITIONS {
                assert_eq!(masks[i].count_ones(), 2);
                for j in i + 1..NUM_POSITIONS {
                    assert_eq!(masks[i] & masks[j], 0, "masks overlap");
                }
            }
        }
    }

    #[test]
    fn position_tables_are_inverse_pairs() {
        let tables = Tables::derive(&patterned_key(), BlockSize::B256);
        let cells = BlockSize::B256.rows() * CELLS_X;
        for round in 0..NUM_ROUNDS {
            for position in 0..NUM_POSITIONS {
                let mut hit = vec![false; cells];
                for n in 0..cells {
                    let v = tables.positions[round][n][position] as usize;
                    assert!(!hit[v], "cell mapped twice");
                    hit[v] = true;
                    assert_eq!(tables.positions_inv[round][v][position] as usize, n);
                }
            }
        }
    }

    #[test]
    fn subkey_expansion_is_deterministic_and_spread() {
        let key = patterned_key();
        let a = Tables::derive(&key, BlockSize::B128);
        let b = Tables::derive(&key, BlockSize::B128);
        assert_eq!(a.subkey(0), b.subkey(0));
        assert_eq!(a.subkey(559), b.subkey(559));
        assert_ne!(a.subkey(0), a.subkey(1), "cycle counters must advance");
    }

    #[test]
    fn key_word_read_wraps_per_byte() {
        let mut subkey = [0u8; KEY_SIZE];
        subkey[KEY_SIZE - 1] = 0x11;
        subkey[0] = 0x22;
        subkey[1] = 0x33;
        subkey[2] = 0x44;
        assert_eq!(subkey_u32(&subkey, KEY_SIZE - 1), 0x4433_2211);
    }

    #[test]
    fn zero_key_still_yields_valid_tables() {
        let tables = Tables::derive(&[0u8; KEY_SIZE], BlockSize::B128);
        let sum: u32 = tables.permute8[0][0].iter().map(|v| u32::from(*v)).sum();
        assert_eq!(sum, 32640);
        let union = tables.bitmasks[0].iter().fold(0u8, |acc, m| acc | m);
        assert_eq!(union, 0xff);
    }
}
