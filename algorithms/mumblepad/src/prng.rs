//! Padding Generator
//!
//! RC4-style stream generator seeded from 64 KiB of subkey material. Two
//! deliberate departures from stock RC4 keep ciphertext compatible with the
//! reference implementation: the output index is the doubled `S[a]` value,
//! and every regenerated 64 KiB window is XORed with the seed buffer.

use crate::kernels::constants::{KEY_SIZE, PRNG_SEED_SIZE, PRNG_SUBKEYS_PER_SEED};

// =============================================================================
// PAD SOURCE
// =============================================================================

/// Source of padding bytes consumed by the framer.
///
/// Served either by a live [`Prng`] or by a [`PadBuffer`] holding bytes that
/// were pre-fetched in job order, so workers never race on generator state.
pub(crate) trait PadSource {
    /// Fill `dst` with the next padding bytes.
    fn fetch(&mut self, dst: &mut [u8]);
}

/// Cursor over pre-fetched padding bytes.
pub(crate) struct PadBuffer<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> PadBuffer<'a> {
    pub(crate) const fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }
}

impl PadSource for PadBuffer<'_> {
    fn fetch(&mut self, dst: &mut [u8]) {
        let end = self.pos + dst.len();
        dst.copy_from_slice(&self.data[self.pos..end]);
        self.pos = end;
    }
}

// =============================================================================
// GENERATOR
// =============================================================================

/// Zeroed 64 KiB heap buffer without a large stack temporary.
fn seed_buffer() -> Box<[u8; PRNG_SEED_SIZE]> {
    match vec![0u8; PRNG_SEED_SIZE].into_boxed_slice().try_into() {
        Ok(buf) => buf,
        Err(_) => unreachable!("length fixed at allocation"),
    }
}

/// Buffered padding generator.
///
/// Maintains a ready window of one full seed length; a fetch that does not
/// fit in the window's remainder discards that remainder and regenerates.
pub(crate) struct Prng {
    seed: Box<[u8; PRNG_SEED_SIZE]>,
    ready: Box<[u8; PRNG_SEED_SIZE]>,
    state: [u8; 256],
    a: u8,
    b: u8,
    read_index: usize,
}

impl Prng {
    /// Build a generator from the 16 consecutive subkeys starting at `base`.
    pub(crate) fn from_subkeys(subkeys: &[[u8; KEY_SIZE]], base: usize) -> Self {
        let mut seed = seed_buffer();
        for (i, subkey) in subkeys[base..base + PRNG_SUBKEYS_PER_SEED].iter().enumerate() {
            seed[i * KEY_SIZE..(i + 1) * KEY_SIZE].copy_from_slice(subkey);
        }

        let mut prng = Self {
            seed,
            ready: seed_buffer(),
            state: [0u8; 256],
            a: 0,
            b: 0,
            read_index: 0,
        };
        prng.init();
        prng.regenerate();
        prng
    }

    /// Key-schedule the RC4 state from a 256-byte window of the seed,
    /// 89 bytes before its end.
    fn init(&mut self) {
        self.a = 0;
        self.b = 0;
        for (i, s) in self.state.iter_mut().enumerate() {
            *s = i as u8;
        }

        let key = &self.seed[PRNG_SEED_SIZE - 256 - 89..PRNG_SEED_SIZE - 89];
        let mut j = 0u8;
        for i in 0..256 {
            j = j.wrapping_add(self.state[i]).wrapping_add(key[i]);
            self.state.swap(i, j as usize);
        }
    }

    /// Refill the ready window and XOR it with the seed.
    fn regenerate(&mut self) {
        for i in 0..PRNG_SEED_SIZE {
            self.a = self.a.wrapping_add(1);
            self.b = self.b.wrapping_add(self.state[self.a as usize]);
            self.state.swap(self.a as usize, self.b as usize);
            let c = self.state[self.a as usize].wrapping_add(self.state[self.a as usize]);
            self.ready[i] = self.state[c as usize];
        }
        for (r, s) in self.ready.iter_mut().zip(self.seed.iter()) {
            *r ^= s;
        }
        self.read_index = 0;
    }
}

impl PadSource for Prng {
    fn fetch(&mut self, dst: &mut [u8]) {
        if dst.len() > PRNG_SEED_SIZE - self.read_index {
            self.regenerate();
        }
        dst.copy_from_slice(&self.ready[self.read_index..self.read_index + dst.len()]);
        self.read_index += dst.len();
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
#[allow(clippy::pedantic, clippy::unwrap_used)]
mod tests {
    use super::*;

    fn test_subkeys(fill: u8) -> Vec<[u8; KEY_SIZE]> {
        (0..PRNG_SUBKEYS_PER_SEED as u8)
            .map(|i| {
                let mut sk = [0u8; KEY_SIZE];
                for (n, b) in sk.iter_mut().enumerate() {
                    *b = fill.wrapping_add(i).wrapping_mul(n as u8 | 1);
                }
                sk
            })
            .collect()
    }

    #[test]
    fn same_seed_same_stream() {
        let subkeys = test_subkeys(0x5a);
        let mut a = Prng::from_subkeys(&subkeys, 0);
        let mut b = Prng::from_subkeys(&subkeys, 0);
        let mut buf_a = [0u8; 1024];
        let mut buf_b = [0u8; 1024];
        a.fetch(&mut buf_a);
        b.fetch(&mut buf_b);
        assert_eq!(buf_a, buf_b);
    }

    #[test]
    fn different_seed_different_stream() {
        let mut a = Prng::from_subkeys(&test_subkeys(0x5a), 0);
        let mut b = Prng::from_subkeys(&test_subkeys(0x5b), 0);
        let mut buf_a = [0u8; 256];
        let mut buf_b = [0u8; 256];
        a.fetch(&mut buf_a);
        b.fetch(&mut buf_b);
        assert_ne!(buf_a, buf_b);
    }

    #[test]
    fn window_remainder_is_discarded() {
        // A fetch that does not fit throws away the rest of the window, so
        // fetch granularity is part of the stream contract.
        let subkeys = test_subkeys(0x11);
        let mut coarse = Prng::from_subkeys(&subkeys, 0);
        let mut fine = Prng::from_subkeys(&subkeys, 0);

        let mut skip = vec![0u8; PRNG_SEED_SIZE - 6];
        coarse.fetch(&mut skip);
        fine.fetch(&mut skip);

        // coarse: 10 > 6 remaining, regenerates first.
        let mut out_coarse = [0u8; 10];
        coarse.fetch(&mut out_coarse);

        // fine: drains the 6 remaining bytes, then regenerates for 4 more.
        let mut tail = [0u8; 6];
        fine.fetch(&mut tail);
        let mut out_fine = [0u8; 4];
        fine.fetch(&mut out_fine);

        assert_ne!(out_coarse[..4], out_fine[..]);

        let mut again = Prng::from_subkeys(&subkeys, 0);
        again.fetch(&mut skip);
        let mut repeat = [0u8; 10];
        again.fetch(&mut repeat);
        assert_eq!(out_coarse, repeat);
    }

    #[test]
    fn pad_buffer_serves_in_order() {
        let data: Vec<u8> = (0..64u8).collect();
        let mut cursor = PadBuffer::new(&data);
        let mut first = [0u8; 16];
        let mut second = [0u8; 8];
        cursor.fetch(&mut first);
        cursor.fetch(&mut second);
        assert_eq!(first[0], 0);
        assert_eq!(second[0], 16);
    }
}
