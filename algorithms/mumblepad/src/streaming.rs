//! Stream Driver
//!
//! Splits a byte stream into jobs of at most 64 KiB, pre-fetches each job's
//! padding, and runs jobs through the per-block pipeline. The same planning
//! and execution code backs the single-threaded engine and the worker pool,
//! which is what makes their outputs byte-identical: padding is drawn from
//! the engine's generator slots serially at planning time, never by the
//! workers themselves.

use crate::framing::Framer;
use crate::kernels::{self, Kernel};
use crate::prng::{PadBuffer, PadSource, Prng};
use crate::schedule::Tables;
use crate::types::{Backend, BlockSize, MumError, PaddingMode};
use std::sync::Arc;

use crate::kernels::constants::MAX_BYTES_PER_JOB;

// =============================================================================
// JOBS
// =============================================================================

/// One unit of work handed to a worker: a contiguous run of blocks plus
/// everything needed to process them without shared mutable state.
pub(crate) struct Job {
    /// Byte offset of this job's output region.
    pub(crate) dst_offset: usize,
    pub(crate) kind: JobKind,
}

pub(crate) enum JobKind {
    Encrypt {
        /// Plaintext run, up to `blocks_per_job` plaintext blocks.
        plaintext: Vec<u8>,
        /// Padding bytes pre-fetched in job order from the engine's slots.
        padding: Vec<u8>,
        /// Sequence number of the job's first block.
        seq_base: u16,
    },
    Decrypt {
        /// Whole encrypted blocks.
        ciphertext: Vec<u8>,
    },
}

/// Split plaintext into encrypt jobs, drawing padding for job `j` from
/// generator slot `j mod 16`.
pub(crate) fn plan_encrypt(
    input: &[u8],
    block_size: BlockSize,
    padding: PaddingMode,
    seq_base: u16,
    pads: &mut [Prng],
) -> Vec<Job> {
    let encrypted_block = block_size.bytes();
    let plaintext_block = match padding {
        PaddingMode::On => block_size.payload_size(),
        PaddingMode::Off => encrypted_block,
    };
    let blocks_per_job = MAX_BYTES_PER_JOB / plaintext_block;
    let job_input = blocks_per_job * plaintext_block;
    let mut jobs = Vec::with_capacity(input.len().div_ceil(job_input));

    let mut offset = 0;
    let mut seqnum = seq_base;
    let mut index = 0;
    while offset < input.len() {
        let take = job_input.min(input.len() - offset);
        let chunk = &input[offset..offset + take];

        let padding_bytes = match padding {
            PaddingMode::On => prefetch_padding(
                &mut pads[index % pads.len()],
                chunk.len(),
                plaintext_block,
                block_size.padding_size(),
            ),
            PaddingMode::Off => Vec::new(),
        };

        jobs.push(Job {
            dst_offset: index * blocks_per_job * encrypted_block,
            kind: JobKind::Encrypt {
                plaintext: chunk.to_vec(),
                padding: padding_bytes,
                seq_base: seqnum,
            },
        });

        offset += take;
        seqnum = seqnum.wrapping_add(blocks_per_job as u16);
        index += 1;
    }
    jobs
}

/// Split ciphertext into decrypt jobs. The caller has already verified the
/// length is a whole number of blocks.
pub(crate) fn plan_decrypt(input: &[u8], block_size: BlockSize, padding: PaddingMode) -> Vec<Job> {
    let encrypted_block = block_size.bytes();
    let plaintext_block = match padding {
        PaddingMode::On => block_size.payload_size(),
        PaddingMode::Off => encrypted_block,
    };
    let blocks_per_job = MAX_BYTES_PER_JOB / encrypted_block;
    let job_input = blocks_per_job * encrypted_block;

    input
        .chunks(job_input)
        .enumerate()
        .map(|(index, chunk)| Job {
            dst_offset: index * blocks_per_job * plaintext_block,
            kind: JobKind::Decrypt {
                ciphertext: chunk.to_vec(),
            },
        })
        .collect()
}

/// Replay of the framer's fetch pattern: per block, the padding run first,
/// then the tail fill of a short final block. Granularity matters because a
/// generator discards its window remainder on an oversized fetch.
fn prefetch_padding(
    prng: &mut Prng,
    job_len: usize,
    plaintext_block: usize,
    padding_size: usize,
) -> Vec<u8> {
    let blocks = job_len.div_ceil(plaintext_block);
    let short = job_len % plaintext_block;
    let tail = if short == 0 { 0 } else { plaintext_block - short };

    let mut out = vec![0u8; blocks * padding_size + tail];
    let mut cursor = 0;
    for block in 0..blocks {
        prng.fetch(&mut out[cursor..cursor + padding_size]);
        cursor += padding_size;
        if block == blocks - 1 && tail > 0 {
            prng.fetch(&mut out[cursor..cursor + tail]);
            cursor += tail;
        }
    }
    out
}

// =============================================================================
// BLOCK PIPELINE
// =============================================================================

/// Everything one execution context (the engine itself, or one worker) needs
/// to push blocks through pack -> eight rounds -> output and back.
pub(crate) struct BlockProcessor {
    kernel: Box<dyn Kernel>,
    framer: Framer,
    padding: PaddingMode,
    plaintext_block: usize,
    encrypted_block: usize,
    payload: Vec<u8>,
    block: Vec<u8>,
}

impl BlockProcessor {
    pub(crate) fn new(backend: Backend, tables: &Arc<Tables>, padding: PaddingMode) -> Self {
        let block_size = tables.block_size;
        let encrypted_block = block_size.bytes();
        let plaintext_block = match padding {
            PaddingMode::On => block_size.payload_size(),
            PaddingMode::Off => encrypted_block,
        };
        Self {
            kernel: kernels::build(backend, tables),
            framer: Framer::new(block_size),
            padding,
            plaintext_block,
            encrypted_block,
            payload: vec![0u8; plaintext_block],
            block: vec![0u8; encrypted_block],
        }
    }

    pub(crate) const fn plaintext_block(&self) -> usize {
        self.plaintext_block
    }

    /// Encrypt one block. `plaintext` may be shorter than a full block; the
    /// tail comes from `pads` (framed) or is zero-filled (raw).
    pub(crate) fn encrypt_one(
        &mut self,
        plaintext: &[u8],
        seqnum: u16,
        pads: &mut dyn PadSource,
        dst: &mut [u8],
    ) -> Result<(), MumError> {
        if plaintext.len() > self.plaintext_block {
            return Err(MumError::InvalidEncryptSize);
        }
        match self.padding {
            PaddingMode::On => {
                self.payload[..plaintext.len()].copy_from_slice(plaintext);
                self.framer
                    .pack(&mut self.payload, plaintext.len(), seqnum, pads, &mut self.block)?;
                self.kernel.encrypt_block(&self.block, dst);
            }
            PaddingMode::Off => {
                self.block[..plaintext.len()].copy_from_slice(plaintext);
                self.block[plaintext.len()..].fill(0);
                self.kernel.encrypt_block(&self.block, dst);
            }
        }
        Ok(())
    }

    /// Decrypt one block into `payload_out` (which must span one plaintext
    /// block); returns the recovered length and sequence number.
    pub(crate) fn decrypt_one(
        &mut self,
        block: &[u8],
        payload_out: &mut [u8],
    ) -> Result<(usize, u16), MumError> {
        match self.padding {
            PaddingMode::On => {
                self.kernel.decrypt_block(block, &mut self.block);
                self.framer.unpack(&self.block, payload_out)
            }
            PaddingMode::Off => {
                self.kernel.decrypt_block(block, payload_out);
                Ok((self.plaintext_block, 0))
            }
        }
    }

    /// Run one job, returning the bytes of its output region.
    pub(crate) fn run(&mut self, job: &Job) -> Result<Vec<u8>, MumError> {
        match &job.kind {
            JobKind::Encrypt {
                plaintext,
                padding,
                seq_base,
            } => self.run_encrypt(plaintext, padding, *seq_base),
            JobKind::Decrypt { ciphertext } => self.run_decrypt(ciphertext),
        }
    }

    fn run_encrypt(
        &mut self,
        plaintext: &[u8],
        padding: &[u8],
        seq_base: u16,
    ) -> Result<Vec<u8>, MumError> {
        let blocks = plaintext.len().div_ceil(self.plaintext_block);
        let mut out = vec![0u8; blocks * self.encrypted_block];
        let mut pads = PadBuffer::new(padding);

        let mut seqnum = seq_base;
        for (i, dst) in out.chunks_exact_mut(self.encrypted_block).enumerate() {
            let start = i * self.plaintext_block;
            let end = (start + self.plaintext_block).min(plaintext.len());
            self.encrypt_one(&plaintext[start..end], seqnum, &mut pads, dst)?;
            seqnum = seqnum.wrapping_add(1);
        }
        Ok(out)
    }

    fn run_decrypt(&mut self, ciphertext: &[u8]) -> Result<Vec<u8>, MumError> {
        let blocks = ciphertext.len() / self.encrypted_block;
        let mut out = vec![0u8; blocks * self.plaintext_block];

        let mut written = 0;
        for src in ciphertext.chunks_exact(self.encrypted_block) {
            let region = &mut out[written..written + self.plaintext_block];
            let (len, _seqnum) = self.decrypt_one(src, region)?;
            written += len;
        }
        out.truncate(written);
        Ok(out)
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
#[allow(clippy::pedantic, clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::kernels::constants::{KEY_SIZE, PRNG_SUBKEYS_PER_SEED};

    fn test_pads() -> Vec<Prng> {
        let subkeys: Vec<[u8; KEY_SIZE]> = (0..PRNG_SUBKEYS_PER_SEED as u8)
            .map(|i| [i.wrapping_mul(41).wrapping_add(3); KEY_SIZE])
            .collect();
        vec![Prng::from_subkeys(&subkeys, 0)]
    }

    #[test]
    fn encrypt_jobs_cover_the_input_in_order() {
        // 112-byte payloads, 585 blocks per job, 65520 input bytes per job.
        let input = vec![0u8; 140_000];
        let jobs = plan_encrypt(
            &input,
            BlockSize::B128,
            PaddingMode::On,
            0,
            &mut test_pads(),
        );

        assert_eq!(jobs.len(), 3);
        let expected = [(0usize, 65520usize, 0u16), (74880, 65520, 585), (149760, 8960, 1170)];
        for (job, (dst_offset, input_len, seq_base)) in jobs.iter().zip(expected) {
            assert_eq!(job.dst_offset, dst_offset);
            match &job.kind {
                JobKind::Encrypt {
                    plaintext,
                    padding,
                    seq_base: base,
                } => {
                    assert_eq!(plaintext.len(), input_len);
                    assert_eq!(*base, seq_base);
                    // Full blocks only here: 8 padding bytes each, no tail.
                    assert_eq!(padding.len(), plaintext.len() / 112 * 8);
                }
                JobKind::Decrypt { .. } => panic!("expected encrypt job"),
            }
        }
    }

    #[test]
    fn short_final_block_gets_tail_padding() {
        let input = vec![0u8; 100];
        let jobs = plan_encrypt(
            &input,
            BlockSize::B128,
            PaddingMode::On,
            9,
            &mut test_pads(),
        );

        assert_eq!(jobs.len(), 1);
        match &jobs[0].kind {
            JobKind::Encrypt { padding, .. } => {
                assert_eq!(padding.len(), 8 + 12, "padding run plus 12-byte tail");
            }
            JobKind::Decrypt { .. } => panic!("expected encrypt job"),
        }
    }

    #[test]
    fn decrypt_jobs_use_block_multiples() {
        // 65536 input bytes per job at 512 bytes per block.
        let input = vec![0u8; 200_704]; // 392 blocks
        let jobs = plan_decrypt(&input, BlockSize::B512, PaddingMode::On);

        assert_eq!(jobs.len(), 4);
        assert_eq!(jobs[1].dst_offset, 128 * 492);
        match &jobs[3].kind {
            JobKind::Decrypt { ciphertext } => {
                assert_eq!(ciphertext.len(), (392 - 3 * 128) * 512);
            }
            JobKind::Encrypt { .. } => panic!("expected decrypt job"),
        }
    }
}

