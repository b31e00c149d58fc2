//! Transform Kernels
//!
//! Backend implementations of the per-block eight-round transform. Every
//! backend exposes the same six primitives so the engine, framer, and
//! dispatcher stay backend-agnostic; the CPU kernel is the reference whose
//! output any accelerator must reproduce.

use crate::schedule::Tables;
use crate::types::Backend;
use std::sync::Arc;

pub(crate) mod constants;
pub(crate) mod cpu;

use constants::NUM_ROUNDS;

// =============================================================================
// KERNEL INTERFACE
// =============================================================================

/// The capability set of one transform backend: scratch upload/download plus
/// the diffusion and confusion passes and their inverses.
pub(crate) trait Kernel: Send {
    /// Copy a block into the first ping-pong buffer.
    fn upload(&mut self, src: &[u8]);
    /// Forward diffusion pass for `round`.
    fn encrypt_diffuse(&mut self, round: usize);
    /// Forward confusion pass for `round`.
    fn encrypt_confuse(&mut self, round: usize);
    /// Inverse confusion pass for `round`.
    fn decrypt_confuse(&mut self, round: usize);
    /// Inverse diffusion pass for `round`.
    fn decrypt_diffuse(&mut self, round: usize);
    /// Copy the first ping-pong buffer out.
    fn download(&self, dst: &mut [u8]);

    /// Full eight-round encryption of one block.
    fn encrypt_block(&mut self, src: &[u8], dst: &mut [u8]) {
        self.upload(src);
        for round in 0..NUM_ROUNDS {
            self.encrypt_diffuse(round);
            self.encrypt_confuse(round);
        }
        self.download(dst);
    }

    /// Full eight-round decryption of one block: the inverse passes in
    /// reverse round order.
    fn decrypt_block(&mut self, src: &[u8], dst: &mut [u8]) {
        self.upload(src);
        for round in (0..NUM_ROUNDS).rev() {
            self.decrypt_confuse(round);
            self.decrypt_diffuse(round);
        }
        self.download(dst);
    }
}

/// Instantiate the kernel for a backend.
///
/// The accelerator variants are served by the CPU reference kernel in builds
/// without accelerator support; their observable behavior is identical by
/// construction.
pub(crate) fn build(backend: Backend, tables: &Arc<Tables>) -> Box<dyn Kernel> {
    match backend {
        Backend::Cpu | Backend::CpuMultiThread | Backend::GpuA | Backend::GpuB => {
            Box::new(cpu::CpuKernel::new(Arc::clone(tables)))
        }
    }
}
