//! Worker Pool
//!
//! N worker threads, each owning its own kernel and scratch buffers. The
//! dispatcher hands each job to the first idle worker through that worker's
//! single-slot channel and collects results on a shared completion channel;
//! when every worker is busy it parks on the completion channel with a
//! bounded wait. Jobs carry pre-fetched padding and write to disjoint output
//! regions, so completion order never affects the output bytes.

use crate::schedule::Tables;
use crate::streaming::{BlockProcessor, Job};
use crate::types::{Backend, MumError, PaddingMode};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender, SyncSender};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use crate::kernels::constants::SIGNAL_WAIT_MS;

// =============================================================================
// POOL
// =============================================================================

struct Completion {
    worker: usize,
    dst_offset: usize,
    result: Result<Vec<u8>, MumError>,
}

struct Worker {
    slot: SyncSender<Job>,
    idle: bool,
    thread: Option<JoinHandle<()>>,
}

/// Pool of worker threads sharing one set of round tables.
pub(crate) struct WorkerPool {
    workers: Vec<Worker>,
    done_rx: Receiver<Completion>,
    running: Arc<AtomicBool>,
}

impl WorkerPool {
    /// Spawn `num_threads` workers over the shared tables.
    pub(crate) fn new(tables: &Arc<Tables>, padding: PaddingMode, num_threads: usize) -> Self {
        let running = Arc::new(AtomicBool::new(true));
        let (done_tx, done_rx) = mpsc::channel();

        let workers = (0..num_threads)
            .map(|id| {
                let (slot_tx, slot_rx) = mpsc::sync_channel::<Job>(1);
                let done_tx: Sender<Completion> = done_tx.clone();
                let running = Arc::clone(&running);
                let mut processor =
                    BlockProcessor::new(Backend::CpuMultiThread, tables, padding);

                let thread = std::thread::spawn(move || loop {
                    match slot_rx.recv_timeout(Duration::from_millis(SIGNAL_WAIT_MS)) {
                        Ok(job) => {
                            let completion = Completion {
                                worker: id,
                                dst_offset: job.dst_offset,
                                result: processor.run(&job),
                            };
                            if done_tx.send(completion).is_err() {
                                break;
                            }
                        }
                        Err(RecvTimeoutError::Timeout) => {
                            if !running.load(Ordering::Acquire) {
                                break;
                            }
                        }
                        Err(RecvTimeoutError::Disconnected) => break,
                    }
                });

                Worker {
                    slot: slot_tx,
                    idle: true,
                    thread: Some(thread),
                }
            })
            .collect();

        Self {
            workers,
            done_rx,
            running,
        }
    }

    /// Run all jobs, writing each result at its output offset. Returns the
    /// total bytes written, or the first error any worker reported.
    pub(crate) fn run(&mut self, jobs: Vec<Job>, out: &mut [u8]) -> Result<usize, MumError> {
        let mut outstanding = 0usize;
        let mut written = 0usize;
        let mut first_error = None;

        for job in jobs {
            let mut job = Some(job);
            while let Some(pending) = job.take() {
                if let Some(worker) = self.workers.iter_mut().find(|w| w.idle) {
                    if worker.slot.send(pending).is_err() {
                        unreachable!("worker exited while pool is alive");
                    }
                    worker.idle = false;
                    outstanding += 1;
                } else {
                    // Everyone is busy: park until a completion frees a slot.
                    job = Some(pending);
                    match self.done_rx.recv_timeout(Duration::from_millis(SIGNAL_WAIT_MS)) {
                        Ok(completion) => {
                            self.absorb(completion, out, &mut written, &mut first_error);
                            outstanding -= 1;
                        }
                        Err(RecvTimeoutError::Timeout) => {}
                        Err(RecvTimeoutError::Disconnected) => {
                            unreachable!("completion channel lives as long as the pool")
                        }
                    }
                }
            }
        }

        while outstanding > 0 {
            match self.done_rx.recv_timeout(Duration::from_millis(SIGNAL_WAIT_MS)) {
                Ok(completion) => {
                    self.absorb(completion, out, &mut written, &mut first_error);
                    outstanding -= 1;
                }
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => {
                    unreachable!("completion channel lives as long as the pool")
                }
            }
        }

        match first_error {
            Some(error) => Err(error),
            None => Ok(written),
        }
    }

    fn absorb(
        &mut self,
        completion: Completion,
        out: &mut [u8],
        written: &mut usize,
        first_error: &mut Option<MumError>,
    ) {
        self.workers[completion.worker].idle = true;
        match completion.result {
            Ok(bytes) => {
                out[completion.dst_offset..completion.dst_offset + bytes.len()]
                    .copy_from_slice(&bytes);
                *written += bytes.len();
            }
            Err(error) => {
                first_error.get_or_insert(error);
            }
        }
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        self.running.store(false, Ordering::Release);
        for worker in &mut self.workers {
            // Replacing the sender drops the old one; workers observe the
            // disconnect or the cleared flag and exit after the current job.
            let (dead_tx, _) = mpsc::sync_channel(1);
            worker.slot = dead_tx;
            if let Some(thread) = worker.thread.take() {
                let _ = thread.join();
            }
        }
    }
}
