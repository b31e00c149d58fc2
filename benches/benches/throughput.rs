//! Throughput Benchmarks
//!
//! Encrypt/decrypt throughput per block size, single- vs multi-threaded.

#![allow(clippy::pedantic, clippy::nursery)]
#![allow(clippy::unwrap_used, clippy::expect_used)]

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use mumblepad::{Backend, BlockSize, EngineConfig, MumEngine, KEY_SIZE};
use rand::Rng;

const STREAM_LEN: usize = 1024 * 1024;

fn random_key() -> [u8; KEY_SIZE] {
    let mut key = [0u8; KEY_SIZE];
    rand::thread_rng().fill(&mut key[..]);
    key
}

fn engine(block_size: BlockSize, backend: Backend, threads: usize) -> MumEngine {
    let mut config = EngineConfig::new(block_size);
    config.backend = backend;
    config.num_threads = threads;
    let mut engine = MumEngine::new(config);
    engine
        .init_key(&random_key())
        .unwrap_or_else(|e| panic!("{e}"));
    engine
}

fn bench_block_sizes(c: &mut Criterion) {
    let mut plaintext = vec![0u8; STREAM_LEN];
    rand::thread_rng().fill(&mut plaintext[..]);

    let mut group = c.benchmark_group("encrypt_single_thread");
    group.throughput(Throughput::Bytes(STREAM_LEN as u64));
    for block_size in BlockSize::ALL {
        let mut engine = engine(block_size, Backend::Cpu, 1);
        group.bench_with_input(
            BenchmarkId::from_parameter(block_size.bytes()),
            &plaintext,
            |b, data| {
                b.iter(|| engine.encrypt(data, 0).unwrap_or_else(|e| panic!("{e}")));
            },
        );
    }
    group.finish();
}

fn bench_decrypt(c: &mut Criterion) {
    let mut plaintext = vec![0u8; STREAM_LEN];
    rand::thread_rng().fill(&mut plaintext[..]);

    let mut group = c.benchmark_group("decrypt_single_thread");
    group.throughput(Throughput::Bytes(STREAM_LEN as u64));
    for block_size in [BlockSize::B128, BlockSize::B1024, BlockSize::B4096] {
        let mut engine = engine(block_size, Backend::Cpu, 1);
        let ciphertext = engine.encrypt(&plaintext, 0).unwrap_or_else(|e| panic!("{e}"));
        group.bench_with_input(
            BenchmarkId::from_parameter(block_size.bytes()),
            &ciphertext,
            |b, data| {
                b.iter(|| engine.decrypt(data).unwrap_or_else(|e| panic!("{e}")));
            },
        );
    }
    group.finish();
}

fn bench_thread_scaling(c: &mut Criterion) {
    let mut plaintext = vec![0u8; 4 * STREAM_LEN];
    rand::thread_rng().fill(&mut plaintext[..]);

    let mut group = c.benchmark_group("encrypt_thread_scaling");
    group.throughput(Throughput::Bytes(4 * STREAM_LEN as u64));
    group.sample_size(20);

    let max_threads = num_cpus::get().min(16);
    let mut threads = 1;
    while threads <= max_threads {
        let mut engine = engine(BlockSize::B4096, Backend::CpuMultiThread, threads);
        group.bench_with_input(
            BenchmarkId::from_parameter(threads),
            &plaintext,
            |b, data| {
                b.iter(|| engine.encrypt(data, 0).unwrap_or_else(|e| panic!("{e}")));
            },
        );
        threads *= 2;
    }
    group.finish();
}

criterion_group!(benches, bench_block_sizes, bench_decrypt, bench_thread_scaling);
criterion_main!(benches);
