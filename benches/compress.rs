//! Benchmarks for deflate-stream compression throughput.
//!
//! Covers data patterns, compression levels, memory levels and multi-input parallelism.

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use deflate_stream::{
    CompressionLevel, Compressor, DeflateConfig, MemoryLevel, ParallelCompressor,
    SingleStreamCompressor,
};
use std::io::Cursor;

/// Generate random (incompressible) data
fn generate_random_data(size: usize) -> Vec<u8> {
    use std::collections::hash_map::DefaultHasher;
    use std::hash::{Hash, Hasher};

    let mut data = Vec::with_capacity(size);
    let mut hasher = DefaultHasher::new();

    for i in 0..size {
        i.hash(&mut hasher);
        data.push((hasher.finish() & 0xFF) as u8);
    }
    data
}

/// Generate repetitive (highly compressible) data
fn generate_repetitive_data(size: usize) -> Vec<u8> {
    b"ABCDABCDABCDABCD".iter().cycle().take(size).copied().collect()
}

/// Generate DNA-like data (4 character alphabet, some patterns)
fn generate_dna_data(size: usize) -> Vec<u8> {
    use std::collections::hash_map::DefaultHasher;
    use std::hash::{Hash, Hasher};

    let bases = [b'A', b'C', b'G', b'T'];
    let mut data = Vec::with_capacity(size);
    let mut hasher = DefaultHasher::new();

    // Mix of random and repetitive regions
    let mut i = 0;
    while data.len() < size {
        if i % 1000 == 0 && data.len() + 50 <= size {
            for _ in 0..5 {
                data.extend_from_slice(b"ATATATATAT");
            }
        } else {
            i.hash(&mut hasher);
            let idx = (hasher.finish() % 4) as usize;
            data.push(bases[idx]);
        }
        i += 1;
    }
    data.truncate(size);
    data
}

fn config_for(level: u8) -> DeflateConfig {
    DeflateConfig {
        compression_level: CompressionLevel::try_from(level).unwrap(),
        ..Default::default()
    }
}

fn bench_data_sizes(c: &mut Criterion) {
    let mut group = c.benchmark_group("data_sizes");

    for size in [1024, 64 * 1024, 256 * 1024, 1024 * 1024].iter() {
        let data = generate_dna_data(*size);

        group.throughput(Throughput::Bytes(*size as u64));
        group.bench_with_input(BenchmarkId::new("dna_data", size), &data, |b, data| {
            let config = DeflateConfig::default();
            b.iter(|| {
                let mut compressor = SingleStreamCompressor::new(config.clone());
                let mut output = Vec::new();
                compressor.compress(Cursor::new(data), &mut output).unwrap();
                output
            });
        });
    }

    group.finish();
}

fn bench_data_patterns(c: &mut Criterion) {
    let mut group = c.benchmark_group("data_patterns");
    let size = 256 * 1024;

    let patterns = [
        ("random", generate_random_data(size)),
        ("repetitive", generate_repetitive_data(size)),
        ("dna", generate_dna_data(size)),
    ];

    group.throughput(Throughput::Bytes(size as u64));

    for (name, data) in patterns.iter() {
        group.bench_function(*name, |b| {
            let config = config_for(6);
            b.iter(|| {
                let mut compressor = SingleStreamCompressor::new(config.clone());
                let mut output = Vec::new();
                compressor.compress(Cursor::new(data), &mut output).unwrap();
                output
            });
        });
    }

    group.finish();
}

fn bench_compression_levels(c: &mut Criterion) {
    let mut group = c.benchmark_group("compression_levels");
    let size = 256 * 1024;
    let data = generate_dna_data(size);

    group.throughput(Throughput::Bytes(size as u64));

    for level in [0u8, 1, 4, 6, 9].iter() {
        group.bench_with_input(BenchmarkId::new("level", level), &data, |b, data| {
            let config = config_for(*level);
            b.iter(|| {
                let mut compressor = SingleStreamCompressor::new(config.clone());
                let mut output = Vec::new();
                compressor.compress(Cursor::new(data), &mut output).unwrap();
                output
            });
        });
    }

    group.finish();
}

fn bench_memory_levels(c: &mut Criterion) {
    let mut group = c.benchmark_group("memory_levels");
    let size = 256 * 1024;
    let data = generate_dna_data(size);

    group.throughput(Throughput::Bytes(size as u64));

    for mem in [1u8, 4, 8, 9].iter() {
        group.bench_with_input(BenchmarkId::new("mem_level", mem), &data, |b, data| {
            let config = DeflateConfig {
                memory_level: MemoryLevel::try_from(*mem).unwrap(),
                ..config_for(6)
            };
            b.iter(|| {
                let mut compressor = SingleStreamCompressor::new(config.clone());
                let mut output = Vec::new();
                compressor.compress(Cursor::new(data), &mut output).unwrap();
                output
            });
        });
    }

    group.finish();
}

fn bench_parallel(c: &mut Criterion) {
    let mut group = c.benchmark_group("parallel");

    // Eight independent 256KB inputs at different thread counts
    let inputs: Vec<Vec<u8>> = (0..8).map(|_| generate_dna_data(256 * 1024)).collect();
    let total: usize = inputs.iter().map(Vec::len).sum();

    group.throughput(Throughput::Bytes(total as u64));

    for threads in [1, 2, 4, 8].iter() {
        group.bench_with_input(BenchmarkId::new("threads", threads), &inputs, |b, inputs| {
            let config = DeflateConfig { num_threads: *threads, ..config_for(6) };
            b.iter(|| {
                let mut compressor = ParallelCompressor::new(config.clone());
                let readers: Vec<&[u8]> = inputs.iter().map(Vec::as_slice).collect();
                let mut output = Vec::new();
                compressor.compress_all(readers, &mut output).unwrap();
                output
            });
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_data_sizes,
    bench_data_patterns,
    bench_compression_levels,
    bench_memory_levels,
    bench_parallel,
);
criterion_main!(benches);
