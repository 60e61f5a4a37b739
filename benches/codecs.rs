//! Criterion benchmarks over the standard codec registry.
//!
//! Honors the same `BENCH_*` environment variables as the CLI, so
//! `BENCH_VARIANTS=zstd cargo bench` limits the run to Zstandard.

use codecbench::{Corpus, Direction, FixtureSource, MemoryFixtures, Registry, RunConfig};
use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use std::hint::black_box;
use std::time::Duration;

const CORPUS_SIZE: usize = 1024 * 1024;

fn benchmark_codecs(c: &mut Criterion) {
    let config = RunConfig::from_env().expect("invalid BENCH_* environment");
    let registry = Registry::standard(&config.codecs).expect("invalid codec settings");
    let corpus = Corpus::from_bytes("bench.json", codecbench::synthetic_json(CORPUS_SIZE, 42));
    let fixtures = MemoryFixtures::reference(&corpus).expect("reference fixtures");

    for direction in [Direction::Compress, Direction::Decompress] {
        let mut group = c.benchmark_group(direction.name());
        group.sample_size(config.measured_iterations.max(10));
        group.warm_up_time(Duration::from_millis(500));
        group.throughput(Throughput::Bytes(corpus.len() as u64));

        for entry in registry
            .iter()
            .filter(|e| e.variant().direction == direction && config.should_run(e.variant()))
        {
            let variant = entry.variant();
            let codec = entry.build();
            let id = BenchmarkId::new(variant.family.name(), &variant.label);

            match direction {
                Direction::Compress => {
                    group.bench_function(id, |b| b.iter(|| codec.compress(black_box(corpus.bytes()))));
                }
                Direction::Decompress => {
                    let input = fixtures.fixture(variant.family).expect("fixture");
                    group.bench_function(id, |b| b.iter(|| codec.decompress(black_box(&input))));
                }
            }
        }

        group.finish();
    }
}

criterion_group!(benches, benchmark_codecs);
criterion_main!(benches);
