//! Basic usage example for codecbench.

use codecbench::{
    BenchmarkReport, Codec, Corpus, DirectionFilter, HardwareInfo, MemoryFixtures, Registry,
    RunConfig, SortKey, TrialRunner,
};
use codecbench::codec::{Lz4Backend, Lz4Codec, ZstdCodec};

fn main() -> codecbench::Result<()> {
    // Example 1: One adapter on its own
    println!("=== Example 1: Single Codec ===");
    let data = codecbench::synthetic_json(256 * 1024, 7);
    let zstd = ZstdCodec::new(3);
    let packed = zstd.compress(&data).map_err(|source| codecbench::BenchError::CodecFailure {
        variant: "zstd".into(),
        source,
    })?;
    println!("Raw size:        {} bytes", data.len());
    println!("Zstd level 3:    {} bytes ({:.1}%)", packed.len(), packed.len() as f64 / data.len() as f64 * 100.0);

    let lz4 = Lz4Codec::new(Lz4Backend::Pure, 64 * 1024);
    if let Ok(packed) = lz4.compress(&data) {
        println!("LZ4 (pure Rust): {} bytes", packed.len());
    }

    println!();

    // Example 2: A short compression-only run over part of the registry
    println!("=== Example 2: Compression Run ===");
    let corpus = Corpus::from_bytes("example.json", data);
    let config = RunConfig {
        warmup_iterations: 1,
        measured_iterations: 3,
        direction: DirectionFilter::Compress,
        variants: Some(vec!["gzip".into(), "zstd".into()]),
        ..RunConfig::quick()
    };
    let mut registry = Registry::standard(&config.codecs)?;
    registry.retain(|variant| config.should_run(variant));

    let results = TrialRunner::new(&config, &corpus).run(&registry)?;
    let report = BenchmarkReport::new(&corpus, &config, results, HardwareInfo::collect());
    print!("{}", report.render_table(SortKey::Ratio));

    println!();

    // Example 3: Decompression needs the pre-compressed fixtures
    println!("=== Example 3: Decompression Run ===");
    let config = RunConfig {
        direction: DirectionFilter::Decompress,
        ..config
    };
    let mut registry = Registry::standard(&config.codecs)?;
    registry.retain(|variant| config.should_run(variant));
    let fixtures = MemoryFixtures::reference(&corpus)?;

    let results = TrialRunner::new(&config, &corpus)
        .with_fixtures(&fixtures)
        .run(&registry)?;
    let report = BenchmarkReport::new(&corpus, &config, results, HardwareInfo::collect());
    print!("{}", report.render_table(SortKey::Mean));

    Ok(())
}
