//! # codecbench
//!
//! Repeatable size and throughput measurements for interchangeable
//! compression codecs on a fixed corpus.
//!
//! Every codec configuration (gzip with several I/O strategies and levels,
//! parallel gzip, LZF, LZMA, XZ, Snappy, LZ4 and Zstandard) sits behind the
//! [`Codec`] trait. A [`Registry`] enumerates the configurations as named
//! variants, the [`TrialRunner`] puts each through warm-up and measured
//! trials, and a [`BenchmarkReport`] turns the measurements into a table.
//!
//! ## Quick Start
//!
//! ```no_run
//! use codecbench::{
//!     BenchmarkReport, Corpus, HardwareInfo, MemoryFixtures, Registry, RunConfig, SortKey,
//!     TrialRunner,
//! };
//!
//! let corpus = Corpus::from_bytes("sample.json", codecbench::synthetic_json(1 << 20, 42));
//! let config = RunConfig::quick();
//! let registry = Registry::standard(&config.codecs)?;
//! let fixtures = MemoryFixtures::reference(&corpus)?;
//!
//! let results = TrialRunner::new(&config, &corpus)
//!     .with_fixtures(&fixtures)
//!     .run(&registry)?;
//! let report = BenchmarkReport::new(&corpus, &config, results, HardwareInfo::collect());
//! println!("{}", report.render_table(SortKey::Mean));
//! # Ok::<(), codecbench::BenchError>(())
//! ```
//!
//! ## Measurement protocol
//!
//! For each variant the runner builds a fresh adapter, resolves its input
//! (the corpus for compression, the family's pre-compressed fixture for
//! decompression), runs the warm-up invocations untimed and then times
//! exactly `measured_iterations` invocations. Only the codec call sits inside
//! the timed region. The output length must stay the same across measured
//! invocations, and with verification on the first output has to reproduce
//! the corpus. A failing variant is recorded and the run continues.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod codec;
pub mod config;
pub mod corpus;
mod error;
pub mod fixtures;
mod frame;
pub mod registry;
pub mod report;
pub mod runner;
pub mod stats;

pub use codec::{Codec, Direction, Family};
pub use config::{CodecSettings, DirectionFilter, RunConfig, SortKey};
pub use corpus::{BytesSource, Corpus, CorpusSource, FileSource, synthetic_json};
pub use error::{BenchError, CodecError, CodecResult, ErrorKind, Result};
pub use fixtures::{FixtureSet, FixtureSource, MemoryFixtures};
pub use registry::{CodecVariant, Registry};
pub use report::{BenchmarkReport, HardwareInfo};
pub use runner::{Measurement, Outcome, RunResults, TrialRunner};
pub use stats::Stats;
