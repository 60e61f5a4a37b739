//! Warm-up and measured trials for every registered variant.
//!
//! Variants run one after another. Each gets a fresh adapter, its untimed
//! warm-up invocations and then exactly `measured_iterations` timed
//! invocations. A failure ends that variant only; the run moves on to the next.

use crate::codec::{Codec, Direction};
use crate::config::RunConfig;
use crate::corpus::Corpus;
use crate::error::{BenchError, CodecError, CodecResult, ErrorKind, Result};
use crate::fixtures::FixtureSource;
use crate::registry::{CodecVariant, Registry, RegistryEntry};
use crate::stats::Stats;
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::borrow::Cow;
use std::hint::black_box;
use std::io;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// What happened to one variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome {
    /// Every measured trial succeeded.
    Completed {
        /// Elapsed time of each measured trial, in nanoseconds, in run order
        samples_ns: Vec<u64>,
        /// Output length, identical across measured trials
        output_size: usize,
        /// Summary of `samples_ns`
        stats: Stats,
    },
    /// The variant was aborted.
    Failed {
        /// Error class
        kind: ErrorKind,
        /// Human-readable cause
        message: String,
    },
    /// The run was interrupted before this variant started.
    Skipped,
}

/// The finished record for one variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Measurement {
    /// Variant identity
    pub variant: CodecVariant,
    /// Display name
    pub name: String,
    /// Position in the registry
    pub order: usize,
    /// Length of the input handed to the codec (corpus or fixture), if resolved
    pub input_size: Option<usize>,
    /// Length of the corpus
    pub corpus_size: usize,
    /// Result of the trials
    pub outcome: Outcome,
}

impl Measurement {
    fn new(order: usize, variant: &CodecVariant, corpus_size: usize, outcome: Outcome) -> Self {
        Self {
            name: variant.name(),
            variant: variant.clone(),
            order,
            input_size: None,
            corpus_size,
            outcome,
        }
    }

    /// Returns true if all measured trials succeeded.
    pub fn is_completed(&self) -> bool {
        matches!(self.outcome, Outcome::Completed { .. })
    }

    /// Returns true if the variant was aborted.
    pub fn is_failed(&self) -> bool {
        matches!(self.outcome, Outcome::Failed { .. })
    }

    /// Measured trial durations in run order; empty unless completed.
    pub fn samples(&self) -> Vec<Duration> {
        match &self.outcome {
            Outcome::Completed { samples_ns, .. } => {
                samples_ns.iter().map(|&ns| Duration::from_nanos(ns)).collect()
            }
            _ => Vec::new(),
        }
    }

    /// Timing summary, if completed.
    pub fn stats(&self) -> Option<&Stats> {
        match &self.outcome {
            Outcome::Completed { stats, .. } => Some(stats),
            _ => None,
        }
    }

    /// Compressed byte count: the output of a compress variant, or the
    /// fixture read by a decompress variant.
    pub fn compressed_size(&self) -> Option<usize> {
        match (&self.outcome, self.variant.direction) {
            (Outcome::Completed { output_size, .. }, Direction::Compress) => Some(*output_size),
            (Outcome::Completed { .. }, Direction::Decompress) => self.input_size,
            _ => None,
        }
    }

    /// `compressed_size / corpus_size`.
    pub fn ratio(&self) -> Option<f64> {
        let compressed = self.compressed_size()?;
        if self.corpus_size == 0 {
            return None;
        }
        Some(compressed as f64 / self.corpus_size as f64)
    }

    /// Throughput over the corpus at the mean trial time, in MiB/s.
    pub fn throughput_mib_s(&self) -> Option<f64> {
        self.stats().map(|stats| stats.throughput_mib_s(self.corpus_size))
    }
}

/// Measurements in registry order.
#[derive(Debug, Clone, Default)]
pub struct RunResults {
    /// One entry per registered variant
    pub measurements: Vec<Measurement>,
    /// Set if the interrupt flag stopped the run early
    pub interrupted: bool,
}

impl RunResults {
    /// Number of failed variants.
    pub fn failed(&self) -> usize {
        self.measurements.iter().filter(|m| m.is_failed()).count()
    }
}

/// Runs the trial protocol over a registry.
pub struct TrialRunner<'a> {
    config: &'a RunConfig,
    corpus: &'a Corpus,
    fixtures: Option<&'a dyn FixtureSource>,
    shutdown: Option<&'a AtomicBool>,
}

impl<'a> TrialRunner<'a> {
    /// Runner over `corpus` with the given options.
    ///
    /// Without fixtures every decompress variant fails as resource unavailable.
    pub fn new(config: &'a RunConfig, corpus: &'a Corpus) -> Self {
        Self {
            config,
            corpus,
            fixtures: None,
            shutdown: None,
        }
    }

    /// Inputs for decompress variants.
    pub fn with_fixtures(mut self, fixtures: &'a dyn FixtureSource) -> Self {
        self.fixtures = Some(fixtures);
        self
    }

    /// Flag checked before each variant; once set, remaining variants are skipped.
    pub fn with_shutdown(mut self, flag: &'a AtomicBool) -> Self {
        self.shutdown = Some(flag);
        self
    }

    fn interrupted(&self) -> bool {
        self.shutdown.is_some_and(|flag| flag.load(Ordering::SeqCst))
    }

    /// Runs every variant in registration order.
    ///
    /// # Errors
    ///
    /// Returns [`BenchError::Configuration`] if the configuration is invalid;
    /// nothing runs in that case. Variant failures are recorded in the
    /// results, not returned.
    pub fn run(&self, registry: &Registry) -> Result<RunResults> {
        self.config.validate()?;

        let mut results = RunResults {
            measurements: Vec::with_capacity(registry.len()),
            interrupted: false,
        };

        info!(
            corpus = self.corpus.name(),
            bytes = self.corpus.len(),
            variants = registry.len(),
            warmup = self.config.warmup_iterations,
            measured = self.config.measured_iterations,
            "starting benchmark run"
        );

        for (order, entry) in registry.iter().enumerate() {
            if !results.interrupted && self.interrupted() {
                warn!(remaining = registry.len() - order, "interrupted, skipping remaining variants");
                results.interrupted = true;
            }
            let measurement = if results.interrupted {
                Measurement::new(order, entry.variant(), self.corpus.len(), Outcome::Skipped)
            } else {
                self.measure(order, entry)
            };
            results.measurements.push(measurement);
        }

        Ok(results)
    }

    /// Runs the protocol for a single variant. The configuration must already
    /// be validated.
    fn measure(&self, order: usize, entry: &RegistryEntry) -> Measurement {
        let variant = entry.variant();
        let name = variant.name();
        info!(variant = %name, "measuring");

        let mut input_size = None;
        let outcome = match self.measure_variant(&name, entry, &mut input_size) {
            Ok((samples, output_size)) => {
                let stats = Stats::from_samples(&samples);
                let samples_ns = samples
                    .iter()
                    .map(|d| u64::try_from(d.as_nanos()).unwrap_or(u64::MAX))
                    .collect();
                match stats {
                    Some(stats) => {
                        info!(
                            variant = %name,
                            mean_ms = stats.mean_ns / 1e6,
                            output_size,
                            "completed"
                        );
                        Outcome::Completed {
                            samples_ns,
                            output_size,
                            stats,
                        }
                    }
                    None => Outcome::Failed {
                        kind: ErrorKind::Configuration,
                        message: "no measured trials".to_string(),
                    },
                }
            }
            Err(e) => {
                warn!(variant = %name, kind = %e.kind(), error = %e, "variant failed");
                Outcome::Failed {
                    kind: e.kind(),
                    message: e.to_string(),
                }
            }
        };

        let mut measurement = Measurement::new(order, variant, self.corpus.len(), outcome);
        measurement.input_size = input_size;
        measurement
    }

    fn resolve_input(&self, variant: &CodecVariant) -> Result<Cow<'a, [u8]>> {
        match variant.direction {
            Direction::Compress => Ok(Cow::Borrowed(self.corpus.bytes())),
            Direction::Decompress => {
                let fixtures = self.fixtures.ok_or_else(|| {
                    BenchError::resource(
                        format!("{} fixture", variant.family),
                        io::Error::new(io::ErrorKind::NotFound, "no fixture source configured"),
                    )
                })?;
                fixtures.fixture(variant.family).map(Cow::Owned)
            }
        }
    }

    fn measure_variant(
        &self,
        name: &str,
        entry: &RegistryEntry,
        input_size: &mut Option<usize>,
    ) -> Result<(Vec<Duration>, usize)> {
        let variant = entry.variant();
        let codec = entry.build();
        let input = self.resolve_input(variant)?;
        *input_size = Some(input.len());
        debug!(variant = %name, input_bytes = input.len(), "input resolved");

        let codec_failure = |source: CodecError| BenchError::CodecFailure {
            variant: name.to_string(),
            source,
        };

        for _ in 0..self.config.warmup_iterations {
            let output = invoke(codec.as_ref(), variant.direction, black_box(&input))
                .map_err(codec_failure)?;
            black_box(output);
        }
        debug!(variant = %name, iterations = self.config.warmup_iterations, "warm-up done");

        let iterations = self.config.measured_iterations;
        let mut samples = Vec::with_capacity(iterations);
        let mut expected_size = None;
        let mut first_output = None;

        for i in 0..iterations {
            let start = Instant::now();
            let result = invoke(codec.as_ref(), variant.direction, black_box(&input));
            let elapsed = start.elapsed();
            let output = result.map_err(codec_failure)?;

            match expected_size {
                None => expected_size = Some(output.len()),
                Some(expected) if expected != output.len() => {
                    return Err(BenchError::NonDeterministicOutput {
                        variant: name.to_string(),
                        expected,
                        actual: output.len(),
                    });
                }
                Some(_) => {}
            }
            samples.push(elapsed);

            if i == 0 && self.config.verify {
                first_output = Some(output);
            } else {
                black_box(output);
            }
        }

        if let Some(output) = first_output {
            self.verify(name, codec.as_ref(), variant.direction, &output)?;
            debug!(variant = %name, "output verified");
        }

        Ok((samples, expected_size.unwrap_or(0)))
    }

    fn verify(&self, name: &str, codec: &dyn Codec, direction: Direction, output: &[u8]) -> Result<()> {
        let restored: Cow<'_, [u8]> = match direction {
            Direction::Compress => Cow::Owned(
                invoke(codec, Direction::Decompress, output).map_err(|source| {
                    BenchError::CodecFailure {
                        variant: name.to_string(),
                        source,
                    }
                })?,
            ),
            Direction::Decompress => Cow::Borrowed(output),
        };

        if !self.corpus.verify_identical(&restored) {
            return Err(BenchError::RoundTripMismatch {
                variant: name.to_string(),
                expected: self.corpus.len(),
                actual: restored.len(),
            });
        }
        Ok(())
    }
}

/// Calls the adapter, turning a panic into a [`CodecError::Panicked`].
fn invoke(codec: &dyn Codec, direction: Direction, input: &[u8]) -> CodecResult<Vec<u8>> {
    panic::catch_unwind(AssertUnwindSafe(|| match direction {
        Direction::Compress => codec.compress(input),
        Direction::Decompress => codec.decompress(input),
    }))
    .unwrap_or_else(|payload| Err(CodecError::Panicked(panic_message(payload.as_ref()))))
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
