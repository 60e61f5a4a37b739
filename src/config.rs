//! Run configuration.
//!
//! [`RunConfig`] carries the trial protocol options and the codec parameters
//! the standard registry is built from. It can come from a preset, from
//! `BENCH_*` environment variables, or from a JSON file, and is validated
//! once before any variant runs.

use crate::codec::Direction;
use crate::error::{BenchError, Result};
use crate::registry::{CodecVariant, LZ4_HC_MAX};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// Which directions to run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DirectionFilter {
    /// Compression variants only
    Compress,
    /// Decompression variants only
    Decompress,
    /// Everything
    #[default]
    Both,
}

impl DirectionFilter {
    /// Returns true if variants of `direction` should run.
    pub fn includes(self, direction: Direction) -> bool {
        match self {
            DirectionFilter::Both => true,
            DirectionFilter::Compress => direction == Direction::Compress,
            DirectionFilter::Decompress => direction == Direction::Decompress,
        }
    }
}

impl FromStr for DirectionFilter {
    type Err = BenchError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "compress" => Ok(DirectionFilter::Compress),
            "decompress" => Ok(DirectionFilter::Decompress),
            "both" => Ok(DirectionFilter::Both),
            other => Err(BenchError::config(format!("unknown direction: {}", other))),
        }
    }
}

/// Report row ordering.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortKey {
    /// Registry order
    #[default]
    Registration,
    /// Variant name, ascending
    Name,
    /// Mean time, fastest first
    Mean,
    /// Median time, fastest first
    Median,
    /// Compressed size, smallest first
    Size,
    /// Compression ratio, smallest first
    Ratio,
}

impl SortKey {
    /// All keys, for help text.
    pub const ALL: [SortKey; 6] = [
        SortKey::Registration,
        SortKey::Name,
        SortKey::Mean,
        SortKey::Median,
        SortKey::Size,
        SortKey::Ratio,
    ];

    /// Lowercase name.
    pub fn name(&self) -> &'static str {
        match self {
            SortKey::Registration => "registration",
            SortKey::Name => "name",
            SortKey::Mean => "mean",
            SortKey::Median => "median",
            SortKey::Size => "size",
            SortKey::Ratio => "ratio",
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SortKey {
    type Err = BenchError;

    fn from_str(s: &str) -> Result<Self> {
        SortKey::ALL
            .into_iter()
            .find(|key| key.name() == s)
            .ok_or_else(|| BenchError::config(format!("unknown sort key: {}", s)))
    }
}

/// Parameters the standard registry is built from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CodecSettings {
    /// Buffer size of the chunked gzip variant
    pub gzip_buffer_size: usize,
    /// Explicit gzip levels (each becomes a `level-N` variant)
    pub gzip_levels: Vec<u32>,
    /// Input block size of the parallel gzip and LZF variants
    pub parallel_block_size: usize,
    /// Worker threads for parallel variants; `None` uses every core
    pub threads: Option<usize>,
    /// Raw block size of the LZ4 stream
    pub lz4_block_size: usize,
    /// LZ4 high-compression level
    pub lz4_high_level: i32,
    /// LZMA preset
    pub lzma_preset: u32,
    /// XZ presets
    pub xz_presets: Vec<u32>,
    /// Zstandard levels
    pub zstd_levels: Vec<i32>,
}

impl Default for CodecSettings {
    fn default() -> Self {
        Self {
            gzip_buffer_size: 8192,
            gzip_levels: vec![0, 1, 9],
            parallel_block_size: 64 * 1024,
            threads: None,
            lz4_block_size: 64 * 1024,
            lz4_high_level: 9,
            lzma_preset: 6,
            xz_presets: vec![6, 0, 9],
            zstd_levels: vec![3, 1, 19],
        }
    }
}

impl CodecSettings {
    fn validate(&self) -> Result<()> {
        if self.gzip_buffer_size == 0 {
            return Err(BenchError::config("gzip_buffer_size must be positive"));
        }
        check_block_size("parallel_block_size", self.parallel_block_size)?;
        check_block_size("lz4_block_size", self.lz4_block_size)?;
        if self.threads == Some(0) {
            return Err(BenchError::config("threads must be positive"));
        }

        check_levels("gzip_levels", &self.gzip_levels, 0, 9)?;
        check_levels("xz_presets", &self.xz_presets, 0, 9)?;
        check_levels("zstd_levels", &self.zstd_levels, 1, 22)?;
        check_levels("lzma_preset", &[self.lzma_preset], 0, 9)?;
        check_levels("lz4_high_level", &[self.lz4_high_level], 1, LZ4_HC_MAX)?;
        Ok(())
    }
}

fn check_block_size(field: &str, size: usize) -> Result<()> {
    if size == 0 {
        return Err(BenchError::config(format!("{} must be positive", field)));
    }
    if u32::try_from(size).is_err() {
        return Err(BenchError::config(format!(
            "{} of {} exceeds {} bytes",
            field,
            size,
            u32::MAX
        )));
    }
    Ok(())
}

fn check_levels<T>(field: &str, levels: &[T], min: T, max: T) -> Result<()>
where
    T: PartialOrd + Copy + fmt::Display,
{
    if levels.is_empty() {
        return Err(BenchError::config(format!("{} must not be empty", field)));
    }
    if let Some(bad) = levels.iter().find(|&&level| level < min || level > max) {
        return Err(BenchError::config(format!(
            "{} value {} is outside {}..={}",
            field, bad, min, max
        )));
    }
    Ok(())
}

/// Options for one benchmark run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Untimed invocations before measuring
    pub warmup_iterations: usize,
    /// Timed invocations per variant (at least 2)
    pub measured_iterations: usize,
    /// Check that each variant reproduces the corpus
    pub verify: bool,
    /// Which directions to run
    pub direction: DirectionFilter,
    /// Variant filters; `None` runs everything
    pub variants: Option<Vec<String>>,
    /// Report ordering
    pub sort: SortKey,
    /// Codec parameters
    pub codecs: CodecSettings,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self::quick()
    }
}

impl RunConfig {
    /// Short run for local iteration.
    pub fn quick() -> Self {
        Self {
            warmup_iterations: 2,
            measured_iterations: 5,
            verify: true,
            direction: DirectionFilter::Both,
            variants: None,
            sort: SortKey::Registration,
            codecs: CodecSettings::default(),
        }
    }

    /// Longer run for numbers worth publishing.
    pub fn full() -> Self {
        Self {
            warmup_iterations: 5,
            measured_iterations: 20,
            ..Self::quick()
        }
    }

    /// Builds a configuration from `BENCH_MODE` (`quick` or `full`),
    /// `BENCH_WARMUP`, `BENCH_ITERATIONS` and `BENCH_VARIANTS`
    /// (comma-separated filters).
    ///
    /// # Errors
    ///
    /// Returns [`BenchError::Configuration`] if `BENCH_MODE` names an
    /// unknown preset or a numeric variable does not parse.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mode = lookup("BENCH_MODE").unwrap_or_else(|| "quick".to_string());
        let mut config = match mode.as_str() {
            "quick" => Self::quick(),
            "full" => Self::full(),
            other => return Err(BenchError::config(format!("unknown BENCH_MODE: {}", other))),
        };

        if let Some(warmup) = lookup("BENCH_WARMUP") {
            config.warmup_iterations = parse_count("BENCH_WARMUP", &warmup)?;
        }
        if let Some(iterations) = lookup("BENCH_ITERATIONS") {
            config.measured_iterations = parse_count("BENCH_ITERATIONS", &iterations)?;
        }
        if let Some(variants) = lookup("BENCH_VARIANTS") {
            config.variants = Some(
                variants
                    .split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect(),
            );
        }

        Ok(config)
    }

    /// Loads a configuration from a JSON file; missing fields take the
    /// [`quick`](Self::quick) defaults.
    ///
    /// # Errors
    ///
    /// Returns [`BenchError::ResourceUnavailable`] if the file cannot be read
    /// and [`BenchError::Configuration`] if it is not valid JSON for this type.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| BenchError::resource(path.display().to_string(), e))?;
        serde_json::from_str(&text)
            .map_err(|e| BenchError::config(format!("{}: {}", path.display(), e)))
    }

    /// Checks every option.
    ///
    /// # Errors
    ///
    /// Returns [`BenchError::Configuration`] describing the first invalid option.
    pub fn validate(&self) -> Result<()> {
        if self.measured_iterations < 2 {
            return Err(BenchError::config(format!(
                "measured_iterations must be at least 2, got {}",
                self.measured_iterations
            )));
        }
        if let Some(filters) = &self.variants {
            if filters.is_empty() {
                return Err(BenchError::config("variant filter list is empty"));
            }
        }
        self.codecs.validate()
    }

    /// Returns true if `variant` passes the direction and name filters.
    ///
    /// A name filter matches the full variant name, a `direction/family`
    /// prefix, or a bare family name.
    pub fn should_run(&self, variant: &CodecVariant) -> bool {
        if !self.direction.includes(variant.direction) {
            return false;
        }
        let name = variant.name();
        self.variants.as_ref().map_or(true, |filters| {
            filters.iter().any(|filter| {
                name == *filter
                    || name.starts_with(&format!("{}/", filter))
                    || variant.family.name() == filter
            })
        })
    }
}

fn parse_count(key: &str, value: &str) -> Result<usize> {
    value
        .trim()
        .parse()
        .map_err(|_| BenchError::config(format!("{} must be a non-negative integer, got {:?}", key, value)))
}
