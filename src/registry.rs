//! The declarative set of benchmarked variants.
//!
//! A variant is an identity (family, direction, label) plus a factory that
//! builds its adapter. The runner iterates the registry in registration order,
//! which is also the tie-break order in reports.

use crate::codec::{
    Codec, Direction, Family, GzipCodec, GzipStrategy, LzfCodec, LzmaCodec, Lz4Backend, Lz4Codec,
    Lz4Quality, ParallelGzipCodec, SnappyCodec, XzCodec, ZstdCodec,
};
use crate::config::CodecSettings;
use crate::error::{BenchError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// Highest LZ4 HC level.
pub const LZ4_HC_MAX: i32 = 12;

/// Identity of one benchmarked configuration.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CodecVariant {
    /// Codec family
    pub family: Family,
    /// Compress or decompress
    pub direction: Direction,
    /// Parameter label, unique within `(family, direction)`
    pub label: String,
}

impl CodecVariant {
    /// Creates a variant identity.
    pub fn new(family: Family, direction: Direction, label: impl Into<String>) -> Self {
        Self {
            family,
            direction,
            label: label.into(),
        }
    }

    /// Display name, `direction/family/label`.
    pub fn name(&self) -> String {
        format!("{}/{}/{}", self.direction, self.family, self.label)
    }
}

impl fmt::Display for CodecVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.direction, self.family, self.label)
    }
}

/// Builds a fresh adapter for a variant.
pub type CodecFactory = Box<dyn Fn() -> Box<dyn Codec> + Send + Sync>;

/// One registered variant.
pub struct RegistryEntry {
    variant: CodecVariant,
    factory: CodecFactory,
}

impl RegistryEntry {
    /// The variant identity.
    pub fn variant(&self) -> &CodecVariant {
        &self.variant
    }

    /// Builds the adapter.
    pub fn build(&self) -> Box<dyn Codec> {
        (self.factory)()
    }
}

impl fmt::Debug for RegistryEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegistryEntry")
            .field("variant", &self.variant)
            .finish_non_exhaustive()
    }
}

/// Ordered set of variants with unique names.
#[derive(Debug, Default)]
pub struct Registry {
    entries: Vec<RegistryEntry>,
    names: HashSet<String>,
}

impl Registry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a variant.
    ///
    /// # Errors
    ///
    /// Returns [`BenchError::Configuration`] if a variant with the same name
    /// is already registered.
    pub fn register<F>(&mut self, variant: CodecVariant, factory: F) -> Result<()>
    where
        F: Fn() -> Box<dyn Codec> + Send + Sync + 'static,
    {
        let name = variant.name();
        if !self.names.insert(name.clone()) {
            return Err(BenchError::config(format!("duplicate variant name: {}", name)));
        }
        self.entries.push(RegistryEntry {
            variant,
            factory: Box::new(factory),
        });
        Ok(())
    }

    /// The full standard variant set for the given codec settings.
    ///
    /// Compress variants come first, then decompress variants, each grouped
    /// by family.
    ///
    /// # Errors
    ///
    /// Returns [`BenchError::Configuration`] if the settings produce two
    /// variants with the same name (for example a repeated level).
    pub fn standard(settings: &CodecSettings) -> Result<Self> {
        let mut registry = Self::new();
        let compress = Direction::Compress;
        let decompress = Direction::Decompress;
        let buffer = settings.gzip_buffer_size;
        let block = settings.parallel_block_size;
        let threads = settings.threads;
        let lz4_block = settings.lz4_block_size;

        // gzip: I/O strategies at the default level
        registry.register(CodecVariant::new(Family::Gzip, compress, "stream"), || {
            Box::new(GzipCodec::new(6, GzipStrategy::Stream))
        })?;
        registry.register(
            CodecVariant::new(Family::Gzip, compress, format!("chunked-{}", buffer)),
            move || Box::new(GzipCodec::new(6, GzipStrategy::Chunked(buffer))),
        )?;
        registry.register(CodecVariant::new(Family::Gzip, compress, "buffered"), || {
            Box::new(GzipCodec::new(6, GzipStrategy::Buffered))
        })?;
        registry.register(CodecVariant::new(Family::Gzip, compress, "pull"), || {
            Box::new(GzipCodec::new(6, GzipStrategy::Pull))
        })?;
        registry.register(CodecVariant::new(Family::Gzip, compress, "parallel"), move || {
            Box::new(ParallelGzipCodec::new(6, block, threads))
        })?;

        // gzip: levels through the builder API
        registry.register(CodecVariant::new(Family::Gzip, compress, "level-default"), || {
            Box::new(GzipCodec::new(6, GzipStrategy::Builder))
        })?;
        for &level in &settings.gzip_levels {
            registry.register(
                CodecVariant::new(Family::Gzip, compress, format!("level-{}", level)),
                move || Box::new(GzipCodec::new(level, GzipStrategy::Builder)),
            )?;
        }

        registry.register(CodecVariant::new(Family::Lzf, compress, "sequential"), || {
            Box::new(LzfCodec::sequential())
        })?;
        registry.register(CodecVariant::new(Family::Lzf, compress, "parallel"), move || {
            Box::new(LzfCodec::parallel(threads))
        })?;

        let lzma_preset = settings.lzma_preset;
        registry.register(
            CodecVariant::new(Family::Lzma, compress, format!("preset-{}", lzma_preset)),
            move || Box::new(LzmaCodec::new(lzma_preset)),
        )?;

        registry.register(CodecVariant::new(Family::Snappy, compress, "framed"), || {
            Box::new(SnappyCodec::new())
        })?;

        for &preset in &settings.xz_presets {
            registry.register(
                CodecVariant::new(Family::Xz, compress, format!("preset-{}", preset)),
                move || Box::new(XzCodec::new(preset)),
            )?;
        }

        let lz4_high = settings.lz4_high_level;
        let lz4_variants = [
            ("pure-fast".to_string(), Lz4Backend::Pure),
            ("native-fast".to_string(), Lz4Backend::Native(Lz4Quality::Fast(1))),
            (format!("native-high-{}", lz4_high), Lz4Backend::Native(Lz4Quality::High(lz4_high))),
            ("native-high-max".to_string(), Lz4Backend::Native(Lz4Quality::High(LZ4_HC_MAX))),
        ];
        for (label, backend) in lz4_variants {
            registry.register(CodecVariant::new(Family::Lz4, compress, label), move || {
                Box::new(Lz4Codec::new(backend, lz4_block))
            })?;
        }

        for &level in &settings.zstd_levels {
            registry.register(
                CodecVariant::new(Family::Zstd, compress, format!("level-{}", level)),
                move || Box::new(ZstdCodec::new(level)),
            )?;
        }

        // Decompression: every reader consumes the family's reference fixture.
        registry.register(CodecVariant::new(Family::Gzip, decompress, "stream"), || {
            Box::new(GzipCodec::new(6, GzipStrategy::Stream))
        })?;
        registry.register(
            CodecVariant::new(Family::Gzip, decompress, format!("chunked-{}", buffer)),
            move || Box::new(GzipCodec::new(6, GzipStrategy::Chunked(buffer))),
        )?;
        registry.register(CodecVariant::new(Family::Gzip, decompress, "buffered"), || {
            Box::new(GzipCodec::new(6, GzipStrategy::Buffered))
        })?;
        registry.register(CodecVariant::new(Family::Gzip, decompress, "pull"), || {
            Box::new(GzipCodec::new(6, GzipStrategy::Pull))
        })?;
        registry.register(CodecVariant::new(Family::Gzip, decompress, "parallel"), move || {
            Box::new(ParallelGzipCodec::new(6, block, threads))
        })?;
        registry.register(CodecVariant::new(Family::Gzip, decompress, "multi-member"), || {
            Box::new(GzipCodec::new(6, GzipStrategy::Builder))
        })?;
        registry.register(CodecVariant::new(Family::Lzf, decompress, "sequential"), || {
            Box::new(LzfCodec::sequential())
        })?;
        registry.register(CodecVariant::new(Family::Lzma, decompress, "stream"), move || {
            Box::new(LzmaCodec::new(lzma_preset))
        })?;
        registry.register(CodecVariant::new(Family::Snappy, decompress, "framed"), || {
            Box::new(SnappyCodec::new())
        })?;
        registry.register(CodecVariant::new(Family::Xz, decompress, "stream"), || {
            Box::new(XzCodec::new(6))
        })?;
        registry.register(CodecVariant::new(Family::Lz4, decompress, "native"), move || {
            Box::new(Lz4Codec::new(Lz4Backend::Native(Lz4Quality::Fast(1)), lz4_block))
        })?;
        registry.register(CodecVariant::new(Family::Lz4, decompress, "pure"), move || {
            Box::new(Lz4Codec::new(Lz4Backend::Pure, lz4_block))
        })?;
        registry.register(CodecVariant::new(Family::Zstd, decompress, "stream"), || {
            Box::new(ZstdCodec::new(3))
        })?;

        Ok(registry)
    }

    /// Keeps only the entries for which `keep` returns true, preserving order.
    pub fn retain<F>(&mut self, mut keep: F)
    where
        F: FnMut(&CodecVariant) -> bool,
    {
        self.entries.retain(|entry| keep(&entry.variant));
        self.names = self.entries.iter().map(|e| e.variant.name()).collect();
    }

    /// Iterates entries in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &RegistryEntry> {
        self.entries.iter()
    }

    /// Looks up an entry by display name.
    pub fn get(&self, name: &str) -> Option<&RegistryEntry> {
        self.entries.iter().find(|e| e.variant.name() == name)
    }

    /// Number of registered variants.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_registry_shape() {
        let registry = Registry::standard(&CodecSettings::default()).unwrap();
        let compress = registry
            .iter()
            .filter(|e| e.variant().direction == Direction::Compress)
            .count();
        let decompress = registry.len() - compress;
        assert_eq!(compress, 23);
        assert_eq!(decompress, 13);

        // Every family has at least one reader for its fixture
        for family in Family::ALL {
            assert!(
                registry
                    .iter()
                    .any(|e| e.variant().family == family && e.variant().direction == Direction::Decompress),
                "{} has no decompress variant",
                family
            );
        }
    }

    #[test]
    fn test_names_are_unique_and_stable() {
        let a = Registry::standard(&CodecSettings::default()).unwrap();
        let b = Registry::standard(&CodecSettings::default()).unwrap();
        let names_a: Vec<_> = a.iter().map(|e| e.variant().name()).collect();
        let names_b: Vec<_> = b.iter().map(|e| e.variant().name()).collect();
        assert_eq!(names_a, names_b);

        let unique: HashSet<_> = names_a.iter().collect();
        assert_eq!(unique.len(), names_a.len());
        assert!(names_a.contains(&"compress/gzip/chunked-8192".to_string()));
        assert!(names_a.contains(&"decompress/lz4/native".to_string()));
    }

    #[test]
    fn test_duplicate_registration_rejected() {
        let mut registry = Registry::new();
        let variant = CodecVariant::new(Family::Snappy, Direction::Compress, "framed");
        registry
            .register(variant.clone(), || Box::new(SnappyCodec::new()))
            .unwrap();
        let err = registry
            .register(variant, || Box::new(SnappyCodec::new()))
            .unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::Configuration);
    }

    #[test]
    fn test_repeated_level_is_a_configuration_error() {
        let settings = CodecSettings {
            zstd_levels: vec![3, 3],
            ..CodecSettings::default()
        };
        assert!(Registry::standard(&settings).is_err());
    }

    #[test]
    fn test_retain_preserves_order() {
        let mut registry = Registry::standard(&CodecSettings::default()).unwrap();
        registry.retain(|v| v.family == Family::Zstd);
        let names: Vec<_> = registry.iter().map(|e| e.variant().name()).collect();
        assert_eq!(
            names,
            vec![
                "compress/zstd/level-3",
                "compress/zstd/level-1",
                "compress/zstd/level-19",
                "decompress/zstd/stream",
            ]
        );
    }
}
