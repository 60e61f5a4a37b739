//! Pre-compressed inputs for decompression variants.
//!
//! Every family has one reference fixture: the corpus compressed once with
//! that family's reference settings. Decompression variants read it instead
//! of compressing inside the measured loop.

use crate::codec::{
    Codec, Family, GzipCodec, GzipStrategy, LzfCodec, LzmaCodec, Lz4Backend, Lz4Codec, Lz4Quality,
    SnappyCodec, XzCodec, ZstdCodec,
};
use crate::corpus::{Corpus, CorpusSource, FileSource};
use crate::error::{BenchError, Result};
use crate::registry::LZ4_HC_MAX;
use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Supplies the pre-compressed input for a family.
pub trait FixtureSource {
    /// Returns the fixture bytes for `family`.
    ///
    /// # Errors
    ///
    /// Returns [`BenchError::ResourceUnavailable`] if the fixture is missing
    /// or unreadable.
    fn fixture(&self, family: Family) -> Result<Vec<u8>>;
}

/// Codec used to produce a family's reference fixture.
pub fn reference_codec(family: Family) -> Box<dyn Codec> {
    match family {
        Family::Gzip => Box::new(GzipCodec::new(6, GzipStrategy::Stream)),
        Family::Lzf => Box::new(LzfCodec::parallel(None)),
        Family::Lzma => Box::new(LzmaCodec::new(6)),
        Family::Snappy => Box::new(SnappyCodec::new()),
        Family::Xz => Box::new(XzCodec::new(6)),
        Family::Lz4 => Box::new(Lz4Codec::new(
            Lz4Backend::Native(Lz4Quality::High(LZ4_HC_MAX)),
            64 * 1024,
        )),
        Family::Zstd => Box::new(ZstdCodec::new(19)),
    }
}

fn compress_reference(corpus: &Corpus, family: Family) -> Result<Vec<u8>> {
    reference_codec(family)
        .compress(corpus.bytes())
        .map_err(|source| BenchError::CodecFailure {
            variant: format!("fixture/{}", family),
            source,
        })
}

/// Fixture files on disk, named `{dir}/{stem}.{ext}`.
#[derive(Debug, Clone)]
pub struct FixtureSet {
    dir: PathBuf,
    stem: String,
}

impl FixtureSet {
    /// Fixtures under `dir` sharing the file stem `stem`.
    pub fn new(dir: impl Into<PathBuf>, stem: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            stem: stem.into(),
        }
    }

    /// Fixtures stored next to a corpus file, named after it.
    ///
    /// `data/large.json` maps to `data/large.json.gz`, `data/large.json.xz`
    /// and so on.
    pub fn beside(corpus_path: &Path) -> Self {
        let dir = corpus_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        let stem = corpus_path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "corpus".to_string());
        Self::new(dir, stem)
    }

    /// Directory holding the fixtures.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the fixture for `family`.
    pub fn path_for(&self, family: Family) -> PathBuf {
        self.dir.join(format!("{}.{}", self.stem, family.extension()))
    }

    /// Compresses `corpus` with every family's reference settings and writes
    /// the results, returning the written paths in family order.
    ///
    /// # Errors
    ///
    /// Fails on the first codec error or write error.
    pub fn write_reference(&self, corpus: &Corpus) -> Result<Vec<PathBuf>> {
        std::fs::create_dir_all(&self.dir)
            .map_err(|e| BenchError::resource(self.dir.display().to_string(), e))?;

        let mut written = Vec::with_capacity(Family::ALL.len());
        for family in Family::ALL {
            let packed = compress_reference(corpus, family)?;
            let path = self.path_for(family);
            std::fs::write(&path, &packed)
                .map_err(|e| BenchError::resource(path.display().to_string(), e))?;
            info!(
                family = %family,
                path = %path.display(),
                bytes = packed.len(),
                "wrote reference fixture"
            );
            written.push(path);
        }
        Ok(written)
    }
}

impl FixtureSource for FixtureSet {
    fn fixture(&self, family: Family) -> Result<Vec<u8>> {
        let path = self.path_for(family);
        debug!(family = %family, path = %path.display(), "loading fixture");
        FileSource::new(path).load()
    }
}

/// Fixtures held in memory, keyed by family.
#[derive(Debug, Clone, Default)]
pub struct MemoryFixtures {
    fixtures: BTreeMap<Family, Vec<u8>>,
}

impl MemoryFixtures {
    /// An empty set; every lookup fails until fixtures are inserted.
    pub fn new() -> Self {
        Self::default()
    }

    /// Compresses `corpus` with every family's reference settings.
    ///
    /// # Errors
    ///
    /// Returns [`BenchError::CodecFailure`] if a reference codec fails.
    pub fn reference(corpus: &Corpus) -> Result<Self> {
        let mut fixtures = Self::new();
        for family in Family::ALL {
            fixtures.insert(family, compress_reference(corpus, family)?);
        }
        Ok(fixtures)
    }

    /// Sets the fixture for `family`.
    pub fn insert(&mut self, family: Family, bytes: Vec<u8>) {
        self.fixtures.insert(family, bytes);
    }

    /// Drops the fixture for `family`.
    pub fn remove(&mut self, family: Family) -> Option<Vec<u8>> {
        self.fixtures.remove(&family)
    }
}

impl FixtureSource for MemoryFixtures {
    fn fixture(&self, family: Family) -> Result<Vec<u8>> {
        self.fixtures.get(&family).cloned().ok_or_else(|| {
            BenchError::resource(
                format!("{} fixture", family),
                io::Error::new(io::ErrorKind::NotFound, "no fixture loaded"),
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;

    fn corpus() -> Corpus {
        Corpus::from_bytes("fixture-test", crate::corpus::synthetic_json(80_000, 21))
    }

    #[test]
    fn test_paths_use_family_extensions() {
        let set = FixtureSet::new("/data", "large2.json");
        assert_eq!(set.path_for(Family::Gzip), PathBuf::from("/data/large2.json.gz"));
        assert_eq!(set.path_for(Family::Zstd), PathBuf::from("/data/large2.json.zst"));

        let beside = FixtureSet::beside(Path::new("/data/large2.json"));
        assert_eq!(beside.path_for(Family::Snappy), PathBuf::from("/data/large2.json.snappy"));
    }

    #[test]
    fn test_write_then_load_reference_fixtures() {
        let dir = tempfile::tempdir().unwrap();
        let corpus = corpus();
        let set = FixtureSet::new(dir.path(), "corpus.json");

        let written = set.write_reference(&corpus).unwrap();
        assert_eq!(written.len(), Family::ALL.len());

        for family in Family::ALL {
            let packed = set.fixture(family).unwrap();
            let restored = reference_codec(family).decompress(&packed).unwrap();
            assert!(corpus.verify_identical(&restored), "{}", family);
        }
    }

    #[test]
    fn test_missing_fixture_is_resource_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let set = FixtureSet::new(dir.path(), "absent");
        assert_eq!(set.fixture(Family::Xz).unwrap_err().kind(), ErrorKind::ResourceUnavailable);

        let mut memory = MemoryFixtures::reference(&corpus()).unwrap();
        memory.remove(Family::Lz4);
        assert!(memory.fixture(Family::Gzip).is_ok());
        assert_eq!(memory.fixture(Family::Lz4).unwrap_err().kind(), ErrorKind::ResourceUnavailable);
    }
}
