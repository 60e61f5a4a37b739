//! The benchmark input: an immutable, named byte payload.

use crate::error::{BenchError, Result};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::fmt::Write;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Something that can produce the corpus bytes.
///
/// Every call must return identical bytes; measurements across variants are
/// only comparable when the input is byte-identical.
pub trait CorpusSource {
    /// Stable name used in reports.
    fn name(&self) -> String;

    /// Loads the full payload.
    ///
    /// # Errors
    ///
    /// Returns [`BenchError::ResourceUnavailable`] if the backing data cannot
    /// be located or read.
    fn load(&self) -> Result<Vec<u8>>;
}

/// Corpus read from a file on disk.
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    /// Creates a source for the file at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CorpusSource for FileSource {
    fn name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string())
    }

    fn load(&self) -> Result<Vec<u8>> {
        fs::read(&self.path).map_err(|e| BenchError::resource(self.path.display().to_string(), e))
    }
}

/// Corpus held in memory.
#[derive(Debug, Clone)]
pub struct BytesSource {
    name: String,
    bytes: Arc<[u8]>,
}

impl BytesSource {
    /// Wraps `bytes` under the given name.
    pub fn new(name: impl Into<String>, bytes: impl Into<Arc<[u8]>>) -> Self {
        Self {
            name: name.into(),
            bytes: bytes.into(),
        }
    }
}

impl CorpusSource for BytesSource {
    fn name(&self) -> String {
        self.name.clone()
    }

    fn load(&self) -> Result<Vec<u8>> {
        Ok(self.bytes.to_vec())
    }
}

/// Read-only handle to the loaded corpus.
///
/// Cloning is cheap; every clone views the same bytes.
#[derive(Debug, Clone)]
pub struct Corpus {
    name: String,
    bytes: Arc<[u8]>,
}

impl Corpus {
    /// Loads the corpus once from `source`.
    ///
    /// # Errors
    ///
    /// Propagates the source's [`BenchError::ResourceUnavailable`].
    pub fn from_source(source: &dyn CorpusSource) -> Result<Self> {
        let bytes = source.load()?;
        Ok(Self::from_bytes(source.name(), bytes))
    }

    /// Builds a corpus directly from bytes.
    pub fn from_bytes(name: impl Into<String>, bytes: impl Into<Arc<[u8]>>) -> Self {
        Self {
            name: name.into(),
            bytes: bytes.into(),
        }
    }

    /// Name used in reports.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Size in bytes.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Returns true if the corpus holds no bytes.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// A fresh view of the payload.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Checks that `other` is byte-identical to the corpus.
    pub fn verify_identical(&self, other: &[u8]) -> bool {
        *self.bytes == *other
    }
}

/// Generates a JSON array of user records at least `size_target` bytes long.
///
/// The same `(size_target, seed)` pair always yields the same bytes.
pub fn synthetic_json(size_target: usize, seed: u64) -> Vec<u8> {
    let mut data = String::with_capacity(size_target + 128);
    let mut rng = StdRng::seed_from_u64(seed);
    let roles = ["admin", "editor", "viewer", "guest"];

    data.push_str("[\n");
    while data.len() < size_target {
        let id: u32 = rng.random_range(1000..99999);
        let _ = writeln!(
            data,
            r#"  {{"id": {}, "name": "user_{}", "email": "user{}@test.com", "role": "{}", "score": {:.2}, "active": {}}},"#,
            id,
            rng.random_range(0..1000),
            rng.random_range(0..1000),
            roles[rng.random_range(0..roles.len())],
            rng.random_range(0.0..100.0),
            rng.random_bool(0.8)
        );
    }
    data.push_str("  {}\n]\n");
    data.into_bytes()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bytes_source_is_stable() {
        let source = BytesSource::new("sample", b"abc".to_vec());
        assert_eq!(source.load().unwrap(), source.load().unwrap());
        assert_eq!(source.name(), "sample");
    }

    #[test]
    fn test_missing_file_is_resource_unavailable() {
        let source = FileSource::new("/definitely/not/here/corpus.json");
        let err = Corpus::from_source(&source).unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::ResourceUnavailable);
    }

    #[test]
    fn test_synthetic_json_is_deterministic() {
        let a = synthetic_json(4096, 7);
        let b = synthetic_json(4096, 7);
        assert_eq!(a, b);
        assert!(a.len() >= 4096);
        assert!(a.starts_with(b"[\n"));
        assert!(a.ends_with(b"]\n"));

        let c = synthetic_json(4096, 8);
        assert_ne!(a, c);
    }

    #[test]
    fn test_corpus_identity() {
        let corpus = Corpus::from_bytes("x", b"payload".to_vec());
        assert!(corpus.verify_identical(b"payload"));
        assert!(!corpus.verify_identical(b"payloaD"));
        assert_eq!(corpus.len(), 7);
    }
}
