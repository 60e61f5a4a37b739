//! Error types for codec adapters and benchmark runs.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::io;
use thiserror::Error;

/// Result type for benchmark operations.
pub type Result<T> = std::result::Result<T, BenchError>;

/// Result type for a single codec call.
pub type CodecResult<T> = std::result::Result<T, CodecError>;

/// Errors raised by a codec adapter while compressing or decompressing.
#[derive(Debug, Error)]
pub enum CodecError {
    /// The underlying stream failed.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The input is not valid for this codec.
    #[error("corrupt input: {0}")]
    Corrupt(String),

    /// The codec library reported an error that is not an I/O error.
    #[error("{codec} backend error: {message}")]
    Backend {
        /// Codec that failed
        codec: &'static str,
        /// Message reported by the library
        message: String,
    },

    /// The adapter or its library panicked.
    #[error("panicked: {0}")]
    Panicked(String),
}

impl CodecError {
    pub(crate) fn backend(codec: &'static str, message: impl fmt::Display) -> Self {
        CodecError::Backend {
            codec,
            message: message.to_string(),
        }
    }
}

/// Classification of a [`BenchError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Corpus or fixture missing or unreadable.
    ResourceUnavailable,
    /// A codec failed or produced inconsistent output.
    CodecFailure,
    /// Invalid run configuration.
    Configuration,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::ResourceUnavailable => write!(f, "resource unavailable"),
            ErrorKind::CodecFailure => write!(f, "codec failure"),
            ErrorKind::Configuration => write!(f, "configuration error"),
        }
    }
}

/// Errors that can occur while preparing or running a benchmark.
#[derive(Debug, Error)]
pub enum BenchError {
    /// A corpus or fixture could not be located or read.
    #[error("resource unavailable: {name}: {source}")]
    ResourceUnavailable {
        /// Logical name or path of the resource
        name: String,
        /// Underlying I/O error
        #[source]
        source: io::Error,
    },

    /// A codec call failed.
    #[error("codec failure in {variant}: {source}")]
    CodecFailure {
        /// Variant whose codec failed
        variant: String,
        /// Error reported by the adapter
        #[source]
        source: CodecError,
    },

    /// Two measured invocations of the same variant produced different output sizes.
    #[error("output size of {variant} changed between trials: {expected} bytes, then {actual} bytes")]
    NonDeterministicOutput {
        /// Variant name
        variant: String,
        /// Size seen on the first measured invocation
        expected: usize,
        /// Size seen on a later invocation
        actual: usize,
    },

    /// The variant's output did not reproduce the corpus.
    #[error("{variant} did not reproduce the corpus: expected {expected} bytes, got {actual} bytes")]
    RoundTripMismatch {
        /// Variant name
        variant: String,
        /// Corpus size
        expected: usize,
        /// Size of the reconstructed data
        actual: usize,
    },

    /// The run configuration is invalid.
    #[error("configuration error: {0}")]
    Configuration(String),
}

impl BenchError {
    /// Returns the taxonomy class of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            BenchError::ResourceUnavailable { .. } => ErrorKind::ResourceUnavailable,
            BenchError::CodecFailure { .. }
            | BenchError::NonDeterministicOutput { .. }
            | BenchError::RoundTripMismatch { .. } => ErrorKind::CodecFailure,
            BenchError::Configuration(_) => ErrorKind::Configuration,
        }
    }

    pub(crate) fn config(message: impl Into<String>) -> Self {
        BenchError::Configuration(message.into())
    }

    pub(crate) fn resource(name: impl Into<String>, source: io::Error) -> Self {
        BenchError::ResourceUnavailable {
            name: name.into(),
            source,
        }
    }
}
