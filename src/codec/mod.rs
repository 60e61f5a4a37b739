//! Codec adapters.
//!
//! Each adapter binds one codec configuration at construction time and
//! exposes it through [`Codec`]. Calls share no state: every call builds its
//! own encoder, decoder, buffers and (for the parallel adapters) worker pool,
//! so repeated calls are independent and any setup or teardown cost lands
//! inside the call being measured.

mod gzip;
mod lz4;
mod lzf;
mod parallel;
mod snappy;
mod xz;
mod zstd;

pub use gzip::{GzipCodec, GzipStrategy, ParallelGzipCodec};
pub use lz4::{Lz4Backend, Lz4Codec, Lz4Quality};
pub use lzf::LzfCodec;
pub use snappy::SnappyCodec;
pub use xz::{LzmaCodec, XzCodec};
pub use zstd::ZstdCodec;

use crate::error::CodecResult;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A compressor/decompressor pair with a fixed configuration.
pub trait Codec: Send + Sync {
    /// Codec family, used to pick the matching fixture.
    fn family(&self) -> Family;

    /// Compresses `input` into a freshly allocated buffer.
    ///
    /// # Errors
    ///
    /// Returns a [`CodecError`](crate::CodecError) if the underlying library fails.
    fn compress(&self, input: &[u8]) -> CodecResult<Vec<u8>>;

    /// Decompresses `input` into a freshly allocated buffer.
    ///
    /// # Errors
    ///
    /// Returns a [`CodecError`](crate::CodecError) if the input is corrupt or
    /// the underlying library fails.
    fn decompress(&self, input: &[u8]) -> CodecResult<Vec<u8>>;
}

/// Codec family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Family {
    /// gzip (DEFLATE), single or multi-member
    Gzip,
    /// LZF chunk stream
    Lzf,
    /// Legacy `.lzma` container
    Lzma,
    /// Framed Snappy
    Snappy,
    /// `.xz` container
    Xz,
    /// LZ4 block stream
    Lz4,
    /// Zstandard frame
    Zstd,
}

impl Family {
    /// All families, in registry order.
    pub const ALL: [Family; 7] = [
        Family::Gzip,
        Family::Lzf,
        Family::Lzma,
        Family::Snappy,
        Family::Xz,
        Family::Lz4,
        Family::Zstd,
    ];

    /// Short lowercase name.
    pub fn name(&self) -> &'static str {
        match self {
            Family::Gzip => "gzip",
            Family::Lzf => "lzf",
            Family::Lzma => "lzma",
            Family::Snappy => "snappy",
            Family::Xz => "xz",
            Family::Lz4 => "lz4",
            Family::Zstd => "zstd",
        }
    }

    /// File extension used for this family's pre-compressed fixture.
    pub fn extension(&self) -> &'static str {
        match self {
            Family::Gzip => "gz",
            Family::Lzf => "lzf",
            Family::Lzma => "lzma",
            Family::Snappy => "snappy",
            Family::Xz => "xz",
            Family::Lz4 => "lz4",
            Family::Zstd => "zst",
        }
    }
}

impl fmt::Display for Family {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Which half of a codec a variant exercises.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Corpus in, compressed bytes out
    Compress,
    /// Pre-compressed fixture in, corpus out
    Decompress,
}

impl Direction {
    /// Short lowercase name.
    pub fn name(&self) -> &'static str {
        match self {
            Direction::Compress => "compress",
            Direction::Decompress => "decompress",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Upper bound for pre-sizing output buffers from an untrusted size hint.
const MAX_PREALLOC: usize = 64 * 1024 * 1024;

/// Output capacity to reserve when decompressing into a fresh buffer.
pub(crate) fn decompress_capacity(input_len: usize) -> usize {
    input_len.saturating_mul(4).min(MAX_PREALLOC)
}
