//! Zstandard adapter on top of `zstd`.

use super::{Codec, Family, decompress_capacity};
use crate::error::CodecResult;
use std::io::{self, Read};

/// Zstandard frame at a fixed level.
#[derive(Debug, Clone)]
pub struct ZstdCodec {
    level: i32,
}

impl ZstdCodec {
    /// Creates a Zstandard adapter; `level` ranges from 1 to 22.
    pub fn new(level: i32) -> Self {
        Self { level }
    }
}

impl Codec for ZstdCodec {
    fn family(&self) -> Family {
        Family::Zstd
    }

    fn compress(&self, input: &[u8]) -> CodecResult<Vec<u8>> {
        let mut encoder = zstd::stream::Encoder::new(Vec::with_capacity(input.len() / 4), self.level)?;
        io::copy(&mut &input[..], &mut encoder)?;
        Ok(encoder.finish()?)
    }

    fn decompress(&self, input: &[u8]) -> CodecResult<Vec<u8>> {
        let mut out = Vec::with_capacity(decompress_capacity(input.len()));
        zstd::stream::Decoder::new(input)?.read_to_end(&mut out)?;
        Ok(out)
    }
}
