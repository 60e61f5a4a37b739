//! Framed Snappy adapter on top of `snap`.

use super::{Codec, Family, decompress_capacity};
use crate::error::CodecResult;
use snap::read::FrameDecoder;
use snap::write::FrameEncoder;
use std::io::{self, Read, Write};

/// Snappy in the framing format (stream identifier plus CRC-checked chunks).
#[derive(Debug, Clone, Default)]
pub struct SnappyCodec;

impl SnappyCodec {
    /// Creates a framed Snappy adapter.
    pub fn new() -> Self {
        Self
    }
}

impl Codec for SnappyCodec {
    fn family(&self) -> Family {
        Family::Snappy
    }

    fn compress(&self, input: &[u8]) -> CodecResult<Vec<u8>> {
        let mut encoder = FrameEncoder::new(Vec::with_capacity(input.len() / 2));
        io::copy(&mut &input[..], &mut encoder)?;
        encoder.flush()?;
        let out = encoder
            .into_inner()
            .map_err(|e| io::Error::new(e.error().kind(), e.error().to_string()))?;
        Ok(out)
    }

    fn decompress(&self, input: &[u8]) -> CodecResult<Vec<u8>> {
        let mut out = Vec::with_capacity(decompress_capacity(input.len()));
        FrameDecoder::new(input).read_to_end(&mut out)?;
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snappy_round_trip() {
        let data = crate::corpus::synthetic_json(150_000, 9);
        let codec = SnappyCodec::new();
        let packed = codec.compress(&data).unwrap();
        // Stream identifier chunk
        assert!(packed.starts_with(b"\xff\x06\x00\x00sNaPpY"));
        assert!(packed.len() < data.len());
        assert_eq!(codec.decompress(&packed).unwrap(), data);
    }

    #[test]
    fn test_snappy_detects_corruption() {
        let data = crate::corpus::synthetic_json(20_000, 9);
        let codec = SnappyCodec::new();
        let mut packed = codec.compress(&data).unwrap();
        let mid = packed.len() / 2;
        packed[mid] ^= 0xFF;
        assert!(codec.decompress(&packed).is_err());
    }
}
