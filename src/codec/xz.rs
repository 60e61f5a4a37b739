//! XZ and legacy LZMA adapters on top of `xz2` (liblzma).

use super::{Codec, Family, decompress_capacity};
use crate::error::{CodecError, CodecResult};
use std::io::{self, Read};
use xz2::read::XzDecoder;
use xz2::stream::{LzmaOptions, Stream};
use xz2::write::XzEncoder;

/// `.xz` container at a fixed preset.
#[derive(Debug, Clone)]
pub struct XzCodec {
    preset: u32,
}

impl XzCodec {
    /// Creates an XZ adapter; `preset` ranges from 0 (fastest) to 9 (smallest).
    pub fn new(preset: u32) -> Self {
        Self { preset }
    }
}

impl Codec for XzCodec {
    fn family(&self) -> Family {
        Family::Xz
    }

    fn compress(&self, input: &[u8]) -> CodecResult<Vec<u8>> {
        let mut encoder = XzEncoder::new(Vec::with_capacity(input.len() / 4), self.preset);
        io::copy(&mut &input[..], &mut encoder)?;
        Ok(encoder.finish()?)
    }

    fn decompress(&self, input: &[u8]) -> CodecResult<Vec<u8>> {
        let mut out = Vec::with_capacity(decompress_capacity(input.len()));
        XzDecoder::new(input).read_to_end(&mut out)?;
        Ok(out)
    }
}

/// Legacy `.lzma` (LZMA-alone) container.
#[derive(Debug, Clone)]
pub struct LzmaCodec {
    preset: u32,
}

impl LzmaCodec {
    /// Creates an LZMA adapter using the options of `preset` (0 to 9).
    pub fn new(preset: u32) -> Self {
        Self { preset }
    }
}

impl Codec for LzmaCodec {
    fn family(&self) -> Family {
        Family::Lzma
    }

    fn compress(&self, input: &[u8]) -> CodecResult<Vec<u8>> {
        let options =
            LzmaOptions::new_preset(self.preset).map_err(|e| CodecError::backend("lzma", e))?;
        let stream = Stream::new_lzma_encoder(&options).map_err(|e| CodecError::backend("lzma", e))?;
        let mut encoder = XzEncoder::new_stream(Vec::with_capacity(input.len() / 4), stream);
        io::copy(&mut &input[..], &mut encoder)?;
        Ok(encoder.finish()?)
    }

    fn decompress(&self, input: &[u8]) -> CodecResult<Vec<u8>> {
        let stream = Stream::new_lzma_decoder(u64::MAX).map_err(|e| CodecError::backend("lzma", e))?;
        let mut out = Vec::with_capacity(decompress_capacity(input.len()));
        XzDecoder::new_stream(input, stream).read_to_end(&mut out)?;
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_xz_presets_round_trip() {
        let data = crate::corpus::synthetic_json(100_000, 5);
        for preset in [0, 6] {
            let codec = XzCodec::new(preset);
            let packed = codec.compress(&data).unwrap();
            assert!(packed.starts_with(&[0xFD, b'7', b'z', b'X', b'Z', 0x00]));
            assert_eq!(codec.decompress(&packed).unwrap(), data);
        }
    }

    #[test]
    fn test_lzma_round_trip() {
        let data = crate::corpus::synthetic_json(100_000, 5);
        let codec = LzmaCodec::new(6);
        let packed = codec.compress(&data).unwrap();
        assert!(packed.len() < data.len());
        assert_eq!(codec.decompress(&packed).unwrap(), data);
    }

    #[test]
    fn test_xz_rejects_lzma_alone() {
        let data = b"some text some text some text".repeat(20);
        let packed = LzmaCodec::new(6).compress(&data).unwrap();
        assert!(XzCodec::new(6).decompress(&packed).is_err());
    }
}
