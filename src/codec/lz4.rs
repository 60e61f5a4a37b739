//! LZ4 block stream with a pure-Rust and a native (liblz4) backend.
//!
//! The stream is the magic `L4BK` followed by blocks of at most `block_size`
//! raw bytes:
//!
//! ```text
//! tag u8 (0 = stored, 1 = lz4) | raw_len u32 LE | payload_len u32 LE | payload
//! ```
//!
//! Both backends read and write the same layout.

use super::{Codec, Family, decompress_capacity};
use crate::error::{CodecError, CodecResult};
use crate::frame::FrameBuffer;

const MAGIC: &[u8; 4] = b"L4BK";
const BLOCK_STORED: u8 = 0;
const BLOCK_LZ4: u8 = 1;
const BLOCK_HEADER_LEN: usize = 9;

/// Compression effort for the native backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lz4Quality {
    /// Fast compressor with the given acceleration (1 = default).
    Fast(i32),
    /// High-compression (HC) compressor at the given level (1 to 12).
    High(i32),
}

/// Which LZ4 implementation does the work.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lz4Backend {
    /// `lz4_flex`, pure Rust; fast compressor only.
    Pure,
    /// `lz4`, bindings to the C library.
    Native(Lz4Quality),
}

/// LZ4 block stream.
#[derive(Debug, Clone)]
pub struct Lz4Codec {
    backend: Lz4Backend,
    block_size: usize,
}

impl Lz4Codec {
    /// Creates an LZ4 adapter cutting input into `block_size` blocks.
    pub fn new(backend: Lz4Backend, block_size: usize) -> Self {
        Self {
            backend,
            block_size: block_size.max(1),
        }
    }

    fn compress_block(&self, raw: &[u8]) -> CodecResult<Vec<u8>> {
        match self.backend {
            Lz4Backend::Pure => Ok(lz4_flex::block::compress(raw)),
            Lz4Backend::Native(quality) => {
                let mode = match quality {
                    Lz4Quality::Fast(acceleration) => lz4::block::CompressionMode::FAST(acceleration),
                    Lz4Quality::High(level) => lz4::block::CompressionMode::HIGHCOMPRESSION(level),
                };
                Ok(lz4::block::compress(raw, Some(mode), false)?)
            }
        }
    }

    fn decompress_block(&self, packed: &[u8], raw_len: usize) -> CodecResult<Vec<u8>> {
        match self.backend {
            Lz4Backend::Pure => lz4_flex::block::decompress(packed, raw_len)
                .map_err(|e| CodecError::Corrupt(format!("LZ4 block: {}", e))),
            Lz4Backend::Native(_) => {
                let hint = i32::try_from(raw_len)
                    .map_err(|_| CodecError::Corrupt(format!("LZ4 block of {} bytes", raw_len)))?;
                lz4::block::decompress(packed, Some(hint))
                    .map_err(|e| CodecError::Corrupt(format!("LZ4 block: {}", e)))
            }
        }
    }
}

impl Codec for Lz4Codec {
    fn family(&self) -> Family {
        Family::Lz4
    }

    fn compress(&self, input: &[u8]) -> CodecResult<Vec<u8>> {
        let mut frame = FrameBuffer::with_capacity(input.len() / 2 + MAGIC.len());
        frame.write_bytes(MAGIC);

        for raw in input.chunks(self.block_size) {
            let packed = self.compress_block(raw)?;
            let raw_len = u32::try_from(raw.len())
                .map_err(|_| CodecError::backend("lz4", "block larger than 4 GiB"))?;

            if packed.len() < raw.len() {
                frame.write_u8(BLOCK_LZ4);
                frame.write_u32_le(raw_len);
                frame.write_u32_le(packed.len() as u32);
                frame.write_bytes(&packed);
            } else {
                frame.write_u8(BLOCK_STORED);
                frame.write_u32_le(raw_len);
                frame.write_u32_le(raw_len);
                frame.write_bytes(raw);
            }
        }

        Ok(frame.into_vec())
    }

    fn decompress(&self, input: &[u8]) -> CodecResult<Vec<u8>> {
        let mut frame = FrameBuffer::reader(input);
        frame.expect_bytes(MAGIC, "LZ4 stream magic")?;

        let mut out = Vec::with_capacity(decompress_capacity(input.len()));
        while frame.remaining() >= BLOCK_HEADER_LEN {
            let tag = frame.read_u8()?;
            let raw_len = frame.read_u32_le()? as usize;
            let payload_len = frame.read_u32_le()? as usize;
            let payload = frame.read_bytes(payload_len)?;

            match tag {
                BLOCK_STORED => out.extend_from_slice(payload),
                BLOCK_LZ4 => {
                    let raw = self.decompress_block(payload, raw_len)?;
                    if raw.len() != raw_len {
                        return Err(CodecError::Corrupt(format!(
                            "LZ4 block expanded to {} bytes, header says {}",
                            raw.len(),
                            raw_len
                        )));
                    }
                    out.extend_from_slice(&raw);
                }
                other => return Err(CodecError::Corrupt(format!("unknown LZ4 block tag {}", other))),
            }
        }

        if !frame.is_exhausted() {
            return Err(CodecError::Corrupt(format!(
                "{} trailing bytes after last LZ4 block",
                frame.remaining()
            )));
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BLOCK: usize = 64 * 1024;

    fn backends() -> [Lz4Backend; 4] {
        [
            Lz4Backend::Pure,
            Lz4Backend::Native(Lz4Quality::Fast(1)),
            Lz4Backend::Native(Lz4Quality::High(9)),
            Lz4Backend::Native(Lz4Quality::High(12)),
        ]
    }

    #[test]
    fn test_backends_round_trip() {
        let data = crate::corpus::synthetic_json(300_000, 13);
        for backend in backends() {
            let codec = Lz4Codec::new(backend, BLOCK);
            let packed = codec.compress(&data).unwrap();
            assert!(packed.len() < data.len(), "{:?}", backend);
            assert_eq!(codec.decompress(&packed).unwrap(), data, "{:?}", backend);
        }
    }

    #[test]
    fn test_backends_share_the_stream_layout() {
        let data = crate::corpus::synthetic_json(200_000, 13);
        let native = Lz4Codec::new(Lz4Backend::Native(Lz4Quality::High(12)), BLOCK);
        let pure = Lz4Codec::new(Lz4Backend::Pure, BLOCK);
        assert_eq!(pure.decompress(&native.compress(&data).unwrap()).unwrap(), data);
        assert_eq!(native.decompress(&pure.compress(&data).unwrap()).unwrap(), data);
    }

    #[test]
    fn test_high_compression_is_smaller() {
        let data = crate::corpus::synthetic_json(300_000, 13);
        let fast = Lz4Codec::new(Lz4Backend::Native(Lz4Quality::Fast(1)), BLOCK)
            .compress(&data)
            .unwrap();
        let high = Lz4Codec::new(Lz4Backend::Native(Lz4Quality::High(12)), BLOCK)
            .compress(&data)
            .unwrap();
        assert!(high.len() < fast.len());
    }

    #[test]
    fn test_empty_and_truncated_input() {
        let codec = Lz4Codec::new(Lz4Backend::Pure, BLOCK);
        let packed = codec.compress(&[]).unwrap();
        assert_eq!(packed, MAGIC);
        assert!(codec.decompress(&packed).unwrap().is_empty());

        let data = crate::corpus::synthetic_json(10_000, 1);
        let packed = codec.compress(&data).unwrap();
        assert!(codec.decompress(&packed[..packed.len() - 3]).is_err());
        assert!(codec.decompress(b"LZ4X").is_err());
    }
}
