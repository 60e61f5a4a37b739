//! LZF chunk stream over the `lzf` block codec.
//!
//! Chunk layout, repeated until the end of input:
//!
//! ```text
//! 'Z' 'V' 0x00 | len u16 BE                    | len raw bytes
//! 'Z' 'V' 0x01 | stored_len u16 BE | raw_len u16 BE | stored_len LZF bytes
//! ```

use super::{Codec, Family, decompress_capacity, parallel};
use crate::error::{CodecError, CodecResult};
use crate::frame::FrameBuffer;

const SIGNATURE: &[u8; 2] = b"ZV";
const CHUNK_STORED: u8 = 0;
const CHUNK_COMPRESSED: u8 = 1;

/// Largest raw payload a chunk can describe.
pub(crate) const MAX_CHUNK: usize = u16::MAX as usize;

/// LZF, sequential or chunk-parallel.
#[derive(Debug, Clone)]
pub struct LzfCodec {
    parallel: bool,
    threads: Option<usize>,
}

impl LzfCodec {
    /// Single-threaded LZF.
    pub fn sequential() -> Self {
        Self {
            parallel: false,
            threads: None,
        }
    }

    /// Chunks compressed concurrently on a per-call pool.
    pub fn parallel(threads: Option<usize>) -> Self {
        Self {
            parallel: true,
            threads,
        }
    }
}

fn encode_chunk(raw: &[u8]) -> CodecResult<Vec<u8>> {
    if raw.is_empty() {
        return Ok(Vec::new());
    }

    let mut frame = FrameBuffer::with_capacity(raw.len() + 7);
    frame.write_bytes(SIGNATURE);

    match lzf::compress(raw) {
        Ok(packed) if packed.len() < raw.len() => {
            frame.write_u8(CHUNK_COMPRESSED);
            frame.write_u16_be(packed.len() as u16);
            frame.write_u16_be(raw.len() as u16);
            frame.write_bytes(&packed);
        }
        Ok(_) | Err(lzf::LzfError::NoCompressionPossible) => {
            frame.write_u8(CHUNK_STORED);
            frame.write_u16_be(raw.len() as u16);
            frame.write_bytes(raw);
        }
        Err(e) => return Err(CodecError::backend("lzf", format!("{:?}", e))),
    }

    Ok(frame.into_vec())
}

impl Codec for LzfCodec {
    fn family(&self) -> Family {
        Family::Lzf
    }

    fn compress(&self, input: &[u8]) -> CodecResult<Vec<u8>> {
        if self.parallel {
            let chunks = parallel::map_blocks("lzf", input, MAX_CHUNK, self.threads, encode_chunk)?;
            return Ok(chunks.concat());
        }

        let mut out = Vec::with_capacity(input.len() / 2);
        for raw in input.chunks(MAX_CHUNK) {
            out.extend_from_slice(&encode_chunk(raw)?);
        }
        Ok(out)
    }

    fn decompress(&self, input: &[u8]) -> CodecResult<Vec<u8>> {
        let mut frame = FrameBuffer::reader(input);
        let mut out = Vec::with_capacity(decompress_capacity(input.len()));

        while !frame.is_exhausted() {
            frame.expect_bytes(SIGNATURE, "LZF chunk signature")?;
            match frame.read_u8()? {
                CHUNK_STORED => {
                    let len = frame.read_u16_be()? as usize;
                    out.extend_from_slice(frame.read_bytes(len)?);
                }
                CHUNK_COMPRESSED => {
                    let stored_len = frame.read_u16_be()? as usize;
                    let raw_len = frame.read_u16_be()? as usize;
                    let packed = frame.read_bytes(stored_len)?;
                    let raw = lzf::decompress(packed, raw_len)
                        .map_err(|e| CodecError::Corrupt(format!("LZF chunk: {:?}", e)))?;
                    if raw.len() != raw_len {
                        return Err(CodecError::Corrupt(format!(
                            "LZF chunk expanded to {} bytes, header says {}",
                            raw.len(),
                            raw_len
                        )));
                    }
                    out.extend_from_slice(&raw);
                }
                other => {
                    return Err(CodecError::Corrupt(format!("unknown LZF chunk type {}", other)));
                }
            }
        }

        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sequential_round_trip() {
        let data = crate::corpus::synthetic_json(300_000, 3);
        let codec = LzfCodec::sequential();
        let packed = codec.compress(&data).unwrap();
        assert!(packed.len() < data.len());
        assert_eq!(codec.decompress(&packed).unwrap(), data);
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let data = crate::corpus::synthetic_json(300_000, 3);
        let sequential = LzfCodec::sequential().compress(&data).unwrap();
        let parallel = LzfCodec::parallel(Some(4)).compress(&data).unwrap();
        assert_eq!(sequential, parallel);
    }

    #[test]
    fn test_incompressible_chunks_are_stored() {
        let data: Vec<u8> = (0..70_000u32).map(|i| (i.wrapping_mul(2_654_435_761) >> 13) as u8).collect();
        let codec = LzfCodec::sequential();
        let packed = codec.compress(&data).unwrap();
        assert_eq!(codec.decompress(&packed).unwrap(), data);
    }

    #[test]
    fn test_bad_signature() {
        let codec = LzfCodec::sequential();
        assert!(matches!(
            codec.decompress(b"XY\x00\x00\x01a"),
            Err(CodecError::Corrupt(_))
        ));
    }
}
