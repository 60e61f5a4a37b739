//! gzip adapters on top of `flate2`.

use super::{Codec, Family, decompress_capacity, parallel};
use crate::error::CodecResult;
use flate2::Compression;
use flate2::GzBuilder;
use flate2::bufread;
use flate2::read::{GzDecoder, GzEncoder as GzReadEncoder, MultiGzDecoder};
use flate2::write::GzEncoder;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::sync::mpsc;
use std::thread;

/// How bytes are pushed through the gzip encoder and pulled out of the decoder.
///
/// The strategies produce identical gzip streams for the same level; they
/// differ in buffering and in which `flate2` API drives the work.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GzipStrategy {
    /// `io::copy` straight into the write-side encoder / out of the read-side decoder.
    Stream,
    /// Fixed-size chunks of `n` bytes on both sides.
    Chunked(usize),
    /// A `BufWriter` in front of the encoder, a `BufReader` under the decoder.
    Buffered,
    /// Pull-based encoding (`read::GzEncoder`) and `bufread` decoding.
    Pull,
    /// Encoder built through `GzBuilder`; multi-member aware decoding.
    Builder,
}

/// Single-threaded gzip.
#[derive(Debug, Clone)]
pub struct GzipCodec {
    level: u32,
    strategy: GzipStrategy,
}

impl GzipCodec {
    /// Creates a gzip adapter. `level` is the DEFLATE level, 0 (stored) to 9.
    pub fn new(level: u32, strategy: GzipStrategy) -> Self {
        Self { level, strategy }
    }

    fn compression(&self) -> Compression {
        Compression::new(self.level)
    }
}

impl Codec for GzipCodec {
    fn family(&self) -> Family {
        Family::Gzip
    }

    fn compress(&self, input: &[u8]) -> CodecResult<Vec<u8>> {
        let out = Vec::with_capacity(input.len() / 2);
        let compressed = match self.strategy {
            GzipStrategy::Stream => {
                let mut encoder = GzEncoder::new(out, self.compression());
                io::copy(&mut &input[..], &mut encoder)?;
                encoder.finish()?
            }
            GzipStrategy::Chunked(size) => {
                let mut encoder = GzEncoder::new(out, self.compression());
                for chunk in input.chunks(size.max(1)) {
                    encoder.write_all(chunk)?;
                }
                encoder.finish()?
            }
            GzipStrategy::Buffered => {
                let mut writer = BufWriter::new(GzEncoder::new(out, self.compression()));
                io::copy(&mut &input[..], &mut writer)?;
                writer.into_inner().map_err(|e| e.into_error())?.finish()?
            }
            GzipStrategy::Pull => {
                let mut encoder = GzReadEncoder::new(input, self.compression());
                let mut out = out;
                encoder.read_to_end(&mut out)?;
                out
            }
            GzipStrategy::Builder => {
                let mut encoder = GzBuilder::new().write(out, self.compression());
                encoder.write_all(input)?;
                encoder.finish()?
            }
        };
        Ok(compressed)
    }

    fn decompress(&self, input: &[u8]) -> CodecResult<Vec<u8>> {
        let mut out = Vec::with_capacity(decompress_capacity(input.len()));
        match self.strategy {
            GzipStrategy::Stream => {
                io::copy(&mut GzDecoder::new(input), &mut out)?;
            }
            GzipStrategy::Chunked(size) => {
                let size = size.max(1);
                let mut decoder = bufread::GzDecoder::new(BufReader::with_capacity(size, input));
                let mut chunk = vec![0u8; size];
                loop {
                    let n = decoder.read(&mut chunk)?;
                    if n == 0 {
                        break;
                    }
                    out.extend_from_slice(&chunk[..n]);
                }
            }
            GzipStrategy::Buffered => {
                GzDecoder::new(BufReader::new(input)).read_to_end(&mut out)?;
            }
            GzipStrategy::Pull => {
                bufread::GzDecoder::new(input).read_to_end(&mut out)?;
            }
            GzipStrategy::Builder => {
                MultiGzDecoder::new(input).read_to_end(&mut out)?;
            }
        }
        Ok(out)
    }
}

/// Block-parallel gzip.
///
/// The input is cut into `block_size` blocks that are compressed concurrently,
/// each into its own gzip member; the members are concatenated in order.
/// Decompression runs the multi-member decoder on a worker thread that feeds
/// decoded chunks back through a bounded channel.
#[derive(Debug, Clone)]
pub struct ParallelGzipCodec {
    level: u32,
    block_size: usize,
    threads: Option<usize>,
}

/// Decoded chunk size handed from the decoding thread to the caller.
const READ_AHEAD_CHUNK: usize = 64 * 1024;

/// Chunks buffered between the decoding thread and the caller.
const READ_AHEAD_DEPTH: usize = 8;

impl ParallelGzipCodec {
    /// Creates a parallel gzip adapter. `threads = None` uses one worker per core.
    pub fn new(level: u32, block_size: usize, threads: Option<usize>) -> Self {
        Self {
            level,
            block_size,
            threads,
        }
    }
}

impl Codec for ParallelGzipCodec {
    fn family(&self) -> Family {
        Family::Gzip
    }

    fn compress(&self, input: &[u8]) -> CodecResult<Vec<u8>> {
        let level = Compression::new(self.level);
        let members = parallel::map_blocks("gzip", input, self.block_size, self.threads, |block| {
            let mut encoder = GzEncoder::new(Vec::with_capacity(block.len() / 2), level);
            encoder.write_all(block)?;
            Ok(encoder.finish()?)
        })?;
        Ok(members.concat())
    }

    fn decompress(&self, input: &[u8]) -> CodecResult<Vec<u8>> {
        let (tx, rx) = mpsc::sync_channel::<io::Result<Vec<u8>>>(READ_AHEAD_DEPTH);

        thread::scope(|scope| -> CodecResult<Vec<u8>> {
            scope.spawn(move || {
                let mut decoder = MultiGzDecoder::new(BufReader::with_capacity(READ_AHEAD_CHUNK, input));
                loop {
                    let mut chunk = vec![0u8; READ_AHEAD_CHUNK];
                    match read_full(&mut decoder, &mut chunk) {
                        Ok(0) => break,
                        Ok(n) => {
                            chunk.truncate(n);
                            if tx.send(Ok(chunk)).is_err() {
                                break;
                            }
                        }
                        Err(e) => {
                            let _ = tx.send(Err(e));
                            break;
                        }
                    }
                }
            });

            let mut out = Vec::with_capacity(decompress_capacity(input.len()));
            for chunk in rx {
                out.extend_from_slice(&chunk?);
            }
            Ok(out)
        })
    }
}

/// Reads until `buf` is full or the reader is exhausted.
fn read_full<R: Read>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

#[cfg(test)]
mod tests {
    use super::*;

    const STRATEGIES: [GzipStrategy; 5] = [
        GzipStrategy::Stream,
        GzipStrategy::Chunked(8192),
        GzipStrategy::Buffered,
        GzipStrategy::Pull,
        GzipStrategy::Builder,
    ];

    fn sample() -> Vec<u8> {
        crate::corpus::synthetic_json(200_000, 1)
    }

    #[test]
    fn test_every_strategy_round_trips() {
        let data = sample();
        for strategy in STRATEGIES {
            let codec = GzipCodec::new(6, strategy);
            let compressed = codec.compress(&data).unwrap();
            assert!(compressed.len() < data.len(), "{:?} did not compress", strategy);
            assert_eq!(codec.decompress(&compressed).unwrap(), data, "{:?}", strategy);
        }
    }

    #[test]
    fn test_strategies_read_each_others_output() {
        let data = sample();
        let reference = GzipCodec::new(6, GzipStrategy::Stream).compress(&data).unwrap();
        for strategy in STRATEGIES {
            let codec = GzipCodec::new(6, strategy);
            assert_eq!(codec.decompress(&reference).unwrap(), data, "{:?}", strategy);
        }
    }

    #[test]
    fn test_level_zero_stores() {
        let data = sample();
        let stored = GzipCodec::new(0, GzipStrategy::Builder).compress(&data).unwrap();
        assert!(stored.len() >= data.len());
    }

    #[test]
    fn test_parallel_members_concatenate() {
        let data = sample();
        let codec = ParallelGzipCodec::new(6, 16 * 1024, Some(4));
        let compressed = codec.compress(&data).unwrap();
        assert!(compressed.len() < data.len());
        assert_eq!(codec.decompress(&compressed).unwrap(), data);

        // Any multi-member reader understands the output.
        let plain = GzipCodec::new(6, GzipStrategy::Builder);
        assert_eq!(plain.decompress(&compressed).unwrap(), data);
    }

    #[test]
    fn test_parallel_reads_single_member() {
        let data = sample();
        let single = GzipCodec::new(6, GzipStrategy::Stream).compress(&data).unwrap();
        let codec = ParallelGzipCodec::new(6, 16 * 1024, Some(2));
        assert_eq!(codec.decompress(&single).unwrap(), data);
    }

    #[test]
    fn test_parallel_output_is_deterministic() {
        let data = sample();
        let codec = ParallelGzipCodec::new(6, 8 * 1024, None);
        assert_eq!(codec.compress(&data).unwrap(), codec.compress(&data).unwrap());
    }

    #[test]
    fn test_garbage_is_an_error() {
        let codec = GzipCodec::new(6, GzipStrategy::Stream);
        assert!(codec.decompress(b"definitely not gzip").is_err());
        let codec = ParallelGzipCodec::new(6, 1024, Some(2));
        assert!(codec.decompress(b"definitely not gzip").is_err());
    }
}
