//! Per-call worker pools for the block-parallel adapters.

use crate::error::{CodecError, CodecResult};
use rayon::ThreadPoolBuilder;
use rayon::prelude::*;

/// Compresses `input` in independent blocks on a pool that lives for this call only.
///
/// Workers are spawned on entry and joined before returning, so pool start-up
/// and shutdown are part of the caller's cost. Blocks come back in input order.
/// An empty input still produces one (empty) block.
pub(crate) fn map_blocks<F>(
    codec: &'static str,
    input: &[u8],
    block_size: usize,
    threads: Option<usize>,
    encode_block: F,
) -> CodecResult<Vec<Vec<u8>>>
where
    F: Fn(&[u8]) -> CodecResult<Vec<u8>> + Send + Sync,
{
    if input.is_empty() {
        return Ok(vec![encode_block(input)?]);
    }

    let mut builder = ThreadPoolBuilder::new().thread_name(move |i| format!("{codec}-worker-{i}"));
    if let Some(n) = threads {
        builder = builder.num_threads(n);
    }

    builder
        .build_scoped(
            |thread| thread.run(),
            |pool| {
                pool.install(|| {
                    input
                        .par_chunks(block_size.max(1))
                        .map(&encode_block)
                        .collect::<CodecResult<Vec<_>>>()
                })
            },
        )
        .map_err(|e| CodecError::backend(codec, e))?
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blocks_keep_input_order() {
        let input: Vec<u8> = (0..=255).cycle().take(10_000).collect();
        let blocks = map_blocks("test", &input, 1000, Some(3), |b| Ok(b.to_vec())).unwrap();
        assert_eq!(blocks.len(), 10);
        assert_eq!(blocks.concat(), input);
    }

    #[test]
    fn test_empty_input_yields_one_block() {
        let blocks = map_blocks("test", &[], 1000, Some(2), |b| Ok(b.to_vec())).unwrap();
        assert_eq!(blocks.len(), 1);
        assert!(blocks[0].is_empty());
    }

    #[test]
    fn test_block_error_propagates() {
        let input = vec![0u8; 5000];
        let result = map_blocks("test", &input, 1000, Some(2), |_| {
            Err(CodecError::Corrupt("boom".into()))
        });
        assert!(result.is_err());
    }
}
