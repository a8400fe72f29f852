//! Block placement
//!
//! Decides which byte offset each block operation of a mark targets.

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::models::BlockSequence;

/// Offset generator for the blocks of one mark.
///
/// Call [`BlockPlacement::offset`] once per block, right before the block
/// is written or read: random offsets are drawn independently on each call
/// and may repeat within a mark.
#[derive(Debug, Clone)]
pub struct BlockPlacement<R = SmallRng> {
    sequence: BlockSequence,
    num_blocks: u32,
    block_size: u64,
    rng: R,
}

impl BlockPlacement<SmallRng> {
    pub fn new(sequence: BlockSequence, num_blocks: u32, block_size: u64) -> Self {
        Self::with_rng(sequence, num_blocks, block_size, SmallRng::from_entropy())
    }
}

impl<R: Rng> BlockPlacement<R> {
    pub fn with_rng(sequence: BlockSequence, num_blocks: u32, block_size: u64, rng: R) -> Self {
        Self {
            sequence,
            num_blocks,
            block_size,
            rng,
        }
    }

    /// Byte offset for the block at `block_index` (0-based, below `num_blocks`)
    pub fn offset(&mut self, block_index: u32) -> u64 {
        let slot = match self.sequence {
            BlockSequence::Sequential => block_index,
            BlockSequence::Random => self.rng.gen_range(0..self.num_blocks.max(1)),
        };
        slot as u64 * self.block_size
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sequential_offsets_are_ordered() {
        let block_size = 2048 * 1024;
        let mut placement = BlockPlacement::new(BlockSequence::Sequential, 128, block_size);
        let offsets: Vec<u64> = (0..128).map(|b| placement.offset(b)).collect();
        let expected: Vec<u64> = (0..128u64).map(|b| b * block_size).collect();
        assert_eq!(offsets, expected);
    }

    #[test]
    fn test_random_offsets_in_range_and_aligned() {
        let block_size = 4096;
        let num_blocks = 64;
        let mut placement = BlockPlacement::with_rng(
            BlockSequence::Random,
            num_blocks,
            block_size,
            SmallRng::seed_from_u64(7),
        );
        for b in 0..10_000 {
            let offset = placement.offset(b % num_blocks);
            assert_eq!(offset % block_size, 0);
            assert!(offset <= (num_blocks as u64 - 1) * block_size);
        }
    }

    #[test]
    fn test_random_offsets_roughly_uniform() {
        let num_blocks = 16u32;
        let draws = 160_000;
        let mut placement = BlockPlacement::with_rng(
            BlockSequence::Random,
            num_blocks,
            1,
            SmallRng::seed_from_u64(42),
        );
        let mut histogram = vec![0u32; num_blocks as usize];
        for b in 0..draws {
            histogram[placement.offset(b % num_blocks) as usize] += 1;
        }

        let expected = draws as f64 / num_blocks as f64;
        for (slot, &count) in histogram.iter().enumerate() {
            let deviation = (count as f64 - expected).abs() / expected;
            assert!(deviation < 0.05, "slot {} drew {} times", slot, count);
        }
    }

    #[test]
    fn test_random_single_block_is_zero() {
        let mut placement = BlockPlacement::new(BlockSequence::Random, 1, 512);
        assert!((0..100).all(|_| placement.offset(0) == 0));
    }
}
