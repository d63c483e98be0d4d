//! A 16x16x16 grid of virtual blocks.

use crate::block::{self, VirtualBlock};
use strata_common::{Result, StrataError};

pub const SECTION_SIZE: usize = 16;
pub const SECTION_VOLUME: usize = SECTION_SIZE * SECTION_SIZE * SECTION_SIZE;

/// The canonical linear cell key, `y << 8 | z << 4 | x`. Every per-cell
/// structure (block storage, light, legacy nibble data) uses this same
/// addressing so cells correspond across structures.
pub const fn block_index(x: usize, y: usize, z: usize) -> usize {
    (y << 8) | (z << 4) | x
}

/// A mutable 4096-cell grid of block identities. Owns no version-specific
/// encoding; the network layer projects it into per-era storages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockSection {
    blocks: Vec<VirtualBlock>,
}

impl BlockSection {
    /// An all-air section.
    pub fn new() -> Self {
        BlockSection {
            blocks: vec![block::AIR; SECTION_VOLUME],
        }
    }

    /// Reads the block at `(x, y, z)`.
    ///
    /// # Panics
    ///
    /// Panics if any coordinate is outside `[0, 15]`.
    pub fn get(&self, x: usize, y: usize, z: usize) -> VirtualBlock {
        assert!(
            x < SECTION_SIZE && y < SECTION_SIZE && z < SECTION_SIZE,
            "section coordinate out of range"
        );
        self.blocks[block_index(x, y, z)]
    }

    /// Places `block` at `(x, y, z)`. Fails if any coordinate is outside
    /// `[0, 15]`.
    pub fn set(&mut self, x: usize, y: usize, z: usize, block: VirtualBlock) -> Result<()> {
        if x >= SECTION_SIZE || y >= SECTION_SIZE || z >= SECTION_SIZE {
            return Err(StrataError::CoordinateOutOfRange { x, y, z });
        }
        self.blocks[block_index(x, y, z)] = block;
        Ok(())
    }

    /// An independent snapshot: same block identities, fresh backing
    /// array. Required when the live section may be mutated while an
    /// encode is running.
    pub fn copy(&self) -> Self {
        self.clone()
    }
}

impl Default for BlockSection {
    fn default() -> Self {
        BlockSection::new()
    }
}
