//! A 16x16-column chunk: a stack of sections, 3-D biome samples, and the
//! full/partial flag the chunk packet needs.

use crate::block::VirtualBlock;
use crate::network_section::NetworkSection;
use strata_common::{Result, StrataError};

/// 4x4x4-block biome cells: 4 x 4 samples per horizontal axis, 64 along y.
pub const BIOME_SAMPLES: usize = 1024;
/// The id written for columns and cells never assigned a biome. Matches
/// the void biome, which every supported client accepts.
pub const DEFAULT_BIOME: i32 = 127;

const BLOCKS_PER_SECTION_AXIS: usize = 16;

/// A snapshot of one chunk as handed to the encoder. Section slots are
/// `None` until something is written into them; empty slots are skipped
/// on the wire via the section mask.
#[derive(Debug)]
pub struct ChunkSnapshot {
    x: i32,
    z: i32,
    full: bool,
    has_sky_light: bool,
    sections: Vec<Option<NetworkSection>>,
    biomes: Vec<i32>,
}

impl ChunkSnapshot {
    pub fn new(x: i32, z: i32, full: bool, section_count: usize, has_sky_light: bool) -> Self {
        let mut sections = Vec::with_capacity(section_count);
        sections.resize_with(section_count, || None);
        ChunkSnapshot {
            x,
            z,
            full,
            has_sky_light,
            sections,
            biomes: vec![DEFAULT_BIOME; BIOME_SAMPLES],
        }
    }

    pub fn x(&self) -> i32 {
        self.x
    }

    pub fn z(&self) -> i32 {
        self.z
    }

    /// Whether this is a full chunk or a delta against one the client
    /// already has.
    pub fn is_full(&self) -> bool {
        self.full
    }

    pub fn has_sky_light(&self) -> bool {
        self.has_sky_light
    }

    pub fn section_count(&self) -> usize {
        self.sections.len()
    }

    pub fn sections(&self) -> &[Option<NetworkSection>] {
        &self.sections
    }

    pub fn section(&self, index: usize) -> Option<&NetworkSection> {
        self.sections.get(index).and_then(|slot| slot.as_ref())
    }

    /// One bit per section slot, lowest section in bit 0. Only present
    /// sections are on the wire.
    pub fn section_mask(&self) -> u64 {
        let mut mask = 0u64;
        for (index, slot) in self.sections.iter().enumerate() {
            if slot.is_some() {
                mask |= 1 << index;
            }
        }
        mask
    }

    fn section_entry(&mut self, y: usize) -> Result<&mut NetworkSection> {
        let index = y / BLOCKS_PER_SECTION_AXIS;
        if index >= self.sections.len() {
            return Err(StrataError::CoordinateOutOfRange { x: 0, y, z: 0 });
        }
        let has_sky_light = self.has_sky_light;
        Ok(self.sections[index].get_or_insert_with(|| NetworkSection::new(has_sky_light)))
    }

    /// Places `block` at chunk-local `(x, z)` and world `y`, materializing
    /// the owning section if needed.
    pub fn set_block(&mut self, x: usize, y: usize, z: usize, block: VirtualBlock) -> Result<()> {
        self.section_entry(y)?
            .set_block(x, y % BLOCKS_PER_SECTION_AXIS, z, block)
    }

    pub fn get_block(&self, x: usize, y: usize, z: usize) -> Option<VirtualBlock> {
        self.section(y / BLOCKS_PER_SECTION_AXIS)
            .map(|section| section.blocks().get(x, y % BLOCKS_PER_SECTION_AXIS, z))
    }

    pub fn set_block_light(&mut self, x: usize, y: usize, z: usize, level: u8) -> Result<()> {
        self.section_entry(y)?
            .set_block_light(x, y % BLOCKS_PER_SECTION_AXIS, z, level);
        Ok(())
    }

    pub fn set_sky_light(&mut self, x: usize, y: usize, z: usize, level: u8) -> Result<()> {
        self.section_entry(y)?
            .set_sky_light(x, y % BLOCKS_PER_SECTION_AXIS, z, level);
        Ok(())
    }

    /// Assigns the biome of the 4x4x4 cell containing block `(x, y, z)`.
    /// Only the lowest 256 blocks carry biome samples.
    pub fn set_biome(&mut self, x: usize, y: usize, z: usize, biome: i32) -> Result<()> {
        if x >= 16 || z >= 16 || y >= 256 {
            return Err(StrataError::CoordinateOutOfRange { x, y, z });
        }
        self.biomes[biome_sample_index(x >> 2, y >> 2, z >> 2)] = biome;
        Ok(())
    }

    /// The 1024 biome samples, indexed `(sy << 4) | (sz << 2) | sx`.
    pub fn biome_samples(&self) -> &[i32] {
        &self.biomes
    }

    /// An independent snapshot; every present section is deep-copied with
    /// a fresh storage cache.
    pub fn copy(&self) -> Self {
        ChunkSnapshot {
            x: self.x,
            z: self.z,
            full: self.full,
            has_sky_light: self.has_sky_light,
            sections: self
                .sections
                .iter()
                .map(|slot| slot.as_ref().map(NetworkSection::copy))
                .collect(),
            biomes: self.biomes.clone(),
        }
    }
}

/// Linear key of one biome sample, sample coordinates in `[0, 4)` for x/z
/// and `[0, 64)` for y.
pub const fn biome_sample_index(sx: usize, sy: usize, sz: usize) -> usize {
    (sy << 4) | (sz << 2) | sx
}
