//! Block identities and their per-id-space numeric projections.

use once_cell::sync::Lazy;
use std::collections::HashMap;
use strata_common::IdSpace;

/// A block type, shared by value across every chunk that contains it.
/// Equality is by ids, not identity. Carries one numeric id per wire
/// id-space: the legacy `(id << 4) | data` space (1.7 - 1.12), the 1.13
/// flattened space, and the modern (1.14+) state-id space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VirtualBlock {
    legacy_id: u16,
    flattened_id: u16,
    modern_id: u16,
    air: bool,
    motion_blocking: bool,
}

impl VirtualBlock {
    pub const fn new(
        legacy_id: u16,
        flattened_id: u16,
        modern_id: u16,
        air: bool,
        motion_blocking: bool,
    ) -> Self {
        VirtualBlock {
            legacy_id,
            flattened_id,
            modern_id,
            air,
            motion_blocking,
        }
    }

    /// A solid block sharing one modern id across all three spaces.
    /// Convenient for worlds only served to a single era in tests.
    pub const fn solid(id: u16) -> Self {
        VirtualBlock::new(id, id, id, false, true)
    }

    pub fn is_air(&self) -> bool {
        self.air
    }

    pub fn is_motion_blocking(&self) -> bool {
        self.motion_blocking
    }

    /// The numeric id valid for `space`.
    pub fn network_id(&self, space: IdSpace) -> u32 {
        match space {
            IdSpace::Legacy => self.legacy_id as u32,
            IdSpace::Flattened => self.flattened_id as u32,
            IdSpace::Modern => self.modern_id as u32,
        }
    }

    /// Looks a built-in block up by its modern state id.
    pub fn from_modern_id(id: u16) -> Option<VirtualBlock> {
        MODERN_INDEX.get(&id).copied()
    }
}

pub const AIR: VirtualBlock = VirtualBlock::new(0, 0, 0, true, false);
pub const STONE: VirtualBlock = VirtualBlock::new(1 << 4, 1, 1, false, true);
pub const GRANITE: VirtualBlock = VirtualBlock::new((1 << 4) | 1, 2, 2, false, true);
pub const GRASS_BLOCK: VirtualBlock = VirtualBlock::new(2 << 4, 9, 9, false, true);
pub const DIRT: VirtualBlock = VirtualBlock::new(3 << 4, 10, 10, false, true);
pub const COBBLESTONE: VirtualBlock = VirtualBlock::new(4 << 4, 14, 14, false, true);
pub const OAK_PLANKS: VirtualBlock = VirtualBlock::new(5 << 4, 15, 15, false, true);
pub const BEDROCK: VirtualBlock = VirtualBlock::new(7 << 4, 33, 33, false, true);
pub const WATER: VirtualBlock = VirtualBlock::new(9 << 4, 49, 49, false, false);
pub const SAND: VirtualBlock = VirtualBlock::new(12 << 4, 66, 66, false, true);
pub const TORCH: VirtualBlock = VirtualBlock::new(50 << 4, 1435, 1435, false, false);

/// The built-in block table. Process-wide and read-mostly: built once on
/// first use, immutable afterwards. Callers with richer mappings construct
/// their own [`VirtualBlock`]s instead.
static BUILTIN: &[VirtualBlock] = &[
    AIR,
    STONE,
    GRANITE,
    GRASS_BLOCK,
    DIRT,
    COBBLESTONE,
    OAK_PLANKS,
    BEDROCK,
    WATER,
    SAND,
    TORCH,
];

static MODERN_INDEX: Lazy<HashMap<u16, VirtualBlock>> = Lazy::new(|| {
    BUILTIN
        .iter()
        .map(|block| (block.modern_id, *block))
        .collect()
});
