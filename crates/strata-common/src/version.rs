//! Protocol revisions and the wire-format eras they collapse into.
//!
//! A client announces one of roughly thirty discrete protocol revisions.
//! Most of them share wire encodings, so everything below the packet
//! header dispatches on [`Era`], computed once per encode, and the cached
//! per-section storages are keyed by the even coarser [`StorageClass`].

/// A discrete client protocol revision, ordered oldest to newest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ProtocolVersion {
    V1_7_2,
    V1_7_6,
    V1_8,
    V1_9,
    V1_9_1,
    V1_9_2,
    V1_9_4,
    V1_10,
    V1_11,
    V1_11_1,
    V1_12,
    V1_12_1,
    V1_12_2,
    V1_13,
    V1_13_1,
    V1_13_2,
    V1_14,
    V1_14_1,
    V1_14_2,
    V1_14_3,
    V1_14_4,
    V1_15,
    V1_15_1,
    V1_15_2,
    V1_16,
    V1_16_1,
    V1_16_2,
    V1_16_3,
    V1_16_4,
    V1_17,
    V1_17_1,
}

impl ProtocolVersion {
    pub const ALL: [ProtocolVersion; 31] = [
        ProtocolVersion::V1_7_2,
        ProtocolVersion::V1_7_6,
        ProtocolVersion::V1_8,
        ProtocolVersion::V1_9,
        ProtocolVersion::V1_9_1,
        ProtocolVersion::V1_9_2,
        ProtocolVersion::V1_9_4,
        ProtocolVersion::V1_10,
        ProtocolVersion::V1_11,
        ProtocolVersion::V1_11_1,
        ProtocolVersion::V1_12,
        ProtocolVersion::V1_12_1,
        ProtocolVersion::V1_12_2,
        ProtocolVersion::V1_13,
        ProtocolVersion::V1_13_1,
        ProtocolVersion::V1_13_2,
        ProtocolVersion::V1_14,
        ProtocolVersion::V1_14_1,
        ProtocolVersion::V1_14_2,
        ProtocolVersion::V1_14_3,
        ProtocolVersion::V1_14_4,
        ProtocolVersion::V1_15,
        ProtocolVersion::V1_15_1,
        ProtocolVersion::V1_15_2,
        ProtocolVersion::V1_16,
        ProtocolVersion::V1_16_1,
        ProtocolVersion::V1_16_2,
        ProtocolVersion::V1_16_3,
        ProtocolVersion::V1_16_4,
        ProtocolVersion::V1_17,
        ProtocolVersion::V1_17_1,
    ];

    /// The protocol number sent in the handshake.
    pub fn protocol_number(self) -> i32 {
        match self {
            ProtocolVersion::V1_7_2 => 4,
            ProtocolVersion::V1_7_6 => 5,
            ProtocolVersion::V1_8 => 47,
            ProtocolVersion::V1_9 => 107,
            ProtocolVersion::V1_9_1 => 108,
            ProtocolVersion::V1_9_2 => 109,
            ProtocolVersion::V1_9_4 => 110,
            ProtocolVersion::V1_10 => 210,
            ProtocolVersion::V1_11 => 315,
            ProtocolVersion::V1_11_1 => 316,
            ProtocolVersion::V1_12 => 335,
            ProtocolVersion::V1_12_1 => 338,
            ProtocolVersion::V1_12_2 => 340,
            ProtocolVersion::V1_13 => 393,
            ProtocolVersion::V1_13_1 => 401,
            ProtocolVersion::V1_13_2 => 404,
            ProtocolVersion::V1_14 => 477,
            ProtocolVersion::V1_14_1 => 480,
            ProtocolVersion::V1_14_2 => 485,
            ProtocolVersion::V1_14_3 => 490,
            ProtocolVersion::V1_14_4 => 498,
            ProtocolVersion::V1_15 => 573,
            ProtocolVersion::V1_15_1 => 575,
            ProtocolVersion::V1_15_2 => 578,
            ProtocolVersion::V1_16 => 735,
            ProtocolVersion::V1_16_1 => 736,
            ProtocolVersion::V1_16_2 => 751,
            ProtocolVersion::V1_16_3 => 753,
            ProtocolVersion::V1_16_4 => 754,
            ProtocolVersion::V1_17 => 755,
            ProtocolVersion::V1_17_1 => 756,
        }
    }

    /// Collapses this revision into its wire-format era. Computed once per
    /// encode; every helper below the packet header matches on the result
    /// instead of re-deriving version boundaries.
    pub fn era(self) -> Era {
        use ProtocolVersion as V;
        if self >= V::V1_17 {
            Era::V1_17
        } else if self >= V::V1_16_2 {
            Era::V1_16_2
        } else if self >= V::V1_16 {
            Era::V1_16
        } else if self >= V::V1_15 {
            Era::V1_15
        } else if self >= V::V1_14 {
            Era::V1_14
        } else if self >= V::V1_13 {
            Era::V1_13
        } else if self >= V::V1_9 {
            Era::V1_9
        } else if self >= V::V1_8 {
            Era::V1_8
        } else {
            Era::V1_7
        }
    }
}

/// A set of protocol revisions sharing one chunk-packet wire encoding.
/// Ordered oldest to newest, so range checks read as version comparisons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Era {
    /// 1.7.x: flat block ids, whole-payload DEFLATE, 2-byte masks.
    V1_7,
    /// 1.8: flat 16-bit ids, uncompressed, varint size prefix.
    V1_8,
    /// 1.9 - 1.12.2: paletted sections with inline light.
    V1_9,
    /// 1.13 - 1.13.2: flattened id space, direct palettes write no length.
    V1_13,
    /// 1.14 - 1.14.4: height-maps, block-count prefix, light moved out.
    V1_14,
    /// 1.15 - 1.15.2: biome ints move into the packet header.
    V1_15,
    /// 1.16 - 1.16.1: non-spanning storage plus the always-true
    /// compatibility byte.
    V1_16,
    /// 1.16.2 - 1.16.4/5: varint biomes, compat byte removed.
    V1_16_2,
    /// 1.17+: bitset presence mask, full chunks only.
    V1_17,
}

impl Era {
    /// The section-storage equivalence class for this era. Many eras share
    /// one class; one cached storage instance serves all of them.
    pub fn storage_class(self) -> StorageClass {
        match self {
            Era::V1_7 | Era::V1_8 => StorageClass::Legacy,
            Era::V1_9 => StorageClass::Paletted19,
            Era::V1_13 => StorageClass::Paletted113,
            Era::V1_14 | Era::V1_15 => StorageClass::Modern114,
            Era::V1_16 | Era::V1_16_2 | Era::V1_17 => StorageClass::Modern116,
        }
    }

    /// Whether per-section light rides inside the chunk packet. From 1.14
    /// on, light is carried by a separate top-level packet.
    pub fn has_inline_light(self) -> bool {
        matches!(self, Era::V1_7 | Era::V1_8 | Era::V1_9 | Era::V1_13)
    }
}

/// Section storages that are byte-identical on the wire. Keys the
/// per-section storage cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageClass {
    /// 1.7 - 1.8: flat array of legacy `(id << 4) | data` values.
    Legacy,
    /// 1.9 - 1.12.2: paletted, 13-bit direct fallback, spanning layout.
    Paletted19,
    /// 1.13.x: flattened ids, 14-bit direct, spanning layout.
    Paletted113,
    /// 1.14 - 1.15.2: modern ids, 14-bit direct, spanning layout.
    Modern114,
    /// 1.16+: modern ids, 15-bit direct, non-spanning layout.
    Modern116,
}

impl StorageClass {
    pub const ALL: [StorageClass; 5] = [
        StorageClass::Legacy,
        StorageClass::Paletted19,
        StorageClass::Paletted113,
        StorageClass::Modern114,
        StorageClass::Modern116,
    ];

    /// The block-id space this class projects [`VirtualBlock`]s into.
    pub fn id_space(self) -> IdSpace {
        match self {
            StorageClass::Legacy | StorageClass::Paletted19 => IdSpace::Legacy,
            StorageClass::Paletted113 => IdSpace::Flattened,
            StorageClass::Modern114 | StorageClass::Modern116 => IdSpace::Modern,
        }
    }

    /// Bits per entry once the palette overflows into direct global ids.
    pub fn direct_bits(self) -> u8 {
        match self {
            StorageClass::Legacy => 0, // flat storage never goes through a palette
            StorageClass::Paletted19 => 13,
            StorageClass::Paletted113 | StorageClass::Modern114 => 14,
            StorageClass::Modern116 => 15,
        }
    }

    /// Whether packed entries may straddle 64-bit word boundaries.
    pub fn spanning(self) -> bool {
        !matches!(self, StorageClass::Modern116)
    }
}

/// The numeric-id space a block id is valid in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IdSpace {
    /// 1.7 - 1.12.2: `(block_id << 4) | data`.
    Legacy,
    /// 1.13.x flattened state ids.
    Flattened,
    /// 1.14+ state ids.
    Modern,
}
