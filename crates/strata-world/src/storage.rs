//! Version-class-specific encoded forms of one block section.
//!
//! Three shapes exist on the wire: a flat array of legacy ids (1.7/1.8),
//! a palette-backed packed array with a fixed direct-mode fallback
//! (1.9 - 1.13), and the modern palette-backed array sized to
//! `max(4, ceil(log2(distinct)))` bits (1.14+). The flat shape is
//! [`FlatStorage`]; both palette shapes are [`PalettedStorage`],
//! parameterized by their [`StorageClass`].

use crate::block::VirtualBlock;
use crate::section::{block_index, SECTION_SIZE, SECTION_VOLUME};
use crate::wire;
use crate::packed_array::IntArray;
use strata_common::{IdSpace, Result, StorageClass, StrataError};

/// The encoded form of one block section for one storage class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockStorage {
    Flat(FlatStorage),
    Paletted(PalettedStorage),
}

impl BlockStorage {
    pub fn for_class(class: StorageClass) -> Self {
        match class {
            StorageClass::Legacy => BlockStorage::Flat(FlatStorage::new()),
            _ => BlockStorage::Paletted(PalettedStorage::new(class)),
        }
    }

    /// Stores the class-appropriate numeric projection of `block`.
    pub fn set(&mut self, x: usize, y: usize, z: usize, block: VirtualBlock) -> Result<()> {
        match self {
            BlockStorage::Flat(storage) => storage.set(x, y, z, block),
            BlockStorage::Paletted(storage) => storage.set(x, y, z, block),
        }
    }

    /// The stored numeric id at `(x, y, z)`.
    ///
    /// # Panics
    ///
    /// Panics if any coordinate is outside `[0, 15]`.
    pub fn get(&self, x: usize, y: usize, z: usize) -> u32 {
        match self {
            BlockStorage::Flat(storage) => storage.get(x, y, z),
            BlockStorage::Paletted(storage) => storage.get(x, y, z),
        }
    }

    /// An independent storage with identical contents.
    pub fn copy(&self) -> Self {
        self.clone()
    }

    pub fn as_flat(&self) -> Option<&FlatStorage> {
        match self {
            BlockStorage::Flat(storage) => Some(storage),
            _ => None,
        }
    }

    pub fn as_paletted(&self) -> Option<&PalettedStorage> {
        match self {
            BlockStorage::Paletted(storage) => Some(storage),
            _ => None,
        }
    }
}

/// 4096 legacy `(id << 4) | data` values, no palette. Serves both the
/// 1.7 split id/data passes and the 1.8 little-endian 16-bit pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlatStorage {
    ids: Vec<u16>,
}

impl FlatStorage {
    /// 1.7 block-id pass length.
    pub const BLOCK_IDS_LEN: usize = SECTION_VOLUME;
    /// 1.7 block-data nibble pass length.
    pub const BLOCK_DATA_LEN: usize = SECTION_VOLUME / 2;
    /// 1.8 combined id pass length.
    pub const IDS_LE_LEN: usize = SECTION_VOLUME * 2;

    pub fn new() -> Self {
        FlatStorage {
            ids: vec![0; SECTION_VOLUME],
        }
    }

    pub fn set(&mut self, x: usize, y: usize, z: usize, block: VirtualBlock) -> Result<()> {
        if x >= SECTION_SIZE || y >= SECTION_SIZE || z >= SECTION_SIZE {
            return Err(StrataError::CoordinateOutOfRange { x, y, z });
        }
        self.ids[block_index(x, y, z)] = block.network_id(IdSpace::Legacy) as u16;
        Ok(())
    }

    pub fn get(&self, x: usize, y: usize, z: usize) -> u32 {
        assert!(
            x < SECTION_SIZE && y < SECTION_SIZE && z < SECTION_SIZE,
            "section coordinate out of range"
        );
        self.ids[block_index(x, y, z)] as u32
    }

    /// 1.7 pass 0: one block-id byte per cell.
    pub fn write_block_ids(&self, out: &mut Vec<u8>) {
        for &id in &self.ids {
            out.push((id >> 4) as u8);
        }
    }

    /// 1.7 pass 1: the data half of each id, packed two cells per byte.
    pub fn write_block_data(&self, out: &mut Vec<u8>) {
        for pair in self.ids.chunks_exact(2) {
            let low = (pair[0] & 0x0F) as u8;
            let high = (pair[1] & 0x0F) as u8;
            out.push((high << 4) | low);
        }
    }

    /// 1.8 pass 0: the whole id, little-endian 16 bits per cell.
    pub fn write_ids_le(&self, out: &mut Vec<u8>) {
        for &id in &self.ids {
            out.extend_from_slice(&id.to_le_bytes());
        }
    }
}

impl Default for FlatStorage {
    fn default() -> Self {
        FlatStorage::new()
    }
}

/// Palette-backed packed storage. Starts at 4 bits with an air-only
/// palette; a full palette triggers a rebuild one bit wider, and past
/// 8 bits the palette is dropped in favor of direct global ids at the
/// class's fixed direct width.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PalettedStorage {
    class: StorageClass,
    bits: u8,
    direct: bool,
    palette: Vec<u32>,
    data: IntArray,
}

impl PalettedStorage {
    const MIN_BITS: u8 = 4;
    const MAX_PALETTE_BITS: u8 = 8;

    pub fn new(class: StorageClass) -> Self {
        debug_assert!(
            !matches!(class, StorageClass::Legacy),
            "legacy sections use FlatStorage"
        );
        PalettedStorage {
            class,
            bits: Self::MIN_BITS,
            direct: false,
            // Air is id 0 in every id space.
            palette: vec![0],
            data: IntArray::new(class.spanning(), Self::MIN_BITS, SECTION_VOLUME),
        }
    }

    pub fn bits(&self) -> u8 {
        self.bits
    }

    pub fn is_direct(&self) -> bool {
        self.direct
    }

    pub fn palette(&self) -> &[u32] {
        &self.palette
    }

    pub fn set(&mut self, x: usize, y: usize, z: usize, block: VirtualBlock) -> Result<()> {
        if x >= SECTION_SIZE || y >= SECTION_SIZE || z >= SECTION_SIZE {
            return Err(StrataError::CoordinateOutOfRange { x, y, z });
        }
        let id = block.network_id(self.class.id_space());
        let value = self.palette_value(id)?;
        self.data.set(block_index(x, y, z), value)
    }

    pub fn get(&self, x: usize, y: usize, z: usize) -> u32 {
        assert!(
            x < SECTION_SIZE && y < SECTION_SIZE && z < SECTION_SIZE,
            "section coordinate out of range"
        );
        let raw = self.data.get(block_index(x, y, z));
        if self.direct {
            raw
        } else {
            self.palette[raw as usize]
        }
    }

    fn palette_value(&mut self, id: u32) -> Result<u32> {
        if self.direct {
            return Ok(id);
        }
        if let Some(position) = self.palette.iter().position(|&entry| entry == id) {
            return Ok(position as u32);
        }
        if self.palette.len() == 1 << self.bits {
            self.grow()?;
            if self.direct {
                return Ok(id);
            }
        }
        self.palette.push(id);
        Ok((self.palette.len() - 1) as u32)
    }

    /// Full rebuild one bit wider, or into direct mode once the palette
    /// cannot grow further. In-place growth is deliberately not attempted.
    fn grow(&mut self) -> Result<()> {
        let new_bits = self.bits + 1;
        if new_bits > Self::MAX_PALETTE_BITS {
            let mut data = IntArray::new(self.class.spanning(), self.class.direct_bits(), SECTION_VOLUME);
            for index in 0..SECTION_VOLUME {
                data.set(index, self.palette[self.data.get(index) as usize])?;
            }
            self.bits = self.class.direct_bits();
            self.direct = true;
            self.palette.clear();
            self.data = data;
        } else {
            let mut data = IntArray::new(self.class.spanning(), new_bits, SECTION_VOLUME);
            for index in 0..SECTION_VOLUME {
                data.set(index, self.data.get(index))?;
            }
            self.bits = new_bits;
            self.data = data;
        }
        Ok(())
    }

    /// Bits per entry, palette (per the class's direct-mode rules), then
    /// the packed data array.
    pub fn write(&self, out: &mut Vec<u8>) {
        out.push(self.bits);
        if self.direct {
            // 1.9 - 1.12 clients expect an explicit zero-length palette in
            // direct mode; 1.13+ write no length at all.
            if matches!(self.class, StorageClass::Paletted19) {
                wire::write_varint(out, 0);
            }
        } else {
            wire::write_varint(out, self.palette.len() as i32);
            for &id in &self.palette {
                wire::write_varint(out, id as i32);
            }
        }
        self.data.write(out);
    }

    /// Exact byte count [`PalettedStorage::write`] will produce.
    pub fn data_length(&self) -> usize {
        let mut length = 1;
        if self.direct {
            if matches!(self.class, StorageClass::Paletted19) {
                length += 1;
            }
        } else {
            length += wire::varint_len(self.palette.len() as i32);
            for &id in &self.palette {
                length += wire::varint_len(id as i32);
            }
        }
        length + self.data.wire_len()
    }
}
