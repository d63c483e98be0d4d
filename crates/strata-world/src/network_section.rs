//! A block section plus its light and lazily built wire storages.

use crate::block::VirtualBlock;
use crate::light::LightSection;
use crate::section::{BlockSection, SECTION_SIZE, SECTION_VOLUME};
use crate::storage::{BlockStorage, FlatStorage};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use strata_common::{Era, Result, StorageClass, StrataError};

/// Zero-filled sky payload for sections asked to write sky light they
/// never computed.
const EMPTY_NIBBLES: [u8; SECTION_VOLUME / 2] = [0; SECTION_VOLUME / 2];

#[derive(Debug, Default)]
struct SectionCache {
    storages: HashMap<StorageClass, Arc<BlockStorage>>,
    block_count: Option<u16>,
}

/// One section as the protocol layer sees it: mutable blocks and light,
/// plus a cache of the per-storage-class encoded forms. Storages are
/// built on first use and shared by `Arc`; any mutation drops the whole
/// cache. Concurrent first builds of the same class may race, in which
/// case the first one published wins and the loser's work is discarded.
#[derive(Debug)]
pub struct NetworkSection {
    blocks: BlockSection,
    light: LightSection,
    cache: RwLock<SectionCache>,
}

impl NetworkSection {
    pub fn new(has_sky_light: bool) -> Self {
        NetworkSection {
            blocks: BlockSection::new(),
            light: LightSection::new(has_sky_light),
            cache: RwLock::new(SectionCache::default()),
        }
    }

    pub fn blocks(&self) -> &BlockSection {
        &self.blocks
    }

    pub fn light(&self) -> &LightSection {
        &self.light
    }

    pub fn set_block(&mut self, x: usize, y: usize, z: usize, block: VirtualBlock) -> Result<()> {
        self.blocks.set(x, y, z, block)?;
        self.invalidate();
        Ok(())
    }

    pub fn set_block_light(&mut self, x: usize, y: usize, z: usize, level: u8) {
        self.light.set_block_light(x, y, z, level);
        self.invalidate();
    }

    pub fn set_sky_light(&mut self, x: usize, y: usize, z: usize, level: u8) {
        self.light.set_sky_light(x, y, z, level);
        self.invalidate();
    }

    fn invalidate(&mut self) {
        // &mut self: no other reference can hold the lock.
        let cache = self.cache.get_mut().unwrap_or_else(|poisoned| poisoned.into_inner());
        cache.storages.clear();
        cache.block_count = None;
    }

    /// Non-air cells, as counted during the most recent storage build.
    /// `None` until any storage has been built.
    pub fn block_count(&self) -> Option<u16> {
        self.read_cache().block_count
    }

    /// The encoded storage for `class`, building and caching it if absent.
    pub fn ensure_created(&self, class: StorageClass) -> Result<Arc<BlockStorage>> {
        if let Some(storage) = self.read_cache().storages.get(&class) {
            return Ok(Arc::clone(storage));
        }
        // Built outside the lock so a slow build never blocks readers of
        // other classes.
        let (storage, block_count) = self.build_storage(class)?;
        let storage = Arc::new(storage);
        let mut cache = self.write_cache();
        cache.block_count.get_or_insert(block_count);
        Ok(Arc::clone(cache.storages.entry(class).or_insert(storage)))
    }

    fn build_storage(&self, class: StorageClass) -> Result<(BlockStorage, u16)> {
        let mut storage = BlockStorage::for_class(class);
        let mut block_count = 0u16;
        for y in 0..SECTION_SIZE {
            for z in 0..SECTION_SIZE {
                for x in 0..SECTION_SIZE {
                    let block = self.blocks.get(x, y, z);
                    if block.is_air() {
                        continue;
                    }
                    block_count += 1;
                    storage.set(x, y, z, block)?;
                }
            }
        }
        Ok((storage, block_count))
    }

    /// Writes this section's bytes for `pass` of `era`'s section sweep.
    ///
    /// 1.7 sweeps four passes (ids, data nibbles, block light, sky light)
    /// and 1.8 three (ids, block light, sky light); each pass runs across
    /// every present section before the next begins. 1.9+ formats are
    /// self-contained and only use pass 0.
    pub fn write_data(&self, out: &mut Vec<u8>, era: Era, pass: u8, sky: bool) -> Result<()> {
        let storage = self.ensure_created(era.storage_class())?;
        match era {
            Era::V1_7 => {
                let flat = self.expect_flat(&storage)?;
                match pass {
                    0 => flat.write_block_ids(out),
                    1 => flat.write_block_data(out),
                    2 => out.extend_from_slice(self.light.block_light().bytes()),
                    3 => {
                        if sky {
                            self.write_sky_light(out);
                        }
                    }
                    _ => {}
                }
            }
            Era::V1_8 => {
                let flat = self.expect_flat(&storage)?;
                match pass {
                    0 => flat.write_ids_le(out),
                    1 => out.extend_from_slice(self.light.block_light().bytes()),
                    2 => {
                        if sky {
                            self.write_sky_light(out);
                        }
                    }
                    _ => {}
                }
            }
            Era::V1_9 | Era::V1_13 => {
                if pass == 0 {
                    self.expect_paletted(&storage)?.write(out);
                    out.extend_from_slice(self.light.block_light().bytes());
                    if sky {
                        self.write_sky_light(out);
                    }
                }
            }
            _ => {
                if pass == 0 {
                    let count = self.block_count().unwrap_or(0);
                    out.extend_from_slice(&count.to_be_bytes());
                    self.expect_paletted(&storage)?.write(out);
                }
            }
        }
        Ok(())
    }

    /// Exact byte count the section contributes across all of `era`'s
    /// passes.
    pub fn data_length(&self, era: Era, sky: bool) -> Result<usize> {
        let sky_len = if sky { SECTION_VOLUME / 2 } else { 0 };
        match era {
            Era::V1_7 => Ok(FlatStorage::BLOCK_IDS_LEN
                + FlatStorage::BLOCK_DATA_LEN
                + SECTION_VOLUME / 2
                + sky_len),
            Era::V1_8 => Ok(FlatStorage::IDS_LE_LEN + SECTION_VOLUME / 2 + sky_len),
            Era::V1_9 | Era::V1_13 => {
                let storage = self.ensure_created(era.storage_class())?;
                let paletted = self.expect_paletted(&storage)?;
                Ok(paletted.data_length() + SECTION_VOLUME / 2 + sky_len)
            }
            _ => {
                let storage = self.ensure_created(era.storage_class())?;
                let paletted = self.expect_paletted(&storage)?;
                Ok(2 + paletted.data_length())
            }
        }
    }

    fn write_sky_light(&self, out: &mut Vec<u8>) {
        match self.light.sky_light() {
            Some(sky) => out.extend_from_slice(sky.bytes()),
            None => out.extend_from_slice(&EMPTY_NIBBLES),
        }
    }

    fn expect_flat<'a>(&self, storage: &'a BlockStorage) -> Result<&'a FlatStorage> {
        storage.as_flat().ok_or_else(|| {
            StrataError::UnsupportedRequest("flat storage requested for paletted class".into())
        })
    }

    fn expect_paletted<'a>(
        &self,
        storage: &'a BlockStorage,
    ) -> Result<&'a crate::storage::PalettedStorage> {
        storage.as_paletted().ok_or_else(|| {
            StrataError::UnsupportedRequest("paletted storage requested for legacy class".into())
        })
    }

    fn read_cache(&self) -> std::sync::RwLockReadGuard<'_, SectionCache> {
        self.cache.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write_cache(&self) -> std::sync::RwLockWriteGuard<'_, SectionCache> {
        self.cache.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// An independent section: same blocks and light, empty cache.
    pub fn copy(&self) -> Self {
        NetworkSection {
            blocks: self.blocks.copy(),
            light: self.light.copy(),
            cache: RwLock::new(SectionCache::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block;

    #[test]
    fn test_storage_is_cached_and_shared() {
        let mut section = NetworkSection::new(true);
        section.set_block(0, 0, 0, block::STONE).unwrap();
        let first = section.ensure_created(StorageClass::Modern116).unwrap();
        let second = section.ensure_created(StorageClass::Modern116).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_classes_cache_independently() {
        let section = NetworkSection::new(true);
        let legacy = section.ensure_created(StorageClass::Legacy).unwrap();
        let modern = section.ensure_created(StorageClass::Modern114).unwrap();
        assert!(legacy.as_flat().is_some());
        assert!(modern.as_paletted().is_some());
    }

    #[test]
    fn test_block_count_skips_air() {
        let mut section = NetworkSection::new(true);
        assert_eq!(section.block_count(), None);
        section.set_block(0, 0, 0, block::STONE).unwrap();
        section.set_block(1, 0, 0, block::WATER).unwrap();
        section.ensure_created(StorageClass::Modern116).unwrap();
        // Water is not air; both cells count.
        assert_eq!(section.block_count(), Some(2));
    }

    #[test]
    fn test_mutation_invalidates_cache() {
        let mut section = NetworkSection::new(true);
        section.set_block(0, 0, 0, block::STONE).unwrap();
        let before = section.ensure_created(StorageClass::Modern116).unwrap();
        section.set_block(0, 0, 0, block::DIRT).unwrap();
        assert_eq!(section.block_count(), None);
        let after = section.ensure_created(StorageClass::Modern116).unwrap();
        assert!(!Arc::ptr_eq(&before, &after));
        assert_eq!(after.get(0, 0, 0), block::DIRT.network_id(strata_common::IdSpace::Modern));
    }

    #[test]
    fn test_light_mutation_invalidates_cache() {
        let mut section = NetworkSection::new(true);
        section.ensure_created(StorageClass::Legacy).unwrap();
        section.set_block_light(0, 0, 0, 12);
        assert_eq!(section.block_count(), None);
    }

    #[test]
    fn test_write_data_lengths_agree_per_era() {
        let mut section = NetworkSection::new(true);
        section.set_block(2, 3, 4, block::STONE).unwrap();
        section.set_block(2, 4, 4, block::TORCH).unwrap();
        for era in [
            Era::V1_7,
            Era::V1_8,
            Era::V1_9,
            Era::V1_13,
            Era::V1_14,
            Era::V1_15,
            Era::V1_16,
            Era::V1_16_2,
            Era::V1_17,
        ] {
            for sky in [false, true] {
                let mut out = Vec::new();
                for pass in 0..4 {
                    section.write_data(&mut out, era, pass, sky).unwrap();
                }
                assert_eq!(
                    out.len(),
                    section.data_length(era, sky).unwrap(),
                    "era {:?} sky {}",
                    era,
                    sky
                );
            }
        }
    }

    #[test]
    fn test_missing_sky_light_writes_zeroes() {
        let mut section = NetworkSection::new(false);
        section.set_block(0, 0, 0, block::STONE).unwrap();
        let mut out = Vec::new();
        section.write_data(&mut out, Era::V1_8, 2, true).unwrap();
        assert_eq!(out.len(), 2048);
        assert!(out.iter().all(|&b| b == 0));
    }

    #[test]
    fn test_modern_pass_leads_with_block_count() {
        let mut section = NetworkSection::new(true);
        section.set_block(0, 0, 0, block::STONE).unwrap();
        section.set_block(1, 0, 0, block::STONE).unwrap();
        section.set_block(2, 0, 0, block::STONE).unwrap();
        let mut out = Vec::new();
        section.write_data(&mut out, Era::V1_16_2, 0, true).unwrap();
        assert_eq!(&out[0..2], &[0, 3]);
    }

    #[test]
    fn test_copy_has_fresh_cache() {
        let mut original = NetworkSection::new(true);
        original.set_block(0, 0, 0, block::STONE).unwrap();
        original.ensure_created(StorageClass::Modern116).unwrap();
        let copy = original.copy();
        assert_eq!(copy.block_count(), None);
        assert_eq!(copy.blocks().get(0, 0, 0), block::STONE);
    }
}
