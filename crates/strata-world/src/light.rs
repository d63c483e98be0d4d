//! Per-section light data.

use crate::nibble::NibbleArray;
use crate::section::SECTION_VOLUME;

/// One block-light array and an optional sky-light array per 16^3 volume.
/// Dimensions without sky access carry no sky-light array at all.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LightSection {
    block_light: NibbleArray,
    sky_light: Option<NibbleArray>,
}

impl LightSection {
    pub fn new(has_sky_light: bool) -> Self {
        LightSection {
            block_light: NibbleArray::new(SECTION_VOLUME),
            sky_light: has_sky_light.then(|| NibbleArray::filled(SECTION_VOLUME, 15)),
        }
    }

    pub fn block_light(&self) -> &NibbleArray {
        &self.block_light
    }

    pub fn block_light_mut(&mut self) -> &mut NibbleArray {
        &mut self.block_light
    }

    pub fn sky_light(&self) -> Option<&NibbleArray> {
        self.sky_light.as_ref()
    }

    pub fn sky_light_mut(&mut self) -> Option<&mut NibbleArray> {
        self.sky_light.as_mut()
    }

    pub fn set_block_light(&mut self, x: usize, y: usize, z: usize, level: u8) {
        self.block_light.set(x, y, z, level);
    }

    /// No-op if the section carries no sky light.
    pub fn set_sky_light(&mut self, x: usize, y: usize, z: usize, level: u8) {
        if let Some(sky) = self.sky_light.as_mut() {
            sky.set(x, y, z, level);
        }
    }

    /// An independent section with identical contents.
    pub fn copy(&self) -> Self {
        self.clone()
    }
}
