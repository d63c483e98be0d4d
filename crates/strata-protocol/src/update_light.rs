//! The light update packet for eras that carry light outside the chunk
//! packet (1.14+).

use crate::packet::PacketBuffer;
use strata_common::{Result, StrataError};
use strata_world::ChunkSnapshot;

const LIGHT_ARRAY_LEN: usize = 2048;

/// Per-chunk light payload. Light sections pad the block sections by one
/// below and one above the world, so section `i`'s bit is `i + 1`.
#[derive(Debug)]
pub struct UpdateLightPacket {
    chunk_x: i32,
    chunk_z: i32,
    trust_edges: bool,
    sky_light_mask: i32,
    block_light_mask: i32,
    sky_light_arrays: Vec<Vec<u8>>,
    block_light_arrays: Vec<Vec<u8>>,
}

impl UpdateLightPacket {
    pub fn new(
        chunk_x: i32,
        chunk_z: i32,
        trust_edges: bool,
        sky_light_mask: i32,
        block_light_mask: i32,
        sky_light_arrays: Vec<Vec<u8>>,
        block_light_arrays: Vec<Vec<u8>>,
    ) -> Result<Self> {
        for array in sky_light_arrays.iter().chain(block_light_arrays.iter()) {
            if array.len() != LIGHT_ARRAY_LEN {
                return Err(StrataError::UnsupportedRequest(format!(
                    "light array must be exactly {} bytes, got {}",
                    LIGHT_ARRAY_LEN,
                    array.len()
                )));
            }
        }
        Ok(Self {
            chunk_x,
            chunk_z,
            trust_edges,
            sky_light_mask,
            block_light_mask,
            sky_light_arrays,
            block_light_arrays,
        })
    }

    /// Collects every present section's light from `chunk`.
    pub fn from_snapshot(chunk: &ChunkSnapshot, trust_edges: bool) -> Result<Self> {
        let mut sky_light_mask = 0;
        let mut block_light_mask = 0;
        let mut sky_light_arrays = Vec::new();
        let mut block_light_arrays = Vec::new();

        for (index, slot) in chunk.sections().iter().enumerate() {
            let section = match slot {
                Some(section) => section,
                None => continue,
            };
            let bit = 1 << (index + 1);
            block_light_mask |= bit;
            block_light_arrays.push(section.light().block_light().bytes().to_vec());
            if let Some(sky) = section.light().sky_light() {
                sky_light_mask |= bit;
                sky_light_arrays.push(sky.bytes().to_vec());
            }
        }

        UpdateLightPacket::new(
            chunk.x(),
            chunk.z(),
            trust_edges,
            sky_light_mask,
            block_light_mask,
            sky_light_arrays,
            block_light_arrays,
        )
    }

    pub fn sky_light_mask(&self) -> i32 {
        self.sky_light_mask
    }

    pub fn block_light_mask(&self) -> i32 {
        self.block_light_mask
    }

    /// The packet body bytes.
    pub fn encode(&self) -> Vec<u8> {
        let mut buffer = PacketBuffer::new();
        buffer.write_varint(self.chunk_x);
        buffer.write_varint(self.chunk_z);
        buffer.write_bool(self.trust_edges);
        buffer.write_varint(self.sky_light_mask);
        buffer.write_varint(self.block_light_mask);
        // Every position we carry no array for is declared known-zero
        // rather than unknown: the world is synthetic, so absent sections
        // genuinely have no light.
        buffer.write_varint(!self.sky_light_mask & LIGHT_SECTION_SPAN);
        buffer.write_varint(!self.block_light_mask & LIGHT_SECTION_SPAN);

        for array in &self.sky_light_arrays {
            buffer.write_varint(LIGHT_ARRAY_LEN as i32);
            buffer.write_bytes_raw(array);
        }
        for array in &self.block_light_arrays {
            buffer.write_varint(LIGHT_ARRAY_LEN as i32);
            buffer.write_bytes_raw(array);
        }

        buffer.into_bytes()
    }
}

/// 16 world sections plus the below/above halo: bits 0..=17.
const LIGHT_SECTION_SPAN: i32 = (1 << 18) - 1;
