//! End-to-end chunk packet encoding across protocol revisions.

use assert_matches::assert_matches;
use flate2::read::ZlibDecoder;
use std::io::Read;
use strata_common::{ProtocolVersion, StrataError};
use strata_nbt::Tag;
use strata_protocol::chunk_data;
use strata_protocol::packet::PacketBuffer;
use strata_world::packed_array::{CompactIntArray, PackedIntArray};
use strata_world::{block, ChunkSnapshot};

/// Sections 0, 2 and 5 populated; stone under a torch in section 0.
fn sample_chunk() -> ChunkSnapshot {
    let mut chunk = ChunkSnapshot::new(7, -3, true, 16, true);
    chunk.set_block(3, 10, 2, block::STONE).unwrap();
    chunk.set_block(3, 12, 2, block::TORCH).unwrap();
    chunk.set_block(0, 32, 0, block::DIRT).unwrap();
    chunk.set_block(0, 84, 0, block::SAND).unwrap();
    chunk
}

#[test]
fn test_encodes_at_every_version() {
    let chunk = sample_chunk();
    for version in ProtocolVersion::ALL {
        let bytes = chunk_data::encode(&chunk, version, true).unwrap();
        assert!(!bytes.is_empty(), "{:?}", version);
    }
}

#[test]
fn test_section_mask_18_is_raw_u16() {
    let bytes = chunk_data::encode(&sample_chunk(), ProtocolVersion::V1_8, true).unwrap();
    let mut buffer = PacketBuffer::from_bytes(bytes);
    assert_eq!(buffer.read_i32().unwrap(), 7);
    assert_eq!(buffer.read_i32().unwrap(), -3);
    assert!(buffer.read_bool().unwrap());
    assert_eq!(buffer.read_u16().unwrap(), 0b100101);
}

#[test]
fn test_section_mask_19_is_varint() {
    let bytes = chunk_data::encode(&sample_chunk(), ProtocolVersion::V1_12_2, true).unwrap();
    let mut buffer = PacketBuffer::from_bytes(bytes);
    buffer.read_i32().unwrap();
    buffer.read_i32().unwrap();
    buffer.read_bool().unwrap();
    assert_eq!(buffer.read_varint().unwrap(), 0b100101);
}

#[test]
fn test_section_mask_117_is_bitset_words() {
    let bytes = chunk_data::encode(&sample_chunk(), ProtocolVersion::V1_17, true).unwrap();
    let mut buffer = PacketBuffer::from_bytes(bytes);
    buffer.read_i32().unwrap();
    buffer.read_i32().unwrap();
    // No full-chunk flag at 1.17.
    assert_eq!(buffer.read_varint().unwrap(), 1);
    assert_eq!(buffer.read_u64().unwrap(), 0b100101);
}

#[test]
fn test_void_chunk_substitutes_one_empty_section() {
    let chunk = ChunkSnapshot::new(0, 0, true, 16, true);
    let bytes = chunk_data::encode(&chunk, ProtocolVersion::V1_8, true).unwrap();
    let mut buffer = PacketBuffer::from_bytes(bytes);
    buffer.read_i32().unwrap();
    buffer.read_i32().unwrap();
    buffer.read_bool().unwrap();
    assert_eq!(buffer.read_u16().unwrap(), 1);
    // One empty section: ids + block light + sky light, then 2-D biomes.
    let size = buffer.read_varint().unwrap() as usize;
    assert_eq!(size, 8192 + 2048 + 2048 + 256);
    assert_eq!(buffer.remaining(), size);
}

#[test]
fn test_void_chunk_at_117_keeps_empty_bitset() {
    let chunk = ChunkSnapshot::new(0, 0, true, 16, true);
    let bytes = chunk_data::encode(&chunk, ProtocolVersion::V1_17, true).unwrap();
    let mut buffer = PacketBuffer::from_bytes(bytes);
    buffer.read_i32().unwrap();
    buffer.read_i32().unwrap();
    assert_eq!(buffer.read_varint().unwrap(), 0);
}

fn read_heightmaps(buffer: &mut PacketBuffer) -> (Vec<u64>, Vec<u64>) {
    let (name, tag) = Tag::read(buffer).unwrap();
    assert_eq!(name, "");
    let motion = tag
        .get("MOTION_BLOCKING")
        .and_then(Tag::as_long_array)
        .unwrap()
        .iter()
        .map(|&w| w as u64)
        .collect();
    let surface = tag
        .get("WORLD_SURFACE")
        .and_then(Tag::as_long_array)
        .unwrap()
        .iter()
        .map(|&w| w as u64)
        .collect();
    (motion, surface)
}

#[test]
fn test_heightmaps_114_spanning() {
    let bytes = chunk_data::encode(&sample_chunk(), ProtocolVersion::V1_14, true).unwrap();
    let mut buffer = PacketBuffer::from_bytes(bytes);
    buffer.read_i32().unwrap();
    buffer.read_i32().unwrap();
    buffer.read_bool().unwrap();
    buffer.read_varint().unwrap();
    let (motion_words, surface_words) = read_heightmaps(&mut buffer);

    let motion = PackedIntArray::from_words(9, 256, motion_words).unwrap();
    let surface = PackedIntArray::from_words(9, 256, surface_words).unwrap();
    // Column (3, 2): torch at y=12 tops the surface but does not block.
    assert_eq!(surface.get((2 << 4) | 3), 13);
    assert_eq!(motion.get((2 << 4) | 3), 11);
    // Column (0, 0): sand at y=84 tops both.
    assert_eq!(surface.get(0), 85);
    assert_eq!(motion.get(0), 85);
    // An untouched column.
    assert_eq!(surface.get(255), 0);
}

#[test]
fn test_heightmaps_1162_compact() {
    let bytes = chunk_data::encode(&sample_chunk(), ProtocolVersion::V1_16_2, true).unwrap();
    let mut buffer = PacketBuffer::from_bytes(bytes);
    buffer.read_i32().unwrap();
    buffer.read_i32().unwrap();
    buffer.read_bool().unwrap();
    buffer.read_varint().unwrap();
    let (motion_words, surface_words) = read_heightmaps(&mut buffer);

    let motion = CompactIntArray::from_words(9, 256, motion_words).unwrap();
    let surface = CompactIntArray::from_words(9, 256, surface_words).unwrap();
    assert_eq!(surface.get((2 << 4) | 3), 13);
    assert_eq!(motion.get((2 << 4) | 3), 11);
    assert_eq!(surface.get(0), 85);
}

#[test]
fn test_biome_ints_115() {
    let mut chunk = sample_chunk();
    chunk.set_biome(0, 0, 0, 6).unwrap();
    let bytes = chunk_data::encode(&chunk, ProtocolVersion::V1_15, true).unwrap();
    let mut buffer = PacketBuffer::from_bytes(bytes);
    buffer.read_i32().unwrap();
    buffer.read_i32().unwrap();
    buffer.read_bool().unwrap();
    buffer.read_varint().unwrap();
    read_heightmaps(&mut buffer);
    // 1024 raw ints, sample 0 first.
    assert_eq!(buffer.read_i32().unwrap(), 6);
    for _ in 1..1024 {
        assert_eq!(buffer.read_i32().unwrap(), 127);
    }
}

#[test]
fn test_biome_varints_1162() {
    let chunk = sample_chunk();
    let bytes = chunk_data::encode(&chunk, ProtocolVersion::V1_16_4, true).unwrap();
    let mut buffer = PacketBuffer::from_bytes(bytes);
    buffer.read_i32().unwrap();
    buffer.read_i32().unwrap();
    buffer.read_bool().unwrap();
    buffer.read_varint().unwrap();
    read_heightmaps(&mut buffer);
    assert_eq!(buffer.read_varint().unwrap(), 1024);
    for _ in 0..1024 {
        assert_eq!(buffer.read_varint().unwrap(), 127);
    }
}

/// Reads past the 1.8 header and returns the section+biome data bytes.
fn read_18_data(bytes: Vec<u8>) -> Vec<u8> {
    let mut buffer = PacketBuffer::from_bytes(bytes);
    buffer.read_i32().unwrap();
    buffer.read_i32().unwrap();
    buffer.read_bool().unwrap();
    buffer.read_u16().unwrap();
    let size = buffer.read_varint().unwrap() as usize;
    buffer.read_bytes(size).unwrap()
}

#[test]
fn test_legacy_biomes_majority_vote() {
    let mut chunk = ChunkSnapshot::new(0, 0, true, 16, true);
    chunk.set_block(0, 0, 0, block::STONE).unwrap();
    // Group (0, 0): biome 5 on nine tallied layers, biome 8 on seven.
    for (layer, y) in (0..256).step_by(16).enumerate() {
        let biome = if layer < 9 { 5 } else { 8 };
        chunk.set_biome(0, y, 0, biome).unwrap();
    }
    let data = read_18_data(chunk_data::encode(&chunk, ProtocolVersion::V1_8, true).unwrap());
    let biomes = &data[data.len() - 256..];
    for z in 0..4 {
        for x in 0..4 {
            assert_eq!(biomes[(z << 4) | x], 5);
        }
    }
    // Untouched groups keep the default biome.
    assert_eq!(biomes[255], 127);
}

#[test]
fn test_legacy_biome_tie_prefers_first_seen() {
    let mut chunk = ChunkSnapshot::new(0, 0, true, 16, true);
    chunk.set_block(0, 0, 0, block::STONE).unwrap();
    // Eight layers each of biomes 9 and 2; 9 is seen first.
    for (layer, y) in (0..256).step_by(16).enumerate() {
        let biome = if layer < 8 { 9 } else { 2 };
        chunk.set_biome(0, y, 0, biome).unwrap();
    }
    let data = read_18_data(chunk_data::encode(&chunk, ProtocolVersion::V1_8, true).unwrap());
    let biomes = &data[data.len() - 256..];
    assert_eq!(biomes[0], 9);
}

#[test]
fn test_same_era_versions_are_byte_identical() {
    let chunk = sample_chunk();
    for (a, b) in [
        (ProtocolVersion::V1_7_2, ProtocolVersion::V1_7_6),
        (ProtocolVersion::V1_9, ProtocolVersion::V1_12_2),
        (ProtocolVersion::V1_13, ProtocolVersion::V1_13_2),
        (ProtocolVersion::V1_14, ProtocolVersion::V1_14_4),
        (ProtocolVersion::V1_16_2, ProtocolVersion::V1_16_4),
        (ProtocolVersion::V1_17, ProtocolVersion::V1_17_1),
    ] {
        let left = chunk_data::encode(&chunk, a, true).unwrap();
        let right = chunk_data::encode(&chunk, b, true).unwrap();
        assert_eq!(left, right, "{:?} vs {:?}", a, b);
    }
}

#[test]
fn test_partial_chunk_rejected_at_117() {
    let mut chunk = ChunkSnapshot::new(0, 0, false, 16, true);
    chunk.set_block(0, 0, 0, block::STONE).unwrap();
    assert_matches!(
        chunk_data::encode(&chunk, ProtocolVersion::V1_17, true),
        Err(StrataError::UnsupportedRequest(_))
    );
    // The same chunk is fine one era earlier.
    chunk_data::encode(&chunk, ProtocolVersion::V1_16_4, true).unwrap();
}

#[test]
fn test_partial_chunk_omits_biomes() {
    let mut chunk = ChunkSnapshot::new(0, 0, false, 16, true);
    chunk.set_block(0, 0, 0, block::STONE).unwrap();
    let mut buffer = PacketBuffer::from_bytes(
        chunk_data::encode(&chunk, ProtocolVersion::V1_8, true).unwrap(),
    );
    buffer.read_i32().unwrap();
    buffer.read_i32().unwrap();
    assert!(!buffer.read_bool().unwrap());
    buffer.read_u16().unwrap();
    let size = buffer.read_varint().unwrap() as usize;
    // No trailing 256 biome bytes on a partial chunk.
    assert_eq!(size, 8192 + 2048 + 2048);
    assert_eq!(buffer.remaining(), size);
}

#[test]
fn test_17_payload_is_zlib_compressed() {
    let mut chunk = ChunkSnapshot::new(1, 2, true, 16, true);
    chunk.set_block(1, 2, 3, block::STONE).unwrap();
    let bytes = chunk_data::encode(&chunk, ProtocolVersion::V1_7_2, true).unwrap();
    let mut buffer = PacketBuffer::from_bytes(bytes);
    assert_eq!(buffer.read_i32().unwrap(), 1);
    assert_eq!(buffer.read_i32().unwrap(), 2);
    assert!(buffer.read_bool().unwrap());
    assert_eq!(buffer.read_u16().unwrap(), 1); // primary mask
    assert_eq!(buffer.read_u16().unwrap(), 0); // add mask, always zero
    let compressed_len = buffer.read_i32().unwrap() as usize;
    let compressed = buffer.read_bytes(compressed_len).unwrap();
    assert_eq!(buffer.remaining(), 0);

    let mut data = Vec::new();
    ZlibDecoder::new(&compressed[..]).read_to_end(&mut data).unwrap();
    // ids + data nibbles + block light + sky light + biomes.
    assert_eq!(data.len(), 4096 + 2048 + 2048 + 2048 + 256);
    // Stone at (1, 2, 3): legacy id 16, upper byte 1.
    let cell = (2 << 8) | (3 << 4) | 1;
    assert_eq!(data[cell], 1);
    // Its data nibble (high half, odd cell) is zero, and sky light is full.
    assert_eq!(data[4096 + cell / 2] >> 4, 0);
    assert_eq!(data[4096 + 2048 + 2048 + cell / 2], 0xFF);
}

#[test]
fn test_block_entity_trailer_from_19() {
    let chunk = sample_chunk();
    let mut buffer = PacketBuffer::from_bytes(
        chunk_data::encode(&chunk, ProtocolVersion::V1_9, true).unwrap(),
    );
    buffer.read_i32().unwrap();
    buffer.read_i32().unwrap();
    buffer.read_bool().unwrap();
    buffer.read_varint().unwrap();
    let size = buffer.read_varint().unwrap() as usize;
    buffer.read_bytes(size).unwrap();
    assert_eq!(buffer.read_varint().unwrap(), 0);
    assert_eq!(buffer.remaining(), 0);

    // 1.8 has no trailer.
    let mut buffer = PacketBuffer::from_bytes(
        chunk_data::encode(&chunk, ProtocolVersion::V1_8, true).unwrap(),
    );
    buffer.read_i32().unwrap();
    buffer.read_i32().unwrap();
    buffer.read_bool().unwrap();
    buffer.read_u16().unwrap();
    let size = buffer.read_varint().unwrap() as usize;
    assert_eq!(buffer.remaining(), size);
}

#[test]
fn test_sky_light_flag_changes_legacy_size() {
    let mut chunk = ChunkSnapshot::new(0, 0, true, 16, true);
    chunk.set_block(0, 0, 0, block::STONE).unwrap();
    let with_sky = read_18_data(chunk_data::encode(&chunk, ProtocolVersion::V1_8, true).unwrap());
    let without = read_18_data(chunk_data::encode(&chunk, ProtocolVersion::V1_8, false).unwrap());
    assert_eq!(with_sky.len() - without.len(), 2048);
}
