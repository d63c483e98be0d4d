//! The chunk-data packet body, in every supported wire dialect.

use crate::packet::PacketBuffer;
use flate2::write::ZlibEncoder;
use flate2::Compression;
use std::io::Write;
use strata_common::{Era, ProtocolVersion, Result, StrataError};
use strata_nbt::Tag;
use strata_world::chunk::{biome_sample_index, ChunkSnapshot, DEFAULT_BIOME};
use strata_world::{IntArray, NetworkSection};

const HEIGHTMAP_BITS: u8 = 9;
const COLUMNS: usize = 256;

/// Encodes `chunk` as the chunk-data packet body for `version`.
///
/// `sky_light` says whether the target dimension carries sky light; it
/// gates the sky-light passes of the inline-light eras. Sections that
/// never computed sky light still satisfy the layout with zeroed arrays.
pub fn encode(chunk: &ChunkSnapshot, version: ProtocolVersion, sky_light: bool) -> Result<Vec<u8>> {
    let era = version.era();
    if era >= Era::V1_17 && !chunk.is_full() {
        return Err(StrataError::UnsupportedRequest(
            "partial chunks cannot be encoded for 1.17+ clients".to_owned(),
        ));
    }

    let mut buffer = PacketBuffer::new();
    buffer.write_i32(chunk.x());
    buffer.write_i32(chunk.z());
    if era < Era::V1_17 {
        buffer.write_bool(chunk.is_full());
    }
    if era == Era::V1_16 {
        // "ignore old data", removed again in 1.16.2.
        buffer.write_bool(true);
    }

    let mut mask = chunk.section_mask();
    // Several widespread client forks crash parsing a zero mask, so void
    // chunks are sent as one empty section instead.
    let substitute_empty = mask == 0 && era < Era::V1_17;
    if substitute_empty {
        mask = 1;
    }
    write_section_mask(&mut buffer, era, mask);

    if era >= Era::V1_14 {
        write_heightmaps(&mut buffer, chunk, era)?;
    }

    if chunk.is_full() {
        match era {
            Era::V1_15 | Era::V1_16 => {
                for &biome in chunk.biome_samples() {
                    buffer.write_i32(biome);
                }
            }
            Era::V1_16_2 | Era::V1_17 => {
                buffer.write_varint(chunk.biome_samples().len() as i32);
                for &biome in chunk.biome_samples() {
                    buffer.write_varint(biome);
                }
            }
            // Older eras carry 2-D biome bytes inside the section data.
            _ => {}
        }
    }

    let placeholder;
    let sections: Vec<&NetworkSection> = if substitute_empty {
        placeholder = NetworkSection::new(chunk.has_sky_light());
        vec![&placeholder]
    } else {
        chunk
            .sections()
            .iter()
            .filter_map(|slot| slot.as_ref())
            .collect()
    };

    let mut predicted = 0;
    for section in &sections {
        predicted += section.data_length(era, sky_light)?;
    }

    let mut data = Vec::with_capacity(predicted + COLUMNS);
    for pass in 0..4 {
        for section in &sections {
            section.write_data(&mut data, era, pass, sky_light)?;
        }
    }
    if data.len() != predicted {
        // Accounting bug on our side, not a protocol violation; the bytes
        // written are still self-consistent, so send them.
        log::warn!(
            "chunk ({}, {}): predicted {} section bytes for {:?}, wrote {}",
            chunk.x(),
            chunk.z(),
            predicted,
            era,
            data.len(),
        );
    }

    if chunk.is_full() && era < Era::V1_15 {
        data.extend_from_slice(&legacy_biome_bytes(chunk));
    }

    if era == Era::V1_7 {
        // The add bitmask was already written alongside the primary mask;
        // the compressed-length prefix follows it directly.
        let compressed = deflate(&data)?;
        buffer.write_i32(compressed.len() as i32);
        buffer.write_bytes_raw(&compressed);
    } else {
        buffer.write_varint(data.len() as i32);
        buffer.write_bytes_raw(&data);
    }

    if era >= Era::V1_9 {
        // Block entities travel in their own packets.
        buffer.write_varint(0);
    }

    Ok(buffer.into_bytes())
}

fn write_section_mask(buffer: &mut PacketBuffer, era: Era, mask: u64) {
    match era {
        Era::V1_7 => {
            buffer.write_u16(mask as u16);
            // Add bitmask, written exactly once: extended block ids above
            // 255 are never sent, so it is always zero.
            buffer.write_u16(0);
        }
        Era::V1_8 => buffer.write_u16(mask as u16),
        Era::V1_17 => {
            if mask == 0 {
                buffer.write_varint(0);
            } else {
                buffer.write_varint(1);
                buffer.write_u64(mask);
            }
        }
        _ => buffer.write_varint(mask as i32),
    }
}

/// `MOTION_BLOCKING` and `WORLD_SURFACE` as 9-bit packed columns inside a
/// root compound. Each column records `y + 1` of the last qualifying
/// block seen scanning upward, zero when none qualifies.
fn write_heightmaps(buffer: &mut PacketBuffer, chunk: &ChunkSnapshot, era: Era) -> Result<()> {
    // 1.16 switched the long-array packing from spanning to per-word.
    let spanning = era < Era::V1_16;
    let mut motion_blocking = IntArray::new(spanning, HEIGHTMAP_BITS, COLUMNS);
    let mut world_surface = IntArray::new(spanning, HEIGHTMAP_BITS, COLUMNS);

    for z in 0..16 {
        for x in 0..16 {
            let mut surface = 0u32;
            let mut blocking = 0u32;
            for (section_index, slot) in chunk.sections().iter().enumerate() {
                let section = match slot {
                    Some(section) => section,
                    None => continue,
                };
                for y in 0..16 {
                    let block = section.blocks().get(x, y, z);
                    if block.is_air() {
                        continue;
                    }
                    let height = (section_index * 16 + y + 1) as u32;
                    surface = height;
                    if block.is_motion_blocking() {
                        blocking = height;
                    }
                }
            }
            let column = (z << 4) | x;
            motion_blocking.set(column, blocking)?;
            world_surface.set(column, surface)?;
        }
    }

    let tag = Tag::Compound(vec![
        (
            "MOTION_BLOCKING".to_owned(),
            Tag::LongArray(motion_blocking.words().iter().map(|&w| w as i64).collect()),
        ),
        (
            "WORLD_SURFACE".to_owned(),
            Tag::LongArray(world_surface.words().iter().map(|&w| w as i64).collect()),
        ),
    ]);
    tag.write(&mut buffer.buffer, "")?;
    Ok(())
}

/// Down-samples the 3-D biome grid into the pre-1.15 one-byte-per-column
/// form: each 4x4 column group takes the majority biome across every
/// fourth sampled y-layer, the first id to reach the maximum count
/// winning ties.
fn legacy_biome_bytes(chunk: &ChunkSnapshot) -> [u8; COLUMNS] {
    let samples = chunk.biome_samples();
    let mut out = [DEFAULT_BIOME as u8; COLUMNS];
    for gz in 0..4 {
        for gx in 0..4 {
            let mut tallies: Vec<(i32, u32)> = Vec::new();
            for sy in (0..64).step_by(4) {
                let biome = samples[biome_sample_index(gx, sy, gz)];
                match tallies.iter_mut().find(|(id, _)| *id == biome) {
                    Some((_, count)) => *count += 1,
                    None => tallies.push((biome, 1)),
                }
            }
            let mut winner = DEFAULT_BIOME;
            let mut winner_count = 0;
            for &(id, count) in &tallies {
                if count > winner_count {
                    winner = id;
                    winner_count = count;
                }
            }
            for z in 0..4 {
                for x in 0..4 {
                    out[((gz * 4 + z) << 4) | (gx * 4 + x)] = winner as u8;
                }
            }
        }
    }
    out
}

fn deflate(data: &[u8]) -> Result<Vec<u8>> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::best());
    encoder.write_all(data)?;
    Ok(encoder.finish()?)
}
