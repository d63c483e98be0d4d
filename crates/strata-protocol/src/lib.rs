//! Wire encoding of chunk and light packets.
//!
//! The entry point is [`chunk_data::encode`]: it takes a
//! [`strata_world::ChunkSnapshot`] and a protocol version and returns the
//! packet body bytes for that version's chunk-data layout. Packet ids and
//! framing vary per revision and belong to the transport layer, so they
//! are not written here.

pub mod chunk_data;
pub mod packet;
pub mod update_light;

pub use packet::PacketBuffer;
pub use update_light::UpdateLightPacket;
