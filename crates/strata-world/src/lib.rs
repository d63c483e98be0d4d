//! The virtual world data model: blocks, sections, light, and the
//! per-protocol-class encoded storages built from them.
//!
//! Everything here is synchronous and CPU-bound. A [`chunk::ChunkSnapshot`]
//! is mutated by the world-store collaborator and read by any number of
//! concurrently encoding connections; callers must either `copy()` a
//! section before mutating it concurrently with an encode, or order
//! mutation before the encodes that should observe it.

pub mod block;
pub mod chunk;
pub mod light;
pub mod network_section;
pub mod nibble;
pub mod packed_array;
pub mod section;
pub mod storage;

pub(crate) mod wire;

pub use block::VirtualBlock;
pub use chunk::ChunkSnapshot;
pub use light::LightSection;
pub use network_section::NetworkSection;
pub use nibble::NibbleArray;
pub use packed_array::{CompactIntArray, IntArray, PackedIntArray};
pub use section::BlockSection;
pub use storage::BlockStorage;
