//! Chunk storage on disk: region files with their sector allocator, the directory of region
//! files making up a world, and the older one-file-per-chunk layout.

mod backend;
mod codec;
mod directory;
mod error;
mod file;
mod legacy;
mod location;
mod raw;

pub use backend::StorageBackend;
pub use codec::{compress, decompress, ChunkOutput, CompressionFormat};
pub use directory::RegionDirectory;
pub use error::RegionError;
pub use file::{RegionFile, RepairReport};
pub use legacy::{base36, LegacyStore};
pub use location::{sectors_needed, ChunkHeader, ChunkLocation, ChunkTimestamp, SECTOR_BYTES};
pub use raw::{stored_position, RawChunk};
