mod direction;

/// Global positioning of chunks and the region files that hold them.
///
/// A region covers a 32 by 32 area of chunks. Chunk coordinates map to their region by an
/// arithmetic shift, so negative coordinates land in negative regions without special cases.
mod global;

pub use self::direction::Dir;
pub use self::global::{ChunkPosition, RegionPosition, REGION_WIDTH};
