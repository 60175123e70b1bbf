#![forbid(unsafe_code)]

//! # `vocs`: Voxel Component System
//!
//! Storage primitives for chunked voxel data: 4-bit light and metadata values, the dense
//! 16×16×H [`Volume`] used for block IDs and unpacked nibble fields, the per-column
//! [`HeightMap`], and chunk / region coordinates.
//!
//! Every component of a chunk (block IDs, block data, block light, sky light) is a volume of
//! the same shape, indexed `[x, z, y]` with Y varying fastest. That matches the byte order of
//! the flat on-disk arrays, so loading them is a move rather than a reshuffle.

pub mod position;

/// Nibble (`u4`) values and the packing of nibble volumes to and from bytes.
pub mod nibbles;

mod heightmap;
mod volume;

pub use heightmap::HeightMap;
pub use volume::{Volume, CHUNK_WIDTH};
