//! How a chunk's voxel arrays are arranged inside its tag tree.

mod flat;
mod section;

use crate::data::ChunkData;
use crate::settings::ChunkContext;
use lumis::compute_heightmap;
use nbt_turbo::{Compound, Output, Tag};
use region::stored_position;
use vocs::position::ChunkPosition;
use vocs::{HeightMap, Volume};

pub use self::section::{Section, SECTION_COUNT, SECTION_HEIGHT};

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum ChunkLayout {
	/// A single `Level` compound with whole-column arrays in `[x][z][y]` order and a byte
	/// height map.
	Flat,
	/// A `Sections` list of 16-high sections in `[y][z][x]` order and an int height map.
	/// Always 256 blocks tall.
	Sectioned
}

impl ChunkLayout {
	/// The height every chunk of this layout has, if the layout dictates one.
	pub fn fixed_height(self) -> Option<usize> {
		match self {
			ChunkLayout::Flat => None,
			ChunkLayout::Sectioned => Some(SECTION_HEIGHT * SECTION_COUNT)
		}
	}

	/// Picks a parsed tag tree apart. Errors describe why the tree is not a valid chunk, including
	/// a tree that records a position other than the one it was loaded for.
	pub(crate) fn decode(self, root: Compound, position: ChunkPosition, context: &ChunkContext) -> Result<ChunkData, String> {
		match stored_position(&root) {
			Some((x, z)) if (x, z) == (position.x(), position.z()) => (),
			Some((x, z)) => return Err(format!("chunk records position ({}, {}), expected {}", x, z, position)),
			None => return Err("chunk has no xPos / zPos".to_string())
		}

		match self {
			ChunkLayout::Flat => flat::decode(root, context),
			ChunkLayout::Sectioned => section::decode(root, context)
		}
	}

	/// Streams the chunk out as a tag tree.
	pub(crate) fn encode<T: Output>(self, data: &ChunkData, out: T) -> Result<T, String> {
		match self {
			ChunkLayout::Flat => Ok(flat::encode(data, out)),
			ChunkLayout::Sectioned => section::encode(data, out)
		}
	}
}

fn take_level(root: &mut Compound) -> Result<Compound, String> {
	match root.remove("Level") {
		Some(Tag::Compound(level)) => Ok(level),
		Some(other) => Err(format!("Level is a {:?} tag, not a compound", other.kind())),
		None => Err("missing Level compound".to_string())
	}
}

/// Takes the stored height map, or computes one if the chunk has none.
fn take_heightmap(level: &mut Compound, blocks: &Volume, context: &ChunkContext) -> Result<HeightMap, String> {
	let heightmap = match level.remove("HeightMap") {
		Some(Tag::U8Array(heights)) => HeightMap::from_values(&heights),
		Some(Tag::U32Array(heights)) => HeightMap::from_values(&heights),
		_ => return Ok(compute_heightmap(blocks, &context.absorbing))
	};

	heightmap.ok_or_else(|| "HeightMap does not have 256 entries".to_string())
}
