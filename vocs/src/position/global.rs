use crate::position::Dir;
use std::fmt::{Display, Formatter, Result};

/// Width of a region along both the X and Z axes, in chunks.
pub const REGION_WIDTH: i32 = 32;

/// The position of a chunk column in the world, in chunk units.
///
/// Ordering is by X, then Z, which gives lighting and scans a reproducible visiting order.
#[derive(Debug, Eq, PartialEq, Ord, PartialOrd, Copy, Clone, Hash)]
pub struct ChunkPosition {
	x: i32,
	z: i32
}

impl ChunkPosition {
	pub fn new(x: i32, z: i32) -> Self {
		ChunkPosition { x, z }
	}

	pub fn x(&self) -> i32 {
		self.x
	}

	pub fn z(&self) -> i32 {
		self.z
	}

	/// Returns the region containing this chunk.
	pub fn region(&self) -> RegionPosition {
		RegionPosition::new(self.x >> 5, self.z >> 5)
	}

	/// Returns the X position of this chunk inside its region, 0 to 31.
	pub fn local_x(&self) -> u8 {
		(self.x & 31) as u8
	}

	/// Returns the Z position of this chunk inside its region, 0 to 31.
	pub fn local_z(&self) -> u8 {
		(self.z & 31) as u8
	}

	pub fn offset(&self, dir: Dir) -> ChunkPosition {
		let (dx, dz) = dir.step();

		ChunkPosition::new(self.x.wrapping_add(dx), self.z.wrapping_add(dz))
	}

	/// Returns the 8 chunks surrounding this one.
	pub fn neighbors(&self) -> [ChunkPosition; 8] {
		let (x, z) = (self.x, self.z);
		let (west, east) = (x.wrapping_sub(1), x.wrapping_add(1));
		let (north, south) = (z.wrapping_sub(1), z.wrapping_add(1));

		[
			ChunkPosition::new(west, north),
			ChunkPosition::new(west, z),
			ChunkPosition::new(west, south),
			ChunkPosition::new(x, north),
			ChunkPosition::new(x, south),
			ChunkPosition::new(east, north),
			ChunkPosition::new(east, z),
			ChunkPosition::new(east, south)
		]
	}
}

impl Display for ChunkPosition {
	fn fmt(&self, f: &mut Formatter) -> Result {
		write!(f, "({}, {})", self.x, self.z)
	}
}

/// The position of a region file in the world, in region units.
#[derive(Debug, Eq, PartialEq, Ord, PartialOrd, Copy, Clone, Hash)]
pub struct RegionPosition {
	x: i32,
	z: i32
}

impl RegionPosition {
	pub fn new(x: i32, z: i32) -> Self {
		RegionPosition { x, z }
	}

	pub fn x(&self) -> i32 {
		self.x
	}

	pub fn z(&self) -> i32 {
		self.z
	}

	/// Returns the chunk at a local position inside this region.
	/// ### Out of bounds behavior
	/// Local coordinates are truncated to 0..32.
	pub fn chunk(&self, local_x: u8, local_z: u8) -> ChunkPosition {
		ChunkPosition::new(
			self.x * REGION_WIDTH + (local_x & 31) as i32,
			self.z * REGION_WIDTH + (local_z & 31) as i32
		)
	}
}

impl Display for RegionPosition {
	fn fmt(&self, f: &mut Formatter) -> Result {
		write!(f, "({}, {})", self.x, self.z)
	}
}

#[cfg(test)]
mod test {
	use super::{ChunkPosition, RegionPosition};
	use crate::position::Dir;

	#[test]
	fn test_negative_region() {
		let position = ChunkPosition::new(-1, -33);

		assert_eq!(position.region(), RegionPosition::new(-1, -2));
		assert_eq!(position.local_x(), 31);
		assert_eq!(position.local_z(), 31);
		assert_eq!(position.region().chunk(31, 31), position);
	}

	#[test]
	fn test_neighbors_wrap_at_the_edges() {
		let corner = ChunkPosition::new(i32::MIN, i32::MAX);
		let neighbors = corner.neighbors();

		assert_eq!(neighbors[0], ChunkPosition::new(i32::MAX, i32::MAX - 1));
		assert_eq!(neighbors[2], ChunkPosition::new(i32::MAX, i32::MIN));
		assert_eq!(neighbors[7], ChunkPosition::new(i32::MIN + 1, i32::MIN));

		for dir in Dir::HORIZONTAL.iter() {
			assert!(neighbors.contains(&corner.offset(*dir)));
		}
	}

	#[test]
	fn test_ordering() {
		let mut positions = vec![ChunkPosition::new(1, 0), ChunkPosition::new(0, 5), ChunkPosition::new(0, -2)];

		positions.sort();

		assert_eq!(positions, vec![ChunkPosition::new(0, -2), ChunkPosition::new(0, 5), ChunkPosition::new(1, 0)]);
	}
}
