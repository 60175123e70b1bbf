use crate::nibbles::{pack_nibbles, unpack_nibbles};
use std::fmt::{self, Debug, Formatter};

/// Width of a chunk along both the X and Z axes.
pub const CHUNK_WIDTH: usize = 16;

/// A dense 16×16×H array of bytes, indexed `[x, z, y]` with Y varying fastest.
#[derive(Clone, Eq, PartialEq)]
pub struct Volume {
	height: usize,
	data: Box<[u8]>
}

impl Volume {
	/// Creates a volume filled with zeros.
	/// # Panics
	/// If the height is zero or odd, which would make the volume unpackable.
	pub fn new(height: usize) -> Self {
		Volume::filled(height, 0)
	}

	pub fn filled(height: usize, value: u8) -> Self {
		assert!(height > 0 && height & 1 == 0, "Volume height must be even and nonzero, got {}", height);

		Volume {
			height,
			data: vec![value; CHUNK_WIDTH * CHUNK_WIDTH * height].into_boxed_slice()
		}
	}

	/// Wraps an existing `[x][z][y]` array. Returns None if the length does not match.
	pub fn from_raw(height: usize, data: Vec<u8>) -> Option<Self> {
		if height == 0 || height & 1 != 0 || data.len() != CHUNK_WIDTH * CHUNK_WIDTH * height {
			return None;
		}

		Some(Volume { height, data: data.into_boxed_slice() })
	}

	/// Expands a nibble-packed `[x][z][h / 2]` array into a volume.
	/// Returns None if the packed length does not match the height.
	pub fn unpack(height: usize, packed: &[u8]) -> Option<Self> {
		if packed.len() * 2 != CHUNK_WIDTH * CHUNK_WIDTH * height {
			return None;
		}

		Volume::from_raw(height, unpack_nibbles(packed))
	}

	/// Packs the volume to two values per byte. Values above 15 are truncated.
	pub fn pack(&self) -> Vec<u8> {
		pack_nibbles(&self.data)
	}

	pub fn height(&self) -> usize {
		self.height
	}

	pub fn len(&self) -> usize {
		self.data.len()
	}

	pub fn is_empty(&self) -> bool {
		self.data.is_empty()
	}

	#[inline]
	pub fn index(&self, x: usize, z: usize, y: usize) -> usize {
		debug_assert!(x < CHUNK_WIDTH && z < CHUNK_WIDTH && y < self.height);

		(x * CHUNK_WIDTH + z) * self.height + y
	}

	#[inline]
	pub fn get(&self, x: usize, z: usize, y: usize) -> u8 {
		self.data[self.index(x, z, y)]
	}

	#[inline]
	pub fn set(&mut self, x: usize, z: usize, y: usize, value: u8) {
		let index = self.index(x, z, y);

		self.data[index] = value;
	}

	/// Returns the vertical column at (x, z), bottom first.
	pub fn column(&self, x: usize, z: usize) -> &[u8] {
		let start = self.index(x, z, 0);

		&self.data[start..start + self.height]
	}

	pub fn column_mut(&mut self, x: usize, z: usize) -> &mut [u8] {
		let start = self.index(x, z, 0);
		let height = self.height;

		&mut self.data[start..start + height]
	}

	pub fn fill(&mut self, value: u8) {
		for entry in self.data.iter_mut() {
			*entry = value;
		}
	}

	/// Maps every value through a 256-entry lookup table, producing a new volume.
	pub fn map(&self, table: &[u8; 256]) -> Volume {
		Volume {
			height: self.height,
			data: self.data.iter().map(|&value| table[value as usize]).collect()
		}
	}

	pub fn raw(&self) -> &[u8] {
		&self.data
	}

	pub fn raw_mut(&mut self) -> &mut [u8] {
		&mut self.data
	}

	pub fn into_raw(self) -> Vec<u8> {
		self.data.into_vec()
	}
}

impl Debug for Volume {
	fn fmt(&self, f: &mut Formatter) -> fmt::Result {
		write!(f, "Volume {{ height: {} }}", self.height)
	}
}
