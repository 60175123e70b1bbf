use crate::volume::CHUNK_WIDTH;

/// One height per column of a chunk, indexed `[z][x]` like the on-disk arrays.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct HeightMap {
	heights: Box<[u32; 256]>
}

impl HeightMap {
	pub fn new() -> Self {
		HeightMap::filled(0)
	}

	pub fn filled(height: u32) -> Self {
		HeightMap { heights: Box::new([height; 256]) }
	}

	/// Builds a height map from any 256-entry array of heights.
	pub fn from_values<T: Copy + Into<u32>>(values: &[T]) -> Option<Self> {
		if values.len() != CHUNK_WIDTH * CHUNK_WIDTH {
			return None;
		}

		let mut heights = Box::new([0; 256]);

		for (height, &value) in heights.iter_mut().zip(values) {
			*height = value.into();
		}

		Some(HeightMap { heights })
	}

	#[inline]
	pub fn get(&self, x: usize, z: usize) -> u32 {
		self.heights[z * CHUNK_WIDTH + x]
	}

	#[inline]
	pub fn set(&mut self, x: usize, z: usize, height: u32) {
		self.heights[z * CHUNK_WIDTH + x] = height;
	}

	pub fn as_inner(&self) -> &[u32; 256] {
		&self.heights
	}

	/// Truncates every height to a byte, for formats that store the height map as a byte array.
	pub fn to_bytes(&self) -> Vec<u8> {
		self.heights.iter().map(|&height| height.min(255) as u8).collect()
	}
}

impl Default for HeightMap {
	fn default() -> Self {
		HeightMap::new()
	}
}
