use crate::codec::{decompress, CompressionFormat};
use crate::error::RegionError;
use nbt_turbo::Compound;

/// A chunk as it sits on disk: a compression tag and the compressed tag tree.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct RawChunk {
	compression: u8,
	payload: Vec<u8>
}

impl RawChunk {
	pub fn new(format: CompressionFormat, payload: Vec<u8>) -> Self {
		RawChunk { compression: format.tag(), payload }
	}

	/// Keeps an unrecognized tag around; it only becomes an error once decoded.
	pub(crate) fn from_parts(compression: u8, payload: Vec<u8>) -> Self {
		RawChunk { compression, payload }
	}

	pub fn compression_tag(&self) -> u8 {
		self.compression
	}

	pub fn format(&self) -> Result<CompressionFormat, RegionError> {
		CompressionFormat::from_tag(self.compression)
	}

	pub fn payload(&self) -> &[u8] {
		&self.payload
	}

	pub fn decompress(&self) -> Result<Vec<u8>, RegionError> {
		decompress(&self.payload, self.format()?)
	}

	/// Decompresses and parses the tag tree, returning the root compound.
	pub fn parse(&self) -> Result<Compound, RegionError> {
		let (_, root) = nbt_turbo::parse(&self.decompress()?)?;

		Ok(root)
	}
}

/// Reads the chunk coordinates stored inside a chunk tree, under `Level` when present.
pub fn stored_position(root: &Compound) -> Option<(i32, i32)> {
	let level = root.get_compound("Level").unwrap_or(root);

	Some((level.get_i32("xPos")?, level.get_i32("zPos")?))
}
