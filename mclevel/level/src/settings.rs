use crate::layout::ChunkLayout;
use bit_vec::BitVec;
use lumis::Materials;
use region::CompressionFormat;

/// Whether a dimension has a sky to light it.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Default)]
pub enum DimensionKind {
	#[default]
	Normal,
	/// Sky light stays 0 everywhere, as in the nether.
	NoSky
}

impl DimensionKind {
	pub fn has_sky(self) -> bool {
		self == DimensionKind::Normal
	}
}

#[derive(Debug, Clone)]
pub struct Settings {
	pub max_loaded_chunks:       usize,
	pub max_decompressed_chunks: usize,
	pub max_light_batch:         usize,
	pub light_passes:            usize,
	pub create_if_missing:       bool,
	pub write_format:            CompressionFormat,
	/// Height of newly created flat-layout worlds. Sectioned worlds are always 256 high.
	pub height:                  usize,
	pub dimension:               DimensionKind
}

impl Default for Settings {
	fn default() -> Self {
		Settings {
			max_loaded_chunks:       2000,
			max_decompressed_chunks: 200,
			max_light_batch:         4096,
			light_passes:            14,
			create_if_missing:       false,
			write_format:            CompressionFormat::Deflate,
			height:                  128,
			dimension:               DimensionKind::Normal
		}
	}
}

impl Settings {
	pub(crate) fn validate(&self) -> Result<(), String> {
		if self.height == 0 || self.height & 1 != 0 || self.height > 256 {
			return Err(format!("height must be even and between 2 and 256, got {}", self.height));
		}

		if self.max_loaded_chunks == 0 || self.max_decompressed_chunks == 0 {
			return Err("cache capacities must be at least 1".to_string());
		}

		if self.max_light_batch == 0 {
			return Err("max_light_batch must be at least 1".to_string());
		}

		Ok(())
	}
}

/// Everything a chunk needs to know about its world to decode, encode and relight itself.
#[derive(Debug, Clone)]
pub(crate) struct ChunkContext {
	pub layout:       ChunkLayout,
	pub height:       usize,
	pub dimension:    DimensionKind,
	pub write_format: CompressionFormat,
	pub materials:    Materials,
	/// Blocks that count towards the height map.
	pub absorbing:    BitVec,
	pub costs:        [u8; 256]
}

impl ChunkContext {
	pub fn new(layout: ChunkLayout, height: usize, dimension: DimensionKind, write_format: CompressionFormat, materials: Materials) -> Self {
		ChunkContext {
			layout,
			height,
			dimension,
			write_format,
			absorbing: materials.absorbing(),
			costs: materials.cost_table(),
			materials
		}
	}
}

#[cfg(test)]
mod test {
	use super::Settings;

	#[test]
	fn test_defaults_validate() {
		assert_eq!(Settings::default().validate(), Ok(()));
	}

	#[test]
	fn test_odd_height_rejected() {
		let settings = Settings { height: 127, ..Settings::default() };

		assert!(settings.validate().is_err());
	}
}
