use super::{take_heightmap, take_level};
use crate::data::{ChunkData, Nibbles};
use crate::settings::ChunkContext;
use nbt_turbo::{Compound, CompoundWriter, Output};
use vocs::Volume;

fn packed_array(level: &mut Compound, name: &str, height: usize) -> Result<Vec<u8>, String> {
	let packed = level.take_u8_array(name).ok_or_else(|| format!("missing {} array", name))?;

	if packed.len() != height * 128 {
		return Err(format!("{} has {} bytes, expected {}", name, packed.len(), height * 128));
	}

	Ok(packed)
}

pub(super) fn decode(mut root: Compound, context: &ChunkContext) -> Result<ChunkData, String> {
	let mut level = take_level(&mut root)?;
	let height = context.height;

	let blocks = level.take_u8_array("Blocks").ok_or("missing Blocks array")?;
	let len = blocks.len();
	let blocks = Volume::from_raw(height, blocks).ok_or_else(|| format!("Blocks has {} bytes, expected {}", len, height * 256))?;

	let data = packed_array(&mut level, "Data", height)?;
	let sky_light = packed_array(&mut level, "SkyLight", height)?;
	let block_light = packed_array(&mut level, "BlockLight", height)?;
	let heightmap = take_heightmap(&mut level, &blocks, context)?;

	Ok(ChunkData {
		root,
		level,
		height,
		blocks,
		data: Nibbles::Packed(data),
		block_light: Nibbles::Packed(block_light),
		sky_light: Nibbles::Packed(sky_light),
		heightmap
	})
}

pub(super) fn encode<T: Output>(data: &ChunkData, out: T) -> T {
	let block_data = data.data.packed();
	let sky_light = data.sky_light.packed();
	let block_light = data.block_light.packed();

	CompoundWriter::write("", out, |root| {
		root.entries(&data.root).compound("Level", |level| {
			level
				.entries(&data.level)
				.u8_array("Blocks", data.blocks.raw())
				.u8_array("Data", &block_data)
				.u8_array("SkyLight", &sky_light)
				.u8_array("BlockLight", &block_light)
				.u8_array("HeightMap", &data.heightmap.to_bytes());
		});
	})
}

#[cfg(test)]
mod test {
	use crate::data::ChunkData;
	use crate::layout::ChunkLayout;
	use crate::settings::{ChunkContext, DimensionKind};
	use lumis::Materials;
	use nbt_turbo::{CompoundWriter, Tag};
	use region::CompressionFormat;
	use vocs::position::ChunkPosition;

	fn context() -> ChunkContext {
		ChunkContext::new(ChunkLayout::Flat, 16, DimensionKind::Normal, CompressionFormat::Deflate, Materials::classic())
	}

	fn parse(bytes: &[u8]) -> nbt_turbo::Compound {
		nbt_turbo::parse(bytes).unwrap().1
	}

	#[test]
	fn test_arrays_stay_packed() {
		let context = context();
		let mut data = ChunkData::empty(ChunkPosition::new(2, 3), &context);
		data.blocks_mut().set(1, 2, 3, 4);
		data.data_mut().unwrap().set(1, 2, 3, 9);
		data.update_heightmap(&context);

		let bytes = ChunkLayout::Flat.encode(&data, Vec::new()).unwrap();
		let mut decoded = ChunkLayout::Flat.decode(parse(&bytes), ChunkPosition::new(2, 3), &context).unwrap();

		assert!(decoded.is_packed());
		assert_eq!(decoded.blocks().get(1, 2, 3), 4);
		assert_eq!(decoded.heightmap().get(1, 2), 4);
		assert_eq!(decoded.level().get_i32("xPos"), Some(2));
		assert_eq!(decoded.data_mut().unwrap().get(1, 2, 3), 9);
		assert!(!decoded.data.is_packed());
	}

	#[test]
	fn test_unknown_tags_kept() {
		let context = context();
		let mut data = ChunkData::empty(ChunkPosition::new(0, 0), &context);
		data.root.insert("DataVersion", Tag::I32(100));
		data.level_mut().insert("Biomes", Tag::U8Array(vec![1; 256]));

		let bytes = ChunkLayout::Flat.encode(&data, Vec::new()).unwrap();
		let decoded = ChunkLayout::Flat.decode(parse(&bytes), ChunkPosition::new(0, 0), &context).unwrap();

		assert_eq!(decoded.root.get_i32("DataVersion"), Some(100));
		assert_eq!(decoded.level().get_u8_array("Biomes").map(|biomes| biomes.len()), Some(256));
	}

	#[test]
	fn test_wrong_height() {
		let bytes = CompoundWriter::write("", Vec::new(), |root| {
			root.compound("Level", |level| {
				level
					.i32("xPos", 0)
					.i32("zPos", 0)
					.u8_array("Blocks", &[0; 256 * 32])
					.u8_array("Data", &[0; 128 * 32])
					.u8_array("SkyLight", &[0; 128 * 32])
					.u8_array("BlockLight", &[0; 128 * 32]);
			});
		});

		assert!(ChunkLayout::Flat.decode(parse(&bytes), ChunkPosition::new(0, 0), &context()).is_err());
	}

	#[test]
	fn test_missing_level() {
		let bytes = CompoundWriter::write("", Vec::new(), |root| {
			root.i32("xPos", 0);
		});

		assert!(ChunkLayout::Flat.decode(parse(&bytes), ChunkPosition::new(0, 0), &context()).is_err());
	}

	#[test]
	fn test_missing_heightmap_computed() {
		let mut blocks = vec![0u8; 256 * 16];
		// Stone at x = 0, z = 1, y = 7
		blocks[16 + 7] = 1;

		let bytes = CompoundWriter::write("", Vec::new(), |root| {
			root.compound("Level", |level| {
				level
					.i32("xPos", 0)
					.i32("zPos", 0)
					.u8_array("Blocks", &blocks)
					.u8_array("Data", &[0; 128 * 16])
					.u8_array("SkyLight", &[0; 128 * 16])
					.u8_array("BlockLight", &[0; 128 * 16]);
			});
		});

		let decoded = ChunkLayout::Flat.decode(parse(&bytes), ChunkPosition::new(0, 0), &context()).unwrap();

		assert_eq!(decoded.heightmap().get(0, 1), 8);
	}

	#[test]
	fn test_position_must_match() {
		let context = context();
		let data = ChunkData::empty(ChunkPosition::new(5, -2), &context);
		let bytes = ChunkLayout::Flat.encode(&data, Vec::new()).unwrap();

		assert!(ChunkLayout::Flat.decode(parse(&bytes), ChunkPosition::new(5, -2), &context).is_ok());
		assert!(ChunkLayout::Flat.decode(parse(&bytes), ChunkPosition::new(0, 0), &context).is_err());
		assert!(ChunkLayout::Flat.decode(parse(&bytes), ChunkPosition::new(-2, 5), &context).is_err());
		// Same local position, different region
		assert!(ChunkLayout::Flat.decode(parse(&bytes), ChunkPosition::new(37, -2), &context).is_err());
	}

	#[test]
	fn test_missing_position() {
		let bytes = CompoundWriter::write("", Vec::new(), |root| {
			root.compound("Level", |level| {
				level
					.i32("xPos", 0)
					.u8_array("Blocks", &[0; 256 * 16])
					.u8_array("Data", &[0; 128 * 16])
					.u8_array("SkyLight", &[0; 128 * 16])
					.u8_array("BlockLight", &[0; 128 * 16]);
			});
		});

		assert!(ChunkLayout::Flat.decode(parse(&bytes), ChunkPosition::new(0, 0), &context()).is_err());
	}
}
