use super::{take_heightmap, take_level};
use crate::data::{ChunkData, Nibbles};
use crate::settings::ChunkContext;
use log::debug;
use nbt_turbo::{Compound, CompoundWriter, Output, Tag};
use vocs::nibbles::{get_packed, set_packed, u4};
use vocs::{Volume, CHUNK_WIDTH};

pub const SECTION_HEIGHT: usize = 16;
pub const SECTION_COUNT: usize = 16;

const SECTION_VOLUME: usize = CHUNK_WIDTH * CHUNK_WIDTH * SECTION_HEIGHT;

/// Index of a voxel within a section. X varies fastest, then Z, then Y.
fn yzx(x: usize, y: usize, z: usize) -> usize {
	(y * CHUNK_WIDTH + z) * CHUNK_WIDTH + x
}

/// The four voxel fields of a whole column, unpacked.
struct ColumnVolumes {
	blocks: Volume,
	data: Volume,
	block_light: Volume,
	sky_light: Volume
}

/// One 16-high slice of a sectioned chunk, in its on-disk form.
#[derive(Clone)]
pub struct Section {
	pub y: i8,
	pub blocks: Box<[u8; SECTION_VOLUME]>,
	pub data: Box<[u8; SECTION_VOLUME / 2]>,
	pub block_light: Box<[u8; SECTION_VOLUME / 2]>,
	pub sky_light: Box<[u8; SECTION_VOLUME / 2]>
}

impl Section {
	fn empty(y: i8) -> Self {
		Section {
			y,
			blocks: Box::new([0; SECTION_VOLUME]),
			data: Box::new([0; SECTION_VOLUME / 2]),
			block_light: Box::new([0; SECTION_VOLUME / 2]),
			sky_light: Box::new([0; SECTION_VOLUME / 2])
		}
	}

	/// Cuts section `y` out of a column.
	fn extract(y: usize, column: &ColumnVolumes) -> Self {
		let mut section = Section::empty(y as i8);
		let base = y * SECTION_HEIGHT;

		for x in 0..CHUNK_WIDTH {
			for z in 0..CHUNK_WIDTH {
				let range = base..base + SECTION_HEIGHT;

				let blocks = &column.blocks.column(x, z)[range.clone()];
				let data = &column.data.column(x, z)[range.clone()];
				let block_light = &column.block_light.column(x, z)[range.clone()];
				let sky_light = &column.sky_light.column(x, z)[range];

				for dy in 0..SECTION_HEIGHT {
					let index = yzx(x, dy, z);

					section.blocks[index] = blocks[dy];
					set_packed(&mut section.data[..], index, u4::new(data[dy]));
					set_packed(&mut section.block_light[..], index, u4::new(block_light[dy]));
					set_packed(&mut section.sky_light[..], index, u4::new(sky_light[dy]));
				}
			}
		}

		section
	}

	/// Copies the section into its place in a column.
	fn insert_into(&self, column: &mut ColumnVolumes) {
		let base = self.y as usize * SECTION_HEIGHT;

		for x in 0..CHUNK_WIDTH {
			for z in 0..CHUNK_WIDTH {
				for dy in 0..SECTION_HEIGHT {
					let index = yzx(x, dy, z);
					let y = base + dy;

					column.blocks.set(x, z, y, self.blocks[index]);
					column.data.set(x, z, y, get_packed(&self.data[..], index).raw());
					column.block_light.set(x, z, y, get_packed(&self.block_light[..], index).raw());
					column.sky_light.set(x, z, y, get_packed(&self.sky_light[..], index).raw());
				}
			}
		}
	}

	/// A section with nothing in it decodes the same whether or not it was written.
	pub fn is_empty(&self) -> bool {
		self.blocks.iter().all(|&value| value == 0)
			&& self.data.iter().all(|&value| value == 0)
			&& self.block_light.iter().all(|&value| value == 0)
			&& self.sky_light.iter().all(|&value| value == 0)
	}

	pub fn read(compound: &Compound) -> Result<Self, String> {
		let y = compound.get_i8("Y").ok_or("section without a Y index")?;
		let mut section = Section::empty(y);

		if compound.get_u8_array("Add").map_or(false, |add| add.iter().any(|&value| value != 0)) {
			return Err(format!("section {} uses block IDs above 255", y));
		}

		match compound.get_u8_array("Blocks") {
			Some(blocks) if blocks.len() == SECTION_VOLUME => section.blocks.copy_from_slice(blocks),
			Some(blocks) => return Err(format!("section {} has {} block IDs, expected {}", y, blocks.len(), SECTION_VOLUME)),
			None => return Err(format!("section {} has no Blocks array", y))
		}

		// Absent nibble arrays read as zero
		for (name, target) in [("Data", &mut section.data), ("BlockLight", &mut section.block_light), ("SkyLight", &mut section.sky_light)] {
			match compound.get_u8_array(name) {
				Some(packed) if packed.len() == SECTION_VOLUME / 2 => target.copy_from_slice(packed),
				Some(packed) => return Err(format!("section {} has a {}-byte {} array", y, packed.len(), name)),
				None => ()
			}
		}

		Ok(section)
	}

	pub fn write(&self, writer: &mut CompoundWriter<impl Output>) {
		writer
			.i8("Y", self.y)
			.u8_array("Blocks", &self.blocks[..])
			.u8_array("Data", &self.data[..])
			.u8_array("BlockLight", &self.block_light[..])
			.u8_array("SkyLight", &self.sky_light[..]);
	}
}

pub(super) fn decode(mut root: Compound, context: &ChunkContext) -> Result<ChunkData, String> {
	let height = SECTION_HEIGHT * SECTION_COUNT;

	if context.height != height {
		return Err(format!("sectioned chunks are {} high, the world expects {}", height, context.height));
	}

	let mut level = take_level(&mut root)?;

	let mut column = ColumnVolumes {
		blocks: Volume::new(height),
		data: Volume::new(height),
		block_light: Volume::new(height),
		sky_light: Volume::new(height)
	};

	if let Some(Tag::List(sections)) = level.remove("Sections") {
		for compound in sections.iter_compounds() {
			let section = Section::read(compound)?;

			if section.y < 0 || section.y as usize >= SECTION_COUNT {
				debug!("Ignoring section {} outside of the column", section.y);
				continue;
			}

			section.insert_into(&mut column);
		}
	}

	let heightmap = take_heightmap(&mut level, &column.blocks, context)?;

	Ok(ChunkData {
		root,
		level,
		height,
		blocks: column.blocks,
		data: Nibbles::Unpacked(column.data),
		block_light: Nibbles::Unpacked(column.block_light),
		sky_light: Nibbles::Unpacked(column.sky_light),
		heightmap
	})
}

pub(super) fn encode<T: Output>(data: &ChunkData, out: T) -> Result<T, String> {
	let height = data.height;

	let column = ColumnVolumes {
		blocks: data.blocks.clone(),
		data: data.data.volume(height)?.into_owned(),
		block_light: data.block_light.volume(height)?.into_owned(),
		sky_light: data.sky_light.volume(height)?.into_owned()
	};

	let sections: Vec<Section> = (0..height / SECTION_HEIGHT)
		.map(|y| Section::extract(y, &column))
		.filter(|section| !section.is_empty())
		.collect();

	let heightmap = data.heightmap.as_inner();

	Ok(CompoundWriter::write("", out, |root| {
		root.entries(&data.root).compound("Level", |level| {
			level
				.entries(&data.level)
				.u32_array("HeightMap", &heightmap[..])
				.compound_array("Sections", sections.len(), |writer| {
					for section in &sections {
						writer.compound(|writer| {
							section.write(writer);
						});
					}
				});
		});
	}))
}
