use crate::sanitize::sanitize_blocks;
use crate::settings::ChunkContext;
use lumis::compute_heightmap;
use lumis::sources::{clear_sky_light, fast_sky_light, seed_block_light};
use nbt_turbo::{Compound, List, Tag};
use std::borrow::Cow;
use vocs::position::ChunkPosition;
use vocs::{HeightMap, Volume};

/// One of the two light channels of a chunk.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Channel {
	Block,
	Sky
}

/// A 4-bit field of a chunk. Flat chunks keep it packed, as it was read, until something
/// asks for the values.
#[derive(Debug, Clone)]
pub(crate) enum Nibbles {
	/// `[x][z][h / 2]`, two values per byte.
	Packed(Vec<u8>),
	Unpacked(Volume)
}

impl Nibbles {
	pub fn unpacked(&mut self, height: usize) -> Result<&mut Volume, String> {
		if let Nibbles::Packed(packed) = self {
			let volume = Volume::unpack(height, packed)
				.ok_or_else(|| format!("nibble array has {} bytes, expected {}", packed.len(), height * 128))?;

			*self = Nibbles::Unpacked(volume);
		}

		match self {
			Nibbles::Unpacked(volume) => Ok(volume),
			Nibbles::Packed(_) => Err("nibble array is still packed".to_string())
		}
	}

	pub fn pack(&mut self) {
		if let Nibbles::Unpacked(volume) = self {
			*self = Nibbles::Packed(volume.pack());
		}
	}

	pub fn is_packed(&self) -> bool {
		matches!(self, Nibbles::Packed(_))
	}

	/// The packed bytes, leaving the stored form alone.
	pub fn packed(&self) -> Cow<[u8]> {
		match self {
			Nibbles::Packed(packed) => Cow::Borrowed(packed),
			Nibbles::Unpacked(volume) => Cow::Owned(volume.pack())
		}
	}

	/// The unpacked values, leaving the stored form alone.
	pub fn volume(&self, height: usize) -> Result<Cow<Volume>, String> {
		match self {
			Nibbles::Packed(packed) => Volume::unpack(height, packed)
				.map(Cow::Owned)
				.ok_or_else(|| format!("nibble array has {} bytes, expected {}", packed.len(), height * 128)),
			Nibbles::Unpacked(volume) => Ok(Cow::Borrowed(volume))
		}
	}
}

fn compound_list<'a>(level: &'a mut Compound, name: &str) -> Result<&'a mut List, String> {
	if level.get_list(name).is_none() {
		level.insert(name, Tag::List(List::compounds()));
	}

	level.get_list_mut(name).ok_or_else(|| format!("{} is not a list", name))
}

/// The decoded contents of a chunk.
///
/// Block IDs are always held unpacked. The rest of the tag tree (entities, tile entities,
/// timestamps and anything unrecognized) stays in `level` and `root` and is written back
/// untouched.
#[derive(Debug, Clone)]
pub struct ChunkData {
	/// Entries of the root compound besides `Level`.
	pub(crate) root: Compound,
	/// The `Level` compound, minus the arrays held below.
	pub(crate) level: Compound,
	pub(crate) height: usize,
	pub(crate) blocks: Volume,
	pub(crate) data: Nibbles,
	pub(crate) block_light: Nibbles,
	pub(crate) sky_light: Nibbles,
	pub(crate) heightmap: HeightMap
}

impl ChunkData {
	/// An all-air chunk with no entities. Sky light is full unless the dimension has no sky.
	pub(crate) fn empty(position: ChunkPosition, context: &ChunkContext) -> Self {
		let height = context.height;
		let sky = if context.dimension.has_sky() { 15 } else { 0 };

		let mut level = Compound::new();
		level.insert("xPos", Tag::I32(position.x()));
		level.insert("zPos", Tag::I32(position.z()));
		level.insert("LastUpdate", Tag::I64(0));
		level.insert("TerrainPopulated", Tag::I8(1));
		level.insert("Entities", Tag::List(List::compounds()));
		level.insert("TileEntities", Tag::List(List::compounds()));

		ChunkData {
			root: Compound::new(),
			level,
			height,
			blocks: Volume::new(height),
			data: Nibbles::Unpacked(Volume::new(height)),
			block_light: Nibbles::Unpacked(Volume::new(height)),
			sky_light: Nibbles::Unpacked(Volume::filled(height, sky)),
			heightmap: HeightMap::new()
		}
	}

	pub fn height(&self) -> usize {
		self.height
	}

	pub fn blocks(&self) -> &Volume {
		&self.blocks
	}

	pub fn blocks_mut(&mut self) -> &mut Volume {
		&mut self.blocks
	}

	pub fn data_mut(&mut self) -> Result<&mut Volume, String> {
		let height = self.height;

		self.data.unpacked(height)
	}

	pub fn light_mut(&mut self, channel: Channel) -> Result<&mut Volume, String> {
		let height = self.height;

		match channel {
			Channel::Block => self.block_light.unpacked(height),
			Channel::Sky => self.sky_light.unpacked(height)
		}
	}

	pub fn heightmap(&self) -> &HeightMap {
		&self.heightmap
	}

	pub fn level(&self) -> &Compound {
		&self.level
	}

	pub fn level_mut(&mut self) -> &mut Compound {
		&mut self.level
	}

	pub fn entities_mut(&mut self) -> Result<&mut List, String> {
		compound_list(&mut self.level, "Entities")
	}

	pub fn tile_entities_mut(&mut self) -> Result<&mut List, String> {
		compound_list(&mut self.level, "TileEntities")
	}

	pub fn terrain_populated(&self) -> bool {
		self.level.get("TerrainPopulated").and_then(Tag::as_integer).map_or(false, |value| value != 0)
	}

	pub fn set_terrain_populated(&mut self, populated: bool) {
		self.level.insert("TerrainPopulated", Tag::I8(populated as i8));
	}

	/// Whether all three nibble fields are still in their packed form.
	pub fn is_packed(&self) -> bool {
		self.data.is_packed() && self.block_light.is_packed() && self.sky_light.is_packed()
	}

	pub(crate) fn update_heightmap(&mut self, context: &ChunkContext) {
		self.heightmap = compute_heightmap(&self.blocks, &context.absorbing);
	}

	/// Fills sky light from the height map alone, as if the chunk had no neighbours.
	pub(crate) fn fast_sky_light(&mut self, context: &ChunkContext) -> Result<(), String> {
		let sky = self.sky_light.unpacked(self.height)?;

		if context.dimension.has_sky() {
			let costs = self.blocks.map(&context.costs);

			fast_sky_light(&self.heightmap, &costs, sky);
		} else {
			clear_sky_light(sky);
		}

		Ok(())
	}

	/// Resets both light channels to what the chunk produces on its own, before propagation.
	pub(crate) fn seed_lights(&mut self, context: &ChunkContext) -> Result<(), String> {
		self.update_heightmap(context);
		self.fast_sky_light(context)?;
		self.block_light = Nibbles::Unpacked(seed_block_light(&self.blocks, &context.materials));

		Ok(())
	}

	pub(crate) fn sanitize(&mut self) -> usize {
		sanitize_blocks(&mut self.blocks)
	}

	pub(crate) fn pack(&mut self) {
		self.data.pack();
		self.block_light.pack();
		self.sky_light.pack();
	}
}

#[cfg(test)]
mod test {
	use super::{Channel, ChunkData, Nibbles};
	use crate::layout::ChunkLayout;
	use crate::settings::{ChunkContext, DimensionKind};
	use lumis::Materials;
	use region::CompressionFormat;
	use vocs::position::ChunkPosition;
	use vocs::Volume;

	fn context(dimension: DimensionKind) -> ChunkContext {
		ChunkContext::new(ChunkLayout::Flat, 16, dimension, CompressionFormat::Deflate, Materials::classic())
	}

	#[test]
	fn test_empty_chunk() {
		let data = ChunkData::empty(ChunkPosition::new(4, -9), &context(DimensionKind::Normal));

		assert_eq!(data.level().get_i32("xPos"), Some(4));
		assert_eq!(data.level().get_i32("zPos"), Some(-9));
		assert!(data.terrain_populated());
		assert!(data.blocks().raw().iter().all(|&block| block == 0));
		assert_eq!(data.heightmap().get(0, 0), 0);
	}

	#[test]
	fn test_empty_chunk_without_sky() {
		let mut data = ChunkData::empty(ChunkPosition::new(0, 0), &context(DimensionKind::NoSky));

		assert!(data.light_mut(Channel::Sky).unwrap().raw().iter().all(|&light| light == 0));
	}

	#[test]
	fn test_lazy_unpack() {
		let mut packed = vec![0u8; 16 * 128];
		packed[0] = 0x5A;

		let mut nibbles = Nibbles::Packed(packed.clone());

		assert_eq!(nibbles.volume(16).unwrap().get(0, 0, 1), 5);
		assert!(nibbles.is_packed());

		assert_eq!(nibbles.unpacked(16).unwrap().get(0, 0, 0), 0xA);
		assert!(!nibbles.is_packed());

		nibbles.pack();
		assert_eq!(nibbles.packed().as_ref(), &packed[..]);
	}

	#[test]
	fn test_wrong_nibble_length() {
		let mut nibbles = Nibbles::Packed(vec![0; 100]);

		assert!(nibbles.unpacked(16).is_err());
	}

	#[test]
	fn test_entity_lists_created_on_demand() {
		let mut data = ChunkData::empty(ChunkPosition::new(0, 0), &context(DimensionKind::Normal));

		data.level_mut().remove("TileEntities");
		assert!(data.tile_entities_mut().unwrap().is_empty());
		assert!(data.level().get_list("TileEntities").is_some());
	}

	#[test]
	fn test_seed_lights() {
		let context = context(DimensionKind::Normal);
		let mut data = ChunkData::empty(ChunkPosition::new(0, 0), &context);

		// Stone floor with a torch on it
		for x in 0..16 {
			for z in 0..16 {
				data.blocks_mut().set(x, z, 3, 1);
			}
		}
		data.blocks_mut().set(8, 8, 4, 50);

		data.seed_lights(&context).unwrap();

		assert_eq!(data.heightmap().get(0, 0), 4);
		assert_eq!(data.light_mut(Channel::Block).unwrap().get(8, 8, 4), 14);
		assert_eq!(data.light_mut(Channel::Block).unwrap().get(8, 8, 5), 0);

		let sky: &Volume = data.light_mut(Channel::Sky).unwrap();
		assert_eq!(sky.get(0, 0, 4), 15);
		assert_eq!(sky.get(0, 0, 2), 0);
	}
}
