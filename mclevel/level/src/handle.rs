use crate::cache::ChunkCache;
use crate::chunk::{open_data, Chunk};
use crate::data::{Channel, ChunkData};
use crate::error::ChunkError;
use crate::settings::ChunkContext;
use nbt_turbo::{Compound, List};
use region::StorageBackend;
use vocs::position::ChunkPosition;
use vocs::{HeightMap, Volume};

/// Mutable access to one chunk of a world, borrowed from [`World::chunk_mut`].
///
/// The contents are decoded on first access. Changing blocks doesn't mark the chunk dirty by
/// itself: call [`ChunkMut::changed`] once done so the height map and lighting follow.
///
/// [`World::chunk_mut`]: crate::World::chunk_mut
pub struct ChunkMut<'w> {
	pub(crate) chunk: &'w mut Chunk,
	pub(crate) cache: &'w mut ChunkCache,
	pub(crate) storage: &'w mut StorageBackend,
	pub(crate) context: &'w ChunkContext
}

impl<'w> ChunkMut<'w> {
	pub fn position(&self) -> ChunkPosition {
		self.chunk.position()
	}

	pub fn height(&self) -> usize {
		self.context.height
	}

	pub fn is_dirty(&self) -> bool {
		self.chunk.is_dirty()
	}

	pub fn needs_lighting(&self) -> bool {
		self.chunk.needs_lighting()
	}

	pub fn is_decompressed(&self) -> bool {
		self.chunk.is_decompressed()
	}

	/// The decoded chunk. Fails with [`ChunkError::Malformed`] if it can't be decoded.
	pub fn data(&mut self) -> Result<&mut ChunkData, ChunkError> {
		open_data(self.chunk, self.cache, self.context)
	}

	fn with<T, F>(&mut self, access: F) -> Result<T, ChunkError> where F: FnOnce(&mut ChunkData) -> Result<T, String> {
		let position = self.position();

		access(self.data()?).map_err(|reason| ChunkError::malformed(position, reason))
	}

	pub fn blocks(&mut self) -> Result<&Volume, ChunkError> {
		Ok(self.data()?.blocks())
	}

	pub fn blocks_mut(&mut self) -> Result<&mut Volume, ChunkError> {
		Ok(self.data()?.blocks_mut())
	}

	pub fn data_mut(&mut self) -> Result<&mut Volume, ChunkError> {
		let position = self.position();

		self.data()?.data_mut().map_err(|reason| ChunkError::malformed(position, reason))
	}

	pub fn block_light_mut(&mut self) -> Result<&mut Volume, ChunkError> {
		self.light_mut(Channel::Block)
	}

	pub fn sky_light_mut(&mut self) -> Result<&mut Volume, ChunkError> {
		self.light_mut(Channel::Sky)
	}

	pub fn light_mut(&mut self, channel: Channel) -> Result<&mut Volume, ChunkError> {
		let position = self.position();

		self.data()?.light_mut(channel).map_err(|reason| ChunkError::malformed(position, reason))
	}

	pub fn heightmap(&mut self) -> Result<&HeightMap, ChunkError> {
		Ok(self.data()?.heightmap())
	}

	pub fn level_mut(&mut self) -> Result<&mut Compound, ChunkError> {
		Ok(self.data()?.level_mut())
	}

	pub fn entities_mut(&mut self) -> Result<&mut List, ChunkError> {
		let position = self.position();

		self.data()?.entities_mut().map_err(|reason| ChunkError::malformed(position, reason))
	}

	pub fn tile_entities_mut(&mut self) -> Result<&mut List, ChunkError> {
		let position = self.position();

		self.data()?.tile_entities_mut().map_err(|reason| ChunkError::malformed(position, reason))
	}

	pub fn terrain_populated(&mut self) -> Result<bool, ChunkError> {
		self.with(|data| Ok(data.terrain_populated()))
	}

	pub fn set_terrain_populated(&mut self, populated: bool) -> Result<(), ChunkError> {
		self.with(|data| {
			data.set_terrain_populated(populated);
			Ok(())
		})?;

		self.chunk.mark_dirty();

		Ok(())
	}

	/// Marks the chunk dirty and recomputes its height map. With `relight`, sky light is
	/// refilled from the new height map and the chunk joins the next relight.
	pub fn changed(&mut self, relight: bool) -> Result<(), ChunkError> {
		let newly = !self.chunk.is_decompressed();

		self.chunk.changed(relight, self.context)?;

		if newly {
			self.cache.decompressed(self.chunk.position());
		}

		Ok(())
	}

	/// Writes the chunk now if it is dirty.
	pub fn save(&mut self) -> Result<(), ChunkError> {
		self.chunk.save(self.storage, self.context)
	}
}
