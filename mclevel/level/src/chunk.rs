use crate::cache::ChunkCache;
use crate::data::ChunkData;
use crate::error::ChunkError;
use crate::settings::ChunkContext;
use log::{debug, trace};
use region::{ChunkOutput, RawChunk, RegionError, StorageBackend};
use vocs::position::ChunkPosition;

/// What form a loaded chunk is held in.
pub enum ChunkState {
	/// The compressed payload, exactly as it would be written.
	Compressed(RawChunk),
	Decompressed(Box<ChunkData>)
}

/// A chunk held in memory by a world.
pub struct Chunk {
	position: ChunkPosition,
	state: ChunkState,
	dirty: bool,
	needs_lighting: bool,
	/// Set when decoding failed. The world forgets such chunks at its next entry point.
	malformed: bool
}

impl Chunk {
	/// A chunk just read from disk. Nothing is decoded until something asks for the contents.
	pub(crate) fn from_raw(position: ChunkPosition, raw: RawChunk) -> Self {
		Chunk { position, state: ChunkState::Compressed(raw), dirty: false, needs_lighting: false, malformed: false }
	}

	/// A new all-air chunk. It has never been written, so it starts out dirty.
	pub(crate) fn create(position: ChunkPosition, context: &ChunkContext) -> Self {
		Chunk {
			position,
			state: ChunkState::Decompressed(Box::new(ChunkData::empty(position, context))),
			dirty: true,
			needs_lighting: false,
			malformed: false
		}
	}

	pub fn position(&self) -> ChunkPosition {
		self.position
	}

	pub fn state(&self) -> &ChunkState {
		&self.state
	}

	pub fn is_dirty(&self) -> bool {
		self.dirty
	}

	pub fn needs_lighting(&self) -> bool {
		self.needs_lighting
	}

	pub fn is_decompressed(&self) -> bool {
		matches!(self.state, ChunkState::Decompressed(_))
	}

	pub fn is_malformed(&self) -> bool {
		self.malformed
	}

	pub(crate) fn mark_dirty(&mut self) {
		self.dirty = true;
	}

	pub(crate) fn lighting_done(&mut self) {
		self.needs_lighting = false;
	}

	/// The decoded contents, if the chunk is currently decompressed.
	pub(crate) fn decompressed_mut(&mut self) -> Option<&mut ChunkData> {
		match &mut self.state {
			ChunkState::Decompressed(data) => Some(data),
			ChunkState::Compressed(_) => None
		}
	}

	/// Decodes the chunk if it isn't already. A chunk that fails to decode is flagged as
	/// malformed and left compressed.
	pub(crate) fn decompress(&mut self, context: &ChunkContext) -> Result<&mut ChunkData, ChunkError> {
		if let ChunkState::Compressed(raw) = &self.state {
			let decoded = match raw.parse() {
				Ok(root) => context.layout.decode(root, self.position, context),
				Err(e @ RegionError::Io(_)) => return Err(e.into()),
				Err(e) => Err(e.to_string())
			};

			match decoded {
				Ok(data) => {
					trace!("Decompressed chunk {}", self.position);
					self.state = ChunkState::Decompressed(Box::new(data));
				},
				Err(reason) => {
					self.malformed = true;
					return Err(ChunkError::malformed(self.position, reason));
				}
			}
		}

		self.decompressed_mut().ok_or(ChunkError::NotPresent(self.position))
	}

	/// Sanitizes and encodes the decoded contents, without changing state.
	fn encode(data: &mut ChunkData, position: ChunkPosition, context: &ChunkContext) -> Result<RawChunk, ChunkError> {
		let fixed = data.sanitize();

		if fixed > 0 {
			debug!("Sanitized {} block(s) in chunk {}", fixed, position);
		}

		let out = context.layout
			.encode(data, ChunkOutput::new(context.write_format))
			.map_err(|reason| ChunkError::malformed(position, reason))?;

		let payload = out.finish().map_err(RegionError::from)?;

		Ok(RawChunk::new(context.write_format, payload))
	}

	/// Drops the decoded form, keeping only the compressed payload. Packs the nibble arrays
	/// first so they are written in their on-disk form.
	pub(crate) fn compress(&mut self, context: &ChunkContext) -> Result<(), ChunkError> {
		if let ChunkState::Decompressed(data) = &mut self.state {
			data.pack();

			let raw = Chunk::encode(data, self.position, context)?;

			trace!("Compressed chunk {} to {} bytes", self.position, raw.payload().len());
			self.state = ChunkState::Compressed(raw);
		}

		Ok(())
	}

	/// Writes the chunk if it has unsaved changes. The chunk stays dirty if the write fails.
	pub(crate) fn save(&mut self, storage: &mut StorageBackend, context: &ChunkContext) -> Result<(), ChunkError> {
		if !self.dirty {
			return Ok(());
		}

		match &mut self.state {
			ChunkState::Decompressed(data) => {
				if context.layout.fixed_height().is_none() {
					data.pack();
				}

				let raw = Chunk::encode(data, self.position, context)?;

				storage.write_chunk(self.position, raw.payload(), context.write_format)?;
			},
			ChunkState::Compressed(raw) => {
				storage.write_chunk(self.position, raw.payload(), raw.format()?)?;
			}
		}

		debug!("Saved chunk {}", self.position);
		self.dirty = false;

		Ok(())
	}

	/// Recomputes the height map after the blocks changed, and the sky light too if asked.
	/// The chunk is left needing a full relight either way once `relight` was requested.
	pub(crate) fn changed(&mut self, relight: bool, context: &ChunkContext) -> Result<(), ChunkError> {
		let position = self.position;
		let data = self.decompress(context)?;

		data.update_heightmap(context);

		if relight {
			data.fast_sky_light(context).map_err(|reason| ChunkError::malformed(position, reason))?;
		}

		self.dirty = true;
		self.needs_lighting |= relight;

		Ok(())
	}
}

/// Decompresses a chunk, recording it in the decompressed queue the first time.
pub(crate) fn open_data<'c>(chunk: &'c mut Chunk, cache: &mut ChunkCache, context: &ChunkContext) -> Result<&'c mut ChunkData, ChunkError> {
	let position = chunk.position();
	let newly = !chunk.is_decompressed();
	let data = chunk.decompress(context)?;

	if newly {
		cache.decompressed(position);
	}

	Ok(data)
}

#[cfg(test)]
mod test {
	use super::Chunk;
	use crate::error::ChunkError;
	use crate::layout::ChunkLayout;
	use crate::sanitize::{DIRT, GRASS};
	use crate::settings::{ChunkContext, DimensionKind};
	use lumis::Materials;
	use region::{CompressionFormat, RawChunk};
	use vocs::position::ChunkPosition;

	fn context() -> ChunkContext {
		ChunkContext::new(ChunkLayout::Flat, 16, DimensionKind::Normal, CompressionFormat::Deflate, Materials::classic())
	}

	#[test]
	fn test_compress_then_decompress() {
		let context = context();
		let position = ChunkPosition::new(5, 5);
		let mut chunk = Chunk::create(position, &context);

		chunk.decompress(&context).unwrap().blocks_mut().set(0, 0, 0, 1);
		chunk.compress(&context).unwrap();

		assert!(!chunk.is_decompressed());
		assert!(chunk.is_dirty());

		let data = chunk.decompress(&context).unwrap();

		assert_eq!(data.blocks().get(0, 0, 0), 1);
		assert!(data.is_packed());
	}

	#[test]
	fn test_compress_sanitizes() {
		let context = context();
		let mut chunk = Chunk::create(ChunkPosition::new(0, 0), &context);

		{
			let blocks = chunk.decompress(&context).unwrap().blocks_mut();
			blocks.set(1, 1, 4, GRASS);
			blocks.set(1, 1, 5, GRASS);
		}

		chunk.compress(&context).unwrap();

		let data = chunk.decompress(&context).unwrap();
		assert_eq!(data.blocks().get(1, 1, 4), DIRT);
		assert_eq!(data.blocks().get(1, 1, 5), GRASS);
	}

	#[test]
	fn test_garbage_is_malformed() {
		let context = context();
		let position = ChunkPosition::new(1, 1);
		let mut chunk = Chunk::from_raw(position, RawChunk::new(CompressionFormat::Deflate, vec![1, 2, 3]));

		match chunk.decompress(&context) {
			Err(ChunkError::Malformed { position: reported, .. }) => assert_eq!(reported, position),
			Err(other) => panic!("expected a malformed chunk, got {}", other),
			Ok(_) => panic!("garbage decoded as a chunk")
		}

		assert!(chunk.is_malformed());
	}

	#[test]
	fn test_changed() {
		let context = context();
		let mut chunk = Chunk::create(ChunkPosition::new(0, 0), &context);

		chunk.decompress(&context).unwrap().blocks_mut().set(2, 3, 5, 1);
		chunk.changed(false, &context).unwrap();

		assert!(chunk.is_dirty());
		assert!(!chunk.needs_lighting());
		assert_eq!(chunk.decompress(&context).unwrap().heightmap().get(2, 3), 6);

		chunk.changed(true, &context).unwrap();
		assert!(chunk.needs_lighting());

		// A later change without relighting doesn't clear the request
		chunk.changed(false, &context).unwrap();
		assert!(chunk.needs_lighting());
	}
}
