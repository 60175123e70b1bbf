use crate::cache::ChunkCache;
use crate::chunk::{open_data, Chunk};
use crate::data::{Channel, ChunkData};
use crate::error::{ChunkError, WorldError};
use crate::format::WorldFormat;
use crate::handle::ChunkMut;
use crate::layout::ChunkLayout;
use crate::relight::Relight;
use crate::scan::ChunkScan;
use crate::settings::{ChunkContext, DimensionKind, Settings};
use log::{debug, info, trace, warn};
use lumis::{LightChunk, Materials};
use region::{RegionError, RepairReport, StorageBackend};
use rustc_hash::FxHashMap;
use std::collections::BTreeSet;
use std::fs;
use std::mem;
use std::path::{Path, PathBuf};
use vocs::position::ChunkPosition;
use vocs::Volume;

/// Outcome of saving a batch of chunks. Failures are logged as they happen.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub struct SaveSummary {
	pub saved: usize,
	pub failed: usize
}

/// An open world directory: its chunk storage, the chunks held in memory and the settings
/// that govern both.
///
/// Memory use is bounded by the cache capacities in [`Settings`]. Whenever an operation starts,
/// the oldest decompressed chunks beyond capacity are compressed, and the oldest loaded chunks
/// beyond capacity are saved if dirty and dropped. The chunk an operation is about is never
/// evicted by that same operation.
pub struct World {
	path: PathBuf,
	format: WorldFormat,
	settings: Settings,
	storage: StorageBackend,
	context: ChunkContext,
	chunks: FxHashMap<ChunkPosition, Chunk>,
	cache: ChunkCache
}

impl World {
	/// Opens an existing world, detecting its format. A directory without any chunks yet is
	/// treated as a region world.
	pub fn open<P: AsRef<Path>>(path: P, settings: Settings, materials: Materials) -> Result<World, WorldError> {
		let path = path.as_ref();

		if !path.is_dir() {
			if settings.create_if_missing {
				return World::create(path, WorldFormat::McRegion, settings, materials);
			}

			return Err(WorldError::Missing(path.to_path_buf()));
		}

		let format = WorldFormat::detect(path).unwrap_or(WorldFormat::McRegion);

		World::with_format(path.to_path_buf(), format, settings, materials)
	}

	/// Creates the directories of a new world in the given format.
	pub fn create<P: AsRef<Path>>(path: P, format: WorldFormat, settings: Settings, materials: Materials) -> Result<World, WorldError> {
		let path = path.as_ref();

		match format {
			WorldFormat::Legacy => fs::create_dir_all(path)?,
			WorldFormat::McRegion | WorldFormat::Anvil => fs::create_dir_all(path.join("region"))?
		}

		info!("Created {:?} world at {}", format, path.display());

		World::with_format(path.to_path_buf(), format, settings, materials)
	}

	fn with_format(path: PathBuf, format: WorldFormat, settings: Settings, materials: Materials) -> Result<World, WorldError> {
		settings.validate().map_err(WorldError::Settings)?;

		let layout = format.layout();
		let height = layout.fixed_height().unwrap_or(settings.height);
		let storage = format.storage(&path);
		let write_format = storage.write_format(settings.write_format);

		info!("Opened {:?} world at {} ({} blocks high)", format, path.display(), height);

		Ok(World {
			context: ChunkContext::new(layout, height, settings.dimension, write_format, materials),
			cache: ChunkCache::new(settings.max_loaded_chunks, settings.max_decompressed_chunks),
			chunks: FxHashMap::default(),
			path,
			format,
			settings,
			storage
		})
	}

	/// Opens the `DIM<id>` world nested in this one, creating its directory if needed. It
	/// inherits this world's settings and format; dimension -1 has no sky.
	pub fn open_dimension(&self, id: i32) -> Result<World, WorldError> {
		let path = self.path.join(format!("DIM{}", id));
		let mut settings = self.settings.clone();

		if id == -1 {
			settings.dimension = DimensionKind::NoSky;
		}

		fs::create_dir_all(&path)?;

		let format = WorldFormat::detect(&path).unwrap_or(self.format);

		World::with_format(path, format, settings, self.context.materials.clone())
	}

	pub fn path(&self) -> &Path {
		&self.path
	}

	pub fn format(&self) -> WorldFormat {
		self.format
	}

	pub fn layout(&self) -> ChunkLayout {
		self.context.layout
	}

	pub fn height(&self) -> usize {
		self.context.height
	}

	pub fn dimension(&self) -> DimensionKind {
		self.context.dimension
	}

	pub fn settings(&self) -> &Settings {
		&self.settings
	}

	pub fn materials(&self) -> &Materials {
		&self.context.materials
	}

	/// Number of chunks held in memory, compressed or not.
	pub fn loaded_count(&self) -> usize {
		self.chunks.len()
	}

	pub fn decompressed_count(&self) -> usize {
		self.chunks.values().filter(|chunk| chunk.is_decompressed()).count()
	}

	pub fn is_loaded(&self, position: ChunkPosition) -> bool {
		self.chunks.contains_key(&position)
	}

	pub fn contains_chunk(&mut self, position: ChunkPosition) -> Result<bool, ChunkError> {
		if self.chunks.get(&position).map_or(false, |chunk| !chunk.is_malformed()) {
			return Ok(true);
		}

		Ok(self.storage.contains_chunk(position)?)
	}

	/// Borrows a chunk, loading it from disk if necessary.
	pub fn chunk_mut(&mut self, position: ChunkPosition) -> Result<ChunkMut<'_>, ChunkError> {
		self.sweep_malformed();
		self.load(position)?;
		self.enforce_limits(Some(position));

		self.handle(position)
	}

	/// Creates an all-air chunk and writes it out straight away.
	pub fn create_chunk(&mut self, position: ChunkPosition) -> Result<ChunkMut<'_>, ChunkError> {
		self.sweep_malformed();

		if self.contains_chunk(position)? {
			return Err(ChunkError::AlreadyExists(position));
		}

		let mut chunk = Chunk::create(position, &self.context);
		chunk.save(&mut self.storage, &self.context)?;

		debug!("Created chunk {}", position);

		self.chunks.insert(position, chunk);
		self.cache.decompressed(position);
		self.enforce_limits(Some(position));

		self.handle(position)
	}

	/// Removes a chunk from memory and from disk. Returns whether it existed.
	pub fn delete_chunk(&mut self, position: ChunkPosition) -> Result<bool, ChunkError> {
		let loaded = self.chunks.remove(&position).is_some();
		self.cache.forget(position);

		let stored = self.storage.delete_chunk(position)?;

		debug!("Deleted chunk {}", position);

		Ok(loaded || stored)
	}

	/// Every chunk in the world, on disk or in memory.
	pub fn all_chunks(&mut self) -> Result<BTreeSet<ChunkPosition>, ChunkError> {
		let mut positions = self.storage.list_all_chunks()?;

		positions.extend(self.chunks.values().filter(|chunk| !chunk.is_malformed()).map(Chunk::position));

		Ok(positions)
	}

	/// Writes a chunk if it is loaded and dirty.
	pub fn save_chunk(&mut self, position: ChunkPosition) -> Result<(), ChunkError> {
		let World { chunks, storage, context, .. } = self;

		match chunks.get_mut(&position) {
			Some(chunk) => chunk.save(storage, context),
			None => Ok(())
		}
	}

	/// Writes every dirty chunk. A chunk that fails to save stays dirty and doesn't stop the
	/// others.
	pub fn save_all(&mut self) -> SaveSummary {
		let mut dirty: Vec<ChunkPosition> = self.chunks.values().filter(|chunk| chunk.is_dirty()).map(Chunk::position).collect();
		dirty.sort();

		let mut summary = SaveSummary::default();

		for position in dirty {
			match self.save_chunk(position) {
				Ok(()) => summary.saved += 1,
				Err(e) => {
					warn!("Failed to save chunk {}: {}", position, e);
					summary.failed += 1;
				}
			}
		}

		if summary.saved > 0 || summary.failed > 0 {
			info!("Saved {} chunk(s), {} failed", summary.saved, summary.failed);
		}

		summary
	}

	/// Saves everything and lets go of all chunks and open files.
	pub fn close(mut self) -> SaveSummary {
		let summary = self.save_all();

		self.chunks.clear();
		self.cache.clear();
		self.storage.close();

		info!("Closed world at {}", self.path.display());

		summary
	}

	/// Recomputes both light channels of the given chunks and their existing neighbours, one
	/// batch per step.
	pub fn relight<I>(&mut self, positions: I) -> Relight<'_> where I: IntoIterator<Item = ChunkPosition> {
		Relight::new(self, positions.into_iter().collect())
	}

	/// Relights every loaded chunk that asked for it through [`ChunkMut::changed`].
	pub fn relight_pending(&mut self) -> Relight<'_> {
		let pending = self.chunks.values().filter(|chunk| chunk.needs_lighting()).map(Chunk::position).collect();

		Relight::new(self, pending)
	}

	/// Loads every chunk of the world once, one per step, reporting the ones that fail.
	pub fn scan_chunks(&mut self) -> Result<ChunkScan<'_>, ChunkError> {
		let positions = self.all_chunks()?.into_iter().collect();

		Ok(ChunkScan::new(self, positions))
	}

	/// Checks the allocation tables of every region file, fixing what it can.
	pub fn repair_regions(&mut self) -> Result<RepairReport, RegionError> {
		self.storage.repair_all()
	}

	fn handle(&mut self, position: ChunkPosition) -> Result<ChunkMut<'_>, ChunkError> {
		let World { chunks, cache, storage, context, .. } = self;
		let chunk = chunks.get_mut(&position).ok_or(ChunkError::NotPresent(position))?;

		Ok(ChunkMut { chunk, cache, storage, context })
	}

	fn load(&mut self, position: ChunkPosition) -> Result<&mut Chunk, ChunkError> {
		if !self.chunks.contains_key(&position) {
			let raw = match self.storage.read_chunk(position) {
				Ok(Some(raw)) => raw,
				Ok(None) => return Err(ChunkError::NotPresent(position)),
				Err(RegionError::Malformed(reason)) => return Err(ChunkError::malformed(position, reason)),
				Err(e) => return Err(e.into())
			};

			trace!("Loaded chunk {} ({} bytes)", position, raw.payload().len());

			self.chunks.insert(position, Chunk::from_raw(position, raw));
			self.cache.loaded(position);
		}

		self.chunks.get_mut(&position).ok_or(ChunkError::NotPresent(position))
	}

	fn sweep_malformed(&mut self) {
		let malformed: Vec<ChunkPosition> = self.chunks.values().filter(|chunk| chunk.is_malformed()).map(Chunk::position).collect();

		for position in malformed {
			warn!("Forgetting malformed chunk {}", position);

			self.chunks.remove(&position);
			self.cache.forget(position);
		}
	}

	fn enforce_limits(&mut self, keep: Option<ChunkPosition>) {
		for position in self.cache.excess_decompressed(keep) {
			let result = match self.chunks.get_mut(&position) {
				Some(chunk) => chunk.compress(&self.context),
				None => Ok(())
			};

			match result {
				Ok(()) => self.cache.compressed(position),
				Err(e) => warn!("Could not compress chunk {}: {}", position, e)
			}
		}

		for position in self.cache.excess_loaded(keep) {
			self.unload(position);
		}
	}

	/// Saves a chunk if dirty and drops it. A chunk that fails to save is kept.
	fn unload(&mut self, position: ChunkPosition) -> bool {
		if let Some(chunk) = self.chunks.get_mut(&position) {
			if let Err(e) = chunk.save(&mut self.storage, &self.context) {
				warn!("Keeping chunk {} in memory, saving it failed: {}", position, e);
				return false;
			}
		}

		self.chunks.remove(&position);
		self.cache.forget(position);

		trace!("Unloaded chunk {}", position);

		true
	}

	/// Forgets malformed chunks and brings the cache back within capacity.
	pub(crate) fn settle(&mut self) {
		self.sweep_malformed();
		self.enforce_limits(None);
	}

	pub(crate) fn data_mut(&mut self, position: ChunkPosition) -> Result<&mut ChunkData, ChunkError> {
		self.load(position)?;

		let World { chunks, cache, context, .. } = self;
		let chunk = chunks.get_mut(&position).ok_or(ChunkError::NotPresent(position))?;

		open_data(chunk, cache, context)
	}

	/// Resets a chunk's light to what it produces on its own and marks it dirty.
	pub(crate) fn seed_lighting(&mut self, position: ChunkPosition) -> Result<(), ChunkError> {
		self.load(position)?;

		let World { chunks, cache, context, .. } = self;
		let chunk = chunks.get_mut(&position).ok_or(ChunkError::NotPresent(position))?;

		open_data(chunk, cache, context)?
			.seed_lights(context)
			.map_err(|reason| ChunkError::malformed(position, reason))?;

		chunk.mark_dirty();

		Ok(())
	}

	/// Moves one light channel of a chunk out for propagation, leaving zeros behind until
	/// [`World::return_light`] puts it back.
	pub(crate) fn take_light(&mut self, position: ChunkPosition, channel: Channel) -> Result<LightChunk, ChunkError> {
		let height = self.context.height;
		let cost_table = self.context.costs;

		let data = self.data_mut(position)?;
		let costs = data.blocks().map(&cost_table);
		let light = data.light_mut(channel).map_err(|reason| ChunkError::malformed(position, reason))?;

		Ok(LightChunk::new(mem::replace(light, Volume::new(height)), costs))
	}

	pub(crate) fn return_light(&mut self, position: ChunkPosition, channel: Channel, light: LightChunk) {
		let changed = light.changed();

		let Some(chunk) = self.chunks.get_mut(&position) else {
			warn!("Chunk {} went away while relighting", position);
			return;
		};

		match chunk.decompressed_mut().map(|data| data.light_mut(channel)) {
			Some(Ok(target)) => *target = light.into_light(),
			_ => {
				warn!("Could not put {:?} light back into chunk {}", channel, position);
				return;
			}
		}

		if changed {
			chunk.mark_dirty();
		}
	}

	pub(crate) fn lighting_done(&mut self, position: ChunkPosition) {
		if let Some(chunk) = self.chunks.get_mut(&position) {
			chunk.lighting_done();
		}
	}
}
