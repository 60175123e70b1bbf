use crate::data::Channel;
use crate::world::World;
use log::{debug, info, warn};
use lumis::{split_batches, LightChunk, LightSource, Propagation};
use std::collections::{BTreeSet, VecDeque};
use std::iter;
use vocs::position::ChunkPosition;

/// How far a long-running operation has come.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct Progress {
	pub done: usize,
	pub total: usize
}

/// Lends chunks outside the batch to the propagation, straight out of the world.
struct WorldSource<'a> {
	world: &'a mut World,
	channel: Channel
}

impl LightSource for WorldSource<'_> {
	fn fetch(&mut self, position: ChunkPosition) -> Option<LightChunk> {
		match self.world.contains_chunk(position) {
			Ok(true) => (),
			Ok(false) => return None,
			Err(e) => {
				warn!("Treating chunk {} as missing while relighting: {}", position, e);
				return None;
			}
		}

		match self.world.take_light(position, self.channel) {
			Ok(chunk) => Some(chunk),
			Err(e) => {
				warn!("Treating chunk {} as missing while relighting: {}", position, e);
				None
			}
		}
	}
}

/// A relight in progress. Each step lights one batch and reports how many of the requested
/// chunks are done.
///
/// Requested chunks are grouped into spatially compact batches of at most
/// [`Settings::max_light_batch`](crate::Settings::max_light_batch) chunks. Within a batch,
/// every chunk and each existing neighbour has its light reset to what it produces on its own,
/// then both channels are spread until they settle. Light that reaches chunks beyond the
/// neighbours is written into them as well. Chunks whose light changed are left dirty.
pub struct Relight<'w> {
	world: &'w mut World,
	batches: VecDeque<Vec<ChunkPosition>>,
	total: usize,
	done: usize
}

impl<'w> Relight<'w> {
	pub(crate) fn new(world: &'w mut World, positions: Vec<ChunkPosition>) -> Self {
		let positions: Vec<ChunkPosition> = positions.into_iter().collect::<BTreeSet<_>>().into_iter().collect();
		let total = positions.len();
		let batches = split_batches(positions, world.settings().max_light_batch).into();

		Relight { world, batches, total, done: 0 }
	}

	pub fn total(&self) -> usize {
		self.total
	}

	/// Runs every remaining step.
	pub fn finish(mut self) -> Progress {
		let mut progress = Progress { done: self.done, total: self.total };

		for step in &mut self {
			progress = step;
		}

		progress
	}
}

impl Iterator for Relight<'_> {
	type Item = Progress;

	fn next(&mut self) -> Option<Progress> {
		let batch = self.batches.pop_front()?;

		light_batch(self.world, &batch);
		self.done += batch.len();

		if self.batches.is_empty() {
			info!("Relit {} chunk(s)", self.total);
		}

		Some(Progress { done: self.done, total: self.total })
	}
}

fn light_batch(world: &mut World, batch: &[ChunkPosition]) {
	let mut working = BTreeSet::new();

	for &position in batch {
		for candidate in iter::once(position).chain(position.neighbors()) {
			match world.contains_chunk(candidate) {
				Ok(true) => {
					working.insert(candidate);
				},
				Ok(false) => (),
				Err(e) => warn!("Skipping chunk {} while relighting: {}", candidate, e)
			}
		}
	}

	let mut seeded = Vec::with_capacity(working.len());

	for position in working {
		match world.seed_lighting(position) {
			Ok(()) => seeded.push(position),
			Err(e) => warn!("Skipping chunk {} while relighting: {}", position, e)
		}
	}

	let channels: &[Channel] = if world.dimension().has_sky() { &[Channel::Block, Channel::Sky] } else { &[Channel::Block] };

	for &channel in channels {
		let mut propagation = Propagation::new(world.height(), world.settings().light_passes);

		for &position in &seeded {
			match world.take_light(position, channel) {
				Ok(chunk) => propagation.insert(position, chunk),
				Err(e) => warn!("Skipping chunk {} while relighting: {}", position, e)
			}
		}

		propagation.run(&mut WorldSource { world: &mut *world, channel });

		debug!("{:?} light of {} chunk(s) settled after {} pass(es)", channel, seeded.len(), propagation.passes());

		for (position, chunk) in propagation.into_chunks() {
			world.return_light(position, channel, chunk);
		}
	}

	for &position in &seeded {
		world.lighting_done(position);
	}

	world.settle();
}

#[cfg(test)]
mod test {
	use crate::format::WorldFormat;
	use crate::settings::Settings;
	use crate::world::World;
	use lumis::Materials;
	use tempfile::TempDir;
	use vocs::position::ChunkPosition;

	const TORCH: u8 = 50;

	fn settings() -> Settings {
		Settings { height: 16, ..Settings::default() }
	}

	#[test]
	fn test_torch_crosses_chunks() {
		let dir = TempDir::new().unwrap();
		let mut world = World::create(dir.path(), WorldFormat::McRegion, settings(), Materials::classic()).unwrap();

		world.create_chunk(ChunkPosition::new(0, 0)).unwrap();
		world.create_chunk(ChunkPosition::new(1, 0)).unwrap();

		{
			let mut chunk = world.chunk_mut(ChunkPosition::new(0, 0)).unwrap();
			chunk.blocks_mut().unwrap().set(15, 8, 8, TORCH);
			chunk.changed(true).unwrap();
		}

		let progress = world.relight_pending().finish();
		assert_eq!(progress.done, 1);
		assert_eq!(progress.total, 1);

		let mut west = world.chunk_mut(ChunkPosition::new(0, 0)).unwrap();
		assert!(!west.needs_lighting());
		assert_eq!(west.block_light_mut().unwrap().get(15, 8, 8), 14);
		assert_eq!(west.block_light_mut().unwrap().get(14, 8, 8), 13);

		let mut east = world.chunk_mut(ChunkPosition::new(1, 0)).unwrap();
		assert!(east.is_dirty());
		assert_eq!(east.block_light_mut().unwrap().get(0, 8, 8), 13);
		assert_eq!(east.block_light_mut().unwrap().get(3, 8, 8), 10);
	}

	#[test]
	fn test_sky_under_overhang() {
		let dir = TempDir::new().unwrap();
		let mut world = World::create(dir.path(), WorldFormat::McRegion, settings(), Materials::classic()).unwrap();
		let position = ChunkPosition::new(0, 0);

		{
			let mut chunk = world.create_chunk(position).unwrap();
			let blocks = chunk.blocks_mut().unwrap();

			// A stone roof at y = 10 over x < 8
			for x in 0..8 {
				for z in 0..16 {
					blocks.set(x, z, 10, 1);
				}
			}

			chunk.changed(true).unwrap();
		}

		world.relight(vec![position]).finish();

		let mut chunk = world.chunk_mut(position).unwrap();
		let sky = chunk.sky_light_mut().unwrap();

		assert_eq!(sky.get(10, 4, 5), 15);
		assert_eq!(sky.get(8, 4, 5), 15);
		// Light creeps in sideways under the roof
		assert_eq!(sky.get(7, 4, 5), 14);
		assert_eq!(sky.get(5, 4, 5), 12);
	}

	#[test]
	fn test_batches_report_progress() {
		let dir = TempDir::new().unwrap();
		let settings = Settings { max_light_batch: 4, ..settings() };
		let mut world = World::create(dir.path(), WorldFormat::McRegion, settings, Materials::classic()).unwrap();

		let positions: Vec<ChunkPosition> = (0..4).flat_map(|x| (0..4).map(move |z| ChunkPosition::new(x, z))).collect();

		for &position in &positions {
			world.create_chunk(position).unwrap();
		}

		let steps: Vec<_> = world.relight(positions).collect();

		assert_eq!(steps.len(), 4);
		assert_eq!(steps.last().map(|step| (step.done, step.total)), Some((16, 16)));
	}
}
