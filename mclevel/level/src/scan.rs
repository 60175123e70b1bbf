use crate::relight::Progress;
use crate::world::World;
use log::{info, warn};
use std::vec;
use vocs::position::ChunkPosition;

/// Loads every chunk of a world once, one chunk per step. Chunks that fail to load are
/// skipped, forgotten and listed in [`ChunkScan::failed`].
pub struct ChunkScan<'w> {
	world: &'w mut World,
	positions: vec::IntoIter<ChunkPosition>,
	total: usize,
	done: usize,
	failed: Vec<ChunkPosition>
}

impl<'w> ChunkScan<'w> {
	pub(crate) fn new(world: &'w mut World, positions: Vec<ChunkPosition>) -> Self {
		ChunkScan { world, total: positions.len(), positions: positions.into_iter(), done: 0, failed: Vec::new() }
	}

	pub fn failed(&self) -> &[ChunkPosition] {
		&self.failed
	}

	/// Runs every remaining step, returning the chunks that failed to load.
	pub fn finish(mut self) -> Vec<ChunkPosition> {
		for _ in &mut self {}

		self.failed
	}
}

impl Iterator for ChunkScan<'_> {
	type Item = Progress;

	fn next(&mut self) -> Option<Progress> {
		let position = self.positions.next()?;

		if let Err(e) = self.world.data_mut(position) {
			warn!("Chunk {} failed to load: {}", position, e);
			self.failed.push(position);
		}

		self.world.settle();
		self.done += 1;

		if self.done == self.total {
			info!("Scanned {} chunk(s), {} failed", self.total, self.failed.len());
		}

		Some(Progress { done: self.done, total: self.total })
	}
}

#[cfg(test)]
mod test {
	use crate::format::WorldFormat;
	use crate::settings::Settings;
	use crate::world::World;
	use lumis::Materials;
	use region::{CompressionFormat, RegionDirectory};
	use tempfile::TempDir;
	use vocs::position::ChunkPosition;

	#[test]
	fn test_scan_skips_broken_chunks() {
		let dir = TempDir::new().unwrap();
		let settings = Settings { height: 16, max_loaded_chunks: 2, max_decompressed_chunks: 1, ..Settings::default() };

		{
			let mut world = World::create(dir.path(), WorldFormat::McRegion, settings.clone(), Materials::classic()).unwrap();

			for x in 0..5 {
				world.create_chunk(ChunkPosition::new(x, 0)).unwrap();
			}

			world.close();
		}

		let broken = ChunkPosition::new(3, 0);
		let mut regions = RegionDirectory::new(dir.path().join("region"), "mcr");
		regions.write_chunk(broken, b"not a chunk", CompressionFormat::Gzip).unwrap();
		regions.close();

		let mut world = World::open(dir.path(), settings, Materials::classic()).unwrap();
		let mut scan = world.scan_chunks().unwrap();

		let steps: Vec<_> = (&mut scan).collect();

		assert_eq!(steps.len(), 5);
		assert_eq!(steps.last().map(|step| step.done), Some(5));
		assert_eq!(scan.failed(), &[broken][..]);

		drop(scan);

		assert!(world.loaded_count() <= 2);
		assert!(!world.is_loaded(broken));
	}
}
