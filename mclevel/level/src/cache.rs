use lru::LruCache;
use vocs::position::ChunkPosition;

/// Tracks which chunks a world holds in memory, and in what form, in the order they arrived.
///
/// Two queues: one of every loaded chunk and one of the chunks currently decompressed. Both are
/// first in, first out; touching a chunk again does not move it back. The cache only decides
/// which chunks have to go. The world does the compressing, saving and dropping.
pub struct ChunkCache {
	loaded: LruCache<ChunkPosition, ()>,
	decompressed: LruCache<ChunkPosition, ()>,
	max_loaded: usize,
	max_decompressed: usize
}

impl ChunkCache {
	pub fn new(max_loaded: usize, max_decompressed: usize) -> Self {
		ChunkCache {
			loaded: LruCache::unbounded(),
			decompressed: LruCache::unbounded(),
			max_loaded: max_loaded.max(1),
			max_decompressed: max_decompressed.max(1)
		}
	}

	pub fn loaded(&mut self, position: ChunkPosition) {
		if !self.loaded.contains(&position) {
			self.loaded.put(position, ());
		}
	}

	pub fn decompressed(&mut self, position: ChunkPosition) {
		self.loaded(position);

		if !self.decompressed.contains(&position) {
			self.decompressed.put(position, ());
		}
	}

	pub fn compressed(&mut self, position: ChunkPosition) {
		self.decompressed.pop(&position);
	}

	pub fn forget(&mut self, position: ChunkPosition) {
		self.loaded.pop(&position);
		self.decompressed.pop(&position);
	}

	pub fn clear(&mut self) {
		self.loaded.clear();
		self.decompressed.clear();
	}

	pub fn loaded_len(&self) -> usize {
		self.loaded.len()
	}

	pub fn decompressed_len(&self) -> usize {
		self.decompressed.len()
	}

	/// The oldest loaded chunks beyond capacity, oldest first. `keep` is never picked.
	pub fn excess_loaded(&self, keep: Option<ChunkPosition>) -> Vec<ChunkPosition> {
		excess(&self.loaded, self.max_loaded, keep)
	}

	/// The oldest decompressed chunks beyond capacity, oldest first. `keep` is never picked.
	pub fn excess_decompressed(&self, keep: Option<ChunkPosition>) -> Vec<ChunkPosition> {
		excess(&self.decompressed, self.max_decompressed, keep)
	}
}

fn excess(queue: &LruCache<ChunkPosition, ()>, capacity: usize, keep: Option<ChunkPosition>) -> Vec<ChunkPosition> {
	let over = queue.len().saturating_sub(capacity);

	queue
		.iter()
		.rev()
		.map(|(&position, _)| position)
		.filter(|&position| Some(position) != keep)
		.take(over)
		.collect()
}

#[cfg(test)]
mod test {
	use super::ChunkCache;
	use vocs::position::ChunkPosition;

	fn at(x: i32) -> ChunkPosition {
		ChunkPosition::new(x, 0)
	}

	#[test]
	fn test_fifo_order() {
		let mut cache = ChunkCache::new(3, 3);

		for x in 0..5 {
			cache.loaded(at(x));
		}

		// Seeing a chunk again doesn't refresh it
		cache.loaded(at(0));

		assert_eq!(cache.excess_loaded(None), vec![at(0), at(1)]);
	}

	#[test]
	fn test_keep_is_skipped() {
		let mut cache = ChunkCache::new(2, 2);

		for x in 0..3 {
			cache.loaded(at(x));
		}

		assert_eq!(cache.excess_loaded(Some(at(0))), vec![at(1)]);
	}

	#[test]
	fn test_decompressed_is_loaded() {
		let mut cache = ChunkCache::new(4, 1);

		cache.decompressed(at(7));
		cache.decompressed(at(8));

		assert_eq!(cache.loaded_len(), 2);
		assert_eq!(cache.excess_decompressed(None), vec![at(7)]);
		assert!(cache.excess_loaded(None).is_empty());

		cache.compressed(at(7));
		assert_eq!(cache.decompressed_len(), 1);

		cache.forget(at(8));
		assert_eq!(cache.loaded_len(), 1);
		assert_eq!(cache.decompressed_len(), 0);
	}
}
