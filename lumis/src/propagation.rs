use crate::light::{spread_across, spread_interior};
use log::{debug, trace};
use rustc_hash::{FxHashMap, FxHashSet};
use splitmut::SplitMut;
use std::collections::HashMap;
use std::hash::BuildHasher;
use std::mem;
use vocs::position::{ChunkPosition, Dir};
use vocs::Volume;

/// One light channel of a chunk, checked out for propagation.
#[derive(Debug, Clone)]
pub struct LightChunk {
	light: Volume,
	costs: Volume,
	changed: bool
}

impl LightChunk {
	/// `costs` is the loss of light entering each voxel, at least 1 everywhere.
	/// # Panics
	/// If the two volumes differ in height.
	pub fn new(light: Volume, costs: Volume) -> Self {
		assert_eq!(light.height(), costs.height(), "Light and cost volumes must have the same height");

		LightChunk { light, costs, changed: false }
	}

	pub fn light(&self) -> &Volume {
		&self.light
	}

	/// Whether propagation raised any light value in this chunk.
	pub fn changed(&self) -> bool {
		self.changed
	}

	pub fn into_light(self) -> Volume {
		self.light
	}
}

/// Provides chunks outside the batch that light may spill into.
pub trait LightSource {
	/// Checks out a neighbouring chunk. None if the chunk does not exist, in which case light
	/// flowing towards it is discarded.
	fn fetch(&mut self, position: ChunkPosition) -> Option<LightChunk>;
}

impl<H: BuildHasher> LightSource for HashMap<ChunkPosition, LightChunk, H> {
	fn fetch(&mut self, position: ChunkPosition) -> Option<LightChunk> {
		self.remove(&position)
	}
}

/// A source with no chunks at all.
pub struct NoNeighbors;

impl LightSource for NoNeighbors {
	fn fetch(&mut self, _: ChunkPosition) -> Option<LightChunk> {
		None
	}
}

/// Spreads one light channel across a set of chunks in repeated passes.
///
/// Every pass visits the working set in position order. For each horizontal direction a chunk
/// pushes its edge into the neighbour ahead, shifts its own light one voxel, then pulls in the
/// edge of the neighbour behind. Then it shifts light one voxel down and one voxel up. Chunks
/// whose light or edges changed make up the next working set.
pub struct Propagation {
	chunks: FxHashMap<ChunkPosition, LightChunk>,
	missing: FxHashSet<ChunkPosition>,
	working: Vec<ChunkPosition>,
	/// Stands in for chunks that don't exist; cleared after receiving light.
	zero: LightChunk,
	passes: usize,
	max_passes: usize
}

impl Propagation {
	pub fn new(height: usize, max_passes: usize) -> Self {
		Propagation {
			chunks: FxHashMap::default(),
			missing: FxHashSet::default(),
			working: Vec::new(),
			zero: LightChunk::new(Volume::new(height), Volume::filled(height, 1)),
			passes: 0,
			max_passes
		}
	}

	/// Adds a chunk to the batch and to the first working set.
	pub fn insert(&mut self, position: ChunkPosition, chunk: LightChunk) {
		assert_eq!(chunk.light.height(), self.zero.light.height(), "Chunk at {} has the wrong height", position);

		self.missing.remove(&position);
		self.chunks.insert(position, chunk);
		self.working.push(position);
	}

	pub fn get(&self, position: ChunkPosition) -> Option<&LightChunk> {
		self.chunks.get(&position)
	}

	pub fn passes(&self) -> usize {
		self.passes
	}

	pub fn is_finished(&self) -> bool {
		self.working.is_empty() || self.passes >= self.max_passes
	}

	fn fetch<S: LightSource>(&mut self, position: ChunkPosition, source: &mut S) {
		if self.chunks.contains_key(&position) || self.missing.contains(&position) {
			return;
		}

		match source.fetch(position) {
			Some(chunk) if chunk.light.height() == self.zero.light.height() => {
				self.chunks.insert(position, chunk);
			},
			Some(_) => {
				debug!("Ignoring chunk {} with a mismatched height during light propagation", position);
				self.missing.insert(position);
			},
			None => {
				self.missing.insert(position);
			}
		}
	}

	/// Runs a single pass. Returns whether another pass is needed.
	pub fn pass<S: LightSource>(&mut self, source: &mut S) -> bool {
		if self.is_finished() {
			return false;
		}

		let mut working = mem::take(&mut self.working);
		working.sort();
		working.dedup();

		let mut next = Vec::new();

		for &position in &working {
			let before = match self.chunks.get(&position) {
				Some(chunk) => chunk.light.clone(),
				None => continue
			};

			for &dir in Dir::HORIZONTAL.iter() {
				let ahead = position.offset(dir);
				let behind = position.offset(dir.opposite());

				self.fetch(ahead, source);
				self.fetch(behind, source);

				// Outflow, computed from the edge before this chunk shifts
				match self.chunks.get2_mut(&position, &ahead) {
					(Ok(center), Ok(neighbor)) => {
						if spread_across(&center.light, &mut neighbor.light, &neighbor.costs, dir) {
							neighbor.changed = true;
							next.push(ahead);
						}
					},
					(Ok(center), Err(_)) => {
						spread_across(&center.light, &mut self.zero.light, &self.zero.costs, dir);
						self.zero.light.fill(0);
					},
					_ => unreachable!("chunk {} vanished during propagation", position)
				}

				if let Some(center) = self.chunks.get_mut(&position) {
					spread_interior(&mut center.light, &center.costs, dir);
				}

				// Inflow; a missing chunk behind contributes nothing
				if let (Ok(upstream), Ok(center)) = self.chunks.get2_mut(&behind, &position) {
					spread_across(&upstream.light, &mut center.light, &center.costs, dir);
				}
			}

			if let Some(center) = self.chunks.get_mut(&position) {
				spread_interior(&mut center.light, &center.costs, Dir::Down);
				spread_interior(&mut center.light, &center.costs, Dir::Up);

				if center.light != before {
					center.changed = true;
					next.push(position);
				}
			}
		}

		self.passes += 1;

		trace!("Light pass {}: {} chunk(s) processed, {} queued", self.passes, working.len(), next.len());

		self.working = next;

		!self.is_finished()
	}

	/// Runs passes until the light settles or the pass limit is reached.
	pub fn run<S: LightSource>(&mut self, source: &mut S) {
		while self.pass(source) {}

		if !self.working.is_empty() {
			debug!("Light propagation stopped at the pass limit with {} chunk(s) still queued", self.working.len());
		}
	}

	/// Hands back every chunk touched during propagation, including fetched neighbours.
	pub fn into_chunks(self) -> impl Iterator<Item = (ChunkPosition, LightChunk)> {
		self.chunks.into_iter()
	}
}
