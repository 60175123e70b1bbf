use bit_vec::BitVec;
use vocs::{HeightMap, Volume, CHUNK_WIDTH};

/// Builds the height map of a chunk: for each column, one above the topmost block whose ID is
/// set in `matches`, or 0 if the whole column is clear.
pub fn compute_heightmap(blocks: &Volume, matches: &BitVec) -> HeightMap {
	let mut heightmap = HeightMap::new();

	// If there are no blocks that would match our predicate, every column is clear
	if !matches.iter().any(|entry| entry) {
		return heightmap;
	}

	for x in 0..CHUNK_WIDTH {
		for z in 0..CHUNK_WIDTH {
			let column = blocks.column(x, z);

			// Traverse top-down so that we can bail out early
			let top = column.iter().rposition(|&block| matches.get(block as usize).unwrap_or(false));

			if let Some(y) = top {
				heightmap.set(x, z, y as u32 + 1);
			}
		}
	}

	heightmap
}
