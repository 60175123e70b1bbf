use vocs::position::ChunkPosition;

/// Splits a set of chunks into batches of at most `limit` chunks. Oversized sets are quartered,
/// halving first along X and then each half along Z, so every batch stays spatially compact.
pub fn split_batches(mut positions: Vec<ChunkPosition>, limit: usize) -> Vec<Vec<ChunkPosition>> {
	let limit = limit.max(1);

	if positions.len() <= limit {
		return if positions.is_empty() { Vec::new() } else { vec![positions] };
	}

	positions.sort_by_key(|position| (position.x(), position.z()));
	let east = positions.split_off(positions.len() / 2);
	let west = positions;

	let mut batches = Vec::new();

	for mut half in [west, east] {
		half.sort_by_key(|position| (position.z(), position.x()));
		let south = half.split_off(half.len() / 2);

		batches.extend(split_batches(half, limit));
		batches.extend(split_batches(south, limit));
	}

	batches
}

#[cfg(test)]
mod test {
	use super::split_batches;
	use vocs::position::ChunkPosition;

	fn square(side: i32) -> Vec<ChunkPosition> {
		(0..side).flat_map(|x| (0..side).map(move |z| ChunkPosition::new(x, z))).collect()
	}

	#[test]
	fn test_small_set_untouched() {
		let batches = split_batches(square(3), 9);

		assert_eq!(batches.len(), 1);
		assert_eq!(batches[0].len(), 9);
	}

	#[test]
	fn test_quarters() {
		let batches = split_batches(square(8), 16);

		assert_eq!(batches.len(), 4);

		for batch in &batches {
			assert_eq!(batch.len(), 16);

			// Each quarter is a 4x4 square
			let min_x = batch.iter().map(|position| position.x()).min().unwrap();
			let max_x = batch.iter().map(|position| position.x()).max().unwrap();
			let min_z = batch.iter().map(|position| position.z()).min().unwrap();
			let max_z = batch.iter().map(|position| position.z()).max().unwrap();

			assert_eq!(max_x - min_x, 3);
			assert_eq!(max_z - min_z, 3);
		}
	}

	#[test]
	fn test_every_chunk_kept() {
		let mut all: Vec<_> = split_batches(square(10), 7).into_iter().flatten().collect();
		all.sort();

		assert_eq!(all, square(10));
		assert!(split_batches(square(10), 7).iter().all(|batch| batch.len() <= 7));
	}

	#[test]
	fn test_empty() {
		assert!(split_batches(Vec::new(), 4).is_empty());
	}
}
