//! Fixes block arrangements the game refuses to load.

use vocs::{Volume, CHUNK_WIDTH};

pub const AIR: u8 = 0;
pub const GRASS: u8 = 2;
pub const DIRT: u8 = 3;
pub const SNOW_LAYER: u8 = 78;

fn is_soil(block: u8) -> bool {
	block == GRASS || block == DIRT
}

/// Turns grass covered by grass or dirt into dirt, and removes snow layers resting on other
/// snow layers. Both rules look at the blocks as they were before this call, so a stack of
/// snow layers keeps only its bottom layer. Returns the number of blocks changed.
pub fn sanitize_blocks(blocks: &mut Volume) -> usize {
	let mut changed = 0;

	for x in 0..CHUNK_WIDTH {
		for z in 0..CHUNK_WIDTH {
			let column = blocks.column_mut(x, z);
			let original = column.to_vec();

			for (y, pair) in original.windows(2).enumerate() {
				let (below, above) = (pair[0], pair[1]);

				if below == GRASS && is_soil(above) {
					column[y] = DIRT;
					changed += 1;
				}

				if below == SNOW_LAYER && above == SNOW_LAYER {
					column[y + 1] = AIR;
					changed += 1;
				}
			}
		}
	}

	changed
}

#[cfg(test)]
mod test {
	use super::*;

	#[test]
	fn test_covered_grass_becomes_dirt() {
		let mut blocks = Volume::new(16);

		blocks.set(3, 4, 5, GRASS);
		blocks.set(3, 4, 6, GRASS);
		blocks.set(7, 7, 1, GRASS);
		blocks.set(7, 7, 2, DIRT);

		assert_eq!(sanitize_blocks(&mut blocks), 2);

		assert_eq!(blocks.get(3, 4, 5), DIRT);
		assert_eq!(blocks.get(3, 4, 6), GRASS);
		assert_eq!(blocks.get(7, 7, 1), DIRT);
		assert_eq!(blocks.get(7, 7, 2), DIRT);
	}

	#[test]
	fn test_exposed_grass_untouched() {
		let mut blocks = Volume::new(16);

		blocks.set(0, 0, 3, DIRT);
		blocks.set(0, 0, 4, GRASS);

		assert_eq!(sanitize_blocks(&mut blocks), 0);
		assert_eq!(blocks.get(0, 0, 4), GRASS);
	}

	#[test]
	fn test_stacked_snow_removed() {
		let mut blocks = Volume::new(16);

		blocks.set(2, 2, 8, SNOW_LAYER);
		blocks.set(2, 2, 9, SNOW_LAYER);
		blocks.set(2, 2, 10, SNOW_LAYER);

		assert_eq!(sanitize_blocks(&mut blocks), 2);

		assert_eq!(blocks.get(2, 2, 8), SNOW_LAYER);
		assert_eq!(blocks.get(2, 2, 9), AIR);
		assert_eq!(blocks.get(2, 2, 10), AIR);
	}

	#[test]
	fn test_top_of_column() {
		let mut blocks = Volume::new(16);

		blocks.set(15, 15, 15, GRASS);

		assert_eq!(sanitize_blocks(&mut blocks), 0);
	}
}
