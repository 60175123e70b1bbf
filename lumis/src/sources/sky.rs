use vocs::{HeightMap, Volume, CHUNK_WIDTH};

/// Fills sky light column by column without looking at neighbouring chunks.
///
/// Everything at or above the height map gets full light. Below it, light decays by the
/// absorption of each block, with a minimum loss of 1, until it runs out. `costs` holds that
/// per-voxel loss already clamped to at least 1.
pub fn fast_sky_light(heightmap: &HeightMap, costs: &Volume, light: &mut Volume) {
	light.fill(0);

	for x in 0..CHUNK_WIDTH {
		for z in 0..CHUNK_WIDTH {
			let surface = (heightmap.get(x, z) as usize).min(light.height());
			let costs = costs.column(x, z);
			let column = light.column_mut(x, z);

			for entry in &mut column[surface..] {
				*entry = 15;
			}

			let mut level = 15u8;

			for y in (0..surface).rev() {
				level = level.saturating_sub(costs[y]);

				if level == 0 {
					break;
				}

				column[y] = level;
			}
		}
	}
}

/// Dimensions without a sky have no sky light at all.
pub fn clear_sky_light(light: &mut Volume) {
	light.fill(0);
}

#[cfg(test)]
mod test {
	use super::fast_sky_light;
	use crate::heightmap::compute_heightmap;
	use crate::materials::Materials;
	use vocs::Volume;

	#[test]
	fn test_open_column() {
		let blocks = Volume::new(32);
		let materials = Materials::classic();
		let heightmap = compute_heightmap(&blocks, &materials.absorbing());

		let mut light = Volume::new(32);
		fast_sky_light(&heightmap, &blocks.map(&materials.cost_table()), &mut light);

		assert!(light.raw().iter().all(|&value| value == 15));
	}

	#[test]
	fn test_decay_under_leaves() {
		let mut blocks = Volume::new(32);
		let materials = Materials::classic();

		// Leaves at y = 20, air below
		blocks.set(0, 0, 20, 18);

		let heightmap = compute_heightmap(&blocks, &materials.absorbing());
		let mut light = Volume::new(32);
		fast_sky_light(&heightmap, &blocks.map(&materials.cost_table()), &mut light);

		assert_eq!(light.get(0, 0, 21), 15);
		assert_eq!(light.get(0, 0, 20), 14);
		assert_eq!(light.get(0, 0, 19), 13);
		assert_eq!(light.get(0, 0, 7), 1);
		assert_eq!(light.get(0, 0, 6), 0);
		assert_eq!(light.get(0, 0, 0), 0);

		// Neighbouring columns are untouched by the leaves
		assert_eq!(light.get(1, 0, 0), 15);
	}

	#[test]
	fn test_opaque_surface() {
		let mut blocks = Volume::new(32);
		let materials = Materials::classic();

		blocks.set(5, 5, 10, 1);

		let heightmap = compute_heightmap(&blocks, &materials.absorbing());
		let mut light = Volume::new(32);
		fast_sky_light(&heightmap, &blocks.map(&materials.cost_table()), &mut light);

		assert_eq!(light.get(5, 5, 11), 15);
		assert_eq!(light.get(5, 5, 10), 0);
		assert_eq!(light.get(5, 5, 9), 0);
	}
}
