use crate::materials::Materials;
use vocs::Volume;

/// Resets block light to what the blocks emit on their own, discarding any propagated light.
pub fn seed_block_light(blocks: &Volume, materials: &Materials) -> Volume {
	blocks.map(materials.emission_table())
}
