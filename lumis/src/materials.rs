use bit_vec::BitVec;

/// Per-block-ID lighting properties. Absorption is how much light a block removes when light
/// enters it, emission is the block light level it produces on its own.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Materials {
	absorption: [u8; 256],
	emission: [u8; 256]
}

impl Materials {
	/// A table where every block except air is fully opaque and nothing glows.
	pub fn opaque() -> Self {
		let mut absorption = [15; 256];
		absorption[0] = 0;

		Materials { absorption, emission: [0; 256] }
	}

	/// Lighting properties of the classic block set.
	pub fn classic() -> Self {
		let mut materials = Materials::opaque();

		// Blocks that let light through untouched
		for &id in &[
			6, 20, 27, 28, 30, 31, 32, 37, 38, 39, 40, 50, 51, 55, 59, 63, 64, 65, 66, 68, 69, 70,
			71, 72, 75, 76, 77, 78, 83, 85, 90, 92, 93, 94, 96, 101, 102, 106
		] {
			materials.set_absorption(id, 0);
		}

		materials.set_absorption(8, 3);
		materials.set_absorption(9, 3);
		materials.set_absorption(18, 1);
		materials.set_absorption(79, 3);

		materials.set_emission(10, 15);
		materials.set_emission(11, 15);
		materials.set_emission(39, 1);
		materials.set_emission(50, 14);
		materials.set_emission(51, 15);
		materials.set_emission(62, 13);
		materials.set_emission(74, 9);
		materials.set_emission(76, 7);
		materials.set_emission(89, 15);
		materials.set_emission(90, 11);
		materials.set_emission(91, 15);
		materials.set_emission(94, 9);

		materials
	}

	pub fn set_absorption(&mut self, id: u8, absorption: u8) {
		self.absorption[id as usize] = absorption.min(15);
	}

	pub fn set_emission(&mut self, id: u8, emission: u8) {
		self.emission[id as usize] = emission.min(15);
	}

	#[inline]
	pub fn absorption(&self, id: u8) -> u8 {
		self.absorption[id as usize]
	}

	#[inline]
	pub fn emission(&self, id: u8) -> u8 {
		self.emission[id as usize]
	}

	pub fn absorption_table(&self) -> &[u8; 256] {
		&self.absorption
	}

	pub fn emission_table(&self) -> &[u8; 256] {
		&self.emission
	}

	/// What light loses when entering each block: the absorption, but never less than 1.
	pub fn cost_table(&self) -> [u8; 256] {
		let mut costs = [0; 256];

		for (cost, &absorption) in costs.iter_mut().zip(self.absorption.iter()) {
			*cost = absorption.max(1);
		}

		costs
	}

	/// Which block IDs count towards the height map.
	pub fn absorbing(&self) -> BitVec {
		self.absorption.iter().map(|&absorption| absorption != 0).collect()
	}
}

impl Default for Materials {
	fn default() -> Self {
		Materials::classic()
	}
}
