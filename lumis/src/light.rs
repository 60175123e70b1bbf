//! One-voxel light spreading steps. Light only ever grows here: every update takes the maximum of
//! the current value and the neighbouring value minus the cost of entering the voxel.

use vocs::position::Dir;
use vocs::{Volume, CHUNK_WIDTH};

/// A strided run of voxels along the axis of some direction.
struct Line {
	start: usize,
	stride: usize,
	len: usize
}

/// Enumerates every line of the volume parallel to the axis of `dir`.
fn lines(height: usize, dir: Dir) -> Vec<Line> {
	let column = CHUNK_WIDTH * height;

	match dir {
		Dir::PlusX | Dir::MinusX => (0..column).map(|start| Line { start, stride: column, len: CHUNK_WIDTH }).collect(),
		Dir::PlusZ | Dir::MinusZ => (0..CHUNK_WIDTH)
			.flat_map(|x| (0..height).map(move |y| Line { start: x * column + y, stride: height, len: CHUNK_WIDTH }))
			.collect(),
		Dir::Up | Dir::Down => (0..CHUNK_WIDTH * CHUNK_WIDTH).map(|xz| Line { start: xz * height, stride: 1, len: height }).collect()
	}
}

/// Whether light moving in `dir` travels towards higher indices along its axis.
fn is_forward(dir: Dir) -> bool {
	matches!(dir, Dir::PlusX | Dir::PlusZ | Dir::Up)
}

/// Moves light one voxel in `dir` inside a single chunk. Voxels only read values from before
/// this step, so light never travels more than one voxel per call.
pub fn spread_interior(light: &mut Volume, costs: &Volume, dir: Dir) {
	let forward = is_forward(dir);
	let costs = costs.raw();
	let light = light.raw_mut();

	for line in lines(costs.len() / (CHUNK_WIDTH * CHUNK_WIDTH), dir) {
		if forward {
			for step in (1..line.len).rev() {
				let index = line.start + step * line.stride;
				let incoming = light[index - line.stride].saturating_sub(costs[index]);

				light[index] = light[index].max(incoming);
			}
		} else {
			for step in 0..line.len - 1 {
				let index = line.start + step * line.stride;
				let incoming = light[index + line.stride].saturating_sub(costs[index]);

				light[index] = light[index].max(incoming);
			}
		}
	}
}

/// Coordinate along the axis of `dir` of the face that light leaves through.
fn exit_plane(dir: Dir) -> usize {
	if is_forward(dir) {
		CHUNK_WIDTH - 1
	} else {
		0
	}
}

/// Indices of the voxels in the horizontal face at `plane` along the axis of `dir`.
fn face_indices(height: usize, dir: Dir, plane: usize) -> impl Iterator<Item = usize> {
	let column = CHUNK_WIDTH * height;
	let along_x = matches!(dir, Dir::PlusX | Dir::MinusX);

	(0..CHUNK_WIDTH).flat_map(move |other| {
		let start = if along_x { plane * column + other * height } else { other * column + plane * height };

		start..start + height
	})
}

/// Moves light across a chunk border: the face of `from` that light moving in `dir` leaves
/// through lands on the opposite face of `to`. Returns whether anything in `to` changed.
///
/// # Panics
/// If `dir` is vertical or the volumes differ in height.
pub fn spread_across(from: &Volume, to: &mut Volume, costs: &Volume, dir: Dir) -> bool {
	assert!(dir.horizontal(), "Light only crosses chunk borders horizontally, got {:?}", dir);
	assert_eq!(from.height(), to.height());

	let height = to.height();
	let exit = exit_plane(dir);
	let entry = CHUNK_WIDTH - 1 - exit;

	let from = from.raw();
	let costs = costs.raw();
	let to = to.raw_mut();

	let mut changed = false;

	for (source, target) in face_indices(height, dir, exit).zip(face_indices(height, dir, entry)) {
		let incoming = from[source].saturating_sub(costs[target]);

		if incoming > to[target] {
			to[target] = incoming;
			changed = true;
		}
	}

	changed
}

#[cfg(test)]
mod test {
	use super::*;

	fn costs(height: usize) -> Volume {
		Volume::filled(height, 1)
	}

	#[test]
	fn test_interior_single_step() {
		let mut light = Volume::new(16);
		light.set(5, 5, 5, 10);

		spread_interior(&mut light, &costs(16), Dir::PlusX);

		assert_eq!(light.get(6, 5, 5), 9);
		// Only one voxel per step
		assert_eq!(light.get(7, 5, 5), 0);
		// Nothing flows backwards
		assert_eq!(light.get(4, 5, 5), 0);
	}

	#[test]
	fn test_interior_all_directions() {
		for &(dir, (x, z, y)) in &[
			(Dir::MinusX, (4, 5, 5)),
			(Dir::PlusZ, (5, 6, 5)),
			(Dir::MinusZ, (5, 4, 5)),
			(Dir::Up, (5, 5, 6)),
			(Dir::Down, (5, 5, 4))
		] {
			let mut light = Volume::new(16);
			light.set(5, 5, 5, 10);

			spread_interior(&mut light, &costs(16), dir);

			assert_eq!(light.get(x, z, y), 9, "{:?}", dir);
			assert_eq!(light.raw().iter().filter(|&&value| value != 0).count(), 2, "{:?}", dir);
		}
	}

	#[test]
	fn test_interior_absorption() {
		let mut light = Volume::new(16);
		let mut costs = costs(16);

		light.set(0, 0, 0, 15);
		costs.set(0, 0, 1, 3);

		spread_interior(&mut light, &costs, Dir::Up);

		assert_eq!(light.get(0, 0, 1), 12);
	}

	#[test]
	fn test_never_lowers() {
		let mut light = Volume::filled(16, 4);
		light.set(3, 3, 3, 1);

		spread_interior(&mut light, &costs(16), Dir::PlusZ);

		assert!(light.raw().iter().all(|&value| value >= 3));
		assert_eq!(light.get(3, 3, 3), 3);
	}

	#[test]
	fn test_across_border() {
		let mut upstream = Volume::new(16);
		upstream.set(15, 7, 2, 12);
		upstream.set(14, 7, 2, 13);

		let mut downstream = Volume::new(16);

		assert!(spread_across(&upstream, &mut downstream, &costs(16), Dir::PlusX));
		assert_eq!(downstream.get(0, 7, 2), 11);
		assert_eq!(downstream.raw().iter().filter(|&&value| value != 0).count(), 1);

		// Repeating the same transfer is a no-op
		assert!(!spread_across(&upstream, &mut downstream, &costs(16), Dir::PlusX));
	}

	#[test]
	fn test_across_minus_z() {
		let mut upstream = Volume::new(16);
		upstream.set(3, 0, 9, 8);

		let mut downstream = Volume::new(16);

		spread_across(&upstream, &mut downstream, &costs(16), Dir::MinusZ);

		assert_eq!(downstream.get(3, 15, 9), 7);
	}
}
