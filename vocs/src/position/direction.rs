#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum Dir {
	Up,
	Down,
	PlusX,
	MinusX,
	PlusZ,
	MinusZ
}

impl Dir {
	/// The four directions that cross chunk boundaries, in the order lighting visits them.
	pub const HORIZONTAL: [Dir; 4] = [Dir::MinusX, Dir::PlusX, Dir::MinusZ, Dir::PlusZ];

	pub fn opposite(self) -> Dir {
		match self {
			Dir::Up     => Dir::Down,
			Dir::Down   => Dir::Up,
			Dir::PlusX  => Dir::MinusX,
			Dir::MinusX => Dir::PlusX,
			Dir::PlusZ  => Dir::MinusZ,
			Dir::MinusZ => Dir::PlusZ
		}
	}

	pub fn horizontal(self) -> bool {
		!self.vertical()
	}

	pub fn vertical(self) -> bool {
		self == Dir::Up || self == Dir::Down
	}

	/// Returns the (x, z) step of a horizontal direction. Vertical directions return (0, 0).
	pub fn step(self) -> (i32, i32) {
		match self {
			Dir::PlusX  => ( 1,  0),
			Dir::MinusX => (-1,  0),
			Dir::PlusZ  => ( 0,  1),
			Dir::MinusZ => ( 0, -1),
			Dir::Up | Dir::Down => (0, 0)
		}
	}
}
