/// The 4-bit unsigned integer type.
#[allow(non_camel_case_types)]
#[derive(Copy, Clone, Debug, Hash, Eq, PartialEq, PartialOrd, Ord, Default)]
pub struct u4(u8);

impl u4 {
	pub const ZERO: u4 = u4(0);
	pub const MAX: u4 = u4(15);

	/// Casts a u8 to a u4, truncating the value in the process.
	pub fn new(x: u8) -> Self {
		u4(x & 0xF)
	}

	/// Casts a u4 to an u8, returning a value in the range 0-15 (inclusive).
	pub fn raw(self) -> u8 {
		self.0
	}

	/// Subtracts a u4 from another u4, capping the result to 0 if it were to underflow.
	pub fn saturating_sub(self, rhs: Self) -> Self {
		u4(self.0.saturating_sub(rhs.0))
	}
}

/// Returns the index into a packed nibble array, in the form (index, shift).
fn nibble_index(index: usize) -> (usize, u8) {
	(index >> 1, ((index & 1) as u8) << 2)
}

/// Expands a packed nibble array to one byte per value.
///
/// Even output indices take the low nibble of the corresponding byte, odd indices the high
/// nibble. For a `[x][z][h / 2]` packed array this produces the matching `[x][z][h]` array,
/// since the Y axis is the contiguous one.
pub fn unpack_nibbles(packed: &[u8]) -> Vec<u8> {
	let mut unpacked = Vec::with_capacity(packed.len() * 2);

	for &pair in packed {
		unpacked.push(pair & 0xF);
		unpacked.push(pair >> 4);
	}

	unpacked
}

/// Packs one-nibble-per-byte values into two per byte. This is the inverse of
/// [`unpack_nibbles`]; the high bits of each input byte are discarded.
/// # Panics
/// If the input length is odd.
pub fn pack_nibbles(unpacked: &[u8]) -> Vec<u8> {
	assert_eq!(unpacked.len() & 1, 0, "Cannot pack an odd number of nibbles: {}", unpacked.len());

	unpacked.chunks_exact(2).map(|pair| (pair[0] & 0xF) | ((pair[1] & 0xF) << 4)).collect()
}

/// Reads a single nibble straight out of a packed array.
pub fn get_packed(packed: &[u8], index: usize) -> u4 {
	let (index, shift) = nibble_index(index);

	u4::new(packed[index] >> shift)
}

/// Writes a single nibble into a packed array, leaving its partner untouched.
pub fn set_packed(packed: &mut [u8], index: usize, value: u4) {
	let (index, shift) = nibble_index(index);

	packed[index] = (packed[index] & !(0xF << shift)) | (value.raw() << shift);
}

#[cfg(test)]
mod test {
	use super::*;

	#[test]
	fn test_unpack_order() {
		assert_eq!(unpack_nibbles(&[0x21, 0xF0]), vec![1, 2, 0, 15]);
	}

	#[test]
	fn test_pack_unpack() {
		let unpacked: Vec<u8> = (0..4096).map(|index| ((index * 7) % 16) as u8).collect();
		let packed = pack_nibbles(&unpacked);

		assert_eq!(packed.len(), 2048);
		assert_eq!(unpack_nibbles(&packed), unpacked);

		// Packing what was just unpacked gives back the exact same bytes
		assert_eq!(pack_nibbles(&unpack_nibbles(&packed)), packed);
	}

	#[test]
	fn test_pack_truncates_high_bits() {
		assert_eq!(pack_nibbles(&[0x1F, 0xF2]), vec![0x2F]);
	}

	#[test]
	#[should_panic]
	fn test_pack_odd_length() {
		pack_nibbles(&[1, 2, 3]);
	}

	#[test]
	fn test_packed_access() {
		let mut packed = vec![0u8; 4];

		set_packed(&mut packed, 5, u4::new(9));
		set_packed(&mut packed, 4, u4::new(3));

		assert_eq!(packed[2], 0x93);
		assert_eq!(get_packed(&packed, 5), u4::new(9));
		assert_eq!(get_packed(&packed, 4), u4::new(3));
	}
}
