use std::fmt::{self, Debug, Display, Formatter};
use std::time::{SystemTime, UNIX_EPOCH};

/// Size of a sector, the allocation unit of a region file.
pub const SECTOR_BYTES: usize = 4096;

/// Number of sectors taken by the offset and timestamp tables.
pub const HEADER_SECTORS: usize = 2;

/// One past the largest sector count an offset word can hold.
pub const MAX_CHUNK_SECTORS: usize = 256;

/// A chunk's sector range, stored in the offset table as `(offset << 8) | len`.
#[derive(Copy, Clone, Eq, PartialEq)]
pub struct ChunkLocation(u32);

impl ChunkLocation {
	pub fn from_parts(offset: u32, len: u8) -> Self {
		ChunkLocation((offset << 8) | (len as u32))
	}

	/// Zero means the chunk is absent.
	pub fn new(loc: u32) -> Option<Self> {
		if loc == 0 {
			None
		} else {
			Some(ChunkLocation(loc))
		}
	}

	/// Returns the contained raw value, which is guaranteed to be non-zero.
	pub fn inner(&self) -> u32 {
		self.0
	}

	/// Returns the offset in sectors of this chunk from the start of the file.
	pub fn offset(&self) -> u32 {
		self.0 >> 8
	}

	/// Returns the offset in bytes of this chunk from the start of the file.
	pub fn offset_bytes(&self) -> u64 {
		(self.offset() as u64) * SECTOR_BYTES as u64
	}

	/// Returns the size of the chunk in sectors.
	pub fn len(&self) -> u8 {
		(self.0 & 0xFF) as u8
	}

	/// Returns the size of the chunk in bytes.
	pub fn len_bytes(&self) -> usize {
		self.len() as usize * SECTOR_BYTES
	}

	pub fn end(&self) -> u32 {
		self.offset() + (self.len() as u32)
	}

	/// The sectors covered by this chunk.
	pub fn sectors(&self) -> std::ops::Range<usize> {
		self.offset() as usize..self.end() as usize
	}
}

impl Display for ChunkLocation {
	fn fmt(&self, f: &mut Formatter) -> fmt::Result {
		write!(f, "at {}, len {} sectors", self.offset(), self.len())
	}
}

impl Debug for ChunkLocation {
	fn fmt(&self, f: &mut Formatter) -> fmt::Result {
		write!(f, "ChunkLocation {{ offset: {}, len: {} }}", self.offset(), self.len())
	}
}

/// Unix time in seconds when the chunk was last saved.
/// Susceptible to the Year 2038 problem, and relatively useless.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Default)]
pub struct ChunkTimestamp(u32);

impl ChunkTimestamp {
	pub fn from_unix_seconds(seconds: u32) -> Self {
		ChunkTimestamp(seconds)
	}

	pub fn now() -> Option<Self> {
		let seconds = SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_secs()).unwrap_or(0);

		if seconds < u32::MAX as u64 {
			Some(ChunkTimestamp(seconds as u32))
		} else {
			None
		}
	}

	pub fn into_unix_seconds(self) -> u32 {
		self.0
	}
}

/// The 5 bytes at the start of every stored chunk. `len` counts the compression tag byte plus
/// the payload.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct ChunkHeader {
	pub len: u32,
	pub compression: u8
}

impl ChunkHeader {
	pub fn from_bytes(bytes: [u8; 5]) -> Self {
		ChunkHeader {
			len: u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]),
			compression: bytes[4]
		}
	}

	/// Number of payload bytes following the header.
	pub fn payload_len(self) -> usize {
		(self.len as usize).saturating_sub(1)
	}

	pub fn into_bytes(self) -> [u8; 5] {
		let mut bytes = [0u8; 5];

		bytes[0..4].copy_from_slice(&self.len.to_be_bytes());
		bytes[4] = self.compression;

		bytes
	}
}

/// Sectors needed to store a payload along with its header.
pub fn sectors_needed(payload_len: usize) -> usize {
	(payload_len + 5 + SECTOR_BYTES - 1) / SECTOR_BYTES
}

#[cfg(test)]
mod test {
	use super::*;

	#[test]
	fn test_location_parts() {
		let location = ChunkLocation::from_parts(2, 3);

		assert_eq!(location.inner(), 0x203);
		assert_eq!(location.offset(), 2);
		assert_eq!(location.len(), 3);
		assert_eq!(location.end(), 5);
		assert_eq!(location.offset_bytes(), 8192);
		assert_eq!(location.sectors(), 2..5);
		assert!(ChunkLocation::new(0).is_none());
	}

	#[test]
	fn test_sectors_needed() {
		assert_eq!(sectors_needed(0), 1);
		assert_eq!(sectors_needed(4091), 1);
		assert_eq!(sectors_needed(4092), 2);
		assert_eq!(sectors_needed(255 * 4096 - 5), 255);
		assert_eq!(sectors_needed(255 * 4096 - 4), 256);
	}

	#[test]
	fn test_header_bytes() {
		let header = ChunkHeader { len: 0x01020304, compression: 2 };

		assert_eq!(header.into_bytes(), [1, 2, 3, 4, 2]);
		assert_eq!(ChunkHeader::from_bytes([1, 2, 3, 4, 2]), header);
		assert_eq!(header.payload_len(), 0x01020303);
	}
}
