use crate::codec::CompressionFormat;
use crate::error::RegionError;
use crate::raw::RawChunk;
use log::debug;
use std::collections::BTreeSet;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use vocs::position::ChunkPosition;

const DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Formats a number in base 36, with a leading `-` for negative numbers.
pub fn base36(value: i32) -> String {
	if value == 0 {
		return "0".to_string();
	}

	let mut remaining = (value as i64).unsigned_abs();
	let mut digits = Vec::new();

	while remaining != 0 {
		digits.push(DIGITS[(remaining % 36) as usize]);
		remaining /= 36;
	}

	if value < 0 {
		digits.push(b'-');
	}

	digits.iter().rev().map(|&digit| digit as char).collect()
}

fn parse_chunk_name(name: &str) -> Option<ChunkPosition> {
	let mut parts = name.split('.');

	if parts.next()? != "c" {
		return None;
	}

	let x = i32::from_str_radix(parts.next()?, 36).ok()?;
	let z = i32::from_str_radix(parts.next()?, 36).ok()?;

	if parts.next()? != "dat" || parts.next().is_some() {
		return None;
	}

	Some(ChunkPosition::new(x, z))
}

/// The pre-region layout: one gzip-compressed file per chunk, spread over two levels of
/// directories named after the low bits of the chunk coordinates.
pub struct LegacyStore {
	directory: PathBuf
}

impl LegacyStore {
	pub fn new<P: Into<PathBuf>>(directory: P) -> Self {
		LegacyStore { directory: directory.into() }
	}

	pub fn directory(&self) -> &Path {
		&self.directory
	}

	pub fn chunk_path(&self, position: ChunkPosition) -> PathBuf {
		self.directory
			.join(base36(position.x() & 63))
			.join(base36(position.z() & 63))
			.join(format!("c.{}.{}.dat", base36(position.x()), base36(position.z())))
	}

	pub fn contains_chunk(&self, position: ChunkPosition) -> bool {
		self.chunk_path(position).is_file()
	}

	pub fn read_chunk(&self, position: ChunkPosition) -> Result<Option<RawChunk>, RegionError> {
		match fs::read(self.chunk_path(position)) {
			Ok(bytes) => Ok(Some(RawChunk::new(CompressionFormat::Gzip, bytes))),
			Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
			Err(e) => Err(e.into())
		}
	}

	/// Writes a gzip-compressed chunk next to its destination, then renames it into place.
	pub fn write_chunk(&self, position: ChunkPosition, payload: &[u8], format: CompressionFormat) -> Result<(), RegionError> {
		if format != CompressionFormat::Gzip {
			return Err(RegionError::UnsupportedFormat(format.tag()));
		}

		let path = self.chunk_path(position);
		let staging = path.with_extension("dat.tmp");

		if let Some(parent) = path.parent() {
			fs::create_dir_all(parent)?;
		}

		debug!("Writing chunk {} to {}", position, path.display());

		fs::write(&staging, payload)?;
		fs::rename(&staging, &path)?;

		Ok(())
	}

	pub fn delete_chunk(&self, position: ChunkPosition) -> Result<bool, RegionError> {
		match fs::remove_file(self.chunk_path(position)) {
			Ok(()) => Ok(true),
			Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
			Err(e) => Err(e.into())
		}
	}

	pub fn list_all_chunks(&self) -> Result<BTreeSet<ChunkPosition>, RegionError> {
		let mut chunks = BTreeSet::new();

		let outer = match fs::read_dir(&self.directory) {
			Ok(outer) => outer,
			Err(e) if e.kind() == ErrorKind::NotFound => return Ok(chunks),
			Err(e) => return Err(e.into())
		};

		for x_dir in outer {
			let x_dir = x_dir?;

			if !x_dir.file_type()?.is_dir() {
				continue;
			}

			for z_dir in fs::read_dir(x_dir.path())? {
				let z_dir = z_dir?;

				if !z_dir.file_type()?.is_dir() {
					continue;
				}

				for file in fs::read_dir(z_dir.path())? {
					let name = file?.file_name();

					if let Some(position) = name.to_str().and_then(parse_chunk_name) {
						chunks.insert(position);
					}
				}
			}
		}

		Ok(chunks)
	}
}

#[cfg(test)]
mod test {
	use super::*;
	use crate::codec::compress;
	use tempfile::TempDir;

	#[test]
	fn test_base36() {
		assert_eq!(base36(0), "0");
		assert_eq!(base36(35), "z");
		assert_eq!(base36(36), "10");
		assert_eq!(base36(-13), "-d");
		assert_eq!(base36(i32::MIN), "-zik0zk");
	}

	#[test]
	fn test_chunk_path() {
		let store = LegacyStore::new("world");

		assert_eq!(store.chunk_path(ChunkPosition::new(-13, 44)), Path::new("world/1f/18/c.-d.18.dat"));
		assert_eq!(parse_chunk_name("c.-d.18.dat"), Some(ChunkPosition::new(-13, 44)));
		assert_eq!(parse_chunk_name("c.-d.18.dat.tmp"), None);
	}

	#[test]
	fn test_store() {
		let dir = TempDir::new().unwrap();
		let store = LegacyStore::new(dir.path());
		let position = ChunkPosition::new(-100, 7);
		let payload = compress(b"chunk", CompressionFormat::Gzip).unwrap();

		assert!(!store.contains_chunk(position));
		assert!(store.read_chunk(position).unwrap().is_none());

		store.write_chunk(position, &payload, CompressionFormat::Gzip).unwrap();

		assert!(store.contains_chunk(position));
		assert_eq!(store.read_chunk(position).unwrap().unwrap().decompress().unwrap(), b"chunk");
		assert_eq!(store.list_all_chunks().unwrap().into_iter().collect::<Vec<_>>(), vec![position]);

		assert!(store.delete_chunk(position).unwrap());
		assert!(!store.delete_chunk(position).unwrap());
		assert!(store.list_all_chunks().unwrap().is_empty());
	}

	#[test]
	fn test_rejects_zlib() {
		let dir = TempDir::new().unwrap();
		let store = LegacyStore::new(dir.path());

		assert!(store.write_chunk(ChunkPosition::new(0, 0), b"", CompressionFormat::Deflate).is_err());
	}
}
