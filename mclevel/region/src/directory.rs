use crate::codec::CompressionFormat;
use crate::error::RegionError;
use crate::file::{RegionFile, RepairReport};
use crate::raw::RawChunk;
use log::{debug, info, warn};
use rayon::prelude::*;
use rustc_hash::FxHashMap;
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use vocs::position::{ChunkPosition, RegionPosition};

fn lock(file: &Mutex<RegionFile>) -> MutexGuard<RegionFile> {
	// A panic mid-operation leaves nothing half-updated in memory that repair can't handle
	file.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Parses a region file name of the form `r.<x>.<z>.<extension>`.
fn parse_region_name(name: &str, extension: &str) -> Option<RegionPosition> {
	let mut parts = name.split('.');

	if parts.next()? != "r" {
		return None;
	}

	let x = parts.next()?.parse().ok()?;
	let z = parts.next()?.parse().ok()?;

	if parts.next()? != extension || parts.next().is_some() {
		return None;
	}

	Some(RegionPosition::new(x, z))
}

/// The region files of a world, opened lazily and kept open until [`RegionDirectory::close`].
pub struct RegionDirectory {
	directory: PathBuf,
	extension: String,
	files: FxHashMap<RegionPosition, Mutex<RegionFile>>
}

impl RegionDirectory {
	/// `extension` tells the legacy (`mcr`) and current (`mca`) region formats apart.
	pub fn new<P: Into<PathBuf>>(directory: P, extension: &str) -> Self {
		RegionDirectory {
			directory: directory.into(),
			extension: extension.to_string(),
			files: FxHashMap::default()
		}
	}

	pub fn directory(&self) -> &Path {
		&self.directory
	}

	pub fn extension(&self) -> &str {
		&self.extension
	}

	pub fn region_path(&self, position: RegionPosition) -> PathBuf {
		self.directory.join(format!("r.{}.{}.{}", position.x(), position.z(), self.extension))
	}

	/// Returns the open region file for a position, opening or creating it as needed.
	pub fn get_region_file(&mut self, position: RegionPosition) -> Result<&Mutex<RegionFile>, RegionError> {
		if !self.files.contains_key(&position) {
			fs::create_dir_all(&self.directory)?;

			let file = RegionFile::open(self.region_path(position), position)?;
			self.files.insert(position, Mutex::new(file));
		}

		Ok(&self.files[&position])
	}

	/// Like [`get_region_file`](Self::get_region_file), but never creates a file.
	fn existing_region_file(&mut self, position: RegionPosition) -> Result<Option<&Mutex<RegionFile>>, RegionError> {
		if !self.files.contains_key(&position) && !self.region_path(position).is_file() {
			return Ok(None);
		}

		self.get_region_file(position).map(Some)
	}

	pub fn contains_chunk(&mut self, position: ChunkPosition) -> Result<bool, RegionError> {
		Ok(match self.existing_region_file(position.region())? {
			Some(file) => lock(file).contains_chunk(position.local_x(), position.local_z()),
			None => false
		})
	}

	pub fn read_chunk(&mut self, position: ChunkPosition) -> Result<Option<RawChunk>, RegionError> {
		match self.existing_region_file(position.region())? {
			Some(file) => lock(file).read_chunk(position.local_x(), position.local_z()),
			None => Ok(None)
		}
	}

	pub fn write_chunk(&mut self, position: ChunkPosition, payload: &[u8], format: CompressionFormat) -> Result<(), RegionError> {
		let file = self.get_region_file(position.region())?;

		lock(file).write_chunk(position.local_x(), position.local_z(), payload, format)
	}

	/// Removes a chunk. A region file left without any chunks is deleted from disk.
	pub fn delete_chunk(&mut self, position: ChunkPosition) -> Result<bool, RegionError> {
		let region = position.region();

		let (deleted, empty) = match self.existing_region_file(region)? {
			Some(file) => {
				let mut file = lock(file);

				(file.delete_chunk(position.local_x(), position.local_z())?, file.is_empty())
			},
			None => return Ok(false)
		};

		if empty {
			self.remove_region_file(region)?;
		}

		Ok(deleted)
	}

	fn remove_region_file(&mut self, position: RegionPosition) -> Result<(), RegionError> {
		let path = self.region_path(position);

		debug!("Deleting empty region file {}", path.display());

		// Close the handle before removing the file
		self.files.remove(&position);
		fs::remove_file(path)?;

		Ok(())
	}

	/// Positions of every region file on disk with this directory's extension.
	pub fn region_positions(&self) -> Result<Vec<RegionPosition>, RegionError> {
		let entries = match fs::read_dir(&self.directory) {
			Ok(entries) => entries,
			Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
			Err(e) => return Err(e.into())
		};

		let mut positions = Vec::new();

		for entry in entries {
			let name = entry?.file_name();

			if let Some(position) = name.to_str().and_then(|name| parse_region_name(name, &self.extension)) {
				positions.push(position);
			}
		}

		positions.sort();

		Ok(positions)
	}

	/// Opens every region file on disk that isn't open yet. Files are opened in parallel; a file
	/// that fails to open is logged and skipped.
	fn open_all(&mut self) -> Result<(), RegionError> {
		let pending: Vec<(RegionPosition, PathBuf)> = self.region_positions()?
			.into_iter()
			.filter(|position| !self.files.contains_key(position))
			.map(|position| (position, self.region_path(position)))
			.collect();

		let opened: Vec<_> = pending.into_par_iter()
			.map(|(position, path)| (position, RegionFile::open(&path, position)))
			.collect();

		for (position, result) in opened {
			match result {
				Ok(file) => {
					self.files.insert(position, Mutex::new(file));
				},
				Err(e) => warn!("Skipping unreadable region file {}: {}", self.region_path(position).display(), e)
			}
		}

		Ok(())
	}

	/// Every chunk present on disk. Region files with an entirely empty offset table are deleted
	/// along the way.
	pub fn list_all_chunks(&mut self) -> Result<BTreeSet<ChunkPosition>, RegionError> {
		self.open_all()?;

		let scanned: Vec<(RegionPosition, Vec<ChunkPosition>)> = self.files.par_iter()
			.map(|(&position, file)| (position, lock(file).chunks()))
			.collect();

		let mut chunks = BTreeSet::new();

		for (position, present) in scanned {
			if present.is_empty() {
				self.remove_region_file(position)?;
			} else {
				chunks.extend(present);
			}
		}

		Ok(chunks)
	}

	/// Repairs every region file on disk, summing up the results.
	pub fn repair_all(&mut self) -> Result<RepairReport, RegionError> {
		self.open_all()?;

		let mut report = RepairReport::default();

		for file in self.files.values() {
			report += lock(file).repair()?;
		}

		info!("Repaired {} region file(s): removed {} chunks, recovered {} chunks", self.files.len(), report.deleted, report.recovered);

		Ok(report)
	}

	/// Drops every open file handle.
	pub fn close(&mut self) {
		self.files.clear();
	}
}

#[cfg(test)]
mod test {
	use super::*;
	use tempfile::TempDir;

	#[test]
	fn test_region_names() {
		assert_eq!(parse_region_name("r.-1.2.mca", "mca"), Some(RegionPosition::new(-1, 2)));
		assert_eq!(parse_region_name("r.-1.2.mcr", "mca"), None);
		assert_eq!(parse_region_name("r.1.mca", "mca"), None);
		assert_eq!(parse_region_name("r.a.b.mca", "mca"), None);
		assert_eq!(parse_region_name("level.dat", "mca"), None);
	}

	#[test]
	fn test_contains_does_not_create() {
		let dir = TempDir::new().unwrap();
		let mut regions = RegionDirectory::new(dir.path().join("region"), "mcr");

		assert!(!regions.contains_chunk(ChunkPosition::new(40, -3)).unwrap());
		assert!(regions.read_chunk(ChunkPosition::new(40, -3)).unwrap().is_none());
		assert!(!regions.region_path(RegionPosition::new(1, -1)).exists());
	}

	#[test]
	fn test_list_and_delete() {
		let dir = TempDir::new().unwrap();
		let mut regions = RegionDirectory::new(dir.path().join("region"), "mcr");

		let positions = [ChunkPosition::new(0, 0), ChunkPosition::new(-1, 5), ChunkPosition::new(70, -40)];

		for &position in &positions {
			regions.write_chunk(position, b"payload", CompressionFormat::Deflate).unwrap();
		}

		assert!(regions.contains_chunk(ChunkPosition::new(-1, 5)).unwrap());
		assert!(regions.region_path(RegionPosition::new(2, -2)).is_file());

		// A fresh directory object finds the same chunks by scanning the files
		let mut reopened = RegionDirectory::new(dir.path().join("region"), "mcr");
		let listed: Vec<_> = reopened.list_all_chunks().unwrap().into_iter().collect();

		let mut expected = positions.to_vec();
		expected.sort();

		assert_eq!(listed, expected);

		// Deleting the only chunk in a region removes the file
		assert!(reopened.delete_chunk(ChunkPosition::new(70, -40)).unwrap());
		assert!(!reopened.region_path(RegionPosition::new(2, -2)).exists());
		assert!(!reopened.contains_chunk(ChunkPosition::new(70, -40)).unwrap());
		assert!(!reopened.delete_chunk(ChunkPosition::new(70, -40)).unwrap());
	}

	#[test]
	fn test_list_removes_empty_files() {
		let dir = TempDir::new().unwrap();
		let mut regions = RegionDirectory::new(dir.path().join("region"), "mca");

		regions.get_region_file(RegionPosition::new(3, 3)).unwrap();
		regions.close();

		assert!(regions.region_path(RegionPosition::new(3, 3)).is_file());
		assert!(regions.list_all_chunks().unwrap().is_empty());
		assert!(!regions.region_path(RegionPosition::new(3, 3)).exists());
	}

	#[test]
	fn test_repair_all() {
		let dir = TempDir::new().unwrap();
		let mut regions = RegionDirectory::new(dir.path().join("region"), "mcr");

		regions.write_chunk(ChunkPosition::new(0, 0), b"not a chunk", CompressionFormat::Deflate).unwrap();
		regions.write_chunk(ChunkPosition::new(40, 0), b"not a chunk either", CompressionFormat::Deflate).unwrap();

		let report = regions.repair_all().unwrap();

		assert_eq!(report, RepairReport { deleted: 2, recovered: 0 });
		assert!(regions.list_all_chunks().unwrap().is_empty());
	}
}
