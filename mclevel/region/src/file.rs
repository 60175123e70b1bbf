use crate::codec::CompressionFormat;
use crate::error::RegionError;
use crate::location::{sectors_needed, ChunkHeader, ChunkLocation, ChunkTimestamp, HEADER_SECTORS, MAX_CHUNK_SECTORS, SECTOR_BYTES};
use crate::raw::{stored_position, RawChunk};
use bit_vec::BitVec;
use log::{debug, info, warn};
use std::collections::BTreeMap;
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::ops::AddAssign;
use std::path::{Path, PathBuf};
use vocs::position::{ChunkPosition, RegionPosition};

/// Number of chunk slots in a region file.
const ENTRIES: usize = 1024;

/// Outcome of a repair.
#[derive(Debug, Default, Copy, Clone, Eq, PartialEq)]
pub struct RepairReport {
	/// Entries that were cleared from the offset table.
	pub deleted: usize,
	/// Chunks found in the wrong slot, or sharing sectors, that were moved back into their own slot.
	pub recovered: usize
}

impl AddAssign for RepairReport {
	fn add_assign(&mut self, rhs: RepairReport) {
		self.deleted += rhs.deleted;
		self.recovered += rhs.recovered;
	}
}

fn entry_index(local_x: u8, local_z: u8) -> usize {
	assert!(local_x < 32 && local_z < 32, "Chunk location out of bounds in region file: {}, {}", local_x, local_z);

	(local_x as usize) | ((local_z as usize) << 5)
}

fn read_table(bytes: &[u8]) -> Box<[u32; ENTRIES]> {
	let mut table = Box::new([0; ENTRIES]);

	for (entry, word) in table.iter_mut().zip(bytes.chunks_exact(4)) {
		*entry = u32::from_be_bytes([word[0], word[1], word[2], word[3]]);
	}

	table
}

fn table_bytes(table: &[u32; ENTRIES]) -> Vec<u8> {
	table.iter().flat_map(|entry| entry.to_be_bytes()).collect()
}

/// A region file: up to 32×32 chunks stored in 4096-byte sectors behind an offset table and a
/// timestamp table.
///
/// Free sectors are tracked in memory and rebuilt from the offset table on open. A chunk that
/// outgrows its sectors moves to the first free run large enough, or to new sectors appended
/// at the end of the file.
pub struct RegionFile {
	path: PathBuf,
	position: RegionPosition,
	file: File,
	offsets: Box<[u32; ENTRIES]>,
	timestamps: Box<[u32; ENTRIES]>,
	/// One entry per sector in the file, true if no chunk uses it.
	free: BitVec
}

impl RegionFile {
	/// Opens a region file, creating it if it does not exist. Inconsistent offset tables are
	/// repaired before this returns.
	pub fn open<P: AsRef<Path>>(path: P, position: RegionPosition) -> Result<Self, RegionError> {
		let path = path.as_ref().to_path_buf();
		let mut file = OpenOptions::new().read(true).write(true).create(true).open(&path)?;

		let header_len = (HEADER_SECTORS * SECTOR_BYTES) as u64;
		let mut len = file.metadata()?.len();

		if len == 0 {
			debug!("Creating region file {}", path.display());

			file.write_all(&[0; HEADER_SECTORS * SECTOR_BYTES])?;
			len = header_len;
		} else if len < header_len {
			return Err(RegionError::TruncatedHeader(len));
		}

		if len % SECTOR_BYTES as u64 != 0 {
			let padded = (len / SECTOR_BYTES as u64 + 1) * SECTOR_BYTES as u64;

			debug!("Padding region file {} from {} to {} bytes", path.display(), len, padded);

			file.set_len(padded)?;
			len = padded;
		}

		let mut header = vec![0; HEADER_SECTORS * SECTOR_BYTES];

		file.seek(SeekFrom::Start(0))?;
		file.read_exact(&mut header)?;

		let mut region = RegionFile {
			path,
			position,
			file,
			offsets: read_table(&header[..SECTOR_BYTES]),
			timestamps: read_table(&header[SECTOR_BYTES..]),
			free: BitVec::new()
		};

		if !region.rebuild_free(len as usize / SECTOR_BYTES) {
			warn!("Region file {} has overlapping or out of range chunks, repairing", region.path.display());

			region.repair()?;
		}

		Ok(region)
	}

	pub fn path(&self) -> &Path {
		&self.path
	}

	pub fn position(&self) -> RegionPosition {
		self.position
	}

	/// Number of sectors in the file, header included.
	pub fn sector_count(&self) -> usize {
		self.free.len()
	}

	pub fn free_sectors(&self) -> &BitVec {
		&self.free
	}

	/// Recomputes the free sector vector from the offset table. Returns false if any entry runs
	/// past the end of the file or shares sectors with the header or another chunk.
	fn rebuild_free(&mut self, sectors: usize) -> bool {
		let mut free = BitVec::from_elem(sectors, true);
		let mut consistent = true;

		for sector in 0..HEADER_SECTORS.min(sectors) {
			free.set(sector, false);
		}

		for &word in self.offsets.iter() {
			let location = match ChunkLocation::new(word) {
				Some(location) => location,
				None => continue
			};

			if location.len() == 0 || location.end() as usize > sectors {
				consistent = false;
				continue;
			}

			for sector in location.sectors() {
				if !free[sector] {
					consistent = false;
				}

				free.set(sector, false);
			}
		}

		self.free = free;

		consistent
	}

	pub fn get_offset(&self, local_x: u8, local_z: u8) -> u32 {
		self.offsets[entry_index(local_x, local_z)]
	}

	/// Sets an entry of the offset table and writes the whole table back to disk. This does not
	/// touch the free sector vector.
	pub fn set_offset(&mut self, local_x: u8, local_z: u8, word: u32) -> Result<(), RegionError> {
		self.offsets[entry_index(local_x, local_z)] = word;

		let bytes = table_bytes(&self.offsets);

		self.file.seek(SeekFrom::Start(0))?;
		self.file.write_all(&bytes)?;

		Ok(())
	}

	pub fn timestamp(&self, local_x: u8, local_z: u8) -> ChunkTimestamp {
		ChunkTimestamp::from_unix_seconds(self.timestamps[entry_index(local_x, local_z)])
	}

	pub fn set_timestamp(&mut self, local_x: u8, local_z: u8, timestamp: ChunkTimestamp) -> Result<(), RegionError> {
		self.timestamps[entry_index(local_x, local_z)] = timestamp.into_unix_seconds();

		let bytes = table_bytes(&self.timestamps);

		self.file.seek(SeekFrom::Start(SECTOR_BYTES as u64))?;
		self.file.write_all(&bytes)?;

		Ok(())
	}

	pub fn contains_chunk(&self, local_x: u8, local_z: u8) -> bool {
		self.get_offset(local_x, local_z) != 0
	}

	/// Whether every entry of the offset table is zero.
	pub fn is_empty(&self) -> bool {
		self.offsets.iter().all(|&word| word == 0)
	}

	/// Absolute positions of every chunk in this region, in offset table order.
	pub fn chunks(&self) -> Vec<ChunkPosition> {
		self.offsets.iter()
			.enumerate()
			.filter(|&(_, &word)| word != 0)
			.map(|(index, _)| self.position.chunk((index & 31) as u8, (index >> 5) as u8))
			.collect()
	}

	/// Reads the stored form of a chunk. Returns None if the chunk is absent or its entry points
	/// outside of the file.
	pub fn read_chunk(&mut self, local_x: u8, local_z: u8) -> Result<Option<RawChunk>, RegionError> {
		let location = match ChunkLocation::new(self.get_offset(local_x, local_z)) {
			Some(location) => location,
			None => return Ok(None)
		};

		if location.len() == 0 || location.end() as usize > self.sector_count() {
			warn!("Chunk ({}, {}) in {} is {}, outside of the file", local_x, local_z, self.path.display(), location);

			return Ok(None);
		}

		let mut data = vec![0; location.len_bytes()];

		self.file.seek(SeekFrom::Start(location.offset_bytes()))?;
		self.file.read_exact(&mut data)?;

		let header = ChunkHeader::from_bytes([data[0], data[1], data[2], data[3], data[4]]);
		let payload_len = header.payload_len();

		if header.len == 0 || payload_len > data.len() - 5 {
			return Err(RegionError::Malformed(format!(
				"chunk ({}, {}) claims {} bytes but only has {} sectors", local_x, local_z, header.len, location.len()
			)));
		}

		data.truncate(5 + payload_len);
		data.drain(..5);

		Ok(Some(RawChunk::from_parts(header.compression, data)))
	}

	/// Stores an already compressed chunk payload.
	///
	/// Payloads needing 256 sectors or more can't be addressed and are rejected without touching
	/// the file. When the chunk moves, its new sectors are written and synced before the offset
	/// table points at them, and the old sectors are only freed afterwards.
	pub fn write_chunk(&mut self, local_x: u8, local_z: u8, payload: &[u8], format: CompressionFormat) -> Result<(), RegionError> {
		let needed = sectors_needed(payload.len());

		if needed >= MAX_CHUNK_SECTORS {
			warn!(
				"Refusing to write chunk ({}, {}) to {}: {} bytes needs {} sectors",
				local_x, local_z, self.path.display(), payload.len(), needed
			);

			return Err(RegionError::ChunkTooLarge { sectors: needed });
		}

		let existing = ChunkLocation::new(self.get_offset(local_x, local_z));

		let mut data = Vec::with_capacity(needed * SECTOR_BYTES);
		data.extend_from_slice(&ChunkHeader { len: payload.len() as u32 + 1, compression: format.tag() }.into_bytes());
		data.extend_from_slice(payload);
		data.resize(needed * SECTOR_BYTES, 0);

		match existing {
			Some(location) if location.len() as usize >= needed => {
				debug!("Rewriting chunk ({}, {}) in place {}, {} bytes", local_x, local_z, location, payload.len());

				self.write_sectors(location.offset() as usize, &data)?;
				self.file.sync_data()?;
			},
			_ => {
				let start = match self.find_free_run(needed) {
					Some(start) => start,
					None => self.grow(needed)?
				};

				debug!("Writing chunk ({}, {}) to {} new sector(s) at {}, {} bytes", local_x, local_z, needed, start, payload.len());

				self.write_sectors(start, &data)?;
				self.file.sync_data()?;

				for sector in start..start + needed {
					self.free.set(sector, false);
				}

				self.set_offset(local_x, local_z, ChunkLocation::from_parts(start as u32, needed as u8).inner())?;

				if let Some(old) = existing {
					self.release(old);
				}
			}
		}

		self.set_timestamp(local_x, local_z, ChunkTimestamp::now().unwrap_or_default())
	}

	/// Removes a chunk from the offset table and frees its sectors. Returns whether it was present.
	pub fn delete_chunk(&mut self, local_x: u8, local_z: u8) -> Result<bool, RegionError> {
		let location = match ChunkLocation::new(self.get_offset(local_x, local_z)) {
			Some(location) => location,
			None => return Ok(false)
		};

		self.set_offset(local_x, local_z, 0)?;
		self.release(location);

		Ok(true)
	}

	fn release(&mut self, location: ChunkLocation) {
		for sector in location.sectors() {
			if sector >= HEADER_SECTORS && sector < self.free.len() {
				self.free.set(sector, true);
			}
		}
	}

	/// Finds the first run of at least `needed` free sectors.
	fn find_free_run(&self, needed: usize) -> Option<usize> {
		let mut run_start = 0;
		let mut run_len = 0;

		for (sector, free) in self.free.iter().enumerate() {
			if !free {
				run_len = 0;
				continue;
			}

			if run_len == 0 {
				run_start = sector;
			}

			run_len += 1;

			if run_len >= needed {
				return Some(run_start);
			}
		}

		None
	}

	/// Appends exactly `sectors` free sectors to the file, returning the first one.
	fn grow(&mut self, sectors: usize) -> Result<usize, RegionError> {
		let start = self.free.len();

		self.file.set_len(((start + sectors) * SECTOR_BYTES) as u64)?;
		self.free.grow(sectors, true);

		Ok(start)
	}

	fn write_sectors(&mut self, start: usize, data: &[u8]) -> Result<(), RegionError> {
		self.file.seek(SeekFrom::Start((start * SECTOR_BYTES) as u64))?;
		self.file.write_all(data)?;

		Ok(())
	}

	/// Reads and parses a chunk, returning it along with the world position recorded inside it.
	fn inspect(&mut self, local_x: u8, local_z: u8) -> Result<(RawChunk, ChunkPosition), RegionError> {
		let raw = self.read_chunk(local_x, local_z)?
			.ok_or_else(|| RegionError::Malformed(format!("failed to read chunk data for ({}, {})", local_x, local_z)))?;

		let root = raw.parse()?;
		let (x, z) = stored_position(&root)
			.ok_or_else(|| RegionError::Malformed("chunk has no xPos / zPos".to_string()))?;

		Ok((raw, ChunkPosition::new(x, z)))
	}

	/// Validates every entry of the offset table against the file and the chunks themselves.
	///
	/// Entries that run past the end of the file, can't be parsed, share sectors with an earlier
	/// chunk, or hold a chunk recording a different position are cleared. Chunks of this region
	/// found in the wrong slot, or sharing sectors, are then written back into their own slot if it
	/// is empty. Chunks recording a position in another region are dropped.
	pub fn repair(&mut self) -> Result<RepairReport, RegionError> {
		let sectors = self.sector_count();
		let mut claimed = BitVec::from_elem(sectors, false);
		let mut lost_and_found = BTreeMap::new();
		let mut report = RepairReport::default();

		for sector in 0..HEADER_SECTORS.min(sectors) {
			claimed.set(sector, true);
		}

		info!(
			"Beginning repairs on {} ({} chunks)",
			self.path.display(), self.offsets.iter().filter(|&&word| word != 0).count()
		);

		for index in 0..ENTRIES {
			let location = match ChunkLocation::new(self.offsets[index]) {
				Some(location) => location,
				None => continue
			};

			let slot = ((index & 31) as u8, (index >> 5) as u8);
			let expected = self.position.chunk(slot.0, slot.1);

			let problem = if location.len() == 0 || location.end() as usize > sectors {
				Some(format!("offset {} at index {} points outside of the file", location, index))
			} else {
				match self.inspect(slot.0, slot.1) {
					Ok((raw, found)) => {
						let mut overlaps = false;

						for sector in location.sectors() {
							if claimed[sector] {
								overlaps = true;
							}

							claimed.set(sector, true);
						}

						let foreign = found.region() != self.position;

						if !foreign && (found != expected || overlaps) {
							lost_and_found.insert((found.local_x(), found.local_z()), raw);
						}

						if foreign {
							Some(format!("chunk {} belongs to region {}, not {}", found, found.region(), self.position))
						} else if found != expected {
							Some(format!("chunk {} was found in the slot reserved for {}", found, expected))
						} else if overlaps {
							Some(format!("chunk {} has sectors overlapping another chunk", found))
						} else {
							None
						}
					},
					Err(e) => Some(e.to_string())
				}
			};

			if let Some(problem) = problem {
				info!("Unexpected chunk data at sector {} ({})", location.offset(), problem);

				self.set_offset(slot.0, slot.1, 0)?;
				report.deleted += 1;
			}
		}

		self.rebuild_free(sectors);

		for ((local_x, local_z), raw) in lost_and_found {
			if self.contains_chunk(local_x, local_z) {
				continue;
			}

			// Parsing already succeeded, so the format is known
			let format = raw.format()?;

			info!("Found chunk ({}, {}) and its slot is empty, recovering it", local_x, local_z);

			self.write_chunk(local_x, local_z, raw.payload(), format)?;
			report.recovered += 1;
		}

		info!(
			"Repair of {} complete. Removed {} chunks, recovered {} chunks",
			self.path.display(), report.deleted, report.recovered
		);

		Ok(report)
	}
}
