use crate::codec::CompressionFormat;
use crate::directory::RegionDirectory;
use crate::error::RegionError;
use crate::file::RepairReport;
use crate::legacy::LegacyStore;
use crate::raw::RawChunk;
use std::collections::BTreeSet;
use vocs::position::ChunkPosition;

/// Where a world keeps its chunks. Picked once when the world is opened.
pub enum StorageBackend {
	Legacy(LegacyStore),
	Region(RegionDirectory)
}

impl StorageBackend {
	/// The format chunks are written in, given the one the world asked for. Legacy chunk
	/// files are always gzip.
	pub fn write_format(&self, requested: CompressionFormat) -> CompressionFormat {
		match self {
			StorageBackend::Legacy(_) => CompressionFormat::Gzip,
			StorageBackend::Region(_) => requested
		}
	}

	pub fn contains_chunk(&mut self, position: ChunkPosition) -> Result<bool, RegionError> {
		match self {
			StorageBackend::Legacy(store) => Ok(store.contains_chunk(position)),
			StorageBackend::Region(regions) => regions.contains_chunk(position)
		}
	}

	pub fn read_chunk(&mut self, position: ChunkPosition) -> Result<Option<RawChunk>, RegionError> {
		match self {
			StorageBackend::Legacy(store) => store.read_chunk(position),
			StorageBackend::Region(regions) => regions.read_chunk(position)
		}
	}

	pub fn write_chunk(&mut self, position: ChunkPosition, payload: &[u8], format: CompressionFormat) -> Result<(), RegionError> {
		match self {
			StorageBackend::Legacy(store) => store.write_chunk(position, payload, format),
			StorageBackend::Region(regions) => regions.write_chunk(position, payload, format)
		}
	}

	pub fn delete_chunk(&mut self, position: ChunkPosition) -> Result<bool, RegionError> {
		match self {
			StorageBackend::Legacy(store) => store.delete_chunk(position),
			StorageBackend::Region(regions) => regions.delete_chunk(position)
		}
	}

	pub fn list_all_chunks(&mut self) -> Result<BTreeSet<ChunkPosition>, RegionError> {
		match self {
			StorageBackend::Legacy(store) => store.list_all_chunks(),
			StorageBackend::Region(regions) => regions.list_all_chunks()
		}
	}

	/// Legacy chunk files have no shared index, so there is nothing to repair.
	pub fn repair_all(&mut self) -> Result<RepairReport, RegionError> {
		match self {
			StorageBackend::Legacy(_) => Ok(RepairReport::default()),
			StorageBackend::Region(regions) => regions.repair_all()
		}
	}

	pub fn close(&mut self) {
		if let StorageBackend::Region(regions) = self {
			regions.close();
		}
	}
}
