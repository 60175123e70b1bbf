use crate::layout::ChunkLayout;
use region::{LegacyStore, RegionDirectory, StorageBackend};
use std::fs;
use std::path::Path;

/// The on-disk generations of a world directory.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum WorldFormat {
	/// One gzip file per chunk, nested in base 36 directories.
	Legacy,
	/// `region/r.<x>.<z>.mcr` files holding flat chunks.
	McRegion,
	/// `region/r.<x>.<z>.mca` files holding sectioned chunks.
	Anvil
}

fn file_names(path: &Path) -> Vec<String> {
	fs::read_dir(path)
		.map(|entries| entries.filter_map(Result::ok).filter_map(|entry| entry.file_name().into_string().ok()).collect())
		.unwrap_or_default()
}

/// Legacy chunk directories are named after the low six bits of a coordinate.
fn is_legacy_directory(name: &str) -> bool {
	i32::from_str_radix(name, 36).map_or(false, |value| (0..64).contains(&value))
}

impl WorldFormat {
	/// Works out the format of an existing world directory. None if nothing gives it away,
	/// as with a fresh, empty directory.
	pub fn detect(path: &Path) -> Option<WorldFormat> {
		let region = path.join("region");

		if region.is_dir() {
			let anvil = file_names(&region).iter().any(|name| name.ends_with(".mca"));

			return Some(if anvil { WorldFormat::Anvil } else { WorldFormat::McRegion });
		}

		let legacy = file_names(path).iter().any(|name| is_legacy_directory(name) && path.join(name).is_dir());

		if legacy {
			Some(WorldFormat::Legacy)
		} else {
			None
		}
	}

	pub fn layout(self) -> ChunkLayout {
		match self {
			WorldFormat::Legacy | WorldFormat::McRegion => ChunkLayout::Flat,
			WorldFormat::Anvil => ChunkLayout::Sectioned
		}
	}

	pub(crate) fn storage(self, path: &Path) -> StorageBackend {
		match self {
			WorldFormat::Legacy => StorageBackend::Legacy(LegacyStore::new(path)),
			WorldFormat::McRegion => StorageBackend::Region(RegionDirectory::new(path.join("region"), "mcr")),
			WorldFormat::Anvil => StorageBackend::Region(RegionDirectory::new(path.join("region"), "mca"))
		}
	}
}

#[cfg(test)]
mod test {
	use super::WorldFormat;
	use std::fs;
	use tempfile::TempDir;

	#[test]
	fn test_empty_directory() {
		let dir = TempDir::new().unwrap();

		assert_eq!(WorldFormat::detect(dir.path()), None);
	}

	#[test]
	fn test_region_formats() {
		let dir = TempDir::new().unwrap();
		fs::create_dir(dir.path().join("region")).unwrap();

		assert_eq!(WorldFormat::detect(dir.path()), Some(WorldFormat::McRegion));

		fs::write(dir.path().join("region").join("r.0.0.mca"), b"").unwrap();
		assert_eq!(WorldFormat::detect(dir.path()), Some(WorldFormat::Anvil));
	}

	#[test]
	fn test_legacy() {
		let dir = TempDir::new().unwrap();
		fs::create_dir(dir.path().join("data")).unwrap();
		fs::create_dir(dir.path().join("DIM-1")).unwrap();

		assert_eq!(WorldFormat::detect(dir.path()), None);

		fs::create_dir(dir.path().join("1r")).unwrap();
		assert_eq!(WorldFormat::detect(dir.path()), Some(WorldFormat::Legacy));
	}
}
