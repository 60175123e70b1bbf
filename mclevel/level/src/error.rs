use region::RegionError;
use std::io;
use std::path::PathBuf;
use thiserror::Error;
use vocs::position::ChunkPosition;

#[derive(Debug, Error)]
pub enum ChunkError {
	#[error("chunk {0} is not present")]
	NotPresent(ChunkPosition),
	#[error("chunk {0} already exists")]
	AlreadyExists(ChunkPosition),
	#[error("chunk {position} is malformed: {reason}")]
	Malformed { position: ChunkPosition, reason: String },
	#[error(transparent)]
	Region(#[from] RegionError)
}

impl ChunkError {
	/// A malformed chunk counts as a missing one: callers that skip absent chunks skip
	/// malformed chunks the same way.
	pub fn is_not_present(&self) -> bool {
		matches!(self, ChunkError::NotPresent(_) | ChunkError::Malformed { .. })
	}

	pub(crate) fn malformed(position: ChunkPosition, reason: String) -> Self {
		ChunkError::Malformed { position, reason }
	}
}

#[derive(Debug, Error)]
pub enum WorldError {
	#[error("world directory {0} does not exist")]
	Missing(PathBuf),
	#[error("invalid settings: {0}")]
	Settings(String),
	#[error("I/O error: {0}")]
	Io(#[from] io::Error),
	#[error(transparent)]
	Region(#[from] RegionError),
	#[error(transparent)]
	Chunk(#[from] ChunkError)
}

#[cfg(test)]
mod test {
	use super::ChunkError;
	use vocs::position::ChunkPosition;

	#[test]
	fn test_malformed_is_not_present() {
		let position = ChunkPosition::new(1, -2);

		assert!(ChunkError::NotPresent(position).is_not_present());
		assert!(ChunkError::malformed(position, "bad".to_string()).is_not_present());
		assert!(!ChunkError::AlreadyExists(position).is_not_present());
	}
}
