use nbt_turbo::ReadError;
use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RegionError {
	#[error("I/O error: {0}")]
	Io(#[from] io::Error),
	#[error("region file header is truncated ({0} bytes)")]
	TruncatedHeader(u64),
	#[error("unsupported compression format {0}")]
	UnsupportedFormat(u8),
	#[error("chunk needs {sectors} sectors, more than a region file can address")]
	ChunkTooLarge { sectors: usize },
	#[error("malformed region data: {0}")]
	Malformed(String),
	#[error("malformed chunk tag: {0}")]
	Nbt(#[from] ReadError)
}
