use crate::error::RegionError;
use deflate::write::{GzEncoder, ZlibEncoder};
use deflate::Compression;
use flate2::read::{GzDecoder, ZlibDecoder};
use nbt_turbo::writer::Output;
use std::io::{self, Read, Write};

/// Compression scheme of a stored chunk, identified on disk by a single tag byte.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum CompressionFormat {
	/// Legacy gzip streams.
	Gzip = 1,
	/// zlib-wrapped deflate, the default for new writes.
	Deflate = 2
}

impl CompressionFormat {
	pub fn from_tag(tag: u8) -> Result<Self, RegionError> {
		match tag {
			1 => Ok(CompressionFormat::Gzip),
			2 => Ok(CompressionFormat::Deflate),
			other => Err(RegionError::UnsupportedFormat(other))
		}
	}

	pub fn tag(self) -> u8 {
		self as u8
	}
}

impl Default for CompressionFormat {
	fn default() -> Self {
		CompressionFormat::Deflate
	}
}

pub fn compress(bytes: &[u8], format: CompressionFormat) -> Result<Vec<u8>, RegionError> {
	let mut output = ChunkOutput::new(format);
	output.extend_from_slice(bytes);

	Ok(output.finish()?)
}

/// Upper bound on the decompressed size of a single chunk.
const MAX_CHUNK_BYTES: u64 = 16 * 1024 * 1024;

pub fn decompress(bytes: &[u8], format: CompressionFormat) -> Result<Vec<u8>, RegionError> {
	inflate(bytes, format, MAX_CHUNK_BYTES)
}

fn inflate(bytes: &[u8], format: CompressionFormat, limit: u64) -> Result<Vec<u8>, RegionError> {
	// Chunks usually inflate to several times their compressed size
	let mut decompressed = Vec::with_capacity((bytes.len() * 4).min(limit as usize));

	// One byte past the limit tells an oversized stream apart from one that fits exactly
	let result = match format {
		CompressionFormat::Gzip => GzDecoder::new(bytes).take(limit + 1).read_to_end(&mut decompressed),
		CompressionFormat::Deflate => ZlibDecoder::new(bytes).take(limit + 1).read_to_end(&mut decompressed)
	};

	// The input is already in memory, so any failure here is a corrupt stream
	result.map_err(|e| RegionError::Malformed(format!("corrupt {:?} stream: {}", format, e)))?;

	if decompressed.len() as u64 > limit {
		return Err(RegionError::Malformed(format!("{:?} stream inflates past {} bytes", format, limit)));
	}

	Ok(decompressed)
}

enum Encoder {
	Gzip(GzEncoder<Vec<u8>>),
	Zlib(ZlibEncoder<Vec<u8>>)
}

impl Encoder {
	fn write_all(&mut self, bytes: &[u8]) -> io::Result<()> {
		match self {
			Encoder::Gzip(encoder) => encoder.write_all(bytes),
			Encoder::Zlib(encoder) => encoder.write_all(bytes)
		}
	}

	fn finish(self) -> io::Result<Vec<u8>> {
		match self {
			Encoder::Gzip(encoder) => encoder.finish(),
			Encoder::Zlib(encoder) => encoder.finish()
		}
	}
}

/// Compresses tag output as it is written, so a serialized chunk never exists uncompressed.
///
/// `Output` can't fail, so the first error is held until [`ChunkOutput::finish`].
pub struct ChunkOutput {
	buffer: Vec<u8>,
	writer: Encoder,
	error: Option<io::Error>
}

impl ChunkOutput {
	pub fn new(format: CompressionFormat) -> Self {
		Self::with_capacity(format, 4096)
	}

	pub fn with_capacity(format: CompressionFormat, capacity: usize) -> Self {
		let out = Vec::with_capacity(capacity);

		ChunkOutput {
			buffer: Vec::with_capacity(256),
			writer: match format {
				CompressionFormat::Gzip => Encoder::Gzip(GzEncoder::new(out, Compression::Default)),
				CompressionFormat::Deflate => Encoder::Zlib(ZlibEncoder::new(out, Compression::Default))
			},
			error: None
		}
	}

	fn write(&mut self, bytes: &[u8]) {
		if self.error.is_some() {
			return;
		}

		if let Err(e) = self.writer.write_all(bytes) {
			self.error = Some(e);
		}
	}

	fn flush(&mut self) {
		let buffer = std::mem::take(&mut self.buffer);

		self.write(&buffer);

		self.buffer = buffer;
		self.buffer.clear();
	}

	fn maybe_flush(&mut self) {
		if self.buffer.len() > 255 {
			self.flush();
		}
	}

	pub fn finish(mut self) -> io::Result<Vec<u8>> {
		self.flush();

		match self.error {
			Some(e) => Err(e),
			None => self.writer.finish()
		}
	}
}

impl Output for ChunkOutput {
	fn push(&mut self, byte: u8) {
		self.buffer.push(byte);
		self.maybe_flush();
	}

	fn extend_from_slice(&mut self, slice: &[u8]) {
		if slice.len() < 128 {
			self.buffer.extend_from_slice(slice);
			self.maybe_flush();
		} else {
			self.flush();
			self.write(slice);
		}
	}
}
