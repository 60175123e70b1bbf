use crate::tag::{Compound, List, Tag};
use crate::writer::Kind;
use thiserror::Error;

/// Nesting limit for lists and compounds, guarding the recursive reader against hostile input.
const MAX_DEPTH: usize = 512;

#[derive(Debug, Error, Clone, Eq, PartialEq)]
pub enum ReadError {
	#[error("unexpected end of input at byte {0}")]
	Truncated(usize),
	#[error("unknown tag kind {kind} at byte {offset}")]
	UnknownKind { kind: u8, offset: usize },
	#[error("the root tag must be a compound, found kind {0}")]
	RootNotCompound(u8),
	#[error("negative length {length} at byte {offset}")]
	NegativeLength { length: i32, offset: usize },
	#[error("tags nested deeper than {0} levels")]
	TooDeep(usize)
}

/// Parses a complete tag tree, returning the root name and compound.
/// Trailing bytes after the root compound are ignored.
pub fn parse(data: &[u8]) -> Result<(String, Compound), ReadError> {
	let mut reader = Reader { data, position: 0, depth: 0 };

	let kind = reader.u8()?;

	if kind != Kind::Compound as u8 {
		return Err(ReadError::RootNotCompound(kind));
	}

	let name = reader.string()?;
	let root = reader.compound()?;

	Ok((name, root))
}

struct Reader<'a> {
	data: &'a [u8],
	position: usize,
	depth: usize
}

impl<'a> Reader<'a> {
	fn take(&mut self, len: usize) -> Result<&'a [u8], ReadError> {
		let end = self.position.checked_add(len).ok_or(ReadError::Truncated(self.position))?;

		if end > self.data.len() {
			return Err(ReadError::Truncated(self.position));
		}

		let slice = &self.data[self.position..end];
		self.position = end;

		Ok(slice)
	}

	fn array<const N: usize>(&mut self) -> Result<[u8; N], ReadError> {
		let mut bytes = [0; N];
		bytes.copy_from_slice(self.take(N)?);

		Ok(bytes)
	}

	fn u8(&mut self) -> Result<u8, ReadError> {
		Ok(self.take(1)?[0])
	}

	fn length(&mut self) -> Result<usize, ReadError> {
		let offset = self.position;
		let length = i32::from_be_bytes(self.array()?);

		if length < 0 {
			return Err(ReadError::NegativeLength { length, offset });
		}

		Ok(length as usize)
	}

	fn string(&mut self) -> Result<String, ReadError> {
		let len = u16::from_be_bytes(self.array()?) as usize;

		// Java writes modified UTF-8; anything that isn't plain UTF-8 is kept lossily.
		Ok(String::from_utf8_lossy(self.take(len)?).into_owned())
	}

	fn kind(&mut self) -> Result<Kind, ReadError> {
		let offset = self.position;
		let id = self.u8()?;

		Kind::from_id(id).ok_or(ReadError::UnknownKind { kind: id, offset })
	}

	fn enter(&mut self) -> Result<(), ReadError> {
		self.depth += 1;

		if self.depth > MAX_DEPTH {
			return Err(ReadError::TooDeep(MAX_DEPTH));
		}

		Ok(())
	}

	fn compound(&mut self) -> Result<Compound, ReadError> {
		self.enter()?;

		let mut compound = Compound::new();

		loop {
			let kind = self.kind()?;

			if kind == Kind::End {
				break;
			}

			let name = self.string()?;
			let tag = self.payload(kind)?;

			compound.insert(name, tag);
		}

		self.depth -= 1;

		Ok(compound)
	}

	fn list(&mut self) -> Result<List, ReadError> {
		self.enter()?;

		let kind = self.kind()?;
		let len = self.length()?;

		// Don't trust the length for preallocation, a truncated stream would fail anyway.
		let mut items = Vec::with_capacity(len.min(4096));

		if kind != Kind::End {
			for _ in 0..len {
				items.push(self.payload(kind)?);
			}
		}

		self.depth -= 1;

		Ok(List::from_parts(kind, items))
	}

	fn payload(&mut self, kind: Kind) -> Result<Tag, ReadError> {
		Ok(match kind {
			Kind::End => return Err(ReadError::UnknownKind { kind: 0, offset: self.position }),
			Kind::I8 => Tag::I8(self.u8()? as i8),
			Kind::I16 => Tag::I16(i16::from_be_bytes(self.array()?)),
			Kind::I32 => Tag::I32(i32::from_be_bytes(self.array()?)),
			Kind::I64 => Tag::I64(i64::from_be_bytes(self.array()?)),
			Kind::F32 => Tag::F32(f32::from_bits(u32::from_be_bytes(self.array()?))),
			Kind::F64 => Tag::F64(f64::from_bits(u64::from_be_bytes(self.array()?))),
			Kind::U8Array => {
				let len = self.length()?;

				Tag::U8Array(self.take(len)?.to_vec())
			},
			Kind::String => Tag::String(self.string()?),
			Kind::List => Tag::List(self.list()?),
			Kind::Compound => Tag::Compound(self.compound()?),
			Kind::U32Array => {
				let len = self.length()?;
				let bytes = self.take(len.checked_mul(4).ok_or(ReadError::Truncated(self.position))?)?;

				Tag::U32Array(bytes.chunks_exact(4).map(|word| u32::from_be_bytes([word[0], word[1], word[2], word[3]])).collect())
			},
			Kind::I64Array => {
				let len = self.length()?;
				let bytes = self.take(len.checked_mul(8).ok_or(ReadError::Truncated(self.position))?)?;

				Tag::I64Array(bytes.chunks_exact(8).map(|word| {
					let mut value = [0u8; 8];
					value.copy_from_slice(word);

					i64::from_be_bytes(value)
				}).collect())
			}
		})
	}
}

#[cfg(test)]
mod test {
	use super::{parse, ReadError};
	use crate::tag::{Compound, List, Tag};
	use crate::writer::CompoundWriter;

	#[test]
	fn test_parse_chunk_like_tree() {
		let buffer = CompoundWriter::write("", Vec::new(), |writer| {
			writer.compound("Level", |level| {
				level
					.i32("xPos", -3)
					.i32("zPos", 7)
					.i64("LastUpdate", 1 << 40)
					.bool("TerrainPopulated", true)
					.u8_array("Blocks", &[1, 2, 3, 4])
					.u32_array("HeightMap", &[64, 65])
					.string("Name", "spawn")
					.compound_array("Entities", 1, |entities| {
						entities.compound(|entity| {
							entity.string("id", "Pig").f64("Health", 10.0);
						});
					})
					.compound_array("TileEntities", 0, |_| {});
			});
		});

		let (name, root) = parse(&buffer).unwrap();
		let level = root.get_compound("Level").unwrap();

		assert_eq!(name, "");
		assert_eq!(level.get_i32("xPos"), Some(-3));
		assert_eq!(level.get_i32("zPos"), Some(7));
		assert_eq!(level.get_i64("LastUpdate"), Some(1 << 40));
		assert_eq!(level.get_i8("TerrainPopulated"), Some(1));
		assert_eq!(level.get_u8_array("Blocks"), Some(&[1, 2, 3, 4][..]));
		assert_eq!(level.get_u32_array("HeightMap"), Some(&[64, 65][..]));
		assert_eq!(level.get_list("Entities").unwrap().len(), 1);
		assert!(level.get_list("TileEntities").unwrap().is_empty());

		// Writing the parsed tree back out reproduces the original bytes
		let rewritten = CompoundWriter::write_tree("", Vec::new(), &root);
		assert_eq!(rewritten, buffer);
	}

	#[test]
	fn test_nested_lists() {
		let mut inner = List::new(crate::writer::Kind::I64);
		inner.push(Tag::I64(9));

		let mut outer = List::new(crate::writer::Kind::List);
		outer.push(Tag::List(inner));

		let mut tree = Compound::new();
		tree.insert("Nested", Tag::List(outer.clone()));
		tree.insert("Longs", Tag::I64Array(vec![-1, 2]));

		let buffer = CompoundWriter::write_tree("root", Vec::new(), &tree);
		let (name, parsed) = parse(&buffer).unwrap();

		assert_eq!(name, "root");
		assert_eq!(parsed, tree);
	}

	#[test]
	fn test_truncated() {
		let buffer = CompoundWriter::write("", Vec::new(), |writer| {
			writer.u8_array("Blocks", &[0; 32]);
		});

		match parse(&buffer[..buffer.len() - 10]) {
			Err(ReadError::Truncated(_)) => (),
			other => panic!("expected truncation error, got {:?}", other)
		}
	}

	#[test]
	fn test_unknown_kind() {
		let buffer = [10, 0, 0, 42, 0, 0];

		assert_eq!(parse(&buffer), Err(ReadError::UnknownKind { kind: 42, offset: 3 }));
	}

	#[test]
	fn test_root_must_be_compound() {
		assert_eq!(parse(&[1, 0, 0, 5]), Err(ReadError::RootNotCompound(1)));
	}
}
