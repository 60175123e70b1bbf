use crate::tag::{Compound, List, Tag};

#[derive(Debug, Copy, Clone, Eq, PartialEq, Default)]
pub enum Kind {
	#[default]
	End,
	I8,
	I16,
	I32,
	I64,
	F32,
	F64,
	U8Array,
	String,
	List,
	Compound,
	U32Array,
	I64Array
}

impl Kind {
	pub fn from_id(id: u8) -> Option<Kind> {
		Some(match id {
			0 => Kind::End,
			1 => Kind::I8,
			2 => Kind::I16,
			3 => Kind::I32,
			4 => Kind::I64,
			5 => Kind::F32,
			6 => Kind::F64,
			7 => Kind::U8Array,
			8 => Kind::String,
			9 => Kind::List,
			10 => Kind::Compound,
			11 => Kind::U32Array,
			12 => Kind::I64Array,
			_ => return None
		})
	}
}

pub trait Output {
	fn push(&mut self, value: u8);
	fn extend_from_slice(&mut self, slice: &[u8]);
}

impl<T> Output for &mut T where T: Output {
	fn push(&mut self, value: u8) {
		T::push(self, value)
	}

	fn extend_from_slice(&mut self, slice: &[u8]) {
		T::extend_from_slice(self, slice);
	}
}

impl Output for Vec<u8> {
	fn push(&mut self, value: u8) {
		Vec::push(self, value)
	}

	fn extend_from_slice(&mut self, slice: &[u8]) {
		Vec::extend_from_slice(self, slice)
	}
}

pub struct CompoundWriter<T: Output> {
	out: T
}

impl<T: Output> CompoundWriter<T> {
	/// Begins a new compound tag.
	pub fn start(name: &str, out: T) -> Self {
		let mut writer = CompoundWriter { out };

		writer.header(Kind::Compound, name);
		writer
	}

	pub fn write<F>(name: &str, out: T, filler: F) -> T where F: FnOnce(&mut CompoundWriter<T>) {
		let mut writer = CompoundWriter::start(name, out);

		filler(&mut writer);

		writer.end()
	}

	/// Writes an entire tree as a named root compound.
	pub fn write_tree(name: &str, out: T, tree: &Compound) -> T {
		CompoundWriter::write(name, out, |writer| {
			writer.entries(tree);
		})
	}

	/// Ends the compound tag, returning the buffer.
	pub fn end(mut self) -> T {
		self.out.push(0);
		self.out
	}

	fn header(&mut self, kind: Kind, name: &str) {
		write_name(&mut self.out, kind, name);
	}

	pub fn bool(&mut self, name: &str, value: bool) -> &mut Self {
		self.i8(name, value as i8)
	}

	pub fn i8(&mut self, name: &str, value: i8) -> &mut Self {
		self.header(Kind::I8, name);
		self.out.push(value as u8);

		self
	}

	pub fn i16(&mut self, name: &str, value: i16) -> &mut Self {
		self.header(Kind::I16, name);
		self.out.extend_from_slice(&value.to_be_bytes());

		self
	}

	pub fn i32(&mut self, name: &str, value: i32) -> &mut Self {
		self.header(Kind::I32, name);
		self.out.extend_from_slice(&value.to_be_bytes());

		self
	}

	pub fn i64(&mut self, name: &str, value: i64) -> &mut Self {
		self.header(Kind::I64, name);
		self.out.extend_from_slice(&value.to_be_bytes());

		self
	}

	pub fn f32(&mut self, name: &str, value: f32) -> &mut Self {
		self.header(Kind::F32, name);
		self.out.extend_from_slice(&value.to_bits().to_be_bytes());

		self
	}

	pub fn f64(&mut self, name: &str, value: f64) -> &mut Self {
		self.header(Kind::F64, name);
		self.out.extend_from_slice(&value.to_bits().to_be_bytes());

		self
	}

	pub fn string(&mut self, name: &str, value: &str) -> &mut Self {
		self.header(Kind::String, name);
		write_string(&mut self.out, value);

		self
	}

	pub fn u8_array(&mut self, name: &str, value: &[u8]) -> &mut Self {
		self.header(Kind::U8Array, name);
		array_length(&mut self.out, value.len());

		self.out.extend_from_slice(value);

		self
	}

	pub fn u32_array(&mut self, name: &str, value: &[u32]) -> &mut Self {
		self.header(Kind::U32Array, name);
		array_length(&mut self.out, value.len());

		for &entry in value {
			self.out.extend_from_slice(&entry.to_be_bytes());
		}

		self
	}

	pub fn i64_array(&mut self, name: &str, value: &[i64]) -> &mut Self {
		self.header(Kind::I64Array, name);
		array_length(&mut self.out, value.len());

		for &entry in value {
			self.out.extend_from_slice(&entry.to_be_bytes());
		}

		self
	}

	/// Writes an arbitrary tag, recursing into lists and compounds.
	pub fn tag(&mut self, name: &str, tag: &Tag) -> &mut Self {
		self.header(tag.kind(), name);
		write_payload(&mut self.out, tag);

		self
	}

	/// Writes every entry of a compound into this one, in order.
	pub fn entries(&mut self, compound: &Compound) -> &mut Self {
		for (name, tag) in compound.iter() {
			self.tag(name, tag);
		}

		self
	}

	pub fn compound_writer(&mut self, name: &str) -> CompoundWriter<&mut T> {
		CompoundWriter::start(name, &mut self.out)
	}

	pub fn compound<F>(&mut self, name: &str, filler: F) -> &mut Self where F: FnOnce(&mut CompoundWriter<&mut T>) {
		let mut writer = CompoundWriter::start(name, &mut self.out);

		filler(&mut writer);

		writer.end();

		self
	}

	pub fn compound_array<F>(&mut self, name: &str, len: usize, filler: F) -> &mut Self where F: FnOnce(&mut CompoundArrayWriter<T>) {
		self.header(Kind::List, name);

		if len == 0 {
			// Kind::End + length of 0
			self.out.extend_from_slice(&[0; 5]);

			return self;
		}

		self.out.push(Kind::Compound as u8);
		array_length(&mut self.out, len);

		let mut writer = CompoundArrayWriter {
			out: &mut self.out,
			remaining: len
		};

		filler(&mut writer);

		assert_eq!(writer.remaining, 0, "Attempted to end an incomplete CompoundArrayWriter, {} element(s) remaining", writer.remaining);

		self
	}
}

pub struct CompoundArrayWriter<'w, T: Output> {
	out: &'w mut T,
	remaining: usize
}

impl<'w, T> CompoundArrayWriter<'w, T> where T: Output {
	pub fn compound<F>(&mut self, filler: F) where F: FnOnce(&mut CompoundWriter<&mut T>) {
		assert_ne!(self.remaining, 0);
		self.remaining -= 1;

		let mut writer = CompoundWriter {
			// re-borrow the output
			out: &mut *self.out
		};

		filler(&mut writer);

		writer.end();
	}
}

fn write_name<T: Output>(out: &mut T, kind: Kind, name: &str) {
	out.push(kind as u8);

	assert!(name.len() <= 32767, "Tag name too long: {}", name);
	out.extend_from_slice(&u16::to_be_bytes(name.len() as u16));
	out.extend_from_slice(name.as_bytes());
}

fn write_string<T: Output>(out: &mut T, value: &str) {
	assert!(value.len() <= 32767, "Tag string value too long: {}", value);
	out.extend_from_slice(&u16::to_be_bytes(value.len() as u16));
	out.extend_from_slice(value.as_bytes());
}

fn array_length<T: Output>(out: &mut T, len: usize) {
	assert!(len <= i32::MAX as usize, "Array too long: {} (maximum length: {})", len, i32::MAX);

	out.extend_from_slice(&u32::to_be_bytes(len as u32));
}

fn write_list<T: Output>(out: &mut T, list: &List) {
	if list.is_empty() {
		out.push(list.kind() as u8);
		array_length(out, 0);

		return;
	}

	out.push(list.kind() as u8);
	array_length(out, list.len());

	for item in list.iter() {
		write_payload(out, item);
	}
}

fn write_payload<T: Output>(out: &mut T, tag: &Tag) {
	match tag {
		Tag::I8(value) => out.push(*value as u8),
		Tag::I16(value) => out.extend_from_slice(&value.to_be_bytes()),
		Tag::I32(value) => out.extend_from_slice(&value.to_be_bytes()),
		Tag::I64(value) => out.extend_from_slice(&value.to_be_bytes()),
		Tag::F32(value) => out.extend_from_slice(&value.to_bits().to_be_bytes()),
		Tag::F64(value) => out.extend_from_slice(&value.to_bits().to_be_bytes()),
		Tag::U8Array(value) => {
			array_length(out, value.len());
			out.extend_from_slice(value);
		},
		Tag::String(value) => write_string(out, value),
		Tag::List(list) => write_list(out, list),
		Tag::Compound(compound) => {
			for (name, tag) in compound.iter() {
				write_name(out, tag.kind(), name);
				write_payload(out, tag);
			}

			out.push(0);
		},
		Tag::U32Array(value) => {
			array_length(out, value.len());

			for &entry in value {
				out.extend_from_slice(&entry.to_be_bytes());
			}
		},
		Tag::I64Array(value) => {
			array_length(out, value.len());

			for &entry in value {
				out.extend_from_slice(&entry.to_be_bytes());
			}
		}
	}
}

#[cfg(test)]
mod test {
	use super::CompoundWriter;

	#[test]
	fn test_layout() {
		let buffer = CompoundWriter::write("", Vec::new(), |writer| {
			writer.i8("V", 1);
		});

		assert_eq!(buffer, vec![
			10, 0, 0,          // root compound, empty name
			1, 0, 1, b'V', 1,  // byte "V" = 1
			0                  // end
		]);
	}

	#[test]
	fn test_empty_compound_array() {
		let buffer = CompoundWriter::write("", Vec::new(), |writer| {
			writer.compound_array("Entities", 0, |_| {});
		});

		assert_eq!(&buffer[3..], &[9, 0, 8, b'E', b'n', b't', b'i', b't', b'i', b'e', b's', 0, 0, 0, 0, 0, 0][..]);
	}
}
