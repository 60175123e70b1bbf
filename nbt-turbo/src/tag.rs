use crate::writer::Kind;

/// A single tag payload. Names live in the enclosing [`Compound`].
#[derive(Debug, Clone, PartialEq)]
pub enum Tag {
	I8(i8),
	I16(i16),
	I32(i32),
	I64(i64),
	F32(f32),
	F64(f64),
	U8Array(Vec<u8>),
	String(String),
	List(List),
	Compound(Compound),
	U32Array(Vec<u32>),
	I64Array(Vec<i64>)
}

impl Tag {
	pub fn kind(&self) -> Kind {
		match self {
			Tag::I8(_) => Kind::I8,
			Tag::I16(_) => Kind::I16,
			Tag::I32(_) => Kind::I32,
			Tag::I64(_) => Kind::I64,
			Tag::F32(_) => Kind::F32,
			Tag::F64(_) => Kind::F64,
			Tag::U8Array(_) => Kind::U8Array,
			Tag::String(_) => Kind::String,
			Tag::List(_) => Kind::List,
			Tag::Compound(_) => Kind::Compound,
			Tag::U32Array(_) => Kind::U32Array,
			Tag::I64Array(_) => Kind::I64Array
		}
	}

	/// Widens any integer tag to an i64. Returns None for every other kind.
	pub fn as_integer(&self) -> Option<i64> {
		match *self {
			Tag::I8(value) => Some(value as i64),
			Tag::I16(value) => Some(value as i64),
			Tag::I32(value) => Some(value as i64),
			Tag::I64(value) => Some(value),
			_ => None
		}
	}
}

/// A homogeneous list of tags. An empty list may carry any element kind, including `End`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct List {
	kind: Kind,
	items: Vec<Tag>
}

impl List {
	pub fn new(kind: Kind) -> Self {
		List { kind, items: Vec::new() }
	}

	pub fn compounds() -> Self {
		List::new(Kind::Compound)
	}

	pub(crate) fn from_parts(kind: Kind, items: Vec<Tag>) -> Self {
		List { kind, items }
	}

	pub fn kind(&self) -> Kind {
		self.kind
	}

	/// Appends a tag to the list.
	/// # Panics
	/// If the tag kind does not match the element kind of a non-empty list.
	pub fn push(&mut self, tag: Tag) {
		if self.items.is_empty() {
			self.kind = tag.kind();
		}

		assert_eq!(self.kind, tag.kind(), "Tried to push a mismatched tag into a list");

		self.items.push(tag);
	}

	pub fn len(&self) -> usize {
		self.items.len()
	}

	pub fn is_empty(&self) -> bool {
		self.items.is_empty()
	}

	pub fn clear(&mut self) {
		self.items.clear();
	}

	pub fn iter(&self) -> std::slice::Iter<Tag> {
		self.items.iter()
	}

	pub fn iter_mut(&mut self) -> std::slice::IterMut<Tag> {
		self.items.iter_mut()
	}

	/// Iterates over the compound elements, skipping anything else.
	pub fn iter_compounds(&self) -> impl Iterator<Item = &Compound> {
		self.items.iter().filter_map(|tag| match tag {
			Tag::Compound(compound) => Some(compound),
			_ => None
		})
	}

	pub fn into_inner(self) -> Vec<Tag> {
		self.items
	}
}

/// An ordered set of named tags. Insertion order is preserved when written back out.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Compound {
	entries: Vec<(String, Tag)>
}

impl Compound {
	pub fn new() -> Self {
		Compound { entries: Vec::new() }
	}

	pub fn len(&self) -> usize {
		self.entries.len()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	pub fn contains(&self, name: &str) -> bool {
		self.position(name).is_some()
	}

	pub fn get(&self, name: &str) -> Option<&Tag> {
		self.position(name).map(|index| &self.entries[index].1)
	}

	pub fn get_mut(&mut self, name: &str) -> Option<&mut Tag> {
		match self.position(name) {
			Some(index) => Some(&mut self.entries[index].1),
			None => None
		}
	}

	/// Inserts a tag, replacing and returning any previous tag with the same name.
	/// A replaced tag keeps its original position.
	pub fn insert<S: Into<String>>(&mut self, name: S, tag: Tag) -> Option<Tag> {
		let name = name.into();

		match self.position(&name) {
			Some(index) => Some(std::mem::replace(&mut self.entries[index].1, tag)),
			None => {
				self.entries.push((name, tag));
				None
			}
		}
	}

	pub fn remove(&mut self, name: &str) -> Option<Tag> {
		self.position(name).map(|index| self.entries.remove(index).1)
	}

	pub fn iter(&self) -> impl Iterator<Item = (&str, &Tag)> {
		self.entries.iter().map(|(name, tag)| (name.as_str(), tag))
	}

	pub fn get_i8(&self, name: &str) -> Option<i8> {
		match self.get(name) {
			Some(&Tag::I8(value)) => Some(value),
			_ => None
		}
	}

	pub fn get_i32(&self, name: &str) -> Option<i32> {
		match self.get(name) {
			Some(&Tag::I32(value)) => Some(value),
			_ => None
		}
	}

	pub fn get_i64(&self, name: &str) -> Option<i64> {
		match self.get(name) {
			Some(&Tag::I64(value)) => Some(value),
			_ => None
		}
	}

	pub fn get_u8_array(&self, name: &str) -> Option<&[u8]> {
		match self.get(name) {
			Some(Tag::U8Array(value)) => Some(value),
			_ => None
		}
	}

	pub fn get_u32_array(&self, name: &str) -> Option<&[u32]> {
		match self.get(name) {
			Some(Tag::U32Array(value)) => Some(value),
			_ => None
		}
	}

	pub fn get_compound(&self, name: &str) -> Option<&Compound> {
		match self.get(name) {
			Some(Tag::Compound(value)) => Some(value),
			_ => None
		}
	}

	pub fn get_compound_mut(&mut self, name: &str) -> Option<&mut Compound> {
		match self.get_mut(name) {
			Some(Tag::Compound(value)) => Some(value),
			_ => None
		}
	}

	pub fn get_list(&self, name: &str) -> Option<&List> {
		match self.get(name) {
			Some(Tag::List(value)) => Some(value),
			_ => None
		}
	}

	pub fn get_list_mut(&mut self, name: &str) -> Option<&mut List> {
		match self.get_mut(name) {
			Some(Tag::List(value)) => Some(value),
			_ => None
		}
	}

	/// Removes a byte array from the compound, handing ownership to the caller.
	/// Tags of any other kind are left in place.
	pub fn take_u8_array(&mut self, name: &str) -> Option<Vec<u8>> {
		match self.get(name) {
			Some(Tag::U8Array(_)) => match self.remove(name) {
				Some(Tag::U8Array(value)) => Some(value),
				_ => None
			},
			_ => None
		}
	}

	fn position(&self, name: &str) -> Option<usize> {
		self.entries.iter().position(|(entry, _)| entry == name)
	}
}
