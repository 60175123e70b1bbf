//! # `nbt-turbo`
//!
//! Reading and writing of the named binary tag format used by chunk payloads.
//!
//! Writing streams straight into any [`Output`](writer::Output), so a payload can be fed to a
//! compressor without building an intermediate buffer. Reading produces an owned [`Compound`]
//! tree that callers can pick apart and mutate.

pub mod reader;
pub mod tag;
pub mod writer;

pub use reader::{parse, ReadError};
pub use tag::{Compound, List, Tag};
pub use writer::{CompoundWriter, Kind, Output};
