//! Worlds made of chunks: decoding chunks in either layout, keeping a bounded number of them in
//! memory, and the long-running operations over a whole world (relighting and scanning).
//!
//! A [`World`] owns everything: the storage backend picked when it was opened, the loaded
//! chunks, the eviction queues and the settings. Chunks are borrowed from it through
//! [`ChunkMut`] and are only decoded once something looks inside.

mod cache;
mod chunk;
mod data;
mod error;
mod format;
mod handle;
mod relight;
mod scan;
mod settings;
mod world;

pub mod layout;
pub mod sanitize;

pub use cache::ChunkCache;
pub use chunk::{Chunk, ChunkState};
pub use data::{Channel, ChunkData};
pub use error::{ChunkError, WorldError};
pub use format::WorldFormat;
pub use handle::ChunkMut;
pub use layout::ChunkLayout;
pub use relight::{Progress, Relight};
pub use scan::ChunkScan;
pub use settings::{DimensionKind, Settings};
pub use world::{SaveSummary, World};
