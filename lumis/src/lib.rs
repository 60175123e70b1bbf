//! Light propagation for column chunks.
//!
//! Lighting happens in two steps. Sources first seed each chunk on its own: sky light is
//! filled from the height map down, block light comes straight from emission. Propagation
//! then spreads both channels across chunk borders, one voxel per direction per pass, until
//! nothing changes or the pass limit is hit.

pub mod batch;
pub mod heightmap;
pub mod light;
pub mod materials;
pub mod propagation;
pub mod sources;

pub use batch::split_batches;
pub use heightmap::compute_heightmap;
pub use materials::Materials;
pub use propagation::{LightChunk, LightSource, Propagation};
