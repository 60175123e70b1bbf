pub mod block;
pub mod sky;

pub use block::seed_block_light;
pub use sky::{clear_sky_light, fast_sky_light};
