//! Render and display buffers plus pass extraction.

/// Display buffer for interactive preview.
pub mod display;
pub(crate) mod extract;
/// Buffer geometry and per-tile render parameters.
pub mod params;
/// Accumulation buffer and pass extraction entry points.
pub mod render;

pub use extract::DEPTH_NO_HIT;
