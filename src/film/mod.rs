//! Pass catalogue, buffer layout and its JSON configuration.

/// Serde configuration for buffer geometry and layout.
pub mod config;
/// Pass, AOV and denoising descriptors and the layout that assigns their offsets.
pub mod passes;
