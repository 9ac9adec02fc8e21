//! Seams to the compute device: flat memory with a host mirror and a display sink.

/// Display draw target and the pixel data handed to it.
pub mod draw;
/// Device memory abstraction and the host-only implementation.
pub mod memory;
