//! Lumen holds two pieces of a path tracer's plumbing.
//!
//! - Render buffers: a device-backed accumulation array holding interleaved passes, AOVs and
//!   denoising features, decoded into plain pixel rectangles by [`RenderBuffers`] under a given
//!   sample count and exposure. [`DisplayBuffer`] carries the interactive preview.
//! - Socket mapping: [`SocketMap`] and [`MappedNetwork`] relate sockets of a compiled
//!   multi-function [`Network`] back to the [`VirtualTree`] the user authored.
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod foundation;

/// Render, display and extraction.
pub mod buffers;
/// Device memory and draw seams.
pub mod device;
/// Pass layout and configuration.
pub mod film;
/// Node tree to compiled network mapping.
pub mod network;

pub use crate::foundation::error::{LumenError, LumenResult};

pub use crate::buffers::DEPTH_NO_HIT;
pub use crate::buffers::display::DisplayBuffer;
pub use crate::buffers::params::{BufferParams, RenderTile};
pub use crate::buffers::render::RenderBuffers;
pub use crate::device::draw::{DisplayPixels, DrawRequest, DrawTarget};
pub use crate::device::memory::{DeviceMemory, HostMemory};
pub use crate::film::config::{BufferConfig, DenoisingConfig, LayoutConfig};
pub use crate::film::passes::{
    Aov, AovType, DenoisingFeature, Pass, PassLayout, PassType, ResolvedAov, ResolvedPass,
};
pub use crate::network::graph::{Network, Node, NodeKind, Socket};
pub use crate::network::ids::{
    InputSocketId, NodeId, OutputSocketId, SocketDirection, SocketId, VInputSocketId, VNodeId,
    VOutputSocketId, VSocketId,
};
pub use crate::network::mapped::{MappedNetwork, MappingEntry, MappingReport};
pub use crate::network::socket_map::{Mapping, SocketMap, SocketMapBuilder};
pub use crate::network::vtree::{VNode, VSocket, VirtualTree};
