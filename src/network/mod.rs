//! Correspondence between a user-authored node tree and the multi-function network compiled
//! from it.

/// Compiled multi-function network.
pub mod graph;
/// Typed node and socket identifiers.
pub mod ids;
/// Compiled network bundled with its origin tree and socket map.
pub mod mapped;
/// Forward and reverse socket index.
pub mod socket_map;
/// User-authored node tree.
pub mod vtree;
