use serde::Serialize;
use smallvec::SmallVec;

use crate::foundation::error::{LumenError, LumenResult};
use crate::network::graph::Network;
use crate::network::ids::{
    InputSocketId, OutputSocketId, SocketDirection, SocketId, VInputSocketId, VNodeId,
    VOutputSocketId, VSocketId,
};
use crate::network::socket_map::{Mapping, SocketMap};
use crate::network::vtree::VirtualTree;

/// A compiled network bundled with the tree it was lowered from and the map between them.
///
/// Answers "which compiled sockets implement this original socket" and the reverse question
/// for boundary sockets, plus a best-effort link from any mapped compiled socket back to an
/// original node for diagnostics.
#[derive(Debug)]
pub struct MappedNetwork<'t> {
    vtree: &'t VirtualTree,
    network: Network,
    map: SocketMap,
    // First original socket whose forward mapping contains each compiled socket.
    origins: Vec<Option<VSocketId>>,
}

impl<'t> MappedNetwork<'t> {
    /// Bundle the three parts after checking they describe the same lowering.
    #[tracing::instrument(skip_all)]
    pub fn new(vtree: &'t VirtualTree, network: Network, map: SocketMap) -> LumenResult<Self> {
        if map.vsocket_count() != vtree.socket_count() {
            return Err(LumenError::validation(format!(
                "socket map covers {} vsockets but the tree has {}",
                map.vsocket_count(),
                vtree.socket_count()
            )));
        }
        if map.socket_count() != network.socket_count() {
            return Err(LumenError::validation(format!(
                "socket map covers {} sockets but the network has {}",
                map.socket_count(),
                network.socket_count()
            )));
        }

        let mut origins = vec![None; network.socket_count()];
        for v in (0..vtree.socket_count() as u32).map(VSocketId) {
            let direction = vtree.socket(v).direction;
            let mapping = map.mapping(v);
            if direction == SocketDirection::Output && matches!(mapping, Mapping::Multi(_)) {
                return Err(LumenError::validation(format!(
                    "output vsocket {} fans out to several sockets",
                    v.0
                )));
            }
            for &s in mapping.sockets() {
                if network.socket(s).direction != direction {
                    return Err(LumenError::validation(format!(
                        "vsocket {} and socket {} have different directions",
                        v.0, s.0
                    )));
                }
                origins[s.index()].get_or_insert(v);
            }
        }
        for s in (0..network.socket_count() as u32).map(SocketId) {
            if map.is_mapped_socket(s) && !network.node_of(s).is_dummy() {
                return Err(LumenError::validation(format!(
                    "socket {} maps back to the tree but belongs to function node '{}'",
                    s.0,
                    network.node_of(s).name
                )));
            }
        }

        tracing::debug!(
            vsockets = vtree.socket_count(),
            sockets = network.socket_count(),
            nodes = network.node_count(),
            "mapped network assembled"
        );
        Ok(Self {
            vtree,
            network,
            map,
            origins,
        })
    }

    /// Original tree.
    pub fn vtree(&self) -> &'t VirtualTree {
        self.vtree
    }

    /// Compiled network.
    pub fn network(&self) -> &Network {
        &self.network
    }

    /// Socket map.
    pub fn socket_map(&self) -> &SocketMap {
        &self.map
    }

    /// Whether the original socket is represented in the network.
    pub fn is_mapped(&self, vsocket: impl Into<VSocketId>) -> bool {
        self.map.is_mapped(vsocket)
    }

    /// Whether the compiled socket is a boundary socket standing for an original one.
    pub fn is_mapped_socket(&self, socket: impl Into<SocketId>) -> bool {
        self.map.is_mapped_socket(socket)
    }

    /// Dummy input standing for `vsocket`.
    ///
    /// # Panics
    ///
    /// Unless `vsocket` maps to exactly one input of a dummy node.
    pub fn lookup_dummy_input(&self, vsocket: VInputSocketId) -> InputSocketId {
        let socket = self.map.lookup_singly_mapped_input(vsocket);
        assert!(
            self.network.node_of(socket).is_dummy(),
            "vsocket {} maps to a function node input",
            vsocket.0
        );
        socket
    }

    /// Dummy output standing for `vsocket`.
    ///
    /// # Panics
    ///
    /// Unless `vsocket` maps to an output of a dummy node.
    pub fn lookup_dummy_output(&self, vsocket: VOutputSocketId) -> OutputSocketId {
        let Some(socket) = self.map.lookup_output(vsocket) else {
            panic!("output vsocket {} is not mapped", vsocket.0);
        };
        assert!(
            self.network.node_of(socket).is_dummy(),
            "vsocket {} maps to a function node output",
            vsocket.0
        );
        socket
    }

    /// [`MappedNetwork::lookup_dummy_input`] over a batch. Lengths must match.
    pub fn lookup_dummy_inputs(&self, vsockets: &[VInputSocketId], out: &mut [InputSocketId]) {
        assert_eq!(vsockets.len(), out.len(), "batch lengths differ");
        for (v, slot) in vsockets.iter().zip(out.iter_mut()) {
            *slot = self.lookup_dummy_input(*v);
        }
    }

    /// [`MappedNetwork::lookup_dummy_output`] over a batch. Lengths must match.
    pub fn lookup_dummy_outputs(&self, vsockets: &[VOutputSocketId], out: &mut [OutputSocketId]) {
        assert_eq!(vsockets.len(), out.len(), "batch lengths differ");
        for (v, slot) in vsockets.iter().zip(out.iter_mut()) {
            *slot = self.lookup_dummy_output(*v);
        }
    }

    /// See [`SocketMap::lookup_output`].
    pub fn lookup_output(&self, vsocket: VOutputSocketId) -> Option<OutputSocketId> {
        self.map.lookup_output(vsocket)
    }

    /// See [`SocketMap::lookup_all_inputs`].
    pub fn lookup_all_inputs(&self, vsocket: VInputSocketId) -> SmallVec<[InputSocketId; 4]> {
        self.map.lookup_all_inputs(vsocket)
    }

    /// See [`SocketMap::lookup_vsocket_input`].
    pub fn lookup_vsocket_input(&self, socket: InputSocketId) -> VInputSocketId {
        self.map.lookup_vsocket_input(socket)
    }

    /// See [`SocketMap::lookup_vsocket_output`].
    pub fn lookup_vsocket_output(&self, socket: OutputSocketId) -> VOutputSocketId {
        self.map.lookup_vsocket_output(socket)
    }

    /// Original socket implemented by `socket`, found through the forward map.
    ///
    /// Unlike the reverse lookups this covers function-node sockets too. When several original
    /// sockets share a compiled socket, the lowest id wins.
    pub fn origin_of_socket(&self, socket: impl Into<SocketId>) -> Option<VSocketId> {
        self.origins[socket.into().index()]
    }

    /// Original node `socket` was compiled from, if any.
    pub fn original_node_of(&self, socket: impl Into<SocketId>) -> Option<VNodeId> {
        self.origin_of_socket(socket)
            .map(|v| self.vtree.socket(v).node)
    }

    /// Serializable summary of the mapping, one entry per original socket.
    pub fn report(&self) -> MappingReport {
        let mut report = MappingReport {
            vsockets: self.vtree.socket_count(),
            sockets: self.network.socket_count(),
            ..MappingReport::default()
        };
        for v in (0..self.vtree.socket_count() as u32).map(VSocketId) {
            let vsocket = self.vtree.socket(v);
            let mapping = self.map.mapping(v);
            match mapping {
                Mapping::Unmapped => report.unmapped += 1,
                Mapping::Single(_) => {}
                Mapping::Multi(_) => report.fan_out += 1,
            }
            let sockets = mapping.sockets();
            report.entries.push(MappingEntry {
                vsocket: v,
                node: self.vtree.node(vsocket.node).name.clone(),
                socket: vsocket.name.clone(),
                direction: vsocket.direction,
                sockets: sockets.to_vec(),
                compiled_nodes: sockets
                    .iter()
                    .map(|&s| self.network.node_of(s).name.clone())
                    .collect(),
            });
        }
        report.boundary = (0..self.network.socket_count() as u32)
            .filter(|&s| self.map.is_mapped_socket(SocketId(s)))
            .count();
        report
    }
}

/// Debug summary produced by [`MappedNetwork::report`].
#[derive(Debug, Clone, Default, Serialize)]
pub struct MappingReport {
    /// Sockets in the original tree.
    pub vsockets: usize,
    /// Sockets in the compiled network.
    pub sockets: usize,
    /// Original sockets with no compiled counterpart.
    pub unmapped: usize,
    /// Original inputs lowered to more than one compiled input.
    pub fan_out: usize,
    /// Compiled sockets that map back to the tree.
    pub boundary: usize,
    /// Per original socket, in id order.
    pub entries: Vec<MappingEntry>,
}

/// One original socket and the compiled sockets implementing it.
#[derive(Debug, Clone, Serialize)]
pub struct MappingEntry {
    /// Original socket id.
    pub vsocket: VSocketId,
    /// Owning original node name.
    pub node: String,
    /// Original socket name.
    pub socket: String,
    /// Input or output.
    pub direction: SocketDirection,
    /// Compiled sockets in mapping order.
    pub sockets: Vec<SocketId>,
    /// Names of the compiled nodes owning `sockets`.
    pub compiled_nodes: Vec<String>,
}

#[cfg(test)]
#[path = "../../tests/unit/network/mapped.rs"]
mod tests;
