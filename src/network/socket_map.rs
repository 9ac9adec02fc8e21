use smallvec::{SmallVec, smallvec};

use crate::foundation::error::{LumenError, LumenResult};
use crate::network::ids::{
    InputSocketId, OutputSocketId, SocketId, VInputSocketId, VOutputSocketId, VSocketId,
};

/// Compiled sockets an original socket was lowered to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mapping {
    /// Nothing in the network represents this socket.
    Unmapped,
    /// Exactly one compiled socket.
    Single(SocketId),
    /// An input fanned out to several compiled inputs, in compiler order. Holds at least two.
    Multi(SmallVec<[SocketId; 4]>),
}

impl Mapping {
    /// Compiled sockets in mapping order.
    pub fn sockets(&self) -> &[SocketId] {
        match self {
            Self::Unmapped => &[],
            Self::Single(s) => std::slice::from_ref(s),
            Self::Multi(list) => list,
        }
    }

    /// Whether any compiled socket is mapped.
    pub fn is_mapped(&self) -> bool {
        !matches!(self, Self::Unmapped)
    }
}

/// Bidirectional index between original tree sockets and compiled network sockets.
///
/// Forward entries exist for every original socket. Reverse entries exist only for sockets
/// of dummy nodes, and each one points back at an original socket whose forward mapping
/// contains it. Built once by the graph compiler, read-only afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SocketMap {
    forward: Vec<Mapping>,
    reverse: Vec<Option<VSocketId>>,
}

impl SocketMap {
    /// Assemble a map from finished forward and reverse tables.
    ///
    /// `forward` is indexed by original socket id, `reverse` by compiled socket id.
    pub fn from_parts(
        forward: Vec<Mapping>,
        reverse: Vec<Option<VSocketId>>,
    ) -> LumenResult<Self> {
        let socket_count = reverse.len();
        for (v, mapping) in forward.iter().enumerate() {
            if let Mapping::Multi(list) = mapping
                && list.len() < 2
            {
                return Err(LumenError::validation(format!(
                    "vsocket {v} is multi-mapped to {} sockets",
                    list.len()
                )));
            }
            let sockets = mapping.sockets();
            for (i, s) in sockets.iter().enumerate() {
                if s.index() >= socket_count {
                    return Err(LumenError::validation(format!(
                        "vsocket {v} maps to socket {} outside the network",
                        s.0
                    )));
                }
                if sockets[..i].contains(s) {
                    return Err(LumenError::validation(format!(
                        "vsocket {v} maps to socket {} twice",
                        s.0
                    )));
                }
            }
        }
        for (s, v) in reverse.iter().enumerate() {
            let Some(v) = v else { continue };
            let round_trips = forward
                .get(v.index())
                .is_some_and(|m| m.sockets().contains(&SocketId(s as u32)));
            if !round_trips {
                return Err(LumenError::validation(format!(
                    "socket {s} maps back to vsocket {} which does not map to it",
                    v.0
                )));
            }
        }
        Ok(Self { forward, reverse })
    }

    /// Number of original sockets covered.
    pub fn vsocket_count(&self) -> usize {
        self.forward.len()
    }

    /// Number of compiled sockets covered.
    pub fn socket_count(&self) -> usize {
        self.reverse.len()
    }

    /// Forward entry of `vsocket`.
    pub fn mapping(&self, vsocket: impl Into<VSocketId>) -> &Mapping {
        &self.forward[vsocket.into().index()]
    }

    /// Reverse entry of a compiled socket; `None` for non-boundary sockets.
    pub fn reverse(&self, socket: impl Into<SocketId>) -> Option<VSocketId> {
        self.reverse[socket.into().index()]
    }

    /// Whether the original socket is represented in the network.
    pub fn is_mapped(&self, vsocket: impl Into<VSocketId>) -> bool {
        self.mapping(vsocket).is_mapped()
    }

    /// Whether the compiled socket stands for an original socket.
    pub fn is_mapped_socket(&self, socket: impl Into<SocketId>) -> bool {
        self.reverse(socket).is_some()
    }

    /// The single compiled input of `vsocket`.
    ///
    /// # Panics
    ///
    /// Unless `vsocket` maps to exactly one compiled socket.
    pub fn lookup_singly_mapped_input(&self, vsocket: VInputSocketId) -> InputSocketId {
        match self.mapping(vsocket) {
            Mapping::Single(s) => InputSocketId(s.0),
            other => panic!(
                "vsocket {} is expected to map to exactly one socket, maps to {}",
                vsocket.0,
                other.sockets().len()
            ),
        }
    }

    /// Every compiled input `vsocket` was lowered to, in compiler order.
    pub fn lookup_all_inputs(&self, vsocket: VInputSocketId) -> SmallVec<[InputSocketId; 4]> {
        match self.mapping(vsocket) {
            Mapping::Unmapped => SmallVec::new(),
            Mapping::Single(s) => smallvec![InputSocketId(s.0)],
            Mapping::Multi(list) => list.iter().map(|s| InputSocketId(s.0)).collect(),
        }
    }

    /// Compiled output of `vsocket`, `None` when unmapped.
    ///
    /// # Panics
    ///
    /// When the output is mapped to several sockets.
    pub fn lookup_output(&self, vsocket: VOutputSocketId) -> Option<OutputSocketId> {
        match self.mapping(vsocket) {
            Mapping::Unmapped => None,
            Mapping::Single(s) => Some(OutputSocketId(s.0)),
            Mapping::Multi(_) => panic!("output vsocket {} is multi-mapped", vsocket.0),
        }
    }

    /// Original input a boundary input stands for.
    ///
    /// # Panics
    ///
    /// When `socket` is not a mapped boundary socket.
    pub fn lookup_vsocket_input(&self, socket: InputSocketId) -> VInputSocketId {
        match self.reverse(socket) {
            Some(v) => VInputSocketId(v.0),
            None => panic!("socket {} does not stand for an original socket", socket.0),
        }
    }

    /// Original output a boundary output stands for.
    ///
    /// # Panics
    ///
    /// When `socket` is not a mapped boundary socket.
    pub fn lookup_vsocket_output(&self, socket: OutputSocketId) -> VOutputSocketId {
        match self.reverse(socket) {
            Some(v) => VOutputSocketId(v.0),
            None => panic!("socket {} does not stand for an original socket", socket.0),
        }
    }
}

/// Records socket correspondences while a compiler lowers a tree.
#[derive(Debug, Clone)]
pub struct SocketMapBuilder {
    forward: Vec<Mapping>,
    reverse: Vec<Option<VSocketId>>,
}

impl SocketMapBuilder {
    /// Builder for a tree with `vsocket_count` sockets and a network with `socket_count`.
    pub fn new(vsocket_count: usize, socket_count: usize) -> Self {
        Self {
            forward: vec![Mapping::Unmapped; vsocket_count],
            reverse: vec![None; socket_count],
        }
    }

    fn check(&self, v: VSocketId, s: SocketId) -> LumenResult<()> {
        if v.index() >= self.forward.len() || s.index() >= self.reverse.len() {
            return Err(LumenError::validation(format!(
                "mapping vsocket {} -> socket {} is out of range",
                v.0, s.0
            )));
        }
        Ok(())
    }

    /// Record that `vsocket` feeds compiled input `socket`. Repeating a pair is a no-op.
    pub fn map_input(&mut self, vsocket: VInputSocketId, socket: InputSocketId) -> LumenResult<()> {
        let (v, s) = (VSocketId::from(vsocket), SocketId::from(socket));
        self.check(v, s)?;
        let slot = &mut self.forward[v.index()];
        *slot = match std::mem::replace(slot, Mapping::Unmapped) {
            Mapping::Unmapped => Mapping::Single(s),
            Mapping::Single(prev) if prev == s => Mapping::Single(prev),
            Mapping::Single(prev) => Mapping::Multi(smallvec![prev, s]),
            Mapping::Multi(mut list) => {
                if !list.contains(&s) {
                    list.push(s);
                }
                Mapping::Multi(list)
            }
        };
        Ok(())
    }

    /// Record that `vsocket` is computed by compiled output `socket`.
    pub fn map_output(
        &mut self,
        vsocket: VOutputSocketId,
        socket: OutputSocketId,
    ) -> LumenResult<()> {
        let (v, s) = (VSocketId::from(vsocket), SocketId::from(socket));
        self.check(v, s)?;
        match &self.forward[v.index()] {
            Mapping::Unmapped => {
                self.forward[v.index()] = Mapping::Single(s);
                Ok(())
            }
            Mapping::Single(prev) if *prev == s => Ok(()),
            _ => Err(LumenError::validation(format!(
                "output vsocket {} is already mapped",
                v.0
            ))),
        }
    }

    /// [`SocketMapBuilder::map_input`] for a dummy-node input, also recording the reverse entry.
    pub fn map_boundary_input(
        &mut self,
        vsocket: VInputSocketId,
        socket: InputSocketId,
    ) -> LumenResult<()> {
        self.map_input(vsocket, socket)?;
        self.set_reverse(vsocket.into(), socket.into())
    }

    /// [`SocketMapBuilder::map_output`] for a dummy-node output, also recording the reverse entry.
    pub fn map_boundary_output(
        &mut self,
        vsocket: VOutputSocketId,
        socket: OutputSocketId,
    ) -> LumenResult<()> {
        self.map_output(vsocket, socket)?;
        self.set_reverse(vsocket.into(), socket.into())
    }

    fn set_reverse(&mut self, v: VSocketId, s: SocketId) -> LumenResult<()> {
        match self.reverse[s.index()] {
            Some(prev) if prev != v => Err(LumenError::validation(format!(
                "socket {} already stands for vsocket {}",
                s.0, prev.0
            ))),
            _ => {
                self.reverse[s.index()] = Some(v);
                Ok(())
            }
        }
    }

    /// Freeze the recorded tables.
    pub fn finish(self) -> LumenResult<SocketMap> {
        SocketMap::from_parts(self.forward, self.reverse)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/network/socket_map.rs"]
mod tests;
