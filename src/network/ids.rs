use serde::Serialize;

/// Direction of a socket on its node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SocketDirection {
    /// Consumes a value.
    Input,
    /// Produces a value.
    Output,
}

/// Node of the user-authored tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct VNodeId(pub u32);

/// Any socket of the user-authored tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct VSocketId(pub u32);

/// Input socket of the user-authored tree. Shares the [`VSocketId`] index space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct VInputSocketId(pub u32);

/// Output socket of the user-authored tree. Shares the [`VSocketId`] index space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct VOutputSocketId(pub u32);

/// Node of the compiled network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct NodeId(pub u32);

/// Any socket of the compiled network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct SocketId(pub u32);

/// Input socket of the compiled network. Shares the [`SocketId`] index space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct InputSocketId(pub u32);

/// Output socket of the compiled network. Shares the [`SocketId`] index space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct OutputSocketId(pub u32);

impl From<VInputSocketId> for VSocketId {
    fn from(id: VInputSocketId) -> Self {
        Self(id.0)
    }
}

impl From<VOutputSocketId> for VSocketId {
    fn from(id: VOutputSocketId) -> Self {
        Self(id.0)
    }
}

impl From<InputSocketId> for SocketId {
    fn from(id: InputSocketId) -> Self {
        Self(id.0)
    }
}

impl From<OutputSocketId> for SocketId {
    fn from(id: OutputSocketId) -> Self {
        Self(id.0)
    }
}

impl VSocketId {
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

impl SocketId {
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}
