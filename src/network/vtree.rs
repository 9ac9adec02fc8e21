use crate::network::ids::{SocketDirection, VInputSocketId, VNodeId, VOutputSocketId, VSocketId};

/// A node of the user-authored tree.
#[derive(Debug, Clone)]
pub struct VNode {
    /// Display name.
    pub name: String,
    /// Input sockets in declaration order.
    pub inputs: Vec<VInputSocketId>,
    /// Output sockets in declaration order.
    pub outputs: Vec<VOutputSocketId>,
}

/// A socket of the user-authored tree.
#[derive(Debug, Clone)]
pub struct VSocket {
    /// Owning node.
    pub node: VNodeId,
    /// Input or output.
    pub direction: SocketDirection,
    /// Display name.
    pub name: String,
}

/// The node tree as the user authored it, after group inlining.
///
/// Sockets of all nodes share one id space so side tables can be indexed by [`VSocketId`].
#[derive(Debug, Clone, Default)]
pub struct VirtualTree {
    nodes: Vec<VNode>,
    sockets: Vec<VSocket>,
}

impl VirtualTree {
    /// Empty tree.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a node with the given input and output socket names.
    pub fn add_node(
        &mut self,
        name: impl Into<String>,
        inputs: &[&str],
        outputs: &[&str],
    ) -> VNodeId {
        let node = VNodeId(self.nodes.len() as u32);
        let mut push = |direction, label: &str| {
            let id = self.sockets.len() as u32;
            self.sockets.push(VSocket {
                node,
                direction,
                name: label.to_string(),
            });
            id
        };
        let inputs = inputs
            .iter()
            .map(|n| VInputSocketId(push(SocketDirection::Input, *n)))
            .collect();
        let outputs = outputs
            .iter()
            .map(|n| VOutputSocketId(push(SocketDirection::Output, *n)))
            .collect();
        self.nodes.push(VNode {
            name: name.into(),
            inputs,
            outputs,
        });
        node
    }

    /// Number of nodes.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of sockets across all nodes.
    pub fn socket_count(&self) -> usize {
        self.sockets.len()
    }

    /// Node by id. Panics on a foreign id.
    pub fn node(&self, id: VNodeId) -> &VNode {
        &self.nodes[id.0 as usize]
    }

    /// Socket by id. Panics on a foreign id.
    pub fn socket(&self, id: impl Into<VSocketId>) -> &VSocket {
        &self.sockets[id.into().index()]
    }

    /// `index`-th input of `node`.
    pub fn input(&self, node: VNodeId, index: usize) -> VInputSocketId {
        self.node(node).inputs[index]
    }

    /// `index`-th output of `node`.
    pub fn output(&self, node: VNodeId, index: usize) -> VOutputSocketId {
        self.node(node).outputs[index]
    }
}
