use crate::foundation::error::{LumenError, LumenResult};
use crate::network::ids::{InputSocketId, NodeId, OutputSocketId, SocketDirection, SocketId};

/// Role of a compiled node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    /// Evaluates a multi-function.
    Function,
    /// Stands in for an interface socket of the original tree; performs no computation.
    Dummy,
}

/// A node of the compiled network.
#[derive(Debug, Clone)]
pub struct Node {
    /// Debug name, usually derived from the function.
    pub name: String,
    /// Function or dummy.
    pub kind: NodeKind,
    /// Input sockets in parameter order.
    pub inputs: Vec<InputSocketId>,
    /// Output sockets in parameter order.
    pub outputs: Vec<OutputSocketId>,
}

impl Node {
    /// Whether this node is a boundary stand-in.
    pub fn is_dummy(&self) -> bool {
        self.kind == NodeKind::Dummy
    }
}

/// A socket of the compiled network.
#[derive(Debug, Clone)]
pub struct Socket {
    /// Owning node.
    pub node: NodeId,
    /// Input or output.
    pub direction: SocketDirection,
    /// Parameter name.
    pub name: String,
}

/// Multi-function dependency graph produced by lowering a [`crate::VirtualTree`].
///
/// Sockets of all nodes share one id space. Every input has at most one origin; an output
/// may feed any number of inputs.
#[derive(Debug, Clone, Default)]
pub struct Network {
    nodes: Vec<Node>,
    sockets: Vec<Socket>,
    origins: Vec<Option<OutputSocketId>>,
    targets: Vec<Vec<InputSocketId>>,
}

impl Network {
    /// Empty network.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a function node.
    pub fn add_function(
        &mut self,
        name: impl Into<String>,
        inputs: &[&str],
        outputs: &[&str],
    ) -> NodeId {
        self.add_node(name.into(), NodeKind::Function, inputs, outputs)
    }

    /// Append a dummy node.
    pub fn add_dummy(
        &mut self,
        name: impl Into<String>,
        inputs: &[&str],
        outputs: &[&str],
    ) -> NodeId {
        self.add_node(name.into(), NodeKind::Dummy, inputs, outputs)
    }

    fn add_node(
        &mut self,
        name: String,
        kind: NodeKind,
        inputs: &[&str],
        outputs: &[&str],
    ) -> NodeId {
        let node = NodeId(self.nodes.len() as u32);
        let mut push = |direction, label: &str| {
            let id = self.sockets.len() as u32;
            self.sockets.push(Socket {
                node,
                direction,
                name: label.to_string(),
            });
            self.origins.push(None);
            self.targets.push(Vec::new());
            id
        };
        let inputs = inputs
            .iter()
            .map(|n| InputSocketId(push(SocketDirection::Input, *n)))
            .collect();
        let outputs = outputs
            .iter()
            .map(|n| OutputSocketId(push(SocketDirection::Output, *n)))
            .collect();
        self.nodes.push(Node {
            name,
            kind,
            inputs,
            outputs,
        });
        node
    }

    /// Connect `from` to `to`. Each input accepts one link.
    pub fn add_link(&mut self, from: OutputSocketId, to: InputSocketId) -> LumenResult<()> {
        let (fi, ti) = (SocketId::from(from).index(), SocketId::from(to).index());
        if fi >= self.sockets.len() || ti >= self.sockets.len() {
            return Err(LumenError::validation(format!(
                "link {} -> {} references a socket outside the network",
                from.0, to.0
            )));
        }
        if self.sockets[fi].direction != SocketDirection::Output
            || self.sockets[ti].direction != SocketDirection::Input
        {
            return Err(LumenError::validation(format!(
                "link {} -> {} must go from an output to an input",
                from.0, to.0
            )));
        }
        if let Some(existing) = self.origins[ti] {
            return Err(LumenError::validation(format!(
                "input {} is already linked to output {}",
                to.0, existing.0
            )));
        }
        self.origins[ti] = Some(from);
        self.targets[fi].push(to);
        Ok(())
    }

    /// Number of nodes.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of sockets across all nodes.
    pub fn socket_count(&self) -> usize {
        self.sockets.len()
    }

    /// All nodes, indexed by [`NodeId`].
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Node by id. Panics on a foreign id.
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0 as usize]
    }

    /// Socket by id. Panics on a foreign id.
    pub fn socket(&self, id: impl Into<SocketId>) -> &Socket {
        &self.sockets[id.into().index()]
    }

    /// Node owning `socket`.
    pub fn node_of(&self, socket: impl Into<SocketId>) -> &Node {
        self.node(self.socket(socket).node)
    }

    /// Output feeding `input`, if linked.
    pub fn origin(&self, input: InputSocketId) -> Option<OutputSocketId> {
        self.origins[SocketId::from(input).index()]
    }

    /// Inputs fed by `output`, in link order.
    pub fn targets(&self, output: OutputSocketId) -> &[InputSocketId] {
        &self.targets[SocketId::from(output).index()]
    }
}

#[cfg(test)]
#[path = "../../tests/unit/network/graph.rs"]
mod tests;
