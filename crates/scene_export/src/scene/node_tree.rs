//! User-editable node trees
//!
//! A node tree is an arena of nodes connected by links from output sockets
//! to input sockets. Node keys are non-owning handles into the arena and
//! stay valid for as long as the node exists.

use super::entity::TrackId;
use super::SceneError;
use crate::plugin::AttrValue;
use slotmap::SlotMap;
use std::collections::BTreeMap;

slotmap::new_key_type! {
    /// Handle to a node inside one [`NodeTree`]
    pub struct NodeKey;
}

/// Non-owning reference to a node of an entity's node tree
///
/// Only meaningful while the owning scene is unchanged, i.e. for the
/// duration of one export pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeHandle {
    /// Entity owning the tree
    pub owner: TrackId,
    /// Node within the tree
    pub node: NodeKey,
}

/// Input socket of a node
#[derive(Debug, Clone, PartialEq)]
pub struct InputSocket {
    /// Display name, unique per node
    pub name: String,
    /// Plugin attribute this socket feeds
    pub attr: String,
    /// Literal value used when the socket is not linked
    pub value: Option<AttrValue>,
    /// Whether the socket accepts several links
    pub multi_input: bool,
}

impl InputSocket {
    /// Create a socket feeding `attr`
    pub fn new(name: impl Into<String>, attr: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attr: attr.into(),
            value: None,
            multi_input: false,
        }
    }

    /// Set the literal value
    pub fn with_value(mut self, value: impl Into<AttrValue>) -> Self {
        self.value = Some(value.into());
        self
    }

    /// Accept several links
    pub fn multi(mut self) -> Self {
        self.multi_input = true;
        self
    }
}

/// Output socket of a node
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputSocket {
    /// Display name, unique per node
    pub name: String,
    /// Named plugin output; `None` is the plugin's default output
    pub attr: Option<String>,
}

impl OutputSocket {
    /// Socket exposing the plugin's default output
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attr: None,
        }
    }

    /// Socket exposing a named plugin output
    pub fn with_attr(name: impl Into<String>, attr: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attr: Some(attr.into()),
        }
    }
}

/// What a node represents
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    /// Produces one plugin instance of the given type
    Plugin {
        /// Renderer plugin type
        plugin_type: String,
    },
    /// Tree root; forwards whatever is linked into its first input
    Output,
    /// Pass-through for link routing
    Reroute,
}

/// A node in a tree
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    /// Name, unique within the tree
    pub name: String,
    /// What the node represents
    pub kind: NodeKind,
    /// Input sockets in display order
    pub inputs: Vec<InputSocket>,
    /// Output sockets in display order
    pub outputs: Vec<OutputSocket>,
    /// Non-socket properties copied verbatim to the plugin
    pub properties: BTreeMap<String, AttrValue>,
}

impl Node {
    /// Plugin-bearing node with a single default output
    pub fn plugin(name: impl Into<String>, plugin_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: NodeKind::Plugin {
                plugin_type: plugin_type.into(),
            },
            inputs: Vec::new(),
            outputs: vec![OutputSocket::new("Output")],
            properties: BTreeMap::new(),
        }
    }

    /// Tree output node with one input
    pub fn output(name: impl Into<String>, input: impl Into<String>) -> Self {
        let input = input.into();
        Self {
            name: name.into(),
            kind: NodeKind::Output,
            inputs: vec![InputSocket::new(input.clone(), input)],
            outputs: Vec::new(),
            properties: BTreeMap::new(),
        }
    }

    /// Reroute node
    pub fn reroute(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: NodeKind::Reroute,
            inputs: vec![InputSocket::new("Input", "input")],
            outputs: vec![OutputSocket::new("Output")],
            properties: BTreeMap::new(),
        }
    }

    /// Add an input socket (builder pattern)
    pub fn with_input(mut self, socket: InputSocket) -> Self {
        self.inputs.push(socket);
        self
    }

    /// Add an output socket (builder pattern)
    pub fn with_output(mut self, socket: OutputSocket) -> Self {
        self.outputs.push(socket);
        self
    }

    /// Set a property (builder pattern)
    pub fn with_property(mut self, name: impl Into<String>, value: impl Into<AttrValue>) -> Self {
        self.properties.insert(name.into(), value.into());
        self
    }

    /// Plugin type, for plugin-bearing nodes
    pub fn plugin_type(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::Plugin { plugin_type } => Some(plugin_type),
            _ => None,
        }
    }

    /// Index of the input socket with the given name
    pub fn input_index(&self, name: &str) -> Option<usize> {
        self.inputs.iter().position(|s| s.name == name)
    }

    /// Index of the output socket with the given name
    pub fn output_index(&self, name: &str) -> Option<usize> {
        self.outputs.iter().position(|s| s.name == name)
    }
}

/// Link from an output socket to an input socket
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Link {
    /// Upstream node
    pub from_node: NodeKey,
    /// Output socket index on the upstream node
    pub from_socket: usize,
    /// Downstream node
    pub to_node: NodeKey,
    /// Input socket index on the downstream node
    pub to_socket: usize,
}

/// Directed graph of nodes, rooted at an output node
#[derive(Debug, Clone, Default)]
pub struct NodeTree {
    name: String,
    nodes: SlotMap<NodeKey, Node>,
    links: Vec<Link>,
    output: Option<NodeKey>,
}

impl NodeTree {
    /// Create an empty tree
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Tree name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Add a node; names must be unique within the tree
    pub fn add_node(&mut self, node: Node) -> Result<NodeKey, SceneError> {
        if self.find(&node.name).is_some() {
            return Err(SceneError::DuplicateNodeName(node.name));
        }
        Ok(self.nodes.insert(node))
    }

    /// Remove a node and every link touching it
    pub fn remove_node(&mut self, key: NodeKey) -> Option<Node> {
        self.links.retain(|l| l.from_node != key && l.to_node != key);
        if self.output == Some(key) {
            self.output = None;
        }
        self.nodes.remove(key)
    }

    /// Designate the root node
    pub fn set_output(&mut self, key: NodeKey) -> Result<(), SceneError> {
        if !self.nodes.contains_key(key) {
            return Err(SceneError::UnknownNode(format!("{key:?}")));
        }
        self.output = Some(key);
        Ok(())
    }

    /// Root node
    pub fn output(&self) -> Option<NodeKey> {
        self.output
    }

    /// Node by key
    pub fn node(&self, key: NodeKey) -> Option<&Node> {
        self.nodes.get(key)
    }

    /// Mutable node by key
    pub fn node_mut(&mut self, key: NodeKey) -> Option<&mut Node> {
        self.nodes.get_mut(key)
    }

    /// Node key by name
    pub fn find(&self, name: &str) -> Option<NodeKey> {
        self.nodes.iter().find(|(_, n)| n.name == name).map(|(k, _)| k)
    }

    /// All nodes
    pub fn nodes(&self) -> impl Iterator<Item = (NodeKey, &Node)> {
        self.nodes.iter()
    }

    /// All links
    pub fn links(&self) -> &[Link] {
        &self.links
    }

    /// Connect `from.from_socket` to `to.to_socket`, by socket name
    ///
    /// Linking a single-input socket that is already linked replaces the
    /// existing link, like an editor would.
    pub fn link(
        &mut self,
        from: NodeKey,
        from_socket: &str,
        to: NodeKey,
        to_socket: &str,
    ) -> Result<(), SceneError> {
        let from_node = self.nodes.get(from).ok_or_else(|| SceneError::UnknownNode(format!("{from:?}")))?;
        let to_node = self.nodes.get(to).ok_or_else(|| SceneError::UnknownNode(format!("{to:?}")))?;

        let from_index = from_node
            .output_index(from_socket)
            .ok_or_else(|| SceneError::UnknownSocket(from_node.name.clone(), from_socket.to_string()))?;
        let to_index = to_node
            .input_index(to_socket)
            .ok_or_else(|| SceneError::UnknownSocket(to_node.name.clone(), to_socket.to_string()))?;

        if !to_node.inputs[to_index].multi_input {
            self.links.retain(|l| !(l.to_node == to && l.to_socket == to_index));
        }

        self.links.push(Link {
            from_node: from,
            from_socket: from_index,
            to_node: to,
            to_socket: to_index,
        });
        Ok(())
    }

    /// Remove every link into an input socket
    pub fn unlink_input(&mut self, to: NodeKey, to_socket: usize) {
        self.links.retain(|l| !(l.to_node == to && l.to_socket == to_socket));
    }

    /// Links feeding one input socket, in creation order
    pub fn links_to(&self, node: NodeKey, socket: usize) -> impl Iterator<Item = &Link> {
        self.links
            .iter()
            .filter(move |l| l.to_node == node && l.to_socket == socket)
    }

    /// Whether an input socket has at least one link
    pub fn is_linked(&self, node: NodeKey, socket: usize) -> bool {
        self.links_to(node, socket).next().is_some()
    }
}
