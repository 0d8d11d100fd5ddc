//! Node-tree to plugin-graph translation
//!
//! A [`TreeExporter`] walks one node tree depth first from its output node.
//! Every plugin-bearing node yields one descriptor, finalized only after
//! all nodes linked into it were exported (post-order). Results are
//! memoized per tree, so a node feeding several consumers is exported once.
//!
//! Cycle detection is explicit: nodes on the active ancestor stack are
//! flagged, and reaching a flagged node fails the tree with
//! [`ExportError::SceneGraphCycle`].

use super::context::ExportContext;
use super::error::{ExportError, ExportResult};
use crate::foundation::collections::SecondaryMap;
use crate::plugin::{AttrPlugin, AttrValue, PluginDesc};
use crate::scene::{Link, Node, NodeHandle, NodeKey, NodeKind, NodeTree, Scene, SceneObject, TrackId};
use log::warn;
use std::collections::HashMap;

/// The node being exported, as seen by hooks
#[derive(Debug, Clone, Copy)]
pub struct NodeContext<'t> {
    /// Entity owning the tree
    pub owner: TrackId,
    /// Node key within the tree
    pub key: NodeKey,
    /// The node itself
    pub node: &'t Node,
}

impl<'t> NodeContext<'t> {
    /// Non-owning handle to the node
    pub fn handle(&self) -> NodeHandle {
        NodeHandle {
            owner: self.owner,
            node: self.key,
        }
    }

    /// Plugin type of the node; empty for non-plugin nodes
    pub fn plugin_type(&self) -> &'t str {
        self.node.plugin_type().unwrap_or_default()
    }

    /// Literal property value
    pub fn property(&self, name: &str) -> Option<&'t AttrValue> {
        self.node.properties.get(name)
    }
}

/// Exports one node tree
pub struct TreeExporter<'c, 'a> {
    ctx: &'c mut ExportContext<'a>,
    owner: TrackId,
    tree: &'a NodeTree,
    memo: HashMap<NodeKey, AttrPlugin>,
    stack: Vec<NodeKey>,
    on_stack: SecondaryMap<NodeKey, ()>,
}

impl<'c, 'a> TreeExporter<'c, 'a> {
    /// Create an exporter for `tree`, owned by entity `owner`
    pub fn new(ctx: &'c mut ExportContext<'a>, owner: TrackId, tree: &'a NodeTree) -> Self {
        Self {
            ctx,
            owner,
            tree,
            memo: HashMap::new(),
            stack: Vec::new(),
            on_stack: SecondaryMap::new(),
        }
    }

    /// Entity owning the tree
    pub fn owner(&self) -> TrackId {
        self.owner
    }

    /// Tree being exported
    pub fn tree(&self) -> &'a NodeTree {
        self.tree
    }

    /// Scene being exported
    pub fn scene(&self) -> &'a Scene {
        self.ctx.scene()
    }

    /// Object owning the tree, when the owner is an object
    pub fn owner_object(&self) -> Option<&'a SceneObject> {
        self.ctx.scene().object(self.owner)
    }

    /// Scene frame transforms are sampled at
    pub fn frame(&self) -> f64 {
        self.ctx.frame()
    }

    /// Shared export context
    pub fn context(&mut self) -> &mut ExportContext<'a> {
        &mut *self.ctx
    }

    /// Export the whole tree, returning the plugin linked into the output node
    pub fn export_root(&mut self) -> ExportResult<AttrPlugin> {
        let tree = self.tree;
        let output = tree.output().ok_or_else(|| ExportError::InvalidLink {
            tree: tree.name().to_string(),
            node: "<none>".to_string(),
            socket: "<output>".to_string(),
        })?;

        let plugin = self.export_node(output)?;
        if plugin.is_empty() {
            let node = tree.node(output);
            return Err(ExportError::InvalidLink {
                tree: tree.name().to_string(),
                node: node.map(|n| n.name.clone()).unwrap_or_default(),
                socket: node
                    .and_then(|n| n.inputs.first())
                    .map(|s| s.name.clone())
                    .unwrap_or_default(),
            });
        }
        Ok(plugin)
    }

    /// Export one node, reusing the result if it was already exported
    ///
    /// Output and reroute nodes resolve to whatever is linked into their
    /// first input, or to the empty reference when nothing is.
    pub fn export_node(&mut self, key: NodeKey) -> ExportResult<AttrPlugin> {
        if let Some(plugin) = self.memo.get(&key) {
            return Ok(plugin.clone());
        }
        if self.on_stack.contains_key(key) {
            return Err(self.cycle_error(key));
        }

        let tree = self.tree;
        let node = tree.node(key).ok_or_else(|| ExportError::InvalidLink {
            tree: tree.name().to_string(),
            node: format!("{key:?}"),
            socket: String::new(),
        })?;

        self.stack.push(key);
        self.on_stack.insert(key, ());
        let result = match &node.kind {
            NodeKind::Plugin { plugin_type } => {
                let context = NodeContext {
                    owner: self.owner,
                    key,
                    node,
                };
                self.export_plugin_node(context, plugin_type)
            }
            NodeKind::Output | NodeKind::Reroute => self.export_linked_socket(key, 0),
        };
        self.stack.pop();
        self.on_stack.remove(key);

        let plugin = result?;
        self.memo.insert(key, plugin.clone());
        Ok(plugin)
    }

    fn export_plugin_node(&mut self, node: NodeContext<'_>, plugin_type: &str) -> ExportResult<AttrPlugin> {
        if self.ctx.schemas().is_skipped(plugin_type) {
            return Err(ExportError::UnresolvedReference {
                plugin_type: plugin_type.to_string(),
                attribute: node.node.name.clone(),
            });
        }

        if let Some(hooks) = self.ctx.hooks().get(plugin_type) {
            if let Some(result) = hooks.export_tree_node(self, node) {
                return result;
            }
        }

        let mut desc = self.descriptor(node, plugin_type)?;
        self.export_node_tree(node, &mut desc, &[])?;
        self.export_custom(node, &mut desc)?;
        self.emit(desc)
    }

    /// Populate `desc` from the sockets and properties of `node`
    ///
    /// Linked sockets receive the upstream plugin (a list of plugins for
    /// multi-input sockets); unlinked sockets receive their literal value,
    /// or the schema default, or the zero value of the declared kind.
    /// Sockets in `skipped` are left alone.
    pub fn export_node_tree(
        &mut self,
        node: NodeContext<'_>,
        desc: &mut PluginDesc,
        skipped: &[&str],
    ) -> ExportResult<()> {
        let schema = self.ctx.schemas().get(desc.plugin_type());

        for (index, socket) in node.node.inputs.iter().enumerate() {
            if skipped.contains(&socket.name.as_str()) {
                continue;
            }
            let def = schema.and_then(|s| s.attr(&socket.attr));
            if schema.is_some() && def.is_none() {
                warn!(
                    "{} has no attribute {} (socket {} of node {})",
                    desc.plugin_type(),
                    socket.attr,
                    socket.name,
                    node.node.name
                );
                continue;
            }

            if self.tree.is_linked(node.key, index) {
                if socket.multi_input {
                    let plugins = self.export_socket_links(node.key, index)?;
                    desc.set_attribute(
                        socket.attr.clone(),
                        AttrValue::List(plugins.into_iter().map(AttrValue::Plugin).collect()),
                    );
                    continue;
                }

                match self.export_linked_socket(node.key, index) {
                    Ok(plugin) if !plugin.is_empty() => {
                        desc.set_attribute(socket.attr.clone(), plugin);
                        continue;
                    }
                    Ok(_) => {}
                    Err(ExportError::UnresolvedReference { plugin_type, attribute }) => {
                        warn!(
                            "Skipping {}.{}: no exporter for {} ({})",
                            desc.name(),
                            socket.attr,
                            plugin_type,
                            attribute
                        );
                        continue;
                    }
                    Err(error) => return Err(error),
                }
            }

            let value = match (&socket.value, def) {
                (Some(value), _) => value.clone(),
                (None, Some(def)) => def.default_or_zero(),
                (None, None) => continue,
            };
            desc.set_attribute(socket.attr.clone(), value);
        }

        for (name, value) in &node.node.properties {
            if schema.map_or(true, |s| s.attr(name).is_some()) {
                desc.set_attribute(name.clone(), value.clone());
            }
        }
        Ok(())
    }

    /// Resolve the first link into one input socket
    ///
    /// Returns the empty reference when the socket is unlinked.
    pub fn export_linked_socket(&mut self, node: NodeKey, socket: usize) -> ExportResult<AttrPlugin> {
        match self.tree.links_to(node, socket).next().copied() {
            Some(link) => self.export_link(link),
            None => Ok(AttrPlugin::empty()),
        }
    }

    /// Resolve a socket by name, tolerating missing, dangling and
    /// unresolvable links
    pub fn export_optional_socket(&mut self, node: NodeContext<'_>, socket: &str) -> ExportResult<Option<AttrPlugin>> {
        let index = match node.node.input_index(socket) {
            Some(index) => index,
            None => return Ok(None),
        };
        match self.export_linked_socket(node.key, index) {
            Ok(plugin) if plugin.is_empty() => Ok(None),
            Ok(plugin) => Ok(Some(plugin)),
            Err(ExportError::UnresolvedReference { plugin_type, .. }) => {
                warn!("Ignoring link into {}.{}: no exporter for {}", node.node.name, socket, plugin_type);
                Ok(None)
            }
            Err(error) => Err(error),
        }
    }

    /// Resolve every link into a multi-input socket, in link order
    pub fn export_socket_links(&mut self, node: NodeKey, socket: usize) -> ExportResult<Vec<AttrPlugin>> {
        let links: Vec<Link> = self.tree.links_to(node, socket).copied().collect();
        let mut plugins = Vec::with_capacity(links.len());
        for link in links {
            match self.export_link(link) {
                Ok(plugin) if !plugin.is_empty() => plugins.push(plugin),
                Ok(_) => {}
                Err(ExportError::UnresolvedReference { plugin_type, attribute }) => {
                    warn!("Skipping list item {attribute}: no exporter for {plugin_type}");
                }
                Err(error) => return Err(error),
            }
        }
        Ok(plugins)
    }

    fn export_link(&mut self, link: Link) -> ExportResult<AttrPlugin> {
        let plugin = self.export_node(link.from_node)?;
        if plugin.is_empty() {
            return Ok(plugin);
        }
        let output = self
            .tree
            .node(link.from_node)
            .and_then(|n| n.outputs.get(link.from_socket))
            .and_then(|s| s.attr.clone());
        Ok(match output {
            Some(output) => plugin.with_output(output),
            None => plugin,
        })
    }

    /// Descriptor for a user-authored node, seeded from the schema
    pub fn descriptor(&mut self, node: NodeContext<'_>, plugin_type: &str) -> ExportResult<PluginDesc> {
        let name = self.ctx.state().naming.tree_node(self.owner, &node.node.name);
        Ok(self.ctx.descriptor(name, plugin_type)?.with_source_node(node.handle()))
    }

    /// Descriptor for a synthetic plugin inserted on behalf of `node`
    pub fn virtual_descriptor(
        &mut self,
        node: NodeContext<'_>,
        plugin_type: &str,
        slot: Option<usize>,
    ) -> ExportResult<PluginDesc> {
        let name = self
            .ctx
            .state_mut()
            .naming
            .next_virtual_node(self.owner, node.key, &node.node.name, plugin_type, slot);
        Ok(self.ctx.descriptor(name, plugin_type)?.with_source_node(node.handle()))
    }

    /// Run the post-processing hook of the descriptor's type, if any
    pub fn export_custom(&mut self, node: NodeContext<'_>, desc: &mut PluginDesc) -> ExportResult<()> {
        match self.ctx.hooks().get(desc.plugin_type()) {
            Some(hooks) => hooks.export_custom(self, node, desc),
            None => Ok(()),
        }
    }

    /// Track and send a finalized descriptor under the tree's owner
    pub fn emit(&mut self, desc: PluginDesc) -> ExportResult<AttrPlugin> {
        self.ctx.emit(self.owner, desc)
    }

    /// Shared default instance of a plugin type
    pub fn default_plugin(&mut self, plugin_type: &str) -> ExportResult<AttrPlugin> {
        self.ctx.default_plugin(plugin_type)
    }

    /// Hook failure attributed to `node`
    pub fn hook_failure(&self, node: NodeContext<'_>, message: impl Into<String>) -> ExportError {
        ExportError::HookFailure {
            plugin_type: node.plugin_type().to_string(),
            node: node.node.name.clone(),
            message: message.into(),
        }
    }

    fn cycle_error(&self, key: NodeKey) -> ExportError {
        let start = self.stack.iter().position(|k| *k == key).unwrap_or(0);
        let mut chain: Vec<String> = self.stack[start..]
            .iter()
            .filter_map(|k| self.tree.node(*k))
            .map(|n| n.name.clone())
            .collect();
        if let Some(node) = self.tree.node(key) {
            chain.push(node.name.clone());
        }
        ExportError::SceneGraphCycle {
            owner: self.owner,
            chain,
        }
    }
}

/// Export a whole tree owned by `owner`, returning its root plugin
pub fn export_tree<'a>(ctx: &mut ExportContext<'a>, owner: TrackId, tree: &'a NodeTree) -> ExportResult<AttrPlugin> {
    TreeExporter::new(ctx, owner, tree).export_root()
}
