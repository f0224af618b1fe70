use crate::access::DataAccess;
use crate::store::Store;

use super::command::PassParam;
use super::encoder::{GraphEncoder, WgpuGraphEncoder};
use super::node::{ColorAttachment, Node, NodeKind};
use super::GraphError;

/// Ordered list of nodes recorded into a single command buffer.
#[derive(Debug, Default)]
pub struct RenderGraph {
    label: String,
    nodes: Vec<Node>,
}

impl RenderGraph {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            nodes: Vec::new(),
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn add_render_node(
        &mut self,
        store: &mut Store,
        name: &str,
        attachment: ColorAttachment,
    ) -> Result<&mut Node, GraphError> {
        self.add_node(store, name, NodeKind::Render(attachment))
    }

    pub fn add_compute_node(&mut self, store: &mut Store, name: &str) -> Result<&mut Node, GraphError> {
        self.add_node(store, name, NodeKind::Compute)
    }

    fn add_node(&mut self, store: &mut Store, name: &str, kind: NodeKind) -> Result<&mut Node, GraphError> {
        if self.position(name).is_some() {
            return Err(GraphError::DuplicateNode {
                name: name.to_string(),
            });
        }
        let param = store.register(PassParam::new(kind.pass_kind()));
        let order = self.nodes.len() as i32;
        log::debug!("{}: added {} node `{name}`", self.label, kind.pass_kind());
        let index = self.nodes.len();
        self.nodes.push(Node::new(name.to_string(), kind, order, param));
        Ok(&mut self.nodes[index])
    }

    pub fn node(&self, name: &str) -> Result<&Node, GraphError> {
        self.position(name)
            .map(|i| &self.nodes[i])
            .ok_or_else(|| GraphError::UnknownNode {
                name: name.to_string(),
            })
    }

    pub fn node_mut(&mut self, name: &str) -> Result<&mut Node, GraphError> {
        match self.position(name) {
            Some(i) => Ok(&mut self.nodes[i]),
            None => Err(GraphError::UnknownNode {
                name: name.to_string(),
            }),
        }
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.nodes.iter().position(|n| n.name() == name)
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn nodes_mut(&mut self) -> impl Iterator<Item = &mut Node> {
        self.nodes.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Stable sort by [`Node::order`]; equal keys keep insertion order.
    pub fn sort_by_order(&mut self) {
        self.nodes.sort_by_key(Node::order);
    }

    /// Opens one pass per node, in list order, and replays its commands.
    pub fn encode(&self, store: &Store, encoder: &mut dyn GraphEncoder) -> Result<(), GraphError> {
        for node in &self.nodes {
            log::trace!("{}: encoding `{}`", self.label, node.name());
            node.encode(store, encoder)?;
        }
        Ok(())
    }

    /// Encodes every node into one command encoder targeting `view` and
    /// submits it once.
    pub fn render(&self, access: &DataAccess, view: &wgpu::TextureView) -> Result<(), GraphError> {
        let mut encoder = access
            .device()
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some(&self.label),
            });
        {
            let mut graph_encoder = WgpuGraphEncoder::new(&mut encoder, view, access.store());
            self.encode(access.store(), &mut graph_encoder)?;
        }
        access.queue().submit(std::iter::once(encoder.finish()));
        Ok(())
    }
}
