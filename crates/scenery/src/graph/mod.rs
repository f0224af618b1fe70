//! Recorded pass replay.
//!
//! A [`RenderGraph`] is an ordered list of [`Node`]s. Each node owns a mesh,
//! a pipeline and a [`PassParam`] in the store; rendering opens one pass per
//! node, replays the recorded commands (or runs the node's [`FrameHook`])
//! and submits everything once.

mod command;
mod encoder;
mod node;
mod render_graph;

pub use command::{ComputeCommand, PassKind, PassParam, RenderCommand, Viewport};
pub use encoder::{
    ComputePassEncoder, GraphEncoder, RecordCompute, RecordRender, RenderPassEncoder,
    WgpuComputePass, WgpuGraphEncoder, WgpuRenderPass,
};
pub use node::{
    compute_commands, render_commands, ColorAttachment, ComputeHook, DepthAttachment, FrameHook,
    Node, NodeKind, NodePipeline, RenderHook, CAMERA_SLOT, MESH_SLOT, SIGNAL_SLOT,
};
pub use render_graph::RenderGraph;

use thiserror::Error;

use crate::store::StoreError;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("node `{node}` is a {found} node, expected {expected}")]
    KindMismatch {
        node: String,
        expected: PassKind,
        found: PassKind,
    },
    #[error("a node named `{name}` already exists")]
    DuplicateNode { name: String },
    #[error("no node named `{name}`")]
    UnknownNode { name: String },
    #[error("node `{node}` has no pipeline of its kind")]
    PipelineMissing { node: String },
    #[error("signal and camera bindings are not initialized")]
    ControlNotReady,
}
