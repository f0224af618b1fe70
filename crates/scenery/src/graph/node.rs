use crate::access::DataAccess;
use crate::control::Control;
use crate::error::Result;
use crate::mesh::{DrawMode, Mesh, MeshResources};
use crate::store::{
    BindGroupHandle, ColorTargetHandle, ComputePipelineHandle, PassParamHandle,
    RenderPipelineHandle, Store, TextureHandle,
};

use super::command::{ComputeCommand, PassKind, PassParam, RenderCommand};
use super::encoder::{ComputePassEncoder, GraphEncoder, RenderPassEncoder};
use super::GraphError;

pub const SIGNAL_SLOT: u32 = 0;
pub const CAMERA_SLOT: u32 = 1;
pub const MESH_SLOT: u32 = 2;

/// Depth buffer of a render node. The texture must be
/// [`DEPTH_FORMAT`](crate::access::DEPTH_FORMAT).
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct DepthAttachment {
    pub texture: TextureHandle,
    pub ops: wgpu::Operations<f32>,
    pub compare: wgpu::CompareFunction,
    pub write: bool,
}

impl DepthAttachment {
    /// Clears to 1.0 and keeps fragments closer than the stored depth.
    pub fn new(texture: TextureHandle) -> Self {
        Self {
            texture,
            ops: wgpu::Operations {
                load: wgpu::LoadOp::Clear(1.0),
                store: wgpu::StoreOp::Store,
            },
            compare: wgpu::CompareFunction::Less,
            write: true,
        }
    }

    /// Tests against depth written by an earlier pass.
    pub fn load(texture: TextureHandle) -> Self {
        Self {
            ops: wgpu::Operations {
                load: wgpu::LoadOp::Load,
                store: wgpu::StoreOp::Store,
            },
            ..Self::new(texture)
        }
    }
}

/// Load/store behavior, pipeline color target and render target of a
/// render node.
///
/// With no `target` the node draws into the view handed to
/// [`RenderGraph::render`](super::RenderGraph::render).
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ColorAttachment {
    pub ops: wgpu::Operations<wgpu::Color>,
    pub color_target: ColorTargetHandle,
    pub target: Option<TextureHandle>,
    pub depth: Option<DepthAttachment>,
}

impl ColorAttachment {
    pub fn clear(color: wgpu::Color, color_target: ColorTargetHandle) -> Self {
        Self {
            ops: wgpu::Operations {
                load: wgpu::LoadOp::Clear(color),
                store: wgpu::StoreOp::Store,
            },
            color_target,
            target: None,
            depth: None,
        }
    }

    pub fn load(color_target: ColorTargetHandle) -> Self {
        Self {
            ops: wgpu::Operations {
                load: wgpu::LoadOp::Load,
                store: wgpu::StoreOp::Store,
            },
            color_target,
            target: None,
            depth: None,
        }
    }

    /// Renders into `texture` instead of the frame's view.
    pub fn with_target(mut self, texture: TextureHandle) -> Self {
        self.target = Some(texture);
        self
    }

    pub fn with_depth(mut self, depth: DepthAttachment) -> Self {
        self.depth = Some(depth);
        self
    }
}

pub type RenderHook = dyn Fn(&Node, &Store, &mut dyn RenderPassEncoder) -> Result<(), GraphError>;
pub type ComputeHook = dyn Fn(&Node, &Store, &mut dyn ComputePassEncoder) -> Result<(), GraphError>;

/// Custom pass body. When set, it runs instead of the recorded commands.
pub enum FrameHook {
    Render(Box<RenderHook>),
    Compute(Box<ComputeHook>),
}

impl FrameHook {
    pub fn pass_kind(&self) -> PassKind {
        match self {
            FrameHook::Render(_) => PassKind::Render,
            FrameHook::Compute(_) => PassKind::Compute,
        }
    }
}

impl std::fmt::Debug for FrameHook {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "FrameHook({})", self.pass_kind())
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub enum NodeKind {
    Render(ColorAttachment),
    Compute,
}

impl NodeKind {
    pub fn pass_kind(&self) -> PassKind {
        match self {
            NodeKind::Render(_) => PassKind::Render,
            NodeKind::Compute => PassKind::Compute,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum NodePipeline {
    Render(RenderPipelineHandle),
    Compute(ComputePipelineHandle),
}

/// One pass in a [`RenderGraph`](super::RenderGraph): a mesh, the pipeline
/// that draws or dispatches it, and the recorded commands.
#[derive(Debug)]
pub struct Node {
    name: String,
    kind: NodeKind,
    order: i32,
    mesh: Mesh,
    pipeline: Option<NodePipeline>,
    pass_param: PassParamHandle,
    hook: Option<FrameHook>,
}

impl Node {
    pub(super) fn new(name: String, kind: NodeKind, order: i32, pass_param: PassParamHandle) -> Self {
        Self {
            name,
            kind,
            order,
            mesh: Mesh::default(),
            pipeline: None,
            pass_param,
            hook: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    pub fn pass_kind(&self) -> PassKind {
        self.kind.pass_kind()
    }

    pub fn order(&self) -> i32 {
        self.order
    }

    /// Sort key for [`RenderGraph::sort_by_order`](super::RenderGraph::sort_by_order).
    pub fn set_order(&mut self, order: i32) -> &mut Self {
        self.order = order;
        self
    }

    pub fn mesh(&self) -> &Mesh {
        &self.mesh
    }

    pub fn mesh_mut(&mut self) -> &mut Mesh {
        &mut self.mesh
    }

    pub fn set_mesh(&mut self, mesh: Mesh) -> &mut Self {
        self.mesh = mesh;
        self
    }

    pub fn pipeline(&self) -> Option<NodePipeline> {
        self.pipeline
    }

    pub fn pass_param(&self) -> PassParamHandle {
        self.pass_param
    }

    /// Replaces command replay with `hook` for this render node.
    pub fn set_render_hook(
        &mut self,
        hook: impl Fn(&Node, &Store, &mut dyn RenderPassEncoder) -> Result<(), GraphError> + 'static,
    ) -> Result<&mut Self, GraphError> {
        self.set_hook(FrameHook::Render(Box::new(hook)))
    }

    /// Replaces command replay with `hook` for this compute node.
    pub fn set_compute_hook(
        &mut self,
        hook: impl Fn(&Node, &Store, &mut dyn ComputePassEncoder) -> Result<(), GraphError> + 'static,
    ) -> Result<&mut Self, GraphError> {
        self.set_hook(FrameHook::Compute(Box::new(hook)))
    }

    fn set_hook(&mut self, hook: FrameHook) -> Result<&mut Self, GraphError> {
        self.expect_kind(hook.pass_kind())?;
        self.hook = Some(hook);
        Ok(self)
    }

    /// Goes back to replaying the recorded commands.
    pub fn clear_hook(&mut self) -> Option<FrameHook> {
        self.hook.take()
    }

    pub fn has_hook(&self) -> bool {
        self.hook.is_some()
    }

    /// Builds the pipeline from one WGSL module.
    ///
    /// Layouts are bound as signal, camera, mesh. Render nodes use
    /// `vs_main`/`fs_main` plus the mesh vertex layouts; compute nodes use
    /// `cs_main`. The mesh must already be allocated. A depth attachment adds
    /// a depth test in [`DEPTH_FORMAT`](crate::access::DEPTH_FORMAT).
    pub fn set_pipeline(&mut self, access: &mut DataAccess, control: &Control, wgsl: &str) -> Result<()> {
        let (signal, camera) = control.bindings().ok_or(GraphError::ControlNotReady)?;
        let mesh = self.mesh.require_resources()?;
        let kind = self.pass_kind();
        let layouts = [signal.layout(kind), camera.layout(kind), mesh.layout(kind)];
        let label = format!("{} pipeline", self.name);

        self.pipeline = Some(match self.kind {
            NodeKind::Render(attachment) => {
                let vertex_layouts = self.mesh.vertex_layouts();
                let topology = self.mesh.topology();
                let handle = access.register_render_pipeline(|b| {
                    let mut b = b.label(label).shader(wgsl);
                    for layout in layouts {
                        b = b.bind_group_layout(layout);
                    }
                    for layout in vertex_layouts {
                        b = b.vertex_layout(layout);
                    }
                    b = b.topology(topology).color_target_handle(attachment.color_target);
                    match attachment.depth {
                        Some(depth) => b.depth(crate::access::DEPTH_FORMAT, depth.compare, depth.write),
                        None => b,
                    }
                })?;
                NodePipeline::Render(handle)
            }
            NodeKind::Compute => {
                let handle = access.register_compute_pipeline(|b| {
                    let mut b = b.label(label).shader(wgsl);
                    for layout in layouts {
                        b = b.bind_group_layout(layout);
                    }
                    b
                })?;
                NodePipeline::Compute(handle)
            }
        });
        log::debug!("node `{}`: pipeline built", self.name);
        Ok(())
    }

    /// Replaces the recorded commands with the standard indirect draw sequence
    /// for this node's mesh.
    pub fn load_render_pass_param(&mut self, access: &mut DataAccess, control: &Control) -> Result<()> {
        self.expect_kind(PassKind::Render)?;
        let Some(NodePipeline::Render(pipeline)) = self.pipeline else {
            return Err(self.pipeline_missing().into());
        };
        let (signal, camera) = control.bindings().ok_or(GraphError::ControlNotReady)?;
        let res = self.mesh.require_resources()?;

        let commands = render_commands(
            pipeline,
            signal.group(PassKind::Render),
            camera.group(PassKind::Render),
            &self.mesh,
            res,
        );
        log::debug!("node `{}`: {} render commands", self.name, commands.len());
        access
            .store_mut()
            .update(self.pass_param, PassParam::Render(commands))?;
        Ok(())
    }

    /// Replaces the recorded commands with one indirect dispatch over the
    /// mesh's dispatch buffer.
    pub fn load_compute_pass_param(&mut self, access: &mut DataAccess, control: &Control) -> Result<()> {
        self.expect_kind(PassKind::Compute)?;
        let Some(NodePipeline::Compute(pipeline)) = self.pipeline else {
            return Err(self.pipeline_missing().into());
        };
        let (signal, camera) = control.bindings().ok_or(GraphError::ControlNotReady)?;
        let res = self.mesh.require_resources()?;

        let commands = compute_commands(
            pipeline,
            signal.group(PassKind::Compute),
            camera.group(PassKind::Compute),
            res,
        );
        access
            .store_mut()
            .update(self.pass_param, PassParam::Compute(commands))?;
        Ok(())
    }

    pub fn push_render_command(&self, store: &mut Store, command: RenderCommand) -> Result<(), GraphError> {
        match store.get_mut(self.pass_param)? {
            PassParam::Render(commands) => {
                commands.push(command);
                Ok(())
            }
            PassParam::Compute(_) => Err(self.mismatch(PassKind::Render, PassKind::Compute)),
        }
    }

    pub fn push_compute_command(&self, store: &mut Store, command: ComputeCommand) -> Result<(), GraphError> {
        match store.get_mut(self.pass_param)? {
            PassParam::Compute(commands) => {
                commands.push(command);
                Ok(())
            }
            PassParam::Render(_) => Err(self.mismatch(PassKind::Compute, PassKind::Render)),
        }
    }

    /// Runs the render hook, or replays the recorded render commands, into
    /// an open pass.
    pub fn frame_render(&self, store: &Store, pass: &mut dyn RenderPassEncoder) -> Result<(), GraphError> {
        if let Some(FrameHook::Render(hook)) = &self.hook {
            return hook(self, store, pass);
        }
        let param = self.param(store, PassKind::Render)?;
        param.replay_render(pass)?;
        Ok(())
    }

    /// Runs the compute hook, or replays the recorded compute commands, into
    /// an open pass.
    pub fn frame_compute(&self, store: &Store, pass: &mut dyn ComputePassEncoder) -> Result<(), GraphError> {
        if let Some(FrameHook::Compute(hook)) = &self.hook {
            return hook(self, store, pass);
        }
        let param = self.param(store, PassKind::Compute)?;
        param.replay_compute(pass)?;
        Ok(())
    }

    /// Opens this node's pass on `encoder` and fills it. Recorded commands
    /// are checked before the pass is opened.
    pub(super) fn encode(&self, store: &Store, encoder: &mut dyn GraphEncoder) -> Result<(), GraphError> {
        if self.hook.is_none() {
            self.param(store, self.pass_kind())?;
        }
        match &self.kind {
            NodeKind::Render(attachment) => {
                encoder.render_pass(&self.name, attachment, &mut |pass| self.frame_render(store, pass))
            }
            NodeKind::Compute => {
                encoder.compute_pass(&self.name, &mut |pass| self.frame_compute(store, pass))
            }
        }
    }

    /// The recorded commands, checked against `expected`.
    pub(super) fn param<'s>(&self, store: &'s Store, expected: PassKind) -> Result<&'s PassParam, GraphError> {
        self.expect_kind(expected)?;
        let param = store.get(self.pass_param)?;
        if param.kind() != expected {
            return Err(self.mismatch(expected, param.kind()));
        }
        Ok(param)
    }

    fn expect_kind(&self, expected: PassKind) -> Result<(), GraphError> {
        let found = self.pass_kind();
        if found != expected {
            return Err(self.mismatch(expected, found));
        }
        Ok(())
    }

    fn mismatch(&self, expected: PassKind, found: PassKind) -> GraphError {
        GraphError::KindMismatch {
            node: self.name.clone(),
            expected,
            found,
        }
    }

    fn pipeline_missing(&self) -> GraphError {
        GraphError::PipelineMissing {
            node: self.name.clone(),
        }
    }
}

/// Pipeline, bind groups 0..=2, vertex (and instance) buffers, index buffer
/// for indexed meshes, then one indirect draw per object.
pub fn render_commands(
    pipeline: RenderPipelineHandle,
    signal: BindGroupHandle,
    camera: BindGroupHandle,
    mesh: &Mesh,
    res: &MeshResources,
) -> Vec<RenderCommand> {
    let mut out = vec![
        RenderCommand::SetPipeline(pipeline),
        RenderCommand::SetBindGroup {
            slot: SIGNAL_SLOT,
            group: signal,
            offsets: Vec::new(),
        },
        RenderCommand::SetBindGroup {
            slot: CAMERA_SLOT,
            group: camera,
            offsets: Vec::new(),
        },
        RenderCommand::SetBindGroup {
            slot: MESH_SLOT,
            group: res.render_group,
            offsets: Vec::new(),
        },
        RenderCommand::SetVertexBuffer {
            slot: 0,
            buffer: res.vertex,
        },
    ];
    if mesh.instance_layout().is_some() {
        out.push(RenderCommand::SetVertexBuffer {
            slot: 1,
            buffer: res.gos,
        });
    }

    let stride = mesh.indirect_stride();
    let indexed = mesh.draw_mode() == DrawMode::Indexed;
    if let (true, Some(index)) = (indexed, res.index) {
        out.push(RenderCommand::SetIndexBuffer {
            buffer: index,
            format: wgpu::IndexFormat::Uint32,
        });
    }
    for i in 0..mesh.len() as u64 {
        let offset = i * stride;
        out.push(if indexed {
            RenderCommand::DrawIndexedIndirect {
                buffer: res.indirect,
                offset,
            }
        } else {
            RenderCommand::DrawIndirect {
                buffer: res.indirect,
                offset,
            }
        });
    }
    out
}

/// Pipeline, bind groups 0..=2, one indirect dispatch.
pub fn compute_commands(
    pipeline: ComputePipelineHandle,
    signal: BindGroupHandle,
    camera: BindGroupHandle,
    res: &MeshResources,
) -> Vec<ComputeCommand> {
    vec![
        ComputeCommand::SetPipeline(pipeline),
        ComputeCommand::SetBindGroup {
            slot: SIGNAL_SLOT,
            group: signal,
            offsets: Vec::new(),
        },
        ComputeCommand::SetBindGroup {
            slot: CAMERA_SLOT,
            group: camera,
            offsets: Vec::new(),
        },
        ComputeCommand::SetBindGroup {
            slot: MESH_SLOT,
            group: res.compute_group,
            offsets: Vec::new(),
        },
        ComputeCommand::DispatchWorkgroupsIndirect {
            buffer: res.dispatch,
            offset: 0,
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builders::VertexLayout;
    use crate::graph::encoder::Recorder;
    use crate::mesh::GobjDesc;
    use crate::store::Handle;

    fn resources(indexed: bool) -> MeshResources {
        MeshResources {
            vertex: Handle::new(10),
            index: indexed.then(|| Handle::new(11)),
            gos: Handle::new(12),
            instances: Handle::new(13),
            indirect: Handle::new(14),
            dispatch: Handle::new(15),
            case: None,
            case_capacity: 0,
            out: None,
            gos_texture: None,
            render_layout: Handle::new(20),
            render_group: Handle::new(21),
            compute_layout: Handle::new(22),
            compute_group: Handle::new(23),
        }
    }

    fn xyz_mesh() -> Mesh {
        Mesh::new("test", VertexLayout::new(12))
    }

    fn replay(commands: &[RenderCommand]) -> Vec<String> {
        let mut rec = Recorder::default();
        for c in commands {
            c.encode(&mut rec).unwrap();
        }
        rec.calls
    }

    #[test]
    fn non_indexed_mesh_draws_each_object_at_16_byte_steps() {
        let mut mesh = xyz_mesh();
        mesh.add(&[0.0; 9], GobjDesc::new()).unwrap();
        mesh.add(&[0.0; 12], GobjDesc::new()).unwrap();

        let cmds = render_commands(Handle::new(1), Handle::new(2), Handle::new(3), &mesh, &resources(false));
        assert_eq!(
            replay(&cmds),
            vec![
                "set_pipeline 1",
                "set_bind_group 0 2 []",
                "set_bind_group 1 3 []",
                "set_bind_group 2 21 []",
                "set_vertex_buffer 0 10",
                "draw_indirect 14 0",
                "draw_indirect 14 16",
            ]
        );
    }

    #[test]
    fn indexed_mesh_with_instances_binds_gos_and_index_buffer() {
        let mut mesh = xyz_mesh().with_instance_layout(VertexLayout::instance(80));
        mesh.add_indexed(&[0.0; 9], &[0, 1, 2], GobjDesc::new()).unwrap();
        mesh.add_indexed(&[0.0; 9], &[0, 1, 2], GobjDesc::new()).unwrap();

        let cmds = render_commands(Handle::new(1), Handle::new(2), Handle::new(3), &mesh, &resources(true));
        assert_eq!(
            replay(&cmds)[4..],
            [
                "set_vertex_buffer 0 10",
                "set_vertex_buffer 1 12",
                "set_index_buffer 11 Uint32",
                "draw_indexed_indirect 14 0",
                "draw_indexed_indirect 14 20",
            ]
        );
    }

    #[test]
    fn compute_commands_dispatch_indirectly_from_offset_zero() {
        let cmds = compute_commands(Handle::new(4), Handle::new(5), Handle::new(6), &resources(false));
        assert_eq!(cmds.len(), 5);
        assert_eq!(cmds[3], ComputeCommand::SetBindGroup {
            slot: MESH_SLOT,
            group: Handle::new(23),
            offsets: Vec::new(),
        });
        assert_eq!(cmds[4], ComputeCommand::DispatchWorkgroupsIndirect {
            buffer: Handle::new(15),
            offset: 0,
        });
    }

    #[test]
    fn pushed_commands_replay_in_insertion_order() {
        let mut store = Store::new();
        let param = store.register(PassParam::new(PassKind::Render));
        let load = ColorAttachment::load(Handle::new(0));
        let node = Node::new("n".into(), NodeKind::Render(load), 0, param);

        node.push_render_command(&mut store, RenderCommand::SetStencilReference(7)).unwrap();
        node.push_render_command(&mut store, RenderCommand::Draw { vertices: 0..3, instances: 0..1 }).unwrap();
        node.push_render_command(&mut store, RenderCommand::SetScissorRect { x: 1, y: 2, width: 3, height: 4 }).unwrap();

        let mut rec = Recorder::default();
        node.frame_render(&store, &mut rec).unwrap();
        assert_eq!(
            rec.calls,
            vec![
                "set_stencil_reference 7",
                "draw 0..3 0..1",
                "set_scissor_rect 1 2 3 4",
            ]
        );
    }

    #[test]
    fn compute_command_on_render_node_is_kind_mismatch() {
        let mut store = Store::new();
        let param = store.register(PassParam::new(PassKind::Render));
        let node = Node::new("draw".into(), NodeKind::Render(ColorAttachment::load(Handle::new(0))), 0, param);

        let err = node
            .push_compute_command(&mut store, ComputeCommand::DispatchWorkgroups { x: 1, y: 1, z: 1 })
            .unwrap_err();
        assert_eq!(
            err,
            GraphError::KindMismatch {
                node: "draw".into(),
                expected: PassKind::Compute,
                found: PassKind::Render,
            }
        );

        let mut rec = Recorder::default();
        assert!(matches!(
            node.frame_compute(&store, &mut rec),
            Err(GraphError::KindMismatch { .. })
        ));
        assert!(rec.calls.is_empty());
    }

    #[test]
    fn unknown_pass_param_surfaces_store_error() {
        let store = Store::new();
        let node = Node::new("c".into(), NodeKind::Compute, 0, Handle::new(3));
        let mut rec = Recorder::default();
        assert!(matches!(
            node.frame_compute(&store, &mut rec),
            Err(GraphError::Store(_))
        ));
    }
}
