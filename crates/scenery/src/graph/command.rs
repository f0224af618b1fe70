use std::ops::Range;

use crate::store::{BindGroupHandle, BufferHandle, ComputePipelineHandle, RenderPipelineHandle, StoreError};

use super::encoder::{ComputePassEncoder, RenderPassEncoder};

/// Kind of pass a node records into.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum PassKind {
    Render,
    Compute,
}

impl std::fmt::Display for PassKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            PassKind::Render => "render",
            PassKind::Compute => "compute",
        })
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Viewport {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub min_depth: f32,
    pub max_depth: f32,
}

/// One call on a render pass.
#[derive(Debug, Clone, PartialEq)]
pub enum RenderCommand {
    SetPipeline(RenderPipelineHandle),
    SetBindGroup {
        slot: u32,
        group: BindGroupHandle,
        offsets: Vec<u32>,
    },
    SetVertexBuffer {
        slot: u32,
        buffer: BufferHandle,
    },
    SetIndexBuffer {
        buffer: BufferHandle,
        format: wgpu::IndexFormat,
    },
    Draw {
        vertices: Range<u32>,
        instances: Range<u32>,
    },
    DrawIndexed {
        indices: Range<u32>,
        base_vertex: i32,
        instances: Range<u32>,
    },
    DrawIndirect {
        buffer: BufferHandle,
        offset: u64,
    },
    DrawIndexedIndirect {
        buffer: BufferHandle,
        offset: u64,
    },
    SetViewport(Viewport),
    SetScissorRect {
        x: u32,
        y: u32,
        width: u32,
        height: u32,
    },
    SetBlendConstant(wgpu::Color),
    SetStencilReference(u32),
}

impl RenderCommand {
    pub fn encode(&self, pass: &mut dyn RenderPassEncoder) -> Result<(), StoreError> {
        match self {
            RenderCommand::SetPipeline(p) => pass.set_pipeline(*p)?,
            RenderCommand::SetBindGroup {
                slot,
                group,
                offsets,
            } => pass.set_bind_group(*slot, *group, offsets)?,
            RenderCommand::SetVertexBuffer { slot, buffer } => {
                pass.set_vertex_buffer(*slot, *buffer)?
            }
            RenderCommand::SetIndexBuffer { buffer, format } => {
                pass.set_index_buffer(*buffer, *format)?
            }
            RenderCommand::Draw {
                vertices,
                instances,
            } => pass.draw(vertices.clone(), instances.clone()),
            RenderCommand::DrawIndexed {
                indices,
                base_vertex,
                instances,
            } => pass.draw_indexed(indices.clone(), *base_vertex, instances.clone()),
            RenderCommand::DrawIndirect { buffer, offset } => pass.draw_indirect(*buffer, *offset)?,
            RenderCommand::DrawIndexedIndirect { buffer, offset } => {
                pass.draw_indexed_indirect(*buffer, *offset)?
            }
            RenderCommand::SetViewport(v) => pass.set_viewport(*v),
            RenderCommand::SetScissorRect {
                x,
                y,
                width,
                height,
            } => pass.set_scissor_rect(*x, *y, *width, *height),
            RenderCommand::SetBlendConstant(c) => pass.set_blend_constant(*c),
            RenderCommand::SetStencilReference(r) => pass.set_stencil_reference(*r),
        }
        Ok(())
    }
}

/// One call on a compute pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ComputeCommand {
    SetPipeline(ComputePipelineHandle),
    SetBindGroup {
        slot: u32,
        group: BindGroupHandle,
        offsets: Vec<u32>,
    },
    DispatchWorkgroups {
        x: u32,
        y: u32,
        z: u32,
    },
    DispatchWorkgroupsIndirect {
        buffer: BufferHandle,
        offset: u64,
    },
}

impl ComputeCommand {
    pub fn encode(&self, pass: &mut dyn ComputePassEncoder) -> Result<(), StoreError> {
        match self {
            ComputeCommand::SetPipeline(p) => pass.set_pipeline(*p)?,
            ComputeCommand::SetBindGroup {
                slot,
                group,
                offsets,
            } => pass.set_bind_group(*slot, *group, offsets)?,
            ComputeCommand::DispatchWorkgroups { x, y, z } => pass.dispatch_workgroups(*x, *y, *z),
            ComputeCommand::DispatchWorkgroupsIndirect { buffer, offset } => {
                pass.dispatch_workgroups_indirect(*buffer, *offset)?
            }
        }
        Ok(())
    }
}

/// Recorded calls for one pass, replayed in insertion order every frame.
#[derive(Debug, Clone, PartialEq)]
pub enum PassParam {
    Render(Vec<RenderCommand>),
    Compute(Vec<ComputeCommand>),
}

impl PassParam {
    pub fn new(kind: PassKind) -> Self {
        match kind {
            PassKind::Render => PassParam::Render(Vec::new()),
            PassKind::Compute => PassParam::Compute(Vec::new()),
        }
    }

    pub fn kind(&self) -> PassKind {
        match self {
            PassParam::Render(_) => PassKind::Render,
            PassParam::Compute(_) => PassKind::Compute,
        }
    }

    pub fn is_render(&self) -> bool {
        self.kind() == PassKind::Render
    }

    pub fn len(&self) -> usize {
        match self {
            PassParam::Render(c) => c.len(),
            PassParam::Compute(c) => c.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&mut self) {
        match self {
            PassParam::Render(c) => c.clear(),
            PassParam::Compute(c) => c.clear(),
        }
    }

    pub fn replay_render(&self, pass: &mut dyn RenderPassEncoder) -> Result<(), StoreError> {
        if let PassParam::Render(commands) = self {
            for cmd in commands {
                cmd.encode(pass)?;
            }
        }
        Ok(())
    }

    pub fn replay_compute(&self, pass: &mut dyn ComputePassEncoder) -> Result<(), StoreError> {
        if let PassParam::Compute(commands) = self {
            for cmd in commands {
                cmd.encode(pass)?;
            }
        }
        Ok(())
    }
}
