//! Encoder seams.
//!
//! Replay talks to these traits rather than to wgpu directly; the wgpu
//! implementations resolve handles through the store at call time.

use std::ops::Range;

use crate::store::{
    BindGroupHandle, BufferHandle, ComputePipelineHandle, RenderPipelineHandle, Store, StoreError,
    TextureHandle,
};

use super::command::Viewport;
use super::node::ColorAttachment;
use super::GraphError;

pub trait RenderPassEncoder {
    fn set_pipeline(&mut self, pipeline: RenderPipelineHandle) -> Result<(), StoreError>;
    fn set_bind_group(
        &mut self,
        slot: u32,
        group: BindGroupHandle,
        offsets: &[u32],
    ) -> Result<(), StoreError>;
    fn set_vertex_buffer(&mut self, slot: u32, buffer: BufferHandle) -> Result<(), StoreError>;
    fn set_index_buffer(
        &mut self,
        buffer: BufferHandle,
        format: wgpu::IndexFormat,
    ) -> Result<(), StoreError>;
    fn draw(&mut self, vertices: Range<u32>, instances: Range<u32>);
    fn draw_indexed(&mut self, indices: Range<u32>, base_vertex: i32, instances: Range<u32>);
    fn draw_indirect(&mut self, buffer: BufferHandle, offset: u64) -> Result<(), StoreError>;
    fn draw_indexed_indirect(&mut self, buffer: BufferHandle, offset: u64)
    -> Result<(), StoreError>;
    fn set_viewport(&mut self, viewport: Viewport);
    fn set_scissor_rect(&mut self, x: u32, y: u32, width: u32, height: u32);
    fn set_blend_constant(&mut self, color: wgpu::Color);
    fn set_stencil_reference(&mut self, reference: u32);
}

pub trait ComputePassEncoder {
    fn set_pipeline(&mut self, pipeline: ComputePipelineHandle) -> Result<(), StoreError>;
    fn set_bind_group(
        &mut self,
        slot: u32,
        group: BindGroupHandle,
        offsets: &[u32],
    ) -> Result<(), StoreError>;
    fn dispatch_workgroups(&mut self, x: u32, y: u32, z: u32);
    fn dispatch_workgroups_indirect(
        &mut self,
        buffer: BufferHandle,
        offset: u64,
    ) -> Result<(), StoreError>;
}

pub type RecordRender<'r> = dyn FnMut(&mut dyn RenderPassEncoder) -> Result<(), GraphError> + 'r;
pub type RecordCompute<'r> = dyn FnMut(&mut dyn ComputePassEncoder) -> Result<(), GraphError> + 'r;

/// Opens passes on a command encoder. Each pass ends when `record` returns.
pub trait GraphEncoder {
    fn render_pass(
        &mut self,
        label: &str,
        attachment: &ColorAttachment,
        record: &mut RecordRender<'_>,
    ) -> Result<(), GraphError>;

    fn compute_pass(&mut self, label: &str, record: &mut RecordCompute<'_>)
    -> Result<(), GraphError>;
}

// ── wgpu ──────────────────────────────────────────────────────────────────

pub struct WgpuRenderPass<'a, 'p> {
    pass: &'a mut wgpu::RenderPass<'p>,
    store: &'a Store,
}

impl<'a, 'p> WgpuRenderPass<'a, 'p> {
    pub fn new(pass: &'a mut wgpu::RenderPass<'p>, store: &'a Store) -> Self {
        Self { pass, store }
    }
}

impl RenderPassEncoder for WgpuRenderPass<'_, '_> {
    fn set_pipeline(&mut self, pipeline: RenderPipelineHandle) -> Result<(), StoreError> {
        self.pass.set_pipeline(self.store.get(pipeline)?);
        Ok(())
    }

    fn set_bind_group(
        &mut self,
        slot: u32,
        group: BindGroupHandle,
        offsets: &[u32],
    ) -> Result<(), StoreError> {
        self.pass.set_bind_group(slot, self.store.get(group)?, offsets);
        Ok(())
    }

    fn set_vertex_buffer(&mut self, slot: u32, buffer: BufferHandle) -> Result<(), StoreError> {
        self.pass.set_vertex_buffer(slot, self.store.get(buffer)?.slice(..));
        Ok(())
    }

    fn set_index_buffer(
        &mut self,
        buffer: BufferHandle,
        format: wgpu::IndexFormat,
    ) -> Result<(), StoreError> {
        self.pass.set_index_buffer(self.store.get(buffer)?.slice(..), format);
        Ok(())
    }

    fn draw(&mut self, vertices: Range<u32>, instances: Range<u32>) {
        self.pass.draw(vertices, instances);
    }

    fn draw_indexed(&mut self, indices: Range<u32>, base_vertex: i32, instances: Range<u32>) {
        self.pass.draw_indexed(indices, base_vertex, instances);
    }

    fn draw_indirect(&mut self, buffer: BufferHandle, offset: u64) -> Result<(), StoreError> {
        self.pass.draw_indirect(self.store.get(buffer)?, offset);
        Ok(())
    }

    fn draw_indexed_indirect(
        &mut self,
        buffer: BufferHandle,
        offset: u64,
    ) -> Result<(), StoreError> {
        self.pass.draw_indexed_indirect(self.store.get(buffer)?, offset);
        Ok(())
    }

    fn set_viewport(&mut self, v: Viewport) {
        self.pass
            .set_viewport(v.x, v.y, v.width, v.height, v.min_depth, v.max_depth);
    }

    fn set_scissor_rect(&mut self, x: u32, y: u32, width: u32, height: u32) {
        self.pass.set_scissor_rect(x, y, width, height);
    }

    fn set_blend_constant(&mut self, color: wgpu::Color) {
        self.pass.set_blend_constant(color);
    }

    fn set_stencil_reference(&mut self, reference: u32) {
        self.pass.set_stencil_reference(reference);
    }
}

pub struct WgpuComputePass<'a, 'p> {
    pass: &'a mut wgpu::ComputePass<'p>,
    store: &'a Store,
}

impl<'a, 'p> WgpuComputePass<'a, 'p> {
    pub fn new(pass: &'a mut wgpu::ComputePass<'p>, store: &'a Store) -> Self {
        Self { pass, store }
    }
}

impl ComputePassEncoder for WgpuComputePass<'_, '_> {
    fn set_pipeline(&mut self, pipeline: ComputePipelineHandle) -> Result<(), StoreError> {
        self.pass.set_pipeline(self.store.get(pipeline)?);
        Ok(())
    }

    fn set_bind_group(
        &mut self,
        slot: u32,
        group: BindGroupHandle,
        offsets: &[u32],
    ) -> Result<(), StoreError> {
        self.pass.set_bind_group(slot, self.store.get(group)?, offsets);
        Ok(())
    }

    fn dispatch_workgroups(&mut self, x: u32, y: u32, z: u32) {
        self.pass.dispatch_workgroups(x, y, z);
    }

    fn dispatch_workgroups_indirect(
        &mut self,
        buffer: BufferHandle,
        offset: u64,
    ) -> Result<(), StoreError> {
        self.pass
            .dispatch_workgroups_indirect(self.store.get(buffer)?, offset);
        Ok(())
    }
}

/// Records passes into one command encoder. Render nodes without their own
/// target texture draw into `target`.
pub struct WgpuGraphEncoder<'a> {
    encoder: &'a mut wgpu::CommandEncoder,
    target: &'a wgpu::TextureView,
    store: &'a Store,
}

impl<'a> WgpuGraphEncoder<'a> {
    pub fn new(
        encoder: &'a mut wgpu::CommandEncoder,
        target: &'a wgpu::TextureView,
        store: &'a Store,
    ) -> Self {
        Self {
            encoder,
            target,
            store,
        }
    }
}

impl GraphEncoder for WgpuGraphEncoder<'_> {
    fn render_pass(
        &mut self,
        label: &str,
        attachment: &ColorAttachment,
        record: &mut RecordRender<'_>,
    ) -> Result<(), GraphError> {
        let view = |texture: TextureHandle| -> Result<wgpu::TextureView, StoreError> {
            Ok(self
                .store
                .get(texture)?
                .create_view(&wgpu::TextureViewDescriptor::default()))
        };
        let color_view = attachment.target.map(view).transpose()?;
        let depth_view = attachment.depth.map(|d| view(d.texture)).transpose()?;

        let mut pass = self.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some(label),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: color_view.as_ref().unwrap_or(self.target),
                resolve_target: None,
                ops: attachment.ops,
                depth_slice: None,
            })],
            depth_stencil_attachment: depth_view.as_ref().zip(attachment.depth).map(|(view, depth)| {
                wgpu::RenderPassDepthStencilAttachment {
                    view,
                    depth_ops: Some(depth.ops),
                    stencil_ops: None,
                }
            }),
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });
        let mut recorder = WgpuRenderPass::new(&mut pass, self.store);
        record(&mut recorder)
    }

    fn compute_pass(
        &mut self,
        label: &str,
        record: &mut RecordCompute<'_>,
    ) -> Result<(), GraphError> {
        let mut pass = self.encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
            label: Some(label),
            timestamp_writes: None,
        });
        let mut recorder = WgpuComputePass::new(&mut pass, self.store);
        record(&mut recorder)
    }
}

/// Records every call as a readable line.
#[cfg(test)]
#[derive(Debug, Default)]
pub(crate) struct Recorder {
    pub calls: Vec<String>,
}

#[cfg(test)]
impl RenderPassEncoder for Recorder {
    fn set_pipeline(&mut self, pipeline: RenderPipelineHandle) -> Result<(), StoreError> {
        self.calls.push(format!("set_pipeline {}", pipeline.index()));
        Ok(())
    }

    fn set_bind_group(
        &mut self,
        slot: u32,
        group: BindGroupHandle,
        offsets: &[u32],
    ) -> Result<(), StoreError> {
        self.calls
            .push(format!("set_bind_group {slot} {} {offsets:?}", group.index()));
        Ok(())
    }

    fn set_vertex_buffer(&mut self, slot: u32, buffer: BufferHandle) -> Result<(), StoreError> {
        self.calls
            .push(format!("set_vertex_buffer {slot} {}", buffer.index()));
        Ok(())
    }

    fn set_index_buffer(
        &mut self,
        buffer: BufferHandle,
        format: wgpu::IndexFormat,
    ) -> Result<(), StoreError> {
        self.calls
            .push(format!("set_index_buffer {} {format:?}", buffer.index()));
        Ok(())
    }

    fn draw(&mut self, vertices: Range<u32>, instances: Range<u32>) {
        self.calls.push(format!("draw {vertices:?} {instances:?}"));
    }

    fn draw_indexed(&mut self, indices: Range<u32>, base_vertex: i32, instances: Range<u32>) {
        self.calls
            .push(format!("draw_indexed {indices:?} {base_vertex} {instances:?}"));
    }

    fn draw_indirect(&mut self, buffer: BufferHandle, offset: u64) -> Result<(), StoreError> {
        self.calls
            .push(format!("draw_indirect {} {offset}", buffer.index()));
        Ok(())
    }

    fn draw_indexed_indirect(
        &mut self,
        buffer: BufferHandle,
        offset: u64,
    ) -> Result<(), StoreError> {
        self.calls
            .push(format!("draw_indexed_indirect {} {offset}", buffer.index()));
        Ok(())
    }

    fn set_viewport(&mut self, v: Viewport) {
        self.calls
            .push(format!("set_viewport {} {} {} {}", v.x, v.y, v.width, v.height));
    }

    fn set_scissor_rect(&mut self, x: u32, y: u32, width: u32, height: u32) {
        self.calls
            .push(format!("set_scissor_rect {x} {y} {width} {height}"));
    }

    fn set_blend_constant(&mut self, color: wgpu::Color) {
        self.calls.push(format!("set_blend_constant {}", color.r));
    }

    fn set_stencil_reference(&mut self, reference: u32) {
        self.calls.push(format!("set_stencil_reference {reference}"));
    }
}

#[cfg(test)]
impl ComputePassEncoder for Recorder {
    fn set_pipeline(&mut self, pipeline: ComputePipelineHandle) -> Result<(), StoreError> {
        self.calls.push(format!("set_pipeline {}", pipeline.index()));
        Ok(())
    }

    fn set_bind_group(
        &mut self,
        slot: u32,
        group: BindGroupHandle,
        offsets: &[u32],
    ) -> Result<(), StoreError> {
        self.calls
            .push(format!("set_bind_group {slot} {} {offsets:?}", group.index()));
        Ok(())
    }

    fn dispatch_workgroups(&mut self, x: u32, y: u32, z: u32) {
        self.calls.push(format!("dispatch_workgroups {x} {y} {z}"));
    }

    fn dispatch_workgroups_indirect(
        &mut self,
        buffer: BufferHandle,
        offset: u64,
    ) -> Result<(), StoreError> {
        self.calls
            .push(format!("dispatch_workgroups_indirect {} {offset}", buffer.index()));
        Ok(())
    }
}

#[cfg(test)]
impl GraphEncoder for Recorder {
    fn render_pass(
        &mut self,
        label: &str,
        attachment: &ColorAttachment,
        record: &mut RecordRender<'_>,
    ) -> Result<(), GraphError> {
        let mut line = match attachment.ops.load {
            wgpu::LoadOp::Clear(_) => format!("begin render {label} clear"),
            _ => format!("begin render {label} load"),
        };
        if let Some(texture) = attachment.target {
            line.push_str(&format!(" target {}", texture.index()));
        }
        if let Some(depth) = attachment.depth {
            line.push_str(&format!(" depth {}", depth.texture.index()));
        }
        self.calls.push(line);
        record(&mut *self)?;
        self.calls.push(format!("end render {label}"));
        Ok(())
    }

    fn compute_pass(
        &mut self,
        label: &str,
        record: &mut RecordCompute<'_>,
    ) -> Result<(), GraphError> {
        self.calls.push(format!("begin compute {label}"));
        record(&mut *self)?;
        self.calls.push(format!("end compute {label}"));
        Ok(())
    }
}
