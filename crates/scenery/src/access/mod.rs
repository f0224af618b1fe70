//! Resource registration façade.
//!
//! `DataAccess` pairs the device and queue with the [`Store`]: every native
//! object is created here (usually through a builder closure) and handed back
//! as a handle.

mod layout;

pub use layout::{buffer_size, bytes_per_pixel, bytes_per_row, write_len, TextureWrite, MIN_BINDING_SIZE};

use std::collections::HashMap;

use thiserror::Error;

use crate::builders::{
    color_target, premul_alpha_blend, BindGroupBuilder, BindGroupLayoutBuilder,
    ComputePipelineBuilder, RenderPipelineBuilder, SamplerBuilder, TextureBuilder,
};
use crate::control::{BindingSet, Camera, Signal};
use crate::error::Result;
use crate::graph::PassParam;
use crate::store::{
    BindGroupHandle, BindGroupLayoutHandle, BufferHandle, ColorTargetHandle,
    ComputePipelineHandle, PassParamHandle, RenderPipelineHandle, SamplerHandle, Store,
    TextureHandle,
};

#[derive(Error, Debug, Clone, Eq, PartialEq)]
pub enum AccessError {
    #[error("write of {len} bytes at offset {offset} overflows buffer #{index} ({size} bytes)")]
    BufferOverflow {
        index: u32,
        offset: u64,
        len: u64,
        size: u64,
    },
    #[error("no color target state named `{name}`")]
    UnknownColorTarget { name: String },
}

/// Name of the color target preset matching the surface format.
pub const SURFACE_TARGET: &str = "surface";

/// Format of depth textures made by [`DataAccess::register_depth_texture`].
pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth24Plus;

pub struct DataAccess {
    device: wgpu::Device,
    queue: wgpu::Queue,
    store: Store,
    color_targets: HashMap<String, ColorTargetHandle>,
}

impl DataAccess {
    /// Wraps the device and queue and registers the default color targets:
    /// `bgra8unorm`, `bgra8unorm-srgb`, `rgba8unorm`, `alpha-blend` and
    /// [`SURFACE_TARGET`].
    pub fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        surface_format: wgpu::TextureFormat,
    ) -> Self {
        let mut access = Self {
            device: device.clone(),
            queue: queue.clone(),
            store: Store::new(),
            color_targets: HashMap::new(),
        };

        use wgpu::TextureFormat as F;
        access.register_color_target_state("bgra8unorm", color_target(F::Bgra8Unorm, None));
        access.register_color_target_state("bgra8unorm-srgb", color_target(F::Bgra8UnormSrgb, None));
        access.register_color_target_state("rgba8unorm", color_target(F::Rgba8Unorm, None));
        access.register_color_target_state(
            "alpha-blend",
            color_target(surface_format, Some(premul_alpha_blend())),
        );
        access.register_color_target_state(SURFACE_TARGET, color_target(surface_format, None));
        access
    }

    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut Store {
        &mut self.store
    }

    // ── buffers ───────────────────────────────────────────────────────────

    /// Allocates a zeroed buffer; see [`buffer_size`] for the size actually used.
    pub fn register_buffer(
        &mut self,
        label: &str,
        size: u64,
        usage: wgpu::BufferUsages,
    ) -> BufferHandle {
        let size = buffer_size(size, usage);
        let buffer = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(label),
            size,
            usage,
            mapped_at_creation: false,
        });
        log::debug!("registered buffer `{label}` ({size} bytes, {usage:?})");
        self.store.register(buffer)
    }

    /// Allocates a buffer sized for `bytes` and uploads them.
    pub fn register_buffer_init(
        &mut self,
        label: &str,
        bytes: &[u8],
        usage: wgpu::BufferUsages,
    ) -> BufferHandle {
        let handle = self.register_buffer(label, bytes.len() as u64, usage | wgpu::BufferUsages::COPY_DST);
        let len = write_len(bytes.len());
        if len > 0 {
            if let Ok(buffer) = self.store.get(handle) {
                self.queue.write_buffer(buffer, 0, &bytes[..len]);
            }
        }
        handle
    }

    /// Writes `bytes` at offset 0.
    pub fn update_buffer(&self, handle: BufferHandle, bytes: &[u8]) -> Result<()> {
        self.update_buffer_at(handle, 0, bytes)
    }

    /// Writes `bytes` at `offset`. The length is rounded down to a multiple of 4.
    pub fn update_buffer_at(&self, handle: BufferHandle, offset: u64, bytes: &[u8]) -> Result<()> {
        let buffer = self.store.get(handle)?;
        let len = write_len(bytes.len());
        if len == 0 {
            if !bytes.is_empty() {
                log::warn!("buffer #{} update shorter than 4 bytes ignored", handle.index());
            }
            return Ok(());
        }
        check_write(handle.index(), offset, len as u64, buffer.size())?;
        self.queue.write_buffer(buffer, offset, &bytes[..len]);
        Ok(())
    }

    // ── textures / samplers ───────────────────────────────────────────────

    pub fn register_texture(
        &mut self,
        configure: impl FnOnce(TextureBuilder) -> TextureBuilder,
    ) -> Result<TextureHandle> {
        let builder = configure(TextureBuilder::new());
        if let Err(e) = builder.validate() {
            log::error!("texture rejected: {e}\n{builder:#?}");
            return Err(e.into());
        }
        let texture = builder.build(&self.device)?;
        Ok(self.store.register(texture))
    }

    /// Uploads texel data. Rows in `bytes` must be laid out with the pitch
    /// given by [`TextureWrite::copy_layout`].
    pub fn update_texture(&self, handle: TextureHandle, bytes: &[u8], write: TextureWrite) -> Result<()> {
        let texture = self.store.get(handle)?;
        let size = write.size.unwrap_or_else(|| texture.size());
        let layout = write.copy_layout(texture.format(), size);

        self.queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture,
                mip_level: write.mip_level,
                origin: write.origin,
                aspect: wgpu::TextureAspect::All,
            },
            bytes,
            layout,
            size,
        );
        Ok(())
    }

    /// Offscreen color texture a render node can draw into and later passes
    /// can sample.
    pub fn register_render_target(
        &mut self,
        label: &str,
        width: u32,
        height: u32,
        format: wgpu::TextureFormat,
    ) -> Result<TextureHandle> {
        self.register_texture(|b| {
            b.label(label).size(width, height).format(format).usage(
                wgpu::TextureUsages::RENDER_ATTACHMENT
                    | wgpu::TextureUsages::TEXTURE_BINDING
                    | wgpu::TextureUsages::COPY_SRC,
            )
        })
    }

    /// Depth texture in [`DEPTH_FORMAT`].
    pub fn register_depth_texture(&mut self, label: &str, width: u32, height: u32) -> Result<TextureHandle> {
        self.register_texture(|b| {
            b.label(label)
                .size(width, height)
                .format(DEPTH_FORMAT)
                .usage(wgpu::TextureUsages::RENDER_ATTACHMENT)
        })
    }

    /// Layered texture for per-object images, bound by meshes through
    /// [`Mesh::with_gos_texture`](crate::mesh::Mesh::with_gos_texture).
    pub fn register_gos_texture(
        &mut self,
        label: &str,
        width: u32,
        height: u32,
        layers: u32,
        format: wgpu::TextureFormat,
    ) -> Result<TextureHandle> {
        self.register_texture(|b| {
            b.label(label)
                .size(width, height)
                .layers(layers)
                .format(format)
                .usage(wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST)
        })
    }

    /// Uploads one tightly packed `width`×`height` image into `layer`.
    pub fn write_texture_layer(
        &self,
        handle: TextureHandle,
        layer: u32,
        width: u32,
        height: u32,
        bytes: &[u8],
    ) -> Result<()> {
        let format = self.store.get(handle)?.format();
        self.update_texture(handle, bytes, layer_write(format, layer, width, height))
    }

    pub fn register_sampler(
        &mut self,
        configure: impl FnOnce(SamplerBuilder) -> SamplerBuilder,
    ) -> SamplerHandle {
        let sampler = configure(SamplerBuilder::new()).build(&self.device);
        self.store.register(sampler)
    }

    // ── bind groups ───────────────────────────────────────────────────────

    pub fn register_bind_group_layout(
        &mut self,
        configure: impl FnOnce(BindGroupLayoutBuilder) -> BindGroupLayoutBuilder,
    ) -> Result<BindGroupLayoutHandle> {
        let builder = configure(BindGroupLayoutBuilder::new());
        if let Err(e) = builder.validate() {
            log::error!("bind group layout rejected: {e}\n{builder:#?}");
            return Err(e.into());
        }
        let layout = builder.build(&self.device)?;
        Ok(self.store.register(layout))
    }

    pub fn register_bind_group(
        &mut self,
        configure: impl FnOnce(BindGroupBuilder) -> BindGroupBuilder,
    ) -> Result<BindGroupHandle> {
        let builder = configure(BindGroupBuilder::new());
        let dump = format!("{builder:#?}");
        let group = builder
            .build(&self.device, &self.store)
            .inspect_err(|e| log::error!("bind group rejected: {e}\n{dump}"))?;
        Ok(self.store.register(group))
    }

    // ── pipelines ─────────────────────────────────────────────────────────

    pub fn register_render_pipeline(
        &mut self,
        configure: impl FnOnce(RenderPipelineBuilder) -> RenderPipelineBuilder,
    ) -> Result<RenderPipelineHandle> {
        let builder = configure(RenderPipelineBuilder::new());
        if let Err(e) = builder.validate() {
            log::error!("render pipeline rejected: {e}\n{builder:#?}");
            return Err(e.into());
        }
        let pipeline = builder.build(&self.device, &self.store)?;
        Ok(self.store.register(pipeline))
    }

    pub fn register_compute_pipeline(
        &mut self,
        configure: impl FnOnce(ComputePipelineBuilder) -> ComputePipelineBuilder,
    ) -> Result<ComputePipelineHandle> {
        let builder = configure(ComputePipelineBuilder::new());
        if let Err(e) = builder.validate() {
            log::error!("compute pipeline rejected: {e}\n{builder:#?}");
            return Err(e.into());
        }
        let pipeline = builder.build(&self.device, &self.store)?;
        Ok(self.store.register(pipeline))
    }

    // ── color targets / pass params ───────────────────────────────────────

    /// Registers `state` under `name`, replacing any earlier preset of that name.
    pub fn register_color_target_state(
        &mut self,
        name: &str,
        state: wgpu::ColorTargetState,
    ) -> ColorTargetHandle {
        let handle = self.store.register(state);
        self.color_targets.insert(name.to_string(), handle);
        handle
    }

    pub fn color_target_state(&self, name: &str) -> Result<ColorTargetHandle> {
        self.color_targets.get(name).copied().ok_or_else(|| {
            AccessError::UnknownColorTarget {
                name: name.to_string(),
            }
            .into()
        })
    }

    pub fn register_pass_param(&mut self, param: PassParam) -> PassParamHandle {
        self.store.register(param)
    }

    pub fn pass_param(&self, handle: PassParamHandle) -> Result<&PassParam> {
        Ok(self.store.get(handle)?)
    }

    pub fn pass_param_mut(&mut self, handle: PassParamHandle) -> Result<&mut PassParam> {
        Ok(self.store.get_mut(handle)?)
    }

    // ── signal / camera ───────────────────────────────────────────────────

    /// Creates the signal storage buffer and camera uniform buffer, each with a
    /// vertex|fragment and a compute layout/group at binding 0.
    pub fn init_signal_camera(&mut self, signal: &mut Signal, camera: &mut Camera) -> Result<()> {
        let buffer = self.register_buffer_init(
            "signal",
            signal.bytes(),
            wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_DST,
        );
        let render_layout = self.register_bind_group_layout(|b| {
            b.label("signal render layout")
                .storage(0, wgpu::ShaderStages::VERTEX_FRAGMENT, true)
        })?;
        let compute_layout = self.register_bind_group_layout(|b| {
            b.label("signal compute layout")
                .storage(0, wgpu::ShaderStages::COMPUTE, false)
        })?;
        signal.attach(self.binding_set("signal", buffer, render_layout, compute_layout)?);

        let uniform = camera.uniform();
        let buffer = self.register_buffer_init(
            "camera",
            bytemuck::bytes_of(&uniform),
            wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        );
        let render_layout = self.register_bind_group_layout(|b| {
            b.label("camera render layout")
                .uniform(0, wgpu::ShaderStages::VERTEX_FRAGMENT)
        })?;
        let compute_layout = self.register_bind_group_layout(|b| {
            b.label("camera compute layout")
                .uniform(0, wgpu::ShaderStages::COMPUTE)
        })?;
        camera.attach(self.binding_set("camera", buffer, render_layout, compute_layout)?);

        log::debug!("signal and camera bindings initialized");
        Ok(())
    }

    fn binding_set(
        &mut self,
        name: &str,
        buffer: BufferHandle,
        render_layout: BindGroupLayoutHandle,
        compute_layout: BindGroupLayoutHandle,
    ) -> Result<BindingSet> {
        let render_group = self.register_bind_group(|b| {
            b.label(format!("{name} render group"))
                .layout(render_layout)
                .buffer(0, buffer)
        })?;
        let compute_group = self.register_bind_group(|b| {
            b.label(format!("{name} compute group"))
                .layout(compute_layout)
                .buffer(0, buffer)
        })?;
        Ok(BindingSet {
            buffer,
            render_layout,
            render_group,
            compute_layout,
            compute_group,
        })
    }
}

/// Upload of one unpadded image into array layer `layer`.
fn layer_write(format: wgpu::TextureFormat, layer: u32, width: u32, height: u32) -> TextureWrite {
    TextureWrite {
        size: Some(wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        }),
        origin: wgpu::Origin3d { x: 0, y: 0, z: layer },
        bytes_per_row: Some(width * bytes_per_pixel(format)),
        rows_per_image: Some(height),
        ..TextureWrite::default()
    }
}

/// Rejects a write of `len` bytes at `offset` that does not fit in `size`.
fn check_write(index: u32, offset: u64, len: u64, size: u64) -> std::result::Result<(), AccessError> {
    match offset.checked_add(len) {
        Some(end) if end <= size => Ok(()),
        _ => Err(AccessError::BufferOverflow {
            index,
            offset,
            len,
            size,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_inside_the_buffer_pass() {
        assert_eq!(check_write(0, 0, 256, 256), Ok(()));
        assert_eq!(check_write(0, 252, 4, 256), Ok(()));
        assert_eq!(check_write(0, 256, 0, 256), Ok(()));
    }

    #[test]
    fn writes_past_the_end_overflow() {
        assert_eq!(
            check_write(3, 200, 64, 256),
            Err(AccessError::BufferOverflow {
                index: 3,
                offset: 200,
                len: 64,
                size: 256
            })
        );
    }

    #[test]
    fn layer_writes_target_one_unpadded_slice() {
        let write = layer_write(wgpu::TextureFormat::Rgba8Unorm, 3, 10, 4);
        assert_eq!(write.origin.z, 3);
        assert_eq!(write.size.map(|s| s.depth_or_array_layers), Some(1));

        let layout = write.copy_layout(wgpu::TextureFormat::Rgba8Unorm, wgpu::Extent3d {
            width: 10,
            height: 4,
            depth_or_array_layers: 1,
        });
        assert_eq!(layout.bytes_per_row, Some(40));
        assert_eq!(layout.rows_per_image, Some(4));
    }

    #[test]
    fn huge_offsets_do_not_wrap() {
        assert!(matches!(
            check_write(1, u64::MAX - 2, 8, 256),
            Err(AccessError::BufferOverflow { offset, .. }) if offset == u64::MAX - 2
        ));
    }
}
