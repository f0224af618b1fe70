//! Descriptor builders.
//!
//! Each builder collects plain data (no device access) and validates it before
//! anything reaches wgpu. `build` resolves store handles and creates the native
//! object; validation failures never touch the device.

mod bind_group;
mod color;
mod error;
mod pipeline;
mod texture;
mod vertex;

pub use bind_group::{BindGroupBuilder, BindGroupLayoutBuilder};
pub use color::{alpha_blend, color_target, premul_alpha_blend};
pub use error::BuildError;
pub use pipeline::{ComputePipelineBuilder, RenderPipelineBuilder, ShaderStage};
pub use texture::{SamplerBuilder, TextureBuilder};
pub use vertex::VertexLayout;

pub(crate) fn label_or_default(label: &Option<String>) -> &str {
    label.as_deref().unwrap_or("unnamed")
}
