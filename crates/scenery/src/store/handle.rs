use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;

use crate::graph::PassParam;

/// Resource table identifier, used for diagnostics.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum ResourceKind {
    Buffer,
    Texture,
    Sampler,
    BindGroup,
    BindGroupLayout,
    RenderPipeline,
    ComputePipeline,
    ColorTargetState,
    PassParam,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ResourceKind::Buffer => "buffer",
            ResourceKind::Texture => "texture",
            ResourceKind::Sampler => "sampler",
            ResourceKind::BindGroup => "bind group",
            ResourceKind::BindGroupLayout => "bind group layout",
            ResourceKind::RenderPipeline => "render pipeline",
            ResourceKind::ComputePipeline => "compute pipeline",
            ResourceKind::ColorTargetState => "color target state",
            ResourceKind::PassParam => "pass param",
        };
        f.write_str(name)
    }
}

/// Stable index into the table holding `T`.
///
/// Handles are plain indices: copying one is free and comparing two handles
/// compares positions, not objects.
pub struct Handle<T> {
    index: u32,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Handle<T> {
    pub(crate) fn new(index: u32) -> Self {
        Self {
            index,
            _marker: PhantomData,
        }
    }

    /// Dense position of the object inside its table.
    pub fn index(self) -> u32 {
        self.index
    }
}

impl<T> Clone for Handle<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Handle<T> {}

impl<T> PartialEq for Handle<T> {
    fn eq(&self, other: &Self) -> bool {
        self.index == other.index
    }
}

impl<T> Eq for Handle<T> {}

impl<T> Hash for Handle<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.index.hash(state);
    }
}

impl<T> fmt::Debug for Handle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Handle({})", self.index)
    }
}

pub type BufferHandle = Handle<wgpu::Buffer>;
pub type TextureHandle = Handle<wgpu::Texture>;
pub type SamplerHandle = Handle<wgpu::Sampler>;
pub type BindGroupHandle = Handle<wgpu::BindGroup>;
pub type BindGroupLayoutHandle = Handle<wgpu::BindGroupLayout>;
pub type RenderPipelineHandle = Handle<wgpu::RenderPipeline>;
pub type ComputePipelineHandle = Handle<wgpu::ComputePipeline>;
pub type ColorTargetHandle = Handle<wgpu::ColorTargetState>;
pub type PassParamHandle = Handle<PassParam>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handles_compare_by_index() {
        let a: Handle<u8> = Handle::new(3);
        let b: Handle<u8> = Handle::new(3);
        let c: Handle<u8> = Handle::new(4);
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(format!("{a:?}"), "Handle(3)");
    }

    #[test]
    fn kind_display_is_readable() {
        assert_eq!(ResourceKind::BindGroupLayout.to_string(), "bind group layout");
        assert_eq!(ResourceKind::PassParam.to_string(), "pass param");
    }
}
