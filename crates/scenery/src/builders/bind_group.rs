use std::collections::HashSet;

use crate::error::Result;
use crate::store::{BindGroupLayoutHandle, BufferHandle, SamplerHandle, Store, TextureHandle};

use super::error::BuildError;
use super::label_or_default;

fn check_bindings(
    label: &Option<String>,
    bindings: impl Iterator<Item = u32>,
) -> std::result::Result<(), BuildError> {
    let mut seen = HashSet::new();
    for binding in bindings {
        if !seen.insert(binding) {
            return Err(BuildError::DuplicateBinding {
                label: label_or_default(label).to_string(),
                binding,
            });
        }
    }
    Ok(())
}

/// Collects `wgpu::BindGroupLayoutEntry` values.
#[derive(Debug, Clone, Default)]
pub struct BindGroupLayoutBuilder {
    label: Option<String>,
    entries: Vec<wgpu::BindGroupLayoutEntry>,
}

impl BindGroupLayoutBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn entry(
        mut self,
        binding: u32,
        visibility: wgpu::ShaderStages,
        ty: wgpu::BindingType,
    ) -> Self {
        self.entries.push(wgpu::BindGroupLayoutEntry {
            binding,
            visibility,
            ty,
            count: None,
        });
        self
    }

    pub fn storage(self, binding: u32, visibility: wgpu::ShaderStages, read_only: bool) -> Self {
        self.entry(
            binding,
            visibility,
            wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Storage { read_only },
                has_dynamic_offset: false,
                min_binding_size: None,
            },
        )
    }

    pub fn uniform(self, binding: u32, visibility: wgpu::ShaderStages) -> Self {
        self.entry(
            binding,
            visibility,
            wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: None,
            },
        )
    }

    pub fn texture(
        self,
        binding: u32,
        visibility: wgpu::ShaderStages,
        sample_type: wgpu::TextureSampleType,
        view_dimension: wgpu::TextureViewDimension,
    ) -> Self {
        self.entry(
            binding,
            visibility,
            wgpu::BindingType::Texture {
                sample_type,
                view_dimension,
                multisampled: false,
            },
        )
    }

    pub fn sampler(
        self,
        binding: u32,
        visibility: wgpu::ShaderStages,
        ty: wgpu::SamplerBindingType,
    ) -> Self {
        self.entry(binding, visibility, wgpu::BindingType::Sampler(ty))
    }

    pub fn entries(&self) -> &[wgpu::BindGroupLayoutEntry] {
        &self.entries
    }

    /// Rejects empty layouts and repeated binding indices.
    pub fn validate(&self) -> std::result::Result<(), BuildError> {
        if self.entries.is_empty() {
            return Err(BuildError::EmptyLayout {
                label: label_or_default(&self.label).to_string(),
            });
        }
        check_bindings(&self.label, self.entries.iter().map(|e| e.binding))
    }

    pub fn build(self, device: &wgpu::Device) -> Result<wgpu::BindGroupLayout> {
        self.validate()?;
        Ok(device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: self.label.as_deref(),
            entries: &self.entries,
        }))
    }
}

#[derive(Debug, Clone, Copy)]
enum BindSource {
    Buffer(BufferHandle),
    BufferRange {
        buffer: BufferHandle,
        offset: u64,
        size: Option<wgpu::BufferSize>,
    },
    Texture(TextureHandle, Option<wgpu::TextureViewDimension>),
    Sampler(SamplerHandle),
}

enum Resolved<'s> {
    Buffer(wgpu::BufferBinding<'s>),
    View(wgpu::TextureView),
    Sampler(&'s wgpu::Sampler),
}

/// Collects bind group entries as store handles; they are resolved in `build`.
#[derive(Debug, Clone, Default)]
pub struct BindGroupBuilder {
    label: Option<String>,
    layout: Option<BindGroupLayoutHandle>,
    entries: Vec<(u32, BindSource)>,
}

impl BindGroupBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn layout(mut self, layout: BindGroupLayoutHandle) -> Self {
        self.layout = Some(layout);
        self
    }

    pub fn buffer(mut self, binding: u32, buffer: BufferHandle) -> Self {
        self.entries.push((binding, BindSource::Buffer(buffer)));
        self
    }

    pub fn buffer_range(
        mut self,
        binding: u32,
        buffer: BufferHandle,
        offset: u64,
        size: Option<wgpu::BufferSize>,
    ) -> Self {
        self.entries.push((
            binding,
            BindSource::BufferRange {
                buffer,
                offset,
                size,
            },
        ));
        self
    }

    /// Binds the default view of `texture`.
    pub fn texture(mut self, binding: u32, texture: TextureHandle) -> Self {
        self.entries.push((binding, BindSource::Texture(texture, None)));
        self
    }

    /// Binds every layer of `texture` as a 2D array view, even a single one.
    pub fn texture_array(mut self, binding: u32, texture: TextureHandle) -> Self {
        self.entries.push((
            binding,
            BindSource::Texture(texture, Some(wgpu::TextureViewDimension::D2Array)),
        ));
        self
    }

    pub fn sampler(mut self, binding: u32, sampler: SamplerHandle) -> Self {
        self.entries.push((binding, BindSource::Sampler(sampler)));
        self
    }

    pub fn validate(&self) -> std::result::Result<BindGroupLayoutHandle, BuildError> {
        let Some(layout) = self.layout else {
            return Err(BuildError::MissingLayout {
                label: label_or_default(&self.label).to_string(),
            });
        };
        if self.entries.is_empty() {
            return Err(BuildError::EmptyBindGroup {
                label: label_or_default(&self.label).to_string(),
            });
        }
        check_bindings(&self.label, self.entries.iter().map(|(b, _)| *b))?;
        Ok(layout)
    }

    pub fn build(self, device: &wgpu::Device, store: &Store) -> Result<wgpu::BindGroup> {
        let layout = store.get(self.validate()?)?;

        let mut resolved = Vec::with_capacity(self.entries.len());
        for (binding, source) in &self.entries {
            let r = match *source {
                BindSource::Buffer(h) => Resolved::Buffer(wgpu::BufferBinding {
                    buffer: store.get(h)?,
                    offset: 0,
                    size: None,
                }),
                BindSource::BufferRange {
                    buffer,
                    offset,
                    size,
                } => Resolved::Buffer(wgpu::BufferBinding {
                    buffer: store.get(buffer)?,
                    offset,
                    size,
                }),
                BindSource::Texture(h, dimension) => Resolved::View(store.get(h)?.create_view(
                    &wgpu::TextureViewDescriptor {
                        dimension,
                        ..Default::default()
                    },
                )),
                BindSource::Sampler(h) => Resolved::Sampler(store.get(h)?),
            };
            resolved.push((*binding, r));
        }

        let entries: Vec<wgpu::BindGroupEntry<'_>> = resolved
            .iter()
            .map(|(binding, r)| wgpu::BindGroupEntry {
                binding: *binding,
                resource: match r {
                    Resolved::Buffer(b) => wgpu::BindingResource::Buffer(b.clone()),
                    Resolved::View(v) => wgpu::BindingResource::TextureView(v),
                    Resolved::Sampler(s) => wgpu::BindingResource::Sampler(s),
                },
            })
            .collect();

        Ok(device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: self.label.as_deref(),
            layout,
            entries: &entries,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Handle;

    const VF: wgpu::ShaderStages = wgpu::ShaderStages::VERTEX_FRAGMENT;

    // ── layout ────────────────────────────────────────────────────────────

    #[test]
    fn empty_layout_is_rejected() {
        let err = BindGroupLayoutBuilder::new().label("empty").validate().unwrap_err();
        assert_eq!(
            err,
            BuildError::EmptyLayout {
                label: "empty".into()
            }
        );
    }

    #[test]
    fn duplicate_layout_binding_is_rejected() {
        let err = BindGroupLayoutBuilder::new()
            .label("dup")
            .storage(0, VF, true)
            .uniform(1, VF)
            .storage(0, VF, false)
            .validate()
            .unwrap_err();
        assert_eq!(
            err,
            BuildError::DuplicateBinding {
                label: "dup".into(),
                binding: 0
            }
        );
    }

    #[test]
    fn layout_keeps_entry_order() {
        let b = BindGroupLayoutBuilder::new()
            .uniform(2, VF)
            .storage(0, wgpu::ShaderStages::COMPUTE, false);
        assert!(b.validate().is_ok());
        let bindings: Vec<u32> = b.entries().iter().map(|e| e.binding).collect();
        assert_eq!(bindings, vec![2, 0]);
        assert_eq!(b.entries()[1].visibility, wgpu::ShaderStages::COMPUTE);
    }

    // ── group ─────────────────────────────────────────────────────────────

    #[test]
    fn group_without_layout_is_rejected() {
        let err = BindGroupBuilder::new()
            .buffer(0, Handle::new(0))
            .validate()
            .unwrap_err();
        assert!(matches!(err, BuildError::MissingLayout { .. }));
    }

    #[test]
    fn empty_group_is_rejected() {
        let err = BindGroupBuilder::new()
            .label("g")
            .layout(Handle::new(0))
            .validate()
            .unwrap_err();
        assert_eq!(err, BuildError::EmptyBindGroup { label: "g".into() });
    }

    #[test]
    fn duplicate_group_binding_is_rejected() {
        let err = BindGroupBuilder::new()
            .layout(Handle::new(0))
            .buffer(3, Handle::new(0))
            .sampler(3, Handle::new(0))
            .validate()
            .unwrap_err();
        assert!(matches!(err, BuildError::DuplicateBinding { binding: 3, .. }));
    }
}
