use crate::error::Result;
use crate::store::{BindGroupLayoutHandle, ColorTargetHandle, Store};

use super::error::BuildError;
use super::label_or_default;
use super::vertex::VertexLayout;

/// WGSL source plus the entry point to use from it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShaderStage {
    pub source: String,
    pub entry_point: String,
}

impl ShaderStage {
    pub fn new(source: impl Into<String>, entry_point: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            entry_point: entry_point.into(),
        }
    }
}

fn shader_module(device: &wgpu::Device, label: &str, source: &str) -> wgpu::ShaderModule {
    device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some(label),
        source: wgpu::ShaderSource::Wgsl(source.into()),
    })
}

fn pipeline_layout(
    device: &wgpu::Device,
    store: &Store,
    label: &str,
    handles: &[BindGroupLayoutHandle],
) -> Result<wgpu::PipelineLayout> {
    let layouts = handles
        .iter()
        .map(|h| store.get(*h))
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some(label),
        bind_group_layouts: &layouts,
        immediate_size: 0,
    }))
}

#[derive(Debug, Clone)]
enum Target {
    State(wgpu::ColorTargetState),
    Stored(ColorTargetHandle),
}

/// Render pipeline descriptor.
///
/// Bind group layouts are listed in slot order; color targets may be given
/// inline or as handles to registered presets.
#[derive(Debug, Clone)]
pub struct RenderPipelineBuilder {
    label: Option<String>,
    vertex: Option<ShaderStage>,
    fragment: Option<ShaderStage>,
    bind_group_layouts: Vec<BindGroupLayoutHandle>,
    vertex_layouts: Vec<VertexLayout>,
    targets: Vec<Target>,
    primitive: wgpu::PrimitiveState,
    depth_stencil: Option<wgpu::DepthStencilState>,
}

impl Default for RenderPipelineBuilder {
    fn default() -> Self {
        Self {
            label: None,
            vertex: None,
            fragment: None,
            bind_group_layouts: Vec::new(),
            vertex_layouts: Vec::new(),
            targets: Vec::new(),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            depth_stencil: None,
        }
    }
}

impl RenderPipelineBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn vertex(mut self, stage: ShaderStage) -> Self {
        self.vertex = Some(stage);
        self
    }

    pub fn fragment(mut self, stage: ShaderStage) -> Self {
        self.fragment = Some(stage);
        self
    }

    /// Uses one WGSL module for both stages with `vs_main` / `fs_main` entries.
    pub fn shader(self, source: &str) -> Self {
        self.vertex(ShaderStage::new(source, "vs_main"))
            .fragment(ShaderStage::new(source, "fs_main"))
    }

    pub fn bind_group_layout(mut self, layout: BindGroupLayoutHandle) -> Self {
        self.bind_group_layouts.push(layout);
        self
    }

    pub fn vertex_layout(mut self, layout: VertexLayout) -> Self {
        self.vertex_layouts.push(layout);
        self
    }

    pub fn color_target(mut self, state: wgpu::ColorTargetState) -> Self {
        self.targets.push(Target::State(state));
        self
    }

    pub fn color_target_handle(mut self, handle: ColorTargetHandle) -> Self {
        self.targets.push(Target::Stored(handle));
        self
    }

    pub fn topology(mut self, topology: wgpu::PrimitiveTopology) -> Self {
        self.primitive.topology = topology;
        self
    }

    pub fn cull_mode(mut self, cull_mode: Option<wgpu::Face>) -> Self {
        self.primitive.cull_mode = cull_mode;
        self
    }

    /// Depth test against an attachment of `format`.
    pub fn depth(mut self, format: wgpu::TextureFormat, compare: wgpu::CompareFunction, write: bool) -> Self {
        self.depth_stencil = Some(wgpu::DepthStencilState {
            format,
            depth_write_enabled: write,
            depth_compare: compare,
            stencil: wgpu::StencilState::default(),
            bias: wgpu::DepthBiasState::default(),
        });
        self
    }

    pub fn validate(&self) -> std::result::Result<(), BuildError> {
        self.stages().map(|_| ())
    }

    fn stages(&self) -> std::result::Result<(&ShaderStage, &ShaderStage), BuildError> {
        let missing = |stage| BuildError::MissingShader {
            label: label_or_default(&self.label).to_string(),
            stage,
        };
        let vs = self.vertex.as_ref().ok_or_else(|| missing("vertex"))?;
        let fs = self.fragment.as_ref().ok_or_else(|| missing("fragment"))?;
        Ok((vs, fs))
    }

    pub fn build(self, device: &wgpu::Device, store: &Store) -> Result<wgpu::RenderPipeline> {
        let (vs, fs) = self.stages()?;

        let label = label_or_default(&self.label);
        let layout = pipeline_layout(device, store, label, &self.bind_group_layouts)?;

        let vs_module = shader_module(device, label, &vs.source);
        let fs_module = (fs.source != vs.source).then(|| shader_module(device, label, &fs.source));

        let mut targets = Vec::with_capacity(self.targets.len());
        for t in &self.targets {
            let state = match t {
                Target::State(s) => s.clone(),
                Target::Stored(h) => store.get(*h)?.clone(),
            };
            targets.push(Some(state));
        }

        let buffers: Vec<wgpu::VertexBufferLayout<'_>> =
            self.vertex_layouts.iter().map(VertexLayout::as_wgpu).collect();

        Ok(device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some(label),
            layout: Some(&layout),
            vertex: wgpu::VertexState {
                module: &vs_module,
                entry_point: Some(&vs.entry_point),
                compilation_options: Default::default(),
                buffers: &buffers,
            },
            fragment: Some(wgpu::FragmentState {
                module: fs_module.as_ref().unwrap_or(&vs_module),
                entry_point: Some(&fs.entry_point),
                compilation_options: Default::default(),
                targets: &targets,
            }),
            primitive: self.primitive,
            depth_stencil: self.depth_stencil.clone(),
            multisample: wgpu::MultisampleState::default(),
            multiview_mask: None,
            cache: None,
        }))
    }
}

/// Compute pipeline descriptor.
#[derive(Debug, Clone, Default)]
pub struct ComputePipelineBuilder {
    label: Option<String>,
    compute: Option<ShaderStage>,
    bind_group_layouts: Vec<BindGroupLayoutHandle>,
}

impl ComputePipelineBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn compute(mut self, stage: ShaderStage) -> Self {
        self.compute = Some(stage);
        self
    }

    /// Uses `cs_main` from `source`.
    pub fn shader(self, source: &str) -> Self {
        self.compute(ShaderStage::new(source, "cs_main"))
    }

    pub fn bind_group_layout(mut self, layout: BindGroupLayoutHandle) -> Self {
        self.bind_group_layouts.push(layout);
        self
    }

    pub fn validate(&self) -> std::result::Result<(), BuildError> {
        self.stage().map(|_| ())
    }

    fn stage(&self) -> std::result::Result<&ShaderStage, BuildError> {
        self.compute.as_ref().ok_or_else(|| BuildError::MissingShader {
            label: label_or_default(&self.label).to_string(),
            stage: "compute",
        })
    }

    pub fn build(self, device: &wgpu::Device, store: &Store) -> Result<wgpu::ComputePipeline> {
        let cs = self.stage()?;

        let label = label_or_default(&self.label);
        let layout = pipeline_layout(device, store, label, &self.bind_group_layouts)?;
        let module = shader_module(device, label, &cs.source);

        Ok(device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
            label: Some(label),
            layout: Some(&layout),
            module: &module,
            entry_point: Some(&cs.entry_point),
            compilation_options: Default::default(),
            cache: None,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_pipeline_needs_vertex_stage() {
        let err = RenderPipelineBuilder::new()
            .label("p")
            .fragment(ShaderStage::new("", "fs_main"))
            .validate()
            .unwrap_err();
        assert_eq!(
            err,
            BuildError::MissingShader {
                label: "p".into(),
                stage: "vertex"
            }
        );
    }

    #[test]
    fn render_pipeline_needs_fragment_stage() {
        let err = RenderPipelineBuilder::new()
            .vertex(ShaderStage::new("", "vs_main"))
            .validate()
            .unwrap_err();
        assert!(matches!(
            err,
            BuildError::MissingShader {
                stage: "fragment",
                ..
            }
        ));
    }

    #[test]
    fn shader_shorthand_fills_both_stages() {
        let b = RenderPipelineBuilder::new().shader("@vertex fn vs_main() {}");
        assert!(b.validate().is_ok());
        assert_eq!(b.vertex.as_ref().map(|s| s.entry_point.as_str()), Some("vs_main"));
        assert_eq!(b.fragment.as_ref().map(|s| s.entry_point.as_str()), Some("fs_main"));
    }

    #[test]
    fn compute_pipeline_needs_compute_stage() {
        assert!(matches!(
            ComputePipelineBuilder::new().validate(),
            Err(BuildError::MissingShader {
                stage: "compute",
                ..
            })
        ));
        assert!(ComputePipelineBuilder::new().shader("").validate().is_ok());
    }
}
