use super::error::BuildError;

/// Owned vertex buffer layout.
///
/// `wgpu::VertexBufferLayout` borrows its attribute slice; this type owns the
/// attributes so a mesh can keep its layout for the pipeline build.
#[derive(Debug, Clone, PartialEq)]
pub struct VertexLayout {
    array_stride: u64,
    step_mode: wgpu::VertexStepMode,
    attributes: Vec<wgpu::VertexAttribute>,
}

impl Default for VertexLayout {
    fn default() -> Self {
        Self::new(0)
    }
}

impl VertexLayout {
    /// Per-vertex layout with `array_stride` bytes per element.
    pub fn new(array_stride: u64) -> Self {
        Self {
            array_stride,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: Vec::new(),
        }
    }

    /// Per-instance layout with `array_stride` bytes per element.
    pub fn instance(array_stride: u64) -> Self {
        Self {
            step_mode: wgpu::VertexStepMode::Instance,
            ..Self::new(array_stride)
        }
    }

    /// Adds an attribute. Shader locations are not checked for collisions.
    pub fn attribute(mut self, format: wgpu::VertexFormat, offset: u64, shader_location: u32) -> Self {
        self.attributes.push(wgpu::VertexAttribute {
            format,
            offset,
            shader_location,
        });
        self
    }

    pub fn array_stride(&self) -> u64 {
        self.array_stride
    }

    pub fn step_mode(&self) -> wgpu::VertexStepMode {
        self.step_mode
    }

    pub fn attributes(&self) -> &[wgpu::VertexAttribute] {
        &self.attributes
    }

    /// Stride in 32-bit floats.
    pub fn stride_floats(&self) -> Result<usize, BuildError> {
        if self.array_stride % 4 != 0 {
            return Err(BuildError::MisalignedStride {
                stride: self.array_stride,
            });
        }
        Ok((self.array_stride / 4) as usize)
    }

    pub fn as_wgpu(&self) -> wgpu::VertexBufferLayout<'_> {
        wgpu::VertexBufferLayout {
            array_stride: self.array_stride,
            step_mode: self.step_mode,
            attributes: &self.attributes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stride_in_floats() {
        let layout = VertexLayout::new(24)
            .attribute(wgpu::VertexFormat::Float32x3, 0, 0)
            .attribute(wgpu::VertexFormat::Float32x3, 12, 1);
        assert_eq!(layout.stride_floats(), Ok(6));
        assert_eq!(layout.as_wgpu().attributes.len(), 2);
        assert_eq!(layout.step_mode(), wgpu::VertexStepMode::Vertex);
    }

    #[test]
    fn misaligned_stride_is_rejected() {
        assert_eq!(
            VertexLayout::new(10).stride_floats(),
            Err(BuildError::MisalignedStride { stride: 10 })
        );
    }

    #[test]
    fn instance_layout_steps_per_instance() {
        let layout = VertexLayout::instance(80);
        assert_eq!(layout.step_mode(), wgpu::VertexStepMode::Instance);
        assert_eq!(layout.array_stride(), 80);
    }
}
