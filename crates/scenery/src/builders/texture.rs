use crate::error::Result;

use super::error::BuildError;
use super::label_or_default;

/// 2D (or layered) texture descriptor.
#[derive(Debug, Clone)]
pub struct TextureBuilder {
    label: Option<String>,
    size: wgpu::Extent3d,
    mip_level_count: u32,
    sample_count: u32,
    dimension: wgpu::TextureDimension,
    format: wgpu::TextureFormat,
    usage: wgpu::TextureUsages,
}

impl Default for TextureBuilder {
    fn default() -> Self {
        Self {
            label: None,
            size: wgpu::Extent3d {
                width: 1,
                height: 1,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8Unorm,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
        }
    }
}

impl TextureBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn size(mut self, width: u32, height: u32) -> Self {
        self.size.width = width;
        self.size.height = height;
        self
    }

    pub fn layers(mut self, depth_or_array_layers: u32) -> Self {
        self.size.depth_or_array_layers = depth_or_array_layers;
        self
    }

    pub fn mip_levels(mut self, count: u32) -> Self {
        self.mip_level_count = count;
        self
    }

    pub fn sample_count(mut self, count: u32) -> Self {
        self.sample_count = count;
        self
    }

    pub fn dimension(mut self, dimension: wgpu::TextureDimension) -> Self {
        self.dimension = dimension;
        self
    }

    pub fn format(mut self, format: wgpu::TextureFormat) -> Self {
        self.format = format;
        self
    }

    pub fn usage(mut self, usage: wgpu::TextureUsages) -> Self {
        self.usage = usage;
        self
    }

    pub fn validate(&self) -> std::result::Result<(), BuildError> {
        let s = self.size;
        if s.width == 0 || s.height == 0 || s.depth_or_array_layers == 0 {
            return Err(BuildError::ZeroExtent {
                label: label_or_default(&self.label).to_string(),
                width: s.width,
                height: s.height,
                depth: s.depth_or_array_layers,
            });
        }
        Ok(())
    }

    pub fn build(self, device: &wgpu::Device) -> Result<wgpu::Texture> {
        self.validate()?;
        Ok(device.create_texture(&wgpu::TextureDescriptor {
            label: self.label.as_deref(),
            size: self.size,
            mip_level_count: self.mip_level_count,
            sample_count: self.sample_count,
            dimension: self.dimension,
            format: self.format,
            usage: self.usage,
            view_formats: &[],
        }))
    }
}

/// Sampler descriptor; all three address axes share one mode.
#[derive(Debug, Clone)]
pub struct SamplerBuilder {
    label: Option<String>,
    address_mode: wgpu::AddressMode,
    mag_filter: wgpu::FilterMode,
    min_filter: wgpu::FilterMode,
}

impl Default for SamplerBuilder {
    fn default() -> Self {
        Self {
            label: None,
            address_mode: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
        }
    }
}

impl SamplerBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn address_mode(mut self, mode: wgpu::AddressMode) -> Self {
        self.address_mode = mode;
        self
    }

    pub fn filter(mut self, mag: wgpu::FilterMode, min: wgpu::FilterMode) -> Self {
        self.mag_filter = mag;
        self.min_filter = min;
        self
    }

    pub fn build(self, device: &wgpu::Device) -> wgpu::Sampler {
        device.create_sampler(&wgpu::SamplerDescriptor {
            label: self.label.as_deref(),
            address_mode_u: self.address_mode,
            address_mode_v: self.address_mode,
            address_mode_w: self.address_mode,
            mag_filter: self.mag_filter,
            min_filter: self.min_filter,
            ..Default::default()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_sized_texture_is_rejected() {
        let err = TextureBuilder::new()
            .label("atlas")
            .size(0, 16)
            .validate()
            .unwrap_err();
        assert_eq!(
            err,
            BuildError::ZeroExtent {
                label: "atlas".into(),
                width: 0,
                height: 16,
                depth: 1
            }
        );
    }

    #[test]
    fn default_texture_is_valid() {
        assert!(TextureBuilder::new().size(4, 4).layers(2).validate().is_ok());
    }
}
