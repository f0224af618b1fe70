/// Smallest size handed out for any buffer bound as storage or uniform.
pub const MIN_BINDING_SIZE: u64 = 256;

/// Allocation size for a buffer request of `size` bytes.
///
/// Storage and uniform buffers are floored at [`MIN_BINDING_SIZE`]; every size
/// is then rounded up to `wgpu::COPY_BUFFER_ALIGNMENT`.
pub fn buffer_size(size: u64, usage: wgpu::BufferUsages) -> u64 {
    let bound = usage.intersects(wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::UNIFORM);
    let size = if bound { size.max(MIN_BINDING_SIZE) } else { size };
    align_up(size.max(1), wgpu::COPY_BUFFER_ALIGNMENT)
}

/// Length of a buffer write, rounded down to the copy alignment.
pub fn write_len(len: usize) -> usize {
    len - len % wgpu::COPY_BUFFER_ALIGNMENT as usize
}

/// Bytes per texel for uncompressed formats; 4 when the format has no single
/// copy size (depth-stencil, multi-planar).
pub fn bytes_per_pixel(format: wgpu::TextureFormat) -> u32 {
    format.block_copy_size(None).unwrap_or(4)
}

/// Row pitch for an upload `width` texels wide, padded to
/// `wgpu::COPY_BYTES_PER_ROW_ALIGNMENT`.
pub fn bytes_per_row(format: wgpu::TextureFormat, width: u32) -> u32 {
    align_up(
        u64::from(width * bytes_per_pixel(format)),
        u64::from(wgpu::COPY_BYTES_PER_ROW_ALIGNMENT),
    ) as u32
}

/// Overrides for a texture upload. Every `None` is derived from the texture.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextureWrite {
    pub size: Option<wgpu::Extent3d>,
    pub origin: wgpu::Origin3d,
    pub mip_level: u32,
    pub offset: u64,
    pub bytes_per_row: Option<u32>,
    pub rows_per_image: Option<u32>,
}

impl TextureWrite {
    /// Buffer-side layout of the upload. Source rows must already be padded to
    /// the returned `bytes_per_row`.
    pub fn copy_layout(
        &self,
        format: wgpu::TextureFormat,
        size: wgpu::Extent3d,
    ) -> wgpu::TexelCopyBufferLayout {
        wgpu::TexelCopyBufferLayout {
            offset: self.offset,
            bytes_per_row: Some(
                self.bytes_per_row
                    .unwrap_or_else(|| bytes_per_row(format, size.width)),
            ),
            rows_per_image: Some(self.rows_per_image.unwrap_or(size.height)),
        }
    }
}

fn align_up(value: u64, align: u64) -> u64 {
    value.div_ceil(align) * align
}

#[cfg(test)]
mod tests {
    use super::*;

    const STORAGE: wgpu::BufferUsages = wgpu::BufferUsages::STORAGE;

    // ── buffer_size ───────────────────────────────────────────────────────

    #[test]
    fn small_storage_buffers_are_floored() {
        for s in [0, 1, 4, 100, 255] {
            assert_eq!(buffer_size(s, STORAGE | wgpu::BufferUsages::COPY_DST), 256);
        }
        assert_eq!(buffer_size(12, wgpu::BufferUsages::UNIFORM), 256);
    }

    #[test]
    fn large_storage_buffers_keep_their_size() {
        assert_eq!(buffer_size(256, STORAGE), 256);
        assert_eq!(buffer_size(4096, STORAGE), 4096);
        assert_eq!(buffer_size(258, STORAGE), 260);
    }

    #[test]
    fn unbound_buffers_are_only_aligned() {
        let usage = wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST;
        assert_eq!(buffer_size(12, usage), 12);
        assert_eq!(buffer_size(13, usage), 16);
        assert_eq!(buffer_size(0, usage), 4);
    }

    #[test]
    fn write_len_rounds_down() {
        assert_eq!(write_len(7), 4);
        assert_eq!(write_len(8), 8);
        assert_eq!(write_len(3), 0);
    }

    // ── texture rows ──────────────────────────────────────────────────────

    #[test]
    fn bytes_per_pixel_follows_format() {
        assert_eq!(bytes_per_pixel(wgpu::TextureFormat::R8Unorm), 1);
        assert_eq!(bytes_per_pixel(wgpu::TextureFormat::Rg8Unorm), 2);
        assert_eq!(bytes_per_pixel(wgpu::TextureFormat::Bgra8Unorm), 4);
        assert_eq!(bytes_per_pixel(wgpu::TextureFormat::Rgba16Float), 8);
        assert_eq!(bytes_per_pixel(wgpu::TextureFormat::Rgba32Float), 16);
    }

    #[test]
    fn rows_are_padded_to_256() {
        assert_eq!(bytes_per_row(wgpu::TextureFormat::Rgba8Unorm, 1), 256);
        assert_eq!(bytes_per_row(wgpu::TextureFormat::Rgba8Unorm, 64), 256);
        assert_eq!(bytes_per_row(wgpu::TextureFormat::Rgba8Unorm, 65), 512);
        assert_eq!(bytes_per_row(wgpu::TextureFormat::R8Unorm, 300), 512);
    }

    #[test]
    fn copy_layout_defaults_and_overrides() {
        let size = wgpu::Extent3d {
            width: 10,
            height: 7,
            depth_or_array_layers: 1,
        };
        let derived = TextureWrite::default().copy_layout(wgpu::TextureFormat::Rgba8Unorm, size);
        assert_eq!(derived.offset, 0);
        assert_eq!(derived.bytes_per_row, Some(256));
        assert_eq!(derived.rows_per_image, Some(7));

        let given = TextureWrite {
            offset: 16,
            bytes_per_row: Some(40),
            rows_per_image: Some(3),
            ..Default::default()
        }
        .copy_layout(wgpu::TextureFormat::Rgba8Unorm, size);
        assert_eq!(given.offset, 16);
        assert_eq!(given.bytes_per_row, Some(40));
        assert_eq!(given.rows_per_image, Some(3));
    }
}
