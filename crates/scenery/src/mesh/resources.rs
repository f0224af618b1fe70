use crate::access::{buffer_size, DataAccess};
use crate::error::Result;
use crate::graph::PassKind;
use crate::store::{BindGroupHandle, BindGroupLayoutHandle, BufferHandle, TextureHandle};

use super::gobj::DrawMode;
use super::layout::Mesh;
use super::MeshError;

const VERTEX_USAGE: wgpu::BufferUsages = wgpu::BufferUsages::VERTEX
    .union(wgpu::BufferUsages::STORAGE)
    .union(wgpu::BufferUsages::COPY_DST);
const INDEX_USAGE: wgpu::BufferUsages = wgpu::BufferUsages::INDEX
    .union(wgpu::BufferUsages::STORAGE)
    .union(wgpu::BufferUsages::COPY_DST);
const DATA_USAGE: wgpu::BufferUsages =
    wgpu::BufferUsages::STORAGE.union(wgpu::BufferUsages::COPY_DST);
const OUT_USAGE: wgpu::BufferUsages = DATA_USAGE.union(wgpu::BufferUsages::COPY_SRC);
const INDIRECT_USAGE: wgpu::BufferUsages = wgpu::BufferUsages::INDIRECT
    .union(wgpu::BufferUsages::STORAGE)
    .union(wgpu::BufferUsages::COPY_DST);

/// Allocation size of every buffer a mesh creates, in bytes.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct MeshBufferSizes {
    pub vertex: u64,
    pub index: Option<u64>,
    pub gos: u64,
    pub instances: u64,
    pub indirect: u64,
    pub dispatch: u64,
    pub case: Option<u64>,
    pub out: Option<u64>,
}

/// Handles created by [`Mesh::allocate`].
///
/// The render group binds the GOS buffer at 0 and the instance ranges at 1
/// (read-only, vertex|fragment), plus the GOS texture at 2 when the mesh has
/// one. The compute group binds, at consecutive indices from 0: vertex, index
/// (indexed meshes only), GOS, instance ranges, indirect args, dispatch args,
/// then the case and out buffers when present (read-write, compute).
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct MeshResources {
    pub vertex: BufferHandle,
    pub index: Option<BufferHandle>,
    pub gos: BufferHandle,
    pub instances: BufferHandle,
    pub indirect: BufferHandle,
    pub dispatch: BufferHandle,
    pub case: Option<BufferHandle>,
    /// Bytes the case buffer can hold; 0 without one.
    pub case_capacity: u64,
    pub out: Option<BufferHandle>,
    pub gos_texture: Option<TextureHandle>,
    pub render_layout: BindGroupLayoutHandle,
    pub render_group: BindGroupHandle,
    pub compute_layout: BindGroupLayoutHandle,
    pub compute_group: BindGroupHandle,
}

impl MeshResources {
    pub fn layout(&self, kind: PassKind) -> BindGroupLayoutHandle {
        match kind {
            PassKind::Render => self.render_layout,
            PassKind::Compute => self.compute_layout,
        }
    }

    pub fn group(&self, kind: PassKind) -> BindGroupHandle {
        match kind {
            PassKind::Render => self.render_group,
            PassKind::Compute => self.compute_group,
        }
    }

    /// Compute bindings in order, as `(binding, buffer)`.
    pub fn compute_bindings(&self) -> Vec<(u32, BufferHandle)> {
        [
            Some(self.vertex),
            self.index,
            Some(self.gos),
            Some(self.instances),
            Some(self.indirect),
            Some(self.dispatch),
            self.case,
            self.out,
        ]
        .into_iter()
        .flatten()
        .zip(0..)
        .map(|(buffer, binding)| (binding, buffer))
        .collect()
    }
}

impl Mesh {
    fn gos_usage(&self) -> wgpu::BufferUsages {
        if self.instance_layout().is_some() {
            DATA_USAGE | wgpu::BufferUsages::VERTEX
        } else {
            DATA_USAGE
        }
    }

    pub fn buffer_sizes(&self) -> MeshBufferSizes {
        let len = |bytes: &[u8]| bytes.len() as u64;
        MeshBufferSizes {
            vertex: buffer_size(len(self.vertex_bytes()), VERTEX_USAGE),
            index: (self.draw_mode() == DrawMode::Indexed)
                .then(|| buffer_size(len(self.index_bytes()), INDEX_USAGE)),
            gos: buffer_size(len(self.gos_bytes()), self.gos_usage()),
            instances: buffer_size(len(self.instance_bytes()), DATA_USAGE),
            indirect: buffer_size(len(self.indirect_bytes()), INDIRECT_USAGE),
            dispatch: buffer_size(len(self.dispatch_bytes()), INDIRECT_USAGE),
            case: self.case_data().map(|bytes| buffer_size(len(bytes), DATA_USAGE)),
            out: self.out_size().map(|size| buffer_size(size, OUT_USAGE)),
        }
    }

    /// Creates and fills every buffer, then the render and compute bind groups.
    ///
    /// Objects can no longer be added afterwards. Calling it again creates a
    /// fresh set; the previous buffers stay in the store.
    pub fn allocate(&mut self, access: &mut DataAccess) -> Result<&MeshResources> {
        if self.is_empty() {
            return Err(MeshError::Empty {
                label: self.label().to_string(),
            }
            .into());
        }

        let label = self.label().to_string();
        let vertex = access.register_buffer_init(&format!("{label} vertices"), self.vertex_bytes(), VERTEX_USAGE);
        let index = (self.draw_mode() == DrawMode::Indexed).then(|| {
            access.register_buffer_init(&format!("{label} indices"), self.index_bytes(), INDEX_USAGE)
        });
        let gos = access.register_buffer_init(&format!("{label} gos"), self.gos_bytes(), self.gos_usage());
        let instances = access.register_buffer_init(&format!("{label} instances"), self.instance_bytes(), DATA_USAGE);
        let indirect = access.register_buffer_init(&format!("{label} indirect"), self.indirect_bytes(), INDIRECT_USAGE);
        let dispatch = access.register_buffer_init(&format!("{label} dispatch"), self.dispatch_bytes(), INDIRECT_USAGE);
        let case = self
            .case_data()
            .map(|bytes| access.register_buffer_init(&format!("{label} case"), bytes, DATA_USAGE));
        let out = self
            .out_size()
            .map(|size| access.register_buffer(&format!("{label} out"), size, OUT_USAGE));
        let sizes = self.buffer_sizes();
        let gos_texture = self.gos_texture();

        let vf = wgpu::ShaderStages::VERTEX_FRAGMENT;
        let render_layout = access.register_bind_group_layout(|b| {
            let b = b
                .label(format!("{label} render layout"))
                .storage(0, vf, true)
                .storage(1, vf, true);
            match gos_texture {
                Some(_) => b.texture(
                    2,
                    vf,
                    wgpu::TextureSampleType::Float { filterable: true },
                    wgpu::TextureViewDimension::D2Array,
                ),
                None => b,
            }
        })?;
        let render_group = access.register_bind_group(|b| {
            let b = b
                .label(format!("{label} render group"))
                .layout(render_layout)
                .buffer(0, gos)
                .buffer(1, instances);
            match gos_texture {
                Some(texture) => b.texture_array(2, texture),
                None => b,
            }
        })?;

        let mut resources = MeshResources {
            vertex,
            index,
            gos,
            instances,
            indirect,
            dispatch,
            case,
            case_capacity: sizes.case.unwrap_or(0),
            out,
            gos_texture,
            render_layout,
            render_group,
            compute_layout: render_layout,
            compute_group: render_group,
        };

        let bindings = resources.compute_bindings();
        resources.compute_layout = access.register_bind_group_layout(|b| {
            bindings.iter().fold(b.label(format!("{label} compute layout")), |b, (binding, _)| {
                b.storage(*binding, wgpu::ShaderStages::COMPUTE, false)
            })
        })?;
        let compute_layout = resources.compute_layout;
        resources.compute_group = access.register_bind_group(|b| {
            bindings.iter().fold(
                b.label(format!("{label} compute group")).layout(compute_layout),
                |b, (binding, buffer)| b.buffer(*binding, *buffer),
            )
        })?;

        log::debug!(
            "mesh `{label}` allocated: {} objects, {} GOS records, {:?}",
            self.len(),
            self.gos_bytes().len() / super::GosRecord::STRIDE,
            sizes
        );

        self.dirty = false;
        Ok(self.resources.insert(resources))
    }

    /// Re-uploads the GOS, instance, indirect, dispatch and case buffers if
    /// anything was edited since the last upload. Whole buffers are written.
    pub fn sync(&mut self, access: &DataAccess) -> Result<()> {
        let Some(uploads) = self.pending_uploads()? else {
            return Ok(());
        };
        for (buffer, bytes) in uploads {
            access.update_buffer(buffer, bytes)?;
        }
        self.dirty = false;
        Ok(())
    }

    /// Buffer writes [`Mesh::sync`] would issue, or `None` when nothing was
    /// edited.
    pub fn pending_uploads(&self) -> std::result::Result<Option<Vec<(BufferHandle, &[u8])>>, MeshError> {
        if !self.dirty {
            return Ok(None);
        }
        let res = self.require_resources()?;
        let mut uploads = vec![
            (res.gos, self.gos_bytes()),
            (res.instances, self.instance_bytes()),
            (res.indirect, self.indirect_bytes()),
            (res.dispatch, self.dispatch_bytes()),
        ];
        if let (Some(buffer), Some(bytes)) = (res.case, self.case_data()) {
            uploads.push((buffer, bytes));
        }
        Ok(Some(uploads))
    }

    /// Allocated resources, or [`MeshError::NotAllocated`].
    pub fn require_resources(&self) -> std::result::Result<&MeshResources, MeshError> {
        self.resources().ok_or_else(|| MeshError::NotAllocated {
            label: self.label().to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builders::VertexLayout;
    use crate::mesh::GobjDesc;
    use crate::store::Handle;

    fn xyz_mesh() -> Mesh {
        Mesh::new("test", VertexLayout::new(12))
    }

    #[test]
    fn indexed_triangle_buffers_are_floored() {
        let mut mesh = xyz_mesh();
        mesh.add_indexed(&[0.0; 12], &[0, 1, 2], GobjDesc::new()).unwrap();

        let sizes = mesh.buffer_sizes();
        assert_eq!(sizes.vertex, 256);
        assert_eq!(sizes.index, Some(256));
        assert_eq!(sizes.indirect, 256);
        assert_eq!(sizes.dispatch, 256);
        assert_eq!(sizes.gos, 256);
    }

    #[test]
    fn large_buffers_keep_natural_size() {
        let mut mesh = xyz_mesh();
        mesh.add(&[0.0; 300], GobjDesc::new().instances(4)).unwrap();

        let sizes = mesh.buffer_sizes();
        assert_eq!(sizes.vertex, 1200);
        assert_eq!(sizes.index, None);
        assert_eq!(sizes.gos, 320);
    }

    #[test]
    fn compute_bindings_are_consecutive() {
        let h = Handle::new;
        let mut res = MeshResources {
            vertex: h(10),
            index: None,
            gos: h(11),
            instances: h(12),
            indirect: h(13),
            dispatch: h(14),
            case: None,
            case_capacity: 0,
            out: None,
            gos_texture: None,
            render_layout: Handle::new(0),
            render_group: Handle::new(0),
            compute_layout: Handle::new(1),
            compute_group: Handle::new(1),
        };
        let bindings: Vec<(u32, u32)> = res
            .compute_bindings()
            .into_iter()
            .map(|(b, buf)| (b, buf.index()))
            .collect();
        assert_eq!(bindings, vec![(0, 10), (1, 11), (2, 12), (3, 13), (4, 14)]);

        res.index = Some(h(20));
        let order: Vec<u32> = res.compute_bindings().iter().map(|(_, b)| b.index()).collect();
        assert_eq!(order, vec![10, 20, 11, 12, 13, 14]);
        assert_eq!(res.group(PassKind::Compute).index(), 1);

        res.case = Some(h(30));
        res.out = Some(h(31));
        let tail: Vec<(u32, u32)> = res
            .compute_bindings()
            .into_iter()
            .skip(6)
            .map(|(b, buf)| (b, buf.index()))
            .collect();
        assert_eq!(tail, vec![(6, 30), (7, 31)]);
    }

    fn fake_resources() -> MeshResources {
        let h = Handle::new;
        MeshResources {
            vertex: h(0),
            index: None,
            gos: h(1),
            instances: h(2),
            indirect: h(3),
            dispatch: h(4),
            case: None,
            case_capacity: 0,
            out: None,
            gos_texture: None,
            render_layout: Handle::new(0),
            render_group: Handle::new(0),
            compute_layout: Handle::new(1),
            compute_group: Handle::new(1),
        }
    }

    #[test]
    fn adding_to_allocated_mesh_is_rejected() {
        let mut mesh = xyz_mesh();
        mesh.add(&[0.0; 9], GobjDesc::new()).unwrap();
        mesh.resources = Some(fake_resources());

        assert_eq!(
            mesh.add(&[0.0; 9], GobjDesc::new()),
            Err(MeshError::AlreadyAllocated {
                label: "test".into()
            })
        );
        assert_eq!(mesh.len(), 1);
        assert_eq!(mesh.vertex_bytes().len(), 36);
        assert!(mesh.resources().is_some());
    }

    #[test]
    fn uploads_wait_for_an_edit() {
        let mut mesh = xyz_mesh();
        mesh.add(&[0.0; 9], GobjDesc::new().instances(2)).unwrap();
        mesh.resources = Some(fake_resources());
        assert!(matches!(mesh.pending_uploads(), Ok(None)));

        mesh.set_color(0, glam::Vec4::ZERO).unwrap();
        let uploads = mesh.pending_uploads().unwrap().unwrap();
        let targets: Vec<u32> = uploads.iter().map(|(b, _)| b.index()).collect();
        assert_eq!(targets, vec![1, 2, 3, 4]);
        assert_eq!(uploads[0].1.len(), 2 * crate::mesh::GosRecord::STRIDE);
        assert_eq!(uploads[2].1, mesh.indirect_bytes());
    }

    #[test]
    fn edited_unallocated_mesh_cannot_sync() {
        let mut mesh = xyz_mesh();
        mesh.add(&[0.0; 9], GobjDesc::new()).unwrap();
        mesh.set_dispatch(2, 1, 1);
        assert!(matches!(
            mesh.pending_uploads(),
            Err(MeshError::NotAllocated { .. })
        ));
    }

    #[test]
    fn extras_are_sized_with_the_mesh() {
        let mut mesh = xyz_mesh().with_case_data(vec![1u8; 16]).with_out_buffer(1024);
        mesh.add(&[0.0; 9], GobjDesc::new()).unwrap();

        let sizes = mesh.buffer_sizes();
        assert_eq!(sizes.case, Some(256));
        assert_eq!(sizes.out, Some(1024));
        assert_eq!(xyz_mesh().buffer_sizes().case, None);
    }

    #[test]
    fn case_data_is_uploaded_after_the_fixed_buffers() {
        let mut mesh = xyz_mesh().with_case_data(vec![0u8; 8]);
        mesh.add(&[0.0; 9], GobjDesc::new()).unwrap();
        mesh.resources = Some(MeshResources {
            case: Some(Handle::new(7)),
            case_capacity: 256,
            ..fake_resources()
        });

        mesh.set_case_data(vec![9u8; 12]).unwrap();
        let uploads = mesh.pending_uploads().unwrap().unwrap();
        assert_eq!(uploads.len(), 5);
        assert_eq!(uploads[4], (Handle::new(7), &[9u8; 12][..]));
    }

    #[test]
    fn case_data_cannot_outgrow_its_buffer() {
        let mut mesh = xyz_mesh().with_case_data(vec![0u8; 8]);
        mesh.add(&[0.0; 9], GobjDesc::new()).unwrap();
        mesh.resources = Some(MeshResources {
            case: Some(Handle::new(7)),
            case_capacity: 256,
            ..fake_resources()
        });

        assert_eq!(
            mesh.set_case_data(vec![0u8; 300]),
            Err(MeshError::CaseOverflow {
                label: "test".into(),
                len: 300,
                capacity: 256,
            })
        );
        assert_eq!(mesh.case_data().map(<[u8]>::len), Some(8));

        mesh.resources = Some(fake_resources());
        assert!(matches!(
            mesh.set_case_data(vec![0u8; 4]),
            Err(MeshError::CaseOverflow { capacity: 0, .. })
        ));
    }

    #[test]
    fn unallocated_mesh_reports_not_allocated() {
        let mut mesh = xyz_mesh();
        mesh.add(&[0.0; 9], GobjDesc::new()).unwrap();
        assert_eq!(
            mesh.require_resources(),
            Err(MeshError::NotAllocated {
                label: "test".into()
            })
        );
    }
}
