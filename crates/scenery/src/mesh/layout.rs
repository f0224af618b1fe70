use std::mem::size_of;

use glam::{Mat4, Vec4};

use crate::builders::VertexLayout;
use crate::store::TextureHandle;

use super::gobj::{DrawMode, Gobj, GobjDesc};
use super::record::{
    DispatchIndirectArgs, DrawIndexedIndirectArgs, DrawIndirectArgs, GosRecord, InstanceRange,
};
use super::resources::MeshResources;
use super::MeshError;

/// Geometry and per-object data for a set of objects drawn with one pipeline.
///
/// Every `add*` call appends to the vertex (and index) arrays, one GOS record
/// per instance, one indirect record and one instance range, all derived from
/// the same [`Gobj`]. Records are kept in creation order, so record `i` of
/// each array always describes object `i`.
#[derive(Debug)]
pub struct Mesh {
    label: String,
    topology: wgpu::PrimitiveTopology,
    vertex_layout: VertexLayout,
    instance_layout: Option<VertexLayout>,
    mode: DrawMode,

    vertices: Vec<f32>,
    indices: Vec<u32>,
    gobjs: Vec<Gobj>,
    gos: Vec<GosRecord>,
    draws: Vec<DrawIndirectArgs>,
    indexed_draws: Vec<DrawIndexedIndirectArgs>,
    instances: Vec<InstanceRange>,
    instance_capacity: Vec<u32>,
    draw_capacity: Vec<u32>,
    dispatch: DispatchIndirectArgs,

    case_data: Option<Vec<u8>>,
    out_size: Option<u64>,
    gos_texture: Option<TextureHandle>,

    pub(super) resources: Option<MeshResources>,
    pub(super) dirty: bool,
}

impl Default for Mesh {
    fn default() -> Self {
        Self::new("mesh", VertexLayout::default())
    }
}

impl Mesh {
    pub fn new(label: impl Into<String>, vertex_layout: VertexLayout) -> Self {
        Self {
            label: label.into(),
            topology: wgpu::PrimitiveTopology::TriangleList,
            vertex_layout,
            instance_layout: None,
            mode: DrawMode::Unset,
            vertices: Vec::new(),
            indices: Vec::new(),
            gobjs: Vec::new(),
            gos: Vec::new(),
            draws: Vec::new(),
            indexed_draws: Vec::new(),
            instances: Vec::new(),
            instance_capacity: Vec::new(),
            draw_capacity: Vec::new(),
            dispatch: DispatchIndirectArgs::default(),
            case_data: None,
            out_size: None,
            gos_texture: None,
            resources: None,
            dirty: false,
        }
    }

    pub fn with_topology(mut self, topology: wgpu::PrimitiveTopology) -> Self {
        self.topology = topology;
        self
    }

    /// Binds the GOS buffer as a second, per-instance vertex buffer.
    ///
    /// Its shader locations must come after those of the vertex layout.
    pub fn with_instance_layout(mut self, layout: VertexLayout) -> Self {
        self.instance_layout = Some(layout);
        self
    }

    /// User data for compute shaders, bound after the dispatch args.
    pub fn with_case_data(mut self, bytes: impl Into<Vec<u8>>) -> Self {
        self.case_data = Some(bytes.into());
        self
    }

    /// Zeroed scratch buffer of `size` bytes for compute output, bound last
    /// in the compute group. It can be copied out of.
    pub fn with_out_buffer(mut self, size: u64) -> Self {
        self.out_size = Some(size);
        self
    }

    /// Binds `texture` as a 2D array at binding 2 of the render group.
    pub fn with_gos_texture(mut self, texture: TextureHandle) -> Self {
        self.gos_texture = Some(texture);
        self
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn case_data(&self) -> Option<&[u8]> {
        self.case_data.as_deref()
    }

    pub fn out_size(&self) -> Option<u64> {
        self.out_size
    }

    pub fn gos_texture(&self) -> Option<TextureHandle> {
        self.gos_texture
    }

    pub fn topology(&self) -> wgpu::PrimitiveTopology {
        self.topology
    }

    pub fn draw_mode(&self) -> DrawMode {
        self.mode
    }

    pub fn vertex_layout(&self) -> &VertexLayout {
        &self.vertex_layout
    }

    pub fn instance_layout(&self) -> Option<&VertexLayout> {
        self.instance_layout.as_ref()
    }

    /// Vertex buffer layouts in slot order.
    pub fn vertex_layouts(&self) -> Vec<VertexLayout> {
        std::iter::once(self.vertex_layout.clone())
            .chain(self.instance_layout.clone())
            .collect()
    }

    // ── adding objects ────────────────────────────────────────────────────

    /// Appends a non-indexed object. Fails with [`MeshError::AlreadyAllocated`]
    /// once the mesh has GPU buffers, since they are sized for its contents.
    pub fn add(&mut self, vertices: &[f32], desc: GobjDesc) -> Result<u32, MeshError> {
        let stride = self.check_add(DrawMode::NonIndexed, vertices)?;

        let vertex_location = (self.vertices.len() / stride) as u32;
        let vertex_count = (vertices.len() / stride) as u32;
        self.vertices.extend_from_slice(vertices);

        let gobj = self.push_gobj(desc, vertex_location, vertex_count, 0, 0);
        self.draw_capacity.push(vertex_count);
        self.draws.push(DrawIndirectArgs {
            vertex_count: gobj.vertex_count,
            instance_count: gobj.instance_count,
            first_vertex: gobj.vertex_location,
            first_instance: gobj.instance_location,
        });
        Ok(gobj.id)
    }

    /// Appends an indexed object. `indices` are relative to its own vertices.
    pub fn add_indexed(
        &mut self,
        vertices: &[f32],
        indices: &[u32],
        desc: GobjDesc,
    ) -> Result<u32, MeshError> {
        let stride = self.check_add(DrawMode::Indexed, vertices)?;

        let vertex_location = (self.vertices.len() / stride) as u32;
        let vertex_count = (vertices.len() / stride) as u32;
        let index_location = self.indices.len() as u32;
        let index_count = indices.len() as u32;
        self.vertices.extend_from_slice(vertices);
        self.indices.extend_from_slice(indices);

        let gobj = self.push_gobj(desc, vertex_location, vertex_count, index_location, index_count);
        self.draw_capacity.push(index_count);
        self.indexed_draws.push(DrawIndexedIndirectArgs {
            index_count: gobj.index_count,
            instance_count: gobj.instance_count,
            first_index: gobj.index_location,
            base_vertex: gobj.vertex_location as i32,
            first_instance: gobj.instance_location,
        });
        Ok(gobj.id)
    }

    /// Validates an add before anything is appended, then commits the mode.
    fn check_add(&mut self, requested: DrawMode, vertices: &[f32]) -> Result<usize, MeshError> {
        if self.resources.is_some() {
            return Err(MeshError::AlreadyAllocated {
                label: self.label.clone(),
            });
        }
        if !self.mode.accepts(requested) {
            return Err(MeshError::ModeConflict {
                current: self.mode,
                requested,
            });
        }
        let stride = self.vertex_layout.stride_floats()?;
        if stride == 0 {
            return Err(MeshError::ZeroStride);
        }
        if vertices.len() % stride != 0 {
            return Err(MeshError::VertexStride {
                floats: vertices.len(),
                stride,
            });
        }
        self.mode = requested;
        Ok(stride)
    }

    fn push_gobj(
        &mut self,
        desc: GobjDesc,
        vertex_location: u32,
        vertex_count: u32,
        index_location: u32,
        index_count: u32,
    ) -> Gobj {
        let id = self.gobjs.len() as u32;
        let instance_location = self.gos.len() as u32;
        let record = GosRecord::new(desc.model, desc.color);
        self.gos
            .extend(std::iter::repeat_n(record, desc.instance_count as usize));

        self.instances.push(InstanceRange {
            gobj_id: id,
            start: instance_location,
            count: desc.instance_count,
        });
        self.instance_capacity.push(desc.instance_count);

        let gobj = Gobj {
            id,
            label: desc.label,
            parent_id: desc.parent_id,
            vertex_location,
            vertex_count,
            index_location,
            index_count,
            instance_location,
            instance_count: desc.instance_count,
            model: desc.model,
            color: desc.color,
            material_id: desc.material_id,
            center: desc.center,
            radius: desc.radius,
        };
        self.gobjs.push(gobj.clone());
        gobj
    }

    // ── editing objects ───────────────────────────────────────────────────

    /// Rewrites the model matrix of every record reserved for `id`, hidden
    /// instances included, so regrowing with [`Mesh::set_instance_count`]
    /// exposes current data.
    pub fn set_model(&mut self, id: u32, model: Mat4) -> Result<(), MeshError> {
        let gobj = self.gobj_entry(id)?;
        gobj.model = model;
        let packed = model.to_cols_array();
        for record in self.reserved_records(id) {
            record.model = packed;
        }
        self.dirty = true;
        Ok(())
    }

    pub fn set_color(&mut self, id: u32, color: Vec4) -> Result<(), MeshError> {
        let gobj = self.gobj_entry(id)?;
        gobj.color = Some(color);
        for record in self.reserved_records(id) {
            record.color = color.to_array();
        }
        self.dirty = true;
        Ok(())
    }

    /// Changes the vertex count (non-indexed) or index count (indexed) drawn
    /// for `id`, up to the geometry given when it was added.
    pub fn set_draw_count(&mut self, id: u32, count: u32) -> Result<(), MeshError> {
        let available = self.capacity(&self.draw_capacity, id)?;
        if count > available {
            return Err(MeshError::DrawOverflow {
                id,
                requested: count,
                available,
            });
        }
        let mode = self.mode;
        let gobj = self.gobj_entry(id)?;
        match mode {
            DrawMode::Indexed => {
                gobj.index_count = count;
                self.indexed_draws[id as usize].index_count = count;
            }
            _ => {
                gobj.vertex_count = count;
                self.draws[id as usize].vertex_count = count;
            }
        }
        self.dirty = true;
        Ok(())
    }

    /// Shrinks or regrows the instance count of `id` within the records
    /// reserved when it was added.
    pub fn set_instance_count(&mut self, id: u32, count: u32) -> Result<(), MeshError> {
        let capacity = self.capacity(&self.instance_capacity, id)?;
        if count > capacity {
            return Err(MeshError::InstanceOverflow {
                id,
                requested: count,
                reserved: capacity,
            });
        }

        let mode = self.mode;
        let gobj = self.gobj_entry(id)?;
        gobj.instance_count = count;
        self.instances[id as usize].count = count;
        match mode {
            DrawMode::Indexed => self.indexed_draws[id as usize].instance_count = count,
            _ => self.draws[id as usize].instance_count = count,
        }
        self.dirty = true;
        Ok(())
    }

    /// Replaces the case data. Once allocated, the new bytes must fit the
    /// case buffer created by [`Mesh::allocate`].
    pub fn set_case_data(&mut self, bytes: impl Into<Vec<u8>>) -> Result<(), MeshError> {
        let bytes = bytes.into();
        if let Some(res) = &self.resources {
            let capacity = res.case_capacity;
            if bytes.len() as u64 > capacity {
                return Err(MeshError::CaseOverflow {
                    label: self.label.clone(),
                    len: bytes.len(),
                    capacity,
                });
            }
        }
        self.case_data = Some(bytes);
        self.dirty = true;
        Ok(())
    }

    /// Workgroup counts for the mesh's indirect dispatch.
    pub fn set_dispatch(&mut self, x: u32, y: u32, z: u32) {
        self.dispatch = DispatchIndirectArgs { x, y, z };
        self.dirty = true;
    }

    fn capacity(&self, reserved: &[u32], id: u32) -> Result<u32, MeshError> {
        reserved.get(id as usize).copied().ok_or(MeshError::UnknownGobj {
            id,
            count: self.gobjs.len(),
        })
    }

    fn reserved_records(&mut self, id: u32) -> &mut [GosRecord] {
        let start = self.instances[id as usize].start as usize;
        let reserved = self.instance_capacity[id as usize] as usize;
        &mut self.gos[start..start + reserved]
    }

    fn gobj_entry(&mut self, id: u32) -> Result<&mut Gobj, MeshError> {
        let count = self.gobjs.len();
        self.gobjs
            .get_mut(id as usize)
            .ok_or(MeshError::UnknownGobj { id, count })
    }

    // ── reading ───────────────────────────────────────────────────────────

    pub fn gobjs(&self) -> &[Gobj] {
        &self.gobjs
    }

    pub fn gobj(&self, id: u32) -> Option<&Gobj> {
        self.gobjs.get(id as usize)
    }

    pub fn len(&self) -> usize {
        self.gobjs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.gobjs.is_empty()
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn dispatch(&self) -> DispatchIndirectArgs {
        self.dispatch
    }

    pub fn draw_args(&self) -> &[DrawIndirectArgs] {
        &self.draws
    }

    pub fn indexed_draw_args(&self) -> &[DrawIndexedIndirectArgs] {
        &self.indexed_draws
    }

    pub fn instance_ranges(&self) -> &[InstanceRange] {
        &self.instances
    }

    /// Size of one record in [`Mesh::indirect_bytes`].
    pub fn indirect_stride(&self) -> u64 {
        match self.mode {
            DrawMode::Indexed => size_of::<DrawIndexedIndirectArgs>() as u64,
            _ => size_of::<DrawIndirectArgs>() as u64,
        }
    }

    pub fn vertex_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }

    pub fn index_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.indices)
    }

    pub fn gos_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.gos)
    }

    pub fn indirect_bytes(&self) -> &[u8] {
        match self.mode {
            DrawMode::Indexed => bytemuck::cast_slice(&self.indexed_draws),
            _ => bytemuck::cast_slice(&self.draws),
        }
    }

    pub fn instance_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.instances)
    }

    pub fn dispatch_bytes(&self) -> &[u8] {
        bytemuck::bytes_of(&self.dispatch)
    }

    /// Decodes GOS record `instance` from the packed bytes.
    pub fn gos_record(&self, instance: u32) -> Option<GosRecord> {
        let start = instance as usize * GosRecord::STRIDE;
        let bytes = self.gos_bytes().get(start..start + GosRecord::STRIDE)?;
        Some(bytemuck::pod_read_unaligned(bytes))
    }

    pub fn resources(&self) -> Option<&MeshResources> {
        self.resources.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    fn xyz_mesh() -> Mesh {
        Mesh::new(
            "test",
            VertexLayout::new(12).attribute(wgpu::VertexFormat::Float32x3, 0, 0),
        )
    }

    fn triangle() -> Vec<f32> {
        vec![0.0, 0.5, 0.0, -0.5, -0.5, 0.0, 0.5, -0.5, 0.0]
    }

    fn u32s(bytes: &[u8]) -> Vec<u32> {
        bytes
            .chunks_exact(4)
            .map(bytemuck::pod_read_unaligned)
            .collect()
    }

    // ── draw mode ─────────────────────────────────────────────────────────

    #[test]
    fn indexed_after_non_indexed_is_rejected() {
        let mut mesh = xyz_mesh();
        mesh.add(&triangle(), GobjDesc::new()).unwrap();
        mesh.add(&triangle(), GobjDesc::new()).unwrap();

        let err = mesh.add_indexed(&triangle(), &[0, 1, 2], GobjDesc::new()).unwrap_err();
        assert_eq!(
            err,
            MeshError::ModeConflict {
                current: DrawMode::NonIndexed,
                requested: DrawMode::Indexed
            }
        );
        assert_eq!(mesh.draw_mode(), DrawMode::NonIndexed);
        assert_eq!(mesh.len(), 2);
    }

    #[test]
    fn non_indexed_after_indexed_is_rejected() {
        let mut mesh = xyz_mesh();
        for _ in 0..3 {
            mesh.add_indexed(&triangle(), &[0, 1, 2], GobjDesc::new()).unwrap();
        }
        assert!(matches!(
            mesh.add(&triangle(), GobjDesc::new()),
            Err(MeshError::ModeConflict { .. })
        ));
        assert_eq!(mesh.draw_mode(), DrawMode::Indexed);
        assert_eq!(mesh.indexed_draw_args().len(), 3);
    }

    #[test]
    fn bad_stride_leaves_mesh_untouched() {
        let mut mesh = xyz_mesh();
        let err = mesh.add(&[0.0; 7], GobjDesc::new()).unwrap_err();
        assert_eq!(err, MeshError::VertexStride { floats: 7, stride: 3 });
        assert_eq!(mesh.draw_mode(), DrawMode::Unset);
        assert!(mesh.vertex_bytes().is_empty());
        assert!(mesh.gos_bytes().is_empty());
    }

    #[test]
    fn zero_stride_layout_is_rejected() {
        let mut mesh = Mesh::default();
        assert_eq!(mesh.add(&[], GobjDesc::new()), Err(MeshError::ZeroStride));
    }

    // ── record layout ─────────────────────────────────────────────────────

    #[test]
    fn two_non_indexed_objects() {
        let mut mesh = xyz_mesh();
        mesh.add(&[0.0; 9], GobjDesc::new()).unwrap();
        mesh.add(&[0.0; 12], GobjDesc::new()).unwrap();

        let words = u32s(mesh.indirect_bytes());
        assert_eq!(mesh.indirect_bytes().len(), 32);
        assert_eq!(&words[0..4], &[3, 1, 0, 0]);
        assert_eq!(&words[4..8], &[4, 1, 3, 1]);
    }

    #[test]
    fn single_indexed_triangle() {
        let mut mesh = xyz_mesh();
        let id = mesh
            .add_indexed(&[0.0; 12], &[0, 1, 2], GobjDesc::new().instances(1))
            .unwrap();

        assert_eq!(id, 0);
        assert_eq!(mesh.indirect_bytes().len(), 20);
        assert_eq!(u32s(mesh.indirect_bytes()), vec![3, 1, 0, 0, 0]);
        assert_eq!(mesh.indirect_stride(), 20);
    }

    #[test]
    fn indexed_records_follow_objects() {
        let mut mesh = xyz_mesh();
        let shapes: [(usize, &[u32]); 3] = [(3, &[0, 1, 2]), (4, &[0, 1, 2, 0, 2, 3]), (3, &[2, 1, 0])];
        for (verts, indices) in shapes {
            mesh.add_indexed(&vec![0.0; verts * 3], indices, GobjDesc::new()).unwrap();
        }

        let records = mesh.indexed_draw_args();
        assert_eq!(records.len(), mesh.len());
        for (record, gobj) in records.iter().zip(mesh.gobjs()) {
            assert_eq!(record.index_count, gobj.index_count);
            assert_eq!(record.first_index, gobj.index_location);
            assert_eq!(record.base_vertex, gobj.vertex_location as i32);
        }
        assert_eq!(records[2].first_index, 9);
        assert_eq!(records[2].base_vertex, 7);
    }

    #[test]
    fn instances_get_consecutive_gos_records() {
        let mut mesh = xyz_mesh();
        mesh.add(&triangle(), GobjDesc::new().instances(3)).unwrap();
        mesh.add(&triangle(), GobjDesc::new().instances(2)).unwrap();

        assert_eq!(mesh.gos_bytes().len(), 5 * GosRecord::STRIDE);
        assert_eq!(mesh.gobj(1).map(|g| g.instance_location), Some(3));
        assert_eq!(mesh.draw_args()[1].first_instance, 3);
        assert_eq!(mesh.draw_args()[1].instance_count, 2);
        assert_eq!(u32s(mesh.instance_bytes()), vec![0, 0, 3, 1, 3, 2]);
    }

    #[test]
    fn gos_record_round_trips() {
        let mut mesh = xyz_mesh();
        let model = Mat4::from_scale_rotation_translation(
            Vec3::new(1.5, 2.0, 0.25),
            glam::Quat::from_rotation_z(0.3),
            Vec3::new(-4.0, 8.5, 1.0),
        );
        let color = Vec4::new(0.1, 0.2, 0.3, 0.4);
        mesh.add(&triangle(), GobjDesc::new()).unwrap();
        mesh.add(&triangle(), GobjDesc::new().model(model).color(color).instances(2)).unwrap();

        for instance in 1..3 {
            let record = mesh.gos_record(instance).unwrap();
            assert_eq!(record.model(), model);
            assert_eq!(record.color(), color);
        }
        assert_eq!(mesh.gos_record(0).map(|r| r.color()), Some(Vec4::ONE));
        assert!(mesh.gos_record(3).is_none());
    }

    // ── edits ─────────────────────────────────────────────────────────────

    #[test]
    fn edits_rewrite_records_in_place() {
        let mut mesh = xyz_mesh();
        mesh.add(&triangle(), GobjDesc::new().instances(2)).unwrap();
        assert!(!mesh.is_dirty());

        let moved = Mat4::from_translation(Vec3::X);
        mesh.set_model(0, moved).unwrap();
        mesh.set_color(0, Vec4::new(1.0, 0.0, 0.0, 1.0)).unwrap();
        mesh.set_draw_count(0, 2).unwrap();

        assert!(mesh.is_dirty());
        assert_eq!(mesh.gos_record(1).map(|r| r.model()), Some(moved));
        assert_eq!(mesh.gos_record(1).map(|r| r.color[0]), Some(1.0));
        assert_eq!(mesh.draw_args()[0].vertex_count, 2);
        assert_eq!(mesh.gobj(0).map(|g| g.vertex_count), Some(2));
    }

    #[test]
    fn instance_count_cannot_outgrow_reservation() {
        let mut mesh = xyz_mesh();
        mesh.add(&triangle(), GobjDesc::new().instances(4)).unwrap();

        mesh.set_instance_count(0, 1).unwrap();
        assert_eq!(mesh.draw_args()[0].instance_count, 1);
        assert_eq!(mesh.instance_ranges()[0].count, 1);
        mesh.set_instance_count(0, 4).unwrap();

        assert_eq!(
            mesh.set_instance_count(0, 5),
            Err(MeshError::InstanceOverflow {
                id: 0,
                requested: 5,
                reserved: 4
            })
        );
    }

    #[test]
    fn regrown_instances_carry_latest_model_and_color() {
        let mut mesh = xyz_mesh();
        mesh.add(&triangle(), GobjDesc::new().instances(4)).unwrap();
        mesh.set_instance_count(0, 1).unwrap();

        let moved = Mat4::from_translation(Vec3::X);
        let red = Vec4::new(1.0, 0.0, 0.0, 1.0);
        mesh.set_model(0, moved).unwrap();
        mesh.set_color(0, red).unwrap();
        mesh.set_instance_count(0, 4).unwrap();

        for instance in 0..4 {
            let record = mesh.gos_record(instance).unwrap();
            assert_eq!(record.model(), moved, "instance {instance}");
            assert_eq!(record.color(), red, "instance {instance}");
        }
    }

    #[test]
    fn edits_stay_inside_their_object() {
        let mut mesh = xyz_mesh();
        mesh.add(&triangle(), GobjDesc::new().instances(2)).unwrap();
        mesh.add(&triangle(), GobjDesc::new().instances(2)).unwrap();
        mesh.set_instance_count(0, 1).unwrap();
        mesh.set_model(0, Mat4::from_translation(Vec3::Y)).unwrap();

        assert_eq!(mesh.gos_record(2).map(|r| r.model()), Some(Mat4::IDENTITY));
        assert_eq!(mesh.gos_record(3).map(|r| r.model()), Some(Mat4::IDENTITY));
    }

    #[test]
    fn indexed_draw_count_rewrites_its_own_record() {
        let mut mesh = xyz_mesh();
        mesh.add_indexed(&[0.0; 9], &[0, 1, 2], GobjDesc::new()).unwrap();
        mesh.add_indexed(&[0.0; 12], &[0, 1, 2, 0, 2, 3], GobjDesc::new()).unwrap();

        mesh.set_draw_count(1, 3).unwrap();

        let words = u32s(mesh.indirect_bytes());
        assert_eq!(words.len(), 10);
        assert_eq!(&words[0..5], &[3, 1, 0, 0, 0]);
        assert_eq!(&words[5..10], &[3, 1, 3, 3, 1]);
        assert_eq!(mesh.gobj(1).map(|g| g.index_count), Some(3));
        assert!(mesh.is_dirty());
    }

    #[test]
    fn draw_count_cannot_exceed_geometry() {
        let mut mesh = xyz_mesh();
        mesh.add_indexed(&[0.0; 12], &[0, 1, 2, 0, 2, 3], GobjDesc::new()).unwrap();

        mesh.set_draw_count(0, 3).unwrap();
        mesh.set_draw_count(0, 6).unwrap();
        assert_eq!(
            mesh.set_draw_count(0, 7),
            Err(MeshError::DrawOverflow {
                id: 0,
                requested: 7,
                available: 6
            })
        );
        assert_eq!(mesh.indexed_draw_args()[0].index_count, 6);

        let mut flat = xyz_mesh();
        flat.add(&triangle(), GobjDesc::new()).unwrap();
        assert!(matches!(
            flat.set_draw_count(0, 4),
            Err(MeshError::DrawOverflow { available: 3, .. })
        ));
        assert!(matches!(
            flat.set_draw_count(1, 1),
            Err(MeshError::UnknownGobj { id: 1, count: 1 })
        ));
    }

    #[test]
    fn unknown_object_is_reported() {
        let mut mesh = xyz_mesh();
        assert_eq!(
            mesh.set_color(2, Vec4::ONE),
            Err(MeshError::UnknownGobj { id: 2, count: 0 })
        );
    }

    #[test]
    fn dispatch_bytes_follow_setter() {
        let mut mesh = xyz_mesh();
        assert_eq!(u32s(mesh.dispatch_bytes()), vec![1, 1, 1]);
        mesh.set_dispatch(8, 4, 1);
        assert_eq!(u32s(mesh.dispatch_bytes()), vec![8, 4, 1]);
    }
}
