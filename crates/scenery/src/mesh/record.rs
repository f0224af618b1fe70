//! Fixed-layout records shared with shaders and the indirect-draw ABI.

use std::mem::size_of;

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec4};

/// Per-instance object data ("GOS" record).
///
/// | offset | field                       |
/// |--------|-----------------------------|
/// | 0      | `mat4x4<f32>` model, column-major |
/// | 64     | `vec4<f32>` color           |
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct GosRecord {
    pub model: [f32; 16],
    pub color: [f32; 4],
}

impl GosRecord {
    pub const STRIDE: usize = size_of::<Self>();
    pub const MODEL_OFFSET: usize = 0;
    pub const COLOR_OFFSET: usize = 64;

    /// A missing color packs as opaque white.
    pub fn new(model: Mat4, color: Option<Vec4>) -> Self {
        Self {
            model: model.to_cols_array(),
            color: color.unwrap_or(Vec4::ONE).to_array(),
        }
    }

    pub fn model(&self) -> Mat4 {
        Mat4::from_cols_array(&self.model)
    }

    pub fn color(&self) -> Vec4 {
        Vec4::from_array(self.color)
    }
}

/// `draw_indirect` arguments.
#[repr(C)]
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Pod, Zeroable)]
pub struct DrawIndirectArgs {
    pub vertex_count: u32,
    pub instance_count: u32,
    pub first_vertex: u32,
    pub first_instance: u32,
}

/// `draw_indexed_indirect` arguments.
#[repr(C)]
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Pod, Zeroable)]
pub struct DrawIndexedIndirectArgs {
    pub index_count: u32,
    pub instance_count: u32,
    pub first_index: u32,
    pub base_vertex: i32,
    pub first_instance: u32,
}

/// `dispatch_workgroups_indirect` arguments.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Eq, Pod, Zeroable)]
pub struct DispatchIndirectArgs {
    pub x: u32,
    pub y: u32,
    pub z: u32,
}

impl Default for DispatchIndirectArgs {
    fn default() -> Self {
        Self { x: 1, y: 1, z: 1 }
    }
}

/// Maps an object to its run of GOS records.
#[repr(C)]
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Pod, Zeroable)]
pub struct InstanceRange {
    pub gobj_id: u32,
    pub start: u32,
    pub count: u32,
}

const _: [(); 80] = [(); size_of::<GosRecord>()];
const _: [(); 16] = [(); size_of::<DrawIndirectArgs>()];
const _: [(); 20] = [(); size_of::<DrawIndexedIndirectArgs>()];
const _: [(); 12] = [(); size_of::<DispatchIndirectArgs>()];
const _: [(); 12] = [(); size_of::<InstanceRange>()];

#[cfg(test)]
mod tests {
    use super::*;
    use std::mem::offset_of;

    #[test]
    fn draw_args_field_offsets() {
        assert_eq!(offset_of!(DrawIndirectArgs, vertex_count), 0);
        assert_eq!(offset_of!(DrawIndirectArgs, instance_count), 4);
        assert_eq!(offset_of!(DrawIndirectArgs, first_vertex), 8);
        assert_eq!(offset_of!(DrawIndirectArgs, first_instance), 12);
    }

    #[test]
    fn indexed_args_field_offsets() {
        assert_eq!(offset_of!(DrawIndexedIndirectArgs, index_count), 0);
        assert_eq!(offset_of!(DrawIndexedIndirectArgs, instance_count), 4);
        assert_eq!(offset_of!(DrawIndexedIndirectArgs, first_index), 8);
        assert_eq!(offset_of!(DrawIndexedIndirectArgs, base_vertex), 12);
        assert_eq!(offset_of!(DrawIndexedIndirectArgs, first_instance), 16);
    }

    #[test]
    fn gos_field_offsets() {
        assert_eq!(offset_of!(GosRecord, model), GosRecord::MODEL_OFFSET);
        assert_eq!(offset_of!(GosRecord, color), GosRecord::COLOR_OFFSET);
        assert_eq!(GosRecord::STRIDE, 80);
    }

    #[test]
    fn gos_model_is_column_major() {
        let m = Mat4::from_translation(glam::Vec3::new(1.0, 2.0, 3.0));
        let r = GosRecord::new(m, None);
        assert_eq!(&r.model[12..15], &[1.0, 2.0, 3.0]);
        assert_eq!(r.color, [1.0; 4]);
        assert_eq!(r.model(), m);
    }

    #[test]
    fn dispatch_defaults_to_one_group() {
        assert_eq!(
            DispatchIndirectArgs::default(),
            DispatchIndirectArgs { x: 1, y: 1, z: 1 }
        );
    }
}
