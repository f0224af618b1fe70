use std::fmt;

use glam::{Mat4, Vec3, Vec4};

/// Which draw path a mesh has committed to.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub enum DrawMode {
    #[default]
    Unset,
    NonIndexed,
    Indexed,
}

impl fmt::Display for DrawMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DrawMode::Unset => "unset",
            DrawMode::NonIndexed => "non-indexed",
            DrawMode::Indexed => "indexed",
        })
    }
}

impl DrawMode {
    /// Whether a mesh in this mode may take an object drawn `requested`-style.
    pub fn accepts(self, requested: DrawMode) -> bool {
        self == DrawMode::Unset || self == requested
    }
}

/// Per-object parameters for [`Mesh::add`](super::Mesh::add) and
/// [`Mesh::add_indexed`](super::Mesh::add_indexed).
#[derive(Debug, Clone, PartialEq)]
pub struct GobjDesc {
    pub label: Option<String>,
    pub model: Mat4,
    pub color: Option<Vec4>,
    pub material_id: Option<u32>,
    pub center: Vec4,
    pub radius: f32,
    pub instance_count: u32,
    pub parent_id: Option<u32>,
}

impl Default for GobjDesc {
    fn default() -> Self {
        Self {
            label: None,
            model: Mat4::IDENTITY,
            color: None,
            material_id: None,
            center: Vec4::W,
            radius: 0.0,
            instance_count: 1,
            parent_id: None,
        }
    }
}

impl GobjDesc {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn model(mut self, model: Mat4) -> Self {
        self.model = model;
        self
    }

    pub fn color(mut self, color: Vec4) -> Self {
        self.color = Some(color);
        self
    }

    pub fn material(mut self, material_id: u32) -> Self {
        self.material_id = Some(material_id);
        self
    }

    pub fn bounds(mut self, center: Vec3, radius: f32) -> Self {
        self.center = center.extend(1.0);
        self.radius = radius;
        self
    }

    pub fn instances(mut self, count: u32) -> Self {
        self.instance_count = count;
        self
    }

    /// Recorded only; transforms are not inherited.
    pub fn parent(mut self, parent_id: u32) -> Self {
        self.parent_id = Some(parent_id);
        self
    }
}

/// One drawable object inside a mesh.
///
/// Locations are in elements (vertices, indices, GOS records), not bytes.
#[derive(Debug, Clone, PartialEq)]
pub struct Gobj {
    pub id: u32,
    pub label: Option<String>,
    pub parent_id: Option<u32>,
    pub vertex_location: u32,
    pub vertex_count: u32,
    pub index_location: u32,
    pub index_count: u32,
    pub instance_location: u32,
    pub instance_count: u32,
    pub model: Mat4,
    pub color: Option<Vec4>,
    pub material_id: Option<u32>,
    pub center: Vec4,
    pub radius: f32,
}
