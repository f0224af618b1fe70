//! Indirect-draw scene layout.
//!
//! A [`Mesh`] packs the geometry of many objects into shared vertex/index
//! arrays and derives, per object, a GOS record run, an indirect draw record
//! and an instance range. [`Mesh::allocate`] turns the arrays into GPU
//! buffers and bind groups; [`Mesh::sync`] re-uploads after edits.

mod gobj;
mod layout;
mod record;
mod resources;

pub use gobj::{DrawMode, Gobj, GobjDesc};
pub use layout::Mesh;
pub use record::{
    DispatchIndirectArgs, DrawIndexedIndirectArgs, DrawIndirectArgs, GosRecord, InstanceRange,
};
pub use resources::{MeshBufferSizes, MeshResources};

use thiserror::Error;

use crate::builders::BuildError;

#[derive(Error, Debug, Clone, Eq, PartialEq)]
pub enum MeshError {
    #[error("mesh is {current}; cannot add a {requested} object")]
    ModeConflict {
        current: DrawMode,
        requested: DrawMode,
    },
    #[error("vertex layout has a zero stride")]
    ZeroStride,
    #[error("{floats} floats is not a whole number of {stride}-float vertices")]
    VertexStride { floats: usize, stride: usize },
    #[error(transparent)]
    Layout(#[from] BuildError),
    #[error("object {id} does not exist (mesh holds {count})")]
    UnknownGobj { id: u32, count: usize },
    #[error("object {id} reserved {reserved} instances; {requested} requested")]
    InstanceOverflow {
        id: u32,
        requested: u32,
        reserved: u32,
    },
    #[error("object {id} has {available} vertices or indices; {requested} requested")]
    DrawOverflow {
        id: u32,
        requested: u32,
        available: u32,
    },
    #[error("mesh `{label}` has no objects to allocate")]
    Empty { label: String },
    #[error("mesh `{label}` has not been allocated")]
    NotAllocated { label: String },
    #[error("mesh `{label}` case buffer holds {capacity} bytes; {len} given")]
    CaseOverflow {
        label: String,
        len: usize,
        capacity: u64,
    },
    #[error("mesh `{label}` is allocated; its buffers cannot grow")]
    AlreadyAllocated { label: String },
}
