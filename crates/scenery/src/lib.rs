//! Scenery: a handle-based GPU resource registry, an indirect-draw scene
//! layout and recorded pass replay on top of wgpu.
//!
//! Resources live in a [`store::Store`] and are addressed by typed handles.
//! [`access::DataAccess`] creates them from builders. A [`mesh::Mesh`] packs
//! objects into vertex, GOS, indirect and dispatch buffers; a
//! [`graph::RenderGraph`] replays recorded commands over them once per frame.

pub mod access;
pub mod builders;
pub mod control;
pub mod core;
pub mod device;
pub mod error;
pub mod graph;
pub mod input;
pub mod logging;
pub mod mesh;
pub mod scenery;
pub mod store;
pub mod time;
pub mod window;

pub use error::{Error, Result};
pub use scenery::{RunState, Scenery, SceneryConfig};
