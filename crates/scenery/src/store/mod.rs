//! Resource store.
//!
//! A flat, append-only registry of GPU objects, one table per resource kind.
//! Objects are addressed by typed [`Handle`]s that stay valid for the lifetime
//! of the store: there is no removal and indices are never reused.
//!
//! Forward references are expressed with [`Store::declare`] followed by
//! [`Store::materialize`]. Reading a declared but unfilled slot is an error,
//! never an empty value.

mod handle;
mod registry;
mod table;

pub use handle::{
    BindGroupHandle, BindGroupLayoutHandle, BufferHandle, ColorTargetHandle,
    ComputePipelineHandle, Handle, PassParamHandle, RenderPipelineHandle, ResourceKind,
    SamplerHandle, TextureHandle,
};
pub use registry::{Store, Stored};
pub use table::{StoreError, Table};
