//! Crate-level error type.

use thiserror::Error;

use crate::access::AccessError;
use crate::builders::BuildError;
use crate::graph::GraphError;
use crate::mesh::MeshError;
use crate::store::StoreError;

/// Any failure raised while registering, laying out or replaying resources.
///
/// None of these are retried; the step that produced one should be abandoned.
#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Build(#[from] BuildError),
    #[error(transparent)]
    Access(#[from] AccessError),
    #[error(transparent)]
    Mesh(#[from] MeshError),
    #[error(transparent)]
    Graph(#[from] GraphError),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
