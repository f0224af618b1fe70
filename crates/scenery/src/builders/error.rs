use thiserror::Error;

/// Descriptor state rejected before any native object is created.
#[derive(Error, Debug, Clone, Eq, PartialEq)]
pub enum BuildError {
    #[error("bind group layout `{label}` has no entries")]
    EmptyLayout { label: String },
    #[error("bind group `{label}` has no entries")]
    EmptyBindGroup { label: String },
    #[error("`{label}` uses binding {binding} more than once")]
    DuplicateBinding { label: String, binding: u32 },
    #[error("bind group `{label}` has no layout")]
    MissingLayout { label: String },
    #[error("pipeline `{label}` has no {stage} shader")]
    MissingShader { label: String, stage: &'static str },
    #[error("texture `{label}` has a zero extent ({width}x{height}x{depth})")]
    ZeroExtent {
        label: String,
        width: u32,
        height: u32,
        depth: u32,
    },
    #[error("vertex stride {stride} is not a multiple of 4 bytes")]
    MisalignedStride { stride: u64 },
}
