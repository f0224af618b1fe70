//! winit event loop driving one [`Scenery`](crate::Scenery) per window.

mod runtime;

pub use runtime::{Runtime, RuntimeConfig, RuntimeCtx};
