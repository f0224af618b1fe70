//! Native device and surface.
//!
//! [`Gpu`] creates the wgpu instance, adapter, device and queue, configures
//! the window surface and hands out one [`SurfaceFrame`] per redraw.

mod gpu;

pub use gpu::{Gpu, GpuInit, SurfaceErrorAction, SurfaceFrame};
