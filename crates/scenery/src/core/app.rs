use winit::event::WindowEvent;
use winit::window::WindowId;

use crate::scenery::Scenery;

use super::ctx::FrameCtx;

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum AppControl {
    Continue,
    Exit,
}

/// Implemented by binaries driving a [`Scenery`].
pub trait App {
    /// Called once per window, after its scenery exists: register resources,
    /// add nodes, build pipelines, then `run()`.
    fn setup(&mut self, scenery: &mut Scenery<'_>) -> anyhow::Result<()>;

    fn on_window_event(&mut self, window_id: WindowId, event: &WindowEvent) -> AppControl {
        let _ = (window_id, event);
        AppControl::Continue
    }

    /// Called on every redraw. Edits made here land in this frame.
    fn on_frame(&mut self, ctx: &mut FrameCtx<'_, '_>) -> AppControl {
        ctx.render()
    }
}
