use winit::window::{Window, WindowId};

use crate::device::SurfaceErrorAction;
use crate::input::{InputFrame, InputState};
use crate::scenery::Scenery;
use crate::time::FrameTime;
use crate::window::RuntimeCtx;

use super::app::AppControl;

pub struct WindowCtx<'a> {
    pub id: WindowId,
    pub window: &'a Window,
}

impl WindowCtx<'_> {
    /// Logical size as `(width, height)`.
    pub fn logical_size(&self) -> (f32, f32) {
        let size: winit::dpi::LogicalSize<f64> =
            self.window.inner_size().to_logical(self.window.scale_factor());
        (size.width as f32, size.height as f32)
    }
}

/// Per-redraw context for [`App::on_frame`](super::App::on_frame).
///
/// `'a` is the callback; `'w` is the window borrow held by the scenery.
pub struct FrameCtx<'a, 'w> {
    pub window: WindowCtx<'a>,
    pub scenery: &'a mut Scenery<'w>,
    pub input: &'a InputState,
    pub input_frame: &'a InputFrame,
    pub time: FrameTime,
    pub runtime: &'a mut RuntimeCtx,
}

impl FrameCtx<'_, '_> {
    /// Runs [`Scenery::frame`]. Out-of-memory and replay errors end the loop.
    pub fn render(&mut self) -> AppControl {
        match self.scenery.frame(self.input, self.input_frame, self.time) {
            Ok(Some(SurfaceErrorAction::Fatal)) => {
                log::error!("surface out of memory");
                AppControl::Exit
            }
            Ok(_) => AppControl::Continue,
            Err(e) => {
                log::error!("frame failed: {e}");
                AppControl::Exit
            }
        }
    }
}
