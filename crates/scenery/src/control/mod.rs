//! Per-frame shader inputs: the input signal (bind group slot 0) and the
//! camera (slot 1).

mod camera;
mod signal;

pub use camera::{Camera, CameraConfig, CameraUniform};
pub use signal::{
    KeyInfo, MouseInfo, Signal, SignalData, TickInfo, KEY_OFFSET, MOUSE_OFFSET, TICK_OFFSET,
};

use crate::access::DataAccess;
use crate::error::Result;
use crate::graph::PassKind;
use crate::input::{InputFrame, InputState};
use crate::store::{BindGroupHandle, BindGroupLayoutHandle, BufferHandle};
use crate::time::FrameTime;

/// A buffer plus its layout/group pair for each pass kind, all at binding 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BindingSet {
    pub buffer: BufferHandle,
    pub render_layout: BindGroupLayoutHandle,
    pub render_group: BindGroupHandle,
    pub compute_layout: BindGroupLayoutHandle,
    pub compute_group: BindGroupHandle,
}

impl BindingSet {
    pub fn layout(&self, kind: PassKind) -> BindGroupLayoutHandle {
        match kind {
            PassKind::Render => self.render_layout,
            PassKind::Compute => self.compute_layout,
        }
    }

    pub fn group(&self, kind: PassKind) -> BindGroupHandle {
        match kind {
            PassKind::Render => self.render_group,
            PassKind::Compute => self.compute_group,
        }
    }
}

/// Owns the signal and camera and keeps their buffers current.
#[derive(Debug, Default)]
pub struct Control {
    signal: Signal,
    camera: Camera,
}

impl Control {
    pub fn new(camera: CameraConfig) -> Self {
        Self {
            signal: Signal::new(),
            camera: Camera::new(camera),
        }
    }

    /// Registers the signal and camera buffers and bind groups.
    pub fn init(&mut self, access: &mut DataAccess) -> Result<()> {
        access.init_signal_camera(&mut self.signal, &mut self.camera)
    }

    pub fn signal(&self) -> &Signal {
        &self.signal
    }

    pub fn signal_mut(&mut self) -> &mut Signal {
        &mut self.signal
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn camera_mut(&mut self) -> &mut Camera {
        &mut self.camera
    }

    /// Both binding sets, once [`Control::init`] has run.
    pub fn bindings(&self) -> Option<(&BindingSet, &BindingSet)> {
        Some((self.signal.bindings()?, self.camera.bindings()?))
    }

    /// Captures input and uploads both buffers.
    ///
    /// Writes go straight to the queue; a frame still in flight on the GPU may
    /// observe the new contents.
    pub fn update(
        &mut self,
        access: &DataAccess,
        input: &InputState,
        frame: &InputFrame,
        time: FrameTime,
    ) -> Result<()> {
        self.signal.capture(input, frame, time);

        if let Some(b) = self.signal.bindings() {
            access.update_buffer(b.buffer, self.signal.bytes())?;
        }
        if let Some(b) = self.camera.bindings() {
            let uniform = self.camera.uniform();
            access.update_buffer(b.buffer, bytemuck::bytes_of(&uniform))?;
        }
        Ok(())
    }
}
