//! Composition root.
//!
//! [`Scenery`] owns the device, the resource façade, the shader controls and
//! two render graphs. `major` holds the main passes; `minor` holds overlays
//! and debug passes that render after it and can be switched off on their own.

use anyhow::Context;
use winit::dpi::PhysicalSize;
use winit::window::Window;

use crate::access::{DataAccess, SURFACE_TARGET};
use crate::control::{CameraConfig, Control};
use crate::device::{Gpu, GpuInit, SurfaceErrorAction};
use crate::error::Result;
use crate::graph::{ColorAttachment, RenderGraph};
use crate::input::{InputFrame, InputState};
use crate::logging::LoggingConfig;
use crate::time::FrameTime;
use crate::window::RuntimeConfig;

#[derive(Debug, Clone)]
pub struct SceneryConfig {
    pub window: RuntimeConfig,
    pub gpu: GpuInit,
    pub logging: LoggingConfig,
    pub camera: CameraConfig,
    /// Load color for [`Scenery::clear_attachment`].
    pub clear_color: wgpu::Color,
}

impl Default for SceneryConfig {
    fn default() -> Self {
        Self {
            window: RuntimeConfig::default(),
            gpu: GpuInit::default(),
            logging: LoggingConfig::default(),
            camera: CameraConfig::default(),
            clear_color: wgpu::Color {
                r: 0.05,
                g: 0.05,
                b: 0.08,
                a: 1.0,
            },
        }
    }
}

/// Which graphs [`Scenery::frame`] renders.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub enum RunState {
    #[default]
    Stopped,
    Major,
    All,
}

impl RunState {
    pub fn renders_major(self) -> bool {
        self != RunState::Stopped
    }

    pub fn renders_minor(self) -> bool {
        self == RunState::All
    }
}

/// Mutable views of the parts node setup needs at the same time.
pub struct SceneryParts<'a> {
    pub access: &'a mut DataAccess,
    pub control: &'a Control,
    pub major: &'a mut RenderGraph,
    pub minor: &'a mut RenderGraph,
}

pub struct Scenery<'w> {
    window: &'w Window,
    gpu: Gpu<'w>,
    access: DataAccess,
    control: Control,
    major: RenderGraph,
    minor: RenderGraph,
    state: RunState,
    clear_color: wgpu::Color,
}

impl<'w> Scenery<'w> {
    /// Acquires the device for `window` and registers the signal and camera
    /// bindings. Starts stopped.
    pub async fn new(window: &'w Window, config: &SceneryConfig) -> anyhow::Result<Self> {
        let gpu = Gpu::new(window, config.gpu.clone()).await?;
        let mut access = DataAccess::new(gpu.device(), gpu.queue(), gpu.surface_format());

        let mut control = Control::new(config.camera);
        control
            .init(&mut access)
            .context("failed to register signal and camera bindings")?;
        let size = gpu.size();
        control.camera_mut().set_viewport(size.width, size.height);

        Ok(Self {
            window,
            gpu,
            access,
            control,
            major: RenderGraph::new("major"),
            minor: RenderGraph::new("minor"),
            state: RunState::Stopped,
            clear_color: config.clear_color,
        })
    }

    pub fn window(&self) -> &'w Window {
        self.window
    }

    pub fn gpu(&self) -> &Gpu<'w> {
        &self.gpu
    }

    pub fn access(&self) -> &DataAccess {
        &self.access
    }

    pub fn access_mut(&mut self) -> &mut DataAccess {
        &mut self.access
    }

    pub fn control(&self) -> &Control {
        &self.control
    }

    pub fn control_mut(&mut self) -> &mut Control {
        &mut self.control
    }

    pub fn major(&self) -> &RenderGraph {
        &self.major
    }

    pub fn major_mut(&mut self) -> &mut RenderGraph {
        &mut self.major
    }

    pub fn minor(&self) -> &RenderGraph {
        &self.minor
    }

    pub fn minor_mut(&mut self) -> &mut RenderGraph {
        &mut self.minor
    }

    pub fn parts(&mut self) -> SceneryParts<'_> {
        SceneryParts {
            access: &mut self.access,
            control: &self.control,
            major: &mut self.major,
            minor: &mut self.minor,
        }
    }

    /// Clears to the configured color, surface format and blending.
    pub fn clear_attachment(&self) -> Result<ColorAttachment> {
        let target = self.access.color_target_state(SURFACE_TARGET)?;
        Ok(ColorAttachment::clear(self.clear_color, target))
    }

    /// Draws over earlier passes, surface format and blending.
    pub fn load_attachment(&self) -> Result<ColorAttachment> {
        let target = self.access.color_target_state(SURFACE_TARGET)?;
        Ok(ColorAttachment::load(target))
    }

    /// Renders both graphs.
    pub fn run(&mut self) {
        self.set_state(RunState::All);
    }

    /// Renders only the major graph.
    pub fn run_major(&mut self) {
        self.set_state(RunState::Major);
    }

    pub fn stop(&mut self) {
        self.set_state(RunState::Stopped);
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state.renders_major()
    }

    fn set_state(&mut self, state: RunState) {
        if self.state != state {
            log::debug!("scenery: {:?} -> {state:?}", self.state);
            self.state = state;
        }
    }

    /// Reconfigures the surface and the camera aspect.
    pub fn resize(&mut self, size: PhysicalSize<u32>) {
        self.gpu.resize(size);
        if !self.gpu.is_minimized() {
            self.control
                .camera_mut()
                .set_viewport(size.width, size.height);
        }
    }

    /// Uploads input and camera, re-uploads edited meshes, renders `major`
    /// then `minor` into the next swapchain image and presents it.
    ///
    /// Does nothing while stopped or minimized. A surface error skips the
    /// frame and is returned for the caller to act on.
    pub fn frame(
        &mut self,
        input: &InputState,
        input_frame: &InputFrame,
        time: FrameTime,
    ) -> Result<Option<SurfaceErrorAction>> {
        if !self.state.renders_major() || self.gpu.is_minimized() {
            return Ok(None);
        }

        self.control.update(&self.access, input, input_frame, time)?;
        let minor = self.state.renders_minor();
        self.sync_meshes(minor)?;

        let frame = match self.gpu.acquire() {
            Ok(frame) => frame,
            Err(err) => {
                log::warn!("surface error: {err}");
                return Ok(Some(self.gpu.handle_surface_error(err)));
            }
        };

        self.major.render(&self.access, &frame.view)?;
        if minor {
            self.minor.render(&self.access, &frame.view)?;
        }

        self.window.pre_present_notify();
        self.gpu.present(frame);
        Ok(None)
    }

    fn sync_meshes(&mut self, minor: bool) -> Result<()> {
        let minor_nodes = minor.then(|| self.minor.nodes_mut()).into_iter().flatten();
        for node in self.major.nodes_mut().chain(minor_nodes) {
            let mesh = node.mesh_mut();
            if mesh.resources().is_some() {
                mesh.sync(&self.access)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_states_select_graphs() {
        assert!(!RunState::Stopped.renders_major());
        assert!(!RunState::Stopped.renders_minor());
        assert!(RunState::Major.renders_major());
        assert!(!RunState::Major.renders_minor());
        assert!(RunState::All.renders_major());
        assert!(RunState::All.renders_minor());
        assert_eq!(RunState::default(), RunState::Stopped);
    }
}
