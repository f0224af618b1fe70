use std::collections::HashMap;

use anyhow::{Context, Result};
use ouroboros::self_referencing;
use winit::application::ApplicationHandler;
use winit::dpi::LogicalSize;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Window, WindowId};

use crate::core::{App, AppControl, FrameCtx, WindowCtx};
use crate::input::{translate_window_event, InputFrame, InputState};
use crate::logging::init_logging;
use crate::scenery::{Scenery, SceneryConfig};
use crate::time::FrameClock;

#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub title: String,
    pub initial_size: LogicalSize<f64>,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            title: "scenery".to_string(),
            initial_size: LogicalSize::new(1280.0, 720.0),
        }
    }
}

/// Requests from the app, applied after the current callback returns.
#[derive(Default)]
pub struct RuntimeCtx {
    commands: Vec<Command>,
}

impl RuntimeCtx {
    pub fn create_window(&mut self, config: RuntimeConfig) {
        self.commands.push(Command::CreateWindow(config));
    }

    pub fn close_window(&mut self, id: WindowId) {
        self.commands.push(Command::CloseWindow(id));
    }

    pub fn exit(&mut self) {
        self.commands.push(Command::Exit);
    }
}

enum Command {
    CreateWindow(RuntimeConfig),
    CloseWindow(WindowId),
    Exit,
}

pub struct Runtime;

impl Runtime {
    /// Installs the logger, opens the first window and runs until every
    /// window is closed or the app asks to exit.
    pub fn run<A>(config: SceneryConfig, app: A) -> Result<()>
    where
        A: App + 'static,
    {
        init_logging(config.logging.clone());
        let event_loop = EventLoop::new().context("failed to create winit EventLoop")?;
        let mut state = AppState {
            config,
            app,
            windows: HashMap::new(),
            exit_requested: false,
        };
        event_loop
            .run_app(&mut state)
            .context("winit event loop terminated with error")?;
        Ok(())
    }
}

#[self_referencing]
struct WindowEntry {
    input_state: InputState,
    input_frame: InputFrame,
    clock: FrameClock,

    window: Window,

    #[borrows(window)]
    #[covariant]
    scenery: Scenery<'this>,
}

struct AppState<A: App + 'static> {
    config: SceneryConfig,
    app: A,
    windows: HashMap<WindowId, WindowEntry>,
    exit_requested: bool,
}

fn build_scenery<'w, A: App>(
    window: &'w Window,
    config: &SceneryConfig,
    app: &mut A,
) -> Result<Scenery<'w>> {
    let mut scenery = pollster::block_on(Scenery::new(window, config))?;
    app.setup(&mut scenery).context("app setup failed")?;
    Ok(scenery)
}

impl<A: App + 'static> AppState<A> {
    fn create_window_entry(&mut self, event_loop: &ActiveEventLoop, window: RuntimeConfig) -> Result<WindowId> {
        let attrs = Window::default_attributes()
            .with_title(window.title)
            .with_inner_size(window.initial_size);
        let window = event_loop
            .create_window(attrs)
            .context("failed to create window")?;
        let id = window.id();

        let (config, app) = (&self.config, &mut self.app);
        let entry = WindowEntryTryBuilder {
            input_state: InputState::default(),
            input_frame: InputFrame::default(),
            clock: FrameClock::default(),
            window,
            scenery_builder: |w| build_scenery(w, config, app),
        }
        .try_build()?;

        log::info!("window {id:?} ready");
        self.windows.insert(id, entry);
        Ok(id)
    }

    fn apply_commands(&mut self, event_loop: &ActiveEventLoop, ctx: RuntimeCtx) {
        for cmd in ctx.commands {
            match cmd {
                Command::CreateWindow(cfg) => {
                    if let Err(e) = self.create_window_entry(event_loop, cfg) {
                        log::error!("failed to create window: {e:#}");
                        self.exit_requested = true;
                    }
                }
                Command::CloseWindow(id) => {
                    self.windows.remove(&id);
                }
                Command::Exit => self.exit_requested = true,
            }
        }
        if self.windows.is_empty() {
            self.exit_requested = true;
        }
    }

    fn redraw(&mut self, window_id: WindowId) -> RuntimeCtx {
        let mut runtime = RuntimeCtx::default();
        let (app, windows) = (&mut self.app, &mut self.windows);
        let Some(entry) = windows.get_mut(&window_id) else {
            return runtime;
        };

        let mut control = AppControl::Continue;
        entry.with_mut(|fields| {
            let mut ctx = FrameCtx {
                window: WindowCtx {
                    id: window_id,
                    window: fields.window,
                },
                scenery: fields.scenery,
                input: fields.input_state,
                input_frame: fields.input_frame,
                time: fields.clock.tick(),
                runtime: &mut runtime,
            };
            control = app.on_frame(&mut ctx);
            fields.input_frame.clear();
        });

        if control == AppControl::Exit {
            runtime.exit();
        }
        runtime
    }
}

impl<A: App + 'static> ApplicationHandler for AppState<A> {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if !self.windows.is_empty() {
            return;
        }
        if let Err(e) = self.create_window_entry(event_loop, self.config.window.clone()) {
            log::error!("failed to create initial window: {e:#}");
            self.exit_requested = true;
            event_loop.exit();
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        if self.exit_requested {
            event_loop.exit();
            return;
        }
        event_loop.set_control_flow(ControlFlow::Wait);
        for entry in self.windows.values() {
            entry.borrow_window().request_redraw();
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, window_id: WindowId, event: WindowEvent) {
        if self.exit_requested {
            event_loop.exit();
            return;
        }

        let (app, windows) = (&mut self.app, &mut self.windows);
        let Some(entry) = windows.get_mut(&window_id) else {
            return;
        };

        let mut control = AppControl::Continue;
        entry.with_mut(|fields| {
            if let Some(ev) = translate_window_event(fields.window, &event) {
                fields.input_state.apply_event(fields.input_frame, ev);
            }
            control = app.on_window_event(window_id, &event);
        });
        if control == AppControl::Exit {
            self.exit_requested = true;
            event_loop.exit();
            return;
        }

        match &event {
            WindowEvent::CloseRequested => {
                self.windows.remove(&window_id);
                if self.windows.is_empty() {
                    self.exit_requested = true;
                }
            }
            WindowEvent::Resized(size) => {
                let size = *size;
                entry.with_scenery_mut(|s| s.resize(size));
            }
            WindowEvent::ScaleFactorChanged { .. } => {
                let size = entry.borrow_window().inner_size();
                entry.with_scenery_mut(|s| s.resize(size));
            }
            WindowEvent::RedrawRequested => {
                let runtime = self.redraw(window_id);
                self.apply_commands(event_loop, runtime);
            }
            _ => {}
        }

        if self.exit_requested {
            event_loop.exit();
        }
    }
}
