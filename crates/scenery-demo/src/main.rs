use glam::{Mat4, Vec3, Vec4};
use scenery::builders::VertexLayout;
use scenery::core::{App, AppControl, FrameCtx};
use scenery::graph::{RenderCommand, MESH_SLOT};
use scenery::input::{KeyCode, MouseButton};
use scenery::mesh::{GobjDesc, Mesh};
use scenery::window::Runtime;
use scenery::{RunState, Scenery, SceneryConfig};

const COMMON_WGSL: &str = include_str!("../shaders/common.wgsl");
const SCENE_WGSL: &str = include_str!("../shaders/scene.wgsl");
const PULSE_WGSL: &str = include_str!("../shaders/pulse.wgsl");

fn position_layout() -> VertexLayout {
    VertexLayout::new(12).attribute(wgpu::VertexFormat::Float32x3, 0, 0)
}

fn triangles() -> anyhow::Result<Mesh> {
    let tri = [0.0, 0.6, 0.0, -0.5, -0.4, 0.0, 0.5, -0.4, 0.0];
    let mut mesh = Mesh::new("triangles", position_layout());
    for (i, color) in [Vec4::new(1.0, 0.3, 0.3, 1.0), Vec4::new(0.3, 1.0, 0.3, 1.0), Vec4::new(0.3, 0.3, 1.0, 1.0)]
        .into_iter()
        .enumerate()
    {
        let x = (i as f32 - 1.0) * 1.5;
        mesh.add(
            &tri,
            GobjDesc::new()
                .model(Mat4::from_translation(Vec3::new(x, 0.5, 0.0)))
                .color(color),
        )?;
    }
    Ok(mesh)
}

fn quad(label: &str, at: Vec3) -> anyhow::Result<Mesh> {
    let vertices = [
        -0.4, -0.4, 0.0, 0.4, -0.4, 0.0, 0.4, 0.4, 0.0, -0.4, 0.4, 0.0,
    ];
    let mut mesh = Mesh::new(label, position_layout());
    mesh.add_indexed(
        &vertices,
        &[0, 1, 2, 0, 2, 3],
        GobjDesc::new().model(Mat4::from_translation(at)),
    )?;
    Ok(mesh)
}

struct Demo {
    scene_wgsl: String,
    pulse_wgsl: String,
    highlighted: bool,
}

impl Demo {
    fn new() -> Self {
        Self {
            scene_wgsl: format!("{COMMON_WGSL}\n{SCENE_WGSL}"),
            pulse_wgsl: format!("{COMMON_WGSL}\n{PULSE_WGSL}"),
            highlighted: false,
        }
    }
}

impl App for Demo {
    fn setup(&mut self, scenery: &mut Scenery<'_>) -> anyhow::Result<()> {
        let clear = scenery.clear_attachment()?;
        let load = scenery.load_attachment()?;
        let parts = scenery.parts();

        let pulse = parts.major.add_compute_node(parts.access.store_mut(), "pulse")?;
        pulse.set_mesh(quad("pulse", Vec3::new(1.2, -1.0, 0.0))?);
        let pulse_res = *pulse.mesh_mut().allocate(parts.access)?;
        pulse.set_pipeline(parts.access, parts.control, &self.pulse_wgsl)?;
        pulse.load_compute_pass_param(parts.access, parts.control)?;

        let scene = parts.major.add_render_node(parts.access.store_mut(), "scene", clear)?;
        scene.set_mesh(triangles()?);
        scene.mesh_mut().allocate(parts.access)?;
        scene.set_pipeline(parts.access, parts.control, &self.scene_wgsl)?;
        scene.load_render_pass_param(parts.access, parts.control)?;

        // The overlay draws its own quad, then the quad the pulse node colors.
        let overlay = parts.minor.add_render_node(parts.access.store_mut(), "overlay", load)?;
        overlay.set_mesh(quad("overlay", Vec3::new(-1.2, -1.0, 0.0))?);
        overlay.mesh_mut().allocate(parts.access)?;
        overlay.set_pipeline(parts.access, parts.control, &self.scene_wgsl)?;
        overlay.load_render_pass_param(parts.access, parts.control)?;
        let mut commands = vec![
            RenderCommand::SetBindGroup {
                slot: MESH_SLOT,
                group: pulse_res.render_group,
                offsets: Vec::new(),
            },
            RenderCommand::SetVertexBuffer {
                slot: 0,
                buffer: pulse_res.vertex,
            },
        ];
        if let Some(index) = pulse_res.index {
            commands.push(RenderCommand::SetIndexBuffer {
                buffer: index,
                format: wgpu::IndexFormat::Uint32,
            });
        }
        commands.push(RenderCommand::DrawIndexedIndirect {
            buffer: pulse_res.indirect,
            offset: 0,
        });
        let store = parts.access.store_mut();
        for command in commands {
            overlay.push_render_command(store, command)?;
        }

        scenery.run();
        log::info!("space toggles the overlay, left click recolors, escape quits");
        Ok(())
    }

    fn on_frame(&mut self, ctx: &mut FrameCtx<'_, '_>) -> AppControl {
        if ctx.input_frame.key_pressed(KeyCode::Escape) {
            return AppControl::Exit;
        }
        if ctx.input_frame.key_pressed(KeyCode::Space) {
            if ctx.scenery.state() == RunState::All {
                ctx.scenery.run_major();
            } else {
                ctx.scenery.run();
            }
        }
        if ctx.input_frame.buttons_pressed.contains(&MouseButton::Left) {
            self.highlighted = !self.highlighted;
            let color = if self.highlighted {
                Vec4::ONE
            } else {
                Vec4::new(1.0, 0.3, 0.3, 1.0)
            };
            let recolored = match ctx.scenery.major_mut().node_mut("scene") {
                Ok(node) => node.mesh_mut().set_color(0, color).map_err(scenery::Error::from),
                Err(e) => Err(e.into()),
            };
            if let Err(e) = recolored {
                log::warn!("recolor failed: {e}");
            }
        }
        ctx.render()
    }
}

fn main() -> anyhow::Result<()> {
    let mut config = SceneryConfig::default();
    config.window.title = "scenery demo".to_string();
    // Objects after the first draw with a non-zero first instance.
    config.gpu.required_features = wgpu::Features::INDIRECT_FIRST_INSTANCE;
    Runtime::run(config, Demo::new())
}
