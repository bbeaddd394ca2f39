use std::path::PathBuf;

use anyhow::{Context, Result};
use cgmath::prelude::*;
use cgmath::{Vector2, vec2, vec4};
use clap::Parser;
use eframe::egui_wgpu::wgpu;
use eframe::wgpu::include_wgsl;
use eframe::{egui, wgpu::util::DeviceExt};
use encase::{ShaderSize, ShaderType, UniformBuffer};
use log::{error, info};
use particle_wells::{FieldConfig, FieldDriver, GpuParticles, GravityWell, ParticleField, encode_particles};
use particle_wells::config::MAX_DRAG;

const ROTATION_SPEED: f32 = 90.0;
const MOVEMENT_SPEED: f32 = 2.0;

const ORBIT_RADIUS: f32 = 0.8;
const ORBIT_SPEED: f32 = 0.8;

#[rustfmt::skip]
const OPENGL_TO_WGPU_MATRIX: cgmath::Matrix4<f32> = cgmath::Matrix4::new(
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 0.5, 0.0,
    0.0, 0.0, 0.5, 1.0,
);

#[derive(Parser, Debug)]
#[command(about = "Interactive particle field driven by gravity wells")]
struct Args {
    /// YAML field configuration
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the particle count
    #[arg(long)]
    count: Option<usize>,

    /// Override the random seed
    #[arg(long)]
    seed: Option<u64>,

    /// Simulation steps per second
    #[arg(long, default_value_t = 60.0)]
    rate: f32,
}

#[derive(ShaderType)]
struct GpuCamera {
    pub view_matrix: cgmath::Matrix4<f32>,
    pub projection_matrix: cgmath::Matrix4<f32>,
}

struct Axes {
    pub forward: cgmath::Vector3<f32>,
    pub right: cgmath::Vector3<f32>,
    pub up: cgmath::Vector3<f32>,
}

struct Camera {
    pub position: cgmath::Vector3<f32>,
    pub up: cgmath::Vector3<f32>,
    pub pitch: f32,
    pub yaw: f32,
}

impl Camera {
    fn new(position: cgmath::Vector3<f32>) -> Self {
        Self {
            position,
            up: cgmath::vec3(0.0, 1.0, 0.0),
            pitch: 0.0,
            yaw: 0.0,
        }
    }

    fn calculate_axes(&self) -> Axes {
        let yaw_rad = self.yaw.to_radians();
        let pitch_rad = self.pitch.to_radians();

        let forward = cgmath::vec3(
            pitch_rad.cos() * yaw_rad.sin(),
            pitch_rad.sin(),
            -pitch_rad.cos() * yaw_rad.cos(),
        )
        .normalize();

        let right = forward.cross(self.up).normalize();
        let up = right.cross(forward).normalize();

        Axes { forward, right, up }
    }

    fn view_matrix(&self) -> cgmath::Matrix4<f32> {
        let axes = self.calculate_axes();
        cgmath::Matrix4::look_to_rh(
            cgmath::point3(self.position.x, self.position.y, self.position.z),
            axes.forward,
            axes.up,
        )
    }

    fn projection_matrix(&self, aspect: f32) -> cgmath::Matrix4<f32> {
        OPENGL_TO_WGPU_MATRIX
            * cgmath::perspective(cgmath::Rad::from(cgmath::Deg(70.0)), aspect, 0.01, 100.0)
    }
}

/// Maps between the viewport and the z = 0 plane the particles live in.
struct Projection {
    view_projection: cgmath::Matrix4<f32>,
    rect: egui::Rect,
}

impl Projection {
    fn to_screen(&self, point: Vector2<f32>) -> Option<egui::Pos2> {
        let clip = self.view_projection * vec4(point.x, point.y, 0.0, 1.0);
        if clip.w <= 0.0 {
            return None;
        }
        let ndc = clip.truncate() / clip.w;
        Some(egui::pos2(
            self.rect.left() + (ndc.x + 1.0) * 0.5 * self.rect.width(),
            self.rect.top() + (1.0 - ndc.y) * 0.5 * self.rect.height(),
        ))
    }

    fn to_plane(&self, pos: egui::Pos2) -> Option<Vector2<f32>> {
        let inverse = self.view_projection.invert()?;
        let ndc_x = (pos.x - self.rect.left()) / self.rect.width() * 2.0 - 1.0;
        let ndc_y = 1.0 - (pos.y - self.rect.top()) / self.rect.height() * 2.0;

        let near = inverse * vec4(ndc_x, ndc_y, 0.0, 1.0);
        let far = inverse * vec4(ndc_x, ndc_y, 1.0, 1.0);
        let near = near.truncate() / near.w;
        let far = far.truncate() / far.w;

        let direction = far - near;
        if direction.z.abs() < 1e-6 {
            return None;
        }
        let t = -near.z / direction.z;
        if t < 0.0 {
            return None;
        }
        let hit = near + direction * t;
        Some(vec2(hit.x, hit.y))
    }
}

struct Renderer {
    camera_uniform_buffer: wgpu::Buffer,
    camera_bind_group: wgpu::BindGroup,
    particles_storage_buffer: wgpu::Buffer,
    particles_storage_buffer_size: usize,
    particles_bind_group_layout: wgpu::BindGroupLayout,
    particles_bind_group: wgpu::BindGroup,
    particles_render_pipeline: wgpu::RenderPipeline,
    boundary_render_pipeline: wgpu::RenderPipeline,
}

impl Renderer {
    const BOUNDARY_SEGMENTS: u32 = 64;

    fn new(render_state: &eframe::egui_wgpu::RenderState) -> Self {
        let device = &render_state.device;

        let (particles_shader, boundary_shader) = rayon::join(
            || device.create_shader_module(include_wgsl!("./particles.wgsl")),
            || device.create_shader_module(include_wgsl!("./boundary.wgsl")),
        );

        let camera_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("Camera Bind Group Layout"),
                entries: &[wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: Some(<GpuCamera as ShaderSize>::SHADER_SIZE),
                    },
                    count: None,
                }],
            });

        let particles_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("Particles Bind Group Layout"),
                entries: &[wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Storage { read_only: true },
                        has_dynamic_offset: false,
                        min_binding_size: Some(<GpuParticles<'static> as ShaderType>::min_size()),
                    },
                    count: None,
                }],
            });

        const PARTICLES_STORAGE_BUFFER_SIZE: usize =
            <GpuParticles<'static> as ShaderType>::METADATA.min_size().get() as _;

        let camera_uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Camera Uniform Buffer"),
            contents: &[0; <GpuCamera as ShaderSize>::SHADER_SIZE.get() as _],
            usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::UNIFORM,
        });

        let particles_storage_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Particles Storage Buffer"),
            contents: &[0; PARTICLES_STORAGE_BUFFER_SIZE],
            usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::STORAGE,
        });

        let camera_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Camera Bind Group"),
            layout: &camera_bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: camera_uniform_buffer.as_entire_binding(),
            }],
        });

        let particles_bind_group = Self::particles_bind_group(
            device,
            &particles_bind_group_layout,
            &particles_storage_buffer,
        );

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Field Pipeline Layout"),
            bind_group_layouts: &[&camera_bind_group_layout, &particles_bind_group_layout],
            push_constant_ranges: &[],
        });

        let pipeline = |label: &str, shader: &wgpu::ShaderModule, topology: wgpu::PrimitiveTopology| {
            device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some(label),
                layout: Some(&pipeline_layout),
                vertex: wgpu::VertexState {
                    module: shader,
                    entry_point: "vs_main",
                    buffers: &[],
                },
                fragment: Some(wgpu::FragmentState {
                    module: shader,
                    entry_point: "fs_main",
                    targets: &[Some(render_state.target_format.into())],
                }),
                primitive: wgpu::PrimitiveState {
                    topology,
                    ..Default::default()
                },
                depth_stencil: Some(wgpu::DepthStencilState {
                    format: wgpu::TextureFormat::Depth32Float,
                    depth_write_enabled: true,
                    depth_compare: wgpu::CompareFunction::Less,
                    stencil: wgpu::StencilState::default(),
                    bias: wgpu::DepthBiasState::default(),
                }),
                multisample: wgpu::MultisampleState::default(),
                multiview: None,
            })
        };

        let particles_render_pipeline = pipeline(
            "Particles Render Pipeline",
            &particles_shader,
            wgpu::PrimitiveTopology::TriangleStrip,
        );
        let boundary_render_pipeline = pipeline(
            "Boundary Render Pipeline",
            &boundary_shader,
            wgpu::PrimitiveTopology::LineList,
        );

        Self {
            camera_uniform_buffer,
            camera_bind_group,
            particles_storage_buffer,
            particles_storage_buffer_size: PARTICLES_STORAGE_BUFFER_SIZE,
            particles_bind_group_layout,
            particles_bind_group,
            particles_render_pipeline,
            boundary_render_pipeline,
        }
    }

    fn particles_bind_group(
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
        buffer: &wgpu::Buffer,
    ) -> wgpu::BindGroup {
        device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Particles Bind Group"),
            layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: buffer.as_entire_binding(),
            }],
        })
    }

    fn prepare(&mut self, camera: &[u8], particles: &[u8], device: &wgpu::Device, queue: &wgpu::Queue) {
        queue.write_buffer(&self.camera_uniform_buffer, 0, camera);

        if self.particles_storage_buffer_size >= particles.len() {
            queue.write_buffer(&self.particles_storage_buffer, 0, particles);
        } else {
            // population grew past the buffer, reallocate and rebind
            self.particles_storage_buffer =
                device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some("Particles Storage Buffer"),
                    contents: particles,
                    usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::STORAGE,
                });
            self.particles_storage_buffer_size = particles.len();
            self.particles_bind_group = Self::particles_bind_group(
                device,
                &self.particles_bind_group_layout,
                &self.particles_storage_buffer,
            );
        }
    }

    fn paint<'a>(&'a self, particle_count: u32, render_pass: &mut wgpu::RenderPass<'a>) {
        render_pass.set_bind_group(0, &self.camera_bind_group, &[]);
        render_pass.set_bind_group(1, &self.particles_bind_group, &[]);

        render_pass.set_pipeline(&self.particles_render_pipeline);
        render_pass.draw(0..4, 0..particle_count);

        render_pass.set_pipeline(&self.boundary_render_pipeline);
        render_pass.draw(0..Self::BOUNDARY_SEGMENTS * 2, 0..1);
    }
}

/// Pointer-driven well with a velocity estimated from its last position.
struct PointerWell {
    position: Option<Vector2<f32>>,
    velocity: Vector2<f32>,
}

impl PointerWell {
    fn new() -> Self {
        Self {
            position: None,
            velocity: Vector2::zero(),
        }
    }

    fn track(&mut self, position: Option<Vector2<f32>>) {
        self.velocity = match (self.position, position) {
            (Some(previous), Some(current)) => current - previous,
            _ => Vector2::zero(),
        };
        self.position = position;
    }
}

struct FieldViewer {
    driver: FieldDriver,
    camera: Camera,
    last_frame_time: std::time::Instant,

    pointer: PointerWell,
    orbit_enabled: bool,
    orbit_phase: f32,

    well_strength: f32,
    impulse_strength: f32,
    drag: f32,
    gravity_constant: f32,
    chaos: bool,
    attract: bool,
    paused: bool,
    requested_count: usize,
}

impl FieldViewer {
    fn new(cc: &eframe::CreationContext, field: ParticleField, rate: f32) -> Self {
        let render_state = cc
            .wgpu_render_state
            .as_ref()
            .expect("the viewer needs the wgpu renderer");
        let renderer = Renderer::new(render_state);
        render_state
            .renderer
            .write()
            .paint_callback_resources
            .insert(renderer);

        let drag = field.drag();
        let gravity_constant = field.gravity_constant();
        let chaos = field.chaos_mode();
        let attract = field.attract_mode();
        let requested_count = field.count();

        Self {
            driver: FieldDriver::spawn(field, rate),
            camera: Camera::new(cgmath::vec3(0.0, 0.0, 4.5)),
            last_frame_time: std::time::Instant::now(),
            pointer: PointerWell::new(),
            orbit_enabled: false,
            orbit_phase: 0.0,
            well_strength: 1.0,
            impulse_strength: 1.0,
            drag,
            gravity_constant,
            chaos,
            attract,
            paused: false,
            requested_count,
        }
    }

    fn handle_camera_input(&mut self, ctx: &egui::Context, ts: f32) {
        if ctx.wants_keyboard_input() {
            return;
        }
        ctx.input(|i| {
            let axes = self.camera.calculate_axes();

            if i.key_down(egui::Key::W) {
                self.camera.position += axes.forward * MOVEMENT_SPEED * ts;
            }
            if i.key_down(egui::Key::S) {
                self.camera.position -= axes.forward * MOVEMENT_SPEED * ts;
            }
            if i.key_down(egui::Key::A) {
                self.camera.position -= axes.right * MOVEMENT_SPEED * ts;
            }
            if i.key_down(egui::Key::D) {
                self.camera.position += axes.right * MOVEMENT_SPEED * ts;
            }
            if i.key_down(egui::Key::Q) {
                self.camera.position -= axes.up * MOVEMENT_SPEED * ts;
            }
            if i.key_down(egui::Key::E) {
                self.camera.position += axes.up * MOVEMENT_SPEED * ts;
            }

            if i.key_down(egui::Key::ArrowUp) {
                self.camera.pitch += ROTATION_SPEED * ts;
            }
            if i.key_down(egui::Key::ArrowDown) {
                self.camera.pitch -= ROTATION_SPEED * ts;
            }
            if i.key_down(egui::Key::ArrowLeft) {
                self.camera.yaw -= ROTATION_SPEED * ts;
            }
            if i.key_down(egui::Key::ArrowRight) {
                self.camera.yaw += ROTATION_SPEED * ts;
            }

            self.camera.pitch = self.camera.pitch.clamp(-89.9999, 89.9999);
        });
    }

    fn handle_mode_keys(&mut self, ctx: &egui::Context) {
        if ctx.wants_keyboard_input() {
            return;
        }
        let (space, chaos, attract, pause) = ctx.input(|i| {
            (
                i.key_pressed(egui::Key::Space),
                i.key_pressed(egui::Key::C),
                i.key_pressed(egui::Key::V),
                i.key_pressed(egui::Key::P),
            )
        });
        if space {
            self.orbit_enabled = !self.orbit_enabled;
        }
        if chaos {
            self.chaos = !self.chaos;
            self.driver.field().write().set_chaos_mode(self.chaos);
        }
        if attract {
            self.attract = !self.attract;
            self.driver.field().write().set_attract_mode(self.attract);
        }
        if pause {
            self.paused = !self.paused;
            self.driver.set_paused(self.paused);
        }
    }

    fn orbit_well(&self) -> GravityWell {
        let (sin, cos) = self.orbit_phase.sin_cos();
        // tangential velocity per nominal frame
        let speed = ORBIT_RADIUS * ORBIT_SPEED / 60.0;
        GravityWell::new(cos * ORBIT_RADIUS, sin * ORBIT_RADIUS, 0.0, self.well_strength)
            .with_velocity(-sin * speed, cos * speed)
    }

    fn current_wells(&self) -> Vec<GravityWell> {
        let mut wells = Vec::with_capacity(2);
        if let Some(position) = self.pointer.position {
            wells.push(
                GravityWell::new(position.x, position.y, 0.0, self.well_strength)
                    .with_velocity(self.pointer.velocity.x, self.pointer.velocity.y),
            );
        }
        if self.orbit_enabled {
            wells.push(self.orbit_well());
        }
        wells
    }

    fn render_ui_panel(&mut self, ui: &mut egui::Ui, frame_time: f32) {
        let (count, mean_speed) = {
            let field = self.driver.field().read();
            (field.count(), field.mean_speed())
        };

        ui.label(format!("FPS: {:.1}", 1.0 / frame_time.max(1e-6)));
        ui.label(format!("Frame Time: {:.3}ms", frame_time * 1000.0));
        ui.label(format!("Particles: {count}"));
        ui.label(format!("Mean Speed: {mean_speed:.5}"));
        ui.label(format!("Path Samples: {}", self.driver.path().len()));
        ui.separator();

        if ui.checkbox(&mut self.chaos, "Chaos (C)").changed() {
            self.driver.field().write().set_chaos_mode(self.chaos);
        }
        if ui.checkbox(&mut self.attract, "Attract (V)").changed() {
            self.driver.field().write().set_attract_mode(self.attract);
        }
        ui.checkbox(&mut self.orbit_enabled, "Orbiting Well (Space)");

        ui.horizontal(|ui| {
            ui.label("Drag: ");
            if ui
                .add(egui::Slider::new(&mut self.drag, 0.9..=MAX_DRAG).drag_value_speed(0.001))
                .changed()
            {
                self.driver.field().write().set_drag(self.drag);
            }
        });

        ui.horizontal(|ui| {
            ui.label("Gravity: ");
            if ui
                .add(egui::Slider::new(&mut self.gravity_constant, 0.0..=0.002).logarithmic(true))
                .changed()
            {
                self.driver
                    .field()
                    .write()
                    .set_gravity_constant(self.gravity_constant);
            }
        });

        ui.horizontal(|ui| {
            ui.label("Well Strength: ");
            ui.add(egui::Slider::new(&mut self.well_strength, 0.0..=5.0));
        });

        ui.horizontal(|ui| {
            ui.label("Impulse Strength: ");
            ui.add(egui::Slider::new(&mut self.impulse_strength, 0.0..=5.0));
        });

        ui.separator();

        ui.horizontal(|ui| {
            ui.label("Population: ");
            ui.add(egui::Slider::new(&mut self.requested_count, 100..=50_000).logarithmic(true));
        });
        if ui.button("Reinitialize").clicked() {
            info!("reinitializing with {} particles", self.requested_count);
            self.driver.field().write().initialize(self.requested_count);
        }

        ui.horizontal(|ui| {
            if ui.checkbox(&mut self.paused, "Paused (P)").changed() {
                self.driver.set_paused(self.paused);
            }
            if ui.add_enabled(self.paused, egui::Button::new("Step")).clicked() {
                self.driver.tick_at(1.0, self.driver.now_ms());
            }
        });
        if ui.button("Clear Path").clicked() {
            self.driver.clear_path();
        }

        ui.separator();
        ui.label("Hover: well");
        ui.label("Left drag: draw path");
        ui.label("Right click: explosion");
        ui.label("Middle click: implosion");
    }

    fn handle_pointer(&mut self, response: &egui::Response, projection: &Projection) {
        let hover = response.hover_pos().and_then(|pos| projection.to_plane(pos));
        self.pointer.track(hover);

        let Some(target) = hover else {
            return;
        };
        if response.dragged_by(egui::PointerButton::Primary) {
            self.driver.push_path_point(target.x, target.y);
        }
        if response.secondary_clicked() {
            self.driver
                .queue_explosion(target.x, target.y, self.impulse_strength);
        }
        if response.middle_clicked() {
            self.driver
                .queue_implosion(target.x, target.y, self.impulse_strength);
        }
    }

    fn draw_overlay(&self, painter: &egui::Painter, projection: &Projection, wells: &[GravityWell]) {
        let path: Vec<egui::Pos2> = self
            .driver
            .path()
            .iter()
            .filter_map(|p| projection.to_screen(vec2(p.x, p.y)))
            .collect();
        if path.len() > 1 {
            painter.add(egui::Shape::line(
                path,
                egui::Stroke::new(1.5, egui::Color32::from_rgb(120, 200, 255)),
            ));
        }

        let color = if self.attract {
            egui::Color32::from_rgb(255, 210, 90)
        } else {
            egui::Color32::from_rgb(255, 90, 90)
        };
        for well in wells {
            if let Some(center) = projection.to_screen(vec2(well.x, well.y)) {
                painter.circle_stroke(center, 6.0 + 2.0 * well.strength, egui::Stroke::new(1.5, color));
            }
        }
    }
}

impl eframe::App for FieldViewer {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let current_time = std::time::Instant::now();
        let frame_time = current_time.duration_since(self.last_frame_time);
        self.last_frame_time = current_time;
        let ts = frame_time.as_secs_f32();

        self.orbit_phase = (self.orbit_phase + ORBIT_SPEED * ts) % std::f32::consts::TAU;
        self.handle_camera_input(ctx, ts);
        self.handle_mode_keys(ctx);

        egui::SidePanel::left("Control Panel").show(ctx, |ui| {
            egui::ScrollArea::vertical().show(ui, |ui| {
                self.render_ui_panel(ui, ts);
                ui.allocate_space(ui.available_size());
            });
        });

        egui::CentralPanel::default()
            .frame(egui::Frame::none().fill(ctx.style().visuals.panel_fill))
            .show(ctx, |ui| {
                let (rect, response) =
                    ui.allocate_exact_size(ui.available_size(), egui::Sense::click_and_drag());

                let view_matrix = self.camera.view_matrix();
                let projection_matrix = self.camera.projection_matrix(rect.width() / rect.height());
                let projection = Projection {
                    view_projection: projection_matrix * view_matrix,
                    rect,
                };

                self.handle_pointer(&response, &projection);
                let wells = self.current_wells();
                self.driver.set_wells(&wells);

                let mut camera_uniform =
                    UniformBuffer::new([0; <GpuCamera as ShaderSize>::SHADER_SIZE.get() as _]);
                if let Err(err) = camera_uniform.write(&GpuCamera {
                    view_matrix,
                    projection_matrix,
                }) {
                    error!("failed to encode camera: {err}");
                    return;
                }
                let camera = camera_uniform.into_inner();

                let (particles, particle_count) = {
                    let field = self.driver.field().read();
                    (encode_particles(&field), field.count())
                };
                let particles = match particles {
                    Ok(bytes) => bytes,
                    Err(err) => {
                        error!("{err}");
                        return;
                    }
                };

                ui.painter().add(egui::PaintCallback {
                    rect,
                    callback: std::sync::Arc::new(
                        eframe::egui_wgpu::CallbackFn::new()
                            .prepare(move |device, queue, _encoder, paint_callback_resources| {
                                if let Some(renderer) = paint_callback_resources.get_mut::<Renderer>() {
                                    renderer.prepare(&camera, &particles, device, queue);
                                }
                                vec![]
                            })
                            .paint(move |_info, render_pass, paint_callback_resources| {
                                if let Some(renderer) = paint_callback_resources.get::<Renderer>() {
                                    renderer.paint(particle_count as _, render_pass);
                                }
                            }),
                    ),
                });

                self.draw_overlay(ui.painter(), &projection, &wells);
            });

        ctx.request_repaint();
    }
}

fn load_config(args: &Args) -> Result<FieldConfig> {
    let mut config = match &args.config {
        Some(path) => FieldConfig::load(path)
            .with_context(|| format!("loading field config {}", path.display()))?,
        None => FieldConfig::default(),
    };
    if let Some(count) = args.count {
        config.count = count;
    }
    if let Some(seed) = args.seed {
        config.seed = Some(seed);
    }
    Ok(config)
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let config = load_config(&args)?;
    info!("starting with {} particles", config.count);
    let field = ParticleField::new(config)?;
    let rate = args.rate;

    eframe::run_native(
        "Particle Wells",
        eframe::NativeOptions {
            renderer: eframe::Renderer::Wgpu,
            wgpu_options: eframe::egui_wgpu::WgpuConfiguration {
                present_mode: wgpu::PresentMode::AutoNoVsync,
                depth_format: Some(wgpu::TextureFormat::Depth32Float),
                ..Default::default()
            },
            vsync: false,
            depth_buffer: 32,
            ..Default::default()
        },
        Box::new(move |cc| Box::new(FieldViewer::new(cc, field, rate))),
    )
    .map_err(|err| anyhow::anyhow!("viewer failed: {err:?}"))
}
