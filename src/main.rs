use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use glam::Vec2;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;
use winit::{
    application::ApplicationHandler,
    dpi::PhysicalSize,
    event::{ElementState, MouseButton, MouseScrollDelta, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowId},
};

mod config;
mod error;
mod stamp;
mod ui;
mod viewer;

use config::{Cli, StampConfig};
use error::StampResult;
use stamp::{CommandGenerator, Exporter, ImageReader, StampController};
use ui::{MeshInfo, UiActions, UiState, apply_theme, draw_help_overlay, draw_side_panel};
use viewer::{GpuState, Viewer, ViewerState, Viewport};

#[derive(Default)]
struct PointerState {
    orbiting: bool,
    last: Option<Vec2>,
}

struct App {
    config: StampConfig,
    initial_image: Option<PathBuf>,

    window: Option<Arc<Window>>,
    gpu: Option<GpuState>,
    egui_state: Option<egui_winit::State>,
    egui_renderer: Option<egui_wgpu::Renderer>,
    egui_ctx: egui::Context,

    controller: StampController<CommandGenerator>,
    reader: ImageReader,
    exporter: Exporter,
    viewer: Viewer,
    ui_state: UiState,
    pointer: PointerState,
}

impl App {
    fn new(config: StampConfig, initial_image: Option<PathBuf>) -> Self {
        let controller = StampController::new(config.generator(), config.defaults);
        let exporter = Exporter::new(config.export_dir.clone());
        let viewer = Viewer::new(config.window.width, config.window.height);
        let ui_state = UiState::new(config.defaults, exporter.dir().to_path_buf());

        Self {
            config,
            initial_image,

            window: None,
            gpu: None,
            egui_state: None,
            egui_renderer: None,
            egui_ctx: egui::Context::default(),

            controller,
            reader: ImageReader::new(),
            exporter,
            viewer,
            ui_state,
            pointer: PointerState::default(),
        }
    }

    fn init_gpu(&mut self, window: Arc<Window>) -> StampResult<()> {
        let gpu = pollster::block_on(GpuState::new(window.clone()))?;

        let egui_state = egui_winit::State::new(
            self.egui_ctx.clone(),
            self.egui_ctx.viewport_id(),
            &window,
            Some(window.scale_factor() as f32),
            None,
            Some(2048),
        );

        let egui_renderer =
            egui_wgpu::Renderer::new(&gpu.device, gpu.config.format, None, 1, false);

        apply_theme(&self.egui_ctx);

        self.viewer
            .resize(Viewport::full(gpu.size.width, gpu.size.height));
        self.window = Some(window);
        self.gpu = Some(gpu);
        self.egui_state = Some(egui_state);
        self.egui_renderer = Some(egui_renderer);
        Ok(())
    }

    fn open_files(&mut self, paths: Vec<PathBuf>) {
        match self.controller.select_files(&paths) {
            Ok(Some(request)) => {
                info!(path = %request.path.display(), request = ?request.id, "reading image");
                self.reader.read(request.id, request.path);
            }
            Ok(None) => {}
            Err(e) => {
                warn!("{}", e);
                self.ui_state.report_error(e);
            }
        }
        self.ui_state.reading = self.controller.pending().is_some();
    }

    fn poll_reads(&mut self) {
        while let Some(outcome) = self.reader.try_recv() {
            let rendered = self.controller.accept_read(outcome.request, outcome.result);
            self.ui_state.reading = self.controller.pending().is_some();
            self.show_render(rendered);
        }
    }

    /// Feeds a render result to the viewer. Failures keep the previous mesh.
    fn show_render(&mut self, rendered: StampResult<Option<Arc<str>>>) {
        self.ui_state.export_enabled = self.controller.download_enabled();
        self.ui_state.source_name = self.controller.image().map(|i| i.name.clone());

        let text = match rendered {
            Ok(Some(text)) => text,
            Ok(None) => return,
            Err(e) => {
                error!("render failed: {}", e);
                self.ui_state.report_error(e);
                return;
            }
        };

        if let Err(e) = self.viewer.load(&text) {
            error!("could not display mesh: {}", e);
            self.ui_state.report_error(e);
            return;
        }

        self.ui_state.last_error = None;
        self.ui_state.mesh_info = self.viewer.scene().object().map(|object| MeshInfo {
            triangles: object.triangle_count(),
            size: object.world_bounds().size(),
        });
    }

    fn export(&mut self) {
        match self.controller.export(&self.exporter) {
            Ok(path) => {
                self.ui_state.last_export = Some(path);
                self.ui_state.last_error = None;
            }
            Err(e) => {
                error!("export failed: {}", e);
                self.ui_state.report_error(e);
            }
        }
    }

    fn handle_ui_actions(&mut self, actions: UiActions) {
        if actions.dismiss_error {
            self.ui_state.last_error = None;
        }

        if let Some(paths) = actions.open_files {
            self.open_files(paths);
        }

        if let Some(options) = actions.set_options {
            let rendered = self.controller.set_options(options);
            self.ui_state.options = self.controller.options();
            self.show_render(rendered);
        }

        if actions.export {
            self.export();
        }
    }

    /// Draws one frame. Returns `false` when the app should quit.
    fn render(&mut self) -> bool {
        if !self.viewer.tick() {
            return true;
        }
        self.poll_reads();

        let (Some(window), Some(egui_state)) = (&self.window, &mut self.egui_state) else {
            return true;
        };

        let raw_input = egui_state.take_egui_input(window);

        let distance = self.viewer.camera().distance();
        let show_help = self.ui_state.show_help && self.viewer.state() == ViewerState::Displaying;
        let mut ui_actions = UiActions::default();
        let mut preview = egui::Rect::NOTHING;

        let full_output = self.egui_ctx.run(raw_input, |ctx| {
            ui_actions = draw_side_panel(ctx, &mut self.ui_state);
            preview = ctx.available_rect();
            if show_help {
                draw_help_overlay(ctx, distance);
            }
        });

        if let Some(gpu) = &self.gpu {
            let surface = (gpu.config.width, gpu.config.height);
            self.viewer.resize(Viewport::from_points(
                preview,
                full_output.pixels_per_point,
                surface,
            ));
        }
        self.handle_ui_actions(ui_actions);

        let Some(gpu) = &mut self.gpu else { return true };
        let Some(window) = &self.window else { return true };
        let Some(egui_state) = &mut self.egui_state else {
            return true;
        };
        let Some(egui_renderer) = &mut self.egui_renderer else {
            return true;
        };

        egui_state.handle_platform_output(window, full_output.platform_output);

        let output = match gpu.surface.get_current_texture() {
            Ok(t) => t,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                gpu.resize(gpu.size);
                return true;
            }
            Err(wgpu::SurfaceError::OutOfMemory) => {
                error!("out of GPU memory");
                return false;
            }
            Err(e) => {
                warn!("skipping frame: {}", e);
                return true;
            }
        };

        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        gpu.sync_scene(self.viewer.scene());
        gpu.update_uniforms(self.viewer.camera(), self.viewer.scene());

        let paint_jobs = self
            .egui_ctx
            .tessellate(full_output.shapes, full_output.pixels_per_point);

        let screen_descriptor = egui_wgpu::ScreenDescriptor {
            size_in_pixels: [gpu.config.width, gpu.config.height],
            pixels_per_point: full_output.pixels_per_point,
        };

        for (id, delta) in full_output.textures_delta.set {
            egui_renderer.update_texture(&gpu.device, &gpu.queue, id, &delta);
        }

        let mut encoder = gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Main Encoder"),
            });

        egui_renderer.update_buffers(
            &gpu.device,
            &gpu.queue,
            &mut encoder,
            &paint_jobs,
            &screen_descriptor,
        );

        gpu.render_mesh(&view, &mut encoder, self.viewer.viewport());

        {
            let render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("egui Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Load,
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            let mut render_pass = render_pass.forget_lifetime();
            egui_renderer.render(&mut render_pass, &paint_jobs, &screen_descriptor);
        }

        for id in full_output.textures_delta.free {
            egui_renderer.free_texture(&id);
        }

        gpu.queue.submit(std::iter::once(encoder.finish()));
        output.present();
        true
    }

    fn shutdown(&mut self, event_loop: &ActiveEventLoop) {
        self.viewer.shutdown();
        self.reader.stop();
        event_loop.exit();
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let window_attrs = Window::default_attributes()
            .with_title(self.config.window.title.clone())
            .with_inner_size(PhysicalSize::new(
                self.config.window.width,
                self.config.window.height,
            ));

        let window = match event_loop.create_window(window_attrs) {
            Ok(window) => Arc::new(window),
            Err(e) => {
                error!("failed to create window: {}", e);
                self.shutdown(event_loop);
                return;
            }
        };

        if let Err(e) = self.init_gpu(window) {
            error!("{}", e);
            self.shutdown(event_loop);
            return;
        }

        if let Some(path) = self.initial_image.take() {
            self.open_files(vec![path]);
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        if let WindowEvent::MouseInput {
            button: MouseButton::Left,
            state: ElementState::Released,
            ..
        } = event
        {
            self.pointer.orbiting = false;
        }

        if let (Some(egui_state), Some(window)) = (&mut self.egui_state, &self.window) {
            let response = egui_state.on_window_event(window, &event);
            if response.repaint {
                window.request_redraw();
            }
            if response.consumed {
                return;
            }
        }

        match event {
            WindowEvent::CloseRequested => self.shutdown(event_loop),

            WindowEvent::Resized(size) => {
                // The preview area is refitted on the next frame.
                if let Some(gpu) = &mut self.gpu {
                    gpu.resize(size);
                }
            }

            WindowEvent::KeyboardInput { event, .. } => {
                if event.state == ElementState::Pressed
                    && event.physical_key == PhysicalKey::Code(KeyCode::KeyH)
                {
                    self.ui_state.show_help = !self.ui_state.show_help;
                }
            }

            WindowEvent::MouseInput {
                button: MouseButton::Left,
                state: ElementState::Pressed,
                ..
            } => {
                self.pointer.orbiting = true;
            }

            WindowEvent::CursorMoved { position, .. } => {
                let position = Vec2::new(position.x as f32, position.y as f32);
                if let (true, Some(last)) = (self.pointer.orbiting, self.pointer.last) {
                    self.viewer.orbit(position - last);
                }
                self.pointer.last = Some(position);
            }

            WindowEvent::CursorLeft { .. } => {
                self.pointer.last = None;
            }

            WindowEvent::MouseWheel { delta, .. } => {
                let scroll = match delta {
                    MouseScrollDelta::LineDelta(_, y) => y,
                    MouseScrollDelta::PixelDelta(pos) => pos.y as f32 / 50.0,
                };
                self.viewer.zoom(scroll);
            }

            WindowEvent::RedrawRequested => {
                if !self.render() {
                    self.shutdown(event_loop);
                }
            }

            _ => {}
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if !self.viewer.frame_loop().is_running() {
            return;
        }
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn run(cli: Cli) -> StampResult<()> {
    let config = StampConfig::from_cli(&cli)?;
    info!(
        converter = %config.converter.program.display(),
        export_dir = %config.export_dir.display(),
        "starting"
    );

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = App::new(config, cli.image);
    event_loop.run_app(&mut app)?;
    Ok(())
}

fn main() -> ExitCode {
    init_tracing();

    match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
