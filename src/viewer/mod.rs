pub mod camera;
pub mod gpu;
pub mod mesh;
pub mod scene;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use glam::{Vec2, Vec3};
use tracing::{debug, info};

use crate::error::StampResult;

pub use camera::{Camera, OrbitControls};
pub use gpu::GpuState;
pub use mesh::parse_obj;
pub use scene::Scene;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ViewerState {
    Empty,
    Displaying,
}

/// Per-frame redraw driver. Runs until its cancel handle fires.
pub struct FrameLoop {
    cancelled: Arc<AtomicBool>,
    frames: u64,
}

#[derive(Clone)]
pub struct CancelHandle {
    cancelled: Arc<AtomicBool>,
}

impl CancelHandle {
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }
}

impl FrameLoop {
    pub fn start() -> Self {
        Self {
            cancelled: Arc::new(AtomicBool::new(false)),
            frames: 0,
        }
    }

    pub fn handle(&self) -> CancelHandle {
        CancelHandle {
            cancelled: Arc::clone(&self.cancelled),
        }
    }

    pub fn is_running(&self) -> bool {
        !self.cancelled.load(Ordering::Acquire)
    }

    /// Counts a frame. Returns `false` once cancelled.
    pub fn next_frame(&mut self) -> bool {
        if !self.is_running() {
            return false;
        }
        self.frames += 1;
        true
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }
}

/// Region of the surface the preview draws into, in physical pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Viewport {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    pub fn full(width: u32, height: u32) -> Self {
        Self {
            x: 0,
            y: 0,
            width,
            height,
        }
    }

    /// Converts a rect in egui points to pixels, clamped to the surface.
    pub fn from_points(rect: egui::Rect, pixels_per_point: f32, surface: (u32, u32)) -> Self {
        let to_px = |v: f32, max: u32| ((v * pixels_per_point).round().max(0.0) as u32).min(max);

        let x = to_px(rect.min.x, surface.0);
        let y = to_px(rect.min.y, surface.1);
        let right = to_px(rect.max.x, surface.0).max(x);
        let bottom = to_px(rect.max.y, surface.1).max(y);

        Self {
            x,
            y,
            width: right - x,
            height: bottom - y,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// Camera, lit scene and frame loop for previewing generated stamps.
pub struct Viewer {
    camera: Camera,
    controls: OrbitControls,
    scene: Scene,
    viewport: Viewport,
    frame_loop: FrameLoop,
}

impl Viewer {
    pub fn new(width: u32, height: u32) -> Self {
        let mut camera = Camera::default();
        camera.set_aspect(width as f32, height as f32);

        Self {
            camera,
            controls: OrbitControls::default(),
            scene: Scene::studio(),
            viewport: Viewport::full(width, height),
            frame_loop: FrameLoop::start(),
        }
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn frame_loop(&self) -> &FrameLoop {
        &self.frame_loop
    }

    pub fn state(&self) -> ViewerState {
        if self.scene.object().is_some() {
            ViewerState::Displaying
        } else {
            ViewerState::Empty
        }
    }

    /// Replaces the displayed mesh with the one described by `mesh_text`.
    ///
    /// The new object is centred on X/Y. Only the very first load moves the
    /// camera; afterwards the user's framing is kept. Returns whether the
    /// camera was framed. Parse errors leave the scene as it was.
    pub fn load(&mut self, mesh_text: &str) -> StampResult<bool> {
        let mut object = parse_obj(mesh_text)?;

        let center = object.bounds.center();
        object.translation = Vec3::new(-center.x, -center.y, 0.0);
        let height = object.bounds.size().y;
        let triangles = object.triangle_count();

        let first = self.scene.replace_object(object).is_none();
        if first {
            self.camera.frame(height);
            info!(
                distance = self.camera.distance(),
                height, "framed camera on first mesh"
            );
        }
        debug!(
            name = %self.scene.object().map_or("", |o| o.name.as_str()),
            triangles,
            revision = self.scene.revision(),
            "mesh loaded"
        );

        Ok(first)
    }

    /// Fits the camera to the area left for the preview.
    pub fn resize(&mut self, viewport: Viewport) {
        if viewport == self.viewport {
            return;
        }
        debug!(?viewport, "preview resized");
        self.viewport = viewport;
        self.camera
            .set_aspect(viewport.width as f32, viewport.height as f32);
    }

    pub fn orbit(&mut self, delta: Vec2) {
        self.controls.rotate(delta, self.viewport.height as f32);
    }

    pub fn zoom(&mut self, scroll: f32) {
        self.controls.zoom(scroll);
    }

    /// Advances damped controls by one frame. Returns `false` once the
    /// frame loop has been cancelled.
    pub fn tick(&mut self) -> bool {
        if !self.frame_loop.next_frame() {
            return false;
        }
        self.controls.update(&mut self.camera);
        true
    }

    pub fn shutdown(&self) {
        if self.frame_loop.is_running() {
            info!(frames = self.frame_loop.frames(), "stopping frame loop");
        }
        self.frame_loop.handle().cancel();
    }
}

impl Drop for Viewer {
    fn drop(&mut self) {
        self.shutdown();
    }
}
