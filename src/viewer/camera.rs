use std::f32::consts::{PI, TAU};

use glam::{Mat4, Vec2, Vec3};

/// Keeps the polar angle away from the poles so `look_at` stays defined.
const POLE_EPSILON: f32 = 1e-6;

/// Margin applied to the model height when framing on first load.
pub const FRAME_MARGIN: f32 = 1.2;

pub struct Camera {
    pub position: Vec3,
    pub target: Vec3,

    pub fov: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            position: Vec3::new(0.0, 0.0, 3.0),
            target: Vec3::ZERO,

            fov: 45.0_f32.to_radians(),
            aspect: 1.0,
            near: 1.0,
            far: 1000.0,
        }
    }
}

impl Camera {
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.target, Vec3::Y)
    }

    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov, self.aspect, self.near, self.far)
    }

    pub fn view_projection_matrix(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }

    pub fn set_aspect(&mut self, width: f32, height: f32) {
        self.aspect = width / height.max(1.0);
    }

    /// Unit vector from the target towards the camera.
    pub fn view_axis(&self) -> Vec3 {
        (self.position - self.target).try_normalize().unwrap_or(Vec3::Z)
    }

    pub fn distance(&self) -> f32 {
        self.position.distance(self.target)
    }

    /// Distance at which a model of the given height fills the vertical
    /// field of view with a small margin.
    pub fn frame_distance(&self, height: f32) -> f32 {
        (height / 2.0 * FRAME_MARGIN) / (self.fov / 2.0).tan()
    }

    /// Moves along the current view axis to fit `height`, then looks at the
    /// origin. Degenerate heights leave the distance alone.
    pub fn frame(&mut self, height: f32) {
        let axis = self.view_axis();
        let distance = self.frame_distance(height);
        let distance = if distance.is_finite() && distance > 0.0 {
            distance
        } else {
            self.distance()
        };

        self.target = Vec3::ZERO;
        self.position = axis * distance;
    }
}

/// Orbit-style interaction around `Camera::target`, with optional damping.
pub struct OrbitControls {
    pub enable_damping: bool,
    pub damping_factor: f32,
    pub rotate_speed: f32,
    pub zoom_speed: f32,
    pub min_distance: f32,
    pub max_distance: f32,

    theta_delta: f32,
    phi_delta: f32,
    scale: f32,
}

impl Default for OrbitControls {
    fn default() -> Self {
        Self {
            enable_damping: true,
            damping_factor: 0.25,
            rotate_speed: 1.0,
            zoom_speed: 1.0,
            min_distance: 0.0,
            max_distance: f32::INFINITY,

            theta_delta: 0.0,
            phi_delta: 0.0,
            scale: 1.0,
        }
    }
}

impl OrbitControls {
    /// Queues a rotation from a pointer drag of `delta` pixels.
    pub fn rotate(&mut self, delta: Vec2, viewport_height: f32) {
        let height = viewport_height.max(1.0);
        self.theta_delta -= TAU * delta.x / height * self.rotate_speed;
        self.phi_delta -= TAU * delta.y / height * self.rotate_speed;
    }

    /// Positive scroll moves the camera closer.
    pub fn zoom(&mut self, scroll: f32) {
        let step = 0.95_f32.powf(self.zoom_speed * scroll.abs());
        if scroll > 0.0 {
            self.scale *= step;
        } else if scroll < 0.0 {
            self.scale /= step;
        }
    }

    pub fn is_settled(&self) -> bool {
        self.theta_delta.abs() < 1e-6 && self.phi_delta.abs() < 1e-6 && self.scale == 1.0
    }

    /// Applies queued input to the camera. Returns whether it moved.
    pub fn update(&mut self, camera: &mut Camera) -> bool {
        if self.is_settled() {
            self.theta_delta = 0.0;
            self.phi_delta = 0.0;
            return false;
        }

        let offset = camera.position - camera.target;
        let radius = offset.length();
        if radius <= f32::EPSILON {
            self.scale = 1.0;
            return false;
        }

        let mut theta = offset.x.atan2(offset.z);
        let mut phi = (offset.y / radius).clamp(-1.0, 1.0).acos();

        if self.enable_damping {
            theta += self.theta_delta * self.damping_factor;
            phi += self.phi_delta * self.damping_factor;
        } else {
            theta += self.theta_delta;
            phi += self.phi_delta;
        }
        phi = phi.clamp(POLE_EPSILON, PI - POLE_EPSILON);

        let radius = (radius * self.scale).clamp(self.min_distance, self.max_distance);

        camera.position = camera.target
            + Vec3::new(
                radius * phi.sin() * theta.sin(),
                radius * phi.cos(),
                radius * phi.sin() * theta.cos(),
            );

        if self.enable_damping {
            self.theta_delta *= 1.0 - self.damping_factor;
            self.phi_delta *= 1.0 - self.damping_factor;
        } else {
            self.theta_delta = 0.0;
            self.phi_delta = 0.0;
        }
        self.scale = 1.0;

        true
    }
}

#[repr(C)]
#[derive(Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CameraUniform {
    pub view_proj: [[f32; 4]; 4],
    pub camera_pos: [f32; 3],
    pub _padding: f32,
}

impl CameraUniform {
    pub fn from_camera(camera: &Camera) -> Self {
        Self {
            view_proj: camera.view_projection_matrix().to_cols_array_2d(),
            camera_pos: camera.position.to_array(),
            _padding: 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn frame_distance_follows_fov() {
        let camera = Camera::default();
        let expected = (20.0 / 2.0 * 1.2) / (22.5_f32.to_radians()).tan();
        assert_relative_eq!(camera.frame_distance(20.0), expected, epsilon = 1e-4);
    }

    #[test]
    fn frame_keeps_view_axis_and_targets_origin() {
        let mut camera = Camera {
            position: Vec3::new(0.0, 4.0, 3.0),
            target: Vec3::new(1.0, 0.0, 0.0),
            ..Default::default()
        };
        let axis = camera.view_axis();

        camera.frame(10.0);

        assert_eq!(camera.target, Vec3::ZERO);
        assert_relative_eq!(camera.distance(), camera.frame_distance(10.0), epsilon = 1e-4);
        let moved = camera.view_axis();
        assert_relative_eq!(moved.dot(axis), 1.0, epsilon = 1e-5);
    }

    #[test]
    fn degenerate_height_keeps_distance() {
        let mut camera = Camera::default();
        camera.frame(0.0);
        assert_relative_eq!(camera.distance(), 3.0);
    }

    #[test]
    fn idle_controls_leave_camera_alone() {
        let mut camera = Camera::default();
        let mut controls = OrbitControls::default();

        assert!(!controls.update(&mut camera));
        assert_eq!(camera.position, Vec3::new(0.0, 0.0, 3.0));
    }

    #[test]
    fn damped_rotation_keeps_distance_and_settles() {
        let mut camera = Camera::default();
        let mut controls = OrbitControls::default();

        controls.rotate(Vec2::new(100.0, 0.0), 600.0);
        assert!(controls.update(&mut camera));
        let after_one = camera.position;
        assert!(after_one.x.abs() > 0.0);
        assert_relative_eq!(camera.distance(), 3.0, epsilon = 1e-4);

        for _ in 0..200 {
            controls.update(&mut camera);
        }
        assert!(controls.is_settled());

        // Total swing converges on the undamped angle.
        let theta = camera.position.x.atan2(camera.position.z);
        assert_relative_eq!(theta, -TAU * 100.0 / 600.0, epsilon = 1e-3);
    }

    #[test]
    fn zoom_scales_distance() {
        let mut camera = Camera::default();
        let mut controls = OrbitControls::default();

        controls.zoom(1.0);
        controls.update(&mut camera);
        assert_relative_eq!(camera.distance(), 3.0 * 0.95, epsilon = 1e-4);

        controls.zoom(-1.0);
        controls.update(&mut camera);
        assert_relative_eq!(camera.distance(), 3.0, epsilon = 1e-4);
    }

    #[test]
    fn polar_angle_is_clamped() {
        let mut camera = Camera::default();
        let mut controls = OrbitControls {
            enable_damping: false,
            ..Default::default()
        };

        controls.rotate(Vec2::new(0.0, -10_000.0), 100.0);
        controls.update(&mut camera);

        // Dragging far upwards parks the camera just above the lower pole.
        assert!(camera.position.y < 0.0);
        assert!(camera.position.x.abs() + camera.position.z.abs() > 0.0);
        assert!(camera.view_matrix().is_finite());
    }
}
