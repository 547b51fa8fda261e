use glam::{Mat4, Vec2, Vec3};
use winit::event::{ElementState, MouseButton, MouseScrollDelta, WindowEvent};

/// World axis treated as "up" by the orbit camera.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpAxis {
    /// Robot/episode data: z up.
    Z,
    /// OBJ assets: y up.
    Y,
}

impl UpAxis {
    pub fn vector(self) -> Vec3 {
        match self {
            UpAxis::Z => Vec3::Z,
            UpAxis::Y => Vec3::Y,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Camera {
    // --- Orbital Parameters (Primary State) ---
    /// The point the camera orbits around.
    pub target: Vec3,
    /// Distance from the camera to the target.
    pub radius: f32,
    /// Azimuth angle around the up axis (radians).
    pub azimuth_rad: f32,
    /// Elevation angle above the ground plane (radians).
    pub elevation_rad: f32,
    pub up: UpAxis,

    // --- Projection ---
    pub fov_y_rad: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,

    /// Derived by `update()`.
    eye: Vec3,
}

impl Camera {
    /// Places the camera at `eye` looking at `target`.
    pub fn looking_at(eye: Vec3, target: Vec3, up: UpAxis, aspect: f32) -> Self {
        let mut camera = Self {
            target,
            radius: 1.0,
            azimuth_rad: 0.0,
            elevation_rad: 0.0,
            up,
            fov_y_rad: 80f32.to_radians(),
            aspect,
            near: 0.01,
            far: 100.0,
            eye,
        };
        camera.set_eye(eye);
        camera
    }

    /// Recomputes the orbital parameters from an explicit eye position.
    pub fn set_eye(&mut self, eye: Vec3) {
        let (ground, height) = self.split_offset(eye - self.target);
        self.radius = (eye - self.target).length().max(1e-4);
        self.elevation_rad = height.atan2(ground.length());
        self.azimuth_rad = ground.x.atan2(ground.y);
        self.update();
    }

    /// Splits an offset into its ground-plane part (as 2D) and its height.
    fn split_offset(&self, v: Vec3) -> (Vec2, f32) {
        match self.up {
            UpAxis::Z => (Vec2::new(v.x, v.y), v.z),
            UpAxis::Y => (Vec2::new(v.x, v.z), v.y),
        }
    }

    /// Recalculates the eye position from the orbital parameters. Must be
    /// called after any orbital parameter changes.
    pub fn update(&mut self) {
        let (sin_az, cos_az) = self.azimuth_rad.sin_cos();
        let (sin_el, cos_el) = self.elevation_rad.sin_cos();
        let ground = Vec2::new(cos_el * sin_az, cos_el * cos_az) * self.radius;
        let height = sin_el * self.radius;

        let offset = match self.up {
            UpAxis::Z => Vec3::new(ground.x, ground.y, height),
            UpAxis::Y => Vec3::new(ground.x, height, ground.y),
        };
        self.eye = self.target + offset;
    }

    pub fn eye(&self) -> Vec3 {
        self.eye
    }

    pub fn view(&self) -> Mat4 {
        Mat4::look_at_rh(self.eye, self.target, self.up.vector())
    }

    /// wgpu clip space (depth in [0, 1]); `perspective_rh` already matches.
    pub fn proj(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov_y_rad, self.aspect.max(1e-4), self.near, self.far)
    }

    pub fn view_proj(&self) -> Mat4 {
        self.proj() * self.view()
    }

    /// Unit vectors spanning the image plane (right, up) in world space.
    pub fn screen_basis(&self) -> (Vec3, Vec3) {
        let forward = (self.target - self.eye).normalize_or_zero();
        let right = forward.cross(self.up.vector()).normalize_or_zero();
        let up = right.cross(forward);
        (right, up)
    }
}

const ROTATE_SPEED: f32 = 0.005;
const ZOOM_STEP: f32 = 0.95;
/// Fraction of the remaining orbit velocity applied per update.
const DAMPING: f32 = 0.05;
const MIN_RADIUS: f32 = 0.02;
const MAX_RADIUS: f32 = 50.0;

/// Mouse orbit/pan/zoom with damping.
///
/// While `enabled` is false all input is ignored and `update()` does
/// nothing, so the gizmo can own the pointer during a drag.
pub struct CameraController {
    pub enabled: bool,
    rotate_down: bool,
    pan_down: bool,
    last_mouse: Option<(f64, f64)>,
    /// Pending (azimuth, elevation) change, spent gradually in `update()`.
    orbit_velocity: Vec2,
}

impl Default for CameraController {
    fn default() -> Self {
        Self::new()
    }
}

impl CameraController {
    /// Creates a new controller with default state.
    pub fn new() -> Self {
        Self {
            enabled: true,
            rotate_down: false,
            pan_down: false,
            last_mouse: None,
            orbit_velocity: Vec2::ZERO,
        }
    }

    /// Handles window events and updates the camera.
    pub fn handle_event(&mut self, event: &WindowEvent, camera: &mut Camera) {
        match event {
            WindowEvent::MouseInput { button, state, .. } => {
                let pressed = *state == ElementState::Pressed && self.enabled;
                match button {
                    MouseButton::Left => self.rotate_down = pressed,
                    MouseButton::Right | MouseButton::Middle => self.pan_down = pressed,
                    _ => {}
                }
            }
            WindowEvent::CursorMoved { position, .. } => {
                self.handle_cursor((position.x, position.y), camera);
            }
            WindowEvent::MouseWheel { delta, .. } if self.enabled => {
                let scroll = match delta {
                    MouseScrollDelta::LineDelta(_, y) => *y,
                    MouseScrollDelta::PixelDelta(pos) => pos.y as f32 / 120.0,
                };

                self.handle_scroll(scroll, camera);
            }
            _ => {}
        }
    }

    /// Positive delta (scroll up) zooms in.
    fn handle_scroll(&mut self, delta: f32, camera: &mut Camera) {
        camera.radius = (camera.radius * ZOOM_STEP.powf(delta)).clamp(MIN_RADIUS, MAX_RADIUS);
        camera.update();
    }

    fn handle_cursor(&mut self, xy: (f64, f64), camera: &mut Camera) {
        if let (Some(last), true) = (self.last_mouse, self.enabled) {
            let dx = (xy.0 - last.0) as f32;
            let dy = (xy.1 - last.1) as f32;

            if self.rotate_down {
                self.orbit_velocity += Vec2::new(-dx, dy) * ROTATE_SPEED;
            } else if self.pan_down {
                // Pan in the image plane, scaled so the target tracks the cursor.
                let (right, up) = camera.screen_basis();
                let scale = camera.radius * 0.002;
                camera.target += (-right * dx + up * dy) * scale;
                camera.update();
            }
        }
        self.last_mouse = Some(xy);
    }

    /// Applies damped orbit motion. Call once per frame.
    pub fn update(&mut self, camera: &mut Camera) {
        if !self.enabled {
            return;
        }
        if self.orbit_velocity.length_squared() < 1e-10 {
            self.orbit_velocity = Vec2::ZERO;
            return;
        }

        let step = self.orbit_velocity * DAMPING;
        self.orbit_velocity -= step;

        camera.azimuth_rad += step.x;
        // Clamp elevation to stop just short of the poles.
        camera.elevation_rad = (camera.elevation_rad + step.y)
            .clamp(-89f32.to_radians(), 89f32.to_radians());
        camera.update();
    }

    /// Drops button state, e.g. when the gizmo takes over the pointer.
    pub fn release_buttons(&mut self) {
        self.rotate_down = false;
        self.pan_down = false;
    }
}
