//! Free camera, its input controls and the GPU-facing camera uniform.
//!
//! The camera is stored as a position and a look-at target. Input never
//! touches the pose directly: [`CameraControls`] accumulates key and pointer
//! state and applies it once per frame in [`CameraControls::update`].

use std::cell::Cell;

use cgmath::{InnerSpace, Matrix4, Point3, Rad, Vector3};
use instant::Duration;

use crate::surface::DrawableSurface;

#[rustfmt::skip]
pub const OPENGL_TO_WGPU_MATRIX: Matrix4<f32> = Matrix4::new(
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 0.5, 0.0,
    0.0, 0.0, 0.5, 1.0,
);

const SAFE_FRAC_PI_2: f32 = std::f32::consts::FRAC_PI_2 - 0.0174533;

/// Where the camera is and what it looks at.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CameraPose {
    pub position: Point3<f32>,
    pub target: Point3<f32>,
}

/// A free-flying camera with a fixed up vector.
#[derive(Debug)]
pub struct FreeCamera {
    name: String,
    pose: Cell<CameraPose>,
    up: Vector3<f32>,
    fovy: Rad<f32>,
    znear: f32,
    zfar: f32,
    attached_to: Option<String>,
}

impl FreeCamera {
    /// A camera at `position` looking down the negative z axis.
    pub fn new<P: Into<Point3<f32>>>(name: &str, position: P) -> Self {
        let position = position.into();
        Self {
            name: name.to_string(),
            pose: Cell::new(CameraPose {
                position,
                target: position + Vector3::new(0.0, 0.0, -1.0),
            }),
            up: Vector3::unit_y(),
            fovy: Rad(0.8),
            znear: 1.0,
            zfar: 10000.0,
            attached_to: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_target<P: Into<Point3<f32>>>(&mut self, target: P) {
        let mut pose = self.pose.get();
        pose.target = target.into();
        self.pose.set(pose);
    }

    /// Bind keyboard and pointer control of this camera to `surface`.
    pub fn attach_control(&mut self, surface: &DrawableSurface) -> CameraControls {
        self.attached_to = Some(surface.id().to_string());
        CameraControls::new(surface.id(), 10.0, 0.004)
    }

    pub fn attached_to(&self) -> Option<&str> {
        self.attached_to.as_deref()
    }

    pub fn pose(&self) -> CameraPose {
        self.pose.get()
    }

    pub fn position(&self) -> Point3<f32> {
        self.pose.get().position
    }

    pub fn target(&self) -> Point3<f32> {
        self.pose.get().target
    }

    pub(crate) fn set_pose(&self, pose: CameraPose) {
        self.pose.set(pose);
    }

    pub fn view_matrix(&self) -> Matrix4<f32> {
        let pose = self.pose.get();
        Matrix4::look_at_rh(pose.position, pose.target, self.up)
    }

    pub fn projection_matrix(&self, aspect: f32) -> Matrix4<f32> {
        OPENGL_TO_WGPU_MATRIX * cgmath::perspective(self.fovy, aspect, self.znear, self.zfar)
    }

    pub fn view_projection(&self, aspect: f32) -> Matrix4<f32> {
        self.projection_matrix(aspect) * self.view_matrix()
    }
}

#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CameraUniform {
    view_position: [f32; 4],
    view_proj: [[f32; 4]; 4],
}

impl CameraUniform {
    pub fn new() -> Self {
        use cgmath::SquareMatrix;
        Self {
            view_position: [0.0; 4],
            view_proj: Matrix4::identity().into(),
        }
    }

    pub fn update_view_proj(&mut self, camera: &FreeCamera, aspect: f32) {
        self.view_position = camera.position().to_homogeneous().into();
        self.view_proj = camera.view_projection(aspect).into();
    }
}

impl Default for CameraUniform {
    fn default() -> Self {
        Self::new()
    }
}

/// Movement directions a key can be bound to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ControlKey {
    Forward,
    Backward,
    Left,
    Right,
}

/// Host-independent input aimed at the drawable surface.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ControlInput {
    Key { key: ControlKey, pressed: bool },
    PointerButton { pressed: bool },
    PointerMotion { dx: f64, dy: f64 },
}

/// Keyboard and pointer control bound to one surface.
#[derive(Debug)]
pub struct CameraControls {
    surface_id: String,
    speed: f32,
    sensitivity: f32,
    amount_forward: f32,
    amount_backward: f32,
    amount_left: f32,
    amount_right: f32,
    rotate_horizontal: f32,
    rotate_vertical: f32,
    dragging: bool,
}

impl CameraControls {
    /// `speed` is in world units per second, `sensitivity` in radians per pointer pixel.
    pub fn new(surface_id: &str, speed: f32, sensitivity: f32) -> Self {
        Self {
            surface_id: surface_id.to_string(),
            speed,
            sensitivity,
            amount_forward: 0.0,
            amount_backward: 0.0,
            amount_left: 0.0,
            amount_right: 0.0,
            rotate_horizontal: 0.0,
            rotate_vertical: 0.0,
            dragging: false,
        }
    }

    pub fn surface_id(&self) -> &str {
        &self.surface_id
    }

    /// Record an input. Returns whether it was consumed.
    pub fn handle_input(&mut self, input: ControlInput) -> bool {
        match input {
            ControlInput::Key { key, pressed } => {
                let amount = if pressed { 1.0 } else { 0.0 };
                match key {
                    ControlKey::Forward => self.amount_forward = amount,
                    ControlKey::Backward => self.amount_backward = amount,
                    ControlKey::Left => self.amount_left = amount,
                    ControlKey::Right => self.amount_right = amount,
                }
                true
            }
            ControlInput::PointerButton { pressed } => {
                self.dragging = pressed;
                true
            }
            ControlInput::PointerMotion { dx, dy } => {
                if !self.dragging {
                    return false;
                }
                self.rotate_horizontal += dx as f32;
                self.rotate_vertical += dy as f32;
                true
            }
        }
    }

    /// Apply the accumulated input to `camera`.
    pub fn update(&mut self, camera: &FreeCamera, dt: Duration) {
        let dt = dt.as_secs_f32();
        let mut pose = camera.pose();
        let offset = pose.target - pose.position;
        let distance = offset.magnitude();
        if distance <= f32::EPSILON {
            return;
        }
        let forward = offset / distance;
        let mut changed = false;

        let walk = (self.amount_forward - self.amount_backward) * self.speed * dt;
        let strafe = (self.amount_right - self.amount_left) * self.speed * dt;
        if walk != 0.0 || strafe != 0.0 {
            let right = forward.cross(camera.up);
            let right = if right.magnitude2() > f32::EPSILON {
                right.normalize()
            } else {
                Vector3::unit_x()
            };
            let translation = forward * walk + right * strafe;
            pose.position += translation;
            pose.target += translation;
            changed = true;
        }

        if self.rotate_horizontal != 0.0 || self.rotate_vertical != 0.0 {
            let yaw = forward.z.atan2(forward.x) + self.rotate_horizontal * self.sensitivity;
            let pitch = (forward.y.clamp(-1.0, 1.0).asin()
                - self.rotate_vertical * self.sensitivity)
                .clamp(-SAFE_FRAC_PI_2, SAFE_FRAC_PI_2);
            let direction = Vector3::new(pitch.cos() * yaw.cos(), pitch.sin(), pitch.cos() * yaw.sin());
            pose.target = pose.position + direction * distance;
            self.rotate_horizontal = 0.0;
            self.rotate_vertical = 0.0;
            changed = true;
        }

        if changed {
            camera.set_pose(pose);
        }
    }
}

#[cfg(test)]
mod tests {
    use cgmath::{EuclideanSpace, MetricSpace, Transform};

    use super::*;
    use crate::surface::SurfaceSize;

    fn camera() -> FreeCamera {
        let mut camera = FreeCamera::new("freeCamera", (-10.0, 5.0, 3.0));
        camera.set_target((0.0, 0.0, 0.0));
        camera
    }

    fn surface() -> DrawableSurface {
        DrawableSurface::new("gameCanvas", SurfaceSize::new(800, 600))
    }

    #[test]
    fn view_matrix_puts_target_in_front_of_the_eye() {
        let camera = camera();
        let target_in_view = camera.view_matrix().transform_point(Point3::origin());
        assert!(target_in_view.x.abs() < 1e-4);
        assert!(target_in_view.y.abs() < 1e-4);
        assert!(target_in_view.z < 0.0);
    }

    #[test]
    fn attach_control_remembers_the_surface() {
        let mut camera = camera();
        let controls = camera.attach_control(&surface());
        assert_eq!(camera.attached_to(), Some("gameCanvas"));
        assert_eq!(controls.surface_id(), "gameCanvas");
    }

    #[test]
    fn idle_controls_leave_the_pose_untouched() {
        let mut camera = camera();
        let mut controls = camera.attach_control(&surface());
        controls.update(&camera, Duration::from_secs(1));
        assert_eq!(camera.position(), Point3::new(-10.0, 5.0, 3.0));
        assert_eq!(camera.target(), Point3::new(0.0, 0.0, 0.0));
    }

    #[test]
    fn forward_key_moves_position_and_target_together() {
        let mut camera = camera();
        let mut controls = camera.attach_control(&surface());
        let before = camera.pose();
        controls.handle_input(ControlInput::Key {
            key: ControlKey::Forward,
            pressed: true,
        });
        controls.update(&camera, Duration::from_millis(100));
        let after = camera.pose();

        assert!(after.position.distance(Point3::origin()) < before.position.distance(Point3::origin()));
        let moved = after.position - before.position;
        let moved_target = after.target - before.target;
        assert!((moved - moved_target).magnitude() < 1e-4);

        controls.handle_input(ControlInput::Key {
            key: ControlKey::Forward,
            pressed: false,
        });
        controls.update(&camera, Duration::from_millis(100));
        assert_eq!(camera.pose(), after);
    }

    #[test]
    fn pointer_motion_only_rotates_while_dragging() {
        let mut camera = camera();
        let mut controls = camera.attach_control(&surface());
        assert!(!controls.handle_input(ControlInput::PointerMotion { dx: 40.0, dy: 0.0 }));
        controls.update(&camera, Duration::from_millis(16));
        assert_eq!(camera.target(), Point3::new(0.0, 0.0, 0.0));

        controls.handle_input(ControlInput::PointerButton { pressed: true });
        assert!(controls.handle_input(ControlInput::PointerMotion { dx: 40.0, dy: 0.0 }));
        controls.update(&camera, Duration::from_millis(16));

        let pose = camera.pose();
        assert_eq!(pose.position, Point3::new(-10.0, 5.0, 3.0));
        assert!(pose.target.distance(Point3::origin()) > 1e-3);
        let original_distance = Point3::new(-10.0f32, 5.0, 3.0).distance(Point3::origin());
        assert!((pose.target.distance(pose.position) - original_distance).abs() < 1e-3);
    }

    #[test]
    fn pitch_is_clamped_below_the_pole() {
        let mut camera = camera();
        let mut controls = camera.attach_control(&surface());
        controls.handle_input(ControlInput::PointerButton { pressed: true });
        controls.handle_input(ControlInput::PointerMotion { dx: 0.0, dy: -100_000.0 });
        controls.update(&camera, Duration::from_millis(16));
        let direction = (camera.target() - camera.position()).normalize();
        assert!(direction.y < 1.0);
        assert!(direction.y > 0.99);
    }

    #[test]
    fn uniform_tracks_the_camera_position() {
        let camera = camera();
        let mut uniform = CameraUniform::new();
        uniform.update_view_proj(&camera, 4.0 / 3.0);
        assert_eq!(uniform.view_position, [-10.0, 5.0, 3.0, 1.0]);
    }
}
