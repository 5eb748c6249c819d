//! Orbit camera: view/projection state, uniforms and the mouse controller.
//!
//! The gallery camera orbits the displayed artifact: dragging rotates around
//! a fixed target, the scroll wheel zooms. Pitch is clamped to the upper
//! hemisphere so the viewer can never swing underneath the pedestal.

use cgmath::{EuclideanSpace, Matrix4, Point3, Rad, Vector3};
use winit::event::{MouseScrollDelta, WindowEvent};

#[rustfmt::skip]
pub const OPENGL_TO_WGPU_MATRIX: Matrix4<f32> = Matrix4::new(
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 0.5, 0.0,
    0.0, 0.0, 0.5, 1.0,
);

const MIN_RADIUS: f32 = 1.0;
const MAX_RADIUS: f32 = 20.0;
// Just shy of straight-up so look_at never degenerates.
const MAX_PITCH: f32 = std::f32::consts::FRAC_PI_2 - 0.05;

/// Camera state: a target point and spherical coordinates around it.
///
/// `pitch` is measured up from the horizon and clamped to `[0, π/2)`,
/// mirroring the polar-angle limits of the original viewer.
#[derive(Debug)]
pub struct Camera {
    pub target: Point3<f32>,
    pub yaw: Rad<f32>,
    pub pitch: Rad<f32>,
    pub radius: f32,
}

impl Camera {
    pub fn new<T: Into<Point3<f32>>>(target: T, yaw: Rad<f32>, pitch: Rad<f32>, radius: f32) -> Self {
        let mut camera = Self {
            target: target.into(),
            yaw,
            pitch,
            radius,
        };
        camera.clamp();
        camera
    }

    pub fn eye(&self) -> Point3<f32> {
        let (sin_yaw, cos_yaw) = self.yaw.0.sin_cos();
        let (sin_pitch, cos_pitch) = self.pitch.0.sin_cos();
        self.target
            + Vector3::new(
                self.radius * cos_pitch * sin_yaw,
                self.radius * sin_pitch,
                self.radius * cos_pitch * cos_yaw,
            )
    }

    pub fn calc_matrix(&self) -> Matrix4<f32> {
        Matrix4::look_at_rh(self.eye(), self.target, Vector3::unit_y())
    }

    pub(crate) fn clamp(&mut self) {
        self.pitch.0 = self.pitch.0.clamp(0.0, MAX_PITCH);
        self.radius = self.radius.clamp(MIN_RADIUS, MAX_RADIUS);
    }
}

#[derive(Debug)]
pub struct Projection {
    aspect: f32,
    fovy: Rad<f32>,
    znear: f32,
    zfar: f32,
}

impl Projection {
    pub fn new<F: Into<Rad<f32>>>(width: u32, height: u32, fovy: F, znear: f32, zfar: f32) -> Self {
        Self {
            aspect: width as f32 / height as f32,
            fovy: fovy.into(),
            znear,
            zfar,
        }
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.aspect = width as f32 / height as f32;
    }

    pub fn calc_matrix(&self) -> Matrix4<f32> {
        OPENGL_TO_WGPU_MATRIX * cgmath::perspective(self.fovy, self.aspect, self.znear, self.zfar)
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

    pub fn update_view_proj(&mut self, camera: &Camera, projection: &Projection) {
        self.view_position = camera.eye().to_homogeneous().into();
        self.view_proj = (projection.calc_matrix() * camera.calc_matrix()).into();
    }
}

impl Default for CameraUniform {
    fn default() -> Self {
        Self::new()
    }
}

/// Accumulates mouse input and applies it to the camera once per frame.
#[derive(Debug)]
pub struct CameraController {
    rotate_speed: f32,
    zoom_speed: f32,
    rotate_delta: (f32, f32),
    zoom_delta: f32,
}

impl CameraController {
    pub fn new(rotate_speed: f32, zoom_speed: f32) -> Self {
        Self {
            rotate_speed,
            zoom_speed,
            rotate_delta: (0.0, 0.0),
            zoom_delta: 0.0,
        }
    }

    /// Feed a raw mouse-motion delta (called while the rotate button is held).
    pub fn handle_mouse(&mut self, dx: f64, dy: f64) {
        self.rotate_delta.0 += dx as f32;
        self.rotate_delta.1 += dy as f32;
    }

    pub fn handle_window_events(&mut self, event: &WindowEvent) {
        if let WindowEvent::MouseWheel { delta, .. } = event {
            self.zoom_delta += match delta {
                MouseScrollDelta::LineDelta(_, y) => *y,
                MouseScrollDelta::PixelDelta(pos) => pos.y as f32 / 32.0,
            };
        }
    }

    pub fn update(&mut self, camera: &mut Camera) {
        camera.yaw -= Rad(self.rotate_delta.0 * self.rotate_speed);
        camera.pitch += Rad(self.rotate_delta.1 * self.rotate_speed);
        camera.radius *= 1.0 - self.zoom_delta * self.zoom_speed;
        camera.clamp();

        self.rotate_delta = (0.0, 0.0);
        self.zoom_delta = 0.0;
    }
}

/// Camera GPU resources bundled for the render loop.
#[derive(Debug)]
pub struct CameraResources {
    pub camera: Camera,
    pub controller: CameraController,
    pub uniform: CameraUniform,
    pub buffer: wgpu::Buffer,
    pub bind_group: wgpu::BindGroup,
    pub bind_group_layout: wgpu::BindGroupLayout,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pitch_never_leaves_the_upper_hemisphere() {
        let mut camera = Camera::new((0.0, 0.0, 0.0), Rad(0.0), Rad(0.0), 3.0);
        let mut controller = CameraController::new(0.01, 0.1);

        // Drag far downward: pitch must stop at the horizon.
        controller.handle_mouse(0.0, -10_000.0);
        controller.update(&mut camera);
        assert!(camera.pitch.0 >= 0.0);

        // Drag far upward: pitch must stop short of straight-up.
        controller.handle_mouse(0.0, 10_000.0);
        controller.update(&mut camera);
        assert!(camera.pitch.0 < std::f32::consts::FRAC_PI_2);
    }

    #[test]
    fn default_view_sits_in_front_of_the_artifact() {
        let camera = Camera::new((0.0, 0.0, 0.0), Rad(0.0), Rad(0.0), 3.0);
        let eye = camera.eye();
        assert!((eye.x).abs() < 1e-6);
        assert!((eye.y).abs() < 1e-6);
        assert!((eye.z - 3.0).abs() < 1e-6);
    }

    #[test]
    fn zoom_is_clamped() {
        let mut camera = Camera::new((0.0, 0.0, 0.0), Rad(0.0), Rad(0.3), 3.0);
        let mut controller = CameraController::new(0.01, 0.1);

        controller.zoom_delta = 1_000.0;
        controller.update(&mut camera);
        assert!(camera.radius >= MIN_RADIUS);

        controller.zoom_delta = -1_000.0;
        controller.update(&mut camera);
        assert!(camera.radius <= MAX_RADIUS);
    }
}
