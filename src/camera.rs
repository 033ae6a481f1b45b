use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Quat, Vec3};

/// Near plane distance used by the infinite perspective projection.
pub const Z_NEAR: f32 = 0.1;

/// Perspective camera looking along `direction` from `eye`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    pub eye: Vec3,
    pub direction: Vec3,
    /// Vertical field of view in radians.
    pub fov: f32,
    pub aspect: f32,
}

impl Camera {
    /// Creates the default camera sized for a `width` x `height` viewport.
    pub fn new(width: u32, height: u32) -> Self {
        let mut camera = Self::default();
        camera.resize(width, height);
        camera
    }

    /// Updates the aspect ratio after the viewport changed size.
    pub fn resize(&mut self, width: u32, height: u32) {
        self.aspect = width as f32 / height.max(1) as f32;
    }

    /// Rotates the eye around the world Y axis and keeps the camera aimed at
    /// the origin.
    pub fn orbit_y(&mut self, angle: f32) {
        self.eye = Quat::from_rotation_y(angle).mul_vec3(self.eye);
        self.direction = -self.eye;
    }

    /// Combined projection * view transform consumed by the vertex stage.
    pub fn view_proj(&self) -> Mat4 {
        let view = Mat4::look_to_rh(self.eye, self.direction, Vec3::Y);
        let projection = Mat4::perspective_infinite_rh(self.fov, self.aspect, Z_NEAR);
        projection * view
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            eye: Vec3::ONE * 3.0,
            direction: Vec3::NEG_ONE,
            fov: std::f32::consts::FRAC_PI_2,
            aspect: 1.0,
        }
    }
}

/// GPU layout of the camera uniform at group 0, binding 0.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct CameraUniform {
    pub view_proj: [[f32; 4]; 4],
}

impl CameraUniform {
    pub const SIZE: u64 = std::mem::size_of::<Self>() as u64;

    pub fn from_matrix(view_proj: Mat4) -> Self {
        Self {
            view_proj: view_proj.to_cols_array_2d(),
        }
    }

    pub fn from_camera(camera: &Camera) -> Self {
        Self::from_matrix(camera.view_proj())
    }

    pub fn matrix(&self) -> Mat4 {
        Mat4::from_cols_array_2d(&self.view_proj)
    }
}

impl Default for CameraUniform {
    fn default() -> Self {
        Self::from_matrix(Mat4::IDENTITY)
    }
}
