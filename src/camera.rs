//! Camera, projection and the pointer parallax controller.
//!
//! The camera in this viewer never orbits or translates freely: it keeps a
//! fixed look-at target and shifts its x/y position around a base point as
//! the pointer moves, which produces a subtle parallax effect. The view
//! matrix is recomputed from position and target on every read, so the
//! look-at constraint holds after every move by construction.

use cgmath::{Deg, InnerSpace, Matrix4, Point3, Rad, SquareMatrix, Vector3, perspective};

#[rustfmt::skip]
pub const OPENGL_TO_WGPU_MATRIX: Matrix4<f32> = Matrix4::new(
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 0.5, 0.0,
    0.0, 0.0, 0.5, 1.0,
);

/// Where the camera rests when the pointer is at the viewport center.
pub const BASE_POSITION: Point3<f32> = Point3::new(5.0, 200.0, 400.0);
/// The fixed point the camera always looks at.
pub const LOOK_TARGET: Point3<f32> = Point3::new(5.0, 130.0, 0.0);
/// Pointer offset (in pixels from the viewport center) to world-unit factor.
pub const POINTER_SENSITIVITY: f32 = 0.2;

pub const FOVY: Deg<f32> = Deg(75.0);
pub const ZNEAR: f32 = 0.1;
pub const ZFAR: f32 = 5000.0;

/// A look-at camera with a fixed target.
///
/// `base` is the rest position; only `position.x` and `position.y` deviate
/// from it (driven by [`ParallaxController`]), `position.z` stays at
/// `base.z` for the lifetime of the camera.
#[derive(Clone, Copy, Debug)]
pub struct Camera {
    pub position: Point3<f32>,
    pub base: Point3<f32>,
    pub target: Point3<f32>,
}

impl Camera {
    pub fn new(base: Point3<f32>, target: Point3<f32>) -> Self {
        Self {
            position: base,
            base,
            target,
        }
    }

    pub fn calc_matrix(&self) -> Matrix4<f32> {
        Matrix4::look_at_rh(self.position, self.target, Vector3::unit_y())
    }

    /// Unit vector from the camera towards its target.
    pub fn forward(&self) -> Vector3<f32> {
        (self.target - self.position).normalize()
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(BASE_POSITION, LOOK_TARGET)
    }
}

/// Perspective projection parameters, resized with the window.
#[derive(Clone, Copy, Debug)]
pub struct Projection {
    pub aspect: f32,
    pub fovy: Rad<f32>,
    pub znear: f32,
    pub zfar: f32,
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

    /// Keeps the aspect ratio in sync with the viewport. Must be called on
    /// every resize; a stale aspect ratio distorts the image.
    pub fn resize(&mut self, width: u32, height: u32) {
        self.aspect = width as f32 / height as f32;
    }

    pub fn calc_matrix(&self) -> Matrix4<f32> {
        OPENGL_TO_WGPU_MATRIX * perspective(self.fovy, self.aspect, self.znear, self.zfar)
    }
}

/// Maps the latest pointer sample to a camera offset.
///
/// The mapping is stateless: each event fully overwrites the previous offset,
/// there is no accumulation or damping. Horizontal motion is inverted (pointer
/// right moves the camera left) for a mirrored-parallax feel, vertical motion
/// is direct.
#[derive(Clone, Copy, Debug)]
pub struct ParallaxController {
    pub sensitivity: f32,
}

impl ParallaxController {
    pub fn new(sensitivity: f32) -> Self {
        Self { sensitivity }
    }

    /// Repositions the camera for a pointer at `(x, y)` in a viewport of
    /// `width` x `height` physical pixels. Only x and y move; z is fixed.
    pub fn handle_pointer(&self, camera: &mut Camera, x: f64, y: f64, width: f32, height: f32) {
        let dx = x as f32 - width / 2.0;
        let dy = y as f32 - height / 2.0;
        camera.position.x = camera.base.x - dx * self.sensitivity;
        camera.position.y = camera.base.y + dy * self.sensitivity;
    }
}

impl Default for ParallaxController {
    fn default() -> Self {
        Self::new(POINTER_SENSITIVITY)
    }
}

/// The camera data laid out for the GPU.
#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CameraUniform {
    view_position: [f32; 4],
    view_proj: [[f32; 4]; 4],
}

impl CameraUniform {
    pub fn new() -> Self {
        Self {
            view_position: [0.0; 4],
            view_proj: Matrix4::identity().into(),
        }
    }

    pub fn update_view_proj(&mut self, camera: &Camera, projection: &Projection) {
        self.view_position = camera.position.to_homogeneous().into();
        self.view_proj = (projection.calc_matrix() * camera.calc_matrix()).into();
    }
}

impl Default for CameraUniform {
    fn default() -> Self {
        Self::new()
    }
}

/// Camera state bundled with its GPU-side resources.
#[derive(Debug)]
pub struct CameraResources {
    pub camera: Camera,
    pub controller: ParallaxController,
    pub uniform: CameraUniform,
    pub buffer: wgpu::Buffer,
    pub bind_group: wgpu::BindGroup,
    pub bind_group_layout: wgpu::BindGroupLayout,
}
