//! Light configuration and GPU uniforms.
//!
//! Light nodes carry per-node shadow projection parameters: the frustum of
//! the shadow camera, the blur sample count and radius for soft edges, and a
//! depth bias. Bias and radius are independently tunable per node, because a
//! frontal key light and a shallow-angle fill light need different bias
//! values to avoid shadow acne on one end and peter-panning on the other.

use cgmath::{EuclideanSpace, InnerSpace, Matrix4, Point3, SquareMatrix, Vector3, ortho,
             perspective};

use crate::camera::OPENGL_TO_WGPU_MATRIX;
use crate::data_structures::instance::Instance;

/// Upper bound of lights the shader supports. Additional lights in the
/// asset are ignored with a warning.
pub const MAX_LIGHTS: usize = 4;

/// Field of view used by spot (fill) light shadow cameras.
const SPOT_SHADOW_FOVY: cgmath::Deg<f32> = cgmath::Deg(60.0);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LightKind {
    /// Parallel light with an orthographic shadow frustum.
    Directional,
    /// Positional fill light with a perspective shadow frustum.
    Spot,
}

/// The bounding volume and sampling parameters of one light's shadow map.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ShadowProjection {
    pub near: f32,
    pub far: f32,
    pub left: f32,
    pub right: f32,
    pub top: f32,
    pub bottom: f32,
    /// Number of PCF taps per fragment. More taps, softer and slower.
    pub blur_samples: u32,
    /// Tap spread in shadow-map texels.
    pub radius: f32,
    /// Depth offset applied when comparing; small and negative suppresses
    /// self-shadowing without opening a visible gap.
    pub bias: f32,
}

impl Default for ShadowProjection {
    fn default() -> Self {
        Self {
            near: 0.5,
            far: 500.0,
            left: -20.0,
            right: 20.0,
            top: 20.0,
            bottom: -20.0,
            blur_samples: 1,
            radius: 1.0,
            bias: -0.002,
        }
    }
}

/// Per-node light parameters, mutated by the scene assembler.
#[derive(Clone, Debug)]
pub struct LightConfig {
    pub kind: LightKind,
    pub color: [f32; 3],
    pub intensity: f32,
    pub cast_shadow: bool,
    pub shadow: ShadowProjection,
}

impl LightConfig {
    pub fn directional() -> Self {
        Self {
            kind: LightKind::Directional,
            color: [1.0, 1.0, 1.0],
            intensity: 1.0,
            cast_shadow: false,
            shadow: ShadowProjection::default(),
        }
    }

    pub fn spot() -> Self {
        Self {
            kind: LightKind::Spot,
            ..Self::directional()
        }
    }

    /// Shadow camera matrix for a light placed at `world.position`, aimed at
    /// the scene origin.
    pub fn shadow_view_proj(&self, world: &Instance) -> Matrix4<f32> {
        let eye = Point3::from_vec(world.position);
        let target = Point3::new(0.0, 0.0, 0.0);
        let dir = (target - eye).normalize();
        // Overhead lights would be degenerate with a y-up vector.
        let up = if dir.dot(Vector3::unit_y()).abs() > 0.99 {
            Vector3::unit_z()
        } else {
            Vector3::unit_y()
        };
        let view = Matrix4::look_at_rh(eye, target, up);
        let s = &self.shadow;
        let proj = match self.kind {
            LightKind::Directional => ortho(s.left, s.right, s.bottom, s.top, s.near, s.far),
            LightKind::Spot => perspective(SPOT_SHADOW_FOVY, 1.0, s.near, s.far),
        };
        OPENGL_TO_WGPU_MATRIX * proj * view
    }
}

/// Constant ambient term modelled as a sky/ground gradient.
#[derive(Clone, Copy, Debug)]
pub struct HemisphereLight {
    pub sky_color: [f32; 3],
    pub ground_color: [f32; 3],
    pub intensity: f32,
}

/// One light as laid out for the shader. 112 bytes, 16-byte aligned rows.
#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct LightRaw {
    pub view_proj: [[f32; 4]; 4],
    pub position: [f32; 3],
    pub intensity: f32,
    pub color: [f32; 3],
    pub radius: f32,
    pub bias: f32,
    pub blur_samples: u32,
    pub cast_shadow: u32,
    pub _padding: u32,
}

impl LightRaw {
    pub fn new(config: &LightConfig, world: &Instance) -> Self {
        Self {
            view_proj: config.shadow_view_proj(world).into(),
            position: world.position.into(),
            intensity: config.intensity,
            color: config.color,
            radius: config.shadow.radius,
            bias: config.shadow.bias,
            blur_samples: config.shadow.blur_samples,
            cast_shadow: config.cast_shadow as u32,
            _padding: 0,
        }
    }

    fn empty() -> Self {
        Self {
            view_proj: Matrix4::identity().into(),
            position: [0.0; 3],
            intensity: 0.0,
            color: [0.0; 3],
            radius: 0.0,
            bias: 0.0,
            blur_samples: 0,
            cast_shadow: 0,
            _padding: 0,
        }
    }
}

/// The whole lighting environment in one uniform buffer.
#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct LightsUniform {
    pub lights: [LightRaw; MAX_LIGHTS],
    pub sky_color: [f32; 3],
    pub count: u32,
    pub ground_color: [f32; 3],
    pub ambient_intensity: f32,
}

impl LightsUniform {
    pub fn new(lights: &[(LightConfig, Instance)], hemisphere: &HemisphereLight) -> Self {
        if lights.len() > MAX_LIGHTS {
            log::warn!(
                "scene has {} lights but only {} are supported, ignoring the rest",
                lights.len(),
                MAX_LIGHTS
            );
        }
        let mut packed = [LightRaw::empty(); MAX_LIGHTS];
        for (slot, (config, world)) in packed.iter_mut().zip(lights.iter()) {
            *slot = LightRaw::new(config, world);
        }
        Self {
            lights: packed,
            sky_color: hemisphere.sky_color,
            count: lights.len().min(MAX_LIGHTS) as u32,
            ground_color: hemisphere.ground_color,
            ambient_intensity: hemisphere.intensity,
        }
    }
}
