//! Shared, immutable shading parameters.
//!
//! Exactly two materials exist per session: the textured goblet material and
//! the solid dark couvert material. Both are created once at load time and
//! shared by `Arc` across every node that uses them, never cloned per node,
//! so an edit at creation time affects all instances.

use crate::data_structures::texture::Texture;

/// Immutable-after-construction shading parameters.
#[derive(Debug)]
pub struct Material {
    pub name: String,
    pub base_color: [f32; 3],
    pub roughness: f32,
    /// Optional colour map. `None` renders the plain `base_color`.
    pub map: Option<Texture>,
}

impl Material {
    pub fn textured(name: &str, map: Texture, roughness: f32) -> Self {
        Self {
            name: name.to_string(),
            base_color: [1.0, 1.0, 1.0],
            roughness,
            map: Some(map),
        }
    }

    pub fn solid(name: &str, base_color: [f32; 3], roughness: f32) -> Self {
        Self {
            name: name.to_string(),
            base_color,
            roughness,
            map: None,
        }
    }
}

/// Material parameters as laid out for the fragment shader.
#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct MaterialUniform {
    pub base_color: [f32; 3],
    pub roughness: f32,
    pub receive_shadow: u32,
    pub _padding: [u32; 3],
}

impl MaterialUniform {
    pub fn new(material: &Material, receive_shadow: bool) -> Self {
        Self {
            base_color: material.base_color,
            roughness: material.roughness,
            receive_shadow: receive_shadow as u32,
            _padding: [0; 3],
        }
    }
}
