//! Viewer data structures: scene nodes, instances, meshes, materials, lights.
//!
//! - `node` is the retained scene graph the asset loads into
//! - `instance` holds per-node transforms and their GPU layout
//! - `mesh` contains vertex and mesh GPU types
//! - `material` holds the two shared, immutable materials of the session
//! - `light` contains light configuration and lighting uniforms
//! - `texture` wraps GPU textures (colour maps, depth, shadow maps)

pub mod instance;
pub mod light;
pub mod material;
pub mod mesh;
pub mod node;
pub mod texture;
