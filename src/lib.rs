//! coffee-scene
//!
//! A small cross-platform (native and WASM) viewer built on wgpu that renders
//! a static coffee tabletop scene: a loaded mesh asset with per-part
//! materials, soft shadow-mapped lighting, and a perspective camera that
//! follows the pointer for a parallax depth cue.
//!
//! High-level modules
//! - `app`: winit event loop, async scene load, pointer/resize handling
//! - `assembler`: one-shot scene configuration after the asset finishes loading
//! - `camera`: camera, projection and the pointer parallax controller
//! - `context`: central GPU and window context that owns device/queue/pipelines
//! - `data_structures`: scene nodes, instances, meshes, materials, textures
//! - `pipelines`: shaded scene pipeline and depth-only shadow pipeline
//! - `render`: batching of the static scene into instanced GPU draws
//! - `resources`: glTF and texture loading for native and the web
//!

pub mod app;
pub mod assembler;
pub mod camera;
pub mod context;
pub mod data_structures;
pub mod pipelines;
pub mod render;
pub mod resources;

// Re-exports commonly used types for convenience in downstream code.
pub use cgmath::*;
pub use winit::dpi::PhysicalPosition;
pub use winit::event::WindowEvent;
