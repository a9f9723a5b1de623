//! Render pipeline definitions.
//!
//! - `scene` is the shaded main pass (hemisphere ambient, per-light shading,
//!   PCF shadow sampling)
//! - `shadow` is the depth-only pass rendering each light's shadow map

pub mod scene;
pub mod shadow;
