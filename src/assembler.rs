//! One-shot scene assembly after the asset finishes loading.
//!
//! The loaded hierarchy follows a fixed authoring convention: root child 0
//! is the light rig (a key light with fill lights as its children), root
//! child 1 is the container of goblet instances, and each goblet's child 0
//! is its couvert (lid). Assembly walks that shape, configures shadows and
//! lights, and attaches the two shared materials. Order matters: the steps
//! rely on the indices fixed by the asset.

use std::sync::Arc;

use anyhow::{Context as _, Result};
use cgmath::Vector3;

use crate::data_structures::{
    light::{HemisphereLight, LightConfig, ShadowProjection},
    material::Material,
    node::Node,
};

/// Key light world position, above and in front of the tabletop.
pub const KEY_LIGHT_POSITION: Vector3<f32> = Vector3::new(0.0, 700.0, 200.0);

/// Shadow frustum of the key light. The box must contain every
/// shadow-receiving node; geometry outside it clips silently (visually
/// detectable only, no error is raised).
pub const SHADOW_NEAR: f32 = 1.0;
pub const SHADOW_FAR: f32 = 2000.0;
pub const SHADOW_EXTENT: f32 = 50.0;

/// Shadow softness, traded off against per-fragment sampling cost.
pub const SHADOW_BLUR_SAMPLES: u32 = 25;
pub const SHADOW_RADIUS: f32 = 25.0;

/// Key light bias: just enough to suppress shadow acne.
pub const KEY_LIGHT_BIAS: f32 = -0.0005;
/// Fill lights sit at shallow angles and need a stronger bias.
pub const FILL_LIGHT_BIAS: f32 = -0.01;
pub const FILL_LIGHT_INTENSITY: f32 = 0.6;

/// The render-ready scene: the configured hierarchy plus the fixed
/// environment (clear colour and hemisphere ambient) of the session.
#[derive(Clone, Debug)]
pub struct Scene {
    pub root: Node,
    pub background: wgpu::Color,
    pub hemisphere: HemisphereLight,
}

impl Scene {
    /// Inserts a fully assembled hierarchy. Called once per load; inserting
    /// a second hierarchy would replace, not duplicate, the first.
    pub fn new(root: Node) -> Self {
        Self {
            root,
            background: wgpu::Color {
                r: 0x30 as f64 / 255.0,
                g: 0x30 as f64 / 255.0,
                b: 0x30 as f64 / 255.0,
                a: 1.0,
            },
            hemisphere: HemisphereLight {
                sky_color: [0xaa as f32 / 255.0; 3],
                ground_color: [0x55 as f32 / 255.0; 3],
                intensity: 2.0,
            },
        }
    }
}

/// Configures shadows, lights and materials on a freshly loaded hierarchy.
///
/// Fails with a descriptive error when the tree does not match the expected
/// two-child, goblet-to-couvert shape instead of indexing blindly.
pub fn assemble(
    root: &mut Node,
    goblet_material: &Arc<Material>,
    couvert_material: &Arc<Material>,
) -> Result<()> {
    configure_lights(
        root.child_mut(0)
            .context("scene root is missing the light rig at child 0")?,
    );
    configure_goblets(
        root.child_mut(1)
            .context("scene root is missing the model container at child 1")?,
        goblet_material,
        couvert_material,
    )
}

/// Step 1 and 2: the key light and its fill children.
fn configure_lights(rig: &mut Node) {
    rig.transform.position = KEY_LIGHT_POSITION;

    let key = rig.light_config_mut(LightConfig::directional());
    key.cast_shadow = true;
    key.shadow = ShadowProjection {
        near: SHADOW_NEAR,
        far: SHADOW_FAR,
        left: -SHADOW_EXTENT,
        right: SHADOW_EXTENT,
        top: SHADOW_EXTENT,
        bottom: -SHADOW_EXTENT,
        blur_samples: SHADOW_BLUR_SAMPLES,
        radius: SHADOW_RADIUS,
        bias: KEY_LIGHT_BIAS,
    };

    for child in &mut rig.children {
        let fill = child.light_config_mut(LightConfig::spot());
        fill.intensity = FILL_LIGHT_INTENSITY;
        fill.cast_shadow = true;
        fill.shadow.near = SHADOW_NEAR;
        fill.shadow.far = SHADOW_FAR;
        fill.shadow.blur_samples = SHADOW_BLUR_SAMPLES;
        fill.shadow.radius = SHADOW_RADIUS;
        fill.shadow.bias = FILL_LIGHT_BIAS;
    }
}

/// Step 3: every goblet and its couvert get both shadow flags and a shared
/// material reference. Materials are shared, never cloned per node.
fn configure_goblets(
    container: &mut Node,
    goblet_material: &Arc<Material>,
    couvert_material: &Arc<Material>,
) -> Result<()> {
    for (idx, goblet) in container.children.iter_mut().enumerate() {
        goblet.set_shadow(true, true);
        goblet.material = Some(Arc::clone(goblet_material));

        let couvert = goblet
            .child_mut(0)
            .with_context(|| format!("goblet {idx} is missing its couvert at child 0"))?;
        couvert.set_shadow(true, true);
        couvert.material = Some(Arc::clone(couvert_material));
    }
    Ok(())
}
