use std::sync::Arc;

use cgmath::Vector3;
use coffee_scene::{
    assembler::{
        self, FILL_LIGHT_BIAS, FILL_LIGHT_INTENSITY, KEY_LIGHT_BIAS, KEY_LIGHT_POSITION,
        SHADOW_BLUR_SAMPLES, SHADOW_EXTENT, SHADOW_FAR, SHADOW_NEAR, SHADOW_RADIUS,
    },
    data_structures::{
        light::{LightConfig, LightKind},
        material::Material,
        node::{Node, NodeKind},
    },
    render::{collect_lights, plan_batches},
};

const GOBLET_MESH: usize = 0;
const COUVERT_MESH: usize = 1;

fn materials() -> (Arc<Material>, Arc<Material>) {
    (
        Arc::new(Material::solid("goblet", [1.0, 1.0, 1.0], 0.5)),
        Arc::new(Material::solid("couvert", [0.08, 0.08, 0.08], 0.3)),
    )
}

/// A hierarchy in the shape the loader produces: the light rig comes out of
/// the asset untyped (plain transforms), the goblets are repeated mesh nodes
/// each carrying its couvert as child 0.
fn sample_root(goblet_count: usize, goblet_spacing: f32) -> Node {
    let mut rig = Node::group("lights");
    for (i, offset) in [
        Vector3::new(-300.0, -400.0, 100.0),
        Vector3::new(300.0, -400.0, 100.0),
    ]
    .into_iter()
    .enumerate()
    {
        let mut fill = Node::group(&format!("fill-{i}"));
        fill.transform.position = offset;
        rig.children.push(fill);
    }

    let mut container = Node::group("goblets");
    container.transform.position = Vector3::new(10.0, 0.0, 0.0);
    for i in 0..goblet_count {
        let mut goblet = Node::mesh(&format!("goblet-{i}"), GOBLET_MESH);
        goblet.transform.position = Vector3::new(i as f32 * goblet_spacing, 0.0, 0.0);
        let mut couvert = Node::mesh(&format!("couvert-{i}"), COUVERT_MESH);
        couvert.transform.position = Vector3::new(0.0, 50.0, 0.0);
        goblet.children.push(couvert);
        container.children.push(goblet);
    }

    let mut root = Node::group("scene");
    root.children.push(rig);
    root.children.push(container);
    root
}

fn assembled(goblet_count: usize, spacing: f32) -> (Node, Arc<Material>, Arc<Material>) {
    let mut root = sample_root(goblet_count, spacing);
    let (goblet_material, couvert_material) = materials();
    assembler::assemble(&mut root, &goblet_material, &couvert_material).unwrap();
    (root, goblet_material, couvert_material)
}

fn light_config(node: &Node) -> &LightConfig {
    match &node.kind {
        NodeKind::Light(config) => config,
        other => panic!("expected a light node, found {other:?}"),
    }
}

#[test]
fn should_place_and_configure_the_key_light() {
    let (root, _, _) = assembled(3, 100.0);
    let rig = root.child(0).unwrap();

    assert_eq!(rig.transform.position, KEY_LIGHT_POSITION);

    let key = light_config(rig);
    assert_eq!(key.kind, LightKind::Directional);
    assert!(key.cast_shadow);
    assert_eq!(key.shadow.near, SHADOW_NEAR);
    assert_eq!(key.shadow.far, SHADOW_FAR);
    assert_eq!(key.shadow.left, -SHADOW_EXTENT);
    assert_eq!(key.shadow.right, SHADOW_EXTENT);
    assert_eq!(key.shadow.top, SHADOW_EXTENT);
    assert_eq!(key.shadow.bottom, -SHADOW_EXTENT);
    assert_eq!(key.shadow.blur_samples, SHADOW_BLUR_SAMPLES);
    assert_eq!(key.shadow.radius, SHADOW_RADIUS);
    assert_eq!(key.shadow.bias, KEY_LIGHT_BIAS);
}

#[test]
fn should_configure_fill_lights_with_their_own_bias() {
    let (root, _, _) = assembled(3, 100.0);
    let rig = root.child(0).unwrap();

    assert_eq!(rig.children.len(), 2);
    for fill in &rig.children {
        let fill = light_config(fill);
        assert_eq!(fill.kind, LightKind::Spot);
        assert_eq!(fill.intensity, FILL_LIGHT_INTENSITY);
        assert!(fill.cast_shadow);
        assert_eq!(fill.shadow.blur_samples, SHADOW_BLUR_SAMPLES);
        assert_eq!(fill.shadow.radius, SHADOW_RADIUS);
        assert_eq!(fill.shadow.bias, FILL_LIGHT_BIAS);
    }
}

#[test]
fn should_flag_every_goblet_and_couvert_for_shadows() {
    let (root, _, _) = assembled(3, 100.0);
    let container = root.child(1).unwrap();

    assert_eq!(container.children.len(), 3);
    for goblet in &container.children {
        assert!(goblet.shadow.cast);
        assert!(goblet.shadow.receive);
        let couvert = goblet.child(0).unwrap();
        assert!(couvert.shadow.cast);
        assert!(couvert.shadow.receive);
    }
}

#[test]
fn should_share_materials_by_reference() {
    let (root, goblet_material, couvert_material) = assembled(3, 100.0);
    let container = root.child(1).unwrap();

    for goblet in &container.children {
        let assigned = goblet.material.as_ref().unwrap();
        assert!(Arc::ptr_eq(assigned, &goblet_material));

        let couvert = goblet.child(0).unwrap().material.as_ref().unwrap();
        assert!(Arc::ptr_eq(couvert, &couvert_material));
        assert!(!Arc::ptr_eq(assigned, couvert));
    }

    // One shared allocation per material: the local handle plus one
    // reference per assigned node.
    assert_eq!(Arc::strong_count(&goblet_material), 4);
    assert_eq!(Arc::strong_count(&couvert_material), 4);
}

#[test]
fn should_reject_a_root_without_the_model_container() {
    let mut root = Node::group("scene");
    root.children.push(Node::group("lights"));
    let (goblet_material, couvert_material) = materials();

    let err = assembler::assemble(&mut root, &goblet_material, &couvert_material).unwrap_err();
    assert!(err.to_string().contains("child 1"), "{err}");
}

#[test]
fn should_reject_a_goblet_without_its_couvert() {
    let mut root = sample_root(2, 100.0);
    root.child_mut(1).unwrap().child_mut(1).unwrap().children.clear();
    let (goblet_material, couvert_material) = materials();

    let err = assembler::assemble(&mut root, &goblet_material, &couvert_material).unwrap_err();
    assert!(err.to_string().contains("couvert"), "{err}");
}

#[test]
fn should_batch_repeated_parts_into_instanced_draws() {
    let (root, goblet_material, couvert_material) = assembled(3, 100.0);

    let mut plans = plan_batches(&root);
    assert_eq!(plans.len(), 2);
    plans.sort_by_key(|plan| plan.mesh);

    let goblets = &plans[0];
    assert_eq!(goblets.mesh, GOBLET_MESH);
    assert!(Arc::ptr_eq(&goblets.material, &goblet_material));
    assert_eq!(goblets.instances.len(), 3);
    // World transforms compose through the container.
    assert_eq!(
        goblets.instances[1].position,
        Vector3::new(110.0, 0.0, 0.0)
    );

    let couverts = &plans[1];
    assert_eq!(couverts.mesh, COUVERT_MESH);
    assert!(Arc::ptr_eq(&couverts.material, &couvert_material));
    assert_eq!(couverts.instances.len(), 3);
    assert_eq!(
        couverts.instances[1].position,
        Vector3::new(110.0, 50.0, 0.0)
    );
}

#[test]
fn should_collect_lights_with_world_transforms() {
    let (root, _, _) = assembled(3, 100.0);

    let lights = collect_lights(&root);
    assert_eq!(lights.len(), 3);

    // The key light comes first, its fills after, in tree order.
    let (key, key_world) = &lights[0];
    assert_eq!(key.kind, LightKind::Directional);
    assert_eq!(key_world.position, KEY_LIGHT_POSITION);

    let (fill, fill_world) = &lights[1];
    assert_eq!(fill.kind, LightKind::Spot);
    assert_eq!(
        fill_world.position,
        KEY_LIGHT_POSITION + Vector3::new(-300.0, -400.0, 100.0)
    );
}

#[test]
fn should_keep_the_shadow_frustum_independent_of_scene_extent() {
    // Geometry far outside the frustum clips out of the shadow silently;
    // the frustum itself never grows to chase it.
    let (root, _, _) = assembled(5, 10_000.0);
    let key = light_config(root.child(0).unwrap());

    assert_eq!(key.shadow.left, -SHADOW_EXTENT);
    assert_eq!(key.shadow.right, SHADOW_EXTENT);
    assert_eq!(key.shadow.top, SHADOW_EXTENT);
    assert_eq!(key.shadow.bottom, -SHADOW_EXTENT);
}
