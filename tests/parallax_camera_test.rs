use cgmath::Point3;
use coffee_scene::camera::{
    BASE_POSITION, Camera, FOVY, LOOK_TARGET, ParallaxController, Projection, ZFAR, ZNEAR,
};

const WIDTH: f32 = 1000.0;
const HEIGHT: f32 = 800.0;

fn assert_close(actual: f32, expected: f32) {
    assert!(
        (actual - expected).abs() < 1e-3,
        "expected {expected}, got {actual}"
    );
}

#[test]
fn should_map_pointer_offset_to_camera_position() {
    let mut camera = Camera::default();
    let controller = ParallaxController::default();

    // 100 px right of center, 100 px above center.
    controller.handle_pointer(&mut camera, 600.0, 300.0, WIDTH, HEIGHT);

    assert_close(camera.position.x, -15.0);
    assert_close(camera.position.y, 180.0);
    assert_close(camera.position.z, BASE_POSITION.z);
}

#[test]
fn should_invert_horizontal_motion_only() {
    let mut camera = Camera::default();
    let controller = ParallaxController::default();

    // Pointer right of center moves the camera left of base.
    controller.handle_pointer(&mut camera, WIDTH as f64, 400.0, WIDTH, HEIGHT);
    assert!(camera.position.x < BASE_POSITION.x);

    // Pointer below center moves the camera up (y grows downwards on screen).
    controller.handle_pointer(&mut camera, 500.0, HEIGHT as f64, WIDTH, HEIGHT);
    assert!(camera.position.y > BASE_POSITION.y);
}

#[test]
fn should_overwrite_rather_than_accumulate() {
    let mut camera = Camera::default();
    let controller = ParallaxController::default();

    // Many events in a row must not compound.
    for _ in 0..10 {
        controller.handle_pointer(&mut camera, 600.0, 300.0, WIDTH, HEIGHT);
    }
    assert_close(camera.position.x, -15.0);
    assert_close(camera.position.y, 180.0);

    // Returning to the center restores the base position exactly.
    controller.handle_pointer(&mut camera, 500.0, 400.0, WIDTH, HEIGHT);
    assert_close(camera.position.x, BASE_POSITION.x);
    assert_close(camera.position.y, BASE_POSITION.y);
}

#[test]
fn should_keep_the_look_target_fixed_while_panning() {
    let mut camera = Camera::default();
    let controller = ParallaxController::default();

    assert_eq!(camera.target, Point3::new(5.0, 130.0, 0.0));

    controller.handle_pointer(&mut camera, 0.0, 0.0, WIDTH, HEIGHT);
    assert_eq!(camera.target, LOOK_TARGET);
    controller.handle_pointer(&mut camera, WIDTH as f64, HEIGHT as f64, WIDTH, HEIGHT);
    assert_eq!(camera.target, LOOK_TARGET);

    // Bottom-right corner: the camera ends up at (-95, 280, 400), so looking
    // at (5, 130, 0) means a forward vector of normalize((100, -150, -400)).
    assert_close(camera.position.x, -95.0);
    assert_close(camera.position.y, 280.0);
    let forward = camera.forward();
    assert_close(forward.x, 0.22792);
    assert_close(forward.y, -0.34188);
    assert_close(forward.z, -0.91169);
}

#[test]
fn should_track_viewport_aspect_on_resize() {
    let mut projection = Projection::new(1000, 800, FOVY, ZNEAR, ZFAR);
    assert_eq!(projection.aspect, 1000.0 / 800.0);

    projection.resize(1920, 1080);
    assert_eq!(projection.aspect, 1920.0 / 1080.0);

    // Resizing to the same dimensions is idempotent.
    projection.resize(1920, 1080);
    assert_eq!(projection.aspect, 1920.0 / 1080.0);
}
