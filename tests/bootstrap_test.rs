use std::{thread, time::Duration};

use cgmath::{MetricSpace, Point3, Vector3};
use flow_scene::{
    Bootstrapper, EngineOptions, HostEvent, SurfaceSize,
    camera::{ControlInput, ControlKey},
    data_structures::mesh::MeshShape,
};

use crate::common::test_utils::{FakeHost, RecordingBackend};

mod common;

fn bootstrap(host: &FakeHost) -> Bootstrapper<FakeHost, RecordingBackend> {
    Bootstrapper::initialize(host.clone(), EngineOptions::default(), |_, ()| {
        Ok(RecordingBackend::default())
    })
    .expect("bootstrap should succeed")
}

#[test]
fn creates_exactly_one_game_canvas() {
    let host = FakeHost::new(800, 600);
    let app = bootstrap(&host);

    assert_eq!(host.elements_with_id("gameCanvas"), 1);
    assert_eq!(app.engine().surface().id(), "gameCanvas");
    assert!(app.is_running());
}

#[test]
fn load_sizes_the_surface_without_resizing_the_engine() {
    let host = FakeHost::new(800, 600);
    let mut app = bootstrap(&host);

    app.handle_event(HostEvent::Load);

    assert_eq!(app.engine().surface().size(), SurfaceSize::new(800, 600));
    assert_eq!(host.applied_sizes(), vec![SurfaceSize::new(800, 600)]);
    assert!(app.engine().backend().resizes.is_empty());
}

#[test]
fn every_resize_tracks_the_viewport_and_resizes_the_engine_once() {
    let host = FakeHost::new(800, 600);
    let mut app = bootstrap(&host);
    app.handle_event(HostEvent::Load);

    host.set_viewport(1024, 768);
    app.handle_event(HostEvent::Resize);
    assert_eq!(app.engine().surface().size(), SurfaceSize::new(1024, 768));
    assert_eq!(app.engine().backend().resizes, vec![SurfaceSize::new(1024, 768)]);

    host.set_viewport(320, 240);
    app.handle_event(HostEvent::Resize);
    app.handle_event(HostEvent::Resize);
    assert_eq!(app.engine().surface().size(), SurfaceSize::new(320, 240));
    assert_eq!(
        app.engine().backend().resizes,
        vec![
            SurfaceSize::new(1024, 768),
            SurfaceSize::new(320, 240),
            SurfaceSize::new(320, 240),
        ]
    );
}

#[test]
fn builds_the_demo_scene() {
    let host = FakeHost::new(800, 600);
    let app = bootstrap(&host);
    let scene = app.scene();

    let camera = scene.camera();
    assert_eq!(camera.name(), "freeCamera");
    assert_eq!(camera.position(), Point3::new(-10.0, 5.0, 3.0));
    assert_eq!(camera.target(), Point3::new(0.0, 0.0, 0.0));
    assert_eq!(camera.attached_to(), Some("gameCanvas"));

    let light = scene.light();
    assert_eq!(light.name, "skyLight");
    assert_eq!(light.direction, Vector3::new(0.0, 1.0, 0.0));
    assert_eq!(light.intensity, 1.0);

    let sphere = scene.mesh("sphere").expect("sphere");
    assert_eq!(
        sphere.shape,
        MeshShape::Sphere {
            segments: 16,
            diameter: 2.0
        }
    );
    let ground = scene.mesh("groundPlane").expect("ground");
    assert_eq!(
        ground.shape,
        MeshShape::Ground {
            width: 6.0,
            height: 6.0,
            subdivisions: 2
        }
    );
    assert_eq!(scene.meshes().len(), 2);
}

#[test]
fn every_frame_draws_the_scene_once() {
    let host = FakeHost::new(800, 600);
    let mut app = bootstrap(&host);
    app.handle_event(HostEvent::Load);

    for _ in 0..3 {
        app.handle_event(HostEvent::Frame);
    }

    let draws = &app.engine().backend().draws;
    assert_eq!(draws.len(), 3);
    assert_eq!(draws[0].meshes, vec!["sphere", "groundPlane"]);
    assert_eq!(draws[0].light_direction, Vector3::new(0.0, 1.0, 0.0));
    assert_eq!(app.engine().frame_count(), 3);
}

#[test]
fn stopping_the_render_loop_halts_drawing() {
    let host = FakeHost::new(800, 600);
    let mut app = bootstrap(&host);
    app.handle_event(HostEvent::Frame);

    app.render_loop().stop();
    app.handle_event(HostEvent::Frame);
    app.handle_event(HostEvent::Frame);

    assert!(!app.is_running());
    assert_eq!(app.engine().backend().draws.len(), 1);
}

#[test]
fn draw_errors_do_not_stop_the_loop() {
    let host = FakeHost::new(800, 600);
    let mut app = bootstrap(&host);
    app.engine_mut().backend_mut().fail_draws = true;

    app.handle_event(HostEvent::Frame);
    app.handle_event(HostEvent::Frame);

    assert!(app.is_running());
    assert_eq!(app.engine().backend().draws.len(), 2);
}

#[test]
fn second_initialize_on_the_same_document_fails() {
    let host = FakeHost::new(800, 600);
    let _first = bootstrap(&host);

    let second = Bootstrapper::initialize(
        host.sharing_document(),
        EngineOptions::default(),
        |_, ()| Ok(RecordingBackend::default()),
    );

    let err = second.err().expect("a second surface with the same id must be rejected");
    assert!(format!("{:#}", err).contains("gameCanvas"));
    assert_eq!(host.elements_with_id("gameCanvas"), 1);
}

#[test]
fn connect_failures_are_fatal() {
    let host = FakeHost::new(800, 600);

    let result = Bootstrapper::<_, RecordingBackend>::initialize(
        host.clone(),
        EngineOptions::default(),
        |_, ()| anyhow::bail!("no adapter found"),
    );

    let err = result.err().expect("initialize should fail");
    assert!(format!("{:#}", err).contains("no adapter found"));
}

#[test]
fn custom_canvas_ids_are_honoured() {
    let host = FakeHost::new(800, 600);
    let options = EngineOptions {
        canvas_id: "renderCanvas".to_string(),
        antialias: false,
    };

    let app = Bootstrapper::initialize(host.clone(), options, |_, ()| {
        Ok(RecordingBackend::default())
    })
    .expect("bootstrap should succeed");

    assert_eq!(host.elements_with_id("renderCanvas"), 1);
    assert_eq!(host.elements_with_id("gameCanvas"), 0);
    assert_eq!(app.scene().camera().attached_to(), Some("renderCanvas"));
}

#[test]
fn keyboard_input_moves_the_camera_on_the_next_frame() {
    let host = FakeHost::new(800, 600);
    let mut app = bootstrap(&host);
    let start = app.scene().camera().position();

    app.handle_event(HostEvent::Input(ControlInput::Key {
        key: ControlKey::Forward,
        pressed: true,
    }));
    thread::sleep(Duration::from_millis(10));
    app.handle_event(HostEvent::Frame);

    let moved = app.scene().camera().position();
    assert!(moved.distance(start) > 0.0);
    // Moving forward approaches the origin the camera looks at.
    assert!(moved.distance(Point3::new(0.0, 0.0, 0.0)) < start.distance(Point3::new(0.0, 0.0, 0.0)));
    let last = app.engine().backend().draws.last().expect("a draw");
    assert_eq!(last.camera_position, moved);
}

#[test]
fn pointer_motion_without_dragging_leaves_the_camera_alone() {
    let host = FakeHost::new(800, 600);
    let mut app = bootstrap(&host);
    let pose = app.scene().camera().pose();

    app.handle_event(HostEvent::Input(ControlInput::PointerMotion { dx: 40.0, dy: 10.0 }));
    app.handle_event(HostEvent::Frame);
    assert_eq!(app.scene().camera().pose(), pose);

    app.handle_event(HostEvent::Input(ControlInput::PointerButton { pressed: true }));
    app.handle_event(HostEvent::Input(ControlInput::PointerMotion { dx: 40.0, dy: 10.0 }));
    app.handle_event(HostEvent::Frame);
    let rotated = app.scene().camera().pose();
    assert_eq!(rotated.position, pose.position);
    assert_ne!(rotated.target, pose.target);
}

#[test]
fn setup_time_does_not_count_towards_the_first_frame() {
    let host = FakeHost::new(800, 600);
    let mut app = bootstrap(&host);
    let start = app.scene().camera().position();

    app.handle_event(HostEvent::Input(ControlInput::Key {
        key: ControlKey::Forward,
        pressed: true,
    }));
    // A slow GPU connection between initialize and load.
    thread::sleep(Duration::from_millis(300));
    app.handle_event(HostEvent::Load);
    app.handle_event(HostEvent::Frame);

    // Counting the sleep would move the camera 3 units at 10 units per second.
    assert!(app.scene().camera().position().distance(start) < 1.0);
}
