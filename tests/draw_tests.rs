use contraption::{
    DVec2, DrawCall, DrawableState, Graphics, MachineDrawable, MachineError, MachineSystem,
    RecordingGraphics,
};

const RESOURCES: &str = "resources";

fn is_pulley_face(call: &DrawCall) -> bool {
    matches!(call, DrawCall::DrawImage { image, .. } if image.contains("/pulley"))
}

#[test]
fn test_belts_are_drawn_before_pulley_faces() {
    let mut system = MachineSystem::with_builtin_factories(RESOURCES);
    for number in [1, 2] {
        system.choose_machine(number).expect("machine");
        system.set_machine_frame(15).expect("seek");

        let mut gfx = RecordingGraphics::new();
        system.draw_machine(&mut gfx).expect("draw");
        let calls = gfx.calls();

        let last_belt = calls
            .iter()
            .rposition(|call| matches!(call, DrawCall::StrokeLine(..)))
            .expect("machines with belts stroke them");
        let first_face = calls
            .iter()
            .position(is_pulley_face)
            .expect("pulley faces are drawn");
        assert!(last_belt < first_face, "machine {number}: belt after a pulley face");
        assert_eq!(gfx.depth(), 0, "push/pop must balance");
    }
}

#[test]
fn test_machine_frame_is_flipped_to_y_up() {
    let mut system = MachineSystem::with_builtin_factories(RESOURCES);
    system.choose_machine(2).expect("machine 2");
    system.set_location(DVec2::new(400.0, 500.0)).expect("location");

    let mut gfx = RecordingGraphics::new();
    system.draw_machine(&mut gfx).expect("draw");
    assert_eq!(
        &gfx.calls()[..3],
        &[
            DrawCall::PushState,
            DrawCall::Translate(DVec2::new(400.0, 500.0)),
            DrawCall::Scale(DVec2::new(1.0, -1.0)),
        ]
    );
}

#[test]
fn test_missing_images_do_not_stop_drawing() {
    let mut system = MachineSystem::with_builtin_factories(RESOURCES);
    system.choose_machine(2).expect("machine 2");

    let mut gfx = RecordingGraphics::new();
    gfx.mark_missing(format!("{RESOURCES}/images/basketball.png"));
    system.draw_machine(&mut gfx).expect("draw");

    assert!(gfx.images().all(|image| !image.ends_with("basketball.png")));
    assert!(gfx
        .calls()
        .iter()
        .any(|call| matches!(call, DrawCall::StrokePolygon(_))));
    assert!(gfx.position_of_image(&format!("{RESOURCES}/images/floor.png")).is_some());
}

#[test]
fn test_idle_motor_shows_idle_frame_only() {
    let mut system = MachineSystem::with_builtin_factories(RESOURCES);
    system.choose_machine(2).expect("machine 2");

    let mut gfx = RecordingGraphics::new();
    system.draw_machine(&mut gfx).expect("draw");
    let images: Vec<_> = gfx.images().collect();
    assert!(images.iter().any(|image| image.ends_with("motor-idle.png")));
    assert!(!images.iter().any(|image| image.ends_with("wheel.png")));
}

#[test]
fn test_drawable_attributes_round_trip() {
    let mut drawable =
        MachineDrawable::new(MachineSystem::with_builtin_factories(RESOURCES)).expect("drawable");
    assert_eq!(
        drawable.to_attributes(),
        vec![
            ("machine".to_string(), "1".to_string()),
            ("startframe".to_string(), "0".to_string()),
            ("scale".to_string(), "0.750000".to_string()),
        ]
    );

    drawable
        .from_attributes([("machine", "2"), ("startframe", "15"), ("scale", "1.5")])
        .expect("valid attributes");
    assert_eq!(
        drawable.state(),
        DrawableState {
            machine: 2,
            start_frame: 15,
            scale: 1.5
        }
    );
    assert_eq!(drawable.system().machine_number(), 2);

    drawable
        .from_attributes(Vec::<(String, String)>::new())
        .expect("defaults");
    assert_eq!(drawable.state(), DrawableState::default());

    assert!(matches!(
        drawable.from_attributes([("scale", "wide")]),
        Err(MachineError::InvalidAttribute { name, .. }) if name == "scale"
    ));
    assert!(drawable.from_attributes([("machine", "0")]).is_err());
}

#[test]
fn test_timeline_frames_are_offset_by_start_frame() {
    let mut drawable =
        MachineDrawable::new(MachineSystem::with_builtin_factories(RESOURCES)).expect("drawable");
    drawable.set_machine_number(2).expect("machine 2");
    drawable.set_start_frame(30);

    drawable.set_timeline_frame(10).expect("before start");
    assert_eq!(drawable.system().machine_frame(), 0);
    drawable.set_timeline_frame(45).expect("after start");
    assert_eq!(drawable.system().machine_frame(), 15);
}

#[test]
fn test_hit_box_stands_on_placed_position() {
    let mut drawable = MachineDrawable::new(MachineSystem::new()).expect("drawable");
    drawable.set_placed_position(DVec2::new(100.0, 700.0));
    drawable.set_scale(0.5);

    assert!(drawable.hit_test(DVec2::new(100.0, 500.0)));
    assert!(drawable.hit_test(DVec2::new(51.0, 401.0)));
    assert!(!drawable.hit_test(DVec2::new(100.0, 710.0)));
    assert!(!drawable.hit_test(DVec2::new(160.0, 500.0)));
    assert!(!drawable.hit_test(DVec2::new(100.0, 390.0)));
}

#[test]
fn test_drawable_places_and_scales_the_machine() {
    let mut drawable =
        MachineDrawable::new(MachineSystem::with_builtin_factories(RESOURCES)).expect("drawable");
    drawable.set_machine_number(2).expect("machine 2");
    drawable.set_placed_position(DVec2::new(300.0, 650.0));

    let mut gfx = RecordingGraphics::new();
    drawable.draw(&mut gfx).expect("draw");
    let calls = gfx.calls();
    assert_eq!(calls[1], DrawCall::Translate(DVec2::new(300.0, 650.0)));
    assert_eq!(calls[2], DrawCall::Scale(DVec2::new(0.75, 0.75)));
    assert_eq!(calls[4], DrawCall::Translate(DVec2::ZERO));
    assert_eq!(gfx.depth(), 0);

    let mut custom = RecordingGraphics::new();
    custom.push_state();
    drawable.draw(&mut custom).expect("draw");
    assert_eq!(custom.depth(), 1);
}
