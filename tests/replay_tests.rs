use approx::assert_relative_eq;
use contraption::{
    utils::math::frac, DVec2, Machine, Machine2Factory, MachineFactory, MachineSystem, ShapeKind,
};

const RESOURCES: &str = "resources";

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Pose of every body, in component order.
fn snapshot(machine: &Machine) -> Vec<(glam::Vec2, f32, glam::Vec2, f32)> {
    machine
        .components()
        .iter()
        .filter_map(|c| c.body())
        .map(|id| {
            let body = machine.world().body(id).expect("installed body");
            (
                body.position(),
                body.angle(),
                body.velocity.linear,
                body.velocity.angular,
            )
        })
        .collect()
}

fn dynamic_positions(machine: &Machine, count: usize) -> Vec<DVec2> {
    machine
        .components()
        .iter()
        .filter(|c| c.as_shape().is_some_and(|s| s.kind() == ShapeKind::Dynamic))
        .take(count)
        .map(|c| {
            c.physics_shape()
                .expect("shape")
                .position(machine.world())
        })
        .collect()
}

#[test]
fn test_rewind_reproduces_recorded_positions() {
    init_logging();
    let mut system = MachineSystem::with_builtin_factories(RESOURCES);
    system.choose_machine(1).expect("machine 1");

    system.set_machine_frame(300).expect("seek forward");
    let recorded = dynamic_positions(system.current_machine().expect("built"), 3);
    assert_eq!(recorded.len(), 3);

    system.set_machine_frame(600).expect("seek forward");
    system.set_machine_frame(300).expect("seek back");
    assert_eq!(system.machine_frame(), 300);

    let replayed = dynamic_positions(system.current_machine().expect("built"), 3);
    for (before, after) in recorded.iter().zip(&replayed) {
        assert_relative_eq!(before.x, after.x, epsilon = 1e-9);
        assert_relative_eq!(before.y, after.y, epsilon = 1e-9);
    }
}

#[test]
fn test_repeated_seek_is_a_no_op() {
    let mut system = MachineSystem::with_builtin_factories(RESOURCES);
    system.choose_machine(2).expect("machine 2");

    system.set_machine_frame(90).expect("seek");
    let first = snapshot(system.current_machine().expect("built"));
    system.set_machine_frame(90).expect("same frame");
    assert_eq!(snapshot(system.current_machine().expect("built")), first);

    system.set_machine_frame(0).expect("rewind");
    system.set_machine_frame(90).expect("replay");
    assert_eq!(snapshot(system.current_machine().expect("built")), first);
}

#[test]
fn test_motor_angle_matches_frame_after_any_seek_path() {
    let mut system = MachineSystem::with_builtin_factories(RESOURCES);
    system.choose_machine(1).expect("machine 1");

    // the elevator motor runs from frame 0 at a quarter turn per second
    for target in [45, 12, 80, 79, 0, 31] {
        system.set_machine_frame(target).expect("seek");
        let machine = system.current_machine().expect("built");
        let motor = machine
            .components()
            .iter()
            .find_map(|c| c.as_motor())
            .expect("machine 1 has motors");
        assert!(motor.is_active());
        if target > 0 {
            assert_relative_eq!(
                motor.angle(),
                frac(0.25 * target as f64 / 30.0),
                epsilon = 1e-12
            );
        }
    }
}

#[test]
fn test_reset_restores_initial_poses() {
    let mut machine = Machine2Factory::new(RESOURCES)
        .create(2)
        .expect("machine 2 builds");
    machine.seek(120).expect("run");
    assert_ne!(machine.frame(), 0);

    machine.reset().expect("reset");
    let once = snapshot(&machine);
    machine.reset().expect("reset again");
    assert_eq!(snapshot(&machine), once);
    assert_eq!(machine.frame(), 0);

    for component in machine.components() {
        if let Some(shape) = component.physics_shape() {
            let position = shape.position(machine.world());
            assert_relative_eq!(position.x, shape.initial_position().x, epsilon = 1e-3);
            assert_relative_eq!(position.y, shape.initial_position().y, epsilon = 1e-3);
            assert_relative_eq!(
                shape.rotation(machine.world()),
                shape.initial_rotation(),
                epsilon = 1e-6
            );
        }
        if let Some(motor) = component.as_motor() {
            assert!(!motor.is_active(), "contact-started motors go back to idle");
        }
        if let Some(pulley) = component.as_pulley() {
            assert_eq!((pulley.angle(), pulley.speed()), (0.0, 0.0));
        }
    }
}

#[test]
fn test_machines_keep_their_own_frames() {
    let mut system = MachineSystem::with_builtin_factories(RESOURCES);
    system.choose_machine(1).expect("machine 1");
    system.set_machine_frame(20).expect("seek");
    system.choose_machine(2).expect("machine 2");
    assert_eq!(system.machine_frame(), 0);
    system.set_machine_frame(5).expect("seek");

    system.choose_machine(1).expect("back to machine 1");
    assert_eq!(system.machine_frame(), 20);
    assert_relative_eq!(system.machine_time(), 20.0 / 30.0);

    system.set_frame_rate(60.0).expect("rate");
    assert_eq!(system.machine(2).expect("built").frame_rate(), 60.0);
    assert_relative_eq!(system.machine_time(), 20.0 / 60.0);
}

#[test]
fn test_unknown_machine_numbers_are_empty() {
    let mut system = MachineSystem::with_builtin_factories(RESOURCES);
    system.choose_machine(9).expect("any positive number");
    system.set_machine_frame(10).expect("empty machines still count frames");
    assert_eq!(system.machine_frame(), 10);
    assert!(system.current_machine().expect("built").components().is_empty());
}

#[test]
fn test_closure_factories_can_be_registered() {
    let mut system = MachineSystem::new();
    system.register_factory(3, |id: u32| -> contraption::Result<Machine> {
        let mut machine = Machine::new(id);
        let mut ball = contraption::Shape::new();
        ball.circle(10.0);
        ball.set_dynamic();
        machine.add_component(ball)?;
        Ok(machine)
    });
    system.choose_machine(3).expect("custom machine");
    assert_eq!(system.current_machine().expect("built").components().len(), 1);
}
