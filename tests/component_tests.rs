use approx::assert_relative_eq;
use contraption::{BodyId, ComponentId, Conveyor, Elevator, Machine, Motor, MotorState, Shape};

fn ball(machine: &mut Machine, x: f64, y: f64, radius: f64) -> ComponentId {
    let mut ball = Shape::new();
    ball.circle(radius);
    ball.set_initial_position(x, y);
    ball.set_dynamic();
    ball.set_physics(1.0, 0.5, 0.0);
    machine.add_component(ball).expect("ball")
}

fn body(machine: &Machine, id: ComponentId) -> BodyId {
    machine
        .component(id)
        .and_then(|c| c.body())
        .expect("component has a body")
}

fn running_motor(machine: &mut Machine, speed: f64) -> ComponentId {
    let mut motor = Motor::new("images");
    motor.set_position(500.0, 0.0);
    motor.set_speed(speed);
    motor.set_initially_running(true);
    machine.add_component(motor).expect("motor")
}

#[test]
fn test_motor_activates_when_hit() {
    let mut machine = Machine::new(1);
    let mut motor = Motor::new("images");
    motor.set_position(80.0, 120.0);
    motor.set_initially_running(false);
    motor.set_speed(0.25);
    let motor = machine.add_component(motor).expect("motor");
    ball(&mut machine, 80.0, 220.0, 16.0);

    let motor_state = |machine: &Machine| {
        machine
            .component(motor)
            .and_then(|c| c.as_motor())
            .expect("motor")
            .state()
    };
    assert_eq!(motor_state(&machine), MotorState::Idle);

    let mut frames = 0;
    while motor_state(&machine) == MotorState::Idle {
        machine.advance().expect("frame");
        frames += 1;
        assert!(frames < 60, "ball never reached the motor");
    }

    let motor = machine
        .component(motor)
        .and_then(|c| c.as_motor())
        .expect("motor");
    assert!(motor.is_active());
    assert_eq!(motor.rotation_source().speed(), 0.25);
}

#[test]
fn test_motor_angle_is_a_function_of_time() {
    let mut machine = Machine::new(1);
    let motor = running_motor(&mut machine, 0.35);

    let angle = |machine: &Machine| {
        machine
            .component(motor)
            .and_then(|c| c.as_motor())
            .expect("motor")
            .angle()
    };

    for target in [45, 10, 100, 3] {
        machine.seek(target).expect("seek");
        let expected = contraption::utils::math::frac(0.35 * target as f64 / 30.0);
        assert_relative_eq!(angle(&machine), expected, epsilon = 1e-12);
    }
}

#[test]
fn test_conveyor_carries_ball_to_the_right() {
    let mut machine = Machine::new(1);
    let mut conveyor = Conveyor::new();
    conveyor.set_size(200.0, 15.0);
    conveyor.set_position(0.0, 0.0);
    let conveyor = machine.add_component(conveyor).expect("conveyor");
    let ball = ball(&mut machine, 0.0, 27.0, 10.0);
    let motor = running_motor(&mut machine, 0.25);
    machine.add_sink(motor, conveyor).expect("motor drives conveyor");

    let belt = body(&machine, conveyor);
    let ball_body = body(&machine, ball);

    let mut frames = 0;
    while !machine.world().touching_dynamic_bodies(belt).contains(&ball_body) {
        machine.advance().expect("frame");
        frames += 1;
        assert!(frames < 30, "ball never landed on the belt");
    }
    machine.advance().expect("frame");

    let vx = machine.world().body(ball_body).expect("ball").velocity.linear.x;
    assert_relative_eq!(vx, 0.125, epsilon = 1e-6);

    for _ in 0..5 {
        machine.advance().expect("frame");
        let contact = machine
            .world()
            .contact_between(belt, ball_body)
            .expect("ball stays on the belt");
        assert_relative_eq!(contact.tangent_speed(), -0.125, epsilon = 1e-6);
    }
}

#[test]
fn test_elevator_carries_rider() {
    let mut machine = Machine::new(1);
    let mut elevator = Elevator::new();
    elevator.set_size(100.0, 15.0);
    elevator.set_position(0.0, 0.0);
    let elevator = machine.add_component(elevator).expect("elevator");
    let rider = ball(&mut machine, 0.0, 27.0, 10.0);
    let motor = running_motor(&mut machine, 0.5);
    machine.add_sink(motor, elevator).expect("motor drives elevator");

    let platform = body(&machine, elevator);
    let rider = body(&machine, rider);

    let mut frames = 0;
    while !machine.world().touching_dynamic_bodies(platform).contains(&rider) {
        machine.advance().expect("frame");
        frames += 1;
        assert!(frames < 30, "rider never touched the platform");
    }

    let world = machine.world();
    let platform_vy = world.body(platform).expect("platform").velocity.linear.y;
    assert_relative_eq!(platform_vy, 0.25, epsilon = 1e-6);
    assert_relative_eq!(
        world.body(rider).expect("rider").velocity.linear.y,
        platform_vy,
        epsilon = 1e-6
    );
    assert_eq!(world.body(platform).expect("platform").gravity_scale, 0.0);
}
