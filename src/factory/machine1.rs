use glam::DVec2;

use crate::{
    components::{ComponentId, Conveyor, Elevator, Motor, Pulley, Shape},
    error::Result,
    machine::Machine,
};

use super::MachineFactory;

const FLOOR_WIDTH: f64 = 600.0;
const FLOOR_HEIGHT: f64 = 15.0;
const DOMINO_WIDTH: f64 = 5.0;
const DOMINO_HEIGHT: f64 = 25.0;
const PIN_WIDTH: f64 = 10.0;
const PIN_HEIGHT: f64 = 40.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DominoColor {
    Black,
    Red,
    Green,
    Blue,
}

impl DominoColor {
    fn image(self) -> &'static str {
        match self {
            DominoColor::Black => "domino-black.png",
            DominoColor::Red => "domino-red.png",
            DominoColor::Green => "domino-green.png",
            DominoColor::Blue => "domino-blue.png",
        }
    }
}

/// The large contraption: an elevator and conveyor line, a siege arm, and stacks of
/// dominoes and bowling pins.
#[derive(Debug, Clone)]
pub struct Machine1Factory {
    images_dir: String,
}

impl Machine1Factory {
    pub fn new(resources_dir: &str) -> Self {
        Self {
            images_dir: format!("{resources_dir}/images"),
        }
    }

    fn image(&self, name: &str) -> String {
        format!("{}/{name}", self.images_dir)
    }

    fn ball(
        &self,
        machine: &mut Machine,
        radius: f64,
        image: &str,
        position: DVec2,
        physics: (f32, f32, f32),
    ) -> Result<ComponentId> {
        let mut ball = Shape::new();
        ball.circle(radius);
        ball.set_image(self.image(image));
        ball.set_initial_position(position.x, position.y);
        ball.set_dynamic();
        ball.set_physics(physics.0, physics.1, physics.2);
        machine.add_component(ball)
    }

    fn platform(&self, machine: &mut Machine, position: DVec2) -> Result<ComponentId> {
        let mut platform = Shape::new();
        platform.rectangle(-150.0, -FLOOR_HEIGHT / 2.0, 300.0, FLOOR_HEIGHT);
        platform.set_image(self.image("floor.png"));
        platform.set_initial_position(position.x, position.y);
        machine.add_component(platform)
    }

    fn pulley(&self, machine: &mut Machine, radius: f64, position: DVec2) -> Result<ComponentId> {
        let mut pulley = Pulley::new(radius)?;
        pulley.set_image(self.image("pulley.png"));
        pulley.set_position(position.x, position.y);
        machine.add_component(pulley)
    }

    fn elevator_and_conveyor(&self, machine: &mut Machine) -> Result<()> {
        let mut motor = Motor::new(&self.images_dir);
        motor.set_position(-20.0, 340.0);
        motor.set_initially_running(true);
        motor.set_speed(0.25);
        let shaft = motor.shaft_position();
        let motor = machine.add_component(motor)?;

        let mut conveyor = Conveyor::new();
        conveyor.set_size(100.0, 15.0);
        conveyor.set_image(self.image("conveyor.png"));
        conveyor.set_position(-340.0, 500.0);
        let conveyor = machine.add_component(conveyor)?;

        let mut elevators = Vec::with_capacity(3);
        for y in [-47.5, 102.5, 252.5] {
            let mut elevator = Elevator::new();
            elevator.set_size(50.0, 15.0);
            elevator.set_image(self.image("beam2.png"));
            elevator.set_position(-277.5, y);
            elevators.push(machine.add_component(elevator)?);
        }

        let mut wedge = Shape::new();
        wedge.add_point(-25.0, 0.0);
        wedge.add_point(25.0, 0.0);
        wedge.add_point(25.0, 4.5);
        wedge.add_point(-25.0, 55.0);
        wedge.set_image(self.image("wedge.png"));
        wedge.set_initial_rotation(-0.25);
        wedge.set_initial_position(-490.0, 545.0);
        machine.add_component(wedge)?;

        let pulley_motor = self.pulley(machine, 10.0, shaft)?;
        machine.add_sink(motor, pulley_motor)?;

        let pulley_conveyor = self.pulley(machine, 10.0, DVec2::new(-150.0, 320.0))?;
        machine.drive(pulley_motor, pulley_conveyor)?;
        machine.add_sink(pulley_conveyor, conveyor)?;

        let pulley_elevator = self.pulley(machine, 10.0, DVec2::new(-310.0, 370.0))?;
        machine.drive(pulley_conveyor, pulley_elevator)?;
        for elevator in elevators {
            machine.add_sink(pulley_elevator, elevator)?;
        }
        Ok(())
    }

    fn siege_contraption(&self, machine: &mut Machine) -> Result<()> {
        let mut beam = Shape::new();
        beam.bottom_centered_rectangle(180.0, FLOOR_HEIGHT);
        beam.set_image(self.image("beam.png"));
        beam.set_initial_position(-290.0, 420.0);
        machine.add_component(beam)?;

        let mut wedge = Shape::new();
        wedge.add_point(-5.0, 0.0);
        wedge.add_point(0.0, 0.0);
        wedge.add_point(0.0, 4.5);
        wedge.add_point(-5.0, 45.0);
        wedge.set_image(self.image("wedge.png"));
        wedge.set_initial_rotation(0.25);
        wedge.set_initial_position(-90.0, 240.0);
        machine.add_component(wedge)?;

        let mut motor = Motor::new(&self.images_dir);
        motor.set_position(-230.0, 25.0);
        motor.set_initially_running(false);
        motor.set_speed(0.2);
        motor.set_oscillating(true);
        motor.set_spread(0.1);
        motor.set_windup_to_release_ratio(5.0);
        let shaft = motor.shaft_position();
        let motor = machine.add_component(motor)?;

        let hub = DVec2::new(-125.0, 140.0);
        let mid_outer = self.pulley(machine, 25.0, hub)?;

        let pulley_motor = self.pulley(machine, 10.0, shaft)?;
        machine.add_sink(motor, pulley_motor)?;

        // same shaft as the outer pulley
        let mid_inner = self.pulley(machine, 10.0, hub)?;
        machine.drive(pulley_motor, mid_inner)?;
        machine.add_sink(mid_inner, mid_outer)?;

        let arm_position = DVec2::new(-205.0, 215.0);
        let arm = self.pulley(machine, 10.0, arm_position)?;
        machine.drive(mid_outer, arm)?;

        let mut spoon = Shape::new();
        spoon.set_initial_position(arm_position.x, arm_position.y);
        spoon.add_point(-7.0, 10.0);
        spoon.add_point(7.0, 10.0);
        spoon.add_point(7.0, -60.0);
        spoon.add_point(-7.0, -60.0);
        spoon.set_image(self.image("spoon.png"));
        spoon.set_kinematic();
        spoon.set_initial_rotation(0.5);
        let spoon = machine.add_component(spoon)?;
        machine.add_sink(arm, spoon)?;
        Ok(())
    }

    fn domino(
        &self,
        machine: &mut Machine,
        position: DVec2,
        rotation: f64,
        color: DominoColor,
    ) -> Result<ComponentId> {
        let mut domino = Shape::new();
        domino.rectangle(-DOMINO_WIDTH / 2.0, -DOMINO_HEIGHT / 2.0, DOMINO_WIDTH, DOMINO_HEIGHT);
        domino.set_image(self.image(color.image()));
        domino.set_initial_position(position.x, position.y);
        domino.set_initial_rotation(rotation);
        domino.set_dynamic();
        domino.set_physics(0.5, 0.5, 0.75);
        machine.add_component(domino)
    }

    fn bowling_pin(&self, machine: &mut Machine, position: DVec2) -> Result<ComponentId> {
        let mut pin = Shape::new();
        pin.rectangle(-PIN_WIDTH / 2.0, -PIN_HEIGHT / 2.0, PIN_WIDTH, PIN_HEIGHT);
        pin.set_image(self.image("pin.png"));
        pin.set_initial_position(position.x, position.y);
        pin.set_dynamic();
        pin.set_physics(0.5, 0.5, 1.0);
        machine.add_component(pin)
    }

    fn domino_stack(&self, machine: &mut Machine, base: DVec2) -> Result<()> {
        use DominoColor::*;
        const W: f64 = DOMINO_WIDTH;
        const H: f64 = DOMINO_HEIGHT;
        let left = -H / 2.0 + W / 2.0;
        let right = H / 2.0 - W / 2.0;
        let top = H / 2.0 - W * 2.5;

        let mut layout = vec![
            (DVec2::new(left, H / 2.0), 0.0, Red),
            (DVec2::new(right, H / 2.0), 0.0, Green),
            (DVec2::new(left, H * 1.5), 0.0, Blue),
            (DVec2::new(right, H * 1.5), 0.0, Red),
            (DVec2::new(left, H * 2.5), 0.0, Green),
            (DVec2::new(right, H * 2.5), 0.0, Blue),
            (DVec2::new(top, H * 3.0 + W / 2.0), 0.25, Black),
        ];
        for offset in [-H * 1.5, H * 1.5] {
            layout.extend([
                (DVec2::new(offset + left, H / 2.0), 0.0, Red),
                (DVec2::new(offset + right, H / 2.0), 0.0, Green),
                (DVec2::new(offset + left, H * 1.5), 0.0, Blue),
                (DVec2::new(offset + right, H * 1.5), 0.0, Red),
                (DVec2::new(offset + top, H * 2.0 + W / 2.0), 0.25, Black),
            ]);
        }
        for offset in [-H * 3.0, H * 3.0] {
            layout.extend([
                (DVec2::new(offset + left, H / 2.0), 0.0, Red),
                (DVec2::new(offset + right, H / 2.0), 0.0, Green),
                (DVec2::new(offset + top, H + W / 2.0), 0.25, Black),
            ]);
        }

        for (offset, rotation, color) in layout {
            self.domino(machine, base + offset, rotation, color)?;
        }
        Ok(())
    }

    fn bowling_pin_stack(&self, machine: &mut Machine, base: DVec2) -> Result<()> {
        const W: f64 = DOMINO_WIDTH;
        const H: f64 = DOMINO_HEIGHT;
        const P: f64 = PIN_HEIGHT;

        self.bowling_pin(machine, base + DVec2::new(0.0, P / 2.0))?;
        self.bowling_pin(machine, base + DVec2::new(-H, P / 2.0))?;
        self.bowling_pin(machine, base + DVec2::new(H, P / 2.0))?;
        self.domino(machine, base + DVec2::new(-H / 2.0, P + W / 2.0), 0.25, DominoColor::Red)?;
        self.domino(machine, base + DVec2::new(H / 2.0, P + W / 2.0), 0.25, DominoColor::Green)?;

        self.bowling_pin(machine, base + DVec2::new(-H / 2.0, P * 1.5 + W))?;
        self.bowling_pin(machine, base + DVec2::new(H / 2.0, P * 1.5 + W))?;
        self.domino(machine, base + DVec2::new(0.0, P * 2.0 + W * 1.5), 0.25, DominoColor::Blue)?;

        self.bowling_pin(machine, base + DVec2::new(0.0, P * 2.5 + W * 2.0))?;
        Ok(())
    }
}

impl MachineFactory for Machine1Factory {
    fn create(&self, id: u32) -> Result<Machine> {
        let mut machine = Machine::new(id);

        self.ball(&mut machine, 16.0, "basketball.png", DVec2::new(-200.0, 350.0), (1.0, 0.5, 0.5))?;
        self.ball(&mut machine, 16.0, "bowlingball.png", DVec2::new(-300.0, 80.0), (5.0, 0.5, 0.6))?;
        self.ball(&mut machine, 8.0, "tennisball.png", DVec2::new(-230.0, 100.0), (1.0, 0.5, 0.8))?;

        let floor_width = FLOOR_WIDTH + 200.0;
        let mut floor = Shape::new();
        floor.rectangle(-floor_width / 2.0, -FLOOR_HEIGHT, floor_width, FLOOR_HEIGHT);
        floor.set_image(self.image("floor.png"));
        floor.set_initial_position(50.0, -40.0);
        machine.add_component(floor)?;

        self.elevator_and_conveyor(&mut machine)?;

        self.platform(&mut machine, DVec2::new(210.0, 250.0))?;
        self.domino_stack(&mut machine, DVec2::new(150.0, 250.0))?;

        self.platform(&mut machine, DVec2::new(265.0, 100.0))?;
        self.bowling_pin_stack(&mut machine, DVec2::new(150.0, 100.0))?;

        self.siege_contraption(&mut machine)?;
        Ok(machine)
    }
}
