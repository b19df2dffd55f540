use crate::{
    components::{Motor, Pulley, Shape},
    error::Result,
    machine::Machine,
};

use super::MachineFactory;

const FLOOR_HEIGHT: f64 = 15.0;

/// A ball rolls down a ramp onto a motor, which spins a paddle through two pulleys.
#[derive(Debug, Clone)]
pub struct Machine2Factory {
    images_dir: String,
}

impl Machine2Factory {
    pub fn new(resources_dir: &str) -> Self {
        Self {
            images_dir: format!("{resources_dir}/images"),
        }
    }

    fn image(&self, name: &str) -> String {
        format!("{}/{name}", self.images_dir)
    }
}

impl MachineFactory for Machine2Factory {
    fn create(&self, id: u32) -> Result<Machine> {
        let mut machine = Machine::new(id);

        let mut floor = Shape::new();
        floor.rectangle(-300.0, -FLOOR_HEIGHT, 600.0, FLOOR_HEIGHT);
        floor.set_image(self.image("floor.png"));
        floor.set_initial_position(0.0, -40.0);
        machine.add_component(floor)?;

        let mut basketball = Shape::new();
        basketball.circle(16.0);
        basketball.set_image(self.image("basketball.png"));
        basketball.set_initial_position(-150.0, 250.0);
        basketball.set_dynamic();
        basketball.set_physics(1.0, 0.5, 0.5);
        machine.add_component(basketball)?;

        let mut ramp = Shape::new();
        ramp.add_point(-50.0, 0.0);
        ramp.add_point(50.0, 0.0);
        ramp.add_point(50.0, 5.0);
        ramp.add_point(-50.0, 40.0);
        ramp.set_image(self.image("wedge.png"));
        ramp.set_initial_position(-100.0, 150.0);
        machine.add_component(ramp)?;

        let mut motor = Motor::new(&self.images_dir);
        motor.set_position(50.0, 100.0);
        motor.set_initially_running(false);
        motor.set_speed(0.5);
        let shaft = motor.shaft_position();
        let motor = machine.add_component(motor)?;

        let mut pulley1 = Pulley::new(10.0)?;
        pulley1.set_image(self.image("pulley.png"));
        pulley1.set_position(shaft.x, shaft.y);
        let pulley1 = machine.add_component(pulley1)?;
        machine.add_sink(motor, pulley1)?;

        let mut pulley2 = Pulley::new(15.0)?;
        pulley2.set_image(self.image("pulley2.png"));
        pulley2.set_position(150.0, 150.0);
        let pulley2 = machine.add_component(pulley2)?;
        machine.drive(pulley1, pulley2)?;

        let mut spinner = Shape::new();
        spinner.rectangle(-10.0, -40.0, 20.0, 80.0);
        spinner.set_image(self.image("spoon.png"));
        spinner.set_initial_position(150.0, 200.0);
        spinner.set_kinematic();
        let spinner = machine.add_component(spinner)?;
        machine.add_sink(pulley2, spinner)?;

        let mut platform = Shape::new();
        platform.rectangle(-100.0, -FLOOR_HEIGHT / 2.0, 200.0, FLOOR_HEIGHT);
        platform.set_image(self.image("floor.png"));
        platform.set_initial_position(-150.0, 50.0);
        machine.add_component(platform)?;

        Ok(machine)
    }
}
