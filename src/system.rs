//! Numbered machine store with frame seeking.

use std::collections::BTreeMap;
use std::time::Instant;

use glam::DVec2;
use log::debug;

use crate::{
    config::{DEFAULT_FRAME_RATE, DEFAULT_REPLAY_BUDGET_MS},
    error::{MachineError, Result},
    factory::{Machine1Factory, Machine2Factory, MachineFactory},
    machine::Machine,
    render::Graphics,
    utils::logging::warn_if_replay_over_budget,
};

/// Holds every machine that has been shown, builds new ones on demand and moves the
/// current one through time.
///
/// Machines are created the first time they are chosen. Numbers without a
/// registered factory get an empty machine.
pub struct MachineSystem {
    factories: BTreeMap<u32, Box<dyn MachineFactory>>,
    machines: BTreeMap<u32, Machine>,
    current: u32,
    frame_rate: f64,
    replay_budget_ms: f32,
}

impl Default for MachineSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl MachineSystem {
    /// A system with no factories. Machine 1 is current.
    pub fn new() -> Self {
        Self {
            factories: BTreeMap::new(),
            machines: BTreeMap::new(),
            current: 1,
            frame_rate: DEFAULT_FRAME_RATE,
            replay_budget_ms: DEFAULT_REPLAY_BUDGET_MS,
        }
    }

    /// A system that builds the two stock machines from assets under `resources_dir`.
    pub fn with_builtin_factories(resources_dir: &str) -> Self {
        let mut system = Self::new();
        system.register_factory(1, Machine1Factory::new(resources_dir));
        system.register_factory(2, Machine2Factory::new(resources_dir));
        system
    }

    /// Uses `factory` for machine `number`. Takes effect the next time that machine
    /// is created.
    pub fn register_factory(&mut self, number: u32, factory: impl MachineFactory + 'static) {
        self.factories.insert(number, Box::new(factory));
    }

    pub fn set_replay_budget_ms(&mut self, budget_ms: f32) {
        self.replay_budget_ms = budget_ms;
    }

    /// Makes machine `number` current, building it if needed.
    pub fn choose_machine(&mut self, number: i64) -> Result<()> {
        let number = u32::try_from(number)
            .ok()
            .filter(|n| *n >= 1)
            .ok_or(MachineError::InvalidMachineNumber(number))?;
        self.current = number;
        self.current_machine_mut().map(|_| ())
    }

    pub fn machine_number(&self) -> u32 {
        self.current
    }

    /// The current machine, if it has been built.
    pub fn current_machine(&self) -> Option<&Machine> {
        self.machines.get(&self.current)
    }

    pub fn machine(&self, number: u32) -> Option<&Machine> {
        self.machines.get(&number)
    }

    /// The current machine, built on first use.
    pub fn current_machine_mut(&mut self) -> Result<&mut Machine> {
        let number = self.current;
        if !self.machines.contains_key(&number) {
            let mut machine = match self.factories.get(&number) {
                Some(factory) => factory.create(number)?,
                None => Machine::new(number),
            };
            machine.set_frame_rate(self.frame_rate)?;
            machine.reset()?;
            debug!(
                "built machine {number} with {} components",
                machine.components().len()
            );
            self.machines.insert(number, machine);
        }
        self.machines
            .get_mut(&number)
            .ok_or(MachineError::InvalidMachineNumber(i64::from(number)))
    }

    /// Moves the current machine to `frame`. Negative frames mean frame 0.
    ///
    /// Seeking backwards resets the machine and replays from frame 0.
    pub fn set_machine_frame(&mut self, frame: i64) -> Result<()> {
        let target = u64::try_from(frame).unwrap_or(0);
        let budget = self.replay_budget_ms;
        let machine = self.current_machine_mut()?;

        let start = Instant::now();
        let replayed = if target < machine.frame() {
            target
        } else {
            target - machine.frame()
        };
        machine.seek(target)?;
        warn_if_replay_over_budget(replayed, start.elapsed(), budget);
        Ok(())
    }

    /// Current frame of the current machine.
    pub fn machine_frame(&self) -> u64 {
        self.current_machine().map_or(0, Machine::frame)
    }

    /// Simulation time of the current machine in seconds.
    pub fn machine_time(&self) -> f64 {
        self.current_machine().map_or(0.0, Machine::time)
    }

    pub fn frame_rate(&self) -> f64 {
        self.frame_rate
    }

    /// Applies `frame_rate` to every machine, including ones built later.
    pub fn set_frame_rate(&mut self, frame_rate: f64) -> Result<()> {
        if !(frame_rate > 0.0 && frame_rate.is_finite()) {
            return Err(MachineError::InvalidFrameRate(frame_rate));
        }
        self.frame_rate = frame_rate;
        for machine in self.machines.values_mut() {
            machine.set_frame_rate(frame_rate)?;
        }
        Ok(())
    }

    pub fn location(&self) -> DVec2 {
        self.current_machine().map_or(DVec2::ZERO, Machine::location)
    }

    pub fn set_location(&mut self, location: DVec2) -> Result<()> {
        self.current_machine_mut()?.set_location(location);
        Ok(())
    }

    pub fn draw_machine(&mut self, gfx: &mut dyn Graphics) -> Result<()> {
        self.current_machine_mut()?.draw(gfx);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn machine_numbers_start_at_one() {
        let mut system = MachineSystem::new();
        assert!(matches!(
            system.choose_machine(0),
            Err(MachineError::InvalidMachineNumber(0))
        ));
        assert!(system.choose_machine(-4).is_err());
        system.choose_machine(7).expect("unknown numbers are empty machines");
        assert_eq!(system.machine_number(), 7);
        assert!(system.current_machine().expect("built").components().is_empty());
    }

    #[test]
    fn negative_frames_clamp_to_zero() {
        let mut system = MachineSystem::new();
        system.set_machine_frame(12).expect("seek");
        assert_eq!(system.machine_frame(), 12);
        system.set_machine_frame(-5).expect("seek");
        assert_eq!(system.machine_frame(), 0);
    }

    #[test]
    fn frame_rate_must_be_positive() {
        let mut system = MachineSystem::new();
        assert!(system.set_frame_rate(0.0).is_err());
        assert!(system.set_frame_rate(f64::NAN).is_err());
        system.set_frame_rate(60.0).expect("valid rate");
        system.set_machine_frame(30).expect("seek");
        assert_eq!(system.machine_time(), 0.5);
    }
}
