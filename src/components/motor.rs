//! Motor: the rotation source that starts a machine, either running from frame 0 or
//! switched on by a contact.

use glam::DVec2;
use log::debug;
use serde::{Deserialize, Serialize};

use crate::{
    collision::contact::Contact,
    physics_shape::PhysicsShape,
    render::{Graphics, Polygon},
    rotation::{RotationSource, Signal},
    utils::{allocator::BodyId, math::frac},
    world::PhysicsWorld,
};

/// Offset from the motor position to the shaft that pulleys mount on (cm).
const SHAFT_OFFSET: DVec2 = DVec2::new(0.0, 24.0);
/// Offset from the motor position to the wheel and animation frames (cm).
const WHEEL_OFFSET: DVec2 = DVec2::new(-12.0, 24.0);
const BOX_SIZE: DVec2 = DVec2::new(75.0, 50.0);
const WHEEL_SIZE: f64 = 45.0;
const FRAME_IMAGES: [&str; 5] = [
    "motor-idle.png",
    "motor-active-1.png",
    "motor-active-2.png",
    "motor-active-3.png",
    "motor-active-4.png",
];

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MotorConfig {
    /// Turns per second. The sign sets the spin direction.
    pub speed: f64,
    pub oscillating: bool,
    /// Oscillation amplitude in turns. Stored only.
    pub spread: f64,
    /// Stored only.
    pub windup_to_release_ratio: f64,
    pub initially_running: bool,
}

impl Default for MotorConfig {
    fn default() -> Self {
        Self {
            speed: 0.0,
            oscillating: false,
            spread: 0.0,
            windup_to_release_ratio: 1.0,
            initially_running: false,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum MotorState {
    #[default]
    Idle,
    Active,
}

/// Rotation source that starts turning when switched on or when something hits it.
///
/// Once active a motor stays active until the machine is reset.
#[derive(Debug, Clone)]
pub struct Motor {
    config: MotorConfig,
    state: MotorState,
    angle: f64,
    position: DVec2,
    body: PhysicsShape,
    wheel: Polygon,
    frames: Vec<Polygon>,
    pub(crate) source: RotationSource,
}

impl Motor {
    /// Creates an idle motor whose images live in `images_dir`.
    pub fn new(images_dir: &str) -> Self {
        Self::with_config(images_dir, MotorConfig::default())
    }

    pub fn with_config(images_dir: &str, config: MotorConfig) -> Self {
        let mut body = PhysicsShape::new();
        body.bottom_centered_rectangle(BOX_SIZE.x, BOX_SIZE.y);
        body.set_image(format!("{images_dir}/motor-box.png"));

        let mut wheel = Polygon::new();
        wheel.centered_square(WHEEL_SIZE);
        wheel.set_image(format!("{images_dir}/wheel.png"));

        let frames = FRAME_IMAGES
            .iter()
            .map(|name| {
                let mut frame = Polygon::new();
                frame.centered_square(WHEEL_SIZE);
                frame.set_image(format!("{images_dir}/{name}"));
                frame
            })
            .collect();

        let mut motor = Self {
            config,
            state: MotorState::Idle,
            angle: 0.0,
            position: DVec2::ZERO,
            body,
            wheel,
            frames,
            source: RotationSource::new(),
        };
        motor.reset_state();
        motor
    }

    pub fn config(&self) -> &MotorConfig {
        &self.config
    }

    pub fn speed(&self) -> f64 {
        self.config.speed
    }

    pub fn set_speed(&mut self, speed: f64) {
        self.config.speed = speed;
    }

    pub fn set_oscillating(&mut self, oscillating: bool) {
        self.config.oscillating = oscillating;
    }

    pub fn set_spread(&mut self, spread: f64) {
        self.config.spread = spread;
    }

    pub fn set_windup_to_release_ratio(&mut self, ratio: f64) {
        self.config.windup_to_release_ratio = ratio;
    }

    /// Also sets the current state, so a motor configured before it first runs
    /// starts in the requested state.
    pub fn set_initially_running(&mut self, running: bool) {
        self.config.initially_running = running;
        self.state = if running {
            MotorState::Active
        } else {
            MotorState::Idle
        };
    }

    pub fn state(&self) -> MotorState {
        self.state
    }

    pub fn is_active(&self) -> bool {
        self.state == MotorState::Active
    }

    pub fn activate(&mut self) {
        if self.state == MotorState::Idle {
            debug!("motor activated");
            self.state = MotorState::Active;
        }
    }

    /// Last computed angle in turns.
    pub fn angle(&self) -> f64 {
        self.angle
    }

    pub fn position(&self) -> DVec2 {
        self.position
    }

    pub fn set_position(&mut self, x: f64, y: f64) {
        self.position = DVec2::new(x, y);
        self.body.set_initial_position(self.position);
    }

    /// Where a pulley driven by this motor should be placed.
    pub fn shaft_position(&self) -> DVec2 {
        self.position + SHAFT_OFFSET
    }

    pub fn physics_shape(&self) -> &PhysicsShape {
        &self.body
    }

    pub(crate) fn physics_shape_mut(&mut self) -> &mut PhysicsShape {
        &mut self.body
    }

    pub fn rotation_source(&self) -> &RotationSource {
        &self.source
    }

    pub fn body(&self) -> Option<BodyId> {
        self.body.body()
    }

    /// Output angle at simulation time `time`. Depends on nothing but the
    /// configuration and `time`.
    pub fn angle_at(&self, time: f64) -> f64 {
        let speed = self.config.speed;
        if self.config.oscillating {
            0.25 * (std::f64::consts::TAU * speed * time).sin() + 0.25
        } else {
            frac(speed * time)
        }
    }

    /// Animation frame to show: 0 when idle, 1 to 4 while turning.
    pub fn frame_index(&self) -> usize {
        match self.state {
            MotorState::Idle => 0,
            MotorState::Active => (self.angle * 16.0).floor().rem_euclid(4.0) as usize + 1,
        }
    }

    pub(crate) fn update(&mut self, time: f64) -> Option<Signal> {
        if !self.is_active() {
            return None;
        }
        self.angle = self.angle_at(time);
        Some(Signal::Rotate {
            angle: self.angle,
            speed: self.config.speed,
        })
    }

    pub(crate) fn begin_contact(&mut self, contact: &Contact) {
        if self.body().is_some_and(|body| contact.involves(body)) {
            self.activate();
        }
    }

    pub(crate) fn reset_state(&mut self) {
        self.state = if self.config.initially_running {
            MotorState::Active
        } else {
            MotorState::Idle
        };
        self.angle = 0.0;
        self.source.reset_state();
    }

    pub fn draw(&self, gfx: &mut dyn Graphics, world: &PhysicsWorld) {
        self.body.draw(gfx, world);

        let center = self.body.position(world) + WHEEL_OFFSET;
        if let Some(frame) = self.frames.get(self.frame_index()) {
            gfx.push_state();
            gfx.translate(center.x, center.y);
            if self.config.speed < 0.0 {
                gfx.scale(-1.0, 1.0);
            }
            frame.draw(gfx, DVec2::ZERO, 0.0);
            gfx.pop_state();
        }

        if self.is_active() {
            self.wheel.draw(gfx, center, self.angle);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn angle_wraps_into_unit_interval() {
        let mut motor = Motor::new("images");
        motor.set_speed(-0.25);
        assert_relative_eq!(motor.angle_at(1.0), 0.75, epsilon = 1e-12);
        motor.set_speed(0.25);
        assert_relative_eq!(motor.angle_at(5.0), 0.25, epsilon = 1e-12);
    }

    #[test]
    fn oscillation_stays_in_band() {
        let mut motor = Motor::new("images");
        motor.set_speed(0.2);
        motor.set_oscillating(true);
        motor.set_spread(0.1);
        for step in 0..200 {
            let angle = motor.angle_at(step as f64 / 30.0);
            assert!((0.0..=0.5).contains(&angle), "angle {angle} out of band");
        }
    }

    #[test]
    fn idle_motor_publishes_nothing() {
        let mut motor = Motor::new("images");
        motor.set_speed(1.0);
        assert_eq!(motor.update(1.0), None);
        assert_eq!(motor.frame_index(), 0);

        motor.activate();
        let signal = motor.update(0.2).expect("active motor publishes");
        assert_relative_eq!(signal.angle(), 0.2, epsilon = 1e-12);
        assert_eq!(signal.speed(), Some(1.0));
        assert_eq!(motor.frame_index(), 4);
    }

    #[test]
    fn reset_returns_to_configured_state() {
        let mut motor = Motor::new("images");
        motor.activate();
        motor.reset_state();
        assert_eq!(motor.state(), MotorState::Idle);

        motor.set_initially_running(true);
        motor.reset_state();
        assert!(motor.is_active());
    }
}
