//! Host-side wrapper that places a machine on a timeline.

use glam::DVec2;
use serde::{Deserialize, Serialize};

use crate::{
    error::{MachineError, Result},
    render::Graphics,
    system::MachineSystem,
};

/// Unscaled size of the hit box around a placed machine.
const HIT_BOX: DVec2 = DVec2::new(200.0, 600.0);

/// Persisted settings of a placed machine.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DrawableState {
    pub machine: u32,
    /// Timeline frame at which the machine's frame 0 plays.
    pub start_frame: i64,
    pub scale: f64,
}

impl Default for DrawableState {
    fn default() -> Self {
        Self {
            machine: 1,
            start_frame: 0,
            scale: 0.75,
        }
    }
}

/// A machine placed in a host scene at a position and scale.
pub struct MachineDrawable {
    system: MachineSystem,
    state: DrawableState,
    placed_position: DVec2,
}

impl MachineDrawable {
    pub fn new(system: MachineSystem) -> Result<Self> {
        let mut drawable = Self {
            system,
            state: DrawableState::default(),
            placed_position: DVec2::ZERO,
        };
        drawable.system.choose_machine(i64::from(drawable.state.machine))?;
        Ok(drawable)
    }

    pub fn system(&self) -> &MachineSystem {
        &self.system
    }

    pub fn system_mut(&mut self) -> &mut MachineSystem {
        &mut self.system
    }

    pub fn state(&self) -> DrawableState {
        self.state
    }

    pub fn set_state(&mut self, state: DrawableState) -> Result<()> {
        self.system.choose_machine(i64::from(state.machine))?;
        self.state = state;
        Ok(())
    }

    pub fn machine_number(&self) -> u32 {
        self.state.machine
    }

    pub fn set_machine_number(&mut self, number: i64) -> Result<()> {
        self.system.choose_machine(number)?;
        self.state.machine = self.system.machine_number();
        Ok(())
    }

    pub fn start_frame(&self) -> i64 {
        self.state.start_frame
    }

    pub fn set_start_frame(&mut self, frame: i64) {
        self.state.start_frame = frame;
    }

    pub fn scale(&self) -> f64 {
        self.state.scale
    }

    pub fn set_scale(&mut self, scale: f64) {
        self.state.scale = scale;
    }

    pub fn placed_position(&self) -> DVec2 {
        self.placed_position
    }

    pub fn set_placed_position(&mut self, position: DVec2) {
        self.placed_position = position;
    }

    pub fn set_frame_rate(&mut self, frame_rate: f64) -> Result<()> {
        self.system.set_frame_rate(frame_rate)
    }

    /// Seeks the machine to the frame matching timeline frame `frame`.
    pub fn set_timeline_frame(&mut self, frame: i64) -> Result<()> {
        let machine_frame = frame.saturating_sub(self.state.start_frame).max(0);
        self.system.set_machine_frame(machine_frame)
    }

    pub fn draw(&mut self, gfx: &mut dyn Graphics) -> Result<()> {
        gfx.push_state();
        gfx.translate(self.placed_position.x, self.placed_position.y);
        gfx.scale(self.state.scale, self.state.scale);
        let result = self
            .system
            .set_location(DVec2::ZERO)
            .and_then(|_| self.system.draw_machine(gfx));
        gfx.pop_state();
        result
    }

    /// Whether `point` lies in the box standing on the placed position.
    pub fn hit_test(&self, point: DVec2) -> bool {
        let size = HIT_BOX * self.state.scale;
        let min = DVec2::new(self.placed_position.x - size.x / 2.0, self.placed_position.y - size.y);
        let max = DVec2::new(self.placed_position.x + size.x / 2.0, self.placed_position.y);
        point.cmpge(min).all() && point.cmple(max).all()
    }

    /// Attributes for the host's scene file.
    pub fn to_attributes(&self) -> Vec<(String, String)> {
        vec![
            ("machine".to_string(), self.state.machine.to_string()),
            ("startframe".to_string(), self.state.start_frame.to_string()),
            ("scale".to_string(), format!("{:.6}", self.state.scale)),
        ]
    }

    /// Restores settings written by [`to_attributes`](Self::to_attributes). Missing
    /// attributes take their defaults; unknown ones are ignored.
    pub fn from_attributes<K, V>(&mut self, attributes: impl IntoIterator<Item = (K, V)>) -> Result<()>
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut state = DrawableState::default();
        for (name, value) in attributes {
            let (name, value) = (name.as_ref(), value.as_ref().trim());
            let invalid = || MachineError::InvalidAttribute {
                name: name.to_string(),
                value: value.to_string(),
            };
            match name {
                "machine" => {
                    state.machine = value
                        .parse::<u32>()
                        .ok()
                        .filter(|n| *n >= 1)
                        .ok_or_else(invalid)?
                }
                "startframe" => state.start_frame = value.parse().map_err(|_| invalid())?,
                "scale" => {
                    state.scale = value
                        .parse::<f64>()
                        .ok()
                        .filter(|s| s.is_finite())
                        .ok_or_else(invalid)?
                }
                _ => {}
            }
        }
        self.set_state(state)
    }
}
