//! Global configuration constants and settings for the contraption simulator.

use serde::{Deserialize, Serialize};

/// Centimetres per metre. Design-surface lengths are in centimetres, the engine works in metres.
pub const MTOCM: f64 = 100.0;

/// Default gravity vector applied in the physics world (Y-up, m/s²).
pub const DEFAULT_GRAVITY: [f32; 2] = [0.0, -9.8];

/// Default frame rate in frames per second.
pub const DEFAULT_FRAME_RATE: f64 = 30.0;

/// Velocity iterations performed by the contact solver per step.
pub const VELOCITY_ITERATIONS: u32 = 6;

/// Position-correction iterations performed per step.
pub const POSITION_ITERATIONS: u32 = 2;

/// Amount removed from each polygon half-extent at install time (cm).
pub const POLYGON_INSET_CM: f64 = 0.95;

/// Amount removed from each circle radius at install time (m).
pub const CIRCLE_INSET_M: f32 = 0.005;

/// Amount removed from each pulley radius when drawing belts (cm).
pub const BELT_INSET_CM: f64 = 3.0;

/// Default conveyor/elevator surface speed per unit of driving speed (cm/s per turn/s).
pub const DEFAULT_SPEED_MULTIPLIER: f64 = 50.0;

/// Collision tolerance: contacts are kept "touching" inside this band (m).
pub const LINEAR_SLOP: f32 = 0.005;

/// Skin radius carried by every polygon (m).
pub const POLYGON_RADIUS: f32 = 2.0 * LINEAR_SLOP;

/// Fraction of the penetration corrected per position iteration.
pub const BAUMGARTE: f32 = 0.2;

/// Largest positional correction applied in a single position iteration (m).
pub const MAX_LINEAR_CORRECTION: f32 = 0.2;

/// Approach speeds below this do not bounce (m/s).
pub const VELOCITY_THRESHOLD: f32 = 1.0;

/// Largest translation a body may make in one step (m).
pub const MAX_TRANSLATION: f32 = 2.0;

/// Largest rotation a body may make in one step (rad).
pub const MAX_ROTATION: f32 = 0.5 * std::f32::consts::PI;

/// Fattening applied to every AABB handed to the broad-phase (m).
pub const AABB_MARGIN: f32 = 0.1;

/// Default cell size for the broad-phase uniform grid (m).
pub const DEFAULT_BROADPHASE_CELL_SIZE: f32 = 1.0;

/// Replays slower than this are reported with a warning (ms).
pub const DEFAULT_REPLAY_BUDGET_MS: f32 = 500.0;

/// Largest number of vertices a physics polygon keeps after hulling.
pub const MAX_POLYGON_VERTICES: usize = 8;

/// Knobs a machine can be created with. Defaults match the constants above.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationSettings {
    pub gravity: [f32; 2],
    pub velocity_iterations: u32,
    pub position_iterations: u32,
    pub frame_rate: f64,
}

impl Default for SimulationSettings {
    fn default() -> Self {
        Self {
            gravity: DEFAULT_GRAVITY,
            velocity_iterations: VELOCITY_ITERATIONS,
            position_iterations: POSITION_ITERATIONS,
            frame_rate: DEFAULT_FRAME_RATE,
        }
    }
}

impl SimulationSettings {
    /// Fixed step length in seconds.
    pub fn time_step(&self) -> f64 {
        1.0 / self.frame_rate
    }
}
