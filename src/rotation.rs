//! Rotation propagation: a source records its latest angle and speed and forwards
//! them to its sinks in registration order.

use serde::{Deserialize, Serialize};

use crate::{components::ComponentId, error::Result};

/// What a source publishes. Angles are in turns, speeds in turns per second.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Signal {
    /// Sets the sink's angle only.
    Angle(f64),
    /// Sets the sink's angle and turning speed.
    Rotate { angle: f64, speed: f64 },
}

impl Signal {
    pub fn angle(&self) -> f64 {
        match *self {
            Signal::Angle(angle) | Signal::Rotate { angle, .. } => angle,
        }
    }

    pub fn speed(&self) -> Option<f64> {
        match *self {
            Signal::Angle(_) => None,
            Signal::Rotate { speed, .. } => Some(speed),
        }
    }
}

/// Delivers signals to sinks by id.
pub trait SinkSet {
    fn deliver(&mut self, sink: ComponentId, signal: Signal) -> Result<()>;
}

/// Ordered set of sinks plus the last published state.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RotationSource {
    angle: f64,
    speed: f64,
    sinks: Vec<ComponentId>,
}

impl RotationSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn angle(&self) -> f64 {
        self.angle
    }

    pub fn speed(&self) -> f64 {
        self.speed
    }

    pub fn sinks(&self) -> &[ComponentId] {
        &self.sinks
    }

    pub fn contains(&self, sink: ComponentId) -> bool {
        self.sinks.contains(&sink)
    }

    /// Appends `sink`. Returns false if it was already registered.
    pub(crate) fn add_sink(&mut self, sink: ComponentId) -> bool {
        if self.contains(sink) {
            return false;
        }
        self.sinks.push(sink);
        true
    }

    /// Clears the recorded state. Sinks are kept.
    pub fn reset_state(&mut self) {
        self.angle = 0.0;
        self.speed = 0.0;
    }

    /// Records `signal` and delivers it to every sink in order.
    ///
    /// The first sink error stops delivery; later sinks do not see the signal.
    pub fn publish(&mut self, signal: Signal, sinks: &mut dyn SinkSet) -> Result<()> {
        self.angle = signal.angle();
        if let Some(speed) = signal.speed() {
            self.speed = speed;
        }
        for &sink in &self.sinks {
            sinks.deliver(sink, signal)?;
        }
        Ok(())
    }
}
