use thiserror::Error;

use crate::{components::ComponentId, utils::allocator::BodyId};

/// Top-level error type for the contraption simulator.
#[derive(Debug, Error)]
pub enum MachineError {
    #[error("Wiring error: {0}")]
    Wiring(#[from] WiringError),

    #[error("Body {0:?} is not present in the current world")]
    StaleBody(BodyId),

    #[error("Degenerate shape: {0}")]
    DegenerateShape(String),

    #[error("Invalid radius {0} cm (must leave a positive radius after the inset)")]
    InvalidRadius(f64),

    #[error("Invalid frame rate {0} (must be > 0)")]
    InvalidFrameRate(f64),

    #[error("Invalid machine number {0} (machines are numbered from 1)")]
    InvalidMachineNumber(i64),

    #[error("Invalid value for attribute {name}: {value:?}")]
    InvalidAttribute { name: String, value: String },
}

/// Faults in how components are connected to each other.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum WiringError {
    #[error("Component {0:?} does not exist in this machine")]
    UnknownComponent(ComponentId),

    #[error("Component {0:?} has no rotation source")]
    NotASource(ComponentId),

    #[error("Component {0:?} cannot receive rotation")]
    NotASink(ComponentId),

    #[error("Component {0:?} is not a pulley")]
    NotAPulley(ComponentId),

    #[error("Sink {sink:?} is already registered with source {from:?}")]
    DuplicateSink { from: ComponentId, sink: ComponentId },

    #[error("Pulley {0:?} cannot drive itself")]
    SelfDrive(ComponentId),

    #[error("Connecting {from:?} to {to:?} would close a loop in the rotation graph")]
    RotationCycle { from: ComponentId, to: ComponentId },
}

pub type Result<T> = std::result::Result<T, MachineError>;
