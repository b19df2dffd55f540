//! Utility helpers: generational arena, unit conversions and logging.

pub mod allocator;
pub mod logging;
pub mod math;

pub use allocator::{Arena, BodyId, GenerationalId};
pub use math::*;
