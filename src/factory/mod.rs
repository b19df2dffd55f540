//! Builders for the numbered machines a [`MachineSystem`](crate::system::MachineSystem)
//! can show.

use crate::{error::Result, machine::Machine};

pub mod machine1;
pub mod machine2;

pub use machine1::Machine1Factory;
pub use machine2::Machine2Factory;

/// Produces a fully wired machine.
pub trait MachineFactory {
    fn create(&self, id: u32) -> Result<Machine>;
}

impl<F> MachineFactory for F
where
    F: Fn(u32) -> Result<Machine>,
{
    fn create(&self, id: u32) -> Result<Machine> {
        self(id)
    }
}

/// Builds machines with no components.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmptyFactory;

impl MachineFactory for EmptyFactory {
    fn create(&self, id: u32) -> Result<Machine> {
        Ok(Machine::new(id))
    }
}
