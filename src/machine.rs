//! A single contraption: a physics world, its components and the rotation graph
//! between them.

use std::collections::BTreeSet;

use glam::DVec2;
use log::{debug, warn};

use crate::{
    collision::contact::{Contact, ContactListener, Manifold},
    components::{Component, ComponentId},
    config::SimulationSettings,
    core::rigidbody::RigidBody,
    error::{MachineError, Result, WiringError},
    render::Graphics,
    rotation::{SinkSet, Signal},
    router::ContactRouter,
    utils::{allocator::Arena, logging::ScopedTimer},
    world::PhysicsWorld,
};

/// Routes rotation signals between components while the machine is running.
struct Dispatcher<'a> {
    components: &'a mut [Component],
    world: &'a mut PhysicsWorld,
}

impl Dispatcher<'_> {
    fn component_mut(&mut self, id: ComponentId) -> Result<&mut Component> {
        self.components
            .get_mut(id.index())
            .ok_or_else(|| WiringError::UnknownComponent(id).into())
    }

    /// Publishes `signal` from the rotation source of `id`.
    ///
    /// The source is moved out while it publishes so sinks can be borrowed mutably.
    fn publish(&mut self, id: ComponentId, signal: Signal) -> Result<()> {
        let mut source = match self.component_mut(id)?.rotation_source_mut() {
            Some(source) => std::mem::take(source),
            None => return Err(WiringError::NotASource(id).into()),
        };
        let result = source.publish(signal, self);
        if let Some(slot) = self.component_mut(id)?.rotation_source_mut() {
            *slot = source;
        }
        result
    }
}

impl SinkSet for Dispatcher<'_> {
    fn deliver(&mut self, sink: ComponentId, signal: Signal) -> Result<()> {
        let world = &mut *self.world;
        let component = self
            .components
            .get_mut(sink.index())
            .ok_or(WiringError::UnknownComponent(sink))?;

        let belts = match component.as_pulley_mut() {
            Some(pulley) => pulley.receive(signal),
            None => return component.receive(signal, world),
        };
        for (driven, forwarded) in belts {
            self.deliver(driven, forwarded)?;
        }
        self.publish(sink, signal)
    }
}

/// Forwards engine contact events to the components registered in the router.
struct ContactDispatch<'a> {
    router: &'a ContactRouter,
    components: &'a mut [Component],
}

impl ContactListener for ContactDispatch<'_> {
    fn begin_contact(&mut self, contact: &Contact) {
        for handle in self.router.listeners_for(contact) {
            if let Some(component) = self.components.get_mut(handle.component().index()) {
                component.begin_contact(contact);
            }
        }
    }

    fn pre_solve(
        &mut self,
        contact: &mut Contact,
        _old_manifold: &Manifold,
        bodies: &mut Arena<RigidBody>,
    ) {
        let handles: Vec<_> = self.router.listeners_for(contact).collect();
        for handle in handles {
            if let Some(component) = self.components.get_mut(handle.component().index()) {
                component.pre_solve(contact, bodies);
            }
        }
    }
}

/// Installs `component` into `world` and registers its contact listener.
fn install_component(
    world: &mut PhysicsWorld,
    router: &mut ContactRouter,
    component: &mut Component,
    id: ComponentId,
) -> Result<()> {
    if let Some(body) = component.install(world)? {
        if let Some(handle) = component.listener_handle(id) {
            router.add(body, handle);
        }
    }
    Ok(())
}

/// One machine with its own world, components and frame counter.
///
/// Replaying the same frames from a reset always produces the same poses: the world
/// is rebuilt from scratch and components are reinstalled in insertion order.
pub struct Machine {
    id: u32,
    settings: SimulationSettings,
    world: PhysicsWorld,
    router: ContactRouter,
    components: Vec<Component>,
    frame: u64,
    location: DVec2,
}

impl Machine {
    pub fn new(id: u32) -> Self {
        Self::with_settings(id, SimulationSettings::default())
    }

    pub fn with_settings(id: u32, settings: SimulationSettings) -> Self {
        Self {
            id,
            world: PhysicsWorld::with_settings(&settings),
            settings,
            router: ContactRouter::new(),
            components: Vec::new(),
            frame: 0,
            location: DVec2::ZERO,
        }
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn settings(&self) -> &SimulationSettings {
        &self.settings
    }

    pub fn world(&self) -> &PhysicsWorld {
        &self.world
    }

    /// Direct access to the world. Bodies created here are lost on the next reset.
    pub fn world_mut(&mut self) -> &mut PhysicsWorld {
        &mut self.world
    }

    pub fn router(&self) -> &ContactRouter {
        &self.router
    }

    pub fn components(&self) -> &[Component] {
        &self.components
    }

    pub fn component(&self, id: ComponentId) -> Option<&Component> {
        self.components.get(id.index())
    }

    /// Origin of the machine in host coordinates.
    pub fn location(&self) -> DVec2 {
        self.location
    }

    pub fn set_location(&mut self, location: DVec2) {
        self.location = location;
    }

    pub fn frame(&self) -> u64 {
        self.frame
    }

    pub fn frame_rate(&self) -> f64 {
        self.settings.frame_rate
    }

    pub fn set_frame_rate(&mut self, frame_rate: f64) -> Result<()> {
        if !(frame_rate > 0.0 && frame_rate.is_finite()) {
            return Err(MachineError::InvalidFrameRate(frame_rate));
        }
        self.settings.frame_rate = frame_rate;
        Ok(())
    }

    /// Simulation time of the current frame in seconds.
    pub fn time(&self) -> f64 {
        self.frame as f64 / self.settings.frame_rate
    }

    /// Appends `component`, creating its body and contact registration.
    pub fn add_component(&mut self, component: impl Into<Component>) -> Result<ComponentId> {
        let mut component = component.into();
        let id = ComponentId(self.components.len());
        install_component(&mut self.world, &mut self.router, &mut component, id)?;
        debug!("machine {} added {} {:?}", self.id, component.name(), id);
        self.components.push(component);
        Ok(id)
    }

    fn checked(&self, id: ComponentId) -> std::result::Result<&Component, WiringError> {
        self.component(id).ok_or(WiringError::UnknownComponent(id))
    }

    /// Whether rotation leaving `from` can reach `to`.
    fn reaches(&self, from: ComponentId, to: ComponentId) -> bool {
        let mut visited = BTreeSet::new();
        let mut stack = vec![from];
        while let Some(id) = stack.pop() {
            if id == to {
                return true;
            }
            if !visited.insert(id) {
                continue;
            }
            if let Some(component) = self.component(id) {
                stack.extend(component.downstream());
            }
        }
        false
    }

    /// Registers `sink` on the rotation source of `source`. Sinks receive signals in
    /// the order they were added. A pulley added this way turns with `source` one to one.
    pub fn add_sink(&mut self, source: ComponentId, sink: ComponentId) -> Result<()> {
        let source_component = self.checked(source)?;
        let sink_component = self.checked(sink)?;
        let Some(rotation_source) = source_component.rotation_source() else {
            return Err(WiringError::NotASource(source).into());
        };
        if !sink_component.is_sink() {
            return Err(WiringError::NotASink(sink).into());
        }
        if rotation_source.contains(sink) {
            return Err(WiringError::DuplicateSink { from: source, sink }.into());
        }
        if self.reaches(sink, source) {
            return Err(WiringError::RotationCycle { from: source, to: sink }.into());
        }
        if sink_component.is_static_shape() {
            warn!("static shape {sink:?} wired to {source:?} will ignore rotation");
        }

        if let Some(rotation_source) = self.components[source.index()].rotation_source_mut() {
            rotation_source.add_sink(sink);
        }
        self.components[sink.index()].set_driver(source);
        Ok(())
    }

    /// Connects two pulleys with a belt. `driven` turns at `driver`'s speed times the
    /// ratio of their radii.
    pub fn drive(&mut self, driver: ComponentId, driven: ComponentId) -> Result<()> {
        let driver_pulley = self
            .checked(driver)?
            .as_pulley()
            .ok_or(WiringError::NotAPulley(driver))?;
        let driven_radius = self
            .checked(driven)?
            .as_pulley()
            .ok_or(WiringError::NotAPulley(driven))?
            .radius();
        if driver == driven {
            return Err(WiringError::SelfDrive(driver).into());
        }
        if driver_pulley.drives(driven) {
            return Err(WiringError::DuplicateSink {
                from: driver,
                sink: driven,
            }
            .into());
        }
        if self.reaches(driven, driver) {
            return Err(WiringError::RotationCycle {
                from: driver,
                to: driven,
            }
            .into());
        }

        if let Some(pulley) = self.components[driver.index()].as_pulley_mut() {
            pulley.add_belt(driven, driven_radius);
        }
        self.components[driven.index()].set_driver(driver);
        Ok(())
    }

    /// Publishes `signal` from the rotation source of `source` through the graph.
    pub fn publish(&mut self, source: ComponentId, signal: Signal) -> Result<()> {
        Dispatcher {
            components: &mut self.components,
            world: &mut self.world,
        }
        .publish(source, signal)
    }

    /// Steps the world once, then updates every component at simulation time `time`.
    pub fn update(&mut self, time: f64) -> Result<()> {
        let _timer = ScopedTimer::new("machine::update");
        let dt = self.settings.time_step() as f32;
        let mut listener = ContactDispatch {
            router: &self.router,
            components: &mut self.components,
        };
        self.world.step(
            dt,
            self.settings.velocity_iterations,
            self.settings.position_iterations,
            &mut listener,
        );

        for index in 0..self.components.len() {
            let id = ComponentId(index);
            if let Some(signal) = self.components[index].update(time, &mut self.world)? {
                self.publish(id, signal)?;
            }
        }
        Ok(())
    }

    /// Moves to the next frame.
    pub fn advance(&mut self) -> Result<()> {
        self.frame += 1;
        self.update(self.time())
    }

    /// Moves to `target`, resetting first if it lies in the past.
    pub fn seek(&mut self, target: u64) -> Result<()> {
        if target < self.frame {
            debug!("machine {} rewinding {} -> {target}", self.id, self.frame);
            self.reset()?;
        }
        while self.frame < target {
            self.advance()?;
        }
        Ok(())
    }

    /// Rebuilds the world and puts every component back at its initial pose and state.
    pub fn reset(&mut self) -> Result<()> {
        debug!("machine {} reset at frame {}", self.id, self.frame);
        self.world = PhysicsWorld::with_settings(&self.settings);
        self.router = ContactRouter::new();
        for (index, component) in self.components.iter_mut().enumerate() {
            component.clear_body();
            component.reset_state();
            install_component(&mut self.world, &mut self.router, component, ComponentId(index))?;
        }
        self.frame = 0;
        Ok(())
    }

    /// Draws belts first so pulley faces cover them, then every component.
    pub fn draw(&self, gfx: &mut dyn Graphics) {
        gfx.push_state();
        gfx.translate(self.location.x, self.location.y);
        gfx.scale(1.0, -1.0);

        for component in &self.components {
            if let Some(pulley) = component.as_pulley() {
                let driven: Vec<_> = pulley
                    .belts()
                    .iter()
                    .filter_map(|belt| self.component(belt.driven).and_then(Component::as_pulley))
                    .map(|driven| (driven.position(), driven.radius()))
                    .collect();
                pulley.draw_belts(gfx, &driven);
            }
        }

        for component in &self.components {
            component.draw(gfx, &self.world);
        }

        gfx.pop_state();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::{Pulley, Shape};

    fn pulley(machine: &mut Machine, radius: f64) -> ComponentId {
        machine
            .add_component(Pulley::new(radius).expect("radius"))
            .expect("pulleys have no body")
    }

    #[test]
    fn cycles_are_rejected_at_wiring_time() {
        let mut machine = Machine::new(1);
        let a = pulley(&mut machine, 10.0);
        let b = pulley(&mut machine, 10.0);
        let c = pulley(&mut machine, 20.0);

        machine.add_sink(a, b).expect("coaxial pair");
        machine.drive(b, c).expect("belt");
        assert!(matches!(
            machine.add_sink(c, a),
            Err(MachineError::Wiring(WiringError::RotationCycle { .. }))
        ));
        assert!(matches!(
            machine.drive(c, a),
            Err(MachineError::Wiring(WiringError::RotationCycle { .. }))
        ));
        assert!(matches!(
            machine.add_sink(b, b),
            Err(MachineError::Wiring(WiringError::RotationCycle { .. }))
        ));
    }

    #[test]
    fn sinks_must_be_able_to_receive() {
        let mut machine = Machine::new(1);
        let motor = machine
            .add_component(crate::components::Motor::new("images"))
            .expect("motor box installs");
        let p = pulley(&mut machine, 10.0);
        assert!(matches!(
            machine.add_sink(p, motor),
            Err(MachineError::Wiring(WiringError::NotASink(id))) if id == motor
        ));

        let mut ball = Shape::new();
        ball.circle(10.0);
        let ball = machine.add_component(ball).expect("ball");
        assert!(matches!(
            machine.add_sink(ball, p),
            Err(MachineError::Wiring(WiringError::NotASource(_)))
        ));
        assert!(matches!(
            machine.drive(p, ball),
            Err(MachineError::Wiring(WiringError::NotAPulley(_)))
        ));
    }

    #[test]
    fn add_component_registers_contact_listeners() {
        let mut machine = Machine::new(1);
        let mut conveyor = crate::components::Conveyor::new();
        conveyor.set_size(100.0, 15.0);
        let id = machine.add_component(conveyor).expect("conveyor");
        let body = machine
            .component(id)
            .and_then(Component::body)
            .expect("installed");
        assert_eq!(
            machine.router().listener(body),
            Some(crate::router::ListenerHandle::Conveyor(id))
        );
    }
}
