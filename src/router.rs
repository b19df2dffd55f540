//! Maps engine bodies to the components that want their contact events.

use std::collections::BTreeMap;

use log::trace;

use crate::{collision::contact::Contact, components::ComponentId, utils::allocator::BodyId};

/// Which contact behaviour a registered component has.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ListenerHandle {
    /// Switches on when anything touches it.
    Motor(ComponentId),
    /// Drags touching bodies along its surface.
    Conveyor(ComponentId),
    /// Carries touching bodies with it.
    Elevator(ComponentId),
}

impl ListenerHandle {
    pub fn component(&self) -> ComponentId {
        match *self {
            ListenerHandle::Motor(id) | ListenerHandle::Conveyor(id) | ListenerHandle::Elevator(id) => id,
        }
    }
}

/// Body-to-listener table consulted for every contact event of a step.
#[derive(Debug, Clone, Default)]
pub struct ContactRouter {
    listeners: BTreeMap<BodyId, ListenerHandle>,
}

impl ContactRouter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `handle` for `body`, replacing any earlier registration.
    pub fn add(&mut self, body: BodyId, handle: ListenerHandle) {
        trace!("routing contacts of {body:?} to {handle:?}");
        self.listeners.insert(body, handle);
    }

    pub fn remove(&mut self, body: BodyId) -> Option<ListenerHandle> {
        self.listeners.remove(&body)
    }

    pub fn clear(&mut self) {
        self.listeners.clear();
    }

    pub fn listener(&self, body: BodyId) -> Option<ListenerHandle> {
        self.listeners.get(&body).copied()
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    /// Listeners interested in `contact`: body A's first, then body B's.
    pub fn listeners_for(&self, contact: &Contact) -> impl Iterator<Item = ListenerHandle> {
        let a = self.listener(contact.body_a);
        let b = if contact.body_b == contact.body_a {
            None
        } else {
            self.listener(contact.body_b)
        };
        a.into_iter().chain(b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::allocator::Arena;

    #[test]
    fn listeners_are_reported_a_then_b() {
        let mut arena = Arena::new();
        let a = arena.insert(());
        let b = arena.insert(());
        let c = arena.insert(());

        let mut router = ContactRouter::new();
        router.add(b, ListenerHandle::Conveyor(ComponentId(1)));
        router.add(a, ListenerHandle::Motor(ComponentId(0)));

        let contact = Contact::new(a, b, 0.2, 0.0);
        let handles: Vec<_> = router.listeners_for(&contact).collect();
        assert_eq!(
            handles,
            vec![
                ListenerHandle::Motor(ComponentId(0)),
                ListenerHandle::Conveyor(ComponentId(1))
            ]
        );

        let unrelated = Contact::new(c, b, 0.2, 0.0);
        assert_eq!(router.listeners_for(&unrelated).count(), 1);

        router.clear();
        assert!(router.is_empty());
        assert_eq!(router.listeners_for(&contact).count(), 0);
    }
}
