use std::collections::{BTreeMap, BTreeSet};

use log::trace;

use crate::{
    collision::{
        broadphase::BroadPhase,
        contact::{Contact, ContactEdge, ContactListener},
        narrowphase::NarrowPhase,
    },
    config::{AABB_MARGIN, DEFAULT_BROADPHASE_CELL_SIZE},
    core::{rigidbody::RigidBody, types::MaterialPairProperties},
    utils::allocator::{Arena, BodyId},
};

type PairKey = (BodyId, BodyId);

fn pair_key(a: BodyId, b: BodyId) -> PairKey {
    if a < b {
        (a, b)
    } else {
        (b, a)
    }
}

/// Owns the persistent contacts of a world and keeps them in step with the broad-phase.
pub struct ContactManager {
    broadphase: BroadPhase,
    contacts: BTreeMap<PairKey, Contact>,
}

impl Default for ContactManager {
    fn default() -> Self {
        Self::new()
    }
}

impl ContactManager {
    pub fn new() -> Self {
        Self {
            broadphase: BroadPhase::new(DEFAULT_BROADPHASE_CELL_SIZE, AABB_MARGIN),
            contacts: BTreeMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.contacts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contacts.is_empty()
    }

    pub fn contacts(&self) -> impl Iterator<Item = &Contact> + '_ {
        self.contacts.values()
    }

    pub fn contacts_mut(&mut self) -> impl Iterator<Item = &mut Contact> + '_ {
        self.contacts.values_mut()
    }

    pub fn contact_between(&self, a: BodyId, b: BodyId) -> Option<&Contact> {
        self.contacts.get(&pair_key(a, b))
    }

    /// Contact list of one body, in deterministic order.
    pub fn contact_edges(&self, body: BodyId) -> Vec<ContactEdge> {
        self.contacts
            .values()
            .filter_map(|contact| {
                contact.other(body).map(|other| ContactEdge {
                    other,
                    touching: contact.is_touching(),
                })
            })
            .collect()
    }

    /// Drops every contact that involves `body` without reporting it.
    pub fn remove_body(&mut self, body: BodyId) {
        self.contacts.retain(|_, contact| !contact.involves(body));
    }

    fn should_collide(a: &RigidBody, b: &RigidBody) -> bool {
        a.is_dynamic() || b.is_dynamic()
    }

    /// Creates contacts for new overlapping pairs, destroys stale ones and runs the
    /// narrow phase on the rest, firing listener callbacks along the way.
    pub fn update_contacts(
        &mut self,
        bodies: &mut Arena<RigidBody>,
        listener: &mut dyn ContactListener,
    ) {
        let pairs: BTreeSet<PairKey> = self
            .broadphase
            .find_pairs(bodies)
            .into_iter()
            .filter(|(a, b)| match (bodies.get(*a), bodies.get(*b)) {
                (Some(body_a), Some(body_b)) => Self::should_collide(body_a, body_b),
                _ => false,
            })
            .collect();

        let stale: Vec<PairKey> = self
            .contacts
            .keys()
            .filter(|key| !pairs.contains(key))
            .copied()
            .collect();
        for key in stale {
            if let Some(contact) = self.contacts.remove(&key) {
                if contact.is_touching() {
                    listener.end_contact(&contact);
                }
                trace!("contact {:?} destroyed", key);
            }
        }

        for key in pairs {
            if self.contacts.contains_key(&key) {
                continue;
            }
            if let Some(contact) = Self::create_contact(bodies, key) {
                self.contacts.insert(key, contact);
            }
        }

        for contact in self.contacts.values_mut() {
            Self::update_contact(contact, bodies, listener);
        }
    }

    fn create_contact(bodies: &Arena<RigidBody>, key: PairKey) -> Option<Contact> {
        let first = bodies.get(key.0)?;
        let second = bodies.get(key.1)?;

        // polygon first for mixed pairs
        let swap = NarrowPhase::shape_rank(&second.collider.shape)
            > NarrowPhase::shape_rank(&first.collider.shape);
        let (id_a, body_a, id_b, body_b) = if swap {
            (key.1, second, key.0, first)
        } else {
            (key.0, first, key.1, second)
        };

        let mixed =
            MaterialPairProperties::from_materials(&body_a.collider.material, &body_b.collider.material);
        Some(Contact::new(id_a, id_b, mixed.friction, mixed.restitution))
    }

    fn update_contact(
        contact: &mut Contact,
        bodies: &mut Arena<RigidBody>,
        listener: &mut dyn ContactListener,
    ) {
        let old_manifold = contact.manifold.clone();
        contact.reset_per_step_state();

        let mut manifold = match (bodies.get(contact.body_a), bodies.get(contact.body_b)) {
            (Some(a), Some(b)) => {
                NarrowPhase::collide(&a.collider.shape, &a.transform, &b.collider.shape, &b.transform)
            }
            _ => Default::default(),
        };

        for point in &mut manifold.points {
            if let Some(old) = old_manifold.points.iter().find(|old| old.id == point.id) {
                point.normal_impulse = old.normal_impulse;
                point.tangent_impulse = old.tangent_impulse;
            }
        }

        let was_touching = contact.is_touching();
        let touching = manifold.point_count() > 0;
        contact.manifold = manifold;
        contact.set_touching(touching);

        if !was_touching && touching {
            listener.begin_contact(contact);
        }
        if was_touching && !touching {
            listener.end_contact(contact);
        }
        if touching {
            listener.pre_solve(contact, &old_manifold, bodies);
        }
    }
}
