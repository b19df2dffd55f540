use std::collections::{BTreeMap, BTreeSet};

use glam::Vec2;

use crate::{
    collision::shapes::Aabb,
    core::rigidbody::RigidBody,
    utils::allocator::{Arena, BodyId},
};

/// Uniform grid spatial partitioning used by the broad-phase.
///
/// Cells are kept in an ordered map so that pair discovery is deterministic.
pub struct SpatialGrid {
    cell_size: f32,
    grid: BTreeMap<(i32, i32), Vec<BodyId>>,
}

impl SpatialGrid {
    pub fn new(cell_size: f32) -> Self {
        Self {
            cell_size,
            grid: BTreeMap::new(),
        }
    }

    fn world_to_grid(&self, pos: Vec2) -> (i32, i32) {
        (
            (pos.x / self.cell_size).floor() as i32,
            (pos.y / self.cell_size).floor() as i32,
        )
    }

    pub fn clear(&mut self) {
        self.grid.clear();
    }

    pub fn insert(&mut self, id: BodyId, aabb: &Aabb) {
        let min_cell = self.world_to_grid(aabb.min);
        let max_cell = self.world_to_grid(aabb.max);

        for x in min_cell.0..=max_cell.0 {
            for y in min_cell.1..=max_cell.1 {
                self.grid.entry((x, y)).or_default().push(id);
            }
        }
    }

    pub fn query(&self, aabb: &Aabb) -> Vec<BodyId> {
        let mut results = Vec::new();
        let min_cell = self.world_to_grid(aabb.min);
        let max_cell = self.world_to_grid(aabb.max);

        for x in min_cell.0..=max_cell.0 {
            for y in min_cell.1..=max_cell.1 {
                if let Some(entities) = self.grid.get(&(x, y)) {
                    results.extend(entities);
                }
            }
        }

        results.sort();
        results.dedup();
        results
    }
}

/// Broad phase driver returning body pairs whose fattened bounds overlap.
pub struct BroadPhase {
    grid: SpatialGrid,
    margin: f32,
    proxies: BTreeMap<BodyId, Aabb>,
}

impl BroadPhase {
    pub fn new(cell_size: f32, margin: f32) -> Self {
        Self {
            grid: SpatialGrid::new(cell_size),
            margin,
            proxies: BTreeMap::new(),
        }
    }

    /// Fattened bounds computed for `id` during the last update.
    pub fn fat_aabb(&self, id: BodyId) -> Option<&Aabb> {
        self.proxies.get(&id)
    }

    /// Rebuilds the grid from current poses and returns candidate pairs, each ordered
    /// `(lower id, higher id)`, in ascending order.
    pub fn find_pairs(&mut self, bodies: &Arena<RigidBody>) -> Vec<(BodyId, BodyId)> {
        self.grid.clear();
        self.proxies.clear();

        for (id, body) in bodies.iter() {
            let aabb = body.collider.compute_aabb(&body.transform).fattened(self.margin);
            self.grid.insert(id, &aabb);
            self.proxies.insert(id, aabb);
        }

        let mut pairs = BTreeSet::new();
        for (id, aabb) in &self.proxies {
            for other in self.grid.query(aabb) {
                if other <= *id {
                    continue;
                }
                let overlaps = self
                    .proxies
                    .get(&other)
                    .map(|other_aabb| aabb.overlaps(other_aabb))
                    .unwrap_or(false);
                if overlaps {
                    pairs.insert((*id, other));
                }
            }
        }

        pairs.into_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{
        collider::Collider,
        rigidbody::{BodyDef, RigidBody},
        types::BodyType,
    };

    fn ball_at(x: f32, y: f32) -> RigidBody {
        let def = BodyDef {
            body_type: BodyType::Dynamic,
            position: Vec2::new(x, y),
            ..BodyDef::default()
        };
        RigidBody::new(&def, Collider::builder().circle(0.25).build())
    }

    #[test]
    fn only_nearby_bodies_pair_up() {
        let mut bodies = Arena::new();
        let a = bodies.insert(ball_at(0.0, 0.0));
        let b = bodies.insert(ball_at(0.55, 0.0));
        let _far = bodies.insert(ball_at(5.0, 5.0));

        let mut broad_phase = BroadPhase::new(1.0, 0.1);
        let pairs = broad_phase.find_pairs(&bodies);
        assert_eq!(pairs, vec![(a, b)]);
    }

    #[test]
    fn bodies_spanning_many_cells_are_reported_once() {
        let mut bodies = Arena::new();
        let a = bodies.insert(ball_at(0.99, 0.99));
        let b = bodies.insert(ball_at(1.2, 1.2));
        let mut broad_phase = BroadPhase::new(1.0, 0.1);
        assert_eq!(broad_phase.find_pairs(&bodies), vec![(a, b)]);
    }
}
