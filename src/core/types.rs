use glam::{Mat2, Vec2};
use serde::{Deserialize, Serialize};

/// Position and orientation of a body in the plane (metres, radians).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub position: Vec2,
    pub angle: f32,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec2::ZERO,
            angle: 0.0,
        }
    }
}

impl Transform {
    pub fn new(position: Vec2, angle: f32) -> Self {
        Self { position, angle }
    }

    pub fn rotation(&self) -> Mat2 {
        Mat2::from_angle(self.angle)
    }

    /// Maps a body-local point into world space.
    pub fn apply(&self, local: Vec2) -> Vec2 {
        self.position + self.rotation() * local
    }

    /// Maps a world point into body-local space.
    pub fn apply_inverse(&self, world: Vec2) -> Vec2 {
        self.rotation().transpose() * (world - self.position)
    }

    pub fn rotate(&self, v: Vec2) -> Vec2 {
        self.rotation() * v
    }

    pub fn rotate_inverse(&self, v: Vec2) -> Vec2 {
        self.rotation().transpose() * v
    }
}

/// Linear and angular velocity of a rigid body.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Velocity {
    pub linear: Vec2,
    pub angular: f32,
}

/// Mass, local centre of mass and rotational inertia about that centre.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MassProperties {
    pub mass: f32,
    pub center: Vec2,
    pub inertia: f32,
}

impl Default for MassProperties {
    fn default() -> Self {
        Self {
            mass: 1.0,
            center: Vec2::ZERO,
            inertia: 0.0,
        }
    }
}

/// How a body takes part in the simulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum BodyType {
    /// Never moves. Infinite mass.
    #[default]
    Static,
    /// Moves by its velocity only. Infinite mass, ignores gravity and contacts.
    Kinematic,
    /// Fully simulated.
    Dynamic,
}

/// Material coefficients that affect interactions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Material {
    pub density: f32,
    pub friction: f32,
    pub restitution: f32,
    /// How this material mixes its coefficients with another material.
    pub mixing: MaterialMixing,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            density: 1.0,
            friction: 0.2,
            restitution: 0.0,
            mixing: MaterialMixing::default(),
        }
    }
}

impl Material {
    pub fn new(density: f32, friction: f32, restitution: f32) -> Self {
        Self {
            density,
            friction,
            restitution,
            mixing: MaterialMixing::default(),
        }
    }

    pub fn combine_with(&self, other: &Self) -> MaterialPairProperties {
        let friction_mode = self.mixing.friction.resolve(other.mixing.friction);
        let restitution_mode = self.mixing.restitution.resolve(other.mixing.restitution);
        MaterialPairProperties {
            friction: friction_mode.combine(self.friction, other.friction),
            restitution: restitution_mode.combine(self.restitution, other.restitution),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MaterialMixing {
    pub friction: MixingMode,
    pub restitution: MixingMode,
}

impl Default for MaterialMixing {
    fn default() -> Self {
        Self {
            friction: MixingMode::GeometricMean,
            restitution: MixingMode::Max,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Default)]
pub enum MixingMode {
    Average,
    Min,
    Max,
    #[default]
    GeometricMean,
}

impl MixingMode {
    fn combine(self, a: f32, b: f32) -> f32 {
        match self {
            MixingMode::Average => 0.5 * (a + b),
            MixingMode::Min => a.min(b),
            MixingMode::Max => a.max(b),
            MixingMode::GeometricMean => (a.abs() * b.abs()).sqrt(),
        }
    }

    /// The lower-ranked mode wins so a pair mixes the same in either order.
    fn resolve(self, other: MixingMode) -> MixingMode {
        self.min(other)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MaterialPairProperties {
    pub friction: f32,
    pub restitution: f32,
}

impl MaterialPairProperties {
    pub fn from_materials(a: &Material, b: &Material) -> Self {
        a.combine_with(b)
    }
}
