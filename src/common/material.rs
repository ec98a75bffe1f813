//! Surface coefficients that govern contact response.

/// Clamps a coefficient into [0, 1]. NaN maps to `fallback`.
pub(crate) fn clamp_unit(value: f64, fallback: f64) -> f64 {
    if value.is_nan() {
        fallback
    } else {
        value.clamp(0.0, 1.0)
    }
}

/// Represents the surface properties of a body affecting collisions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Material {
    /// Restitution. Range [0, 1].
    /// 0 = perfectly inelastic (no bounce), 1 = perfectly elastic.
    elasticity: f64,
    /// Fraction of tangential relative velocity retained on contact. Range [0, 1].
    /// 1 = frictionless, 0 = contact stops all sliding.
    friction: f64,
}

impl Material {
    /// Creates a new material, clamping both coefficients into [0, 1].
    pub fn new(elasticity: f64, friction: f64) -> Self {
        Material {
            elasticity: clamp_unit(elasticity, 0.0),
            friction: clamp_unit(friction, 1.0),
        }
    }

    pub fn elasticity(&self) -> f64 {
        self.elasticity
    }

    pub fn friction(&self) -> f64 {
        self.friction
    }

    pub fn set_elasticity(&mut self, elasticity: f64) {
        self.elasticity = clamp_unit(elasticity, self.elasticity);
    }

    pub fn set_friction(&mut self, friction: f64) {
        self.friction = clamp_unit(friction, self.friction);
    }

    /// Restitution for a contact between two materials: the bouncier one wins.
    pub fn combined_elasticity(&self, other: &Material) -> f64 {
        self.elasticity.max(other.elasticity)
    }

    /// Friction for a contact between two materials: the rougher one wins.
    pub fn combined_friction(&self, other: &Material) -> f64 {
        self.friction.min(other.friction)
    }
}
