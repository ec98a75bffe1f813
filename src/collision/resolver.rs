//! Impulse-based response for a single contact.

use super::manifold::CollisionManifold;
use crate::objects::PhysicsBody;

/// What resolving one manifold did to the pair.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Resolution {
    /// Scalar impulse applied along the normal (0 when already separating).
    pub normal_impulse: f64,
    /// Scalar impulse applied along the tangent.
    pub tangent_impulse: f64,
}

/// Separates the pair and corrects their velocities in one pass.
///
/// 1. Push the bodies apart along the normal by the full depth, split by
///    inverse mass (an immovable body takes none of it).
/// 2. If they are approaching along the normal, apply a restitution impulse
///    using the larger elasticity of the two.
/// 3. On the same approach, remove `(1 - friction)` of the tangential
///    relative velocity, friction being the smaller of the two.
///
/// Also flags whichever body was pushed towards +Y as on the ground.
pub fn resolve_collision(
    body_a: &mut PhysicsBody,
    body_b: &mut PhysicsBody,
    manifold: &CollisionManifold,
) -> Resolution {
    let inv_mass_a = body_a.inv_mass();
    let inv_mass_b = body_b.inv_mass();
    let total_inv_mass = inv_mass_a + inv_mass_b;

    // Nothing can move; broad phase normally filters these out
    if total_inv_mass <= 0.0 {
        return Resolution::default();
    }

    let normal = manifold.normal;

    // --- Positional correction --- //
    let correction = normal * (manifold.depth / total_inv_mass);
    body_a.position -= correction * inv_mass_a;
    body_b.position += correction * inv_mass_b;

    if normal.y > 0.0 && inv_mass_b > 0.0 {
        body_b.set_on_ground(true);
    } else if normal.y < 0.0 && inv_mass_a > 0.0 {
        body_a.set_on_ground(true);
    }

    // --- Normal impulse --- //
    let relative_velocity = body_b.velocity - body_a.velocity;
    let velocity_along_normal = relative_velocity.dot(normal);

    // Already moving apart, never pull them together
    if velocity_along_normal > 0.0 {
        return Resolution::default();
    }

    let elasticity = body_a.material().combined_elasticity(body_b.material());
    let normal_impulse = -(1.0 + elasticity) * velocity_along_normal / total_inv_mass;
    let impulse = normal * normal_impulse;
    body_a.velocity -= impulse * inv_mass_a;
    body_b.velocity += impulse * inv_mass_b;

    // --- Friction --- //
    let tangent = manifold.tangent();
    let velocity_along_tangent = (body_b.velocity - body_a.velocity).dot(tangent);
    let friction = body_a.material().combined_friction(body_b.material());
    let tangent_impulse = -velocity_along_tangent * (1.0 - friction) / total_inv_mass;
    let impulse = tangent * tangent_impulse;
    body_a.velocity -= impulse * inv_mass_a;
    body_b.velocity += impulse * inv_mass_b;

    Resolution {
        normal_impulse,
        tangent_impulse,
    }
}
