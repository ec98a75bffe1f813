use crate::common::PhysicsConfig;
use crate::objects::PhysicsBody;

/// Returns true when `dt` can advance the simulation.
pub fn is_valid_timestep(dt: f64) -> bool {
    dt.is_finite() && dt > 0.0
}

/// Advances one body by a fixed timestep using semi-implicit Euler.
///
/// Order per step: gravity, damping (one multiply per step), speed clamp,
/// then position. Static and frozen bodies are left untouched, and an
/// invalid `dt` is a no-op.
pub fn integrate(body: &mut PhysicsBody, config: &PhysicsConfig, dt: f64) {
    if !is_valid_timestep(dt) || !body.is_moving() {
        return;
    }

    // --- Linear Motion --- //
    // Positive gravity pulls towards -Y
    body.velocity.y -= config.gravity() * body.gravity_scale() * dt;
    body.velocity = body.velocity * body.damping();
    body.velocity = body.velocity.clamp_length(config.max_speed());
    body.position += body.velocity * dt;

    // --- Angular Motion --- //
    body.angular_velocity = body.angular_velocity * body.angle_damping();
    body.angle += body.angular_velocity * dt;
}
