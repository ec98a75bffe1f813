use std::fmt;

use crate::collision::AABB;
use crate::common::material::clamp_unit;
use crate::common::{Material, PhysicsConfig};
use crate::math::vec2::Vec2;

/// Opaque identifier for a body owned by a `PhysicsWorld`. Never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BodyHandle(pub(crate) u64);

impl fmt::Display for BodyHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

fn sanitize_size(size: Vec2) -> Vec2 {
    let axis = |v: f64| if v.is_nan() { 0.0 } else { v.abs() };
    Vec2::new(axis(size.x), axis(size.y))
}

/// One simulated entity: an axis-aligned box with kinematic state and
/// tunable response coefficients.
#[derive(Debug, Clone, PartialEq)]
pub struct PhysicsBody {
    // Primary state, written directly by gameplay code without validation
    pub position: Vec2, // World-space center
    pub velocity: Vec2, // Units per second
    pub angle: f64,     // Radians
    pub angular_velocity: f64,

    /// Takes part in broad/narrow phase when true.
    pub collidable: bool,
    /// Moved by the integrator and by collision response when true.
    pub dynamic: bool,

    // Coefficients, clamped on assignment
    size: Vec2, // Half-extents
    mass: f64,  // <= 0 means static
    damping: f64,
    angle_damping: f64,
    gravity_scale: f64,
    material: Material,

    on_ground: bool,
}

impl PhysicsBody {
    /// Creates a body at `position` with half-extents `size`, copying every
    /// coefficient from the config's current defaults.
    pub fn new(config: &PhysicsConfig, position: Vec2, size: Vec2) -> Self {
        Self {
            position,
            velocity: Vec2::ZERO,
            angle: 0.0,
            angular_velocity: 0.0,
            collidable: true,
            dynamic: true,
            size: sanitize_size(size),
            mass: config.default_mass(),
            damping: config.default_damping(),
            angle_damping: config.default_angle_damping(),
            gravity_scale: 1.0,
            material: Material::new(config.default_elasticity(), config.default_friction()),
            on_ground: false,
        }
    }

    /// Half-extents of the bounding box.
    pub fn size(&self) -> Vec2 {
        self.size
    }

    pub fn mass(&self) -> f64 {
        self.mass
    }

    pub fn damping(&self) -> f64 {
        self.damping
    }

    pub fn angle_damping(&self) -> f64 {
        self.angle_damping
    }

    pub fn elasticity(&self) -> f64 {
        self.material.elasticity()
    }

    pub fn friction(&self) -> f64 {
        self.material.friction()
    }

    pub fn material(&self) -> &Material {
        &self.material
    }

    pub fn gravity_scale(&self) -> f64 {
        self.gravity_scale
    }

    /// True when this body was pushed up out of something during the last
    /// `advance`, i.e. it is resting on or landed on another body.
    pub fn on_ground(&self) -> bool {
        self.on_ground
    }

    /// Negative components are mirrored to positive, NaN becomes 0.
    pub fn set_size(&mut self, size: Vec2) {
        self.size = sanitize_size(size);
    }

    /// Zero, negative or NaN mass makes the body static.
    pub fn set_mass(&mut self, mass: f64) {
        self.mass = if mass.is_nan() { 0.0 } else { mass };
    }

    pub fn set_damping(&mut self, damping: f64) {
        self.damping = clamp_unit(damping, self.damping);
    }

    pub fn set_angle_damping(&mut self, angle_damping: f64) {
        self.angle_damping = clamp_unit(angle_damping, self.angle_damping);
    }

    pub fn set_elasticity(&mut self, elasticity: f64) {
        self.material.set_elasticity(elasticity);
    }

    pub fn set_friction(&mut self, friction: f64) {
        self.material.set_friction(friction);
    }

    /// Non-finite scales are ignored.
    pub fn set_gravity_scale(&mut self, scale: f64) {
        if scale.is_finite() {
            self.gravity_scale = scale;
        }
    }

    pub(crate) fn set_on_ground(&mut self, on_ground: bool) {
        self.on_ground = on_ground;
    }

    /// Infinite-mass body: mass <= 0 (or infinite).
    pub fn is_static(&self) -> bool {
        !(self.mass > 0.0 && self.mass.is_finite())
    }

    /// True when the integrator advances this body.
    pub fn is_moving(&self) -> bool {
        self.dynamic && !self.is_static()
    }

    /// `1 / mass`, or 0 for bodies collision response must never move.
    pub fn inv_mass(&self) -> f64 {
        if self.is_moving() {
            1.0 / self.mass
        } else {
            0.0
        }
    }

    /// World-space bounding box, `position ± size`.
    pub fn aabb(&self) -> AABB {
        AABB::from_center(self.position, self.size)
    }

    pub(crate) fn first_non_finite_field(&self) -> Option<&'static str> {
        if !self.position.is_finite() {
            Some("position")
        } else if !self.velocity.is_finite() {
            Some("velocity")
        } else if !self.size.is_finite() {
            Some("size")
        } else if !self.angle.is_finite() || !self.angular_velocity.is_finite() {
            Some("angle")
        } else {
            None
        }
    }
}

/// Spawn description: required geometry plus optional per-body overrides.
/// Anything left as `None` is taken from the config at build time.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BodyDesc {
    pub position: Vec2,
    pub size: Vec2,
    pub velocity: Vec2,
    pub angle: f64,
    pub angular_velocity: f64,
    pub mass: Option<f64>,
    pub damping: Option<f64>,
    pub angle_damping: Option<f64>,
    pub elasticity: Option<f64>,
    pub friction: Option<f64>,
    pub gravity_scale: Option<f64>,
    pub collidable: Option<bool>,
    pub dynamic: Option<bool>,
}

impl BodyDesc {
    pub fn new(position: Vec2, size: Vec2) -> Self {
        Self {
            position,
            size,
            ..Default::default()
        }
    }

    /// A zero-mass body that never moves but still blocks others.
    pub fn fixed(position: Vec2, size: Vec2) -> Self {
        Self::new(position, size).mass(0.0)
    }

    pub fn velocity(mut self, velocity: Vec2) -> Self {
        self.velocity = velocity;
        self
    }

    pub fn angle(mut self, angle: f64, angular_velocity: f64) -> Self {
        self.angle = angle;
        self.angular_velocity = angular_velocity;
        self
    }

    pub fn mass(mut self, mass: f64) -> Self {
        self.mass = Some(mass);
        self
    }

    pub fn damping(mut self, damping: f64) -> Self {
        self.damping = Some(damping);
        self
    }

    pub fn angle_damping(mut self, angle_damping: f64) -> Self {
        self.angle_damping = Some(angle_damping);
        self
    }

    pub fn elasticity(mut self, elasticity: f64) -> Self {
        self.elasticity = Some(elasticity);
        self
    }

    pub fn friction(mut self, friction: f64) -> Self {
        self.friction = Some(friction);
        self
    }

    pub fn gravity_scale(mut self, scale: f64) -> Self {
        self.gravity_scale = Some(scale);
        self
    }

    pub fn collidable(mut self, collidable: bool) -> Self {
        self.collidable = Some(collidable);
        self
    }

    pub fn dynamic(mut self, dynamic: bool) -> Self {
        self.dynamic = Some(dynamic);
        self
    }

    /// Builds the body, routing every override through the clamping setters.
    pub fn build(&self, config: &PhysicsConfig) -> PhysicsBody {
        let mut body = PhysicsBody::new(config, self.position, self.size);
        body.velocity = self.velocity;
        body.angle = self.angle;
        body.angular_velocity = self.angular_velocity;
        if let Some(mass) = self.mass {
            body.set_mass(mass);
        }
        if let Some(damping) = self.damping {
            body.set_damping(damping);
        }
        if let Some(angle_damping) = self.angle_damping {
            body.set_angle_damping(angle_damping);
        }
        if let Some(elasticity) = self.elasticity {
            body.set_elasticity(elasticity);
        }
        if let Some(friction) = self.friction {
            body.set_friction(friction);
        }
        if let Some(scale) = self.gravity_scale {
            body.set_gravity_scale(scale);
        }
        if let Some(collidable) = self.collidable {
            body.collidable = collidable;
        }
        if let Some(dynamic) = self.dynamic {
            body.dynamic = dynamic;
        }
        body
    }
}
