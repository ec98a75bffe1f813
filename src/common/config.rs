//! Engine-wide physics tunables.

use serde::{Deserialize, Serialize};

use super::error::PhysicsError;
use super::material::clamp_unit;

/// Smallest grid cell edge accepted by the broad phase.
pub const MIN_CELL_SIZE: f64 = 1e-3;

/// Global physics settings.
///
/// Bodies copy the `default_*` coefficients when they are created, so later
/// changes only affect bodies spawned afterwards. `gravity`, `max_speed` and
/// `solver_enabled` are read by the world on every `advance`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsConfig {
    /// Gravity along the Y axis. Positive values pull bodies towards -Y.
    gravity: f64,
    /// Velocity magnitude clamp applied every step, limits tunneling.
    max_speed: f64,
    default_mass: f64,
    /// Fraction of velocity kept per fixed step.
    default_damping: f64,
    default_angle_damping: f64,
    default_elasticity: f64,
    default_friction: f64,
    /// When false, bodies still integrate but never collide.
    solver_enabled: bool,
    /// Edge length of a broad-phase grid cell, in world units.
    cell_size: f64,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            gravity: 0.0,
            max_speed: 1.0,
            default_mass: 1.0,
            default_damping: 1.0,
            default_angle_damping: 1.0,
            default_elasticity: 0.0,
            default_friction: 0.8,
            solver_enabled: true,
            cell_size: 4.0,
        }
    }
}

fn clamp_coefficient(name: &str, value: f64, fallback: f64) -> f64 {
    let clamped = clamp_unit(value, fallback);
    if clamped != value {
        log::warn!("{name} {value} out of range, using {clamped}");
    }
    clamped
}

impl PhysicsConfig {
    /// Parses a config from JSON. Missing fields take their defaults and
    /// out-of-range values are clamped the same way the setters clamp them.
    pub fn from_json(json: &str) -> Result<Self, PhysicsError> {
        let raw: PhysicsConfig = serde_json::from_str(json)?;
        let mut config = PhysicsConfig::default();
        config.set_gravity(raw.gravity);
        config.set_max_speed(raw.max_speed);
        config.set_default_mass(raw.default_mass);
        config.set_default_damping(raw.default_damping);
        config.set_default_angle_damping(raw.default_angle_damping);
        config.set_default_elasticity(raw.default_elasticity);
        config.set_default_friction(raw.default_friction);
        config.set_solver_enabled(raw.solver_enabled);
        config.set_cell_size(raw.cell_size);
        log::debug!("loaded physics config: {config:?}");
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String, PhysicsError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn gravity(&self) -> f64 {
        self.gravity
    }

    pub fn max_speed(&self) -> f64 {
        self.max_speed
    }

    pub fn default_mass(&self) -> f64 {
        self.default_mass
    }

    pub fn default_damping(&self) -> f64 {
        self.default_damping
    }

    pub fn default_angle_damping(&self) -> f64 {
        self.default_angle_damping
    }

    pub fn default_elasticity(&self) -> f64 {
        self.default_elasticity
    }

    pub fn default_friction(&self) -> f64 {
        self.default_friction
    }

    pub fn solver_enabled(&self) -> bool {
        self.solver_enabled
    }

    pub fn cell_size(&self) -> f64 {
        self.cell_size
    }

    /// Non-finite gravity is ignored.
    pub fn set_gravity(&mut self, gravity: f64) {
        if gravity.is_finite() {
            self.gravity = gravity;
        } else {
            log::warn!("ignoring non-finite gravity {gravity}");
        }
    }

    /// Negative speeds clamp to zero; NaN is ignored. Infinity disables the clamp.
    pub fn set_max_speed(&mut self, max_speed: f64) {
        if max_speed.is_nan() {
            log::warn!("ignoring NaN max speed");
            return;
        }
        self.max_speed = max_speed.max(0.0);
    }

    /// Zero or negative masses make new bodies static. NaN is ignored.
    pub fn set_default_mass(&mut self, mass: f64) {
        if mass.is_nan() {
            log::warn!("ignoring NaN default mass");
            return;
        }
        self.default_mass = mass;
    }

    pub fn set_default_damping(&mut self, damping: f64) {
        self.default_damping = clamp_coefficient("damping", damping, self.default_damping);
    }

    pub fn set_default_angle_damping(&mut self, damping: f64) {
        self.default_angle_damping =
            clamp_coefficient("angle damping", damping, self.default_angle_damping);
    }

    pub fn set_default_elasticity(&mut self, elasticity: f64) {
        self.default_elasticity =
            clamp_coefficient("elasticity", elasticity, self.default_elasticity);
    }

    pub fn set_default_friction(&mut self, friction: f64) {
        self.default_friction = clamp_coefficient("friction", friction, self.default_friction);
    }

    pub fn set_solver_enabled(&mut self, enabled: bool) {
        if self.solver_enabled != enabled {
            log::debug!("physics solver enabled: {enabled}");
        }
        self.solver_enabled = enabled;
    }

    pub fn set_cell_size(&mut self, cell_size: f64) {
        if cell_size.is_nan() {
            log::warn!("ignoring NaN cell size");
            return;
        }
        self.cell_size = cell_size.max(MIN_CELL_SIZE);
    }
}
