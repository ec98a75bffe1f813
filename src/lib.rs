//! Lightweight 2D arcade physics: axis-aligned boxes, fixed-step
//! integration, grid broad phase and a single-pass impulse solver.

pub mod collision;
pub mod common;
pub mod integration;
pub mod math;
pub mod objects;
pub mod world;

// Re-export key types for easier use
pub use collision::AABB;
pub use common::{Material, PhysicsConfig, PhysicsError};
pub use math::vec2::Vec2;
pub use objects::{BodyDesc, BodyHandle, PhysicsBody};
pub use world::{Contact, PhysicsWorld};
