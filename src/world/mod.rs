pub mod physics_world;

pub use physics_world::{Contact, PhysicsWorld, CONTACT_MARGIN};
