pub mod physics_body;

pub use physics_body::{BodyDesc, BodyHandle, PhysicsBody};
