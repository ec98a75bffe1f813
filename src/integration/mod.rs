pub mod integrator;

pub use integrator::{integrate, is_valid_timestep};
