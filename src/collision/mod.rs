pub mod aabb;
pub mod detection;
pub mod manifold;
pub mod resolver;
pub mod spatial_grid;

// Re-export key types
pub use aabb::AABB;
pub use detection::check_collision;
pub use manifold::CollisionManifold;
pub use resolver::{resolve_collision, Resolution};
pub use spatial_grid::SpatialGrid;
