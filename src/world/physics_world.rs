use crate::collision::{self, SpatialGrid, AABB};
use crate::common::{PhysicsConfig, PhysicsError};
use crate::integration::integrator;
use crate::math::vec2::Vec2;
use crate::objects::{BodyDesc, BodyHandle, PhysicsBody};

/// Slack added around every box in the broad phase. A pair resting exactly
/// edge to edge stays a candidate, so when a contact earlier in the same pass
/// pushes one of them into the other the overlap is still resolved.
pub const CONTACT_MARGIN: f64 = 0.05;

/// A collision resolved during the last `advance`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Contact {
    pub body_a: BodyHandle,
    pub body_b: BodyHandle,
    /// Points from `body_a` towards `body_b`.
    pub normal: Vec2,
    /// Penetration before separation.
    pub depth: f64,
    /// Zero when the bodies were already separating.
    pub normal_impulse: f64,
}

/// Owns every simulated body and drives the per-frame pipeline:
/// integrate, broad phase, narrow phase, resolve.
///
/// Bodies are kept in creation order, which is also the order pairs are
/// generated and resolved in, so identical inputs give identical frames.
pub struct PhysicsWorld {
    config: PhysicsConfig,
    // Parallel vectors; handles are strictly increasing
    handles: Vec<BodyHandle>,
    bodies: Vec<PhysicsBody>,
    next_handle: u64,
    grid: SpatialGrid,
    // Detected collisions from the last step
    contacts: Vec<Contact>,
}

impl PhysicsWorld {
    /// Creates an empty world with the documented default settings.
    pub fn new() -> Self {
        Self::with_config(PhysicsConfig::default())
    }

    pub fn with_config(config: PhysicsConfig) -> Self {
        let grid = SpatialGrid::new(config.cell_size());
        Self {
            config,
            handles: Vec::new(),
            bodies: Vec::new(),
            next_handle: 0,
            grid,
            contacts: Vec::new(),
        }
    }

    pub fn config(&self) -> &PhysicsConfig {
        &self.config
    }

    /// Settings changes apply from the next `advance`; `default_*` values
    /// only reach bodies created afterwards.
    pub fn config_mut(&mut self) -> &mut PhysicsConfig {
        &mut self.config
    }

    /// Builds a body from `desc`, filling unset coefficients from the config.
    pub fn create_body(&mut self, desc: &BodyDesc) -> Result<BodyHandle, PhysicsError> {
        let body = desc.build(&self.config);
        self.add_body(body)
    }

    /// Adds an already-built body and returns its handle.
    pub fn add_body(&mut self, body: PhysicsBody) -> Result<BodyHandle, PhysicsError> {
        if let Some(field) = body.first_non_finite_field() {
            return Err(PhysicsError::NonFiniteState { field });
        }
        let handle = BodyHandle(self.next_handle);
        self.next_handle += 1;
        log::debug!(
            "body {handle} created at {:?} (mass {}, static {})",
            body.position,
            body.mass(),
            body.is_static()
        );
        self.handles.push(handle);
        self.bodies.push(body);
        Ok(handle)
    }

    /// Removes a body, keeping the relative order of the rest.
    pub fn remove_body(&mut self, handle: BodyHandle) -> Result<PhysicsBody, PhysicsError> {
        let index = self.index_of(handle)?;
        self.handles.remove(index);
        log::debug!("body {handle} removed");
        Ok(self.bodies.remove(index))
    }

    pub fn body(&self, handle: BodyHandle) -> Result<&PhysicsBody, PhysicsError> {
        let index = self.index_of(handle)?;
        Ok(&self.bodies[index])
    }

    pub fn body_mut(&mut self, handle: BodyHandle) -> Result<&mut PhysicsBody, PhysicsError> {
        let index = self.index_of(handle)?;
        Ok(&mut self.bodies[index])
    }

    pub fn contains(&self, handle: BodyHandle) -> bool {
        self.index_of(handle).is_ok()
    }

    pub fn len(&self) -> usize {
        self.bodies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty()
    }

    /// Bodies in creation order.
    pub fn iter(&self) -> impl Iterator<Item = (BodyHandle, &PhysicsBody)> {
        self.handles.iter().copied().zip(self.bodies.iter())
    }

    /// Collisions resolved by the last `advance`, in resolution order.
    pub fn contacts(&self) -> &[Contact] {
        &self.contacts
    }

    /// Bodies whose AABB contains `point` (boundary inclusive).
    ///
    /// Scans every body, so the cost is O(n) per call.
    pub fn query_point(&self, point: Vec2) -> Vec<BodyHandle> {
        self.iter()
            .filter(|(_, body)| body.aabb().contains_point(point))
            .map(|(handle, _)| handle)
            .collect()
    }

    /// Bodies whose AABB overlaps `region` (edges merely touching do not count).
    ///
    /// Like `query_point`, this is a linear scan over all bodies.
    pub fn query_region(&self, region: &AABB) -> Vec<BodyHandle> {
        self.iter()
            .filter(|(_, body)| body.aabb().overlaps(region))
            .map(|(handle, _)| handle)
            .collect()
    }

    /// Pairs the broad phase would hand to the narrow phase right now, in
    /// the order `advance` resolves them.
    pub fn candidate_pairs(&mut self) -> Vec<(BodyHandle, BodyHandle)> {
        self.broad_phase()
            .into_iter()
            .map(|(i, j)| (self.handles[i], self.handles[j]))
            .collect()
    }

    fn index_of(&self, handle: BodyHandle) -> Result<usize, PhysicsError> {
        self.handles
            .binary_search(&handle)
            .map_err(|_| PhysicsError::UnknownBody(handle))
    }

    /// Rebuilds the grid from the current positions and returns the index
    /// pairs whose boxes come within `CONTACT_MARGIN` of each other.
    ///
    /// Pairs touching a static or frozen body come first so a resting stack
    /// is settled from its support upwards; each group keeps ascending index
    /// order.
    fn broad_phase(&mut self) -> Vec<(usize, usize)> {
        if self.grid.cell_size() != self.config.cell_size() {
            self.grid.set_cell_size(self.config.cell_size());
        }
        self.grid.clear();
        for (index, body) in self.bodies.iter().enumerate() {
            if body.collidable {
                let aabb = body.aabb().expanded(CONTACT_MARGIN);
                self.grid.insert(index, aabb, body.inv_mass() == 0.0);
            }
        }
        let mut pairs = self.grid.query_potential_pairs();

        // Stable sort, false (touches an immovable body) first
        let bodies = &self.bodies;
        pairs.sort_by_key(|&(i, j)| bodies[i].inv_mass() != 0.0 && bodies[j].inv_mass() != 0.0);
        pairs
    }

    /// Advances the simulation by one fixed timestep `dt`.
    ///
    /// Every body integrates first. With the solver enabled, overlapping
    /// pairs are then resolved once each, in candidate order; with it
    /// disabled, bodies pass through each other. An invalid `dt` leaves the
    /// world untouched.
    pub fn advance(&mut self, dt: f64) {
        if !integrator::is_valid_timestep(dt) {
            log::trace!("skipping advance with invalid dt {dt}");
            return;
        }

        // 1. Integrate motion
        for body in self.bodies.iter_mut() {
            body.set_on_ground(false);
            integrator::integrate(body, &self.config, dt);
        }

        self.contacts.clear();
        if !self.config.solver_enabled() {
            return;
        }

        // 2. Broad phase
        let pairs = self.broad_phase();

        // 3. Narrow phase and resolution, single pass
        for (i, j) in pairs {
            let (left, right) = self.bodies.split_at_mut(j);
            let body_a = &mut left[i];
            let body_b = &mut right[0];

            let Some(manifold) = collision::check_collision(body_a, i, body_b, j) else {
                continue;
            };
            let resolution = collision::resolve_collision(body_a, body_b, &manifold);
            self.contacts.push(Contact {
                body_a: self.handles[i],
                body_b: self.handles[j],
                normal: manifold.normal,
                depth: manifold.depth,
                normal_impulse: resolution.normal_impulse,
            });
        }
        log::trace!("advance({dt}): {} contacts resolved", self.contacts.len());
    }
}

impl Default for PhysicsWorld {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    const EPSILON: f64 = 1e-9;

    fn world_with(gravity: f64, max_speed: f64) -> PhysicsWorld {
        let mut config = PhysicsConfig::default();
        config.set_gravity(gravity);
        config.set_max_speed(max_speed);
        PhysicsWorld::with_config(config)
    }

    fn unit_box(x: f64, y: f64) -> BodyDesc {
        BodyDesc::new(Vec2::new(x, y), Vec2::splat(0.5))
    }

    #[test]
    fn test_world_new() {
        let world = PhysicsWorld::new();
        assert!(world.is_empty());
        assert!(world.contacts().is_empty());
        assert_eq!(world.config(), &PhysicsConfig::default());
    }

    #[test]
    fn test_create_and_remove_body() {
        let mut world = PhysicsWorld::new();
        let a = world.create_body(&unit_box(0.0, 0.0)).unwrap();
        let b = world.create_body(&unit_box(5.0, 0.0).mass(2.0)).unwrap();
        let c = world.create_body(&unit_box(10.0, 0.0)).unwrap();
        assert_eq!(world.len(), 3);
        assert_eq!(world.body(b).unwrap().mass(), 2.0);

        let removed = world.remove_body(b).unwrap();
        assert_eq!(removed.position, Vec2::new(5.0, 0.0));
        assert!(!world.contains(b));
        let order: Vec<BodyHandle> = world.iter().map(|(h, _)| h).collect();
        assert_eq!(order, vec![a, c]);

        // Handles are not reused
        let d = world.create_body(&unit_box(0.0, 0.0)).unwrap();
        assert_ne!(d, b);
    }

    #[test]
    fn test_unknown_handle_is_error() {
        let mut world = PhysicsWorld::new();
        let a = world.create_body(&unit_box(0.0, 0.0)).unwrap();
        world.remove_body(a).unwrap();
        assert!(matches!(world.remove_body(a), Err(PhysicsError::UnknownBody(h)) if h == a));
        assert!(world.body(a).is_err());
        assert!(world.body_mut(a).is_err());
    }

    #[test]
    fn test_non_finite_body_rejected() {
        let mut world = PhysicsWorld::new();
        let err = world
            .create_body(&unit_box(f64::NAN, 0.0))
            .unwrap_err();
        assert!(matches!(err, PhysicsError::NonFiniteState { field: "position" }));
        assert!(world.is_empty());
    }

    #[test]
    fn test_body_defaults_follow_config_at_spawn() {
        let mut world = PhysicsWorld::new();
        world.config_mut().set_default_elasticity(0.5);
        let early = world.create_body(&unit_box(0.0, 0.0)).unwrap();
        world.config_mut().set_default_elasticity(0.1);
        let late = world.create_body(&unit_box(3.0, 0.0)).unwrap();
        assert_eq!(world.body(early).unwrap().elasticity(), 0.5);
        assert_eq!(world.body(late).unwrap().elasticity(), 0.1);
    }

    #[test]
    fn test_advance_gravity() {
        let mut world = world_with(10.0, 100.0);
        let idx = world.create_body(&unit_box(0.0, 0.0)).unwrap();

        world.advance(0.1);

        let body = world.body(idx).unwrap();
        assert!((body.velocity.y - -1.0).abs() < EPSILON);
        assert!((body.position.y - -0.1).abs() < EPSILON);
    }

    #[test]
    fn test_advance_invalid_dt_is_noop() {
        let mut world = world_with(10.0, 100.0);
        let idx = world.create_body(&unit_box(0.0, 0.0)).unwrap();
        let before = world.body(idx).unwrap().clone();
        world.advance(0.0);
        world.advance(-1.0);
        world.advance(f64::NAN);
        assert_eq!(world.body(idx).unwrap(), &before);
    }

    #[test]
    fn test_advance_records_contacts() {
        let mut world = world_with(0.0, 100.0);
        let a = world.create_body(&unit_box(0.0, 0.0)).unwrap();
        let b = world
            .create_body(&unit_box(0.9, 0.0).velocity(Vec2::new(-1.0, 0.0)))
            .unwrap();

        world.advance(0.1);

        let contacts = world.contacts();
        assert_eq!(contacts.len(), 1);
        assert_eq!((contacts[0].body_a, contacts[0].body_b), (a, b));
        assert_eq!(contacts[0].normal, Vec2::new(1.0, 0.0));
        assert!(contacts[0].normal_impulse > 0.0);

        // Pushed fully apart
        let gap = world.body(b).unwrap().position.x - world.body(a).unwrap().position.x;
        assert!((gap - 1.0).abs() < EPSILON);
    }

    #[test]
    fn test_solver_disabled_lets_bodies_overlap() {
        let mut world = world_with(0.0, 100.0);
        world.config_mut().set_solver_enabled(false);
        let a = world.create_body(&unit_box(0.0, 0.0)).unwrap();
        let b = world.create_body(&unit_box(0.5, 0.0)).unwrap();

        world.advance(0.1);

        assert!(world.contacts().is_empty());
        assert_eq!(world.body(a).unwrap().position, Vec2::ZERO);
        assert_eq!(world.body(b).unwrap().position, Vec2::new(0.5, 0.0));
    }

    #[test]
    fn test_non_collidable_bodies_skipped() {
        let mut world = world_with(0.0, 100.0);
        world.create_body(&unit_box(0.0, 0.0)).unwrap();
        world
            .create_body(&unit_box(0.2, 0.0).collidable(false))
            .unwrap();
        assert!(world.candidate_pairs().is_empty());
        world.advance(0.1);
        assert!(world.contacts().is_empty());
    }

    #[test]
    fn test_static_pairs_excluded() {
        let mut world = PhysicsWorld::new();
        world
            .create_body(&BodyDesc::fixed(Vec2::ZERO, Vec2::splat(1.0)))
            .unwrap();
        world
            .create_body(&BodyDesc::fixed(Vec2::new(0.5, 0.0), Vec2::splat(1.0)))
            .unwrap();
        assert!(world.candidate_pairs().is_empty());
    }

    #[test]
    fn test_on_ground_flag() {
        let mut world = world_with(10.0, 100.0);
        world
            .create_body(&BodyDesc::fixed(Vec2::ZERO, Vec2::new(5.0, 0.5)))
            .unwrap();
        let crate_box = world.create_body(&unit_box(0.0, 1.0)).unwrap();
        let flier = world.create_body(&unit_box(3.0, 8.0)).unwrap();

        world.advance(1.0 / 60.0);

        assert!(world.body(crate_box).unwrap().on_ground());
        assert!(!world.body(flier).unwrap().on_ground());
    }

    #[test]
    fn test_immovable_contacts_resolved_first() {
        let mut world = world_with(10.0, 100.0);
        let upper = world.create_body(&unit_box(0.0, 1.9)).unwrap();
        let lower = world.create_body(&unit_box(0.0, 0.95)).unwrap();
        let floor = world
            .create_body(&BodyDesc::fixed(Vec2::ZERO, Vec2::new(5.0, 0.5)))
            .unwrap();

        assert_eq!(
            world.candidate_pairs(),
            vec![(lower, floor), (upper, lower)]
        );

        world.advance(1.0 / 60.0);

        let order: Vec<(BodyHandle, BodyHandle)> = world
            .contacts()
            .iter()
            .map(|c| (c.body_a, c.body_b))
            .collect();
        assert_eq!(order, vec![(lower, floor), (upper, lower)]);
        assert!(world.body(lower).unwrap().on_ground());
        assert!(world.body(upper).unwrap().on_ground());
    }

    #[test]
    fn test_touching_pair_is_candidate_but_no_contact() {
        let mut world = world_with(0.0, 100.0);
        let a = world.create_body(&unit_box(0.0, 0.0)).unwrap();
        let b = world.create_body(&unit_box(1.0, 0.0)).unwrap();

        assert_eq!(world.candidate_pairs(), vec![(a, b)]);
        world.advance(0.1);
        assert!(world.contacts().is_empty());
        assert_eq!(world.body(b).unwrap().position, Vec2::new(1.0, 0.0));
    }

    #[test]
    fn test_queries() {
        let mut world = PhysicsWorld::new();
        let a = world.create_body(&unit_box(0.0, 0.0)).unwrap();
        let b = world.create_body(&unit_box(0.75, 0.0)).unwrap();
        let c = world
            .create_body(&unit_box(10.0, 10.0).collidable(false))
            .unwrap();

        assert_eq!(world.query_point(Vec2::new(0.4, 0.0)), vec![a, b]);
        assert_eq!(world.query_point(Vec2::new(-0.5, 0.5)), vec![a]);
        assert!(world.query_point(Vec2::new(5.0, 5.0)).is_empty());

        let region = AABB::new(Vec2::new(9.0, 9.0), Vec2::new(20.0, 20.0));
        assert_eq!(world.query_region(&region), vec![c]);
    }

    #[test]
    fn test_cell_size_change_picked_up() {
        let mut world = PhysicsWorld::new();
        world.create_body(&unit_box(0.0, 0.0)).unwrap();
        world.create_body(&unit_box(0.5, 0.0)).unwrap();
        world.config_mut().set_cell_size(0.25);
        assert_eq!(world.candidate_pairs().len(), 1);
        assert_eq!(world.grid.cell_size(), 0.25);
    }
}
