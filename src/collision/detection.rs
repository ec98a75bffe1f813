use super::manifold::CollisionManifold;
use crate::math::vec2::Vec2;
use crate::objects::PhysicsBody;

/// Exact AABB-vs-AABB test for a candidate pair.
///
/// The contact normal is the axis of least penetration, pointing from A to B.
/// When both axes penetrate equally the Y axis wins, and when the centers
/// coincide on the chosen axis the normal points to the positive side, so the
/// result never depends on anything but the two bodies.
/// Returns None when either axis overlaps by zero or less.
pub fn check_collision(
    body_a: &PhysicsBody,
    body_a_idx: usize,
    body_b: &PhysicsBody,
    body_b_idx: usize,
) -> Option<CollisionManifold> {
    let delta = body_b.position - body_a.position;
    let extent = body_a.size() + body_b.size();
    let overlap_x = extent.x - delta.x.abs();
    let overlap_y = extent.y - delta.y.abs();

    // Touching edges and NaN overlaps are both "no contact"
    if !(overlap_x > 0.0 && overlap_y > 0.0) {
        return None;
    }

    let (normal, depth) = if overlap_x < overlap_y {
        let sign = if delta.x < 0.0 { -1.0 } else { 1.0 };
        (Vec2::new(sign, 0.0), overlap_x)
    } else {
        let sign = if delta.y < 0.0 { -1.0 } else { 1.0 };
        (Vec2::new(0.0, sign), overlap_y)
    };

    Some(CollisionManifold {
        body_a_idx,
        body_b_idx,
        normal,
        depth,
    })
}
