//! Collider shapes and segment intersection tests.
//!
//! Sight rays are finite segments from the shooter outwards; each collider
//! reports the nearest point where such a segment enters it.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Tolerance below which a segment axis is treated as parallel.
const PARALLEL_EPSILON: f32 = 1e-9;

/// Collision footprint of a world object.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "shape", rename_all = "snake_case")]
pub enum Collider {
    /// Disc around a centre point.
    Circle {
        /// Centre in world units.
        center: Vec2,
        /// Radius in world units.
        radius: f32,
    },
    /// Axis-aligned box.
    Aabb {
        /// Lower-left corner.
        min: Vec2,
        /// Upper-right corner.
        max: Vec2,
    },
}

impl Collider {
    /// Circle collider centred on `center`.
    #[must_use]
    pub const fn circle(center: Vec2, radius: f32) -> Self {
        Self::Circle { center, radius }
    }

    /// Axis-aligned box collider centred on `center` with the given half
    /// extents.
    #[must_use]
    pub fn aabb_around(center: Vec2, half_extents: Vec2) -> Self {
        Self::Aabb {
            min: center - half_extents,
            max: center + half_extents,
        }
    }

    /// Returns `true` when every coordinate is finite and the shape is not
    /// inverted.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        match *self {
            Self::Circle { center, radius } => {
                center.is_finite() && radius.is_finite() && radius >= 0.0
            }
            Self::Aabb { min, max } => {
                min.is_finite() && max.is_finite() && min.x <= max.x && min.y <= max.y
            }
        }
    }

    /// Returns the first point at which the segment `start → end` touches
    /// the collider, or `None` when it misses.
    ///
    /// A segment starting inside the collider reports `start`.
    ///
    /// # Examples
    /// ```
    /// use glam::Vec2;
    /// use marksman::geometry::Collider;
    /// let rock = Collider::circle(Vec2::new(5.0, 0.0), 1.0);
    /// let hit = rock.intersect_segment(Vec2::ZERO, Vec2::new(10.0, 0.0));
    /// assert_eq!(hit, Some(Vec2::new(4.0, 0.0)));
    /// ```
    #[must_use]
    pub fn intersect_segment(&self, start: Vec2, end: Vec2) -> Option<Vec2> {
        match *self {
            Self::Circle { center, radius } => segment_circle(start, end, center, radius),
            Self::Aabb { min, max } => segment_aabb(start, end, min, max),
        }
    }
}

fn segment_circle(start: Vec2, end: Vec2, center: Vec2, radius: f32) -> Option<Vec2> {
    let dir = end - start;
    let offset = start - center;
    let c = offset.length_squared() - radius * radius;
    if c <= 0.0 {
        return Some(start);
    }
    let a = dir.length_squared();
    if a <= PARALLEL_EPSILON {
        return None;
    }
    let half_b = offset.dot(dir);
    let discriminant = half_b * half_b - a * c;
    if discriminant < 0.0 {
        return None;
    }
    // Start lies outside, so the nearer root is the entry point.
    let t = (-half_b - discriminant.sqrt()) / a;
    (0.0..=1.0).contains(&t).then(|| start + dir * t)
}

fn segment_aabb(start: Vec2, end: Vec2, min: Vec2, max: Vec2) -> Option<Vec2> {
    let dir = end - start;
    let mut window = (0.0_f32, 1.0_f32);
    for (origin, delta, lo, hi) in [
        (start.x, dir.x, min.x, max.x),
        (start.y, dir.y, min.y, max.y),
    ] {
        window = clip_slab(window, origin, delta, lo, hi)?;
    }
    Some(start + dir * window.0)
}

/// Narrows the parametric window `(t_enter, t_exit)` to the slab `[lo, hi]`
/// along one axis.
fn clip_slab(window: (f32, f32), origin: f32, delta: f32, lo: f32, hi: f32) -> Option<(f32, f32)> {
    if delta.abs() <= PARALLEL_EPSILON {
        return (lo..=hi).contains(&origin).then_some(window);
    }
    let t1 = (lo - origin) / delta;
    let t2 = (hi - origin) / delta;
    let (near, far) = if t1 <= t2 { (t1, t2) } else { (t2, t1) };
    let enter = window.0.max(near);
    let exit = window.1.min(far);
    (enter <= exit).then_some((enter, exit))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rstest::rstest;

    fn hit_x(collider: Collider, start: Vec2, end: Vec2) -> Option<f32> {
        collider.intersect_segment(start, end).map(|p| p.x)
    }

    #[rstest]
    #[case::through(Vec2::new(5.0, 0.0), Some(4.0))]
    #[case::beyond_end(Vec2::new(20.0, 0.0), None)]
    #[case::behind(Vec2::new(-5.0, 0.0), None)]
    #[case::off_axis(Vec2::new(5.0, 3.0), None)]
    fn circle_hits(#[case] center: Vec2, #[case] expected: Option<f32>) {
        let collider = Collider::circle(center, 1.0);
        let hit = hit_x(collider, Vec2::ZERO, Vec2::new(10.0, 0.0));
        match (hit, expected) {
            (Some(x), Some(e)) => assert_relative_eq!(x, e, epsilon = 1e-5),
            (None, None) => {}
            other => panic!("unexpected intersection result {other:?}"),
        }
    }

    #[rstest]
    fn segment_starting_inside_circle_hits_at_start() {
        let collider = Collider::circle(Vec2::ZERO, 2.0);
        let hit = collider.intersect_segment(Vec2::new(0.5, 0.0), Vec2::new(10.0, 0.0));
        assert_eq!(hit, Some(Vec2::new(0.5, 0.0)));
    }

    #[rstest]
    fn box_entry_point_is_nearest_face() {
        let wall = Collider::aabb_around(Vec2::new(5.0, 0.0), Vec2::new(0.5, 3.0));
        let hit = wall
            .intersect_segment(Vec2::ZERO, Vec2::new(10.0, 1.0))
            .expect("segment crosses the wall");
        assert_relative_eq!(hit.x, 4.5, epsilon = 1e-5);
        assert_relative_eq!(hit.y, 0.45, epsilon = 1e-5);
    }

    #[rstest]
    #[case::parallel_outside(Vec2::new(0.0, 5.0), Vec2::new(10.0, 5.0))]
    #[case::stops_short(Vec2::ZERO, Vec2::new(4.0, 0.0))]
    #[case::passes_above(Vec2::new(0.0, 4.0), Vec2::new(10.0, 3.5))]
    fn box_misses(#[case] start: Vec2, #[case] end: Vec2) {
        let wall = Collider::aabb_around(Vec2::new(5.0, 0.0), Vec2::new(0.5, 3.0));
        assert!(wall.intersect_segment(start, end).is_none());
    }

    #[rstest]
    #[case::negative_radius(Collider::circle(Vec2::ZERO, -1.0), false)]
    #[case::nan_center(Collider::circle(Vec2::new(f32::NAN, 0.0), 1.0), false)]
    #[case::inverted_box(Collider::Aabb { min: Vec2::ONE, max: Vec2::ZERO }, false)]
    #[case::point_circle(Collider::circle(Vec2::ZERO, 0.0), true)]
    #[case::box_ok(Collider::aabb_around(Vec2::ZERO, Vec2::ONE), true)]
    fn validity(#[case] collider: Collider, #[case] valid: bool) {
        assert_eq!(collider.is_valid(), valid);
    }
}
