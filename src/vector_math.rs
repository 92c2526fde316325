//! Basic vector math helper functions.
//! Small helpers for bearings, unit vectors and magnitude clamps on the plane.
use glam::Vec2;

/// Returns the angle, in radians, of the direction from `from` to `to`.
///
/// # Examples
/// ```
/// use glam::Vec2;
/// use marksman::vector_math::bearing;
/// let angle = bearing(Vec2::ZERO, Vec2::new(0.0, 3.0));
/// assert!((angle - std::f32::consts::FRAC_PI_2).abs() < 1e-6);
/// ```
#[must_use]
pub fn bearing(from: Vec2, to: Vec2) -> f32 {
    let delta = to - from;
    delta.y.atan2(delta.x)
}

/// Returns the unit vector pointing from `from` towards `to`.
///
/// Coincident points or non-finite inputs yield [`Vec2::ZERO`].
///
/// # Examples
///
/// ```
/// use glam::Vec2;
/// use marksman::vec_direction;
/// let dir = vec_direction(Vec2::ZERO, Vec2::new(3.0, 4.0));
/// assert!((dir.x - 0.6).abs() < 1e-6);
/// assert!((dir.y - 0.8).abs() < 1e-6);
///
/// assert_eq!(vec_direction(Vec2::ONE, Vec2::ONE), Vec2::ZERO);
/// ```
#[must_use]
pub fn vec_direction(from: Vec2, to: Vec2) -> Vec2 {
    let delta = to - from;
    if !delta.is_finite() {
        return Vec2::ZERO;
    }
    delta.try_normalize().unwrap_or(Vec2::ZERO)
}

/// Scales `vector` down so its length does not exceed `max_length`.
///
/// Vectors already within the limit are returned unchanged.
#[must_use]
pub fn clamp_length(vector: Vec2, max_length: f32) -> Vec2 {
    let length = vector.length();
    if length > max_length && length > 0.0 {
        vector * (max_length / length)
    } else {
        vector
    }
}
