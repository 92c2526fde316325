//! Numeric conversion helpers used across the project.
//!
//! These utilities guard conversions between floating-point and integer
//! domains for ray counts and sample fractions, and narrow the `f64`
//! intermediates of the intercept solve back to `f32`.

/// Convert a finite `f64` into `f32`, asserting that it fits the target type.
#[expect(
    clippy::cast_possible_truncation,
    reason = "Callers only pass finite values within f32 bounds."
)]
#[must_use]
pub fn expect_f32(value: f64) -> f32 {
    debug_assert!(value.is_finite(), "expected finite f64 for f32 conversion");
    debug_assert!(
        value <= f64::from(f32::MAX),
        "f64 value {value} exceeds f32::MAX"
    );
    debug_assert!(
        value >= f64::from(f32::MIN),
        "f64 value {value} is below f32::MIN"
    );
    value as f32
}

/// Round `value` up and convert it to `usize`, saturating at the bounds.
///
/// Non-finite and negative inputs map to zero.
#[expect(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss,
    reason = "The value is ceiled and clamped to the usize domain before casting."
)]
#[must_use]
pub fn ceil_to_usize(value: f32) -> usize {
    if !value.is_finite() || value <= 0.0 {
        return 0;
    }
    let ceiled = f64::from(value).ceil();
    if ceiled >= usize::MAX as f64 {
        usize::MAX
    } else {
        ceiled as usize
    }
}

/// Express `count` as a fraction of `total` without integer division.
#[expect(
    clippy::cast_precision_loss,
    reason = "Ray counts stay far below the f32 mantissa limit."
)]
#[must_use]
pub const fn fraction_of(count: usize, total: usize) -> f32 {
    if total == 0 {
        return 0.0;
    }
    count as f32 / total as f32
}

/// Convert an index into the normalised position `[0, 1]` across `count`
/// evenly spaced slots. A single slot sits at the centre.
#[expect(
    clippy::cast_precision_loss,
    reason = "Ray counts stay far below the f32 mantissa limit."
)]
#[must_use]
pub const fn spread_position(index: usize, count: usize) -> f32 {
    if count <= 1 {
        0.5
    } else {
        index as f32 / (count - 1) as f32
    }
}
