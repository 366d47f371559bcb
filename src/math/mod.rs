//! Vector helpers and the transform types used by the projector.
//!
//! Vectors are `glam::DVec3`. The 4×4 transform keeps fractal-3D's
//! row-vector convention at its API (see [`Transform`]).

pub mod fixed;
pub mod rng;
pub mod transform;

use glam::DVec3;

pub use fixed::{FixedOverflow, FixedTransform, FixedView};
pub use rng::Xorshift64;
pub use transform::{Transform, View};

/// Coordinate written into points that must never be drawn.
pub const BAD_VALUE: i32 = -10_000;

/// Anything at or beyond this distance outside the frame is treated as bad.
pub const BAD_CHECK: i32 = -3_000;

/// `BAD_VALUE` as a float vector.
pub const BAD_VEC: DVec3 = DVec3::splat(BAD_VALUE as f64);

#[inline]
pub fn dot(a: DVec3, b: DVec3) -> f64 {
    a.dot(b)
}

#[inline]
pub fn cross(a: DVec3, b: DVec3) -> DVec3 {
    a.cross(b)
}

/// Unit vector in the direction of `v`.
///
/// Returns `None` when the length is too small (or too large) to divide by
/// in single precision. Callers treat that as a degenerate normal.
pub fn normalize(v: DVec3) -> Option<DVec3> {
    let len2 = v.length_squared();
    if !(f32::MIN_POSITIVE as f64..=f32::MAX as f64).contains(&len2) {
        return None;
    }
    let len = len2.sqrt();
    if len < f32::MIN_POSITIVE as f64 {
        return None;
    }
    Some(v / len)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_unit_length() {
        let n = normalize(DVec3::new(3.0, 0.0, 4.0)).unwrap();
        assert!((n.length() - 1.0).abs() < 1e-12);
        assert_eq!(n, DVec3::new(0.6, 0.0, 0.8));
    }

    #[test]
    fn normalize_rejects_zero_and_huge() {
        assert!(normalize(DVec3::ZERO).is_none());
        assert!(normalize(DVec3::splat(1e-30)).is_none());
        assert!(normalize(DVec3::splat(1e30)).is_none());
    }

    #[test]
    fn cross_follows_right_hand_rule() {
        assert_eq!(cross(DVec3::X, DVec3::Y), DVec3::Z);
        assert_eq!(dot(DVec3::X, DVec3::Y), 0.0);
    }
}
