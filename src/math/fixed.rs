//! 16.16 fixed-point mirror of [`Transform`] and [`View`].
//!
//! Every intermediate must fit a signed 32-bit word. Anything that would
//! not reports [`FixedOverflow`] and the caller redoes that pixel in
//! floating point.

use thiserror::Error;

use super::{Transform, View};

pub const FIXED_SHIFT: u32 = 16;
pub const FIXED_ONE: i64 = 1 << FIXED_SHIFT;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("fixed-point overflow")]
pub struct FixedOverflow;

#[inline]
fn fits(v: i64) -> Result<i64, FixedOverflow> {
    if (i32::MIN as i64..=i32::MAX as i64).contains(&v) {
        Ok(v)
    } else {
        Err(FixedOverflow)
    }
}

/// `a·b` for 16.16 operands.
#[inline]
pub fn fixed_mul(a: i64, b: i64) -> Result<i64, FixedOverflow> {
    fits(a.checked_mul(b).ok_or(FixedOverflow)? >> FIXED_SHIFT)
}

/// `a/b` for 16.16 operands.
#[inline]
pub fn fixed_div(a: i64, b: i64) -> Result<i64, FixedOverflow> {
    if b == 0 {
        return Err(FixedOverflow);
    }
    fits((a << FIXED_SHIFT) / b)
}

#[inline]
pub fn to_fixed(v: f64) -> i64 {
    (v * FIXED_ONE as f64) as i64
}

/// Round a 16.16 value to the nearest integer (halves go up).
#[inline]
pub fn round_fixed(v: i64) -> i64 {
    (v + (FIXED_ONE >> 1)) >> FIXED_SHIFT
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FixedProjection {
    /// Point is level with or behind the eye.
    Behind,
    /// `screen` is after the perspective divide, `pre` before it.
    Point { screen: [i64; 3], pre: [i64; 3] },
}

/// Eye position in 16.16.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FixedView(pub [i64; 3]);

impl FixedView {
    pub fn from_view(view: &View) -> Self {
        let v = view.0;
        FixedView([
            (v.x as i64) << FIXED_SHIFT,
            (v.y as i64) << FIXED_SHIFT,
            (v.z as i64) << FIXED_SHIFT,
        ])
    }

    /// Perspective divide of a 16.16 point. `Ok(None)` when behind the eye.
    pub fn project(&self, v: [i64; 3]) -> Result<Option<[i64; 3]>, FixedOverflow> {
        let [ex, ey, ez] = self.0;
        let denom = ez - v[2];
        if denom >= 0 {
            return Ok(None);
        }
        // dividing the eye first keeps the products small
        let tx = fixed_div(ex, denom)?;
        let ty = fixed_div(ey, denom)?;
        let tz = fixed_div(ez, denom)?;
        let x = fits(fixed_mul(v[0], tz)? - fixed_mul(tx, v[2])?)?;
        let y = fits(fixed_mul(v[1], tz)? - fixed_mul(ty, v[2])?)?;
        Ok(Some([x, y, v[2]]))
    }
}

/// A [`Transform`] with every element scaled by 65536.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FixedTransform {
    rows: [[i64; 4]; 4],
}

impl FixedTransform {
    /// `None` when an element does not fit 16.16.
    pub fn from_transform(m: &Transform) -> Option<Self> {
        let mut rows = [[0i64; 4]; 4];
        for (i, row) in rows.iter_mut().enumerate() {
            for (j, e) in row.iter_mut().enumerate() {
                *e = fits(to_fixed(m.element(i, j))).ok()?;
            }
        }
        Some(Self { rows })
    }

    /// `s·M` in 16.16, then the perspective divide when `view` has a
    /// non-zero z.
    pub fn apply_persp(
        &self,
        s: [i64; 3],
        view: &FixedView,
    ) -> Result<FixedProjection, FixedOverflow> {
        let mut pre = [0i64; 3];
        for (j, out) in pre.iter_mut().enumerate() {
            let mut acc = 0i64;
            for (i, si) in s.iter().enumerate() {
                acc = fits(acc + fixed_mul(*si, self.rows[i][j])?)?;
            }
            *out = fits(acc + self.rows[3][j])?;
        }
        if view.0[2] == 0 {
            return Ok(FixedProjection::Point { screen: pre, pre });
        }
        Ok(match view.project(pre)? {
            Some(screen) => FixedProjection::Point { screen, pre },
            None => FixedProjection::Behind,
        })
    }
}
