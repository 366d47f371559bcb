//! Per-pixel projection.
//!
//! Every source pixel becomes two points:
//! * `cur`, integer screen coordinates (after perspective and adjustments);
//! * `shade`, the same point in the space light normals and scene files
//!   are computed in (before perspective).
//!
//! `None` means the pixel has no usable projection; the caller stores the
//! bad-point sentinel in its place.

use glam::DVec3;
use log::debug;

use crate::config::RayFormat;
use crate::math::fixed::{FixedProjection, round_fixed, to_fixed, FIXED_ONE, FIXED_SHIFT};
use crate::math::Xorshift64;
use crate::raster::Point;
use crate::setup::ImageSetup;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Projected {
    pub cur: Point,
    pub shade: DVec3,
}

/// Height of one pixel: integer palette index plus any sub-index fraction.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Height {
    pub color: i32,
    pub value: f64,
    /// `value` carries a fraction and must not be truncated.
    pub fractional: bool,
}

impl ImageSetup {
    #[inline]
    fn wants_shade(&self) -> bool {
        self.fill.is_light() || self.ray.is_some()
    }

    /// Planar mapping of pixel `(col, row)`.
    pub fn project_planar(&self, col: usize, row: usize, h: Height) -> Option<Projected> {
        if let Some(fixed) = &self.fixed {
            let z = if h.fractional {
                to_fixed(h.value)
            } else {
                (h.value as i64) << FIXED_SHIFT
            };
            let s = [(col as i64) << FIXED_SHIFT, (row as i64) << FIXED_SHIFT, z];
            match fixed.apply_persp(s, &self.fixed_view) {
                Ok(FixedProjection::Behind) => return None,
                Ok(FixedProjection::Point { screen, pre }) => {
                    let cur = Point::new(
                        round_fixed(screen[0]) as i32 + self.x_adjust,
                        round_fixed(screen[1]) as i32 + self.y_adjust,
                        h.color,
                    );
                    let shade = if self.wants_shade() {
                        DVec3::from_array(pre.map(|v| v as f64 / FIXED_ONE as f64))
                    } else {
                        DVec3::new(cur.x as f64, cur.y as f64, h.value)
                    };
                    return Some(Projected { cur, shade });
                }
                Err(e) => debug!("{e} at ({col}, {row}), redoing in floating point"),
            }
        }

        let v = self.transform.apply(DVec3::new(col as f64, row as f64, h.value));
        let shade = match self.ray {
            Some(RayFormat::Acrospin) => DVec3::new(
                v.x * (2.0 / self.width as f64) - 1.0,
                v.y * (2.0 / self.height as f64) - 1.0,
                -v.z * (2.0 / self.colors as f64) - 1.0,
            ),
            _ => v,
        };
        let screen = if self.persp && self.ray.is_none() {
            self.view.project_or_bad(v)
        } else {
            v
        };
        let cur = Point::new(
            (screen.x + self.x_adjust as f64 + 0.5) as i32,
            (screen.y + self.y_adjust as f64 + 0.5) as i32,
            h.color,
        );
        Some(Projected { cur, shade })
    }

    /// Spherical mapping of column `col` on the row at longitude `phi`
    /// (`(sin, cos)`). Back-facing points are dropped unless every point is
    /// needed (grid and scene output).
    pub fn project_sphere(
        &self,
        col: usize,
        phi: (f64, f64),
        h: Height,
        keep_back: bool,
    ) -> Option<Projected> {
        let sp = self.sphere.as_ref()?;
        let (sin_t, cos_t) = (sp.theta.sin[col], sp.theta.cos[col]);
        let (sin_p, cos_p) = phi;
        if sin_p < 0.0 && !keep_back {
            return None;
        }

        let r = if sp.rscale < 0.0 {
            sp.radius + sp.r_factor * h.value * cos_t
        } else if sp.rscale > 0.0 {
            sp.radius - sp.r_x_rscale + sp.r_factor * h.value * cos_t
        } else {
            sp.radius
        };
        let x = self.x_center + sin_t * self.scale.x * r;
        let y = self.y_center + cos_t * cos_p * self.scale.y * r;
        let depth = -r * cos_t * sin_p;

        if self.persp || self.ray.is_some() {
            let v = DVec3::new(x, y, -sp.radius + depth);
            let shade = if self.wants_shade() {
                DVec3::new(x, y, depth)
            } else {
                DVec3::new(x, y, h.value)
            };
            let screen = if self.persp {
                self.view.project_or_bad(v)
            } else {
                v
            };
            let cur = Point::new(
                (screen.x + 0.5 + self.x_adjust as f64) as i32,
                (screen.y + 0.5 + self.y_adjust as f64) as i32,
                h.color,
            );
            return Some(Projected { cur, shade });
        }

        let fx = x + self.x_adjust as f64;
        let fy = y + self.y_adjust as f64;
        let z = if self.wants_shade() {
            depth * self.scale.z
        } else {
            h.value
        };
        Some(Projected {
            cur: Point::new(fx as i32, fy as i32, h.color),
            shade: DVec3::new(fx, fy, z),
        })
    }

    /// Foot of the solid-fill line for column `col`, clamped to the frame.
    pub fn solid_base(&self, col: usize, row: usize) -> Option<Point> {
        let (x, y) = if self.sphere.is_some() {
            (self.x_center as i32, self.y_center as i32)
        } else {
            let v = self.transform.apply(DVec3::new(col as f64, row as f64, 0.0));
            let v = if self.persp { self.view.project(v)? } else { v };
            ((v.x + 0.5).floor() as i32, (v.y + 0.5).floor() as i32)
        };
        Some(Point::new(
            x.clamp(0, self.width as i32 - 1),
            y.clamp(0, self.height as i32 - 1),
            0,
        ))
    }

    /// Random height jitter for pixels above the waterline.
    pub fn jitter(&self, color: i32, rng: &mut Xorshift64) -> i32 {
        let mut rnd = rng.rand15() >> 8;
        rnd = (rnd * rnd) >> self.rand_shift;
        if rng.coin() {
            rnd = -rnd;
        }
        if color + rnd >= self.colors {
            self.colors - 2
        } else if color + rnd <= self.waterline {
            self.waterline + 1
        } else {
            color + rnd
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{FillType, Numeric, Params3d, RayOptions};

    fn height(c: i32) -> Height {
        Height {
            color: c,
            value: c as f64,
            fractional: false,
        }
    }

    fn planar(numeric: Numeric, z_viewer: i32) -> ImageSetup {
        let p = Params3d {
            numeric,
            z_viewer,
            fill: FillType::LightBefore,
            ..Params3d::default()
        };
        ImageSetup::new(&p, 320, 200, 320, 200)
    }

    #[test]
    fn fixed_and_float_paths_agree() {
        let float = planar(Numeric::Float, 150);
        let fixed = planar(Numeric::Fixed, 150);
        assert!(fixed.fixed.is_some());
        for (col, row, c) in [(0, 0, 0), (100, 50, 200), (319, 199, 255), (160, 100, 17)] {
            let a = float.project_planar(col, row, height(c)).unwrap();
            let b = fixed.project_planar(col, row, height(c)).unwrap();
            assert!((a.cur.x - b.cur.x).abs() <= 1, "{a:?} vs {b:?}");
            assert!((a.cur.y - b.cur.y).abs() <= 1, "{a:?} vs {b:?}");
            assert!((a.shade - b.shade).abs().max_element() < 0.05);
        }
    }

    #[test]
    fn fixed_overflow_falls_back_to_float() {
        let float = planar(Numeric::Float, 0);
        let fixed = planar(Numeric::Fixed, 0);
        assert!(fixed.fixed.is_some());
        // scaled height leaves the 16.16 range
        let tall = Height {
            color: 255,
            value: 2_000_000.0,
            fractional: true,
        };
        assert_eq!(
            fixed.project_planar(10, 20, tall),
            float.project_planar(10, 20, tall)
        );
    }

    #[test]
    fn acrospin_shading_space_is_normalised() {
        let p = Params3d {
            x_scale: 100,
            y_scale: 100,
            ray: Some(RayOptions {
                format: RayFormat::Acrospin,
                path: "m.acr".into(),
                brief: false,
            }),
            ..Params3d::default()
        };
        let s = ImageSetup::new(&p, 100, 100, 100, 100);
        let a = s.project_planar(0, 0, height(0)).unwrap();
        let b = s.project_planar(99, 99, height(0)).unwrap();
        assert!(a.shade.x >= -1.0 && b.shade.x <= 1.0, "{a:?} {b:?}");
        assert!(b.shade.x > a.shade.x);
    }

    #[test]
    fn sphere_front_and_back() {
        let p = Params3d::sphere_defaults();
        let s = ImageSetup::new(&p, 200, 200, 200, 200);
        let front = (1.0f64.sin(), 1.0f64.cos());
        let back = (-0.5, 0.8);
        assert!(s.project_sphere(100, front, height(10), false).is_some());
        assert!(s.project_sphere(100, back, height(10), false).is_none());
        assert!(s.project_sphere(100, back, height(10), true).is_some());

        // centre column of an equator row lands near the frame centre
        let eq = s.project_sphere(100, (1.0, 0.0), height(0), false).unwrap();
        assert!((eq.cur.x - 100).abs() <= 1 && (eq.cur.y - 100).abs() <= 1, "{eq:?}");
    }

    #[test]
    fn solid_base_is_clamped() {
        let p = Params3d {
            fill: FillType::SolidFill,
            x_shift: 90,
            ..Params3d::default()
        };
        let s = ImageSetup::new(&p, 64, 64, 64, 64);
        let b = s.solid_base(63, 63).unwrap();
        assert!((0..64).contains(&b.x) && (0..64).contains(&b.y));
    }

    #[test]
    fn jitter_stays_above_water_and_below_top() {
        let p = Params3d {
            randomize: 7,
            waterline: 20,
            ..Params3d::default()
        };
        let s = ImageSetup::new(&p, 16, 16, 16, 16);
        let mut rng = Xorshift64::from_seed(99);
        for c in [21, 100, 254] {
            for _ in 0..200 {
                let j = s.jitter(c, &mut rng);
                assert!(j > 20 && j < 256, "{c} -> {j}");
            }
        }
    }
}
