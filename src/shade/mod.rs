//! Light-source shading.
//!
//! Each new point forms a face with its left and upper neighbours; the face
//! normal (optionally smoothed over the last few faces of the row) is dotted
//! with the light direction to give a palette intensity.

pub mod hsv;
pub mod truecolor;

pub use truecolor::{Shaded, TrueColorShader, haze_mult};

use glam::DVec3;
use log::debug;

use crate::math::{cross, normalize};

/// Multiplier applied to light intensities so that `ambient` percent of the
/// colour always survives. Never below 1.
pub fn ambient_scale(ambient: i32) -> u32 {
    ((255.0 * (100 - ambient) as f64 / 100.0) as u32).max(1)
}

/// Palette index for a light `intensity` on screen, before any true-colour
/// shading.
#[inline]
pub fn ambient_color(intensity: i32, scale: u32) -> i32 {
    let c = (1 + intensity.max(0) as u32 * scale) / 256;
    c.max(1) as i32
}

#[derive(Clone, Debug)]
pub struct Shader {
    light: DVec3,
    colors: i32,
    /// Number of previous normals blended in; 0 disables smoothing.
    light_avg: i32,
    running: Option<DVec3>,
}

impl Shader {
    /// `light` must already be normalised and in the space of the points
    /// passed to [`intensity`](Self::intensity).
    pub fn new(light: DVec3, colors: i32, light_avg: i32) -> Self {
        Self {
            light,
            colors,
            light_avg,
            running: None,
        }
    }

    #[inline]
    pub fn light(&self) -> DVec3 {
        self.light
    }

    /// Forget the smoothing history at the start of a row.
    pub fn start_row(&mut self) {
        self.running = None;
    }

    /// Intensity in `1..colors` of the face spanned by `old → cur` and
    /// `cur → up`.
    pub fn intensity(&mut self, cur: DVec3, old: DVec3, up: DVec3) -> i32 {
        let v1 = cur - old;
        let v2 = up - cur;
        let raw = cross(v1, v2);

        let Some(mut n) = normalize(raw) else {
            debug!("degenerate face at ({:.1}, {:.1})", cur.x, cur.y);
            return 1;
        };

        if self.light_avg > 0 {
            let avg = self.running.get_or_insert(n);
            let k = self.light_avg as f64;
            let blended = (*avg * k + n) / (k + 1.0);
            n = normalize(blended).unwrap_or(blended);
            *avg = blended;
        }

        let c = 1.0 + (self.colors - 2) as f64 * (1.0 - n.dot(self.light));
        (c as i32).clamp(1, self.colors - 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ambient_scale_bounds() {
        assert_eq!(ambient_scale(0), 255);
        assert_eq!(ambient_scale(20), 204);
        assert_eq!(ambient_scale(100), 1);
        assert_eq!(ambient_color(0, 204), 1);
        assert_eq!(ambient_color(255, 255), 254);
    }

    #[test]
    fn facing_the_light_is_brightest() {
        // flat face, normal (0, 0, 1)
        let cur = DVec3::new(1.0, 0.0, 0.0);
        let old = DVec3::ZERO;
        let up = DVec3::new(1.0, -1.0, 0.0);
        let n = cross(cur - old, up - cur);
        assert_eq!(n, DVec3::new(0.0, 0.0, -1.0));

        let mut toward = Shader::new(DVec3::new(0.0, 0.0, -1.0), 256, 0);
        assert_eq!(toward.intensity(cur, old, up), 1);
        let mut away = Shader::new(DVec3::new(0.0, 0.0, 1.0), 256, 0);
        assert_eq!(away.intensity(cur, old, up), 255);
        let mut side = Shader::new(DVec3::X, 256, 0);
        assert_eq!(side.intensity(cur, old, up), 255);
    }

    #[test]
    fn degenerate_face_gets_darkest_index() {
        let mut s = Shader::new(DVec3::Z, 256, 0);
        let p = DVec3::new(4.0, 4.0, 4.0);
        assert_eq!(s.intensity(p, p, p), 1);
    }

    #[test]
    fn averaging_starts_from_first_face_of_row() {
        let light = DVec3::new(0.0, 0.0, -1.0);
        let mut avg = Shader::new(light, 256, 3);
        let mut plain = Shader::new(light, 256, 0);
        let (cur, old, up) = (DVec3::X, DVec3::ZERO, DVec3::new(1.0, -1.0, 0.0));
        assert_eq!(avg.intensity(cur, old, up), plain.intensity(cur, old, up));

        // a tilted face is pulled back towards the flat one
        let tilted_up = DVec3::new(1.0, -1.0, 1.0);
        let smooth = avg.intensity(cur, old, tilted_up);
        let sharp = plain.intensity(cur, old, tilted_up);
        assert!(smooth < sharp, "{smooth} !< {sharp}");

        avg.start_row();
        assert_eq!(avg.intensity(cur, old, tilted_up), sharp);
    }
}
