//! Once-per-image geometry: the combined transform, eye position, sphere
//! tables, light direction and the optional preview boxes.

use glam::DVec3;
use log::debug;

use crate::config::{FillType, Numeric, Params3d, RayFormat};
use crate::math::{FixedTransform, FixedView, Transform, View, normalize};
use crate::raster::{PixelSink, draw_line_f};
use crate::shade::ambient_scale;
use crate::sphere::{PhiRecurrence, ThetaTable};

/// Radians per degree, to the precision the angle inputs have always used.
const DEG: f64 = 1.0 / 57.29577;

/// Eye distance used for the light box, independent of the image's own.
const LIGHT_BOX_EYE: f64 = -750.0;

/// Eye distance (percent) at or below which the light vector is shortened.
const LIGHT_BOX_NEAR: i32 = 250;

/// Per-image constants of the spherical mapping.
#[derive(Clone, Debug)]
pub struct SphereSetup {
    pub theta: ThetaTable,
    pub phi: PhiRecurrence,
    /// Planet radius in pixels.
    pub radius: f64,
    pub rscale: f64,
    pub r_x_rscale: f64,
    pub r_factor: f64,
}

#[derive(Clone, Debug)]
pub struct ImageSetup {
    pub width: usize,
    pub height: usize,
    pub row_len: usize,
    pub colors: i32,
    pub fill: FillType,
    pub ray: Option<RayFormat>,

    pub transform: Transform,
    pub light_transform: Transform,
    /// 16.16 copy of `transform`, when the fixed path is in use.
    pub fixed: Option<FixedTransform>,
    pub fixed_view: FixedView,
    pub view: View,
    pub persp: bool,

    /// x, y, z scale factors.
    pub scale: DVec3,
    pub aspect: f64,
    pub sphere: Option<SphereSetup>,

    pub x_center: f64,
    pub y_center: f64,
    pub x_adjust: i32,
    pub y_adjust: i32,

    /// Unit light direction in the space normals are computed in.
    pub light: DVec3,
    pub ambient_scale: u32,
    /// Right shift applied to the squared random jitter.
    pub rand_shift: i32,
    pub waterline: i32,
    /// Depth of the waterline plane after the transform.
    pub water_z: f64,
}

/// Axis-aligned box spanned by the frame and the colour range, after `m`.
fn corners(m: &Transform, width: usize, height: usize, zcoord: i32) -> [[DVec3; 4]; 2] {
    let (x, y, z) = ((width - 1) as f64, (height - 1) as f64, (zcoord - 1) as f64);
    let face = |z: f64| {
        [
            DVec3::new(0.0, 0.0, z),
            DVec3::new(x, 0.0, z),
            DVec3::new(x, y, z),
            DVec3::new(0.0, y, z),
        ]
        .map(|p| m.apply(p))
    };
    [face(0.0), face(z)]
}

fn bounds(s: &[[DVec3; 4]; 2]) -> (DVec3, DVec3) {
    let mut min = DVec3::splat(i32::MAX as f64);
    let mut max = DVec3::splat(i32::MIN as f64);
    for p in s.iter().flatten() {
        min = min.min(*p);
        max = max.max(*p);
    }
    (min, max)
}

/// Outline of four points: closed (`rect`) or as the two segments 0-1, 2-3.
/// Edges spanning 6000 pixels or more are skipped.
fn draw_rect<S: PixelSink + ?Sized>(sink: &mut S, v: [DVec3; 4], color: i32, rect: bool) {
    let short = |a: DVec3, b: DVec3| (a.x - b.x).abs() < 6000.0 && (a.y - b.y).abs() < 6000.0;
    if rect {
        for i in 0..4 {
            let (a, b) = (v[i], v[(i + 1) % 4]);
            if short(a, b) {
                draw_line_f(sink, a, b, color);
            }
        }
    } else {
        for i in [0, 2] {
            if short(v[i], v[i + 1]) {
                draw_line_f(sink, v[i], v[i + 1], color);
            }
        }
    }
}

impl ImageSetup {
    /// `width × height` is the output frame, `row_len × rows` the source.
    pub fn new(params: &Params3d, width: usize, height: usize, row_len: usize, rows: usize) -> Self {
        let ray = params.ray.as_ref().map(|r| r.format);
        let colors = params.colors;
        let zcoord = colors;

        let mut scale = DVec3::new(
            params.x_scale as f64 / 100.0,
            params.y_scale as f64 / 100.0,
            -params.rough as f64 / 100.0,
        );
        let mut rscale = 0.0;
        if params.rough == 0 {
            scale.z = -0.0001;
            rscale = -0.0001;
        }
        let aspect = width as f64 * 0.75 / height as f64;

        let (x_adjust, y_adjust, x_shift, y_shift) = if ray.is_some() {
            (0, 0, 0, 0)
        } else {
            (
                (params.x_trans as f64 * width as f64 / 100.0) as i32,
                -(params.y_trans as f64 * height as f64 / 100.0) as i32,
                (params.x_shift as f64 * width as f64 / 100.0) as i32,
                (params.y_shift as f64 * height as f64 / 100.0) as i32,
            )
        };

        let mut transform = Transform::IDENTITY;
        let mut light_transform = Transform::IDENTITY;
        let mut bbox = (DVec3::ZERO, DVec3::ZERO);
        if params.sphere.is_none() {
            let (xr, yr, zr) = if ray.is_some() {
                (0.0, 0.0, 0.0)
            } else {
                (
                    params.x_rot as f64 * DEG,
                    params.y_rot as f64 * DEG,
                    params.z_rot as f64 * DEG,
                )
            };
            transform = transform
                .translate(width as f64 / -2.0, height as f64 / -2.0, zcoord as f64 / -2.0)
                .scale(scale.x, scale.y, scale.z)
                .rotate_x(xr)
                .rotate_y(yr)
                .rotate_z(zr);
            light_transform = transform;
            bbox = bounds(&corners(&transform, width, height, zcoord));
        }

        let persp = params.z_viewer != 0;
        let float_only = persp && params.z_viewer < 80;
        let eye_z = match params.sphere {
            Some(_) => -((height as f64 * params.z_viewer as f64 / 100.0) as i64),
            None => ((bbox.0.z - bbox.1.z) * params.z_viewer as f64 / 100.0) as i64,
        };
        let view = View(DVec3::new(
            (width >> 1) as f64,
            (height >> 1) as f64,
            eye_z as f64,
        ));

        let mut sphere = None;
        if let Some(sp) = params.sphere {
            let theta1 = sp.theta1 as f64 * std::f64::consts::PI / 180.0;
            let theta2 = sp.theta2 as f64 * std::f64::consts::PI / 180.0;
            let phi1 = sp.phi1 as f64 * std::f64::consts::PI / 180.0;
            let phi2 = sp.phi2 as f64 * std::f64::consts::PI / 180.0;
            let theta = ThetaTable::build(theta1, (theta2 - theta1) / row_len as f64, row_len);
            let phi = PhiRecurrence::new(phi1, (phi2 - phi1) / rows.max(1) as f64);

            if params.rough != 0 {
                rscale = 0.3 * params.rough as f64 / 100.0;
            }
            let radius = height as f64 / 2.0;
            let s = sp.radius as f64 / 100.0;
            scale = DVec3::new(s * aspect, s, s);
            sphere = Some(SphereSetup {
                theta,
                phi,
                radius,
                rscale,
                r_x_rscale: radius * rscale,
                r_factor: rscale * radius / zcoord as f64,
            });
        } else {
            let back = (
                (width as f64 - bbox.1.x - bbox.0.x) / 2.0,
                (height as f64 - bbox.1.y - bbox.0.y) / 2.0,
                -bbox.1.z,
            );
            transform = transform
                .translate(back.0, back.1, back.2)
                .translate(x_shift as f64, -y_shift as f64, 0.0);
            light_transform = light_transform.translate(back.0, back.1, back.2);
        }

        let fixed = match params.numeric {
            Numeric::Fixed if ray.is_none() && !float_only && params.sphere.is_none() => {
                FixedTransform::from_transform(&transform)
            }
            _ => None,
        };

        let mut light = DVec3::new(
            params.light[0] as f64,
            -params.light[1] as f64,
            params.light[2] as f64,
        );
        match params.fill {
            FillType::LightBefore => light.z = -light.z,
            FillType::LightAfter => light = transform.apply(light) - transform.apply(DVec3::ZERO),
            _ => {}
        }
        let light = normalize(light).unwrap_or(light);

        let water_z = transform.apply(DVec3::new(0.0, 0.0, params.waterline as f64)).z;

        debug!(
            "setup {width}×{height}, persp {persp}, fixed {}, eye {:.1}",
            fixed.is_some(),
            view.0.z
        );

        Self {
            width,
            height,
            row_len,
            colors,
            fill: params.fill,
            ray,
            transform,
            light_transform,
            fixed,
            fixed_view: FixedView::from_view(&view),
            view,
            persp,
            scale,
            aspect,
            sphere,
            x_center: (width / 2) as f64 + x_shift as f64,
            y_center: (height / 2) as f64 - y_shift as f64,
            x_adjust,
            y_adjust,
            light,
            ambient_scale: ambient_scale(params.ambient),
            rand_shift: 14 - params.randomize,
            waterline: params.waterline,
            water_z,
        }
    }

    /// Last column that is drawn.
    #[inline]
    pub fn last_dot(&self) -> usize {
        (self.width - 1).min(self.row_len - 1)
    }

    /// Draw the light-direction box and, for planar images, the frame box.
    pub fn draw_preview_boxes<S: PixelSink + ?Sized>(&self, params: &Params3d, sink: &mut S) {
        self.draw_light_box(params, sink);
        if self.sphere.is_none() {
            self.draw_frame_box(sink);
        }
    }

    fn draw_light_box<S: PixelSink + ?Sized>(&self, params: &Params3d, sink: &mut S) {
        let (w, h) = (self.width as i64, self.height as i64);
        let raw = DVec3::new(
            params.light[0] as f64,
            -params.light[1] as f64,
            if params.fill == FillType::LightBefore {
                -params.light[2] as f64
            } else {
                params.light[2] as f64
            },
        );
        let dir = normalize(raw).unwrap_or(raw);

        let mut origin = DVec3::new(
            ((3 * w) / 16) as f64,
            ((3 * h) / 4) as f64,
            0.0,
        );
        if params.fill == FillType::LightAfter {
            origin.y = ((11 * h) / 16) as f64;
        }

        let mut length = (w.min(h) / 2) as f64;
        if self.persp && params.z_viewer <= LIGHT_BOX_NEAR {
            length *= (LIGHT_BOX_NEAR + 600) as f64 / ((params.z_viewer + 600) * 2) as f64;
        }

        let mut direct = origin + dir * length;
        let half = (direct - origin) / 2.0;
        origin.x -= half.x;
        origin.y -= half.y;
        direct.x -= half.x;
        direct.y -= half.y;

        let mut s = [[DVec3::ZERO; 4]; 2];
        s[0][0] = DVec3::new(origin.x, origin.y, 0.0);
        s[1][0] = DVec3::new(origin.x, origin.y, direct.z);
        for face in s.iter_mut() {
            let base = face[0];
            face[1] = DVec3::new(base.x, direct.y, base.z);
            face[2] = DVec3::new(direct.x, direct.y, base.z);
            face[3] = DVec3::new(direct.x, base.y, base.z);
        }

        if params.fill == FillType::LightAfter {
            for p in s.iter_mut().flatten() {
                *p = self.light_transform.apply(*p);
            }
        }
        let eye = View(DVec3::new(self.view.0.x, self.view.0.y, LIGHT_BOX_EYE));
        for p in s.iter_mut().flatten() {
            *p = eye.project_or_bad(*p);
            p.x *= self.aspect;
        }

        draw_rect(sink, s[0], 2, true);
        draw_line_f(sink, s[0][0], s[1][2], 8);
        draw_rect(sink, [s[0][0], s[1][0], s[0][1], s[1][1]], 4, false);
        draw_rect(sink, [s[0][2], s[1][2], s[0][3], s[1][3]], 5, false);
        draw_rect(sink, s[1], 3, true);

        let tip = s[1][2];
        for i in -3i32..4 {
            for j in -3i32..4 {
                if i.abs() + j.abs() < 6 {
                    sink.plot((tip.x + i as f64) as i32, (tip.y + j as f64) as i32, 10);
                }
            }
        }
    }

    fn draw_frame_box<S: PixelSink + ?Sized>(&self, sink: &mut S) {
        let mut s = corners(&self.transform, self.width, self.height, self.colors);
        for p in s.iter_mut().flatten() {
            if self.persp {
                *p = self.view.project_or_bad(*p);
            }
            p.x += self.x_adjust as f64;
            p.y += self.y_adjust as f64;
        }
        draw_rect(sink, s[0], 2, true);
        draw_rect(sink, [s[0][0], s[1][0], s[0][1], s[1][1]], 5, false);
        draw_rect(sink, [s[0][2], s[1][2], s[0][3], s[1][3]], 6, false);
        draw_rect(sink, s[1], 8, true);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{RayOptions, SphereParams};

    fn flat(fill: FillType) -> Params3d {
        Params3d {
            fill,
            x_rot: 0,
            y_rot: 0,
            z_rot: 0,
            x_scale: 100,
            y_scale: 100,
            ..Params3d::default()
        }
    }

    #[test]
    fn unrotated_planar_maps_pixels_onto_themselves() {
        let s = ImageSetup::new(&flat(FillType::Points), 64, 48, 64, 48);
        let p = s.transform.apply(DVec3::new(10.0, 20.0, 100.0));
        assert!((p.x - 10.5).abs() < 1e-9 && (p.y - 20.5).abs() < 1e-9, "{p}");
        assert!(p.z <= 0.0, "surface lies in front of the eye plane");
        assert!(!s.persp);
        assert_eq!(s.last_dot(), 63);
    }

    #[test]
    fn box_is_recentred_for_any_rotation() {
        let p = Params3d::default();
        let s = ImageSetup::new(&p, 320, 200, 320, 200);
        let (min, max) = bounds(&corners(&s.transform, 320, 200, 256));
        assert!(((min.x + max.x) / 2.0 - 160.0).abs() < 1e-6);
        assert!(((min.y + max.y) / 2.0 - 100.0).abs() < 1e-6);
        assert!(max.z.abs() < 1e-6);
    }

    #[test]
    fn ray_output_disables_rotation_and_shifts() {
        let p = Params3d {
            x_shift: 10,
            x_trans: 20,
            ray: Some(RayOptions {
                format: RayFormat::Raw,
                path: "x.raw".into(),
                brief: true,
            }),
            ..Params3d::default()
        };
        let s = ImageSetup::new(&p, 100, 100, 100, 100);
        assert_eq!((s.x_adjust, s.y_adjust), (0, 0));
        assert_eq!(s.x_center, 50.0);
        assert_eq!(s.transform.element(0, 1), 0.0);
        assert_eq!(s.transform.element(1, 2), 0.0);
    }

    #[test]
    fn perspective_eye_and_float_forcing() {
        let p = Params3d {
            z_viewer: 60,
            numeric: Numeric::Fixed,
            ..Params3d::default()
        };
        let s = ImageSetup::new(&p, 320, 200, 320, 200);
        assert!(s.persp);
        assert!(s.view.0.z < 0.0);
        assert!(s.fixed.is_none(), "eye too close for 16.16");

        let p = Params3d {
            z_viewer: 150,
            numeric: Numeric::Fixed,
            ..Params3d::default()
        };
        assert!(ImageSetup::new(&p, 320, 200, 320, 200).fixed.is_some());
    }

    #[test]
    fn light_directions() {
        let s = ImageSetup::new(&flat(FillType::LightBefore), 64, 64, 64, 64);
        let want = DVec3::new(1.0, 1.0, -1.0).normalize();
        assert!((s.light - want).length() < 1e-12, "{}", s.light);

        // unrotated with negative z scale: the after-transform light flips z
        let s = ImageSetup::new(&flat(FillType::LightAfter), 64, 64, 64, 64);
        assert!(s.light.z < 0.0 && s.light.x > 0.0 && s.light.y > 0.0, "{}", s.light);
    }

    #[test]
    fn sphere_constants() {
        let p = Params3d {
            sphere: Some(SphereParams::default()),
            rough: 0,
            ..Params3d::sphere_defaults()
        };
        let s = ImageSetup::new(&p, 400, 300, 400, 300);
        let sp = s.sphere.as_ref().unwrap();
        assert_eq!(sp.radius, 150.0);
        assert_eq!(sp.rscale, -0.0001);
        assert_eq!(sp.theta.len(), 400);
        assert!((s.scale.x - 1.0).abs() < 1e-12, "aspect 400·0.75/300 = 1");
    }

    #[test]
    fn preview_box_draws_inside_frame() {
        let p = Params3d {
            preview: true,
            show_box: true,
            fill: FillType::LightBefore,
            ..Params3d::default()
        };
        let s = ImageSetup::new(&p, 320, 200, 320, 200);
        let mut colours = std::collections::HashSet::new();
        s.draw_preview_boxes(&p, &mut |x: i32, y: i32, c: i32| {
            if (0..320).contains(&x) && (0..200).contains(&y) {
                colours.insert(c);
            }
        });
        for c in [2, 3, 10] {
            assert!(colours.contains(&c), "colour {c} missing: {colours:?}");
        }
    }
}
