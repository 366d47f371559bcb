//! 3D projection parameters.
//!
//! [`Params3d::default`] is the planar set-up, [`Params3d::sphere_defaults`]
//! the spherical one. Angles are degrees, scales and light-model knobs are
//! percentages.

use std::path::{Path, PathBuf};

use clap::ValueEnum;

use crate::error::Line3dError;

/// Widest frame the row caches are built for.
pub const MAX_PIXELS: usize = 2048;

/// Default Targa background, RGB.
pub const DEFAULT_BACKGROUND: [u8; 3] = [51, 153, 200];

/// How each projected row is turned into pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, ValueEnum)]
pub enum FillType {
    /// Wire mesh joining each point to its left and upper neighbours.
    SurfaceGrid,
    Points,
    /// Each point joined to its left neighbour.
    WireFrame,
    /// Gouraud-style triangles blending the vertex colours.
    SurfaceInterpolated,
    /// Flat triangles in the colour of their last vertex.
    SurfaceConstant,
    /// A line from the base of the column up to each point.
    SolidFill,
    /// Light-source shading, light fixed before the rotation.
    LightBefore,
    /// Light-source shading, light rotated with the surface.
    LightAfter,
}

impl FillType {
    /// Historical numeric code, `-1..=6`.
    pub fn code(self) -> i32 {
        match self {
            FillType::SurfaceGrid => -1,
            FillType::Points => 0,
            FillType::WireFrame => 1,
            FillType::SurfaceInterpolated => 2,
            FillType::SurfaceConstant => 3,
            FillType::SolidFill => 4,
            FillType::LightBefore => 5,
            FillType::LightAfter => 6,
        }
    }

    pub fn from_code(code: i32) -> Option<Self> {
        Some(match code {
            -1 => FillType::SurfaceGrid,
            0 => FillType::Points,
            1 => FillType::WireFrame,
            2 => FillType::SurfaceInterpolated,
            3 => FillType::SurfaceConstant,
            4 => FillType::SolidFill,
            5 => FillType::LightBefore,
            6 => FillType::LightAfter,
            _ => return None,
        })
    }

    #[inline]
    pub fn is_light(self) -> bool {
        matches!(self, FillType::LightBefore | FillType::LightAfter)
    }

    /// Fill types that go through the triangle filler.
    #[inline]
    pub fn fills_triangles(self) -> bool {
        matches!(
            self,
            FillType::SurfaceInterpolated
                | FillType::SurfaceConstant
                | FillType::LightBefore
                | FillType::LightAfter
        )
    }
}

/// Scene-file dialects.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, ValueEnum)]
pub enum RayFormat {
    Pov,
    Vivid,
    Raw,
    Mtv,
    Rayshade,
    Acrospin,
    Dxf,
}

impl RayFormat {
    pub fn code(self) -> i32 {
        self as i32 + 1
    }

    pub fn extension(self) -> &'static str {
        match self {
            RayFormat::Pov => "pov",
            RayFormat::Vivid => "v",
            RayFormat::Raw => "raw",
            RayFormat::Mtv => "mtv",
            RayFormat::Rayshade => "ray",
            RayFormat::Acrospin => "acr",
            RayFormat::Dxf => "dxf",
        }
    }
}

/// Where the true-colour writer takes its base RGB from.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum TrueColorMode {
    /// Palette entry of the pixel's colour index.
    #[default]
    Palette,
    /// The iteration count itself, as `0xRRGGBB`.
    Iterations,
}

/// Arithmetic used for the planar transform.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum Numeric {
    #[default]
    Float,
    /// 16.16 fixed point, falling back to float per pixel on overflow.
    Fixed,
}

/// Spherical mapping: columns span latitude, rows span longitude.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SphereParams {
    pub phi1: i32,
    pub phi2: i32,
    pub theta1: i32,
    pub theta2: i32,
    /// Percent of half the frame height.
    pub radius: i32,
}

impl Default for SphereParams {
    fn default() -> Self {
        Self {
            phi1: 180,
            phi2: 0,
            theta1: -90,
            theta2: 90,
            radius: 100,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RayOptions {
    pub format: RayFormat,
    pub path: PathBuf,
    /// Leave out per-triangle materials.
    pub brief: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TargaOptions {
    pub path: PathBuf,
    /// Draw over an existing file of the same size instead of creating one.
    pub overlay: bool,
    pub mode: TrueColorMode,
    /// Record `max_iterations` in a 22-byte header and shade from the
    /// interpolated colour rather than the source colour.
    pub truecolor: bool,
    pub max_iterations: u32,
    /// RGB.
    pub background: [u8; 3],
    /// In the light-source fills, put the Targa pixel's brightness on
    /// screen instead of the ambient-scaled intensity.
    pub monochrome: bool,
}

impl TargaOptions {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            overlay: false,
            mode: TrueColorMode::Palette,
            truecolor: false,
            max_iterations: 0,
            background: DEFAULT_BACKGROUND,
            monochrome: false,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Params3d {
    pub fill: FillType,
    pub sphere: Option<SphereParams>,

    pub x_rot: i32,
    pub y_rot: i32,
    pub z_rot: i32,
    pub x_scale: i32,
    pub y_scale: i32,
    /// Height scale ("roughness"), percent.
    pub rough: i32,
    pub waterline: i32,
    /// Eye distance in percent of the object depth; 0 disables perspective.
    pub z_viewer: i32,
    /// Shift of the whole image, percent of the frame.
    pub x_shift: i32,
    pub y_shift: i32,
    /// Shift of the surface inside the box, percent of the frame.
    pub x_trans: i32,
    pub y_trans: i32,

    pub light: [i32; 3],
    pub ambient: i32,
    pub haze: i32,
    pub randomize: i32,
    pub light_avg: i32,

    pub preview: bool,
    pub show_box: bool,
    pub preview_factor: i32,

    pub ray: Option<RayOptions>,
    pub targa: Option<TargaOptions>,
    /// Inclusive colour range left unplotted; `[0, 0]` disables it.
    pub transparent: [i32; 2],

    pub colors: i32,
    pub grayscale: bool,
    /// Rows arrive in pairs: high byte row, then fraction row.
    pub potential16: bool,
    pub numeric: Numeric,
    pub seed: u64,
    /// Replace existing output files instead of picking a fresh name.
    pub overwrite: bool,
}

impl Default for Params3d {
    fn default() -> Self {
        Self {
            fill: FillType::Points,
            sphere: None,
            x_rot: 60,
            y_rot: 30,
            z_rot: 0,
            x_scale: 90,
            y_scale: 90,
            rough: 30,
            waterline: 0,
            z_viewer: 0,
            x_shift: 0,
            y_shift: 0,
            x_trans: 0,
            y_trans: 0,
            light: [1, -1, 1],
            ambient: 20,
            haze: 0,
            randomize: 0,
            light_avg: 0,
            preview: false,
            show_box: false,
            preview_factor: 20,
            ray: None,
            targa: None,
            transparent: [0, 0],
            colors: 256,
            grayscale: false,
            potential16: false,
            numeric: Numeric::Float,
            seed: 1,
            overwrite: false,
        }
    }
}

impl Params3d {
    pub fn sphere_defaults() -> Self {
        Self {
            fill: FillType::SurfaceInterpolated,
            sphere: Some(SphereParams::default()),
            light: [1, 1, 1],
            ..Self::default()
        }
    }

    #[inline]
    pub fn is_ray(&self) -> bool {
        self.ray.is_some()
    }

    #[inline]
    pub fn has_transparency(&self) -> bool {
        self.transparent != [0, 0]
    }

    /// Reject settings the projector cannot work with.
    pub fn validate(&self) -> Result<(), Line3dError> {
        let bad = |msg: String| Err(Line3dError::Config(msg));
        if self.preview_factor <= 0 {
            return bad(format!("preview factor {} must be positive", self.preview_factor));
        }
        if self.light_avg < 0 {
            return bad(format!("light average {} is negative", self.light_avg));
        }
        if !(0..=100).contains(&self.ambient) {
            return bad(format!("ambient {} outside 0..=100", self.ambient));
        }
        if !(0..=100).contains(&self.haze) {
            return bad(format!("haze {} outside 0..=100", self.haze));
        }
        if !(0..=7).contains(&self.randomize) {
            return bad(format!("randomize {} outside 0..=7", self.randomize));
        }
        if !(2..=256).contains(&self.colors) {
            return bad(format!("{} colours, need 2..=256", self.colors));
        }
        if self.transparent[0] > self.transparent[1] {
            return bad(format!(
                "transparent range {}..{} is reversed",
                self.transparent[0], self.transparent[1]
            ));
        }
        Ok(())
    }
}

/// First name at or after `path` that does not exist yet.
///
/// Trailing digits of the file stem are incremented, keeping their width
/// (`fract001.tga` → `fract002.tga`); a stem without digits gets `1`
/// appended.
pub fn next_free_path(path: &Path) -> PathBuf {
    let mut candidate = path.to_path_buf();
    while candidate.exists() {
        candidate = bump_stem(&candidate);
    }
    candidate
}

fn bump_stem(path: &Path) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let digits = stem.len() - stem.trim_end_matches(|c: char| c.is_ascii_digit()).len();
    let (base, num) = stem.split_at(stem.len() - digits);
    let next = match num.parse::<u64>() {
        Ok(n) => format!("{base}{:0width$}", n + 1, width = digits),
        Err(_) => format!("{stem}1"),
    };
    let mut out = path.with_file_name(next);
    if let Some(ext) = path.extension() {
        out.set_extension(ext);
    }
    out
}
