//! Text scene files for external ray tracers and CAD tools.
//!
//! The projector hands every surface triangle (in normalised `-1..1`
//! coordinates) to a [`SceneFile`], which owns the output stream and the
//! per-file counters and delegates the dialect to a [`SceneWriter`].
//!
//! ### Life cycle
//! `header` → (`start_object` → `triangle`/`vertex`… → `end_object`)* →
//! `footer`. A file that is abandoned before `footer` is deleted.

mod acrospin;
mod dxf;
mod mtv;
mod pov;
mod raw;
mod rayshade;
mod vivid;

pub use acrospin::AcrospinWriter;
pub use dxf::DxfWriter;
pub use mtv::MtvWriter;
pub use pov::PovWriter;
pub use raw::RawWriter;
pub use rayshade::RayshadeWriter;
pub use vivid::VividWriter;

use std::{
    fs::{self, File},
    io::{self, BufWriter, Write},
    path::{Path, PathBuf},
};

use log::{debug, warn};

use crate::config::RayFormat;
use crate::error::SceneError;
use crate::raster::{FloatPoint, Palette};

/// First line of every non-DXF file.
pub fn banner() -> String {
    format!("{{ Created by LINE3D_RS Ver. {} }}\n\n", env!("CARGO_PKG_VERSION"))
}

/// One surface triangle, ready to print.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SceneTriangle {
    /// Vertices in normalised screen space.
    pub pts: [[f32; 3]; 3],
    /// Average vertex colour, `0..=1` per channel; `None` in brief files.
    pub rgb: Option<[f32; 3]>,
    /// Palette index of the first vertex.
    pub first_color: i32,
}

/// Totals available when the footer is written.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SceneStats {
    pub triangles: u64,
    /// Rows that produced vertices.
    pub rows: u32,
    /// Highest vertex index seen in any row.
    pub max_col: u32,
}

/// One output dialect.
pub trait SceneWriter {
    fn header(&mut self, out: &mut dyn Write, brief: bool) -> io::Result<()>;

    /// Open the per-row group.
    fn start_object(&mut self, _out: &mut dyn Write) -> io::Result<()> {
        Ok(())
    }

    fn triangle(&mut self, out: &mut dyn Write, tri: &SceneTriangle) -> io::Result<()>;

    /// A single surface point, for dialects that list vertices rather than
    /// faces.
    fn vertex(&mut self, _out: &mut dyn Write, _p: [f32; 3], _row: u32, _col: u32) -> io::Result<()> {
        Ok(())
    }

    /// Close the per-row group; `had_triangles` is false for an empty row.
    fn end_object(&mut self, out: &mut dyn Write, had_triangles: bool) -> io::Result<()>;

    fn footer(&mut self, out: &mut dyn Write, stats: &SceneStats) -> io::Result<()>;

    /// `false` for dialects fed through [`vertex`](Self::vertex) only.
    fn wants_triangles(&self) -> bool {
        true
    }
}

pub fn writer_for(format: RayFormat) -> Box<dyn SceneWriter> {
    match format {
        RayFormat::Pov => Box::new(PovWriter::default()),
        RayFormat::Vivid => Box::new(VividWriter),
        RayFormat::Raw => Box::new(RawWriter),
        RayFormat::Mtv => Box::new(MtvWriter),
        RayFormat::Rayshade => Box::new(RayshadeWriter),
        RayFormat::Acrospin => Box::new(AcrospinWriter),
        RayFormat::Dxf => Box::new(DxfWriter),
    }
}

/// `printf("% #4.4f")`: sign or blank, four decimals.
pub fn c_float(v: f32) -> String {
    c_float_prec(v, 4)
}

/// `printf("% #4.Nf")`.
pub fn c_float_prec(v: f32, prec: usize) -> String {
    let sign = if v.is_sign_negative() { '-' } else { ' ' };
    format!("{sign}{:.prec$}", v.abs())
}

/// `printf("%g")`: six significant digits, trailing zeros dropped.
pub fn c_general(v: f64) -> String {
    if v == 0.0 {
        return "0".to_string();
    }
    if !v.is_finite() {
        return format!("{v}");
    }
    let sci = format!("{v:.5e}");
    let Some((mantissa, exp)) = sci.split_once('e') else {
        return sci;
    };
    let exp: i32 = exp.parse().unwrap_or(0);
    if !(-4..6).contains(&exp) {
        let m = strip_zeros(mantissa);
        let sign = if exp < 0 { '-' } else { '+' };
        return format!("{m}e{sign}{:02}", exp.abs());
    }
    let prec = (5 - exp) as usize;
    strip_zeros(&format!("{v:.prec$}")).to_string()
}

fn strip_zeros(s: &str) -> &str {
    if s.contains('.') {
        s.trim_end_matches('0').trim_end_matches('.')
    } else {
        s
    }
}

/// Open scene file plus the counters its footer needs.
pub struct SceneFile {
    path: PathBuf,
    out: Option<BufWriter<File>>,
    writer: Box<dyn SceneWriter>,
    brief: bool,
    width: f32,
    height: f32,
    colors: f32,
    stats: SceneStats,
    col: u32,
}

impl SceneFile {
    /// Create `path` and write the header.
    pub fn create(
        path: &Path,
        format: RayFormat,
        brief: bool,
        width: usize,
        height: usize,
        colors: i32,
    ) -> Result<Self, SceneError> {
        let file = File::create(path).map_err(|source| SceneError::CantOpen {
            path: path.to_path_buf(),
            source,
        })?;
        let mut scene = Self {
            path: path.to_path_buf(),
            out: Some(BufWriter::new(file)),
            writer: writer_for(format),
            brief,
            width: width as f32,
            height: height as f32,
            colors: colors as f32,
            stats: SceneStats::default(),
            col: 0,
        };
        scene.emit(|w, out| w.header(out, brief))?;
        debug!("opened {:?} scene {}", format, path.display());
        Ok(scene)
    }

    #[inline]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[inline]
    pub fn triangles(&self) -> u64 {
        self.stats.triangles
    }

    #[inline]
    pub fn wants_triangles(&self) -> bool {
        self.writer.wants_triangles()
    }

    fn emit<F>(&mut self, f: F) -> Result<(), SceneError>
    where
        F: FnOnce(&mut dyn SceneWriter, &mut dyn Write) -> io::Result<()>,
    {
        let Some(out) = self.out.as_mut() else {
            return Ok(());
        };
        f(self.writer.as_mut(), out).map_err(|e| SceneError::from_write(&self.path, e))
    }

    /// Count a triangle; also written out unless the dialect is vertex-only.
    ///
    /// Vertices are in projector units: x and y in pixels, the third
    /// component in colour steps.
    pub fn triangle(
        &mut self,
        pts: [FloatPoint; 3],
        colors: [i32; 3],
        palette: &Palette,
    ) -> Result<(), SceneError> {
        self.stats.triangles += 1;
        if !self.writer.wants_triangles() {
            return Ok(());
        }
        let norm = |p: FloatPoint| {
            [
                2.0 * p.x / self.width - 1.0,
                2.0 * p.y / self.height - 1.0,
                -2.0 * p.color / self.colors - 1.0,
            ]
        };
        let pts = pts.map(norm);
        if pts[0] == pts[1] || pts[0] == pts[2] || pts[1] == pts[2] {
            return Ok(());
        }
        let rgb = (!self.brief).then(|| {
            let sum = colors.map(|c| palette.rgb(c)).iter().fold([0u32; 3], |acc, c| {
                [acc[0] + c[0] as u32, acc[1] + c[1] as u32, acc[2] + c[2] as u32]
            });
            sum.map(|s| s as f32 / (3.0 * 255.0))
        });
        let tri = SceneTriangle {
            pts,
            rgb,
            first_color: colors[0],
        };
        self.emit(|w, out| w.triangle(out, &tri))
    }

    /// Vertex line for vertex-only dialects; numbered by row and column.
    pub fn vertex(&mut self, p: FloatPoint) -> Result<(), SceneError> {
        let (row, col) = (self.stats.rows, self.col);
        self.stats.max_col = self.stats.max_col.max(col);
        self.col += 1;
        self.emit(|w, out| w.vertex(out, [p.x, p.y, p.color], row, col))
    }

    pub fn start_object(&mut self) -> Result<(), SceneError> {
        self.emit(|w, out| w.start_object(out))
    }

    pub fn end_object(&mut self, had_triangles: bool) -> Result<(), SceneError> {
        self.emit(|w, out| w.end_object(out, had_triangles))
    }

    /// A row finished; vertex numbering moves on.
    pub fn end_row(&mut self) {
        self.stats.rows += 1;
        self.col = 0;
    }

    /// Reset the column counter at the start of a row.
    pub fn start_row(&mut self) {
        self.col = 0;
    }

    /// Write the footer and close the file.
    pub fn finish(mut self) -> Result<SceneStats, SceneError> {
        let stats = self.stats;
        self.emit(|w, out| w.footer(out, &stats))?;
        if let Some(mut out) = self.out.take() {
            out.flush().map_err(|e| SceneError::from_write(&self.path, e))?;
        }
        debug!(
            "closed {} ({} triangles)",
            self.path.display(),
            stats.triangles
        );
        Ok(stats)
    }

    /// Close and delete the file.
    pub fn abort(mut self) {
        self.discard();
    }

    fn discard(&mut self) {
        if let Some(out) = self.out.take() {
            drop(out);
            if let Err(e) = fs::remove_file(&self.path) {
                warn!("could not remove {}: {e}", self.path.display());
            }
        }
    }
}

impl Drop for SceneFile {
    fn drop(&mut self) {
        self.discard();
    }
}

#[cfg(test)]
pub(crate) mod testutil {
    use super::*;

    /// Run `f` against `writer` and return what it printed.
    pub fn render<W, F>(writer: &mut W, f: F) -> String
    where
        W: SceneWriter,
        F: FnOnce(&mut W, &mut Vec<u8>) -> io::Result<()>,
    {
        let mut buf = Vec::new();
        f(writer, &mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    pub fn sample_triangle(rgb: Option<[f32; 3]>) -> SceneTriangle {
        SceneTriangle {
            pts: [[-1.0, -1.0, -1.5], [0.5, -1.0, -1.25], [0.0, 0.25, -2.0]],
            rgb,
            first_color: 300,
        }
    }
}
