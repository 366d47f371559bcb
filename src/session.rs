//! One projection from first row to last.
//!
//! A [`ProjectionSession`] is created per image. It opens the output files,
//! builds the [`ImageSetup`], and then turns each source row handed to
//! [`process_row`](ProjectionSession::process_row) into points, lines,
//! triangles or scene records according to the fill type.
//!
//! ### Life cycle
//! `new` → `process_row`… → `finish`. Any error, a cancel from the canvas
//! or dropping the session early closes it and deletes what it had opened.

use std::path::PathBuf;

use log::{info, warn};

use crate::config::{FillType, MAX_PIXELS, Params3d, next_free_path};
use crate::error::Line3dError;
use crate::math::{BAD_CHECK, Xorshift64};
use crate::project::Height;
use crate::raster::{
    Canvas, FillMode, FillPlot, FloatPoint, Palette, PixelSink, Plotter, Point, TriangleFiller,
    TrueColorOut, draw_line,
};
use crate::scene::SceneFile;
use crate::setup::ImageSetup;
use crate::shade::{Shader, TrueColorShader};
use crate::sphere::PhiRecurrence;
use crate::targa::TargaWriter;

/// What a finished projection produced.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RenderSummary {
    /// Source rows received.
    pub rows: usize,
    /// Triangles filled on screen, or sent to the scene file.
    pub triangles: u64,
    pub scene: Option<PathBuf>,
    pub targa: Option<PathBuf>,
}

/// Loop state carried from column to column within one row.
struct RowCursor {
    row: usize,
    last_dot: usize,
    cur: Point,
    f_cur: FloatPoint,
    old: Point,
    f_old: FloatPoint,
    /// A triangle of this row went to the scene file.
    tout: bool,
}

pub struct ProjectionSession<C: Canvas> {
    params: Params3d,
    setup: ImageSetup,
    palette: Palette,
    plotter: Plotter<C>,
    filler: TriangleFiller,
    fill_mode: FillMode,
    shader: Shader,
    scene: Option<SceneFile>,
    phi: Option<PhiRecurrence>,
    rng: Xorshift64,

    /// Points of the previous drawn row, screen and shading space.
    last: Vec<Point>,
    f_last: Vec<FloatPoint>,
    /// `last[col]` before it was overwritten; survives across rows.
    old_last: Point,
    /// Working copy of the row being projected.
    line: Vec<u8>,
    /// Fraction bytes of a 16-bit row pair.
    fraction: Vec<u8>,

    /// Rows of the preview grid: only every `local`-th is drawn.
    local: usize,
    col_stride: usize,
    /// Rows received so far.
    row_count: usize,
    triangles: u64,
    closed: bool,
}

fn buffer<T: Clone>(len: usize, fill: T, what: &'static str) -> Result<Vec<T>, Line3dError> {
    let mut v = Vec::new();
    v.try_reserve_exact(len)
        .map_err(|_| Line3dError::Allocation { what })?;
    v.resize(len, fill);
    Ok(v)
}

#[inline]
fn plausible(p: &Point, width: i32, height: i32) -> bool {
    p.x > BAD_CHECK && p.y > BAD_CHECK && p.x < width - BAD_CHECK && p.y < height - BAD_CHECK
}

impl<C: Canvas> ProjectionSession<C> {
    /// Open a projection of `rows` source rows of `row_len` pixels onto a
    /// `width × height` frame.
    pub fn new(
        params: Params3d,
        width: usize,
        height: usize,
        row_len: usize,
        rows: usize,
        palette: Palette,
        mut canvas: C,
    ) -> Result<Self, Line3dError> {
        params.validate()?;
        if width > MAX_PIXELS {
            return Err(Line3dError::TooWide {
                width,
                max: MAX_PIXELS,
            });
        }
        if width == 0 || height == 0 || row_len == 0 {
            return Err(Line3dError::Config(format!(
                "empty frame {width}×{height} or row length {row_len}"
            )));
        }

        let setup = ImageSetup::new(&params, width, height, row_len, rows);

        let scene = match &params.ray {
            Some(ray) => {
                let path = if params.overwrite {
                    ray.path.clone()
                } else {
                    next_free_path(&ray.path)
                };
                Some(SceneFile::create(
                    &path,
                    ray.format,
                    ray.brief,
                    width,
                    height,
                    params.colors,
                )?)
            }
            None => None,
        };

        let light_scale = params.fill.is_light().then_some(setup.ambient_scale);
        let truecolor = match &params.targa {
            Some(t) => {
                let targa = if t.overlay {
                    TargaWriter::overlay(&t.path, width, height).inspect_err(|e| {
                        warn!("overlay rejected: {e}");
                    })?
                } else {
                    let path = if params.overwrite {
                        t.path.clone()
                    } else {
                        next_free_path(&t.path)
                    };
                    TargaWriter::create(
                        &path,
                        width,
                        height,
                        t.truecolor.then_some(t.max_iterations),
                        t.background,
                    )?
                };
                let shader = TrueColorShader::new(
                    palette.clone(),
                    t.mode,
                    params.fill == FillType::SurfaceInterpolated || t.truecolor,
                    light_scale,
                    params.haze,
                )
                .with_monochrome(t.monochrome);
                Some(TrueColorOut { shader, targa })
            }
            None => None,
        };

        canvas.begin_image(width, height);
        let transparent = params
            .has_transparency()
            .then_some((params.transparent[0], params.transparent[1]));
        let mut plotter = Plotter::new(canvas, width, height, params.colors)
            .with_transparent(transparent)
            .with_light_scale(light_scale)
            .with_truecolor(truecolor);

        if params.preview && params.show_box {
            setup.draw_preview_boxes(&params, &mut plotter);
        }

        let last_dot = setup.last_dot();
        let mut factor = params.preview_factor as usize;
        if factor >= height || factor > last_dot {
            factor = (height - 1).min(last_dot);
        }
        let local = (height / factor.max(1)).max(1);
        let col_stride = ((setup.aspect * local as f64) as usize).max(1);

        let cache = width.max(row_len);
        let last = buffer(cache, Point::BAD, "row cache")?;
        let f_last = buffer(cache, FloatPoint::BAD, "shading row cache")?;
        let line = buffer(row_len, 0u8, "row buffer")?;
        let fraction = if params.potential16 {
            buffer(row_len, 0u8, "fraction buffer")?
        } else {
            Vec::new()
        };

        info!(
            "3D {:?} {width}×{height} from {row_len}×{rows}{}{}",
            params.fill,
            if setup.sphere.is_some() { ", sphere" } else { "" },
            if setup.persp { ", perspective" } else { "" },
        );

        Ok(Self {
            fill_mode: if params.fill == FillType::SurfaceConstant {
                FillMode::Flat
            } else {
                FillMode::Interpolated
            },
            shader: Shader::new(setup.light, params.colors, params.light_avg),
            filler: TriangleFiller::new(width, height),
            phi: setup.sphere.as_ref().map(|s| s.phi),
            rng: Xorshift64::from_seed(params.seed),
            params,
            setup,
            palette,
            plotter,
            scene,
            last,
            f_last,
            old_last: Point::BAD,
            line,
            fraction,
            local,
            col_stride,
            row_count: 0,
            triangles: 0,
            closed: false,
        })
    }

    #[inline]
    pub fn setup(&self) -> &ImageSetup {
        &self.setup
    }

    #[inline]
    pub fn canvas(&self) -> &C {
        self.plotter.canvas()
    }

    #[inline]
    pub fn canvas_mut(&mut self) -> &mut C {
        self.plotter.canvas_mut()
    }

    #[inline]
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Project the next source row.
    pub fn process_row(&mut self, pixels: &[u8]) -> Result<(), Line3dError> {
        self.row(pixels, None)
    }

    /// Project the next source row, with the iteration count of every
    /// pixel for iteration-encoded true colour.
    pub fn process_row_with_iterations(
        &mut self,
        pixels: &[u8],
        iterations: &[u32],
    ) -> Result<(), Line3dError> {
        self.row(pixels, Some(iterations))
    }

    fn row(&mut self, pixels: &[u8], iterations: Option<&[u32]>) -> Result<(), Line3dError> {
        if self.closed {
            return Err(Line3dError::Closed);
        }
        if self.plotter.canvas_mut().key_pressed() {
            warn!("3D projection cancelled at row {}", self.row_count);
            self.abort();
            return Err(Line3dError::Cancelled);
        }
        match self.project_row(pixels, iterations) {
            Ok(()) => Ok(()),
            Err(e) => {
                warn!("3D projection aborted: {e}");
                self.abort();
                Err(e)
            }
        }
    }

    fn project_row(&mut self, pixels: &[u8], iterations: Option<&[u32]>) -> Result<(), Line3dError> {
        let call = self.row_count;
        self.row_count += 1;
        let row = if self.params.potential16 { call >> 1 } else { call };
        let n = pixels.len().min(self.line.len());
        if n == 0 {
            return Ok(());
        }

        let mut line = std::mem::take(&mut self.line);
        if self.params.potential16 {
            if call & 1 == 0 {
                // high bytes: keep them until the fraction row arrives
                self.fraction[..n].copy_from_slice(&pixels[..n]);
                self.line = line;
                return Ok(());
            }
            line[..n].copy_from_slice(&self.fraction[..n]);
            self.fraction[..n].copy_from_slice(&pixels[..n]);
        } else if self.params.grayscale {
            for (dst, &src) in line.iter_mut().zip(&pixels[..n]) {
                *dst = self.palette.grey_level(src);
            }
        } else {
            line[..n].copy_from_slice(&pixels[..n]);
        }

        let height = self.setup.height;
        if let Some(tc) = self.plotter.truecolor_mut() {
            tc.start_row(row, height);
        }

        let sparse = self.sparse();
        let ray = self.setup.ray.is_some();
        let skip = sparse
            && row + 1 != height
            && row % self.local != 0
            && !(!ray && self.params.fill.is_light() && row == 1);
        let result = if skip {
            Ok(())
        } else {
            self.draw_row(&line[..n], iterations, row)
        };
        self.line = line;
        result?;

        if let Some(phi) = self.phi.as_mut() {
            phi.advance(row);
        }
        Ok(())
    }

    /// Preview, grid and scene output only visit a subset of the points.
    #[inline]
    fn sparse(&self) -> bool {
        self.setup.ray.is_some() || self.params.preview || self.params.fill == FillType::SurfaceGrid
    }

    fn draw_row(
        &mut self,
        line: &[u8],
        iterations: Option<&[u32]>,
        row: usize,
    ) -> Result<(), Line3dError> {
        let last_dot = self.setup.width.min(line.len()) - 1;
        let mut rc = RowCursor {
            row,
            last_dot,
            cur: Point::BAD,
            f_cur: FloatPoint::BAD,
            old: Point::BAD,
            f_old: FloatPoint::BAD,
            tout: false,
        };
        self.shader.start_row();
        let ray = self.setup.ray.is_some();
        let keeps_rows = ray || !matches!(self.params.fill, FillType::Points | FillType::SolidFill);
        let sparse = self.sparse();

        if let Some(scene) = self.scene.as_mut() {
            scene.start_row();
            if row != 0 {
                scene.start_object()?;
            }
        }

        for col in 0..line.len() {
            let skip = sparse
                && col != last_dot
                && col % self.col_stride != 0
                && !(!ray && self.params.fill.is_light() && col == 1);
            if !skip {
                let fraction = self.fraction.get(col).copied().unwrap_or(0);
                let iteration = iterations.and_then(|it| it.get(col)).copied().unwrap_or(0);
                self.column(&mut rc, col, line[col], fraction, iteration)?;
            }

            if keeps_rows {
                self.old_last = self.last[col];
                rc.old = rc.cur;
                self.last[col] = rc.cur;
                rc.f_old = rc.f_cur;
                self.f_last[col] = rc.f_cur;
                if row != 0 && col == last_dot {
                    if let Some(scene) = self.scene.as_mut() {
                        scene.end_object(rc.tout)?;
                        rc.tout = false;
                    }
                }
            }
        }

        if let Some(scene) = self.scene.as_mut() {
            scene.end_row();
        }
        Ok(())
    }

    /// Project one pixel and draw whatever the fill type asks for.
    fn column(
        &mut self,
        rc: &mut RowCursor,
        col: usize,
        pixel: u8,
        fraction: u8,
        iteration: u32,
    ) -> Result<(), Line3dError> {
        let waterline = self.params.waterline;
        let mut color = pixel as i32;
        let mut value = color as f64;
        if color > 0 && color < waterline {
            color = waterline;
            value = waterline as f64;
        } else if self.params.potential16 {
            value += fraction as f64 / 256.0;
        }
        self.plotter.real_color = color;
        self.plotter.iteration = iteration;

        let stride = if self.sparse() { self.col_stride } else { 1 };
        let next = (col + stride).min(rc.last_dot);

        let height = Height {
            color,
            value,
            fractional: self.params.potential16,
        };
        let projected = match self.phi {
            Some(phi) => {
                let keep_back = self.setup.ray.is_some() || self.params.fill == FillType::SurfaceGrid;
                self.setup.project_sphere(col, (phi.sin, phi.cos), height, keep_back)
            }
            None => self.setup.project_planar(col, rc.row, height),
        };
        let Some(p) = projected else {
            rc.cur = Point::BAD;
            rc.f_cur = FloatPoint::BAD;
            return Ok(());
        };
        rc.cur = p.cur;
        rc.f_cur = FloatPoint::from_vec(p.shade);

        if self.params.randomize != 0 && rc.cur.color > waterline {
            rc.cur.color = self.setup.jitter(rc.cur.color, &mut self.rng);
            self.plotter.real_color = rc.cur.color;
        }

        if self.setup.ray.is_some() {
            return self.ray_column(rc, col, next);
        }

        let (w, h) = (self.setup.width as i32, self.setup.height as i32);
        let (row, cur, old) = (rc.row, rc.cur, rc.old);

        match self.params.fill {
            FillType::SurfaceGrid => {
                if col != 0 && old.x > BAD_CHECK && old.x < w - BAD_CHECK {
                    draw_line(&mut self.plotter, old.x, old.y, cur.x, cur.y, cur.color);
                }
                let up = self.last[col];
                if row != 0 && plausible(&up, w, h) {
                    draw_line(&mut self.plotter, up.x, up.y, cur.x, cur.y, cur.color);
                }
            }
            FillType::Points => self.plotter.plot(cur.x, cur.y, cur.color),
            FillType::WireFrame => {
                if old.x < w && col != 0 && old.x > BAD_CHECK && old.y > BAD_CHECK {
                    draw_line(&mut self.plotter, old.x, old.y, cur.x, cur.y, cur.color);
                }
            }
            FillType::SurfaceInterpolated | FillType::SurfaceConstant => {
                if row != 0 && col == 0 {
                    self.triangle([self.last[next], self.last[col], cur], cur.color);
                } else if row != 0 {
                    if col == 1 {
                        self.triangle([self.last[col], self.old_last, old], old.color);
                    }
                    if col < rc.last_dot {
                        self.triangle([self.last[next], self.last[col], cur], cur.color);
                    }
                    self.triangle([old, self.last[col], cur], cur.color);
                }
            }
            FillType::SolidFill => {
                let Some(base) = self.setup.solid_base(col, row) else {
                    rc.cur = Point::BAD;
                    rc.f_cur = FloatPoint::BAD;
                    return Ok(());
                };
                draw_line(&mut self.plotter, base.x, base.y, cur.x, cur.y, cur.color);
            }
            FillType::LightBefore | FillType::LightAfter => self.light_column(rc, col, next),
        }
        Ok(())
    }

    /// Light-source fill: the face normal sets the colour of `cur`, then the
    /// two triangles behind it are filled with that intensity.
    fn light_column(&mut self, rc: &mut RowCursor, col: usize, next: usize) {
        if rc.row == 0 || col == 0 {
            return;
        }
        let up = self.f_last[col];
        let bad = BAD_CHECK as f32;
        if rc.f_cur.color < bad || rc.f_old.color < bad || up.color < bad {
            return;
        }
        rc.cur.color = self
            .shader
            .intensity(rc.f_cur.to_vec(), rc.f_old.to_vec(), up.to_vec());
        let cur = rc.cur;

        if col == 1 && rc.row > 1 {
            // left margin of a preview
            self.triangle([self.last[next], self.last[col], cur], cur.color);
        }
        if col < 2 || rc.row < 2 {
            return;
        }
        if col < rc.last_dot {
            self.triangle([self.last[next], self.last[col], cur], cur.color);
        }
        self.triangle([rc.old, self.last[col], cur], cur.color);
    }

    /// Fill one triangle, counting it when it was not rejected.
    fn triangle(&mut self, tri: [Point; 3], color: i32) {
        let mut sink = FillPlot {
            plotter: &mut self.plotter,
            mode: self.fill_mode,
            tri,
        };
        if self.filler.fill(tri, color, &mut sink) {
            self.triangles += 1;
        }
    }

    /// Scene output: the two triangles behind `cur` go to the file and their
    /// outlines to the screen.
    fn ray_column(&mut self, rc: &mut RowCursor, col: usize, next: usize) -> Result<(), Line3dError> {
        let (w, h) = (self.setup.width as i32, self.setup.height as i32);
        let (cur, old, f_cur, f_old) = (rc.cur, rc.old, rc.f_cur, rc.f_old);
        let (up, up_next) = (self.last[col], self.last[next]);
        let (f_up, f_up_next) = (self.f_last[col], self.f_last[next]);
        let water = self.setup.water_z as f32;
        let in_water = f_cur.color == water && f_up.color == water && f_up_next.color == water;
        let Some(scene) = self.scene.as_mut() else {
            return Ok(());
        };

        if col != 0
            && rc.row != 0
            && old.x > BAD_CHECK
            && old.x < w - BAD_CHECK
            && plausible(&up, w, h)
            && !in_water
        {
            scene.triangle([f_cur, f_old, f_up], [cur.color, old.color, up.color], &self.palette)?;
            rc.tout = true;
            self.triangles += 1;
            draw_line(&mut self.plotter, old.x, old.y, cur.x, cur.y, old.color);
            draw_line(&mut self.plotter, old.x, old.y, up.x, up.y, old.color);
            draw_line(&mut self.plotter, up.x, up.y, cur.x, cur.y, cur.color);
        }

        if col < rc.last_dot
            && rc.row != 0
            && plausible(&up, w, h)
            && plausible(&up_next, w, h)
            && !in_water
        {
            scene.triangle(
                [f_cur, f_up, f_up_next],
                [cur.color, up.color, up_next.color],
                &self.palette,
            )?;
            rc.tout = true;
            self.triangles += 1;
            draw_line(&mut self.plotter, up.x, up.y, cur.x, cur.y, cur.color);
            draw_line(&mut self.plotter, up_next.x, up_next.y, cur.x, cur.y, cur.color);
            draw_line(&mut self.plotter, up_next.x, up_next.y, up.x, up.y, up.color);
        }

        if !scene.wants_triangles() {
            scene.vertex(f_cur)?;
        }
        Ok(())
    }

    /// Close every output and report what was produced.
    pub fn finish(&mut self) -> Result<RenderSummary, Line3dError> {
        if self.closed {
            return Err(Line3dError::Closed);
        }
        self.closed = true;

        let scene = match self.scene.take() {
            Some(file) => {
                let path = file.path().to_path_buf();
                if let Err(e) = file.finish() {
                    warn!("scene file failed: {e}");
                    self.plotter.abort_truecolor();
                    return Err(e.into());
                }
                Some(path)
            }
            None => None,
        };
        let targa = self.plotter.finish_truecolor().inspect_err(|e| {
            warn!("targa file failed: {e}");
        })?;

        let summary = RenderSummary {
            rows: self.row_count,
            triangles: self.triangles,
            scene,
            targa,
        };
        info!(
            "3D done: {} rows, {} triangles",
            summary.rows, summary.triangles
        );
        Ok(summary)
    }

    /// Stop now; partial output files are deleted.
    pub fn abort(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        if let Some(scene) = self.scene.take() {
            scene.abort();
        }
        self.plotter.abort_truecolor();
    }
}

impl<C: Canvas> Drop for ProjectionSession<C> {
    fn drop(&mut self) {
        self.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{RayFormat, RayOptions, TargaOptions};
    use crate::raster::Framebuffer;

    /*------------------------------------------------------------------*/
    /*  Helpers                                                          */
    /*------------------------------------------------------------------*/

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

    fn session(p: Params3d, w: usize, h: usize, row_len: usize) -> ProjectionSession<Framebuffer> {
        ProjectionSession::new(p, w, h, row_len, h, Palette::grey(), Framebuffer::default()).unwrap()
    }

    fn drawn(fb: &Framebuffer) -> Vec<(usize, usize, u8)> {
        let mut out = Vec::new();
        for y in 0..fb.height {
            for x in 0..fb.width {
                let c = fb.get(x, y);
                if c != 0 {
                    out.push((x, y, c));
                }
            }
        }
        out
    }

    /*------------------------------------------------------------------*/
    /*  Set-up                                                           */
    /*------------------------------------------------------------------*/

    #[test]
    fn rejects_too_wide_frames() {
        let r = ProjectionSession::new(
            Params3d::default(),
            MAX_PIXELS + 1,
            10,
            10,
            10,
            Palette::grey(),
            Framebuffer::default(),
        );
        assert!(matches!(r, Err(Line3dError::TooWide { .. })));
    }

    #[test]
    fn preview_factor_is_clamped() {
        let p = Params3d {
            preview: true,
            preview_factor: 500,
            ..flat(FillType::Points)
        };
        let s = session(p, 8, 8, 8);
        assert_eq!(s.local, 8 / 7);
        assert!(s.col_stride >= 1);
    }

    /*------------------------------------------------------------------*/
    /*  Fill types                                                       */
    /*------------------------------------------------------------------*/

    #[test]
    fn points_land_one_pixel_down_right() {
        let mut s = session(flat(FillType::Points), 8, 8, 4);
        for _ in 0..4 {
            s.process_row(&[7, 7, 7, 7]).unwrap();
        }
        let px = drawn(s.canvas());
        assert_eq!(px.len(), 16, "{px:?}");
        assert!(px.iter().all(|&(x, y, c)| (1..=4).contains(&x) && (1..=4).contains(&y) && c == 7));
        let summary = s.finish().unwrap();
        assert_eq!(summary.rows, 4);
        assert_eq!(summary.triangles, 0);
    }

    #[test]
    fn wire_frame_joins_neighbours_in_a_row() {
        let mut s = session(flat(FillType::WireFrame), 8, 8, 4);
        s.process_row(&[9, 9, 9, 9]).unwrap();
        let px = drawn(s.canvas());
        assert_eq!(px.len(), 4, "{px:?}");
        assert!(px.iter().all(|&(_, y, _)| y == 1));
    }

    #[test]
    fn solid_fill_reaches_down_to_the_base() {
        let p = Params3d {
            x_rot: 90,
            ..flat(FillType::SolidFill)
        };
        let mut s = session(p, 16, 16, 16);
        s.process_row(&[200; 16]).unwrap();
        assert!(drawn(s.canvas()).len() > 16);
    }

    #[test]
    fn light_fill_starts_on_the_third_row() {
        let mut s = session(flat(FillType::LightBefore), 32, 32, 16);
        let row: Vec<u8> = (0..16).map(|i| (i * 8) as u8).collect();
        s.process_row(&row).unwrap();
        s.process_row(&row).unwrap();
        assert_eq!(s.triangles, 0);
        s.process_row(&row).unwrap();
        assert!(s.triangles > 0);
        assert!(drawn(s.canvas()).iter().all(|&(_, _, c)| c >= 1));
    }

    #[test]
    fn monochrome_light_fill_shows_targa_brightness() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mono.tga");
        let p = Params3d {
            targa: Some(TargaOptions {
                monochrome: true,
                ..TargaOptions::new(&path)
            }),
            ..flat(FillType::LightBefore)
        };
        let mut s = session(p, 16, 16, 16);
        for y in 0..16u8 {
            let row: Vec<u8> = (0..16u8).map(|x| 20 + x * 7 + y * 3).collect();
            s.process_row(&row).unwrap();
        }
        s.finish().unwrap();

        let tga = std::fs::read(&path).unwrap();
        let px = drawn(s.canvas());
        assert!(!px.is_empty());
        for (x, y, c) in px {
            let at = 18 + (y * 16 + x) * 3;
            let [b, g, r] = [tga[at], tga[at + 1], tga[at + 2]].map(u32::from);
            let v = (35 * r + 45 * g + 20 * b) / 100;
            assert_eq!(c as u32, 255 - v, "pixel ({x}, {y})");
        }
    }

    #[test]
    fn sixteen_bit_rows_come_in_pairs() {
        let p = Params3d {
            potential16: true,
            ..flat(FillType::Points)
        };
        let mut s = session(p, 8, 8, 4);
        s.process_row(&[5, 5, 5, 5]).unwrap();
        assert!(drawn(s.canvas()).is_empty(), "even rows are only stored");
        s.process_row(&[128, 128, 128, 128]).unwrap();
        let px = drawn(s.canvas());
        assert_eq!(px.len(), 4);
        assert!(px.iter().all(|&(_, y, c)| y == 1 && c == 5));
    }

    #[test]
    fn lake_pixels_are_raised_to_the_waterline() {
        let p = Params3d {
            waterline: 30,
            ..flat(FillType::Points)
        };
        let mut s = session(p, 8, 8, 4);
        s.process_row(&[0, 10, 29, 31]).unwrap();
        let colors: Vec<u8> = drawn(s.canvas()).iter().map(|p| p.2).collect();
        assert_eq!(colors, vec![30, 30, 31]);
    }

    /*------------------------------------------------------------------*/
    /*  Life cycle                                                       */
    /*------------------------------------------------------------------*/

    #[test]
    fn closed_session_refuses_rows() {
        let mut s = session(flat(FillType::Points), 8, 8, 4);
        s.finish().unwrap();
        assert!(matches!(s.process_row(&[1; 4]), Err(Line3dError::Closed)));
        assert!(matches!(s.finish(), Err(Line3dError::Closed)));
    }

    #[test]
    fn scene_file_gets_triangles_and_footer() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("m.raw");
        let p = Params3d {
            ray: Some(RayOptions {
                format: RayFormat::Raw,
                path: path.clone(),
                brief: true,
            }),
            ..flat(FillType::Points)
        };
        // a 4-row frame keeps every row in the scene grid
        let mut s = session(p, 4, 4, 4);
        for i in 0..4u8 {
            s.process_row(&[10 + i, 20, 30, 40]).unwrap();
        }
        let summary = s.finish().unwrap();
        assert_eq!(summary.scene.as_deref(), Some(path.as_path()));
        // two triangles per cell of the 3×3 grid
        assert_eq!(summary.triangles, 18);
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("No. Of Triangles = 18"), "{text}");
    }

    #[test]
    fn dropping_unfinished_session_removes_targa() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.tga");
        let p = Params3d {
            targa: Some(TargaOptions::new(&path)),
            ..flat(FillType::SurfaceInterpolated)
        };
        {
            let mut s = session(p, 8, 8, 4);
            s.process_row(&[50; 4]).unwrap();
            assert!(path.exists());
        }
        assert!(!path.exists());
    }
}
