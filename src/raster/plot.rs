//! The pixel sinks that actually touch the canvas.
//!
//! [`Plotter`] itself is the plain sink used for points, lines and the
//! light-box preview: clip to the frame and the colour range, honour the
//! transparent range, mirror to the Targa file. [`FillPlot`] wraps it for
//! triangle spans and optionally blends the three vertex colours.

use std::path::PathBuf;

use super::{Canvas, PixelSink, Point};
use crate::error::TargaError;
use crate::shade::{TrueColorShader, ambient_color};
use crate::targa::TargaWriter;

/// True-colour side channel: how to colour a pixel and where it goes.
pub struct TrueColorOut {
    pub shader: TrueColorShader,
    pub targa: TargaWriter,
}

pub struct Plotter<C: Canvas> {
    canvas: C,
    width: i32,
    height: i32,
    colors: i32,
    transparent: Option<(i32, i32)>,
    /// Source colour of the pixel being projected.
    pub real_color: i32,
    /// Iteration count of the pixel being projected.
    pub iteration: u32,
    /// Light intensities are scaled by this before reaching the canvas.
    light_scale: Option<u32>,
    truecolor: Option<TrueColorOut>,
}

impl<C: Canvas> Plotter<C> {
    pub fn new(canvas: C, width: usize, height: usize, colors: i32) -> Self {
        Self {
            canvas,
            width: width as i32,
            height: height as i32,
            colors,
            transparent: None,
            real_color: 0,
            iteration: 0,
            light_scale: None,
            truecolor: None,
        }
    }

    /// Leave colours in `lo..=hi` unplotted.
    pub fn with_transparent(mut self, range: Option<(i32, i32)>) -> Self {
        self.transparent = range;
        self
    }

    pub fn with_light_scale(mut self, scale: Option<u32>) -> Self {
        self.light_scale = scale;
        self
    }

    pub fn with_truecolor(mut self, out: Option<TrueColorOut>) -> Self {
        self.truecolor = out;
        self
    }

    #[inline]
    pub fn canvas(&self) -> &C {
        &self.canvas
    }

    #[inline]
    pub fn canvas_mut(&mut self) -> &mut C {
        &mut self.canvas
    }

    #[inline]
    pub fn truecolor_mut(&mut self) -> Option<&mut TrueColorShader> {
        self.truecolor.as_mut().map(|t| &mut t.shader)
    }

    /// Flush the Targa file, if any, and return where it ended up.
    pub fn finish_truecolor(&mut self) -> Result<Option<PathBuf>, TargaError> {
        match self.truecolor.take() {
            Some(out) => out.targa.finish().map(Some),
            None => Ok(None),
        }
    }

    /// Drop the Targa file, if any, without writing it.
    pub fn abort_truecolor(&mut self) {
        if let Some(out) = self.truecolor.take() {
            out.targa.abort();
        }
    }

    #[inline]
    fn on_frame(&self, x: i32, y: i32) -> bool {
        (0..self.width).contains(&x) && (0..self.height).contains(&y)
    }

    #[inline]
    fn is_transparent(&self, color: i32) -> bool {
        matches!(self.transparent, Some((lo, hi)) if lo <= color && color <= hi)
    }

    /// Mirror the pixel to the Targa file. Returns the screen colour to use
    /// instead of `color` when the screen follows the Targa brightness.
    fn true_color(&mut self, x: i32, y: i32, color: i32) -> Option<i32> {
        let out = self.truecolor.as_mut()?;
        if out.shader.interpolated() {
            self.real_color = color;
        }
        let shaded = out.shader.shade(color, self.real_color, self.iteration);
        out.targa.put(x as usize, y as usize, shaded.bgr);
        out.shader
            .monochrome()
            .then(|| 255 - shaded.value as i32)
    }

    /// Clip, honour transparency and plot `color` unchanged.
    pub fn clip_plot(&mut self, x: i32, y: i32, color: i32) {
        if !self.on_frame(x, y) || !(0..self.colors).contains(&color) || self.is_transparent(color)
        {
            return;
        }
        self.true_color(x, y, color);
        self.canvas.put_pixel(x as usize, y as usize, color as u8);
    }

    /// Blend the vertex colours of `tri` by Manhattan distance to `(x, y)`.
    ///
    /// The transparency test looks at the source colour, not the blend.
    pub fn interp_plot(&mut self, x: i32, y: i32, color: i32, tri: &[Point; 3]) {
        let d = tri.map(|p| (p.x - x).abs() + (p.y - y).abs());
        let denom = (d[0] + d[1] + d[2]) << 1;
        let mut color = color;
        if denom != 0 {
            let weighted = (d[1] + d[2]) as i64 * tri[0].color as i64
                + (d[0] + d[2]) as i64 * tri[1].color as i64
                + (d[0] + d[1]) as i64 * tri[2].color as i64;
            color = (weighted / denom as i64) as i32;
        }

        if !self.on_frame(x, y) || !(0..self.colors).contains(&color) {
            return;
        }
        if self.transparent.is_some() && self.is_transparent(self.real_color) {
            return;
        }
        let screen = self.true_color(x, y, color);
        if let Some(scale) = self.light_scale {
            color = screen.unwrap_or_else(|| ambient_color(color, scale));
        }
        self.canvas.put_pixel(x as usize, y as usize, color as u8);
    }
}

impl<C: Canvas> PixelSink for Plotter<C> {
    #[inline]
    fn plot(&mut self, x: i32, y: i32, color: i32) {
        self.clip_plot(x, y, color);
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FillMode {
    /// Every span pixel in the triangle's colour.
    Flat,
    /// Per-pixel blend of the three vertex colours.
    Interpolated,
}

/// Span sink for one triangle.
pub struct FillPlot<'a, C: Canvas> {
    pub plotter: &'a mut Plotter<C>,
    pub mode: FillMode,
    pub tri: [Point; 3],
}

impl<C: Canvas> PixelSink for FillPlot<'_, C> {
    #[inline]
    fn plot(&mut self, x: i32, y: i32, color: i32) {
        match self.mode {
            FillMode::Flat => self.plotter.clip_plot(x, y, color),
            FillMode::Interpolated => self.plotter.interp_plot(x, y, color, &self.tri),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raster::{Framebuffer, TriangleFiller};

    fn plotter(w: usize, h: usize) -> Plotter<Framebuffer> {
        Plotter::new(Framebuffer::new(w, h), w, h, 256)
    }

    #[test]
    fn clip_plot_rejects_out_of_range() {
        let mut p = plotter(4, 4);
        p.plot(-1, 0, 5);
        p.plot(4, 0, 5);
        p.plot(0, 0, 256);
        p.plot(0, 0, -3);
        assert!(p.canvas().pixels.iter().all(|&c| c == 0));
        p.plot(3, 3, 5);
        assert_eq!(p.canvas().get(3, 3), 5);
    }

    #[test]
    fn transparent_range_is_skipped() {
        let mut p = plotter(4, 4).with_transparent(Some((10, 20)));
        p.plot(0, 0, 15);
        p.plot(1, 0, 21);
        assert_eq!(p.canvas().get(0, 0), 0);
        assert_eq!(p.canvas().get(1, 0), 21);
    }

    #[test]
    fn interpolation_blends_vertices() {
        let mut p = plotter(16, 16);
        let tri = [Point::new(0, 0, 10), Point::new(10, 0, 10), Point::new(0, 10, 10)];
        p.interp_plot(0, 0, 0, &tri);
        assert_eq!(p.canvas().get(0, 0), 10, "uniform vertex colours stay put");

        let tri = [Point::new(0, 0, 0), Point::new(8, 0, 100), Point::new(0, 8, 100)];
        let mut filler = TriangleFiller::new(16, 16);
        let mut sink = FillPlot {
            plotter: &mut p,
            mode: FillMode::Interpolated,
            tri,
        };
        filler.fill(tri, 100, &mut sink);
        let corner = p.canvas().get(0, 0);
        let far = p.canvas().get(7, 0);
        assert!(corner < far, "{corner} !< {far}");
    }

    #[test]
    fn light_intensities_are_ambient_scaled() {
        let mut p = plotter(4, 4).with_light_scale(Some(204));
        let tri = [Point::new(0, 0, 255); 3];
        p.interp_plot(0, 0, 255, &tri);
        assert_eq!(p.canvas().get(0, 0), ((1 + 255 * 204) / 256) as u8);
    }
}
