//! Pixel-level output.
//!
//! *Nothing above this module writes a pixel directly.* Points, lines and
//! triangles all end in a [`PixelSink`]; the sink decides whether a pixel is
//! clipped, recorded, colour-interpolated or forwarded to a [`Canvas`].
//!
//! * [`draw_line`] is the only rasterisation primitive.
//! * [`triangle::TriangleFiller`] builds filled triangles out of it by
//!   pointing it at a record-only sink first.
//! * [`plot::Plotter`] is the real sink: clipping, transparency and the
//!   true-colour side channel.

pub mod framebuffer;
pub mod plot;
pub mod triangle;

pub use framebuffer::{Framebuffer, Palette};
pub use plot::{FillMode, FillPlot, Plotter, TrueColorOut};
pub use triangle::{MAX_OFFSCREEN, MinMaxTable, TriangleFiller, offscreen};

use glam::DVec3;

use crate::math::BAD_VALUE;

/// Screen-space point; `color` is a palette index or a light intensity.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Point {
    pub x: i32,
    pub y: i32,
    pub color: i32,
}

impl Point {
    /// Marks "no usable point here"; clipping rejects it.
    pub const BAD: Self = Point {
        x: BAD_VALUE,
        y: BAD_VALUE,
        color: BAD_VALUE,
    };

    #[inline]
    pub const fn new(x: i32, y: i32, color: i32) -> Self {
        Point { x, y, color }
    }

    #[inline]
    pub fn same_xy(&self, other: &Point) -> bool {
        self.x == other.x && self.y == other.y
    }
}

/// Shading-space point, kept before the perspective divide.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct FloatPoint {
    pub x: f32,
    pub y: f32,
    pub color: f32,
}

impl FloatPoint {
    pub const BAD: Self = FloatPoint {
        x: BAD_VALUE as f32,
        y: BAD_VALUE as f32,
        color: BAD_VALUE as f32,
    };

    #[inline]
    pub const fn new(x: f32, y: f32, color: f32) -> Self {
        FloatPoint { x, y, color }
    }

    #[inline]
    pub fn from_vec(v: DVec3) -> Self {
        FloatPoint::new(v.x as f32, v.y as f32, v.z as f32)
    }

    #[inline]
    pub fn to_vec(self) -> DVec3 {
        DVec3::new(self.x as f64, self.y as f64, self.color as f64)
    }
}

/// Anything that accepts single pixels.
pub trait PixelSink {
    fn plot(&mut self, x: i32, y: i32, color: i32);
}

impl<F: FnMut(i32, i32, i32)> PixelSink for F {
    #[inline]
    fn plot(&mut self, x: i32, y: i32, color: i32) {
        self(x, y, color)
    }
}

/// Palette-indexed drawing surface the projector renders into.
///
/// Pixels reaching `put_pixel` are already inside the frame.
pub trait Canvas {
    /// (Re)allocate for the requested frame and clear it to colour 0.
    fn begin_image(&mut self, width: usize, height: usize);

    fn put_pixel(&mut self, x: usize, y: usize, color: u8);

    /// Polled once per source row; `true` cancels the projection.
    fn key_pressed(&mut self) -> bool {
        false
    }

    /// Finish the image and **loan** the index buffer to `submit`.
    fn end_image<F>(&mut self, submit: F)
    where
        F: FnOnce(&[u8], usize, usize);
}

/// Bresenham walk from `(x0, y0)` to `(x1, y1)`, both ends included.
///
/// No clipping happens here; every visited pixel goes to `sink`.
pub fn draw_line<S: PixelSink + ?Sized>(
    sink: &mut S,
    mut x0: i32,
    mut y0: i32,
    x1: i32,
    y1: i32,
    color: i32,
) {
    let dx = (x1 - x0).abs();
    let dy = -(y1 - y0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;

    loop {
        sink.plot(x0, y0, color);
        if x0 == x1 && y0 == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            if x0 == x1 {
                break;
            }
            err += dy;
            x0 += sx;
        }
        if e2 <= dx {
            if y0 == y1 {
                break;
            }
            err += dx;
            y0 += sy;
        }
    }
}

/// [`draw_line`] between float coordinates, truncated towards zero.
#[inline]
pub fn draw_line_f<S: PixelSink + ?Sized>(sink: &mut S, a: DVec3, b: DVec3, color: i32) {
    draw_line(sink, a.x as i32, a.y as i32, b.x as i32, b.y as i32, color);
}
