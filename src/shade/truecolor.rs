//! 24-bit colour for the Targa side channel.
//!
//! The base colour comes from the palette (or the raw iteration count); the
//! light intensity then darkens it in HSV space and haze pulls it towards
//! mid grey.

use super::hsv::{hsv_to_rgb, rgb_to_hsv};
use crate::config::TrueColorMode;
use crate::raster::Palette;

/// V halfway up the scale; haze drags every value towards it.
const HAZE_GREY: u32 = 32640;

/// Percent of colour left at `row`; 100 at the bottom of the frame, down
/// to `100 - haze` at the top.
pub fn haze_mult(haze: i32, row: usize, height: usize) -> i32 {
    if haze <= 0 || height < 2 {
        return 100;
    }
    let span = (height - 1) as f64;
    let dist = (height - 1).saturating_sub(row) as f64;
    100 - (haze as f64 * (dist * dist) / (span * span)) as i32
}

/// One shaded pixel: the Targa colour and its perceived brightness.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Shaded {
    pub bgr: [u8; 3],
    /// Weighted luminance of `bgr`, 0..=255.
    pub value: u8,
}

#[derive(Clone, Debug)]
pub struct TrueColorShader {
    palette: Palette,
    mode: TrueColorMode,
    /// Shade the interpolated colour instead of the source colour.
    interpolated: bool,
    /// Ambient-scaled light multiplier, only in the light-source fills.
    light_scale: Option<u32>,
    haze: i32,
    haze_mult: i32,
    /// Screen shows the Targa brightness in the light-source fills.
    monochrome: bool,
}

impl TrueColorShader {
    pub fn new(
        palette: Palette,
        mode: TrueColorMode,
        interpolated: bool,
        light_scale: Option<u32>,
        haze: i32,
    ) -> Self {
        Self {
            palette,
            mode,
            interpolated,
            light_scale,
            haze,
            haze_mult: 100,
            monochrome: false,
        }
    }

    pub fn with_monochrome(mut self, on: bool) -> Self {
        self.monochrome = on;
        self
    }

    /// The screen colour should be derived from [`Shaded::value`].
    #[inline]
    pub fn monochrome(&self) -> bool {
        self.monochrome && self.light_scale.is_some()
    }

    #[inline]
    pub fn interpolated(&self) -> bool {
        self.interpolated
    }

    /// Recompute the haze for the row about to be drawn.
    pub fn start_row(&mut self, row: usize, height: usize) {
        self.haze_mult = haze_mult(self.haze, row, height);
    }

    /// Targa colour for a pixel drawn with `color` whose source colour is
    /// `real_color` and whose iteration count is `iteration`.
    pub fn shade(&self, color: i32, real_color: i32, iteration: u32) -> Shaded {
        let base = match self.mode {
            TrueColorMode::Palette => self.palette.rgb(real_color),
            TrueColorMode::Iterations => [
                (iteration >> 16) as u8,
                (iteration >> 8) as u8,
                iteration as u8,
            ],
        };
        let mut hsv = rgb_to_hsv(base);

        if let Some(scale) = self.light_scale {
            let dim = (color.max(0) as u64 * scale as u64).min(65535);
            hsv.v = ((hsv.v as u64 * (65535 - dim)) / 65535) as u32;
        }

        if self.haze > 0 {
            let hm = self.haze_mult.max(0) as u32;
            hsv.s = hsv.s * hm / 100;
            hsv.v = if hsv.v >= HAZE_GREY {
                (hsv.v - HAZE_GREY) * hm / 100 + HAZE_GREY
            } else {
                HAZE_GREY - (HAZE_GREY - hsv.v) * hm / 100
            };
        }

        let [r, g, b] = hsv_to_rgb(hsv);
        let value = (35 * r as u32 + 45 * g as u32 + 20 * b as u32) / 100;
        Shaded {
            bgr: [b, g, r],
            value: value as u8,
        }
    }
}
