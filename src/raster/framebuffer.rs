// In-memory canvas and the 256-entry palette it is viewed through.

use std::ops::{Index, IndexMut};

use super::Canvas;

/// 256 colours, 0x00RRGGBB.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Palette(pub [u32; 256]);

impl Default for Palette {
    fn default() -> Self {
        Palette([0u32; 256])
    }
}

impl Index<usize> for Palette {
    type Output = u32;
    fn index(&self, idx: usize) -> &u32 {
        &self.0[idx]
    }
}

impl IndexMut<usize> for Palette {
    fn index_mut(&mut self, idx: usize) -> &mut u32 {
        &mut self.0[idx]
    }
}

impl Palette {
    /// Black to white.
    pub fn grey() -> Self {
        let mut p = Palette::default();
        for i in 0..256u32 {
            p[i as usize] = (i << 16) | (i << 8) | i;
        }
        p
    }

    /// `[r, g, b]` of entry `idx`; out-of-range indices wrap.
    #[inline]
    pub fn rgb(&self, idx: i32) -> [u8; 3] {
        let c = self.0[(idx & 0xff) as usize];
        [(c >> 16) as u8, (c >> 8) as u8, c as u8]
    }

    /// Luminance-weighted grey level of entry `idx`.
    #[inline]
    pub fn grey_level(&self, idx: u8) -> u8 {
        let [r, g, b] = self.rgb(idx as i32);
        ((77 * r as u32 + 151 * g as u32 + 28 * b as u32) >> 8) as u8
    }
}

/// A palette-indexed frame kept in RAM.
#[derive(Default)]
pub struct Framebuffer {
    pub pixels: Vec<u8>,
    pub width: usize,
    pub height: usize,
}

impl Framebuffer {
    pub fn new(width: usize, height: usize) -> Self {
        let mut fb = Framebuffer::default();
        fb.begin_image(width, height);
        fb
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> u8 {
        self.pixels[y * self.width + x]
    }

    /// Expand to 0x00RRGGBB through `palette`.
    pub fn to_rgb(&self, palette: &Palette) -> Vec<u32> {
        self.pixels.iter().map(|&i| palette[i as usize]).collect()
    }
}

impl Canvas for Framebuffer {
    fn begin_image(&mut self, width: usize, height: usize) {
        if width != self.width || height != self.height {
            self.width = width;
            self.height = height;
            self.pixels.resize(width * height, 0);
        }
        self.pixels.fill(0);
    }

    #[inline]
    fn put_pixel(&mut self, x: usize, y: usize, color: u8) {
        self.pixels[y * self.width + x] = color;
    }

    fn end_image<F>(&mut self, submit: F)
    where
        F: FnOnce(&[u8], usize, usize),
    {
        submit(&self.pixels, self.width, self.height);
    }
}
