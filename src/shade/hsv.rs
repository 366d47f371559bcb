//! Integer RGB ⇄ HSV.
//!
//! Units: hue in 1/64 degree (`0..23040`), saturation `0..=65535`, value
//! `0..=65280` (the 8-bit maximum shifted left by 8).

pub const HUE_CIRCLE: u32 = 360 << 6;
const HUE_SECTOR: u32 = 60 << 6;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Hsv {
    pub h: u32,
    pub s: u32,
    pub v: u32,
}

pub fn rgb_to_hsv([r, g, b]: [u8; 3]) -> Hsv {
    let (r, g, b) = (r as u32, g as u32, b as u32);
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let denom = max - min;

    let s = if max != 0 && denom != 0 {
        ((denom << 16) / max) - 1
    } else {
        0
    };
    if s == 0 {
        return Hsv { h: 0, s: 0, v: max << 8 };
    }

    let dist = |c: u32| (((max - c) * 60) << 6) / denom;
    let (r1, g1, b1) = (dist(r), dist(g), dist(b));
    let mut h = 0;
    // later matches win when two channels share the maximum
    if max == r {
        h = if min == g { (300 << 6) + b1 } else { (60 << 6) - g1 };
    }
    if max == g {
        h = if min == b { (60 << 6) + r1 } else { (180 << 6) - b1 };
    }
    if max == b {
        h = if min == r { (180 << 6) + g1 } else { (300 << 6) - r1 };
    }
    Hsv { h, s, v: max << 8 }
}

pub fn hsv_to_rgb(Hsv { h, s, v }: Hsv) -> [u8; 3] {
    let h = (h % HUE_CIRCLE) as i64;
    let (s, v) = (s.min(65535) as i64, v as i64);
    let sector = h / HUE_SECTOR as i64;
    let rmd = h % HUE_SECTOR as i64;

    let chan = |x: i64| x.clamp(0, 255) as u8;
    let p1 = chan((v * (65535 - s) / 65280) >> 8);
    let p2 = chan(((v * (65535 - (s * rmd) / 3840) / 65280) - 1) >> 8);
    let p3 = chan((v * (65535 - (s * (3840 - rmd)) / 3840) / 65280) >> 8);
    let v = chan(v >> 8);

    match sector {
        0 => [v, p3, p1],
        1 => [p2, v, p1],
        2 => [p1, v, p3],
        3 => [p1, p2, v],
        4 => [p3, p1, v],
        _ => [v, p1, p2],
    }
}
