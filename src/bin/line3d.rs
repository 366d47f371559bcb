//! line3d - project a height map into 3D.
//!
//! USAGE:
//! ```bash
//! cargo run --bin line3d -- --fill light-before --out relief.ppm heights.pgm
//! cargo run --bin line3d -- --sphere --ray pov --ray-out planet.pov
//! cargo run --features viewer --bin line3d -- --fill surface-interpolated --show
//! ```
//!
//! Without an input file a Mandelbrot escape-count field is used.

use anyhow::{Context, bail};
use clap::Parser;
use log::info;
use std::{
    fs,
    io::{BufWriter, Write},
    path::{Path, PathBuf},
};

use line3d_rs::{
    Canvas, FillType, Framebuffer, Numeric, Palette, Params3d, ProjectionSession, RayFormat,
    TrueColorMode,
    config::{RayOptions, SphereParams, TargaOptions},
    shade::hsv::{HUE_CIRCLE, Hsv, hsv_to_rgb},
};

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Opts {
    /// Binary PGM (P5) height map; omitted = synthetic Mandelbrot
    #[arg(value_name = "INPUT")]
    input: Option<PathBuf>,

    /// Screen raster output (binary PPM)
    #[arg(long, short, value_name = "FILE", default_value = "line3d.ppm")]
    out: PathBuf,

    /// Output frame, WIDTHxHEIGHT; defaults to the input size
    #[arg(long, value_name = "WxH", value_parser = parse_size)]
    frame: Option<(usize, usize)>,

    /// Size of the synthetic field
    #[arg(long, value_name = "WxH", value_parser = parse_size, default_value = "320x200")]
    size: (usize, usize),

    #[arg(long, value_enum, default_value = "surface-interpolated")]
    fill: FillType,

    /// Map onto a sphere instead of a plane
    #[arg(long)]
    sphere: bool,

    #[arg(long, allow_hyphen_values = true, default_value_t = 60)]
    x_rot: i32,
    #[arg(long, allow_hyphen_values = true, default_value_t = 30)]
    y_rot: i32,
    #[arg(long, allow_hyphen_values = true, default_value_t = 0)]
    z_rot: i32,
    #[arg(long, default_value_t = 90)]
    x_scale: i32,
    #[arg(long, default_value_t = 90)]
    y_scale: i32,
    /// Height scale in percent
    #[arg(long, allow_hyphen_values = true, default_value_t = 30)]
    rough: i32,
    #[arg(long, default_value_t = 0)]
    waterline: i32,
    /// Perspective eye distance in percent; 0 = orthographic
    #[arg(long, default_value_t = 0)]
    z_viewer: i32,
    #[arg(long, allow_hyphen_values = true, default_value_t = 0)]
    x_shift: i32,
    #[arg(long, allow_hyphen_values = true, default_value_t = 0)]
    y_shift: i32,

    /// Light direction X,Y,Z
    #[arg(long, value_delimiter = ',', allow_hyphen_values = true, num_args = 3)]
    light: Option<Vec<i32>>,
    #[arg(long, default_value_t = 20)]
    ambient: i32,
    #[arg(long, default_value_t = 0)]
    haze: i32,
    #[arg(long, default_value_t = 0)]
    randomize: i32,
    #[arg(long, default_value_t = 0)]
    light_avg: i32,

    /// Coarse preview; `--show-box` adds the orientation boxes
    #[arg(long)]
    preview: bool,
    #[arg(long)]
    show_box: bool,
    #[arg(long, default_value_t = 20)]
    preview_factor: i32,

    /// Scene file dialect
    #[arg(long, value_enum)]
    ray: Option<RayFormat>,
    #[arg(long, value_name = "FILE")]
    ray_out: Option<PathBuf>,
    /// Leave out per-triangle colours
    #[arg(long)]
    brief: bool,

    /// 24-bit Targa side output
    #[arg(long, value_name = "FILE")]
    targa: Option<PathBuf>,
    /// Draw over the existing Targa file instead of creating one
    #[arg(long)]
    overlay: bool,
    #[arg(long, value_enum, default_value = "palette")]
    truecolor_mode: TrueColorMode,
    /// Screen mirrors the Targa brightness in the light fills
    #[arg(long)]
    monochrome: bool,

    /// Colours LO,HI left unplotted
    #[arg(long, value_delimiter = ',', num_args = 2)]
    transparent: Option<Vec<i32>>,
    #[arg(long)]
    grayscale: bool,
    #[arg(long, value_enum, default_value = "float")]
    numeric: Numeric,
    #[arg(long, default_value_t = 1)]
    seed: u64,
    /// Replace existing output files
    #[arg(long)]
    overwrite: bool,

    /// Colour the field through a hue ramp instead of grey levels
    #[arg(long)]
    spectrum: bool,

    /// Show the result in a window
    #[cfg(feature = "viewer")]
    #[arg(long)]
    show: bool,
}

fn parse_size(s: &str) -> Result<(usize, usize), String> {
    let (w, h) = s
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected WIDTHxHEIGHT, got {s:?}"))?;
    let w = w.trim().parse().map_err(|e| format!("width: {e}"))?;
    let h = h.trim().parse().map_err(|e| format!("height: {e}"))?;
    Ok((w, h))
}

/// Height field plus optional per-pixel iteration counts.
struct Field {
    width: usize,
    height: usize,
    pixels: Vec<u8>,
    iterations: Option<Vec<u32>>,
}

fn read_pgm(path: &Path) -> anyhow::Result<Field> {
    let bytes = fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    let mut pos = 0;
    let mut token = || -> anyhow::Result<String> {
        loop {
            while pos < bytes.len() && bytes[pos].is_ascii_whitespace() {
                pos += 1;
            }
            if pos < bytes.len() && bytes[pos] == b'#' {
                while pos < bytes.len() && bytes[pos] != b'\n' {
                    pos += 1;
                }
                continue;
            }
            break;
        }
        let start = pos;
        while pos < bytes.len() && !bytes[pos].is_ascii_whitespace() {
            pos += 1;
        }
        if start == pos {
            bail!("truncated PGM header");
        }
        Ok(String::from_utf8_lossy(&bytes[start..pos]).into_owned())
    };

    if token()? != "P5" {
        bail!("{}: not a binary PGM", path.display());
    }
    let width: usize = token()?.parse()?;
    let height: usize = token()?.parse()?;
    let maxval: usize = token()?.parse()?;
    if maxval > 255 {
        bail!("{}: 16-bit PGM not supported", path.display());
    }
    // single whitespace byte after maxval
    let data = pos + 1;
    let pixels = bytes
        .get(data..data + width * height)
        .context("PGM pixel data is short")?
        .to_vec();
    Ok(Field {
        width,
        height,
        pixels,
        iterations: None,
    })
}

fn mandelbrot(width: usize, height: usize, max_iter: u32) -> Field {
    let mut pixels = Vec::with_capacity(width * height);
    let mut iterations = Vec::with_capacity(width * height);
    for py in 0..height {
        for px in 0..width {
            let cr = -2.5 + 3.5 * px as f64 / width as f64;
            let ci = -1.25 + 2.5 * py as f64 / height as f64;
            let (mut zr, mut zi) = (0.0f64, 0.0f64);
            let mut n = 0;
            while n < max_iter && zr * zr + zi * zi < 4.0 {
                let t = zr * zr - zi * zi + cr;
                zi = 2.0 * zr * zi + ci;
                zr = t;
                n += 1;
            }
            iterations.push(n);
            pixels.push(if n == max_iter { 0 } else { (n % 255 + 1) as u8 });
        }
    }
    Field {
        width,
        height,
        pixels,
        iterations: Some(iterations),
    }
}

fn spectrum() -> Palette {
    let mut p = Palette::default();
    for i in 1..256u32 {
        let [r, g, b] = hsv_to_rgb(Hsv {
            h: i * HUE_CIRCLE / 256,
            s: 65535,
            v: 255 << 8,
        });
        p[i as usize] = ((r as u32) << 16) | ((g as u32) << 8) | b as u32;
    }
    p
}

fn write_ppm(path: &Path, rgb: &[u32], width: usize, height: usize) -> anyhow::Result<()> {
    let file = fs::File::create(path).with_context(|| format!("creating {}", path.display()))?;
    let mut out = BufWriter::new(file);
    write!(out, "P6\n{width} {height}\n255\n")?;
    for &c in rgb {
        out.write_all(&[(c >> 16) as u8, (c >> 8) as u8, c as u8])?;
    }
    out.flush()?;
    Ok(())
}

impl Opts {
    fn params(&self) -> anyhow::Result<Params3d> {
        let base = if self.sphere {
            Params3d {
                sphere: Some(SphereParams::default()),
                light: [1, 1, 1],
                ..Params3d::default()
            }
        } else {
            Params3d::default()
        };
        let ray = match (self.ray, &self.ray_out) {
            (Some(format), path) => Some(RayOptions {
                format,
                path: path
                    .clone()
                    .unwrap_or_else(|| PathBuf::from(format!("fract001.{}", format.extension()))),
                brief: self.brief,
            }),
            (None, Some(_)) => bail!("--ray-out needs --ray"),
            (None, None) => None,
        };
        let targa = self.targa.as_ref().map(|path| TargaOptions {
            overlay: self.overlay,
            mode: self.truecolor_mode,
            monochrome: self.monochrome,
            ..TargaOptions::new(path)
        });
        Ok(Params3d {
            fill: self.fill,
            x_rot: self.x_rot,
            y_rot: self.y_rot,
            z_rot: self.z_rot,
            x_scale: self.x_scale,
            y_scale: self.y_scale,
            rough: self.rough,
            waterline: self.waterline,
            z_viewer: self.z_viewer,
            x_shift: self.x_shift,
            y_shift: self.y_shift,
            light: match self.light.as_deref() {
                Some(&[x, y, z]) => [x, y, z],
                _ => base.light,
            },
            ambient: self.ambient,
            haze: self.haze,
            randomize: self.randomize,
            light_avg: self.light_avg,
            preview: self.preview,
            show_box: self.show_box,
            preview_factor: self.preview_factor,
            ray,
            targa,
            transparent: match self.transparent.as_deref() {
                Some(&[lo, hi]) => [lo, hi],
                _ => [0, 0],
            },
            grayscale: self.grayscale,
            numeric: self.numeric,
            seed: self.seed,
            overwrite: self.overwrite,
            ..base
        })
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let opts = Opts::parse();
    let params = opts.params()?;

    let field = match &opts.input {
        Some(path) => read_pgm(path)?,
        None => mandelbrot(opts.size.0, opts.size.1, 1000),
    };
    let (width, height) = opts.frame.unwrap_or((field.width, field.height));
    let palette = if opts.spectrum {
        spectrum()
    } else {
        Palette::grey()
    };

    let mut session = ProjectionSession::new(
        params,
        width,
        height,
        field.width,
        field.height,
        palette.clone(),
        Framebuffer::default(),
    )?;
    for (y, row) in field.pixels.chunks_exact(field.width).enumerate() {
        match &field.iterations {
            Some(it) => {
                let counts = &it[y * field.width..(y + 1) * field.width];
                session.process_row_with_iterations(row, counts)?
            }
            None => session.process_row(row)?,
        }
    }
    let summary = session.finish()?;
    info!("{summary:?}");

    let mut rgb = Vec::new();
    session
        .canvas_mut()
        .end_image(|pixels, _, _| rgb = pixels.iter().map(|&i| palette[i as usize]).collect());
    write_ppm(&opts.out, &rgb, width, height)?;
    println!("wrote {}", opts.out.display());

    #[cfg(feature = "viewer")]
    if opts.show {
        use minifb::{Key, Window, WindowOptions};
        let mut win = Window::new("line3d", width, height, WindowOptions::default())?;
        win.set_target_fps(30);
        while win.is_open() && !win.is_key_down(Key::Escape) {
            win.update_with_buffer(&rgb, width, height)?;
        }
    }
    Ok(())
}
