//! Whole projections, from the first row to the files on disk.

use line3d_rs::{
    Canvas, FillType, Framebuffer, Line3dError, Palette, Params3d, ProjectionSession, RayFormat,
    config::{RayOptions, TargaOptions},
};

/*--------------------------------------------------------------------------*/
/*  Helpers                                                                 */
/*--------------------------------------------------------------------------*/

/// Flat, unrotated, unscaled surface.
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

/// Framebuffer that reports a key press on poll number `cancel_at + 1`.
struct Impatient {
    fb: Framebuffer,
    polls: usize,
    cancel_at: usize,
}

impl Canvas for Impatient {
    fn begin_image(&mut self, width: usize, height: usize) {
        self.fb.begin_image(width, height);
    }

    fn put_pixel(&mut self, x: usize, y: usize, color: u8) {
        self.fb.put_pixel(x, y, color);
    }

    fn key_pressed(&mut self) -> bool {
        self.polls += 1;
        self.polls > self.cancel_at
    }

    fn end_image<F>(&mut self, submit: F)
    where
        F: FnOnce(&[u8], usize, usize),
    {
        self.fb.end_image(submit);
    }
}

/*--------------------------------------------------------------------------*/
/*  Surfaces                                                                */
/*--------------------------------------------------------------------------*/

#[test]
fn constant_height_surface_fills_a_square() {
    const C: u8 = 100;
    let mut s = ProjectionSession::new(
        flat(FillType::SurfaceConstant),
        8,
        8,
        4,
        4,
        Palette::grey(),
        Framebuffer::default(),
    )
    .unwrap();
    for _ in 0..4 {
        s.process_row(&[C; 4]).unwrap();
    }
    let summary = s.finish().unwrap();
    assert_eq!(summary.rows, 4);
    // per row after the first: 1 + 3 + 2 + 1
    assert_eq!(summary.triangles, 21);

    let fb = s.canvas();
    for y in 0..8 {
        for x in 0..8 {
            let inside = (1..=4).contains(&x) && (1..=4).contains(&y);
            let want = if inside { C } else { 0 };
            assert_eq!(fb.get(x, y), want, "pixel ({x}, {y})");
        }
    }
}

#[test]
fn sphere_draws_around_the_centre() {
    let mut s = ProjectionSession::new(
        Params3d::sphere_defaults(),
        64,
        64,
        64,
        64,
        Palette::grey(),
        Framebuffer::default(),
    )
    .unwrap();
    for _ in 0..64 {
        s.process_row(&[120; 64]).unwrap();
    }
    s.finish().unwrap();
    let fb = s.canvas();
    assert_ne!(fb.get(32, 32), 0, "centre of the disc");
    assert_eq!(fb.get(0, 0), 0, "corner stays background");
}

/*--------------------------------------------------------------------------*/
/*  Output files                                                            */
/*--------------------------------------------------------------------------*/

#[test]
fn cancel_on_third_row_removes_scene_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("surface.pov");
    let p = Params3d {
        ray: Some(RayOptions {
            format: RayFormat::Pov,
            path: path.clone(),
            brief: false,
        }),
        ..flat(FillType::Points)
    };
    let canvas = Impatient {
        fb: Framebuffer::default(),
        polls: 0,
        cancel_at: 2,
    };
    let mut s = ProjectionSession::new(p, 10, 10, 10, 10, Palette::grey(), canvas).unwrap();
    assert!(path.exists());

    s.process_row(&[40; 10]).unwrap();
    s.process_row(&[40; 10]).unwrap();
    assert!(matches!(s.process_row(&[40; 10]), Err(Line3dError::Cancelled)));
    assert!(!path.exists(), "partial scene file left behind");
    assert!(matches!(s.process_row(&[40; 10]), Err(Line3dError::Closed)));
}

#[test]
fn existing_scene_file_is_not_overwritten() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("fract001.raw");
    std::fs::write(&path, b"keep me").unwrap();
    let p = Params3d {
        ray: Some(RayOptions {
            format: RayFormat::Raw,
            path: path.clone(),
            brief: true,
        }),
        ..flat(FillType::Points)
    };
    let mut s =
        ProjectionSession::new(p, 4, 4, 4, 4, Palette::grey(), Framebuffer::default()).unwrap();
    for _ in 0..4 {
        s.process_row(&[9; 4]).unwrap();
    }
    let summary = s.finish().unwrap();
    assert_eq!(summary.scene, Some(dir.path().join("fract002.raw")));
    assert_eq!(std::fs::read(&path).unwrap(), b"keep me");
}

#[test]
fn targa_overlay_reuses_the_first_image() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("relief.tga");

    let render = |p: Params3d| {
        let mut s =
            ProjectionSession::new(p, 16, 16, 8, 8, Palette::grey(), Framebuffer::default())
                .unwrap();
        for i in 0..8u8 {
            s.process_row(&[20 + i * 10; 8]).unwrap();
        }
        s.finish().unwrap()
    };

    let first = render(Params3d {
        targa: Some(TargaOptions::new(&path)),
        ..flat(FillType::LightBefore)
    });
    assert_eq!(first.targa.as_deref(), Some(path.as_path()));
    let len = std::fs::metadata(&path).unwrap().len();
    assert_eq!(len, 18 + 16 * 16 * 3);

    let second = render(Params3d {
        targa: Some(TargaOptions {
            overlay: true,
            ..TargaOptions::new(&path)
        }),
        ..flat(FillType::SurfaceInterpolated)
    });
    assert_eq!(second.targa.as_deref(), Some(path.as_path()));
    assert_eq!(std::fs::metadata(&path).unwrap().len(), len);
}

#[test]
fn overlay_of_wrong_size_is_refused() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("small.tga");
    let p = Params3d {
        targa: Some(TargaOptions::new(&path)),
        ..flat(FillType::Points)
    };
    let mut s =
        ProjectionSession::new(p, 4, 4, 4, 4, Palette::grey(), Framebuffer::default()).unwrap();
    s.finish().unwrap();

    let p = Params3d {
        targa: Some(TargaOptions {
            overlay: true,
            ..TargaOptions::new(&path)
        }),
        ..flat(FillType::Points)
    };
    let r = ProjectionSession::new(p, 8, 8, 8, 8, Palette::grey(), Framebuffer::default());
    assert!(matches!(r, Err(Line3dError::Targa(_))));
    assert!(path.exists(), "refused overlay leaves the file alone");
}
