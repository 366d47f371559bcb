//! Raw triangle lists: nine numbers per line, colour first unless brief.

use std::io::{self, Write};

use super::{SceneStats, SceneTriangle, SceneWriter, banner, c_float};

pub struct RawWriter;

impl SceneWriter for RawWriter {
    fn header(&mut self, out: &mut dyn Write, _brief: bool) -> io::Result<()> {
        out.write_all(banner().as_bytes())?;
        out.write_all(b"\n")
    }

    fn triangle(&mut self, out: &mut dyn Write, tri: &SceneTriangle) -> io::Result<()> {
        if let Some(rgb) = tri.rgb {
            for c in rgb {
                write!(out, "{} ", c_float(c))?;
            }
        }
        for p in &tri.pts {
            out.write_all(b"\n")?;
            for v in p {
                write!(out, "{} ", c_float(*v))?;
            }
        }
        if tri.rgb.is_some() {
            out.write_all(b"\n")?;
        }
        out.write_all(b"\n")
    }

    fn end_object(&mut self, out: &mut dyn Write, _had_triangles: bool) -> io::Result<()> {
        out.write_all(b"\n")
    }

    fn footer(&mut self, out: &mut dyn Write, stats: &SceneStats) -> io::Result<()> {
        out.write_all(b"\n")?;
        write!(out, "{{ No. Of Triangles = {} }}*/\n\n", stats.triangles)
    }
}
