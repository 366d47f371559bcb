//! Vivid: one `polygon` per triangle, optionally preceded by its surface.

use std::io::{self, Write};

use super::{SceneStats, SceneTriangle, SceneWriter, banner, c_float};

pub struct VividWriter;

impl SceneWriter for VividWriter {
    fn header(&mut self, out: &mut dyn Write, brief: bool) -> io::Result<()> {
        write!(out, "//{}", banner())?;
        if brief {
            out.write_all(b"surf={diff=0.8 0.4 0.1;}\n")?;
        }
        out.write_all(b"\n")
    }

    fn triangle(&mut self, out: &mut dyn Write, tri: &SceneTriangle) -> io::Result<()> {
        if let Some(rgb) = tri.rgb {
            out.write_all(b"surf={diff=")?;
            for c in rgb {
                write!(out, "{} ", c_float(c))?;
            }
            out.write_all(b";}\n")?;
        }
        out.write_all(b"polygon={points=3;")?;
        for p in &tri.pts {
            out.write_all(b"\n vertex =  ")?;
            for v in p {
                write!(out, "{} ", c_float(*v))?;
            }
            out.write_all(b";")?;
        }
        out.write_all(b"}\n")
    }

    fn end_object(&mut self, out: &mut dyn Write, _had_triangles: bool) -> io::Result<()> {
        out.write_all(b"\n")
    }

    fn footer(&mut self, out: &mut dyn Write, stats: &SceneStats) -> io::Result<()> {
        out.write_all(b"\n\n\n//")?;
        write!(out, "{{ No. Of Triangles = {} }}*/\n\n", stats.triangles)
    }
}
