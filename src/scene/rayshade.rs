//! Rayshade 4: a `grid` aggregate of triangles, vertices wound clockwise.

use std::io::{self, Write};

use super::{SceneStats, SceneTriangle, SceneWriter, banner, c_float};

const VIEW: &str = "screen 640 480\neyep 0 2.1 0.8\nlookp 0 0 -0.95\nlight 1 point -2 1 1.5\n\
background .3 0 0\nreport verbose\n";

pub struct RayshadeWriter;

impl SceneWriter for RayshadeWriter {
    fn header(&mut self, out: &mut dyn Write, brief: bool) -> io::Result<()> {
        write!(out, "/*\n{}*/\n", banner())?;
        if brief {
            out.write_all(b"applysurf diffuse 0.8 0.4 0.1")?;
        }
        out.write_all(b"\n")?;
        out.write_all(b"/* make a gridded aggregate. this size grid is fast for landscapes. */\n")?;
        out.write_all(b"/* make z grid = 1 always for landscapes. */\n\n")?;
        out.write_all(b"grid 33 25 1\n")
    }

    fn triangle(&mut self, out: &mut dyn Write, tri: &SceneTriangle) -> io::Result<()> {
        if let Some(rgb) = tri.rgb {
            out.write_all(b"applysurf diffuse ")?;
            for c in rgb {
                write!(out, "{} ", c_float(c))?;
            }
            out.write_all(b"\n")?;
        }
        out.write_all(b"triangle")?;
        for i in 0..3 {
            out.write_all(b"\n ")?;
            for v in &tri.pts[2 - i] {
                write!(out, "{} ", c_float(*v))?;
            }
        }
        out.write_all(b"\n")
    }

    fn end_object(&mut self, _out: &mut dyn Write, _had_triangles: bool) -> io::Result<()> {
        Ok(())
    }

    fn footer(&mut self, out: &mut dyn Write, stats: &SceneStats) -> io::Result<()> {
        write!(out, "end\n\n/*good landscape:*/\n{VIEW}\n/*")?;
        write!(out, "{{ No. Of Triangles = {} }}*/\n\n", stats.triangles)
    }
}
