//! MTV: `f` surface lines and `p 3` polygons, vertices wound clockwise.

use std::io::{self, Write};

use super::{SceneStats, SceneTriangle, SceneWriter, banner, c_float};

const SURFACE: &[u8] = b"0.95 0.05 5 0 0\n";

pub struct MtvWriter;

impl SceneWriter for MtvWriter {
    fn header(&mut self, out: &mut dyn Write, brief: bool) -> io::Result<()> {
        write!(out, "#{}", banner())?;
        if brief {
            out.write_all(b"f 0.8 0.4 0.1 ")?;
            out.write_all(SURFACE)?;
        }
        out.write_all(b"\n")
    }

    fn triangle(&mut self, out: &mut dyn Write, tri: &SceneTriangle) -> io::Result<()> {
        if let Some(rgb) = tri.rgb {
            out.write_all(b"f")?;
            for c in rgb {
                write!(out, "{} ", c_float(c))?;
            }
            out.write_all(SURFACE)?;
        }
        out.write_all(b"p 3")?;
        for i in 0..3 {
            out.write_all(b"\n ")?;
            for v in &tri.pts[2 - i] {
                write!(out, "{} ", c_float(*v))?;
            }
        }
        out.write_all(b"\n")
    }

    fn end_object(&mut self, out: &mut dyn Write, _had_triangles: bool) -> io::Result<()> {
        out.write_all(b"\n")
    }

    fn footer(&mut self, out: &mut dyn Write, stats: &SceneStats) -> io::Result<()> {
        out.write_all(b"\n\n\n#")?;
        write!(out, "{{ No. Of Triangles = {} }}*/\n\n", stats.triangles)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::testutil::{render, sample_triangle};

    #[test]
    fn brief_header_surface_is_space_separated() {
        let text = render(&mut MtvWriter, |w, out| w.header(out, true));
        assert!(text.starts_with("#{ Created by"));
        assert!(text.ends_with("f 0.8 0.4 0.1 0.95 0.05 5 0 0\n\n"), "{text}");
    }

    #[test]
    fn vertices_are_reversed() {
        let text = render(&mut MtvWriter, |w, out| {
            w.triangle(out, &sample_triangle(Some([0.5, 0.25, 1.0])))
        });
        assert_eq!(
            text,
            "f 0.5000  0.2500  1.0000 0.95 0.05 5 0 0\np 3\n  0.0000  0.2500 -2.0000 \n  0.5000 -1.0000 -1.2500 \n -1.0000 -1.0000 -1.5000 \n"
        );
    }
}
