//! DKB/POV-Ray 1.x: each row is a `COMPOSITE` of `TRIANGLE` objects with a
//! six-plane bounding intersection.

use std::io::{self, Write};

use super::{SceneStats, SceneTriangle, SceneWriter, banner, c_float, c_float_prec};

const MINUS_ONE: &str = "-1.0 ";
const ONE: &str = " 1.0 ";
const ZERO: &str = " 0.0 ";

/// Bounding box of the triangles in the current row.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PovWriter {
    min: [f32; 3],
    max: [f32; 3],
}

impl Default for PovWriter {
    fn default() -> Self {
        Self {
            min: [999_999.0; 3],
            max: [-999_999.0; 3],
        }
    }
}

impl PovWriter {
    fn grow(&mut self, tri: &SceneTriangle) {
        for p in &tri.pts {
            for j in 0..3 {
                self.min[j] = self.min[j].min(p[j]);
                self.max[j] = self.max[j].max(p[j]);
            }
        }
    }

    /// Inflate the box by 1% (or 0.01 when flat) so it strictly contains
    /// the row.
    fn inflated(&self) -> ([f32; 3], [f32; 3]) {
        let (mut min, mut max) = (self.min, self.max);
        for i in 0..3 {
            if min[i] == max[i] {
                min[i] -= 0.01;
                max[i] += 0.01;
            } else {
                min[i] -= (max[i] - min[i]) * 0.01;
                max[i] += (max[i] - min[i]) * 0.01;
            }
        }
        (min, max)
    }
}

fn plane(out: &mut dyn Write, normal: [&str; 3], dist: f32) -> io::Result<()> {
    writeln!(
        out,
        "   PLANE <{}{}{}> {} END_PLANE",
        normal[0],
        normal[1],
        normal[2],
        c_float_prec(dist, 3)
    )
}

impl SceneWriter for PovWriter {
    fn header(&mut self, out: &mut dyn Write, _brief: bool) -> io::Result<()> {
        out.write_all(banner().as_bytes())?;
        out.write_all(b"DECLARE       F_Dflt = COLOR  RED 0.8 GREEN 0.4 BLUE 0.1\n")?;
        out.write_all(b"\n")
    }

    fn start_object(&mut self, out: &mut dyn Write) -> io::Result<()> {
        *self = Self::default();
        out.write_all(b"COMPOSITE\n")
    }

    fn triangle(&mut self, out: &mut dyn Write, tri: &SceneTriangle) -> io::Result<()> {
        out.write_all(b" OBJECT\n  TRIANGLE ")?;
        for p in &tri.pts {
            write!(out, "\n      <")?;
            for v in p {
                write!(out, "{} ", c_float(*v))?;
            }
            write!(out, ">")?;
        }
        out.write_all(b" END_TRIANGLE \n")?;
        if let Some([r, g, b]) = tri.rgb {
            write!(
                out,
                "  TEXTURE\n      COLOR  RED{} GREEN{} BLUE{}\n      AMBIENT 0.25 DIFFUSE 0.75 END_TEXTURE\n",
                c_float(r),
                c_float(g),
                c_float(b)
            )?;
        }
        out.write_all(b"  COLOR  F_Dflt  END_OBJECT")?;
        self.grow(tri);
        out.write_all(b"\n")
    }

    fn end_object(&mut self, out: &mut dyn Write, had_triangles: bool) -> io::Result<()> {
        if had_triangles {
            let (min, max) = self.inflated();
            out.write_all(b" BOUNDED_BY\n  INTERSECTION\n")?;
            plane(out, [MINUS_ONE, ZERO, ZERO], -min[0])?;
            plane(out, [ONE, ZERO, ZERO], max[0])?;
            plane(out, [ZERO, MINUS_ONE, ZERO], -min[1])?;
            plane(out, [ZERO, ONE, ZERO], max[1])?;
            plane(out, [ZERO, ZERO, MINUS_ONE], -min[2])?;
            plane(out, [ZERO, ZERO, ONE], max[2])?;
            out.write_all(b"  END_INTERSECTION\n END_BOUND\n")?;
        }
        out.write_all(b"END_COMPOSITE\n")?;
        out.write_all(b"\n")
    }

    fn footer(&mut self, out: &mut dyn Write, stats: &SceneStats) -> io::Result<()> {
        out.write_all(b"\n")?;
        write!(out, "{{ No. Of Triangles = {} }}*/\n\n", stats.triangles)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::testutil::{render, sample_triangle};

    #[test]
    fn header_declares_default_colour() {
        let text = render(&mut PovWriter::default(), |w, out| w.header(out, false));
        assert!(text.starts_with("{ Created by LINE3D_RS Ver. "));
        assert!(text.ends_with("}\n\nDECLARE       F_Dflt = COLOR  RED 0.8 GREEN 0.4 BLUE 0.1\n\n"));
    }

    #[test]
    fn triangle_with_texture() {
        let mut w = PovWriter::default();
        let text = render(&mut w, |w, out| {
            w.start_object(out)?;
            w.triangle(out, &sample_triangle(Some([0.5, 0.25, 1.0])))
        });
        assert_eq!(
            text,
            "COMPOSITE\n OBJECT\n  TRIANGLE \n      <-1.0000 -1.0000 -1.5000 >\n      < 0.5000 -1.0000 -1.2500 >\n      < 0.0000  0.2500 -2.0000 > END_TRIANGLE \n  TEXTURE\n      COLOR  RED 0.5000 GREEN 0.2500 BLUE 1.0000\n      AMBIENT 0.25 DIFFUSE 0.75 END_TEXTURE\n  COLOR  F_Dflt  END_OBJECT\n"
        );
    }

    #[test]
    fn bounding_planes_enclose_the_row() {
        let mut w = PovWriter::default();
        let text = render(&mut w, |w, out| {
            w.start_object(out)?;
            w.triangle(out, &sample_triangle(None))?;
            w.end_object(out, true)
        });
        assert!(text.contains(" BOUNDED_BY\n  INTERSECTION\n"));
        // x spans -1..0.5: min -1.015, max 0.51515
        assert!(text.contains("   PLANE <-1.0  0.0  0.0 >  1.015 END_PLANE\n"), "{text}");
        assert!(text.contains("   PLANE < 1.0  0.0  0.0 >  0.515 END_PLANE\n"), "{text}");
        assert!(text.ends_with("  END_INTERSECTION\n END_BOUND\nEND_COMPOSITE\n\n"));

        let empty = render(&mut w, |w, out| w.end_object(out, false));
        assert_eq!(empty, "END_COMPOSITE\n\n");
    }
}
