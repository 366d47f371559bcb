//! AutoCAD DXF: one `3DFACE` entity per triangle on layer `FRACTAL`.

use std::io::{self, Write};

use super::{SceneStats, SceneTriangle, SceneWriter, c_general};

const BEGIN: &str = "  0\nSECTION\n  2\nTABLES\n  0\nTABLE\n  2\nLAYER\n 70\n     2\n  0\nLAYER\n  2\n0\n 70\n     0\n 62\n     7\n  6\nCONTINUOUS\n  0\nLAYER\n  2\nFRACTAL\n 70\n    64\n 62\n     1\n  6\nCONTINUOUS\n  0\nENDTAB\n  0\nENDSEC\n  0\nSECTION\n  2\nENTITIES\n";
const END: &str = "  0\nENDSEC\n  0\nEOF\n";

pub struct DxfWriter;

fn group(out: &mut dyn Write, code: usize, v: f32) -> io::Result<()> {
    write!(out, "{code:3}\n{}\n", c_general(v as f64))
}

impl SceneWriter for DxfWriter {
    fn header(&mut self, out: &mut dyn Write, _brief: bool) -> io::Result<()> {
        out.write_all(BEGIN.as_bytes())
    }

    fn triangle(&mut self, out: &mut dyn Write, tri: &SceneTriangle) -> io::Result<()> {
        write!(out, "  0\n3DFACE\n  8\nFRACTAL\n 62\n{:3}\n", tri.first_color.clamp(1, 255))?;
        for (i, p) in tri.pts.iter().enumerate() {
            for (j, v) in p.iter().enumerate() {
                let code = 10 * (j + 1) + i;
                group(out, code, *v)?;
                // the fourth corner repeats the third
                if i == 2 {
                    group(out, code + 1, *v)?;
                }
            }
        }
        Ok(())
    }

    fn end_object(&mut self, _out: &mut dyn Write, _had_triangles: bool) -> io::Result<()> {
        Ok(())
    }

    fn footer(&mut self, out: &mut dyn Write, _stats: &SceneStats) -> io::Result<()> {
        out.write_all(END.as_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::testutil::{render, sample_triangle};

    #[test]
    fn face_has_four_corners() {
        let text = render(&mut DxfWriter, |w, out| w.triangle(out, &sample_triangle(None)));
        assert!(text.starts_with("  0\n3DFACE\n  8\nFRACTAL\n 62\n255\n"), "{text}");
        assert!(text.contains(" 10\n-1\n 20\n-1\n 30\n-1.5\n"));
        assert!(text.contains(" 12\n0\n 13\n0\n 22\n0.25\n 23\n0.25\n 32\n-2\n 33\n-2\n"));
        assert_eq!(text.matches("\n").count(), 6 + 2 * 12);
    }

    #[test]
    fn file_is_bracketed() {
        let head = render(&mut DxfWriter, |w, out| w.header(out, true));
        assert!(head.starts_with("  0\nSECTION\n  2\nTABLES\n"));
        assert!(head.ends_with("  2\nENTITIES\n"));
        let tail = render(&mut DxfWriter, |w, out| w.footer(out, &SceneStats::default()));
        assert_eq!(tail, "  0\nENDSEC\n  0\nEOF\n");
    }
}
