//! Acrospin: a named vertex list followed by the grid's edge list.

use std::io::{self, Write};

use super::{SceneStats, SceneTriangle, SceneWriter, banner, c_float};

pub struct AcrospinWriter;

fn edge(out: &mut dyn Write, a: (u32, u32), b: (u32, u32)) -> io::Result<()> {
    writeln!(out, "R{}C{} R{}C{}", a.0, a.1, b.0, b.1)
}

impl SceneWriter for AcrospinWriter {
    fn header(&mut self, out: &mut dyn Write, _brief: bool) -> io::Result<()> {
        write!(out, "--{}", banner())?;
        out.write_all(b"\n")?;
        out.write_all(b"Set Layer 1\nSet Color 2\nEndpointList X Y Z Name\n")
    }

    fn triangle(&mut self, _out: &mut dyn Write, _tri: &SceneTriangle) -> io::Result<()> {
        Ok(())
    }

    fn vertex(&mut self, out: &mut dyn Write, p: [f32; 3], row: u32, col: u32) -> io::Result<()> {
        writeln!(
            out,
            "{} {} {} R{row}C{col}",
            c_float(p[0]),
            c_float(p[1]),
            c_float(p[2])
        )
    }

    fn end_object(&mut self, _out: &mut dyn Write, _had_triangles: bool) -> io::Result<()> {
        Ok(())
    }

    fn footer(&mut self, out: &mut dyn Write, stats: &SceneStats) -> io::Result<()> {
        out.write_all(b"\n")?;
        out.write_all(b"LineList From To\n")?;
        let (rows, max_col) = (stats.rows, stats.max_col);
        for i in 0..rows {
            for j in 0..=max_col {
                if j < max_col {
                    edge(out, (i, j), (i, j + 1))?;
                }
                if i + 1 < rows {
                    edge(out, (i, j), (i + 1, j))?;
                }
                if i > 0 && j < max_col {
                    edge(out, (i, j), (i - 1, j + 1))?;
                }
            }
        }
        out.write_all(b"\n\n--")?;
        write!(out, "{{ No. Of Triangles = {} }}*/\n\n", stats.triangles)
    }

    fn wants_triangles(&self) -> bool {
        false
    }
}
