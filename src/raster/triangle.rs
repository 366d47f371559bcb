//! Triangle filling on top of the line walker.
//!
//! Two passes per triangle:
//! 1. the three edges are walked into a [`MinMaxTable`] (no pixel written);
//! 2. every touched row is filled from its recorded min x to max x through
//!    the caller's sink.

use super::{PixelSink, Point, draw_line};
use crate::math::BAD_CHECK;

/// A triangle whose vertices score more than this in [`offscreen`] is
/// dropped.
pub const MAX_OFFSCREEN: i32 = 2;

/// 0 on screen, 1 moderately off, 99 hopelessly off (or a bad point).
pub fn offscreen(p: &Point, width: i32, height: i32) -> i32 {
    if (0..width).contains(&p.x) && (0..height).contains(&p.y) {
        return 0;
    }
    if p.x.abs() > -BAD_CHECK || p.y.abs() > -BAD_CHECK {
        return 99;
    }
    1
}

/// Per-row horizontal extent of the triangle being filled.
#[derive(Clone, Debug, Default)]
pub struct MinMaxTable {
    rows: Vec<(i32, i32)>,
}

impl MinMaxTable {
    pub fn new(height: usize) -> Self {
        Self {
            rows: vec![(i32::MAX, i32::MIN); height],
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    fn reset(&mut self, y0: i32, y1: i32) {
        for y in y0..=y1 {
            self.rows[y as usize] = (i32::MAX, i32::MIN);
        }
    }

    #[inline]
    pub fn span(&self, y: usize) -> (i32, i32) {
        self.rows[y]
    }
}

/// Record-only sink used for the edge pass.
struct RecordMinMax<'a>(&'a mut MinMaxTable);

impl PixelSink for RecordMinMax<'_> {
    #[inline]
    fn plot(&mut self, x: i32, y: i32, _color: i32) {
        if y >= 0 && (y as usize) < self.0.rows.len() {
            let row = &mut self.0.rows[y as usize];
            row.0 = row.0.min(x);
            row.1 = row.1.max(x);
        }
    }
}

pub struct TriangleFiller {
    table: MinMaxTable,
    width: i32,
    height: i32,
}

impl TriangleFiller {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            table: MinMaxTable::new(height),
            width: width as i32,
            height: height as i32,
        }
    }

    /// Fill `tri` with `color` through `sink`.
    ///
    /// Returns `false` when the triangle was rejected as off screen.
    /// Coincident vertices degrade to a single point or segment.
    pub fn fill<S: PixelSink + ?Sized>(&mut self, tri: [Point; 3], color: i32, sink: &mut S) -> bool {
        let [p1, p2, p3] = tri;
        let score: i32 = tri.iter().map(|p| offscreen(p, self.width, self.height)).sum();
        if score > MAX_OFFSCREEN {
            return false;
        }

        if p1.same_xy(&p2) {
            if p1.same_xy(&p3) {
                sink.plot(p1.x, p1.y, color);
            } else {
                draw_line(sink, p1.x, p1.y, p3.x, p3.y, color);
            }
            return true;
        }
        if p3.same_xy(&p1) || p3.same_xy(&p2) {
            draw_line(sink, p1.x, p1.y, p2.x, p2.y, color);
            return true;
        }

        let min_y = p1.y.min(p2.y).min(p3.y).max(0);
        let max_y = p1.y.max(p2.y).max(p3.y).min(self.height - 1);
        if min_y > max_y {
            return true;
        }
        self.table.reset(min_y, max_y);

        {
            let mut rec = RecordMinMax(&mut self.table);
            draw_line(&mut rec, p1.x, p1.y, p2.x, p2.y, 0);
            draw_line(&mut rec, p2.x, p2.y, p3.x, p3.y, 0);
            draw_line(&mut rec, p3.x, p3.y, p1.x, p1.y, 0);
        }

        for y in min_y..=max_y {
            let (lo, hi) = self.table.span(y as usize);
            for x in lo..=hi {
                sink.plot(x, y, color);
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn fill_set(filler: &mut TriangleFiller, tri: [Point; 3]) -> (bool, HashSet<(i32, i32)>) {
        let mut hit = HashSet::new();
        let drawn = filler.fill(tri, 7, &mut |x, y, c| {
            assert_eq!(c, 7);
            hit.insert((x, y));
        });
        (drawn, hit)
    }

    /*------------------------------------------------------------------*/
    /* 1. Coverage                                                      */
    /*------------------------------------------------------------------*/
    #[test]
    fn right_triangle_covers_digital_half_square() {
        let mut f = TriangleFiller::new(32, 32);
        let tri = [Point::new(0, 0, 7), Point::new(10, 0, 7), Point::new(0, 10, 7)];
        let (drawn, hit) = fill_set(&mut f, tri);
        assert!(drawn);
        for y in -2..14 {
            for x in -2..14 {
                let inside = x >= 0 && y >= 0 && x + y <= 10;
                assert_eq!(hit.contains(&(x, y)), inside, "pixel ({x},{y})");
            }
        }
    }

    #[test]
    fn rows_are_clamped_to_frame() {
        let mut f = TriangleFiller::new(16, 8);
        let tri = [Point::new(2, -3, 1), Point::new(12, 4, 1), Point::new(3, 12, 1)];
        let (drawn, hit) = fill_set(&mut f, tri);
        assert!(drawn);
        assert!(hit.iter().all(|&(_, y)| (0..8).contains(&y)));
    }

    /*------------------------------------------------------------------*/
    /* 2. Rejection and degenerate cases                                */
    /*------------------------------------------------------------------*/
    #[test]
    fn sentinel_vertices_produce_nothing() {
        let mut f = TriangleFiller::new(32, 32);
        let tri = [Point::BAD, Point::new(3, 3, 1), Point::new(4, 9, 1)];
        let (drawn, hit) = fill_set(&mut f, tri);
        assert!(!drawn);
        assert!(hit.is_empty());
    }

    #[test]
    fn two_vertices_moderately_off_screen_still_draw() {
        let mut f = TriangleFiller::new(32, 32);
        let tri = [Point::new(-5, 3, 1), Point::new(40, 3, 1), Point::new(10, 20, 1)];
        assert_eq!(offscreen(&tri[0], 32, 32) + offscreen(&tri[1], 32, 32), 2);
        let (drawn, hit) = fill_set(&mut f, tri);
        assert!(drawn);
        assert!(!hit.is_empty());
    }

    #[test]
    fn collapsed_triangles_become_points_and_lines() {
        let mut f = TriangleFiller::new(32, 32);
        let p = Point::new(4, 4, 1);
        let (_, hit) = fill_set(&mut f, [p, p, p]);
        assert_eq!(hit.len(), 1);

        let q = Point::new(9, 4, 1);
        let (_, hit) = fill_set(&mut f, [p, q, q]);
        assert_eq!(hit.len(), 6, "segment 4..=9 on row 4");
        assert!(hit.iter().all(|&(_, y)| y == 4));
    }
}
