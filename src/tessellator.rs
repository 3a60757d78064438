// Copyright 2026 the Fresco Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Conversion of paths into triangle meshes.

use crate::geometry::Point;
use crate::path::{Path, Segment};
use crate::wangs_formula;

/// Initial entry count of each internal arena.
const DEFAULT_ARENA_SIZE: usize = 4096 * 16;

/// Consumes [`Path`] objects and produces triangulated meshes for
/// rasterization in a triangle-list layout.
///
/// The tessellator is stateful: one or more `triangulate` /
/// `triangulate_stroke` calls accumulate vertices and indices in internal
/// storage and report the running totals, then the client allocates device
/// buffers of sufficient size and calls [`write`](Self::write) to blit the
/// mesh out. Staging through internal storage means device buffer capacity
/// is known exactly before any device allocation happens.
///
/// Fills are fan-triangulated about the contour centroid, which is only
/// correct for non-self-intersecting contours; the renderer falls back to
/// stencil-then-cover for paths that are not flagged convex.
pub struct Tessellator {
    points: Vec<Point>,
    indices: Vec<u16>,
    vertex_size: usize,
    index_size: usize,
}

impl Default for Tessellator {
    fn default() -> Self {
        Self::new()
    }
}

impl Tessellator {
    pub fn new() -> Self {
        Self {
            points: vec![Point::ZERO; DEFAULT_ARENA_SIZE],
            indices: vec![0; DEFAULT_ARENA_SIZE],
            vertex_size: 0,
            index_size: 0,
        }
    }

    /// Triangulate the fill of `path`, linearizing curves under
    /// `scale_factor`.
    ///
    /// Returns the cumulative vertex and index counts staged since the last
    /// [`write`](Self::write), in that order. Counts are in vertices (not
    /// floats) and indices.
    pub fn triangulate(&mut self, path: &Path, scale_factor: f32) -> (usize, usize) {
        let mut contour_start_index = 0;
        for segment in path.segments() {
            match *segment {
                Segment::Start { p } => {
                    contour_start_index = self.vertex_size;
                    self.push_point(p);
                }
                Segment::Linear { to, .. } => {
                    self.push_point(to);
                }
                Segment::Quad { from, cp, to } => {
                    let divisions =
                        subdivisions(wangs_formula::quadratic_subdivisions(
                            scale_factor,
                            from,
                            cp,
                            to,
                        ));
                    // t = 0 and t = 1 are skipped; those points are the
                    // neighboring endpoints and have already been pushed.
                    for i in 1..divisions {
                        let t = i as f32 / divisions as f32;
                        self.push_point(solve_quad(t, from, cp, to));
                    }
                    self.push_point(to);
                }
                Segment::Cubic {
                    from,
                    cp1,
                    cp2,
                    to,
                } => {
                    let divisions = subdivisions(wangs_formula::cubic_subdivisions(
                        scale_factor,
                        from,
                        cp1,
                        cp2,
                        to,
                    ));
                    for i in 1..divisions {
                        let t = i as f32 / divisions as f32;
                        self.push_point(solve_cubic(t, from, cp1, cp2, to));
                    }
                    self.push_point(to);
                }
                Segment::Close => {
                    self.close_fan(contour_start_index);
                }
            }
        }
        (self.vertex_size, self.index_size)
    }

    /// Triangulate the stroked outline of `path` with the given width.
    ///
    /// Every linearized segment becomes a quad extruded perpendicular to
    /// the segment; widths below one pixel are clamped up. Zero-length
    /// segments produce nothing. Returns cumulative counts like
    /// [`triangulate`](Self::triangulate).
    pub fn triangulate_stroke(
        &mut self,
        path: &Path,
        stroke_width: f32,
        scale_factor: f32,
    ) -> (usize, usize) {
        let half_width = stroke_width.max(1.0) / 2.0;
        let mut contour_start_index = 0;
        for segment in path.segments() {
            match *segment {
                Segment::Start { .. } => {
                    contour_start_index = self.vertex_size;
                }
                Segment::Linear { from, to } => {
                    self.push_stroke_quad(from, to, half_width);
                }
                Segment::Quad { from, cp, to } => {
                    let divisions =
                        subdivisions(wangs_formula::quadratic_subdivisions(
                            scale_factor,
                            from,
                            cp,
                            to,
                        ));
                    let mut prev = from;
                    for i in 1..divisions {
                        let t = i as f32 / divisions as f32;
                        let pt = solve_quad(t, from, cp, to);
                        self.push_stroke_quad(prev, pt, half_width);
                        prev = pt;
                    }
                    self.push_stroke_quad(prev, to, half_width);
                }
                Segment::Cubic {
                    from,
                    cp1,
                    cp2,
                    to,
                } => {
                    let divisions = subdivisions(wangs_formula::cubic_subdivisions(
                        scale_factor,
                        from,
                        cp1,
                        cp2,
                        to,
                    ));
                    let mut prev = from;
                    for i in 1..divisions {
                        let t = i as f32 / divisions as f32;
                        let pt = solve_cubic(t, from, cp1, cp2, to);
                        self.push_stroke_quad(prev, pt, half_width);
                        prev = pt;
                    }
                    self.push_stroke_quad(prev, to, half_width);
                }
                Segment::Close => {
                    self.close_stroke(contour_start_index);
                }
            }
        }
        (self.vertex_size, self.index_size)
    }

    /// Blit the staged mesh into the provided destinations and reset the
    /// staged sizes.
    ///
    /// `None` for either destination discards that half of the mesh; the
    /// sizes reset regardless. Destinations must be at least
    /// `vertex_count * 8` and `index_count * 2` bytes and 4- respectively
    /// 2-byte aligned.
    pub fn write(&mut self, vertices: Option<&mut [u8]>, indices: Option<&mut [u8]>) {
        if let Some(dst) = vertices {
            let dst: &mut [Point] = bytemuck::cast_slice_mut(dst);
            dst[..self.vertex_size].copy_from_slice(&self.points[..self.vertex_size]);
        }
        if let Some(dst) = indices {
            let dst: &mut [u16] = bytemuck::cast_slice_mut(dst);
            dst[..self.index_size].copy_from_slice(&self.indices[..self.index_size]);
        }
        self.vertex_size = 0;
        self.index_size = 0;
    }

    /// Entry capacity of the vertex arena. Grows, never shrinks.
    pub fn vertex_capacity(&self) -> usize {
        self.points.len()
    }

    /// Entry capacity of the index arena. Grows, never shrinks.
    pub fn index_capacity(&self) -> usize {
        self.indices.len()
    }

    fn push_point(&mut self, p: Point) {
        self.ensure_point_storage(1);
        self.points[self.vertex_size] = p;
        self.vertex_size += 1;
    }

    /// Close a fill contour: push the centroid and fan the contour's
    /// vertices around it.
    fn close_fan(&mut self, contour_start_index: usize) {
        let count = self.vertex_size - contour_start_index;
        if count < 2 {
            return;
        }
        self.ensure_index_storage((count - 1) * 3);

        // Centroid weighted on vertices only.
        let n = count as f32;
        let mut cx = 0.0;
        let mut cy = 0.0;
        for p in &self.points[contour_start_index..self.vertex_size] {
            cx += p.x / n;
            cy += p.y / n;
        }
        self.push_point(Point::new(cx, cy));

        // Any vertex could anchor the fan, but the centroid tends to
        // produce fewer skinny triangles, which measures slightly faster to
        // rasterize.
        let centroid = (self.vertex_size - 1) as u16;
        for i in contour_start_index + 1..self.vertex_size - 1 {
            self.indices[self.index_size] = centroid;
            self.indices[self.index_size + 1] = (i - 1) as u16;
            self.indices[self.index_size + 2] = i as u16;
            self.index_size += 3;
        }
    }

    /// Extrude the perpendicular of `from -> to` by the half width and push
    /// the resulting quad corners.
    fn push_stroke_quad(&mut self, from: Point, to: Point, half_width: f32) {
        let v = to - from;
        let magnitude = v.length();
        if magnitude == 0.0 {
            return;
        }
        let normal = Point::new(v.y / magnitude, -v.x / magnitude);
        let offset = normal * half_width;
        self.ensure_point_storage(4);
        self.points[self.vertex_size] = from + offset;
        self.points[self.vertex_size + 1] = from - offset;
        self.points[self.vertex_size + 2] = to + offset;
        self.points[self.vertex_size + 3] = to - offset;
        self.vertex_size += 4;
    }

    /// Close a stroke contour: two triangles per staged quad.
    fn close_stroke(&mut self, contour_start_index: usize) {
        let quads = (self.vertex_size - contour_start_index) / 4;
        self.ensure_index_storage(quads * 6);
        for quad in 0..quads {
            let a = (contour_start_index + quad * 4) as u16;
            let indices = &mut self.indices[self.index_size..self.index_size + 6];
            indices[0] = a;
            indices[1] = a + 1;
            indices[2] = a + 2;
            indices[3] = a + 1;
            indices[4] = a + 2;
            indices[5] = a + 3;
            self.index_size += 6;
        }
    }

    fn ensure_point_storage(&mut self, n: usize) {
        let required = self.vertex_size + n;
        if required > self.points.len() {
            let capacity = required.next_power_of_two();
            log::trace!("growing vertex arena to {capacity} entries");
            self.points.resize(capacity, Point::ZERO);
        }
    }

    fn ensure_index_storage(&mut self, n: usize) {
        let required = self.index_size + n;
        if required > self.indices.len() {
            let capacity = required.next_power_of_two();
            log::trace!("growing index arena to {capacity} entries");
            self.indices.resize(capacity, 0);
        }
    }
}

/// Clamped integer subdivision count from a raw Wang's bound.
fn subdivisions(raw: f32) -> usize {
    raw.ceil().max(1.0) as usize
}

/// `(1 - t)^2 * P0 + 2t(1 - t) * CP + t^2 * P1`
fn solve_quad(t: f32, p0: Point, cp: Point, p1: Point) -> Point {
    p0 * (1.0 - t).powi(2) + cp * (2.0 * t) * (1.0 - t) + p1 * t.powi(2)
}

/// `(1 - t)^3 * P0 + 3t(1 - t)^2 * CP1 + 3(1 - t)t^2 * CP2 + t^3 * P1`
fn solve_cubic(t: f32, p0: Point, cp1: Point, cp2: Point, p1: Point) -> Point {
    p0 * (1.0 - t).powi(3)
        + cp1 * 3.0 * t * (1.0 - t).powi(2)
        + cp2 * 3.0 * (1.0 - t) * t.powi(2)
        + p1 * t.powi(3)
}
