// Copyright 2026 the Fresco Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Paths as typed segment streams, and the builder that produces them.

use crate::convexicator::Convexicator;
use crate::geometry::{Point, Rect};

/// Discriminant for one segment in a path stream.
///
/// The packed wire encoding of a segment is its tag slot plus its points;
/// [`Self::point_count`] gives the combined size in points for consumers
/// that serialize the stream.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SegmentType {
    Start,
    Linear,
    Quad,
    Cubic,
    Close,
}

impl SegmentType {
    /// Number of points a packed encoding spends on this segment, tag slot
    /// included.
    pub const fn point_count(self) -> usize {
        match self {
            Self::Start => 2,
            Self::Linear => 3,
            Self::Quad => 4,
            Self::Cubic => 5,
            Self::Close => 1,
        }
    }
}

/// One segment of a path.
///
/// Every non-initial segment repeats the previous endpoint as `from`, so a
/// segment can be interpreted without walking its predecessors.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Segment {
    Start {
        p: Point,
    },
    Linear {
        from: Point,
        to: Point,
    },
    Quad {
        from: Point,
        cp: Point,
        to: Point,
    },
    Cubic {
        from: Point,
        cp1: Point,
        cp2: Point,
        to: Point,
    },
    Close,
}

impl Segment {
    pub fn segment_type(&self) -> SegmentType {
        match self {
            Self::Start { .. } => SegmentType::Start,
            Self::Linear { .. } => SegmentType::Linear,
            Self::Quad { .. } => SegmentType::Quad,
            Self::Cubic { .. } => SegmentType::Cubic,
            Self::Close => SegmentType::Close,
        }
    }
}

/// An immutable collection of zero or more contours of linear, quadratic
/// and cubic bezier segments.
///
/// Produced by [`PathBuilder::take_path`]; carries its precomputed bounds
/// and convexity so consumers never re-derive them.
#[derive(Clone, Debug)]
pub struct Path {
    segments: Vec<Segment>,
    bounds: Rect,
    last_point: Point,
    is_convex: bool,
}

static_assertions::assert_impl_all!(Path: Send, Sync);

impl Path {
    /// The segment stream.
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// The bounding box accumulated over every point issued to the builder.
    ///
    /// Control points are included, so this is conservative for curves.
    pub fn bounds(&self) -> Rect {
        self.bounds
    }

    /// The final point of the path.
    pub fn last_point(&self) -> Point {
        self.last_point
    }

    /// Whether the path is a single contour with a consistent turn
    /// direction. See [`Convexicator`] for the exact test.
    pub fn is_convex(&self) -> bool {
        self.is_convex
    }

    /// A path with fewer than two segments has no drawable geometry.
    pub fn is_empty(&self) -> bool {
        self.segments.len() < 2
    }
}

/// Accumulates segments and freezes them into a [`Path`].
#[derive(Debug, Default)]
pub struct PathBuilder {
    segments: Vec<Segment>,
    bounds: BoundsAccumulator,
    contour_length: usize,
    contour_count: usize,
    current: Point,
    contour_begin: Point,
}

impl PathBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Begin a new contour at `p`.
    ///
    /// Moving to the current point is a no-op; moving away from an open
    /// contour closes it first.
    pub fn move_to(&mut self, p: Point) {
        if p == self.current {
            return;
        }
        if self.contour_length > 0 {
            self.close();
        }
        self.current = p;
    }

    pub fn line_to(&mut self, p: Point) {
        if self.contour_length == 0 {
            self.start();
        }
        self.bounds.add(p);
        self.segments.push(Segment::Linear {
            from: self.current,
            to: p,
        });
        self.current = p;
        self.contour_length += 1;
    }

    pub fn quad_to(&mut self, cp: Point, p: Point) {
        if self.contour_length == 0 {
            self.start();
        }
        self.bounds.add(cp);
        self.bounds.add(p);
        self.segments.push(Segment::Quad {
            from: self.current,
            cp,
            to: p,
        });
        self.current = p;
        self.contour_length += 1;
    }

    pub fn cubic_to(&mut self, cp1: Point, cp2: Point, p: Point) {
        if self.contour_length == 0 {
            self.start();
        }
        self.bounds.add(cp1);
        self.bounds.add(cp2);
        self.bounds.add(p);
        self.segments.push(Segment::Cubic {
            from: self.current,
            cp1,
            cp2,
            to: p,
        });
        self.current = p;
        self.contour_length += 1;
    }

    /// A horizontal line to `(x, current.y)`.
    pub fn horizontal_to(&mut self, x: f32) {
        self.line_to(Point::new(x, self.current.y));
    }

    /// A vertical line to `(current.x, y)`.
    pub fn vertical_to(&mut self, y: f32) {
        self.line_to(Point::new(self.current.x, y));
    }

    /// Close the current contour.
    ///
    /// Emits a linear edge back to the contour origin when the current
    /// point differs from it. Closing a zero-length contour is a no-op.
    pub fn close(&mut self) {
        if self.contour_length == 0 {
            return;
        }
        if self.contour_begin != self.current {
            self.line_to(self.contour_begin);
        }
        self.segments.push(Segment::Close);
        self.contour_length = 0;
        self.contour_count += 1;
    }

    /// Add a rectangular shape in a new closed contour.
    ///
    /// Any open contour is closed by this operation. The winding for the
    /// rectangle is fixed in clockwise ordering.
    pub fn add_rect(&mut self, rect: &Rect) {
        self.close();
        self.move_to(Point::new(rect.l, rect.t));
        self.line_to(Point::new(rect.r, rect.t));
        self.line_to(Point::new(rect.r, rect.b));
        self.line_to(Point::new(rect.l, rect.b));
        self.close();
    }

    /// Freeze the accumulated segments into a [`Path`] and reset the
    /// builder.
    pub fn take_path(&mut self) -> Path {
        // Only single contour paths are allowed to be convex. Separate
        // convex contours overlapping with different winding orders can
        // still require stenciling, and ruling that out is quadratic in the
        // segment count.
        let single_contour = self.contour_count <= 1;
        let mut path = Path {
            segments: std::mem::take(&mut self.segments),
            bounds: self.bounds.rect(),
            last_point: self.current,
            is_convex: false,
        };
        path.is_convex =
            single_contour && Convexicator::default().compute_is_convex(&path, path.last_point);
        self.bounds = BoundsAccumulator::default();
        self.contour_length = 0;
        self.contour_count = 0;
        self.current = Point::ZERO;
        self.contour_begin = Point::ZERO;
        path
    }

    fn start(&mut self) {
        self.segments.push(Segment::Start { p: self.current });
        self.bounds.add(self.current);
        self.contour_begin = self.current;
    }
}

/// Running min/max over every point the builder sees.
#[derive(Debug)]
struct BoundsAccumulator {
    l: f32,
    t: f32,
    r: f32,
    b: f32,
}

impl Default for BoundsAccumulator {
    fn default() -> Self {
        Self {
            l: f32::INFINITY,
            t: f32::INFINITY,
            r: f32::NEG_INFINITY,
            b: f32::NEG_INFINITY,
        }
    }
}

impl BoundsAccumulator {
    fn add(&mut self, p: Point) {
        self.l = self.l.min(p.x);
        self.t = self.t.min(p.y);
        self.r = self.r.max(p.x);
        self.b = self.b.max(p.y);
    }

    fn rect(&self) -> Rect {
        Rect::from_ltrb(self.l, self.t, self.r, self.b)
    }
}
