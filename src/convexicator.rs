// Copyright 2026 the Fresco Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Single-pass convexity analysis over a path's segment stream.

use crate::geometry::Point;
use crate::path::{Path, Segment};

/// The turn direction between two consecutive edges.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    Left,
    Right,
    /// Colinear continuation, no direction change.
    Straight,
    /// A doubling-back edge or a non-finite cross product.
    Invalid,
}

/// Classifies a path as convex by checking that every edge-to-edge turn
/// shares one direction.
///
/// Curves are judged by their control polygons, which is conservative: a
/// convex control polygon implies a convex curve. The caller is responsible
/// for restricting the test to single-contour paths.
#[derive(Debug, Default)]
pub struct Convexicator {
    expected_direction: Option<Direction>,
    is_convex: bool,
}

impl Convexicator {
    /// The turn taken at `p0` when coming from `prev` and continuing to
    /// `p1`.
    pub fn compute_direction(prev: Point, p0: Point, p1: Point) -> Direction {
        let prev_vec = p0 - prev;
        let current_vec = p1 - p0;
        let cross = prev_vec.cross(current_vec);
        if cross.is_nan() {
            return Direction::Invalid;
        }
        if cross == 0.0 {
            // Colinear; a negative dot means the edge doubles back on
            // itself.
            return if prev_vec.dot(current_vec) < 0.0 {
                Direction::Invalid
            } else {
                Direction::Straight
            };
        }
        if cross < 0.0 {
            Direction::Left
        } else {
            Direction::Right
        }
    }

    /// Walk `path` and report whether all turns agree.
    ///
    /// `last_point` should be the final point of the path so the wrap-around
    /// turn at the contour start is measured against the closing edge.
    pub fn compute_is_convex(&mut self, path: &Path, last_point: Point) -> bool {
        self.is_convex = true;
        self.expected_direction = None;
        let mut last = last_point;
        for segment in path.segments() {
            let keep_going = match *segment {
                Segment::Start { .. } | Segment::Close => true,
                Segment::Linear { from, to } => {
                    let ok = self.add_vector(last, from, to);
                    last = from;
                    ok
                }
                Segment::Quad { from, cp, to } => {
                    let ok = self.add_vector(last, from, cp) && self.add_vector(from, cp, to);
                    last = cp;
                    ok
                }
                Segment::Cubic {
                    from,
                    cp1,
                    cp2,
                    to,
                } => {
                    let ok = self.add_vector(last, from, cp1)
                        && self.add_vector(from, cp1, cp2)
                        && self.add_vector(cp1, cp2, to);
                    last = cp2;
                    ok
                }
            };
            if !keep_going {
                break;
            }
        }
        self.is_convex
    }

    /// The direction latched by the first non-straight turn, if any.
    pub fn expected_direction(&self) -> Option<Direction> {
        self.expected_direction
    }

    fn add_vector(&mut self, prev: Point, p0: Point, p1: Point) -> bool {
        match Self::compute_direction(prev, p0, p1) {
            direction @ (Direction::Left | Direction::Right) => {
                match self.expected_direction {
                    None => {
                        self.expected_direction = Some(direction);
                        true
                    }
                    Some(expected) if expected == direction => true,
                    Some(_) => {
                        self.is_convex = false;
                        self.expected_direction = None;
                        false
                    }
                }
            }
            Direction::Straight => true,
            Direction::Invalid => {
                self.is_convex = false;
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path::PathBuilder;

    fn path_of(points: &[(f32, f32)]) -> Path {
        let mut builder = PathBuilder::new();
        builder.move_to(Point::new(points[0].0, points[0].1));
        for &(x, y) in &points[1..] {
            builder.line_to(Point::new(x, y));
        }
        builder.close();
        builder.take_path()
    }

    #[test]
    fn triangle_is_convex_with_consistent_direction() {
        let path = path_of(&[(0.0, 0.0), (10.0, 0.0), (5.0, 10.0)]);
        let mut convexicator = Convexicator::default();
        assert!(convexicator.compute_is_convex(&path, path.last_point()));
        assert!(convexicator.expected_direction().is_some());
        assert!(path.is_convex());
    }

    #[test]
    fn opposite_winding_is_also_convex() {
        let path = path_of(&[(0.0, 0.0), (5.0, 10.0), (10.0, 0.0)]);
        assert!(path.is_convex());
    }

    #[test]
    fn concave_polygon_is_rejected() {
        // A chevron: the notch at (5, 4) turns the other way.
        let path = path_of(&[(0.0, 0.0), (10.0, 0.0), (10.0, 8.0), (5.0, 4.0), (0.0, 8.0)]);
        assert!(!path.is_convex());
    }

    #[test]
    fn colinear_edges_are_skipped() {
        let path = path_of(&[(0.0, 0.0), (5.0, 0.0), (10.0, 0.0), (5.0, 10.0)]);
        assert!(path.is_convex());
    }

    #[test]
    fn doubling_back_is_invalid() {
        let prev = Point::new(0.0, 0.0);
        let p0 = Point::new(10.0, 0.0);
        let p1 = Point::new(5.0, 0.0);
        assert_eq!(
            Convexicator::compute_direction(prev, p0, p1),
            Direction::Invalid
        );
    }

    #[test]
    fn nan_cross_product_is_invalid() {
        let p = Point::new(f32::NAN, 0.0);
        assert_eq!(
            Convexicator::compute_direction(p, Point::ZERO, Point::new(1.0, 1.0)),
            Direction::Invalid
        );
    }

    #[test]
    fn nan_input_rejects_convexity() {
        let path = path_of(&[(0.0, 0.0), (f32::NAN, 0.0), (5.0, 10.0)]);
        assert!(!path.is_convex());
    }

    #[test]
    fn convex_control_polygon_curve() {
        let mut builder = PathBuilder::new();
        builder.move_to(Point::new(0.0, 0.0));
        builder.quad_to(Point::new(5.0, 8.0), Point::new(10.0, 0.0));
        builder.close();
        let path = builder.take_path();
        assert!(path.is_convex());
    }
}
