// Copyright 2026 the Fresco Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Wang's formula: subdivision counts for flattening bezier curves.
//!
//! Wang's formula gives the minimum number of evenly spaced (in the
//! parametric sense) line segments that a bezier curve must be chopped into
//! in order to guarantee all lines stay within a distance of `1/precision`
//! pixels from the true curve. Its definition for a bezier curve of degree
//! `n` is:
//!
//! ```text
//! maxLength = max([length(p[i+2] - 2p[i+1] + p[i]) for (0 <= i <= n-2)])
//! numParametricSegments = sqrt(maxLength * precision * n*(n - 1)/8)
//! ```
//!
//! (Goldman, Ron. (2003). 5.6.3 Wang's Formula. "Pyramid Algorithms: A
//! Dynamic Programming Approach to Curves and Surfaces for Geometric
//! Modeling". Morgan Kaufmann Publishers.)
//!
//! All functions return the pre-ceiling value; callers apply `ceil` and
//! clamp to at least one segment. The `scale_factor` argument should be the
//! max xy basis length of the transform the curve will be rendered under
//! (see [`Matrix::basis_length_max`](crate::Matrix::basis_length_max)).

use crate::geometry::Point;

// Don't allow linearized segments to be off by more than 1/4th of a pixel
// from the true curve. This value is scaled by the max basis of the X and Y
// directions of the active transform.
const PRECISION: f32 = 4.0;

/// Subdivision count for a quadratic bezier.
pub fn quadratic_subdivisions(scale_factor: f32, p0: Point, cp: Point, p1: Point) -> f32 {
    let k = scale_factor * 0.25 * PRECISION;
    (k * (p0 - cp * 2.0 + p1).length()).sqrt()
}

/// Subdivision count for a cubic bezier.
pub fn cubic_subdivisions(
    scale_factor: f32,
    p0: Point,
    p1: Point,
    p2: Point,
    p3: Point,
) -> f32 {
    let k = scale_factor * 0.75 * PRECISION;
    let a = (p0 - p1 * 2.0 + p2).abs();
    let b = (p1 - p2 * 2.0 + p3).abs();
    (k * a.max(b).length()).sqrt()
}

/// Subdivision count for a conic section with weight `w`.
///
/// This is not actually due to Wang, but is an analogue from (Theorem 3,
/// corollary 1): J. Zheng, T. Sederberg. "Estimating Tessellation Parameter
/// Intervals for Rational Curves and Surfaces." ACM Transactions on
/// Graphics 19(1). 2000.
pub fn conic_subdivisions(scale_factor: f32, p0: Point, p1: Point, p2: Point, w: f32) -> f32 {
    // Center of the bounding box in projected space; translating by it
    // improves the translation-invariance of the formula (sec. 3.3 of the
    // cited paper).
    let center = (p0.min(p1).min(p2) + p0.max(p1).max(p2)) * 0.5;
    let p0 = p0 - center;
    let p1 = p1 - center;
    let p2 = p2 - center;

    let max_len = p0.dot(p0).max(p1.dot(p1)).max(p2.dot(p2)).sqrt();

    // Forward differences.
    let dp = p1 * (-2.0 * w) + p0 + p2;
    let dw = (-2.0 * w + 2.0).abs();

    // Numerator and denominator for the parametric step size of the
    // linearization, with epsilon = 1/precision. Assumes the parametric
    // interval of the curve being linearized is [0, 1].
    let k = scale_factor * PRECISION;
    let rp_minus_1 = (max_len * k - 1.0).max(0.0);
    let numer = dp.dot(dp).sqrt() * k + rp_minus_1 * dw;
    let denom = 4.0 * w.min(1.0);

    (numer / denom).sqrt()
}
