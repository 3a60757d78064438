// Copyright 2026 the Fresco Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Paint sources, layer filters and clip styles.

use crate::geometry::{Color, Point};

/// A gradient color source.
///
/// The texture index refers to a 1xN color-stop texture registered with the
/// host buffer; see
/// [`Canvas::create_linear_gradient`](crate::Canvas::create_linear_gradient).
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Gradient {
    Linear {
        start: Point,
        end: Point,
        texture_index: u64,
    },
    Radial {
        center: Point,
        radius: f32,
        texture_index: u64,
    },
}

/// How a shape is colored and whether it is filled or stroked.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Paint {
    pub color: Color,
    pub gradient: Option<Gradient>,
    pub stroke: bool,
    pub stroke_width: f32,
}

impl Default for Paint {
    fn default() -> Self {
        Self {
            color: Color::TRANSPARENT,
            gradient: None,
            stroke: false,
            stroke_width: 1.0,
        }
    }
}

impl Paint {
    /// A solid fill of the given color.
    pub fn from_color(color: Color) -> Self {
        Self {
            color,
            ..Default::default()
        }
    }

    pub fn has_gradient(&self) -> bool {
        self.gradient.is_some()
    }

    /// An opaque paint needs no blending with the backdrop, which makes it
    /// eligible for occlusion reordering.
    pub fn is_opaque(&self) -> bool {
        !self.has_gradient() && self.color.is_opaque()
    }
}

/// An effect applied to a layer's texture when compositing it back.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ImageFilter {
    /// A separable Gaussian blur with standard deviation `sigma`, run at
    /// half resolution.
    Gaussian { sigma: f32 },
}

/// A per-channel color transform applied when compositing a layer.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ColorFilter {
    /// A 4x5 color matrix in row-major order; the fifth column is the
    /// additive bias.
    Matrix([f32; 20]),
}

/// How a clip path combines with the current clip stack.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClipStyle {
    /// Only render shapes that intersect the clip path while it is active.
    Intersect,
    /// Only render shapes outside the clip path while it is active; cuts a
    /// hole in the current clip stack.
    Difference,
}
