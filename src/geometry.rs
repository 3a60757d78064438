// Copyright 2026 the Fresco Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Basic geometry: points, sizes, rectangles, matrices and colors.

use std::ops::{Add, AddAssign, Mul, Neg, Sub, SubAssign};

use bytemuck::{Pod, Zeroable};

/// A 2D point (or vector; the distinction is contextual).
///
/// This is also the interleaved vertex format of every mesh produced by the
/// [`Tessellator`](crate::Tessellator): two `f32` coordinates, 8 bytes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    /// The point `(0, 0)`.
    pub const ZERO: Self = Self::new(0.0, 0.0);

    /// Create a new point.
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Dot product of this and `other`.
    pub fn dot(self, other: Self) -> f32 {
        self.x * other.x + self.y * other.y
    }

    /// Z component of the cross product of this and `other`.
    pub fn cross(self, other: Self) -> f32 {
        self.x * other.y - self.y * other.x
    }

    /// Euclidean length.
    pub fn length(self) -> f32 {
        self.x.hypot(self.y)
    }

    /// Component-wise absolute value.
    pub fn abs(self) -> Self {
        Self::new(self.x.abs(), self.y.abs())
    }

    /// Component-wise minimum of this and `other`.
    pub fn min(self, other: Self) -> Self {
        Self::new(self.x.min(other.x), self.y.min(other.y))
    }

    /// Component-wise maximum of this and `other`.
    pub fn max(self, other: Self) -> Self {
        Self::new(self.x.max(other.x), self.y.max(other.y))
    }
}

impl Add for Point {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl AddAssign for Point {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl Sub for Point {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl SubAssign for Point {
    fn sub_assign(&mut self, rhs: Self) {
        *self = *self - rhs;
    }
}

impl Mul<f32> for Point {
    type Output = Self;

    fn mul(self, rhs: f32) -> Self {
        Self::new(self.x * rhs, self.y * rhs)
    }
}

impl Mul<Point> for f32 {
    type Output = Point;

    fn mul(self, rhs: Point) -> Point {
        rhs * self
    }
}

/// Component-wise product.
impl Mul for Point {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self {
        Self::new(self.x * rhs.x, self.y * rhs.y)
    }
}

impl Neg for Point {
    type Output = Self;

    fn neg(self) -> Self {
        Self::new(-self.x, -self.y)
    }
}

/// A 2D size.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

impl Size {
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

impl Add for Size {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::new(self.width + rhs.width, self.height + rhs.height)
    }
}

impl Sub for Size {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self::new(self.width - rhs.width, self.height - rhs.height)
    }
}

impl Mul<f32> for Size {
    type Output = Self;

    fn mul(self, rhs: f32) -> Self {
        Self::new(self.width * rhs, self.height * rhs)
    }
}

/// An axis-aligned rectangle stored as left/top/right/bottom edges.
///
/// Constructors keep `l <= r` and `t <= b`; operations assume it.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Rect {
    pub l: f32,
    pub t: f32,
    pub r: f32,
    pub b: f32,
}

impl Rect {
    /// Create a rectangle from its four edges.
    pub const fn from_ltrb(l: f32, t: f32, r: f32, b: f32) -> Self {
        Self { l, t, r, b }
    }

    /// The axis-aligned bounding box of two points.
    pub fn from_points(a: Point, b: Point) -> Self {
        Self {
            l: a.x.min(b.x),
            t: a.y.min(b.y),
            r: a.x.max(b.x),
            b: a.y.max(b.y),
        }
    }

    pub fn width(&self) -> f32 {
        self.r - self.l
    }

    pub fn height(&self) -> f32 {
        self.b - self.t
    }

    /// Smallest rectangle containing both this and `other`.
    pub fn union(&self, other: &Self) -> Self {
        Self {
            l: self.l.min(other.l),
            t: self.t.min(other.t),
            r: self.r.max(other.r),
            b: self.b.max(other.b),
        }
    }

    /// The overlap of this and `other`, or `None` when the rectangles are
    /// disjoint or share only an edge.
    ///
    /// The comparison is written in negated form so that a NaN edge anywhere
    /// also yields `None`.
    pub fn intersection(&self, other: &Self) -> Option<Self> {
        let l = self.l.max(other.l);
        let r = self.r.min(other.r);
        let t = self.t.max(other.t);
        let b = self.b.min(other.b);
        if !(l < r && t < b) {
            return None;
        }
        Some(Self { l, t, r, b })
    }

    /// Expand the rectangle in the horizontal and vertical directions.
    ///
    /// Expanding by negative amounts will shrink the rectangle. The total
    /// change in width will be `2 * h` and in height `2 * v`.
    pub fn expand(&self, h: f32, v: f32) -> Self {
        Self {
            l: self.l - h,
            t: self.t - v,
            r: self.r + h,
            b: self.b + v,
        }
    }

    /// The rectangle as a 6-vertex triangle list, suitable for a vertex-only
    /// draw without an index buffer.
    pub fn get_quad(&self) -> [Point; 6] {
        [
            Point::new(self.l, self.t),
            Point::new(self.r, self.t),
            Point::new(self.l, self.b),
            Point::new(self.r, self.t),
            Point::new(self.l, self.b),
            Point::new(self.r, self.b),
        ]
    }
}

/// A column-major 4x4 transformation matrix.
///
/// Only the 2D-relevant rows ever feed [`Self::transform_point`], but the
/// full matrix is kept so the submission backend can splat it directly into
/// a uniform without reshuffling.
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct Matrix {
    m: [f32; 16],
}

impl Matrix {
    pub const IDENTITY: Self = Self {
        m: [
            1.0, 0.0, 0.0, 0.0, //
            0.0, 1.0, 0.0, 0.0, //
            0.0, 0.0, 1.0, 0.0, //
            0.0, 0.0, 0.0, 1.0, //
        ],
    };

    /// Create a matrix from 16 column-major components.
    pub const fn from_components(m: [f32; 16]) -> Self {
        Self { m }
    }

    /// An orthographic projection mapping `(0, 0)..(w, h)` to normalized
    /// device coordinates, with y flipped and depth biased to the middle of
    /// the clip range.
    pub fn orthographic(size: Size) -> Self {
        Self {
            m: [
                2.0 / size.width, 0.0, 0.0, 0.0, //
                0.0, -2.0 / size.height, 0.0, 0.0, //
                0.0, 0.0, 1.0, 0.0, //
                -1.0, 1.0, 0.5, 1.0, //
            ],
        }
    }

    pub fn translate(x: f32, y: f32, z: f32) -> Self {
        Self {
            m: [
                1.0, 0.0, 0.0, 0.0, //
                0.0, 1.0, 0.0, 0.0, //
                0.0, 0.0, 1.0, 0.0, //
                x, y, z, 1.0, //
            ],
        }
    }

    pub fn scale(sx: f32, sy: f32, sz: f32) -> Self {
        Self {
            m: [
                sx, 0.0, 0.0, 0.0, //
                0.0, sy, 0.0, 0.0, //
                0.0, 0.0, sz, 0.0, //
                0.0, 0.0, 0.0, 1.0, //
            ],
        }
    }

    /// Rotation about +z. `radians` measures clockwise in the y-down
    /// coordinate system used throughout.
    pub fn rotate(radians: f32) -> Self {
        let (sin, cos) = radians.sin_cos();
        Self {
            m: [
                cos, sin, 0.0, 0.0, //
                -sin, cos, 0.0, 0.0, //
                0.0, 0.0, 1.0, 0.0, //
                0.0, 0.0, 0.0, 1.0, //
            ],
        }
    }

    /// The translation component.
    pub fn translation(&self) -> Point {
        Point::new(self.m[12], self.m[13])
    }

    /// Raw column-major storage.
    pub fn components(&self) -> &[f32; 16] {
        &self.m
    }

    /// Apply the matrix to a point, including the perspective divide.
    ///
    /// A zero w passes the unscaled result through rather than producing
    /// NaN.
    pub fn transform_point(&self, p: Point) -> Point {
        let m = &self.m;
        let w = p.x * m[3] + p.y * m[7] + m[15];
        let result = Point::new(
            p.x * m[0] + p.y * m[4] + m[12],
            p.x * m[1] + p.y * m[5] + m[13],
        );
        if w == 0.0 {
            result
        } else {
            result * (1.0 / w)
        }
    }

    /// The axis-aligned bounding box of the four transformed corners of
    /// `bounds`.
    pub fn transform_bounds(&self, bounds: &Rect) -> Rect {
        let lt = self.transform_point(Point::new(bounds.l, bounds.t));
        let rt = self.transform_point(Point::new(bounds.r, bounds.t));
        let lb = self.transform_point(Point::new(bounds.l, bounds.b));
        let rb = self.transform_point(Point::new(bounds.r, bounds.b));
        let min = lt.min(rt).min(lb.min(rb));
        let max = lt.max(rt).max(lb.max(rb));
        Rect::from_ltrb(min.x, min.y, max.x, max.y)
    }

    /// The longer of the two xy basis vector lengths.
    ///
    /// This is the scale factor fed to the subdivision bounds in
    /// [`wangs_formula`](crate::wangs_formula): the worst-case pixel
    /// magnification a unit of local space undergoes.
    pub fn basis_length_max(&self) -> f32 {
        let x = Point::new(self.m[0], self.m[1]).length();
        let y = Point::new(self.m[4], self.m[5]).length();
        x.max(y)
    }
}

impl Default for Matrix {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Mul for Matrix {
    type Output = Self;

    fn mul(self, o: Self) -> Self {
        let a = &self.m;
        let b = &o.m;
        let mut m = [0.0; 16];
        for col in 0..4 {
            for row in 0..4 {
                m[col * 4 + row] = a[row] * b[col * 4]
                    + a[4 + row] * b[col * 4 + 1]
                    + a[8 + row] * b[col * 4 + 2]
                    + a[12 + row] * b[col * 4 + 3];
            }
        }
        Self { m }
    }
}

/// A four channel color in sRGB with an extended range.
///
/// Components are not clamped; the driver is expected to convert to linear
/// space on sampling.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const TRANSPARENT: Self = Self::new(0.0, 0.0, 0.0, 0.0);
    pub const BLACK: Self = Self::new(0.0, 0.0, 0.0, 1.0);
    pub const WHITE: Self = Self::new(1.0, 1.0, 1.0, 1.0);
    pub const RED: Self = Self::new(1.0, 0.0, 0.0, 1.0);
    pub const GREEN: Self = Self::new(0.0, 1.0, 0.0, 1.0);
    pub const BLUE: Self = Self::new(0.0, 0.0, 1.0, 1.0);

    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// An opaque color from a packed `0x00BBGGRR` value.
    pub const fn from_rgb8_packed(value: u32) -> Self {
        Self {
            r: (value & 0xFF) as f32 / 255.0,
            g: ((value >> 8) & 0xFF) as f32 / 255.0,
            b: ((value >> 16) & 0xFF) as f32 / 255.0,
            a: 1.0,
        }
    }

    /// Multiply the color channels by the alpha channel.
    pub fn premultiply(self) -> Self {
        Self::new(self.r * self.a, self.g * self.a, self.b * self.a, self.a)
    }

    /// Divide the color channels by the alpha channel.
    pub fn unpremultiply(self) -> Self {
        Self::new(self.r / self.a, self.g / self.a, self.b / self.a, self.a)
    }

    pub const fn with_alpha(self, a: f32) -> Self {
        Self { a, ..self }
    }

    pub fn is_opaque(&self) -> bool {
        self.a >= 1.0
    }
}
