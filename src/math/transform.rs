use crate::math::Vector2;
use nalgebra as na;
use std::ops::Mul;

#[cfg(feature = "serialize")]
use serde::{Serialize, Deserialize};

/// An affine 2D transform stored as two basis columns and an origin.
///
/// A point `p` maps to `x * p.x + y * p.y + origin`.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub struct Transform2D {
    /// Image of the local x axis
    pub x: Vector2,

    /// Image of the local y axis
    pub y: Vector2,

    /// Translation
    pub origin: Vector2,
}

impl Default for Transform2D {
    fn default() -> Self {
        Self::identity()
    }
}

impl Transform2D {
    /// Creates a transform from its basis columns and origin
    #[inline]
    pub const fn new(x: Vector2, y: Vector2, origin: Vector2) -> Self {
        Self { x, y, origin }
    }

    /// Creates a new identity transform
    #[inline]
    pub const fn identity() -> Self {
        Self {
            x: Vector2::unit_x(),
            y: Vector2::unit_y(),
            origin: Vector2::zero(),
        }
    }

    /// Creates a pure translation
    #[inline]
    pub fn from_position(origin: Vector2) -> Self {
        Self { origin, ..Self::identity() }
    }

    /// Creates a rotation by `angle` radians followed by a translation
    #[inline]
    pub fn from_rotation_translation(angle: f32, origin: Vector2) -> Self {
        let (sin, cos) = angle.sin_cos();
        Self {
            x: Vector2::new(cos, sin),
            y: Vector2::new(-sin, cos),
            origin,
        }
    }

    /// Returns the basis column for `axis` (0 = x, 1 = y, 2 = origin)
    #[inline]
    pub fn axis(&self, axis: usize) -> Vector2 {
        match axis {
            0 => self.x,
            1 => self.y,
            _ => self.origin,
        }
    }

    /// Transforms a point
    #[inline]
    pub fn xform(&self, point: Vector2) -> Vector2 {
        self.basis_xform(point) + self.origin
    }

    /// Transforms a point by the transpose of the basis after removing the origin.
    ///
    /// Only an inverse for orthonormal bases.
    #[inline]
    pub fn xform_inv(&self, point: Vector2) -> Vector2 {
        self.basis_xform_inv(point - self.origin)
    }

    /// Transforms a direction (ignores the origin)
    #[inline]
    pub fn basis_xform(&self, v: Vector2) -> Vector2 {
        self.x * v.x + self.y * v.y
    }

    /// Multiplies a direction by the transpose of the basis
    #[inline]
    pub fn basis_xform_inv(&self, v: Vector2) -> Vector2 {
        Vector2::new(self.x.dot(&v), self.y.dot(&v))
    }

    /// Determinant of the basis
    #[inline]
    pub fn determinant(&self) -> f32 {
        self.x.x * self.y.y - self.x.y * self.y.x
    }

    /// Returns the inverse of a general affine transform.
    ///
    /// A singular basis falls back to the identity basis.
    pub fn affine_inverse(&self) -> Self {
        let basis = na::Matrix2::new(self.x.x, self.y.x, self.x.y, self.y.y);
        let inv = basis.try_inverse().unwrap_or_else(na::Matrix2::identity);

        let x = Vector2::new(inv[(0, 0)], inv[(1, 0)]);
        let y = Vector2::new(inv[(0, 1)], inv[(1, 1)]);
        let origin = -(x * self.origin.x + y * self.origin.y);

        Self { x, y, origin }
    }

    /// Returns the rotation angle of the x axis
    #[inline]
    pub fn rotation(&self) -> f32 {
        self.x.y.atan2(self.x.x)
    }

    /// Returns the scale along each basis axis (y carries the sign of the determinant)
    pub fn scale(&self) -> Vector2 {
        let sign = if self.determinant() < 0.0 { -1.0 } else { 1.0 };
        Vector2::new(self.x.length(), sign * self.y.length())
    }

    /// Returns a copy without translation
    #[inline]
    pub fn untranslated(&self) -> Self {
        Self { origin: Vector2::zero(), ..*self }
    }

    /// Returns a copy translated by `offset` in parent space
    #[inline]
    pub fn translated(&self, offset: Vector2) -> Self {
        Self { origin: self.origin + offset, ..*self }
    }

    /// Composes two transforms: the result applies `other` first, then `self`
    pub fn compose(&self, other: &Self) -> Self {
        Self {
            x: self.basis_xform(other.x),
            y: self.basis_xform(other.y),
            origin: self.xform(other.origin),
        }
    }

    /// Interpolates origin and rotation, dropping scale
    pub fn interpolate(&self, other: &Self, t: f32) -> Self {
        let from = self.rotation();
        let mut delta = other.rotation() - from;
        delta = (delta + std::f32::consts::PI).rem_euclid(std::f32::consts::TAU) - std::f32::consts::PI;
        Self::from_rotation_translation(from + delta * t, self.origin.lerp(&other.origin, t))
    }
}

impl Mul for Transform2D {
    type Output = Self;

    #[inline]
    fn mul(self, rhs: Self) -> Self::Output {
        self.compose(&rhs)
    }
}
