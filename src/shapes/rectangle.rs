use crate::math::{Aabb, Transform2D, Vector2};
use crate::shapes::shape::bounds_from_points;
use crate::shapes::{Shape, ShapeType, Support, SEGMENT_IS_VALID_SUPPORT_THRESHOLD};
use std::any::Any;

/// An axis-aligned (in local space) rectangle centred on the origin
#[derive(Debug, Clone)]
pub struct RectangleShape {
    half_extents: Vector2,
    custom_bias: f32,
    bounds: Aabb,
}

impl RectangleShape {
    /// Creates a new rectangle with the given half extents
    pub fn new(half_extents: Vector2) -> Self {
        let mut rect = Self {
            half_extents: Vector2::zero(),
            custom_bias: 0.0,
            bounds: Aabb::default(),
        };
        rect.set_half_extents(half_extents);
        rect
    }

    pub fn get_half_extents(&self) -> Vector2 {
        self.half_extents
    }

    pub fn set_half_extents(&mut self, half_extents: Vector2) {
        self.half_extents = half_extents.abs();
        self.bounds = bounds_from_points(&[-self.half_extents, self.half_extents]);
    }

    pub fn set_custom_bias(&mut self, bias: f32) {
        self.custom_bias = bias;
    }

    /// Corner that faces `local_point`, in local space
    #[inline]
    fn corner_towards(&self, local_point: Vector2) -> Vector2 {
        Vector2::new(
            if local_point.x < 0.0 { -self.half_extents.x } else { self.half_extents.x },
            if local_point.y < 0.0 { -self.half_extents.y } else { self.half_extents.y },
        )
    }

    /// Axis from a circle centre to the nearest-facing corner of this rectangle
    pub fn get_circle_axis(&self, xform: &Transform2D, xform_inv: &Transform2D, circle: Vector2) -> Vector2 {
        let corner = self.corner_towards(xform_inv.xform(circle));
        (xform.xform(corner) - circle).normalize()
    }

    /// Axis between the facing corners of this rectangle and `other`
    pub fn get_box_axis(
        &self,
        xform: &Transform2D,
        xform_inv: &Transform2D,
        other: &RectangleShape,
        other_xform: &Transform2D,
        other_xform_inv: &Transform2D,
    ) -> Vector2 {
        let a = xform.xform(self.corner_towards(xform_inv.xform(other_xform.origin)));
        let b = other_xform.xform(other.corner_towards(other_xform_inv.xform(xform.origin)));
        (a - b).normalize()
    }
}

impl Shape for RectangleShape {
    fn shape_type(&self) -> ShapeType {
        ShapeType::Rectangle
    }

    fn get_local_bounds(&self) -> Aabb {
        self.bounds
    }

    fn get_custom_bias(&self) -> f32 {
        self.custom_bias
    }

    fn project_range(&self, axis: Vector2, xform: &Transform2D) -> (f32, f32) {
        // The box is symmetric, so only the magnitude of the local axis matters
        let local_axis = xform.basis_xform_inv(axis);
        let length = local_axis.abs().dot(&self.half_extents);
        let distance = axis.dot(&xform.origin);
        (distance - length, distance + length)
    }

    fn get_supports(&self, axis: Vector2) -> Support {
        let he = self.half_extents;
        for i in 0..2 {
            let dp = axis.axis(i);
            if dp.abs() < SEGMENT_IS_VALID_SUPPORT_THRESHOLD {
                continue;
            }

            let sign = if dp > 0.0 { 1.0 } else { -1.0 };
            let mut a = Vector2::zero();
            let mut b = Vector2::zero();
            a.set_axis(i, he.axis(i) * sign);
            a.set_axis(i ^ 1, he.axis(i ^ 1));
            b.set_axis(i, he.axis(i) * sign);
            b.set_axis(i ^ 1, -he.axis(i ^ 1));
            return Support::Edge([a, b]);
        }

        Support::Vertex(self.corner_towards(axis))
    }

    fn contains_point(&self, point: Vector2) -> bool {
        point.x.abs() < self.half_extents.x && point.y.abs() < self.half_extents.y
    }

    fn intersect_segment(&self, begin: Vector2, end: Vector2) -> Option<(Vector2, Vector2)> {
        Aabb::new(-self.half_extents, self.half_extents).intersects_segment(begin, end)
    }

    fn get_moment_of_inertia(&self, mass: f32, scale: Vector2) -> f32 {
        let he2 = (self.half_extents * 2.0).scale(&scale);
        mass * he2.dot(&he2) / 12.0
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
