use crate::math::{segment_intersects_segment, Aabb, Transform2D, Vector2};
use crate::shapes::shape::bounds_from_points;
use crate::shapes::{Shape, ShapeType, Support, SEGMENT_IS_VALID_SUPPORT_THRESHOLD};
use std::any::Any;

/// A line segment between two local points
#[derive(Debug, Clone)]
pub struct SegmentShape {
    a: Vector2,
    b: Vector2,
    normal: Vector2,
    custom_bias: f32,
    bounds: Aabb,
}

impl SegmentShape {
    /// Creates a new segment from `a` to `b`
    pub fn new(a: Vector2, b: Vector2) -> Self {
        let mut segment = Self {
            a,
            b,
            normal: Vector2::zero(),
            custom_bias: 0.0,
            bounds: Aabb::default(),
        };
        segment.set_data(a, b);
        segment
    }

    pub fn get_a(&self) -> Vector2 {
        self.a
    }

    pub fn get_b(&self) -> Vector2 {
        self.b
    }

    /// Local normal, `(b - a)` rotated clockwise
    pub fn get_normal(&self) -> Vector2 {
        self.normal
    }

    /// Normal of the segment once placed at `xform`
    pub fn get_xformed_normal(&self, xform: &Transform2D) -> Vector2 {
        (xform.xform(self.b) - xform.xform(self.a)).normalize().tangent()
    }

    pub fn set_data(&mut self, a: Vector2, b: Vector2) {
        self.a = a;
        self.b = b;
        self.normal = (b - a).tangent().normalize();
        self.bounds = bounds_from_points(&[a, b]);
    }

    pub fn set_custom_bias(&mut self, bias: f32) {
        self.custom_bias = bias;
    }
}

impl Shape for SegmentShape {
    fn shape_type(&self) -> ShapeType {
        ShapeType::Segment
    }

    fn get_local_bounds(&self) -> Aabb {
        self.bounds
    }

    fn get_custom_bias(&self) -> f32 {
        self.custom_bias
    }

    fn project_range(&self, axis: Vector2, xform: &Transform2D) -> (f32, f32) {
        let a = axis.dot(&xform.xform(self.a));
        let b = axis.dot(&xform.xform(self.b));
        (a.min(b), a.max(b))
    }

    fn get_supports(&self, axis: Vector2) -> Support {
        if axis.dot(&self.normal).abs() > SEGMENT_IS_VALID_SUPPORT_THRESHOLD {
            return Support::Edge([self.a, self.b]);
        }

        if axis.dot(&(self.b - self.a)) > 0.0 {
            Support::Vertex(self.b)
        } else {
            Support::Vertex(self.a)
        }
    }

    fn contains_point(&self, _point: Vector2) -> bool {
        false
    }

    fn intersect_segment(&self, begin: Vector2, end: Vector2) -> Option<(Vector2, Vector2)> {
        let point = segment_intersects_segment(begin, end, self.a, self.b)?;
        let normal = if self.normal.dot(&begin) > self.normal.dot(&self.a) {
            self.normal
        } else {
            -self.normal
        };
        Some((point, normal))
    }

    fn get_moment_of_inertia(&self, mass: f32, scale: Vector2) -> f32 {
        let a = self.a.scale(&scale);
        let b = self.b.scale(&scale);
        let length = a.distance(&b);
        let offset = (a + b) * 0.5;
        mass * (length * length / 12.0 + offset.length_squared())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
