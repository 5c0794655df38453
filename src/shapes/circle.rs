use crate::math::{segment_hits_circle, Aabb, Transform2D, Vector2};
use crate::shapes::shape::bounds_from_points;
use crate::shapes::{Shape, ShapeType, Support};
use std::any::Any;

/// A circular collision shape centred on the local origin
#[derive(Debug, Clone)]
pub struct CircleShape {
    /// The radius of the circle
    radius: f32,
    custom_bias: f32,
    bounds: Aabb,
}

impl CircleShape {
    /// Creates a new circle with the given radius
    pub fn new(radius: f32) -> Self {
        let mut circle = Self {
            radius: 0.0,
            custom_bias: 0.0,
            bounds: Aabb::default(),
        };
        circle.set_radius(radius);
        circle
    }

    /// Returns the radius of the circle
    pub fn get_radius(&self) -> f32 {
        self.radius
    }

    /// Sets the radius of the circle
    pub fn set_radius(&mut self, radius: f32) {
        self.radius = radius.max(0.0);
        let r = Vector2::new(self.radius, self.radius);
        self.bounds = bounds_from_points(&[-r, r]);
    }

    pub fn set_custom_bias(&mut self, bias: f32) {
        self.custom_bias = bias;
    }
}

impl Shape for CircleShape {
    fn shape_type(&self) -> ShapeType {
        ShapeType::Circle
    }

    fn get_local_bounds(&self) -> Aabb {
        self.bounds
    }

    fn get_custom_bias(&self) -> f32 {
        self.custom_bias
    }

    fn project_range(&self, axis: Vector2, xform: &Transform2D) -> (f32, f32) {
        let d = axis.dot(&xform.origin);
        // Scale of the transform along the axis
        let scale = xform.basis_xform_inv(axis).length();
        (d - self.radius * scale, d + self.radius * scale)
    }

    fn get_supports(&self, axis: Vector2) -> Support {
        Support::Vertex(axis * self.radius)
    }

    fn contains_point(&self, point: Vector2) -> bool {
        point.length_squared() < self.radius * self.radius
    }

    fn intersect_segment(&self, begin: Vector2, end: Vector2) -> Option<(Vector2, Vector2)> {
        let t = segment_hits_circle(begin, end, self.radius)?;
        let point = begin + (end - begin) * t;
        Some((point, point.normalize()))
    }

    fn get_moment_of_inertia(&self, mass: f32, scale: Vector2) -> f32 {
        let a = self.radius * scale.x;
        let b = self.radius * scale.y;
        mass * (a * a + b * b) / 4.0
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
