use crate::math::{Aabb, Transform2D, Vector2};
use crate::shapes::shape::bounds_from_points;
use crate::shapes::{Shape, ShapeType, Support};
use std::any::Any;

/// A separation ray cast along the local +Y axis.
///
/// Used for characters that should glide over steps: the ray pushes its owner out along
/// its own direction instead of the surface normal.
#[derive(Debug, Clone)]
pub struct RayShape {
    length: f32,
    slips_on_slope: bool,
    custom_bias: f32,
    bounds: Aabb,
}

impl RayShape {
    pub fn new(length: f32, slips_on_slope: bool) -> Self {
        let mut ray = Self {
            length: 0.0,
            slips_on_slope,
            custom_bias: 0.0,
            bounds: Aabb::default(),
        };
        ray.set_length(length);
        ray
    }

    pub fn get_length(&self) -> f32 {
        self.length
    }

    pub fn set_length(&mut self, length: f32) {
        self.length = length.max(0.0);
        self.bounds = bounds_from_points(&[Vector2::zero(), Vector2::new(0.0, self.length)]);
    }

    pub fn get_slips_on_slope(&self) -> bool {
        self.slips_on_slope
    }

    pub fn set_slips_on_slope(&mut self, slips: bool) {
        self.slips_on_slope = slips;
    }

    pub fn set_custom_bias(&mut self, bias: f32) {
        self.custom_bias = bias;
    }
}

impl Shape for RayShape {
    fn shape_type(&self) -> ShapeType {
        ShapeType::Ray
    }

    fn get_local_bounds(&self) -> Aabb {
        self.bounds
    }

    fn get_custom_bias(&self) -> f32 {
        self.custom_bias
    }

    fn project_range(&self, axis: Vector2, xform: &Transform2D) -> (f32, f32) {
        let a = axis.dot(&xform.origin);
        let b = axis.dot(&xform.xform(Vector2::new(0.0, self.length)));
        (a.min(b), a.max(b))
    }

    fn get_supports(&self, axis: Vector2) -> Support {
        if axis.y > 0.0 {
            Support::Vertex(Vector2::new(0.0, self.length))
        } else {
            Support::Vertex(Vector2::zero())
        }
    }

    fn contains_point(&self, _point: Vector2) -> bool {
        false
    }

    fn intersect_segment(&self, _begin: Vector2, _end: Vector2) -> Option<(Vector2, Vector2)> {
        None
    }

    fn get_moment_of_inertia(&self, _mass: f32, _scale: Vector2) -> f32 {
        0.0
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
