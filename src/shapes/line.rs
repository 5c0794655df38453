use crate::math::{Aabb, Transform2D, Vector2, CMP_EPSILON};
use crate::shapes::{Shape, ShapeType, Support};
use std::any::Any;

/// Half extent of the bounds reported for an infinite line
const LINE_BOUNDS_EXTENT: f32 = 1.0e4;

/// An infinite one-sided line: everything with `normal·p < d` is solid
#[derive(Debug, Clone)]
pub struct LineShape {
    normal: Vector2,
    d: f32,
    custom_bias: f32,
}

impl LineShape {
    /// Creates a new line from its normal and distance to the origin
    pub fn new(normal: Vector2, d: f32) -> Self {
        Self {
            normal: normal.normalize(),
            d,
            custom_bias: 0.0,
        }
    }

    pub fn get_normal(&self) -> Vector2 {
        self.normal
    }

    pub fn get_d(&self) -> f32 {
        self.d
    }

    pub fn set_data(&mut self, normal: Vector2, d: f32) {
        self.normal = normal.normalize();
        self.d = d;
    }

    pub fn set_custom_bias(&mut self, bias: f32) {
        self.custom_bias = bias;
    }
}

impl Shape for LineShape {
    fn shape_type(&self) -> ShapeType {
        ShapeType::Line
    }

    fn get_local_bounds(&self) -> Aabb {
        let extent = Vector2::new(LINE_BOUNDS_EXTENT, LINE_BOUNDS_EXTENT);
        Aabb::new(-extent, extent)
    }

    fn get_custom_bias(&self) -> f32 {
        self.custom_bias
    }

    fn project_range(&self, _axis: Vector2, _xform: &Transform2D) -> (f32, f32) {
        (-1.0e10, 1.0e10)
    }

    fn project_range_cast(&self, _motion: Vector2, _axis: Vector2, _xform: &Transform2D) -> (f32, f32) {
        (-1.0e10, 1.0e10)
    }

    fn get_supports(&self, _axis: Vector2) -> Support {
        Support::None
    }

    fn contains_point(&self, point: Vector2) -> bool {
        self.normal.dot(&point) < self.d
    }

    fn intersect_segment(&self, begin: Vector2, end: Vector2) -> Option<(Vector2, Vector2)> {
        let segment = begin - end;
        let den = self.normal.dot(&segment);
        if den.abs() <= CMP_EPSILON {
            return None;
        }

        let dist = (self.normal.dot(&begin) - self.d) / den;
        if dist < -CMP_EPSILON || dist > 1.0 + CMP_EPSILON {
            return None;
        }

        Some((begin - segment * dist, self.normal))
    }

    fn get_moment_of_inertia(&self, _mass: f32, _scale: Vector2) -> f32 {
        0.0
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
