use crate::math::{segment_hits_circle, Aabb, Transform2D, Vector2};
use crate::shapes::shape::bounds_from_points;
use crate::shapes::{Shape, ShapeType, Support, SEGMENT_IS_VALID_SUPPORT_THRESHOLD};
use std::any::Any;

/// A capsule shape aligned with the local y axis.
///
/// `height` is the distance between the two cap centres; the full extent along y is
/// `height + 2 * radius`.
#[derive(Debug, Clone)]
pub struct CapsuleShape {
    radius: f32,
    height: f32,
    custom_bias: f32,
    bounds: Aabb,
}

impl CapsuleShape {
    /// Creates a new capsule with the given radius and cap distance
    pub fn new(radius: f32, height: f32) -> Self {
        let mut capsule = Self {
            radius: 0.0,
            height: 0.0,
            custom_bias: 0.0,
            bounds: Aabb::default(),
        };
        capsule.set_data(radius, height);
        capsule
    }

    pub fn get_radius(&self) -> f32 {
        self.radius
    }

    pub fn get_height(&self) -> f32 {
        self.height
    }

    pub fn set_data(&mut self, radius: f32, height: f32) {
        self.radius = radius.max(0.0);
        self.height = height.max(0.0);
        let extent = Vector2::new(self.radius, self.height * 0.5 + self.radius);
        self.bounds = bounds_from_points(&[-extent, extent]);
    }

    pub fn set_custom_bias(&mut self, bias: f32) {
        self.custom_bias = bias;
    }

    /// World-space centres of the two caps
    pub fn get_cap_centers(&self, xform: &Transform2D) -> [Vector2; 2] {
        let offset = xform.y * (self.height * 0.5);
        [xform.origin + offset, xform.origin - offset]
    }
}

impl Shape for CapsuleShape {
    fn shape_type(&self) -> ShapeType {
        ShapeType::Capsule
    }

    fn get_local_bounds(&self) -> Aabb {
        self.bounds
    }

    fn get_custom_bias(&self) -> f32 {
        self.custom_bias
    }

    fn project_range(&self, axis: Vector2, xform: &Transform2D) -> (f32, f32) {
        let mut n = xform.basis_xform_inv(axis).normalize();
        let h = if n.y > 0.0 { self.height } else { -self.height };
        n *= self.radius;
        n.y += h * 0.5;

        let max = axis.dot(&xform.xform(n));
        let min = axis.dot(&xform.xform(-n));
        (min, max)
    }

    fn get_supports(&self, axis: Vector2) -> Support {
        let d = axis.y;
        if d.abs() < 1.0 - SEGMENT_IS_VALID_SUPPORT_THRESHOLD {
            // Flat side of the capsule
            let n = Vector2::new(axis.x, 0.0).normalize() * self.radius;
            let half = Vector2::new(0.0, self.height * 0.5);
            return Support::Edge([n + half, n - half]);
        }

        let h = if d > 0.0 { self.height } else { -self.height };
        let mut n = axis * self.radius;
        n.y += h * 0.5;
        Support::Vertex(n)
    }

    fn contains_point(&self, point: Vector2) -> bool {
        let y = (point.y.abs() - self.height * 0.5).max(0.0);
        Vector2::new(point.x, y).length_squared() < self.radius * self.radius
    }

    fn intersect_segment(&self, begin: Vector2, end: Vector2) -> Option<(Vector2, Vector2)> {
        let direction = (end - begin).normalize();
        let mut best: Option<(f32, Vector2, Vector2)> = None;

        for offset in [-self.height * 0.5, self.height * 0.5] {
            let shift = Vector2::new(0.0, offset);
            let (b, e) = (begin + shift, end + shift);
            let t = match segment_hits_circle(b, e, self.radius) {
                Some(t) => t,
                None => continue,
            };

            let point = b + (e - b) * t;
            let pd = direction.dot(&point);
            if best.map_or(true, |(d, _, _)| pd < d) {
                best = Some((pd, point - shift, point.normalize()));
            }
        }

        let body = Aabb::new(
            Vector2::new(-self.radius, -self.height * 0.5),
            Vector2::new(self.radius, self.height * 0.5),
        );
        if let Some((point, normal)) = body.intersects_segment(begin, end) {
            let pd = direction.dot(&point);
            if best.map_or(true, |(d, _, _)| pd < d) {
                best = Some((pd, point, normal));
            }
        }

        best.map(|(_, point, normal)| (point, normal))
    }

    fn get_moment_of_inertia(&self, mass: f32, scale: Vector2) -> f32 {
        let he2 = Vector2::new(self.radius * 2.0, self.height + self.radius * 2.0).scale(&scale);
        mass * he2.dot(&he2) / 12.0
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
