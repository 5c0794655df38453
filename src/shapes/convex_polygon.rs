use crate::math::{segment_intersects_segment, Aabb, Transform2D, Vector2};
use crate::shapes::shape::bounds_from_points;
use crate::shapes::{Shape, ShapeType, Support, SEGMENT_IS_VALID_SUPPORT_THRESHOLD};
use std::any::Any;

/// A convex polygon with precomputed outward edge normals.
///
/// Edge `i` runs from `points[i]` to `points[(i + 1) % len]` and `normals[i]` is its
/// outward normal. Either winding is accepted.
#[derive(Debug, Clone)]
pub struct ConvexPolygonShape {
    points: Vec<Vector2>,
    normals: Vec<Vector2>,
    custom_bias: f32,
    bounds: Aabb,
}

impl ConvexPolygonShape {
    /// Creates a new convex polygon from its vertices
    pub fn new(points: Vec<Vector2>) -> Self {
        let mut polygon = Self {
            points: Vec::new(),
            normals: Vec::new(),
            custom_bias: 0.0,
            bounds: Aabb::default(),
        };
        polygon.set_points(points);
        polygon
    }

    /// Rebuilds edge normals and bounds from a new vertex list
    pub fn set_points(&mut self, points: Vec<Vector2>) {
        let count = points.len();
        let centroid = if count > 0 {
            points.iter().fold(Vector2::zero(), |acc, p| acc + *p) / count as f32
        } else {
            Vector2::zero()
        };

        self.normals = (0..count)
            .map(|i| {
                let p = points[i];
                let next = points[(i + 1) % count];
                let normal = (next - p).tangent().normalize();
                if normal.dot(&(p - centroid)) < 0.0 { -normal } else { normal }
            })
            .collect();

        self.bounds = bounds_from_points(&points);
        self.points = points;
    }

    pub fn get_points(&self) -> &[Vector2] {
        &self.points
    }

    pub fn get_point_count(&self) -> usize {
        self.points.len()
    }

    pub fn get_point(&self, index: usize) -> Vector2 {
        self.points[index]
    }

    /// Outward normal of edge `index` in local space
    pub fn get_segment_normal(&self, index: usize) -> Vector2 {
        self.normals[index]
    }

    /// Outward normal of edge `index` once placed at `xform`
    pub fn get_xformed_segment_normal(&self, xform: &Transform2D, index: usize) -> Vector2 {
        let count = self.points.len();
        let a = xform.xform(self.points[index]);
        let b = xform.xform(self.points[(index + 1) % count]);
        let normal = (b - a).tangent().normalize();
        // Flip if the transform mirrors the polygon
        if normal.dot(&xform.basis_xform(self.normals[index])) < 0.0 { -normal } else { normal }
    }

    pub fn set_custom_bias(&mut self, bias: f32) {
        self.custom_bias = bias;
    }
}

impl Shape for ConvexPolygonShape {
    fn shape_type(&self) -> ShapeType {
        ShapeType::ConvexPolygon
    }

    fn get_local_bounds(&self) -> Aabb {
        self.bounds
    }

    fn get_custom_bias(&self) -> f32 {
        self.custom_bias
    }

    fn project_range(&self, axis: Vector2, xform: &Transform2D) -> (f32, f32) {
        let mut projections = self.points.iter().map(|p| axis.dot(&xform.xform(*p)));
        let first = match projections.next() {
            Some(d) => d,
            None => return (0.0, 0.0),
        };
        projections.fold((first, first), |(min, max), d| (min.min(d), max.max(d)))
    }

    fn get_supports(&self, axis: Vector2) -> Support {
        let count = self.points.len();
        let mut support = None;
        let mut best = f32::MIN;

        for i in 0..count {
            let d = axis.dot(&self.points[i]);
            if d > best {
                best = d;
                support = Some(i);
            }

            if self.normals[i].dot(&axis) > SEGMENT_IS_VALID_SUPPORT_THRESHOLD {
                return Support::Edge([self.points[i], self.points[(i + 1) % count]]);
            }
        }

        match support {
            Some(i) => Support::Vertex(self.points[i]),
            None => Support::None,
        }
    }

    fn contains_point(&self, point: Vector2) -> bool {
        if self.points.is_empty() {
            return false;
        }
        self.points
            .iter()
            .zip(&self.normals)
            .all(|(p, n)| n.dot(&point) - n.dot(p) <= 0.0)
    }

    fn intersect_segment(&self, begin: Vector2, end: Vector2) -> Option<(Vector2, Vector2)> {
        let direction = (end - begin).normalize();
        let count = self.points.len();
        let mut best: Option<(f32, Vector2, Vector2)> = None;

        for i in 0..count {
            let hit = segment_intersects_segment(begin, end, self.points[i], self.points[(i + 1) % count]);
            if let Some(point) = hit {
                let d = direction.dot(&point);
                if best.map_or(true, |(bd, _, _)| d < bd) {
                    best = Some((d, point, self.normals[i]));
                }
            }
        }

        best.map(|(_, point, normal)| {
            if direction.dot(&normal) > 0.0 { (point, -normal) } else { (point, normal) }
        })
    }

    fn get_moment_of_inertia(&self, mass: f32, scale: Vector2) -> f32 {
        let scaled: Vec<Vector2> = self.points.iter().map(|p| p.scale(&scale)).collect();
        let size = Aabb::from_points(&scaled).map(|aabb| aabb.extents()).unwrap_or_default();
        mass * size.dot(&size) / 12.0
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
