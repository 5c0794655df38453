use crate::math::{Aabb, Transform2D, Vector2};
use crate::shapes::{ShapeType, SEGMENT_IS_VALID_SUPPORT_THRESHOLD};
use std::any::Any;
use std::fmt::Debug;

/// Support feature of a shape along a direction: nothing, a single vertex or a whole edge
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Support {
    None,
    Vertex(Vector2),
    Edge([Vector2; 2]),
}

impl Support {
    /// Returns the support points as a slice (0, 1 or 2 points)
    pub fn points(&self) -> &[Vector2] {
        match self {
            Support::None => &[],
            Support::Vertex(point) => std::slice::from_ref(point),
            Support::Edge(points) => &points[..],
        }
    }

    /// Number of support points
    pub fn count(&self) -> usize {
        self.points().len()
    }

    /// Applies `f` to every support point
    pub fn map<F: Fn(Vector2) -> Vector2>(self, f: F) -> Self {
        match self {
            Support::None => Support::None,
            Support::Vertex(point) => Support::Vertex(f(point)),
            Support::Edge([a, b]) => Support::Edge([f(a), f(b)]),
        }
    }
}

/// Base trait for collision shapes
pub trait Shape: Send + Sync + Debug + 'static {
    /// Returns the type tag of the shape
    fn shape_type(&self) -> ShapeType;

    /// Returns the cached axis-aligned bounding box of the shape in local space
    fn get_local_bounds(&self) -> Aabb;

    /// Per-shape override of the contact bias, 0 when unset
    fn get_custom_bias(&self) -> f32;

    /// Projects the shape placed at `xform` onto the world-space `axis`
    fn project_range(&self, axis: Vector2, xform: &Transform2D) -> (f32, f32);

    /// Projection of the shape swept from `xform` by `motion`
    fn project_range_cast(&self, motion: Vector2, axis: Vector2, xform: &Transform2D) -> (f32, f32) {
        let (min_a, max_a) = self.project_range(axis, xform);
        let (min_b, max_b) = self.project_range(axis, &xform.translated(motion));
        (min_a.min(min_b), max_a.max(max_b))
    }

    /// Support feature along a local-space direction (assumed normalized)
    fn get_supports(&self, axis: Vector2) -> Support;

    /// World-space supports along `axis` of the shape swept by `motion`.
    ///
    /// A vertex support becomes an edge when the motion is perpendicular to the axis.
    fn get_supports_transformed_cast(&self, motion: Vector2, axis: Vector2, xform: &Transform2D) -> Support {
        let support = self
            .get_supports(xform.basis_xform_inv(axis).normalize())
            .map(|p| xform.xform(p));

        let parallel = axis.dot(&motion.normalize()).abs() < 1.0 - SEGMENT_IS_VALID_SUPPORT_THRESHOLD;
        let towards = motion.dot(&axis) > 0.0;

        match support {
            Support::Vertex(p) if parallel => Support::Edge([p, p + motion]),
            Support::Vertex(p) if towards => Support::Vertex(p + motion),
            Support::Edge([a, b]) if parallel => {
                if (b - a).dot(&motion) > 0.0 {
                    Support::Edge([a, b + motion])
                } else {
                    Support::Edge([a + motion, b])
                }
            }
            Support::Edge([a, b]) if towards => Support::Edge([a + motion, b + motion]),
            other => other,
        }
    }

    /// Tests a point given in local space
    fn contains_point(&self, point: Vector2) -> bool;

    /// Intersects a local-space segment, returning the hit point and surface normal
    fn intersect_segment(&self, begin: Vector2, end: Vector2) -> Option<(Vector2, Vector2)>;

    /// Moment of inertia about the shape origin for the given mass and scale
    fn get_moment_of_inertia(&self, mass: f32, scale: Vector2) -> f32;

    /// Returns a dynamic reference to any for downcasting
    fn as_any(&self) -> &dyn Any;
}

/// Builds a cached local AABB, widening degenerate axes
pub(crate) fn bounds_from_points(points: &[Vector2]) -> Aabb {
    Aabb::from_points(points)
        .unwrap_or_default()
        .with_min_extent(crate::shapes::MIN_AABB_EXTENT)
}
