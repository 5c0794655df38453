//! Convex 2D collision shapes.
//!
//! Shapes are immutable once shared: a `ShapeInstance` holds an `Arc<dyn Shape>` and
//! several collision objects may reference the same geometry.

mod shape;
mod line;
mod ray;
mod segment;
mod circle;
mod rectangle;
mod capsule;
mod convex_polygon;

pub use shape::{Shape, Support};
pub use line::LineShape;
pub use ray::RayShape;
pub use segment::SegmentShape;
pub use circle::CircleShape;
pub use rectangle::RectangleShape;
pub use capsule::CapsuleShape;
pub use convex_polygon::ConvexPolygonShape;

#[cfg(feature = "serialize")]
use serde::{Serialize, Deserialize};

/// Cosine above which a support query snaps to a whole edge instead of a vertex
pub const SEGMENT_IS_VALID_SUPPORT_THRESHOLD: f32 = 0.99998;

/// Smallest extent a cached shape AABB may have on either axis
pub const MIN_AABB_EXTENT: f32 = 0.001;

/// Shape type tags.
///
/// The declaration order is the canonical order used when dispatching shape pairs:
/// a pair is always solved with the lower tag first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub enum ShapeType {
    Line,
    Ray,
    Segment,
    Circle,
    Rectangle,
    Capsule,
    ConvexPolygon,
}
