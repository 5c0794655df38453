use crate::math::{Transform2D, Vector2};

#[cfg(feature = "serialize")]
use serde::{Serialize, Deserialize};

/// Axis-Aligned Bounding Box (AABB) in the plane
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub struct Aabb {
    /// Minimum corner of the AABB
    pub min: Vector2,

    /// Maximum corner of the AABB
    pub max: Vector2,
}

impl Aabb {
    /// Creates a new AABB from minimum and maximum points
    #[inline]
    pub fn new(min: Vector2, max: Vector2) -> Self {
        Self { min, max }
    }

    /// Creates an AABB centered at a position with the given half extents
    #[inline]
    pub fn from_center_half_extents(center: Vector2, half_extents: Vector2) -> Self {
        Self {
            min: center - half_extents,
            max: center + half_extents,
        }
    }

    /// Creates an AABB from a set of points
    pub fn from_points(points: &[Vector2]) -> Option<Self> {
        let (first, rest) = points.split_first()?;
        let mut aabb = Self::new(*first, *first);
        for point in rest {
            aabb.expand_to_include_point(*point);
        }
        Some(aabb)
    }

    /// Returns the center of the AABB
    #[inline]
    pub fn center(&self) -> Vector2 {
        (self.min + self.max) * 0.5
    }

    /// Returns the extents of the AABB in each dimension
    #[inline]
    pub fn extents(&self) -> Vector2 {
        self.max - self.min
    }

    /// Returns half the extents of the AABB in each dimension
    #[inline]
    pub fn half_extents(&self) -> Vector2 {
        self.extents() * 0.5
    }

    /// Returns the area of the AABB
    #[inline]
    pub fn area(&self) -> f32 {
        let extents = self.extents();
        extents.x * extents.y
    }

    /// Checks if this AABB contains a point
    #[inline]
    pub fn contains_point(&self, point: Vector2) -> bool {
        point.x >= self.min.x && point.x <= self.max.x &&
        point.y >= self.min.y && point.y <= self.max.y
    }

    /// Checks if this AABB intersects with another AABB
    #[inline]
    pub fn intersects(&self, other: &Self) -> bool {
        self.min.x <= other.max.x && self.max.x >= other.min.x &&
        self.min.y <= other.max.y && self.max.y >= other.min.y
    }

    /// Returns the union of this AABB with another
    #[inline]
    pub fn merge(&self, other: &Self) -> Self {
        Self {
            min: Vector2::new(self.min.x.min(other.min.x), self.min.y.min(other.min.y)),
            max: Vector2::new(self.max.x.max(other.max.x), self.max.y.max(other.max.y)),
        }
    }

    /// Expands this AABB to include a point
    #[inline]
    pub fn expand_to_include_point(&mut self, point: Vector2) {
        self.min.x = self.min.x.min(point.x);
        self.min.y = self.min.y.min(point.y);
        self.max.x = self.max.x.max(point.x);
        self.max.y = self.max.y.max(point.y);
    }

    /// Grows this AABB by a margin in all directions
    #[inline]
    pub fn grow(&self, margin: f32) -> Self {
        let margin_vec = Vector2::new(margin, margin);
        Self {
            min: self.min - margin_vec,
            max: self.max + margin_vec,
        }
    }

    /// Returns a copy moved by `offset`
    #[inline]
    pub fn translated(&self, offset: Vector2) -> Self {
        Self {
            min: self.min + offset,
            max: self.max + offset,
        }
    }

    /// Widens any axis thinner than `min_extent` around its center
    pub fn with_min_extent(&self, min_extent: f32) -> Self {
        let mut result = *self;
        for axis in 0..2 {
            let size = self.max.axis(axis) - self.min.axis(axis);
            if size < min_extent {
                let center = (self.max.axis(axis) + self.min.axis(axis)) * 0.5;
                result.min.set_axis(axis, center - min_extent * 0.5);
                result.max.set_axis(axis, center + min_extent * 0.5);
            }
        }
        result
    }

    /// Returns the AABB enclosing this box after transformation
    pub fn transformed(&self, transform: &Transform2D) -> Self {
        let corners = [
            self.min,
            Vector2::new(self.max.x, self.min.y),
            self.max,
            Vector2::new(self.min.x, self.max.y),
        ];

        let first = transform.xform(corners[0]);
        let mut result = Self::new(first, first);
        for corner in &corners[1..] {
            result.expand_to_include_point(transform.xform(*corner));
        }
        result
    }

    /// Slab test for the segment `from -> to`.
    ///
    /// Returns the entry point and the face normal it crossed. A segment starting
    /// inside the box reports its start point and a zero normal.
    pub fn intersects_segment(&self, from: Vector2, to: Vector2) -> Option<(Vector2, Vector2)> {
        let mut min = 0.0f32;
        let mut max = 1.0f32;
        let mut hit_axis = 0;
        let mut sign = 0.0f32;

        for axis in 0..2 {
            let seg_from = from.axis(axis);
            let seg_to = to.axis(axis);
            let box_begin = self.min.axis(axis);
            let box_end = self.max.axis(axis);

            let (cmin, cmax, csign);
            if seg_from < seg_to {
                if seg_from > box_end || seg_to < box_begin {
                    return None;
                }
                let length = seg_to - seg_from;
                cmin = if seg_from < box_begin { (box_begin - seg_from) / length } else { 0.0 };
                cmax = if seg_to > box_end { (box_end - seg_from) / length } else { 1.0 };
                csign = -1.0;
            } else {
                if seg_to > box_end || seg_from < box_begin {
                    return None;
                }
                let length = seg_to - seg_from;
                cmin = if seg_from > box_end { (box_end - seg_from) / length } else { 0.0 };
                cmax = if seg_to < box_begin { (box_begin - seg_from) / length } else { 1.0 };
                csign = 1.0;
            }

            if cmin > min {
                min = cmin;
                hit_axis = axis;
                sign = csign;
            }
            if cmax < max {
                max = cmax;
            }
            if max < min {
                return None;
            }
        }

        let mut normal = Vector2::zero();
        normal.set_axis(hit_axis, sign);
        Some((from + (to - from) * min, normal))
    }
}
