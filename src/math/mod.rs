mod vector;
mod transform;
mod aabb;

pub use vector::Vector2;
pub use transform::Transform2D;
pub use aabb::Aabb;

/// Constant for a very small number, used for comparisons
pub const EPSILON: f32 = 1.0e-6;

/// Tolerance used by geometric predicates (contact clipping, segment tests)
pub const CMP_EPSILON: f32 = 1.0e-5;

/// Returns true if the value is approximately zero
#[inline]
pub fn approx_zero(a: f32) -> bool {
    a.abs() < EPSILON
}

/// Clamps a value between a minimum and maximum value
#[inline]
pub fn clamp(value: f32, min: f32, max: f32) -> f32 {
    value.max(min).min(max)
}

/// Linearly interpolates between two values
#[inline]
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Wraps an angle difference into `(-PI, PI]`
#[inline]
pub fn wrap_angle(angle: f32) -> f32 {
    use std::f32::consts::{PI, TAU};
    let wrapped = (angle + PI).rem_euclid(TAU) - PI;
    if wrapped == -PI { PI } else { wrapped }
}

/// Projects `point` onto the infinite line through `segment`
pub fn closest_point_to_segment_uncapped(point: Vector2, segment: &[Vector2; 2]) -> Vector2 {
    let p = point - segment[0];
    let n = segment[1] - segment[0];
    let l2 = n.length_squared();
    if l2 < 1e-20 {
        return segment[0];
    }
    let d = n.dot(&p) / l2;
    segment[0] + n * d
}

/// Closest point to `point` on the segment `a -> b`
pub fn closest_point_to_segment(point: Vector2, a: Vector2, b: Vector2) -> Vector2 {
    let n = b - a;
    let l2 = n.length_squared();
    if l2 < 1e-20 {
        return a;
    }
    let d = clamp(n.dot(&(point - a)) / l2, 0.0, 1.0);
    a + n * d
}

/// Intersection point of the segments `a0 -> a1` and `b0 -> b1`, if any
pub fn segment_intersects_segment(a0: Vector2, a1: Vector2, b0: Vector2, b1: Vector2) -> Option<Vector2> {
    let r = a1 - a0;
    let s = b1 - b0;
    let denom = r.cross(&s);
    if denom.abs() < EPSILON {
        return None;
    }

    let qp = b0 - a0;
    let t = qp.cross(&s) / denom;
    let u = qp.cross(&r) / denom;
    if !(0.0..=1.0).contains(&t) || !(0.0..=1.0).contains(&u) {
        return None;
    }

    Some(a0 + r * t)
}

/// Solves `|begin + t * (end - begin)| = radius` for the first `t` in `[0, 1]`
pub(crate) fn segment_hits_circle(begin: Vector2, end: Vector2, radius: f32) -> Option<f32> {
    let line_vec = end - begin;
    let a = line_vec.dot(&line_vec);
    if a <= 0.0 {
        return None;
    }
    let b = 2.0 * begin.dot(&line_vec);
    let c = begin.dot(&begin) - radius * radius;

    let discriminant = b * b - 4.0 * a * c;
    if discriminant < 0.0 {
        return None;
    }

    let t = (-b - discriminant.sqrt()) / (2.0 * a);
    if t < 0.0 || t > 1.0 + CMP_EPSILON {
        return None;
    }
    Some(t)
}
