use crate::collision::sat::sat_calculate_penetration;
use crate::math::{Transform2D, Vector2};
use crate::shapes::{LineShape, RayShape, Shape, ShapeType, Support};

/// Narrow-phase entry point for any pair of shapes.
///
/// Lines and rays take dedicated paths; every other pair goes through the separating
/// axis test.
pub struct CollisionSolver;

impl CollisionSolver {
    /// Tests `shape_a` at `xform_a` (moving by `motion_a`) against `shape_b`.
    ///
    /// Each contact is passed to `callback` as (point on A, point on B). `sep_axis`
    /// carries the separating axis hint between calls. Returns whether the shapes collide.
    #[allow(clippy::too_many_arguments)]
    pub fn solve(
        shape_a: &dyn Shape,
        xform_a: &Transform2D,
        motion_a: Vector2,
        shape_b: &dyn Shape,
        xform_b: &Transform2D,
        motion_b: Vector2,
        callback: Option<&mut dyn FnMut(Vector2, Vector2)>,
        sep_axis: Option<&mut Vector2>,
        margin_a: f32,
        margin_b: f32,
    ) -> bool {
        let type_a = shape_a.shape_type();
        let type_b = shape_b.shape_type();
        let swap = type_a > type_b;
        let (first, second) = if swap { (type_b, type_a) } else { (type_a, type_b) };

        match first {
            ShapeType::Line => {
                if matches!(second, ShapeType::Line | ShapeType::Ray) {
                    return false;
                }
                if swap {
                    Self::solve_static_line(shape_b, xform_b, shape_a, xform_a, callback, true)
                } else {
                    Self::solve_static_line(shape_a, xform_a, shape_b, xform_b, callback, false)
                }
            }
            ShapeType::Ray => {
                if second == ShapeType::Ray {
                    return false;
                }
                if swap {
                    Self::solve_raycast(shape_b, motion_b, xform_b, shape_a, xform_a, callback, true, sep_axis)
                } else {
                    Self::solve_raycast(shape_a, motion_a, xform_a, shape_b, xform_b, callback, false, sep_axis)
                }
            }
            _ => sat_calculate_penetration(
                shape_a, xform_a, motion_a, shape_b, xform_b, motion_b, callback, false, sep_axis, margin_a, margin_b,
            ),
        }
    }

    /// Pushes the supports of `shape_b` out of the solid side of a line
    fn solve_static_line(
        line: &dyn Shape,
        xform_a: &Transform2D,
        shape_b: &dyn Shape,
        xform_b: &Transform2D,
        mut callback: Option<&mut dyn FnMut(Vector2, Vector2)>,
        swap: bool,
    ) -> bool {
        let line = match line.as_any().downcast_ref::<LineShape>() {
            Some(line) => line,
            None => return false,
        };

        let n = xform_a.basis_xform(line.get_normal()).normalize();
        let d = n.dot(&xform_a.xform(line.get_normal() * line.get_d()));

        let supports = world_supports(shape_b, xform_b, -n);

        let mut found = false;
        for &support in supports.points() {
            let pd = n.dot(&support);
            if pd >= d {
                continue;
            }
            found = true;

            let on_line = support - n * (pd - d);
            if let Some(callback) = callback.as_mut() {
                if swap {
                    callback(support, on_line);
                } else {
                    callback(on_line, support);
                }
            }
        }

        found
    }

    /// Casts a separation ray against `shape_b`
    #[allow(clippy::too_many_arguments)]
    fn solve_raycast(
        ray: &dyn Shape,
        motion_a: Vector2,
        xform_a: &Transform2D,
        shape_b: &dyn Shape,
        xform_b: &Transform2D,
        mut callback: Option<&mut dyn FnMut(Vector2, Vector2)>,
        swap: bool,
        sep_axis: Option<&mut Vector2>,
    ) -> bool {
        let ray = match ray.as_any().downcast_ref::<RayShape>() {
            Some(ray) => ray,
            None => return false,
        };

        let from = xform_a.origin;
        let mut to = from + xform_a.y * ray.get_length();
        if !motion_a.is_zero() {
            // Lengthen the ray by the part of the motion along it
            let direction = (to - from).normalize();
            to += direction * direction.dot(&motion_a).max(0.0);
        }
        let support_a = to;

        let inv_b = xform_b.affine_inverse();
        let (point, normal) = match shape_b.intersect_segment(inv_b.xform(from), inv_b.xform(to)) {
            Some(hit) => hit,
            None => {
                if let Some(sep_axis) = sep_axis {
                    *sep_axis = xform_a.y.normalize();
                }
                return false;
            }
        };

        let mut support_b = xform_b.xform(point);
        if ray.get_slips_on_slope() {
            let global_normal = inv_b.basis_xform_inv(normal).normalize();
            support_b = support_a + global_normal * (support_b - support_a).length();
        }

        if let Some(callback) = callback.as_mut() {
            if swap {
                callback(support_b, support_a);
            } else {
                callback(support_a, support_b);
            }
        }

        true
    }
}

/// Support points of `shape` at `xform` along the world direction `axis`
pub(crate) fn world_supports(shape: &dyn Shape, xform: &Transform2D, axis: Vector2) -> Support {
    shape
        .get_supports(xform.basis_xform_inv(axis).normalize())
        .map(|p| xform.xform(p))
}
