use planar_physics::math::{Aabb, Transform2D, Vector2};
use std::f32::consts::{FRAC_PI_2, PI};
use approx::assert_relative_eq;

#[test]
fn test_vector2_operations() {
    let v1 = Vector2::new(1.0, 2.0);
    let v2 = Vector2::new(3.0, -4.0);

    let sum = v1 + v2;
    assert_eq!(sum, Vector2::new(4.0, -2.0));

    let diff = v2 - v1;
    assert_eq!(diff, Vector2::new(2.0, -6.0));

    assert_eq!(v1 * 2.0, Vector2::new(2.0, 4.0));
    assert_eq!(v1.dot(&v2), 3.0 - 8.0);

    // 2D cross product is a scalar
    assert_eq!(v1.cross(&v2), 1.0 * -4.0 - 2.0 * 3.0);

    assert_relative_eq!(v2.length(), 5.0);
    let n = v2.normalize();
    assert_relative_eq!(n.length(), 1.0);
    assert_relative_eq!(n.x, 0.6);
    assert_relative_eq!(n.y, -0.8);

    // Zero stays zero
    assert!(Vector2::zero().normalize().is_zero());
}

#[test]
fn test_vector2_tangent_and_plane_project() {
    let n = Vector2::new(0.0, 1.0);
    assert_eq!(n.tangent(), Vector2::new(1.0, 0.0));

    // Project onto the line y = 2 along its normal
    let projected = n.plane_project(2.0, Vector2::new(3.0, 7.0));
    assert_relative_eq!(projected.x, 3.0);
    assert_relative_eq!(projected.y, 2.0);
}

#[test]
fn test_transform_xform_roundtrip() {
    let xform = Transform2D::from_rotation_translation(FRAC_PI_2, Vector2::new(10.0, 5.0));
    let p = Vector2::new(1.0, 0.0);

    let world = xform.xform(p);
    assert_relative_eq!(world.x, 10.0, epsilon = 1e-5);
    assert_relative_eq!(world.y, 6.0, epsilon = 1e-5);

    let back = xform.xform_inv(world);
    assert_relative_eq!(back.x, p.x, epsilon = 1e-5);
    assert_relative_eq!(back.y, p.y, epsilon = 1e-5);

    let inv = xform.affine_inverse();
    let back = inv.xform(world);
    assert_relative_eq!(back.x, p.x, epsilon = 1e-5);
    assert_relative_eq!(back.y, p.y, epsilon = 1e-5);

    assert_relative_eq!(xform.rotation(), FRAC_PI_2, epsilon = 1e-6);
}

#[test]
fn test_transform_compose_and_translation() {
    let a = Transform2D::from_rotation_translation(PI, Vector2::new(1.0, 0.0));
    let b = Transform2D::from_position(Vector2::new(2.0, 0.0));

    // a * b applies b first
    let p = (a * b).xform(Vector2::zero());
    assert_relative_eq!(p.x, -1.0, epsilon = 1e-5);
    assert_relative_eq!(p.y, 0.0, epsilon = 1e-5);

    let t = a.translated(Vector2::new(0.0, 3.0));
    assert_relative_eq!(t.origin.y, 3.0);
    assert_eq!(a.untranslated().origin, Vector2::zero());
    assert_relative_eq!(a.untranslated().rotation(), a.rotation());
}

#[test]
fn test_basis_xform_inv_with_scale() {
    let mut xform = Transform2D::identity();
    xform.x = Vector2::new(2.0, 0.0);
    xform.y = Vector2::new(0.0, 4.0);

    let v = xform.basis_xform(Vector2::new(1.0, 1.0));
    assert_eq!(v, Vector2::new(2.0, 4.0));

    let s = xform.scale();
    assert_relative_eq!(s.x, 2.0);
    assert_relative_eq!(s.y, 4.0);
}

#[test]
fn test_aabb_operations() {
    let a = Aabb::new(Vector2::new(0.0, 0.0), Vector2::new(2.0, 2.0));
    let b = Aabb::new(Vector2::new(1.0, 1.0), Vector2::new(3.0, 4.0));
    let c = Aabb::new(Vector2::new(5.0, 5.0), Vector2::new(6.0, 6.0));

    assert!(a.intersects(&b));
    assert!(!a.intersects(&c));

    let merged = a.merge(&c);
    assert_eq!(merged.min, Vector2::new(0.0, 0.0));
    assert_eq!(merged.max, Vector2::new(6.0, 6.0));

    assert_relative_eq!(a.area(), 4.0);
    assert!(a.contains_point(Vector2::new(1.0, 1.5)));
    assert!(!a.contains_point(Vector2::new(2.5, 1.0)));

    let grown = a.grow(1.0);
    assert_eq!(grown.min, Vector2::new(-1.0, -1.0));
    assert_eq!(grown.max, Vector2::new(3.0, 3.0));

    let rotated = a.transformed(&Transform2D::from_rotation_translation(FRAC_PI_2, Vector2::zero()));
    assert_relative_eq!(rotated.min.x, -2.0, epsilon = 1e-5);
    assert_relative_eq!(rotated.max.y, 2.0, epsilon = 1e-5);
}

#[test]
fn test_aabb_segment_intersection() {
    let aabb = Aabb::new(Vector2::new(-1.0, -1.0), Vector2::new(1.0, 1.0));

    let (point, normal) = aabb
        .intersects_segment(Vector2::new(-5.0, 0.0), Vector2::new(5.0, 0.0))
        .expect("segment crosses the box");
    assert_relative_eq!(point.x, -1.0, epsilon = 1e-5);
    assert_eq!(normal, Vector2::new(-1.0, 0.0));

    assert!(aabb.intersects_segment(Vector2::new(-5.0, 3.0), Vector2::new(5.0, 3.0)).is_none());
}
