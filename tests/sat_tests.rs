use planar_physics::collision::CollisionSolver;
use planar_physics::math::{Transform2D, Vector2};
use planar_physics::shapes::*;
use approx::assert_relative_eq;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Arc;

/// Runs the solver without motion and gathers every contact pair
fn contacts(a: &dyn Shape, xa: &Transform2D, b: &dyn Shape, xb: &Transform2D) -> (bool, Vec<(Vector2, Vector2)>) {
    let mut found = Vec::new();
    let mut callback = |pa: Vector2, pb: Vector2| found.push((pa, pb));
    let collided = CollisionSolver::solve(a, xa, Vector2::zero(), b, xb, Vector2::zero(), Some(&mut callback), None, 0.0, 0.0);
    (collided, found)
}

#[test]
fn test_circle_circle_exact_depth() {
    let a = CircleShape::new(1.0);
    let b = CircleShape::new(1.0);
    let xa = Transform2D::identity();
    let xb = Transform2D::from_position(Vector2::new(1.5, 0.0));

    let (collided, found) = contacts(&a, &xa, &b, &xb);
    assert!(collided);
    assert_eq!(found.len(), 1);

    let (pa, pb) = found[0];
    // Each point lies on its own surface
    assert_relative_eq!(pa.x, 1.0, epsilon = 1e-5);
    assert_relative_eq!(pb.x, 0.5, epsilon = 1e-5);

    // depth = r1 + r2 - d, normal parallel to center_b - center_a
    let depth = (pa - pb).length();
    assert_relative_eq!(depth, 0.5, epsilon = 1e-5);
    let normal = (pa - pb).normalize();
    assert_relative_eq!(normal.dot(&(xb.origin - xa.origin).normalize()), 1.0, epsilon = 1e-5);
}

#[test]
fn test_circle_circle_diagonal() {
    let a = CircleShape::new(2.0);
    let b = CircleShape::new(1.0);
    let xa = Transform2D::from_position(Vector2::new(3.0, 4.0));
    let xb = Transform2D::from_position(Vector2::new(5.0, 5.5));

    let (collided, found) = contacts(&a, &xa, &b, &xb);
    assert!(collided);

    let (pa, pb) = found[0];
    let d = xa.origin.distance(&xb.origin);
    assert_relative_eq!((pa - pb).length(), 3.0 - d, epsilon = 1e-5);
    assert_relative_eq!(pa.distance(&xa.origin), 2.0, epsilon = 1e-5);
    assert_relative_eq!(pb.distance(&xb.origin), 1.0, epsilon = 1e-5);
}

#[test]
fn test_separated_pair_stores_axis() {
    let a = CircleShape::new(1.0);
    let b = RectangleShape::new(Vector2::new(1.0, 1.0));
    let xa = Transform2D::identity();
    let xb = Transform2D::from_position(Vector2::new(5.0, 0.0));

    let mut axis = Vector2::zero();
    let collided = CollisionSolver::solve(&a, &xa, Vector2::zero(), &b, &xb, Vector2::zero(), None, Some(&mut axis), 0.0, 0.0);
    assert!(!collided);
    assert!(!axis.is_zero());

    // The stored axis still separates the pair on the next test
    let collided = CollisionSolver::solve(&a, &xa, Vector2::zero(), &b, &xb, Vector2::zero(), None, Some(&mut axis), 0.0, 0.0);
    assert!(!collided);
}

#[test]
fn test_box_box_face_contacts() {
    let a = RectangleShape::new(Vector2::new(1.0, 1.0));
    let b = RectangleShape::new(Vector2::new(1.0, 1.0));
    let xa = Transform2D::identity();
    let xb = Transform2D::from_position(Vector2::new(1.5, 0.5));

    let (collided, found) = contacts(&a, &xa, &b, &xb);
    assert!(collided);
    assert_eq!(found.len(), 2);
    for (pa, pb) in found {
        assert_relative_eq!(pa.x, 1.0, epsilon = 1e-5);
        assert_relative_eq!(pb.x, 0.5, epsilon = 1e-5);
    }
}

#[test]
fn test_swapped_order_keeps_roles() {
    // Rectangle sorts after circle, so the solver swaps internally
    let circle = CircleShape::new(1.0);
    let rect = RectangleShape::new(Vector2::new(1.0, 1.0));
    let xr = Transform2D::identity();
    let xc = Transform2D::from_position(Vector2::new(1.5, 0.0));

    let (collided, found) = contacts(&rect, &xr, &circle, &xc);
    assert!(collided);
    let (p_rect, p_circle) = found[0];
    assert_relative_eq!(p_rect.x, 1.0, epsilon = 1e-5);
    assert_relative_eq!(p_circle.x, 0.5, epsilon = 1e-5);
}

#[test]
fn test_margin_extends_contact() {
    let a = CircleShape::new(1.0);
    let b = CircleShape::new(1.0);
    let xa = Transform2D::identity();
    let xb = Transform2D::from_position(Vector2::new(2.1, 0.0));

    let (collided, _) = contacts(&a, &xa, &b, &xb);
    assert!(!collided);

    let collided = CollisionSolver::solve(&a, &xa, Vector2::zero(), &b, &xb, Vector2::zero(), None, None, 0.1, 0.1);
    assert!(collided);
}

#[test]
fn test_motion_sweeps_the_shape() {
    let a = CircleShape::new(1.0);
    let b = RectangleShape::new(Vector2::new(1.0, 1.0));
    let xa = Transform2D::identity();
    let xb = Transform2D::from_position(Vector2::new(10.0, 0.0));

    let (collided, _) = contacts(&a, &xa, &b, &xb);
    assert!(!collided);

    let motion = Vector2::new(12.0, 0.0);
    let collided = CollisionSolver::solve(&a, &xa, motion, &b, &xb, Vector2::zero(), None, None, 0.0, 0.0);
    assert!(collided);
}

#[test]
fn test_line_pushes_supports() {
    let line = LineShape::new(Vector2::new(0.0, 1.0), 0.0);
    let circle = CircleShape::new(1.0);
    let xl = Transform2D::identity();
    let xc = Transform2D::from_position(Vector2::new(3.0, 0.5));

    let (collided, found) = contacts(&line, &xl, &circle, &xc);
    assert!(collided);
    let (on_line, support) = found[0];
    assert_relative_eq!(on_line.y, 0.0, epsilon = 1e-5);
    assert_relative_eq!(support.y, -0.5, epsilon = 1e-5);
    assert_relative_eq!(support.x, 3.0, epsilon = 1e-5);

    // Line against line never collides
    let (collided, _) = contacts(&line, &xl, &line, &xl);
    assert!(!collided);

    let above = Transform2D::from_position(Vector2::new(0.0, 1.5));
    let (collided, _) = contacts(&line, &xl, &circle, &above);
    assert!(!collided);
}

#[test]
fn test_ray_separation() {
    let ray = RayShape::new(3.0, false);
    let rect = RectangleShape::new(Vector2::new(1.0, 0.5));
    let xr = Transform2D::identity();
    let xb = Transform2D::from_position(Vector2::new(0.0, 2.0));

    let (collided, found) = contacts(&ray, &xr, &rect, &xb);
    assert!(collided);
    let (tip, hit) = found[0];
    assert_relative_eq!(tip.y, 3.0, epsilon = 1e-5);
    assert_relative_eq!(hit.y, 1.5, epsilon = 1e-5);

    let far = Transform2D::from_position(Vector2::new(5.0, 2.0));
    let (collided, _) = contacts(&ray, &xr, &rect, &far);
    assert!(!collided);
}

#[test]
fn test_segment_pairs() {
    let s1 = SegmentShape::new(Vector2::new(-1.0, 0.0), Vector2::new(1.0, 0.0));
    let s2 = SegmentShape::new(Vector2::new(0.0, -1.0), Vector2::new(0.0, 1.0));
    let identity = Transform2D::identity();

    let (collided, _) = contacts(&s1, &identity, &s2, &identity);
    assert!(collided);

    let apart = Transform2D::from_position(Vector2::new(3.0, 0.0));
    let (collided, _) = contacts(&s1, &identity, &s2, &apart);
    assert!(!collided);

    let circle = CircleShape::new(0.5);
    let (collided, _) = contacts(&s1, &identity, &circle, &Transform2D::from_position(Vector2::new(0.5, 0.25)));
    assert!(collided);
    let (collided, _) = contacts(&s1, &identity, &circle, &Transform2D::from_position(Vector2::new(0.5, 0.75)));
    assert!(!collided);
}

fn bounding_radius(shape: &dyn Shape) -> f32 {
    let bounds = shape.get_local_bounds();
    bounds.min.length().max(bounds.max.length())
}

#[test]
fn test_no_false_positives_on_separated_shapes() {
    let mut rng = StdRng::seed_from_u64(7);

    let shapes: Vec<Arc<dyn Shape>> = vec![
        Arc::new(CircleShape::new(0.75)),
        Arc::new(RectangleShape::new(Vector2::new(1.0, 0.4))),
        Arc::new(CapsuleShape::new(0.3, 1.2)),
        Arc::new(SegmentShape::new(Vector2::new(-0.8, 0.1), Vector2::new(0.9, -0.3))),
        Arc::new(ConvexPolygonShape::new(vec![
            Vector2::new(-0.5, -0.5),
            Vector2::new(0.7, -0.4),
            Vector2::new(0.2, 0.8),
        ])),
    ];

    for _ in 0..500 {
        let a = &shapes[rng.gen_range(0..shapes.len())];
        let b = &shapes[rng.gen_range(0..shapes.len())];

        let xa = Transform2D::from_rotation_translation(
            rng.gen_range(-3.14..3.14),
            Vector2::new(rng.gen_range(-10.0..10.0), rng.gen_range(-10.0..10.0)),
        );

        // Place B strictly outside the bounding circles
        let direction = Vector2::new(1.0, 0.0).rotated(rng.gen_range(-3.14..3.14));
        let gap = bounding_radius(a.as_ref()) + bounding_radius(b.as_ref()) + rng.gen_range(0.01..2.0);
        let xb = Transform2D::from_rotation_translation(rng.gen_range(-3.14..3.14), xa.origin + direction * gap);

        let (collided, found) = contacts(a.as_ref(), &xa, b.as_ref(), &xb);
        assert!(!collided, "{:?} at {:?} vs {:?} at {:?}", a, xa, b, xb);
        assert!(found.is_empty());
    }
}

#[test]
fn test_overlapping_shapes_always_collide() {
    let mut rng = StdRng::seed_from_u64(11);
    let a = RectangleShape::new(Vector2::new(1.0, 1.0));
    let b = CircleShape::new(0.5);

    for _ in 0..200 {
        let xa = Transform2D::from_rotation_translation(rng.gen_range(-3.14..3.14), Vector2::zero());
        // Centre of B inside A's inscribed circle
        let offset = Vector2::new(rng.gen_range(-0.7..0.7), rng.gen_range(-0.7..0.7));
        let xb = Transform2D::from_position(offset);

        let (collided, found) = contacts(&a, &xa, &b, &xb);
        assert!(collided);
        assert!(!found.is_empty());
    }
}
