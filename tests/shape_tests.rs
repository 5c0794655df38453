use planar_physics::math::{Transform2D, Vector2};
use planar_physics::shapes::*;
use approx::assert_relative_eq;
use std::f32::consts::FRAC_PI_2;

#[test]
fn test_circle_shape() {
    let circle = CircleShape::new(2.0);
    assert_eq!(circle.shape_type(), ShapeType::Circle);
    assert_eq!(circle.get_radius(), 2.0);

    let bounds = circle.get_local_bounds();
    assert_eq!(bounds.min, Vector2::new(-2.0, -2.0));
    assert_eq!(bounds.max, Vector2::new(2.0, 2.0));

    assert!(circle.contains_point(Vector2::new(1.0, 1.0)));
    assert!(!circle.contains_point(Vector2::new(2.0, 1.0)));

    // Support is a single vertex on the rim
    assert_eq!(circle.get_supports(Vector2::unit_x()), Support::Vertex(Vector2::new(2.0, 0.0)));

    let (min, max) = circle.project_range(Vector2::unit_x(), &Transform2D::from_position(Vector2::new(5.0, 0.0)));
    assert_relative_eq!(min, 3.0);
    assert_relative_eq!(max, 7.0);

    // Disk inertia: m r^2 / 2
    assert_relative_eq!(circle.get_moment_of_inertia(1.0, Vector2::new(1.0, 1.0)), 2.0);
}

#[test]
fn test_circle_segment_hit() {
    let circle = CircleShape::new(1.0);
    let (point, normal) = circle
        .intersect_segment(Vector2::new(-5.0, 0.0), Vector2::new(5.0, 0.0))
        .expect("segment crosses the circle");
    assert_relative_eq!(point.x, -1.0, epsilon = 1e-5);
    assert_relative_eq!(normal.x, -1.0, epsilon = 1e-5);

    assert!(circle.intersect_segment(Vector2::new(-5.0, 2.0), Vector2::new(5.0, 2.0)).is_none());
}

#[test]
fn test_rectangle_shape() {
    let rect = RectangleShape::new(Vector2::new(2.0, 1.0));
    assert_eq!(rect.shape_type(), ShapeType::Rectangle);

    // Face aligned directions return the whole edge
    match rect.get_supports(Vector2::unit_y()) {
        Support::Edge([a, b]) => {
            assert_relative_eq!(a.y, 1.0);
            assert_relative_eq!(b.y, 1.0);
            assert_relative_eq!((a.x - b.x).abs(), 4.0);
        }
        other => panic!("expected an edge, got {:?}", other),
    }

    // Diagonals return a corner
    let diagonal = Vector2::new(1.0, 1.0).normalize();
    assert_eq!(rect.get_supports(diagonal), Support::Vertex(Vector2::new(2.0, 1.0)));

    // Rotating a quarter turn swaps the projected extents
    let xform = Transform2D::from_rotation_translation(FRAC_PI_2, Vector2::zero());
    let (min, max) = rect.project_range(Vector2::unit_x(), &xform);
    assert_relative_eq!(min, -1.0, epsilon = 1e-5);
    assert_relative_eq!(max, 1.0, epsilon = 1e-5);

    assert!(rect.contains_point(Vector2::new(1.5, 0.5)));
    assert!(!rect.contains_point(Vector2::new(1.5, 1.5)));

    // Box inertia: m (w^2 + h^2) / 12
    assert_relative_eq!(rect.get_moment_of_inertia(12.0, Vector2::new(1.0, 1.0)), 16.0 + 4.0);
}

#[test]
fn test_capsule_shape() {
    let capsule = CapsuleShape::new(1.0, 4.0);
    assert_eq!(capsule.shape_type(), ShapeType::Capsule);

    let bounds = capsule.get_local_bounds();
    assert_relative_eq!(bounds.max.x, 1.0);
    assert_relative_eq!(bounds.max.y, 3.0);

    // Tip of the upper cap
    match capsule.get_supports(Vector2::unit_y()) {
        Support::Vertex(p) => {
            assert_relative_eq!(p.x, 0.0);
            assert_relative_eq!(p.y, 3.0);
        }
        other => panic!("expected a vertex, got {:?}", other),
    }

    // Flat side
    assert_eq!(capsule.get_supports(Vector2::unit_x()).count(), 2);

    assert!(capsule.contains_point(Vector2::new(0.0, 2.5)));
    assert!(capsule.contains_point(Vector2::new(0.9, 0.0)));
    assert!(!capsule.contains_point(Vector2::new(0.9, 2.9)));
}

#[test]
fn test_segment_shape() {
    let segment = SegmentShape::new(Vector2::new(-1.0, 0.0), Vector2::new(1.0, 0.0));
    assert_eq!(segment.shape_type(), ShapeType::Segment);

    // Segments have no inside
    assert!(!segment.contains_point(Vector2::zero()));

    let (point, normal) = segment
        .intersect_segment(Vector2::new(0.5, 2.0), Vector2::new(0.5, -2.0))
        .expect("crossing segments");
    assert_relative_eq!(point.x, 0.5, epsilon = 1e-5);
    assert_relative_eq!(point.y, 0.0, epsilon = 1e-5);
    // Normal faces the incoming segment
    assert!(normal.y > 0.0);

    assert_eq!(segment.get_supports(Vector2::unit_y()).count(), 2);
}

#[test]
fn test_convex_polygon_shape() {
    let triangle = ConvexPolygonShape::new(vec![
        Vector2::new(0.0, 0.0),
        Vector2::new(2.0, 0.0),
        Vector2::new(0.0, 2.0),
    ]);
    assert_eq!(triangle.shape_type(), ShapeType::ConvexPolygon);
    assert_eq!(triangle.get_point_count(), 3);

    // Normals point outwards whatever the winding
    let normal = triangle.get_segment_normal(0);
    assert_relative_eq!(normal.y, -1.0, epsilon = 1e-5);

    assert!(triangle.contains_point(Vector2::new(0.5, 0.5)));
    assert!(!triangle.contains_point(Vector2::new(1.5, 1.5)));

    assert_eq!(triangle.get_supports(Vector2::new(0.0, -1.0)).count(), 2);
    assert_eq!(triangle.get_supports(Vector2::new(1.0, 0.2).normalize()), Support::Vertex(Vector2::new(2.0, 0.0)));

    let (point, normal) = triangle
        .intersect_segment(Vector2::new(0.5, -3.0), Vector2::new(0.5, 3.0))
        .expect("ray through the base");
    assert_relative_eq!(point.y, 0.0, epsilon = 1e-5);
    assert_relative_eq!(normal.y, -1.0, epsilon = 1e-5);

    let reversed = ConvexPolygonShape::new(vec![
        Vector2::new(0.0, 2.0),
        Vector2::new(2.0, 0.0),
        Vector2::new(0.0, 0.0),
    ]);
    assert!(reversed.contains_point(Vector2::new(0.5, 0.5)));
}

#[test]
fn test_line_and_ray_shapes() {
    let line = LineShape::new(Vector2::new(0.0, 2.0), 1.0);
    assert_eq!(line.shape_type(), ShapeType::Line);
    assert_eq!(line.get_normal(), Vector2::new(0.0, 1.0));

    // Solid below the line
    assert!(line.contains_point(Vector2::new(100.0, 0.0)));
    assert!(!line.contains_point(Vector2::new(100.0, 2.0)));

    let ray = RayShape::new(3.0, false);
    assert_eq!(ray.shape_type(), ShapeType::Ray);
    assert_eq!(ray.get_length(), 3.0);
    assert_relative_eq!(ray.get_local_bounds().max.y, 3.0);
}

#[test]
fn test_shape_ordering() {
    // Pairs are dispatched with the lower tag first
    assert!(ShapeType::Line < ShapeType::Circle);
    assert!(ShapeType::Rectangle < ShapeType::ConvexPolygon);
}
