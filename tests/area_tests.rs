use planar_physics::{
    AreaHandle, AreaOverrideMode, BodyHandle, BodyMode, CollisionObjectId, Space, Transform2D, Vector2,
    core::AreaEventKind,
    shapes::{CircleShape, RectangleShape},
};
use approx::assert_relative_eq;
use std::sync::Arc;

const DT: f32 = 1.0 / 60.0;

fn add_area(space: &mut Space, half_extents: Vector2, position: Vector2) -> AreaHandle {
    let area = space.create_area();
    space.add_shape(area, Arc::new(RectangleShape::new(half_extents)), Transform2D::identity()).unwrap();
    space.area_set_transform(area, Transform2D::from_position(position)).unwrap();
    area
}

fn add_ball(space: &mut Space, position: Vector2) -> BodyHandle {
    let body = space.create_body(BodyMode::Rigid);
    space.add_shape(body, Arc::new(CircleShape::new(0.5)), Transform2D::identity()).unwrap();
    space.body_set_transform(body, Transform2D::from_position(position)).unwrap();
    body
}

#[test]
fn test_replace_area_overrides_gravity() {
    let mut space = Space::new();
    let area = add_area(&mut space, Vector2::new(10.0, 10.0), Vector2::zero());
    {
        let area = space.area_mut(area).unwrap();
        area.set_gravity(10.0);
        area.set_gravity_vector(Vector2::new(1.0, 0.0));
    }
    space.area_set_space_override_mode(area, AreaOverrideMode::Replace).unwrap();

    let body = add_ball(&mut space, Vector2::zero());
    space.update();

    // The first step registers the overlap, the second integrates with it
    space.step(DT, 8);
    assert_eq!(space.body(body).unwrap().get_areas(), vec![area]);
    space.step(DT, 8);

    let gravity = space.body(body).unwrap().get_gravity();
    assert_relative_eq!(gravity.x, 10.0);
    assert_relative_eq!(gravity.y, 0.0);
}

#[test]
fn test_area_priority_and_combine() {
    let mut space = Space::new();

    let high = add_area(&mut space, Vector2::new(10.0, 10.0), Vector2::zero());
    {
        let area = space.area_mut(high).unwrap();
        area.set_priority(1.0);
        area.set_gravity(10.0);
        area.set_gravity_vector(Vector2::new(1.0, 0.0));
    }
    space.area_set_space_override_mode(high, AreaOverrideMode::Replace).unwrap();

    let low = add_area(&mut space, Vector2::new(10.0, 10.0), Vector2::zero());
    {
        let area = space.area_mut(low).unwrap();
        area.set_priority(0.0);
        area.set_gravity(5.0);
        area.set_gravity_vector(Vector2::new(0.0, 1.0));
    }
    space.area_set_space_override_mode(low, AreaOverrideMode::Combine).unwrap();

    let body = add_ball(&mut space, Vector2::zero());
    space.update();
    space.step(DT, 8);
    space.step(DT, 8);

    // Replace at the highest priority hides everything below it
    let gravity = space.body(body).unwrap().get_gravity();
    assert_relative_eq!(gravity.x, 10.0);
    assert_relative_eq!(gravity.y, 0.0);

    // Combining at every level adds the default area too
    space.area_set_space_override_mode(high, AreaOverrideMode::Combine).unwrap();
    space.step(DT, 8);

    let gravity = space.body(body).unwrap().get_gravity();
    assert_relative_eq!(gravity.x, 10.0);
    assert_relative_eq!(gravity.y, 5.0 + 98.0);
}

#[test]
fn test_combine_replace_stops_lower_areas() {
    let mut space = Space::new();

    let high = add_area(&mut space, Vector2::new(10.0, 10.0), Vector2::zero());
    {
        let area = space.area_mut(high).unwrap();
        area.set_priority(2.0);
        area.set_gravity(1.0);
        area.set_gravity_vector(Vector2::new(1.0, 0.0));
    }
    space.area_set_space_override_mode(high, AreaOverrideMode::CombineReplace).unwrap();

    let low = add_area(&mut space, Vector2::new(10.0, 10.0), Vector2::zero());
    {
        let area = space.area_mut(low).unwrap();
        area.set_priority(1.0);
        area.set_gravity(3.0);
        area.set_gravity_vector(Vector2::new(0.0, 1.0));
    }
    space.area_set_space_override_mode(low, AreaOverrideMode::Combine).unwrap();

    let body = add_ball(&mut space, Vector2::zero());
    space.update();
    space.step(DT, 8);
    space.step(DT, 8);

    let gravity = space.body(body).unwrap().get_gravity();
    assert_relative_eq!(gravity.x, 1.0);
    assert_relative_eq!(gravity.y, 0.0);
}

#[test]
fn test_point_gravity_pulls_towards_center() {
    let mut space = Space::new();
    let area = add_area(&mut space, Vector2::new(20.0, 20.0), Vector2::new(10.0, 0.0));
    {
        let area = space.area_mut(area).unwrap();
        area.set_gravity(50.0);
        area.set_gravity_is_point(true);
        area.set_gravity_vector(Vector2::zero());
    }
    space.area_set_space_override_mode(area, AreaOverrideMode::Replace).unwrap();

    let body = add_ball(&mut space, Vector2::zero());
    space.update();
    space.step(DT, 8);
    space.step(DT, 8);

    let gravity = space.body(body).unwrap().get_gravity();
    assert!(gravity.x > 49.0);
    assert!(gravity.y.abs() < 1.0);
}

#[test]
fn test_disabled_area_only_monitors() {
    let mut space = Space::new();
    let area = add_area(&mut space, Vector2::new(10.0, 10.0), Vector2::zero());
    space.area_set_monitoring(area, true, false).unwrap();

    let body = add_ball(&mut space, Vector2::zero());
    space.update();
    space.step(DT, 8);

    // Not overriding, so gravity comes from the default area only
    assert!(space.body(body).unwrap().get_areas().is_empty());
    assert_eq!(space.drain_events().len(), 1);
}

#[test]
fn test_monitor_reports_enter_and_exit() {
    let mut space = Space::new();
    space.default_area_mut().set_gravity(0.0);

    let area = add_area(&mut space, Vector2::new(2.0, 2.0), Vector2::zero());
    space.area_set_monitoring(area, true, false).unwrap();

    let body = add_ball(&mut space, Vector2::new(0.5, 0.0));
    space.update();

    space.step(DT, 8);
    let events = space.drain_events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].area, area);
    assert_eq!(events[0].kind, AreaEventKind::Entered);
    assert_eq!(events[0].other, CollisionObjectId::Body(body));
    assert_eq!(events[0].other_shape, 0);
    assert_eq!(events[0].area_shape, 0);

    // Staying inside reports nothing new
    space.step(DT, 8);
    assert!(space.drain_events().is_empty());

    space.body_set_transform(body, Transform2D::from_position(Vector2::new(20.0, 0.0))).unwrap();
    space.step(DT, 8);
    let events = space.drain_events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].kind, AreaEventKind::Exited);
}

#[test]
fn test_removing_area_restores_gravity() {
    let mut space = Space::new();
    let area = add_area(&mut space, Vector2::new(10.0, 10.0), Vector2::zero());
    space.area_mut(area).unwrap().set_gravity(0.0);
    space.area_set_space_override_mode(area, AreaOverrideMode::Replace).unwrap();

    let body = add_ball(&mut space, Vector2::zero());
    space.update();
    space.step(DT, 8);
    space.step(DT, 8);
    assert!(space.body(body).unwrap().get_gravity().is_zero());

    space.remove_area(area).unwrap();
    assert!(space.body(body).unwrap().get_areas().is_empty());
    assert_eq!(space.constraint_count(), 0);

    space.step(DT, 8);
    assert_relative_eq!(space.body(body).unwrap().get_gravity().y, 98.0);
}

#[test]
fn test_area_monitors_other_areas() {
    let mut space = Space::new();
    let watcher = add_area(&mut space, Vector2::new(2.0, 2.0), Vector2::zero());
    space.area_set_monitoring(watcher, false, true).unwrap();

    let watched = add_area(&mut space, Vector2::new(1.0, 1.0), Vector2::new(1.0, 0.0));
    space.update();
    space.step(DT, 8);

    // Neither area is monitorable, so both stay static and never pair
    assert!(space.drain_events().is_empty());

    space.area_set_monitorable(watched, true).unwrap();
    space.step(DT, 8);
    space.step(DT, 8);

    let events = space.drain_events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].area, watcher);
    assert_eq!(events[0].kind, AreaEventKind::Entered);
    assert_eq!(events[0].other, CollisionObjectId::Area(watched));
}
