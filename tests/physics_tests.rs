use planar_physics::{
    BodyHandle, BodyMode, BodyParameter, CcdMode, Material, Space, Transform2D, Vector2,
    constraints::PairState,
    shapes::{CircleShape, RectangleShape},
};
use approx::assert_relative_eq;
use std::sync::Arc;

const DT: f32 = 1.0 / 60.0;

fn add_circle(space: &mut Space, mode: BodyMode, radius: f32, position: Vector2) -> BodyHandle {
    let body = space.create_body(mode);
    space.add_shape(body, Arc::new(CircleShape::new(radius)), Transform2D::identity()).unwrap();
    space.body_set_transform(body, Transform2D::from_position(position)).unwrap();
    body
}

fn add_box(space: &mut Space, mode: BodyMode, half_extents: Vector2, position: Vector2) -> BodyHandle {
    let body = space.create_body(mode);
    space.add_shape(body, Arc::new(RectangleShape::new(half_extents)), Transform2D::identity()).unwrap();
    space.body_set_transform(body, Transform2D::from_position(position)).unwrap();
    body
}

fn zero_gravity_space() -> Space {
    let mut space = Space::new();
    space.default_area_mut().set_gravity(0.0);
    space
}

#[test]
fn test_free_fall() {
    let mut space = Space::new();
    let body = add_circle(&mut space, BodyMode::Rigid, 1.0, Vector2::zero());
    space.body_mut(body).unwrap().set_param(BodyParameter::LinearDamp, 0.0).unwrap();

    let mut expected_position = 0.0;
    let mut expected_velocity = 0.0;

    for _ in 0..60 {
        space.step(DT, 8);

        // Forces first, then positions
        expected_velocity += 98.0 * DT;
        expected_position += expected_velocity * DT;

        let body = space.body(body).unwrap();
        assert_relative_eq!(body.get_linear_velocity().y, expected_velocity, epsilon = 1e-3);
        assert_relative_eq!(body.get_transform().origin.y, expected_position, epsilon = 1e-3);
    }

    assert_eq!(space.get_step_count(), 60);
    assert_relative_eq!(space.get_last_step(), DT);
}

#[test]
fn test_non_positive_delta_is_ignored() {
    let mut space = Space::new();
    let body = add_circle(&mut space, BodyMode::Rigid, 1.0, Vector2::zero());

    space.step(0.0, 8);
    space.step(-1.0, 8);

    assert_eq!(space.get_step_count(), 0);
    assert!(space.body(body).unwrap().get_linear_velocity().is_zero());
}

#[test]
fn test_invalid_parameters_are_rejected() {
    let mut space = Space::new();
    let body = space.create_body(BodyMode::Rigid);

    assert!(space.body_mut(body).unwrap().set_param(BodyParameter::Mass, 0.0).is_err());
    assert!(space.body_mut(body).unwrap().set_param(BodyParameter::Mass, f32::NAN).is_err());
    assert!(space.body_mut(body).unwrap().set_param(BodyParameter::Mass, 2.0).is_ok());
    assert_eq!(space.body(body).unwrap().get_mass(), 2.0);

    assert!(space.set_param(planar_physics::SpaceParameter::BodyTimeToSleep, -1.0).is_err());
}

#[test]
fn test_box_rests_on_ground() {
    let mut space = Space::new();
    let ground = add_box(&mut space, BodyMode::Static, Vector2::new(50.0, 1.0), Vector2::new(0.0, 10.0));
    let crate_body = add_box(&mut space, BodyMode::Rigid, Vector2::new(1.0, 1.0), Vector2::new(0.0, 5.0));

    for _ in 0..180 {
        space.step(DT, 8);
    }

    // Top of the ground is at y = 9, so the box centre settles near y = 8
    let y = space.body(crate_body).unwrap().get_transform().origin.y;
    assert!((y - 8.0).abs() < 0.35, "box settled at {}", y);

    let pair = space.body_pair(crate_body, ground).unwrap();
    assert_eq!(pair.get_state(), PairState::Colliding);
}

#[test]
fn test_warm_start_carries_impulses() {
    let mut space = Space::new();
    let ground = add_box(&mut space, BodyMode::Static, Vector2::new(50.0, 1.0), Vector2::new(0.0, 10.0));
    // Slightly sunk into the ground so the pair exists from the start
    let crate_body = add_box(&mut space, BodyMode::Rigid, Vector2::new(1.0, 1.0), Vector2::new(0.0, 8.01));
    space.update();

    space.step(DT, 8);
    let first: f32 = space
        .body_pair(crate_body, ground)
        .unwrap()
        .get_contacts()
        .iter()
        .map(|c| c.acc_normal_impulse)
        .sum();
    assert!(first > 0.0);

    space.step(DT, 8);
    let pair = space.body_pair(crate_body, ground).unwrap();
    assert_eq!(pair.get_contacts().len(), 2);
    let second: f32 = pair.get_contacts().iter().map(|c| c.acc_normal_impulse).sum();

    // Resting contact: the impulse needed to cancel one step of gravity
    assert!(second >= first * 0.9, "first {} second {}", first, second);
    assert_relative_eq!(second, 98.0 * DT, epsilon = 0.2);
}

#[test]
fn test_elastic_collision_swaps_velocities() {
    let mut space = zero_gravity_space();
    let a = add_circle(&mut space, BodyMode::Rigid, 1.0, Vector2::new(0.0, 0.0));
    let b = add_circle(&mut space, BodyMode::Rigid, 1.0, Vector2::new(2.5, 0.0));

    for (handle, velocity) in [(a, 10.0), (b, -10.0)] {
        let body = space.body_mut(handle).unwrap();
        body.set_param(BodyParameter::LinearDamp, 0.0).unwrap();
        body.set_material(Material::new(0.0, 1.0));
        body.set_linear_velocity(Vector2::new(velocity, 0.0));
    }

    for _ in 0..20 {
        space.step(DT, 16);
    }

    let va = space.body(a).unwrap().get_linear_velocity();
    let vb = space.body(b).unwrap().get_linear_velocity();
    assert_relative_eq!(va.x, -10.0, epsilon = 1e-3);
    assert_relative_eq!(vb.x, 10.0, epsilon = 1e-3);

    // Momentum is conserved
    assert_relative_eq!(va.x + vb.x, 0.0, epsilon = 1e-3);

    // Position correction never leaks into the next step
    space.step(DT, 16);
    for handle in [a, b] {
        let body = space.body(handle).unwrap();
        assert!(body.get_biased_linear_velocity().is_zero());
        assert_relative_eq!(body.get_linear_velocity().x.abs(), 10.0, epsilon = 1e-3);
    }
}

#[test]
fn test_moving_body_wakes_sleeper() {
    let mut space = zero_gravity_space();
    let mover = add_circle(&mut space, BodyMode::Rigid, 1.0, Vector2::new(0.0, 0.0));
    let sleeper = add_circle(&mut space, BodyMode::Rigid, 1.0, Vector2::new(3.0, 0.0));

    for handle in [mover, sleeper] {
        space.body_mut(handle).unwrap().set_param(BodyParameter::LinearDamp, 0.0).unwrap();
    }
    space.body_mut(mover).unwrap().set_linear_velocity(Vector2::new(90.0, 0.0));
    space.body_direct_state(sleeper).unwrap().set_sleep_state(true);
    space.update();
    assert!(space.body(sleeper).unwrap().is_sleeping());

    // Out of reach: the mover advances one and a half units per step
    space.step(DT, 8);
    assert!(space.body(sleeper).unwrap().is_sleeping());

    // Now paired with the mover, so the island flood fill wakes it
    space.step(DT, 8);
    assert!(space.body(sleeper).unwrap().is_active());

    space.step(DT, 8);
    let sleeper_body = space.body(sleeper).unwrap();
    assert!(sleeper_body.is_active());
    assert!(sleeper_body.get_linear_velocity().x > 1.0, "{:?}", sleeper_body.get_linear_velocity());
    assert!(space.body(mover).unwrap().get_linear_velocity().x < 90.0);
}

#[test]
fn test_inelastic_collision_stops_bodies() {
    let mut space = zero_gravity_space();
    let a = add_circle(&mut space, BodyMode::Rigid, 1.0, Vector2::new(0.0, 0.0));
    let b = add_circle(&mut space, BodyMode::Rigid, 1.0, Vector2::new(2.5, 0.0));

    for (handle, velocity) in [(a, 10.0), (b, -10.0)] {
        let body = space.body_mut(handle).unwrap();
        body.set_param(BodyParameter::LinearDamp, 0.0).unwrap();
        body.set_material(Material::frictionless());
        body.set_linear_velocity(Vector2::new(velocity, 0.0));
    }

    for _ in 0..20 {
        space.step(DT, 16);
    }

    let va = space.body(a).unwrap().get_linear_velocity();
    let vb = space.body(b).unwrap().get_linear_velocity();
    assert!(va.x.abs() < 1.0);
    assert!(vb.x.abs() < 1.0);
}

#[test]
fn test_islands_split_on_contacts() {
    let mut space = zero_gravity_space();
    let a = add_circle(&mut space, BodyMode::Rigid, 1.0, Vector2::new(0.0, 0.0));
    let b = add_circle(&mut space, BodyMode::Rigid, 1.0, Vector2::new(1.9, 0.0));
    let c = add_circle(&mut space, BodyMode::Rigid, 1.0, Vector2::new(3.8, 0.0));
    let d = add_circle(&mut space, BodyMode::Rigid, 1.0, Vector2::new(20.0, 0.0));
    space.update();

    space.step(DT, 8);

    let islands = space.islands();
    assert_eq!(islands.len(), 2);

    let chain = islands.iter().find(|island| island.contains_body(a)).unwrap();
    assert!(chain.contains_body(b));
    assert!(chain.contains_body(c));
    assert!(!chain.contains_body(d));
    assert_eq!(chain.body_count(), 3);

    let alone = islands.iter().find(|island| island.contains_body(d)).unwrap();
    assert_eq!(alone.body_count(), 1);
}

#[test]
fn test_static_body_does_not_merge_islands() {
    let mut space = Space::new();
    let ground = add_box(&mut space, BodyMode::Static, Vector2::new(50.0, 1.0), Vector2::new(0.0, 10.0));
    let left = add_box(&mut space, BodyMode::Rigid, Vector2::new(1.0, 1.0), Vector2::new(-5.0, 8.01));
    let right = add_box(&mut space, BodyMode::Rigid, Vector2::new(1.0, 1.0), Vector2::new(5.0, 8.01));
    space.update();

    space.step(DT, 8);

    let islands = space.islands();
    assert_eq!(islands.len(), 2);
    for island in islands {
        assert!(!island.contains_body(ground));
        assert!(island.contains_body(left) != island.contains_body(right));
        assert!(island.constraint_count() >= 1);
    }
}

#[test]
fn test_body_falls_asleep() {
    let mut space = zero_gravity_space();
    let body = add_circle(&mut space, BodyMode::Rigid, 1.0, Vector2::zero());

    // Sleep needs more than 0.5 s below the thresholds
    for _ in 0..4 {
        space.step(0.125, 8);
    }
    assert!(space.body(body).unwrap().is_active());
    assert_relative_eq!(space.body(body).unwrap().get_still_time(), 0.5);

    space.step(0.125, 8);
    assert!(space.body(body).unwrap().is_sleeping());

    space.body_mut(body).unwrap().wakeup();
    assert!(space.body(body).unwrap().is_active());
    assert_eq!(space.body(body).unwrap().get_still_time(), 0.0);
}

#[test]
fn test_can_sleep_flag_keeps_body_awake() {
    let mut space = zero_gravity_space();
    let body = add_circle(&mut space, BodyMode::Rigid, 1.0, Vector2::zero());
    space.body_mut(body).unwrap().set_can_sleep(false);

    for _ in 0..20 {
        space.step(0.125, 8);
    }
    assert!(space.body(body).unwrap().is_active());
}

#[test]
fn test_moving_static_body_wakes_neighbours() {
    let mut space = zero_gravity_space();
    let ground = add_box(&mut space, BodyMode::Static, Vector2::new(50.0, 1.0), Vector2::new(0.0, 10.0));
    let resting = add_box(&mut space, BodyMode::Rigid, Vector2::new(1.0, 1.0), Vector2::new(0.0, 8.01));
    space.update();

    for _ in 0..6 {
        space.step(0.125, 8);
    }
    assert!(space.body(resting).unwrap().is_sleeping());

    space
        .body_set_transform(ground, Transform2D::from_position(Vector2::new(0.0, 10.5)))
        .unwrap();
    assert!(space.body(resting).unwrap().is_active());
}

#[test]
fn test_kinematic_velocity_from_transform() {
    let mut space = Space::new();
    let body = space.create_body(BodyMode::Kinematic);

    // The first transform after entering kinematic mode is applied immediately
    space.body_set_transform(body, Transform2D::from_position(Vector2::new(1.0, 2.0))).unwrap();
    assert_eq!(space.body(body).unwrap().get_transform().origin, Vector2::new(1.0, 2.0));

    space.body_set_transform(body, Transform2D::from_position(Vector2::new(6.0, 2.0))).unwrap();
    // Later ones wait for the step
    assert_eq!(space.body(body).unwrap().get_transform().origin, Vector2::new(1.0, 2.0));

    space.step(0.1, 8);

    let body_ref = space.body(body).unwrap();
    assert_relative_eq!(body_ref.get_linear_velocity().x, 50.0, epsilon = 1e-3);
    assert_relative_eq!(body_ref.get_linear_velocity().y, 0.0, epsilon = 1e-3);
    assert_relative_eq!(body_ref.get_transform().origin.x, 6.0, epsilon = 1e-5);

    // Without a new target the body stops and deactivates
    space.step(0.1, 8);
    let body_ref = space.body(body).unwrap();
    assert!(body_ref.get_linear_velocity().is_zero());
    assert!(!body_ref.is_active());
}

#[test]
fn test_kinematic_pushes_rigid_body() {
    let mut space = zero_gravity_space();
    let pusher = add_box(&mut space, BodyMode::Kinematic, Vector2::new(1.0, 1.0), Vector2::new(0.0, 0.0));
    let pushed = add_circle(&mut space, BodyMode::Rigid, 1.0, Vector2::new(2.2, 0.0));
    space.update();

    for i in 1..=30 {
        let x = i as f32 * 0.1;
        space.body_set_transform(pusher, Transform2D::from_position(Vector2::new(x, 0.0))).unwrap();
        space.step(DT, 8);
    }

    // The circle ends up in front of the box
    let x = space.body(pushed).unwrap().get_transform().origin.x;
    assert!(x > 3.0 + 1.5, "pushed body at {}", x);
}

#[test]
fn test_one_way_platform() {
    let mut space = Space::new();
    let platform = add_box(&mut space, BodyMode::Static, Vector2::new(5.0, 0.5), Vector2::zero());
    space
        .body_mut(platform)
        .unwrap()
        .object_mut()
        .set_shape_as_one_way_collision(0, true, 0.0)
        .unwrap();

    // Falls onto the platform from above (gravity points to +y)
    let lander = add_circle(&mut space, BodyMode::Rigid, 0.5, Vector2::new(-3.0, -2.0));

    // Jumps through it from below
    let jumper = add_circle(&mut space, BodyMode::Rigid, 0.5, Vector2::new(3.0, 2.0));
    {
        let body = space.body_mut(jumper).unwrap();
        body.set_param(BodyParameter::GravityScale, 0.0).unwrap();
        body.set_linear_velocity(Vector2::new(0.0, -20.0));
    }

    for _ in 0..60 {
        space.step(DT, 8);
    }

    let lander_y = space.body(lander).unwrap().get_transform().origin.y;
    assert!((lander_y + 1.0).abs() < 0.35, "lander at {}", lander_y);

    let jumper_y = space.body(jumper).unwrap().get_transform().origin.y;
    assert!(jumper_y < -2.0, "jumper at {}", jumper_y);
}

#[test]
fn test_collision_exception_and_layers() {
    let mut space = zero_gravity_space();
    let a = add_circle(&mut space, BodyMode::Rigid, 1.0, Vector2::new(0.0, 0.0));
    let b = add_circle(&mut space, BodyMode::Rigid, 1.0, Vector2::new(1.5, 0.0));
    space.body_mut(a).unwrap().add_collision_exception(b);
    space.update();

    space.step(DT, 8);

    // Overlapping but excepted: no push apart
    assert!(space.body(a).unwrap().get_linear_velocity().is_zero());
    assert!(space.body(b).unwrap().get_linear_velocity().is_zero());

    space.body_mut(a).unwrap().remove_collision_exception(b);
    space.step(DT, 8);
    assert!(space.body(a).unwrap().get_transform().origin.x < 0.0);
}

#[test]
fn test_remove_body_releases_pairs() {
    let mut space = zero_gravity_space();
    let a = add_circle(&mut space, BodyMode::Rigid, 1.0, Vector2::new(0.0, 0.0));
    let b = add_circle(&mut space, BodyMode::Rigid, 1.0, Vector2::new(1.9, 0.0));
    space.update();
    assert_eq!(space.constraint_count(), 1);

    let removed = space.remove_body(b).unwrap();
    assert_eq!(removed.get_mode(), BodyMode::Rigid);
    assert_eq!(space.constraint_count(), 0);
    assert!(space.body(a).unwrap().get_constraint_map().is_empty());
    assert!(space.body(b).is_err());
    assert!(space.remove_body(b).is_err());

    // The space keeps stepping
    space.step(DT, 8);
    assert_eq!(space.body_count(), 1);
}

#[test]
fn test_disabled_shape_drops_pair() {
    let mut space = zero_gravity_space();
    let a = add_circle(&mut space, BodyMode::Rigid, 1.0, Vector2::new(0.0, 0.0));
    let _b = add_circle(&mut space, BodyMode::Rigid, 1.0, Vector2::new(1.9, 0.0));
    space.update();
    assert_eq!(space.constraint_count(), 1);

    space.set_shape_disabled(a, 0, true).unwrap();
    assert_eq!(space.constraint_count(), 0);

    space.set_shape_disabled(a, 0, false).unwrap();
    space.update();
    assert_eq!(space.constraint_count(), 1);

    assert!(space.set_shape_disabled(a, 3, true).is_err());
}

#[test]
fn test_direct_state_impulse() {
    let mut space = zero_gravity_space();
    let body = add_circle(&mut space, BodyMode::Rigid, 1.0, Vector2::zero());
    space.body_mut(body).unwrap().set_param(BodyParameter::Mass, 2.0).unwrap();
    space.body_mut(body).unwrap().set_param(BodyParameter::LinearDamp, 0.0).unwrap();
    space.update();

    {
        let mut state = space.body_direct_state(body).unwrap();
        state.apply_central_impulse(Vector2::new(4.0, 0.0));
        assert_relative_eq!(state.get_linear_velocity().x, 2.0);
    }

    space.step(0.5, 8);
    assert_relative_eq!(space.body(body).unwrap().get_transform().origin.x, 1.0, epsilon = 1e-4);
}

#[test]
fn test_ray_ccd_stops_tunneling() {
    let run = |mode: CcdMode| {
        let mut space = zero_gravity_space();
        add_box(&mut space, BodyMode::Static, Vector2::new(0.1, 5.0), Vector2::new(5.0, 0.0));
        let bullet = add_circle(&mut space, BodyMode::Rigid, 0.25, Vector2::zero());
        {
            let body = space.body_mut(bullet).unwrap();
            body.set_ccd_mode(mode);
            body.set_param(BodyParameter::LinearDamp, 0.0).unwrap();
            // Ten units per step, far more than the wall is thick
            body.set_linear_velocity(Vector2::new(600.0, 0.0));
        }
        space.update();

        for _ in 0..3 {
            space.step(DT, 8);
        }
        let body = space.body(bullet).unwrap();
        (body.get_transform().origin.x, body.get_linear_velocity().x)
    };

    let (x, _) = run(CcdMode::Disabled);
    assert!(x > 5.0, "bullet at {}", x);

    let (x, vx) = run(CcdMode::CastRay);
    assert!(x < 4.9, "bullet at {}", x);
    assert!(vx < 1.0, "bullet velocity {}", vx);
}

#[test]
fn test_character_never_sleeps_on_its_own() {
    let mut space = zero_gravity_space();
    let character = add_circle(&mut space, BodyMode::Character, 0.5, Vector2::zero());
    space.update();

    for _ in 0..20 {
        space.step(0.125, 8);
    }
    assert!(space.body(character).unwrap().is_active());

    // Off-centre impulses do not rotate it
    space.body_mut(character).unwrap().apply_impulse(Vector2::new(0.0, 1.0), Vector2::new(1.0, 0.0));
    space.step(DT, 8);
    assert!(space.body(character).unwrap().get_linear_velocity().x > 0.0);
    assert_eq!(space.body(character).unwrap().get_transform().rotation(), 0.0);
}
