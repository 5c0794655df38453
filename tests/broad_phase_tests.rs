use planar_physics::collision::{BroadPhase, BruteForceBroadPhase, PairHandler, SpatialHashing};
use planar_physics::core::{HandleStorage, ShapeOwner, Storage, StorageHandle};
use planar_physics::math::{Aabb, Vector2};
use planar_physics::{BodyHandle, CollisionObjectId};
use planar_physics::core::ConstraintHandle;

/// Records pair notifications and hands out increasing constraint handles
#[derive(Default)]
struct Recorder {
    next: u32,
    paired: Vec<(ShapeOwner, ShapeOwner)>,
    unpaired: Vec<(ShapeOwner, ShapeOwner, Option<ConstraintHandle>)>,
}

impl PairHandler for Recorder {
    fn pair(&mut self, a: ShapeOwner, b: ShapeOwner) -> Option<ConstraintHandle> {
        self.paired.push((a, b));
        self.next += 1;
        Some(ConstraintHandle::from_index(self.next))
    }

    fn unpair(&mut self, a: ShapeOwner, b: ShapeOwner, data: Option<ConstraintHandle>) {
        self.unpaired.push((a, b, data));
    }
}

fn owner(body: u32, shape: usize) -> ShapeOwner {
    ShapeOwner::new(CollisionObjectId::Body(BodyHandle::from_index(body)), shape)
}

fn square(center: Vector2, half: f32) -> Aabb {
    Aabb::new(center - Vector2::new(half, half), center + Vector2::new(half, half))
}

fn implementations() -> Vec<Box<dyn BroadPhase>> {
    vec![Box::new(BruteForceBroadPhase::new()), Box::new(SpatialHashing::new(4.0))]
}

#[test]
fn test_pairs_follow_overlap() {
    for mut broad_phase in implementations() {
        let mut recorder = Recorder::default();

        let a = broad_phase.create(owner(0, 0), square(Vector2::zero(), 1.0), false);
        let _b = broad_phase.create(owner(1, 0), square(Vector2::new(1.5, 0.0), 1.0), false);
        broad_phase.update(&mut recorder);
        assert_eq!(recorder.paired.len(), 1);

        // No change, no notification
        broad_phase.update(&mut recorder);
        assert_eq!(recorder.paired.len(), 1);
        assert!(recorder.unpaired.is_empty());

        broad_phase.move_proxy(a, square(Vector2::new(-10.0, 0.0), 1.0));
        broad_phase.update(&mut recorder);
        assert_eq!(recorder.unpaired.len(), 1);
        // The handle returned by pair comes back on unpair
        assert_eq!(recorder.unpaired[0].2, Some(ConstraintHandle::from_index(1)));
    }
}

#[test]
fn test_static_and_same_owner_never_pair() {
    for mut broad_phase in implementations() {
        let mut recorder = Recorder::default();

        broad_phase.create(owner(0, 0), square(Vector2::zero(), 1.0), true);
        broad_phase.create(owner(1, 0), square(Vector2::zero(), 1.0), true);
        broad_phase.create(owner(2, 0), square(Vector2::new(20.0, 0.0), 1.0), false);
        broad_phase.create(owner(2, 1), square(Vector2::new(20.0, 0.0), 1.0), false);
        broad_phase.update(&mut recorder);
        assert!(recorder.paired.is_empty());
    }
}

#[test]
fn test_set_static_creates_pair() {
    for mut broad_phase in implementations() {
        let mut recorder = Recorder::default();

        let a = broad_phase.create(owner(0, 0), square(Vector2::zero(), 1.0), true);
        broad_phase.create(owner(1, 0), square(Vector2::zero(), 1.0), true);
        broad_phase.update(&mut recorder);
        assert!(recorder.paired.is_empty());

        broad_phase.set_static(a, false);
        broad_phase.update(&mut recorder);
        assert_eq!(recorder.paired.len(), 1);
    }
}

#[test]
fn test_remove_unpairs_immediately() {
    for mut broad_phase in implementations() {
        let mut recorder = Recorder::default();

        let a = broad_phase.create(owner(0, 0), square(Vector2::zero(), 1.0), false);
        broad_phase.create(owner(1, 0), square(Vector2::zero(), 1.0), false);
        broad_phase.create(owner(2, 0), square(Vector2::new(0.5, 0.5), 1.0), false);
        broad_phase.update(&mut recorder);
        assert_eq!(recorder.paired.len(), 3);

        broad_phase.remove(a, &mut recorder);
        assert_eq!(recorder.unpaired.len(), 2);
        assert!(broad_phase.get_owner(a).is_none());

        // The remaining pair survives the next update
        broad_phase.update(&mut recorder);
        assert_eq!(recorder.unpaired.len(), 2);
    }
}

#[test]
fn test_culling() {
    for mut broad_phase in implementations() {
        broad_phase.create(owner(0, 0), square(Vector2::zero(), 1.0), true);
        broad_phase.create(owner(1, 0), square(Vector2::new(10.0, 0.0), 1.0), false);
        // Larger than several cells
        broad_phase.create(owner(2, 0), square(Vector2::new(0.0, 30.0), 25.0), true);

        let hits = broad_phase.cull_aabb(&square(Vector2::new(0.5, 0.0), 1.0), 16);
        assert_eq!(hits, vec![owner(0, 0)]);

        let hits = broad_phase.cull_aabb(&square(Vector2::new(0.0, 50.0), 1.0), 16);
        assert_eq!(hits, vec![owner(2, 0)]);

        let hits = broad_phase.cull_segment(Vector2::new(-5.0, 0.0), Vector2::new(15.0, 0.0), 16);
        assert_eq!(hits, vec![owner(0, 0), owner(1, 0)]);

        let hits = broad_phase.cull_segment(Vector2::new(-5.0, 0.0), Vector2::new(15.0, 0.0), 1);
        assert_eq!(hits.len(), 1);
    }
}

#[test]
fn test_storage_handles_are_not_reused() {
    let mut storage: HandleStorage<BodyHandle, &str> = HandleStorage::new();
    let a = storage.add("a");
    let b = storage.add("b");
    assert_eq!(storage.len(), 2);

    assert_eq!(storage.remove(a), Some("a"));
    assert!(storage.fetch(a).is_err());
    assert!(storage.remove(a).is_none());

    let c = storage.add("c");
    assert_ne!(c, a);
    assert_eq!(storage.handles(), vec![b, c]);

    let (first, second) = storage.get2_mut(b, c).unwrap();
    std::mem::swap(first, second);
    assert_eq!(*storage.fetch(b).unwrap(), "c");
    assert!(storage.get2_mut(b, b).is_none());
}
