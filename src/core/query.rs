//! Direct space queries: ray, point and shape intersection, motion casting and the
//! body motion test used by character controllers.
//!
//! Queries read the broad-phase as of the last [`Space::update`] or step.

use crate::bodies::{BodyMode, CollisionObject, ShapeInstance};
use crate::collision::{CollisionLayers, CollisionSolver};
use crate::core::{BodyHandle, CollisionObjectId, ShapeOwner, Space, Storage};
use crate::math::{Aabb, Transform2D, Vector2, CMP_EPSILON};
use crate::shapes::{Shape, ShapeType};
use crate::Result;

/// Most broad-phase candidates a single query looks at
pub const INTERSECTION_QUERY_MAX: usize = 2048;

/// Contacts against a one-way shape must be within 45 degrees of its pass-through axis
#[inline]
fn one_way_min_cos() -> f32 {
    std::f32::consts::FRAC_PI_4.cos()
}

const RECOVER_ATTEMPTS: usize = 4;
const RECOVER_MAX_POINTS: usize = 32;
const MAX_EXCLUDED_SHAPE_PAIRS: usize = 32;
const CAST_BISECTIONS: usize = 8;

/// Selects which objects a query sees
#[derive(Debug, Clone, PartialEq)]
pub struct QueryFilter {
    /// Objects skipped by the query
    pub exclude: Vec<CollisionObjectId>,

    /// Only objects on one of these layers are reported
    pub collision_mask: CollisionLayers,

    pub collide_with_bodies: bool,
    pub collide_with_areas: bool,
}

impl Default for QueryFilter {
    fn default() -> Self {
        Self {
            exclude: Vec::new(),
            collision_mask: CollisionLayers::all(),
            collide_with_bodies: true,
            collide_with_areas: false,
        }
    }
}

impl QueryFilter {
    /// A filter seeing all bodies except `exclude`
    pub fn excluding(exclude: impl IntoIterator<Item = CollisionObjectId>) -> Self {
        Self {
            exclude: exclude.into_iter().collect(),
            ..Self::default()
        }
    }

    fn accepts(&self, owner: ShapeOwner, object: &CollisionObject) -> bool {
        if !object.get_collision_layer().intersects(self.collision_mask) {
            return false;
        }
        let kind_allowed = match owner.object {
            CollisionObjectId::Body(_) => self.collide_with_bodies,
            CollisionObjectId::Area(_) => self.collide_with_areas,
        };
        kind_allowed && !self.exclude.contains(&owner.object)
    }
}

/// Closest hit of a ray
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayResult {
    pub position: Vector2,
    pub normal: Vector2,
    pub collider: CollisionObjectId,
    pub shape: usize,
    pub metadata: u64,
}

/// A shape found by a point or shape query
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShapeResult {
    pub collider: CollisionObjectId,
    pub shape: usize,
    pub metadata: u64,
}

/// Deepest contact found by [`Space::rest_info`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RestInfo {
    /// Contact point on the collider
    pub point: Vector2,

    /// Normal pointing out of the collider
    pub normal: Vector2,

    pub collider: CollisionObjectId,
    pub shape: usize,

    /// Velocity of the collider at the contact point; zero for areas
    pub linear_velocity: Vector2,

    pub metadata: u64,
}

/// The collision that stopped a [`Space::test_body_motion`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotionCollision {
    pub point: Vector2,
    pub normal: Vector2,
    pub collider_velocity: Vector2,

    /// Shape index on the moving body
    pub local_shape: usize,

    pub collider: BodyHandle,
    pub collider_shape: usize,
    pub collider_metadata: u64,
}

/// Outcome of a [`Space::test_body_motion`]
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MotionResult {
    /// Motion that can be applied safely, including the depenetration
    pub motion: Vector2,

    /// Part of the requested motion left after the collision
    pub remainder: Vector2,

    pub collision: Option<MotionCollision>,
}

impl MotionResult {
    pub fn collided(&self) -> bool {
        self.collision.is_some()
    }
}

/// Gathers contact point pairs, keeping the deepest ones once full.
///
/// With a valid direction set, pairs further apart than the valid depth or pointing
/// more than 45 degrees away from the direction are rejected.
struct PointCollector {
    max: usize,
    points: Vec<(Vector2, Vector2)>,
    passed: usize,
    valid_dir: Vector2,
    valid_depth: f32,
    invalid_by_dir: usize,
}

impl PointCollector {
    fn new(max: usize) -> Self {
        Self {
            max,
            points: Vec::with_capacity(max),
            passed: 0,
            valid_dir: Vector2::zero(),
            valid_depth: 0.0,
            invalid_by_dir: 0,
        }
    }

    fn set_valid(&mut self, dir: Vector2, depth: f32) {
        self.valid_dir = dir;
        self.valid_depth = depth;
        self.invalid_by_dir = 0;
    }

    fn push(&mut self, a: Vector2, b: Vector2) {
        if self.max == 0 {
            return;
        }

        if !self.valid_dir.is_zero() {
            if a.distance_squared(&b) > self.valid_depth * self.valid_depth {
                self.invalid_by_dir += 1;
                return;
            }
            if self.valid_dir.dot(&(a - b).normalize()) < one_way_min_cos() {
                self.invalid_by_dir += 1;
                return;
            }
        }

        self.passed += 1;
        if self.points.len() < self.max {
            self.points.push((a, b));
            return;
        }

        let least_deep = self
            .points
            .iter()
            .enumerate()
            .map(|(i, (pa, pb))| (i, pa.distance_squared(pb)))
            .fold((0, 1e20_f32), |best, cur| if cur.1 < best.1 { cur } else { best });

        if a.distance_squared(&b) < least_deep.1 {
            return;
        }
        self.points[least_deep.0] = (a, b);
    }
}

/// Tracks the deepest contact across several solver calls
struct RestCollector {
    valid_dir: Vector2,
    valid_depth: f32,
    min_allowed_depth: f32,
    current: (ShapeOwner, usize),
    best_len: f32,
    best_contact: Vector2,
    best_normal: Vector2,
    best: Option<(ShapeOwner, usize)>,
}

impl RestCollector {
    fn new(min_allowed_depth: f32) -> Self {
        Self {
            valid_dir: Vector2::zero(),
            valid_depth: 0.0,
            min_allowed_depth,
            current: (ShapeOwner::new(CollisionObjectId::Body(BodyHandle(0)), 0), 0),
            best_len: 0.0,
            best_contact: Vector2::zero(),
            best_normal: Vector2::zero(),
            best: None,
        }
    }

    fn push(&mut self, a: Vector2, b: Vector2) {
        if !self.valid_dir.is_zero() {
            if a.distance_squared(&b) > self.valid_depth * self.valid_depth {
                return;
            }
            if self.valid_dir.dot(&(a - b).normalize()) < one_way_min_cos() {
                return;
            }
        }

        let contact_rel = b - a;
        let len = contact_rel.length();
        if len < self.min_allowed_depth || len <= self.best_len {
            return;
        }

        self.best_len = len;
        self.best_contact = b;
        self.best_normal = contact_rel / len;
        self.best = Some(self.current);
    }
}

/// Union of a shape's AABB at `xform` and at `xform + motion`, grown by `margin`
fn swept_aabb(shape: &dyn Shape, xform: &Transform2D, motion: Vector2, margin: f32) -> Aabb {
    let aabb = shape.get_local_bounds().transformed(xform);
    aabb.merge(&aabb.translated(motion)).grow(margin)
}

/// Pass-through axis of a one-way shape, in world space
fn one_way_direction(object: &CollisionObject, shape: usize) -> Vector2 {
    object.get_shape_world_transform(shape).y.normalize()
}

/// Largest fraction of `motion` (and the first colliding one) found by bisection
fn bisect_motion(
    shape: &dyn Shape,
    xform: &Transform2D,
    motion: Vector2,
    against: &dyn Shape,
    against_xform: &Transform2D,
    margin: f32,
) -> (f32, f32) {
    let mnormal = motion.normalize();
    let mut low = 0.0;
    let mut hi = 1.0;

    for _ in 0..CAST_BISECTIONS {
        let ofs = (low + hi) * 0.5;
        let mut sep = mnormal;
        let collided = CollisionSolver::solve(
            shape,
            xform,
            motion * ofs,
            against,
            against_xform,
            Vector2::zero(),
            None,
            Some(&mut sep),
            margin,
            0.0,
        );
        if collided {
            hi = ofs;
        } else {
            low = ofs;
        }
    }

    (low, hi)
}

/// Whether a cast stopped at `hi` really hits a one-way shape from its blocking side
#[allow(clippy::too_many_arguments)]
fn one_way_blocks(
    shape: &dyn Shape,
    xform: &Transform2D,
    motion: Vector2,
    hi: f32,
    max_penetration: f32,
    against: &dyn Shape,
    against_xform: &Transform2D,
    margin: f32,
) -> bool {
    let mut collector = PointCollector::new(1);
    collector.set_valid(against_xform.y.normalize(), 10e20);

    let mut sep = motion.normalize();
    let mut callback = |a: Vector2, b: Vector2| collector.push(a, b);
    let collided = CollisionSolver::solve(
        shape,
        xform,
        motion * (hi + max_penetration),
        against,
        against_xform,
        Vector2::zero(),
        Some(&mut callback),
        Some(&mut sep),
        margin,
        0.0,
    );

    collided && !collector.points.is_empty()
}

impl Space {
    fn query_candidate(&self, owner: ShapeOwner) -> Option<(&CollisionObject, &ShapeInstance)> {
        let object = self.object(owner.object).ok()?;
        let instance = object.shape_instance(owner.shape).ok()?;
        Some((object, instance))
    }

    fn filtered_candidates<'a>(
        &'a self,
        candidates: Vec<ShapeOwner>,
        filter: &'a QueryFilter,
    ) -> impl Iterator<Item = (ShapeOwner, &'a CollisionObject, &'a ShapeInstance)> + 'a {
        candidates.into_iter().filter_map(move |owner| {
            let (object, instance) = self.query_candidate(owner)?;
            if instance.disabled || !filter.accepts(owner, object) {
                return None;
            }
            Some((owner, object, instance))
        })
    }

    /// Velocity of a collider at a world point; zero for areas
    fn collider_velocity_at(&self, collider: CollisionObjectId, point: Vector2) -> Vector2 {
        match collider {
            CollisionObjectId::Body(handle) => self
                .bodies
                .fetch(handle)
                .map(|body| body.velocity_at_offset(point - body.get_transform().origin))
                .unwrap_or_default(),
            CollisionObjectId::Area(_) => Vector2::zero(),
        }
    }

    /// Casts a segment and returns the closest hit along it
    pub fn intersect_ray(&self, from: Vector2, to: Vector2, filter: &QueryFilter, pick_point: bool) -> Option<RayResult> {
        let direction = (to - from).normalize();
        let candidates = self.broad_phase.cull_segment(from, to, INTERSECTION_QUERY_MAX);

        let mut best: Option<RayResult> = None;
        let mut min_d = 1e10;

        for (owner, object, instance) in self.filtered_candidates(candidates, filter) {
            if pick_point && !object.is_pickable() {
                continue;
            }

            let inv_xform = instance.xform_inv * object.get_inv_transform();
            let local_from = inv_xform.xform(from);
            let local_to = inv_xform.xform(to);

            if let Some((point, normal)) = instance.shape.intersect_segment(local_from, local_to) {
                let xform = object.get_transform() * instance.xform;
                let point = xform.xform(point);
                let d = direction.dot(&point);
                if d < min_d {
                    min_d = d;
                    best = Some(RayResult {
                        position: point,
                        normal: inv_xform.basis_xform_inv(normal).normalize(),
                        collider: owner.object,
                        shape: owner.shape,
                        metadata: instance.metadata,
                    });
                }
            }
        }

        best
    }

    /// Shapes containing `point`, at most `max_results`
    pub fn intersect_point(
        &self,
        point: Vector2,
        max_results: usize,
        filter: &QueryFilter,
        pick_point: bool,
    ) -> Vec<ShapeResult> {
        let point_aabb = Aabb::new(point - Vector2::new(0.00001, 0.00001), point + Vector2::new(0.00001, 0.00001));
        let candidates = self.broad_phase.cull_aabb(&point_aabb, INTERSECTION_QUERY_MAX);

        self.filtered_candidates(candidates, filter)
            .filter(|(_, object, _)| !pick_point || object.is_pickable())
            .filter(|(_, object, instance)| {
                let local = (object.get_transform() * instance.xform).affine_inverse().xform(point);
                instance.shape.contains_point(local)
            })
            .take(max_results)
            .map(|(owner, _, instance)| ShapeResult {
                collider: owner.object,
                shape: owner.shape,
                metadata: instance.metadata,
            })
            .collect()
    }

    /// Shapes overlapping `shape` placed at `xform` and swept by `motion`, at most `max_results`
    pub fn intersect_shape(
        &self,
        shape: &dyn Shape,
        xform: &Transform2D,
        motion: Vector2,
        margin: f32,
        max_results: usize,
        filter: &QueryFilter,
    ) -> Vec<ShapeResult> {
        let aabb = swept_aabb(shape, xform, motion, margin);
        let candidates = self.broad_phase.cull_aabb(&aabb, INTERSECTION_QUERY_MAX);

        self.filtered_candidates(candidates, filter)
            .filter(|(_, object, instance)| {
                CollisionSolver::solve(
                    shape,
                    xform,
                    motion,
                    &*instance.shape,
                    &(object.get_transform() * instance.xform),
                    Vector2::zero(),
                    None,
                    None,
                    margin,
                    0.0,
                )
            })
            .take(max_results)
            .map(|(owner, _, instance)| ShapeResult {
                collider: owner.object,
                shape: owner.shape,
                metadata: instance.metadata,
            })
            .collect()
    }

    /// Casts `shape` along `motion` and returns the safe and unsafe fractions of the motion.
    ///
    /// Shapes already overlapping at the start are ignored. Both fractions are 1 when
    /// nothing is hit.
    pub fn cast_motion(
        &self,
        shape: &dyn Shape,
        xform: &Transform2D,
        motion: Vector2,
        margin: f32,
        filter: &QueryFilter,
    ) -> (f32, f32) {
        let aabb = swept_aabb(shape, xform, motion, margin);
        let candidates = self.broad_phase.cull_aabb(&aabb, INTERSECTION_QUERY_MAX);

        let mut best_safe = 1.0;
        let mut best_unsafe = 1.0;

        for (owner, object, instance) in self.filtered_candidates(candidates, filter) {
            let against = &*instance.shape;
            let against_xform = object.get_transform() * instance.xform;

            let hits_at_all = CollisionSolver::solve(
                shape, xform, motion, against, &against_xform, Vector2::zero(), None, None, margin, 0.0,
            );
            if !hits_at_all {
                continue;
            }

            let overlaps_at_start = CollisionSolver::solve(
                shape, xform, Vector2::zero(), against, &against_xform, Vector2::zero(), None, None, margin, 0.0,
            );
            if overlaps_at_start {
                continue;
            }

            let (low, hi) = bisect_motion(shape, xform, motion, against, &against_xform, margin);

            if object.is_shape_one_way_collision(owner.shape)
                && !one_way_blocks(
                    shape,
                    xform,
                    motion,
                    hi,
                    self.config.contact_max_allowed_penetration,
                    against,
                    &against_xform,
                    margin,
                )
            {
                continue;
            }

            if low < best_safe {
                best_safe = low;
                best_unsafe = hi;
            }
        }

        (best_safe, best_unsafe)
    }

    /// Contact point pairs (on the query shape, on the collider) against everything
    /// overlapping the swept shape, at most `max_results`
    pub fn collide_shape(
        &self,
        shape: &dyn Shape,
        xform: &Transform2D,
        motion: Vector2,
        margin: f32,
        max_results: usize,
        filter: &QueryFilter,
    ) -> Vec<(Vector2, Vector2)> {
        if max_results == 0 {
            return Vec::new();
        }

        let aabb = swept_aabb(shape, xform, motion, margin);
        let candidates = self.broad_phase.cull_aabb(&aabb, INTERSECTION_QUERY_MAX);
        let mut collector = PointCollector::new(max_results);

        for (_, object, instance) in self.filtered_candidates(candidates, filter) {
            let mut callback = |a: Vector2, b: Vector2| collector.push(a, b);
            CollisionSolver::solve(
                shape,
                xform,
                motion,
                &*instance.shape,
                &(object.get_transform() * instance.xform),
                Vector2::zero(),
                Some(&mut callback),
                None,
                margin,
                0.0,
            );
        }

        collector.points
    }

    /// Deepest contact of the swept shape, ignoring contacts shallower than the
    /// space's minimum contact depth
    pub fn rest_info(
        &self,
        shape: &dyn Shape,
        xform: &Transform2D,
        motion: Vector2,
        margin: f32,
        filter: &QueryFilter,
    ) -> Option<RestInfo> {
        let aabb = swept_aabb(shape, xform, motion, margin);
        let candidates = self.broad_phase.cull_aabb(&aabb, INTERSECTION_QUERY_MAX);
        let mut rest = RestCollector::new(self.config.test_motion_min_contact_depth);

        for (owner, object, instance) in self.filtered_candidates(candidates, filter) {
            if object.is_shape_one_way_collision(owner.shape) {
                rest.valid_dir = one_way_direction(object, owner.shape);
                rest.valid_depth = 10e20;
            } else {
                rest.valid_dir = Vector2::zero();
                rest.valid_depth = 0.0;
            }
            rest.current = (owner, 0);

            let mut callback = |a: Vector2, b: Vector2| rest.push(a, b);
            CollisionSolver::solve(
                shape,
                xform,
                motion,
                &*instance.shape,
                &(object.get_transform() * instance.xform),
                Vector2::zero(),
                Some(&mut callback),
                None,
                margin,
                0.0,
            );
        }

        let (owner, _) = rest.best?;
        if rest.best_len == 0.0 {
            return None;
        }

        Some(RestInfo {
            point: rest.best_contact,
            normal: rest.best_normal,
            collider: owner.object,
            shape: owner.shape,
            linear_velocity: self.collider_velocity_at(owner.object, rest.best_contact),
            metadata: self.object(owner.object).map(|o| o.get_shape_metadata(owner.shape)).unwrap_or(0),
        })
    }

    /// Broad-phase candidates a moving body may hit: other bodies' enabled shapes on
    /// interacting layers and without collision exceptions
    fn cull_aabb_for_body(&self, handle: BodyHandle, aabb: &Aabb, infinite_inertia: bool) -> Vec<ShapeOwner> {
        let body = match self.bodies.get(handle) {
            Some(body) => body,
            None => return Vec::new(),
        };

        let mut candidates = self.broad_phase.cull_aabb(aabb, INTERSECTION_QUERY_MAX);
        candidates.retain(|owner| {
            let other_handle = match owner.object {
                CollisionObjectId::Body(other) if other != handle => other,
                _ => return false,
            };
            let other = match self.bodies.get(other_handle) {
                Some(other) => other,
                None => return false,
            };

            if infinite_inertia && !other.get_mode().is_immovable() {
                return false;
            }

            other.object.interacts_with(&body.object)
                && !other.has_exception(handle)
                && !body.has_exception(other_handle)
                && !other.object.is_shape_disabled(owner.shape)
        });
        candidates
    }

    /// How far a one-way shape of `collider` lets bodies sink in before they are
    /// considered to come from below
    fn one_way_valid_depth(&self, collider: &CollisionObject, owner: ShapeOwner, valid_dir: Vector2, margin: f32) -> f32 {
        let mut depth = collider.get_shape_one_way_collision_margin(owner.shape).max(margin);

        // Moving platforms get extra depth for how far they moved against the direction
        if let CollisionObjectId::Body(handle) = owner.object {
            if let Ok(body) = self.bodies.fetch(handle) {
                if matches!(body.get_mode(), BodyMode::Kinematic | BodyMode::Rigid) {
                    let motion = body.get_linear_velocity() * self.last_step;
                    let motion_len = motion.length();
                    depth += motion_len * motion.normalize().dot(&-valid_dir).max(0.0);
                }
            }
        }

        depth
    }

    /// Tests moving a body from `from` by `motion` without moving it.
    ///
    /// The body is first pushed out of anything it overlaps, then its motion is cast
    /// against nearby bodies. On collision, the result carries the safe motion, the
    /// remainder and the contact found at the first colliding position.
    #[allow(clippy::too_many_arguments)]
    pub fn test_body_motion(
        &self,
        handle: BodyHandle,
        from: &Transform2D,
        motion: Vector2,
        infinite_inertia: bool,
        margin: f32,
        exclude_ray_shapes: bool,
    ) -> Result<MotionResult> {
        let body = self.bodies.fetch(handle)?;
        let object = &body.object;

        let mut body_aabb = match object.enabled_shapes_aabb() {
            Some(aabb) => aabb,
            None => {
                return Ok(MotionResult {
                    motion,
                    ..MotionResult::default()
                })
            }
        };

        // Move the cached AABB from the body's current transform to `from`
        body_aabb = body_aabb.transformed(&(*from * object.get_inv_transform())).grow(margin);

        let body_shapes: Vec<(usize, &ShapeInstance)> = object
            .shape_instances()
            .enumerate()
            .filter(|(_, s)| !s.disabled)
            .filter(|(_, s)| !(exclude_ray_shapes && s.shape.shape_type() == ShapeType::Ray))
            .collect();

        let separation_margin = margin.min((motion.length() - CMP_EPSILON).max(0.0));
        let mut body_transform = *from;
        let mut excluded: Vec<(usize, ShapeOwner)> = Vec::new();
        let min_contact_depth = self.config.test_motion_min_contact_depth;
        let mut recovered = false;

        // Free the body if it is stuck
        for _ in 0..RECOVER_ATTEMPTS {
            let mut collector = PointCollector::new(RECOVER_MAX_POINTS);
            let mut collided = false;
            excluded.clear();

            let candidates = self.cull_aabb_for_body(handle, &body_aabb, infinite_inertia);

            for &(body_shape, instance) in &body_shapes {
                let body_shape_xform = body_transform * instance.xform;

                for &owner in &candidates {
                    let (collider, against) = match self.query_candidate(owner) {
                        Some(candidate) => candidate,
                        None => continue,
                    };

                    if collider.is_shape_one_way_collision(owner.shape) {
                        let valid_dir = one_way_direction(collider, owner.shape);
                        let valid_depth = self.one_way_valid_depth(collider, owner, valid_dir, margin);
                        collector.set_valid(valid_dir, valid_depth);
                    } else {
                        collector.set_valid(Vector2::zero(), 0.0);
                    }

                    let passed_before = collector.passed;
                    let mut callback = |a: Vector2, b: Vector2| collector.push(a, b);
                    let solved = CollisionSolver::solve(
                        &*instance.shape,
                        &body_shape_xform,
                        Vector2::zero(),
                        &*against.shape,
                        &(collider.get_transform() * against.xform),
                        Vector2::zero(),
                        Some(&mut callback),
                        None,
                        separation_margin,
                        0.0,
                    );
                    let did_collide = solved && collector.passed > passed_before;

                    if !did_collide && collector.invalid_by_dir > 0 && excluded.len() < MAX_EXCLUDED_SHAPE_PAIRS {
                        excluded.push((body_shape, owner));
                    }
                    collided |= did_collide;
                }
            }

            if !collided {
                break;
            }

            // Later contacts see the motion already recovered by earlier ones, and each
            // keeps the minimum contact depth so the rest pass still finds it
            let mut recover = Vector2::zero();
            for (a, b) in &collector.points {
                let n = (*a - *b).normalize();
                let depth = n.dot(&(*a + recover)) - n.dot(b);
                if depth > min_contact_depth + CMP_EPSILON {
                    recover -= n * ((depth - min_contact_depth) * 0.4);
                }
            }
            if recover.is_zero() {
                break;
            }

            recovered = true;
            body_transform.origin += recover;
            body_aabb = body_aabb.translated(recover);
        }

        // Cast the motion
        let mut safe = 1.0;
        let mut unsafe_fraction = 1.0;
        let mut best_shape = None;

        let motion_aabb = body_aabb.merge(&body_aabb.translated(motion));
        let candidates = self.cull_aabb_for_body(handle, &motion_aabb, infinite_inertia);

        for &(body_shape, instance) in &body_shapes {
            let body_shape_xform = body_transform * instance.xform;
            let mut stuck = false;
            let mut best_safe = 1.0;
            let mut best_unsafe = 1.0;

            for &owner in &candidates {
                if excluded.contains(&(body_shape, owner)) {
                    continue;
                }
                let (collider, against) = match self.query_candidate(owner) {
                    Some(candidate) => candidate,
                    None => continue,
                };
                let against_xform = collider.get_transform() * against.xform;

                let hits_at_all = CollisionSolver::solve(
                    &*instance.shape,
                    &body_shape_xform,
                    motion,
                    &*against.shape,
                    &against_xform,
                    Vector2::zero(),
                    None,
                    None,
                    0.0,
                    0.0,
                );
                if !hits_at_all {
                    continue;
                }

                let overlaps_at_start = CollisionSolver::solve(
                    &*instance.shape,
                    &body_shape_xform,
                    Vector2::zero(),
                    &*against.shape,
                    &against_xform,
                    Vector2::zero(),
                    None,
                    None,
                    0.0,
                    0.0,
                );
                if overlaps_at_start {
                    if collider.is_shape_one_way_collision(owner.shape) {
                        continue;
                    }
                    stuck = true;
                    break;
                }

                let (low, hi) = bisect_motion(&*instance.shape, &body_shape_xform, motion, &*against.shape, &against_xform, 0.0);

                if collider.is_shape_one_way_collision(owner.shape)
                    && !one_way_blocks(
                        &*instance.shape,
                        &body_shape_xform,
                        motion,
                        hi,
                        self.config.contact_max_allowed_penetration,
                        &*against.shape,
                        &against_xform,
                        0.0,
                    )
                {
                    continue;
                }

                if low < best_safe {
                    best_safe = low;
                    best_unsafe = hi;
                }
            }

            if stuck {
                safe = 0.0;
                unsafe_fraction = 0.0;
                best_shape = Some(body_shape);
                break;
            }

            if best_safe < safe {
                safe = best_safe;
                unsafe_fraction = best_unsafe;
                best_shape = Some(body_shape);
            }
        }

        let recovery = body_transform.origin - from.origin;

        if safe >= 1.0 && !recovered {
            return Ok(MotionResult {
                motion: motion + recovery,
                remainder: Vector2::zero(),
                collision: None,
            });
        }

        // Find the contact at the first colliding position, or at the end of the motion
        // when only the recovery touched something
        let mut unsafe_transform = body_transform;
        unsafe_transform.origin += motion * unsafe_fraction;
        let rest_aabb = body_aabb.translated(motion * unsafe_fraction);
        let candidates = self.cull_aabb_for_body(handle, &rest_aabb, infinite_inertia);
        let mut rest = RestCollector::new(min_contact_depth.min(motion.length()));

        for &(body_shape, instance) in &body_shapes {
            if best_shape.map_or(false, |best| best != body_shape) {
                continue;
            }
            let body_shape_xform = unsafe_transform * instance.xform;

            for &owner in &candidates {
                let (collider, against) = match self.query_candidate(owner) {
                    Some(candidate) => candidate,
                    None => continue,
                };

                if collider.is_shape_one_way_collision(owner.shape) {
                    rest.valid_dir = one_way_direction(collider, owner.shape);
                    rest.valid_depth = self.one_way_valid_depth(collider, owner, rest.valid_dir, margin);
                } else {
                    rest.valid_dir = Vector2::zero();
                    rest.valid_depth = 0.0;
                }
                rest.current = (owner, body_shape);

                let mut callback = |a: Vector2, b: Vector2| rest.push(a, b);
                CollisionSolver::solve(
                    &*instance.shape,
                    &body_shape_xform,
                    Vector2::zero(),
                    &*against.shape,
                    &(collider.get_transform() * against.xform),
                    Vector2::zero(),
                    Some(&mut callback),
                    None,
                    margin,
                    0.0,
                );
            }
        }

        let collision = match rest.best {
            Some((owner, local_shape)) if rest.best_len != 0.0 => owner.object.body().map(|collider| MotionCollision {
                point: rest.best_contact,
                normal: rest.best_normal,
                collider_velocity: self.collider_velocity_at(owner.object, rest.best_contact),
                local_shape,
                collider,
                collider_shape: owner.shape,
                collider_metadata: self.object(owner.object).map(|o| o.get_shape_metadata(owner.shape)).unwrap_or(0),
            }),
            _ => None,
        };

        Ok(match collision {
            Some(collision) => MotionResult {
                motion: motion * safe + recovery,
                remainder: motion - motion * safe,
                collision: Some(collision),
            },
            None => MotionResult {
                motion: motion + recovery,
                remainder: Vector2::zero(),
                collision: None,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn point_collector_counts_contacts_past_capacity() {
        let mut collector = PointCollector::new(1);
        collector.push(Vector2::new(0.0, 1.0), Vector2::zero());
        collector.push(Vector2::new(0.0, 2.0), Vector2::zero());
        collector.push(Vector2::new(0.0, 0.5), Vector2::zero());

        assert_eq!(collector.passed, 3);
        assert_eq!(collector.points.len(), 1);
        // The deepest contact survives
        assert_eq!(collector.points[0].0, Vector2::new(0.0, 2.0));
    }

    #[test]
    fn one_way_contacts_limited_to_45_degrees() {
        let mut collector = PointCollector::new(4);
        collector.set_valid(Vector2::new(0.0, 1.0), 10.0);

        let at = |degrees: f32| {
            let radians = degrees.to_radians();
            Vector2::new(radians.sin(), radians.cos())
        };
        collector.push(at(40.0), Vector2::zero());
        collector.push(at(50.0), Vector2::zero());

        assert_eq!(collector.passed, 1);
        assert_eq!(collector.invalid_by_dir, 1);
    }
}
