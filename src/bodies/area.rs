use crate::bodies::{AreaOverrideMode, CollisionObject};
use crate::core::{AreaEvent, AreaEventKind, AreaHandle, CollisionObjectId, ConstraintHandle, SpaceConfig};
use crate::math::Vector2;

use std::collections::{BTreeMap, BTreeSet};

/// Identifies one overlapping shape pair of a monitoring area
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MonitorKey {
    pub object: CollisionObjectId,
    pub object_shape: usize,
    pub area_shape: usize,
}

/// A region that overrides gravity and damping and reports what enters or leaves it
#[derive(Debug, Clone)]
pub struct Area {
    pub(crate) object: CollisionObject,

    space_override_mode: AreaOverrideMode,
    priority: f32,

    gravity: f32,
    gravity_vector: Vector2,
    gravity_is_point: bool,
    gravity_distance_scale: f32,
    linear_damp: f32,
    angular_damp: f32,

    monitorable: bool,
    monitoring_bodies: bool,
    monitoring_areas: bool,

    /// Net overlap changes since the last flush
    monitored_bodies: BTreeMap<MonitorKey, i32>,
    monitored_areas: BTreeMap<MonitorKey, i32>,

    pub(crate) constraints: BTreeSet<ConstraintHandle>,
    pub(crate) moved: bool,
}

impl Default for Area {
    fn default() -> Self {
        Self::new()
    }
}

impl Area {
    /// Creates an area pulling down with standard gravity, not affecting bodies yet
    pub fn new() -> Self {
        Self {
            object: CollisionObject::new(true),
            space_override_mode: AreaOverrideMode::Disabled,
            priority: 0.0,
            gravity: 9.80665,
            gravity_vector: Vector2::new(0.0, -1.0),
            gravity_is_point: false,
            gravity_distance_scale: 0.0,
            linear_damp: 0.1,
            angular_damp: 1.0,
            monitorable: false,
            monitoring_bodies: false,
            monitoring_areas: false,
            monitored_bodies: BTreeMap::new(),
            monitored_areas: BTreeMap::new(),
            constraints: BTreeSet::new(),
            moved: true,
        }
    }

    /// The implicit area covering the whole space
    pub(crate) fn default_for_space(config: &SpaceConfig) -> Self {
        let mut area = Self::new();
        area.gravity = config.default_gravity;
        area.gravity_vector = config.default_gravity_vector;
        area.linear_damp = config.default_linear_damp;
        area.angular_damp = config.default_angular_damp;
        area
    }

    pub fn object(&self) -> &CollisionObject {
        &self.object
    }

    pub fn object_mut(&mut self) -> &mut CollisionObject {
        &mut self.object
    }

    pub fn get_space_override_mode(&self) -> AreaOverrideMode {
        self.space_override_mode
    }

    pub(crate) fn set_space_override_mode_internal(&mut self, mode: AreaOverrideMode) {
        self.space_override_mode = mode;
    }

    pub fn get_priority(&self) -> f32 {
        self.priority
    }

    pub fn set_priority(&mut self, priority: f32) {
        self.priority = priority;
    }

    pub fn get_gravity(&self) -> f32 {
        self.gravity
    }

    pub fn set_gravity(&mut self, gravity: f32) {
        self.gravity = gravity;
    }

    /// Gravity direction, or the attraction point in local space when gravity is a point
    pub fn get_gravity_vector(&self) -> Vector2 {
        self.gravity_vector
    }

    pub fn set_gravity_vector(&mut self, vector: Vector2) {
        self.gravity_vector = vector;
    }

    pub fn is_gravity_point(&self) -> bool {
        self.gravity_is_point
    }

    pub fn set_gravity_is_point(&mut self, is_point: bool) {
        self.gravity_is_point = is_point;
    }

    pub fn get_gravity_distance_scale(&self) -> f32 {
        self.gravity_distance_scale
    }

    /// Point gravity falls off as `1 / (distance * scale + 1)^2`; 0 disables falloff
    pub fn set_gravity_distance_scale(&mut self, scale: f32) {
        self.gravity_distance_scale = scale;
    }

    pub fn get_linear_damp(&self) -> f32 {
        self.linear_damp
    }

    pub fn set_linear_damp(&mut self, damp: f32) {
        self.linear_damp = damp;
    }

    pub fn get_angular_damp(&self) -> f32 {
        self.angular_damp
    }

    pub fn set_angular_damp(&mut self, damp: f32) {
        self.angular_damp = damp;
    }

    /// Whether other monitoring areas can detect this one
    pub fn is_monitorable(&self) -> bool {
        self.monitorable
    }

    pub(crate) fn set_monitorable_internal(&mut self, monitorable: bool) {
        self.monitorable = monitorable;
        self.object.is_static = !monitorable;
        self.object.mark_shapes_changed();
    }

    pub fn is_monitoring_bodies(&self) -> bool {
        self.monitoring_bodies
    }

    pub fn is_monitoring_areas(&self) -> bool {
        self.monitoring_areas
    }

    pub(crate) fn set_monitoring_internal(&mut self, bodies: bool, areas: bool) {
        self.monitoring_bodies = bodies;
        self.monitoring_areas = areas;
        self.monitored_bodies.clear();
        self.monitored_areas.clear();
        self.object.mark_shapes_changed();
        self.moved = true;
    }

    /// Constraints this area takes part in
    pub fn get_constraints(&self) -> &BTreeSet<ConstraintHandle> {
        &self.constraints
    }

    pub(crate) fn add_constraint(&mut self, constraint: ConstraintHandle) {
        self.constraints.insert(constraint);
    }

    pub(crate) fn remove_constraint(&mut self, constraint: ConstraintHandle) {
        self.constraints.remove(&constraint);
    }

    pub(crate) fn add_body_to_query(&mut self, key: MonitorKey) {
        *self.monitored_bodies.entry(key).or_insert(0) += 1;
    }

    pub(crate) fn remove_body_from_query(&mut self, key: MonitorKey) {
        *self.monitored_bodies.entry(key).or_insert(0) -= 1;
    }

    pub(crate) fn add_area_to_query(&mut self, key: MonitorKey) {
        *self.monitored_areas.entry(key).or_insert(0) += 1;
    }

    pub(crate) fn remove_area_from_query(&mut self, key: MonitorKey) {
        *self.monitored_areas.entry(key).or_insert(0) -= 1;
    }

    /// Whether overlap changes are waiting to be reported
    pub fn has_pending_queries(&self) -> bool {
        !self.monitored_bodies.is_empty() || !self.monitored_areas.is_empty()
    }

    /// Turns the net overlap changes into events, bodies first, and resets them
    pub(crate) fn flush_queries(&mut self, handle: AreaHandle, out: &mut Vec<AreaEvent>) {
        let bodies = std::mem::take(&mut self.monitored_bodies);
        let areas = std::mem::take(&mut self.monitored_areas);

        for (key, state) in bodies.into_iter().chain(areas) {
            let kind = match state {
                0 => continue,
                s if s > 0 => AreaEventKind::Entered,
                _ => AreaEventKind::Exited,
            };
            out.push(AreaEvent {
                area: handle,
                kind,
                other: key.object,
                other_shape: key.object_shape,
                area_shape: key.area_shape,
            });
        }
    }
}
