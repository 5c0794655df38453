use crate::bodies::{Area, AreaOverrideMode, BodyMode, BodyParameter, CcdMode, CollisionObject, Material};
use crate::core::{AreaHandle, BodyHandle, ConstraintHandle, HandleStorage, SpaceConfig, Storage};
use crate::error::PhysicsError;
use crate::math::{wrap_angle, Transform2D, Vector2};
use crate::Result;

use log::debug;
use std::collections::{BTreeMap, BTreeSet};

/// A contact recorded for the user during the last step
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReportedContact {
    /// Contact point on this body, in world space
    pub position: Vector2,

    /// Contact normal pointing away from the other body
    pub normal: Vector2,

    pub depth: f32,

    /// Shape index on this body
    pub local_shape: usize,

    /// Contact point on the other body, in world space
    pub collider_position: Vector2,

    pub collider_shape: usize,

    pub collider: BodyHandle,

    /// Velocity of the other body at the contact point
    pub collider_velocity: Vector2,
}

/// An area the body is inside of, counted once per overlapping shape pair
#[derive(Debug, Clone, Copy)]
struct AreaRef {
    area: AreaHandle,
    refcount: u32,
}

/// A simulated body
#[derive(Debug, Clone)]
pub struct Body {
    pub(crate) object: CollisionObject,

    mode: BodyMode,
    ccd_mode: CcdMode,
    material: Material,

    mass: f32,
    inv_mass: f32,
    inertia: f32,
    inv_inertia: f32,
    user_inertia: bool,

    gravity_scale: f32,
    linear_damp: f32,
    angular_damp: f32,

    linear_velocity: Vector2,
    angular_velocity: f32,
    biased_linear_velocity: Vector2,
    biased_angular_velocity: f32,

    applied_force: Vector2,
    applied_torque: f32,

    /// Gravity and damping found by the last force integration
    gravity: Vector2,
    area_linear_damp: f32,
    area_angular_damp: f32,

    /// Motion swept during the current step, used by shape casting CCD
    motion: Vector2,

    /// Target transform of kinematic bodies, previous transform of CCD bodies
    new_transform: Transform2D,
    first_time_kinematic: bool,

    omit_force_integration: bool,
    can_sleep: bool,
    active: bool,
    still_time: f32,

    areas: Vec<AreaRef>,
    pub(crate) constraints: BTreeMap<ConstraintHandle, usize>,
    exceptions: BTreeSet<BodyHandle>,

    contacts: Vec<ReportedContact>,
    max_contacts_reported: usize,

    pub(crate) pending_inertia_update: bool,
}

impl Body {
    /// Creates a body in the given mode with unit mass and no shapes
    pub fn new(mode: BodyMode) -> Self {
        let mut body = Self {
            object: CollisionObject::new(mode == BodyMode::Static),
            mode: BodyMode::Rigid,
            ccd_mode: CcdMode::Disabled,
            material: Material::default(),
            mass: 1.0,
            inv_mass: 1.0,
            inertia: 0.0,
            inv_inertia: 0.0,
            user_inertia: false,
            gravity_scale: 1.0,
            linear_damp: -1.0,
            angular_damp: -1.0,
            linear_velocity: Vector2::zero(),
            angular_velocity: 0.0,
            biased_linear_velocity: Vector2::zero(),
            biased_angular_velocity: 0.0,
            applied_force: Vector2::zero(),
            applied_torque: 0.0,
            gravity: Vector2::zero(),
            area_linear_damp: 0.0,
            area_angular_damp: 0.0,
            motion: Vector2::zero(),
            new_transform: Transform2D::identity(),
            first_time_kinematic: false,
            omit_force_integration: false,
            can_sleep: true,
            active: true,
            still_time: 0.0,
            areas: Vec::new(),
            constraints: BTreeMap::new(),
            exceptions: BTreeSet::new(),
            contacts: Vec::new(),
            max_contacts_reported: 0,
            pending_inertia_update: true,
        };
        body.set_mode(mode);
        body
    }

    /// Returns the shared collision object state
    pub fn object(&self) -> &CollisionObject {
        &self.object
    }

    /// Mutable access to the collision object, for shape transforms, metadata and layers
    pub fn object_mut(&mut self) -> &mut CollisionObject {
        &mut self.object
    }

    pub fn get_mode(&self) -> BodyMode {
        self.mode
    }

    /// Switches the body mode, resetting mass properties and activity
    pub fn set_mode(&mut self, mode: BodyMode) {
        let previous = self.mode;
        self.mode = mode;

        match mode {
            BodyMode::Static | BodyMode::Kinematic => {
                self.object.inv_transform = self.object.transform.affine_inverse();
                self.inv_mass = 0.0;
                self.inv_inertia = 0.0;
                self.object.is_static = mode == BodyMode::Static;
                self.object.mark_shapes_changed();
                self.set_active(mode == BodyMode::Kinematic && self.max_contacts_reported > 0);
                self.linear_velocity = Vector2::zero();
                self.angular_velocity = 0.0;
                if mode == BodyMode::Kinematic && previous != BodyMode::Kinematic {
                    self.first_time_kinematic = true;
                }
            }
            BodyMode::Rigid | BodyMode::Character => {
                self.inv_mass = if self.mass > 0.0 { 1.0 / self.mass } else { 0.0 };
                self.object.is_static = false;
                self.object.mark_shapes_changed();
                self.set_active(true);
                if mode == BodyMode::Character {
                    self.angular_velocity = 0.0;
                }
            }
        }

        self.pending_inertia_update = true;
    }

    pub fn get_ccd_mode(&self) -> CcdMode {
        self.ccd_mode
    }

    pub fn set_ccd_mode(&mut self, mode: CcdMode) {
        self.ccd_mode = mode;
    }

    pub fn get_material(&self) -> Material {
        self.material
    }

    pub fn set_material(&mut self, material: Material) {
        self.material = material;
    }

    /// Sets a scalar parameter. Mass must be positive.
    pub fn set_param(&mut self, param: BodyParameter, value: f32) -> Result<()> {
        if !value.is_finite() {
            return Err(PhysicsError::InvalidParameter(format!("{:?} must be finite, got {}", param, value)));
        }

        match param {
            BodyParameter::Bounce => self.material.bounce = value,
            BodyParameter::Friction => self.material.friction = value,
            BodyParameter::Mass => {
                if value <= 0.0 {
                    return Err(PhysicsError::InvalidParameter(format!("Mass must be positive, got {}", value)));
                }
                self.mass = value;
                self.pending_inertia_update = true;
            }
            BodyParameter::Inertia => {
                if value <= 0.0 {
                    self.user_inertia = false;
                } else {
                    self.user_inertia = true;
                    self.inertia = value;
                }
                self.pending_inertia_update = true;
            }
            BodyParameter::GravityScale => self.gravity_scale = value,
            BodyParameter::LinearDamp => self.linear_damp = value,
            BodyParameter::AngularDamp => self.angular_damp = value,
        }
        Ok(())
    }

    pub fn get_param(&self, param: BodyParameter) -> f32 {
        match param {
            BodyParameter::Bounce => self.material.bounce,
            BodyParameter::Friction => self.material.friction,
            BodyParameter::Mass => self.mass,
            BodyParameter::Inertia => self.inertia,
            BodyParameter::GravityScale => self.gravity_scale,
            BodyParameter::LinearDamp => self.linear_damp,
            BodyParameter::AngularDamp => self.angular_damp,
        }
    }

    /// Recomputes inverse mass and inertia from the mode and the cached shape AABBs.
    ///
    /// Mass is distributed between shapes in proportion to their AABB area.
    pub fn update_inertia(&mut self) {
        self.pending_inertia_update = false;

        match self.mode {
            BodyMode::Rigid => {
                if !self.user_inertia {
                    let shapes = &self.object.shapes;
                    let total_area: f32 = shapes.iter().map(|s| s.aabb_cache.area()).sum();

                    self.inertia = 0.0;
                    if total_area > 0.0 {
                        for instance in shapes.iter().filter(|s| !s.disabled) {
                            let mass = instance.aabb_cache.area() * self.mass / total_area;
                            let scale = instance.xform.scale();
                            self.inertia += instance.shape.get_moment_of_inertia(mass, scale)
                                + mass * instance.xform.origin.length_squared();
                        }
                    }
                }
                self.inv_inertia = if self.inertia > 0.0 { 1.0 / self.inertia } else { 0.0 };
                self.inv_mass = if self.mass > 0.0 { 1.0 / self.mass } else { 0.0 };
            }
            BodyMode::Static | BodyMode::Kinematic => {
                self.inv_inertia = 0.0;
                self.inv_mass = 0.0;
            }
            BodyMode::Character => {
                self.inv_inertia = 0.0;
                self.inv_mass = 1.0 / self.mass;
            }
        }
    }

    pub fn get_mass(&self) -> f32 {
        self.mass
    }

    pub fn get_inv_mass(&self) -> f32 {
        self.inv_mass
    }

    pub fn get_inertia(&self) -> f32 {
        self.inertia
    }

    pub fn get_inv_inertia(&self) -> f32 {
        self.inv_inertia
    }

    pub fn get_gravity_scale(&self) -> f32 {
        self.gravity_scale
    }

    pub fn get_transform(&self) -> Transform2D {
        self.object.transform
    }

    /// Sets the transform the way a user would.
    ///
    /// Kinematic bodies only queue the transform as a target reached at the end of the
    /// next step; the first one after entering kinematic mode is applied immediately.
    pub fn set_state_transform(&mut self, transform: Transform2D) {
        match self.mode {
            BodyMode::Kinematic => {
                self.new_transform = transform;
                self.set_active(true);
                if self.first_time_kinematic {
                    self.object.set_transform_internal(transform, true);
                    self.first_time_kinematic = false;
                }
            }
            BodyMode::Static => {
                self.object.set_transform_internal(transform, true);
            }
            BodyMode::Rigid | BodyMode::Character => {
                if transform == self.object.transform {
                    return;
                }
                self.new_transform = self.object.transform;
                self.object.set_transform_internal(transform, true);
            }
        }
        self.wakeup();
    }

    pub fn get_linear_velocity(&self) -> Vector2 {
        self.linear_velocity
    }

    pub fn set_linear_velocity(&mut self, velocity: Vector2) {
        self.linear_velocity = velocity;
        self.wakeup();
    }

    pub fn get_angular_velocity(&self) -> f32 {
        self.angular_velocity
    }

    pub fn set_angular_velocity(&mut self, velocity: f32) {
        self.angular_velocity = velocity;
        self.wakeup();
    }

    pub fn get_biased_linear_velocity(&self) -> Vector2 {
        self.biased_linear_velocity
    }

    pub fn get_biased_angular_velocity(&self) -> f32 {
        self.biased_angular_velocity
    }

    /// Velocity of the body at a world-space offset from its origin
    pub fn velocity_at_offset(&self, offset: Vector2) -> Vector2 {
        Vector2::new(-self.angular_velocity * offset.y, self.angular_velocity * offset.x) + self.linear_velocity
    }

    /// Position-correction velocity at a world-space offset from the origin
    pub fn biased_velocity_at_offset(&self, offset: Vector2) -> Vector2 {
        Vector2::new(-self.biased_angular_velocity * offset.y, self.biased_angular_velocity * offset.x)
            + self.biased_linear_velocity
    }

    pub fn get_motion(&self) -> Vector2 {
        self.motion
    }

    /// Total gravity found by the last force integration
    pub fn get_gravity(&self) -> Vector2 {
        self.gravity
    }

    /// Linear and angular damping used by the last force integration
    pub fn get_total_damping(&self) -> (f32, f32) {
        (self.area_linear_damp, self.area_angular_damp)
    }

    pub fn get_applied_force(&self) -> Vector2 {
        self.applied_force
    }

    pub fn set_applied_force(&mut self, force: Vector2) {
        self.applied_force = force;
        self.wakeup();
    }

    pub fn get_applied_torque(&self) -> f32 {
        self.applied_torque
    }

    pub fn set_applied_torque(&mut self, torque: f32) {
        self.applied_torque = torque;
        self.wakeup();
    }

    /// Adds a force applied at `offset` from the origin, in world orientation
    pub fn add_force(&mut self, offset: Vector2, force: Vector2) {
        self.applied_force += force;
        self.applied_torque += offset.cross(&force);
        self.wakeup();
    }

    pub fn add_central_force(&mut self, force: Vector2) {
        self.applied_force += force;
        self.wakeup();
    }

    pub fn add_torque(&mut self, torque: f32) {
        self.applied_torque += torque;
        self.wakeup();
    }

    /// Applies an impulse at `offset` from the origin
    #[inline]
    pub fn apply_impulse(&mut self, offset: Vector2, impulse: Vector2) {
        self.linear_velocity += impulse * self.inv_mass;
        self.angular_velocity += self.inv_inertia * offset.cross(&impulse);
    }

    /// Applies an impulse to the position-correction velocities only
    #[inline]
    pub fn apply_bias_impulse(&mut self, offset: Vector2, impulse: Vector2) {
        self.biased_linear_velocity += impulse * self.inv_mass;
        self.biased_angular_velocity += self.inv_inertia * offset.cross(&impulse);
    }

    pub fn apply_central_impulse(&mut self, impulse: Vector2) {
        self.linear_velocity += impulse * self.inv_mass;
        self.wakeup();
    }

    pub fn apply_torque_impulse(&mut self, torque: f32) {
        self.angular_velocity += self.inv_inertia * torque;
        self.wakeup();
    }

    pub fn is_omitting_force_integration(&self) -> bool {
        self.omit_force_integration
    }

    /// Skips gravity, damping and applied forces during force integration
    pub fn set_omit_force_integration(&mut self, omit: bool) {
        self.omit_force_integration = omit;
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub(crate) fn set_active(&mut self, active: bool) {
        if self.active != active {
            debug!("Body {} ({:?})", if active { "activated" } else { "deactivated" }, self.mode);
            self.active = active;
        }
    }

    /// Wakes the body up; static and kinematic bodies are unaffected
    pub fn wakeup(&mut self) {
        if self.mode.is_immovable() {
            return;
        }
        self.still_time = 0.0;
        self.set_active(true);
    }

    /// Puts the body to sleep (stopping it) or wakes it up
    pub fn set_sleeping(&mut self, sleeping: bool) {
        if self.mode.is_immovable() {
            return;
        }
        if sleeping {
            self.linear_velocity = Vector2::zero();
            self.angular_velocity = 0.0;
            self.set_active(false);
        } else {
            self.set_active(true);
        }
    }

    pub fn is_sleeping(&self) -> bool {
        !self.active
    }

    pub fn can_sleep(&self) -> bool {
        self.can_sleep
    }

    pub fn set_can_sleep(&mut self, can_sleep: bool) {
        self.can_sleep = can_sleep;
        if self.mode >= BodyMode::Rigid && !self.active && !can_sleep {
            self.set_active(true);
        }
    }

    /// Time the body has spent below both sleep thresholds
    pub fn get_still_time(&self) -> f32 {
        self.still_time
    }

    pub fn add_collision_exception(&mut self, other: BodyHandle) {
        self.exceptions.insert(other);
    }

    pub fn remove_collision_exception(&mut self, other: BodyHandle) {
        self.exceptions.remove(&other);
    }

    pub fn has_exception(&self, other: BodyHandle) -> bool {
        self.exceptions.contains(&other)
    }

    /// Constraints the body takes part in, with the body's slot in each
    pub fn get_constraint_map(&self) -> &BTreeMap<ConstraintHandle, usize> {
        &self.constraints
    }

    pub(crate) fn add_constraint(&mut self, constraint: ConstraintHandle, slot: usize) {
        self.constraints.insert(constraint, slot);
    }

    pub(crate) fn remove_constraint(&mut self, constraint: ConstraintHandle) {
        self.constraints.remove(&constraint);
    }

    pub(crate) fn add_area(&mut self, area: AreaHandle) {
        match self.areas.iter_mut().find(|r| r.area == area) {
            Some(entry) => entry.refcount += 1,
            None => self.areas.push(AreaRef { area, refcount: 1 }),
        }
    }

    pub(crate) fn remove_area(&mut self, area: AreaHandle) {
        if let Some(index) = self.areas.iter().position(|r| r.area == area) {
            self.areas[index].refcount -= 1;
            if self.areas[index].refcount == 0 {
                self.areas.remove(index);
            }
        }
    }

    /// Areas currently affecting this body
    pub fn get_areas(&self) -> Vec<AreaHandle> {
        self.areas.iter().map(|r| r.area).collect()
    }

    pub fn get_max_contacts_reported(&self) -> usize {
        self.max_contacts_reported
    }

    /// Sets how many contacts the body records per step (0 disables reporting)
    pub fn set_max_contacts_reported(&mut self, max: usize) {
        self.max_contacts_reported = max;
        self.contacts.clear();
        if self.mode == BodyMode::Kinematic && max > 0 {
            self.set_active(true);
        }
    }

    pub fn can_report_contacts(&self) -> bool {
        self.max_contacts_reported > 0
    }

    /// Contacts recorded during the last step
    pub fn get_contacts(&self) -> &[ReportedContact] {
        &self.contacts
    }

    /// Records a contact, replacing the shallowest one when the buffer is full
    pub fn add_contact(&mut self, contact: ReportedContact) {
        if self.max_contacts_reported == 0 {
            return;
        }

        if self.contacts.len() < self.max_contacts_reported {
            self.contacts.push(contact);
            return;
        }

        let shallowest = self
            .contacts
            .iter()
            .enumerate()
            .min_by(|(_, a), (_, b)| a.depth.total_cmp(&b.depth))
            .map(|(i, c)| (i, c.depth));

        if let Some((index, depth)) = shallowest {
            if depth < contact.depth {
                self.contacts[index] = contact;
            }
        }
    }

    fn accumulate_area(&mut self, area: &Area) {
        if area.is_gravity_point() {
            let center = area.object.transform.xform(area.get_gravity_vector());
            let v = center - self.object.transform.origin;
            if area.get_gravity_distance_scale() > 0.0 {
                let falloff = v.length() * area.get_gravity_distance_scale() + 1.0;
                self.gravity += v.normalize() * (area.get_gravity() / (falloff * falloff));
            } else {
                self.gravity += v.normalize() * area.get_gravity();
            }
        } else {
            self.gravity += area.get_gravity_vector() * area.get_gravity();
        }

        self.area_linear_damp += area.get_linear_damp();
        self.area_angular_damp += area.get_angular_damp();
    }

    /// Gathers gravity and damping from the overlapping areas, then integrates forces into
    /// velocities. Kinematic bodies derive their velocities from the queued transform instead.
    pub fn integrate_forces(&mut self, dt: f32, areas: &HandleStorage<AreaHandle, Area>, default_area: &Area) {
        if self.mode == BodyMode::Static {
            return;
        }

        let mut overlapping: Vec<&Area> = self.areas.iter().filter_map(|r| areas.get(r.area)).collect();
        overlapping.sort_by(|a, b| a.get_priority().total_cmp(&b.get_priority()));

        self.gravity = Vector2::zero();
        self.area_linear_damp = 0.0;
        self.area_angular_damp = 0.0;

        let mut stopped = false;
        for area in overlapping.iter().rev() {
            let mode = area.get_space_override_mode();
            match mode {
                AreaOverrideMode::Combine | AreaOverrideMode::CombineReplace => {
                    self.accumulate_area(area);
                    stopped = mode == AreaOverrideMode::CombineReplace;
                }
                AreaOverrideMode::Replace | AreaOverrideMode::ReplaceCombine => {
                    self.gravity = Vector2::zero();
                    self.area_linear_damp = 0.0;
                    self.area_angular_damp = 0.0;
                    self.accumulate_area(area);
                    stopped = mode == AreaOverrideMode::Replace;
                }
                AreaOverrideMode::Disabled => {}
            }
            if stopped {
                break;
            }
        }

        if !stopped {
            self.accumulate_area(default_area);
        }

        self.gravity *= self.gravity_scale;

        // Body damping overrides the area damping
        if self.angular_damp >= 0.0 {
            self.area_angular_damp = self.angular_damp;
        }
        if self.linear_damp >= 0.0 {
            self.area_linear_damp = self.linear_damp;
        }

        let mut motion = None;

        if self.mode == BodyMode::Kinematic {
            let delta = self.new_transform.origin - self.object.transform.origin;
            self.linear_velocity = delta / dt;

            let rotation = self.new_transform.rotation() - self.object.transform.rotation();
            self.angular_velocity = wrap_angle(rotation) / dt;

            motion = Some(delta);
        } else {
            if !self.omit_force_integration {
                let force = self.gravity * self.mass + self.applied_force;
                let torque = self.applied_torque;

                let damp = (1.0 - dt * self.area_linear_damp).max(0.0);
                let angular_damp = (1.0 - dt * self.area_angular_damp).max(0.0);

                self.linear_velocity *= damp;
                self.angular_velocity *= angular_damp;

                self.linear_velocity += force * (self.inv_mass * dt);
                self.angular_velocity += self.inv_inertia * torque * dt;
            }

            if self.ccd_mode != CcdMode::Disabled {
                motion = Some(self.linear_velocity * dt);
            }
        }

        self.motion = motion.unwrap_or_default();
        self.biased_linear_velocity = Vector2::zero();
        self.biased_angular_velocity = 0.0;

        if let Some(motion) = motion {
            self.object.mark_shapes_moving(motion);
        }

        self.contacts.clear();
    }

    /// Moves the body by its velocities plus the position-correction velocities, which are
    /// then cleared. Kinematic bodies snap to their queued transform.
    pub fn integrate_velocities(&mut self, dt: f32) {
        match self.mode {
            BodyMode::Static => {}
            BodyMode::Kinematic => {
                self.object.set_transform_internal(self.new_transform, false);
                if self.max_contacts_reported == 0
                    && self.linear_velocity.is_zero()
                    && self.angular_velocity == 0.0
                {
                    // Stopped moving
                    self.object.mark_shapes_changed();
                    self.set_active(false);
                }
            }
            BodyMode::Rigid | BodyMode::Character => {
                let total_angular_velocity = self.angular_velocity + self.biased_angular_velocity;
                let total_linear_velocity = self.linear_velocity + self.biased_linear_velocity;

                let angle = self.object.transform.rotation() + total_angular_velocity * dt;
                let position = self.object.transform.origin + total_linear_velocity * dt;

                let ccd = self.ccd_mode != CcdMode::Disabled;
                self.object
                    .set_transform_internal(Transform2D::from_rotation_translation(angle, position), !ccd);
                if ccd {
                    self.new_transform = self.object.transform;
                }

                self.biased_linear_velocity = Vector2::zero();
                self.biased_angular_velocity = 0.0;
            }
        }
    }

    /// Advances the sleep timer and reports whether the body may fall asleep
    pub fn sleep_test(&mut self, dt: f32, config: &SpaceConfig) -> bool {
        match self.mode {
            BodyMode::Static | BodyMode::Kinematic => true,
            BodyMode::Character => !self.active,
            BodyMode::Rigid if !self.can_sleep => false,
            BodyMode::Rigid => {
                let linear_threshold = config.body_linear_velocity_sleep_threshold;
                if self.angular_velocity.abs() < config.body_angular_velocity_sleep_threshold
                    && self.linear_velocity.length_squared() < linear_threshold * linear_threshold
                {
                    self.still_time += dt;
                    self.still_time > config.body_time_to_sleep
                } else {
                    self.still_time = 0.0;
                    false
                }
            }
        }
    }
}
