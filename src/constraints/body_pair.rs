use crate::bodies::{Body, BodyMode, CcdMode, ReportedContact};
use crate::collision::{world_supports, CollisionSolver};
use crate::constraints::{Constraint, SolverContext};
use crate::core::{BodyHandle, ConstraintHandle, SpaceConfig, Storage};
use crate::math::{Transform2D, Vector2, CMP_EPSILON};
use crate::shapes::Shape;

use std::any::Any;

/// Most contacts a body pair keeps at once
pub const MAX_CONTACTS: usize = 2;

/// Collision state of a body pair, carried from one step to the next
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PairState {
    #[default]
    Separated,

    Colliding,

    /// Touching a one-way shape from the wrong side. Stays until the shapes separate.
    OneWaySuppressed,
}

/// A persistent contact point between two bodies
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Contact {
    /// Point on A, in A's orientation relative to A's origin
    pub local_a: Vector2,

    /// Point on B, in B's orientation relative to B's origin
    pub local_b: Vector2,

    /// Penetration direction, from A into B
    pub normal: Vector2,

    pub depth: f32,

    /// World-space offsets of the contact from each body origin
    pub r_a: Vector2,
    pub r_b: Vector2,

    pub acc_normal_impulse: f32,
    pub acc_tangent_impulse: f32,
    pub acc_bias_impulse: f32,

    pub mass_normal: f32,
    pub mass_tangent: f32,
    pub bias: f32,
    pub bounce: f32,

    pub active: bool,

    /// Found again by the narrow-phase this step
    pub reused: bool,
}

/// Transforms needed to store narrow-phase points as contacts
struct ContactFrame {
    a: Transform2D,
    a_inv: Transform2D,
    b: Transform2D,
    b_inv: Transform2D,
    offset_b: Vector2,
    recycle_radius: f32,
}

impl ContactFrame {
    /// Current penetration of a stored contact along its normal
    fn depth(&self, contact: &Contact) -> f32 {
        let global_a = self.a.basis_xform(contact.local_a);
        let global_b = self.b.basis_xform(contact.local_b) + self.offset_b;
        (global_a - global_b).dot(&contact.normal)
    }
}

/// Stores a narrow-phase contact, reusing a cached one within the recycle radius
fn add_contact(contacts: &mut Vec<Contact>, frame: &ContactFrame, point_a: Vector2, point_b: Vector2) {
    let local_a = frame.a_inv.basis_xform(point_a);
    let local_b = frame.b_inv.basis_xform(point_b - frame.offset_b);

    let mut contact = Contact {
        local_a,
        local_b,
        normal: (point_a - point_b).normalize(),
        reused: true,
        ..Contact::default()
    };

    let radius2 = frame.recycle_radius * frame.recycle_radius;
    let recycled = contacts
        .iter()
        .position(|c| c.local_a.distance_squared(&local_a) < radius2 && c.local_b.distance_squared(&local_b) < radius2);

    if let Some(index) = recycled {
        let old = &contacts[index];
        contact.acc_normal_impulse = old.acc_normal_impulse;
        contact.acc_tangent_impulse = old.acc_tangent_impulse;
        contact.acc_bias_impulse = old.acc_bias_impulse;
        contacts[index] = contact;
        return;
    }

    if contacts.len() < MAX_CONTACTS {
        contacts.push(contact);
        return;
    }

    // Full: the least deep of the cached contacts and the new one is dropped
    let mut least_deep = None;
    let mut min_depth = 1e10;
    for (i, c) in contacts.iter().enumerate() {
        let depth = frame.depth(c);
        if depth < min_depth {
            min_depth = depth;
            least_deep = Some(i);
        }
    }

    if frame.depth(&contact) < min_depth {
        return;
    }
    if let Some(index) = least_deep {
        contacts[index] = contact;
    }
}

/// Casts a ray from the leading support point of a fast body along its motion.
///
/// Transforms are relative to the pair origin. Returns whether a contact was emitted.
#[allow(clippy::too_many_arguments)]
fn test_ccd(
    dt: f32,
    body: &Body,
    shape: &dyn Shape,
    xform: &Transform2D,
    other_shape: &dyn Shape,
    other_xform: &Transform2D,
    swap: bool,
    callback: &mut dyn FnMut(Vector2, Vector2),
) -> bool {
    let motion = body.get_linear_velocity() * dt;
    let mlen = motion.length();
    if mlen < CMP_EPSILON {
        return false;
    }

    let mnormal = motion / mlen;
    let (min, max) = shape.project_range(mnormal, xform);

    // Only bodies moving more than a third of their size along the motion
    if mlen <= (max - min) * 0.3 {
        return false;
    }

    let supports = world_supports(shape, xform, mnormal);
    let from = match supports.points().first() {
        Some(point) => *point,
        None => return false,
    };
    let to = from + motion;

    let other_inv = other_xform.affine_inverse();
    let local_from = other_inv.xform(from - mnormal * mlen * 0.1);
    let local_to = other_inv.xform(to);

    let hit = match other_shape.intersect_segment(local_from, local_to) {
        Some((point, _)) => other_xform.xform(point),
        None => return false,
    };

    if swap {
        callback(hit, to);
    } else {
        callback(to, hit);
    }
    true
}

/// Contact constraint between two body shapes
#[derive(Debug, Clone)]
pub struct BodyPair {
    bodies: [BodyHandle; 2],
    shapes: [usize; 2],
    offset_b: Vector2,
    sep_axis: Vector2,
    contacts: Vec<Contact>,
    state: PairState,
}

impl BodyPair {
    pub fn new(body_a: BodyHandle, shape_a: usize, body_b: BodyHandle, shape_b: usize) -> Self {
        Self {
            bodies: [body_a, body_b],
            shapes: [shape_a, shape_b],
            offset_b: Vector2::zero(),
            sep_axis: Vector2::zero(),
            contacts: Vec::with_capacity(MAX_CONTACTS),
            state: PairState::Separated,
        }
    }

    /// Shape indices on A and B
    pub fn get_shapes(&self) -> [usize; 2] {
        self.shapes
    }

    pub fn get_contacts(&self) -> &[Contact] {
        &self.contacts
    }

    pub fn get_state(&self) -> PairState {
        self.state
    }

    fn mark_not_colliding(&mut self) {
        if self.state == PairState::Colliding {
            self.state = PairState::Separated;
        }
    }

    /// Drops contacts left behind last step or drifted beyond the max separation
    fn validate_contacts(&mut self, a: &Body, b: &Body, max_separation: f32) {
        let max_separation2 = max_separation * max_separation;
        let basis_a = a.object.transform;
        let basis_b = b.object.transform;

        let mut i = 0;
        while i < self.contacts.len() {
            let c = &mut self.contacts[i];
            let erase = if !c.reused {
                true
            } else {
                c.reused = false;
                let global_a = basis_a.basis_xform(c.local_a);
                let global_b = basis_b.basis_xform(c.local_b) + self.offset_b;
                let depth = (global_a - global_b).dot(&c.normal);
                depth < -max_separation || (global_b + c.normal * depth - global_a).length_squared() > max_separation2
            };

            if erase {
                self.contacts.swap_remove(i);
            } else {
                i += 1;
            }
        }
    }

    /// Whether a one-way shape of one body lets the other body through.
    ///
    /// `towards_normal` tells on which side of the platform axis a valid normal lies.
    fn one_way_allows(&self, direction: Vector2, other_velocity: Vector2, towards_normal: bool) -> bool {
        if other_velocity.dot(&direction) < 0.0 {
            return false;
        }
        self.contacts.iter().filter(|c| c.reused).any(|c| {
            let d = c.normal.dot(&direction);
            if towards_normal { d >= 0.0 } else { d <= 0.0 }
        })
    }

    fn setup_bodies(&mut self, a: &mut Body, b: &mut Body, config: &SpaceConfig, dt: f32) -> bool {
        let [handle_a, handle_b] = self.bodies;
        let [shape_a_index, shape_b_index] = self.shapes;

        if !a.object.interacts_with(&b.object)
            || a.has_exception(handle_b)
            || b.has_exception(handle_a)
            || (a.get_mode().is_immovable()
                && b.get_mode().is_immovable()
                && !a.can_report_contacts()
                && !b.can_report_contacts())
        {
            self.mark_not_colliding();
            return false;
        }

        if a.object.is_shape_disabled(shape_a_index) || b.object.is_shape_disabled(shape_b_index) {
            self.mark_not_colliding();
            return false;
        }

        let (shape_a, shape_b) = match (a.object.get_shape(shape_a_index), b.object.get_shape(shape_b_index)) {
            (Some(sa), Some(sb)) => (sa.clone(), sb.clone()),
            _ => {
                self.mark_not_colliding();
                return false;
            }
        };

        // Work relative to A's origin to keep precision far from the world origin
        let offset_a = a.object.transform.origin;
        self.offset_b = b.object.transform.origin - offset_a;
        self.validate_contacts(a, b, config.contact_max_separation);

        let xform_au = a.object.transform.untranslated();
        let xform_a = xform_au * a.object.get_shape_transform(shape_a_index);
        let xform_bu = b.object.transform.translated(-offset_a);
        let xform_b = xform_bu * b.object.get_shape_transform(shape_b_index);

        let motion_a = if a.get_ccd_mode() == CcdMode::CastShape { a.get_motion() } else { Vector2::zero() };
        let motion_b = if b.get_ccd_mode() == CcdMode::CastShape { b.get_motion() } else { Vector2::zero() };

        let frame = ContactFrame {
            a: a.object.transform,
            a_inv: a.object.inv_transform,
            b: b.object.transform,
            b_inv: b.object.inv_transform,
            offset_b: self.offset_b,
            recycle_radius: config.contact_recycle_radius,
        };

        let contacts = &mut self.contacts;
        let mut callback = |point_a: Vector2, point_b: Vector2| add_contact(contacts, &frame, point_a, point_b);

        let mut collided = CollisionSolver::solve(
            &*shape_a,
            &xform_a,
            motion_a,
            &*shape_b,
            &xform_b,
            motion_b,
            Some(&mut callback),
            Some(&mut self.sep_axis),
            0.0,
            0.0,
        );

        if !collided {
            if a.get_ccd_mode() == CcdMode::CastRay
                && a.get_mode() > BodyMode::Kinematic
                && test_ccd(dt, a, &*shape_a, &xform_a, &*shape_b, &xform_b, false, &mut callback)
            {
                collided = true;
            }

            if b.get_ccd_mode() == CcdMode::CastRay
                && b.get_mode() > BodyMode::Kinematic
                && test_ccd(dt, b, &*shape_b, &xform_b, &*shape_a, &xform_a, true, &mut callback)
            {
                collided = true;
            }

            if !collided {
                self.state = PairState::Separated;
                return false;
            }
        }

        if self.state == PairState::OneWaySuppressed {
            return false;
        }

        if a.object.is_shape_one_way_collision(shape_a_index)
            && !self.one_way_allows(xform_a.y.normalize(), b.get_linear_velocity(), false)
        {
            self.state = PairState::OneWaySuppressed;
            return false;
        }

        if b.object.is_shape_one_way_collision(shape_b_index)
            && !self.one_way_allows(xform_b.y.normalize(), a.get_linear_velocity(), true)
        {
            self.state = PairState::OneWaySuppressed;
            return false;
        }

        self.state = PairState::Colliding;

        let max_penetration = config.contact_max_allowed_penetration;
        let (bias_a, bias_b) = (shape_a.get_custom_bias(), shape_b.get_custom_bias());
        let bias = match (bias_a != 0.0, bias_b != 0.0) {
            (false, false) => config.constraint_default_bias,
            (false, true) => bias_b,
            (true, false) => bias_a,
            (true, true) => (bias_a + bias_b) * 0.5,
        };

        let inv_dt = 1.0 / dt;
        let bounce = a.get_material().combine_bounce(&b.get_material());
        let mut do_process = false;

        for c in self.contacts.iter_mut() {
            let global_a = xform_au.xform(c.local_a);
            let global_b = xform_bu.xform(c.local_b);
            let depth = c.normal.dot(&(global_a - global_b));

            if depth <= 0.0 || !c.reused {
                c.active = false;
                continue;
            }

            c.active = true;
            c.r_a = global_a;
            c.r_b = global_b - self.offset_b;

            if a.can_report_contacts() {
                a.add_contact(ReportedContact {
                    position: global_a + offset_a,
                    normal: -c.normal,
                    depth,
                    local_shape: shape_a_index,
                    collider_position: global_b + offset_a,
                    collider_shape: shape_b_index,
                    collider: handle_b,
                    collider_velocity: b.velocity_at_offset(c.r_b),
                });
            }

            if b.can_report_contacts() {
                b.add_contact(ReportedContact {
                    position: global_b + offset_a,
                    normal: c.normal,
                    depth,
                    local_shape: shape_b_index,
                    collider_position: global_a + offset_a,
                    collider_shape: shape_a_index,
                    collider: handle_a,
                    collider_velocity: a.velocity_at_offset(c.r_a),
                });
            }

            if a.get_mode().is_immovable() && b.get_mode().is_immovable() {
                c.active = false;
                continue;
            }

            do_process = true;

            // Precompute normal mass, tangent mass, and bias
            let rn_a = c.r_a.dot(&c.normal);
            let rn_b = c.r_b.dot(&c.normal);
            let k_normal = a.get_inv_mass()
                + b.get_inv_mass()
                + a.get_inv_inertia() * (c.r_a.dot(&c.r_a) - rn_a * rn_a)
                + b.get_inv_inertia() * (c.r_b.dot(&c.r_b) - rn_b * rn_b);
            c.mass_normal = 1.0 / k_normal;

            let tangent = c.normal.tangent();
            let rt_a = c.r_a.dot(&tangent);
            let rt_b = c.r_b.dot(&tangent);
            let k_tangent = a.get_inv_mass()
                + b.get_inv_mass()
                + a.get_inv_inertia() * (c.r_a.dot(&c.r_a) - rt_a * rt_a)
                + b.get_inv_inertia() * (c.r_b.dot(&c.r_b) - rt_b * rt_b);
            c.mass_tangent = 1.0 / k_tangent;

            c.bias = -bias * inv_dt * (max_penetration - depth).min(0.0);
            c.depth = depth;

            // Warm start
            let p = c.normal * c.acc_normal_impulse + tangent * c.acc_tangent_impulse;
            a.apply_impulse(c.r_a, -p);
            b.apply_impulse(c.r_b, p);

            c.bounce = bounce;
            if c.bounce != 0.0 {
                let dv = b.velocity_at_offset(c.r_b) - a.velocity_at_offset(c.r_a);
                c.bounce *= dv.dot(&c.normal);
            }
        }

        do_process
    }

    fn solve_bodies(&mut self, a: &mut Body, b: &mut Body) {
        let friction = a.get_material().combine_friction(&b.get_material());

        for c in self.contacts.iter_mut().filter(|c| c.active) {
            let dv = b.velocity_at_offset(c.r_b) - a.velocity_at_offset(c.r_a);
            let dbv = b.biased_velocity_at_offset(c.r_b) - a.biased_velocity_at_offset(c.r_a);

            let vn = dv.dot(&c.normal);
            let vbn = dbv.dot(&c.normal);
            let tangent = c.normal.tangent();
            let vt = dv.dot(&tangent);

            // Position correction goes through the biased velocities only
            let jbn = (c.bias - vbn) * c.mass_normal;
            let jbn_old = c.acc_bias_impulse;
            c.acc_bias_impulse = (jbn_old + jbn).max(0.0);
            let jb = c.normal * (c.acc_bias_impulse - jbn_old);
            a.apply_bias_impulse(c.r_a, -jb);
            b.apply_bias_impulse(c.r_b, jb);

            let jn = -(c.bounce + vn) * c.mass_normal;
            let jn_old = c.acc_normal_impulse;
            c.acc_normal_impulse = (jn_old + jn).max(0.0);

            let jt_max = friction * c.acc_normal_impulse;
            let jt = -vt * c.mass_tangent;
            let jt_old = c.acc_tangent_impulse;
            c.acc_tangent_impulse = (jt_old + jt).clamp(-jt_max, jt_max);

            let j = c.normal * (c.acc_normal_impulse - jn_old) + tangent * (c.acc_tangent_impulse - jt_old);
            a.apply_impulse(c.r_a, -j);
            b.apply_impulse(c.r_b, j);
        }
    }
}

impl Constraint for BodyPair {
    fn constraint_type(&self) -> &'static str {
        "BodyPair"
    }

    fn get_bodies(&self) -> &[BodyHandle] {
        &self.bodies
    }

    fn setup(&mut self, ctx: &mut SolverContext<'_>, dt: f32) -> bool {
        let config = ctx.config;
        match ctx.bodies.get2_mut(self.bodies[0], self.bodies[1]) {
            Some((a, b)) => self.setup_bodies(a, b, config, dt),
            None => {
                self.mark_not_colliding();
                false
            }
        }
    }

    fn solve(&mut self, ctx: &mut SolverContext<'_>, _dt: f32) {
        if self.state != PairState::Colliding {
            return;
        }
        if let Some((a, b)) = ctx.bodies.get2_mut(self.bodies[0], self.bodies[1]) {
            self.solve_bodies(a, b);
        }
    }

    fn release(&mut self, ctx: &mut SolverContext<'_>, handle: ConstraintHandle) {
        for body in self.bodies {
            if let Some(body) = ctx.bodies.get_mut(body) {
                body.remove_constraint(handle);
            }
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
