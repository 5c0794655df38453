use crate::bodies::{Body, ReportedContact};
use crate::math::{Transform2D, Vector2};

/// Read/write access to a body's live simulation state.
///
/// Obtained from `Space::body_direct_state`; valid between steps.
pub struct DirectBodyState<'a> {
    body: &'a mut Body,
    step: f32,
}

impl<'a> DirectBodyState<'a> {
    pub(crate) fn new(body: &'a mut Body, step: f32) -> Self {
        Self { body, step }
    }

    /// Gravity applied during the last step
    pub fn get_total_gravity(&self) -> Vector2 {
        self.body.get_gravity()
    }

    pub fn get_total_linear_damp(&self) -> f32 {
        self.body.get_total_damping().0
    }

    pub fn get_total_angular_damp(&self) -> f32 {
        self.body.get_total_damping().1
    }

    pub fn get_inverse_mass(&self) -> f32 {
        self.body.get_inv_mass()
    }

    pub fn get_inverse_inertia(&self) -> f32 {
        self.body.get_inv_inertia()
    }

    pub fn get_linear_velocity(&self) -> Vector2 {
        self.body.get_linear_velocity()
    }

    pub fn set_linear_velocity(&mut self, velocity: Vector2) {
        self.body.set_linear_velocity(velocity);
    }

    pub fn get_angular_velocity(&self) -> f32 {
        self.body.get_angular_velocity()
    }

    pub fn set_angular_velocity(&mut self, velocity: f32) {
        self.body.set_angular_velocity(velocity);
    }

    pub fn get_transform(&self) -> Transform2D {
        self.body.get_transform()
    }

    /// Sets the transform; the broad-phase picks it up on the next space update
    pub fn set_transform(&mut self, transform: Transform2D) {
        self.body.set_state_transform(transform);
    }

    /// Velocity of the body at a world-space point
    pub fn get_velocity_at_local_position(&self, position: Vector2) -> Vector2 {
        self.body.velocity_at_offset(position - self.body.get_transform().origin)
    }

    pub fn add_central_force(&mut self, force: Vector2) {
        self.body.add_central_force(force);
    }

    pub fn add_force(&mut self, offset: Vector2, force: Vector2) {
        self.body.add_force(offset, force);
    }

    pub fn add_torque(&mut self, torque: f32) {
        self.body.add_torque(torque);
    }

    pub fn apply_central_impulse(&mut self, impulse: Vector2) {
        self.body.apply_central_impulse(impulse);
    }

    pub fn apply_impulse(&mut self, offset: Vector2, impulse: Vector2) {
        self.body.apply_impulse(offset, impulse);
        self.body.wakeup();
    }

    pub fn apply_torque_impulse(&mut self, torque: f32) {
        self.body.apply_torque_impulse(torque);
    }

    pub fn set_sleep_state(&mut self, sleeping: bool) {
        self.body.set_sleeping(sleeping);
    }

    pub fn is_sleeping(&self) -> bool {
        self.body.is_sleeping()
    }

    pub fn get_contact_count(&self) -> usize {
        self.body.get_contacts().len()
    }

    /// Returns a contact recorded during the last step
    pub fn get_contact(&self, index: usize) -> Option<&ReportedContact> {
        self.body.get_contacts().get(index)
    }

    /// Length of the last step
    pub fn get_step(&self) -> f32 {
        self.step
    }

    /// Integrates gravity and damping by hand, for bodies that omit force integration
    pub fn integrate_forces(&mut self) {
        let (linear_damp, angular_damp) = self.body.get_total_damping();
        let step = self.step;

        let mut velocity = self.body.get_linear_velocity();
        velocity += self.body.get_gravity() * step;
        velocity *= (1.0 - step * linear_damp).max(0.0);
        self.body.set_linear_velocity(velocity);

        let angular = self.body.get_angular_velocity() * (1.0 - step * angular_damp).max(0.0);
        self.body.set_angular_velocity(angular);
    }
}
