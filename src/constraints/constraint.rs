use crate::bodies::{Area, Body};
use crate::core::{AreaHandle, BodyHandle, ConstraintHandle, HandleStorage, SpaceConfig};
use std::any::Any;
use std::fmt::Debug;

/// Everything a constraint may touch while it is set up, solved or released
pub struct SolverContext<'a> {
    pub bodies: &'a mut HandleStorage<BodyHandle, Body>,
    pub areas: &'a mut HandleStorage<AreaHandle, Area>,
    pub config: &'a SpaceConfig,
}

/// Base trait for constraint pairs
pub trait Constraint: Send + Sync + Debug + 'static {
    /// Returns the type name of the constraint
    fn constraint_type(&self) -> &'static str;

    /// Returns the bodies involved in the constraint. A body's slot is its index here.
    fn get_bodies(&self) -> &[BodyHandle];

    /// Checks if the constraint involves a specific body
    fn involves_body(&self, body: BodyHandle) -> bool {
        self.get_bodies().contains(&body)
    }

    /// Runs collision detection and prepares solving. Returns whether `solve` has work to do.
    fn setup(&mut self, ctx: &mut SolverContext<'_>, dt: f32) -> bool;

    /// One solver iteration
    fn solve(&mut self, ctx: &mut SolverContext<'_>, dt: f32);

    /// Undoes the side effects of the pair and detaches it from its participants
    fn release(&mut self, ctx: &mut SolverContext<'_>, handle: ConstraintHandle);

    /// Returns a dynamic reference to any for downcasting
    fn as_any(&self) -> &dyn Any;

    /// Returns a dynamic mutable reference to any for downcasting
    fn as_any_mut(&mut self) -> &mut dyn Any;
}
