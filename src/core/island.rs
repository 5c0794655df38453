use crate::core::{BodyHandle, ConstraintHandle};

/// Bodies and constraints connected through contacts, solved and put to sleep together.
///
/// Both lists keep discovery order, so the solver visits constraints deterministically.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Island {
    /// The bodies in the island, the root first
    pub bodies: Vec<BodyHandle>,

    /// The constraints in the island
    pub constraints: Vec<ConstraintHandle>,
}

impl Island {
    /// Creates a new empty island
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_body(&mut self, body: BodyHandle) {
        self.bodies.push(body);
    }

    pub fn add_constraint(&mut self, constraint: ConstraintHandle) {
        self.constraints.push(constraint);
    }

    pub fn contains_body(&self, body: BodyHandle) -> bool {
        self.bodies.contains(&body)
    }

    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    pub fn constraint_count(&self) -> usize {
        self.constraints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty() && self.constraints.is_empty()
    }
}
