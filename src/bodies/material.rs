#[cfg(feature = "serialize")]
use serde::{Serialize, Deserialize};

/// Surface properties of a body
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub struct Material {
    /// Coefficient of friction, 0-1
    pub friction: f32,

    /// Coefficient of restitution (bounciness), 0-1
    pub bounce: f32,
}

impl Material {
    /// Creates a new material with the specified properties
    pub fn new(friction: f32, bounce: f32) -> Self {
        Self { friction, bounce }
    }

    /// Creates a material that slides without any friction
    pub fn frictionless() -> Self {
        Self {
            friction: 0.0,
            bounce: 0.0,
        }
    }

    /// Restitution used for a contact between two materials
    pub fn combine_bounce(&self, other: &Material) -> f32 {
        (self.bounce + other.bounce).clamp(0.0, 1.0)
    }

    /// Friction used for a contact between two materials
    pub fn combine_friction(&self, other: &Material) -> f32 {
        self.friction.min(other.friction).abs()
    }
}

impl Default for Material {
    fn default() -> Self {
        Self {
            friction: 1.0,
            bounce: 0.0,
        }
    }
}
