use crate::error::PhysicsError;
use crate::math::Vector2;
use crate::Result;

#[cfg(feature = "serialize")]
use serde::{Serialize, Deserialize};

/// Tunable space parameters accepted by `Space::set_param`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub enum SpaceParameter {
    ContactRecycleRadius,
    ContactMaxSeparation,
    BodyMaxAllowedPenetration,
    BodyLinearVelocitySleepThreshold,
    BodyAngularVelocitySleepThreshold,
    BodyTimeToSleep,
    ConstraintDefaultBias,
    TestMotionMinContactDepth,
}

/// Which broad-phase a space builds on creation
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub enum BroadPhaseKind {
    /// Tests every proxy against every other one
    BruteForce,

    /// Uniform hash grid with the given cell size
    SpatialHash { cell_size: f32 },
}

/// Configuration parameters for a physics space
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub struct SpaceConfig {
    /// Distance within which a new contact reuses a cached one (and its impulses)
    pub contact_recycle_radius: f32,

    /// Cached contacts drifting further apart than this are dropped
    pub contact_max_separation: f32,

    /// Penetration left uncorrected by the position bias
    pub contact_max_allowed_penetration: f32,

    /// The linear velocity threshold below which bodies can sleep
    pub body_linear_velocity_sleep_threshold: f32,

    /// The angular velocity threshold (radians per second) below which bodies can sleep
    pub body_angular_velocity_sleep_threshold: f32,

    /// The time a body must stay below both thresholds before sleeping
    pub body_time_to_sleep: f32,

    /// The bias factor for contact position correction (Baumgarte stabilization)
    pub constraint_default_bias: f32,

    /// Minimum depth reported by motion tests as a contact
    pub test_motion_min_contact_depth: f32,

    /// Gravity magnitude of the default area
    pub default_gravity: f32,

    /// Gravity direction of the default area
    pub default_gravity_vector: Vector2,

    /// Linear damping of the default area
    pub default_linear_damp: f32,

    /// Angular damping of the default area
    pub default_angular_damp: f32,

    /// Broad-phase used by the space
    pub broad_phase: BroadPhaseKind,
}

impl Default for SpaceConfig {
    fn default() -> Self {
        Self {
            contact_recycle_radius: 1.0,
            contact_max_separation: 1.5,
            contact_max_allowed_penetration: 0.3,
            body_linear_velocity_sleep_threshold: 2.0,
            body_angular_velocity_sleep_threshold: 8.0_f32.to_radians(),
            body_time_to_sleep: 0.5,
            constraint_default_bias: 0.3,
            test_motion_min_contact_depth: 0.005,
            default_gravity: 98.0,
            default_gravity_vector: Vector2::new(0.0, 1.0),
            default_linear_damp: 0.1,
            default_angular_damp: 1.0,
            broad_phase: BroadPhaseKind::SpatialHash { cell_size: 128.0 },
        }
    }
}

impl SpaceConfig {
    /// Sets a tunable parameter. Values must be finite and non-negative.
    pub fn set_param(&mut self, param: SpaceParameter, value: f32) -> Result<()> {
        if !value.is_finite() || value < 0.0 {
            return Err(PhysicsError::InvalidParameter(format!(
                "{:?} must be finite and non-negative, got {}",
                param, value
            )));
        }

        let slot = match param {
            SpaceParameter::ContactRecycleRadius => &mut self.contact_recycle_radius,
            SpaceParameter::ContactMaxSeparation => &mut self.contact_max_separation,
            SpaceParameter::BodyMaxAllowedPenetration => &mut self.contact_max_allowed_penetration,
            SpaceParameter::BodyLinearVelocitySleepThreshold => &mut self.body_linear_velocity_sleep_threshold,
            SpaceParameter::BodyAngularVelocitySleepThreshold => &mut self.body_angular_velocity_sleep_threshold,
            SpaceParameter::BodyTimeToSleep => &mut self.body_time_to_sleep,
            SpaceParameter::ConstraintDefaultBias => &mut self.constraint_default_bias,
            SpaceParameter::TestMotionMinContactDepth => &mut self.test_motion_min_contact_depth,
        };
        *slot = value;
        Ok(())
    }

    /// Reads a tunable parameter
    pub fn get_param(&self, param: SpaceParameter) -> f32 {
        match param {
            SpaceParameter::ContactRecycleRadius => self.contact_recycle_radius,
            SpaceParameter::ContactMaxSeparation => self.contact_max_separation,
            SpaceParameter::BodyMaxAllowedPenetration => self.contact_max_allowed_penetration,
            SpaceParameter::BodyLinearVelocitySleepThreshold => self.body_linear_velocity_sleep_threshold,
            SpaceParameter::BodyAngularVelocitySleepThreshold => self.body_angular_velocity_sleep_threshold,
            SpaceParameter::BodyTimeToSleep => self.body_time_to_sleep,
            SpaceParameter::ConstraintDefaultBias => self.constraint_default_bias,
            SpaceParameter::TestMotionMinContactDepth => self.test_motion_min_contact_depth,
        }
    }
}
