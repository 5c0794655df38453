mod collision_object;
mod material;
mod body;
mod area;
mod direct_state;

pub use self::collision_object::{CollisionObject, ShapeInstance};
pub use self::material::Material;
pub use self::body::{Body, ReportedContact};
pub use self::area::{Area, MonitorKey};
pub use self::direct_state::DirectBodyState;

#[cfg(feature = "serialize")]
use serde::{Serialize, Deserialize};

/// How a body takes part in the simulation.
///
/// The order matters: every mode up to `Kinematic` has infinite mass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub enum BodyMode {
    /// Never moves
    Static,

    /// Moved by setting its transform; pushes other bodies
    Kinematic,

    /// Fully simulated
    Rigid,

    /// Simulated without rotation, never falls asleep on its own
    Character,
}

impl BodyMode {
    /// Whether bodies in this mode have infinite mass
    pub fn is_immovable(self) -> bool {
        self <= BodyMode::Kinematic
    }
}

/// Continuous collision detection mode of a body
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub enum CcdMode {
    #[default]
    Disabled,

    /// Casts a ray along the motion when no overlap is found
    CastRay,

    /// Sweeps the shape along its motion in the separating axis test
    CastShape,
}

/// How an area changes the gravity and damping of the bodies inside it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub enum AreaOverrideMode {
    /// The area does not affect bodies
    #[default]
    Disabled,

    /// Adds to what has been computed so far
    Combine,

    /// Adds to what has been computed so far and ignores lower priority areas
    CombineReplace,

    /// Replaces what has been computed so far and ignores lower priority areas
    Replace,

    /// Replaces what has been computed so far and keeps combining
    ReplaceCombine,
}

/// Scalar body parameters accepted by `Body::set_param`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub enum BodyParameter {
    Bounce,
    Friction,
    Mass,
    /// Values <= 0 go back to the inertia computed from the shapes
    Inertia,
    GravityScale,
    /// Values < 0 use the damping of the areas the body is in
    LinearDamp,
    /// Values < 0 use the damping of the areas the body is in
    AngularDamp,
}
