pub mod config;
pub mod storage;
pub mod events;
mod island;
pub mod space;
mod step;
pub mod query;

pub use self::config::{BroadPhaseKind, SpaceConfig, SpaceParameter};
pub use self::storage::{HandleStorage, Storage, StorageHandle};
pub use self::events::{AreaEvent, AreaEventKind, EventQueue};
pub use self::island::Island;
pub use self::space::Space;
pub use self::step::Step;
pub use self::query::{MotionCollision, MotionResult, QueryFilter, RayResult, RestInfo, ShapeResult, INTERSECTION_QUERY_MAX};

#[cfg(feature = "serialize")]
use serde::{Serialize, Deserialize};

/// A unique identifier for a body in a space
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub struct BodyHandle(pub(crate) u32);

/// A unique identifier for an area in a space
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub struct AreaHandle(pub(crate) u32);

/// A unique identifier for a constraint pair in a space
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConstraintHandle(pub(crate) u32);

/// A collision object: either a body or an area
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub enum CollisionObjectId {
    Body(BodyHandle),
    Area(AreaHandle),
}

impl CollisionObjectId {
    /// Returns the body handle, if this is a body
    pub fn body(self) -> Option<BodyHandle> {
        match self {
            CollisionObjectId::Body(handle) => Some(handle),
            CollisionObjectId::Area(_) => None,
        }
    }

    /// Returns the area handle, if this is an area
    pub fn area(self) -> Option<AreaHandle> {
        match self {
            CollisionObjectId::Area(handle) => Some(handle),
            CollisionObjectId::Body(_) => None,
        }
    }
}

impl From<BodyHandle> for CollisionObjectId {
    fn from(handle: BodyHandle) -> Self {
        CollisionObjectId::Body(handle)
    }
}

impl From<AreaHandle> for CollisionObjectId {
    fn from(handle: AreaHandle) -> Self {
        CollisionObjectId::Area(handle)
    }
}

/// A shape of a collision object, as seen by the broad-phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ShapeOwner {
    pub object: CollisionObjectId,
    pub shape: usize,
}

impl ShapeOwner {
    pub fn new(object: CollisionObjectId, shape: usize) -> Self {
        Self { object, shape }
    }
}
