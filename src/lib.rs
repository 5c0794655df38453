pub mod math;
pub mod core;
pub mod bodies;
pub mod shapes;
pub mod collision;
pub mod constraints;

/// Re-export common types for easier usage
pub use crate::core::{AreaHandle, BodyHandle, CollisionObjectId, QueryFilter, Space, SpaceConfig, SpaceParameter, Step};
pub use crate::bodies::{AreaOverrideMode, BodyMode, BodyParameter, CcdMode, Material};
pub use crate::math::{Transform2D, Vector2};

/// Error types for the physics engine
pub mod error {
    use thiserror::Error;

    #[derive(Error, Debug, Clone, PartialEq)]
    pub enum PhysicsError {
        #[error("Invalid parameter: {0}")]
        InvalidParameter(String),

        #[error("Resource not found: {0}")]
        ResourceNotFound(String),

        #[error("Shape index {index} out of range for an object with {count} shapes")]
        ShapeIndexOutOfRange { index: usize, count: usize },
    }
}

/// Result type for physics engine operations
pub type Result<T> = std::result::Result<T, error::PhysicsError>;

/// Engine version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
