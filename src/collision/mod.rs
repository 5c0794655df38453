mod broad_phase;
mod collision_filter;
mod collision_solver;
pub(crate) mod sat;

pub use self::broad_phase::{BroadPhase, BruteForceBroadPhase, PairHandler, ProxyId, SpatialHashing};
pub use self::collision_filter::{CollisionFilter, CollisionLayers};
pub use self::collision_solver::CollisionSolver;
pub(crate) use self::collision_solver::world_supports;
