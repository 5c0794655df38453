//! Persistent pairs created by the broad-phase for every two overlapping shapes.

mod constraint;
mod body_pair;
mod area_pair;

pub use self::constraint::{Constraint, SolverContext};
pub use self::body_pair::{BodyPair, Contact, PairState, MAX_CONTACTS};
pub use self::area_pair::{Area2Pair, AreaPair};
