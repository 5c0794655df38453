use crate::core::{AreaHandle, CollisionObjectId};
use std::collections::VecDeque;

/// Whether an object started or stopped overlapping an area
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AreaEventKind {
    Entered,
    Exited,
}

/// An overlap change reported by a monitoring area
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AreaEvent {
    /// The monitoring area
    pub area: AreaHandle,

    /// Whether the object entered or exited
    pub kind: AreaEventKind,

    /// The body or area that changed its overlap state
    pub other: CollisionObjectId,

    /// Shape index on the other object
    pub other_shape: usize,

    /// Shape index on the monitoring area
    pub area_shape: usize,
}

/// A queue of area monitor events, filled at the end of each step
#[derive(Debug, Default)]
pub struct EventQueue {
    area_events: VecDeque<AreaEvent>,
}

impl EventQueue {
    /// Creates a new empty event queue
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an area event to the queue
    pub fn push_area_event(&mut self, event: AreaEvent) {
        self.area_events.push_back(event);
    }

    /// Removes and returns all queued area events in the order they occurred
    pub fn drain_area_events(&mut self) -> Vec<AreaEvent> {
        self.area_events.drain(..).collect()
    }

    /// Returns the number of queued events
    pub fn len(&self) -> usize {
        self.area_events.len()
    }

    /// Returns whether there are no queued events
    pub fn is_empty(&self) -> bool {
        self.area_events.is_empty()
    }
}
