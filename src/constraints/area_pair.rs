use crate::bodies::{AreaOverrideMode, MonitorKey};
use crate::collision::CollisionSolver;
use crate::constraints::{Constraint, SolverContext};
use crate::core::{AreaHandle, BodyHandle, CollisionObjectId, ConstraintHandle, Storage};
use crate::math::Vector2;

use std::any::Any;

/// Overlap tracking between a body shape and an area shape.
///
/// Never produces solver work: setup only updates which areas affect the body and
/// what the area reports.
#[derive(Debug, Clone)]
pub struct AreaPair {
    body: [BodyHandle; 1],
    body_shape: usize,
    area: AreaHandle,
    area_shape: usize,
    colliding: bool,
}

impl AreaPair {
    pub fn new(body: BodyHandle, body_shape: usize, area: AreaHandle, area_shape: usize) -> Self {
        Self {
            body: [body],
            body_shape,
            area,
            area_shape,
            colliding: false,
        }
    }

    pub fn get_area(&self) -> AreaHandle {
        self.area
    }

    /// Whether the shapes overlapped at the last setup
    pub fn is_colliding(&self) -> bool {
        self.colliding
    }

    fn monitor_key(&self) -> MonitorKey {
        MonitorKey {
            object: CollisionObjectId::Body(self.body[0]),
            object_shape: self.body_shape,
            area_shape: self.area_shape,
        }
    }

    /// Applies or reverts the effects of the body being inside the area
    fn set_inside(&self, ctx: &mut SolverContext<'_>, inside: bool) {
        let (override_mode, monitoring) = match ctx.areas.get(self.area) {
            Some(area) => (area.get_space_override_mode(), area.is_monitoring_bodies()),
            None => return,
        };

        if override_mode != AreaOverrideMode::Disabled {
            if let Some(body) = ctx.bodies.get_mut(self.body[0]) {
                if inside {
                    body.add_area(self.area);
                } else {
                    body.remove_area(self.area);
                }
            }
        }

        if monitoring {
            let key = self.monitor_key();
            if let Some(area) = ctx.areas.get_mut(self.area) {
                if inside {
                    area.add_body_to_query(key);
                } else {
                    area.remove_body_from_query(key);
                }
            }
        }
    }
}

impl Constraint for AreaPair {
    fn constraint_type(&self) -> &'static str {
        "AreaPair"
    }

    fn get_bodies(&self) -> &[BodyHandle] {
        &self.body
    }

    fn setup(&mut self, ctx: &mut SolverContext<'_>, _dt: f32) -> bool {
        let overlapping = match (ctx.bodies.get(self.body[0]), ctx.areas.get(self.area)) {
            (Some(body), Some(area)) => {
                let shapes = (body.object.get_shape(self.body_shape), area.object.get_shape(self.area_shape));
                match shapes {
                    (Some(body_shape), Some(area_shape)) if area.object.interacts_with(&body.object) => {
                        CollisionSolver::solve(
                            &**body_shape,
                            &body.object.get_shape_world_transform(self.body_shape),
                            Vector2::zero(),
                            &**area_shape,
                            &area.object.get_shape_world_transform(self.area_shape),
                            Vector2::zero(),
                            None,
                            None,
                            0.0,
                            0.0,
                        )
                    }
                    _ => false,
                }
            }
            _ => false,
        };

        if overlapping != self.colliding {
            self.set_inside(ctx, overlapping);
            self.colliding = overlapping;
        }

        false
    }

    fn solve(&mut self, _ctx: &mut SolverContext<'_>, _dt: f32) {}

    fn release(&mut self, ctx: &mut SolverContext<'_>, handle: ConstraintHandle) {
        if self.colliding {
            self.set_inside(ctx, false);
            self.colliding = false;
        }

        if let Some(body) = ctx.bodies.get_mut(self.body[0]) {
            body.remove_constraint(handle);
        }
        if let Some(area) = ctx.areas.get_mut(self.area) {
            area.remove_constraint(handle);
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Overlap tracking between two area shapes, reported to whichever side monitors areas
#[derive(Debug, Clone)]
pub struct Area2Pair {
    area_a: AreaHandle,
    shape_a: usize,
    area_b: AreaHandle,
    shape_b: usize,
    colliding: bool,
}

impl Area2Pair {
    pub fn new(area_a: AreaHandle, shape_a: usize, area_b: AreaHandle, shape_b: usize) -> Self {
        Self {
            area_a,
            shape_a,
            area_b,
            shape_b,
            colliding: false,
        }
    }

    pub fn is_colliding(&self) -> bool {
        self.colliding
    }

    /// Reports `other` entering or leaving `monitor` if the first monitors areas and the
    /// second is monitorable
    fn notify(
        ctx: &mut SolverContext<'_>,
        monitor: AreaHandle,
        monitor_shape: usize,
        other: AreaHandle,
        other_shape: usize,
        inside: bool,
    ) {
        let monitorable = ctx.areas.get(other).map_or(false, |area| area.is_monitorable());
        if !monitorable {
            return;
        }

        if let Some(area) = ctx.areas.get_mut(monitor) {
            if !area.is_monitoring_areas() {
                return;
            }
            let key = MonitorKey {
                object: CollisionObjectId::Area(other),
                object_shape: other_shape,
                area_shape: monitor_shape,
            };
            if inside {
                area.add_area_to_query(key);
            } else {
                area.remove_area_from_query(key);
            }
        }
    }

    fn set_inside(&self, ctx: &mut SolverContext<'_>, inside: bool) {
        Self::notify(ctx, self.area_b, self.shape_b, self.area_a, self.shape_a, inside);
        Self::notify(ctx, self.area_a, self.shape_a, self.area_b, self.shape_b, inside);
    }
}

impl Constraint for Area2Pair {
    fn constraint_type(&self) -> &'static str {
        "Area2Pair"
    }

    fn get_bodies(&self) -> &[BodyHandle] {
        &[]
    }

    fn setup(&mut self, ctx: &mut SolverContext<'_>, _dt: f32) -> bool {
        let overlapping = match (ctx.areas.get(self.area_a), ctx.areas.get(self.area_b)) {
            (Some(a), Some(b)) => match (a.object.get_shape(self.shape_a), b.object.get_shape(self.shape_b)) {
                (Some(shape_a), Some(shape_b)) if a.object.interacts_with(&b.object) => CollisionSolver::solve(
                    &**shape_a,
                    &a.object.get_shape_world_transform(self.shape_a),
                    Vector2::zero(),
                    &**shape_b,
                    &b.object.get_shape_world_transform(self.shape_b),
                    Vector2::zero(),
                    None,
                    None,
                    0.0,
                    0.0,
                ),
                _ => false,
            },
            _ => false,
        };

        if overlapping != self.colliding {
            self.set_inside(ctx, overlapping);
            self.colliding = overlapping;
        }

        false
    }

    fn solve(&mut self, _ctx: &mut SolverContext<'_>, _dt: f32) {}

    fn release(&mut self, ctx: &mut SolverContext<'_>, handle: ConstraintHandle) {
        if self.colliding {
            self.set_inside(ctx, false);
            self.colliding = false;
        }

        for area in [self.area_a, self.area_b] {
            if let Some(area) = ctx.areas.get_mut(area) {
                area.remove_constraint(handle);
            }
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
