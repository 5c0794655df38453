use crate::bodies::BodyMode;
use crate::constraints::SolverContext;
use crate::core::{BodyHandle, ConstraintHandle, Island, Space, Storage};

use log::{trace, warn};
use std::collections::BTreeSet;

/// Advances a space by one fixed step.
///
/// A step integrates forces, builds islands from the active bodies, sets up and
/// iteratively solves every pair of each island, integrates velocities, puts quiet
/// islands to sleep and finally refreshes the broad-phase pairs and area events.
pub struct Step;

impl Step {
    pub fn step(space: &mut Space, delta: f32, iterations: usize) {
        if !(delta > 0.0) {
            warn!("Ignoring step with non-positive delta {}", delta);
            return;
        }

        space.flush_shapes();
        space.update_inertias();
        space.last_step = delta;

        let active: Vec<BodyHandle> = space
            .bodies
            .iter()
            .filter(|(_, body)| body.is_active())
            .map(|(handle, _)| handle)
            .collect();

        let mut swept = false;
        for &handle in &active {
            if let Some(body) = space.bodies.get_mut(handle) {
                body.integrate_forces(delta, &space.areas, &space.default_area);
                swept |= !body.get_motion().is_zero();
            }
        }

        // Swept AABBs of kinematic and CCD bodies may reach shapes they are not paired with yet
        space.flush_shapes();
        if swept {
            space.update_pairs();
        }

        let (islands, area_constraints) = Self::build_islands(space, &active, delta);
        trace!("Step {}: {} islands", space.step_count, islands.len());

        let mut solved: Vec<Vec<ConstraintHandle>> = Vec::with_capacity(islands.len());
        {
            let Space { bodies, areas, constraints, config, .. } = &mut *space;
            let mut ctx = SolverContext { bodies, areas, config };

            for island in &islands {
                let mut kept = Vec::with_capacity(island.constraints.len());
                for &handle in &island.constraints {
                    if let Some(constraint) = constraints.get_mut(handle) {
                        if constraint.setup(&mut ctx, delta) {
                            kept.push(handle);
                        }
                    }
                }
                solved.push(kept);
            }

            // Area pairs never produce solver work
            for &handle in &area_constraints {
                if let Some(constraint) = constraints.get_mut(handle) {
                    constraint.setup(&mut ctx, delta);
                }
            }

            for island_constraints in &solved {
                for _ in 0..iterations {
                    for &handle in island_constraints {
                        if let Some(constraint) = constraints.get_mut(handle) {
                            constraint.solve(&mut ctx, delta);
                        }
                    }
                }
            }
        }

        let moving: Vec<BodyHandle> = space
            .bodies
            .iter()
            .filter(|(_, body)| body.is_active())
            .map(|(handle, _)| handle)
            .collect();

        for handle in moving {
            if let Some(body) = space.bodies.get_mut(handle) {
                body.integrate_velocities(delta);
            }
        }

        for island in &islands {
            Self::check_suspend(space, island, delta);
        }

        space.islands = islands;

        space.flush_shapes();
        space.update_pairs();

        let mut events = Vec::new();
        for (handle, area) in space.areas.iter_mut() {
            if area.has_pending_queries() {
                area.flush_queries(handle, &mut events);
            }
        }
        for event in events {
            space.events.push_area_event(event);
        }

        space.step_count += 1;
    }

    /// Flood fills islands from the active bodies.
    ///
    /// Static and kinematic bodies join the islands of their neighbours but never
    /// connect them. Sleeping bodies reached by the fill wake up and get their forces
    /// integrated. Returns the islands and the pairs of moved areas.
    fn build_islands(space: &mut Space, active: &[BodyHandle], delta: f32) -> (Vec<Island>, Vec<ConstraintHandle>) {
        let mut visited_bodies = BTreeSet::new();
        let mut visited_constraints = BTreeSet::new();
        let mut islands = Vec::new();

        for &root in active {
            if visited_bodies.contains(&root) {
                continue;
            }

            let mut island = Island::new();
            let mut stack = vec![root];
            visited_bodies.insert(root);

            while let Some(handle) = stack.pop() {
                island.add_body(handle);

                let links: Vec<(ConstraintHandle, usize)> = match space.bodies.get(handle) {
                    Some(body) => body.constraints.iter().map(|(c, slot)| (*c, *slot)).collect(),
                    None => continue,
                };

                for (constraint, slot) in links {
                    if !visited_constraints.insert(constraint) {
                        continue;
                    }
                    island.add_constraint(constraint);

                    let others: Vec<BodyHandle> = match space.constraints.get(constraint) {
                        Some(c) => c
                            .get_bodies()
                            .iter()
                            .enumerate()
                            .filter(|(i, _)| *i != slot)
                            .map(|(_, b)| *b)
                            .collect(),
                        None => continue,
                    };

                    for other in others {
                        if visited_bodies.contains(&other) {
                            continue;
                        }
                        let body = match space.bodies.get_mut(other) {
                            Some(body) => body,
                            None => continue,
                        };
                        if body.get_mode().is_immovable() {
                            continue;
                        }

                        if !body.is_active() {
                            body.set_active(true);
                            body.integrate_forces(delta, &space.areas, &space.default_area);
                        }

                        visited_bodies.insert(other);
                        stack.push(other);
                    }
                }
            }

            islands.push(island);
        }

        let mut area_constraints = Vec::new();
        for (_, area) in space.areas.iter_mut() {
            if !area.moved {
                continue;
            }
            for &constraint in &area.constraints {
                if visited_constraints.insert(constraint) {
                    area_constraints.push(constraint);
                }
            }
            area.moved = false;
        }

        (islands, area_constraints)
    }

    /// Puts an island to sleep when every movable body in it passes the sleep test,
    /// otherwise keeps all of them awake
    fn check_suspend(space: &mut Space, island: &Island, delta: f32) {
        let config = &space.config;
        let mut can_sleep = true;

        for &handle in &island.bodies {
            if let Some(body) = space.bodies.get_mut(handle) {
                if body.get_mode().is_immovable() {
                    continue;
                }
                if !body.sleep_test(delta, config) {
                    can_sleep = false;
                }
            }
        }

        for &handle in &island.bodies {
            if let Some(body) = space.bodies.get_mut(handle) {
                if body.get_mode() == BodyMode::Static || body.get_mode() == BodyMode::Kinematic {
                    continue;
                }
                if body.is_active() == can_sleep {
                    body.set_active(!can_sleep);
                }
            }
        }
    }
}
