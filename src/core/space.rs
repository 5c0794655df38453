use crate::bodies::{Area, AreaOverrideMode, Body, BodyMode, CollisionObject, DirectBodyState};
use crate::collision::{BroadPhase, BruteForceBroadPhase, PairHandler, ProxyId, SpatialHashing};
use crate::constraints::{Area2Pair, AreaPair, BodyPair, Constraint, SolverContext};
use crate::core::config::BroadPhaseKind;
use crate::core::{
    AreaEvent, AreaHandle, BodyHandle, CollisionObjectId, ConstraintHandle, EventQueue, HandleStorage, Island,
    ShapeOwner, SpaceConfig, SpaceParameter, Step, Storage,
};
use crate::error::PhysicsError;
use crate::math::Transform2D;
use crate::shapes::Shape;
use crate::Result;

use log::debug;
use std::ops::Range;
use std::sync::Arc;

/// Creates and destroys pairs on behalf of the broad-phase
pub(crate) struct Registry<'a> {
    pub(crate) bodies: &'a mut HandleStorage<BodyHandle, Body>,
    pub(crate) areas: &'a mut HandleStorage<AreaHandle, Area>,
    pub(crate) constraints: &'a mut HandleStorage<ConstraintHandle, Box<dyn Constraint>>,
    pub(crate) config: &'a SpaceConfig,
}

impl Registry<'_> {
    fn pair_body_area(&mut self, body: BodyHandle, body_shape: usize, area: AreaHandle, area_shape: usize) -> ConstraintHandle {
        let handle = self.constraints.add(Box::new(AreaPair::new(body, body_shape, area, area_shape)));
        if let Some(body) = self.bodies.get_mut(body) {
            body.add_constraint(handle, 0);
        }
        if let Some(area) = self.areas.get_mut(area) {
            area.add_constraint(handle);
            // Get the new pair set up even if neither side moves
            area.moved = true;
        }
        handle
    }
}

impl PairHandler for Registry<'_> {
    fn pair(&mut self, a: ShapeOwner, b: ShapeOwner) -> Option<ConstraintHandle> {
        let handle = match (a.object, b.object) {
            (CollisionObjectId::Body(body_a), CollisionObjectId::Body(body_b)) => {
                let handle = self.constraints.add(Box::new(BodyPair::new(body_a, a.shape, body_b, b.shape)));
                if let Some(body) = self.bodies.get_mut(body_a) {
                    body.add_constraint(handle, 0);
                }
                if let Some(body) = self.bodies.get_mut(body_b) {
                    body.add_constraint(handle, 1);
                }
                handle
            }
            (CollisionObjectId::Body(body), CollisionObjectId::Area(area)) => {
                self.pair_body_area(body, a.shape, area, b.shape)
            }
            (CollisionObjectId::Area(area), CollisionObjectId::Body(body)) => {
                self.pair_body_area(body, b.shape, area, a.shape)
            }
            (CollisionObjectId::Area(area_a), CollisionObjectId::Area(area_b)) => {
                let handle = self.constraints.add(Box::new(Area2Pair::new(area_a, a.shape, area_b, b.shape)));
                for area in [area_a, area_b] {
                    if let Some(area) = self.areas.get_mut(area) {
                        area.add_constraint(handle);
                        area.moved = true;
                    }
                }
                handle
            }
        };

        debug!("Created pair {:?} between {:?} and {:?}", handle, a, b);
        Some(handle)
    }

    fn unpair(&mut self, a: ShapeOwner, b: ShapeOwner, data: Option<ConstraintHandle>) {
        let handle = match data {
            Some(handle) => handle,
            None => return,
        };

        if let Some(mut constraint) = self.constraints.remove(handle) {
            let mut ctx = SolverContext {
                bodies: &mut *self.bodies,
                areas: &mut *self.areas,
                config: self.config,
            };
            constraint.release(&mut ctx, handle);
            debug!("Released pair {:?} between {:?} and {:?}", handle, a, b);
        }
    }
}

/// Pushes pending AABB changes of one object into the broad-phase
fn sync_proxies(broad_phase: &mut dyn BroadPhase, id: CollisionObjectId, object: &mut CollisionObject) {
    object.update_shape_aabbs();
    let is_static = object.is_static;

    for (index, instance) in object.shapes.iter_mut().enumerate() {
        if instance.disabled {
            continue;
        }
        match instance.proxy {
            Some(proxy) => {
                broad_phase.move_proxy(proxy, instance.aabb_cache);
                broad_phase.set_static(proxy, is_static);
            }
            None => {
                let owner = ShapeOwner::new(id, index);
                instance.proxy = Some(broad_phase.create(owner, instance.aabb_cache, is_static));
            }
        }
    }
}

/// A simulation world: the registries of bodies, areas and pairs plus a broad-phase.
///
/// Changes made between steps are recorded on the objects and pushed into the
/// broad-phase by [`Space::update`] or at the start of the next step.
pub struct Space {
    pub(crate) broad_phase: Box<dyn BroadPhase>,
    pub(crate) bodies: HandleStorage<BodyHandle, Body>,
    pub(crate) areas: HandleStorage<AreaHandle, Area>,
    pub(crate) constraints: HandleStorage<ConstraintHandle, Box<dyn Constraint>>,
    pub(crate) default_area: Area,
    pub(crate) config: SpaceConfig,
    pub(crate) events: EventQueue,
    pub(crate) islands: Vec<Island>,
    pub(crate) step_count: u64,
    pub(crate) last_step: f32,
}

impl Default for Space {
    fn default() -> Self {
        Self::new()
    }
}

impl Space {
    /// Creates a space with the default configuration
    pub fn new() -> Self {
        Self::with_config(SpaceConfig::default())
    }

    /// Creates a space with the given configuration
    pub fn with_config(config: SpaceConfig) -> Self {
        let broad_phase: Box<dyn BroadPhase> = match config.broad_phase {
            BroadPhaseKind::BruteForce => Box::new(BruteForceBroadPhase::new()),
            BroadPhaseKind::SpatialHash { cell_size } => Box::new(SpatialHashing::new(cell_size)),
        };

        Self {
            broad_phase,
            bodies: HandleStorage::new(),
            areas: HandleStorage::new(),
            constraints: HandleStorage::new(),
            default_area: Area::default_for_space(&config),
            config,
            events: EventQueue::new(),
            islands: Vec::new(),
            step_count: 0,
            last_step: 0.0,
        }
    }

    pub fn config(&self) -> &SpaceConfig {
        &self.config
    }

    /// Sets a tunable parameter
    pub fn set_param(&mut self, param: SpaceParameter, value: f32) -> Result<()> {
        self.config.set_param(param, value)
    }

    pub fn get_param(&self, param: SpaceParameter) -> f32 {
        self.config.get_param(param)
    }

    /// The area applying gravity and damping wherever no overriding area does
    pub fn default_area(&self) -> &Area {
        &self.default_area
    }

    pub fn default_area_mut(&mut self) -> &mut Area {
        &mut self.default_area
    }

    /// Advances the simulation by `delta` seconds
    pub fn step(&mut self, delta: f32, iterations: usize) {
        Step::step(self, delta, iterations);
    }

    /// Number of completed steps
    pub fn get_step_count(&self) -> u64 {
        self.step_count
    }

    /// Length of the last completed step
    pub fn get_last_step(&self) -> f32 {
        self.last_step
    }

    /// Islands built by the last step
    pub fn islands(&self) -> &[Island] {
        &self.islands
    }

    /// Removes and returns the area monitor events of the last steps, in order
    pub fn drain_events(&mut self) -> Vec<AreaEvent> {
        self.events.drain_area_events()
    }

    pub fn create_body(&mut self, mode: BodyMode) -> BodyHandle {
        let handle = self.bodies.add(Body::new(mode));
        debug!("Created body {:?} ({:?})", handle, mode);
        handle
    }

    pub fn create_area(&mut self) -> AreaHandle {
        let handle = self.areas.add(Area::new());
        debug!("Created area {:?}", handle);
        handle
    }

    /// Removes a body, releasing every pair it takes part in
    pub fn remove_body(&mut self, handle: BodyHandle) -> Result<Body> {
        let count = self.bodies.fetch(handle)?.object.get_shape_count();
        self.wakeup_neighbours(handle);
        self.unregister_shapes(CollisionObjectId::Body(handle), 0..count);
        let body = self.bodies.fetch(handle)?;
        let leftover: Vec<ConstraintHandle> = body.constraints.keys().copied().collect();
        self.release_constraints(&leftover);
        debug!("Removed body {:?}", handle);
        self.bodies
            .remove(handle)
            .ok_or_else(|| PhysicsError::ResourceNotFound(format!("Body with handle {:?} not found", handle)))
    }

    /// Removes an area, undoing its effect on the bodies inside it
    pub fn remove_area(&mut self, handle: AreaHandle) -> Result<Area> {
        let count = self.areas.fetch(handle)?.object.get_shape_count();
        self.unregister_shapes(CollisionObjectId::Area(handle), 0..count);
        debug!("Removed area {:?}", handle);
        self.areas
            .remove(handle)
            .ok_or_else(|| PhysicsError::ResourceNotFound(format!("Area with handle {:?} not found", handle)))
    }

    pub fn body(&self, handle: BodyHandle) -> Result<&Body> {
        self.bodies.fetch(handle)
    }

    /// Mutable access to a body. Transform changes made here do not wake neighbours.
    pub fn body_mut(&mut self, handle: BodyHandle) -> Result<&mut Body> {
        self.bodies.fetch_mut(handle)
    }

    pub fn area(&self, handle: AreaHandle) -> Result<&Area> {
        self.areas.fetch(handle)
    }

    pub fn area_mut(&mut self, handle: AreaHandle) -> Result<&mut Area> {
        self.areas.fetch_mut(handle)
    }

    /// Iterates over all bodies in creation order
    pub fn bodies(&self) -> impl Iterator<Item = (BodyHandle, &Body)> + '_ {
        self.bodies.iter()
    }

    pub fn areas(&self) -> impl Iterator<Item = (AreaHandle, &Area)> + '_ {
        self.areas.iter()
    }

    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    /// Number of live pairs of any kind
    pub fn constraint_count(&self) -> usize {
        self.constraints.len()
    }

    pub fn constraint(&self, handle: ConstraintHandle) -> Option<&dyn Constraint> {
        self.constraints.get(handle).map(|c| c.as_ref())
    }

    /// The contact pair between two body shapes, if their AABBs overlap
    pub fn body_pair(&self, a: BodyHandle, b: BodyHandle) -> Option<&BodyPair> {
        let body = self.bodies.get(a)?;
        body.constraints
            .keys()
            .filter_map(|handle| self.constraints.get(*handle))
            .filter_map(|c| c.as_any().downcast_ref::<BodyPair>())
            .find(|pair| pair.involves_body(b))
    }

    /// Returns the state accessor of a body, valid until the next step
    pub fn body_direct_state(&mut self, handle: BodyHandle) -> Result<DirectBodyState<'_>> {
        let step = self.last_step;
        Ok(DirectBodyState::new(self.bodies.fetch_mut(handle)?, step))
    }

    pub fn object(&self, id: CollisionObjectId) -> Result<&CollisionObject> {
        match id {
            CollisionObjectId::Body(handle) => Ok(&self.bodies.fetch(handle)?.object),
            CollisionObjectId::Area(handle) => Ok(&self.areas.fetch(handle)?.object),
        }
    }

    fn object_mut(&mut self, id: CollisionObjectId) -> Result<&mut CollisionObject> {
        match id {
            CollisionObjectId::Body(handle) => Ok(&mut self.bodies.fetch_mut(handle)?.object),
            CollisionObjectId::Area(handle) => Ok(&mut self.areas.fetch_mut(handle)?.object),
        }
    }

    /// Attaches a shape to a body or area and returns its index
    pub fn add_shape(
        &mut self,
        object: impl Into<CollisionObjectId>,
        shape: Arc<dyn Shape>,
        transform: Transform2D,
    ) -> Result<usize> {
        Ok(self.object_mut(object.into())?.push_shape(shape, transform))
    }

    /// Replaces the geometry of a shape, keeping its pairs
    pub fn set_shape(&mut self, object: impl Into<CollisionObjectId>, index: usize, shape: Arc<dyn Shape>) -> Result<()> {
        self.object_mut(object.into())?.replace_shape(index, shape)
    }

    /// Detaches a shape. Later shapes shift down by one index.
    pub fn remove_shape(&mut self, object: impl Into<CollisionObjectId>, index: usize) -> Result<()> {
        let id = object.into();
        let count = self.object(id)?.get_shape_count();
        self.object(id)?.shape_instance(index)?;

        // Pairs are keyed by shape index, so every shape after the removed one re-registers
        self.unregister_shapes(id, index..count);
        self.object_mut(id)?.take_shape(index)?;
        Ok(())
    }

    /// Disables a shape, releasing its pairs immediately
    pub fn set_shape_disabled(&mut self, object: impl Into<CollisionObjectId>, index: usize, disabled: bool) -> Result<()> {
        let id = object.into();
        self.object(id)?.shape_instance(index)?;
        if disabled {
            self.unregister_shapes(id, index..index + 1);
        }
        self.object_mut(id)?.set_shape_disabled_internal(index, disabled)
    }

    pub fn set_shape_transform(
        &mut self,
        object: impl Into<CollisionObjectId>,
        index: usize,
        transform: Transform2D,
    ) -> Result<()> {
        self.object_mut(object.into())?.set_shape_transform(index, transform)
    }

    /// Sets a body's transform like a user would. Moving a static body wakes the
    /// bodies resting on it.
    pub fn body_set_transform(&mut self, handle: BodyHandle, transform: Transform2D) -> Result<()> {
        let body = self.bodies.fetch_mut(handle)?;
        body.set_state_transform(transform);
        if body.get_mode() == BodyMode::Static {
            self.wakeup_neighbours(handle);
        }
        Ok(())
    }

    /// Switches a body's mode, waking its neighbours
    pub fn body_set_mode(&mut self, handle: BodyHandle, mode: BodyMode) -> Result<()> {
        self.bodies.fetch_mut(handle)?.set_mode(mode);
        self.wakeup_neighbours(handle);
        Ok(())
    }

    pub fn area_set_transform(&mut self, handle: AreaHandle, transform: Transform2D) -> Result<()> {
        let area = self.areas.fetch_mut(handle)?;
        area.object.set_transform_internal(transform, true);
        area.moved = true;
        Ok(())
    }

    /// Changes how the area affects gravity and damping of bodies inside it
    pub fn area_set_space_override_mode(&mut self, handle: AreaHandle, mode: AreaOverrideMode) -> Result<()> {
        let area = self.areas.fetch(handle)?;
        let was_overriding = area.get_space_override_mode() != AreaOverrideMode::Disabled;
        let count = area.object.get_shape_count();

        if was_overriding == (mode != AreaOverrideMode::Disabled) {
            self.areas.fetch_mut(handle)?.set_space_override_mode_internal(mode);
            return Ok(());
        }

        // Re-pair so that bodies already inside pick up (or drop) the area
        self.unregister_shapes(CollisionObjectId::Area(handle), 0..count);
        let area = self.areas.fetch_mut(handle)?;
        area.set_space_override_mode_internal(mode);
        area.object.mark_shapes_changed();
        Ok(())
    }

    /// Selects whether the area reports bodies and areas entering or leaving it
    pub fn area_set_monitoring(&mut self, handle: AreaHandle, bodies: bool, areas: bool) -> Result<()> {
        let count = self.areas.fetch(handle)?.object.get_shape_count();
        self.unregister_shapes(CollisionObjectId::Area(handle), 0..count);
        self.areas.fetch_mut(handle)?.set_monitoring_internal(bodies, areas);
        Ok(())
    }

    /// Selects whether monitoring areas can detect this area
    pub fn area_set_monitorable(&mut self, handle: AreaHandle, monitorable: bool) -> Result<()> {
        let area = self.areas.fetch_mut(handle)?;
        if area.is_monitorable() != monitorable {
            area.set_monitorable_internal(monitorable);
        }
        Ok(())
    }

    /// Pushes pending shape changes into the broad-phase and refreshes the pairs
    pub fn update(&mut self) {
        self.flush_shapes();
        self.update_inertias();
        self.update_pairs();
    }

    pub(crate) fn flush_shapes(&mut self) {
        let broad_phase = self.broad_phase.as_mut();

        for (handle, body) in self.bodies.iter_mut() {
            if body.object.pending_shape_update {
                if body.object.shape_list_changed {
                    body.object.shape_list_changed = false;
                    body.pending_inertia_update = true;
                }
                sync_proxies(broad_phase, CollisionObjectId::Body(handle), &mut body.object);
            }
        }

        for (handle, area) in self.areas.iter_mut() {
            if area.object.pending_shape_update {
                area.object.shape_list_changed = false;
                sync_proxies(broad_phase, CollisionObjectId::Area(handle), &mut area.object);
            }
        }
    }

    pub(crate) fn update_inertias(&mut self) {
        for (_, body) in self.bodies.iter_mut() {
            if body.pending_inertia_update {
                body.update_inertia();
            }
        }
    }

    pub(crate) fn update_pairs(&mut self) {
        let mut registry = Registry {
            bodies: &mut self.bodies,
            areas: &mut self.areas,
            constraints: &mut self.constraints,
            config: &self.config,
        };
        self.broad_phase.update(&mut registry);
    }

    /// Removes the broad-phase proxies of a range of shapes, unpairing them
    fn unregister_shapes(&mut self, id: CollisionObjectId, range: Range<usize>) {
        let proxies: Vec<ProxyId> = match self.object_mut(id) {
            Ok(object) => object
                .shapes
                .iter_mut()
                .enumerate()
                .filter(|(index, _)| range.contains(index))
                .filter_map(|(_, instance)| instance.proxy.take())
                .collect(),
            Err(_) => return,
        };

        let mut registry = Registry {
            bodies: &mut self.bodies,
            areas: &mut self.areas,
            constraints: &mut self.constraints,
            config: &self.config,
        };
        for proxy in proxies {
            self.broad_phase.remove(proxy, &mut registry);
        }
    }

    /// Releases pairs directly, without going through the broad-phase
    fn release_constraints(&mut self, handles: &[ConstraintHandle]) {
        for &handle in handles {
            if let Some(mut constraint) = self.constraints.remove(handle) {
                let mut ctx = SolverContext {
                    bodies: &mut self.bodies,
                    areas: &mut self.areas,
                    config: &self.config,
                };
                constraint.release(&mut ctx, handle);
            }
        }
    }

    /// Wakes the rigid bodies sharing a pair with `handle`
    pub(crate) fn wakeup_neighbours(&mut self, handle: BodyHandle) {
        let constraints = &self.constraints;
        let neighbours: Vec<BodyHandle> = match self.bodies.get(handle) {
            Some(body) => body
                .constraints
                .iter()
                .filter_map(|(c, slot)| constraints.get(*c).map(|c| (c, *slot)))
                .flat_map(|(c, slot)| {
                    c.get_bodies()
                        .iter()
                        .enumerate()
                        .filter(move |(i, _)| *i != slot)
                        .map(|(_, b)| *b)
                        .collect::<Vec<_>>()
                })
                .collect(),
            None => return,
        };

        for neighbour in neighbours {
            if let Some(body) = self.bodies.get_mut(neighbour) {
                if body.get_mode() == BodyMode::Rigid && !body.is_active() {
                    body.set_active(true);
                }
            }
        }
    }
}
