use crate::collision::{CollisionFilter, CollisionLayers, ProxyId};
use crate::error::PhysicsError;
use crate::math::{Aabb, Transform2D, Vector2};
use crate::shapes::Shape;
use crate::Result;

use std::sync::Arc;

/// A shape attached to a collision object
#[derive(Debug, Clone)]
pub struct ShapeInstance {
    pub(crate) shape: Arc<dyn Shape>,
    pub(crate) xform: Transform2D,
    pub(crate) xform_inv: Transform2D,
    pub(crate) aabb_cache: Aabb,
    pub(crate) proxy: Option<ProxyId>,
    pub(crate) disabled: bool,
    pub(crate) one_way_collision: bool,
    pub(crate) one_way_collision_margin: f32,
    pub(crate) metadata: u64,
}

impl ShapeInstance {
    fn new(shape: Arc<dyn Shape>, xform: Transform2D) -> Self {
        Self {
            shape,
            xform,
            xform_inv: xform.affine_inverse(),
            aabb_cache: Aabb::default(),
            proxy: None,
            disabled: false,
            one_way_collision: false,
            one_way_collision_margin: 0.0,
            metadata: 0,
        }
    }

    /// Returns the shared geometry
    pub fn get_shape(&self) -> &Arc<dyn Shape> {
        &self.shape
    }

    /// Returns the shape transform relative to its owner
    pub fn get_transform(&self) -> Transform2D {
        self.xform
    }

    /// Returns the world AABB computed at the last shape update
    pub fn get_aabb(&self) -> Aabb {
        self.aabb_cache
    }

    pub fn is_disabled(&self) -> bool {
        self.disabled
    }

    pub fn is_one_way_collision(&self) -> bool {
        self.one_way_collision
    }

    pub fn get_one_way_collision_margin(&self) -> f32 {
        self.one_way_collision_margin
    }

    pub fn get_metadata(&self) -> u64 {
        self.metadata
    }

    /// Whether the shape is registered in a broad-phase
    pub fn is_registered(&self) -> bool {
        self.proxy.is_some()
    }
}

/// State shared by bodies and areas: a transform, a list of shapes and collision layers.
///
/// Changes to the transform or the shapes only mark the object; the owning space pushes
/// the new AABBs into its broad-phase on the next flush.
#[derive(Debug, Clone)]
pub struct CollisionObject {
    pub(crate) transform: Transform2D,
    pub(crate) inv_transform: Transform2D,
    pub(crate) shapes: Vec<ShapeInstance>,
    pub(crate) filter: CollisionFilter,
    pub(crate) pickable: bool,
    pub(crate) is_static: bool,
    pub(crate) pending_shape_update: bool,
    pub(crate) pending_motion: Vector2,
    pub(crate) shape_list_changed: bool,
}

impl CollisionObject {
    pub(crate) fn new(is_static: bool) -> Self {
        Self {
            transform: Transform2D::identity(),
            inv_transform: Transform2D::identity(),
            shapes: Vec::new(),
            filter: CollisionFilter::default(),
            pickable: true,
            is_static,
            pending_shape_update: false,
            pending_motion: Vector2::zero(),
            shape_list_changed: false,
        }
    }

    /// Returns the world transform
    pub fn get_transform(&self) -> Transform2D {
        self.transform
    }

    /// Returns the inverse of the world transform
    pub fn get_inv_transform(&self) -> Transform2D {
        self.inv_transform
    }

    pub(crate) fn set_transform_internal(&mut self, transform: Transform2D, update_shapes: bool) {
        self.transform = transform;
        self.inv_transform = transform.affine_inverse();
        if update_shapes {
            self.mark_shapes_changed();
        }
    }

    pub(crate) fn mark_shapes_changed(&mut self) {
        self.pending_shape_update = true;
        self.pending_motion = Vector2::zero();
    }

    /// Marks a change of the shapes themselves, which also invalidates mass properties
    fn mark_shape_list_changed(&mut self) {
        self.shape_list_changed = true;
        self.mark_shapes_changed();
    }

    /// Marks the shapes for an update whose AABBs are swept by `motion`
    pub(crate) fn mark_shapes_moving(&mut self, motion: Vector2) {
        self.pending_shape_update = true;
        self.pending_motion = motion;
    }

    pub fn get_shape_count(&self) -> usize {
        self.shapes.len()
    }

    /// Returns the shape instance at `index`
    pub fn shape_instance(&self, index: usize) -> Result<&ShapeInstance> {
        self.shapes.get(index).ok_or(PhysicsError::ShapeIndexOutOfRange {
            index,
            count: self.shapes.len(),
        })
    }

    fn shape_instance_mut(&mut self, index: usize) -> Result<&mut ShapeInstance> {
        let count = self.shapes.len();
        self.shapes
            .get_mut(index)
            .ok_or(PhysicsError::ShapeIndexOutOfRange { index, count })
    }

    /// Iterates over the shape instances in index order
    pub fn shape_instances(&self) -> impl Iterator<Item = &ShapeInstance> + '_ {
        self.shapes.iter()
    }

    pub fn get_shape(&self, index: usize) -> Option<&Arc<dyn Shape>> {
        self.shapes.get(index).map(|s| &s.shape)
    }

    pub fn get_shape_transform(&self, index: usize) -> Transform2D {
        self.shapes.get(index).map_or(Transform2D::identity(), |s| s.xform)
    }

    pub fn get_shape_inv_transform(&self, index: usize) -> Transform2D {
        self.shapes.get(index).map_or(Transform2D::identity(), |s| s.xform_inv)
    }

    /// World transform of the shape at `index`
    pub fn get_shape_world_transform(&self, index: usize) -> Transform2D {
        self.transform * self.get_shape_transform(index)
    }

    pub fn get_shape_aabb(&self, index: usize) -> Aabb {
        self.shapes.get(index).map_or(Aabb::default(), |s| s.aabb_cache)
    }

    pub fn is_shape_disabled(&self, index: usize) -> bool {
        self.shapes.get(index).map_or(true, |s| s.disabled)
    }

    pub fn is_shape_one_way_collision(&self, index: usize) -> bool {
        self.shapes.get(index).map_or(false, |s| s.one_way_collision)
    }

    pub fn get_shape_one_way_collision_margin(&self, index: usize) -> f32 {
        self.shapes.get(index).map_or(0.0, |s| s.one_way_collision_margin)
    }

    pub fn get_shape_metadata(&self, index: usize) -> u64 {
        self.shapes.get(index).map_or(0, |s| s.metadata)
    }

    pub(crate) fn push_shape(&mut self, shape: Arc<dyn Shape>, xform: Transform2D) -> usize {
        self.shapes.push(ShapeInstance::new(shape, xform));
        self.mark_shape_list_changed();
        self.shapes.len() - 1
    }

    pub(crate) fn replace_shape(&mut self, index: usize, shape: Arc<dyn Shape>) -> Result<()> {
        self.shape_instance_mut(index)?.shape = shape;
        self.mark_shape_list_changed();
        Ok(())
    }

    pub(crate) fn take_shape(&mut self, index: usize) -> Result<ShapeInstance> {
        self.shape_instance(index)?;
        let removed = self.shapes.remove(index);
        self.mark_shape_list_changed();
        Ok(removed)
    }

    pub(crate) fn set_shape_disabled_internal(&mut self, index: usize, disabled: bool) -> Result<()> {
        self.shape_instance_mut(index)?.disabled = disabled;
        self.mark_shape_list_changed();
        Ok(())
    }

    /// Sets the transform of a shape relative to the object
    pub fn set_shape_transform(&mut self, index: usize, xform: Transform2D) -> Result<()> {
        let instance = self.shape_instance_mut(index)?;
        instance.xform = xform;
        instance.xform_inv = xform.affine_inverse();
        self.mark_shape_list_changed();
        Ok(())
    }

    /// Makes a shape block only along its local +Y axis
    pub fn set_shape_as_one_way_collision(&mut self, index: usize, enabled: bool, margin: f32) -> Result<()> {
        let instance = self.shape_instance_mut(index)?;
        instance.one_way_collision = enabled;
        instance.one_way_collision_margin = margin;
        Ok(())
    }

    /// Attaches user data to a shape, reported back by queries
    pub fn set_shape_metadata(&mut self, index: usize, metadata: u64) -> Result<()> {
        self.shape_instance_mut(index)?.metadata = metadata;
        Ok(())
    }

    pub fn get_collision_layer(&self) -> CollisionLayers {
        self.filter.layer
    }

    pub fn set_collision_layer(&mut self, layer: CollisionLayers) {
        self.filter.layer = layer;
    }

    pub fn get_collision_mask(&self) -> CollisionLayers {
        self.filter.mask
    }

    pub fn set_collision_mask(&mut self, mask: CollisionLayers) {
        self.filter.mask = mask;
    }

    /// Whether either object's mask scans the other's layer
    pub fn interacts_with(&self, other: &CollisionObject) -> bool {
        self.filter.interacts_with(&other.filter)
    }

    pub fn is_pickable(&self) -> bool {
        self.pickable
    }

    pub fn set_pickable(&mut self, pickable: bool) {
        self.pickable = pickable;
    }

    pub fn is_static(&self) -> bool {
        self.is_static
    }

    /// Recomputes the cached world AABB of every enabled shape.
    ///
    /// Without motion the box is grown by 5% of its mean size; with motion it is
    /// merged with its translated copy instead.
    pub(crate) fn update_shape_aabbs(&mut self) {
        let motion = self.pending_motion;
        for instance in self.shapes.iter_mut().filter(|s| !s.disabled) {
            let xform = self.transform * instance.xform;
            let aabb = instance.shape.get_local_bounds().transformed(&xform);
            instance.aabb_cache = if motion.is_zero() {
                let size = aabb.extents();
                aabb.grow((size.x + size.y) * 0.5 * 0.05)
            } else {
                aabb.merge(&aabb.translated(motion))
            };
        }
        self.pending_shape_update = false;
        self.pending_motion = Vector2::zero();
    }

    /// Union of the cached AABBs of all enabled shapes
    pub(crate) fn enabled_shapes_aabb(&self) -> Option<Aabb> {
        self.shapes
            .iter()
            .filter(|s| !s.disabled)
            .map(|s| s.aabb_cache)
            .reduce(|acc, aabb| acc.merge(&aabb))
    }
}
