use crate::core::{AreaHandle, BodyHandle, ConstraintHandle};
use crate::error::PhysicsError;
use crate::Result;
use std::fmt::Debug;
use std::marker::PhantomData;

/// A handle type that indexes a `HandleStorage`
pub trait StorageHandle: Copy + Ord + Debug {
    /// Name used in error messages
    const KIND: &'static str;

    fn from_index(index: u32) -> Self;

    fn index(self) -> u32;
}

impl StorageHandle for BodyHandle {
    const KIND: &'static str = "Body";

    fn from_index(index: u32) -> Self {
        BodyHandle(index)
    }

    fn index(self) -> u32 {
        self.0
    }
}

impl StorageHandle for AreaHandle {
    const KIND: &'static str = "Area";

    fn from_index(index: u32) -> Self {
        AreaHandle(index)
    }

    fn index(self) -> u32 {
        self.0
    }
}

impl StorageHandle for ConstraintHandle {
    const KIND: &'static str = "Constraint";

    fn from_index(index: u32) -> Self {
        ConstraintHandle(index)
    }

    fn index(self) -> u32 {
        self.0
    }
}

/// Generic storage trait for physics objects
pub trait Storage<T, H> {
    /// Creates a new empty storage
    fn new() -> Self;

    /// Adds an item to the storage and returns its handle
    fn add(&mut self, item: T) -> H;

    /// Gets a reference to an item by its handle
    fn get(&self, handle: H) -> Option<&T>;

    /// Gets a mutable reference to an item by its handle
    fn get_mut(&mut self, handle: H) -> Option<&mut T>;

    /// Removes an item from the storage
    fn remove(&mut self, handle: H) -> Option<T>;

    /// Returns the number of items in the storage
    fn len(&self) -> usize;

    /// Returns whether the storage is empty
    fn is_empty(&self) -> bool;

    /// Returns all handles in creation order
    fn handles(&self) -> Vec<H>;
}

/// Slot storage indexed by handle.
///
/// Handles are never reused, so iteration order is creation order and simulation
/// order does not depend on hashing.
#[derive(Debug)]
pub struct HandleStorage<H, T> {
    items: Vec<Option<T>>,
    len: usize,
    _marker: PhantomData<H>,
}

impl<H: StorageHandle, T> Default for HandleStorage<H, T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            len: 0,
            _marker: PhantomData,
        }
    }
}

impl<H: StorageHandle, T> Storage<T, H> for HandleStorage<H, T> {
    fn new() -> Self {
        Self::default()
    }

    fn add(&mut self, item: T) -> H {
        let handle = H::from_index(self.items.len() as u32);
        self.items.push(Some(item));
        self.len += 1;
        handle
    }

    fn get(&self, handle: H) -> Option<&T> {
        self.items.get(handle.index() as usize)?.as_ref()
    }

    fn get_mut(&mut self, handle: H) -> Option<&mut T> {
        self.items.get_mut(handle.index() as usize)?.as_mut()
    }

    fn remove(&mut self, handle: H) -> Option<T> {
        let item = self.items.get_mut(handle.index() as usize)?.take();
        if item.is_some() {
            self.len -= 1;
        }
        item
    }

    fn len(&self) -> usize {
        self.len
    }

    fn is_empty(&self) -> bool {
        self.len == 0
    }

    fn handles(&self) -> Vec<H> {
        self.iter().map(|(handle, _)| handle).collect()
    }
}

impl<H: StorageHandle, T> HandleStorage<H, T> {
    /// Gets an item by its handle, returning an error if not found
    pub fn fetch(&self, handle: H) -> Result<&T> {
        self.get(handle)
            .ok_or_else(|| PhysicsError::ResourceNotFound(format!("{} with handle {:?} not found", H::KIND, handle)))
    }

    /// Gets a mutable reference to an item by its handle, returning an error if not found
    pub fn fetch_mut(&mut self, handle: H) -> Result<&mut T> {
        self.get_mut(handle)
            .ok_or_else(|| PhysicsError::ResourceNotFound(format!("{} with handle {:?} not found", H::KIND, handle)))
    }

    /// Returns whether the handle refers to a live item
    pub fn contains(&self, handle: H) -> bool {
        self.get(handle).is_some()
    }

    /// Borrows two distinct items mutably at once
    pub fn get2_mut(&mut self, a: H, b: H) -> Option<(&mut T, &mut T)> {
        let (ia, ib) = (a.index() as usize, b.index() as usize);
        if ia == ib || ia >= self.items.len() || ib >= self.items.len() {
            return None;
        }

        if ia < ib {
            let (left, right) = self.items.split_at_mut(ib);
            Some((left[ia].as_mut()?, right[0].as_mut()?))
        } else {
            let (left, right) = self.items.split_at_mut(ia);
            Some((right[0].as_mut()?, left[ib].as_mut()?))
        }
    }

    /// Iterates over live items in creation order
    pub fn iter(&self) -> impl Iterator<Item = (H, &T)> + '_ {
        self.items
            .iter()
            .enumerate()
            .filter_map(|(i, item)| item.as_ref().map(|item| (H::from_index(i as u32), item)))
    }

    /// Mutable iteration over live items in creation order
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (H, &mut T)> + '_ {
        self.items
            .iter_mut()
            .enumerate()
            .filter_map(|(i, item)| item.as_mut().map(|item| (H::from_index(i as u32), item)))
    }
}
