use crate::core::{ConstraintHandle, ShapeOwner};
use crate::math::{Aabb, Vector2};
use log::trace;
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Identifier of a shape proxy inside a broad-phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProxyId(pub(crate) u32);

/// Receives pair notifications when proxy AABBs start or stop overlapping
pub trait PairHandler {
    /// Two proxies started overlapping. The returned constraint is handed back on unpair.
    fn pair(&mut self, a: ShapeOwner, b: ShapeOwner) -> Option<ConstraintHandle>;

    /// Two proxies stopped overlapping or one of them was removed
    fn unpair(&mut self, a: ShapeOwner, b: ShapeOwner, data: Option<ConstraintHandle>);
}

/// Trait for broad-phase collision detection algorithms
pub trait BroadPhase {
    /// Registers a shape proxy
    fn create(&mut self, owner: ShapeOwner, aabb: Aabb, is_static: bool) -> ProxyId;

    /// Updates the AABB of a proxy. Pairs are refreshed by the next `update`.
    fn move_proxy(&mut self, id: ProxyId, aabb: Aabb);

    /// Marks a proxy as static; static proxies never pair with each other
    fn set_static(&mut self, id: ProxyId, is_static: bool);

    /// Removes a proxy, unpairing everything it overlapped
    fn remove(&mut self, id: ProxyId, handler: &mut dyn PairHandler);

    /// Returns the owner of a proxy
    fn get_owner(&self, id: ProxyId) -> Option<ShapeOwner>;

    /// Returns the AABB of a proxy
    fn get_aabb(&self, id: ProxyId) -> Option<Aabb>;

    /// Proxies whose AABB overlaps `aabb`, at most `max_results`, ordered by id
    fn cull_aabb(&self, aabb: &Aabb, max_results: usize) -> Vec<ShapeOwner>;

    /// Proxies whose AABB is crossed by the segment `from -> to`, at most `max_results`
    fn cull_segment(&self, from: Vector2, to: Vector2, max_results: usize) -> Vec<ShapeOwner>;

    /// Diffs overlapping pairs against the previous update and notifies `handler`
    fn update(&mut self, handler: &mut dyn PairHandler);
}

#[derive(Debug, Clone)]
struct Proxy {
    owner: ShapeOwner,
    aabb: Aabb,
    is_static: bool,
}

/// Proxy table and pair cache shared by the broad-phase implementations
#[derive(Debug, Default)]
struct ProxyTable {
    proxies: Vec<Option<Proxy>>,
    pairs: BTreeMap<(ProxyId, ProxyId), Option<ConstraintHandle>>,
}

impl ProxyTable {
    fn insert(&mut self, owner: ShapeOwner, aabb: Aabb, is_static: bool) -> ProxyId {
        let id = ProxyId(self.proxies.len() as u32);
        self.proxies.push(Some(Proxy { owner, aabb, is_static }));
        id
    }

    fn get(&self, id: ProxyId) -> Option<&Proxy> {
        self.proxies.get(id.0 as usize)?.as_ref()
    }

    fn get_mut(&mut self, id: ProxyId) -> Option<&mut Proxy> {
        self.proxies.get_mut(id.0 as usize)?.as_mut()
    }

    fn iter(&self) -> impl Iterator<Item = (ProxyId, &Proxy)> + '_ {
        self.proxies
            .iter()
            .enumerate()
            .filter_map(|(i, proxy)| proxy.as_ref().map(|proxy| (ProxyId(i as u32), proxy)))
    }

    /// Whether two overlapping proxies should be reported as a pair
    fn can_pair(&self, a: ProxyId, b: ProxyId) -> bool {
        match (self.get(a), self.get(b)) {
            (Some(pa), Some(pb)) => {
                !(pa.is_static && pb.is_static)
                    && pa.owner.object != pb.owner.object
                    && pa.aabb.intersects(&pb.aabb)
            }
            _ => false,
        }
    }

    fn remove(&mut self, id: ProxyId, handler: &mut dyn PairHandler) {
        let stale: Vec<(ProxyId, ProxyId)> = self
            .pairs
            .keys()
            .filter(|(a, b)| *a == id || *b == id)
            .copied()
            .collect();

        for key in stale {
            if let Some(data) = self.pairs.remove(&key) {
                if let (Some(pa), Some(pb)) = (self.get(key.0), self.get(key.1)) {
                    handler.unpair(pa.owner, pb.owner, data);
                }
            }
        }

        if let Some(slot) = self.proxies.get_mut(id.0 as usize) {
            *slot = None;
        }
    }

    /// Applies the overlapping set found by an update
    fn apply_candidates(&mut self, candidates: BTreeSet<(ProxyId, ProxyId)>, handler: &mut dyn PairHandler) {
        let stale: Vec<(ProxyId, ProxyId)> = self
            .pairs
            .keys()
            .filter(|key| !candidates.contains(key))
            .copied()
            .collect();

        for key in stale {
            if let Some(data) = self.pairs.remove(&key) {
                if let (Some(pa), Some(pb)) = (self.get(key.0), self.get(key.1)) {
                    trace!("unpair {:?} {:?}", pa.owner, pb.owner);
                    handler.unpair(pa.owner, pb.owner, data);
                }
            }
        }

        for key in candidates {
            if self.pairs.contains_key(&key) {
                continue;
            }
            if let (Some(pa), Some(pb)) = (self.get(key.0), self.get(key.1)) {
                trace!("pair {:?} {:?}", pa.owner, pb.owner);
                let data = handler.pair(pa.owner, pb.owner);
                self.pairs.insert(key, data);
            }
        }
    }
}

#[inline]
fn ordered(a: ProxyId, b: ProxyId) -> (ProxyId, ProxyId) {
    if a < b { (a, b) } else { (b, a) }
}

/// Simple brute-force broad-phase algorithm
#[derive(Debug, Default)]
pub struct BruteForceBroadPhase {
    table: ProxyTable,
}

impl BruteForceBroadPhase {
    /// Creates a new brute-force broad-phase
    pub fn new() -> Self {
        Self::default()
    }
}

impl BroadPhase for BruteForceBroadPhase {
    fn create(&mut self, owner: ShapeOwner, aabb: Aabb, is_static: bool) -> ProxyId {
        self.table.insert(owner, aabb, is_static)
    }

    fn move_proxy(&mut self, id: ProxyId, aabb: Aabb) {
        if let Some(proxy) = self.table.get_mut(id) {
            proxy.aabb = aabb;
        }
    }

    fn set_static(&mut self, id: ProxyId, is_static: bool) {
        if let Some(proxy) = self.table.get_mut(id) {
            proxy.is_static = is_static;
        }
    }

    fn remove(&mut self, id: ProxyId, handler: &mut dyn PairHandler) {
        self.table.remove(id, handler);
    }

    fn get_owner(&self, id: ProxyId) -> Option<ShapeOwner> {
        self.table.get(id).map(|proxy| proxy.owner)
    }

    fn get_aabb(&self, id: ProxyId) -> Option<Aabb> {
        self.table.get(id).map(|proxy| proxy.aabb)
    }

    fn cull_aabb(&self, aabb: &Aabb, max_results: usize) -> Vec<ShapeOwner> {
        self.table
            .iter()
            .filter(|(_, proxy)| proxy.aabb.intersects(aabb))
            .map(|(_, proxy)| proxy.owner)
            .take(max_results)
            .collect()
    }

    fn cull_segment(&self, from: Vector2, to: Vector2, max_results: usize) -> Vec<ShapeOwner> {
        self.table
            .iter()
            .filter(|(_, proxy)| proxy.aabb.intersects_segment(from, to).is_some())
            .map(|(_, proxy)| proxy.owner)
            .take(max_results)
            .collect()
    }

    fn update(&mut self, handler: &mut dyn PairHandler) {
        let ids: Vec<ProxyId> = self.table.iter().map(|(id, _)| id).collect();
        let mut candidates = BTreeSet::new();

        // Check all pairs of proxies
        for (i, &a) in ids.iter().enumerate() {
            for &b in &ids[i + 1..] {
                if self.table.can_pair(a, b) {
                    candidates.insert(ordered(a, b));
                }
            }
        }

        self.table.apply_candidates(candidates, handler);
    }
}

/// Spatial hashing broad-phase algorithm.
///
/// Proxies covering more than `large_object_cells` cells are kept in a separate list
/// and tested against everything.
#[derive(Debug)]
pub struct SpatialHashing {
    /// The cell size (both dimensions)
    cell_size: f32,

    /// Proxies above this cell count skip the grid
    large_object_cells: i64,

    /// The cells containing proxies
    cells: HashMap<(i32, i32), Vec<ProxyId>>,

    /// Proxies too large for the grid
    large_objects: BTreeSet<ProxyId>,

    table: ProxyTable,
}

impl SpatialHashing {
    /// Creates a new spatial hashing broad-phase
    pub fn new(cell_size: f32) -> Self {
        Self {
            cell_size: cell_size.max(crate::math::EPSILON),
            large_object_cells: 64,
            cells: HashMap::new(),
            large_objects: BTreeSet::new(),
            table: ProxyTable::default(),
        }
    }

    /// Gets the cell index for a position
    fn get_cell_index(&self, position: Vector2) -> (i32, i32) {
        (
            (position.x / self.cell_size).floor() as i32,
            (position.y / self.cell_size).floor() as i32,
        )
    }

    /// Gets the range of cell indices for an AABB
    fn get_cell_range(&self, aabb: &Aabb) -> ((i32, i32), (i32, i32)) {
        (self.get_cell_index(aabb.min), self.get_cell_index(aabb.max))
    }

    fn cell_count(range: ((i32, i32), (i32, i32))) -> i64 {
        let ((x0, y0), (x1, y1)) = range;
        (x1 as i64 - x0 as i64 + 1) * (y1 as i64 - y0 as i64 + 1)
    }

    fn insert_into_grid(&mut self, id: ProxyId, aabb: &Aabb) {
        let range = self.get_cell_range(aabb);
        if Self::cell_count(range) > self.large_object_cells {
            self.large_objects.insert(id);
            return;
        }

        let ((x0, y0), (x1, y1)) = range;
        for x in x0..=x1 {
            for y in y0..=y1 {
                self.cells.entry((x, y)).or_default().push(id);
            }
        }
    }

    fn remove_from_grid(&mut self, id: ProxyId, aabb: &Aabb) {
        if self.large_objects.remove(&id) {
            return;
        }

        let ((x0, y0), (x1, y1)) = self.get_cell_range(aabb);
        for x in x0..=x1 {
            for y in y0..=y1 {
                if let Some(cell) = self.cells.get_mut(&(x, y)) {
                    cell.retain(|other| *other != id);
                    if cell.is_empty() {
                        self.cells.remove(&(x, y));
                    }
                }
            }
        }
    }

    /// Candidate proxies around an AABB (may contain duplicates and misses)
    fn gather(&self, aabb: &Aabb) -> Vec<ProxyId> {
        let range = self.get_cell_range(aabb);
        if Self::cell_count(range) > self.large_object_cells {
            return self.table.iter().map(|(id, _)| id).collect();
        }

        let ((x0, y0), (x1, y1)) = range;
        let mut found: Vec<ProxyId> = self.large_objects.iter().copied().collect();
        for x in x0..=x1 {
            for y in y0..=y1 {
                if let Some(cell) = self.cells.get(&(x, y)) {
                    found.extend_from_slice(cell);
                }
            }
        }

        found.sort();
        found.dedup();
        found
    }
}

impl Default for SpatialHashing {
    fn default() -> Self {
        Self::new(128.0)
    }
}

impl BroadPhase for SpatialHashing {
    fn create(&mut self, owner: ShapeOwner, aabb: Aabb, is_static: bool) -> ProxyId {
        let id = self.table.insert(owner, aabb, is_static);
        self.insert_into_grid(id, &aabb);
        id
    }

    fn move_proxy(&mut self, id: ProxyId, aabb: Aabb) {
        let old = match self.table.get(id) {
            Some(proxy) => proxy.aabb,
            None => return,
        };
        if self.get_cell_range(&old) != self.get_cell_range(&aabb) {
            self.remove_from_grid(id, &old);
            self.insert_into_grid(id, &aabb);
        }
        if let Some(proxy) = self.table.get_mut(id) {
            proxy.aabb = aabb;
        }
    }

    fn set_static(&mut self, id: ProxyId, is_static: bool) {
        if let Some(proxy) = self.table.get_mut(id) {
            proxy.is_static = is_static;
        }
    }

    fn remove(&mut self, id: ProxyId, handler: &mut dyn PairHandler) {
        if let Some(aabb) = self.table.get(id).map(|proxy| proxy.aabb) {
            self.remove_from_grid(id, &aabb);
        }
        self.table.remove(id, handler);
    }

    fn get_owner(&self, id: ProxyId) -> Option<ShapeOwner> {
        self.table.get(id).map(|proxy| proxy.owner)
    }

    fn get_aabb(&self, id: ProxyId) -> Option<Aabb> {
        self.table.get(id).map(|proxy| proxy.aabb)
    }

    fn cull_aabb(&self, aabb: &Aabb, max_results: usize) -> Vec<ShapeOwner> {
        self.gather(aabb)
            .into_iter()
            .filter_map(|id| self.table.get(id))
            .filter(|proxy| proxy.aabb.intersects(aabb))
            .map(|proxy| proxy.owner)
            .take(max_results)
            .collect()
    }

    fn cull_segment(&self, from: Vector2, to: Vector2, max_results: usize) -> Vec<ShapeOwner> {
        let bounds = Aabb::new(from, from).merge(&Aabb::new(to, to));
        self.gather(&bounds)
            .into_iter()
            .filter_map(|id| self.table.get(id))
            .filter(|proxy| proxy.aabb.intersects_segment(from, to).is_some())
            .map(|proxy| proxy.owner)
            .take(max_results)
            .collect()
    }

    fn update(&mut self, handler: &mut dyn PairHandler) {
        let mut candidates = BTreeSet::new();

        // Check for overlaps within each cell
        for ids in self.cells.values() {
            for (i, &a) in ids.iter().enumerate() {
                for &b in &ids[i + 1..] {
                    if self.table.can_pair(a, b) {
                        candidates.insert(ordered(a, b));
                    }
                }
            }
        }

        // Large objects against everything
        for &large in &self.large_objects {
            for (other, _) in self.table.iter() {
                if other != large && self.table.can_pair(large, other) {
                    candidates.insert(ordered(large, other));
                }
            }
        }

        self.table.apply_candidates(candidates, handler);
    }
}
