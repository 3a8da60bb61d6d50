//! Island manager: merge-on-insert, split-on-remove, explicit island edits.
//!
//! ## Merge (edge batch insert)
//!
//! Every endpoint in the batch maps to a union-find slot keyed by its
//! current island, or by the vertex itself when it has none. Unioning the
//! slots of each edge yields groups. A loose endpoint is also unioned with
//! its neighbors that have an island or gain one in the batch. Per group:
//!
//! - no island: one new island takes every loose vertex
//! - islands present: the lowest-index island allowing `Merge` and `Add`
//!   survives, every other `Merge` island is absorbed into it and
//!   destroyed, loose vertices join it
//!
//! Each endpoint's island is looked up once per batch, however many edges
//! touch it.
//!
//! ## Split (removal)
//!
//! One breadth-first pass over the island's internal adjacency. The
//! component chosen by `SplitSurvivor` keeps the handle; every other
//! component moves to a new island that inherits the original's flags.
//! Singleton components keep an island of their own.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use tracing::{debug, trace, warn};

use crate::config::SplitSurvivor;
use crate::types::{
    ConnectivityChange, GraphEvent, IslandHandle, IslandOperations, UniqueIndex, VertexHandle,
};
use super::union_find::DisjointSet;
use super::Graph;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum MergeKey {
    Island(UniqueIndex),
    Loose(UniqueIndex),
}

#[derive(Debug, Default)]
struct MergeGroup {
    islands: Vec<UniqueIndex>,
    loose: Vec<UniqueIndex>,
}

/// Union-find over island identities for one edge batch.
struct MergePlan {
    sets: DisjointSet,
    keys: Vec<MergeKey>,
    slots: BTreeMap<MergeKey, usize>,
    vertex_slots: HashMap<UniqueIndex, usize>,
}

impl MergePlan {
    fn with_capacity(edges: usize) -> Self {
        Self {
            sets: DisjointSet::with_capacity(edges * 2),
            keys: Vec::with_capacity(edges * 2),
            slots: BTreeMap::new(),
            vertex_slots: HashMap::with_capacity(edges * 2),
        }
    }

    fn slot_for(&mut self, graph: &Graph, vertex: UniqueIndex) -> usize {
        if let Some(&slot) = self.vertex_slots.get(&vertex) {
            return slot;
        }
        let key = match graph.state.vertices.get(&vertex).and_then(|v| v.parent_island) {
            Some(island) => MergeKey::Island(island),
            None => MergeKey::Loose(vertex),
        };
        let slot = self.key_slot(key);
        self.vertex_slots.insert(vertex, slot);
        slot
    }

    /// Union each loose endpoint with every neighbor that has an island or
    /// gains one in this batch. Loose vertices keep edges after their island
    /// is removed, and those edges count once the vertex is islanded again.
    fn link_loose_neighbors(&mut self, graph: &Graph) {
        let mut loose: Vec<(UniqueIndex, usize)> = self
            .vertex_slots
            .iter()
            .filter(|&(_, &slot)| matches!(self.keys[slot], MergeKey::Loose(_)))
            .map(|(&vertex, &slot)| (vertex, slot))
            .collect();
        loose.sort_unstable();

        for (vertex, slot) in loose {
            let Some(record) = graph.state.vertices.get(&vertex) else {
                continue;
            };
            for neighbor in &record.neighbors {
                let other = match graph.state.vertices.get(neighbor).and_then(|n| n.parent_island) {
                    Some(island) => self.key_slot(MergeKey::Island(island)),
                    None => match self.vertex_slots.get(neighbor) {
                        Some(&other) => other,
                        None => continue,
                    },
                };
                self.sets.union(slot, other);
            }
        }
    }

    fn key_slot(&mut self, key: MergeKey) -> usize {
        if let Some(&slot) = self.slots.get(&key) {
            return slot;
        }
        let slot = self.sets.make_set();
        self.keys.push(key);
        self.slots.insert(key, slot);
        slot
    }

    fn into_groups(mut self) -> Vec<MergeGroup> {
        let mut by_root: BTreeMap<usize, MergeGroup> = BTreeMap::new();
        for slot in 0..self.keys.len() {
            let root = self.sets.find(slot);
            let group = by_root.entry(root).or_default();
            match self.keys[slot] {
                MergeKey::Island(island) => group.islands.push(island),
                MergeKey::Loose(vertex) => group.loose.push(vertex),
            }
        }
        by_root
            .into_values()
            .map(|mut group| {
                group.islands.sort();
                group.loose.sort();
                group
            })
            .collect()
    }
}

impl Graph {
    // ─────────────────────────────────────────────────────────────────────
    // Public island API
    // ─────────────────────────────────────────────────────────────────────

    /// Create an island holding `vertices`.
    ///
    /// Vertices already in another island are moved; islands left empty are
    /// destroyed. Unknown vertices are skipped. Returns `None` if `index` is
    /// already in use.
    pub fn create_island(&mut self, vertices: &[VertexHandle], index: Option<UniqueIndex>) -> Option<IslandHandle> {
        let operations = self.state.config.default_island_operations;
        let island = self.spawn_island(index, operations)?;

        let members: BTreeSet<UniqueIndex> = vertices
            .iter()
            .filter_map(|v| self.state.resolve_vertex(v))
            .collect();
        let mut departed = BTreeSet::new();
        for vertex in members {
            if let Some(previous) = self.move_vertex(vertex, island) {
                departed.insert(previous);
            }
        }
        for previous in departed {
            self.after_departure(previous);
        }

        Some(self.state.bound_island_handle(island))
    }

    /// Destroy an island whose `Destroy` flag is set.
    ///
    /// Members are detached and keep living without an island.
    pub fn remove_island(&mut self, island: &IslandHandle) -> bool {
        let Some(index) = self.state.resolve_island(island) else {
            return false;
        };
        if !self.island_allows(index, IslandOperations::DESTROY) {
            warn!(island = %index, "island does not allow destroy");
            return false;
        }

        let members: Vec<UniqueIndex> = self
            .state
            .islands
            .get(&index)
            .map(|i| i.vertices().collect())
            .unwrap_or_default();
        for vertex in members {
            self.leave_island(vertex);
        }
        self.destroy_island(index);
        true
    }

    /// Move `vertex` into `island`. Requires `Add` on the island.
    pub fn add_vertex_to_island(&mut self, island: &IslandHandle, vertex: &VertexHandle) -> bool {
        let (Some(island), Some(vertex)) = (self.state.resolve_island(island), self.state.resolve_vertex(vertex)) else {
            return false;
        };
        if !self.island_allows(island, IslandOperations::ADD) {
            warn!(island = %island, "island does not allow add");
            return false;
        }
        let current = self.state.vertices.get(&vertex).and_then(|v| v.parent_island);
        if current == Some(island) {
            return false;
        }

        if let Some(previous) = self.move_vertex(vertex, island) {
            self.after_departure(previous);
        }
        true
    }

    /// Take `vertex` out of `island`, leaving it without an island.
    pub fn remove_vertex_from_island(&mut self, island: &IslandHandle, vertex: &VertexHandle) -> bool {
        let (Some(island), Some(vertex)) = (self.state.resolve_island(island), self.state.resolve_vertex(vertex)) else {
            return false;
        };
        let current = self.state.vertices.get(&vertex).and_then(|v| v.parent_island);
        if current != Some(island) {
            return false;
        }

        self.leave_island(vertex);
        self.after_departure(island);
        true
    }

    /// Replace an island's allowed operations.
    pub fn set_island_operations(&mut self, island: &IslandHandle, operations: IslandOperations) -> bool {
        let Some(index) = self.state.resolve_island(island) else {
            return false;
        };
        match self.state.islands.get_mut(&index) {
            Some(island) => {
                island.set_operations(operations);
                true
            }
            None => false,
        }
    }

    /// Re-scan one island and split it if it is no longer connected.
    ///
    /// An empty island is destroyed. Returns `true` if the island changed.
    pub fn refresh_island_connectivity(&mut self, island: &IslandHandle) -> bool {
        match self.state.resolve_island(island) {
            Some(index) => self.remove_or_split(index),
            None => false,
        }
    }

    /// Refresh every island. Returns how many changed.
    pub fn refresh_all_islands(&mut self) -> usize {
        let islands: Vec<UniqueIndex> = self.state.islands.keys().copied().collect();
        islands
            .into_iter()
            .filter(|&island| self.remove_or_split(island))
            .count()
    }

    // ─────────────────────────────────────────────────────────────────────
    // Merge
    // ─────────────────────────────────────────────────────────────────────

    pub(crate) fn merge_islands_for_edges(&mut self, pairs: &[(UniqueIndex, UniqueIndex)]) {
        if pairs.is_empty() {
            return;
        }

        let mut plan = MergePlan::with_capacity(pairs.len());
        for &(a, b) in pairs {
            let slot_a = plan.slot_for(self, a);
            let slot_b = plan.slot_for(self, b);
            plan.sets.union(slot_a, slot_b);
        }
        plan.link_loose_neighbors(self);

        for group in plan.into_groups() {
            self.apply_merge_group(group);
        }
    }

    fn apply_merge_group(&mut self, group: MergeGroup) {
        if group.islands.is_empty() {
            let operations = self.state.config.default_island_operations;
            if let Some(island) = self.spawn_island(None, operations) {
                for &vertex in &group.loose {
                    self.move_vertex(vertex, island);
                }
                debug!(island = %island, vertices = group.loose.len(), "created island from loose vertices");
            }
            return;
        }

        let survivor = if group.islands.len() > 1 {
            group
                .islands
                .iter()
                .copied()
                .find(|&i| self.island_allows(i, IslandOperations::MERGE | IslandOperations::ADD))
        } else {
            None
        };

        let mut absorbed = 0usize;
        if let Some(survivor) = survivor {
            for &island in &group.islands {
                if island == survivor || !self.island_allows(island, IslandOperations::MERGE) {
                    continue;
                }
                self.absorb_island(island, survivor);
                absorbed += 1;
            }
        }

        if group.loose.is_empty() {
            if absorbed > 0 {
                debug!(survivor = ?survivor, absorbed, "merged islands");
            }
            return;
        }

        let target = survivor.or_else(|| {
            group
                .islands
                .iter()
                .copied()
                .find(|&i| self.island_allows(i, IslandOperations::ADD))
        });
        let target = match target {
            Some(target) => Some(target),
            None => {
                let operations = self.state.config.default_island_operations;
                self.spawn_island(None, operations)
            }
        };
        if let Some(target) = target {
            for &vertex in &group.loose {
                self.move_vertex(vertex, target);
            }
        }
        debug!(
            target = ?target,
            absorbed,
            joined = group.loose.len(),
            "merged islands"
        );
    }

    fn absorb_island(&mut self, from: UniqueIndex, into: UniqueIndex) {
        let members: Vec<UniqueIndex> = self
            .state
            .islands
            .get(&from)
            .map(|i| i.vertices().collect())
            .unwrap_or_default();
        for vertex in members {
            self.move_vertex(vertex, into);
        }
        self.destroy_island(from);
    }

    // ─────────────────────────────────────────────────────────────────────
    // Split
    // ─────────────────────────────────────────────────────────────────────

    /// Called after vertices left `island`: destroy it if empty, otherwise
    /// split it when `split_on_removal` is set.
    pub(crate) fn after_departure(&mut self, island: UniqueIndex) {
        let Some(current) = self.state.islands.get(&island) else {
            return;
        };
        if current.is_empty() {
            self.destroy_island(island);
        } else if self.state.config.split_on_removal {
            self.remove_or_split(island);
        }
    }

    /// Destroy `island` if empty, otherwise split it into its connected
    /// components. Returns `true` if the island changed.
    pub(crate) fn remove_or_split(&mut self, island: UniqueIndex) -> bool {
        let Some(current) = self.state.islands.get(&island) else {
            return false;
        };
        if current.is_empty() {
            self.destroy_island(island);
            return true;
        }
        if !current.is_operation_allowed(IslandOperations::SPLIT) {
            return false;
        }

        let operations = current.operations();
        let components = self.state.components_within(&current.vertices);
        if components.len() <= 1 {
            return false;
        }

        let keep = match self.state.config.split_survivor {
            SplitSurvivor::FirstVisited => 0,
            SplitSurvivor::Largest => components
                .iter()
                .enumerate()
                .max_by(|(ia, a), (ib, b)| a.len().cmp(&b.len()).then(ib.cmp(ia)))
                .map(|(i, _)| i)
                .unwrap_or(0),
        };

        let mut created = Vec::with_capacity(components.len() - 1);
        for (position, component) in components.into_iter().enumerate() {
            if position == keep {
                continue;
            }
            let Some(target) = self.spawn_island(None, operations) else {
                continue;
            };
            for vertex in component {
                self.move_vertex(vertex, target);
            }
            created.push(self.state.bound_island_handle(target));
        }

        let source = self.state.bound_island_handle(island);
        debug!(island = %island, new_islands = created.len(), "split island");
        self.emit(GraphEvent::IslandConnectivityChanged {
            island: source.clone(),
            change: ConnectivityChange::SplitTo(created.clone()),
        });
        for target in created {
            self.emit(GraphEvent::IslandConnectivityChanged {
                island: target,
                change: ConnectivityChange::SplitFrom(source.clone()),
            });
        }
        true
    }

    // ─────────────────────────────────────────────────────────────────────
    // Membership primitives
    // ─────────────────────────────────────────────────────────────────────

    fn island_allows(&self, island: UniqueIndex, operations: IslandOperations) -> bool {
        self.state
            .islands
            .get(&island)
            .is_some_and(|i| i.is_operation_allowed(operations))
    }

    /// Create and register an island with `operations` (intersected with
    /// whatever the factory allows). Fires `IslandCreated`.
    fn spawn_island(&mut self, index: Option<UniqueIndex>, operations: IslandOperations) -> Option<UniqueIndex> {
        let index = self.claim_index(index)?;
        let mut island = self.factory.create_typed_island();
        let operations = island.operations() & operations;
        island.set_operations(operations);
        island.register(index, &self.state.identity);
        self.state.islands.insert(index, island);

        self.emit(GraphEvent::IslandCreated(self.state.bound_island_handle(index)));
        Some(index)
    }

    /// Move a vertex into `to`, out of its current island if any.
    ///
    /// The whole move is applied before any event fires. Returns the island
    /// the vertex left.
    fn move_vertex(&mut self, vertex: UniqueIndex, to: UniqueIndex) -> Option<UniqueIndex> {
        let from = self.state.vertices.get(&vertex)?.parent_island;
        if from == Some(to) || !self.state.islands.contains_key(&to) {
            return None;
        }

        if let Some(island) = from.and_then(|f| self.state.islands.get_mut(&f)) {
            island.remove_vertex(vertex);
        }
        if let Some(island) = self.state.islands.get_mut(&to) {
            island.insert_vertex(vertex);
        }
        if let Some(v) = self.state.vertices.get_mut(&vertex) {
            v.parent_island = Some(to);
        }
        trace!(vertex = %vertex, from = ?from, to = %to, "moved vertex");

        let vertex_handle = self.state.bound_vertex_handle(vertex);
        let target = self.state.bound_island_handle(to);
        if let Some(from) = from {
            self.emit(GraphEvent::IslandVertexRemoved {
                island: self.state.bound_island_handle(from),
                vertex: vertex_handle.clone(),
            });
        }
        self.emit(GraphEvent::IslandVertexAdded {
            island: target.clone(),
            vertex: vertex_handle.clone(),
        });
        self.emit(GraphEvent::ParentIslandSet {
            vertex: vertex_handle,
            island: Some(target),
        });
        from
    }

    /// Take a vertex out of its island and clear its parent pointer.
    /// Returns the island it left.
    pub(crate) fn leave_island(&mut self, vertex: UniqueIndex) -> Option<UniqueIndex> {
        let from = self.state.vertices.get_mut(&vertex)?.parent_island.take()?;
        if let Some(island) = self.state.islands.get_mut(&from) {
            island.remove_vertex(vertex);
        }

        let vertex_handle = self.state.bound_vertex_handle(vertex);
        self.emit(GraphEvent::IslandVertexRemoved {
            island: self.state.bound_island_handle(from),
            vertex: vertex_handle.clone(),
        });
        self.emit(GraphEvent::ParentIslandSet {
            vertex: vertex_handle,
            island: None,
        });
        Some(from)
    }

    /// Remove an island from the graph and fire `IslandDestroyed` once.
    ///
    /// Members still listed are detached without events; callers empty the
    /// island first when they need per-vertex notifications.
    pub(crate) fn destroy_island(&mut self, index: UniqueIndex) {
        let Some(mut island) = self.state.islands.remove(&index) else {
            return;
        };
        for vertex in island.vertices() {
            if let Some(v) = self.state.vertices.get_mut(&vertex) {
                v.parent_island = None;
            }
        }
        if island.destroy() {
            self.emit(GraphEvent::IslandDestroyed(island.handle().clone()));
        }
        self.events.drop_island_scope(index);
    }

    /// Fill a freshly committed island without consulting operation flags.
    /// Used by the loader to restore a serialized partition as-is.
    pub(crate) fn adopt_vertices(&mut self, island: UniqueIndex, vertices: &[UniqueIndex]) {
        let mut departed = BTreeSet::new();
        for &vertex in vertices {
            if let Some(previous) = self.move_vertex(vertex.finalized(), island) {
                departed.insert(previous);
            }
        }
        for previous in departed {
            let empty = self.state.islands.get(&previous).is_some_and(|i| i.is_empty());
            if empty {
                self.destroy_island(previous);
            }
        }
    }
}
