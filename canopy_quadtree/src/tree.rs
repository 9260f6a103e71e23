// Copyright 2025 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The quadtree proper: slot addressing, insertion, removal, and queries.

use alloc::vec;
use alloc::vec::Vec;
use core::fmt::Debug;

use kurbo::Rect;

use crate::node::Node;
use crate::pool::NodePool;
use crate::{MAX_LEVELS, MAX_NODE_SIZE, POOL_CAPACITY};

/// Slot of `parent`'s child in the given quadrant (0..4).
///
/// Quadrants are laid out
/// ```text
/// | 0 | 1 |
/// | 2 | 3 |
/// ```
#[must_use]
pub const fn child_slot(parent: usize, quadrant: usize) -> usize {
    parent * 4 + 1 + quadrant
}

/// Slot of `child`'s parent. The root (slot 0) is its own parent.
#[must_use]
pub const fn parent_slot(child: usize) -> usize {
    if child == 0 { 0 } else { (child - 1) / 4 }
}

/// Splits a region into its four quadrant regions at the exact midpoint,
/// in [`child_slot`] quadrant order.
#[must_use]
pub fn child_regions(region: Rect) -> [Rect; 4] {
    let mid_x = (region.x0 + region.x1) * 0.5;
    let mid_y = (region.y0 + region.y1) * 0.5;
    [
        Rect::new(region.x0, region.y0, mid_x, mid_y),
        Rect::new(mid_x, region.y0, region.x1, mid_y),
        Rect::new(region.x0, mid_y, mid_x, region.y1),
        Rect::new(mid_x, mid_y, region.x1, region.y1),
    ]
}

/// Closed-interval overlap test on both axes.
///
/// Rectangles that merely touch along an edge or corner intersect. A box
/// lying exactly on a quadrant boundary therefore belongs to every adjacent
/// quadrant.
#[must_use]
pub fn regions_intersect(a: Rect, b: Rect) -> bool {
    a.x0 <= b.x1 && b.x0 <= a.x1 && a.y0 <= b.y1 && b.y0 <= a.y1
}

/// A region quadtree over keyed bounding boxes.
///
/// Nodes are stored in a flat sparse array addressed by [`child_slot`]; freed
/// nodes are recycled through a bounded pool. See the crate docs for the
/// structural invariants.
pub struct Quadtree<K> {
    max_levels: usize,
    max_size: usize,
    slots: Vec<Option<Node<K>>>,
    pool: NodePool<K>,
}

impl<K: Copy + PartialEq + Debug> Quadtree<K> {
    /// Creates a tree covering `region` with the default depth and capacity
    /// limits.
    #[must_use]
    pub fn new(region: Rect) -> Self {
        Self::with_limits(region, MAX_LEVELS, MAX_NODE_SIZE)
    }

    /// Creates a tree covering `region` with explicit limits.
    ///
    /// `max_levels` caps the depth (the root is level 0); `max_size` is the
    /// leaf capacity, soft at the depth cap.
    #[must_use]
    pub fn with_limits(region: Rect, max_levels: usize, max_size: usize) -> Self {
        let mut pool = NodePool::new(POOL_CAPACITY);
        let root = pool.create(region, 0);
        Self {
            max_levels,
            max_size,
            slots: vec![Some(root)],
            pool,
        }
    }

    /// The region covered by the root node.
    #[must_use]
    pub fn root_region(&self) -> Rect {
        match self.slots.first() {
            Some(Some(root)) => root.region(),
            _ => Rect::ZERO,
        }
    }

    /// Indexes `key` under `bbox`.
    ///
    /// The entry lands in every leaf whose region its box touches; returns
    /// `true` if at least one leaf accepted it. Insertion only fails when the
    /// box misses every quadrant of an already-partitioned node, i.e. when it
    /// lies outside the root region.
    pub fn insert(&mut self, key: K, bbox: Rect) -> bool {
        self.insert_at(key, bbox, 0)
    }

    /// Removes `key` from every leaf reachable under `bbox`.
    ///
    /// `bbox` must be the box the entry was last inserted under; see
    /// [`Entry`](crate::Entry). Subtrees emptied by the removal have their
    /// nodes recycled.
    pub fn remove(&mut self, key: K, bbox: Rect) {
        self.remove_at(key, bbox, 0);
    }

    /// Visits every leaf node whose region intersects `region`.
    pub fn visit_query<F: FnMut(&Node<K>)>(&self, region: Rect, mut f: F) {
        self.visit_query_at(region, 0, &mut f);
    }

    /// Collects every leaf node whose region intersects `region`.
    #[must_use]
    pub fn query(&self, region: Rect) -> Vec<&Node<K>> {
        let mut out = Vec::new();
        self.visit_query_at_ref(region, 0, &mut out);
        out
    }

    /// Pre-order visit of every allocated node, inner and leaf.
    pub fn visit<F: FnMut(&Node<K>)>(&self, mut f: F) {
        self.visit_at(0, &mut f);
    }

    /// Recycles every node and restarts the tree over a new root region.
    ///
    /// Used when the indexed space itself changes size; callers are expected
    /// to reinsert their entries afterwards.
    pub fn reset(&mut self, region: Rect) {
        let slots = core::mem::take(&mut self.slots);
        for node in slots.into_iter().flatten() {
            self.pool.recycle(node);
        }
        let root = self.pool.create(region, 0);
        self.slots = vec![Some(root)];
    }

    /// Drops every node and the recycling pool.
    pub fn clear(&mut self) {
        self.slots.clear();
        self.pool.clear();
    }

    fn insert_at(&mut self, key: K, bbox: Rect, slot: usize) -> bool {
        let (region, level, must_split) = match self.slots.get_mut(slot) {
            Some(Some(node)) if node.is_leaf() => {
                // Capacity is soft at the depth cap: a full leaf that cannot
                // split anymore overflows rather than losing the entry.
                if node.len() < self.max_size || node.level() >= self.max_levels {
                    node.add(key, bbox);
                    return true;
                }
                (node.region(), node.level(), true)
            }
            Some(Some(node)) => (node.region(), node.level(), false),
            _ => return false,
        };
        if must_split {
            self.split(slot, region, level);
        }
        let mut accepted = false;
        for (quadrant, child_region) in child_regions(region).into_iter().enumerate() {
            if regions_intersect(bbox, child_region) {
                let child = child_slot(slot, quadrant);
                self.ensure_child(child, child_region, level + 1);
                accepted |= self.insert_at(key, bbox, child);
            }
        }
        accepted
    }

    /// Partitions a full leaf, redistributing its entries by containment.
    fn split(&mut self, slot: usize, region: Rect, level: usize) {
        let entries = match self.slots.get_mut(slot) {
            Some(Some(node)) => node.clear_to_inner(),
            _ => return,
        };
        for (quadrant, child_region) in child_regions(region).into_iter().enumerate() {
            let child = child_slot(slot, quadrant);
            self.ensure_child(child, child_region, level + 1);
            for entry in &entries {
                if regions_intersect(entry.bbox, child_region) {
                    self.insert_at(entry.key, entry.bbox, child);
                }
            }
        }
    }

    /// Returns `true` if the subtree at `slot` is now empty and may be
    /// recycled by the caller.
    fn remove_at(&mut self, key: K, bbox: Rect, slot: usize) -> bool {
        let region = match self.slots.get_mut(slot) {
            Some(Some(node)) if node.is_leaf() => {
                node.del(key);
                return node.is_empty();
            }
            Some(Some(node)) => node.region(),
            // An unallocated slot counts as empty for the parent's collapse
            // decision.
            _ => return true,
        };
        let mut empty_children = 0;
        for (quadrant, child_region) in child_regions(region).into_iter().enumerate() {
            let child = child_slot(slot, quadrant);
            let allocated = matches!(self.slots.get(child), Some(Some(_)));
            if !allocated {
                empty_children += 1;
            } else if regions_intersect(bbox, child_region) && self.remove_at(key, bbox, child) {
                if let Some(node) = self.slots.get_mut(child).and_then(Option::take) {
                    self.pool.recycle(node);
                }
                empty_children += 1;
            }
        }
        // The emptied node stays inner-but-empty; its own parent collapses it.
        empty_children == 4
    }

    fn visit_query_at(&self, region: Rect, slot: usize, f: &mut impl FnMut(&Node<K>)) {
        let Some(Some(node)) = self.slots.get(slot) else {
            return;
        };
        if node.is_leaf() {
            f(node);
            return;
        }
        for (quadrant, child_region) in child_regions(node.region()).into_iter().enumerate() {
            if regions_intersect(region, child_region) {
                self.visit_query_at(region, child_slot(slot, quadrant), f);
            }
        }
    }

    // Separate from `visit_query_at` because collecting `&Node` borrows
    // `self` for the closure's lifetime, which `FnMut(&Node)` cannot express.
    fn visit_query_at_ref<'a>(&'a self, region: Rect, slot: usize, out: &mut Vec<&'a Node<K>>) {
        let Some(Some(node)) = self.slots.get(slot) else {
            return;
        };
        if node.is_leaf() {
            out.push(node);
            return;
        }
        for (quadrant, child_region) in child_regions(node.region()).into_iter().enumerate() {
            if regions_intersect(region, child_region) {
                self.visit_query_at_ref(region, child_slot(slot, quadrant), out);
            }
        }
    }

    fn visit_at(&self, slot: usize, f: &mut impl FnMut(&Node<K>)) {
        let Some(Some(node)) = self.slots.get(slot) else {
            return;
        };
        f(node);
        if !node.is_leaf() {
            for quadrant in 0..4 {
                self.visit_at(child_slot(slot, quadrant), f);
            }
        }
    }

    fn ensure_child(&mut self, slot: usize, region: Rect, level: usize) {
        if self.slots.len() <= slot {
            self.slots.resize_with(slot + 1, || None);
        }
        if self.slots[slot].is_none() {
            self.slots[slot] = Some(self.pool.create(region, level));
        }
    }

    #[cfg(test)]
    fn pooled_nodes(&self) -> usize {
        self.pool.len()
    }
}

impl<K: Copy + PartialEq + Debug> Debug for Quadtree<K> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let total = self.slots.len();
        let alive = self.slots.iter().filter(|slot| slot.is_some()).count();
        f.debug_struct("Quadtree")
            .field("total_slots", &total)
            .field("alive", &alive)
            .field("max_levels", &self.max_levels)
            .field("max_size", &self.max_size)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use alloc::collections::BTreeSet;
    use alloc::vec::Vec;

    use kurbo::Rect;

    use super::{Quadtree, child_regions, child_slot, parent_slot, regions_intersect};
    use crate::{MAX_NODE_SIZE, POOL_CAPACITY};

    fn collect_keys(tree: &Quadtree<u64>, region: Rect) -> BTreeSet<u64> {
        let mut keys = BTreeSet::new();
        tree.visit_query(region, |node| {
            keys.extend(node.entries().iter().map(|e| e.key));
        });
        keys
    }

    /// Deterministic xorshift64 for randomized comparisons.
    fn xorshift(state: &mut u64) -> u64 {
        let mut x = *state;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        *state = x;
        x
    }

    fn rand_range(state: &mut u64, lo: f64, hi: f64) -> f64 {
        let unit = (xorshift(state) >> 11) as f64 / (1_u64 << 53) as f64;
        lo + unit * (hi - lo)
    }

    #[test]
    fn slot_addressing_round_trips() {
        for parent in 0..64 {
            for quadrant in 0..4 {
                assert_eq!(parent_slot(child_slot(parent, quadrant)), parent);
            }
        }
        assert_eq!(parent_slot(0), 0);
    }

    #[test]
    fn child_regions_tile_the_parent() {
        let region = Rect::new(10.0, 20.0, 110.0, 80.0);
        let children = child_regions(region);
        assert_eq!(children[0].x1, children[1].x0);
        assert_eq!(children[0].y1, children[2].y0);
        let area: f64 = children.iter().map(Rect::area).sum();
        assert!((area - region.area()).abs() < 1e-9, "children must tile");
    }

    #[test]
    fn touching_rects_intersect() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        assert!(regions_intersect(a, Rect::new(10.0, 0.0, 20.0, 10.0)));
        assert!(regions_intersect(a, Rect::new(10.0, 10.0, 20.0, 20.0)));
        assert!(!regions_intersect(a, Rect::new(10.1, 0.0, 20.0, 10.0)));
    }

    #[test]
    fn insert_then_query_finds_entry() {
        let mut tree: Quadtree<u64> = Quadtree::new(Rect::new(0.0, 0.0, 400.0, 400.0));
        assert!(tree.insert(1, Rect::new(45.0, 45.0, 55.0, 55.0)));
        let keys = collect_keys(&tree, Rect::new(50.0, 50.0, 51.0, 51.0));
        assert!(keys.contains(&1));
    }

    #[test]
    fn split_preserves_query_set() {
        let root = Rect::new(0.0, 0.0, 400.0, 400.0);
        let mut tree: Quadtree<u64> = Quadtree::new(root);
        // All boxes fit inside the NW sub-quadrant, so the overflowing insert
        // forces a split rather than spreading entries around.
        for key in 0..(MAX_NODE_SIZE as u64 + 1) {
            let origin = 10.0 + key as f64 * 15.0;
            assert!(tree.insert(key, Rect::new(origin, origin, origin + 5.0, origin + 5.0)));
        }
        let mut leaves = 0;
        tree.visit(|node| {
            if node.is_leaf() {
                leaves += 1;
            }
        });
        assert!(leaves > 1, "overflowing insert must have split the root");
        let keys = collect_keys(&tree, root);
        assert_eq!(keys, (0..=MAX_NODE_SIZE as u64).collect::<BTreeSet<_>>());
    }

    #[test]
    fn depth_cap_overflows_instead_of_losing_entries() {
        let root = Rect::new(0.0, 0.0, 128.0, 128.0);
        let mut tree: Quadtree<u64> = Quadtree::with_limits(root, 2, 2);
        // Identical boxes can never be separated by splitting; past the depth
        // cap the leaf must accept them all.
        let bbox = Rect::new(3.0, 3.0, 6.0, 6.0);
        for key in 0..10 {
            assert!(tree.insert(key, bbox), "insert {key} must not be rejected");
        }
        let keys = collect_keys(&tree, root);
        assert_eq!(keys.len(), 10);
        let mut max_level = 0;
        tree.visit(|node| max_level = max_level.max(node.level()));
        assert_eq!(max_level, 2, "split must stop at the depth cap");
    }

    #[test]
    fn boundary_crossing_box_lands_in_every_touched_leaf() {
        let root = Rect::new(0.0, 0.0, 400.0, 400.0);
        let mut tree: Quadtree<u64> = Quadtree::new(root);
        for key in 0..MAX_NODE_SIZE as u64 {
            let origin = 10.0 + key as f64 * 20.0;
            tree.insert(key, Rect::new(origin, origin, origin + 5.0, origin + 5.0));
        }
        // Crosses the center point, touching all four quadrants.
        assert!(tree.insert(99, Rect::new(190.0, 190.0, 210.0, 210.0)));
        let mut leaves_with_99 = 0;
        tree.visit(|node| {
            if node.is_leaf() && node.entries().iter().any(|e| e.key == 99) {
                leaves_with_99 += 1;
            }
        });
        assert!(leaves_with_99 >= 2, "crossing box must be in multiple leaves");

        tree.remove(99, Rect::new(190.0, 190.0, 210.0, 210.0));
        assert!(!collect_keys(&tree, root).contains(&99));
    }

    #[test]
    fn removal_collapses_children_and_reuses_pool() {
        let root = Rect::new(0.0, 0.0, 400.0, 400.0);
        let mut tree: Quadtree<u64> = Quadtree::new(root);
        let boxes: Vec<Rect> = (0..(MAX_NODE_SIZE as u64 + 1))
            .map(|key| {
                let origin = 10.0 + key as f64 * 15.0;
                Rect::new(origin, origin, origin + 5.0, origin + 5.0)
            })
            .collect();
        for (key, bbox) in boxes.iter().enumerate() {
            tree.insert(key as u64, *bbox);
        }
        for (key, bbox) in boxes.iter().enumerate() {
            tree.remove(key as u64, *bbox);
        }
        assert!(collect_keys(&tree, root).is_empty());
        assert!(tree.pooled_nodes() > 0, "emptied children must be recycled");

        // The root is now inner-but-empty; a fresh insert must reallocate the
        // child it descends into rather than faulting on the recycled slot.
        assert!(tree.insert(7, Rect::new(45.0, 45.0, 55.0, 55.0)));
        assert!(collect_keys(&tree, root).contains(&7));
    }

    #[test]
    fn out_of_bounds_insert_is_rejected_once_partitioned() {
        let root = Rect::new(0.0, 0.0, 400.0, 400.0);
        let mut tree: Quadtree<u64> = Quadtree::new(root);
        for key in 0..(MAX_NODE_SIZE as u64 + 1) {
            let origin = 10.0 + key as f64 * 15.0;
            tree.insert(key, Rect::new(origin, origin, origin + 5.0, origin + 5.0));
        }
        assert!(!tree.insert(42, Rect::new(500.0, 500.0, 510.0, 510.0)));
    }

    #[test]
    fn reset_recycles_everything_into_a_fresh_root() {
        let mut tree: Quadtree<u64> = Quadtree::new(Rect::new(0.0, 0.0, 100.0, 100.0));
        for key in 0..8 {
            let origin = key as f64 * 10.0;
            tree.insert(key, Rect::new(origin, origin, origin + 4.0, origin + 4.0));
        }
        tree.reset(Rect::new(0.0, 0.0, 200.0, 200.0));
        assert_eq!(tree.root_region(), Rect::new(0.0, 0.0, 200.0, 200.0));
        assert!(collect_keys(&tree, Rect::new(0.0, 0.0, 200.0, 200.0)).is_empty());
        assert!(tree.pooled_nodes() <= POOL_CAPACITY);
    }

    #[test]
    fn traverse_visits_root_first_and_every_alive_node() {
        let mut tree: Quadtree<u64> = Quadtree::new(Rect::new(0.0, 0.0, 400.0, 400.0));
        for key in 0..(MAX_NODE_SIZE as u64 + 1) {
            let origin = 10.0 + key as f64 * 15.0;
            tree.insert(key, Rect::new(origin, origin, origin + 5.0, origin + 5.0));
        }
        let mut levels = Vec::new();
        tree.visit(|node| levels.push(node.level()));
        assert_eq!(levels.first(), Some(&0), "pre-order starts at the root");
        for pair in levels.windows(2) {
            assert!(
                pair[1] <= pair[0] + 1,
                "pre-order may only descend one level at a time"
            );
        }
    }

    #[test]
    fn query_matches_brute_force_on_random_boxes() {
        let root = Rect::new(0.0, 0.0, 256.0, 256.0);
        let mut tree: Quadtree<u64> = Quadtree::new(root);
        let mut state = 0x2545_f491_4f6c_dd1d_u64;
        let mut boxes = Vec::new();
        for key in 0..60_u64 {
            let x = rand_range(&mut state, 0.0, 240.0);
            let y = rand_range(&mut state, 0.0, 240.0);
            let w = rand_range(&mut state, 1.0, 16.0);
            let h = rand_range(&mut state, 1.0, 16.0);
            let bbox = Rect::new(x, y, x + w, y + h);
            assert!(tree.insert(key, bbox));
            boxes.push((key, bbox));
        }
        for _ in 0..40 {
            let x = rand_range(&mut state, 0.0, 250.0);
            let y = rand_range(&mut state, 0.0, 250.0);
            let w = rand_range(&mut state, 1.0, 64.0);
            let h = rand_range(&mut state, 1.0, 64.0);
            let query = Rect::new(x, y, x + w, y + h);

            // The returned set is exactly the alive leaves intersecting the
            // query region.
            let leaf_id = |r: Rect, level: usize| (level, r.x0 as i64, r.y0 as i64);
            let mut returned = Vec::new();
            tree.visit_query(query, |node| returned.push(leaf_id(node.region(), node.level())));
            let mut expected = Vec::new();
            tree.visit(|node| {
                if node.is_leaf() && regions_intersect(node.region(), query) {
                    expected.push(leaf_id(node.region(), node.level()));
                }
            });
            returned.sort_unstable();
            expected.sort_unstable();
            assert_eq!(returned, expected);

            // And every key whose box intersects the query is reachable
            // through those leaves.
            let found = collect_keys(&tree, query);
            for (key, bbox) in &boxes {
                if regions_intersect(*bbox, query) {
                    assert!(found.contains(key), "key {key} missing for {query:?}");
                }
            }
        }
    }
}
