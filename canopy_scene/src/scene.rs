// Copyright 2025 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The shape store: an id → shape map kept in lockstep with a quadtree.

use alloc::vec::Vec;

use hashbrown::HashMap;
use kurbo::{Point, Rect, Size};

use canopy_quadtree::{Node, Quadtree};

use crate::shape::{Shape, ShapeFlags, ShapeId, ShapePatch};

/// The authoritative shape store for one canvas.
///
/// Every id in the map has its bounding box indexed in the quadtree and vice
/// versa; all mutation goes through [`Scene::change`], which removes the
/// shape from the index before touching its position. The one tolerated
/// exception is a shape whose updated box falls outside the canvas: it stays
/// in the map, is logged, and is unreachable through [`Scene::hit_test`]
/// until a later change brings it back in bounds.
pub struct Scene {
    shapes: HashMap<ShapeId, Shape>,
    tree: Quadtree<ShapeId>,
    size: Size,
}

impl Scene {
    /// Creates an empty scene for a canvas of the given size.
    #[must_use]
    pub fn new(width: f64, height: f64) -> Self {
        let size = Size::new(width, height);
        Self {
            shapes: HashMap::new(),
            tree: Quadtree::new(size.to_rect()),
            size,
        }
    }

    /// The current canvas size.
    #[must_use]
    pub fn size(&self) -> Size {
        self.size
    }

    /// Number of shapes in the store.
    #[must_use]
    pub fn len(&self) -> usize {
        self.shapes.len()
    }

    /// Returns `true` if the store holds no shapes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }

    /// Returns a shape by id.
    #[must_use]
    pub fn get(&self, id: ShapeId) -> Option<&Shape> {
        self.shapes.get(&id)
    }

    /// Admits a shape into the store.
    ///
    /// Construction dimensions are resolved against the current canvas size
    /// first. The shape is only added to the map if the index accepted its
    /// bounding box; `false` means the box lies outside the canvas and the
    /// caller may retry or drop the shape.
    pub fn append(&mut self, mut shape: Shape) -> bool {
        shape.resolve(self.size);
        let id = shape.id();
        if !self.tree.insert(id, shape.bounding_box()) {
            log::debug!("shape {id} rejected by the index, not stored");
            return false;
        }
        self.shapes.insert(id, shape);
        true
    }

    /// Removes a shape, returning it if it was present.
    ///
    /// The index entry is removed under the shape's current bounding box,
    /// which the map still holds at this point by the store invariant.
    pub fn remove(&mut self, id: ShapeId) -> Option<Shape> {
        let shape = self.shapes.remove(&id)?;
        self.tree.remove(id, shape.bounding_box());
        Some(shape)
    }

    /// Applies a partial positional state to a shape.
    ///
    /// The shape leaves the index under its old bounding box, mutates, and
    /// reenters under the new one — the box may land in a different quadrant,
    /// so this sequence is mandatory. Returns `false` if the id is unknown or
    /// the new box was rejected by the index (the shape then stays in the
    /// map, unindexed, until a later in-bounds change).
    pub fn change(&mut self, id: ShapeId, patch: &ShapePatch) -> bool {
        let Some(shape) = self.shapes.get_mut(&id) else {
            return false;
        };
        self.tree.remove(id, shape.bounding_box());
        shape.set_state(patch);
        if !self.tree.insert(id, shape.bounding_box()) {
            log::debug!("shape {id} moved out of bounds, left unindexed");
            return false;
        }
        true
    }

    /// Resizes the canvas, rescaling every shape proportionally.
    ///
    /// The index is rebuilt stop-the-world over the new root region and every
    /// shape is reinserted at its rescaled coordinates. A zero past dimension
    /// leaves that axis unscaled.
    pub fn resize(&mut self, width: f64, height: f64) {
        let past = self.size;
        self.size = Size::new(width, height);
        self.tree.reset(self.size.to_rect());
        for (id, shape) in &mut self.shapes {
            shape.rescale(self.size, past);
            if !self.tree.insert(*id, shape.bounding_box()) {
                log::debug!("shape {id} fell outside the resized canvas, left unindexed");
            }
        }
    }

    /// The topmost shape at `pt`, if any.
    ///
    /// Queries the index with a degenerate 1×1 region, then keeps candidates
    /// that are [`ShapeFlags::PICKABLE`] and precisely contain the point.
    /// Overlaps resolve to the topmost by `(z_index, id)` — among equal
    /// z-orders the most recently created shape wins.
    #[must_use]
    pub fn hit_test(&self, pt: Point) -> Option<ShapeId> {
        let probe = Rect::new(pt.x, pt.y, pt.x + 1.0, pt.y + 1.0);
        let mut best: Option<(i32, ShapeId)> = None;
        self.tree.visit_query(probe, |node| {
            for entry in node.entries() {
                let Some(shape) = self.shapes.get(&entry.key) else {
                    continue;
                };
                if !shape.flags().contains(ShapeFlags::PICKABLE) || !shape.contains(pt) {
                    continue;
                }
                let candidate = (shape.z_index(), entry.key);
                if best.is_none_or(|current| candidate > current) {
                    best = Some(candidate);
                }
            }
        });
        best.map(|(_, id)| id)
    }

    /// Visits every shape in unspecified order.
    pub fn for_each<F: FnMut(&Shape)>(&self, mut f: F) {
        for shape in self.shapes.values() {
            f(shape);
        }
    }

    /// All shapes sorted by `(z_index, id)` for draw order.
    #[must_use]
    pub fn sorted(&self) -> Vec<&Shape> {
        let mut shapes: Vec<&Shape> = self.shapes.values().collect();
        shapes.sort_by_key(|shape| (shape.z_index(), shape.id()));
        shapes
    }

    /// Pre-order visit of every allocated index node, for debug overlays.
    pub fn visit_index<F: FnMut(&Node<ShapeId>)>(&self, f: F) {
        self.tree.visit(f);
    }

    /// Removes every shape, keeping the canvas size and the index pool.
    pub fn clear(&mut self) {
        self.shapes.clear();
        self.tree.reset(self.size.to_rect());
    }

    /// Tears the store down, releasing the index and its pooled nodes.
    pub fn destroy(&mut self) {
        self.shapes.clear();
        self.tree.clear();
    }
}

impl core::fmt::Debug for Scene {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Scene")
            .field("shapes", &self.shapes.len())
            .field("size", &self.size)
            .field("tree", &self.tree)
            .finish()
    }
}
