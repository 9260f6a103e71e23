// Copyright 2025 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tree nodes and the entries leaves hold.

use core::fmt::Debug;

use kurbo::Rect;
use smallvec::SmallVec;

use crate::MAX_NODE_SIZE;

/// One indexed entry: a caller-supplied key plus the bounding box it was
/// inserted under.
///
/// The box is a snapshot. If the keyed object later moves, it must be removed
/// under the old box and reinserted under the new one; the tree has no way to
/// find an entry whose box changed underneath it.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Entry<K> {
    /// Caller-assigned identifier.
    pub key: K,
    /// Bounding box the entry is indexed under.
    pub bbox: Rect,
}

/// A node covering one region of space at one tree level.
///
/// A node is a leaf (holding entries directly) or an inner node (entries live
/// in its children), never both. Inner nodes whose children have all been
/// recycled stay inner-but-empty until their own parent collapses them.
#[derive(Clone, Debug)]
pub struct Node<K> {
    region: Rect,
    level: usize,
    leaf: bool,
    entries: SmallVec<[Entry<K>; MAX_NODE_SIZE]>,
}

impl<K: Copy + PartialEq + Debug> Node<K> {
    pub(crate) fn new(region: Rect, level: usize) -> Self {
        Self {
            region,
            level,
            leaf: true,
            entries: SmallVec::new(),
        }
    }

    /// Reinitializes a recycled node for a new position in the tree.
    pub(crate) fn init(&mut self, region: Rect, level: usize) {
        self.region = region;
        self.level = level;
        self.leaf = true;
        self.entries.clear();
    }

    pub(crate) fn add(&mut self, key: K, bbox: Rect) {
        self.entries.push(Entry { key, bbox });
    }

    pub(crate) fn del(&mut self, key: K) {
        self.entries.retain(|entry| entry.key != key);
    }

    /// Turns a leaf into an inner node, handing back its entries for
    /// redistribution into the children.
    pub(crate) fn clear_to_inner(&mut self) -> SmallVec<[Entry<K>; MAX_NODE_SIZE]> {
        self.leaf = false;
        core::mem::take(&mut self.entries)
    }

    /// The region of space this node covers.
    #[must_use]
    pub fn region(&self) -> Rect {
        self.region
    }

    /// Depth of this node; the root is level 0.
    #[must_use]
    pub fn level(&self) -> usize {
        self.level
    }

    /// Returns `true` if this node holds entries directly.
    #[must_use]
    pub fn is_leaf(&self) -> bool {
        self.leaf
    }

    /// The entries held by this node. Empty for inner nodes.
    #[must_use]
    pub fn entries(&self) -> &[Entry<K>] {
        &self.entries
    }

    /// Number of entries held by this node.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if this node holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
