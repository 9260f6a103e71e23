// Copyright 2025 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Canopy Quadtree: a Kurbo-native region quadtree for canvas scenes.
//!
//! The tree partitions an axis-aligned root region into recursive quadrants
//! and indexes entries by their world-space bounding boxes. It is the spatial
//! acceleration behind hit testing and viewport queries in a shape store:
//! instead of scanning every shape, a point or rectangle query only touches
//! the leaves whose regions intersect it.
//!
//! ## Structure
//!
//! - Nodes live in a flat sparse array. A node's four children occupy the
//!   deterministic slots `parent * 4 + 1 + quadrant` (a complete quaternary
//!   addressing scheme), so the tree needs no child pointers and a subtree's
//!   location is computable from its root slot alone.
//! - A node is either a leaf holding up to `max_size` entries or an inner
//!   node with up to four allocated children; never both.
//! - Entries whose boxes cross a quadrant boundary are inserted into every
//!   quadrant they touch, and removal mirrors the same descent.
//! - Freed nodes are returned to a bounded pool and reinitialized on reuse,
//!   so steady-state insert/remove churn does not allocate.
//!
//! ## Capacity and depth
//!
//! A full leaf below [`MAX_LEVELS`] splits and redistributes its entries. A
//! full leaf *at* the depth cap accepts the entry anyway: the depth cap takes
//! precedence over the capacity cap, and node capacity is a soft limit at the
//! bottom of the tree. This is a deliberate trade-off — rejecting would lose
//! shapes that legitimately crowd one spot.
//!
//! ## Example
//!
//! ```
//! use canopy_quadtree::Quadtree;
//! use kurbo::Rect;
//!
//! let mut tree: Quadtree<u64> = Quadtree::new(Rect::new(0.0, 0.0, 400.0, 400.0));
//! assert!(tree.insert(7, Rect::new(40.0, 40.0, 60.0, 60.0)));
//!
//! let hits = tree.query(Rect::new(50.0, 50.0, 51.0, 51.0));
//! assert!(hits.iter().any(|node| node.entries().iter().any(|e| e.key == 7)));
//! ```
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

mod node;
mod pool;
mod tree;

pub use node::{Entry, Node};
pub use tree::{Quadtree, child_regions, child_slot, parent_slot, regions_intersect};

/// Default maximum tree depth; the root is level 0.
pub const MAX_LEVELS: usize = 7;

/// Default leaf capacity before a node splits (soft at [`MAX_LEVELS`]).
pub const MAX_NODE_SIZE: usize = 4;

/// Default capacity of the recycled-node pool.
pub const POOL_CAPACITY: usize = 10;
