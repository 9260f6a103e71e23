// Copyright 2025 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Bounded free list of recycled nodes.

use alloc::vec::Vec;
use core::fmt::Debug;

use kurbo::Rect;

use crate::node::Node;

/// Recycling pool for tree nodes.
///
/// Underflow on `create` allocates a fresh node and overflow on `recycle`
/// drops the node; both degrade gracefully with a trace-level diagnostic and
/// are never an error.
#[derive(Debug)]
pub(crate) struct NodePool<K> {
    nodes: Vec<Node<K>>,
    capacity: usize,
}

impl<K: Copy + PartialEq + Debug> NodePool<K> {
    pub(crate) fn new(capacity: usize) -> Self {
        Self {
            nodes: Vec::new(),
            capacity,
        }
    }

    /// Takes a recycled node, reinitialized for `region` and `level`, or
    /// allocates a fresh one when the pool is empty.
    pub(crate) fn create(&mut self, region: Rect, level: usize) -> Node<K> {
        match self.nodes.pop() {
            Some(mut node) => {
                node.init(region, level);
                node
            }
            None => {
                log::trace!("node pool empty, allocating");
                Node::new(region, level)
            }
        }
    }

    /// Returns a node to the pool, dropping it if the pool is full.
    pub(crate) fn recycle(&mut self, mut node: Node<K>) {
        if self.nodes.len() < self.capacity {
            node.init(Rect::ZERO, 0);
            self.nodes.push(node);
        } else {
            log::trace!("node pool full, dropping recycled node");
        }
    }

    pub(crate) fn clear(&mut self) {
        self.nodes.clear();
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.nodes.len()
    }
}
