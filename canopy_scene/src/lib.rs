// Copyright 2025 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Canopy Scene: the shape model and the quadtree-backed shape store.
//!
//! A [`Shape`] is a closed union of canvas primitives (circles and
//! rectangles) with a stable id, fill/stroke styling, a z-order hint, and an
//! always-consistent axis-aligned bounding box. Construction dimensions may
//! be absolute or percentages of the canvas ([`Length`]); percentages are
//! resolved when the shape first enters a scene.
//!
//! A [`Scene`] owns the authoritative id → shape map and keeps a
//! [`canopy_quadtree::Quadtree`] over the shapes' bounding boxes in lockstep
//! with it:
//!
//! - [`Scene::append`] only admits a shape the index accepted.
//! - [`Scene::change`] removes the shape under its old box, applies the
//!   partial state, and reinserts under the new box — positions are never
//!   mutated while indexed, so a shape cannot get stranded at a stale
//!   location.
//! - [`Scene::resize`] rebuilds the index stop-the-world, rescaling every
//!   shape proportionally to the new canvas size.
//! - [`Scene::hit_test`] answers "which shape is at this point" with a real
//!   point-in-shape test and a deterministic topmost tie-break.
//!
//! ## Example
//!
//! ```
//! use canopy_scene::{Scene, Shape, ShapeSpec};
//! use kurbo::Point;
//!
//! let mut scene = Scene::new(400.0, 400.0);
//! let circle = Shape::new(ShapeSpec::circle(50.0, 50.0, 5.0));
//! let id = circle.id();
//! assert!(scene.append(circle));
//! assert_eq!(scene.hit_test(Point::new(50.0, 50.0)), Some(id));
//! ```
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

mod scene;
mod shape;

pub use scene::Scene;
pub use shape::{
    DrawStyle, Geometry, GeometryError, GeometrySpec, Length, Property, Shape, ShapeFlags, ShapeId,
    ShapePatch, ShapeSpec,
};
