// Copyright 2025 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Canopy Stage: the canvas-surface boundary.
//!
//! A [`Stage`] owns one [`canopy_scene::Scene`] and the motion schedules
//! currently animating it, and talks to the outside world through two narrow
//! contracts:
//!
//! - A [`Surface`] is whatever actually rasterizes: it reports its size and
//!   exposes primitive fill/stroke operations. The stage never owns a render
//!   loop or a clock; the host drives [`Stage::tick`] from its periodic
//!   callback and calls [`Stage::draw`] whenever it repaints.
//! - [`TickHooks`] let the submitter of an animation observe its lifecycle:
//!   before updates apply, after they apply, on completion, and on error.
//!
//! Each [`Stage::tick`] advances every active schedule, applies the emitted
//! per-shape updates through [`canopy_scene::Scene::change`] in submission
//! order (which keeps the spatial index synchronized with every moved
//! shape), and retires schedules that completed or failed. A schedule whose
//! shape disappears mid-flight surfaces a [`StageError`] through its own
//! `on_error` hook and is torn down; other schedules are unaffected.
//!
//! ## Example
//!
//! ```
//! use canopy_motion::AnimationUnit;
//! use canopy_scene::{Shape, ShapePatch, ShapeSpec};
//! use canopy_stage::{Stage, TickHooks};
//! use kurbo::Point;
//!
//! let mut stage = Stage::new(400.0, 400.0);
//! let circle = Shape::new(ShapeSpec::circle(50.0, 50.0, 5.0));
//! let id = circle.id();
//! stage.append(circle);
//!
//! let unit = AnimationUnit::new(id, ShapePatch::move_to(350.0, 350.0), 500.0);
//! stage.animate(vec![unit], TickHooks::default()).unwrap();
//!
//! let mut now = 0.0;
//! while stage.active_motions() > 0 {
//!     stage.tick(now);
//!     now += 16.0;
//! }
//! assert_eq!(stage.hit_test(Point::new(350.0, 350.0)), Some(id));
//! ```
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

mod stage;
mod surface;

pub use stage::{MotionId, Stage, StageError, TickHooks};
pub use surface::Surface;

// Animation submitters need the easing type; save them a direct dependency.
pub use canopy_easing::Easing;
