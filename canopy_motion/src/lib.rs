// Copyright 2025 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Canopy Motion: a tick-driven easing engine for shape properties.
//!
//! A [`Schedule`] takes a batch of [`AnimationUnit`]s — each naming a shape,
//! a target end state, a duration, an optional delay, and an easing curve —
//! and turns them into a time-ordered sequence of per-shape positional
//! updates. Every unit's changed properties get their own movement track
//! (start value, distance, direction, and a curve scaled into that
//! property's `(duration, distance)` space); ticks advance every track in
//! lockstep on one shared timeline, so all shapes in a batch update in the
//! same frame.
//!
//! The engine is host-agnostic: it owns no timer. The host calls
//! [`Schedule::tick`] with a monotonic timestamp from whatever periodic
//! callback it has — an animation frame, a timer firing every
//! [`TICK_PERIOD_MS`], or a test loop with synthetic time. The first tick
//! pins the timeline epoch.
//!
//! A schedule moves through the states of [`Status`]: it idles until the
//! first tick, holds delayed units at their start values, animates, emits
//! the tick on which the last track completes, and is terminal afterwards.
//! Cancellation is abrupt — partial state is left as-is, nothing rolls back.
//!
//! ## Example
//!
//! ```
//! use canopy_easing::Easing;
//! use canopy_motion::{AnimationUnit, Schedule};
//! use canopy_scene::{Scene, Shape, ShapePatch, ShapeSpec};
//!
//! let mut scene = Scene::new(400.0, 400.0);
//! let circle = Shape::new(ShapeSpec::circle(0.0, 50.0, 5.0));
//! let id = circle.id();
//! scene.append(circle);
//!
//! let unit = AnimationUnit::new(id, ShapePatch { x: Some(100.0), ..Default::default() }, 1000.0)
//!     .easing(Easing::LINEAR);
//! let mut schedule = Schedule::new(vec![unit], &scene).unwrap();
//!
//! // Drive with host timestamps; apply each batch through `Scene::change`.
//! let mut now = 0.0;
//! while let Some(batch) = schedule.tick(now) {
//!     for update in batch {
//!         scene.change(update.id, &update.state);
//!     }
//!     now += 16.0;
//! }
//! assert_eq!(scene.get(id).unwrap().get(canopy_scene::Property::X), Some(100.0));
//! ```
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

mod schedule;

pub use schedule::{AnimationUnit, MotionError, Schedule, ShapeUpdate, Status, Target};

/// Nominal tick period in milliseconds, aligned to a ~60 Hz display refresh.
///
/// The engine never sleeps on this itself; it documents the cadence hosts are
/// expected to drive [`Schedule::tick`] at.
pub const TICK_PERIOD_MS: f64 = 16.0;
