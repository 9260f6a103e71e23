// Copyright 2025 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The stage facade: scene + active motion schedules + draw dispatch.

use alloc::boxed::Box;
use alloc::vec::Vec;
use core::fmt;

use kurbo::{Point, Size};
use peniko::Color;

use canopy_motion::{AnimationUnit, MotionError, Schedule, ShapeUpdate, Status};
use canopy_scene::{DrawStyle, Geometry, Scene, Shape, ShapeFlags, ShapeId, ShapePatch};

use crate::surface::Surface;

/// Handle identifying one animation submission on one stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MotionId(u64);

/// Runtime error terminating a single motion schedule.
#[derive(Debug, thiserror::Error)]
pub enum StageError {
    /// An animated shape was removed from the scene mid-flight.
    #[error("animated shape {0} left the scene")]
    ShapeGone(ShapeId),
}

/// Lifecycle hooks for one animation submission.
///
/// All hooks are optional. `before_tick` sees each batch before it is
/// applied to the scene and `on_tick` after; `on_complete` fires once on the
/// tick the last property finishes; `on_error` fires at most once, when the
/// schedule is torn down early.
#[derive(Default)]
pub struct TickHooks {
    /// Called with each batch before updates apply to the scene.
    pub before_tick: Option<Box<dyn FnMut(&[ShapeUpdate])>>,
    /// Called with each batch after updates applied to the scene.
    pub on_tick: Option<Box<dyn FnMut(&[ShapeUpdate])>>,
    /// Called once when every unit has completed.
    pub on_complete: Option<Box<dyn FnOnce()>>,
    /// Called once if the schedule is torn down by an error.
    pub on_error: Option<Box<dyn FnOnce(StageError)>>,
}

impl fmt::Debug for TickHooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TickHooks")
            .field("before_tick", &self.before_tick.is_some())
            .field("on_tick", &self.on_tick.is_some())
            .field("on_complete", &self.on_complete.is_some())
            .field("on_error", &self.on_error.is_some())
            .finish()
    }
}

struct Motion {
    id: MotionId,
    schedule: Schedule,
    hooks: TickHooks,
}

/// A canvas stage: one scene, its active animations, and draw dispatch.
pub struct Stage {
    scene: Scene,
    motions: Vec<Motion>,
    next_motion: u64,
}

impl Stage {
    /// Creates a stage for a canvas of the given size.
    #[must_use]
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            scene: Scene::new(width, height),
            motions: Vec::new(),
            next_motion: 1,
        }
    }

    /// The underlying shape store.
    #[must_use]
    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    /// Current canvas size.
    #[must_use]
    pub fn size(&self) -> Size {
        self.scene.size()
    }

    /// Admits a shape; see [`Scene::append`].
    pub fn append(&mut self, shape: Shape) -> bool {
        self.scene.append(shape)
    }

    /// Removes a shape; see [`Scene::remove`].
    pub fn remove(&mut self, id: ShapeId) -> Option<Shape> {
        self.scene.remove(id)
    }

    /// Applies a literal partial state; see [`Scene::change`].
    pub fn change(&mut self, id: ShapeId, patch: &ShapePatch) -> bool {
        self.scene.change(id, patch)
    }

    /// Applies a partial state computed from the shape's current values and
    /// the canvas size.
    pub fn change_with<F>(&mut self, id: ShapeId, f: F) -> bool
    where
        F: FnOnce(&Shape, Size) -> ShapePatch,
    {
        let size = self.scene.size();
        let Some(shape) = self.scene.get(id) else {
            return false;
        };
        let patch = f(shape, size);
        self.scene.change(id, &patch)
    }

    /// The topmost shape at `pt`; see [`Scene::hit_test`].
    #[must_use]
    pub fn hit_test(&self, pt: Point) -> Option<ShapeId> {
        self.scene.hit_test(pt)
    }

    /// Resizes the canvas, flooring to whole pixels, and rebuilds the index.
    pub fn resize(&mut self, width: f64, height: f64) {
        self.scene.resize(width.floor(), height.floor());
    }

    /// Submits a batch of animation units.
    ///
    /// The batch is validated and its end states resolved against the scene
    /// now; the returned handle can cancel it later. Updates flow on
    /// subsequent [`Stage::tick`] calls.
    ///
    /// # Errors
    ///
    /// Rejected wholesale with a [`MotionError`] if any unit has a
    /// non-positive duration or names an unknown shape.
    pub fn animate(
        &mut self,
        units: Vec<AnimationUnit>,
        hooks: TickHooks,
    ) -> Result<MotionId, MotionError> {
        let schedule = Schedule::new(units, &self.scene)?;
        let id = MotionId(self.next_motion);
        self.next_motion += 1;
        self.motions.push(Motion {
            id,
            schedule,
            hooks,
        });
        Ok(id)
    }

    /// Number of schedules still running.
    #[must_use]
    pub fn active_motions(&self) -> usize {
        self.motions.len()
    }

    /// Cancels a running schedule, abruptly. Returns `false` if the handle
    /// no longer names a running schedule.
    pub fn cancel(&mut self, id: MotionId) -> bool {
        let before = self.motions.len();
        self.motions.retain_mut(|motion| {
            if motion.id == id {
                motion.schedule.cancel();
                false
            } else {
                true
            }
        });
        self.motions.len() != before
    }

    /// Advances every active schedule to `now_ms` and applies their updates.
    ///
    /// Updates apply through [`Scene::change`] in submission order, keeping
    /// the spatial index consistent with every moved shape. Completed and
    /// failed schedules are retired; a failure only tears down its own
    /// schedule.
    pub fn tick(&mut self, now_ms: f64) {
        let scene = &mut self.scene;
        self.motions.retain_mut(|motion| {
            let Some(batch) = motion.schedule.tick(now_ms) else {
                return false;
            };
            if let Some(hook) = &mut motion.hooks.before_tick {
                hook(batch);
            }
            for update in batch {
                if scene.get(update.id).is_none() {
                    log::warn!("shape {} left the scene mid-animation", update.id);
                    if let Some(hook) = motion.hooks.on_error.take() {
                        hook(StageError::ShapeGone(update.id));
                    }
                    return false;
                }
                scene.change(update.id, &update.state);
            }
            if let Some(hook) = &mut motion.hooks.on_tick {
                hook(batch);
            }
            if motion.schedule.status() == Status::Complete {
                if let Some(hook) = motion.hooks.on_complete.take() {
                    hook();
                }
                return false;
            }
            true
        });
    }

    /// Draws every visible shape in ascending `(z_index, id)` order.
    pub fn draw<S: Surface>(&self, surface: &mut S) {
        for shape in self.scene.sorted() {
            if !shape.flags().contains(ShapeFlags::VISIBLE) {
                continue;
            }
            match (shape.geometry(), shape.draw_style()) {
                (Geometry::Circle(circle), DrawStyle::Fill) => {
                    surface.fill_circle(circle, shape.fill());
                }
                (Geometry::Circle(circle), DrawStyle::Stroke) => {
                    surface.stroke_circle(circle, shape.fill());
                }
                (Geometry::Rect(rect), DrawStyle::Fill) => surface.fill_rect(rect, shape.fill()),
                (Geometry::Rect(rect), DrawStyle::Stroke) => {
                    surface.stroke_rect(rect, shape.fill());
                }
            }
        }
    }

    /// Strokes the spatial index onto the surface: every node's region, and
    /// in leaves the bounding boxes of their entries.
    pub fn draw_debug_overlay<S: Surface>(&self, surface: &mut S) {
        let region_color = Color::from_rgb8(0x33, 0x33, 0x33);
        let entry_color = Color::from_rgb8(0x99, 0x33, 0x33);
        self.scene.visit_index(|node| {
            surface.stroke_rect(node.region(), region_color);
            if node.is_leaf() {
                for entry in node.entries() {
                    surface.stroke_rect(entry.bbox, entry_color);
                }
            }
        });
    }

    /// Tears the stage down: cancels every schedule and destroys the scene.
    pub fn destroy(&mut self) {
        for motion in &mut self.motions {
            motion.schedule.cancel();
        }
        self.motions.clear();
        self.scene.destroy();
    }
}

impl fmt::Debug for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Stage")
            .field("scene", &self.scene)
            .field("active_motions", &self.motions.len())
            .finish()
    }
}
