// Copyright 2025 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Animation units, movement tracks, and the tick state machine.

use alloc::boxed::Box;
use alloc::vec::Vec;
use core::fmt;

use kurbo::{CubicBez, ParamCurve, Size};

use canopy_easing::Easing;
use canopy_scene::{Property, Scene, Shape, ShapeId, ShapePatch};

/// Rounds interpolated values to the fixed 2-decimal precision the scene
/// uses, keeping repeated tick output stable.
fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Error rejecting an animation submission.
#[derive(Debug, thiserror::Error)]
pub enum MotionError {
    /// Durations must be positive; there is no instant-jump contract.
    #[error("animation duration must be positive, got {0}")]
    NonPositiveDuration(f64),
    /// The unit names a shape the scene does not hold.
    #[error("unknown shape {0}")]
    UnknownShape(ShapeId),
}

/// The end state of one animation unit.
pub enum Target {
    /// Literal target values.
    Patch(ShapePatch),
    /// Target computed from the shape's current state and the canvas size at
    /// submission time.
    With(Box<dyn Fn(&Shape, Size) -> ShapePatch>),
}

impl Target {
    fn resolve(&self, shape: &Shape, size: Size) -> ShapePatch {
        match self {
            Self::Patch(patch) => *patch,
            Self::With(f) => f(shape, size),
        }
    }
}

impl From<ShapePatch> for Target {
    fn from(patch: ShapePatch) -> Self {
        Self::Patch(patch)
    }
}

impl fmt::Debug for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Patch(patch) => f.debug_tuple("Patch").field(patch).finish(),
            Self::With(_) => f.debug_tuple("With").finish_non_exhaustive(),
        }
    }
}

/// One request to animate one shape.
#[derive(Debug)]
pub struct AnimationUnit {
    id: ShapeId,
    target: Target,
    duration_ms: f64,
    delay_ms: f64,
    easing: Easing,
}

impl AnimationUnit {
    /// Animates `id` toward `target` over `duration_ms`, with no delay and
    /// linear easing.
    pub fn new(id: ShapeId, target: impl Into<Target>, duration_ms: f64) -> Self {
        Self {
            id,
            target: target.into(),
            duration_ms,
            delay_ms: 0.0,
            easing: Easing::default(),
        }
    }

    /// Holds the unit at its start values for `delay_ms` after the schedule
    /// starts.
    #[must_use]
    pub fn delay(mut self, delay_ms: f64) -> Self {
        self.delay_ms = delay_ms;
        self
    }

    /// Sets the unit's easing curve.
    #[must_use]
    pub fn easing(mut self, easing: Easing) -> Self {
        self.easing = easing;
        self
    }
}

/// One shape's accumulated positional state, as emitted by a tick.
#[derive(Debug, Clone, PartialEq)]
pub struct ShapeUpdate {
    /// The animated shape.
    pub id: ShapeId,
    /// Every property the schedule has touched on it so far.
    pub state: ShapePatch,
}

/// Lifecycle state of a [`Schedule`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// No tick has arrived yet; the timeline has no epoch.
    Idle,
    /// Ticks are arriving but every unit is still inside its delay.
    Delayed,
    /// At least one unit is advancing.
    Animating,
    /// Every track reached progress 1 and the final batch was emitted.
    Complete,
    /// Torn down by [`Schedule::cancel`]; partial state stands.
    Cancelled,
}

/// Per-property interpolation state.
#[derive(Debug, Clone)]
struct Track {
    key: Property,
    start: f64,
    distance: f64,
    /// Sign of the change: -1, 0, or 1.
    orientation: f64,
    /// The easing curve scaled into this property's (duration, distance)
    /// space.
    curve: CubicBez,
    /// Progress in `[0, 1]`; monotonically non-decreasing, terminal at 1.
    percent: f64,
    started_at: Option<f64>,
}

/// Per-unit state.
#[derive(Debug, Clone)]
struct UnitState {
    id: ShapeId,
    delay_ms: f64,
    duration_ms: f64,
    started: bool,
    tracks: Vec<Track>,
}

impl UnitState {
    fn complete(&self) -> bool {
        self.tracks.iter().all(|track| track.percent >= 1.0)
    }
}

/// A submitted batch of animation units advancing on one shared timeline.
#[derive(Debug)]
pub struct Schedule {
    units: Vec<UnitState>,
    /// Accumulated per-shape state, in unit submission order.
    state: Vec<ShapeUpdate>,
    epoch: Option<f64>,
    done: bool,
    cancelled: bool,
}

impl Schedule {
    /// Resolves and validates a batch of units against the scene.
    ///
    /// End states are resolved here, against each shape's current values and
    /// the current canvas size. Properties whose target equals their start
    /// get a zero-distance track that holds its value; properties the
    /// shape's variant lacks are dropped.
    ///
    /// # Errors
    ///
    /// [`MotionError::NonPositiveDuration`] and [`MotionError::UnknownShape`]
    /// reject the whole submission.
    pub fn new(units: Vec<AnimationUnit>, scene: &Scene) -> Result<Self, MotionError> {
        let size = scene.size();
        let mut states = Vec::with_capacity(units.len());
        for unit in units {
            if !(unit.duration_ms > 0.0) {
                return Err(MotionError::NonPositiveDuration(unit.duration_ms));
            }
            let shape = scene
                .get(unit.id)
                .ok_or(MotionError::UnknownShape(unit.id))?;
            let end_state = unit.target.resolve(shape, size);
            let mut tracks = Vec::new();
            for (key, end) in end_state.entries() {
                let Some(start) = shape.get(key) else {
                    continue;
                };
                let distance = (end - start).abs();
                let orientation = if distance == 0.0 {
                    0.0
                } else if end > start {
                    1.0
                } else {
                    -1.0
                };
                tracks.push(Track {
                    key,
                    start,
                    distance,
                    orientation,
                    curve: unit.easing.scaled(unit.duration_ms, distance),
                    percent: 0.0,
                    started_at: None,
                });
            }
            states.push(UnitState {
                id: unit.id,
                delay_ms: unit.delay_ms,
                duration_ms: unit.duration_ms,
                started: false,
                tracks,
            });
        }
        Ok(Self {
            units: states,
            state: Vec::new(),
            epoch: None,
            done: false,
            cancelled: false,
        })
    }

    /// The schedule's lifecycle state.
    #[must_use]
    pub fn status(&self) -> Status {
        if self.cancelled {
            Status::Cancelled
        } else if self.done {
            Status::Complete
        } else if self.epoch.is_none() {
            Status::Idle
        } else if self.units.iter().all(|unit| !unit.started) {
            Status::Delayed
        } else {
            Status::Animating
        }
    }

    /// Advances the timeline to `now_ms` and returns the batch of per-shape
    /// updates, or `None` once the schedule is terminal.
    ///
    /// The first call pins the timeline epoch; `now_ms` is expected to be
    /// monotonic. Units still inside their delay are skipped and emit
    /// nothing. The tick on which the last track reaches progress 1 still
    /// emits its batch; every later call returns `None`.
    pub fn tick(&mut self, now_ms: f64) -> Option<&[ShapeUpdate]> {
        if self.done || self.cancelled {
            return None;
        }
        let epoch = *self.epoch.get_or_insert(now_ms);
        let timeline = now_ms - epoch;
        for unit in &mut self.units {
            if !unit.started && timeline < unit.delay_ms {
                continue;
            }
            unit.started = true;
            for track in &mut unit.tracks {
                if track.percent >= 1.0 {
                    continue;
                }
                let started_at = *track.started_at.get_or_insert(now_ms);
                let percent = ((now_ms - started_at) / unit.duration_ms).min(1.0);
                track.percent = percent;
                let current = if track.distance == 0.0 {
                    // Holds at the start value; the track still completes.
                    track.start
                } else {
                    round2(track.start + track.curve.eval(percent).y * track.orientation)
                };
                match self.state.iter_mut().find(|update| update.id == unit.id) {
                    Some(update) => update.state.set(track.key, current),
                    None => {
                        let mut state = ShapePatch::default();
                        state.set(track.key, current);
                        self.state.push(ShapeUpdate { id: unit.id, state });
                    }
                }
            }
        }
        if self.units.iter().all(UnitState::complete) {
            // Emit this final batch; the next tick observes `done`.
            self.done = true;
        }
        Some(&self.state)
    }

    /// Tears the schedule down without finishing it.
    ///
    /// No further ticks produce output. State already applied by the host
    /// stays as-is; there is no rollback.
    pub fn cancel(&mut self) {
        self.cancelled = true;
    }
}

#[cfg(test)]
mod tests {
    use alloc::boxed::Box;
    use alloc::vec;

    use canopy_easing::Easing;
    use canopy_scene::{Property, Scene, Shape, ShapePatch, ShapeSpec};

    use super::{AnimationUnit, MotionError, Schedule, Status, Target};

    fn scene_with_circle(x: f64, y: f64) -> (Scene, canopy_scene::ShapeId) {
        let mut scene = Scene::new(400.0, 400.0);
        let shape = Shape::new(ShapeSpec::circle(x, y, 5.0));
        let id = shape.id();
        assert!(scene.append(shape));
        (scene, id)
    }

    fn x_to(value: f64) -> ShapePatch {
        ShapePatch {
            x: Some(value),
            ..Default::default()
        }
    }

    #[test]
    fn linear_unit_halfway_and_exact_completion() {
        let (scene, id) = scene_with_circle(0.0, 50.0);
        let unit = AnimationUnit::new(id, x_to(100.0), 1000.0).easing(Easing::LINEAR);
        let mut schedule = Schedule::new(vec![unit], &scene).unwrap();

        let first = schedule.tick(0.0).unwrap();
        assert_eq!(first[0].state.x, Some(0.0), "first tick emits start value");

        let mid = schedule.tick(500.0).unwrap();
        let x = mid[0].state.x.unwrap();
        assert!((x - 50.0).abs() <= 1.0, "halfway x was {x}");

        // One period past the duration: the value is the target exactly and
        // this batch is still emitted.
        let last = schedule.tick(1016.0).unwrap();
        assert_eq!(last[0].state.x, Some(100.0));
        assert_eq!(schedule.status(), Status::Complete);
        assert!(schedule.tick(1032.0).is_none(), "stream is terminal");
    }

    #[test]
    fn zero_distance_property_holds_and_does_not_block() {
        let (scene, id) = scene_with_circle(50.0, 50.0);
        let target = ShapePatch {
            x: Some(50.0),
            y: Some(150.0),
            ..Default::default()
        };
        let mut schedule =
            Schedule::new(vec![AnimationUnit::new(id, target, 200.0)], &scene).unwrap();

        schedule.tick(0.0).unwrap();
        let mid = schedule.tick(100.0).unwrap();
        assert_eq!(mid[0].state.x, Some(50.0), "zero-distance x never moves");

        let last = schedule.tick(216.0).unwrap();
        assert_eq!(last[0].state.x, Some(50.0));
        assert_eq!(last[0].state.y, Some(150.0));
        assert_eq!(schedule.status(), Status::Complete);
    }

    #[test]
    fn delayed_unit_freezes_until_its_delay_elapses() {
        let (scene, id) = scene_with_circle(0.0, 50.0);
        let unit = AnimationUnit::new(id, x_to(100.0), 1000.0).delay(100.0);
        let mut schedule = Schedule::new(vec![unit], &scene).unwrap();

        assert_eq!(schedule.status(), Status::Idle);
        assert!(schedule.tick(0.0).unwrap().is_empty());
        assert_eq!(schedule.status(), Status::Delayed);
        assert!(schedule.tick(96.0).unwrap().is_empty());

        // The delay has elapsed; the unit's own clock starts now.
        let first = schedule.tick(112.0).unwrap();
        assert_eq!(first[0].state.x, Some(0.0));
        assert_eq!(schedule.status(), Status::Animating);

        let last = schedule.tick(1120.0).unwrap();
        assert_eq!(last[0].state.x, Some(100.0));
        assert_eq!(schedule.status(), Status::Complete);
    }

    #[test]
    fn function_targets_resolve_against_shape_and_canvas() {
        let (scene, id) = scene_with_circle(10.0, 50.0);
        let target = Target::With(Box::new(|shape, size| ShapePatch {
            x: Some(size.width - shape.get(Property::X).unwrap()),
            ..Default::default()
        }));
        let mut schedule =
            Schedule::new(vec![AnimationUnit::new(id, target, 100.0)], &scene).unwrap();
        schedule.tick(0.0).unwrap();
        let last = schedule.tick(116.0).unwrap();
        assert_eq!(last[0].state.x, Some(390.0));
    }

    #[test]
    fn batch_updates_stay_in_submission_order() {
        let mut scene = Scene::new(400.0, 400.0);
        let a = Shape::new(ShapeSpec::circle(10.0, 10.0, 2.0));
        let b = Shape::new(ShapeSpec::circle(20.0, 20.0, 2.0));
        let (a_id, b_id) = (a.id(), b.id());
        scene.append(a);
        scene.append(b);

        // Submit b first; emission order must follow submission, not id.
        let units = vec![
            AnimationUnit::new(b_id, x_to(200.0), 500.0),
            AnimationUnit::new(a_id, x_to(300.0), 1000.0),
        ];
        let mut schedule = Schedule::new(units, &scene).unwrap();
        let batch = schedule.tick(0.0).unwrap();
        assert_eq!(batch.len(), 2);
        assert_eq!(batch[0].id, b_id);
        assert_eq!(batch[1].id, a_id);

        // The shorter unit finishing does not end the batch.
        schedule.tick(600.0).unwrap();
        assert_eq!(schedule.status(), Status::Animating);
        schedule.tick(1016.0).unwrap();
        assert_eq!(schedule.status(), Status::Complete);
    }

    #[test]
    fn unit_with_no_effective_tracks_completes_immediately() {
        let (scene, id) = scene_with_circle(50.0, 50.0);
        // Width means nothing to a circle, so the unit has nothing to do.
        let target = ShapePatch {
            width: Some(80.0),
            ..Default::default()
        };
        let mut schedule =
            Schedule::new(vec![AnimationUnit::new(id, target, 100.0)], &scene).unwrap();
        assert!(schedule.tick(0.0).unwrap().is_empty());
        assert_eq!(schedule.status(), Status::Complete);
        assert!(schedule.tick(16.0).is_none());
    }

    #[test]
    fn non_positive_durations_are_rejected() {
        let (scene, id) = scene_with_circle(50.0, 50.0);
        for duration in [0.0, -5.0, f64::NAN] {
            let result = Schedule::new(vec![AnimationUnit::new(id, x_to(10.0), duration)], &scene);
            assert!(matches!(result, Err(MotionError::NonPositiveDuration(_))));
        }
    }

    #[test]
    fn unknown_shapes_are_rejected() {
        let (mut scene, id) = scene_with_circle(50.0, 50.0);
        scene.remove(id);
        let result = Schedule::new(vec![AnimationUnit::new(id, x_to(10.0), 100.0)], &scene);
        assert!(matches!(result, Err(MotionError::UnknownShape(_))));
    }

    #[test]
    fn cancellation_is_abrupt_and_terminal() {
        let (scene, id) = scene_with_circle(0.0, 50.0);
        let unit = AnimationUnit::new(id, x_to(100.0), 1000.0);
        let mut schedule = Schedule::new(vec![unit], &scene).unwrap();
        schedule.tick(0.0).unwrap();
        schedule.tick(500.0).unwrap();

        schedule.cancel();
        assert_eq!(schedule.status(), Status::Cancelled);
        assert!(schedule.tick(516.0).is_none(), "no ticks after cancel");
    }

    #[test]
    fn eased_motion_is_monotonic_for_inside_the_square_curves() {
        let (scene, id) = scene_with_circle(0.0, 50.0);
        let unit = AnimationUnit::new(id, x_to(100.0), 1000.0).easing(Easing::EASE_IN_OUT);
        let mut schedule = Schedule::new(vec![unit], &scene).unwrap();
        let mut now = 0.0;
        let mut previous = f64::MIN;
        while let Some(batch) = schedule.tick(now) {
            if let Some(x) = batch.first().and_then(|update| update.state.x) {
                assert!(x >= previous, "x regressed from {previous} to {x}");
                previous = x;
            }
            now += 16.0;
        }
        assert_eq!(previous, 100.0);
    }
}
