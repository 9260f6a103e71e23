// Copyright 2025 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Canopy Easing: cubic Bezier easing curves.
//!
//! An [`Easing`] is a pair of normalized control points describing how an
//! animated quantity accelerates over its lifetime, in the same shape CSS
//! timing functions use: the curve runs from `(0, 0)` to `(1, 1)` in
//! (progress, eased-progress) space, and the control points are free to leave
//! the unit square vertically for overshoot/anticipation effects.
//!
//! The motion engine does not consume the normalized curve directly. Each
//! animated property scales the curve into its own `(duration, distance)`
//! coordinate space with [`Easing::scaled`], producing a [`kurbo::CubicBez`]
//! anchored at the origin. Evaluating that curve at the property's progress
//! fraction yields an `(elapsed-time, eased-distance)` point; both components
//! are parametric outputs of the same `t`, which is deliberately simpler than
//! solving the curve for distance-given-time.
//!
//! ## Example
//!
//! ```
//! use canopy_easing::Easing;
//! use kurbo::ParamCurve;
//!
//! let ease: Easing = "cubic-bezier(0.25, 0.1, 0.25, 1)".parse().unwrap();
//! assert_eq!(ease, Easing::EASE);
//!
//! // Scale into a property animating 200 units over 1000 ms.
//! let curve = Easing::LINEAR.scaled(1000.0, 200.0);
//! let mid = curve.eval(0.5);
//! assert!((mid.y - 100.0).abs() < 1e-9);
//! ```
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

use alloc::string::{String, ToString};

use kurbo::{CubicBez, Point};

/// Error raised when an easing spec string cannot be parsed.
///
/// Malformed specs are rejected at construction time; there is no silent
/// fallback curve.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EasingError {
    /// The spec is neither a known curve name nor a `cubic-bezier(..)` form.
    #[error("unrecognized easing spec {0:?}")]
    Unrecognized(String),
    /// A `cubic-bezier(..)` form with the wrong number of components.
    #[error("cubic-bezier expects 4 components, got {0}")]
    ComponentCount(usize),
    /// A component that does not parse as a finite number.
    #[error("invalid cubic-bezier component {0:?}")]
    Component(String),
}

/// A cubic Bezier easing curve in normalized (progress, eased-progress) space.
///
/// The implicit endpoints are `(0, 0)` and `(1, 1)`; only the two inner
/// control points are stored. Control point `y` values outside `[0, 1]` are
/// allowed and produce overshoot or anticipation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Easing {
    /// First control point.
    pub cp1: Point,
    /// Second control point.
    pub cp2: Point,
}

impl Easing {
    /// Constant-velocity curve; the scaled curve degenerates to a straight line.
    pub const LINEAR: Self = Self::new(0.0, 0.0, 1.0, 1.0);
    /// The CSS `ease` curve.
    pub const EASE: Self = Self::new(0.25, 0.1, 0.25, 1.0);
    /// The CSS `ease-in` curve.
    pub const EASE_IN: Self = Self::new(0.42, 0.0, 1.0, 1.0);
    /// The CSS `ease-out` curve.
    pub const EASE_OUT: Self = Self::new(0.0, 0.0, 0.58, 1.0);
    /// The CSS `ease-in-out` curve.
    pub const EASE_IN_OUT: Self = Self::new(0.42, 0.0, 0.58, 1.0);

    /// Creates an easing curve from raw control point coordinates.
    #[must_use]
    pub const fn new(cp1x: f64, cp1y: f64, cp2x: f64, cp2y: f64) -> Self {
        Self {
            cp1: Point::new(cp1x, cp1y),
            cp2: Point::new(cp2x, cp2y),
        }
    }

    /// Scales the normalized curve into one property's animation space.
    ///
    /// The returned curve runs from the origin to `(duration, distance)`,
    /// with the control points scaled componentwise. Evaluating it at the
    /// progress fraction `t ∈ [0, 1]` yields the elapsed-time/eased-distance
    /// pair for that instant; the motion engine consumes the `y` (distance)
    /// component.
    #[must_use]
    pub fn scaled(&self, duration: f64, distance: f64) -> CubicBez {
        CubicBez::new(
            Point::ZERO,
            Point::new(duration * self.cp1.x, distance * self.cp1.y),
            Point::new(duration * self.cp2.x, distance * self.cp2.y),
            Point::new(duration, distance),
        )
    }
}

impl Default for Easing {
    fn default() -> Self {
        Self::LINEAR
    }
}

impl core::str::FromStr for Easing {
    type Err = EasingError;

    /// Parses a named curve or a `cubic-bezier(a, b, c, d)` spec.
    ///
    /// Exactly four finite numeric components are required; anything else is
    /// an [`EasingError`].
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let spec = s.trim();
        match spec {
            "linear" => return Ok(Self::LINEAR),
            "ease" => return Ok(Self::EASE),
            "ease-in" => return Ok(Self::EASE_IN),
            "ease-out" => return Ok(Self::EASE_OUT),
            "ease-in-out" => return Ok(Self::EASE_IN_OUT),
            _ => {}
        }
        let body = spec
            .strip_prefix("cubic-bezier(")
            .and_then(|rest| rest.strip_suffix(')'))
            .ok_or_else(|| EasingError::Unrecognized(spec.to_string()))?;
        let parts = body.split(',').collect::<alloc::vec::Vec<_>>();
        if parts.len() != 4 {
            return Err(EasingError::ComponentCount(parts.len()));
        }
        let mut components = [0.0_f64; 4];
        for (slot, part) in components.iter_mut().zip(&parts) {
            let part = part.trim();
            let value: f64 = part
                .parse()
                .map_err(|_| EasingError::Component(part.to_string()))?;
            if !value.is_finite() {
                return Err(EasingError::Component(part.to_string()));
            }
            *slot = value;
        }
        let [a, b, c, d] = components;
        Ok(Self::new(a, b, c, d))
    }
}
