// Copyright 2025 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Shape variants, construction dimensions, and partial-state patches.

use alloc::string::{String, ToString};
use core::fmt;
use core::sync::atomic::{AtomicU64, Ordering};

use kurbo::{Circle, Point, Rect, Size};
use peniko::Color;

/// Rounds to the fixed 2-decimal precision used for resolved and rescaled
/// coordinates.
fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Unique identifier for a shape.
///
/// Ids come from a global monotonic counter, so a shape created later always
/// compares greater than one created earlier; hit testing uses this as the
/// insertion-order half of its topmost tie-break.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ShapeId(u64);

impl ShapeId {
    fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }

    /// The raw counter value.
    #[must_use]
    pub const fn to_raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ShapeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Error raised when a dimension string cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GeometryError {
    /// Not a number and not a `"NN%"` percentage in `0..=100`.
    #[error("invalid dimension {0:?}")]
    InvalidDimension(String),
}

/// A construction-time dimension: absolute canvas units or a percentage of
/// the canvas extent on the dimension's axis.
///
/// Percentages resolve against the canvas width for `x`/`width`/`radius` and
/// against the height for `y`/`height`, when the shape first enters a scene.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Length {
    /// Absolute value in canvas units.
    Abs(f64),
    /// Percentage of the canvas extent, in `0..=100`.
    Percent(f64),
}

impl Length {
    /// Resolves against the canvas extent on this dimension's axis, rounded
    /// to 2 decimals for percentages.
    #[must_use]
    pub fn resolve(self, extent: f64) -> f64 {
        match self {
            Self::Abs(value) => value,
            Self::Percent(percent) => round2(percent / 100.0 * extent),
        }
    }
}

impl From<f64> for Length {
    fn from(value: f64) -> Self {
        Self::Abs(value)
    }
}

impl core::str::FromStr for Length {
    type Err = GeometryError;

    /// Parses `"42"` as an absolute value or `"42%"` as a percentage.
    ///
    /// Malformed strings and percentages outside `0..=100` are an error;
    /// they never resolve to a silent zero.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if let Some(percent) = trimmed.strip_suffix('%') {
            let value: f64 = percent
                .trim()
                .parse()
                .map_err(|_| GeometryError::InvalidDimension(s.to_string()))?;
            if !value.is_finite() || !(0.0..=100.0).contains(&value) {
                return Err(GeometryError::InvalidDimension(s.to_string()));
            }
            return Ok(Self::Percent(value));
        }
        let value: f64 = trimmed
            .parse()
            .map_err(|_| GeometryError::InvalidDimension(s.to_string()))?;
        Ok(Self::Abs(value))
    }
}

/// How a shape is painted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DrawStyle {
    /// Fill the interior.
    #[default]
    Fill,
    /// Stroke the outline.
    Stroke,
}

bitflags::bitflags! {
    /// Shape flags controlling drawing and picking.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct ShapeFlags: u8 {
        /// Shape is drawn.
        const VISIBLE  = 0b0000_0001;
        /// Shape participates in hit testing.
        const PICKABLE = 0b0000_0010;
    }
}

impl Default for ShapeFlags {
    fn default() -> Self {
        Self::VISIBLE | Self::PICKABLE
    }
}

/// An animatable positional property of a shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Property {
    /// Horizontal position (circle center / rectangle left edge).
    X,
    /// Vertical position (circle center / rectangle top edge).
    Y,
    /// Rectangle width.
    Width,
    /// Rectangle height.
    Height,
    /// Circle radius.
    Radius,
}

impl Property {
    /// Every property, in the order patches apply them.
    pub const ALL: [Self; 5] = [Self::X, Self::Y, Self::Width, Self::Height, Self::Radius];
}

/// Sparse positional update. Only present fields are applied; fields that do
/// not exist on the target's variant (a radius on a rectangle, say) are
/// ignored.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ShapePatch {
    /// New horizontal position, if being updated.
    pub x: Option<f64>,
    /// New vertical position, if being updated.
    pub y: Option<f64>,
    /// New width, if being updated.
    pub width: Option<f64>,
    /// New height, if being updated.
    pub height: Option<f64>,
    /// New radius, if being updated.
    pub radius: Option<f64>,
}

impl ShapePatch {
    /// A patch that moves a shape to `(x, y)` without touching its size.
    #[must_use]
    pub fn move_to(x: f64, y: f64) -> Self {
        Self {
            x: Some(x),
            y: Some(y),
            ..Self::default()
        }
    }

    /// The value for `key`, if present.
    #[must_use]
    pub fn get(&self, key: Property) -> Option<f64> {
        match key {
            Property::X => self.x,
            Property::Y => self.y,
            Property::Width => self.width,
            Property::Height => self.height,
            Property::Radius => self.radius,
        }
    }

    /// Sets the value for `key`.
    pub fn set(&mut self, key: Property, value: f64) {
        match key {
            Property::X => self.x = Some(value),
            Property::Y => self.y = Some(value),
            Property::Width => self.width = Some(value),
            Property::Height => self.height = Some(value),
            Property::Radius => self.radius = Some(value),
        }
    }

    /// Present `(property, value)` pairs in application order.
    pub fn entries(&self) -> impl Iterator<Item = (Property, f64)> + '_ {
        Property::ALL
            .into_iter()
            .filter_map(|key| self.get(key).map(|value| (key, value)))
    }

    /// Returns `true` if no field is present.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries().next().is_none()
    }
}

/// Construction-time geometry with [`Length`]-valued dimensions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GeometrySpec {
    /// A circle described by its center and radius.
    Circle {
        /// Horizontal center.
        x: Length,
        /// Vertical center.
        y: Length,
        /// Radius (percentages resolve against the canvas width).
        radius: Length,
    },
    /// An axis-aligned rectangle described by its top-left corner and size.
    Rect {
        /// Left edge.
        x: Length,
        /// Top edge.
        y: Length,
        /// Width.
        width: Length,
        /// Height.
        height: Length,
    },
}

impl GeometrySpec {
    /// Resolves every dimension against the canvas size.
    #[must_use]
    pub fn resolve(&self, size: Size) -> Geometry {
        match *self {
            Self::Circle { x, y, radius } => Geometry::Circle(Circle::new(
                Point::new(x.resolve(size.width), y.resolve(size.height)),
                radius.resolve(size.width),
            )),
            Self::Rect {
                x,
                y,
                width,
                height,
            } => {
                let x0 = x.resolve(size.width);
                let y0 = y.resolve(size.height);
                Geometry::Rect(Rect::new(
                    x0,
                    y0,
                    x0 + width.resolve(size.width),
                    y0 + height.resolve(size.height),
                ))
            }
        }
    }
}

/// Live absolute geometry of a shape.
///
/// This is a closed union: adding a variant is a deliberate API change that
/// every consumer (drawing, hit testing, animation) must handle exhaustively.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Geometry {
    /// A circle.
    Circle(Circle),
    /// An axis-aligned rectangle.
    Rect(Rect),
}

impl Geometry {
    /// The smallest axis-aligned rectangle fully containing the shape.
    #[must_use]
    pub fn bounding_box(&self) -> Rect {
        match *self {
            Self::Circle(circle) => Rect::new(
                circle.center.x - circle.radius,
                circle.center.y - circle.radius,
                circle.center.x + circle.radius,
                circle.center.y + circle.radius,
            )
            .abs(),
            Self::Rect(rect) => rect.abs(),
        }
    }

    /// Precise point-in-shape test with closed boundaries.
    #[must_use]
    pub fn contains(&self, pt: Point) -> bool {
        match *self {
            Self::Circle(circle) => circle.center.distance(pt) <= circle.radius.abs(),
            Self::Rect(rect) => {
                let rect = rect.abs();
                rect.x0 <= pt.x && pt.x <= rect.x1 && rect.y0 <= pt.y && pt.y <= rect.y1
            }
        }
    }

    /// The value of `key`, or `None` if the variant has no such property.
    #[must_use]
    pub fn get(&self, key: Property) -> Option<f64> {
        match (*self, key) {
            (Self::Circle(circle), Property::X) => Some(circle.center.x),
            (Self::Circle(circle), Property::Y) => Some(circle.center.y),
            (Self::Circle(circle), Property::Radius) => Some(circle.radius),
            (Self::Rect(rect), Property::X) => Some(rect.x0),
            (Self::Rect(rect), Property::Y) => Some(rect.y0),
            (Self::Rect(rect), Property::Width) => Some(rect.width()),
            (Self::Rect(rect), Property::Height) => Some(rect.height()),
            _ => None,
        }
    }

    /// Sets `key` to `value`; a key the variant lacks is ignored.
    ///
    /// Positions move rectangles rigidly (width and height are preserved);
    /// sizes grow from the top-left corner.
    pub fn set(&mut self, key: Property, value: f64) {
        match self {
            Self::Circle(circle) => match key {
                Property::X => circle.center.x = value,
                Property::Y => circle.center.y = value,
                Property::Radius => circle.radius = value,
                Property::Width | Property::Height => {}
            },
            Self::Rect(rect) => match key {
                Property::X => {
                    let width = rect.width();
                    rect.x0 = value;
                    rect.x1 = value + width;
                }
                Property::Y => {
                    let height = rect.height();
                    rect.y0 = value;
                    rect.y1 = value + height;
                }
                Property::Width => rect.x1 = rect.x0 + value,
                Property::Height => rect.y1 = rect.y0 + value,
                Property::Radius => {}
            },
        }
    }

    /// Rescales proportionally from `past` to `now` canvas size.
    ///
    /// An axis whose past extent is zero keeps its coordinates (there is no
    /// meaningful ratio to apply). Results are rounded to 2 decimals.
    pub fn rescale(&mut self, now: Size, past: Size) {
        let sx = if past.width > 0.0 {
            now.width / past.width
        } else {
            1.0
        };
        let sy = if past.height > 0.0 {
            now.height / past.height
        } else {
            1.0
        };
        match self {
            Self::Circle(circle) => {
                circle.center.x = round2(circle.center.x * sx);
                circle.center.y = round2(circle.center.y * sy);
                // The radius is keyed to the horizontal extent, like
                // percentage radii.
                circle.radius = round2(circle.radius * sx);
            }
            Self::Rect(rect) => {
                rect.x0 = round2(rect.x0 * sx);
                rect.x1 = round2(rect.x1 * sx);
                rect.y0 = round2(rect.y0 * sy);
                rect.y1 = round2(rect.y1 * sy);
            }
        }
    }
}

/// Everything needed to construct a [`Shape`].
#[derive(Debug, Clone)]
pub struct ShapeSpec {
    geometry: GeometrySpec,
    alias: Option<String>,
    fill: Color,
    draw_style: DrawStyle,
    z_index: i32,
    flags: ShapeFlags,
}

impl ShapeSpec {
    /// A circle at `(x, y)` with the given radius.
    pub fn circle(x: impl Into<Length>, y: impl Into<Length>, radius: impl Into<Length>) -> Self {
        Self::with_geometry(GeometrySpec::Circle {
            x: x.into(),
            y: y.into(),
            radius: radius.into(),
        })
    }

    /// A rectangle with top-left corner `(x, y)` and the given size.
    pub fn rect(
        x: impl Into<Length>,
        y: impl Into<Length>,
        width: impl Into<Length>,
        height: impl Into<Length>,
    ) -> Self {
        Self::with_geometry(GeometrySpec::Rect {
            x: x.into(),
            y: y.into(),
            width: width.into(),
            height: height.into(),
        })
    }

    /// A spec from an explicit [`GeometrySpec`].
    #[must_use]
    pub fn with_geometry(geometry: GeometrySpec) -> Self {
        Self {
            geometry,
            alias: None,
            fill: Color::BLACK,
            draw_style: DrawStyle::default(),
            z_index: 0,
            flags: ShapeFlags::default(),
        }
    }

    /// Sets a human-readable alias (defaults to the id's decimal form).
    #[must_use]
    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    /// Sets the fill/stroke color.
    #[must_use]
    pub fn fill(mut self, color: Color) -> Self {
        self.fill = color;
        self
    }

    /// Sets how the shape is painted.
    #[must_use]
    pub fn draw_style(mut self, style: DrawStyle) -> Self {
        self.draw_style = style;
        self
    }

    /// Sets the stacking order hint; higher is on top.
    #[must_use]
    pub fn z_index(mut self, z_index: i32) -> Self {
        self.z_index = z_index;
        self
    }

    /// Sets the visibility/pickability flags.
    #[must_use]
    pub fn flags(mut self, flags: ShapeFlags) -> Self {
        self.flags = flags;
        self
    }
}

/// A canvas shape.
///
/// The live geometry is absolute; construction dimensions (which may be
/// percentages) are kept and resolved once, when the shape first enters a
/// scene. Every mutation recomputes the bounding box before returning, so
/// the box is always consistent with the current geometry.
#[derive(Debug, Clone)]
pub struct Shape {
    id: ShapeId,
    alias: Option<String>,
    spec: GeometrySpec,
    resolved: bool,
    geometry: Geometry,
    bbox: Rect,
    fill: Color,
    draw_style: DrawStyle,
    z_index: i32,
    flags: ShapeFlags,
}

impl Shape {
    /// Creates a shape with a freshly assigned id.
    #[must_use]
    pub fn new(spec: ShapeSpec) -> Self {
        let geometry = spec.geometry.resolve(Size::ZERO);
        Self {
            id: ShapeId::next(),
            alias: spec.alias,
            spec: spec.geometry,
            resolved: false,
            geometry,
            bbox: geometry.bounding_box(),
            fill: spec.fill,
            draw_style: spec.draw_style,
            z_index: spec.z_index,
            flags: spec.flags,
        }
    }

    /// The shape's unique id.
    #[must_use]
    pub fn id(&self) -> ShapeId {
        self.id
    }

    /// The alias, or `None` if the shape goes by its id.
    #[must_use]
    pub fn alias(&self) -> Option<&str> {
        self.alias.as_deref()
    }

    /// The live absolute geometry.
    #[must_use]
    pub fn geometry(&self) -> Geometry {
        self.geometry
    }

    /// The cached bounding box, consistent with the current geometry.
    #[must_use]
    pub fn bounding_box(&self) -> Rect {
        self.bbox
    }

    /// The fill/stroke color.
    #[must_use]
    pub fn fill(&self) -> Color {
        self.fill
    }

    /// How the shape is painted.
    #[must_use]
    pub fn draw_style(&self) -> DrawStyle {
        self.draw_style
    }

    /// Stacking order hint; higher is on top.
    #[must_use]
    pub fn z_index(&self) -> i32 {
        self.z_index
    }

    /// Visibility/pickability flags.
    #[must_use]
    pub fn flags(&self) -> ShapeFlags {
        self.flags
    }

    /// Resolves construction dimensions against the canvas size.
    ///
    /// Called by the scene when the shape first enters it; later calls are
    /// no-ops so re-appending a mutated shape keeps its mutated geometry.
    pub fn resolve(&mut self, size: Size) {
        if self.resolved {
            return;
        }
        self.resolved = true;
        self.geometry = self.spec.resolve(size);
        self.bbox = self.geometry.bounding_box();
    }

    /// Applies a partial positional state and recomputes the bounding box.
    pub fn set_state(&mut self, patch: &ShapePatch) {
        for (key, value) in patch.entries() {
            self.geometry.set(key, value);
        }
        self.bbox = self.geometry.bounding_box();
    }

    /// Rescales proportionally from `past` to `now` canvas size.
    pub fn rescale(&mut self, now: Size, past: Size) {
        self.geometry.rescale(now, past);
        self.bbox = self.geometry.bounding_box();
    }

    /// The value of an animatable property, or `None` if the shape's variant
    /// has no such property.
    #[must_use]
    pub fn get(&self, key: Property) -> Option<f64> {
        self.geometry.get(key)
    }

    /// Precise point-in-shape test.
    #[must_use]
    pub fn contains(&self, pt: Point) -> bool {
        self.geometry.contains(pt)
    }
}
