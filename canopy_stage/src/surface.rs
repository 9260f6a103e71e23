// Copyright 2025 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The drawing-surface contract.

use kurbo::{Circle, Rect, Size};
use peniko::Color;

/// A 2D drawing surface the stage renders onto.
///
/// Implementations own the actual raster target — an HTML canvas context, a
/// GPU renderer, a test recorder — and are only required to provide the
/// primitives the shape model needs. Coordinates are in canvas units with
/// the origin at the top-left corner.
pub trait Surface {
    /// Current canvas size.
    fn size(&self) -> Size;

    /// Clears a region to the background.
    fn clear(&mut self, region: Rect);

    /// Fills a circle.
    fn fill_circle(&mut self, circle: Circle, color: Color);

    /// Strokes a circle's outline.
    fn stroke_circle(&mut self, circle: Circle, color: Color);

    /// Fills a rectangle.
    fn fill_rect(&mut self, rect: Rect, color: Color);

    /// Strokes a rectangle's outline.
    fn stroke_rect(&mut self, rect: Rect, color: Color);

    /// Clears the whole surface.
    fn clear_all(&mut self) {
        self.clear(self.size().to_rect());
    }
}
