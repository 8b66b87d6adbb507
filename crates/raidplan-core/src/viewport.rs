//! Mapping between the fixed logical canvas and a renderer's surface.

use kurbo::{Affine, Point, Rect, Size, Vec2};
use serde::{Deserialize, Serialize};

/// Logical canvas width. All shape geometry is expressed in these units.
pub const CANVAS_WIDTH: f64 = 1280.0;
/// Logical canvas height.
pub const CANVAS_HEIGHT: f64 = 720.0;

/// The logical canvas rectangle.
pub fn canvas_rect() -> Rect {
    Rect::new(0.0, 0.0, CANVAS_WIDTH, CANVAS_HEIGHT)
}

/// Uniform scale and letterbox offset that fit the canvas into a surface.
///
/// Thumbnails, the editor and the read-only viewer each hold their own
/// viewport; geometry never changes with surface size.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    /// Screen offset of the canvas origin.
    pub offset: Vec2,
    /// Screen pixels per canvas unit.
    pub scale: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            offset: Vec2::ZERO,
            scale: 1.0,
        }
    }
}

impl Viewport {
    /// Fit the whole canvas into `surface`, centred, preserving aspect ratio.
    pub fn fit(surface: Size) -> Self {
        if surface.width <= 0.0 || surface.height <= 0.0 {
            return Self::default();
        }
        let scale = (surface.width / CANVAS_WIDTH).min(surface.height / CANVAS_HEIGHT);
        let offset = Vec2::new(
            (surface.width - CANVAS_WIDTH * scale) / 2.0,
            (surface.height - CANVAS_HEIGHT * scale) / 2.0,
        );
        Self { offset, scale }
    }

    /// Canvas-to-screen transform.
    pub fn transform(&self) -> Affine {
        Affine::translate(self.offset) * Affine::scale(self.scale)
    }

    /// Screen-to-canvas transform, for input handling.
    pub fn inverse_transform(&self) -> Affine {
        Affine::scale(1.0 / self.scale) * Affine::translate(-self.offset)
    }

    pub fn screen_to_canvas(&self, screen_point: Point) -> Point {
        self.inverse_transform() * screen_point
    }

    pub fn canvas_to_screen(&self, canvas_point: Point) -> Point {
        self.transform() * canvas_point
    }
}
