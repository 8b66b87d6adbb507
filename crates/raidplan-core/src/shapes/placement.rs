//! Local placement of a shape and the aggregate deltas applied to it.

use super::ShapeError;
use kurbo::{Affine, Point, Vec2};
use serde::{Deserialize, Serialize};

fn unit_scale() -> f64 {
    1.0
}

/// A shape's local transform: position, rotation (degrees) and scale.
///
/// Local geometry is mapped to canvas units as
/// `translate(position) * rotate(rotation) * scale(scale_x, scale_y)`.
/// The canvas y axis points down, so positive rotation is clockwise on screen.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Placement {
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub rotation: f64,
    #[serde(default = "unit_scale")]
    pub scale_x: f64,
    #[serde(default = "unit_scale")]
    pub scale_y: f64,
}

impl Default for Placement {
    fn default() -> Self {
        Self::at(Point::ZERO)
    }
}

impl Placement {
    /// Unrotated, unscaled placement at a position.
    pub fn at(position: Point) -> Self {
        Self {
            x: position.x,
            y: position.y,
            rotation: 0.0,
            scale_x: 1.0,
            scale_y: 1.0,
        }
    }

    pub fn position(&self) -> Point {
        Point::new(self.x, self.y)
    }

    /// Local-to-canvas transform.
    pub fn affine(&self) -> Affine {
        Affine::translate((self.x, self.y))
            * Affine::rotate(self.rotation.to_radians())
            * Affine::scale_non_uniform(self.scale_x, self.scale_y)
    }

    /// Same placement moved by `offset`.
    pub fn translated(&self, offset: Vec2) -> Self {
        Self {
            x: self.x + offset.x,
            y: self.y + offset.y,
            ..*self
        }
    }

    /// Map a canvas point into the local frame, scaling `tolerance` to match.
    pub fn to_local(&self, point: Point, tolerance: f64) -> (Point, f64) {
        let local = self.affine().inverse() * point;
        let scale = self.scale_x.abs().min(self.scale_y.abs()).max(f64::EPSILON);
        (local, tolerance / scale)
    }

    pub(crate) fn validate(&self) -> Result<(), ShapeError> {
        finite("x", self.x)?;
        finite("y", self.y)?;
        finite("rotation", self.rotation)?;
        finite("scaleX", self.scale_x)?;
        finite("scaleY", self.scale_y)?;
        if self.scale_x == 0.0 || self.scale_y == 0.0 {
            return Err(ShapeError::ZeroScale);
        }
        Ok(())
    }
}

/// Reject NaN and infinities.
pub(crate) fn finite(field: &'static str, value: f64) -> Result<(), ShapeError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ShapeError::NonFinite { field })
    }
}

/// Reject non-finite or negative values.
pub(crate) fn non_negative(field: &'static str, value: f64) -> Result<(), ShapeError> {
    finite(field, value)?;
    if value < 0.0 {
        Err(ShapeError::Negative { field })
    } else {
        Ok(())
    }
}

/// Aggregate transform of a gesture: scale and rotate about `pivot`, then translate.
///
/// Rotation is in degrees, matching [`Placement::rotation`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransformDelta {
    pub pivot: Point,
    pub translation: Vec2,
    pub scale: Vec2,
    pub rotation: f64,
}

impl TransformDelta {
    /// The delta that leaves every shape unchanged.
    pub fn identity(pivot: Point) -> Self {
        Self {
            pivot,
            translation: Vec2::ZERO,
            scale: Vec2::new(1.0, 1.0),
            rotation: 0.0,
        }
    }

    /// A pure translation.
    pub fn translate(offset: Vec2) -> Self {
        Self {
            translation: offset,
            ..Self::identity(Point::ZERO)
        }
    }

    pub fn is_translation_only(&self) -> bool {
        self.rotation == 0.0 && self.scale == Vec2::new(1.0, 1.0)
    }

    pub fn is_identity(&self) -> bool {
        self.is_translation_only() && self.translation == Vec2::ZERO
    }

    /// Canvas-space affine of this delta.
    pub fn affine(&self) -> Affine {
        let pivot = self.pivot.to_vec2();
        Affine::translate(self.translation + pivot)
            * Affine::rotate(self.rotation.to_radians())
            * Affine::scale_non_uniform(self.scale.x, self.scale.y)
            * Affine::translate(-pivot)
    }

    pub fn apply_point(&self, point: Point) -> Point {
        if self.is_translation_only() {
            point + self.translation
        } else {
            self.affine() * point
        }
    }

    /// Compose this delta with a shape's own placement.
    ///
    /// Positions and rotations compose exactly. A non-uniform scale applied to
    /// a rotated shape is folded into its local scale, which approximates the
    /// resulting skew.
    pub fn apply(&self, placement: &Placement) -> Placement {
        if self.is_translation_only() {
            return placement.translated(self.translation);
        }
        let position = self.apply_point(placement.position());
        Placement {
            x: position.x,
            y: position.y,
            rotation: placement.rotation + self.rotation,
            scale_x: placement.scale_x * self.scale.x,
            scale_y: placement.scale_y * self.scale.y,
        }
    }
}
