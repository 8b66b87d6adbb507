//! Icon marker shape (player, role or boss-mechanic artwork).

use super::{
    Placement, ShapeError, ShapeId, ShapeStyle, ShapeTrait, TransformDelta, non_negative,
    placed_bounds,
};
use kurbo::{BezPath, Point, Rect, Shape as KurboShape};
use serde::{Deserialize, Serialize};

/// Default edge length of a newly placed icon.
pub const DEFAULT_ICON_SIZE: f64 = 40.0;

/// An image asset drawn at a placement. The local frame's origin is the top-left corner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IconMarker {
    pub(crate) id: ShapeId,
    pub placement: Placement,
    /// Asset reference (URL or bundled asset path).
    pub src: String,
    pub width: f64,
    pub height: f64,
    #[serde(default)]
    pub style: ShapeStyle,
    #[serde(default)]
    pub locked: bool,
}

impl IconMarker {
    pub fn new(src: impl Into<String>, position: Point, width: f64, height: f64) -> Self {
        Self {
            id: ShapeId::generate(),
            placement: Placement::at(position),
            src: src.into(),
            width,
            height,
            style: ShapeStyle::default(),
            locked: false,
        }
    }

    /// Icon centred on `center` with the default size.
    pub fn centered(src: impl Into<String>, center: Point) -> Self {
        let half = DEFAULT_ICON_SIZE / 2.0;
        Self::new(
            src,
            Point::new(center.x - half, center.y - half),
            DEFAULT_ICON_SIZE,
            DEFAULT_ICON_SIZE,
        )
    }

    fn local_rect(&self) -> Rect {
        Rect::new(0.0, 0.0, self.width, self.height)
    }
}

impl ShapeTrait for IconMarker {
    fn id(&self) -> &ShapeId {
        &self.id
    }

    fn placement(&self) -> &Placement {
        &self.placement
    }

    fn bounds(&self) -> Rect {
        let r = self.local_rect();
        placed_bounds(
            &self.placement,
            &[
                Point::new(r.x0, r.y0),
                Point::new(r.x1, r.y0),
                Point::new(r.x1, r.y1),
                Point::new(r.x0, r.y1),
            ],
        )
    }

    fn hit_test(&self, point: Point, tolerance: f64) -> bool {
        let (local, tolerance) = self.placement.to_local(point, tolerance);
        self.local_rect().inflate(tolerance, tolerance).contains(local)
    }

    fn to_path(&self) -> BezPath {
        self.placement.affine() * self.local_rect().to_path(0.1)
    }

    fn style(&self) -> &ShapeStyle {
        &self.style
    }

    fn style_mut(&mut self) -> &mut ShapeStyle {
        &mut self.style
    }

    fn transformed(&self, delta: &TransformDelta) -> Self {
        Self {
            placement: delta.apply(&self.placement),
            ..self.clone()
        }
    }

    fn validate(&self) -> Result<(), ShapeError> {
        self.placement.validate()?;
        self.style.validate()?;
        if self.src.trim().is_empty() {
            return Err(ShapeError::MissingAsset);
        }
        non_negative("width", self.width)?;
        non_negative("height", self.height)
    }
}
