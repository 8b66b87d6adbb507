//! Shape definitions for plan slides.

mod area;
mod icon;
mod patch;
mod path;
mod placement;
mod text;

pub use area::{AreaKind, AreaMarker};
pub use icon::IconMarker;
pub use patch::ShapePatch;
pub use path::FreehandPath;
pub use placement::{Placement, TransformDelta};
pub use text::TextAnnotation;

pub(crate) use placement::{finite, non_negative};

use kurbo::{BezPath, Point, Rect, Vec2};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

/// Opaque shape identifier.
///
/// Ids loaded from a plan are kept verbatim; new ids are UUID v4 strings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ShapeId(String);

impl ShapeId {
    /// Generate a fresh id.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<&str> for ShapeId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for ShapeId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Display for ShapeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Per-shape validation failures.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ShapeError {
    #[error("shape id is empty")]
    EmptyId,
    #[error("{field} is not a finite number")]
    NonFinite { field: &'static str },
    #[error("{field} must not be negative")]
    Negative { field: &'static str },
    #[error("opacity {0} is outside [0, 1]")]
    Opacity(f64),
    #[error("scale must not be zero")]
    ZeroScale,
    #[error("path has no points")]
    EmptyPath,
    #[error("icon has no asset reference")]
    MissingAsset,
    #[error("shape id already used on this tab")]
    DuplicateId,
    #[error("malformed shape: {0}")]
    Malformed(String),
}

fn default_opacity() -> f64 {
    1.0
}

/// Style properties shared by all shapes. Colors are CSS color strings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShapeStyle {
    pub stroke: String,
    pub stroke_width: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fill: Option<String>,
    #[serde(default = "default_opacity")]
    pub opacity: f64,
}

impl Default for ShapeStyle {
    fn default() -> Self {
        Self {
            stroke: "white".to_string(),
            stroke_width: 2.0,
            fill: None,
            opacity: 1.0,
        }
    }
}

impl ShapeStyle {
    /// A stroke-only style.
    pub fn stroke(color: impl Into<String>, width: f64) -> Self {
        Self {
            stroke: color.into(),
            stroke_width: width,
            ..Self::default()
        }
    }

    pub(crate) fn validate(&self) -> Result<(), ShapeError> {
        non_negative("strokeWidth", self.stroke_width)?;
        finite("opacity", self.opacity)?;
        if !(0.0..=1.0).contains(&self.opacity) {
            return Err(ShapeError::Opacity(self.opacity));
        }
        Ok(())
    }
}

/// Distance from a point to a line segment (a→b).
pub fn point_to_segment_dist(point: Point, a: Point, b: Point) -> f64 {
    let seg = b - a;
    let pv = point - a;
    let len_sq = seg.hypot2();
    if len_sq < f64::EPSILON {
        return pv.hypot();
    }
    let t = (pv.dot(seg) / len_sq).clamp(0.0, 1.0);
    (point - (a + seg * t)).hypot()
}

/// Minimum distance from a point to a polyline (sequence of connected segments).
pub fn point_to_polyline_dist(point: Point, points: &[Point]) -> f64 {
    match points {
        [] => f64::INFINITY,
        [single] => (point - *single).hypot(),
        _ => points
            .windows(2)
            .map(|w| point_to_segment_dist(point, w[0], w[1]))
            .fold(f64::INFINITY, f64::min),
    }
}

/// Axis-aligned bounds of local points mapped through a placement.
pub(crate) fn placed_bounds(placement: &Placement, local: &[Point]) -> Rect {
    let affine = placement.affine();
    let mut points = local.iter().map(|p| affine * *p);
    let Some(first) = points.next() else {
        return Rect::from_origin_size(placement.position(), (0.0, 0.0));
    };
    points.fold(Rect::from_points(first, first), |rect, p| rect.union_pt(p))
}

/// Common trait for all shapes.
pub trait ShapeTrait {
    /// Get the unique identifier.
    fn id(&self) -> &ShapeId;

    /// Get the local transform.
    fn placement(&self) -> &Placement;

    /// Get the bounding box in canvas coordinates.
    fn bounds(&self) -> Rect;

    /// Check if a point (in canvas coordinates) hits this shape.
    fn hit_test(&self, point: Point, tolerance: f64) -> bool;

    /// Outline in canvas coordinates, for rendering.
    fn to_path(&self) -> BezPath;

    /// Get the style.
    fn style(&self) -> &ShapeStyle;

    /// Get mutable style.
    fn style_mut(&mut self) -> &mut ShapeStyle;

    /// New geometry with `delta` composed onto the placement. Never mutates `self`.
    fn transformed(&self, delta: &TransformDelta) -> Self
    where
        Self: Sized;

    /// Check geometry and style invariants.
    fn validate(&self) -> Result<(), ShapeError>;
}

/// Enum wrapper for all shape kinds, tagged by `"type"` on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Shape {
    #[serde(rename = "line")]
    Path(FreehandPath),
    Icon(IconMarker),
    Text(TextAnnotation),
    Area(AreaMarker),
}

macro_rules! dispatch {
    ($shape:expr, $s:ident => $body:expr) => {
        match $shape {
            Shape::Path($s) => $body,
            Shape::Icon($s) => $body,
            Shape::Text($s) => $body,
            Shape::Area($s) => $body,
        }
    };
}

impl Shape {
    /// Parse and validate a single shape from its wire value.
    pub fn from_value(value: serde_json::Value) -> Result<Self, ShapeError> {
        let shape: Shape =
            serde_json::from_value(value).map_err(|e| ShapeError::Malformed(e.to_string()))?;
        shape.validate()?;
        Ok(shape)
    }

    pub fn id(&self) -> &ShapeId {
        dispatch!(self, s => s.id())
    }

    pub fn placement(&self) -> &Placement {
        dispatch!(self, s => s.placement())
    }

    pub fn bounds(&self) -> Rect {
        dispatch!(self, s => s.bounds())
    }

    pub fn hit_test(&self, point: Point, tolerance: f64) -> bool {
        dispatch!(self, s => s.hit_test(point, tolerance))
    }

    /// Test if this shape intersects a selection rectangle.
    pub fn intersects_rect(&self, rect: Rect) -> bool {
        rect.intersect(self.bounds().inflate(1.0, 1.0)).area() > 0.0
    }

    pub fn to_path(&self) -> BezPath {
        dispatch!(self, s => s.to_path())
    }

    pub fn style(&self) -> &ShapeStyle {
        dispatch!(self, s => s.style())
    }

    pub fn style_mut(&mut self) -> &mut ShapeStyle {
        dispatch!(self, s => s.style_mut())
    }

    pub fn transformed(&self, delta: &TransformDelta) -> Shape {
        match self {
            Shape::Path(s) => Shape::Path(s.transformed(delta)),
            Shape::Icon(s) => Shape::Icon(s.transformed(delta)),
            Shape::Text(s) => Shape::Text(s.transformed(delta)),
            Shape::Area(s) => Shape::Area(s.transformed(delta)),
        }
    }

    /// Same shape with its placement replaced.
    pub fn with_placement(&self, placement: Placement) -> Shape {
        let mut shape = self.clone();
        dispatch!(&mut shape, s => s.placement = placement);
        shape
    }

    /// Same shape moved by `offset`.
    pub fn translated(&self, offset: Vec2) -> Shape {
        self.transformed(&TransformDelta::translate(offset))
    }

    pub fn validate(&self) -> Result<(), ShapeError> {
        if self.id().is_empty() {
            return Err(ShapeError::EmptyId);
        }
        dispatch!(self, s => s.validate())
    }

    pub fn is_locked(&self) -> bool {
        dispatch!(self, s => s.locked)
    }

    pub fn set_locked(&mut self, locked: bool) {
        dispatch!(self, s => s.locked = locked)
    }

    /// Assign a fresh id (used when cloning tabs and pasting).
    pub fn regenerate_id(&mut self) {
        dispatch!(self, s => s.id = ShapeId::generate())
    }

    /// Wire name of this shape's kind.
    pub fn kind(&self) -> &'static str {
        match self {
            Shape::Path(_) => "line",
            Shape::Icon(_) => "icon",
            Shape::Text(_) => "text",
            Shape::Area(_) => "area",
        }
    }

    pub fn as_text_mut(&mut self) -> Option<&mut TextAnnotation> {
        match self {
            Shape::Text(t) => Some(t),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    fn sample_shapes() -> Vec<Shape> {
        let path = FreehandPath::from_canvas_points(
            &[Point::new(10.0, 10.0), Point::new(20.0, 15.0), Point::new(35.0, 40.0)],
            ShapeStyle::default(),
        );
        let icon = IconMarker::new("/icons/tank.png", Point::new(100.0, 100.0), 40.0, 40.0);
        let text = TextAnnotation::new("Stack here", Point::new(300.0, 200.0));
        let area = AreaMarker::new(AreaKind::Ellipse, Point::new(500.0, 300.0), 120.0, 80.0);
        vec![
            Shape::Path(path),
            Shape::Icon(icon),
            Shape::Text(text),
            Shape::Area(area),
        ]
    }

    #[test]
    fn test_wire_tags() {
        let kinds: Vec<_> = sample_shapes()
            .iter()
            .map(|s| serde_json::to_value(s).unwrap()["type"].clone())
            .collect();
        assert_eq!(
            kinds,
            vec!["line", "icon", "text", "area"]
                .into_iter()
                .map(serde_json::Value::from)
                .collect::<Vec<_>>()
        );
    }

    #[test]
    fn test_json_roundtrip() {
        for shape in sample_shapes() {
            let json = serde_json::to_string(&shape).unwrap();
            let back: Shape = serde_json::from_str(&json).unwrap();
            assert_eq!(back, shape);
        }
    }

    #[test]
    fn test_from_value_rejects_invalid() {
        let mut value = serde_json::to_value(&sample_shapes()[1]).unwrap();
        value["style"]["opacity"] = serde_json::json!(1.5);
        assert_eq!(Shape::from_value(value), Err(ShapeError::Opacity(1.5)));

        let mut value = serde_json::to_value(&sample_shapes()[0]).unwrap();
        value["id"] = serde_json::json!("");
        assert_eq!(Shape::from_value(value), Err(ShapeError::EmptyId));

        let value = serde_json::json!({"type": "hexagon", "id": "x"});
        assert!(matches!(Shape::from_value(value), Err(ShapeError::Malformed(_))));
    }

    #[test]
    fn test_regenerate_id_keeps_geometry() {
        let shape = sample_shapes().remove(2);
        let mut copy = shape.clone();
        copy.regenerate_id();
        assert_ne!(copy.id(), shape.id());
        assert_eq!(copy.bounds(), shape.bounds());
    }

    #[test]
    fn test_intersects_rect() {
        let icon = &sample_shapes()[1];
        assert!(icon.intersects_rect(Rect::new(90.0, 90.0, 110.0, 110.0)));
        assert!(!icon.intersects_rect(Rect::new(0.0, 0.0, 50.0, 50.0)));
    }

    #[test]
    fn test_polyline_distance() {
        let points = [Point::new(0.0, 0.0), Point::new(10.0, 0.0)];
        assert_eq!(point_to_polyline_dist(Point::new(5.0, 3.0), &points), 3.0);
        assert_eq!(point_to_polyline_dist(Point::new(3.0, 4.0), &points[..1]), 5.0);
        assert_eq!(point_to_polyline_dist(Point::ZERO, &[]), f64::INFINITY);
    }

    fn coord() -> impl Strategy<Value = f64> {
        -2000.0..2000.0f64
    }

    fn arb_placement() -> impl Strategy<Value = Placement> {
        (coord(), coord(), -360.0..360.0f64, 0.1..4.0f64, 0.1..4.0f64).prop_map(
            |(x, y, rotation, scale_x, scale_y)| Placement {
                x,
                y,
                rotation,
                scale_x,
                scale_y,
            },
        )
    }

    fn arb_style() -> impl Strategy<Value = ShapeStyle> {
        (
            "[a-z#0-9]{1,9}",
            0.0..20.0f64,
            proptest::option::of("[a-z#0-9]{1,9}"),
            0.0..=1.0f64,
        )
            .prop_map(|(stroke, stroke_width, fill, opacity)| ShapeStyle {
                stroke,
                stroke_width,
                fill,
                opacity,
            })
    }

    fn arb_shape() -> impl Strategy<Value = Shape> {
        let path = (
            arb_placement(),
            arb_style(),
            proptest::collection::vec((coord(), coord()), 1..12),
            any::<bool>(),
        )
            .prop_map(|(placement, style, points, locked)| {
                let mut path = FreehandPath::from_canvas_points(&[Point::ZERO], style);
                path.placement = placement;
                path.points = points.into_iter().map(Point::from).collect();
                path.locked = locked;
                Shape::Path(path)
            });
        let icon = (arb_placement(), "[a-z/]{1,20}\\.png", 1.0..200.0f64, 1.0..200.0f64).prop_map(
            |(placement, src, w, h)| {
                let mut icon = IconMarker::new(src, Point::ZERO, w, h);
                icon.placement = placement;
                Shape::Icon(icon)
            },
        );
        let text = (arb_placement(), ".{0,40}", 6.0..96.0f64).prop_map(|(placement, content, size)| {
            let mut text = TextAnnotation::new(content, Point::ZERO);
            text.placement = placement;
            text.font_size = size;
            Shape::Text(text)
        });
        let area = (
            arb_placement(),
            prop_oneof![
                Just(AreaKind::Rectangle),
                Just(AreaKind::Ellipse),
                Just(AreaKind::Triangle),
                Just(AreaKind::RightTriangle),
            ],
            0.0..500.0f64,
            0.0..500.0f64,
            proptest::option::of("[A-Za-z ]{1,12}"),
        )
            .prop_map(|(placement, kind, w, h, label)| {
                let mut area = AreaMarker::new(kind, Point::ZERO, w, h);
                area.placement = placement;
                area.label = label;
                Shape::Area(area)
            });
        prop_oneof![path, icon, text, area]
    }

    proptest! {
        #[test]
        fn prop_serialize_roundtrip(shape in arb_shape()) {
            let json = serde_json::to_string(&shape).unwrap();
            let back: Shape = serde_json::from_str(&json).unwrap();
            prop_assert_eq!(back, shape);
        }

        #[test]
        fn prop_translation_moves_bounds(shape in arb_shape(), dx in coord(), dy in coord()) {
            let moved = shape.translated(Vec2::new(dx, dy));
            let before = shape.placement();
            let after = moved.placement();
            prop_assert_eq!(after.x, before.x + dx);
            prop_assert_eq!(after.y, before.y + dy);
            prop_assert_eq!(after.rotation, before.rotation);
            prop_assert_eq!(moved.id(), shape.id());
        }
    }
}
