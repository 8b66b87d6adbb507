//! Text annotation shape.

use super::{
    Placement, ShapeError, ShapeId, ShapeStyle, ShapeTrait, TransformDelta, finite,
    placed_bounds,
};
use kurbo::{BezPath, Point, Rect, Shape as KurboShape};
use serde::{Deserialize, Serialize};

pub const DEFAULT_FONT_SIZE: f64 = 24.0;
pub const DEFAULT_FONT_FAMILY: &str = "Arial";

/// Line height as a multiple of the font size.
const LINE_HEIGHT: f64 = 1.2;
/// Average glyph advance as a multiple of the font size.
const CHAR_WIDTH: f64 = 0.6;

fn default_font_size() -> f64 {
    DEFAULT_FONT_SIZE
}

fn default_font_family() -> String {
    DEFAULT_FONT_FAMILY.to_string()
}

fn text_style() -> ShapeStyle {
    ShapeStyle {
        fill: Some("white".to_string()),
        ..ShapeStyle::default()
    }
}

/// A text label. The local frame's origin is the top-left of the first line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextAnnotation {
    pub(crate) id: ShapeId,
    pub placement: Placement,
    pub text: String,
    #[serde(default = "default_font_size")]
    pub font_size: f64,
    #[serde(default = "default_font_family")]
    pub font_family: String,
    #[serde(default = "text_style")]
    pub style: ShapeStyle,
    #[serde(default)]
    pub locked: bool,
}

impl TextAnnotation {
    pub fn new(text: impl Into<String>, position: Point) -> Self {
        Self {
            id: ShapeId::generate(),
            placement: Placement::at(position),
            text: text.into(),
            font_size: DEFAULT_FONT_SIZE,
            font_family: default_font_family(),
            style: text_style(),
            locked: false,
        }
    }

    /// Approximate unscaled extent of the laid-out text.
    pub fn local_size(&self) -> (f64, f64) {
        let lines = self.text.lines().count().max(1);
        let longest = self
            .text
            .lines()
            .map(|l| l.chars().count())
            .max()
            .unwrap_or(0)
            .max(1);
        (
            longest as f64 * self.font_size * CHAR_WIDTH,
            lines as f64 * self.font_size * LINE_HEIGHT,
        )
    }

    fn local_rect(&self) -> Rect {
        let (w, h) = self.local_size();
        Rect::new(0.0, 0.0, w, h)
    }
}

impl ShapeTrait for TextAnnotation {
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
        finite("fontSize", self.font_size)?;
        if self.font_size <= 0.0 {
            return Err(ShapeError::Negative { field: "fontSize" });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let text = TextAnnotation::new("Text", Point::new(10.0, 10.0));
        assert_eq!(text.font_size, 24.0);
        assert_eq!(text.font_family, "Arial");
        assert_eq!(text.style.fill.as_deref(), Some("white"));
    }

    #[test]
    fn test_multiline_bounds() {
        let text = TextAnnotation::new("ab\nabcd", Point::new(0.0, 0.0));
        let bounds = text.bounds();
        assert!((bounds.width() - 4.0 * 24.0 * 0.6).abs() < 1e-9);
        assert!((bounds.height() - 2.0 * 24.0 * 1.2).abs() < 1e-9);
    }

    #[test]
    fn test_missing_optional_fields_use_defaults() {
        let json = r#"{"id":"t1","placement":{"x":5,"y":6},"text":"Go"}"#;
        let text: TextAnnotation = serde_json::from_str(json).unwrap();
        assert_eq!(text.font_size, DEFAULT_FONT_SIZE);
        assert_eq!(text.placement.scale_x, 1.0);
        assert!(!text.locked);
        assert!(text.validate().is_ok());
    }
}
