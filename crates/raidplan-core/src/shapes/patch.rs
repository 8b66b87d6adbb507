//! Property edits applied to one or many shapes.

use super::Shape;

/// Property changes; `None` leaves a property untouched.
///
/// Text fields only affect text annotations and `label` only affects area
/// markers.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ShapePatch {
    pub stroke: Option<String>,
    pub stroke_width: Option<f64>,
    /// `Some(None)` removes the fill.
    pub fill: Option<Option<String>>,
    pub opacity: Option<f64>,
    pub text: Option<String>,
    pub font_size: Option<f64>,
    pub label: Option<Option<String>>,
}

impl ShapePatch {
    pub fn is_empty(&self) -> bool {
        *self == ShapePatch::default()
    }

    /// Copy of `shape` with the patch applied. The result is not validated.
    pub fn applied_to(&self, shape: &Shape) -> Shape {
        let mut shape = shape.clone();
        let style = shape.style_mut();
        if let Some(stroke) = &self.stroke {
            style.stroke = stroke.clone();
        }
        if let Some(width) = self.stroke_width {
            style.stroke_width = width;
        }
        if let Some(fill) = &self.fill {
            style.fill = fill.clone();
        }
        if let Some(opacity) = self.opacity {
            style.opacity = opacity;
        }
        match &mut shape {
            Shape::Text(text) => {
                if let Some(content) = &self.text {
                    text.text = content.clone();
                }
                if let Some(size) = self.font_size {
                    text.font_size = size;
                }
            }
            Shape::Area(area) => {
                if let Some(label) = &self.label {
                    area.label = label.clone();
                }
            }
            Shape::Path(_) | Shape::Icon(_) => {}
        }
        shape
    }
}
