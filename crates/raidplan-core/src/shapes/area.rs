//! Area marker shapes: zones drawn as rectangles, ellipses or triangles.

use super::{
    Placement, ShapeError, ShapeId, ShapeStyle, ShapeTrait, TransformDelta, non_negative,
    placed_bounds, point_to_polyline_dist,
};
use kurbo::{BezPath, Ellipse, Point, Rect, Shape as KurboShape};
use serde::{Deserialize, Serialize};

/// Outline of an area marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AreaKind {
    Rectangle,
    Ellipse,
    Triangle,
    RightTriangle,
}

fn area_style() -> ShapeStyle {
    ShapeStyle {
        fill: Some("rgba(255, 0, 0, 0.3)".to_string()),
        ..ShapeStyle::default()
    }
}

/// A zone of `width` x `height` local units; the local origin is the top-left corner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AreaMarker {
    pub(crate) id: ShapeId,
    pub placement: Placement,
    pub kind: AreaKind,
    pub width: f64,
    pub height: f64,
    #[serde(default = "area_style")]
    pub style: ShapeStyle,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default)]
    pub locked: bool,
}

impl AreaMarker {
    pub fn new(kind: AreaKind, position: Point, width: f64, height: f64) -> Self {
        Self {
            id: ShapeId::generate(),
            placement: Placement::at(position),
            kind,
            width,
            height,
            style: area_style(),
            label: None,
            locked: false,
        }
    }

    fn local_rect(&self) -> Rect {
        Rect::new(0.0, 0.0, self.width, self.height)
    }

    /// Corner points of polygonal kinds, in local coordinates.
    fn polygon(&self) -> Vec<Point> {
        let (w, h) = (self.width, self.height);
        match self.kind {
            AreaKind::Rectangle | AreaKind::Ellipse => vec![
                Point::new(0.0, 0.0),
                Point::new(w, 0.0),
                Point::new(w, h),
                Point::new(0.0, h),
            ],
            AreaKind::Triangle => vec![
                Point::new(w / 2.0, 0.0),
                Point::new(w, h),
                Point::new(0.0, h),
            ],
            AreaKind::RightTriangle => vec![
                Point::new(0.0, 0.0),
                Point::new(w, h),
                Point::new(w, 0.0),
            ],
        }
    }

    fn local_path(&self) -> BezPath {
        match self.kind {
            AreaKind::Rectangle => self.local_rect().to_path(0.1),
            AreaKind::Ellipse => Ellipse::from_rect(self.local_rect()).to_path(0.1),
            AreaKind::Triangle | AreaKind::RightTriangle => {
                let mut path = BezPath::new();
                let corners = self.polygon();
                path.move_to(corners[0]);
                for p in &corners[1..] {
                    path.line_to(*p);
                }
                path.close_path();
                path
            }
        }
    }

    fn contains_local(&self, p: Point, tolerance: f64) -> bool {
        match self.kind {
            AreaKind::Rectangle => self.local_rect().inflate(tolerance, tolerance).contains(p),
            AreaKind::Ellipse => {
                let rx = self.width / 2.0 + tolerance;
                let ry = self.height / 2.0 + tolerance;
                if rx <= 0.0 || ry <= 0.0 {
                    return false;
                }
                let dx = (p.x - self.width / 2.0) / rx;
                let dy = (p.y - self.height / 2.0) / ry;
                dx * dx + dy * dy <= 1.0
            }
            AreaKind::Triangle | AreaKind::RightTriangle => {
                let mut outline = self.polygon();
                outline.push(outline[0]);
                point_in_polygon(p, &outline)
                    || point_to_polyline_dist(p, &outline) <= tolerance
            }
        }
    }
}

/// Even-odd crossing test against a closed outline.
fn point_in_polygon(p: Point, closed: &[Point]) -> bool {
    closed.windows(2).fold(false, |inside, w| {
        let (a, b) = (w[0], w[1]);
        if (a.y > p.y) != (b.y > p.y) && p.x < (b.x - a.x) * (p.y - a.y) / (b.y - a.y) + a.x {
            !inside
        } else {
            inside
        }
    })
}

impl ShapeTrait for AreaMarker {
    fn id(&self) -> &ShapeId {
        &self.id
    }

    fn placement(&self) -> &Placement {
        &self.placement
    }

    fn bounds(&self) -> Rect {
        placed_bounds(&self.placement, &self.polygon())
    }

    fn hit_test(&self, point: Point, tolerance: f64) -> bool {
        let (local, tolerance) = self.placement.to_local(point, tolerance);
        self.contains_local(local, tolerance)
    }

    fn to_path(&self) -> BezPath {
        self.placement.affine() * self.local_path()
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
        non_negative("width", self.width)?;
        non_negative("height", self.height)
    }
}
