//! Freehand line shape.

use super::{
    Placement, ShapeError, ShapeId, ShapeStyle, ShapeTrait, TransformDelta, finite,
    placed_bounds, point_to_polyline_dist,
};
use kurbo::{BezPath, Point, Rect};
use serde::{Deserialize, Serialize};

/// A freehand polyline. Points are relative to the placement position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FreehandPath {
    pub(crate) id: ShapeId,
    pub placement: Placement,
    /// Local points, stored on the wire as a flat `[x0, y0, x1, y1, ...]` array.
    #[serde(with = "flat_points")]
    pub points: Vec<Point>,
    pub style: ShapeStyle,
    #[serde(default)]
    pub locked: bool,
}

impl FreehandPath {
    /// Build a path from canvas points, anchored at the first point.
    pub fn from_canvas_points(points: &[Point], style: ShapeStyle) -> Self {
        let origin = points.first().copied().unwrap_or(Point::ZERO);
        Self {
            id: ShapeId::generate(),
            placement: Placement::at(origin),
            points: points.iter().map(|p| (*p - origin).to_point()).collect(),
            style,
            locked: false,
        }
    }

    /// Points in canvas coordinates.
    pub fn canvas_points(&self) -> Vec<Point> {
        let affine = self.placement.affine();
        self.points.iter().map(|p| affine * *p).collect()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

impl ShapeTrait for FreehandPath {
    fn id(&self) -> &ShapeId {
        &self.id
    }

    fn placement(&self) -> &Placement {
        &self.placement
    }

    fn bounds(&self) -> Rect {
        placed_bounds(&self.placement, &self.points)
    }

    fn hit_test(&self, point: Point, tolerance: f64) -> bool {
        let reach = tolerance + self.style.stroke_width / 2.0;
        point_to_polyline_dist(point, &self.canvas_points()) <= reach
    }

    fn to_path(&self) -> BezPath {
        let mut path = BezPath::new();
        let mut points = self.canvas_points().into_iter();
        if let Some(first) = points.next() {
            path.move_to(first);
            for p in points {
                path.line_to(p);
            }
        }
        path
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
        if self.points.is_empty() {
            return Err(ShapeError::EmptyPath);
        }
        for p in &self.points {
            finite("points", p.x)?;
            finite("points", p.y)?;
        }
        Ok(())
    }
}

mod flat_points {
    use kurbo::Point;
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(points: &[Point], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(points.iter().flat_map(|p| [p.x, p.y]))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<Point>, D::Error> {
        let flat = Vec::<f64>::deserialize(deserializer)?;
        if flat.len() % 2 != 0 {
            return Err(D::Error::custom("points must hold an even number of coordinates"));
        }
        Ok(flat.chunks_exact(2).map(|c| Point::new(c[0], c[1])).collect())
    }
}
