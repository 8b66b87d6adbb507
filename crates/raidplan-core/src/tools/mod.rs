//! Freehand drawing tool.

use crate::shapes::{FreehandPath, ShapeStyle};
use kurbo::Point;

/// State of a drawing interaction.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum DrawState {
    /// Waiting for pointer-down.
    #[default]
    Idle,
    /// A stroke is in progress.
    Drawing {
        /// Accumulated points in canvas coordinates.
        points: Vec<Point>,
    },
}

/// Captures pointer input into freehand paths while drawing mode is on.
#[derive(Debug, Clone)]
pub struct DrawingTool {
    enabled: bool,
    /// Stroke color copied into each new path.
    pub color: String,
    /// Stroke width copied into each new path.
    pub width: f64,
    /// Points closer than this to the previous point are dropped.
    pub min_distance: f64,
    state: DrawState,
}

impl Default for DrawingTool {
    fn default() -> Self {
        Self {
            enabled: false,
            color: "white".to_string(),
            width: 2.0,
            min_distance: 2.0,
            state: DrawState::Idle,
        }
    }
}

impl DrawingTool {
    pub fn new(color: impl Into<String>, width: f64, min_distance: f64) -> Self {
        Self {
            color: color.into(),
            width,
            min_distance,
            ..Self::default()
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Toggle drawing mode. Turning it off discards a stroke in progress.
    pub fn set_enabled(&mut self, enabled: bool) {
        if !enabled {
            self.cancel();
        }
        self.enabled = enabled;
    }

    pub fn state(&self) -> &DrawState {
        &self.state
    }

    pub fn is_drawing(&self) -> bool {
        matches!(self.state, DrawState::Drawing { .. })
    }

    /// Start a stroke with one point. Ignored unless drawing mode is on.
    pub fn pointer_down(&mut self, point: Point) -> bool {
        if !self.enabled {
            return false;
        }
        self.state = DrawState::Drawing {
            points: vec![point],
        };
        true
    }

    /// Append a point if it is far enough from the last one.
    pub fn pointer_move(&mut self, point: Point) -> bool {
        let DrawState::Drawing { points } = &mut self.state else {
            return false;
        };
        match points.last() {
            Some(last) if (point - *last).hypot() < self.min_distance => false,
            _ => {
                points.push(point);
                true
            }
        }
    }

    /// Finish the stroke. A stroke that never left its first point yields nothing.
    pub fn pointer_up(&mut self, point: Point) -> Option<FreehandPath> {
        self.pointer_move(point);
        let DrawState::Drawing { points } = std::mem::take(&mut self.state) else {
            return None;
        };
        if points.len() < 2 {
            log::debug!("Discarding single-point stroke");
            return None;
        }
        Some(FreehandPath::from_canvas_points(
            &points,
            ShapeStyle::stroke(self.color.clone(), self.width),
        ))
    }

    /// Drop the stroke in progress. Returns true if there was one.
    pub fn cancel(&mut self) -> bool {
        let was_drawing = self.is_drawing();
        self.state = DrawState::Idle;
        was_drawing
    }

    /// The stroke in progress as a path, for live rendering.
    pub fn preview(&self) -> Option<FreehandPath> {
        match &self.state {
            DrawState::Drawing { points } => Some(FreehandPath::from_canvas_points(
                points,
                ShapeStyle::stroke(self.color.clone(), self.width),
            )),
            DrawState::Idle => None,
        }
    }
}
