//! Selection state and group manipulation handles.

use crate::plan::Tab;
use crate::shapes::{Shape, ShapeId};
use kurbo::{Point, Rect};
use serde::{Deserialize, Serialize};

/// Distance of the rotate handle above the selection's top edge, in canvas units.
pub const ROTATE_HANDLE_OFFSET: f64 = 25.0;

/// Type of selection handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HandleKind {
    /// Corner handle; dragging it resizes about the selection centre.
    Corner(Corner),
    /// Rotation handle above the selection.
    Rotate,
}

/// Corner positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Corner {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

/// A selection handle with its position and type.
#[derive(Debug, Clone, Copy)]
pub struct Handle {
    /// Position in canvas coordinates.
    pub position: Point,
    pub kind: HandleKind,
}

impl Handle {
    pub fn new(position: Point, kind: HandleKind) -> Self {
        Self { position, kind }
    }

    /// Check if a point (in canvas coordinates) hits this handle.
    pub fn hit_test(&self, point: Point, tolerance: f64) -> bool {
        (point - self.position).hypot2() <= tolerance * tolerance
    }
}

/// Corner and rotate handles around a selection's bounding box.
pub fn group_handles(bounds: Rect) -> Vec<Handle> {
    vec![
        Handle::new(Point::new(bounds.x0, bounds.y0), HandleKind::Corner(Corner::TopLeft)),
        Handle::new(Point::new(bounds.x1, bounds.y0), HandleKind::Corner(Corner::TopRight)),
        Handle::new(Point::new(bounds.x0, bounds.y1), HandleKind::Corner(Corner::BottomLeft)),
        Handle::new(Point::new(bounds.x1, bounds.y1), HandleKind::Corner(Corner::BottomRight)),
        Handle::new(
            Point::new(bounds.center().x, bounds.y0 - ROTATE_HANDLE_OFFSET),
            HandleKind::Rotate,
        ),
    ]
}

/// The handle under `point`, if any.
pub fn hit_test_handles(bounds: Rect, point: Point, tolerance: f64) -> Option<HandleKind> {
    group_handles(bounds)
        .into_iter()
        .find(|h| h.hit_test(point, tolerance))
        .map(|h| h.kind)
}

/// Selected shape ids plus the primary ("last clicked") shape.
///
/// Every change bumps [`group_key`](Selection::group_key); gesture sessions
/// compare it to detect that the selection they started with is gone.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Selection {
    /// Selected ids in selection order, without repeats.
    selected: Vec<ShapeId>,
    primary: Option<ShapeId>,
    group_key: u64,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ids(&self) -> &[ShapeId] {
        &self.selected
    }

    pub fn primary(&self) -> Option<&ShapeId> {
        self.primary.as_ref()
    }

    pub fn group_key(&self) -> u64 {
        self.group_key
    }

    pub fn contains(&self, id: &ShapeId) -> bool {
        self.selected.contains(id)
    }

    pub fn len(&self) -> usize {
        self.selected.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    /// Click selection. Non-additive replaces the selection with `id`;
    /// additive toggles its membership.
    pub fn select(&mut self, id: ShapeId, additive: bool) {
        if !additive {
            self.selected = vec![id.clone()];
            self.primary = Some(id);
        } else if let Some(index) = self.selected.iter().position(|s| *s == id) {
            self.selected.remove(index);
            if self.primary.as_ref() == Some(&id) {
                self.primary = None;
            }
        } else {
            self.selected.push(id.clone());
            self.primary = Some(id);
        }
        self.bump();
    }

    /// Replace the selection wholesale. The primary shape is unset.
    pub fn select_many(&mut self, ids: impl IntoIterator<Item = ShapeId>) {
        self.selected.clear();
        for id in ids {
            if !self.selected.contains(&id) {
                self.selected.push(id);
            }
        }
        self.primary = None;
        self.bump();
    }

    pub fn clear(&mut self) {
        self.selected.clear();
        self.primary = None;
        self.bump();
    }

    /// Drop ids no longer on `tab`. Returns true if anything was dropped.
    pub fn retain_existing(&mut self, tab: &Tab) -> bool {
        let before = self.selected.len();
        self.selected.retain(|id| tab.contains(id));
        if self.selected.len() == before {
            return false;
        }
        if self.primary.as_ref().is_some_and(|p| !self.selected.contains(p)) {
            self.primary = None;
        }
        self.bump();
        true
    }

    /// Selected shapes present on `tab`, in z-order.
    pub fn shapes<'a>(&self, tab: &'a Tab) -> Vec<&'a Shape> {
        tab.shapes()
            .iter()
            .filter(|s| self.contains(s.id()))
            .collect()
    }

    /// Union of the selected shapes' bounds.
    pub fn bounds(&self, tab: &Tab) -> Option<Rect> {
        self.shapes(tab)
            .into_iter()
            .map(Shape::bounds)
            .reduce(|a, b| a.union(b))
    }

    fn bump(&mut self) {
        self.group_key += 1;
        log::debug!(
            "Selection changed: {} selected (key {})",
            self.selected.len(),
            self.group_key
        );
    }
}
