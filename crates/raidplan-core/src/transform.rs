//! Group transform engine.
//!
//! A drag, resize or rotate gesture over the selection snapshots the selected
//! shapes and a shared pivot when it begins. Each update derives one
//! aggregate [`TransformDelta`] from the gesture's start and current pointer
//! and composes it onto every snapshot shape. Releasing the gesture yields a
//! single batch of replacement shapes.

use crate::error::{EditorError, EditorResult};
use crate::plan::{Tab, TabId};
use crate::selection::Selection;
use crate::shapes::{Shape, ShapeId, TransformDelta};
use kurbo::{Point, Rect, Vec2};

/// Smallest scale factor a resize gesture produces on either axis.
pub const MIN_SCALE: f64 = 0.05;

/// Kind of manipulation gesture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gesture {
    Drag,
    /// Scale about the pivot; `keep_aspect` forces a uniform factor.
    Resize { keep_aspect: bool },
    /// Rotate about the pivot; `snap` rounds to the configured step.
    Rotate { snap: bool },
}

/// In-progress gesture state.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupSession {
    gesture: Gesture,
    group_key: u64,
    tab: TabId,
    originals: Vec<Shape>,
    pivot: Point,
    start: Point,
    snap_step: f64,
    delta: TransformDelta,
}

impl GroupSession {
    pub fn gesture(&self) -> Gesture {
        self.gesture
    }

    pub fn pivot(&self) -> Point {
        self.pivot
    }

    pub fn delta(&self) -> &TransformDelta {
        &self.delta
    }

    /// Snapshot shapes as they were when the gesture began.
    pub fn originals(&self) -> &[Shape] {
        &self.originals
    }

    /// Whether more than one shape takes part.
    pub fn is_group(&self) -> bool {
        self.originals.len() > 1
    }

    fn delta_for(&self, pointer: Point) -> TransformDelta {
        let identity = TransformDelta::identity(self.pivot);
        match self.gesture {
            Gesture::Drag => TransformDelta {
                translation: pointer - self.start,
                ..identity
            },
            Gesture::Resize { keep_aspect } => {
                let from = self.start - self.pivot;
                let to = pointer - self.pivot;
                let mut scale = Vec2::new(axis_scale(from.x, to.x), axis_scale(from.y, to.y));
                if keep_aspect {
                    let uniform = scale.x.max(scale.y);
                    scale = Vec2::new(uniform, uniform);
                }
                TransformDelta { scale, ..identity }
            }
            Gesture::Rotate { snap } => {
                let swept = (pointer - self.pivot).atan2() - (self.start - self.pivot).atan2();
                let mut degrees = normalize_degrees(swept.to_degrees());
                if snap && self.snap_step > 0.0 {
                    degrees = (degrees / self.snap_step).round() * self.snap_step;
                }
                TransformDelta {
                    rotation: degrees,
                    ..identity
                }
            }
        }
    }
}

fn axis_scale(from: f64, to: f64) -> f64 {
    if from.abs() < 1e-6 {
        1.0
    } else {
        (to / from).max(MIN_SCALE)
    }
}

/// Map an angle into (-180, 180].
fn normalize_degrees(degrees: f64) -> f64 {
    let d = degrees % 360.0;
    if d > 180.0 {
        d - 360.0
    } else if d <= -180.0 {
        d + 360.0
    } else {
        d
    }
}

/// Engine state.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum EngineState {
    #[default]
    Idle,
    Active(GroupSession),
    Committed,
    Aborted,
}

/// Result of committing a gesture.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupCommit {
    /// Replacement shapes, in z-order.
    pub shapes: Vec<Shape>,
    pub delta: TransformDelta,
    /// Whether the gesture moved more than one shape.
    pub grouped: bool,
}

/// Turns a gesture over the selection into one aggregate transform.
#[derive(Debug, Default)]
pub struct GroupTransform {
    state: EngineState,
}

impl GroupTransform {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &EngineState {
        &self.state
    }

    pub fn is_active(&self) -> bool {
        matches!(self.state, EngineState::Active(_))
    }

    pub fn session(&self) -> Option<&GroupSession> {
        match &self.state {
            EngineState::Active(session) => Some(session),
            _ => None,
        }
    }

    /// Start a gesture over the selected, unlocked shapes of `tab`.
    ///
    /// An active session is aborted first.
    pub fn begin(
        &mut self,
        tab: &Tab,
        selection: &Selection,
        gesture: Gesture,
        start: Point,
        snap_step: f64,
    ) -> EditorResult<()> {
        self.abort();
        let selected = selection.shapes(tab);
        if selected.is_empty() {
            return Err(EditorError::NothingSelected);
        }
        let originals: Vec<Shape> = selected
            .iter()
            .filter(|s| !s.is_locked())
            .map(|s| (*s).clone())
            .collect();
        if originals.is_empty() {
            return Err(EditorError::Locked(selected[0].id().clone()));
        }
        let pivot = originals
            .iter()
            .map(Shape::bounds)
            .reduce(|a, b| a.union(b))
            .unwrap_or(Rect::ZERO)
            .center();

        log::debug!(
            "Begin {:?} over {} shapes (pivot {:?}, key {})",
            gesture,
            originals.len(),
            pivot,
            selection.group_key()
        );
        self.state = EngineState::Active(GroupSession {
            gesture,
            group_key: selection.group_key(),
            tab: tab.id().clone(),
            originals,
            pivot,
            start,
            snap_step,
            delta: TransformDelta::identity(pivot),
        });
        Ok(())
    }

    /// Recompute the delta for the current pointer position.
    pub fn update(&mut self, pointer: Point, group_key: u64) -> EditorResult<TransformDelta> {
        let session = self.check(group_key)?;
        session.delta = session.delta_for(pointer);
        Ok(session.delta)
    }

    /// Set the delta directly, for hosts that report transforms numerically.
    pub fn set_delta(&mut self, delta: TransformDelta, group_key: u64) -> EditorResult<()> {
        let session = self.check(group_key)?;
        session.delta = delta;
        Ok(())
    }

    /// Snapshot shapes with the current delta applied. Empty when idle.
    pub fn preview(&self) -> Vec<Shape> {
        self.session()
            .map(|s| s.originals.iter().map(|o| o.transformed(&s.delta)).collect())
            .unwrap_or_default()
    }

    /// Finish the gesture, producing one batch of replacement shapes.
    ///
    /// Only placements come from the snapshot; every other property is taken
    /// from the shape as it is now on `tab`. Snapshot shapes no longer on
    /// `tab`, or locked since the gesture began, are discarded. A session begun on a different tab is aborted.
    pub fn commit(&mut self, tab: &Tab, group_key: u64) -> EditorResult<GroupCommit> {
        self.check(group_key)?;
        let session = match std::mem::replace(&mut self.state, EngineState::Committed) {
            EngineState::Active(session) => session,
            other => {
                self.state = other;
                return Err(EditorError::NoSession);
            }
        };
        if &session.tab != tab.id() {
            log::warn!("Gesture began on tab {} but commit targets {}", session.tab, tab.id());
            self.state = EngineState::Aborted;
            return Err(EditorError::StaleSession);
        }

        let grouped = session.is_group();
        let shapes: Vec<Shape> = session
            .originals
            .iter()
            .filter_map(|original| {
                let current = tab.get(original.id()).filter(|s| !s.is_locked())?;
                Some(current.with_placement(session.delta.apply(original.placement())))
            })
            .collect();
        let dropped = session.originals.len() - shapes.len();
        if dropped > 0 {
            log::warn!("Discarded {} stale shapes from gesture commit", dropped);
        }
        log::debug!("Committed {:?} over {} shapes", session.gesture, shapes.len());
        Ok(GroupCommit {
            shapes,
            delta: session.delta,
            grouped,
        })
    }

    /// Abort an active session. Safe to call in any state.
    pub fn abort(&mut self) -> bool {
        if self.is_active() {
            log::debug!("Gesture aborted");
            self.state = EngineState::Aborted;
            true
        } else {
            false
        }
    }

    fn check(&mut self, group_key: u64) -> EditorResult<&mut GroupSession> {
        let stale = matches!(&self.state, EngineState::Active(s) if s.group_key != group_key);
        if stale {
            log::warn!("Selection changed during gesture, aborting");
            self.state = EngineState::Aborted;
            return Err(EditorError::StaleSession);
        }
        match &mut self.state {
            EngineState::Active(session) => Ok(session),
            _ => Err(EditorError::NoSession),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shapes::{AreaKind, AreaMarker, IconMarker};

    fn tab_with_two() -> (Tab, ShapeId, ShapeId) {
        let mut tab = Tab::new("");
        let a = Shape::Icon(IconMarker::new("a.png", Point::new(0.0, 0.0), 20.0, 20.0));
        let b = Shape::Area(AreaMarker::new(AreaKind::Rectangle, Point::new(80.0, 80.0), 20.0, 20.0));
        let (a_id, b_id) = (a.id().clone(), b.id().clone());
        tab.push(a).unwrap();
        tab.push(b).unwrap();
        (tab, a_id, b_id)
    }

    fn select_both(a: &ShapeId, b: &ShapeId) -> Selection {
        let mut selection = Selection::new();
        selection.select_many([a.clone(), b.clone()]);
        selection
    }

    #[test]
    fn test_pivot_is_union_center() {
        let (tab, a, b) = tab_with_two();
        let selection = select_both(&a, &b);
        let mut engine = GroupTransform::new();
        engine
            .begin(&tab, &selection, Gesture::Drag, Point::ZERO, 15.0)
            .unwrap();
        assert_eq!(engine.session().unwrap().pivot(), Point::new(50.0, 50.0));
        assert!(engine.session().unwrap().is_group());
    }

    #[test]
    fn test_drag_depends_only_on_endpoints() {
        let (tab, a, b) = tab_with_two();
        let selection = select_both(&a, &b);
        let key = selection.group_key();
        let mut engine = GroupTransform::new();
        engine
            .begin(&tab, &selection, Gesture::Drag, Point::new(10.0, 10.0), 15.0)
            .unwrap();
        for p in [Point::new(400.0, -3.0), Point::new(11.0, 90.0), Point::new(17.0, 13.0)] {
            engine.update(p, key).unwrap();
        }
        let commit = engine.commit(&tab, key).unwrap();
        assert!(commit.grouped);
        assert_eq!(commit.shapes[0].placement().position(), Point::new(7.0, 3.0));
        assert_eq!(commit.shapes[1].placement().position(), Point::new(87.0, 83.0));
        assert_eq!(engine.state(), &EngineState::Committed);
    }

    #[test]
    fn test_resize_about_pivot() {
        let (tab, a, b) = tab_with_two();
        let selection = select_both(&a, &b);
        let key = selection.group_key();
        let mut engine = GroupTransform::new();
        engine
            .begin(
                &tab,
                &selection,
                Gesture::Resize { keep_aspect: true },
                Point::new(100.0, 100.0),
                15.0,
            )
            .unwrap();
        let delta = engine.update(Point::new(150.0, 120.0), key).unwrap();
        assert_eq!(delta.scale, Vec2::new(2.0, 2.0));
        let preview = engine.preview();
        assert_eq!(preview[0].placement().position(), Point::new(-50.0, -50.0));
        assert_eq!(preview[1].bounds(), Rect::new(110.0, 110.0, 150.0, 150.0));
    }

    #[test]
    fn test_resize_never_collapses() {
        let (tab, a, b) = tab_with_two();
        let selection = select_both(&a, &b);
        let key = selection.group_key();
        let mut engine = GroupTransform::new();
        engine
            .begin(
                &tab,
                &selection,
                Gesture::Resize { keep_aspect: false },
                Point::new(100.0, 100.0),
                15.0,
            )
            .unwrap();
        let delta = engine.update(Point::new(50.0, 0.0), key).unwrap();
        assert_eq!(delta.scale, Vec2::new(MIN_SCALE, MIN_SCALE));
    }

    #[test]
    fn test_rotate_snaps() {
        let (tab, a, b) = tab_with_two();
        let selection = select_both(&a, &b);
        let key = selection.group_key();
        let mut engine = GroupTransform::new();
        engine
            .begin(&tab, &selection, Gesture::Rotate { snap: true }, Point::new(100.0, 50.0), 15.0)
            .unwrap();
        // 80 degrees clockwise around (50, 50) snaps to 75.
        let angle = 80f64.to_radians();
        let pointer = Point::new(50.0 + 50.0 * angle.cos(), 50.0 + 50.0 * angle.sin());
        let delta = engine.update(pointer, key).unwrap();
        assert!((delta.rotation - 75.0).abs() < 1e-9);
        let preview = engine.preview();
        assert!((preview[0].placement().rotation - 75.0).abs() < 1e-9);
    }

    #[test]
    fn test_selection_change_aborts() {
        let (tab, a, b) = tab_with_two();
        let mut selection = select_both(&a, &b);
        let mut engine = GroupTransform::new();
        engine
            .begin(&tab, &selection, Gesture::Drag, Point::ZERO, 15.0)
            .unwrap();
        selection.clear();
        assert!(matches!(
            engine.update(Point::new(5.0, 5.0), selection.group_key()),
            Err(EditorError::StaleSession)
        ));
        assert_eq!(engine.state(), &EngineState::Aborted);
        assert!(engine.preview().is_empty());
        assert!(matches!(
            engine.commit(&tab, selection.group_key()),
            Err(EditorError::NoSession)
        ));
    }

    #[test]
    fn test_abort_is_idempotent() {
        let (tab, a, b) = tab_with_two();
        let selection = select_both(&a, &b);
        let mut engine = GroupTransform::new();
        assert!(!engine.abort());
        engine
            .begin(&tab, &selection, Gesture::Drag, Point::ZERO, 15.0)
            .unwrap();
        assert!(engine.abort());
        assert!(!engine.abort());
        assert_eq!(engine.state(), &EngineState::Aborted);
    }

    #[test]
    fn test_commit_discards_missing_shapes() {
        let (mut tab, a, b) = tab_with_two();
        let selection = select_both(&a, &b);
        let key = selection.group_key();
        let mut engine = GroupTransform::new();
        engine
            .begin(&tab, &selection, Gesture::Drag, Point::ZERO, 15.0)
            .unwrap();
        engine.update(Point::new(1.0, 1.0), key).unwrap();
        tab.remove(&[b].into_iter().collect());
        let commit = engine.commit(&tab, key).unwrap();
        assert_eq!(commit.shapes.len(), 1);
        assert_eq!(commit.shapes[0].id(), &a);
    }

    #[test]
    fn test_locked_shapes_stay_put() {
        let (mut tab, a, b) = tab_with_two();
        tab.get_mut(&a).unwrap().set_locked(true);
        let selection = select_both(&a, &b);
        let mut engine = GroupTransform::new();
        engine
            .begin(&tab, &selection, Gesture::Drag, Point::ZERO, 15.0)
            .unwrap();
        assert_eq!(engine.session().unwrap().originals().len(), 1);

        tab.get_mut(&b).unwrap().set_locked(true);
        assert!(matches!(
            engine.begin(&tab, &selection, Gesture::Drag, Point::ZERO, 15.0),
            Err(EditorError::Locked(_))
        ));
    }

    #[test]
    fn test_commit_keeps_current_properties() {
        let (mut tab, a, b) = tab_with_two();
        let selection = select_both(&a, &b);
        let key = selection.group_key();
        let mut engine = GroupTransform::new();
        engine
            .begin(&tab, &selection, Gesture::Drag, Point::ZERO, 15.0)
            .unwrap();
        engine.update(Point::new(5.0, 5.0), key).unwrap();
        tab.get_mut(&a).unwrap().style_mut().stroke = "red".into();
        tab.get_mut(&b).unwrap().set_locked(true);

        let commit = engine.commit(&tab, key).unwrap();
        assert_eq!(commit.shapes.len(), 1);
        assert_eq!(commit.shapes[0].style().stroke, "red");
        assert_eq!(commit.shapes[0].placement().position(), Point::new(5.0, 5.0));
    }

    #[test]
    fn test_group_rotation_keeps_spacing_and_own_rotation() {
        let mut tab = Tab::new("");
        let mut a = Shape::Icon(IconMarker::new("a.png", Point::new(10.0, 20.0), 20.0, 20.0));
        let mut b = Shape::Area(AreaMarker::new(AreaKind::Rectangle, Point::new(150.0, 60.0), 40.0, 10.0));
        if let Shape::Icon(icon) = &mut a {
            icon.placement.rotation = 30.0;
        }
        if let Shape::Area(area) = &mut b {
            area.placement.rotation = -10.0;
        }
        let before = [*a.placement(), *b.placement()];
        let pivot = a.bounds().union(b.bounds()).center();
        let (a_id, b_id) = (a.id().clone(), b.id().clone());
        tab.push(a).unwrap();
        tab.push(b).unwrap();

        let selection = select_both(&a_id, &b_id);
        let key = selection.group_key();
        let mut engine = GroupTransform::new();
        engine
            .begin(
                &tab,
                &selection,
                Gesture::Rotate { snap: true },
                pivot + Vec2::new(100.0, 0.0),
                15.0,
            )
            .unwrap();
        assert_eq!(engine.session().unwrap().pivot(), pivot);
        let delta = engine.update(pivot + Vec2::new(0.0, 100.0), key).unwrap();
        assert_eq!(delta.rotation, 90.0);

        let commit = engine.commit(&tab, key).unwrap();
        let after: Vec<_> = commit.shapes.iter().map(|s| *s.placement()).collect();
        for (old, new) in before.iter().zip(&after) {
            assert!((new.rotation - (old.rotation + 90.0)).abs() < 1e-9);
            // A quarter turn about the pivot maps (dx, dy) to (-dy, dx).
            let offset = old.position() - pivot;
            let expected = pivot + Vec2::new(-offset.y, offset.x);
            assert!((new.position() - expected).hypot() < 1e-9);
        }
        let spacing_before = (before[0].position() - before[1].position()).hypot();
        let spacing_after = (after[0].position() - after[1].position()).hypot();
        assert!((spacing_before - spacing_after).abs() < 1e-9);
    }

    #[test]
    fn test_normalize_degrees() {
        assert_eq!(normalize_degrees(270.0), -90.0);
        assert_eq!(normalize_degrees(-270.0), 90.0);
        assert_eq!(normalize_degrees(180.0), 180.0);
    }
}
