//! Pointer-driven editor state machine.
//!
//! [`Editor::handle`] interprets one [`PointerEvent`] at a time and routes it
//! to the drawing tool, the selection or the group transform engine,
//! depending on the current [`EditorMode`]. The remaining methods are the
//! programmatic entry points a toolbar or keyboard shortcut would call.

use crate::config::EditorConfig;
use crate::error::{EditorError, EditorResult};
use crate::events::{SceneEvent, SceneObserver};
use crate::input::{Modifiers, PointerButton, PointerEvent};
use crate::plan::{Plan, Tab, TabId};
use crate::scene::{PlanSnapshot, Scene};
use crate::selection::{Handle, HandleKind, Selection, group_handles, hit_test_handles};
use crate::shapes::{Shape, ShapeId, ShapePatch};
use crate::storage::{PlanStore, SaveManager, SaveOutcome};
use crate::token::AccessMode;
use crate::tools::DrawingTool;
use crate::transform::{Gesture, GroupTransform};
use kurbo::{Point, Rect, Vec2};

/// Interpretation of the pointer stream.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub enum EditorMode {
    #[default]
    Idle,
    /// Rubber-band selection from `origin` to `current`.
    Selecting { origin: Point, current: Point },
    /// Moving the selection; started at `origin`.
    Dragging { origin: Point },
    /// Resizing or rotating the selection with a handle.
    Transforming,
    /// Capturing a freehand stroke.
    Drawing,
}

/// Editing session over one plan.
#[derive(Debug)]
pub struct Editor {
    scene: Scene,
    selection: Selection,
    engine: GroupTransform,
    drawing: DrawingTool,
    mode: EditorMode,
    config: EditorConfig,
    clipboard: Vec<Shape>,
}

impl Editor {
    pub fn new(plan: Plan, access: AccessMode, config: EditorConfig) -> Self {
        let drawing = DrawingTool::new(
            config.stroke_color.clone(),
            config.stroke_width,
            config.min_draw_distance,
        );
        Self {
            scene: Scene::new(plan, access),
            selection: Selection::new(),
            engine: GroupTransform::new(),
            drawing,
            mode: EditorMode::Idle,
            config,
            clipboard: Vec::new(),
        }
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn plan(&self) -> &Plan {
        self.scene.plan()
    }

    pub fn active_tab(&self) -> &Tab {
        self.scene.active_tab()
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn mode(&self) -> EditorMode {
        self.mode
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn drawing_tool(&self) -> &DrawingTool {
        &self.drawing
    }

    pub fn drawing_tool_mut(&mut self) -> &mut DrawingTool {
        &mut self.drawing
    }

    pub fn subscribe(&mut self, observer: impl SceneObserver + 'static) {
        self.scene.subscribe(observer);
    }

    pub fn snapshots(&self) -> PlanSnapshot {
        self.scene.snapshots()
    }

    // --- Pointer input ---------------------------------------------------

    /// Feed one pointer event through the state machine.
    ///
    /// A gesture invalidated by a selection change ends quietly; every other
    /// failure is returned.
    pub fn handle(&mut self, event: PointerEvent) -> EditorResult<()> {
        let result = match event {
            PointerEvent::Down {
                position,
                button,
                modifiers,
            } => self.pointer_down(position, button, modifiers),
            PointerEvent::Move {
                position,
                modifiers,
            } => self.pointer_move(position, modifiers),
            PointerEvent::Up {
                position,
                modifiers,
            } => self.pointer_up(position, modifiers),
            PointerEvent::Cancel => {
                self.cancel();
                Ok(())
            }
        };
        match result {
            Err(EditorError::StaleSession) => {
                log::debug!("Gesture ended by selection change");
                self.mode = EditorMode::Idle;
                Ok(())
            }
            other => other,
        }
    }

    fn pointer_down(
        &mut self,
        position: Point,
        button: PointerButton,
        modifiers: Modifiers,
    ) -> EditorResult<()> {
        self.scene.access().require_edit("edit canvas")?;
        if self.mode != EditorMode::Idle {
            self.cancel();
        }

        if button == PointerButton::Secondary {
            let shape = self
                .active_tab()
                .shape_at(position, self.config.hit_tolerance)
                .map(|s| s.id().clone());
            self.scene
                .emit(SceneEvent::ContextMenuRequested { position, shape });
            return Ok(());
        }
        if button != PointerButton::Primary {
            return Ok(());
        }

        if self.drawing.is_enabled() {
            self.drawing.pointer_down(position);
            self.mode = EditorMode::Drawing;
            return Ok(());
        }

        if let Some(handle) = self.handle_at(position) {
            let gesture = match handle {
                HandleKind::Corner(_) => Gesture::Resize {
                    keep_aspect: modifiers.shift,
                },
                HandleKind::Rotate => Gesture::Rotate {
                    snap: modifiers.shift,
                },
            };
            return self.begin_gesture(gesture, position, EditorMode::Transforming);
        }

        let hit = self
            .active_tab()
            .shape_at(position, self.config.hit_tolerance)
            .map(|s| s.id().clone());
        match hit {
            Some(id) => {
                if modifiers.is_additive() {
                    self.selection.select(id.clone(), true);
                    self.selection_changed();
                } else if !self.selection.contains(&id) {
                    self.selection.select(id.clone(), false);
                    self.selection_changed();
                }
                if self.selection.contains(&id) {
                    self.begin_gesture(Gesture::Drag, position, EditorMode::Dragging { origin: position })?;
                }
                Ok(())
            }
            None => {
                if !modifiers.is_additive() && !self.selection.is_empty() {
                    self.selection.clear();
                    self.selection_changed();
                }
                self.mode = EditorMode::Selecting {
                    origin: position,
                    current: position,
                };
                Ok(())
            }
        }
    }

    fn begin_gesture(&mut self, gesture: Gesture, start: Point, mode: EditorMode) -> EditorResult<()> {
        let result = self.engine.begin(
            self.scene.active_tab(),
            &self.selection,
            gesture,
            start,
            self.config.rotation_snap_degrees,
        );
        match result {
            Ok(()) => {
                self.mode = mode;
                Ok(())
            }
            Err(EditorError::Locked(id)) => {
                log::debug!("Selection is locked ({}), not starting {:?}", id, gesture);
                self.mode = EditorMode::Idle;
                Ok(())
            }
            Err(e) => {
                self.mode = EditorMode::Idle;
                Err(e)
            }
        }
    }

    fn pointer_move(&mut self, position: Point, _modifiers: Modifiers) -> EditorResult<()> {
        match &mut self.mode {
            EditorMode::Idle => Ok(()),
            EditorMode::Drawing => {
                self.drawing.pointer_move(position);
                Ok(())
            }
            EditorMode::Selecting { current, .. } => {
                *current = position;
                Ok(())
            }
            EditorMode::Dragging { .. } | EditorMode::Transforming => {
                if self.engine.is_active() {
                    self.engine.update(position, self.selection.group_key())?;
                }
                Ok(())
            }
        }
    }

    fn pointer_up(&mut self, position: Point, modifiers: Modifiers) -> EditorResult<()> {
        let mode = std::mem::take(&mut self.mode);
        match mode {
            EditorMode::Idle => Ok(()),
            EditorMode::Drawing => {
                match self.drawing.pointer_up(position) {
                    Some(path) => {
                        self.scene.insert_shape(Shape::Path(path))?;
                    }
                    None => log::debug!("Stroke discarded"),
                }
                Ok(())
            }
            EditorMode::Selecting { origin, .. } => {
                let band = Rect::from_points(origin, position);
                let threshold = self.config.click_threshold;
                if band.width() < threshold && band.height() < threshold {
                    return Ok(());
                }
                let mut ids = if modifiers.is_additive() {
                    self.selection.ids().to_vec()
                } else {
                    Vec::new()
                };
                ids.extend(self.active_tab().shapes_in_rect(band));
                self.selection.select_many(ids);
                self.selection_changed();
                Ok(())
            }
            EditorMode::Dragging { origin } => {
                if (position - origin).hypot() < self.config.click_threshold {
                    self.engine.abort();
                    return Ok(());
                }
                self.finish_gesture(position)
            }
            EditorMode::Transforming => self.finish_gesture(position),
        }
    }

    fn finish_gesture(&mut self, position: Point) -> EditorResult<()> {
        if !self.engine.is_active() {
            log::debug!("Gesture was aborted before release");
            return Ok(());
        }
        let key = self.selection.group_key();
        self.engine.update(position, key)?;
        let commit = self.engine.commit(self.scene.active_tab(), key)?;
        let ids: Vec<ShapeId> = commit.shapes.iter().map(|s| s.id().clone()).collect();
        self.scene.replace_shapes(commit.shapes)?;
        if commit.grouped {
            self.scene.emit(SceneEvent::GroupTransformed {
                ids,
                delta: commit.delta,
            });
        }
        Ok(())
    }

    /// Drop any gesture or stroke in progress. Safe to call in any state.
    pub fn cancel(&mut self) {
        self.engine.abort();
        self.drawing.cancel();
        self.mode = EditorMode::Idle;
    }

    fn handle_at(&self, position: Point) -> Option<HandleKind> {
        let bounds = self.selection.bounds(self.scene.active_tab())?;
        hit_test_handles(bounds, position, self.config.handle_tolerance)
    }

    // --- Rendering support -------------------------------------------------

    /// What a renderer should draw on top of the committed tab: the
    /// transformed selection during a gesture or the stroke being drawn.
    pub fn preview(&self) -> Vec<Shape> {
        match self.mode {
            EditorMode::Drawing => self
                .drawing
                .preview()
                .map(|p| vec![Shape::Path(p)])
                .unwrap_or_default(),
            EditorMode::Dragging { .. } | EditorMode::Transforming => self.engine.preview(),
            EditorMode::Idle | EditorMode::Selecting { .. } => Vec::new(),
        }
    }

    /// The rubber band being dragged out, if any.
    pub fn selection_band(&self) -> Option<Rect> {
        match self.mode {
            EditorMode::Selecting { origin, current } => Some(Rect::from_points(origin, current)),
            _ => None,
        }
    }

    /// Handles around the selection.
    pub fn handles(&self) -> Vec<Handle> {
        self.selection
            .bounds(self.scene.active_tab())
            .map(group_handles)
            .unwrap_or_default()
    }

    // --- Selection -------------------------------------------------------

    fn selection_changed(&mut self) {
        self.engine.abort();
        let selected = self.selection.ids().to_vec();
        let primary = self.selection.primary().cloned();
        self.scene
            .emit(SceneEvent::SelectionChanged { selected, primary });
    }

    /// Drop selected ids that left the active tab.
    fn sync_selection(&mut self) {
        if self.selection.retain_existing(self.scene.active_tab()) {
            self.selection_changed();
        }
    }

    fn reset_selection(&mut self) {
        self.cancel();
        if !self.selection.is_empty() {
            self.selection.clear();
            self.selection_changed();
        }
    }

    pub fn select(&mut self, id: &ShapeId, additive: bool) -> EditorResult<()> {
        if !self.active_tab().contains(id) {
            return Err(EditorError::UnknownShape(id.clone()));
        }
        self.selection.select(id.clone(), additive);
        self.selection_changed();
        Ok(())
    }

    /// Replace the selection. Ids not on the active tab are ignored.
    pub fn select_many(&mut self, ids: impl IntoIterator<Item = ShapeId>) {
        let tab = self.scene.active_tab();
        let ids: Vec<ShapeId> = ids.into_iter().filter(|id| tab.contains(id)).collect();
        self.selection.select_many(ids);
        self.selection_changed();
    }

    /// Select every unlocked shape intersecting `rect`.
    pub fn select_in_rect(&mut self, rect: Rect) {
        let ids = self.active_tab().shapes_in_rect(rect);
        self.selection.select_many(ids);
        self.selection_changed();
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
        self.selection_changed();
    }

    // --- Drawing ---------------------------------------------------------

    /// Turn drawing mode on or off. Enabling it clears the selection.
    pub fn set_drawing_mode(&mut self, enabled: bool) -> EditorResult<()> {
        if enabled {
            self.scene.access().require_edit("draw")?;
            self.reset_selection();
        } else if self.mode == EditorMode::Drawing {
            self.mode = EditorMode::Idle;
        }
        self.drawing.set_enabled(enabled);
        Ok(())
    }

    // --- Tabs ------------------------------------------------------------

    pub fn set_active_tab(&mut self, index: usize) -> EditorResult<()> {
        if index == self.scene.active_index() {
            return self.scene.set_active_tab(index);
        }
        self.scene.set_active_tab(index)?;
        self.reset_selection();
        Ok(())
    }

    pub fn add_tab(&mut self, background_src: impl Into<String>) -> EditorResult<TabId> {
        let id = self.scene.add_tab(background_src)?;
        self.reset_selection();
        Ok(id)
    }

    pub fn clone_tab(&mut self, index: usize) -> EditorResult<TabId> {
        let id = self.scene.clone_tab(index)?;
        self.reset_selection();
        Ok(id)
    }

    pub fn move_tab(&mut self, from: usize, to: usize) -> EditorResult<()> {
        self.scene.move_tab(from, to)
    }

    pub fn delete_tab(&mut self, index: usize) -> EditorResult<Tab> {
        let active_id = self.active_tab().id().clone();
        let removed = self.scene.delete_tab(index)?;
        if removed.id() == &active_id {
            self.reset_selection();
        }
        Ok(removed)
    }

    pub fn set_background(&mut self, index: usize, src: impl Into<String>) -> EditorResult<()> {
        self.scene.set_background(index, src)
    }

    // --- Shapes ----------------------------------------------------------

    /// Place a shape on top of the active tab.
    pub fn insert_shape(&mut self, shape: Shape) -> EditorResult<ShapeId> {
        self.scene.insert_shape(shape)
    }

    /// Commit a direct edit of one shape.
    pub fn replace_shape(&mut self, shape: Shape) -> EditorResult<()> {
        self.engine.abort();
        self.scene.replace_shape(shape)
    }

    pub fn delete_selected(&mut self) -> EditorResult<Vec<Shape>> {
        let removed = self.scene.remove_shapes(self.selection.ids())?;
        self.sync_selection();
        Ok(removed)
    }

    pub fn update_selected(&mut self, patch: &ShapePatch) -> EditorResult<usize> {
        self.scene.update_shapes(self.selection.ids(), patch)
    }

    pub fn lock_selected(&mut self) -> EditorResult<()> {
        self.engine.abort();
        self.scene.set_locked(self.selection.ids(), true)
    }

    pub fn unlock_selected(&mut self) -> EditorResult<()> {
        self.scene.set_locked(self.selection.ids(), false)
    }

    /// Copy the selected shapes. Returns how many were copied.
    pub fn copy_selection(&mut self) -> usize {
        self.clipboard = self
            .selection
            .shapes(self.scene.active_tab())
            .into_iter()
            .cloned()
            .collect();
        self.clipboard.len()
    }

    /// Paste the clipboard offset from its source and select the copies.
    /// Repeated pastes keep stepping away from the original.
    pub fn paste(&mut self) -> EditorResult<Vec<ShapeId>> {
        let offset = Vec2::new(self.config.paste_offset, self.config.paste_offset);
        let ids = self.scene.paste(&self.clipboard, offset)?;
        if ids.is_empty() {
            return Ok(ids);
        }
        let tab = self.scene.active_tab();
        self.clipboard = ids.iter().filter_map(|id| tab.get(id)).cloned().collect();
        self.selection.select_many(ids.clone());
        self.selection_changed();
        Ok(ids)
    }

    pub fn bring_selected_to_front(&mut self) -> EditorResult<()> {
        let ids = self.selection.ids().to_vec();
        for id in &ids {
            self.scene.bring_to_front(id)?;
        }
        Ok(())
    }

    pub fn send_selected_to_back(&mut self) -> EditorResult<()> {
        let ids = self.selection.ids().to_vec();
        for id in ids.iter().rev() {
            self.scene.send_to_back(id)?;
        }
        Ok(())
    }

    // --- Persistence -----------------------------------------------------

    /// Save the last committed plan through `saves`. A first save adopts the
    /// tokens the store assigned.
    pub async fn save_with<S: PlanStore + ?Sized>(
        &mut self,
        saves: &SaveManager<S>,
    ) -> EditorResult<SaveOutcome> {
        self.scene.access().require_edit("save")?;
        let outcome = saves.save(self.scene.plan()).await?;
        if outcome.created {
            self.scene.adopt_saved(&outcome.plan);
        }
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventLog;
    use crate::shapes::{AreaKind, AreaMarker, IconMarker};
    use crate::storage::MemoryStorage;
    use crate::test_util::block_on;
    use std::sync::Arc;

    fn editor() -> Editor {
        Editor::new(Plan::new("Test"), AccessMode::ReadWrite, EditorConfig::default())
    }

    fn icon_at(editor: &mut Editor, x: f64, y: f64) -> ShapeId {
        editor
            .insert_shape(Shape::Icon(IconMarker::new("/icons/healer.png", Point::new(x, y), 20.0, 20.0)))
            .unwrap()
    }

    fn drag(editor: &mut Editor, from: Point, to: Point) {
        editor.handle(PointerEvent::down(from)).unwrap();
        editor.handle(PointerEvent::moved(to)).unwrap();
        editor.handle(PointerEvent::up(to)).unwrap();
    }

    #[test]
    fn test_click_selects_and_empty_click_clears() {
        let mut editor = editor();
        let a = icon_at(&mut editor, 0.0, 0.0);
        editor.handle(PointerEvent::down(Point::new(10.0, 10.0))).unwrap();
        editor.handle(PointerEvent::up(Point::new(10.0, 10.0))).unwrap();
        assert_eq!(editor.selection().ids(), &[a.clone()]);
        assert_eq!(editor.selection().primary(), Some(&a));
        assert_eq!(editor.mode(), EditorMode::Idle);

        editor.handle(PointerEvent::down(Point::new(500.0, 500.0))).unwrap();
        editor.handle(PointerEvent::up(Point::new(500.0, 500.0))).unwrap();
        assert!(editor.selection().is_empty());
    }

    #[test]
    fn test_drag_moves_shape() {
        let mut editor = editor();
        let a = icon_at(&mut editor, 0.0, 0.0);
        drag(&mut editor, Point::new(10.0, 10.0), Point::new(60.0, 30.0));
        let moved = editor.active_tab().get(&a).unwrap();
        assert_eq!(moved.placement().position(), Point::new(50.0, 20.0));
    }

    #[test]
    fn test_patch_during_drag_survives_release() {
        let mut editor = editor();
        let a = icon_at(&mut editor, 0.0, 0.0);
        editor.handle(PointerEvent::down(Point::new(10.0, 10.0))).unwrap();
        editor.handle(PointerEvent::moved(Point::new(50.0, 50.0))).unwrap();
        let patch = ShapePatch {
            stroke: Some("red".into()),
            ..ShapePatch::default()
        };
        assert_eq!(editor.update_selected(&patch).unwrap(), 1);
        editor.handle(PointerEvent::up(Point::new(50.0, 50.0))).unwrap();

        let shape = editor.active_tab().get(&a).unwrap();
        assert_eq!(shape.style().stroke, "red");
        assert_eq!(shape.placement().position(), Point::new(40.0, 40.0));
    }

    #[test]
    fn test_group_drag_emits_one_batch() {
        let mut editor = editor();
        let a = icon_at(&mut editor, 0.0, 0.0);
        let b = icon_at(&mut editor, 100.0, 100.0);
        let log = EventLog::new();
        editor.subscribe(log.clone());

        drag(&mut editor, Point::new(-10.0, -10.0), Point::new(200.0, 200.0));
        assert_eq!(editor.selection().len(), 2);
        log.take();

        editor.handle(PointerEvent::down(Point::new(10.0, 10.0))).unwrap();
        editor.handle(PointerEvent::moved(Point::new(300.0, 5.0))).unwrap();
        editor.handle(PointerEvent::moved(Point::new(20.0, 30.0))).unwrap();
        editor.handle(PointerEvent::up(Point::new(20.0, 30.0))).unwrap();

        let tab = editor.active_tab();
        assert_eq!(tab.get(&a).unwrap().placement().position(), Point::new(10.0, 20.0));
        assert_eq!(tab.get(&b).unwrap().placement().position(), Point::new(110.0, 120.0));

        let events = log.take();
        let tab_changes = events
            .iter()
            .filter(|e| matches!(e, SceneEvent::TabChanged { .. }))
            .count();
        assert_eq!(tab_changes, 1);
        assert!(events
            .iter()
            .any(|e| matches!(e, SceneEvent::GroupTransformed { ids, .. } if ids.len() == 2)));
    }

    #[test]
    fn test_rubber_band_skips_locked() {
        let mut editor = editor();
        let a = icon_at(&mut editor, 0.0, 0.0);
        let b = icon_at(&mut editor, 50.0, 0.0);
        editor.select(&b, false).unwrap();
        editor.lock_selected().unwrap();
        drag(&mut editor, Point::new(-5.0, -5.0), Point::new(100.0, 100.0));
        assert_eq!(editor.selection().ids(), &[a]);
    }

    #[test]
    fn test_locked_shape_does_not_move() {
        let mut editor = editor();
        let a = icon_at(&mut editor, 0.0, 0.0);
        editor.select(&a, false).unwrap();
        editor.lock_selected().unwrap();
        drag(&mut editor, Point::new(10.0, 10.0), Point::new(90.0, 90.0));
        assert_eq!(
            editor.active_tab().get(&a).unwrap().placement().position(),
            Point::ZERO
        );
        assert_eq!(editor.selection().ids(), &[a]);
    }

    #[test]
    fn test_drawing_mode_appends_path() {
        let mut editor = editor();
        icon_at(&mut editor, 600.0, 600.0);
        editor.set_drawing_mode(true).unwrap();
        let before = editor.active_tab().len();
        let points = [(0.0, 0.0), (10.0, 0.0), (20.0, 5.0), (30.0, 10.0), (40.0, 20.0)];
        editor.handle(PointerEvent::down(Point::new(0.0, 0.0))).unwrap();
        for (x, y) in &points[1..] {
            editor.handle(PointerEvent::moved(Point::new(*x, *y))).unwrap();
        }
        editor.handle(PointerEvent::up(Point::new(40.0, 20.0))).unwrap();

        let tab = editor.active_tab();
        assert_eq!(tab.len(), before + 1);
        let Some(Shape::Path(path)) = tab.shapes().last() else {
            panic!("expected a path on top");
        };
        assert_eq!(path.len(), 5);
        assert!(editor.selection().is_empty());
    }

    #[test]
    fn test_drawing_suppresses_selection() {
        let mut editor = editor();
        icon_at(&mut editor, 0.0, 0.0);
        editor.set_drawing_mode(true).unwrap();
        editor.handle(PointerEvent::down(Point::new(10.0, 10.0))).unwrap();
        assert_eq!(editor.mode(), EditorMode::Drawing);
        assert!(editor.selection().is_empty());
        editor.handle(PointerEvent::Cancel).unwrap();
        assert_eq!(editor.mode(), EditorMode::Idle);
        assert_eq!(editor.active_tab().len(), 1);
    }

    #[test]
    fn test_resize_handle() {
        let mut editor = editor();
        let area = editor
            .insert_shape(Shape::Area(AreaMarker::new(
                AreaKind::Rectangle,
                Point::new(100.0, 100.0),
                100.0,
                100.0,
            )))
            .unwrap();
        editor.select(&area, false).unwrap();
        // Bottom-right corner, dragged outward to double the size about the centre.
        drag(&mut editor, Point::new(200.0, 200.0), Point::new(250.0, 250.0));
        assert_eq!(
            editor.active_tab().get(&area).unwrap().bounds(),
            Rect::new(50.0, 50.0, 250.0, 250.0)
        );
    }

    #[test]
    fn test_context_menu_request() {
        let mut editor = editor();
        let a = icon_at(&mut editor, 0.0, 0.0);
        let log = EventLog::new();
        editor.subscribe(log.clone());
        editor
            .handle(PointerEvent::Down {
                position: Point::new(5.0, 5.0),
                button: PointerButton::Secondary,
                modifiers: Modifiers::NONE,
            })
            .unwrap();
        assert_eq!(
            log.take(),
            vec![SceneEvent::ContextMenuRequested {
                position: Point::new(5.0, 5.0),
                shape: Some(a),
            }]
        );
    }

    #[test]
    fn test_tab_switch_aborts_gesture() {
        let mut editor = editor();
        let a = icon_at(&mut editor, 0.0, 0.0);
        editor.add_tab("").unwrap();
        editor.set_active_tab(0).unwrap();
        editor.handle(PointerEvent::down(Point::new(5.0, 5.0))).unwrap();
        editor.handle(PointerEvent::moved(Point::new(50.0, 50.0))).unwrap();
        assert!(!editor.preview().is_empty());

        editor.set_active_tab(1).unwrap();
        assert_eq!(editor.mode(), EditorMode::Idle);
        assert!(editor.preview().is_empty());
        editor.handle(PointerEvent::up(Point::new(50.0, 50.0))).unwrap();
        editor.set_active_tab(0).unwrap();
        assert_eq!(
            editor.active_tab().get(&a).unwrap().placement().position(),
            Point::ZERO
        );
    }

    #[test]
    fn test_external_selection_change_aborts() {
        let mut editor = editor();
        let a = icon_at(&mut editor, 0.0, 0.0);
        editor.handle(PointerEvent::down(Point::new(5.0, 5.0))).unwrap();
        editor.handle(PointerEvent::moved(Point::new(50.0, 50.0))).unwrap();
        editor.clear_selection();
        editor.handle(PointerEvent::moved(Point::new(60.0, 60.0))).unwrap();
        editor.handle(PointerEvent::up(Point::new(60.0, 60.0))).unwrap();
        assert_eq!(
            editor.active_tab().get(&a).unwrap().placement().position(),
            Point::ZERO
        );
    }

    #[test]
    fn test_copy_paste_steps_offset() {
        let mut editor = editor();
        let a = icon_at(&mut editor, 0.0, 0.0);
        editor.select(&a, false).unwrap();
        assert_eq!(editor.copy_selection(), 1);
        let first = editor.paste().unwrap();
        let second = editor.paste().unwrap();
        let tab = editor.active_tab();
        assert_eq!(tab.get(&first[0]).unwrap().placement().position(), Point::new(20.0, 20.0));
        assert_eq!(tab.get(&second[0]).unwrap().placement().position(), Point::new(40.0, 40.0));
        assert_eq!(editor.selection().ids(), second.as_slice());
    }

    #[test]
    fn test_delete_selected_syncs_selection() {
        let mut editor = editor();
        let a = icon_at(&mut editor, 0.0, 0.0);
        icon_at(&mut editor, 100.0, 0.0);
        editor.select(&a, false).unwrap();
        let removed = editor.delete_selected().unwrap();
        assert_eq!(removed.len(), 1);
        assert!(editor.selection().is_empty());
        assert_eq!(editor.active_tab().len(), 1);
    }

    #[test]
    fn test_read_only_pointer_rejected() {
        let mut plan = Plan::new("Viewer");
        plan.tabs_mut()[0]
            .push(Shape::Icon(IconMarker::new("a.png", Point::ZERO, 20.0, 20.0)))
            .unwrap();
        let mut editor = Editor::new(plan, AccessMode::ReadOnly, EditorConfig::default());
        let before = editor.plan().to_json().unwrap();

        let err = editor.handle(PointerEvent::down(Point::new(5.0, 5.0))).unwrap_err();
        assert!(err.is_permission_denied());
        assert!(editor.set_drawing_mode(true).unwrap_err().is_permission_denied());
        assert!(editor.add_tab("").unwrap_err().is_permission_denied());
        assert_eq!(editor.plan().to_json().unwrap(), before);
    }

    #[test]
    fn test_first_save_adopts_tokens() {
        let mut editor = editor();
        icon_at(&mut editor, 0.0, 0.0);
        let saves = SaveManager::new(Arc::new(MemoryStorage::new()));
        let outcome = block_on(editor.save_with(&saves)).unwrap();
        assert!(outcome.created);
        assert_eq!(editor.plan().share_token(), outcome.plan.share_token());
        assert!(editor.plan().edit_token().is_some());

        let again = block_on(editor.save_with(&saves)).unwrap();
        assert!(!again.created);
        assert_eq!(again.plan.share_token(), outcome.plan.share_token());
    }
}
