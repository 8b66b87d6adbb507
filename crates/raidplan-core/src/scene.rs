//! Tab manager and shape mutation entry points.
//!
//! The [`Scene`] owns a [`Plan`] and tracks which tab is active. Every
//! mutation checks the scene's [`AccessMode`] first, applies completely or not
//! at all, publishes a fresh snapshot for read-only consumers and notifies
//! observers.

use crate::error::{EditorError, EditorResult};
use crate::events::{SceneEvent, SceneObserver};
use crate::plan::{Plan, Tab, TabId};
use crate::shapes::{Shape, ShapeId, ShapePatch};
use crate::token::AccessMode;
use kurbo::Vec2;
use std::collections::HashSet;
use std::sync::{Arc, RwLock};

/// Read handle on the last committed plan state.
///
/// Cloning is cheap and every clone observes the same publications.
#[derive(Debug, Clone)]
pub struct PlanSnapshot {
    published: Arc<RwLock<Arc<Plan>>>,
}

impl PlanSnapshot {
    /// The most recently committed plan.
    pub fn latest(&self) -> Arc<Plan> {
        match self.published.read() {
            Ok(plan) => Arc::clone(&plan),
            Err(poisoned) => Arc::clone(&poisoned.into_inner()),
        }
    }
}

/// An editable plan with an active tab.
pub struct Scene {
    plan: Plan,
    active: usize,
    access: AccessMode,
    observers: Vec<Box<dyn SceneObserver>>,
    published: Arc<RwLock<Arc<Plan>>>,
}

impl std::fmt::Debug for Scene {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scene")
            .field("plan", &self.plan)
            .field("active", &self.active)
            .field("access", &self.access)
            .field("observers", &self.observers.len())
            .finish()
    }
}

impl Scene {
    pub fn new(plan: Plan, access: AccessMode) -> Self {
        let published = Arc::new(RwLock::new(Arc::new(plan.clone())));
        Self {
            plan,
            active: 0,
            access,
            observers: Vec::new(),
            published,
        }
    }

    pub fn plan(&self) -> &Plan {
        &self.plan
    }

    pub fn access(&self) -> AccessMode {
        self.access
    }

    pub fn active_index(&self) -> usize {
        self.active
    }

    pub fn active_tab(&self) -> &Tab {
        // The plan always holds at least one tab and `active` is kept in range.
        &self.plan.tabs()[self.active]
    }

    pub fn tab_count(&self) -> usize {
        self.plan.tab_count()
    }

    /// Register an observer for scene events.
    pub fn subscribe(&mut self, observer: impl SceneObserver + 'static) {
        self.observers.push(Box::new(observer));
    }

    /// A handle that always yields the last committed plan.
    pub fn snapshots(&self) -> PlanSnapshot {
        PlanSnapshot {
            published: Arc::clone(&self.published),
        }
    }

    pub(crate) fn emit(&mut self, event: SceneEvent) {
        for observer in &mut self.observers {
            observer.on_event(&event);
        }
    }

    fn require_edit(&self, operation: &'static str) -> EditorResult<()> {
        self.access.require_edit(operation)
    }

    fn check_index(&self, index: usize) -> EditorResult<()> {
        let len = self.plan.tab_count();
        if index >= len {
            return Err(EditorError::Range { index, len });
        }
        Ok(())
    }

    fn publish(&self) {
        let snapshot = Arc::new(self.plan.clone());
        match self.published.write() {
            Ok(mut published) => *published = snapshot,
            Err(poisoned) => *poisoned.into_inner() = snapshot,
        }
    }

    fn commit_tab(&mut self, index: usize) {
        self.publish();
        let tab = self.plan.tabs()[index].clone();
        self.emit(SceneEvent::TabChanged { index, tab });
    }

    fn commit_structure(&mut self) {
        self.publish();
        let tab_ids = self.plan.tabs().iter().map(|t| t.id().clone()).collect();
        self.emit(SceneEvent::TabsChanged { tab_ids });
    }

    fn active_tab_mut(&mut self) -> &mut Tab {
        let index = self.active;
        &mut self.plan.tabs_mut()[index]
    }

    /// Switch the active tab. Allowed under read-only access.
    pub fn set_active_tab(&mut self, index: usize) -> EditorResult<()> {
        self.check_index(index)?;
        if index != self.active {
            self.active = index;
            log::debug!("Active tab is now {}", index);
            self.emit(SceneEvent::ActiveTabChanged { index });
        }
        Ok(())
    }

    /// Move the tab at `from` so it ends up at `to`; the others keep their
    /// relative order. The active tab stays active wherever it lands.
    pub fn move_tab(&mut self, from: usize, to: usize) -> EditorResult<()> {
        self.require_edit("move tab")?;
        self.check_index(from)?;
        self.check_index(to)?;
        if from == to {
            return Ok(());
        }
        let active_id = self.active_tab().id().clone();
        let tabs = self.plan.tabs_mut();
        let tab = tabs.remove(from);
        tabs.insert(to, tab);
        log::info!("Moved tab {} to {}", from, to);

        self.commit_structure();
        self.follow_active(&active_id);
        Ok(())
    }

    /// Insert a copy of the tab at `index` directly after it and make it
    /// active. Shapes get fresh ids.
    pub fn clone_tab(&mut self, index: usize) -> EditorResult<TabId> {
        self.require_edit("clone tab")?;
        self.check_index(index)?;
        let copy = self.plan.tabs()[index].duplicate();
        let id = copy.id().clone();
        self.plan.tabs_mut().insert(index + 1, copy);
        log::info!("Cloned tab {} as {}", index, id);

        self.commit_structure();
        self.activate(index + 1);
        Ok(id)
    }

    /// Delete the tab at `index`. The plan's only tab cannot be deleted.
    pub fn delete_tab(&mut self, index: usize) -> EditorResult<Tab> {
        self.require_edit("delete tab")?;
        self.check_index(index)?;
        if self.plan.tab_count() <= 1 {
            return Err(EditorError::OnlyTab);
        }
        let removed = self.plan.tabs_mut().remove(index);
        log::info!("Deleted tab {} ({})", index, removed.id());

        let mut active = self.active;
        if index < active {
            active -= 1;
        }
        let active = active.min(self.plan.tab_count() - 1);
        let moved = active != self.active || index == self.active;
        self.active = active;

        self.commit_structure();
        if moved {
            self.emit(SceneEvent::ActiveTabChanged { index: active });
        }
        Ok(removed)
    }

    /// Append a blank tab and make it active. The new tab inherits the
    /// active tab's boss.
    pub fn add_tab(&mut self, background_src: impl Into<String>) -> EditorResult<TabId> {
        self.require_edit("add tab")?;
        let mut tab = Tab::new(background_src);
        tab.set_boss(self.active_tab().boss().map(str::to_string));
        let id = tab.id().clone();
        self.plan.tabs_mut().push(tab);
        log::info!("Added tab {}", id);

        self.commit_structure();
        self.activate(self.plan.tab_count() - 1);
        Ok(id)
    }

    pub fn set_background(&mut self, index: usize, src: impl Into<String>) -> EditorResult<()> {
        self.require_edit("set background")?;
        self.check_index(index)?;
        self.plan.tabs_mut()[index].set_background(src.into());
        self.commit_tab(index);
        Ok(())
    }

    /// Append a shape to the active tab.
    pub fn insert_shape(&mut self, shape: Shape) -> EditorResult<ShapeId> {
        self.require_edit("insert shape")?;
        let id = shape.id().clone();
        self.active_tab_mut()
            .push(shape)
            .map_err(|e| EditorError::validation(id.as_str(), e))?;
        log::debug!("Inserted shape {}", id);
        self.commit_tab(self.active);
        Ok(id)
    }

    /// Replace one shape on the active tab in place.
    pub fn replace_shape(&mut self, shape: Shape) -> EditorResult<()> {
        self.require_edit("replace shape")?;
        if !self.active_tab().contains(shape.id()) {
            return Err(EditorError::UnknownShape(shape.id().clone()));
        }
        self.replace_batch(vec![shape])?;
        Ok(())
    }

    /// Replace several shapes as one committed change.
    ///
    /// Every shape is validated before any is applied. Shapes no longer on
    /// the active tab are skipped. Returns the number replaced.
    pub fn replace_shapes(&mut self, shapes: Vec<Shape>) -> EditorResult<usize> {
        self.require_edit("replace shapes")?;
        self.replace_batch(shapes)
    }

    fn replace_batch(&mut self, shapes: Vec<Shape>) -> EditorResult<usize> {
        for shape in &shapes {
            shape
                .validate()
                .map_err(|e| EditorError::validation(shape.id().as_str(), e))?;
        }
        let tab = self.active_tab_mut();
        let mut replaced = 0;
        for shape in shapes {
            let id = shape.id().clone();
            if tab.replace(shape) {
                replaced += 1;
            } else {
                log::warn!("Skipping replacement of missing shape {}", id);
            }
        }
        if replaced > 0 {
            self.commit_tab(self.active);
        }
        Ok(replaced)
    }

    /// Remove shapes from the active tab, returning them in z-order.
    pub fn remove_shapes(&mut self, ids: &[ShapeId]) -> EditorResult<Vec<Shape>> {
        self.require_edit("remove shapes")?;
        let ids: HashSet<ShapeId> = ids.iter().cloned().collect();
        let removed = self.active_tab_mut().remove(&ids);
        if !removed.is_empty() {
            log::debug!("Removed {} shapes", removed.len());
            self.commit_tab(self.active);
        }
        Ok(removed)
    }

    /// Apply a property patch to shapes on the active tab.
    ///
    /// Fails without changes if any id is missing or any patched shape is
    /// invalid.
    pub fn update_shapes(&mut self, ids: &[ShapeId], patch: &ShapePatch) -> EditorResult<usize> {
        self.require_edit("update shapes")?;
        let tab = self.active_tab();
        let mut patched = Vec::with_capacity(ids.len());
        for id in ids {
            let shape = tab
                .get(id)
                .ok_or_else(|| EditorError::UnknownShape(id.clone()))?;
            patched.push(patch.applied_to(shape));
        }
        self.replace_batch(patched)
    }

    /// Lock or unlock shapes on the active tab.
    pub fn set_locked(&mut self, ids: &[ShapeId], locked: bool) -> EditorResult<()> {
        self.require_edit(if locked { "lock shapes" } else { "unlock shapes" })?;
        let tab = self.active_tab();
        if let Some(missing) = ids.iter().find(|id| !tab.contains(id)) {
            return Err(EditorError::UnknownShape(missing.clone()));
        }
        let mut changed = false;
        let tab = self.active_tab_mut();
        for id in ids {
            if let Some(shape) = tab.get_mut(id) {
                if shape.is_locked() != locked {
                    shape.set_locked(locked);
                    changed = true;
                }
            }
        }
        if changed {
            self.commit_tab(self.active);
        }
        Ok(())
    }

    /// Append copies of `shapes` with fresh ids, shifted by `offset`.
    /// Pasted shapes are unlocked.
    pub fn paste(&mut self, shapes: &[Shape], offset: Vec2) -> EditorResult<Vec<ShapeId>> {
        self.require_edit("paste")?;
        let mut copies = Vec::with_capacity(shapes.len());
        for shape in shapes {
            let mut copy = shape.translated(offset);
            copy.regenerate_id();
            copy.set_locked(false);
            copy.validate()
                .map_err(|e| EditorError::validation(copy.id().as_str(), e))?;
            copies.push(copy);
        }
        let ids: Vec<ShapeId> = copies.iter().map(|s| s.id().clone()).collect();
        if copies.is_empty() {
            return Ok(ids);
        }
        let tab = self.active_tab_mut();
        for copy in copies {
            let id = copy.id().clone();
            tab.push(copy)
                .map_err(|e| EditorError::validation(id.as_str(), e))?;
        }
        log::debug!("Pasted {} shapes", ids.len());
        self.commit_tab(self.active);
        Ok(ids)
    }

    pub fn bring_to_front(&mut self, id: &ShapeId) -> EditorResult<()> {
        self.require_edit("bring to front")?;
        if !self.active_tab_mut().bring_to_front(id) {
            return Err(EditorError::UnknownShape(id.clone()));
        }
        self.commit_tab(self.active);
        Ok(())
    }

    pub fn send_to_back(&mut self, id: &ShapeId) -> EditorResult<()> {
        self.require_edit("send to back")?;
        if !self.active_tab_mut().send_to_back(id) {
            return Err(EditorError::UnknownShape(id.clone()));
        }
        self.commit_tab(self.active);
        Ok(())
    }

    /// Take over the id and tokens assigned by a first save.
    pub fn adopt_saved(&mut self, saved: &Plan) {
        if let (Some(share), Some(edit)) = (saved.share_token(), saved.edit_token()) {
            self.plan.set_tokens(share.clone(), edit.clone());
        }
        if self.plan.id.is_none() {
            self.plan.id = saved.id.clone();
        }
        self.publish();
    }

    fn activate(&mut self, index: usize) {
        if index != self.active {
            self.active = index;
            self.emit(SceneEvent::ActiveTabChanged { index });
        }
    }

    fn follow_active(&mut self, active_id: &TabId) {
        let index = self
            .plan
            .tabs()
            .iter()
            .position(|t| t.id() == active_id)
            .unwrap_or(0);
        self.activate(index);
    }
}
