//! Plans and their tabs (slides).
//!
//! A [`Plan`] owns an ordered, non-empty sequence of [`Tab`]s. Each tab owns
//! an ordered shape sequence; later shapes draw above earlier ones.

use crate::error::{EditorError, EditorResult};
use crate::shapes::{Shape, ShapeError, ShapeId};
use crate::token::{EditToken, ShareToken};
use kurbo::{Point, Rect};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use uuid::Uuid;

/// Opaque tab identifier. Loaded ids are kept verbatim; new ids are UUID v4 strings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TabId(String);

impl TabId {
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

impl From<&str> for TabId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl fmt::Display for TabId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A shape dropped while loading a tab.
#[derive(Debug, Clone, PartialEq)]
pub struct RejectedShape {
    pub tab: TabId,
    /// The shape's id if it could be read.
    pub shape: Option<String>,
    pub error: ShapeError,
}

/// Wire form of a tab. Shapes stay raw so each one validates independently.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TabRecord {
    #[serde(default)]
    pub id: Option<TabId>,
    #[serde(default)]
    pub background_src: String,
    #[serde(default)]
    pub boss: Option<String>,
    #[serde(default)]
    pub shapes: Vec<serde_json::Value>,
}

impl TabRecord {
    /// Build a tab, dropping malformed shapes and repeated shape ids.
    pub fn into_tab(self) -> (Tab, Vec<RejectedShape>) {
        let id = match self.id {
            Some(id) if !id.is_empty() => id,
            _ => TabId::generate(),
        };
        let mut tab = Tab {
            id,
            background_src: self.background_src,
            boss: self.boss,
            shapes: Vec::with_capacity(self.shapes.len()),
        };
        let mut rejected = Vec::new();
        for value in self.shapes {
            let shape_id = value.get("id").and_then(|v| v.as_str()).map(str::to_string);
            let result = Shape::from_value(value).and_then(|shape| tab.push(shape));
            if let Err(error) = result {
                log::warn!(
                    "Dropping shape {:?} on tab {}: {}",
                    shape_id,
                    tab.id,
                    error
                );
                rejected.push(RejectedShape {
                    tab: tab.id.clone(),
                    shape: shape_id,
                    error,
                });
            }
        }
        (tab, rejected)
    }
}

impl From<TabRecord> for Tab {
    fn from(record: TabRecord) -> Self {
        record.into_tab().0
    }
}

/// One slide of a plan: a background reference and an ordered shape sequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "TabRecord")]
pub struct Tab {
    id: TabId,
    background_src: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    boss: Option<String>,
    shapes: Vec<Shape>,
}

impl Tab {
    /// A blank tab with a fresh id.
    pub fn new(background_src: impl Into<String>) -> Self {
        Self {
            id: TabId::generate(),
            background_src: background_src.into(),
            boss: None,
            shapes: Vec::new(),
        }
    }

    pub fn id(&self) -> &TabId {
        &self.id
    }

    pub fn background_src(&self) -> &str {
        &self.background_src
    }

    pub fn boss(&self) -> Option<&str> {
        self.boss.as_deref()
    }

    /// Shapes in z-order (back to front).
    pub fn shapes(&self) -> &[Shape] {
        &self.shapes
    }

    pub fn len(&self) -> usize {
        self.shapes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }

    pub fn get(&self, id: &ShapeId) -> Option<&Shape> {
        self.shapes.iter().find(|s| s.id() == id)
    }

    pub fn contains(&self, id: &ShapeId) -> bool {
        self.position(id).is_some()
    }

    /// Z-order index of a shape.
    pub fn position(&self, id: &ShapeId) -> Option<usize> {
        self.shapes.iter().position(|s| s.id() == id)
    }

    /// Topmost shape under a point.
    pub fn shape_at(&self, point: Point, tolerance: f64) -> Option<&Shape> {
        self.shapes
            .iter()
            .rev()
            .find(|s| s.hit_test(point, tolerance))
    }

    /// Ids of unlocked shapes whose bounds intersect `rect`, in z-order.
    pub fn shapes_in_rect(&self, rect: Rect) -> Vec<ShapeId> {
        self.shapes
            .iter()
            .filter(|s| !s.is_locked() && s.intersects_rect(rect))
            .map(|s| s.id().clone())
            .collect()
    }

    /// Append a validated shape with an id not yet used on this tab.
    pub(crate) fn push(&mut self, shape: Shape) -> Result<(), ShapeError> {
        shape.validate()?;
        if self.contains(shape.id()) {
            return Err(ShapeError::DuplicateId);
        }
        self.shapes.push(shape);
        Ok(())
    }

    /// Replace the shape with the same id in place. Returns false if absent.
    pub(crate) fn replace(&mut self, shape: Shape) -> bool {
        match self.position(shape.id()) {
            Some(index) => {
                self.shapes[index] = shape;
                true
            }
            None => false,
        }
    }

    pub(crate) fn get_mut(&mut self, id: &ShapeId) -> Option<&mut Shape> {
        self.shapes.iter_mut().find(|s| s.id() == id)
    }

    /// Remove shapes by id, returning the removed shapes in z-order.
    pub(crate) fn remove(&mut self, ids: &HashSet<ShapeId>) -> Vec<Shape> {
        let (removed, kept) = std::mem::take(&mut self.shapes)
            .into_iter()
            .partition(|s| ids.contains(s.id()));
        self.shapes = kept;
        removed
    }

    pub(crate) fn bring_to_front(&mut self, id: &ShapeId) -> bool {
        match self.position(id) {
            Some(index) => {
                let shape = self.shapes.remove(index);
                self.shapes.push(shape);
                true
            }
            None => false,
        }
    }

    pub(crate) fn send_to_back(&mut self, id: &ShapeId) -> bool {
        match self.position(id) {
            Some(index) => {
                let shape = self.shapes.remove(index);
                self.shapes.insert(0, shape);
                true
            }
            None => false,
        }
    }

    pub(crate) fn set_background(&mut self, src: String) {
        self.background_src = src;
    }

    pub(crate) fn set_boss(&mut self, boss: Option<String>) {
        self.boss = boss;
    }

    /// Copy of this tab with fresh ids for the tab and every shape.
    pub(crate) fn duplicate(&self) -> Tab {
        let mut copy = self.clone();
        copy.id = TabId::generate();
        for shape in &mut copy.shapes {
            shape.regenerate_id();
        }
        copy
    }

    pub(crate) fn regenerate_id(&mut self) {
        self.id = TabId::generate();
    }
}

/// Wire form of a plan as exchanged with the persistence boundary.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PlanRecord {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub boss: String,
    #[serde(default)]
    pub raid: String,
    #[serde(default)]
    pub sequence: String,
    #[serde(default)]
    pub edit_id: Option<EditToken>,
    #[serde(default)]
    pub share_id: Option<ShareToken>,
    #[serde(default)]
    pub content: Vec<TabRecord>,
}

impl From<PlanRecord> for Plan {
    fn from(record: PlanRecord) -> Self {
        Plan::from_record(record).0
    }
}

/// A multi-slide diagram.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "PlanRecord")]
pub struct Plan {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    pub boss: String,
    pub raid: String,
    pub sequence: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    edit_id: Option<EditToken>,
    #[serde(skip_serializing_if = "Option::is_none")]
    share_id: Option<ShareToken>,
    #[serde(rename = "content")]
    tabs: Vec<Tab>,
}

impl Plan {
    /// A new unsaved plan with one blank tab.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
            boss: String::new(),
            raid: String::new(),
            sequence: String::new(),
            edit_id: None,
            share_id: None,
            tabs: vec![Tab::new(String::new())],
        }
    }

    /// Build a plan from its wire record, reporting every dropped shape.
    ///
    /// Repeated tab ids are replaced with fresh ones and an empty tab list
    /// gains one blank tab.
    pub fn from_record(record: PlanRecord) -> (Plan, Vec<RejectedShape>) {
        let mut rejected = Vec::new();
        let mut tabs = Vec::with_capacity(record.content.len());
        for tab_record in record.content {
            let (tab, mut dropped) = tab_record.into_tab();
            rejected.append(&mut dropped);
            tabs.push(tab);
        }
        let mut plan = Plan {
            id: record.id,
            name: record.name,
            boss: record.boss,
            raid: record.raid,
            sequence: record.sequence,
            edit_id: record.edit_id,
            share_id: record.share_id,
            tabs: Vec::new(),
        };
        plan.install_tabs(tabs);
        (plan, rejected)
    }

    /// Parse a plan, dropping malformed shapes.
    pub fn from_json(json: &str) -> Result<Plan, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Parse a plan and report the shapes that were dropped.
    pub fn from_json_with_report(json: &str) -> Result<(Plan, Vec<RejectedShape>), serde_json::Error> {
        let record: PlanRecord = serde_json::from_str(json)?;
        Ok(Plan::from_record(record))
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn tabs(&self) -> &[Tab] {
        &self.tabs
    }

    pub fn tab(&self, index: usize) -> Option<&Tab> {
        self.tabs.get(index)
    }

    pub fn tab_count(&self) -> usize {
        self.tabs.len()
    }

    pub fn share_token(&self) -> Option<&ShareToken> {
        self.share_id.as_ref()
    }

    /// The edit token, absent for plans resolved through a share token.
    pub fn edit_token(&self) -> Option<&EditToken> {
        self.edit_id.as_ref()
    }

    /// Replace the whole tab sequence.
    pub fn replace_tabs(&mut self, tabs: Vec<Tab>) -> EditorResult<()> {
        if tabs.is_empty() {
            return Err(EditorError::OnlyTab);
        }
        self.install_tabs(tabs);
        Ok(())
    }

    pub(crate) fn tabs_mut(&mut self) -> &mut Vec<Tab> {
        &mut self.tabs
    }

    pub(crate) fn set_tokens(&mut self, share: ShareToken, edit: EditToken) {
        self.share_id = Some(share);
        self.edit_id = Some(edit);
    }

    pub(crate) fn redact_edit_token(&mut self) {
        self.edit_id = None;
    }

    fn install_tabs(&mut self, mut tabs: Vec<Tab>) {
        let mut seen = HashSet::new();
        for tab in &mut tabs {
            if !seen.insert(tab.id.clone()) {
                log::warn!("Repeated tab id {}, assigning a fresh one", tab.id);
                tab.regenerate_id();
                seen.insert(tab.id.clone());
            }
        }
        if tabs.is_empty() {
            log::warn!("Plan {:?} has no tabs, adding a blank one", self.id);
            tabs.push(Tab::new(String::new()));
        }
        self.tabs = tabs;
    }
}
