//! Change notifications leaving the editing core.

use crate::plan::{Tab, TabId};
use crate::shapes::{ShapeId, TransformDelta};
use kurbo::Point;
use std::sync::{Arc, Mutex};

/// Something the owning application may want to react to.
///
/// `TabChanged` and `TabsChanged` describe durable state; the rest are
/// presentation hooks.
#[derive(Debug, Clone, PartialEq)]
pub enum SceneEvent {
    /// A committed change to one tab's content.
    TabChanged { index: usize, tab: Tab },
    /// Tabs were added, removed, cloned or reordered. Ids are in slide order.
    TabsChanged { tab_ids: Vec<TabId> },
    ActiveTabChanged { index: usize },
    SelectionChanged {
        selected: Vec<ShapeId>,
        primary: Option<ShapeId>,
    },
    /// A multi-shape gesture was committed as one batch.
    GroupTransformed {
        ids: Vec<ShapeId>,
        delta: TransformDelta,
    },
    ContextMenuRequested {
        position: Point,
        shape: Option<ShapeId>,
    },
}

/// Receives scene events in the order they occur.
pub trait SceneObserver: Send {
    fn on_event(&mut self, event: &SceneEvent);
}

impl<F> SceneObserver for F
where
    F: FnMut(&SceneEvent) + Send,
{
    fn on_event(&mut self, event: &SceneEvent) {
        self(event)
    }
}

/// Observer that records events for later draining.
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    events: Arc<Mutex<Vec<SceneEvent>>>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remove and return everything recorded so far.
    pub fn take(&self) -> Vec<SceneEvent> {
        self.events
            .lock()
            .map(|mut events| std::mem::take(&mut *events))
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.events.lock().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl SceneObserver for EventLog {
    fn on_event(&mut self, event: &SceneEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event.clone());
        }
    }
}
