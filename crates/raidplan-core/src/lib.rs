//! RaidPlan Core Library
//!
//! Scene model, selection, gesture engine and persistence boundary for
//! multi-slide boss-fight diagrams.

pub mod config;
pub mod editor;
pub mod error;
pub mod events;
pub mod input;
pub mod plan;
pub mod scene;
pub mod selection;
pub mod shapes;
pub mod storage;
pub mod token;
pub mod tools;
pub mod transform;
pub mod viewport;

#[cfg(test)]
mod test_util;

pub use config::EditorConfig;
pub use editor::{Editor, EditorMode};
pub use error::{EditorError, EditorResult};
pub use events::{EventLog, SceneEvent, SceneObserver};
pub use input::{Modifiers, PointerButton, PointerEvent};
pub use plan::{Plan, RejectedShape, Tab, TabId};
pub use scene::{PlanSnapshot, Scene};
pub use selection::{Handle, HandleKind, Selection};
pub use shapes::{
    AreaKind, AreaMarker, FreehandPath, IconMarker, Placement, Shape, ShapeError, ShapeId,
    ShapePatch, ShapeStyle, ShapeTrait, TextAnnotation, TransformDelta,
};
pub use storage::{FileStorage, MemoryStorage, PlanStore, SaveManager, SaveOutcome, StorageError};
pub use token::{
    AccessMode, EditToken, PlanToken, PlanUpdate, ResolvedPlan, ShareToken, TokenError,
    TokenResolver, generate_tokens,
};
pub use tools::DrawingTool;
pub use transform::{Gesture, GroupTransform};
pub use viewport::{CANVAS_HEIGHT, CANVAS_WIDTH, Viewport};
