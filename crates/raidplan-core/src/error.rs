//! Error types for editor operations.

use crate::shapes::{ShapeError, ShapeId};
use crate::storage::StorageError;
use thiserror::Error;

/// Errors returned by scene, selection and gesture operations.
#[derive(Debug, Error)]
pub enum EditorError {
    /// A shape failed validation and was not applied.
    #[error("invalid shape {id}: {source}")]
    Validation {
        id: String,
        #[source]
        source: ShapeError,
    },
    /// A tab index outside the plan's tab range.
    #[error("tab index {index} out of range (plan has {len} tabs)")]
    Range { index: usize, len: usize },
    /// Attempt to delete the last remaining tab.
    #[error("a plan must keep at least one tab")]
    OnlyTab,
    /// The referenced shape is not on the active tab.
    #[error("unknown shape: {0}")]
    UnknownShape(ShapeId),
    /// A gesture was requested with nothing selected.
    #[error("nothing selected")]
    NothingSelected,
    /// The shape is locked against manipulation.
    #[error("shape is locked: {0}")]
    Locked(ShapeId),
    /// The selection changed while a gesture session was active.
    #[error("gesture session invalidated by a selection change")]
    StaleSession,
    /// No gesture session is active.
    #[error("no active gesture session")]
    NoSession,
    /// A mutation was attempted under read-only access.
    #[error("permission denied: {operation} requires edit access")]
    PermissionDenied { operation: &'static str },
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl EditorError {
    pub(crate) fn validation(id: impl Into<String>, source: ShapeError) -> Self {
        Self::Validation {
            id: id.into(),
            source,
        }
    }

    /// Whether the error reports a read-only access violation.
    pub fn is_permission_denied(&self) -> bool {
        matches!(self, Self::PermissionDenied { .. })
    }
}

/// Result type for editor operations.
pub type EditorResult<T> = Result<T, EditorError>;
