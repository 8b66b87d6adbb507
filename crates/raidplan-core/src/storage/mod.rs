//! Storage abstraction for plan persistence.

mod file;
mod memory;
mod save;

pub use file::FileStorage;
pub use memory::MemoryStorage;
pub use save::{SaveManager, SaveOutcome};

use crate::plan::Plan;
use std::future::Future;
use std::pin::Pin;
use thiserror::Error;

/// Storage errors.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Plan not found: {0}")]
    NotFound(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
    #[error("IO error: {0}")]
    Io(String),
    #[error("A save of plan {0} is already in flight")]
    SaveInFlight(String),
    #[error("Plan {0} was opened read-only")]
    ReadOnly(String),
    #[error("Storage error: {0}")]
    Other(String),
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Boxed future for async store operations.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Trait for plan storage backends.
///
/// Plans are keyed by their share token. Implementations must be usable from
/// multiple tasks at once.
pub trait PlanStore: Send + Sync {
    /// Save a plan, replacing any previous version.
    fn save(&self, key: &str, plan: &Plan) -> BoxFuture<'_, StorageResult<()>>;

    /// Load a plan.
    fn load(&self, key: &str) -> BoxFuture<'_, StorageResult<Plan>>;

    /// Delete a plan.
    fn delete(&self, key: &str) -> BoxFuture<'_, StorageResult<()>>;

    /// List all plan keys.
    fn list(&self) -> BoxFuture<'_, StorageResult<Vec<String>>>;

    /// Check if a plan exists.
    fn exists(&self, key: &str) -> BoxFuture<'_, StorageResult<bool>>;
}
