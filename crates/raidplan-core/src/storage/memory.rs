//! In-memory plan store.

use super::{BoxFuture, PlanStore, StorageError, StorageResult};
use crate::plan::Plan;
use std::collections::HashMap;
use std::sync::RwLock;

/// In-memory storage for tests and ephemeral servers.
#[derive(Default)]
pub struct MemoryStorage {
    plans: RwLock<HashMap<String, Plan>>,
}

impl MemoryStorage {
    /// Create a new empty memory storage.
    pub fn new() -> Self {
        Self::default()
    }
}

fn lock_error(e: impl std::fmt::Display) -> StorageError {
    StorageError::Other(format!("Lock error: {}", e))
}

impl PlanStore for MemoryStorage {
    fn save(&self, key: &str, plan: &Plan) -> BoxFuture<'_, StorageResult<()>> {
        let key = key.to_string();
        let plan = plan.clone();
        Box::pin(async move {
            let mut plans = self.plans.write().map_err(lock_error)?;
            plans.insert(key, plan);
            Ok(())
        })
    }

    fn load(&self, key: &str) -> BoxFuture<'_, StorageResult<Plan>> {
        let key = key.to_string();
        Box::pin(async move {
            let plans = self.plans.read().map_err(lock_error)?;
            plans.get(&key).cloned().ok_or(StorageError::NotFound(key))
        })
    }

    fn delete(&self, key: &str) -> BoxFuture<'_, StorageResult<()>> {
        let key = key.to_string();
        Box::pin(async move {
            let mut plans = self.plans.write().map_err(lock_error)?;
            plans.remove(&key);
            Ok(())
        })
    }

    fn list(&self) -> BoxFuture<'_, StorageResult<Vec<String>>> {
        Box::pin(async move {
            let plans = self.plans.read().map_err(lock_error)?;
            Ok(plans.keys().cloned().collect())
        })
    }

    fn exists(&self, key: &str) -> BoxFuture<'_, StorageResult<bool>> {
        let key = key.to_string();
        Box::pin(async move {
            let plans = self.plans.read().map_err(lock_error)?;
            Ok(plans.contains_key(&key))
        })
    }
}
