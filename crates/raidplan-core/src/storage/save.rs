//! Explicit, at-most-one-in-flight plan saves.

use super::{PlanStore, StorageError, StorageResult};
use crate::plan::Plan;
use crate::token::generate_tokens;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

/// Result of a successful save.
#[derive(Debug, Clone, PartialEq)]
pub struct SaveOutcome {
    /// The plan as stored, including any tokens assigned on first save.
    pub plan: Plan,
    /// Whether this save created the plan.
    pub created: bool,
}

/// Gate between an editing session and a [`PlanStore`].
///
/// A second save of the same plan while one is pending fails with
/// [`StorageError::SaveInFlight`]. Saves that do not overlap are last-write-wins.
pub struct SaveManager<S: PlanStore + ?Sized> {
    storage: Arc<S>,
    in_flight: Mutex<HashSet<String>>,
}

/// Removes the plan key from the in-flight set when dropped.
struct InFlight<'a> {
    keys: &'a Mutex<HashSet<String>>,
    key: String,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if let Ok(mut keys) = self.keys.lock() {
            keys.remove(&self.key);
        }
    }
}

impl<S: PlanStore + ?Sized> SaveManager<S> {
    pub fn new(storage: Arc<S>) -> Self {
        Self {
            storage,
            in_flight: Mutex::new(HashSet::new()),
        }
    }

    pub fn storage(&self) -> &Arc<S> {
        &self.storage
    }

    /// Whether a save of the plan stored under `key` is pending.
    pub fn is_saving(&self, key: &str) -> bool {
        self.in_flight
            .lock()
            .map(|keys| keys.contains(key))
            .unwrap_or(false)
    }

    fn begin(&self, key: String) -> StorageResult<InFlight<'_>> {
        let mut keys = self
            .in_flight
            .lock()
            .map_err(|e| StorageError::Other(format!("Lock error: {}", e)))?;
        if !keys.insert(key.clone()) {
            return Err(StorageError::SaveInFlight(key));
        }
        Ok(InFlight {
            keys: &self.in_flight,
            key,
        })
    }

    /// Persist `plan`. An unsaved plan gets an id and a fresh token pair.
    ///
    /// Plans resolved through a share token carry no edit token and are refused.
    pub async fn save(&self, plan: &Plan) -> StorageResult<SaveOutcome> {
        let mut plan = plan.clone();
        let created = plan.share_token().is_none();
        if created {
            let (share, edit) = generate_tokens();
            plan.set_tokens(share, edit);
            plan.id.get_or_insert_with(|| Uuid::new_v4().to_string());
        } else if plan.edit_token().is_none() {
            let key = plan.share_token().map(|s| s.to_string()).unwrap_or_default();
            return Err(StorageError::ReadOnly(key));
        }

        let key = plan
            .share_token()
            .map(|s| s.as_str().to_string())
            .ok_or_else(|| StorageError::Other("plan has no share token".to_string()))?;
        let _guard = self.begin(key.clone())?;

        self.storage.save(&key, &plan).await?;
        log::info!(
            "Saved plan {} ({} tabs, {})",
            key,
            plan.tab_count(),
            if created { "created" } else { "updated" }
        );
        Ok(SaveOutcome { plan, created })
    }
}
