//! In-flight workflow registry
//!
//! Registration hands back an [`InFlightGuard`]; the entry is removed when
//! the guard drops, whichever way execution ends.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use thiserror::Error;
use tracing::debug;

use super::types::Workflow;
use crate::intent::IntentType;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("Workflow {0} is already in flight")]
    AlreadyInFlight(String),
}

/// Shared map of running workflows
#[derive(Debug, Clone, Default)]
pub struct WorkflowRegistry {
    entries: Arc<Mutex<HashMap<String, IntentType>>>,
}

impl WorkflowRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, IntentType>> {
        // The map stays consistent even if a holder panicked
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register a workflow for the lifetime of the returned guard
    pub fn register(&self, workflow: &Workflow) -> Result<InFlightGuard, RegistryError> {
        let mut entries = self.lock();
        if entries.contains_key(&workflow.id) {
            return Err(RegistryError::AlreadyInFlight(workflow.id.clone()));
        }
        entries.insert(workflow.id.clone(), workflow.intent_type);
        debug!("Workflow {} registered ({} in flight)", workflow.id, entries.len());

        Ok(InFlightGuard {
            registry: self.clone(),
            id: workflow.id.clone(),
        })
    }

    pub fn contains(&self, id: &str) -> bool {
        self.lock().contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn remove(&self, id: &str) {
        let mut entries = self.lock();
        entries.remove(id);
        debug!("Workflow {} unregistered ({} in flight)", id, entries.len());
    }
}

/// Keeps a workflow registered until dropped
#[derive(Debug)]
pub struct InFlightGuard {
    registry: WorkflowRegistry,
    id: String,
}

impl InFlightGuard {
    pub fn id(&self) -> &str {
        &self.id
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.registry.remove(&self.id);
    }
}
