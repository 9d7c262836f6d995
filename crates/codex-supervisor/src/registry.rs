//! Handle → record map for every agent spawned by this supervisor

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use crate::error::{Result, SupervisorError};
use crate::record::AgentRecord;
use crate::types::AgentId;

/// Registry of agent records
///
/// Records are never removed; the registry lives as long as the supervisor.
#[derive(Debug, Default)]
pub struct AgentRegistry {
    agents: RwLock<HashMap<AgentId, Arc<AgentRecord>>>,
}

impl AgentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn insert(&self, record: Arc<AgentRecord>) {
        self.agents
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(record.id(), record);
    }

    /// Look up a record by handle
    pub fn get(&self, id: &AgentId) -> Result<Arc<AgentRecord>> {
        self.agents
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(id)
            .cloned()
            .ok_or_else(|| SupervisorError::NotFound { id: id.to_string() })
    }

    /// All records, oldest first
    pub fn records(&self) -> Vec<Arc<AgentRecord>> {
        let mut records: Vec<_> = self
            .agents
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .cloned()
            .collect();
        records.sort_by_key(|r| r.started_at());
        records
    }

    pub fn len(&self) -> usize {
        self.agents
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
