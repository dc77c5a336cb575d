use std::sync::{Arc, PoisonError, RwLock};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::{
    CaseCorpusReader, CaseFilter, CaseRecord, CorpusError, VictimAttributeReader, VictimRecord,
};

/// Case store held in memory, used by the command-line host and in tests.
#[derive(Debug, Default, Clone)]
pub struct InMemoryCaseCorpus {
    records: Arc<RwLock<Vec<CaseRecord>>>,
}

impl InMemoryCaseCorpus {
    pub fn new(records: Vec<CaseRecord>) -> Self {
        Self {
            records: Arc::new(RwLock::new(records)),
        }
    }

    pub fn len(&self) -> usize {
        self.records.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl CaseCorpusReader for InMemoryCaseCorpus {
    async fn find_recent(&self, limit: usize) -> Result<Vec<CaseRecord>, CorpusError> {
        let guard = self
            .records
            .read()
            .map_err(|_| CorpusError::Unavailable("corpus lock poisoned".to_string()))?;
        let mut records = guard.clone();
        // Undated cases sort last.
        records.sort_by(|left, right| right.reported_at.cmp(&left.reported_at));
        records.truncate(limit);
        Ok(records)
    }

    async fn count_since(
        &self,
        filter: &CaseFilter,
        since: DateTime<Utc>,
    ) -> Result<u64, CorpusError> {
        let guard = self
            .records
            .read()
            .map_err(|_| CorpusError::Unavailable("corpus lock poisoned".to_string()))?;
        let count = guard
            .iter()
            .filter(|record| filter.matches(record))
            .filter(|record| record.reported_at.is_some_and(|at| at >= since))
            .count();
        Ok(count as u64)
    }
}

#[derive(Debug, Default, Clone)]
pub struct InMemoryVictimDirectory {
    victims: Arc<RwLock<Vec<VictimRecord>>>,
}

impl InMemoryVictimDirectory {
    pub fn new(victims: Vec<VictimRecord>) -> Self {
        Self {
            victims: Arc::new(RwLock::new(victims)),
        }
    }
}

#[async_trait]
impl VictimAttributeReader for InMemoryVictimDirectory {
    async fn find_by_any_id(&self, id: &str) -> Result<Option<VictimRecord>, CorpusError> {
        let guard = self
            .victims
            .read()
            .map_err(|_| CorpusError::Unavailable("victim lock poisoned".to_string()))?;
        Ok(guard
            .iter()
            .find(|victim| victim.id == id || victim.victim_code.as_deref() == Some(id))
            .cloned())
    }
}
