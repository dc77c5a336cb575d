//! Read-only collaborator contracts for historical cases and victim attributes.

mod import;
mod memory;

pub use import::{parse_cases, parse_victims};
pub use memory::{InMemoryCaseCorpus, InMemoryVictimDirectory};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Historical case as exposed to training and fact lookups.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaseRecord {
    pub id: String,
    pub victim_id: Option<String>,
    pub incident_type: String,
    pub description: String,
    pub status: String,
    pub assigned_officer: Option<String>,
    /// Persisted label; may be canonical (`Physical`) or legacy (`High`).
    pub risk_level: Option<String>,
    pub reported_at: Option<DateTime<Utc>>,
}

/// Victim attributes used to resolve the `victimType` fact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VictimRecord {
    /// Internal identifier.
    pub id: String,
    /// Business identifier shown on case files.
    pub victim_code: Option<String>,
    pub victim_type: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaseFilter {
    All,
    Victim(String),
}

impl CaseFilter {
    pub fn matches(&self, record: &CaseRecord) -> bool {
        match self {
            CaseFilter::All => true,
            CaseFilter::Victim(id) => record.victim_id.as_deref() == Some(id.as_str()),
        }
    }
}

/// Storage abstraction over the historical case store.
#[async_trait]
pub trait CaseCorpusReader: Send + Sync {
    /// Most recent cases first, at most `limit`.
    async fn find_recent(&self, limit: usize) -> Result<Vec<CaseRecord>, CorpusError>;

    async fn count_since(
        &self,
        filter: &CaseFilter,
        since: DateTime<Utc>,
    ) -> Result<u64, CorpusError>;
}

/// Lookup of victim attributes by internal or business id.
#[async_trait]
pub trait VictimAttributeReader: Send + Sync {
    async fn find_by_any_id(&self, id: &str) -> Result<Option<VictimRecord>, CorpusError>;
}

/// Error enumeration for collaborator failures.
#[derive(Debug, thiserror::Error)]
pub enum CorpusError {
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error("malformed record: {0}")]
    Malformed(String),
    #[error(transparent)]
    Csv(#[from] csv::Error),
}
