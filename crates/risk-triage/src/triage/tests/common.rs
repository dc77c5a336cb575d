use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};

use crate::config::{RuleSource, TrainingConfig};
use crate::triage::corpus::{
    CaseCorpusReader, CaseFilter, CaseRecord, CorpusError, InMemoryCaseCorpus,
    InMemoryVictimDirectory, VictimAttributeReader, VictimRecord,
};
use crate::triage::domain::IncidentPayload;
use crate::triage::engine::RiskClassifier;

pub(super) const SEED: u64 = 17;

/// Text that contains none of the lexicon's surface forms.
pub(super) const NEUTRAL_DESCRIPTION: &str =
    "Complainant came to the barangay hall to report a dispute with a neighbor.";

pub(super) fn payload(description: &str, incident_type: &str) -> IncidentPayload {
    IncidentPayload {
        description: description.to_string(),
        incident_type: incident_type.to_string(),
        status: "Open".to_string(),
        ..IncidentPayload::default()
    }
}

pub(super) fn case(id: usize, incident_type: &str, risk_level: Option<&str>) -> CaseRecord {
    CaseRecord {
        id: format!("case-{id}"),
        victim_id: Some(format!("victim-{}", id % 7)),
        incident_type: incident_type.to_string(),
        description: "x".repeat(40 + (id % 5) * 60),
        status: if id % 3 == 0 { "Closed" } else { "Open" }.to_string(),
        assigned_officer: (id % 2 == 0).then(|| "PO2 Reyes".to_string()),
        risk_level: risk_level.map(str::to_string),
        reported_at: Some(Utc::now() - Duration::days(id as i64)),
    }
}

/// Mixed corpus using both canonical and legacy labels.
pub(super) fn training_corpus(size: usize) -> Vec<CaseRecord> {
    const ROWS: [(&str, &str); 6] = [
        ("Economic", "Low"),
        ("Psychological", "Psychological"),
        ("Physical", "High"),
        ("Sexual", "High"),
        ("Other", "Medium"),
        ("Physical", "Physical"),
    ];
    (0..size)
        .map(|id| {
            let (incident_type, label) = ROWS[id % ROWS.len()];
            case(id, incident_type, Some(label))
        })
        .collect()
}

pub(super) fn training_config() -> TrainingConfig {
    TrainingConfig {
        min_samples: 50,
        auto_train: true,
        seed: Some(SEED),
    }
}

pub(super) fn classifier_with(
    cases: Arc<dyn CaseCorpusReader>,
    victims: Arc<dyn VictimAttributeReader>,
    rules: RuleSource,
    training: TrainingConfig,
) -> RiskClassifier {
    RiskClassifier::new(cases, victims, rules, training)
}

pub(super) fn classifier(cases: Vec<CaseRecord>, rules: RuleSource) -> RiskClassifier {
    classifier_with(
        Arc::new(InMemoryCaseCorpus::new(cases)),
        Arc::new(InMemoryVictimDirectory::new(vec![VictimRecord {
            id: "victim-1".to_string(),
            victim_code: Some("VIC-0001".to_string()),
            victim_type: "child".to_string(),
        }])),
        rules,
        training_config(),
    )
}

/// Store whose every call fails.
pub(super) struct FailingStore;

#[async_trait]
impl CaseCorpusReader for FailingStore {
    async fn find_recent(&self, _limit: usize) -> Result<Vec<CaseRecord>, CorpusError> {
        Err(CorpusError::Unavailable("connection refused".to_string()))
    }

    async fn count_since(
        &self,
        _filter: &CaseFilter,
        _since: DateTime<Utc>,
    ) -> Result<u64, CorpusError> {
        Err(CorpusError::Unavailable("connection refused".to_string()))
    }
}

#[async_trait]
impl VictimAttributeReader for FailingStore {
    async fn find_by_any_id(&self, _id: &str) -> Result<Option<VictimRecord>, CorpusError> {
        Err(CorpusError::Unavailable("connection refused".to_string()))
    }
}

/// In-memory corpus that counts how often the training query runs.
pub(super) struct CountingCorpus {
    inner: InMemoryCaseCorpus,
    reads: AtomicUsize,
}

impl CountingCorpus {
    pub(super) fn new(records: Vec<CaseRecord>) -> Self {
        Self {
            inner: InMemoryCaseCorpus::new(records),
            reads: AtomicUsize::new(0),
        }
    }

    pub(super) fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CaseCorpusReader for CountingCorpus {
    async fn find_recent(&self, limit: usize) -> Result<Vec<CaseRecord>, CorpusError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.inner.find_recent(limit).await
    }

    async fn count_since(
        &self,
        filter: &CaseFilter,
        since: DateTime<Utc>,
    ) -> Result<u64, CorpusError> {
        self.inner.count_since(filter, since).await
    }
}

pub(super) fn assert_close(actual: &[f64], expected: &[f64]) {
    assert_eq!(actual.len(), expected.len(), "length of {actual:?}");
    for (a, e) in actual.iter().zip(expected) {
        assert!((a - e).abs() < 1e-3, "expected {expected:?}, got {actual:?}");
    }
}
