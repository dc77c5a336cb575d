use std::collections::HashMap;
use std::sync::Arc;

use chrono::{Months, Utc};
use serde_json::{Map, Value};
use tracing::warn;

use crate::triage::corpus::{CaseCorpusReader, CaseFilter, VictimAttributeReader};

/// Trailing window used by the `recentReports` fact.
const RECENT_REPORT_MONTHS: u32 = 3;

/// Facts computed by a provider rather than read verbatim from the fact map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FactName {
    RecentReports,
    DescriptionLower,
    Injuries,
    InjurySeverity,
    VictimType,
}

impl FactName {
    pub const ALL: [FactName; 5] = [
        FactName::RecentReports,
        FactName::DescriptionLower,
        FactName::Injuries,
        FactName::InjurySeverity,
        FactName::VictimType,
    ];

    pub fn key(self) -> &'static str {
        match self {
            FactName::RecentReports => "recentReports",
            FactName::DescriptionLower => "descriptionLower",
            FactName::Injuries => "injuries",
            FactName::InjurySeverity => "injurySeverity",
            FactName::VictimType => "victimType",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|name| name.key() == key)
    }

    /// Value used whenever the provider cannot produce one.
    pub fn default_value(self) -> Value {
        match self {
            FactName::RecentReports => Value::from(0u64),
            FactName::DescriptionLower => Value::from(""),
            FactName::Injuries => Value::Bool(false),
            FactName::InjurySeverity => Value::from(0.0),
            FactName::VictimType => Value::from(""),
        }
    }
}

/// Resolvers for every [`FactName`], backed by the read-only collaborators.
#[derive(Clone)]
pub struct FactProviders {
    cases: Arc<dyn CaseCorpusReader>,
    victims: Arc<dyn VictimAttributeReader>,
}

impl FactProviders {
    pub fn new(cases: Arc<dyn CaseCorpusReader>, victims: Arc<dyn VictimAttributeReader>) -> Self {
        Self { cases, victims }
    }

    /// Never fails: lookup errors degrade to the fact's default.
    pub async fn resolve(&self, name: FactName, facts: &Map<String, Value>) -> Value {
        match name {
            FactName::RecentReports => Value::from(self.recent_reports(facts).await),
            FactName::DescriptionLower => Value::from(description_lower(facts)),
            FactName::Injuries => Value::Bool(
                facts
                    .get("injuries")
                    .and_then(Value::as_bool)
                    .unwrap_or(false),
            ),
            FactName::InjurySeverity => Value::from(
                facts
                    .get("injurySeverity")
                    .and_then(Value::as_f64)
                    .unwrap_or(0.0),
            ),
            FactName::VictimType => Value::from(self.victim_type(facts).await),
        }
    }

    async fn recent_reports(&self, facts: &Map<String, Value>) -> u64 {
        let Some(victim_id) = victim_id(facts) else {
            return 0;
        };
        let Some(since) = Utc::now().checked_sub_months(Months::new(RECENT_REPORT_MONTHS)) else {
            return 0;
        };

        match self
            .cases
            .count_since(&CaseFilter::Victim(victim_id.clone()), since)
            .await
        {
            Ok(count) => count,
            Err(error) => {
                warn!(%error, %victim_id, "recentReports lookup failed; defaulting to 0");
                0
            }
        }
    }

    async fn victim_type(&self, facts: &Map<String, Value>) -> String {
        if let Some(supplied) = facts
            .get("victimType")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|value| !value.is_empty())
        {
            return supplied.to_string();
        }

        let Some(victim_id) = victim_id(facts) else {
            return String::new();
        };

        match self.victims.find_by_any_id(&victim_id).await {
            Ok(Some(victim)) => victim.victim_type,
            Ok(None) => String::new(),
            Err(error) => {
                warn!(%error, %victim_id, "victimType lookup failed; defaulting to empty");
                String::new()
            }
        }
    }
}

fn victim_id(facts: &Map<String, Value>) -> Option<String> {
    match facts.get("victimId")? {
        Value::String(id) if !id.trim().is_empty() => Some(id.trim().to_string()),
        Value::Number(id) => Some(id.to_string()),
        _ => None,
    }
}

fn description_lower(facts: &Map<String, Value>) -> String {
    facts
        .get("description")
        .and_then(Value::as_str)
        .map(str::to_lowercase)
        .unwrap_or_default()
}

/// Per-evaluation fact cache: each fact is resolved at most once.
pub struct Almanac<'a> {
    facts: &'a Map<String, Value>,
    providers: &'a FactProviders,
    resolved: HashMap<String, Value>,
}

impl<'a> Almanac<'a> {
    pub fn new(facts: &'a Map<String, Value>, providers: &'a FactProviders) -> Self {
        Self {
            facts,
            providers,
            resolved: HashMap::new(),
        }
    }

    pub async fn resolve(&mut self, key: &str) {
        if self.resolved.contains_key(key) {
            return;
        }
        let value = match FactName::from_key(key) {
            Some(name) => self.providers.resolve(name, self.facts).await,
            None => self.facts.get(key).cloned().unwrap_or(Value::Null),
        };
        self.resolved.insert(key.to_string(), value);
    }

    pub fn values(&self) -> &HashMap<String, Value> {
        &self.resolved
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::triage::corpus::{
        CaseRecord, CorpusError, InMemoryCaseCorpus, InMemoryVictimDirectory, VictimRecord,
    };
    use async_trait::async_trait;
    use chrono::{DateTime, Duration};
    use serde_json::json;

    struct OfflineStore;

    #[async_trait]
    impl CaseCorpusReader for OfflineStore {
        async fn find_recent(&self, _limit: usize) -> Result<Vec<CaseRecord>, CorpusError> {
            Err(CorpusError::Unavailable("database offline".to_string()))
        }

        async fn count_since(
            &self,
            _filter: &CaseFilter,
            _since: DateTime<Utc>,
        ) -> Result<u64, CorpusError> {
            Err(CorpusError::Unavailable("database offline".to_string()))
        }
    }

    #[async_trait]
    impl VictimAttributeReader for OfflineStore {
        async fn find_by_any_id(
            &self,
            _id: &str,
        ) -> Result<Option<VictimRecord>, CorpusError> {
            Err(CorpusError::Unavailable("database offline".to_string()))
        }
    }

    fn report(victim: &str, days_ago: i64) -> CaseRecord {
        CaseRecord {
            id: format!("{victim}-{days_ago}"),
            victim_id: Some(victim.to_string()),
            incident_type: "Psychological".to_string(),
            description: String::new(),
            status: "Open".to_string(),
            assigned_officer: None,
            risk_level: None,
            reported_at: Some(Utc::now() - Duration::days(days_ago)),
        }
    }

    fn map(value: Value) -> Map<String, Value> {
        value.as_object().cloned().expect("object")
    }

    fn live_providers() -> FactProviders {
        let cases = InMemoryCaseCorpus::new(vec![
            report("v-1", 3),
            report("v-1", 40),
            report("v-1", 200),
            report("v-2", 1),
        ]);
        let victims = InMemoryVictimDirectory::new(vec![VictimRecord {
            id: "v-1".to_string(),
            victim_code: Some("VIC-1".to_string()),
            victim_type: "child".to_string(),
        }]);
        FactProviders::new(Arc::new(cases), Arc::new(victims))
    }

    #[tokio::test]
    async fn recent_reports_counts_three_month_window() {
        let providers = live_providers();
        let facts = map(json!({ "victimId": "v-1" }));
        assert_eq!(
            providers.resolve(FactName::RecentReports, &facts).await,
            json!(2)
        );
        assert_eq!(
            providers
                .resolve(FactName::RecentReports, &Map::new())
                .await,
            json!(0)
        );
    }

    #[tokio::test]
    async fn victim_type_prefers_supplied_fact_then_directory() {
        let providers = live_providers();
        let supplied = map(json!({ "victimType": "woman", "victimId": "v-1" }));
        let looked_up = map(json!({ "victimType": "", "victimId": "VIC-1" }));
        assert_eq!(
            providers.resolve(FactName::VictimType, &supplied).await,
            json!("woman")
        );
        assert_eq!(
            providers.resolve(FactName::VictimType, &looked_up).await,
            json!("child")
        );
    }

    #[tokio::test]
    async fn failures_fall_back_to_defaults() {
        let providers = FactProviders::new(Arc::new(OfflineStore), Arc::new(OfflineStore));
        let facts = map(json!({ "victimId": "v-1" }));
        for name in FactName::ALL {
            assert_eq!(
                providers.resolve(name, &facts).await,
                name.default_value(),
                "{name:?} should default"
            );
        }
    }

    #[tokio::test]
    async fn almanac_reads_plain_facts_and_lowercases_description() {
        let providers = live_providers();
        let facts = map(json!({ "description": "May BARIL siya", "status": "Open" }));
        let mut almanac = Almanac::new(&facts, &providers);
        for key in ["descriptionLower", "status", "missing"] {
            almanac.resolve(key).await;
        }
        let values = almanac.values();
        assert_eq!(values["descriptionLower"], json!("may baril siya"));
        assert_eq!(values["status"], json!("Open"));
        assert_eq!(values["missing"], Value::Null);
    }
}
