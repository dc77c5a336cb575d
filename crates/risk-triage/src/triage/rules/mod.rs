//! Declarative condition/event rules evaluated against resolved facts.

mod condition;
mod facts;
mod loader;

pub use condition::{Condition, FactCondition, Operator};
pub use facts::{Almanac, FactName, FactProviders};

use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

use crate::config::RuleSource;

const DEFAULT_PRIORITY: i64 = 1;

fn default_priority() -> i64 {
    DEFAULT_PRIORITY
}

/// Outcome payload of a matched rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleEvent {
    #[serde(rename = "type", default)]
    pub event_type: String,
    #[serde(default)]
    pub params: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Rule {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default = "default_priority")]
    pub priority: i64,
    pub conditions: Condition,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event: Option<RuleEvent>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub events: Vec<RuleEvent>,
}

impl Rule {
    pub fn all_events(&self) -> impl Iterator<Item = &RuleEvent> {
        self.event.iter().chain(self.events.iter())
    }
}

/// Immutable, priority-ordered rule list.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RuleSet {
    rules: Vec<Rule>,
}

impl RuleSet {
    /// Orders by descending priority; equal priorities keep definition order.
    pub fn new(mut rules: Vec<Rule>) -> Result<Self, RuleLoadError> {
        for (position, rule) in rules.iter().enumerate() {
            if rule.all_events().next().is_none() {
                return Err(RuleLoadError::MissingEvent {
                    rule: rule
                        .name
                        .clone()
                        .unwrap_or_else(|| format!("#{position}")),
                });
            }
        }
        rules.sort_by(|left, right| right.priority.cmp(&left.priority));
        Ok(Self { rules })
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    fn referenced_facts(&self) -> BTreeSet<String> {
        let mut names = BTreeSet::new();
        for rule in &self.rules {
            rule.conditions.referenced_facts(&mut names);
        }
        names
    }
}

/// Result of running every rule against one fact set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RuleEvaluation {
    pub matched: bool,
    pub events: Vec<RuleEvent>,
}

/// Lazily initialised rule engine. Rules load once and never reload.
pub struct RuleEngine {
    source: RuleSource,
    providers: FactProviders,
    rules: OnceCell<Arc<RuleSet>>,
}

impl RuleEngine {
    pub fn new(source: RuleSource, providers: FactProviders) -> Self {
        Self {
            source,
            providers,
            rules: OnceCell::new(),
        }
    }

    /// Engine with an already-built rule set; `init` becomes a no-op.
    pub fn with_rules(rules: RuleSet, providers: FactProviders) -> Self {
        Self {
            source: RuleSource::empty(),
            providers,
            rules: OnceCell::from(Arc::new(rules)),
        }
    }

    /// Idempotent. A malformed source is logged and treated as an empty rule set.
    pub async fn init(&self) -> Arc<RuleSet> {
        self.rules
            .get_or_init(|| async {
                match RuleSet::load(&self.source) {
                    Ok(rules) => {
                        info!(rules = rules.len(), "rule engine initialised");
                        Arc::new(rules)
                    }
                    Err(error) => {
                        warn!(%error, "rule source rejected; continuing without rules");
                        Arc::new(RuleSet::default())
                    }
                }
            })
            .await
            .clone()
    }

    /// Runs every rule; never fails.
    pub async fn evaluate(&self, facts: &Map<String, Value>) -> RuleEvaluation {
        let rules = self.init().await;
        if rules.is_empty() {
            return RuleEvaluation::default();
        }

        let mut almanac = Almanac::new(facts, &self.providers);
        for name in rules.referenced_facts() {
            almanac.resolve(&name).await;
        }

        let events: Vec<RuleEvent> = rules
            .rules()
            .iter()
            .filter(|rule| rule.conditions.evaluate(almanac.values()))
            .inspect(|rule| {
                debug!(
                    rule = rule.name.as_deref().unwrap_or("unnamed"),
                    "rule matched"
                )
            })
            .flat_map(|rule| rule.all_events().cloned())
            .collect();

        RuleEvaluation {
            matched: !events.is_empty(),
            events,
        }
    }
}

/// Failures reading or validating a rule source.
#[derive(Debug, thiserror::Error)]
pub enum RuleLoadError {
    #[error("rule definitions are not a valid JSON rule array: {0}")]
    Json(#[source] serde_json::Error),
    #[error("unable to read rule file {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("rule {rule} declares no event")]
    MissingEvent { rule: String },
}
