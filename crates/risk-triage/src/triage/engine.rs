use std::sync::Arc;

use serde_json::{Map, Value};
use tracing::{debug, warn};

use super::cache::ModelCache;
use super::catalog;
use super::classifier::{argmax, ClassifierError, TrainableClassifier, TrainedModel};
use super::corpus::{CaseCorpusReader, VictimAttributeReader};
use super::domain::{
    immediate_mass, DecisionStage, IncidentPayload, PredictedRisk, RiskAssessment, VictimType,
};
use super::lexical::LexicalMatcher;
use super::rules::{FactProviders, RuleEngine, RuleEvaluation, RuleEvent};
use super::taxonomy::legacy_to_index;
use crate::config::{RuleSource, TrainingConfig};

/// Immediate-assistance probability for keyword hits in the two severe categories.
const KEYWORD_SEVERE_IMMEDIATE: f64 = 1.0;
const KEYWORD_OTHER_IMMEDIATE: f64 = 0.3;
/// Descriptions longer than this are treated as physical by the heuristic.
const HEURISTIC_LONG_DESCRIPTION_CHARS: usize = 500;
const HEURISTIC_BASE_MASS: f64 = 0.05;

/// Failure inside a stage; absorbed by the cascade and treated as "not applicable".
#[derive(Debug, thiserror::Error)]
enum StageError {
    #[error(transparent)]
    Classifier(#[from] ClassifierError),
}

type StageOutcome = Result<Option<RiskAssessment>, StageError>;

/// Five-stage triage cascade: manual, keyword, rule, model, heuristic.
///
/// Every entry point is total: dependency failures are logged and fall through to the
/// next stage, and the heuristic always produces an answer.
pub struct RiskClassifier {
    lexical: LexicalMatcher,
    rules: RuleEngine,
    trainer: TrainableClassifier,
    cache: Arc<ModelCache>,
    training: TrainingConfig,
}

impl RiskClassifier {
    pub fn new(
        cases: Arc<dyn CaseCorpusReader>,
        victims: Arc<dyn VictimAttributeReader>,
        rule_source: RuleSource,
        training: TrainingConfig,
    ) -> Self {
        let providers = FactProviders::new(cases.clone(), victims);
        Self {
            lexical: LexicalMatcher,
            rules: RuleEngine::new(rule_source, providers),
            trainer: TrainableClassifier::new(cases).with_seed(training.seed),
            cache: Arc::new(ModelCache::new()),
            training,
        }
    }

    pub fn with_rule_engine(mut self, rules: RuleEngine) -> Self {
        self.rules = rules;
        self
    }

    /// Shares a model cache with other classifiers in the process.
    pub fn with_cache(mut self, cache: Arc<ModelCache>) -> Self {
        self.cache = cache;
        self
    }

    pub fn cache(&self) -> &Arc<ModelCache> {
        &self.cache
    }

    /// Runs the cascade with a caller-supplied model (if any).
    pub async fn suggest(
        &self,
        payload: &IncidentPayload,
        model: Option<&TrainedModel>,
    ) -> RiskAssessment {
        if let Some(assessment) = self.decide_without_model(payload).await {
            return assessment;
        }
        self.decide_with_model(payload, model)
    }

    /// Runs the cascade, pulling the model from the shared cache only when the first
    /// three stages do not apply. A cache miss trains once for all concurrent callers.
    pub async fn suggest_cached(&self, payload: &IncidentPayload) -> RiskAssessment {
        if let Some(assessment) = self.decide_without_model(payload).await {
            return assessment;
        }
        let model = if self.training.auto_train {
            let min_samples = self.training.min_samples;
            self.cache
                .get_or_train(|| train_or_none(self.trainer.clone(), min_samples))
                .await
        } else {
            self.cache.current()
        };
        self.decide_with_model(payload, model.as_deref())
    }

    /// Direct rule evaluation, independent of the cascade.
    pub async fn evaluate_rules(&self, facts: &Map<String, Value>) -> RuleEvaluation {
        self.rules.evaluate(facts).await
    }

    /// `None` when data is insufficient or the corpus cannot be read.
    pub async fn train_model_from_cases(&self, min_samples: usize) -> Option<TrainedModel> {
        train_or_none(self.trainer.clone(), min_samples).await
    }

    /// Forces a fresh training run into the shared cache.
    pub async fn retrain(&self) -> Option<Arc<TrainedModel>> {
        let min_samples = self.training.min_samples;
        self.cache
            .retrain(|| train_or_none(self.trainer.clone(), min_samples))
            .await
    }

    async fn decide_without_model(&self, payload: &IncidentPayload) -> Option<RiskAssessment> {
        if let Some(assessment) = settle(DecisionStage::Manual, manual_override(payload))
            .or_else(|| settle(DecisionStage::Keyword, self.keyword_match(payload)))
        {
            return Some(assessment);
        }
        settle(DecisionStage::Rule, self.rule_match(payload).await)
    }

    fn decide_with_model(
        &self,
        payload: &IncidentPayload,
        model: Option<&TrainedModel>,
    ) -> RiskAssessment {
        model
            .and_then(|model| settle(DecisionStage::Model, model_prediction(model, payload)))
            .unwrap_or_else(|| {
                debug!(stage = %DecisionStage::Heuristic, "stage decided");
                heuristic(payload)
            })
    }

    fn keyword_match(&self, payload: &IncidentPayload) -> StageOutcome {
        let Some(found) = self.lexical.scan(&payload.description) else {
            return Ok(None);
        };

        let category = found.category;
        let suggestion = catalog::for_keyword(&found.matched_keyword, payload.victim_type)
            .unwrap_or_else(|| catalog::for_category(category, payload.victim_type));
        let immediate = if category.is_severe() {
            KEYWORD_SEVERE_IMMEDIATE
        } else {
            KEYWORD_OTHER_IMMEDIATE
        };

        let mut assessment = RiskAssessment::new(
            DecisionStage::Keyword,
            Some(category),
            category.stored(),
            Vec::new(),
            immediate,
            suggestion,
        );
        assessment.matched_keyword = Some(found.matched_keyword);
        Ok(Some(assessment))
    }

    async fn rule_match(&self, payload: &IncidentPayload) -> StageOutcome {
        let evaluation = self.rules.evaluate(&payload_facts(payload)).await;
        Ok(evaluation
            .events
            .first()
            .map(|event| from_rule_event(event, payload)))
    }
}

/// Owns its trainer so the run can outlive the caller that started it.
async fn train_or_none(trainer: TrainableClassifier, min_samples: usize) -> Option<TrainedModel> {
    match trainer.train(min_samples).await {
        Ok(model) => model,
        Err(error) => {
            warn!(%error, "classifier training failed");
            None
        }
    }
}

/// Logs the stage outcome and converts failures into fallthrough.
fn settle(stage: DecisionStage, outcome: StageOutcome) -> Option<RiskAssessment> {
    match outcome {
        Ok(Some(assessment)) => {
            debug!(stage = %stage, risk = ?assessment.predicted_risk, "stage decided");
            Some(assessment)
        }
        Ok(None) => None,
        Err(error) => {
            warn!(stage = %stage, %error, "stage failed; falling through");
            None
        }
    }
}

fn manual_override(payload: &IncidentPayload) -> StageOutcome {
    let Some(stored) = payload.manual_risk_level else {
        return Ok(None);
    };

    let probabilities = catalog::synthesize_probabilities(&payload.incident_type, Some(stored));
    let immediate = immediate_mass(&probabilities).unwrap_or(0.0);
    Ok(Some(RiskAssessment::new(
        DecisionStage::Manual,
        PredictedRisk::parse(&payload.incident_type),
        stored,
        probabilities,
        immediate,
        catalog::for_manual_override(stored, &payload.incident_type),
    )))
}

fn model_prediction(model: &TrainedModel, payload: &IncidentPayload) -> StageOutcome {
    let probabilities = TrainableClassifier::predict(model, payload)?.to_vec();
    let predicted = argmax(&probabilities);
    let immediate = immediate_mass(&probabilities).unwrap_or(0.0);
    Ok(Some(RiskAssessment::new(
        DecisionStage::Model,
        Some(predicted),
        predicted.stored(),
        probabilities,
        immediate,
        catalog::generic(Some(predicted), &payload.incident_type),
    )))
}

/// Deterministic last resort; always applicable.
fn heuristic(payload: &IncidentPayload) -> RiskAssessment {
    let predicted = match payload.incident_type.trim().to_lowercase().as_str() {
        "sexual" => PredictedRisk::Sexual,
        "physical" => PredictedRisk::Physical,
        "psychological" => PredictedRisk::Psychological,
        "economic" | "financial" => PredictedRisk::Economic,
        _ if payload.description.chars().count() > HEURISTIC_LONG_DESCRIPTION_CHARS => {
            PredictedRisk::Physical
        }
        _ if payload
            .perpetrator
            .as_deref()
            .is_some_and(|perpetrator| !perpetrator.trim().is_empty()) =>
        {
            PredictedRisk::Physical
        }
        _ => PredictedRisk::Economic,
    };

    let others = (PredictedRisk::ALL.len() - 1) as f64;
    let probabilities: Vec<f64> = PredictedRisk::ALL
        .iter()
        .map(|class| {
            if *class == predicted {
                1.0 - HEURISTIC_BASE_MASS * others
            } else {
                HEURISTIC_BASE_MASS
            }
        })
        .collect();
    let immediate = immediate_mass(&probabilities).unwrap_or(0.0);

    RiskAssessment::new(
        DecisionStage::Heuristic,
        Some(predicted),
        predicted.stored(),
        probabilities,
        immediate,
        catalog::generic(Some(predicted), &payload.incident_type),
    )
}

/// Maps the first matched event's params onto an assessment; absent params fall back
/// to catalog and taxonomy defaults.
fn from_rule_event(event: &RuleEvent, payload: &IncidentPayload) -> RiskAssessment {
    let params = &event.params;
    let label = params
        .get("predictedRisk")
        .or_else(|| params.get("risk"))
        .and_then(Value::as_str);
    let escalate = params
        .get("action")
        .and_then(Value::as_str)
        .is_some_and(|action| action.eq_ignore_ascii_case("escalate"));

    let predicted = match label {
        Some(label) => legacy_to_index(Some(label), &payload.incident_type),
        None if escalate => PredictedRisk::Sexual,
        None => PredictedRisk::parse(&payload.incident_type).unwrap_or(PredictedRisk::Economic),
    };

    let probabilities = params
        .get("probabilities")
        .and_then(probability_vector)
        .unwrap_or_default();
    let immediate = params
        .get("immediateProbability")
        .and_then(Value::as_f64)
        .or_else(|| immediate_mass(&probabilities))
        .unwrap_or(if predicted.is_severe() {
            KEYWORD_SEVERE_IMMEDIATE
        } else {
            KEYWORD_OTHER_IMMEDIATE
        });
    let suggestion = params
        .get("suggestion")
        .and_then(Value::as_str)
        .filter(|text| !text.trim().is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| catalog::generic(Some(predicted), &payload.incident_type).to_string());

    let mut assessment = RiskAssessment::new(
        DecisionStage::Rule,
        Some(predicted),
        predicted.stored(),
        probabilities,
        immediate,
        suggestion,
    );
    if let Some(required) = params.get("requiresImmediate").and_then(Value::as_bool) {
        assessment.requires_immediate_assistance = required;
    }
    assessment.rule_event = serde_json::to_value(event).ok();
    assessment
}

/// Accepts only four finite, non-negative numbers.
fn probability_vector(value: &Value) -> Option<Vec<f64>> {
    let items = value.as_array()?;
    if items.len() != PredictedRisk::ALL.len() {
        return None;
    }
    items
        .iter()
        .map(|item| item.as_f64().filter(|p| p.is_finite() && *p >= 0.0))
        .collect()
}

/// Fact map handed to the rule engine for one payload.
pub fn payload_facts(payload: &IncidentPayload) -> Map<String, Value> {
    let mut facts = Map::new();
    facts.insert("description".into(), Value::from(payload.description.clone()));
    facts.insert("incidentType".into(), Value::from(payload.incident_type.clone()));
    facts.insert("status".into(), Value::from(payload.status.clone()));
    if payload.victim_type != VictimType::Unspecified {
        facts.insert("victimType".into(), Value::from(payload.victim_type.label()));
    }
    if let Some(victim_id) = &payload.victim_id {
        facts.insert("victimId".into(), Value::from(victim_id.clone()));
    }
    if let Some(perpetrator) = &payload.perpetrator {
        facts.insert("perpetrator".into(), Value::from(perpetrator.clone()));
    }
    if let Some(officer) = &payload.assigned_officer {
        facts.insert("assignedOfficer".into(), Value::from(officer.clone()));
    }
    facts
}
