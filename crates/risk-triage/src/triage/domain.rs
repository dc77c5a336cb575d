use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

/// Probability mass at or above which a case is flagged for immediate assistance.
pub const IMMEDIATE_ASSISTANCE_THRESHOLD: f64 = 0.5;

/// Four-class predicted scale, in canonical index order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PredictedRisk {
    Economic,
    Psychological,
    Physical,
    Sexual,
}

impl PredictedRisk {
    pub const ALL: [PredictedRisk; 4] = [
        PredictedRisk::Economic,
        PredictedRisk::Psychological,
        PredictedRisk::Physical,
        PredictedRisk::Sexual,
    ];

    pub fn index(self) -> usize {
        match self {
            PredictedRisk::Economic => 0,
            PredictedRisk::Psychological => 1,
            PredictedRisk::Physical => 2,
            PredictedRisk::Sexual => 3,
        }
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// Case-insensitive match on the canonical label.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "economic" => Some(Self::Economic),
            "psychological" => Some(Self::Psychological),
            "physical" => Some(Self::Physical),
            "sexual" => Some(Self::Sexual),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            PredictedRisk::Economic => "Economic",
            PredictedRisk::Psychological => "Psychological",
            PredictedRisk::Physical => "Physical",
            PredictedRisk::Sexual => "Sexual",
        }
    }

    /// Physical and sexual cases are the two highest-severity classes.
    pub fn is_severe(self) -> bool {
        matches!(self, PredictedRisk::Physical | PredictedRisk::Sexual)
    }
}

impl fmt::Display for PredictedRisk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Three-level persisted scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StoredRisk {
    Low,
    Medium,
    High,
}

impl StoredRisk {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "low" => Some(Self::Low),
            "medium" => Some(Self::Medium),
            "high" => Some(Self::High),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            StoredRisk::Low => "Low",
            StoredRisk::Medium => "Medium",
            StoredRisk::High => "High",
        }
    }
}

impl fmt::Display for StoredRisk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Victim category used to tailor recommended actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum VictimType {
    Child,
    Woman,
    #[default]
    Unspecified,
}

impl VictimType {
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "child" | "minor" | "bata" => Self::Child,
            "woman" | "women" | "babae" => Self::Woman,
            _ => Self::Unspecified,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            VictimType::Child => "child",
            VictimType::Woman => "woman",
            VictimType::Unspecified => "",
        }
    }
}

impl From<String> for VictimType {
    fn from(value: String) -> Self {
        Self::parse(&value)
    }
}

/// Cascade step that produced an assessment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DecisionStage {
    Manual,
    Keyword,
    Rule,
    Model,
    Heuristic,
}

impl DecisionStage {
    pub fn label(self) -> &'static str {
        match self {
            DecisionStage::Manual => "manual",
            DecisionStage::Keyword => "keyword",
            DecisionStage::Rule => "rule",
            DecisionStage::Model => "model",
            DecisionStage::Heuristic => "heuristic",
        }
    }
}

impl fmt::Display for DecisionStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Incident report plus the structured metadata captured at intake.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncidentPayload {
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub incident_type: String,
    #[serde(default)]
    pub victim_type: VictimType,
    #[serde(default)]
    pub assigned_officer: Option<String>,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub perpetrator: Option<String>,
    #[serde(default, deserialize_with = "deserialize_optional_stored_risk")]
    pub manual_risk_level: Option<StoredRisk>,
    #[serde(default)]
    pub victim_id: Option<String>,
}

/// Unknown or blank override labels mean "no override" rather than a malformed payload.
fn deserialize_optional_stored_risk<'de, D>(deserializer: D) -> Result<Option<StoredRisk>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.as_deref().and_then(StoredRisk::parse))
}

/// Engine output, including which stage decided it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskAssessment {
    pub predicted_risk: Option<PredictedRisk>,
    pub stored_risk: StoredRisk,
    pub probabilities: Vec<f64>,
    pub suggestion: String,
    pub immediate_assistance_probability: f64,
    pub requires_immediate_assistance: bool,
    pub decision_stage: DecisionStage,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub matched_keyword: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rule_event: Option<serde_json::Value>,
}

impl RiskAssessment {
    /// Builds an assessment whose assistance flag follows the probability threshold.
    pub fn new(
        decision_stage: DecisionStage,
        predicted_risk: Option<PredictedRisk>,
        stored_risk: StoredRisk,
        probabilities: Vec<f64>,
        immediate_assistance_probability: f64,
        suggestion: impl Into<String>,
    ) -> Self {
        let immediate = immediate_assistance_probability.clamp(0.0, 1.0);
        Self {
            predicted_risk,
            stored_risk,
            probabilities,
            suggestion: suggestion.into(),
            immediate_assistance_probability: immediate,
            requires_immediate_assistance: immediate >= IMMEDIATE_ASSISTANCE_THRESHOLD,
            decision_stage,
            matched_keyword: None,
            rule_event: None,
        }
    }

    pub fn summary(&self) -> String {
        let risk = self
            .predicted_risk
            .map(PredictedRisk::label)
            .unwrap_or("unclassified");
        let assistance = if self.requires_immediate_assistance {
            "immediate assistance required"
        } else {
            "no immediate assistance flagged"
        };
        format!(
            "{} stage: {} risk stored as {} ({}, p={:.2})",
            self.decision_stage,
            risk,
            self.stored_risk,
            assistance,
            self.immediate_assistance_probability
        )
    }
}

/// Mass on the two highest-severity classes of a four-slot distribution.
pub fn immediate_mass(probabilities: &[f64]) -> Option<f64> {
    if probabilities.len() != PredictedRisk::ALL.len() {
        return None;
    }
    Some(
        probabilities[PredictedRisk::Physical.index()]
            + probabilities[PredictedRisk::Sexual.index()],
    )
}
