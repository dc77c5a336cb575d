//! Incident risk triage: taxonomy, keyword lexicon, rule engine, classifier and the
//! cascade that combines them.

pub mod cache;
pub mod catalog;
pub mod classifier;
pub mod corpus;
pub mod domain;
pub mod engine;
pub mod lexical;
pub mod lexicon;
pub mod rules;
pub mod taxonomy;

pub use cache::ModelCache;
pub use classifier::{argmax, ClassifierError, TrainableClassifier, TrainedModel};
pub use corpus::{
    parse_cases, parse_victims, CaseCorpusReader, CaseFilter, CaseRecord, CorpusError,
    InMemoryCaseCorpus, InMemoryVictimDirectory, VictimAttributeReader, VictimRecord,
};
pub use domain::{
    immediate_mass, DecisionStage, IncidentPayload, PredictedRisk, RiskAssessment, StoredRisk,
    VictimType, IMMEDIATE_ASSISTANCE_THRESHOLD,
};
pub use engine::{payload_facts, RiskClassifier};
pub use lexical::{LexicalMatch, LexicalMatcher};
pub use rules::{FactProviders, Rule, RuleEngine, RuleEvaluation, RuleEvent, RuleLoadError, RuleSet};
pub use taxonomy::{legacy_to_index, to_stored};

#[cfg(test)]
mod tests;
