use std::sync::Arc;

use super::common::*;
use crate::config::{RuleSource, TrainingConfig};
use crate::triage::classifier::{argmax, TRAINING_CORPUS_LIMIT};
use crate::triage::corpus::InMemoryVictimDirectory;
use crate::triage::domain::DecisionStage;

#[tokio::test]
async fn ten_records_are_not_enough_to_train() {
    let engine = classifier(training_corpus(10), RuleSource::empty());
    assert!(engine.train_model_from_cases(50).await.is_none());
}

#[tokio::test]
async fn trained_model_drives_the_model_stage() {
    let engine = classifier(training_corpus(60), RuleSource::empty());
    let model = engine
        .train_model_from_cases(50)
        .await
        .expect("enough data to train");
    assert_eq!(model.sample_count, 60);
    assert!(model.final_loss.is_finite());

    let assessment = engine
        .suggest(&payload(NEUTRAL_DESCRIPTION, "Other"), Some(&model))
        .await;

    assert_eq!(assessment.decision_stage, DecisionStage::Model);
    assert_eq!(assessment.probabilities.len(), 4);
    let total: f64 = assessment.probabilities.iter().sum();
    assert!((total - 1.0).abs() < 1e-6, "sum was {total}");
    let predicted = argmax(&assessment.probabilities);
    assert_eq!(assessment.predicted_risk, Some(predicted));
    assert_eq!(assessment.stored_risk, predicted.stored());
    let expected_immediate = assessment.probabilities[2] + assessment.probabilities[3];
    assert!((assessment.immediate_assistance_probability - expected_immediate).abs() < 1e-9);
}

#[tokio::test]
async fn training_reads_at_most_the_corpus_limit() {
    let engine = classifier(training_corpus(TRAINING_CORPUS_LIMIT + 20), RuleSource::empty());
    let model = engine.train_model_from_cases(50).await.expect("trained");
    assert_eq!(model.sample_count, TRAINING_CORPUS_LIMIT);
}

#[tokio::test]
async fn seeded_training_is_reproducible() {
    let first = classifier(training_corpus(60), RuleSource::empty());
    let second = classifier(training_corpus(60), RuleSource::empty());
    let incident = payload(NEUTRAL_DESCRIPTION, "Physical");

    let a = first.train_model_from_cases(50).await.expect("trained");
    let b = second.train_model_from_cases(50).await.expect("trained");

    assert_eq!(a.final_loss, b.final_loss);
    assert_eq!(
        first.suggest(&incident, Some(&a)).await.probabilities,
        second.suggest(&incident, Some(&b)).await.probabilities
    );
}

#[tokio::test]
async fn concurrent_cached_suggestions_train_once() {
    let corpus = Arc::new(CountingCorpus::new(training_corpus(80)));
    let engine = classifier_with(
        corpus.clone(),
        Arc::new(InMemoryVictimDirectory::default()),
        RuleSource::empty(),
        training_config(),
    );
    let left = payload(NEUTRAL_DESCRIPTION, "Economic");
    let right = payload(NEUTRAL_DESCRIPTION, "Sexual");

    let (first, second) = tokio::join!(engine.suggest_cached(&left), engine.suggest_cached(&right));

    assert_eq!(first.decision_stage, DecisionStage::Model);
    assert_eq!(second.decision_stage, DecisionStage::Model);
    assert_eq!(engine.cache().training_runs(), 1);
    assert_eq!(corpus.reads(), 1);

    engine.suggest_cached(&left).await;
    assert_eq!(engine.cache().training_runs(), 1);
}

#[tokio::test]
async fn cached_suggestion_skips_training_when_an_earlier_stage_decides() {
    let engine = classifier(training_corpus(80), RuleSource::empty());

    let assessment = engine
        .suggest_cached(&payload("Sinakal siya ng kanyang kinakasama.", "Physical"))
        .await;

    assert_eq!(assessment.decision_stage, DecisionStage::Keyword);
    assert_eq!(engine.cache().training_runs(), 0);
}

#[tokio::test]
async fn auto_train_disabled_falls_back_to_heuristic() {
    let engine = classifier_with(
        Arc::new(CountingCorpus::new(training_corpus(80))),
        Arc::new(InMemoryVictimDirectory::default()),
        RuleSource::empty(),
        TrainingConfig {
            auto_train: false,
            ..training_config()
        },
    );

    let assessment = engine.suggest_cached(&payload(NEUTRAL_DESCRIPTION, "Sexual")).await;

    assert_eq!(assessment.decision_stage, DecisionStage::Heuristic);
    assert_eq!(engine.cache().training_runs(), 0);
}

#[tokio::test]
async fn retrain_refreshes_the_cached_model() {
    let engine = classifier(training_corpus(60), RuleSource::empty());
    let first = engine.retrain().await.expect("trained");
    let second = engine.retrain().await.expect("retrained");

    assert_eq!(engine.cache().training_runs(), 2);
    assert!(!Arc::ptr_eq(&first, &second));
    let cached = engine.cache().current().expect("cached");
    assert!(Arc::ptr_eq(&cached, &second));
}

#[tokio::test]
async fn classifiers_sharing_a_cache_reuse_one_model() {
    let first = classifier(training_corpus(60), RuleSource::empty());
    let second = classifier(Vec::new(), RuleSource::empty()).with_cache(first.cache().clone());
    let incident = payload(NEUTRAL_DESCRIPTION, "Other");

    assert_eq!(first.suggest_cached(&incident).await.decision_stage, DecisionStage::Model);
    assert_eq!(second.suggest_cached(&incident).await.decision_stage, DecisionStage::Model);
    assert_eq!(second.cache().training_runs(), 1);
}
