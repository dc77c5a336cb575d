use std::path::PathBuf;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use clap::Args;
use risk_triage::config::AppConfig;
use risk_triage::error::AppError;
use risk_triage::triage::{IncidentPayload, RuleSet, TrainableClassifier};
use serde::Serialize;
use serde_json::{Map, Value};

use crate::infra::{build_classifier, load_cases, read_json, rule_source};

#[derive(Args, Debug)]
pub(crate) struct SuggestArgs {
    /// Incident payload as JSON (`-` reads stdin)
    #[arg(long)]
    pub(crate) payload: PathBuf,
    /// Case export used for rule facts and classifier training
    #[arg(long)]
    pub(crate) cases: Option<PathBuf>,
    /// Victim export used to resolve the victim type
    #[arg(long)]
    pub(crate) victims: Option<PathBuf>,
    /// Rule file overriding TRIAGE_RULES / TRIAGE_RULES_PATH
    #[arg(long)]
    pub(crate) rules: Option<PathBuf>,
    /// Never train a classifier for this request
    #[arg(long)]
    pub(crate) no_train: bool,
    /// Print a one-line summary instead of JSON
    #[arg(long)]
    pub(crate) summary: bool,
}

#[derive(Args, Debug)]
pub(crate) struct RulesEvaluateArgs {
    /// Fact object as JSON (`-` reads stdin)
    #[arg(long)]
    pub(crate) facts: PathBuf,
    /// Case export backing the recentReports fact
    #[arg(long)]
    pub(crate) cases: Option<PathBuf>,
    /// Victim export backing the victimType fact
    #[arg(long)]
    pub(crate) victims: Option<PathBuf>,
    /// Rule file overriding TRIAGE_RULES / TRIAGE_RULES_PATH
    #[arg(long)]
    pub(crate) rules: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub(crate) struct RulesCheckArgs {
    /// Rule file overriding TRIAGE_RULES / TRIAGE_RULES_PATH
    #[arg(long)]
    pub(crate) rules: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub(crate) struct TrainArgs {
    /// Case export to train on
    #[arg(long)]
    pub(crate) cases: PathBuf,
    /// Minimum number of cases required (defaults to TRIAGE_MIN_TRAINING_SAMPLES)
    #[arg(long)]
    pub(crate) min_samples: Option<usize>,
    /// Seed for reproducible training (defaults to TRIAGE_TRAINING_SEED)
    #[arg(long)]
    pub(crate) seed: Option<u64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct TrainingReport {
    trained: bool,
    required_samples: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    sample_count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    final_loss: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    parameters: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    last_trained_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RuleListing {
    name: String,
    priority: i64,
    events: Vec<String>,
}

pub(crate) async fn run_suggest(mut config: AppConfig, args: SuggestArgs) -> Result<(), AppError> {
    let payload: IncidentPayload = read_json(&args.payload)?;
    if args.no_train {
        config.training.auto_train = false;
    }

    let classifier = build_classifier(
        &config,
        args.cases.as_deref(),
        args.victims.as_deref(),
        args.rules,
    )?;
    let assessment = classifier.suggest_cached(&payload).await;
    tracing::info!(
        stage = %assessment.decision_stage,
        stored = %assessment.stored_risk,
        "incident triaged"
    );

    if args.summary {
        println!("{}", assessment.summary());
        println!("Suggested action: {}", assessment.suggestion);
    } else {
        println!("{}", serde_json::to_string_pretty(&assessment)?);
    }
    Ok(())
}

pub(crate) async fn run_rules_evaluate(
    config: AppConfig,
    args: RulesEvaluateArgs,
) -> Result<(), AppError> {
    let facts: Map<String, Value> = read_json(&args.facts)?;
    let classifier = build_classifier(
        &config,
        args.cases.as_deref(),
        args.victims.as_deref(),
        args.rules,
    )?;

    let evaluation = classifier.evaluate_rules(&facts).await;
    println!("{}", serde_json::to_string_pretty(&evaluation)?);
    Ok(())
}

/// Unlike the engine, which degrades to an empty rule set, this reports load errors.
pub(crate) fn run_rules_check(config: AppConfig, args: RulesCheckArgs) -> Result<(), AppError> {
    let source = rule_source(&config, args.rules);
    let rules = RuleSet::load(&source)?;

    tracing::info!(rules = rules.len(), "rule set is valid");
    println!("{}", render_rule_listing(&rules)?);
    Ok(())
}

/// Rules in evaluation order, as the JSON document printed by `rules check`.
fn render_rule_listing(rules: &RuleSet) -> Result<String, serde_json::Error> {
    let listing: Vec<RuleListing> = rules
        .rules()
        .iter()
        .enumerate()
        .map(|(position, rule)| RuleListing {
            name: rule
                .name
                .clone()
                .unwrap_or_else(|| format!("#{position}")),
            priority: rule.priority,
            events: rule
                .all_events()
                .map(|event| event.event_type.clone())
                .collect(),
        })
        .collect();
    serde_json::to_string_pretty(&listing)
}

/// Training failures are surfaced here rather than absorbed.
pub(crate) async fn run_train(config: AppConfig, args: TrainArgs) -> Result<(), AppError> {
    let cases = load_cases(Some(&args.cases))?;
    let min_samples = args.min_samples.unwrap_or(config.training.min_samples);
    let seed = args.seed.or(config.training.seed);

    let trainer = TrainableClassifier::new(Arc::new(cases)).with_seed(seed);
    let model = trainer.train(min_samples).await?;

    let report = match model {
        Some(model) => TrainingReport {
            trained: true,
            required_samples: min_samples,
            sample_count: Some(model.sample_count),
            final_loss: Some(model.final_loss),
            parameters: Some(model.network().num_parameters()),
            last_trained_at: Some(model.last_trained_at),
        },
        None => TrainingReport {
            trained: false,
            required_samples: min_samples,
            sample_count: None,
            final_loss: None,
            parameters: None,
            last_trained_at: None,
        },
    };
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
