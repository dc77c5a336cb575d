use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use risk_triage::config::{AppConfig, RuleSource};
use risk_triage::error::AppError;
use risk_triage::triage::{
    parse_cases, parse_victims, InMemoryCaseCorpus, InMemoryVictimDirectory, RiskClassifier,
};
use serde::de::DeserializeOwned;

/// Reads JSON from a file, or from stdin when the path is `-`.
pub(crate) fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, AppError> {
    let raw = if path.as_os_str() == "-" {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        buffer
    } else {
        std::fs::read_to_string(path)?
    };
    Ok(serde_json::from_str(&raw)?)
}

pub(crate) fn load_cases(path: Option<&Path>) -> Result<InMemoryCaseCorpus, AppError> {
    match path {
        Some(path) => {
            let records = parse_cases(File::open(path)?)?;
            tracing::info!(cases = records.len(), path = %path.display(), "case export loaded");
            Ok(InMemoryCaseCorpus::new(records))
        }
        None => Ok(InMemoryCaseCorpus::default()),
    }
}

pub(crate) fn load_victims(path: Option<&Path>) -> Result<InMemoryVictimDirectory, AppError> {
    match path {
        Some(path) => {
            let victims = parse_victims(File::open(path)?)?;
            tracing::info!(victims = victims.len(), path = %path.display(), "victim export loaded");
            Ok(InMemoryVictimDirectory::new(victims))
        }
        None => Ok(InMemoryVictimDirectory::default()),
    }
}

/// A `--rules` flag replaces whatever the environment configured.
pub(crate) fn rule_source(config: &AppConfig, rules: Option<PathBuf>) -> RuleSource {
    match rules {
        Some(path) => RuleSource::file(path),
        None => config.rules.clone(),
    }
}

pub(crate) fn build_classifier(
    config: &AppConfig,
    cases: Option<&Path>,
    victims: Option<&Path>,
    rules: Option<PathBuf>,
) -> Result<RiskClassifier, AppError> {
    let cases = load_cases(cases)?;
    let victims = load_victims(victims)?;
    Ok(RiskClassifier::new(
        Arc::new(cases),
        Arc::new(victims),
        rule_source(config, rules),
        config.training.clone(),
    ))
}
