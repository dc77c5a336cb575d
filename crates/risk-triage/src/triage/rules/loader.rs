use std::fs;
use std::io::ErrorKind;

use super::{Rule, RuleLoadError, RuleSet};
use crate::config::RuleSource;

impl RuleSet {
    /// Parses a JSON array of rule definitions.
    pub fn from_json(raw: &str) -> Result<Self, RuleLoadError> {
        let rules: Vec<Rule> = serde_json::from_str(raw).map_err(RuleLoadError::Json)?;
        Self::new(rules)
    }

    /// Inline JSON takes precedence over the file. A missing file is an empty set.
    pub fn load(source: &RuleSource) -> Result<Self, RuleLoadError> {
        if let Some(raw) = source.inline_json.as_deref() {
            return Self::from_json(raw);
        }

        let Some(path) = source.path.as_ref() else {
            return Ok(Self::default());
        };

        match fs::read_to_string(path) {
            Ok(raw) if raw.trim().is_empty() => Ok(Self::default()),
            Ok(raw) => Self::from_json(&raw),
            Err(error) if error.kind() == ErrorKind::NotFound => Ok(Self::default()),
            Err(error) => Err(RuleLoadError::Io {
                path: path.clone(),
                source: error,
            }),
        }
    }
}
