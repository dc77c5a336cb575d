use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer};
use std::io::Read;

use super::{CaseRecord, CorpusError, VictimRecord};

/// Reads a case export with columns
/// `id,victim_id,incident_type,description,status,assigned_officer,risk_level,reported_at`.
pub fn parse_cases<R: Read>(reader: R) -> Result<Vec<CaseRecord>, CorpusError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    let mut records = Vec::new();

    for row in csv_reader.deserialize::<CaseRow>() {
        let row = row?;
        let reported_at = match row.reported_at.as_deref() {
            Some(raw) => Some(parse_timestamp(raw).ok_or_else(|| {
                CorpusError::Malformed(format!("case {}: invalid reported_at '{raw}'", row.id))
            })?),
            None => None,
        };

        records.push(CaseRecord {
            id: row.id,
            victim_id: row.victim_id,
            incident_type: row.incident_type,
            description: row.description,
            status: row.status,
            assigned_officer: row.assigned_officer,
            risk_level: row.risk_level,
            reported_at,
        });
    }

    Ok(records)
}

/// Reads a victim export with columns `id,victim_code,victim_type`.
pub fn parse_victims<R: Read>(reader: R) -> Result<Vec<VictimRecord>, CorpusError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    let mut victims = Vec::new();

    for row in csv_reader.deserialize::<VictimRow>() {
        let row = row?;
        victims.push(VictimRecord {
            id: row.id,
            victim_code: row.victim_code,
            victim_type: row.victim_type,
        });
    }

    Ok(victims)
}

#[derive(Debug, Deserialize)]
struct CaseRow {
    id: String,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    victim_id: Option<String>,
    #[serde(default)]
    incident_type: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    status: String,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    assigned_officer: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    risk_level: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    reported_at: Option<String>,
}

#[derive(Debug, Deserialize)]
struct VictimRow {
    id: String,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    victim_code: Option<String>,
    #[serde(default)]
    victim_type: String,
}

fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    Ok(opt.filter(|value| !value.trim().is_empty()))
}

fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let trimmed = value.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.with_timezone(&Utc));
    }

    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}
