//! Conversions between the four-class predicted scale and the three-level stored scale.

use super::domain::{PredictedRisk, StoredRisk};

/// Incident-type slots used for one-hot encoding, in feature order.
pub const INCIDENT_TYPE_SLOTS: [&str; 5] = ["Economic", "Psychological", "Physical", "Sexual", "Other"];

impl PredictedRisk {
    pub fn stored(self) -> StoredRisk {
        match self {
            PredictedRisk::Economic => StoredRisk::Low,
            PredictedRisk::Psychological => StoredRisk::Medium,
            PredictedRisk::Physical | PredictedRisk::Sexual => StoredRisk::High,
        }
    }
}

/// Total over all strings: anything that is not a canonical class stores as `Low`.
pub fn to_stored(predicted: &str) -> StoredRisk {
    PredictedRisk::parse(predicted)
        .map(PredictedRisk::stored)
        .unwrap_or(StoredRisk::Low)
}

/// Maps canonical or legacy labels onto the four-class scale.
///
/// Legacy `High` is ambiguous between physical and sexual cases, so the incident type
/// decides: only a sexual incident maps to `Sexual`. Historical records rely on this.
pub fn legacy_to_index(label: Option<&str>, incident_type: &str) -> PredictedRisk {
    let sexual_incident = incident_type.trim().eq_ignore_ascii_case("sexual");
    let label = label.map(str::trim).filter(|value| !value.is_empty());

    if let Some(predicted) = label.and_then(PredictedRisk::parse) {
        return predicted;
    }

    match label.and_then(StoredRisk::parse) {
        Some(StoredRisk::Low) => PredictedRisk::Economic,
        Some(StoredRisk::Medium) => PredictedRisk::Psychological,
        Some(StoredRisk::High) if sexual_incident => PredictedRisk::Sexual,
        Some(StoredRisk::High) => PredictedRisk::Physical,
        None if sexual_incident => PredictedRisk::Sexual,
        None => PredictedRisk::Economic,
    }
}

/// Exact-match one-hot over [`INCIDENT_TYPE_SLOTS`]; all zeros when nothing matches.
pub fn one_hot(incident_type: &str) -> [f64; 5] {
    let mut encoded = [0.0; 5];
    if let Some(slot) = INCIDENT_TYPE_SLOTS
        .iter()
        .position(|candidate| *candidate == incident_type)
    {
        encoded[slot] = 1.0;
    }
    encoded
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn to_stored_is_total() {
        assert_eq!(to_stored("Economic"), StoredRisk::Low);
        assert_eq!(to_stored("Psychological"), StoredRisk::Medium);
        assert_eq!(to_stored("Physical"), StoredRisk::High);
        assert_eq!(to_stored("Sexual"), StoredRisk::High);
        assert_eq!(to_stored("garbage"), StoredRisk::Low);
        assert_eq!(to_stored(""), StoredRisk::Low);
        assert_eq!(to_stored("High"), StoredRisk::Low);
    }

    #[test]
    fn stored_mapping_covers_every_class() {
        for predicted in PredictedRisk::ALL {
            assert_eq!(to_stored(predicted.label()), predicted.stored());
        }
    }

    #[test]
    fn legacy_high_depends_on_incident_type() {
        assert_eq!(
            legacy_to_index(Some("High"), "Sexual"),
            PredictedRisk::Sexual
        );
        assert_eq!(
            legacy_to_index(Some("High"), "sexual"),
            PredictedRisk::Sexual
        );
        assert_eq!(
            legacy_to_index(Some("High"), "Physical"),
            PredictedRisk::Physical
        );
        assert_eq!(legacy_to_index(Some("High"), ""), PredictedRisk::Physical);
        assert_eq!(legacy_to_index(Some("High"), "").index(), 2);
        assert_eq!(legacy_to_index(Some("High"), "Sexual").index(), 3);
    }

    #[test]
    fn legacy_low_and_medium_ignore_incident_type() {
        assert_eq!(
            legacy_to_index(Some("Low"), "Sexual"),
            PredictedRisk::Economic
        );
        assert_eq!(
            legacy_to_index(Some("Medium"), "Physical"),
            PredictedRisk::Psychological
        );
    }

    #[test]
    fn legacy_accepts_canonical_labels_and_defaults() {
        assert_eq!(
            legacy_to_index(Some("Physical"), "Sexual"),
            PredictedRisk::Physical
        );
        assert_eq!(legacy_to_index(None, "Sexual"), PredictedRisk::Sexual);
        assert_eq!(legacy_to_index(None, "Physical"), PredictedRisk::Economic);
        assert_eq!(legacy_to_index(Some(""), "Other"), PredictedRisk::Economic);
    }

    #[test]
    fn one_hot_is_exact_match() {
        assert_eq!(one_hot("Physical"), [0.0, 0.0, 1.0, 0.0, 0.0]);
        assert_eq!(one_hot("Other"), [0.0, 0.0, 0.0, 0.0, 1.0]);
        assert_eq!(one_hot("physical"), [0.0; 5]);
        assert_eq!(one_hot(""), [0.0; 5]);
    }
}
