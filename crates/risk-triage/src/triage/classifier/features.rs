use crate::triage::corpus::CaseRecord;
use crate::triage::domain::IncidentPayload;
use crate::triage::taxonomy::one_hot;

pub const FEATURE_WIDTH: usize = 8;

/// Descriptions at least this many characters long land in the "long" bucket.
const LONG_DESCRIPTION_CHARS: usize = 200;

const ACTIVE_STATUSES: [&str; 2] = ["Open", "Under Investigation"];

/// Anything that can be turned into the classifier's feature vector.
pub trait Featurize {
    fn incident_type(&self) -> &str;
    fn status(&self) -> &str;
    fn assigned_officer(&self) -> Option<&str>;
    fn description(&self) -> &str;

    /// Incident-type one-hot (5), active flag, officer flag, description-length bucket.
    fn features(&self) -> [f64; FEATURE_WIDTH] {
        let mut features = [0.0; FEATURE_WIDTH];
        features[..5].copy_from_slice(&one_hot(self.incident_type()));

        let status = self.status().trim();
        features[5] = flag(ACTIVE_STATUSES
            .iter()
            .any(|active| active.eq_ignore_ascii_case(status)));
        features[6] = flag(
            self.assigned_officer()
                .is_some_and(|officer| !officer.trim().is_empty()),
        );
        features[7] = flag(self.description().chars().count() >= LONG_DESCRIPTION_CHARS);
        features
    }
}

fn flag(value: bool) -> f64 {
    if value {
        1.0
    } else {
        0.0
    }
}

impl Featurize for IncidentPayload {
    fn incident_type(&self) -> &str {
        &self.incident_type
    }

    fn status(&self) -> &str {
        &self.status
    }

    fn assigned_officer(&self) -> Option<&str> {
        self.assigned_officer.as_deref()
    }

    fn description(&self) -> &str {
        &self.description
    }
}

impl Featurize for CaseRecord {
    fn incident_type(&self) -> &str {
        &self.incident_type
    }

    fn status(&self) -> &str {
        &self.status
    }

    fn assigned_officer(&self) -> Option<&str> {
        self.assigned_officer.as_deref()
    }

    fn description(&self) -> &str {
        &self.description
    }
}
