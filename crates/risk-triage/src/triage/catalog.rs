//! Human-readable recommended actions and synthetic probability vectors.

use super::domain::{PredictedRisk, StoredRisk, VictimType};
use super::lexicon::KeywordCluster;

const GENERIC_SEXUAL: &str = "Provide immediate medical and psychosocial support, coordinate with the WCPD for a medico-legal examination, and assist with case filing.";
const GENERIC_PHYSICAL: &str = "Ensure the victim's immediate safety, arrange a medical examination to document injuries, and consider a Barangay Protection Order.";
const GENERIC_PSYCHOLOGICAL: &str = "Refer for psychological counseling and safety planning, document the abuse, and monitor for escalation.";
const GENERIC_ECONOMIC: &str = "Provide legal assistance on financial support and property rights, and refer to social welfare for livelihood aid.";
const GENERIC_DEFAULT: &str = "Assess the case further and coordinate with the assigned officer on next steps.";

/// Category-level action. The incident type wins over the predicted class when it names
/// a category.
pub fn generic(predicted: Option<PredictedRisk>, incident_type: &str) -> &'static str {
    match incident_category(incident_type).or(predicted) {
        Some(PredictedRisk::Sexual) => GENERIC_SEXUAL,
        Some(PredictedRisk::Physical) => GENERIC_PHYSICAL,
        Some(PredictedRisk::Psychological) => GENERIC_PSYCHOLOGICAL,
        Some(PredictedRisk::Economic) => GENERIC_ECONOMIC,
        None => GENERIC_DEFAULT,
    }
}

/// Substring classification of a free-form incident type.
fn incident_category(incident_type: &str) -> Option<PredictedRisk> {
    let lowered = incident_type.to_lowercase();
    if lowered.contains("sexual") {
        Some(PredictedRisk::Sexual)
    } else if lowered.contains("physical") {
        Some(PredictedRisk::Physical)
    } else if lowered.contains("psych") {
        Some(PredictedRisk::Psychological)
    } else if lowered.contains("economic") || lowered.contains("financial") {
        Some(PredictedRisk::Economic)
    } else {
        None
    }
}

/// Tailored message for an officer-supplied risk level.
pub fn for_manual_override(stored: StoredRisk, incident_type: &str) -> &'static str {
    let lowered = incident_type.to_lowercase();
    if lowered.contains("sexual") {
        match stored {
            StoredRisk::High => "High-risk sexual violence case: escort the survivor for a medico-legal examination immediately, arrange shelter, and file the complaint with the WCPD.",
            StoredRisk::Medium => "Sexual violence case under officer review: schedule a medico-legal examination, provide psychosocial support, and prepare the complaint.",
            StoredRisk::Low => "Sexual harassment concern: document the incident, advise on reporting options, and schedule a follow-up interview.",
        }
    } else if lowered.contains("physical") {
        match stored {
            StoredRisk::High => "High-risk physical violence case: secure the victim's safety now, arrange medical treatment, and apply for a protection order.",
            StoredRisk::Medium => "Physical violence case under officer review: document injuries, arrange a medical check, and agree on a safety plan.",
            StoredRisk::Low => "Minor physical altercation: record the incident, mediate at the barangay if appropriate, and monitor for recurrence.",
        }
    } else if lowered.contains("psych") {
        match stored {
            StoredRisk::High => "High-risk psychological abuse: prioritize a safety plan and urgent counseling, and assess for threats of lethal violence.",
            StoredRisk::Medium => "Psychological abuse under officer review: refer for counseling and document the pattern of abuse.",
            StoredRisk::Low => "Emotional distress reported: offer counseling resources and schedule a welfare check.",
        }
    } else {
        match stored {
            StoredRisk::High => "High-risk economic abuse: secure immediate financial assistance through social welfare and file for support under RA 9262.",
            StoredRisk::Medium => "Economic abuse under officer review: refer to the PAO for support claims and to livelihood programs.",
            StoredRisk::Low => "Financial concern reported: provide information on support rights and budgeting assistance.",
        }
    }
}

/// Response attached to the exact matched phrase, selected by victim type. Victims who
/// are neither a child nor a woman get the woman message.
pub fn for_keyword(matched_keyword: &str, victim_type: VictimType) -> Option<&'static str> {
    let response = KeywordCluster::for_phrase(matched_keyword)?.response?;
    Some(match victim_type {
        VictimType::Child => response.child,
        VictimType::Woman | VictimType::Unspecified => response.woman,
    })
}

/// Fallback action for a keyword category when the phrase has no response of its own.
pub fn for_category(category: PredictedRisk, victim_type: VictimType) -> &'static str {
    let child = victim_type == VictimType::Child;
    match category {
        PredictedRisk::Sexual if child => "Report the suspected child sexual abuse to the WCPD and DSWD immediately and arrange a child-friendly medico-legal examination.",
        PredictedRisk::Sexual => "Escort the survivor for a medico-legal examination, preserve evidence, and provide psychosocial support.",
        PredictedRisk::Physical if child => "Bring the child for medical examination and coordinate with the DSWD on protective custody.",
        PredictedRisk::Physical => "Secure the victim's safety, document injuries through a medical examination, and assist with a protection order.",
        PredictedRisk::Psychological if child => "Refer the child to a social worker for psychosocial intervention and monitor the home situation.",
        PredictedRisk::Psychological => "Refer the victim for psychological counseling and document the abuse for a protection order.",
        PredictedRisk::Economic if child => "Refer the household to the MSWDO for assessment of the child's basic needs and support.",
        PredictedRisk::Economic => "Refer the victim to the PAO for financial support claims and to livelihood assistance programs.",
    }
}

/// Manufactures a distribution without a model: `strength` on the incident type's slot
/// and the remainder spread evenly over the other three.
pub fn synthesize_probabilities(incident_type: &str, stored: Option<StoredRisk>) -> Vec<f64> {
    let index = PredictedRisk::parse(incident_type)
        .map(PredictedRisk::index)
        .unwrap_or(0);
    let strength = match stored {
        Some(StoredRisk::High) => 0.9,
        Some(StoredRisk::Medium) => 0.6,
        Some(StoredRisk::Low) => 0.25,
        None => 0.5,
    };
    let base = (1.0 - strength) / 3.0;

    (0..PredictedRisk::ALL.len())
        .map(|slot| if slot == index { strength } else { base })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generic_prefers_incident_type_over_prediction() {
        assert_eq!(
            generic(Some(PredictedRisk::Economic), "Sexual Harassment"),
            GENERIC_SEXUAL
        );
        assert_eq!(generic(Some(PredictedRisk::Physical), "Other"), GENERIC_PHYSICAL);
        assert_eq!(generic(None, "financial"), GENERIC_ECONOMIC);
        assert_eq!(generic(None, "Other"), GENERIC_DEFAULT);
    }

    #[test]
    fn manual_override_messages_are_distinct() {
        let mut messages = Vec::new();
        for incident in ["Sexual", "Physical", "Psychological", "Economic"] {
            for stored in [StoredRisk::Low, StoredRisk::Medium, StoredRisk::High] {
                messages.push(for_manual_override(stored, incident));
            }
        }
        let mut unique = messages.clone();
        unique.sort();
        unique.dedup();
        assert_eq!(unique.len(), 12);
        assert_eq!(
            for_manual_override(StoredRisk::High, "Other"),
            for_manual_override(StoredRisk::High, "Economic")
        );
    }

    #[test]
    fn keyword_response_selects_by_victim_type() {
        let child = for_keyword("ginahasa", VictimType::Child).expect("child message");
        let woman = for_keyword("raped", VictimType::Woman).expect("woman message");
        let unspecified = for_keyword("rape", VictimType::Unspecified).expect("default");
        assert!(child.contains("child"));
        assert_eq!(woman, unspecified);
        assert_eq!(for_keyword("cybersex", VictimType::Woman), None);
        assert_eq!(for_keyword("not a keyword", VictimType::Woman), None);
    }

    #[test]
    fn synthesized_vectors_sum_to_one() {
        let medium = synthesize_probabilities("Physical", Some(StoredRisk::Medium));
        assert_eq!(medium.len(), 4);
        assert!((medium[2] - 0.6).abs() < 1e-12);
        assert!((medium[0] - 0.4 / 3.0).abs() < 1e-12);

        for stored in [None, Some(StoredRisk::Low), Some(StoredRisk::High)] {
            let vector = synthesize_probabilities("Unknown", stored);
            let total: f64 = vector.iter().sum();
            assert!((total - 1.0).abs() < 1e-6);
            assert!(vector[0] >= vector[1]);
        }
    }
}
