use serde_json::{json, Map, Value};

use super::common::*;
use crate::config::RuleSource;
use crate::triage::domain::VictimType;
use crate::triage::engine::payload_facts;

fn facts(value: Value) -> Map<String, Value> {
    value.as_object().cloned().expect("object")
}

#[tokio::test]
async fn empty_rule_set_never_matches() {
    let engine = classifier(Vec::new(), RuleSource::empty());
    let evaluation = engine
        .evaluate_rules(&facts(json!({ "description": "anything" })))
        .await;
    assert!(!evaluation.matched);
    assert!(evaluation.events.is_empty());
}

#[tokio::test]
async fn child_victim_rule_uses_directory_lookup() {
    let rules = r#"[{
        "conditions": { "all": [
            { "fact": "victimType", "operator": "equal", "value": "child" },
            { "fact": "descriptionLower", "operator": "contains", "value": "school" }
        ] },
        "event": { "type": "child-welfare", "params": { "predictedRisk": "Psychological" } }
    }]"#;
    let engine = classifier(Vec::new(), RuleSource::inline(rules));

    let evaluation = engine
        .evaluate_rules(&facts(json!({
            "victimId": "victim-1",
            "description": "Stopped going to SCHOOL after the incident"
        })))
        .await;

    assert!(evaluation.matched);
    assert_eq!(evaluation.events[0].event_type, "child-welfare");
}

#[tokio::test]
async fn all_matching_rules_contribute_events_in_priority_order() {
    let rules = r#"[
        {
            "conditions": { "all": [{ "fact": "injuries", "operator": "equal", "value": true }] },
            "events": [
                { "type": "medical", "params": {} },
                { "type": "document", "params": {} }
            ]
        },
        {
            "priority": 5,
            "conditions": { "all": [{ "fact": "injurySeverity", "operator": "greaterThan", "value": 3 }] },
            "event": { "type": "urgent", "params": {} }
        },
        {
            "conditions": { "not": { "fact": "injuries", "operator": "equal", "value": true } },
            "event": { "type": "never", "params": {} }
        }
    ]"#;
    let engine = classifier(Vec::new(), RuleSource::inline(rules));

    let evaluation = engine
        .evaluate_rules(&facts(json!({ "injuries": true, "injurySeverity": 4 })))
        .await;

    let types: Vec<&str> = evaluation
        .events
        .iter()
        .map(|event| event.event_type.as_str())
        .collect();
    assert_eq!(types, ["urgent", "medical", "document"]);
}

#[test]
fn payload_facts_omit_unknown_values() {
    let mut incident = payload("Report", "Physical");
    let plain = payload_facts(&incident);
    assert_eq!(plain["incidentType"], json!("Physical"));
    assert!(!plain.contains_key("victimType"));
    assert!(!plain.contains_key("victimId"));

    incident.victim_type = VictimType::Woman;
    incident.victim_id = Some("VIC-0001".to_string());
    let enriched = payload_facts(&incident);
    assert_eq!(enriched["victimType"], json!("woman"));
    assert_eq!(enriched["victimId"], json!("VIC-0001"));
}
