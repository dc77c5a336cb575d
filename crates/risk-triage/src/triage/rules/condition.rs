use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Condition tree: boolean combinators over fact comparisons.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Condition {
    All { all: Vec<Condition> },
    Any { any: Vec<Condition> },
    Not { not: Box<Condition> },
    Fact(FactCondition),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FactCondition {
    pub fact: String,
    pub operator: Operator,
    #[serde(default)]
    pub value: Value,
    /// JSON pointer into the resolved fact, e.g. `/severity`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Operator {
    Equal,
    NotEqual,
    LessThan,
    LessThanInclusive,
    GreaterThan,
    GreaterThanInclusive,
    In,
    NotIn,
    Contains,
    DoesNotContain,
}

impl Condition {
    /// Names of every fact the tree reads.
    pub fn referenced_facts(&self, names: &mut BTreeSet<String>) {
        match self {
            Condition::All { all } => all.iter().for_each(|child| child.referenced_facts(names)),
            Condition::Any { any } => any.iter().for_each(|child| child.referenced_facts(names)),
            Condition::Not { not } => not.referenced_facts(names),
            Condition::Fact(leaf) => {
                names.insert(leaf.fact.clone());
            }
        }
    }

    /// Evaluates against already-resolved facts. Missing facts read as `null`.
    pub fn evaluate(&self, facts: &HashMap<String, Value>) -> bool {
        match self {
            Condition::All { all } => all.iter().all(|child| child.evaluate(facts)),
            Condition::Any { any } => any.iter().any(|child| child.evaluate(facts)),
            Condition::Not { not } => !not.evaluate(facts),
            Condition::Fact(leaf) => leaf.evaluate(facts),
        }
    }
}

impl FactCondition {
    fn evaluate(&self, facts: &HashMap<String, Value>) -> bool {
        let resolved = facts.get(&self.fact).unwrap_or(&Value::Null);
        let actual = match &self.path {
            Some(pointer) => resolved.pointer(pointer).unwrap_or(&Value::Null),
            None => resolved,
        };
        self.operator.apply(actual, &self.value)
    }
}

impl Operator {
    pub fn apply(self, actual: &Value, expected: &Value) -> bool {
        match self {
            Operator::Equal => loosely_equal(actual, expected),
            Operator::NotEqual => !loosely_equal(actual, expected),
            Operator::LessThan => compare(actual, expected, |a, b| a < b),
            Operator::LessThanInclusive => compare(actual, expected, |a, b| a <= b),
            Operator::GreaterThan => compare(actual, expected, |a, b| a > b),
            Operator::GreaterThanInclusive => compare(actual, expected, |a, b| a >= b),
            Operator::In => member_of(actual, expected),
            Operator::NotIn => !member_of(actual, expected),
            Operator::Contains => contains(actual, expected),
            Operator::DoesNotContain => !contains(actual, expected),
        }
    }
}

/// JSON equality, except numbers compare by value so `3` equals `3.0`.
fn loosely_equal(left: &Value, right: &Value) -> bool {
    match (left.as_f64(), right.as_f64()) {
        (Some(a), Some(b)) => a == b,
        _ => left == right,
    }
}

fn compare(actual: &Value, expected: &Value, op: impl Fn(f64, f64) -> bool) -> bool {
    match (actual.as_f64(), expected.as_f64()) {
        (Some(a), Some(b)) => op(a, b),
        _ => false,
    }
}

fn member_of(actual: &Value, expected: &Value) -> bool {
    expected
        .as_array()
        .is_some_and(|items| items.iter().any(|item| loosely_equal(actual, item)))
}

fn contains(actual: &Value, expected: &Value) -> bool {
    match actual {
        Value::String(text) => expected
            .as_str()
            .is_some_and(|needle| text.contains(needle)),
        Value::Array(items) => items.iter().any(|item| loosely_equal(item, expected)),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn facts(value: Value) -> HashMap<String, Value> {
        value
            .as_object()
            .expect("object")
            .iter()
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect()
    }

    fn condition(value: Value) -> Condition {
        serde_json::from_value(value).expect("condition parses")
    }

    #[test]
    fn nested_all_any_not() {
        let tree = condition(json!({
            "all": [
                { "fact": "injurySeverity", "operator": "greaterThanInclusive", "value": 3 },
                { "any": [
                    { "fact": "victimType", "operator": "equal", "value": "child" },
                    { "fact": "recentReports", "operator": "greaterThan", "value": 2 }
                ]},
                { "not": { "fact": "status", "operator": "in", "value": ["Closed", "Resolved"] } }
            ]
        }));

        let matching = facts(json!({
            "injurySeverity": 3.0, "victimType": "woman", "recentReports": 4, "status": "Open"
        }));
        assert!(tree.evaluate(&matching));

        let closed = facts(json!({
            "injurySeverity": 5, "victimType": "child", "recentReports": 0, "status": "Closed"
        }));
        assert!(!tree.evaluate(&closed));
    }

    #[test]
    fn collects_referenced_facts() {
        let tree = condition(json!({
            "any": [
                { "fact": "descriptionLower", "operator": "contains", "value": "kutsilyo" },
                { "not": { "fact": "injuries", "operator": "equal", "value": false } }
            ]
        }));
        let mut names = BTreeSet::new();
        tree.referenced_facts(&mut names);
        assert_eq!(
            names.into_iter().collect::<Vec<_>>(),
            vec!["descriptionLower".to_string(), "injuries".to_string()]
        );
    }

    #[test]
    fn numeric_operators_reject_non_numbers() {
        assert!(!Operator::GreaterThan.apply(&json!("5"), &json!(3)));
        assert!(!Operator::LessThan.apply(&Value::Null, &json!(3)));
        assert!(Operator::LessThanInclusive.apply(&json!(3), &json!(3.0)));
    }

    #[test]
    fn contains_handles_strings_and_arrays() {
        assert!(Operator::Contains.apply(&json!("may baril siya"), &json!("baril")));
        assert!(Operator::Contains.apply(&json!(["knife", "gun"]), &json!("gun")));
        assert!(Operator::DoesNotContain.apply(&json!(7), &json!("x")));
    }

    #[test]
    fn path_reads_nested_fact_values() {
        let tree = condition(json!({
            "fact": "medical", "path": "/findings/severity", "operator": "equal", "value": "grave"
        }));
        let resolved = facts(json!({ "medical": { "findings": { "severity": "grave" } } }));
        assert!(tree.evaluate(&resolved));
        assert!(!tree.evaluate(&HashMap::new()));
    }
}
