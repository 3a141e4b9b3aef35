use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// Scalar exchanged with game state: flags, variables, actor values and
/// comparison operands all use this one representation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DlgValue {
    Bool(bool),
    Number(f64),
    String(String),
}

impl DlgValue {
    pub fn from_json(value: &JsonValue) -> Option<Self> {
        match value {
            JsonValue::Bool(value) => Some(Self::Bool(*value)),
            JsonValue::Number(value) => value.as_f64().map(Self::Number),
            JsonValue::String(value) => Some(Self::String(value.clone())),
            JsonValue::Null | JsonValue::Array(_) | JsonValue::Object(_) => None,
        }
    }

    pub fn to_json(&self) -> JsonValue {
        match self {
            Self::Bool(value) => JsonValue::Bool(*value),
            Self::Number(value) => serde_json::Number::from_f64(*value)
                .map(JsonValue::Number)
                .unwrap_or(JsonValue::Null),
            Self::String(value) => JsonValue::String(value.clone()),
        }
    }

    /// Numeric view used by every comparison. Strings holding a number and
    /// booleans (1/0) coerce; anything else does not.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Bool(value) => Some(if *value { 1.0 } else { 0.0 }),
            Self::Number(value) => Some(*value),
            Self::String(value) => value.trim().parse::<f64>().ok(),
        }
    }

    pub fn as_string(&self) -> Option<&str> {
        match self {
            Self::String(value) => Some(value.as_str()),
            _ => None,
        }
    }

    pub fn is_truthy(&self) -> bool {
        match self {
            Self::Bool(value) => *value,
            Self::Number(value) => *value != 0.0,
            Self::String(value) => match value.trim() {
                "" => false,
                "true" | "True" => true,
                "false" | "False" => false,
                other => other.parse::<f64>().map(|n| n != 0.0).unwrap_or(true),
            },
        }
    }

    /// Numeric sum; `None` when either side is not numeric.
    pub fn add(&self, other: &DlgValue) -> Option<DlgValue> {
        Some(DlgValue::Number(self.as_number()? + other.as_number()?))
    }

    pub fn to_text(&self) -> String {
        match self {
            Self::Bool(value) => value.to_string(),
            Self::Number(value) => {
                if value.fract().abs() < f64::EPSILON {
                    (*value as i64).to_string()
                } else {
                    value.to_string()
                }
            }
            Self::String(value) => value.clone(),
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Bool(_) => "boolean",
            Self::Number(_) => "number",
            Self::String(_) => "string",
        }
    }
}

impl From<bool> for DlgValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<f64> for DlgValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<i64> for DlgValue {
    fn from(value: i64) -> Self {
        Self::Number(value as f64)
    }
}

impl From<&str> for DlgValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ComparisonType {
    Greater,
    GreaterEqual,
    Equal,
    Less,
    LessEqual,
    Started,
    Finished,
    Consume,
}

impl ComparisonType {
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "greater" => Some(Self::Greater),
            "greaterEqual" => Some(Self::GreaterEqual),
            "equal" => Some(Self::Equal),
            "less" => Some(Self::Less),
            "lessEqual" => Some(Self::LessEqual),
            "started" => Some(Self::Started),
            "finished" => Some(Self::Finished),
            "consume" => Some(Self::Consume),
            _ => None,
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            Self::Greater => ">",
            Self::GreaterEqual | Self::Consume => ">=",
            Self::Equal => "==",
            Self::Less => "<",
            Self::LessEqual => "<=",
            Self::Started => "started",
            Self::Finished => "finished",
        }
    }
}

/// Three-way comparison of two scalars with shared numeric coercion.
/// Numbers, numeric strings and booleans compare numerically; two
/// non-numeric strings compare lexically; anything else is incomparable.
pub fn compare_values(left: &DlgValue, right: &DlgValue) -> Option<Ordering> {
    if let (Some(left), Some(right)) = (left.as_number(), right.as_number()) {
        return left.partial_cmp(&right);
    }
    match (left, right) {
        (DlgValue::String(left), DlgValue::String(right)) => Some(left.cmp(right)),
        _ => None,
    }
}

/// Interprets a three-way compare result for an operator. `Consume`,
/// `Started` and `Finished` fall back to greater-or-equal when they reach
/// a numeric comparison.
pub fn compare_outcome(ordering: Ordering, comparison: ComparisonType) -> bool {
    match comparison {
        ComparisonType::GreaterEqual
        | ComparisonType::Consume
        | ComparisonType::Started
        | ComparisonType::Finished => ordering != Ordering::Less,
        ComparisonType::Greater => ordering == Ordering::Greater,
        ComparisonType::Less => ordering == Ordering::Less,
        ComparisonType::Equal => ordering == Ordering::Equal,
        ComparisonType::LessEqual => ordering != Ordering::Greater,
    }
}

pub fn evaluate_comparison(actual: &DlgValue, comparison: ComparisonType, expected: &DlgValue) -> bool {
    compare_values(actual, expected)
        .map(|ordering| compare_outcome(ordering, comparison))
        .unwrap_or(false)
}
