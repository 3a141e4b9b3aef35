use dlg_core::{ComparisonType, ConditionKind, ConditionNode, Conditional, DlgValue};
use serde_json::Value as JsonValue;

use crate::diagnostics::Diagnostics;
use crate::json_utils::{child_path, index_path, json_type_name};

/// Reads one predicate. Anything malformed (not an object, a non-string
/// target, no recognized kind key) is kept as `Unknown` so the owning rule
/// fails closed at evaluation time.
pub(crate) fn parse_conditional(
    value: &JsonValue,
    path: &str,
    diagnostics: &mut Diagnostics,
) -> Conditional {
    let Some(node) = value.as_object() else {
        diagnostics.warn(
            path,
            "PARSE_CONDITION_INVALID",
            format!(
                "Condition must be an object, found {}; it will always evaluate false.",
                json_type_name(value)
            ),
        );
        return Conditional::new(ConditionKind::Unknown, String::new());
    };

    let mut conditional = None;
    for (key, value) in node {
        let Some(kind) = ConditionKind::from_key(key) else {
            continue;
        };
        if conditional.is_some() {
            diagnostics.warn(
                path,
                "PARSE_CONDITION_KIND_DUPLICATE",
                format!("Condition declares more than one kind; \"{}\" is ignored.", key),
            );
            continue;
        }
        let target = match value {
            JsonValue::String(target) => target.clone(),
            other => {
                diagnostics.warn(
                    &child_path(path, key),
                    "PARSE_CONDITION_TARGET_INVALID",
                    format!(
                        "Condition target must be a string, found {}; it will always evaluate false.",
                        json_type_name(other)
                    ),
                );
                return Conditional::new(ConditionKind::Unknown, String::new());
            }
        };
        conditional = Some(Conditional::new(kind, target));
    }

    let mut conditional = match conditional {
        Some(conditional) => conditional,
        None => {
            diagnostics.warn(
                path,
                "PARSE_CONDITION_KIND_UNKNOWN",
                "Condition has no recognized kind key; it will always evaluate false.",
            );
            Conditional::new(ConditionKind::Unknown, String::new())
        }
    };

    for (key, value) in node {
        if key == "arg" {
            conditional.value = DlgValue::from_json(value);
            continue;
        }
        let Some(comparison) = ComparisonType::from_key(key) else {
            continue;
        };
        if conditional.comparison.is_some() {
            diagnostics.warn(
                path,
                "PARSE_CONDITION_COMPARISON_DUPLICATE",
                format!("Condition declares more than one comparison; \"{}\" is ignored.", key),
            );
            continue;
        }
        conditional.comparison = Some(comparison);
        conditional.value = DlgValue::from_json(value);
    }

    conditional
}

pub(crate) fn parse_condition_list(
    values: &[JsonValue],
    path: &str,
    diagnostics: &mut Diagnostics,
) -> Vec<Conditional> {
    values
        .iter()
        .enumerate()
        .map(|(index, value)| parse_conditional(value, &index_path(path, index), diagnostics))
        .collect()
}

/// Reads a `conditional` array of `{next, conditions}` rules in declared
/// order. Rules without a `next` are skipped.
pub(crate) fn parse_condition_nodes(
    values: &[JsonValue],
    path: &str,
    diagnostics: &mut Diagnostics,
) -> Vec<ConditionNode> {
    let mut nodes = Vec::new();
    for (index, value) in values.iter().enumerate() {
        let entry_path = index_path(path, index);
        let Some(node) = value.as_object() else {
            diagnostics.warn(
                &entry_path,
                "PARSE_CONDITIONAL_INVALID",
                format!("Conditional must be an object, found {}.", json_type_name(value)),
            );
            continue;
        };
        let Some(next) = node.get("next").and_then(JsonValue::as_str) else {
            diagnostics.warn(
                &entry_path,
                "PARSE_CONDITIONAL_NEXT_MISSING",
                "Conditional requires a string \"next\".",
            );
            continue;
        };
        let conditions = match node.get("conditions") {
            None | Some(JsonValue::Null) => Vec::new(),
            Some(JsonValue::Array(values)) => {
                parse_condition_list(values, &child_path(&entry_path, "conditions"), diagnostics)
            }
            Some(other) => {
                diagnostics.warn(
                    &child_path(&entry_path, "conditions"),
                    "PARSE_CONDITIONAL_INVALID",
                    format!("\"conditions\" must be an array, found {}.", json_type_name(other)),
                );
                continue;
            }
        };
        nodes.push(ConditionNode {
            next: next.to_string(),
            conditions,
        });
    }
    nodes
}
