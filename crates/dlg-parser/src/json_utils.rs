use std::collections::BTreeMap;

use dlg_core::DialogueError;
use serde_json::{Map, Value as JsonValue};

pub(crate) type JsonObject = Map<String, JsonValue>;

pub(crate) fn child_path(parent: &str, key: &str) -> String {
    if parent.is_empty() {
        key.to_string()
    } else {
        format!("{}.{}", parent, key)
    }
}

pub(crate) fn index_path(parent: &str, index: usize) -> String {
    format!("{}[{}]", parent, index)
}

pub(crate) fn expect_object<'a>(
    value: &'a JsonValue,
    path: &str,
    code: &str,
) -> Result<&'a JsonObject, DialogueError> {
    value.as_object().ok_or_else(|| {
        DialogueError::parse(code, format!("\"{}\" must be a JSON object.", path)).with_path(path)
    })
}

/// Missing and `null` both read as unset.
pub(crate) fn optional_string(
    node: &JsonObject,
    key: &str,
    path: &str,
) -> Result<Option<String>, DialogueError> {
    match node.get(key) {
        None | Some(JsonValue::Null) => Ok(None),
        Some(JsonValue::String(value)) => Ok(Some(value.clone())),
        Some(other) => Err(field_type_error(path, key, "string", other)),
    }
}

pub(crate) fn optional_bool(
    node: &JsonObject,
    key: &str,
    path: &str,
) -> Result<Option<bool>, DialogueError> {
    match node.get(key) {
        None | Some(JsonValue::Null) => Ok(None),
        Some(JsonValue::Bool(value)) => Ok(Some(*value)),
        Some(other) => Err(field_type_error(path, key, "boolean", other)),
    }
}

pub(crate) fn optional_number(
    node: &JsonObject,
    key: &str,
    path: &str,
) -> Result<Option<f64>, DialogueError> {
    match node.get(key) {
        None | Some(JsonValue::Null) => Ok(None),
        Some(JsonValue::Number(value)) => Ok(value.as_f64()),
        Some(other) => Err(field_type_error(path, key, "number", other)),
    }
}

pub(crate) fn optional_array<'a>(
    node: &'a JsonObject,
    key: &str,
    path: &str,
) -> Result<Option<&'a Vec<JsonValue>>, DialogueError> {
    match node.get(key) {
        None | Some(JsonValue::Null) => Ok(None),
        Some(JsonValue::Array(values)) => Ok(Some(values)),
        Some(other) => Err(field_type_error(path, key, "array", other)),
    }
}

pub(crate) fn optional_object_map(
    node: &JsonObject,
    key: &str,
    path: &str,
) -> Result<Option<BTreeMap<String, JsonValue>>, DialogueError> {
    match node.get(key) {
        None | Some(JsonValue::Null) => Ok(None),
        Some(JsonValue::Object(values)) => Ok(Some(
            values
                .iter()
                .map(|(key, value)| (key.clone(), value.clone()))
                .collect(),
        )),
        Some(other) => Err(field_type_error(path, key, "object", other)),
    }
}

/// Case-insensitive on the first letter so `OnPresent` and `onPresent`
/// name the same key.
pub(crate) fn normalize_key(key: &str) -> String {
    let mut chars = key.chars();
    match chars.next() {
        Some(first) => first.to_ascii_lowercase().to_string() + chars.as_str(),
        None => String::new(),
    }
}

fn field_type_error(path: &str, key: &str, expected: &str, found: &JsonValue) -> DialogueError {
    let field_path = child_path(path, key);
    DialogueError::parse(
        "PARSE_FIELD_TYPE",
        format!(
            "Field \"{}\" must be {}, found {}.",
            field_path,
            expected,
            json_type_name(found)
        ),
    )
    .with_path(field_path)
}

pub(crate) fn json_type_name(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "boolean",
        JsonValue::Number(_) => "number",
        JsonValue::String(_) => "string",
        JsonValue::Array(_) => "array",
        JsonValue::Object(_) => "object",
    }
}
