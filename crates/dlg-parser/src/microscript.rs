use dlg_core::{
    DelayTimeType, DlgValue, MicroscriptAction, MicroscriptDelay, MicroscriptKind, MicroscriptNode,
};
use serde_json::Value as JsonValue;

use crate::diagnostics::Diagnostics;
use crate::json_utils::{index_path, json_type_name};

pub(crate) fn parse_microscript(
    value: &JsonValue,
    path: &str,
    diagnostics: &mut Diagnostics,
) -> Option<MicroscriptNode> {
    let Some(node) = value.as_object() else {
        diagnostics.warn(
            path,
            "PARSE_MICROSCRIPT_INVALID",
            format!("Microscript must be an object, found {}.", json_type_name(value)),
        );
        return None;
    };

    let target = node.iter().find_map(|(key, value)| {
        MicroscriptKind::from_key(key).map(|kind| (kind, value.as_str().map(str::to_string)))
    });
    let (kind, target) = match target {
        Some((kind, Some(target))) => (kind, target),
        Some((_, None)) => {
            diagnostics.warn(
                path,
                "PARSE_MICROSCRIPT_TARGET_INVALID",
                "Microscript target must be a string.",
            );
            return None;
        }
        None => {
            diagnostics.warn(
                path,
                "PARSE_MICROSCRIPT_KIND_UNKNOWN",
                "Microscript has no recognized target key; it will be ignored.",
            );
            (MicroscriptKind::Unknown, String::new())
        }
    };

    let action = node.iter().find_map(|(key, value)| {
        MicroscriptAction::from_key(key).map(|action| (action, DlgValue::from_json(value)))
    });
    let (action, value) = match action {
        Some(found) => found,
        None if kind == MicroscriptKind::Exec || kind == MicroscriptKind::Unknown => {
            (MicroscriptAction::Set, node.get("arg").and_then(DlgValue::from_json))
        }
        None => {
            diagnostics.warn(
                path,
                "PARSE_MICROSCRIPT_ACTION_MISSING",
                format!("Microscript on \"{}\" has no action key.", target),
            );
            return None;
        }
    };
    let value = if kind == MicroscriptKind::Exec {
        node.get("arg").and_then(DlgValue::from_json).or(value)
    } else {
        value
    };

    let delay = match node.get("delay").and_then(JsonValue::as_f64) {
        Some(seconds) => {
            let time_type = match node.get("delayType").and_then(JsonValue::as_str) {
                None => DelayTimeType::Game,
                Some(raw) => match raw.to_ascii_lowercase().as_str() {
                    "game" => DelayTimeType::Game,
                    "real" => DelayTimeType::Real,
                    "world" => DelayTimeType::World,
                    other => {
                        diagnostics.warn(
                            path,
                            "PARSE_MICROSCRIPT_DELAY_TYPE",
                            format!("Unknown delayType \"{}\"; using game time.", other),
                        );
                        DelayTimeType::Game
                    }
                },
            };
            Some(MicroscriptDelay {
                seconds,
                time_type,
                absolute: node
                    .get("delayAbsolute")
                    .and_then(JsonValue::as_bool)
                    .unwrap_or(false),
            })
        }
        None => None,
    };

    Some(MicroscriptNode {
        kind,
        target,
        action,
        value,
        delay,
    })
}

pub(crate) fn parse_microscript_list(
    values: &[JsonValue],
    path: &str,
    diagnostics: &mut Diagnostics,
) -> Vec<MicroscriptNode> {
    values
        .iter()
        .enumerate()
        .filter_map(|(index, value)| parse_microscript(value, &index_path(path, index), diagnostics))
        .collect()
}
