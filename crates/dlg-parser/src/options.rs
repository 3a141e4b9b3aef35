use dlg_core::{FrameOptions, FrameScripts, PanelHeight};
use serde_json::Value as JsonValue;

use crate::diagnostics::Diagnostics;
use crate::json_utils::{child_path, json_type_name, normalize_key, JsonObject};

pub(crate) fn parse_frame_options(
    node: &JsonObject,
    path: &str,
    diagnostics: &mut Diagnostics,
) -> FrameOptions {
    let mut options = FrameOptions::default();
    for (key, value) in node {
        let key_path = child_path(path, key);
        match normalize_key(key).as_str() {
            "panelHeight" => match value {
                JsonValue::Number(pixels) => {
                    options.panel_height = pixels.as_f64().map(PanelHeight::Fixed);
                }
                JsonValue::String(mode) if mode.eq_ignore_ascii_case("default") => {
                    options.panel_height = Some(PanelHeight::Default);
                }
                JsonValue::String(mode) if mode.eq_ignore_ascii_case("variable") => {
                    options.panel_height = Some(PanelHeight::Variable);
                }
                other => invalid_option(diagnostics, &key_path, "\"default\", \"variable\" or a number", other),
            },
            "traceIgnore" => match value {
                JsonValue::Bool(flag) => options.trace_ignore = Some(*flag),
                other => invalid_option(diagnostics, &key_path, "a boolean", other),
            },
            "traceSpeaker" => match value {
                JsonValue::String(text) => options.trace_speaker = Some(text.clone()),
                other => invalid_option(diagnostics, &key_path, "a string", other),
            },
            "traceText" => match value {
                JsonValue::String(text) => options.trace_text = Some(text.clone()),
                other => invalid_option(diagnostics, &key_path, "a string", other),
            },
            "voiceOverride" => match value {
                JsonValue::String(text) => options.voice_override = Some(text.clone()),
                other => invalid_option(diagnostics, &key_path, "a string", other),
            },
            "hideObjects" => match value {
                JsonValue::Array(entries) => {
                    let names = entries
                        .iter()
                        .filter_map(|entry| entry.as_str().map(str::to_string))
                        .collect::<Vec<_>>();
                    if names.len() != entries.len() {
                        diagnostics.warn(
                            &key_path,
                            "PARSE_OPTION_INVALID",
                            "Non-string entries in hideObjects are ignored.",
                        );
                    }
                    options.hide_objects = Some(names);
                }
                other => invalid_option(diagnostics, &key_path, "an array of strings", other),
            },
            _ => {
                options.extra.insert(key.clone(), value.clone());
            }
        }
    }
    options
}

fn invalid_option(diagnostics: &mut Diagnostics, path: &str, expected: &str, found: &JsonValue) {
    diagnostics.warn(
        path,
        "PARSE_OPTION_INVALID",
        format!("Option must be {}, found {}; ignored.", expected, json_type_name(found)),
    );
}

pub(crate) fn parse_frame_scripts(
    node: &JsonObject,
    path: &str,
    diagnostics: &mut Diagnostics,
) -> FrameScripts {
    let mut scripts = FrameScripts::default();
    for (key, value) in node {
        let Some(name) = value.as_str().map(str::to_string) else {
            diagnostics.warn(
                &child_path(path, key),
                "PARSE_SCRIPT_INVALID",
                format!("Hook script name must be a string, found {}.", json_type_name(value)),
            );
            continue;
        };
        match normalize_key(key).as_str() {
            "beforePresent" => scripts.before_present = Some(name),
            "onPresent" => scripts.on_present = Some(name),
            "onChoice" => scripts.on_choice = Some(name),
            "onUnpresent" => scripts.on_unpresent = Some(name),
            "onClose" => scripts.on_close = Some(name),
            _ => diagnostics.warn(
                &child_path(path, key),
                "PARSE_SCRIPT_HOOK_UNKNOWN",
                format!("Unknown hook \"{}\" is ignored.", key),
            ),
        }
    }
    scripts
}

#[cfg(test)]
mod options_tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn known_options_are_typed_and_unknown_ones_kept() {
        let mut diagnostics = Diagnostics::new("test");
        let value = json!({
            "PanelHeight": "variable",
            "traceIgnore": true,
            "hideObjects": ["Door", "Lamp"],
            "pluginColor": "red"
        });
        let options = parse_frame_options(value.as_object().expect("object"), "options", &mut diagnostics);
        assert_eq!(options.panel_height, Some(PanelHeight::Variable));
        assert_eq!(options.trace_ignore, Some(true));
        assert_eq!(
            options.hide_objects,
            Some(vec!["Door".to_string(), "Lamp".to_string()])
        );
        assert_eq!(options.extra.get("pluginColor"), Some(&json!("red")));
        assert!(diagnostics.into_items().is_empty());
    }

    #[test]
    fn mistyped_option_is_reported_and_dropped() {
        let mut diagnostics = Diagnostics::new("test");
        let value = json!({"traceIgnore": "yes"});
        let options = parse_frame_options(value.as_object().expect("object"), "options", &mut diagnostics);
        assert_eq!(options.trace_ignore, None);
        assert_eq!(diagnostics.into_items()[0].code, "PARSE_OPTION_INVALID");
    }

    #[test]
    fn scripts_accept_both_key_casings() {
        let mut diagnostics = Diagnostics::new("test");
        let value = json!({"BeforePresent": "a", "onPresent": "b", "OnClose": "c"});
        let scripts = parse_frame_scripts(value.as_object().expect("object"), "scripts", &mut diagnostics);
        assert_eq!(scripts.before_present.as_deref(), Some("a"));
        assert_eq!(scripts.on_present.as_deref(), Some("b"));
        assert_eq!(scripts.on_close.as_deref(), Some("c"));
        assert_eq!(scripts.on_choice, None);
    }
}
