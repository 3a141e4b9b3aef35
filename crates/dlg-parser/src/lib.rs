mod conditional;
mod diagnostics;
mod frame;
mod json_utils;
mod microscript;
mod options;

use std::collections::BTreeMap;

use dlg_core::{DialogueError, DialogueScene, BASE_FRAME_NAME, DEFAULT_FRAME_ALIAS};
use serde_json::Value as JsonValue;

pub use diagnostics::ParseDiagnostic;

use diagnostics::Diagnostics;
use frame::{parse_base_frame, parse_frame};
use json_utils::{child_path, optional_string};

/// A parsed scene together with every entry that was skipped or looked
/// suspicious while loading it.
#[derive(Debug, Clone)]
pub struct ParseReport {
    pub scene: DialogueScene,
    pub diagnostics: Vec<ParseDiagnostic>,
}

pub fn parse_scene(name: &str, source: &str) -> Result<DialogueScene, DialogueError> {
    parse_scene_report(name, source).map(|report| report.scene)
}

pub fn parse_scene_report(name: &str, source: &str) -> Result<ParseReport, DialogueError> {
    let root: JsonValue = serde_json::from_str(source).map_err(|error| {
        DialogueError::parse(
            "PARSE_JSON_INVALID",
            format!("Scene \"{}\" is not valid JSON: {}", name, error),
        )
    })?;
    parse_scene_value(name, &root)
}

/// Builds a scene from an already-decoded document. Top-level problems are
/// errors; a malformed frame is skipped and reported as a diagnostic.
pub fn parse_scene_value(name: &str, root: &JsonValue) -> Result<ParseReport, DialogueError> {
    let root = root.as_object().ok_or_else(|| {
        DialogueError::parse(
            "PARSE_ROOT_INVALID",
            format!("Scene \"{}\" must be a JSON object.", name),
        )
    })?;
    let frame_nodes = match root.get("frames") {
        Some(JsonValue::Object(frames)) => frames,
        Some(_) => {
            return Err(DialogueError::parse(
                "PARSE_FRAMES_INVALID",
                format!("Scene \"{}\" field \"frames\" must be an object.", name),
            )
            .with_path("frames"))
        }
        None => {
            return Err(DialogueError::parse(
                "PARSE_FRAMES_MISSING",
                format!("Scene \"{}\" has no \"frames\" object.", name),
            ))
        }
    };

    let mut diagnostics = Diagnostics::new(name);
    let base = parse_base_frame(name, root, &mut diagnostics)?;

    let mut frames = BTreeMap::new();
    for (frame_name, node) in frame_nodes {
        let path = child_path("frames", frame_name);
        if frame_name == BASE_FRAME_NAME {
            diagnostics.warn(
                &path,
                "PARSE_FRAME_NAME_RESERVED",
                format!("\"{}\" is reserved for scene defaults; frame skipped.", BASE_FRAME_NAME),
            );
            continue;
        }
        if frame_name.starts_with('_') {
            diagnostics.warn(
                &path,
                "PARSE_FRAME_NAME_UNDERSCORE",
                format!("Frame \"{}\" starts with an underscore and may collide with reserved names.", frame_name),
            );
        }
        match parse_frame(frame_name, node, name, &base, &mut diagnostics) {
            Ok(frame) => {
                frames.insert(frame_name.clone(), frame);
            }
            Err(error) => diagnostics.error(&path, &error),
        }
    }

    if frames.is_empty() {
        return Err(DialogueError::parse(
            "PARSE_FRAMES_EMPTY",
            format!("Scene \"{}\" has no usable frames.", name),
        )
        .with_path("frames"));
    }

    let declared_default = optional_string(root, "default", "")?;
    let default_frame = resolve_default_frame(declared_default, &frames, &mut diagnostics);

    let music = base.music.clone();
    frames.insert(BASE_FRAME_NAME.to_string(), base);
    log::debug!(
        "[dialogue:{}] parsed {} frames, default \"{}\"",
        name,
        frames.len() - 1,
        default_frame
    );

    Ok(ParseReport {
        scene: DialogueScene {
            name: name.to_string(),
            default_frame,
            music,
            frames,
        },
        diagnostics: diagnostics.into_items(),
    })
}

fn resolve_default_frame(
    declared: Option<String>,
    frames: &BTreeMap<String, dlg_core::Frame>,
    diagnostics: &mut Diagnostics,
) -> String {
    if let Some(declared) = declared {
        if frames.contains_key(&declared) {
            return declared;
        }
        diagnostics.warn(
            "default",
            "PARSE_DEFAULT_MISSING",
            format!("Default frame \"{}\" does not exist.", declared),
        );
    }
    if frames.contains_key(DEFAULT_FRAME_ALIAS) {
        return DEFAULT_FRAME_ALIAS.to_string();
    }
    // BTreeMap order: the alphabetically first frame.
    let fallback = frames.keys().next().cloned().unwrap_or_default();
    diagnostics.warn(
        "default",
        "PARSE_DEFAULT_MISSING",
        format!("No default frame declared; using \"{}\".", fallback),
    );
    fallback
}

#[cfg(test)]
mod parser_tests {
    use super::*;
    use dlg_core::{FrameKind, ImagePosition};

    #[test]
    fn parses_minimal_scene_with_declared_default() {
        let scene = parse_scene(
            "greeting",
            r#"{"frames":{"start":{"type":"text","text":"Hello","next":"meta.return"}}, "default":"start"}"#,
        )
        .expect("scene should parse");
        assert_eq!(scene.default_frame, "start");
        assert!(scene.base_frame().is_some());
        let start = scene.frame("default").expect("default resolves");
        assert_eq!(start.path(), "greeting.start");
        assert_eq!(start.text.as_deref(), Some("Hello"));
        assert_eq!(scene.frame_names().collect::<Vec<_>>(), vec!["start"]);
    }

    #[test]
    fn top_level_errors_are_propagated() {
        let error = parse_scene("s", "{not json").expect_err("bad json");
        assert_eq!(error.code, "PARSE_JSON_INVALID");
        let error = parse_scene("s", "[]").expect_err("array root");
        assert_eq!(error.code, "PARSE_ROOT_INVALID");
        let error = parse_scene("s", r#"{"default":"a"}"#).expect_err("no frames");
        assert_eq!(error.code, "PARSE_FRAMES_MISSING");
        let error = parse_scene("s", r#"{"frames":{"a":{"type":"bogus"}}}"#).expect_err("no usable frames");
        assert_eq!(error.code, "PARSE_FRAMES_EMPTY");
    }

    #[test]
    fn malformed_frame_is_skipped_and_reported() {
        let report = parse_scene_report(
            "s",
            r#"{
                "default": "ok",
                "frames": {
                    "ok": {"type": "text", "text": "fine"},
                    "broken": {"type": "hologram"},
                    "empty": {"type": "choice", "choices": []},
                    "_helper": {"type": "blank", "next": "ok"},
                    "_BaseFrame": {"type": "text"}
                }
            }"#,
        )
        .expect("scene should still load");

        let names = report.scene.frame_names().collect::<Vec<_>>();
        assert_eq!(names, vec!["_helper", "ok"]);
        let codes = report
            .diagnostics
            .iter()
            .map(|item| item.code.as_str())
            .collect::<Vec<_>>();
        assert!(codes.contains(&"PARSE_FRAME_TYPE_UNKNOWN"));
        assert!(codes.contains(&"PARSE_CHOICES_EMPTY"));
        assert!(codes.contains(&"PARSE_FRAME_NAME_UNDERSCORE"));
        assert!(codes.contains(&"PARSE_FRAME_NAME_RESERVED"));
        let broken = report
            .diagnostics
            .iter()
            .find(|item| item.code == "PARSE_FRAME_TYPE_UNKNOWN")
            .expect("diagnostic");
        assert_eq!(broken.path, "frames.broken.type");
    }

    #[test]
    fn default_frame_falls_back_to_alias_then_first_name() {
        let scene = parse_scene(
            "s",
            r#"{"frames":{"b":{"type":"text"},"default":{"type":"text"}}}"#,
        )
        .expect("scene");
        assert_eq!(scene.default_frame, "default");

        let report = parse_scene_report(
            "s",
            r#"{"default":"missing","frames":{"zeta":{"type":"text"},"alpha":{"type":"blank"}}}"#,
        )
        .expect("scene");
        assert_eq!(report.scene.default_frame, "alpha");
        assert!(report
            .diagnostics
            .iter()
            .any(|item| item.code == "PARSE_DEFAULT_MISSING"));
    }

    #[test]
    fn root_fields_become_base_frame_defaults() {
        let scene = parse_scene(
            "s",
            r#"{
                "music": "town_theme",
                "position": "Battler",
                "nameText": "Merchant",
                "frames": {
                    "a": {"type": "text", "text": "Welcome"},
                    "b": {"type": "image", "music": "", "position": "fill"}
                }
            }"#,
        )
        .expect("scene");
        assert_eq!(scene.music.as_deref(), Some("town_theme"));
        let a = scene.frame("a").expect("a");
        assert_eq!(a.music.as_deref(), Some("town_theme"));
        assert_eq!(a.position, ImagePosition::Battler);
        assert_eq!(a.name_text.as_deref(), Some("Merchant"));
        let b = scene.frame("b").expect("b");
        assert_eq!(b.music.as_deref(), Some(""));
        assert_eq!(b.position, ImagePosition::Fill);
        assert!(matches!(b.kind, FrameKind::Image(_)));
    }

    #[test]
    fn resolved_frames_do_not_alias_the_base_frame() {
        let mut scene = parse_scene(
            "s",
            r#"{"background":"hall","options":{"traceSpeaker":"Narrator"},"frames":{"a":{"type":"text"}}}"#,
        )
        .expect("scene");
        let base = scene
            .frames
            .get_mut(BASE_FRAME_NAME)
            .expect("base frame");
        base.background = Some("cellar".to_string());
        base.options.trace_speaker = Some("Ghost".to_string());

        let a = scene.frame("a").expect("a");
        assert_eq!(a.background.as_deref(), Some("hall"));
        assert_eq!(a.options.trace_speaker.as_deref(), Some("Narrator"));
    }
}
