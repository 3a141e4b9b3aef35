use std::collections::BTreeMap;

use dlg_core::{
    ChoiceNode, ComparisonType, ConditionKind, ConditionNode, Conditional, DialogueError, Frame,
    FrameKind, FrameOptions, FrameScripts, ImagePosition, MicroscriptNode, SkillCheckNode,
    SkillCheckTarget, SkillCheckType, TimedFrame, BASE_FRAME_NAME,
};
use serde_json::Value as JsonValue;

use crate::conditional::{parse_condition_nodes, parse_conditional};
use crate::diagnostics::Diagnostics;
use crate::json_utils::{
    child_path, expect_object, index_path, optional_array, optional_bool, optional_number,
    optional_object_map, optional_string, JsonObject,
};
use crate::microscript::parse_microscript_list;
use crate::options::{parse_frame_options, parse_frame_scripts};

/// Inheritable fields exactly as a JSON node declares them; `None` means
/// the node did not set the field.
#[derive(Debug, Default)]
struct FrameFields {
    background: Option<String>,
    image: Option<String>,
    next: Option<String>,
    music: Option<String>,
    name_text: Option<String>,
    text: Option<String>,
    next_text: Option<String>,
    camera_direction: Option<String>,
    position: Option<ImagePosition>,
    options: Option<FrameOptions>,
    scripts: Option<FrameScripts>,
    extra_data: Option<BTreeMap<String, JsonValue>>,
}

fn read_frame_fields(
    node: &JsonObject,
    path: &str,
    diagnostics: &mut Diagnostics,
) -> Result<FrameFields, DialogueError> {
    let position = match optional_string(node, "position", path)? {
        None => None,
        Some(raw) => {
            let parsed = ImagePosition::from_key(&raw);
            if parsed.is_none() {
                diagnostics.warn(
                    &child_path(path, "position"),
                    "PARSE_POSITION_INVALID",
                    format!("Unknown image position \"{}\"; inheriting.", raw),
                );
            }
            parsed
        }
    };

    let options = match node.get("options") {
        None | Some(JsonValue::Null) => None,
        Some(value) => {
            let options_path = child_path(path, "options");
            let object = expect_object(value, &options_path, "PARSE_OPTIONS_INVALID")?;
            Some(parse_frame_options(object, &options_path, diagnostics))
        }
    };

    let scripts = match node.get("scripts") {
        None | Some(JsonValue::Null) => None,
        Some(value) => {
            let scripts_path = child_path(path, "scripts");
            let object = expect_object(value, &scripts_path, "PARSE_SCRIPTS_INVALID")?;
            Some(parse_frame_scripts(object, &scripts_path, diagnostics))
        }
    };

    let extra_data = match optional_object_map(node, "ExtraData", path)? {
        Some(map) => Some(map),
        None => optional_object_map(node, "extraData", path)?,
    };

    Ok(FrameFields {
        background: optional_string(node, "background", path)?,
        image: optional_string(node, "image", path)?,
        next: optional_string(node, "next", path)?,
        music: optional_string(node, "music", path)?,
        name_text: optional_string(node, "nameText", path)?,
        text: optional_string(node, "text", path)?,
        next_text: optional_string(node, "nextText", path)?,
        camera_direction: optional_string(node, "cameraDirection", path)?,
        position,
        options,
        scripts,
        extra_data,
    })
}

struct FrameBody {
    kind: FrameKind,
    next_conditional: Vec<ConditionNode>,
    microscripts: Vec<MicroscriptNode>,
}

/// Copies every unset field down from `base`. The result owns its values,
/// so later edits to the base frame never reach it.
fn resolve_frame(
    name: &str,
    scene_name: &str,
    fields: FrameFields,
    base: Option<&Frame>,
    body: FrameBody,
) -> Frame {
    fn inherit(own: Option<String>, base: Option<&Frame>, pick: fn(&Frame) -> &Option<String>) -> Option<String> {
        own.or_else(|| base.and_then(|frame| pick(frame).clone()))
    }

    let options = match (fields.options, base) {
        (Some(own), Some(base)) => own.merged_over(&base.options),
        (Some(own), None) => own,
        (None, Some(base)) => base.options.clone(),
        (None, None) => FrameOptions::default(),
    };
    let scripts = match (fields.scripts, base) {
        (Some(own), Some(base)) => own.merged_over(&base.scripts),
        (Some(own), None) => own,
        (None, Some(base)) => base.scripts.clone(),
        (None, None) => FrameScripts::default(),
    };
    let mut extra_data = base.map(|frame| frame.extra_data.clone()).unwrap_or_default();
    if let Some(own) = fields.extra_data {
        extra_data.extend(own);
    }

    Frame {
        name: name.to_string(),
        scene_name: scene_name.to_string(),
        background: inherit(fields.background, base, |frame| &frame.background),
        image: inherit(fields.image, base, |frame| &frame.image),
        next: inherit(fields.next, base, |frame| &frame.next),
        music: inherit(fields.music, base, |frame| &frame.music),
        name_text: inherit(fields.name_text, base, |frame| &frame.name_text),
        text: inherit(fields.text, base, |frame| &frame.text),
        next_text: inherit(fields.next_text, base, |frame| &frame.next_text),
        camera_direction: inherit(fields.camera_direction, base, |frame| &frame.camera_direction),
        position: fields
            .position
            .or_else(|| base.map(|frame| frame.position))
            .unwrap_or_default(),
        options,
        scripts,
        extra_data,
        next_conditional: body.next_conditional,
        microscripts: body.microscripts,
        kind: body.kind,
    }
}

pub(crate) fn parse_base_frame(
    scene_name: &str,
    root: &JsonObject,
    diagnostics: &mut Diagnostics,
) -> Result<Frame, DialogueError> {
    let fields = read_frame_fields(root, "", diagnostics)?;
    Ok(resolve_frame(
        BASE_FRAME_NAME,
        scene_name,
        fields,
        None,
        FrameBody {
            kind: FrameKind::Text(TimedFrame::default()),
            next_conditional: Vec::new(),
            microscripts: Vec::new(),
        },
    ))
}

pub(crate) fn parse_frame(
    name: &str,
    value: &JsonValue,
    scene_name: &str,
    base: &Frame,
    diagnostics: &mut Diagnostics,
) -> Result<Frame, DialogueError> {
    let path = child_path("frames", name);
    let node = expect_object(value, &path, "PARSE_FRAME_INVALID")?;

    let Some(frame_type) = optional_string(node, "type", &path)? else {
        return Err(DialogueError::parse(
            "PARSE_FRAME_TYPE_MISSING",
            format!("Frame \"{}\" has no \"type\".", name),
        )
        .with_path(path));
    };

    let kind = match frame_type.as_str() {
        "blank" => FrameKind::Blank,
        "text" => FrameKind::Text(parse_timing(node, &path)?),
        "image" => FrameKind::Image(parse_timing(node, &path)?),
        "choice" => FrameKind::Choice(parse_choices(node, &path, diagnostics)?),
        other => {
            return Err(DialogueError::parse(
                "PARSE_FRAME_TYPE_UNKNOWN",
                format!("Frame \"{}\" has unsupported type \"{}\".", name, other),
            )
            .with_path(child_path(&path, "type")))
        }
    };

    let fields = read_frame_fields(node, &path, diagnostics)?;
    let next_conditional = optional_array(node, "conditional", &path)?
        .map(|values| parse_condition_nodes(values, &child_path(&path, "conditional"), diagnostics))
        .unwrap_or_default();
    let microscripts = optional_array(node, "microscript", &path)?
        .map(|values| parse_microscript_list(values, &child_path(&path, "microscript"), diagnostics))
        .unwrap_or_default();

    Ok(resolve_frame(
        name,
        scene_name,
        fields,
        Some(base),
        FrameBody {
            kind,
            next_conditional,
            microscripts,
        },
    ))
}

fn parse_timing(node: &JsonObject, path: &str) -> Result<TimedFrame, DialogueError> {
    let defaults = TimedFrame::default();
    Ok(TimedFrame {
        allow_skip: optional_bool(node, "allowSkip", path)?.unwrap_or(defaults.allow_skip),
        hide_skip: optional_bool(node, "hideSkip", path)?.unwrap_or(defaults.hide_skip),
        use_timer: optional_bool(node, "useTimer", path)?.unwrap_or(defaults.use_timer),
        time_to_show: optional_number(node, "timeToShow", path)?.unwrap_or(defaults.time_to_show),
    })
}

fn parse_choices(
    node: &JsonObject,
    path: &str,
    diagnostics: &mut Diagnostics,
) -> Result<Vec<ChoiceNode>, DialogueError> {
    let choices_path = child_path(path, "choices");
    let values = optional_array(node, "choices", path)?.map(Vec::as_slice).unwrap_or(&[]);

    let mut choices = Vec::new();
    let mut usable = 0;
    for (index, value) in values.iter().enumerate() {
        let choice_path = index_path(&choices_path, index);
        match parse_choice(value, &choice_path, diagnostics) {
            Ok(choice) => {
                usable += 1;
                choices.push(choice);
            }
            Err(error) => {
                diagnostics.error(&choice_path, &error);
                // Keeps later choices at their authored index.
                choices.push(disabled_choice());
            }
        }
    }

    if usable == 0 {
        return Err(DialogueError::parse(
            "PARSE_CHOICES_EMPTY",
            "Choice frame requires a non-empty \"choices\" array.",
        )
        .with_path(choices_path));
    }
    Ok(choices)
}

/// Stand-in for a choice that failed to parse: never shown, never selectable.
fn disabled_choice() -> ChoiceNode {
    ChoiceNode {
        show_condition: Some(Conditional::new(ConditionKind::Unknown, String::new())),
        ..ChoiceNode::default()
    }
}

fn parse_choice(
    value: &JsonValue,
    path: &str,
    diagnostics: &mut Diagnostics,
) -> Result<ChoiceNode, DialogueError> {
    let node = expect_object(value, path, "PARSE_CHOICE_INVALID")?;

    let condition = |key: &str, diagnostics: &mut Diagnostics| {
        node.get(key)
            .filter(|value| !value.is_null())
            .map(|value| parse_conditional(value, &child_path(path, key), diagnostics))
    };
    let show_condition = condition("showCondition", diagnostics);
    let hide_condition = condition("hideCondition", diagnostics);

    let skill_check = match node.get("skillCheck") {
        None | Some(JsonValue::Null) => None,
        Some(value) => Some(parse_skill_check(value, &child_path(path, "skillCheck"))?),
    };

    let choice = ChoiceNode {
        text: optional_string(node, "text", path)?.unwrap_or_default(),
        next: optional_string(node, "next", path)?,
        show_condition,
        hide_condition,
        next_conditional: optional_array(node, "conditional", path)?
            .map(|values| parse_condition_nodes(values, &child_path(path, "conditional"), diagnostics))
            .unwrap_or_default(),
        next_microscript: optional_array(node, "microscript", path)?
            .map(|values| parse_microscript_list(values, &child_path(path, "microscript"), diagnostics))
            .unwrap_or_default(),
        skill_check,
    };

    if choice.next.is_none() && choice.next_conditional.is_empty() && choice.skill_check.is_none() {
        diagnostics.warn(
            path,
            "PARSE_CHOICE_NEXT_MISSING",
            "Choice has no next, conditional or skillCheck; selecting it ends the dialogue.",
        );
    }
    Ok(choice)
}

fn parse_skill_check(value: &JsonValue, path: &str) -> Result<SkillCheckNode, DialogueError> {
    let node = expect_object(value, path, "PARSE_SKILLCHECK_INVALID")?;
    let invalid = |message: String| {
        DialogueError::parse("PARSE_SKILLCHECK_INVALID", message).with_path(path.to_string())
    };

    let raw_type = optional_string(node, "type", path)?
        .or(optional_string(node, "checkType", path)?)
        .map(|raw| raw.to_ascii_lowercase());
    let check_type = match raw_type.as_deref() {
        None | Some("hard") => SkillCheckType::Hard,
        Some("soft") => SkillCheckType::Soft,
        Some(other) => return Err(invalid(format!("Unknown skill check type \"{}\".", other))),
    };

    let comparison = match optional_string(node, "comparison", path)? {
        None => ComparisonType::GreaterEqual,
        Some(raw) => match ComparisonType::from_key(&raw) {
            Some(
                found @ (ComparisonType::Greater
                | ComparisonType::GreaterEqual
                | ComparisonType::Equal
                | ComparisonType::Less
                | ComparisonType::LessEqual),
            ) => found,
            _ => return Err(invalid(format!("Unsupported skill check comparison \"{}\".", raw))),
        },
    };

    let target_type = match optional_string(node, "targetType", path)?
        .map(|raw| raw.to_ascii_lowercase())
        .as_deref()
    {
        None | Some("skill") => SkillCheckTarget::Skill,
        Some("stat") => SkillCheckTarget::Stat,
        Some("av") | Some("actorvalue") => SkillCheckTarget::ActorValue,
        Some(other) => return Err(invalid(format!("Unknown skill check target type \"{}\".", other))),
    };

    let target = optional_string(node, "target", path)?
        .ok_or_else(|| invalid("Skill check requires \"target\".".to_string()))?;
    let threshold = optional_number(node, "value", path)?
        .ok_or_else(|| invalid("Skill check requires a numeric \"value\".".to_string()))?;
    let pass_next = optional_string(node, "passNext", path)?
        .or(optional_string(node, "pass", path)?)
        .ok_or_else(|| invalid("Skill check requires \"passNext\".".to_string()))?;
    let fail_next = optional_string(node, "failNext", path)?
        .or(optional_string(node, "fail", path)?)
        .ok_or_else(|| invalid("Skill check requires \"failNext\".".to_string()))?;

    Ok(SkillCheckNode {
        check_type,
        comparison,
        target_type,
        target,
        value: threshold,
        pass_next,
        fail_next,
        append_check_text: optional_bool(node, "appendCheckText", path)?.unwrap_or(true),
    })
}

#[cfg(test)]
mod frame_tests {
    use super::*;
    use dlg_core::{ConditionKind, PanelHeight};
    use serde_json::json;

    fn base_from(root: JsonValue) -> Frame {
        let mut diagnostics = Diagnostics::new("test");
        parse_base_frame("test", root.as_object().expect("object"), &mut diagnostics)
            .expect("base frame should parse")
    }

    #[test]
    fn unset_fields_copy_down_from_base() {
        let base = base_from(json!({
            "background": "hall",
            "nameText": "Guard",
            "next": "meta.return",
            "position": "character",
            "options": {"traceIgnore": true, "voiceOverride": "gruff"},
            "scripts": {"OnPresent": "wave"},
            "ExtraData": {"mood": "calm", "tier": 1}
        }));
        let mut diagnostics = Diagnostics::new("test");
        let frame = parse_frame(
            "start",
            &json!({
                "type": "text",
                "text": "Hello",
                "options": {"voiceOverride": "soft"},
                "scripts": {"OnChoice": "nod"},
                "ExtraData": {"mood": "angry"}
            }),
            "test",
            &base,
            &mut diagnostics,
        )
        .expect("frame should parse");

        assert_eq!(frame.background.as_deref(), Some("hall"));
        assert_eq!(frame.name_text.as_deref(), Some("Guard"));
        assert_eq!(frame.next.as_deref(), Some("meta.return"));
        assert_eq!(frame.text.as_deref(), Some("Hello"));
        assert_eq!(frame.position, ImagePosition::Character);
        assert_eq!(frame.options.trace_ignore, Some(true));
        assert_eq!(frame.options.voice_override.as_deref(), Some("soft"));
        assert_eq!(frame.scripts.on_present.as_deref(), Some("wave"));
        assert_eq!(frame.scripts.on_choice.as_deref(), Some("nod"));
        assert_eq!(frame.extra_data.get("mood"), Some(&json!("angry")));
        assert_eq!(frame.extra_data.get("tier"), Some(&json!(1)));
    }

    #[test]
    fn explicit_empty_music_differs_from_absent_music() {
        let base = base_from(json!({"music": "town_theme"}));
        let mut diagnostics = Diagnostics::new("test");
        let cleared = parse_frame("a", &json!({"type": "text", "music": ""}), "test", &base, &mut diagnostics)
            .expect("a");
        let inherited = parse_frame("b", &json!({"type": "text"}), "test", &base, &mut diagnostics)
            .expect("b");
        assert_eq!(cleared.music.as_deref(), Some(""));
        assert_eq!(inherited.music.as_deref(), Some("town_theme"));

        let silent_base = base_from(json!({}));
        let untouched = parse_frame("c", &json!({"type": "text", "music": null}), "test", &silent_base, &mut diagnostics)
            .expect("c");
        assert_eq!(untouched.music, None);
    }

    #[test]
    fn type_discriminator_selects_variant() {
        let base = base_from(json!({}));
        let mut diagnostics = Diagnostics::new("test");
        let image = parse_frame(
            "i",
            &json!({"type": "image", "useTimer": true, "timeToShow": 2.5, "allowSkip": false}),
            "test",
            &base,
            &mut diagnostics,
        )
        .expect("image");
        let FrameKind::Image(timing) = image.kind else {
            panic!("expected image frame");
        };
        assert!(timing.use_timer);
        assert!(!timing.allow_skip);
        assert_eq!(timing.time_to_show, 2.5);

        let blank = parse_frame("b", &json!({"type": "blank"}), "test", &base, &mut diagnostics)
            .expect("blank");
        assert_eq!(blank.kind, FrameKind::Blank);

        let error = parse_frame("x", &json!({"type": "video"}), "test", &base, &mut diagnostics)
            .expect_err("unknown type should fail");
        assert_eq!(error.code, "PARSE_FRAME_TYPE_UNKNOWN");

        let error = parse_frame("y", &json!({"text": "no type"}), "test", &base, &mut diagnostics)
            .expect_err("missing type should fail");
        assert_eq!(error.code, "PARSE_FRAME_TYPE_MISSING");
    }

    #[test]
    fn choice_frame_requires_choices() {
        let base = base_from(json!({}));
        let mut diagnostics = Diagnostics::new("test");
        let error = parse_frame("c", &json!({"type": "choice", "choices": []}), "test", &base, &mut diagnostics)
            .expect_err("empty choices should fail");
        assert_eq!(error.code, "PARSE_CHOICES_EMPTY");
    }

    #[test]
    fn choice_nodes_carry_conditions_and_skill_check() {
        let base = base_from(json!({}));
        let mut diagnostics = Diagnostics::new("test");
        let frame = parse_frame(
            "c",
            &json!({
                "type": "choice",
                "choices": [
                    {"text": "Bribe", "next": "bribe", "hideCondition": {"noflag": "has_gold"},
                     "skillCheck": {"type": "soft", "targetType": "skill", "target": "Persuasion",
                                    "value": 40, "comparison": "greater", "passNext": "ok", "failNext": "fail"}},
                    {"text": "Leave", "next": "meta.return",
                     "conditional": [{"next": "sneak", "conditions": [{"flag": "stealthy"}]}],
                     "microscript": [{"flag": "left", "set": true}]},
                    {"text": "Broken", "skillCheck": {"type": "soft"}}
                ]
            }),
            "test",
            &base,
            &mut diagnostics,
        )
        .expect("frame should parse");

        let choices = frame.choices();
        assert_eq!(choices.len(), 3);
        assert_eq!(
            choices[2].show_condition.as_ref().map(|condition| condition.kind),
            Some(ConditionKind::Unknown)
        );
        assert_eq!(
            choices[0].hide_condition.as_ref().map(|condition| condition.kind),
            Some(ConditionKind::NoFlag)
        );
        let check = choices[0].skill_check.as_ref().expect("skill check");
        assert_eq!(check.check_type, SkillCheckType::Soft);
        assert_eq!(check.comparison, ComparisonType::Greater);
        assert_eq!(check.value, 40.0);
        assert!(check.append_check_text);
        assert_eq!(choices[1].next_conditional[0].next, "sneak");
        assert_eq!(choices[1].next_microscript.len(), 1);
        assert!(diagnostics
            .into_items()
            .iter()
            .any(|item| item.code == "PARSE_SKILLCHECK_INVALID"));
    }

    #[test]
    fn malformed_choice_keeps_later_choices_at_their_index() {
        let base = base_from(json!({}));
        let mut diagnostics = Diagnostics::new("test");
        let frame = parse_frame(
            "c",
            &json!({
                "type": "choice",
                "choices": [
                    {"text": "First", "next": "a"},
                    "bogus",
                    {"text": "Third", "next": "c"}
                ]
            }),
            "test",
            &base,
            &mut diagnostics,
        )
        .expect("frame should parse");

        let choices = frame.choices();
        assert_eq!(choices.len(), 3);
        assert_eq!(choices[1].text, "");
        assert_eq!(
            choices[1].show_condition.as_ref().map(|condition| condition.kind),
            Some(ConditionKind::Unknown)
        );
        assert_eq!(choices[2].text, "Third");
        assert_eq!(choices[2].next.as_deref(), Some("c"));
        assert!(diagnostics
            .into_items()
            .iter()
            .any(|item| item.code == "PARSE_CHOICE_INVALID" && item.path.ends_with("choices[1]")));
    }

    #[test]
    fn choice_frame_with_only_malformed_choices_is_empty() {
        let base = base_from(json!({}));
        let mut diagnostics = Diagnostics::new("test");
        let error = parse_frame("c", &json!({"type": "choice", "choices": ["x", 3]}), "test", &base, &mut diagnostics)
            .expect_err("no usable choice should fail");
        assert_eq!(error.code, "PARSE_CHOICES_EMPTY");
    }

    #[test]
    fn panel_height_number_is_fixed() {
        let base = base_from(json!({"options": {"panelHeight": 320}}));
        assert_eq!(base.options.panel_height, Some(PanelHeight::Fixed(320.0)));
    }
}
