use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::error::DialogueError;
use crate::value::{ComparisonType, DlgValue};

/// Synthetic frame holding scene-wide defaults.
pub const BASE_FRAME_NAME: &str = "_BaseFrame";
/// Frame alias that resolves to the scene's default frame.
pub const DEFAULT_FRAME_ALIAS: &str = "default";

/// One parsed dialogue document. Built once by the parser and shared
/// read-only (behind `Arc`) for the lifetime of a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DialogueScene {
    pub name: String,
    pub default_frame: String,
    pub music: Option<String>,
    pub frames: BTreeMap<String, Frame>,
}

impl DialogueScene {
    pub fn base_frame(&self) -> Option<&Frame> {
        self.frames.get(BASE_FRAME_NAME)
    }

    /// Maps the `default` alias to the scene's declared default frame.
    pub fn resolve_frame_name<'a>(&'a self, name: &'a str) -> &'a str {
        if name.is_empty() || name == DEFAULT_FRAME_ALIAS {
            self.default_frame.as_str()
        } else {
            name
        }
    }

    pub fn frame(&self, name: &str) -> Result<&Frame, DialogueError> {
        let resolved = self.resolve_frame_name(name);
        self.frames
            .get(resolved)
            .ok_or_else(|| DialogueError::frame_not_found(&self.name, resolved))
    }

    pub fn frame_names(&self) -> impl Iterator<Item = &str> {
        self.frames
            .keys()
            .map(String::as_str)
            .filter(|name| *name != BASE_FRAME_NAME)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ImagePosition {
    #[default]
    Center,
    Fill,
    Character,
    Battler,
    CharacterBottom,
    Contain,
    Cover,
}

impl ImagePosition {
    pub fn from_key(key: &str) -> Option<Self> {
        match key.to_ascii_lowercase().as_str() {
            "center" => Some(Self::Center),
            "fill" => Some(Self::Fill),
            "character" => Some(Self::Character),
            "battler" => Some(Self::Battler),
            "characterbottom" => Some(Self::CharacterBottom),
            "contain" => Some(Self::Contain),
            "cover" => Some(Self::Cover),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PanelHeight {
    Default,
    Variable,
    Fixed(f64),
}

/// Typed per-frame overrides. Every field is optional so inheritance can
/// merge key by key; `extra` keeps keys this crate does not know about.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FrameOptions {
    pub panel_height: Option<PanelHeight>,
    pub trace_ignore: Option<bool>,
    pub trace_speaker: Option<String>,
    pub trace_text: Option<String>,
    pub voice_override: Option<String>,
    pub hide_objects: Option<Vec<String>>,
    pub extra: BTreeMap<String, JsonValue>,
}

impl FrameOptions {
    /// Child keys win; keys the child leaves unset fall through to `base`.
    pub fn merged_over(&self, base: &FrameOptions) -> FrameOptions {
        let mut extra = base.extra.clone();
        for (key, value) in &self.extra {
            extra.insert(key.clone(), value.clone());
        }
        FrameOptions {
            panel_height: self.panel_height.or(base.panel_height),
            trace_ignore: self.trace_ignore.or(base.trace_ignore),
            trace_speaker: self.trace_speaker.clone().or_else(|| base.trace_speaker.clone()),
            trace_text: self.trace_text.clone().or_else(|| base.trace_text.clone()),
            voice_override: self
                .voice_override
                .clone()
                .or_else(|| base.voice_override.clone()),
            hide_objects: self.hide_objects.clone().or_else(|| base.hide_objects.clone()),
            extra,
        }
    }

    pub fn trace_ignored(&self) -> bool {
        self.trace_ignore.unwrap_or(false)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HookKind {
    BeforePresent,
    OnPresent,
    OnChoice,
    OnUnpresent,
    OnClose,
}

impl HookKind {
    pub fn name(self) -> &'static str {
        match self {
            Self::BeforePresent => "BeforePresent",
            Self::OnPresent => "OnPresent",
            Self::OnChoice => "OnChoice",
            Self::OnUnpresent => "OnUnpresent",
            Self::OnClose => "OnClose",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FrameScripts {
    pub before_present: Option<String>,
    pub on_present: Option<String>,
    pub on_choice: Option<String>,
    pub on_unpresent: Option<String>,
    pub on_close: Option<String>,
}

impl FrameScripts {
    pub fn merged_over(&self, base: &FrameScripts) -> FrameScripts {
        FrameScripts {
            before_present: self.before_present.clone().or_else(|| base.before_present.clone()),
            on_present: self.on_present.clone().or_else(|| base.on_present.clone()),
            on_choice: self.on_choice.clone().or_else(|| base.on_choice.clone()),
            on_unpresent: self.on_unpresent.clone().or_else(|| base.on_unpresent.clone()),
            on_close: self.on_close.clone().or_else(|| base.on_close.clone()),
        }
    }

    pub fn get(&self, hook: HookKind) -> Option<&str> {
        let slot = match hook {
            HookKind::BeforePresent => &self.before_present,
            HookKind::OnPresent => &self.on_present,
            HookKind::OnChoice => &self.on_choice,
            HookKind::OnUnpresent => &self.on_unpresent,
            HookKind::OnClose => &self.on_close,
        };
        slot.as_deref().filter(|name| !name.is_empty())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimedFrame {
    pub allow_skip: bool,
    pub hide_skip: bool,
    pub use_timer: bool,
    pub time_to_show: f64,
}

impl Default for TimedFrame {
    fn default() -> Self {
        Self {
            allow_skip: true,
            hide_skip: false,
            use_timer: false,
            time_to_show: 0.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FrameKind {
    Blank,
    Text(TimedFrame),
    Image(TimedFrame),
    Choice(Vec<ChoiceNode>),
}

impl FrameKind {
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Blank => "blank",
            Self::Text(_) => "text",
            Self::Image(_) => "image",
            Self::Choice(_) => "choice",
        }
    }

    pub fn timing(&self) -> Option<&TimedFrame> {
        match self {
            Self::Text(timing) | Self::Image(timing) => Some(timing),
            Self::Blank | Self::Choice(_) => None,
        }
    }
}

/// A node of the dialogue graph with every inheritable field already
/// resolved against the scene's base frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Frame {
    pub name: String,
    pub scene_name: String,
    pub background: Option<String>,
    pub image: Option<String>,
    /// `None` leaves the music alone, `Some("")` clears it.
    pub music: Option<String>,
    pub name_text: Option<String>,
    pub text: Option<String>,
    pub next_text: Option<String>,
    pub camera_direction: Option<String>,
    pub position: ImagePosition,
    pub next: Option<String>,
    pub next_conditional: Vec<ConditionNode>,
    pub microscripts: Vec<MicroscriptNode>,
    pub options: FrameOptions,
    pub scripts: FrameScripts,
    pub extra_data: BTreeMap<String, JsonValue>,
    pub kind: FrameKind,
}

impl Frame {
    pub fn path(&self) -> String {
        format!("{}.{}", self.scene_name, self.name)
    }

    pub fn choices(&self) -> &[ChoiceNode] {
        match &self.kind {
            FrameKind::Choice(choices) => choices,
            _ => &[],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChoiceNode {
    pub text: String,
    pub next: Option<String>,
    pub show_condition: Option<Conditional>,
    pub hide_condition: Option<Conditional>,
    pub next_conditional: Vec<ConditionNode>,
    pub next_microscript: Vec<MicroscriptNode>,
    pub skill_check: Option<SkillCheckNode>,
}

/// Next-override rule: `next` applies when every condition holds.
/// An empty condition list holds vacuously.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConditionNode {
    pub next: String,
    pub conditions: Vec<Conditional>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ConditionKind {
    Flag,
    NoFlag,
    Variable,
    Affinity,
    Quest,
    Item,
    ActorValue,
    Exec,
    Unknown,
}

impl ConditionKind {
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "flag" => Some(Self::Flag),
            "noflag" => Some(Self::NoFlag),
            "variable" => Some(Self::Variable),
            "affinity" => Some(Self::Affinity),
            "quest" => Some(Self::Quest),
            "item" => Some(Self::Item),
            "av" | "actorvalue" => Some(Self::ActorValue),
            "exec" => Some(Self::Exec),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Conditional {
    pub kind: ConditionKind,
    pub target: String,
    pub comparison: Option<ComparisonType>,
    /// Comparison operand, or the numeric argument for `exec`.
    pub value: Option<DlgValue>,
}

impl Conditional {
    pub fn new(kind: ConditionKind, target: impl Into<String>) -> Self {
        Self {
            kind,
            target: target.into(),
            comparison: None,
            value: None,
        }
    }

    pub fn compared(mut self, comparison: ComparisonType, value: impl Into<DlgValue>) -> Self {
        self.comparison = Some(comparison);
        self.value = Some(value.into());
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MicroscriptKind {
    Flag,
    Item,
    Variable,
    Affinity,
    Quest,
    ActorValue,
    Exec,
    Unknown,
}

impl MicroscriptKind {
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "flag" => Some(Self::Flag),
            "item" => Some(Self::Item),
            "variable" => Some(Self::Variable),
            "affinity" => Some(Self::Affinity),
            "quest" => Some(Self::Quest),
            "av" | "actorvalue" => Some(Self::ActorValue),
            "exec" => Some(Self::Exec),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MicroscriptAction {
    Set,
    Toggle,
    Add,
    Give,
    Take,
    Start,
    Finish,
}

impl MicroscriptAction {
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "set" => Some(Self::Set),
            "toggle" => Some(Self::Toggle),
            "add" => Some(Self::Add),
            "give" => Some(Self::Give),
            "take" => Some(Self::Take),
            "start" => Some(Self::Start),
            "finish" => Some(Self::Finish),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DelayTimeType {
    /// Game time: freezes while the host is paused.
    #[default]
    Game,
    Real,
    World,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MicroscriptDelay {
    pub seconds: f64,
    pub time_type: DelayTimeType,
    pub absolute: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MicroscriptNode {
    pub kind: MicroscriptKind,
    pub target: String,
    pub action: MicroscriptAction,
    pub value: Option<DlgValue>,
    pub delay: Option<MicroscriptDelay>,
}

impl MicroscriptNode {
    pub fn new(kind: MicroscriptKind, target: impl Into<String>, action: MicroscriptAction) -> Self {
        Self {
            kind,
            target: target.into(),
            action,
            value: None,
            delay: None,
        }
    }

    pub fn with_value(mut self, value: impl Into<DlgValue>) -> Self {
        self.value = Some(value.into());
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SkillCheckType {
    Hard,
    Soft,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SkillCheckTarget {
    Stat,
    Skill,
    ActorValue,
}

impl SkillCheckTarget {
    pub fn label(self) -> &'static str {
        match self {
            Self::Stat => "Stat",
            Self::Skill => "Skill",
            Self::ActorValue => "Value",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkillCheckNode {
    pub check_type: SkillCheckType,
    pub comparison: ComparisonType,
    pub target_type: SkillCheckTarget,
    pub target: String,
    pub value: f64,
    pub pass_next: String,
    pub fail_next: String,
    pub append_check_text: bool,
}
