use serde::{Deserialize, Serialize};

use crate::model::{FrameOptions, ImagePosition, SkillCheckType};
use crate::trace::DialogueTrace;

pub const SNAPSHOT_SCHEMA_V1: &str = "dialogue-snapshot.v1";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SessionState {
    Idle,
    Presenting,
    Advancing,
    Closed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum MusicDirective {
    Unchanged,
    Clear,
    Play { cue: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkillCheckInfo {
    pub check_type: SkillCheckType,
    pub possible: bool,
    pub pass_chance: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PresentedChoice {
    /// Position in the frame's declared choice list.
    pub index: usize,
    pub text: String,
    pub locked: bool,
    pub skill_check: Option<SkillCheckInfo>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PresentedKind {
    Text,
    Image,
    Choice,
}

/// Everything a host needs to render the current frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PresentedFrame {
    pub scene: String,
    pub frame: String,
    pub kind: PresentedKind,
    pub speaker: Option<String>,
    pub text: String,
    pub next_text: String,
    pub background: Option<String>,
    pub image: Option<String>,
    pub position: ImagePosition,
    pub camera_direction: Option<String>,
    pub music: MusicDirective,
    pub choices: Vec<PresentedChoice>,
    pub allow_skip: bool,
    pub hide_skip: bool,
    pub timer_seconds: Option<f64>,
    pub options: FrameOptions,
}

impl PresentedFrame {
    pub fn path(&self) -> String {
        format!("{}.{}", self.scene, self.frame)
    }

    pub fn choice(&self, index: usize) -> Option<&PresentedChoice> {
        self.choices.iter().find(|choice| choice.index == index)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum CloseReason {
    Returned,
    OpenedContainer { id: String },
    ChangedScene { scene: String, spawn: Option<String> },
    RanScript { name: String },
    Aborted { code: String },
    Cancelled,
}

/// What a host sees after any call that moves a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum DialogueOutput {
    Frame { frame: PresentedFrame },
    Closed { reason: CloseReason },
}

impl DialogueOutput {
    pub fn frame(&self) -> Option<&PresentedFrame> {
        match self {
            Self::Frame { frame } => Some(frame),
            Self::Closed { .. } => None,
        }
    }

    pub fn is_closed(&self) -> bool {
        matches!(self, Self::Closed { .. })
    }
}

/// Discrete input that advances a presenting session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum DialogueEvent {
    /// Select a choice by its index in the frame's declared list.
    Choose { index: usize },
    Continue,
    Cancel,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub schema_version: String,
    pub scene: String,
    pub frame: String,
    pub current_music: Option<String>,
    pub trace: DialogueTrace,
    pub rng_state: u32,
    pub timer_remaining: Option<f64>,
}
