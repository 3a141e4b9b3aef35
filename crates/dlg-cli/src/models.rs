use serde::{Deserialize, Serialize};

use dlg_core::{CloseReason, SessionSnapshot};
use dlg_runtime::{DialogueConfig, MemoryGameState};

pub(crate) const PLAYER_STATE_SCHEMA: &str = "dialogue-player-state.v1";

/// What an agent call hands to the next one: where the project lives, how
/// it was configured, the paused session and the game state it left behind.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct PlayerStateV1 {
    pub(crate) schema_version: String,
    pub(crate) project_dir: String,
    pub(crate) config: DialogueConfig,
    pub(crate) snapshot: SessionSnapshot,
    pub(crate) game_state: MemoryGameState,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum BoundaryEvent {
    Frame,
    Closed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct BoundaryChoice {
    pub(crate) index: usize,
    pub(crate) text: String,
    pub(crate) locked: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct BoundaryResult {
    pub(crate) event: BoundaryEvent,
    pub(crate) path: Option<String>,
    pub(crate) speaker: Option<String>,
    pub(crate) text: Option<String>,
    pub(crate) next_text: Option<String>,
    pub(crate) choices: Vec<BoundaryChoice>,
    pub(crate) timer_seconds: Option<f64>,
    pub(crate) close_reason: Option<CloseReason>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LineCommandAction {
    NotHandled,
    Continue,
    RefreshBoundary,
    Quit,
}
