use serde::{Deserialize, Serialize};

/// How far the host is paused, from least to most restrictive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PauseLevel {
    #[default]
    Unpaused,
    AllowCutscene,
    AllowMenu,
    All,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DialogueConfig {
    pub show_impossible_checks: bool,
    pub attempt_impossible_checks: bool,
    pub execute_frame_microscripts_on_choice: bool,
    /// Multiplies every skill-check threshold.
    pub skill_check_difficulty: f64,
    pub clamp_pass_chance: bool,
    pub trace_enabled: bool,
    pub default_next_text: String,
    /// Frame timers and game-clock delays stop above this level.
    pub timer_freeze_above: PauseLevel,
}

impl Default for DialogueConfig {
    fn default() -> Self {
        Self {
            show_impossible_checks: true,
            attempt_impossible_checks: false,
            execute_frame_microscripts_on_choice: false,
            skill_check_difficulty: 1.0,
            clamp_pass_chance: true,
            trace_enabled: true,
            default_next_text: "Continue".to_string(),
            timer_freeze_above: PauseLevel::AllowCutscene,
        }
    }
}

impl DialogueConfig {
    pub fn game_clock_running(&self, pause: PauseLevel) -> bool {
        pause <= self.timer_freeze_above
    }
}

#[cfg(test)]
mod config_tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let config: DialogueConfig =
            serde_json::from_str(r#"{"attemptImpossibleChecks": true, "timerFreezeAbove": "allowMenu"}"#)
                .expect("config should parse");
        assert!(config.attempt_impossible_checks);
        assert!(config.show_impossible_checks);
        assert_eq!(config.skill_check_difficulty, 1.0);
        assert_eq!(config.default_next_text, "Continue");
        assert_eq!(config.timer_freeze_above, PauseLevel::AllowMenu);
    }

    #[test]
    fn game_clock_freezes_above_threshold() {
        let config = DialogueConfig::default();
        assert!(config.game_clock_running(PauseLevel::Unpaused));
        assert!(config.game_clock_running(PauseLevel::AllowCutscene));
        assert!(!config.game_clock_running(PauseLevel::AllowMenu));
        assert!(!config.game_clock_running(PauseLevel::All));
    }
}
