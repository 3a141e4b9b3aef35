use std::collections::BTreeMap;

use dlg_core::{CloseReason, DlgValue};
use dlg_runtime::DialogueConfig;
use serde::{Deserialize, Serialize};

pub const TESTCASE_SCHEMA_V1: &str = "dlg-tool-case.v1";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestCase {
    pub schema_version: String,
    #[serde(default)]
    pub entry_scene: Option<String>,
    #[serde(default)]
    pub entry_frame: Option<String>,
    #[serde(default = "default_random_seed")]
    pub random_seed: u32,
    #[serde(default)]
    pub config: DialogueConfig,
    #[serde(default)]
    pub actions: Vec<TestAction>,
    #[serde(default)]
    pub expected_events: Vec<ExpectedEvent>,
    /// Entries that must be present in the final game state; anything not
    /// listed is not compared.
    #[serde(default)]
    pub expected_state: Option<ExpectedState>,
    /// Trace labels, `scene.frame` or `scene.frame#choice`.
    #[serde(default)]
    pub expected_trace: Option<Vec<String>>,
}

fn default_random_seed() -> u32 {
    1
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum TestAction {
    Choose { index: usize },
    Continue,
    Tick { seconds: f64 },
    Cancel,
}

impl TestAction {
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Choose { .. } => "choose",
            Self::Continue => "continue",
            Self::Tick { .. } => "tick",
            Self::Cancel => "cancel",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ExpectedEvent {
    Frame {
        path: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        speaker: Option<String>,
        text: String,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        choices: Vec<String>,
        /// Declared indexes of the choices shown locked.
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        locked: Vec<usize>,
    },
    Closed {
        reason: CloseReason,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExpectedState {
    pub flags: BTreeMap<String, bool>,
    pub variables: BTreeMap<String, DlgValue>,
    pub items: BTreeMap<String, i64>,
    pub quests: BTreeMap<String, i64>,
}

#[cfg(test)]
mod case_tests {
    use super::*;

    #[test]
    fn test_action_kind_name_reports_expected_value() {
        assert_eq!(TestAction::Choose { index: 0 }.kind_name(), "choose");
        assert_eq!(TestAction::Continue.kind_name(), "continue");
        assert_eq!(TestAction::Tick { seconds: 1.0 }.kind_name(), "tick");
        assert_eq!(TestAction::Cancel.kind_name(), "cancel");
    }

    #[test]
    fn testcase_deserialize_applies_defaults() {
        let parsed: TestCase = serde_json::from_str(
            r#"{
  "schemaVersion": "dlg-tool-case.v1",
  "actions": [],
  "expectedEvents": []
}"#,
        )
        .expect("testcase should deserialize");

        assert_eq!(parsed.schema_version, TESTCASE_SCHEMA_V1);
        assert_eq!(parsed.entry_scene, None);
        assert_eq!(parsed.random_seed, 1);
        assert_eq!(parsed.config, DialogueConfig::default());
        assert!(parsed.actions.is_empty());
        assert!(parsed.expected_state.is_none());
        assert!(parsed.expected_trace.is_none());
    }

    #[test]
    fn expected_event_deserialize_supports_all_variants() {
        let parsed: Vec<ExpectedEvent> = serde_json::from_str(
            r#"[
  {"kind":"frame","path":"main.start","text":"Hi"},
  {"kind":"frame","path":"main.menu","speaker":"Mara","text":"","choices":["A","B"],"locked":[1]},
  {"kind":"closed","reason":{"kind":"openedContainer","id":"GeneralStore"}}
]"#,
        )
        .expect("events should deserialize");

        assert_eq!(parsed.len(), 3);
        assert!(matches!(&parsed[0], ExpectedEvent::Frame { choices, .. } if choices.is_empty()));
        assert!(matches!(&parsed[1], ExpectedEvent::Frame { locked, .. } if locked == &vec![1]));
        assert_eq!(
            parsed[2],
            ExpectedEvent::Closed {
                reason: CloseReason::OpenedContainer {
                    id: "GeneralStore".to_string()
                }
            }
        );
    }

    #[test]
    fn expected_state_reads_partial_maps() {
        let parsed: ExpectedState =
            serde_json::from_str(r#"{"flags":{"met":true},"variables":{"drink":"ale","gold":3}}"#)
                .expect("state should deserialize");
        assert_eq!(parsed.flags.get("met"), Some(&true));
        assert_eq!(parsed.variables.get("drink"), Some(&DlgValue::from("ale")));
        assert_eq!(parsed.variables.get("gold"), Some(&DlgValue::Number(3.0)));
        assert!(parsed.items.is_empty());
    }
}
