use std::collections::BTreeMap;
use std::fmt::Debug;
use std::path::Path;

use dlg_api::{create_engine_from_json, read_project_dir, CreateEngineOptions};
use dlg_core::{DialogueOutput, DialogueTrace};
use dlg_runtime::{EngineTick, MemoryGameState};

use crate::source::read_test_case;
use crate::{DlgToolError, ExpectedEvent, ExpectedState, TestAction, TestCase};

#[derive(Debug, Clone, PartialEq)]
pub struct RunReport {
    pub observed_events: Vec<ExpectedEvent>,
    pub consumed_actions: usize,
    pub final_state: MemoryGameState,
    /// `scene.frame` per trace node, with `#choice` appended for choice nodes.
    pub trace: Vec<String>,
}

pub fn run_case(project_dir: &Path, case: &TestCase) -> Result<RunReport, DlgToolError> {
    let mut options = CreateEngineOptions::from_project(read_project_dir(project_dir)?)?;
    options.entry_scene = case.entry_scene.clone();
    options.entry_frame = case.entry_frame.clone();
    options.random_seed = Some(case.random_seed);
    options.config = case.config.clone();
    let mut session = create_engine_from_json(options)?;

    let mut observed_events = vec![observe(&session.output)];
    let mut closed = session.output.is_closed();

    for (action_index, action) in case.actions.iter().enumerate() {
        if closed {
            return Err(DlgToolError::SessionClosed {
                action_index,
                kind: action.kind_name().to_string(),
            });
        }
        log::debug!("action {}: {:?}", action_index, action);
        let output = match action {
            TestAction::Choose { index } => Some(session.engine.choose(*index)?),
            TestAction::Continue => Some(session.engine.continue_frame()?),
            TestAction::Tick { seconds } => session.engine.tick(EngineTick::seconds(*seconds))?,
            TestAction::Cancel => Some(session.engine.cancel()?),
        };
        if let Some(output) = output {
            closed = output.is_closed();
            observed_events.push(observe(&output));
        }
    }

    Ok(RunReport {
        observed_events,
        consumed_actions: case.actions.len(),
        final_state: session.state.snapshot(),
        trace: trace_labels(session.engine.trace()),
    })
}

pub fn assert_case(project_dir: &Path, case_path: &Path) -> Result<(), DlgToolError> {
    let case = read_test_case(case_path)?;
    let report = run_case(project_dir, &case)?;

    if report.observed_events.len() != case.expected_events.len() {
        let observed = serde_json::to_string_pretty(&report.observed_events)
            .map_err(DlgToolError::EventSerialize)?;
        return Err(DlgToolError::EventCountMismatch {
            expected: case.expected_events.len(),
            actual: report.observed_events.len(),
            observed,
        });
    }

    for (index, (expected, actual)) in case
        .expected_events
        .iter()
        .zip(report.observed_events.iter())
        .enumerate()
    {
        if expected != actual {
            let expected = serde_json::to_string(expected).map_err(DlgToolError::EventSerialize)?;
            let actual = serde_json::to_string(actual).map_err(DlgToolError::EventSerialize)?;
            return Err(DlgToolError::EventMismatch {
                index,
                expected,
                actual,
            });
        }
    }

    if let Some(expected) = &case.expected_state {
        check_state(expected, &report.final_state)?;
    }

    if let Some(expected) = &case.expected_trace {
        if expected != &report.trace {
            return Err(DlgToolError::TraceMismatch {
                expected: expected.clone(),
                actual: report.trace,
            });
        }
    }

    Ok(())
}

fn observe(output: &DialogueOutput) -> ExpectedEvent {
    match output {
        DialogueOutput::Frame { frame } => ExpectedEvent::Frame {
            path: frame.path(),
            speaker: frame.speaker.clone(),
            text: frame.text.clone(),
            choices: frame
                .choices
                .iter()
                .map(|choice| choice.text.clone())
                .collect(),
            locked: frame
                .choices
                .iter()
                .filter(|choice| choice.locked)
                .map(|choice| choice.index)
                .collect(),
        },
        DialogueOutput::Closed { reason } => ExpectedEvent::Closed {
            reason: reason.clone(),
        },
    }
}

fn trace_labels(trace: &DialogueTrace) -> Vec<String> {
    trace
        .nodes()
        .iter()
        .map(|node| match node.choice {
            Some(choice) => format!("{}#{}", node.path, choice),
            None => node.path.clone(),
        })
        .collect()
}

fn check_state(expected: &ExpectedState, actual: &MemoryGameState) -> Result<(), DlgToolError> {
    check_entries("flags", &expected.flags, &actual.flags)?;
    check_entries("variables", &expected.variables, &actual.variables)?;
    check_entries("items", &expected.items, &actual.items)?;
    check_entries("quests", &expected.quests, &actual.quests)
}

fn check_entries<V: PartialEq + Debug>(
    field: &str,
    expected: &BTreeMap<String, V>,
    actual: &BTreeMap<String, V>,
) -> Result<(), DlgToolError> {
    for (key, value) in expected {
        let found = actual.get(key);
        if found != Some(value) {
            return Err(DlgToolError::StateMismatch {
                field: field.to_string(),
                key: key.clone(),
                expected: format!("{:?}", value),
                actual: found
                    .map(|value| format!("{:?}", value))
                    .unwrap_or_else(|| "<missing>".to_string()),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod runner_tests {
    use super::*;

    use std::fs;
    use std::time::{SystemTime, UNIX_EPOCH};

    use dlg_core::CloseReason;
    use dlg_runtime::DialogueConfig;

    fn temp_dir(name: &str) -> std::path::PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("time should move forward")
            .as_nanos();
        std::env::temp_dir().join(format!("dlg-tool-runner-{}-{}", name, nanos))
    }

    fn write_file(path: &Path, content: &str) {
        let parent = path.parent().expect("path should have parent");
        fs::create_dir_all(parent).expect("parent dir should be created");
        fs::write(path, content).expect("file should be written");
    }

    fn simple_case(actions: Vec<TestAction>) -> TestCase {
        TestCase {
            schema_version: crate::TESTCASE_SCHEMA_V1.to_string(),
            entry_scene: None,
            entry_frame: None,
            random_seed: 1,
            config: DialogueConfig::default(),
            actions,
            expected_events: Vec::new(),
            expected_state: None,
            expected_trace: None,
        }
    }

    fn frame(path: &str, text: &str) -> ExpectedEvent {
        ExpectedEvent::Frame {
            path: path.to_string(),
            speaker: None,
            text: text.to_string(),
            choices: Vec::new(),
            locked: Vec::new(),
        }
    }

    fn write_pick_project(root: &Path) {
        write_file(
            &root.join("dialogue/main.json"),
            r#"{
  "default": "ask",
  "frames": {
    "ask": {
      "type": "choice",
      "text": "Pick",
      "choices": [
        {
          "text": "A",
          "next": "a",
          "microscript": [{ "flag": "pickedA", "set": true }]
        },
        { "text": "B", "next": "meta.return" }
      ]
    },
    "a": { "type": "text", "text": "You picked A.", "next": "meta.return" }
  }
}"#,
        );
    }

    #[test]
    fn run_case_records_every_boundary() {
        let root = temp_dir("pick");
        write_pick_project(&root);

        let case = simple_case(vec![TestAction::Choose { index: 0 }, TestAction::Continue]);
        let report = run_case(&root, &case).expect("run should pass");

        assert_eq!(report.consumed_actions, 2);
        assert_eq!(report.observed_events.len(), 3);
        assert!(matches!(
            &report.observed_events[0],
            ExpectedEvent::Frame { choices, .. } if choices == &vec!["A".to_string(), "B".to_string()]
        ));
        assert_eq!(report.observed_events[1], frame("main.a", "You picked A."));
        assert_eq!(
            report.observed_events[2],
            ExpectedEvent::Closed {
                reason: CloseReason::Returned
            }
        );
        assert_eq!(report.final_state.flags.get("pickedA"), Some(&true));
        assert_eq!(report.trace, vec!["main.ask", "main.ask#0", "main.a", "main.a"]);
    }

    #[test]
    fn run_case_rejects_actions_after_close_and_engine_errors() {
        let root = temp_dir("closed");
        write_pick_project(&root);

        let after_close = simple_case(vec![TestAction::Choose { index: 1 }, TestAction::Continue]);
        let error = run_case(&root, &after_close).expect_err("closed session should fail");
        assert!(matches!(
            error,
            DlgToolError::SessionClosed { action_index: 1, .. }
        ));

        let bad_choose = simple_case(vec![TestAction::Choose { index: 9 }]);
        let error = run_case(&root, &bad_choose).expect_err("invalid choose should fail");
        assert!(matches!(error, DlgToolError::Engine(_)));

        let missing = temp_dir("missing-project");
        let error = run_case(&missing, &simple_case(Vec::new())).expect_err("missing dir");
        assert!(matches!(error, DlgToolError::Engine(_)));
    }

    #[test]
    fn run_case_cancel_closes_the_session() {
        let root = temp_dir("cancel");
        write_pick_project(&root);

        let report = run_case(&root, &simple_case(vec![TestAction::Cancel])).expect("run");
        assert_eq!(
            report.observed_events.last(),
            Some(&ExpectedEvent::Closed {
                reason: CloseReason::Cancelled
            })
        );
    }

    #[test]
    fn assert_case_reports_count_value_state_and_trace_mismatches() {
        let root = temp_dir("assert");
        write_pick_project(&root);

        let count_case = root.join("count.json");
        write_file(
            &count_case,
            r#"{
  "schemaVersion":"dlg-tool-case.v1",
  "actions":[],
  "expectedEvents":[]
}"#,
        );
        let error = assert_case(&root, &count_case).expect_err("count mismatch should fail");
        assert!(matches!(error, DlgToolError::EventCountMismatch { .. }));

        let value_case = root.join("value.json");
        write_file(
            &value_case,
            r#"{
  "schemaVersion":"dlg-tool-case.v1",
  "actions":[{"kind":"choose","index":1}],
  "expectedEvents":[
    {"kind":"frame","path":"main.ask","text":"Wrong","choices":["A","B"]},
    {"kind":"closed","reason":{"kind":"returned"}}
  ]
}"#,
        );
        let error = assert_case(&root, &value_case).expect_err("value mismatch should fail");
        assert!(matches!(error, DlgToolError::EventMismatch { index: 0, .. }));

        let state_case = root.join("state.json.case");
        write_file(
            &state_case,
            r#"{
  "schemaVersion":"dlg-tool-case.v1",
  "actions":[{"kind":"choose","index":1}],
  "expectedEvents":[
    {"kind":"frame","path":"main.ask","text":"Pick","choices":["A","B"]},
    {"kind":"closed","reason":{"kind":"returned"}}
  ],
  "expectedState":{"flags":{"pickedA":true}}
}"#,
        );
        let error = assert_case(&root, &state_case).expect_err("state mismatch should fail");
        match error {
            DlgToolError::StateMismatch { field, key, actual, .. } => {
                assert_eq!(field, "flags");
                assert_eq!(key, "pickedA");
                assert_eq!(actual, "<missing>");
            }
            other => panic!("unexpected error: {}", other),
        }

        let trace_case = root.join("trace.json");
        write_file(
            &trace_case,
            r#"{
  "schemaVersion":"dlg-tool-case.v1",
  "actions":[{"kind":"choose","index":1}],
  "expectedEvents":[
    {"kind":"frame","path":"main.ask","text":"Pick","choices":["A","B"]},
    {"kind":"closed","reason":{"kind":"returned"}}
  ],
  "expectedTrace":["main.ask"]
}"#,
        );
        let error = assert_case(&root, &trace_case).expect_err("trace mismatch should fail");
        assert!(matches!(error, DlgToolError::TraceMismatch { .. }));
    }

    #[test]
    fn assert_case_passes_with_matching_expectations() {
        let root = temp_dir("assert-pass");
        write_pick_project(&root);

        let case_path = root.join("testcase.json");
        write_file(
            &case_path,
            r#"{
  "schemaVersion":"dlg-tool-case.v1",
  "actions":[{"kind":"choose","index":0},{"kind":"continue"}],
  "expectedEvents":[
    {"kind":"frame","path":"main.ask","text":"Pick","choices":["A","B"]},
    {"kind":"frame","path":"main.a","text":"You picked A."},
    {"kind":"closed","reason":{"kind":"returned"}}
  ],
  "expectedState":{"flags":{"pickedA":true}},
  "expectedTrace":["main.ask","main.ask#0","main.a","main.a"]
}"#,
        );

        assert_case(&root, &case_path).expect("assert should pass");
    }
}
