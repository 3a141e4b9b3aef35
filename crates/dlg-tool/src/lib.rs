mod case;
mod runner;
mod source;

pub use case::{ExpectedEvent, ExpectedState, TestAction, TestCase, TESTCASE_SCHEMA_V1};
pub use runner::{assert_case, run_case, RunReport};
pub use source::{discover_cases, read_test_case, TESTCASE_FILE};

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DlgToolError {
    #[error("Failed to read file {path}: {source}")]
    ReadFile {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to parse testcase {path}: {source}")]
    ParseCase {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("Invalid testcase schema version \"{found}\", expected \"{expected}\".")]
    InvalidSchemaVersion { expected: String, found: String },
    #[error("No {file} found under {path}.")]
    NoCases { file: String, path: PathBuf },
    #[error("Engine error: {0}")]
    Engine(#[from] dlg_core::DialogueError),
    #[error("Session already closed before action {action_index} ({kind}).")]
    SessionClosed { action_index: usize, kind: String },
    #[error("Expected event count {expected}, actual {actual}. observed={observed}")]
    EventCountMismatch {
        expected: usize,
        actual: usize,
        observed: String,
    },
    #[error("Event mismatch at index {index}. expected={expected} actual={actual}")]
    EventMismatch {
        index: usize,
        expected: String,
        actual: String,
    },
    #[error("State mismatch for {field}.{key}: expected {expected}, actual {actual}")]
    StateMismatch {
        field: String,
        key: String,
        expected: String,
        actual: String,
    },
    #[error("Trace mismatch. expected={expected:?} actual={actual:?}")]
    TraceMismatch {
        expected: Vec<String>,
        actual: Vec<String>,
    },
    #[error("Failed to serialize event for diff: {0}")]
    EventSerialize(serde_json::Error),
}
