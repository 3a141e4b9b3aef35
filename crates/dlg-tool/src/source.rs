use std::fs;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::{DlgToolError, TestCase, TESTCASE_SCHEMA_V1};

pub const TESTCASE_FILE: &str = "testcase.json";

/// Project directories under `root` that carry a `testcase.json`, sorted.
pub fn discover_cases(root: &Path) -> Result<Vec<PathBuf>, DlgToolError> {
    let mut projects: Vec<PathBuf> = WalkDir::new(root)
        .min_depth(1)
        .max_depth(2)
        .follow_links(false)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_file() && entry.file_name() == TESTCASE_FILE)
        .filter_map(|entry| entry.path().parent().map(Path::to_path_buf))
        .collect();
    projects.sort();

    if projects.is_empty() {
        return Err(DlgToolError::NoCases {
            file: TESTCASE_FILE.to_string(),
            path: root.to_path_buf(),
        });
    }
    log::debug!("discovered {} testcases under {}", projects.len(), root.display());
    Ok(projects)
}

pub fn read_test_case(case_path: &Path) -> Result<TestCase, DlgToolError> {
    let raw = fs::read_to_string(case_path).map_err(|source| DlgToolError::ReadFile {
        path: case_path.to_path_buf(),
        source,
    })?;
    let parsed: TestCase =
        serde_json::from_str(&raw).map_err(|source| DlgToolError::ParseCase {
            path: case_path.to_path_buf(),
            source,
        })?;

    if parsed.schema_version != TESTCASE_SCHEMA_V1 {
        return Err(DlgToolError::InvalidSchemaVersion {
            expected: TESTCASE_SCHEMA_V1.to_string(),
            found: parsed.schema_version,
        });
    }

    Ok(parsed)
}
