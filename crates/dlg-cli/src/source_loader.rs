use std::fs;
use std::path::{Path, PathBuf};

use dlg_api::{read_project_dir, ProjectSources};
use dlg_core::{DialogueError, ErrorKind};
use dlg_runtime::DialogueConfig;

use crate::{map_cli_config_invalid, map_cli_config_read, map_cli_source_path};

#[derive(Debug, Clone)]
pub(crate) struct LoadedProject {
    /// Absolute, so saved player state keeps working from another cwd.
    pub(crate) dir: PathBuf,
    pub(crate) sources: ProjectSources,
}

pub(crate) fn load_project(project_dir: &str) -> Result<LoadedProject, DialogueError> {
    let dir = resolve_project_dir(project_dir)?;
    let sources = read_project_dir(&dir)?;
    log::debug!(
        "[cli] project {} has {} dialogue(s), {} script(s)",
        dir.display(),
        sources.dialogues.len(),
        sources.scripts.len()
    );
    Ok(LoadedProject { dir, sources })
}

pub(crate) fn resolve_project_dir(project_dir: &str) -> Result<PathBuf, DialogueError> {
    let path = PathBuf::from(project_dir);
    let absolute = if path.is_absolute() {
        path
    } else {
        std::env::current_dir()
            .map_err(map_cli_source_path)?
            .join(path)
    };

    if !absolute.exists() {
        return Err(DialogueError::new(
            ErrorKind::Io,
            "CLI_SOURCE_NOT_FOUND",
            format!("project-dir does not exist: {}", absolute.display()),
        ));
    }

    if !absolute.is_dir() {
        return Err(DialogueError::new(
            ErrorKind::Io,
            "CLI_SOURCE_NOT_DIR",
            format!("project-dir is not a directory: {}", absolute.display()),
        ));
    }

    Ok(absolute)
}

/// Reads `--config`; no flag means every default.
pub(crate) fn load_config(path: Option<&str>) -> Result<DialogueConfig, DialogueError> {
    let Some(path) = path else {
        return Ok(DialogueConfig::default());
    };
    let raw = fs::read_to_string(Path::new(path)).map_err(map_cli_config_read)?;
    serde_json::from_str(&raw).map_err(map_cli_config_invalid)
}

#[cfg(test)]
mod source_loader_tests {
    use super::*;
    use crate::cli_test_support::*;

    #[test]
    fn resolve_project_dir_validates_existence_and_directory() {
        let missing = temp_path("missing-dir");
        let error = resolve_project_dir(missing.to_string_lossy().as_ref())
            .expect_err("missing path should fail");
        assert_eq!(error.code, "CLI_SOURCE_NOT_FOUND");

        let file_path = temp_path("plain-file");
        write_file(&file_path, "x");
        let error = resolve_project_dir(file_path.to_string_lossy().as_ref())
            .expect_err("file path should fail");
        assert_eq!(error.code, "CLI_SOURCE_NOT_DIR");
    }

    #[test]
    fn load_project_reads_demo_sources() {
        let loaded = load_project(&demo_dir("01-tavern")).expect("demo should load");
        assert!(loaded.dir.is_absolute());
        assert!(loaded.sources.dialogues.contains_key("main"));
    }

    #[test]
    fn load_config_defaults_and_rejects_bad_json() {
        let config = load_config(None).expect("defaults");
        assert_eq!(config, DialogueConfig::default());

        let path = temp_path("config.json");
        write_file(&path, r#"{"showImpossibleChecks": false}"#);
        let config = load_config(path.to_str()).expect("config should load");
        assert!(!config.show_impossible_checks);

        write_file(&path, "{");
        let error = load_config(path.to_str()).expect_err("bad json");
        assert_eq!(error.code, "CLI_CONFIG_INVALID");

        let error = load_config(temp_path("absent.json").to_str()).expect_err("missing file");
        assert_eq!(error.code, "CLI_CONFIG_READ");
    }
}
