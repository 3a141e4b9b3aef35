use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use dlg_core::{DialogueError, ErrorKind};
use walkdir::WalkDir;

pub const DIALOGUE_DIR: &str = "dialogue";
pub const SCRIPTS_DIR: &str = "scripts";
pub const STATE_FILE: &str = "state.json";

/// Everything a dialogue project directory holds, keyed by name.
///
/// `dialogue/town/inn.json` becomes scene `town/inn`; `scripts/reward.rhai`
/// becomes script `reward`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectSources {
    pub dialogues: BTreeMap<String, String>,
    pub scripts: BTreeMap<String, String>,
    pub state_json: Option<String>,
}

pub fn read_project_dir(root: &Path) -> Result<ProjectSources, DialogueError> {
    if !root.is_dir() {
        return Err(io_error(
            "API_SOURCE_NOT_FOUND",
            format!("Project directory does not exist: {}", root.display()),
        ));
    }

    let dialogues = read_named_files(&root.join(DIALOGUE_DIR), "json")?;
    if dialogues.is_empty() {
        return Err(io_error(
            "API_SOURCE_EMPTY",
            format!(
                "No dialogue documents found under {}",
                root.join(DIALOGUE_DIR).display()
            ),
        ));
    }
    let scripts = read_named_files(&root.join(SCRIPTS_DIR), "rhai")?;

    let state_path = root.join(STATE_FILE);
    let state_json = if state_path.is_file() {
        Some(read_file(&state_path)?)
    } else {
        None
    };

    Ok(ProjectSources {
        dialogues,
        scripts,
        state_json,
    })
}

fn read_named_files(dir: &Path, extension: &str) -> Result<BTreeMap<String, String>, DialogueError> {
    let mut files = BTreeMap::new();
    if !dir.is_dir() {
        return Ok(files);
    }

    for entry in WalkDir::new(dir)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
    {
        let entry = entry.map_err(|error| {
            io_error(
                "API_SOURCE_SCAN",
                format!("Failed to scan {}: {}", dir.display(), error),
            )
        })?;
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        if path.extension().and_then(|ext| ext.to_str()) != Some(extension) {
            continue;
        }
        let relative = path
            .strip_prefix(dir)
            .map_err(|_| {
                io_error(
                    "API_SOURCE_SCAN",
                    format!("{} is outside {}", path.display(), dir.display()),
                )
            })?
            .with_extension("")
            .to_string_lossy()
            .replace('\\', "/");
        files.insert(relative, read_file(path)?);
    }
    Ok(files)
}

fn read_file(path: &Path) -> Result<String, DialogueError> {
    fs::read_to_string(path).map_err(|error| {
        io_error(
            "API_SOURCE_READ",
            format!("Failed to read {}: {}", path.display(), error),
        )
    })
}

fn io_error(code: &str, message: String) -> DialogueError {
    DialogueError::new(ErrorKind::Io, code, message)
}
