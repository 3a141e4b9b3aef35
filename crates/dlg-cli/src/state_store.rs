use std::fs;
use std::path::Path;

use dlg_core::{DialogueError, SNAPSHOT_SCHEMA_V1};

use crate::{
    map_cli_state_encode, map_cli_state_invalid, map_cli_state_read, map_cli_state_write,
    LoadedProject, PlayerStateV1, PLAYER_STATE_SCHEMA,
};

pub(crate) fn save_player_state(path: &Path, state: &PlayerStateV1) -> Result<(), DialogueError> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(map_cli_state_write)?;
    }
    let payload = serde_json::to_string_pretty(state).map_err(map_cli_state_encode)?;
    fs::write(path, payload).map_err(map_cli_state_write)
}

/// Reads a save and checks both the player-state and the session
/// snapshot schema.
pub(crate) fn load_player_state(path: &Path) -> Result<PlayerStateV1, DialogueError> {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(error) if error.kind() == std::io::ErrorKind::NotFound => {
            return Err(DialogueError::state(
                "CLI_STATE_NOT_FOUND",
                format!("No saved dialogue at {}", path.display()),
            ));
        }
        Err(error) => return Err(map_cli_state_read(error)),
    };
    let state: PlayerStateV1 = serde_json::from_str(&raw).map_err(map_cli_state_invalid)?;

    for (label, found, expected) in [
        ("player state", &state.schema_version, PLAYER_STATE_SCHEMA),
        ("session snapshot", &state.snapshot.schema_version, SNAPSHOT_SCHEMA_V1),
    ] {
        if found != expected {
            return Err(DialogueError::state(
                "CLI_STATE_SCHEMA",
                format!("Unsupported {} schema \"{}\"; expected \"{}\".", label, found, expected),
            ));
        }
    }
    Ok(state)
}

/// A save only resumes against a project that still has the dialogue it
/// paused in, and every scene its trace walked through.
pub(crate) fn check_saved_scenes(
    state: &PlayerStateV1,
    project: &LoadedProject,
) -> Result<(), DialogueError> {
    let dialogues = &project.sources.dialogues;
    let missing = std::iter::once(state.snapshot.scene.as_str())
        .chain(
            state
                .snapshot
                .trace
                .nodes()
                .iter()
                .filter_map(|node| node.path.split_once('.').map(|(scene, _)| scene)),
        )
        .find(|scene| !dialogues.contains_key(*scene));

    match missing {
        Some(scene) => Err(DialogueError::state(
            "CLI_STATE_SCENE_MISSING",
            format!(
                "Saved dialogue refers to scene \"{}\", which {} does not define.",
                scene,
                project.dir.display()
            ),
        )),
        None => Ok(()),
    }
}
