use std::path::{Path, PathBuf};

use dlg_api::{
    create_engine_from_json, resume_engine_from_json, CreateEngineOptions, EngineSession,
    ResumeEngineOptions,
};
use dlg_core::{DialogueError, DialogueOutput};
use dlg_runtime::DialogueConfig;

use crate::{
    boundary_from_output, check_saved_scenes, emit_boundary, load_player_state, load_project,
    save_player_state, LoadedProject, PlayerStateV1, PLAYER_STATE_SCHEMA,
};

pub(crate) fn create_session(
    project: &LoadedProject,
    entry_scene: Option<String>,
    entry_frame: Option<String>,
    random_seed: Option<u32>,
    config: DialogueConfig,
) -> Result<EngineSession, DialogueError> {
    let mut options = CreateEngineOptions::from_project(project.sources.clone())?;
    options.entry_scene = entry_scene;
    options.entry_frame = entry_frame;
    options.random_seed = random_seed;
    options.config = config;
    create_engine_from_json(options)
}

pub(crate) fn resume_from_player_state(
    state: &PlayerStateV1,
) -> Result<(PathBuf, EngineSession), DialogueError> {
    let project = load_project(&state.project_dir)?;
    let session = resume_session(&project, state)?;
    Ok((project.dir, session))
}

fn resume_session(
    project: &LoadedProject,
    state: &PlayerStateV1,
) -> Result<EngineSession, DialogueError> {
    check_saved_scenes(state, project)?;
    resume_engine_from_json(ResumeEngineOptions {
        dialogues: project.sources.dialogues.clone(),
        scripts: project.sources.scripts.clone(),
        state: state.game_state.clone(),
        snapshot: state.snapshot.clone(),
        config: state.config.clone(),
    })
}

/// Loads a save made for `project`; a save from another project is refused.
pub(crate) fn load_session_for_project(
    path: &Path,
    project: &LoadedProject,
) -> Result<EngineSession, DialogueError> {
    let state = load_player_state(path)?;
    if Path::new(&state.project_dir) != project.dir.as_path() {
        return Err(DialogueError::state(
            "CLI_STATE_PROJECT_MISMATCH",
            format!(
                "State project mismatch. expected={} actual={}",
                project.dir.display(),
                state.project_dir
            ),
        ));
    }
    resume_session(project, &state)
}

/// Player state for a session that is still presenting; `None` once it
/// closed.
pub(crate) fn capture_player_state(
    session: &EngineSession,
    project_dir: &Path,
    config: &DialogueConfig,
) -> Result<Option<PlayerStateV1>, DialogueError> {
    if !session.engine.is_active() {
        return Ok(None);
    }
    Ok(Some(PlayerStateV1 {
        schema_version: PLAYER_STATE_SCHEMA.to_string(),
        project_dir: project_dir.to_string_lossy().to_string(),
        config: config.clone(),
        snapshot: session.engine.snapshot()?,
        game_state: session.state.snapshot(),
    }))
}

pub(crate) fn emit_boundary_with_saved_state(
    session: &EngineSession,
    output: &DialogueOutput,
    state_out: &str,
    project_dir: &Path,
    config: &DialogueConfig,
) -> Result<i32, DialogueError> {
    let boundary = boundary_from_output(output);
    let saved = match capture_player_state(session, project_dir, config)? {
        Some(state) => {
            save_player_state(Path::new(state_out), &state)?;
            Some(state_out.to_string())
        }
        None => None,
    };
    emit_boundary(boundary, saved);
    Ok(0)
}

#[cfg(test)]
mod session_ops_tests {
    use super::*;
    use crate::cli_test_support::*;
    use dlg_core::CloseReason;

    #[test]
    fn saved_state_resumes_at_the_same_frame() {
        let project = load_project(&demo_dir("01-tavern")).expect("demo should load");
        let config = DialogueConfig::default();
        let mut session =
            create_session(&project, None, None, Some(7), config.clone()).expect("create");
        let output = session.engine.continue_frame().expect("continue should pass");
        let frame = output.frame().expect("frame").frame.clone();

        let state = capture_player_state(&session, &project.dir, &config)
            .expect("capture")
            .expect("session is presenting");
        assert_eq!(state.schema_version, PLAYER_STATE_SCHEMA);
        assert_eq!(state.snapshot.frame, frame);

        let path = temp_path("session-ops-state.json");
        save_player_state(&path, &state).expect("save should pass");
        let resumed = load_session_for_project(&path, &project).expect("resume should pass");
        assert_eq!(resumed.output.frame().expect("frame").frame, frame);

        let (dir, _) = resume_from_player_state(&state).expect("resume by dir");
        assert_eq!(dir, project.dir);
    }

    #[test]
    fn closed_session_has_no_state_and_foreign_saves_are_refused() {
        let project = load_project(&demo_dir("01-tavern")).expect("demo should load");
        let config = DialogueConfig::default();
        let mut session =
            create_session(&project, None, None, None, config.clone()).expect("create");
        let state = capture_player_state(&session, &project.dir, &config)
            .expect("capture")
            .expect("presenting");

        let output = session.engine.cancel().expect("cancel should pass");
        assert_eq!(
            output,
            DialogueOutput::Closed {
                reason: CloseReason::Cancelled
            }
        );
        assert!(capture_player_state(&session, &project.dir, &config)
            .expect("capture")
            .is_none());

        let other = load_project(&demo_dir("02-skill-checks")).expect("demo should load");
        let path = temp_path("session-ops-foreign.json");
        save_player_state(&path, &state).expect("save should pass");
        let error = load_session_for_project(&path, &other)
            .err()
            .expect("foreign save is refused");
        assert_eq!(error.code, "CLI_STATE_PROJECT_MISMATCH");
    }

    #[test]
    fn save_whose_scene_left_the_project_is_refused() {
        let project = load_project(&demo_dir("01-tavern")).expect("demo should load");
        let config = DialogueConfig::default();
        let session = create_session(&project, None, None, None, config.clone()).expect("create");
        let mut state = capture_player_state(&session, &project.dir, &config)
            .expect("capture")
            .expect("presenting");
        state.snapshot.scene = "deleted_scene".to_string();

        let path = temp_path("session-ops-missing-scene.json");
        save_player_state(&path, &state).expect("save should pass");
        let error = load_session_for_project(&path, &project)
            .err()
            .expect("save is refused");
        assert_eq!(error.code, "CLI_STATE_SCENE_MISSING");
        let error = resume_from_player_state(&state).err().expect("save is refused");
        assert_eq!(error.code, "CLI_STATE_SCENE_MISSING");
    }
}
