mod library;
mod project;

use std::collections::BTreeMap;

use dlg_core::{DialogueError, DialogueOutput, SessionSnapshot};
use dlg_runtime::{
    DialogueConfig, DialogueEngine, DialogueEngineOptions, MemoryGameState, RhaiScriptRunner,
    SharedGameState,
};

pub use library::SceneLibrary;
pub use project::{read_project_dir, ProjectSources, DIALOGUE_DIR, SCRIPTS_DIR, STATE_FILE};

pub const DEFAULT_ENTRY_SCENE: &str = "main";

#[derive(Debug, Clone, Default)]
pub struct CreateEngineOptions {
    pub dialogues: BTreeMap<String, String>,
    pub scripts: BTreeMap<String, String>,
    pub state: MemoryGameState,
    pub entry_scene: Option<String>,
    pub entry_frame: Option<String>,
    pub random_seed: Option<u32>,
    pub config: DialogueConfig,
}

#[derive(Debug, Clone)]
pub struct ResumeEngineOptions {
    pub dialogues: BTreeMap<String, String>,
    pub scripts: BTreeMap<String, String>,
    pub state: MemoryGameState,
    pub snapshot: SessionSnapshot,
    pub config: DialogueConfig,
}

/// A running engine, the state handle it shares with its scripts, and the
/// first output it produced.
pub struct EngineSession {
    pub engine: DialogueEngine,
    pub state: SharedGameState,
    pub output: DialogueOutput,
}

impl CreateEngineOptions {
    /// Options for a project directory's sources. A present `state.json`
    /// seeds the game state.
    pub fn from_project(sources: ProjectSources) -> Result<Self, DialogueError> {
        let state = match sources.state_json.as_deref() {
            Some(raw) => MemoryGameState::from_json(raw)?,
            None => MemoryGameState::default(),
        };
        Ok(Self {
            dialogues: sources.dialogues,
            scripts: sources.scripts,
            state,
            ..Self::default()
        })
    }
}

pub fn create_engine_from_json(
    options: CreateEngineOptions,
) -> Result<EngineSession, DialogueError> {
    let entry_scene = resolve_entry_scene(&options.dialogues, options.entry_scene)?;
    let state = SharedGameState::new(options.state);
    let mut engine = build_engine(
        options.dialogues,
        &options.scripts,
        &state,
        options.random_seed,
        options.config,
    )?;
    let output = engine.start(&entry_scene, options.entry_frame.as_deref(), None)?;
    Ok(EngineSession {
        engine,
        state,
        output,
    })
}

pub fn resume_engine_from_json(
    options: ResumeEngineOptions,
) -> Result<EngineSession, DialogueError> {
    let state = SharedGameState::new(options.state);
    let mut engine = build_engine(
        options.dialogues,
        &options.scripts,
        &state,
        Some(options.snapshot.rng_state),
        options.config,
    )?;
    let output = engine.resume(options.snapshot, None)?;
    Ok(EngineSession {
        engine,
        state,
        output,
    })
}

fn build_engine(
    dialogues: BTreeMap<String, String>,
    scripts: &BTreeMap<String, String>,
    state: &SharedGameState,
    random_seed: Option<u32>,
    config: DialogueConfig,
) -> Result<DialogueEngine, DialogueError> {
    let mut runner = RhaiScriptRunner::new(state.clone(), random_seed);
    for (name, source) in scripts {
        runner.register(name, source)?;
    }

    let mut options = DialogueEngineOptions::new(Box::new(SceneLibrary::new(dialogues)));
    options.state = Some(Box::new(state.clone()));
    options.scripts = Some(Box::new(runner));
    options.random_seed = random_seed;
    options.config = config;
    DialogueEngine::new(options)
}

fn resolve_entry_scene(
    dialogues: &BTreeMap<String, String>,
    explicit: Option<String>,
) -> Result<String, DialogueError> {
    if let Some(entry) = explicit {
        if !dialogues.contains_key(&entry) {
            return Err(DialogueError::session(
                "API_ENTRY_SCENE_NOT_FOUND",
                format!("Entry scene \"{}\" is not registered.", entry),
            ));
        }
        return Ok(entry);
    }

    if dialogues.contains_key(DEFAULT_ENTRY_SCENE) {
        return Ok(DEFAULT_ENTRY_SCENE.to_string());
    }

    Err(DialogueError::session(
        "API_ENTRY_MAIN_NOT_FOUND",
        "Expected a dialogue named \"main\" as default entry.",
    ))
}
