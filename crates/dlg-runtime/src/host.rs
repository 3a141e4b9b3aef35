use std::collections::BTreeMap;
use std::io::Write;
use std::sync::Arc;

use dlg_core::{DialogueError, DialogueScene, DialogueTraceNode, DlgValue, HookKind};

/// Read side of the game world as seen by conditionals and macros.
pub trait GameStateQuery {
    fn flag(&self, name: &str) -> bool;
    fn variable(&self, name: &str) -> Option<DlgValue>;
    fn actor_value(&self, name: &str) -> Result<DlgValue, DialogueError>;
    /// `0` means not started; a negative stage means finished.
    fn quest_stage(&self, name: &str) -> i64;
    fn is_quest_finished(&self, name: &str) -> bool {
        self.quest_stage(name) < 0
    }
    fn item_count(&self, name: &str) -> i64;
    fn affinity(&self, name: &str) -> f64;
}

/// Write side of the game world. Implementations own the quest invariant:
/// a stage never moves backward.
pub trait GameStateMutator: GameStateQuery {
    fn set_flag(&mut self, name: &str, value: bool);
    fn set_variable(&mut self, name: &str, value: DlgValue);
    fn set_actor_value(&mut self, name: &str, value: DlgValue) -> Result<(), DialogueError>;
    fn set_affinity(&mut self, name: &str, value: f64);
    fn give_item(&mut self, name: &str, count: i64);
    /// Removes `count` items; returns false and removes nothing when short.
    fn take_item(&mut self, name: &str, count: i64) -> bool;
    /// Returns whether the stage was applied.
    fn set_quest_stage(&mut self, name: &str, stage: i64) -> bool;
    fn start_quest(&mut self, name: &str, stage: i64) -> bool {
        self.set_quest_stage(name, stage.max(1))
    }
    fn finish_quest(&mut self, name: &str) -> bool {
        let current = self.quest_stage(name);
        if current < 0 {
            return false;
        }
        self.set_quest_stage(name, -current.max(1))
    }
}

/// Lookup tables a skill check can target.
pub trait CharacterStats {
    fn stat(&self, name: &str) -> Option<f64>;
    fn skill(&self, name: &str) -> Option<f64>;
    fn actor_value_number(&self, name: &str) -> Option<f64>;
}

pub trait GameState: GameStateMutator + CharacterStats {}

impl<T: GameStateMutator + CharacterStats> GameState for T {}

/// Where a script call originates.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScriptContext {
    pub scene: String,
    pub frame: String,
    pub hook: Option<HookKind>,
    pub choice: Option<usize>,
}

impl ScriptContext {
    pub fn new(scene: impl Into<String>, frame: impl Into<String>) -> Self {
        Self {
            scene: scene.into(),
            frame: frame.into(),
            hook: None,
            choice: None,
        }
    }

    pub fn with_hook(mut self, hook: HookKind) -> Self {
        self.hook = Some(hook);
        self
    }

    pub fn with_choice(mut self, choice: usize) -> Self {
        self.choice = Some(choice);
        self
    }
}

pub trait ScriptRunner {
    fn call(
        &mut self,
        name: &str,
        context: &ScriptContext,
        arg: Option<&DlgValue>,
    ) -> Result<DlgValue, DialogueError>;

    fn evaluate(
        &mut self,
        name: &str,
        context: &ScriptContext,
        arg: Option<&DlgValue>,
    ) -> Result<bool, DialogueError> {
        self.call(name, context, arg).map(|value| value.is_truthy())
    }
}

#[derive(Debug, Default)]
pub struct NoScripts;

impl ScriptRunner for NoScripts {
    fn call(
        &mut self,
        name: &str,
        _context: &ScriptContext,
        _arg: Option<&DlgValue>,
    ) -> Result<DlgValue, DialogueError> {
        Err(DialogueError::script(
            "SCRIPT_NOT_FOUND",
            format!("No script runner is configured for \"{}\".", name),
        ))
    }
}

pub trait TextMacroExpander {
    fn expand(&self, template: &str, state: &dyn GameState) -> String;
}

pub trait TraceSink {
    fn append(&mut self, node: &DialogueTraceNode);
}

/// Writes every trace node as one JSON line.
pub struct JsonLinesTraceSink<W: Write> {
    writer: W,
}

impl<W: Write> JsonLinesTraceSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> TraceSink for JsonLinesTraceSink<W> {
    fn append(&mut self, node: &DialogueTraceNode) {
        let written = serde_json::to_string(node)
            .map_err(|error| error.to_string())
            .and_then(|line| writeln!(self.writer, "{}", line).map_err(|error| error.to_string()));
        if let Err(error) = written {
            log::warn!("[dialogue] trace sink write failed: {}", error);
        }
    }
}

/// Outward-facing requests that end a session.
pub trait WorldHost {
    fn open_container(&mut self, id: &str) -> Result<(), DialogueError>;
    fn change_scene(&mut self, scene: &str, spawn: Option<&str>) -> Result<(), DialogueError>;
}

#[derive(Debug, Default)]
pub struct NullWorldHost;

impl WorldHost for NullWorldHost {
    fn open_container(&mut self, id: &str) -> Result<(), DialogueError> {
        log::info!("[dialogue] open container \"{}\" (no world host)", id);
        Ok(())
    }

    fn change_scene(&mut self, scene: &str, spawn: Option<&str>) -> Result<(), DialogueError> {
        log::info!(
            "[dialogue] change scene \"{}\" spawn {:?} (no world host)",
            scene,
            spawn
        );
        Ok(())
    }
}

pub trait SceneSource {
    fn load_scene(&self, name: &str) -> Result<Arc<DialogueScene>, DialogueError>;
}

impl SceneSource for BTreeMap<String, Arc<DialogueScene>> {
    fn load_scene(&self, name: &str) -> Result<Arc<DialogueScene>, DialogueError> {
        self.get(name)
            .cloned()
            .ok_or_else(|| DialogueError::scene_not_found(name))
    }
}
